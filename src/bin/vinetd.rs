//! vinetd - spoken proximity guidance daemon
//!
//! This daemon:
//! 1. Loads configuration (file at VINET_CONFIG, then VINET_* overrides, then flags)
//! 2. Loads the detection and depth backends
//! 3. Captures frames and speaks guidance at a fixed interval
//! 4. Reads pause/resume gestures as lines on stdin
//! 5. Logs a health line periodically until Ctrl-C

use anyhow::{anyhow, Result};
use clap::Parser;
use std::io::BufRead;
use std::path::PathBuf;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::time::Duration;

use vinet::{GestureSignal, Pipeline, VinetConfig};

const DEFAULT_HEALTH_SECS: u64 = 5;

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Config file (TOML, or JSON with a .json extension).
    #[arg(long)]
    config: Option<PathBuf>,
    /// Frame source: stub://<name> or a directory of images.
    #[arg(long)]
    source: Option<String>,
    /// Directory holding the model artifacts.
    #[arg(long)]
    models_dir: Option<PathBuf>,
    /// Detections described per sentence.
    #[arg(long)]
    top_k: Option<usize>,
    /// Seconds between health log lines.
    #[arg(long, default_value_t = DEFAULT_HEALTH_SECS)]
    health_secs: u64,
}

enum Control {
    Gesture(GestureSignal),
    Shutdown,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => VinetConfig::load_from(path)?,
        None => VinetConfig::load()?,
    };
    if let Some(source) = args.source {
        config.source.uri = source;
    }
    if let Some(dir) = args.models_dir {
        config.models_dir = dir;
    }
    if let Some(top_k) = args.top_k {
        config.fusion.top_k = top_k;
    }

    let mut pipeline = Pipeline::build(&config)?;
    pipeline.start()?;
    log::info!(
        "vinetd running (source={}, interval={}ms, top_k={})",
        config.source.uri,
        config.fusion.interval.as_millis(),
        config.fusion.top_k
    );

    let (tx, rx) = mpsc::channel();
    let ctrlc_tx = tx.clone();
    ctrlc::set_handler(move || {
        let _ = ctrlc_tx.send(Control::Shutdown);
    })
    .map_err(|e| anyhow!("error setting Ctrl-C handler: {}", e))?;
    spawn_gesture_reader(tx)?;

    let health_interval = Duration::from_secs(args.health_secs.max(1));
    loop {
        match rx.recv_timeout(health_interval) {
            Ok(Control::Gesture(signal)) => {
                if let Err(err) = pipeline.handle_gesture(signal) {
                    log::error!("gesture {:?} failed: {}", signal, err);
                }
            }
            Ok(Control::Shutdown) | Err(RecvTimeoutError::Disconnected) => break,
            Err(RecvTimeoutError::Timeout) => {
                log::info!("health {}", serde_json::to_string(&pipeline.stats())?);
            }
        }
    }

    log::info!("shutdown signal received, stopping pipeline...");
    pipeline.shutdown()?;
    Ok(())
}

fn spawn_gesture_reader(tx: mpsc::Sender<Control>) -> Result<()> {
    std::thread::Builder::new()
        .name("vinetd-gestures".into())
        .spawn(move || {
            let stdin = std::io::stdin();
            for line in stdin.lock().lines() {
                let Ok(line) = line else { break };
                if line.trim().is_empty() {
                    continue;
                }
                match line.parse::<GestureSignal>() {
                    Ok(signal) => {
                        if tx.send(Control::Gesture(signal)).is_err() {
                            break;
                        }
                    }
                    Err(err) => log::warn!("{} (expected pause/p or resume/r)", err),
                }
            }
            log::debug!("stdin closed; gestures disabled");
        })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn health_line_defaults_to_every_few_seconds() {
        let args = Args::parse_from(["vinetd"]);
        assert_eq!(args.health_secs, DEFAULT_HEALTH_SECS);
        assert!(args.health_secs <= 10);

        let args = Args::parse_from(["vinetd", "--health-secs", "2"]);
        assert_eq!(args.health_secs, 2);
    }
}
