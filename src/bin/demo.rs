//! demo - synthetic end-to-end run
//!
//! Feeds the synthetic camera through the scripted detector and luminance depth
//! backend, speaking through the log engine. Pauses halfway to show that guidance
//! stops, then resumes.

use anyhow::{anyhow, Result};
use clap::Parser;
use std::time::Duration;

use vinet::config::VinetConfig;
use vinet::{GestureSignal, Pipeline};

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Total run time in seconds.
    #[arg(long, default_value_t = 10)]
    seconds: u64,
    /// Milliseconds between guidance cycles.
    #[arg(long, default_value_t = 1000)]
    interval_ms: u64,
    /// Frames per second for the synthetic source.
    #[arg(long, default_value_t = 15)]
    fps: u32,
    /// Skip the pause/resume halfway through.
    #[arg(long)]
    no_pause: bool,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();
    if args.seconds == 0 {
        return Err(anyhow!("seconds must be >= 1"));
    }

    let mut config = VinetConfig::default();
    config.source.uri = "stub://demo".to_string();
    config.source.target_fps = args.fps;
    config.fusion.interval = Duration::from_millis(args.interval_ms);

    let mut pipeline = Pipeline::build(&config)?;
    pipeline.start()?;

    let total = Duration::from_secs(args.seconds);
    if args.no_pause {
        std::thread::sleep(total);
    } else {
        let quarter = total / 4;
        std::thread::sleep(quarter * 2);
        pipeline.handle_gesture(GestureSignal::PauseRequested)?;
        std::thread::sleep(quarter);
        pipeline.handle_gesture(GestureSignal::ResumeRequested)?;
        std::thread::sleep(quarter);
    }

    let stats = pipeline.stats();
    pipeline.shutdown()?;
    println!("{}", serde_json::to_string_pretty(&stats)?);
    Ok(())
}
