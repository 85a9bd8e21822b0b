use anyhow::{anyhow, Context, Result};
use std::process::{Command, Stdio};
use std::sync::mpsc::Sender;
use std::time::Duration;

use crate::speech::scheduler::SpeechEvent;
use crate::speech::utterance::Utterance;

/// One-shot playback completion notice.
///
/// Engines must call `finished` exactly once per accepted utterance, from any thread,
/// once playback ends (or is abandoned).
#[derive(Debug)]
pub struct Completion {
    utterance_id: u64,
    events: Sender<SpeechEvent>,
}

impl Completion {
    pub(crate) fn new(utterance_id: u64, events: Sender<SpeechEvent>) -> Self {
        Self {
            utterance_id,
            events,
        }
    }

    pub fn finished(self) {
        // The worker may already be gone during shutdown.
        let _ = self.events.send(SpeechEvent::Finished {
            utterance_id: self.utterance_id,
        });
    }
}

/// Audio output engine.
///
/// `speak` starts playback and returns without waiting for it to end.
pub trait SpeechEngine: Send {
    fn name(&self) -> &'static str;

    fn speak(&mut self, utterance: &Utterance, done: Completion) -> Result<()>;
}

impl<E: SpeechEngine + ?Sized> SpeechEngine for Box<E> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn speak(&mut self, utterance: &Utterance, done: Completion) -> Result<()> {
        (**self).speak(utterance, done)
    }
}

/// Map the normalized rate to words per minute (0.45 -> 188 wpm).
pub fn words_per_minute(rate: f32) -> u32 {
    (80.0 + rate.clamp(0.05, 1.0) * 240.0).round() as u32
}

fn estimated_duration(utterance: &Utterance) -> Duration {
    let words = utterance.text.split_whitespace().count().max(1) as f64;
    Duration::from_secs_f64(words * 60.0 / words_per_minute(utterance.voice.rate) as f64)
}

// ----------------------------------------------------------------------------
// LogEngine
// ----------------------------------------------------------------------------

/// Writes utterances to the log and simulates playback time.
///
/// Used on hosts without a speech synthesizer and by the demo binary.
pub struct LogEngine {
    time_scale: f64,
}

impl LogEngine {
    pub fn new() -> Self {
        Self { time_scale: 1.0 }
    }

    /// Scale simulated playback time; 0.0 completes immediately.
    pub fn with_time_scale(mut self, scale: f64) -> Self {
        self.time_scale = scale.max(0.0);
        self
    }
}

impl Default for LogEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl SpeechEngine for LogEngine {
    fn name(&self) -> &'static str {
        "log"
    }

    fn speak(&mut self, utterance: &Utterance, done: Completion) -> Result<()> {
        log::info!("speaking [{}]: {}", utterance.voice.locale, utterance.text);
        let playback = estimated_duration(utterance).mul_f64(self.time_scale);
        std::thread::Builder::new()
            .name("vinet-log-speech".into())
            .spawn(move || {
                std::thread::sleep(playback);
                done.finished();
            })
            .context("failed to spawn playback timer")?;
        Ok(())
    }
}

// ----------------------------------------------------------------------------
// CommandEngine
// ----------------------------------------------------------------------------

/// Speaks through an external synthesizer program such as `espeak-ng` or `say`.
///
/// The command template is split on whitespace; `{voice}` and `{wpm}` placeholders are
/// substituted and the sentence is appended as the final argument. Playback is
/// complete when the process exits.
pub struct CommandEngine {
    program: String,
    args: Vec<String>,
}

impl CommandEngine {
    pub fn from_template(template: &str) -> Result<Self> {
        let mut parts = template.split_whitespace().map(|p| p.to_string());
        let program = parts
            .next()
            .ok_or_else(|| anyhow!("speech command template is empty"))?;
        Ok(Self {
            program,
            args: parts.collect(),
        })
    }

    fn build(&self, utterance: &Utterance) -> Command {
        let wpm = words_per_minute(utterance.voice.rate).to_string();
        let mut cmd = Command::new(&self.program);
        for arg in &self.args {
            cmd.arg(
                arg.replace("{voice}", &utterance.voice.locale)
                    .replace("{wpm}", &wpm),
            );
        }
        cmd.arg(&utterance.text)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());
        cmd
    }
}

impl SpeechEngine for CommandEngine {
    fn name(&self) -> &'static str {
        "command"
    }

    fn speak(&mut self, utterance: &Utterance, done: Completion) -> Result<()> {
        let mut child = self
            .build(utterance)
            .spawn()
            .with_context(|| format!("failed to run speech command '{}'", self.program))?;
        let program = self.program.clone();
        std::thread::Builder::new()
            .name("vinet-command-speech".into())
            .spawn(move || {
                match child.wait() {
                    Ok(status) if !status.success() => {
                        log::warn!("speech command '{}' exited with {}", program, status)
                    }
                    Err(e) => log::warn!("speech command '{}' failed: {}", program, e),
                    Ok(_) => {}
                }
                done.finished();
            })
            .context("failed to spawn speech waiter")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::speech::utterance::VoiceSettings;
    use std::sync::mpsc;

    #[test]
    fn rate_maps_to_wpm() {
        assert_eq!(words_per_minute(0.45), 188);
        assert_eq!(words_per_minute(1.0), 320);
        assert_eq!(words_per_minute(5.0), 320);
    }

    #[test]
    fn command_template_substitutes_placeholders() {
        let engine = CommandEngine::from_template("espeak-ng -v {voice} -s {wpm}").unwrap();
        let utterance = Utterance::new("A cup is 30.0 centimetres in front.", &VoiceSettings::default());
        let cmd = engine.build(&utterance);

        assert_eq!(cmd.get_program(), "espeak-ng");
        let args: Vec<_> = cmd.get_args().map(|a| a.to_string_lossy().into_owned()).collect();
        assert_eq!(
            args,
            vec!["-v", "en-US", "-s", "188", "A cup is 30.0 centimetres in front."]
        );
    }

    #[test]
    fn empty_template_is_rejected() {
        assert!(CommandEngine::from_template("   ").is_err());
    }

    #[test]
    fn log_engine_signals_completion() {
        let (tx, rx) = mpsc::channel();
        let mut engine = LogEngine::new().with_time_scale(0.0);
        let utterance = Utterance::new("A door is 200.0 centimetres in front.", &VoiceSettings::default());
        engine.speak(&utterance, Completion::new(9, tx)).unwrap();

        match rx.recv_timeout(Duration::from_secs(5)).unwrap() {
            SpeechEvent::Finished { utterance_id } => assert_eq!(utterance_id, 9),
            other => panic!("unexpected event: {:?}", other),
        }
    }
}
