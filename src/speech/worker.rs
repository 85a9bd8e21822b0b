use anyhow::{anyhow, Context, Result};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, Sender};
use std::sync::Arc;
use std::thread::JoinHandle;

use crate::fusion::FusedResult;
use crate::speech::engine::SpeechEngine;
use crate::speech::scheduler::{SpeechEvent, SpeechScheduler};
use crate::speech::utterance::VoiceSettings;

/// Counters published by the speech context.
#[derive(Debug, Default)]
pub struct SpeechStats {
    spoken: AtomicU64,
    superseded: AtomicU64,
}

impl SpeechStats {
    pub fn spoken(&self) -> u64 {
        self.spoken.load(Ordering::Relaxed)
    }

    pub fn superseded(&self) -> u64 {
        self.superseded.load(Ordering::Relaxed)
    }
}

/// Cloneable entry point into the speech context.
#[derive(Clone, Debug)]
pub struct SpeechSender {
    events: Sender<SpeechEvent>,
}

impl SpeechSender {
    /// Queue a fused result for speaking. Fails only once the worker has stopped.
    pub fn report(&self, result: FusedResult) -> Result<()> {
        self.events
            .send(SpeechEvent::Report(result))
            .map_err(|_| anyhow!("speech worker has stopped"))
    }
}

/// Running speech context.
#[derive(Debug)]
pub struct SpeechHandle {
    sender: SpeechSender,
    stats: Arc<SpeechStats>,
    join: Option<JoinHandle<()>>,
}

impl SpeechHandle {
    pub fn sender(&self) -> SpeechSender {
        self.sender.clone()
    }

    pub fn stats(&self) -> Arc<SpeechStats> {
        self.stats.clone()
    }

    /// Stop the worker. Any playing utterance is left to finish on its own.
    pub fn stop(mut self) -> Result<()> {
        let _ = self.sender.events.send(SpeechEvent::Shutdown);
        if let Some(join) = self.join.take() {
            join.join()
                .map_err(|_| anyhow!("speech worker thread panicked"))?;
        }
        Ok(())
    }
}

/// Owns the `SpeechScheduler` on a dedicated thread.
///
/// Reports and completion notices share one channel, so every scheduler mutation is
/// serialized on this thread.
pub struct SpeechWorker;

impl SpeechWorker {
    pub fn spawn<E: SpeechEngine + 'static>(engine: E, voice: VoiceSettings) -> Result<SpeechHandle> {
        let (tx, rx) = mpsc::channel();
        let stats = Arc::new(SpeechStats::default());
        let thread_stats = stats.clone();
        let engine_name = engine.name();
        let mut scheduler = SpeechScheduler::new(engine, voice, tx.clone());

        let join = std::thread::Builder::new()
            .name("vinet-speech".into())
            .spawn(move || {
                while let Ok(event) = rx.recv() {
                    let keep_running = scheduler.handle(event);
                    thread_stats
                        .spoken
                        .store(scheduler.spoken(), Ordering::Relaxed);
                    thread_stats
                        .superseded
                        .store(scheduler.superseded(), Ordering::Relaxed);
                    if !keep_running {
                        break;
                    }
                }
                log::debug!("speech worker exiting");
            })
            .context("failed to spawn speech worker")?;
        log::info!("speech worker started (engine={})", engine_name);

        Ok(SpeechHandle {
            sender: SpeechSender { events: tx },
            stats,
            join: Some(join),
        })
    }
}
