use std::sync::mpsc::Sender;

use crate::fusion::FusedResult;
use crate::speech::engine::{Completion, SpeechEngine};
use crate::speech::sentence::build_sentence;
use crate::speech::slot::PendingSlot;
use crate::speech::utterance::{Utterance, VoiceSettings};

/// Messages handled on the speech context.
#[derive(Debug)]
pub enum SpeechEvent {
    Report(FusedResult),
    Finished { utterance_id: u64 },
    Shutdown,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SpeechState {
    Idle,
    Speaking { utterance_id: u64 },
}

/// Idle/Speaking state machine with a single pending slot.
///
/// Must only be driven from one thread. Reports never interrupt the current utterance;
/// they replace whatever is pending, so stale guidance is dropped for fresher guidance.
pub struct SpeechScheduler<E: SpeechEngine> {
    engine: E,
    voice: VoiceSettings,
    state: SpeechState,
    pending: PendingSlot,
    events: Sender<SpeechEvent>,
    next_id: u64,
    spoken: u64,
    superseded: u64,
}

impl<E: SpeechEngine> SpeechScheduler<E> {
    /// `events` is where completion notices are delivered; the owner must feed them
    /// back through `on_finished`.
    pub fn new(engine: E, voice: VoiceSettings, events: Sender<SpeechEvent>) -> Self {
        Self {
            engine,
            voice,
            state: SpeechState::Idle,
            pending: PendingSlot::new(),
            events,
            next_id: 1,
            spoken: 0,
            superseded: 0,
        }
    }

    pub fn state(&self) -> SpeechState {
        self.state
    }

    /// Utterances handed to the engine so far.
    pub fn spoken(&self) -> u64 {
        self.spoken
    }

    /// Pending utterances dropped in favour of newer ones.
    pub fn superseded(&self) -> u64 {
        self.superseded
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Dispatch one event. Returns `false` on shutdown.
    pub fn handle(&mut self, event: SpeechEvent) -> bool {
        match event {
            SpeechEvent::Report(result) => self.report(&result),
            SpeechEvent::Finished { utterance_id } => self.on_finished(utterance_id),
            SpeechEvent::Shutdown => return false,
        }
        true
    }

    pub fn report(&mut self, result: &FusedResult) {
        let Some(text) = build_sentence(result) else {
            return;
        };
        let utterance = Utterance::new(text, &self.voice);
        match self.state {
            SpeechState::Idle => self.start(utterance),
            SpeechState::Speaking { .. } => {
                if let Some(stale) = self.pending.overwrite(utterance) {
                    self.superseded += 1;
                    log::debug!("superseded pending utterance: {}", stale.text);
                }
            }
        }
    }

    /// Completion notice for `utterance_id`. Notices for anything but the current
    /// utterance are ignored.
    pub fn on_finished(&mut self, utterance_id: u64) {
        if self.state != (SpeechState::Speaking { utterance_id }) {
            log::debug!("ignoring stale completion for utterance {}", utterance_id);
            return;
        }
        match self.pending.take() {
            Some(next) => self.start(next),
            None => self.state = SpeechState::Idle,
        }
    }

    fn start(&mut self, utterance: Utterance) {
        let utterance_id = self.next_id;
        self.next_id += 1;
        self.state = SpeechState::Speaking { utterance_id };
        let done = Completion::new(utterance_id, self.events.clone());
        match self.engine.speak(&utterance, done) {
            Ok(()) => self.spoken += 1,
            Err(e) => {
                // No retry: the failed utterance is finished but not counted as spoken.
                log::warn!("{} engine failed to speak: {:#}", self.engine.name(), e);
                self.on_finished(utterance_id);
            }
        }
    }
}
