//! Spoken guidance.
//!
//! The scheduler turns fused results into one sentence each and plays them through a
//! `SpeechEngine` without ever overlapping or queueing: while an utterance is playing,
//! newer sentences overwrite a single pending slot and only the latest one survives to
//! the next completion.
//!
//! All scheduler state lives on the `SpeechWorker` thread; other components talk to it
//! through `SpeechSender`.

mod engine;
mod scheduler;
mod sentence;
mod slot;
mod utterance;
mod worker;

pub use engine::{words_per_minute, Completion, CommandEngine, LogEngine, SpeechEngine};
pub use scheduler::{SpeechEvent, SpeechScheduler, SpeechState};
pub use sentence::{build_sentence, clause, Position};
pub use slot::PendingSlot;
pub use utterance::{Utterance, VoiceSettings};
pub use worker::{SpeechHandle, SpeechSender, SpeechStats, SpeechWorker};
