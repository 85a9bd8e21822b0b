use std::sync::mpsc::{self, Receiver, SyncSender, TrySendError};

use crate::speech::utterance::Utterance;

/// Single-element buffer for the next utterance.
///
/// Capacity-1 channel with overwrite-on-full: storing a new utterance evicts the one
/// already waiting. It is never a FIFO, so the backlog is bounded at one entry.
pub struct PendingSlot {
    tx: SyncSender<Utterance>,
    rx: Receiver<Utterance>,
}

impl PendingSlot {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::sync_channel(1);
        Self { tx, rx }
    }

    /// Store `utterance`, returning the one it displaced, if any.
    pub fn overwrite(&mut self, utterance: Utterance) -> Option<Utterance> {
        let displaced = self.rx.try_recv().ok();
        match self.tx.try_send(utterance) {
            Ok(()) => {}
            // Both ends are owned here and the slot was just drained.
            Err(TrySendError::Full(lost)) | Err(TrySendError::Disconnected(lost)) => {
                log::error!("pending slot rejected utterance: {:?}", lost.text);
            }
        }
        displaced
    }

    /// Remove and return the pending utterance.
    pub fn take(&mut self) -> Option<Utterance> {
        self.rx.try_recv().ok()
    }
}

impl Default for PendingSlot {
    fn default() -> Self {
        Self::new()
    }
}
