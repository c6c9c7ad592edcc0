//! Hand-off of answers from the network thread to the script thread.
//!
//! Answers never touch the pending table off the script thread. Producers push
//! through an [`AnswerSender`], and the dispatcher drains the queue in
//! `Dispatcher::pump_answers`.

use mvalue::EngineValue;
use tokio::sync::mpsc;

use crate::native::AnswerId;

/// An answer as it arrives from the server.
#[derive(Clone, Debug, PartialEq)]
pub struct InboundAnswer {
    pub id: AnswerId,
    pub answer: EngineValue,
    /// Empty unless the remote procedure failed.
    pub error: String,
}

/// The inbox was dropped along with its dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InboxClosed;

impl std::fmt::Display for InboxClosed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Answer inbox closed")
    }
}

impl std::error::Error for InboxClosed {}

/// Cloneable, thread-safe producer side of the answer inbox.
#[derive(Clone, Debug)]
pub struct AnswerSender {
    tx: mpsc::UnboundedSender<InboundAnswer>,
}

impl AnswerSender {
    pub fn send(&self, id: AnswerId, answer: EngineValue, error: impl Into<String>) -> Result<(), InboxClosed> {
        self.tx
            .send(InboundAnswer { id, answer, error: error.into() })
            .map_err(|_| InboxClosed)
    }
}

#[derive(Debug)]
pub(crate) struct Inbox {
    rx: mpsc::UnboundedReceiver<InboundAnswer>,
}

impl Inbox {
    /// Takes everything queued so far without blocking.
    pub(crate) fn drain(&mut self) -> Vec<InboundAnswer> {
        let mut answers = Vec::new();
        while let Ok(answer) = self.rx.try_recv() {
            answers.push(answer);
        }
        answers
    }
}

pub(crate) fn channel() -> (AnswerSender, Inbox) {
    let (tx, rx) = mpsc::unbounded_channel();
    (AnswerSender { tx }, Inbox { rx })
}
