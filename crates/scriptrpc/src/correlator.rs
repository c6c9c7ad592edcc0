//! # Pending Call Correlation
//!
//! Tracks calls awaiting an answer, keyed by the identifier the core assigned.
//!
//! ## Invariants
//! - At most one pending call per identifier.
//! - Every terminal transition (answer, cancellation, timeout) first removes the
//!   record, so a continuation can run at most once and never after cancellation.
//! - Cancellation drops the continuation without running it.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::task::Context;
use std::task::Poll;
use std::time::Duration;
use std::time::Instant;

use mvalue::EngineValue;
use mvalue::ScriptValue;
use tokio::sync::oneshot;
use tokio::sync::oneshot::error::TryRecvError;

use crate::error::AnswerError;
use crate::error::Error;
use crate::error::Result;
use crate::native::AnswerId;
use crate::resource::ResourceId;

/// The outcome delivered to a continuation.
pub type Answer = std::result::Result<ScriptValue, AnswerError>;

/// What to run when a pending call resolves.
pub enum Continuation {
    /// Completes a [`PendingAnswer`] future.
    Deferred(oneshot::Sender<Answer>),
    /// Runs a script callback.
    Callback(Box<dyn FnOnce(Answer)>),
}

impl Continuation {
    /// Creates a deferred continuation and the future it completes.
    pub fn deferred(id: AnswerId) -> (Self, PendingAnswer) {
        let (tx, rx) = oneshot::channel();
        (Self::Deferred(tx), PendingAnswer { id, rx })
    }

    pub fn callback(f: impl FnOnce(Answer) + 'static) -> Self {
        Self::Callback(Box::new(f))
    }

    fn invoke(self, answer: Answer) {
        match self {
            // The receiver may be gone if script dropped the handle.
            Self::Deferred(tx) => { let _ = tx.send(answer); },
            Self::Callback(f) => f(answer),
        }
    }
}

impl std::fmt::Debug for Continuation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Deferred(_) => write!(f, "Continuation::Deferred"),
            Self::Callback(_) => write!(f, "Continuation::Callback"),
        }
    }
}

/// Script-side handle to the eventual answer of a call.
///
/// Resolves to `Err(AnswerError::Cancelled)` if the call is dropped without an
/// answer, which is what happens when its owning resource stops.
#[derive(Debug)]
pub struct PendingAnswer {
    id: AnswerId,
    rx: oneshot::Receiver<Answer>,
}

impl PendingAnswer {
    pub fn id(&self) -> AnswerId {
        self.id
    }

    /// Polls without a runtime. `None` while the call is still pending.
    ///
    /// Once an answer has been taken, later calls report `Cancelled`.
    pub fn try_answer(&mut self) -> Option<Answer> {
        match self.rx.try_recv() {
            Ok(answer) => Some(answer),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Closed) => Some(Err(AnswerError::Cancelled)),
        }
    }
}

impl Future for PendingAnswer {
    type Output = Answer;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Answer> {
        match Pin::new(&mut self.rx).poll(cx) {
            Poll::Ready(Ok(answer)) => Poll::Ready(answer),
            Poll::Ready(Err(_)) => Poll::Ready(Err(AnswerError::Cancelled)),
            Poll::Pending => Poll::Pending,
        }
    }
}

/// Bookkeeping for one in-flight call.
#[derive(Debug)]
struct PendingCall {
    owner: ResourceId,
    continuation: Continuation,
    issued_at: Instant,
}

/// The pending-call table.
///
/// Owned by the dispatcher and mutated only from the script thread.
#[derive(Debug, Default)]
pub struct Correlator {
    pending: HashMap<AnswerId, PendingCall>,
}

impl Correlator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a call awaiting `id`.
    ///
    /// # Errors
    /// Returns `Error::DuplicateIdentifier` if `id` is already pending. The existing
    /// record is left untouched and `continuation` is dropped.
    pub fn register_pending(&mut self, id: AnswerId, owner: ResourceId, continuation: Continuation) -> Result<()> {
        if self.pending.contains_key(&id) {
            return Err(Error::DuplicateIdentifier(id));
        }
        self.pending.insert(id, PendingCall { owner, continuation, issued_at: Instant::now() });
        Ok(())
    }

    /// Resolves the call awaiting `id`.
    ///
    /// A non-empty `error` means the remote procedure failed; `value` is then ignored.
    ///
    /// # Errors
    /// Returns `Error::UnknownIdentifier` if nothing awaits `id`. That is expected when
    /// an answer races with cancellation.
    pub fn resolve(&mut self, id: AnswerId, value: EngineValue, error: &str) -> Result<()> {
        let call = self.pending.remove(&id).ok_or(Error::UnknownIdentifier(id))?;

        let answer = if error.is_empty() {
            Ok(value.to_script())
        } else {
            Err(AnswerError::Remote(error.to_string()))
        };

        call.continuation.invoke(answer);
        Ok(())
    }

    /// Drops every call owned by `owner` without running its continuation.
    ///
    /// Idempotent. Returns the number of calls removed.
    pub fn cancel_all(&mut self, owner: ResourceId) -> usize {
        let before = self.pending.len();
        self.pending.retain(|_, call| call.owner != owner);
        before - self.pending.len()
    }

    /// Fails every call that has waited at least `timeout` as of `now`.
    ///
    /// Returns the expired identifiers, sorted.
    pub fn expire(&mut self, now: Instant, timeout: Duration) -> Vec<AnswerId> {
        let mut expired: Vec<AnswerId> = self.pending.iter()
            .filter(|(_, call)| now.saturating_duration_since(call.issued_at) >= timeout)
            .map(|(id, _)| *id)
            .collect();
        expired.sort();

        for id in &expired {
            if let Some(call) = self.pending.remove(id) {
                call.continuation.invoke(Err(AnswerError::Timeout));
            }
        }
        expired
    }

    pub fn is_pending(&self, id: AnswerId) -> bool {
        self.pending.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Number of pending calls owned by `owner`.
    pub fn owned_by(&self, owner: ResourceId) -> usize {
        self.pending.values().filter(|call| call.owner == owner).count()
    }
}
