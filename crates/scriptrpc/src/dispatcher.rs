//! # RPC Dispatcher
//!
//! Entry point for outbound calls and inbound answers.
//!
//! ## Flow
//! 1. Validate the call and marshal its arguments for the resource's mode.
//! 2. Hand the name and converted arguments to the [`Core`], which returns the
//!    correlation identifier.
//! 3. Record the pending call before returning to script, so an answer pumped on
//!    the next turn always finds it.
//!
//! Every local failure happens before step 2. A failed call leaves no trace.

use std::time::Instant;

use mvalue::EngineValue;
use mvalue::EntityRef;
use mvalue::ScriptValue;
use tracing::debug;
use tracing::error;
use tracing::trace;
use tracing::warn;

use crate::config::RpcConfig;
use crate::correlator::Answer;
use crate::correlator::Continuation;
use crate::correlator::Correlator;
use crate::correlator::PendingAnswer;
use crate::entities;
use crate::error::Error;
use crate::error::Result;
use crate::inbox;
use crate::inbox::AnswerSender;
use crate::inbox::Inbox;
use crate::marshal::marshal_arguments;
use crate::native::AnswerId;
use crate::native::Core;
use crate::resource::Resource;
use crate::resource::ResourceId;

pub struct Dispatcher<C: Core> {
    core: C,
    correlator: Correlator,
    config: RpcConfig,
    answer_tx: AnswerSender,
    inbox: Inbox,
}

impl<C: Core> Dispatcher<C> {
    pub fn new(core: C, config: RpcConfig) -> Self {
        let (answer_tx, inbox) = inbox::channel();
        Self { core, correlator: Correlator::new(), config, answer_tx, inbox }
    }

    /// A handle other threads use to post answers. See [`Dispatcher::pump_answers`].
    pub fn answer_sender(&self) -> AnswerSender {
        self.answer_tx.clone()
    }

    /// Sends `name` with `args` on behalf of `resource`.
    ///
    /// The returned future completes with the answer, or with `Cancelled` once
    /// `resource` stops.
    pub fn send_rpc(&mut self, resource: &Resource, name: &str, args: &[ScriptValue]) -> Result<PendingAnswer> {
        let id = self.dispatch(resource, name, args)?;
        let (continuation, pending) = Continuation::deferred(id);
        self.register(id, resource.id(), continuation)?;
        Ok(pending)
    }

    /// Like [`Dispatcher::send_rpc`], but runs `callback` with the answer.
    ///
    /// The callback never runs if `resource` stops first.
    pub fn send_rpc_with<F>(&mut self, resource: &Resource, name: &str, args: &[ScriptValue], callback: F) -> Result<AnswerId>
    where
        F: FnOnce(Answer) + 'static,
    {
        let id = self.dispatch(resource, name, args)?;
        self.register(id, resource.id(), Continuation::callback(callback))?;
        Ok(id)
    }

    fn dispatch(&mut self, resource: &Resource, name: &str, args: &[ScriptValue]) -> Result<AnswerId> {
        if name.is_empty() {
            return Err(Error::EmptyName);
        }

        // Read once; the flag may change between calls but never mid-call.
        let mode = resource.mode();
        let values = marshal_arguments(args, mode)?;

        let id = self.core.trigger_server_rpc_event(name, &values).map_err(|e| {
            warn!(rpc = name, resource = %resource.id(), error = %e, "core failed to send rpc");
            e
        })?;

        debug!(rpc = name, resource = %resource.id(), answer_id = id.0, ?mode, args = values.len(), "rpc sent");
        Ok(id)
    }

    fn register(&mut self, id: AnswerId, owner: ResourceId, continuation: Continuation) -> Result<()> {
        self.correlator.register_pending(id, owner, continuation).map_err(|e| {
            error!(answer_id = id.0, resource = %owner, "core reused a pending answer id");
            e
        })?;

        if let Some(threshold) = self.config.pending_warn_threshold {
            let pending = self.correlator.len();
            if pending > threshold {
                warn!(pending, threshold, "pending rpc count above threshold");
            }
        }
        Ok(())
    }

    /// Resolves the call awaiting `id`.
    ///
    /// A non-empty `error` fails the call with `AnswerError::Remote` regardless of
    /// `value`. Returns `false` if nothing awaits `id`, which happens when an
    /// answer arrives after its resource stopped.
    pub fn answer_rpc(&mut self, id: AnswerId, value: EngineValue, error: &str) -> bool {
        match self.correlator.resolve(id, value, error) {
            Ok(()) => {
                trace!(answer_id = id.0, failed = !error.is_empty(), "rpc answered");
                true
            }
            Err(e) => {
                debug!(answer_id = id.0, error = %e, "dropping answer");
                false
            }
        }
    }

    /// Cancels every call owned by `resource`. Call when the resource stops.
    pub fn on_resource_stop(&mut self, resource: ResourceId) -> usize {
        let cancelled = self.correlator.cancel_all(resource);
        if cancelled > 0 {
            debug!(%resource, cancelled, "cancelled pending rpcs");
        }
        cancelled
    }

    /// Resolves every answer posted through an [`AnswerSender`] so far.
    ///
    /// Returns how many of them matched a pending call.
    pub fn pump_answers(&mut self) -> usize {
        let mut resolved = 0;
        for inbound in self.inbox.drain() {
            if self.answer_rpc(inbound.id, inbound.answer, &inbound.error) {
                resolved += 1;
            }
        }
        resolved
    }

    /// Applies the answer timeout, if one is configured.
    pub fn tick(&mut self, now: Instant) -> usize {
        let Some(timeout) = self.config.answer_timeout else {
            return 0;
        };

        let expired = self.correlator.expire(now, timeout);
        for id in &expired {
            warn!(answer_id = id.0, ?timeout, "rpc timed out");
        }
        expired.len()
    }

    pub fn pending_count(&self) -> usize {
        self.correlator.len()
    }

    pub fn is_pending(&self, id: AnswerId) -> bool {
        self.correlator.is_pending(id)
    }

    pub fn streamed_entities(&self) -> Vec<EntityRef> {
        entities::list_streamed_entities(&self.core)
    }

    pub fn config(&self) -> &RpcConfig {
        &self.config
    }

    pub fn core(&self) -> &C {
        &self.core
    }

    pub fn core_mut(&mut self) -> &mut C {
        &mut self.core
    }
}
