//! Mock core for testing.
//!
//! Used internally by the test suite; not part of the public API.

use std::collections::VecDeque;

use mvalue::EngineValue;
use mvalue::EntityRef;

use crate::native;
use crate::native::AnswerId;
use crate::native::Core;
use crate::native::CoreError;

/// A call as the core received it.
#[derive(Clone, Debug, PartialEq)]
pub struct SentCall {
    pub name: String,
    pub args: Vec<EngineValue>,
}

/// Records every call and hands out identifiers in order.
#[derive(Debug, Default)]
pub struct MockCore {
    pub sent: Vec<SentCall>,
    pub entities: Vec<EntityRef>,
    /// Identifiers to hand out before falling back to the counter.
    pub scripted_ids: VecDeque<AnswerId>,
    /// Fails the next call with this error.
    pub fail_next: Option<CoreError>,
    next_id: u16,
}

impl MockCore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ids(ids: impl IntoIterator<Item = u16>) -> Self {
        Self { scripted_ids: ids.into_iter().map(AnswerId).collect(), ..Self::default() }
    }
}

impl Core for MockCore {
    fn trigger_server_rpc_event(&mut self, name: &str, args: &[EngineValue]) -> native::Result<AnswerId> {
        if let Some(e) = self.fail_next.take() {
            return Err(e);
        }

        self.sent.push(SentCall { name: name.to_string(), args: args.to_vec() });
        let id = self.scripted_ids.pop_front().unwrap_or_else(|| {
            let id = AnswerId(self.next_id);
            self.next_id = self.next_id.wrapping_add(1);
            id
        });
        Ok(id)
    }

    fn streamed_in_virtual_entities(&self) -> Vec<EntityRef> {
        self.entities.clone()
    }
}
