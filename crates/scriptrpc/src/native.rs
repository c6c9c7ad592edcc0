//! # Native Core Abstraction
//!
//! The slice of the native engine this subsystem talks to.
//!
//! ## Philosophy
//!
//! - **Injected, Not Global**: The dispatcher owns its `Core`. Nothing reaches for a
//!   process-wide singleton.
//! - **Opaque Transport**: The core decides how a call reaches the server and which
//!   correlation identifier it gets. We only echo that identifier back.

use std::fmt;

use mvalue::EngineValue;
use mvalue::EntityRef;

/// Correlation identifier assigned by the core when a call is sent.
#[derive(Copy, Clone, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct AnswerId(pub u16);

impl fmt::Display for AnswerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "answer-{}", self.0)
    }
}

impl From<u16> for AnswerId {
    fn from(id: u16) -> Self {
        Self(id)
    }
}

/// Errors raised by the core while handing a call to the network.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// No connection to the server.
    Disconnected,
    /// Every correlation identifier is in use.
    IdentifiersExhausted,
    /// The transport refused the payload.
    Rejected(String),
}

impl fmt::Display for CoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disconnected => write!(f, "Not connected to a server"),
            Self::IdentifiersExhausted => write!(f, "No free answer identifiers"),
            Self::Rejected(msg) => write!(f, "Transport rejected call: {}", msg),
        }
    }
}

impl std::error::Error for CoreError {}

pub type Result<T> = std::result::Result<T, CoreError>;

/// The native engine, as seen from the RPC bindings.
///
/// # Threading
/// Called only from the script thread. Implementations that talk to a network
/// thread must hand answers back through an `AnswerSender`.
pub trait Core {
    /// Sends a named call to the server and returns its correlation identifier.
    ///
    /// # invariants
    /// - Must not return an identifier that is still awaiting an answer.
    /// - Should not interpret argument contents.
    fn trigger_server_rpc_event(&mut self, name: &str, args: &[EngineValue]) -> Result<AnswerId>;

    /// Entities currently streamed in, as maintained by the streaming subsystem.
    fn streamed_in_virtual_entities(&self) -> Vec<EntityRef>;
}

impl<T: Core + ?Sized> Core for Box<T> {
    fn trigger_server_rpc_event(&mut self, name: &str, args: &[EngineValue]) -> Result<AnswerId> {
        (**self).trigger_server_rpc_event(name, args)
    }

    fn streamed_in_virtual_entities(&self) -> Vec<EntityRef> {
        (**self).streamed_in_virtual_entities()
    }
}
