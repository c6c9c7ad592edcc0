//! # ScriptRPC
//!
//! Script-initiated remote procedure calls: marshal the arguments, hand them to
//! the native core, and route the eventual answer back to the caller.
//!
//! ## Architecture
//!
//! - [`Dispatcher`] owns the injected [`Core`], the pending-call table and the
//!   answer inbox. It is driven from the script thread only.
//! - [`bindings`] is the script-visible surface (`sendRPC`, `answerRPC`,
//!   `getStreamedInVirtualEntities`).
//! - Answers arriving on other threads go through an [`AnswerSender`] and are
//!   resolved in [`Dispatcher::pump_answers`].

pub mod bindings;
pub mod config;
pub mod correlator;
pub mod dispatcher;
pub mod entities;
pub mod error;
pub mod inbox;
pub mod marshal;
pub mod native;
pub mod resource;

pub use config::RpcConfig;
pub use correlator::Answer;
pub use correlator::PendingAnswer;
pub use dispatcher::Dispatcher;
pub use error::AnswerError;
pub use error::Error;
pub use error::MarshalError;
pub use error::Result;
pub use inbox::AnswerSender;
pub use marshal::Mode;
pub use native::AnswerId;
pub use native::Core;
pub use native::CoreError;
pub use resource::Resource;
pub use resource::ResourceConfig;
pub use resource::ResourceId;

#[cfg(test)]
mod mock_core;
