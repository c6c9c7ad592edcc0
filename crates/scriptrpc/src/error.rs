//! # Error Definitions
//!
//! Local failures are returned synchronously from the entry points and always
//! happen before the core is touched or a pending call is recorded. Remote
//! failures only ever reach the caller through its continuation, as an
//! [`AnswerError`].

use mvalue::ValueError;
use mvalue::raw;

use crate::native::AnswerId;
use crate::native::CoreError;

/// Synchronous failures of the RPC entry points.
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// Wrong number of arguments at a script-visible entry point.
    ArityViolation { function: &'static str, min: usize, max: usize, got: usize },
    /// An argument could not be read as its expected type.
    ArgumentTypeMismatch { function: &'static str, index: usize, expected: &'static str, found: &'static str },
    /// `sendRPC` was called with an empty name.
    EmptyName,
    /// The answer identifier is not a valid 16-bit identifier.
    AnswerIdOutOfRange(f64),
    /// One or more call arguments could not be converted.
    Serialization(MarshalError),
    /// The core handed out an identifier that is still pending.
    DuplicateIdentifier(AnswerId),
    /// No pending call has this identifier.
    UnknownIdentifier(AnswerId),
    /// The core failed to send the call.
    Core(CoreError),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ArityViolation { function, min, max, got } if min == max => {
                write!(f, "{} expects {} arguments, got {}", function, min, got)
            }
            Self::ArityViolation { function, min, max, got } => {
                write!(f, "{} expects {} to {} arguments, got {}", function, min, max, got)
            }
            Self::ArgumentTypeMismatch { function, index, expected, found } => {
                write!(f, "{} argument {} must be {}, got {}", function, index, expected, found)
            }
            Self::EmptyName => write!(f, "RPC name must not be empty"),
            Self::AnswerIdOutOfRange(id) => write!(f, "{} is not a valid answer id", id),
            Self::Serialization(e) => write!(f, "{}", e),
            Self::DuplicateIdentifier(id) => write!(f, "{} is already pending", id),
            Self::UnknownIdentifier(id) => write!(f, "{} is not pending", id),
            Self::Core(e) => write!(f, "Core error: {}", e),
        }
    }
}

impl std::error::Error for Error {}

impl From<MarshalError> for Error {
    fn from(e: MarshalError) -> Self {
        Self::Serialization(e)
    }
}

impl From<CoreError> for Error {
    fn from(e: CoreError) -> Self {
        Self::Core(e)
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// Why a single call argument could not be converted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureCause {
    /// Structured conversion rejected the value.
    Value(ValueError),
    /// The raw codec produced no buffer.
    Raw(raw::Error),
}

impl std::fmt::Display for FailureCause {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Value(e) => write!(f, "{}", e),
            Self::Raw(e) => write!(f, "{}", e),
        }
    }
}

/// A failed argument. `index` counts from 1; index 0 is the call name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArgumentFailure {
    pub index: usize,
    pub cause: FailureCause,
}

/// The argument list could not be converted, so the call was not sent.
///
/// Structured conversion lists every failed argument. Raw conversion stops at
/// the first failure, so it lists exactly one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarshalError {
    pub failures: Vec<ArgumentFailure>,
}

impl MarshalError {
    /// Index of the first failed argument.
    pub fn first_index(&self) -> Option<usize> {
        self.failures.first().map(|f| f.index)
    }

    pub fn indices(&self) -> Vec<usize> {
        self.failures.iter().map(|f| f.index).collect()
    }
}

impl std::fmt::Display for MarshalError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Failed to serialize argument")?;
        for (i, failure) in self.failures.iter().enumerate() {
            let sep = if i == 0 { " " } else { ", " };
            write!(f, "{}at index {} ({})", sep, failure.index, failure.cause)?;
        }
        Ok(())
    }
}

impl std::error::Error for MarshalError {}

/// Terminal outcomes of a pending call other than a value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnswerError {
    /// The remote procedure reported failure.
    Remote(String),
    /// The owning resource stopped before an answer arrived.
    Cancelled,
    /// No answer arrived within the configured timeout.
    Timeout,
}

impl std::fmt::Display for AnswerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Remote(msg) => write!(f, "Remote failure: {}", msg),
            Self::Cancelled => write!(f, "Call cancelled"),
            Self::Timeout => write!(f, "Answer timed out"),
        }
    }
}

impl std::error::Error for AnswerError {}
