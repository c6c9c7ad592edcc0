//! # Argument Marshaling
//!
//! Turns the script arguments of a call into transport-ready engine values.
//!
//! ## Modes
//! - **Structured**: each argument goes through the engine value model. Every
//!   argument is attempted, and every failure is reported.
//! - **RawBytes**: each argument becomes one opaque `ByteArray`. Raw buffers are
//!   positional on the remote side, so the first failure stops the whole list.
//!
//! Indices in failures count from 1: argument 0 of `sendRPC` is the name and is
//! never marshaled.

use mvalue::EngineValue;
use mvalue::ScriptValue;
use mvalue::raw;
use tracing::warn;

use crate::error::ArgumentFailure;
use crate::error::FailureCause;
use crate::error::MarshalError;

/// How call arguments are encoded. Chosen by the calling resource, never by the call.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Mode {
    Structured,
    RawBytes,
}

/// Converts call arguments (name excluded) for the given mode.
///
/// On success the output has exactly one value per argument.
pub fn marshal_arguments(args: &[ScriptValue], mode: Mode) -> Result<Vec<EngineValue>, MarshalError> {
    match mode {
        Mode::Structured => marshal_structured(args),
        Mode::RawBytes => marshal_raw_with(args, raw::encode),
    }
}

fn marshal_structured(args: &[ScriptValue]) -> Result<Vec<EngineValue>, MarshalError> {
    let mut values = Vec::with_capacity(args.len());
    let mut failures = Vec::new();

    for (index, arg) in (1..).zip(args) {
        match EngineValue::from_script(arg) {
            Ok(value) => values.push(value),
            Err(error) => {
                warn!(index, %error, "failed to convert rpc argument");
                failures.push(ArgumentFailure { index, cause: FailureCause::Value(error) });
            }
        }
    }

    if failures.is_empty() {
        Ok(values)
    } else {
        Err(MarshalError { failures })
    }
}

/// Raw marshaling with a pluggable encoder. Stops at the first failure.
pub(crate) fn marshal_raw_with<F>(args: &[ScriptValue], mut encode: F) -> Result<Vec<EngineValue>, MarshalError>
where
    F: FnMut(&ScriptValue) -> raw::Result<Vec<u8>>,
{
    let mut values = Vec::with_capacity(args.len());

    for (index, arg) in (1..).zip(args) {
        match encode(arg) {
            Ok(bytes) => values.push(EngineValue::ByteArray(bytes)),
            Err(error) => {
                warn!(index, %error, "failed to serialize rpc argument as raw bytes");
                let failure = ArgumentFailure { index, cause: FailureCause::Raw(error) };
                return Err(MarshalError { failures: vec![failure] });
            }
        }
    }

    Ok(values)
}
