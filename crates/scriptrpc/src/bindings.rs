//! # Script Bindings
//!
//! The functions script code sees, registered under [`MODULE_NAME`]. Each binding
//! checks its arity and argument types before it touches the dispatcher.

use mvalue::EngineValue;
use mvalue::ScriptValue;

use crate::correlator::PendingAnswer;
use crate::dispatcher::Dispatcher;
use crate::entities;
use crate::error::Error;
use crate::error::Result;
use crate::native::AnswerId;
use crate::native::Core;
use crate::resource::Resource;

/// Module the bindings are installed under.
pub const MODULE_NAME: &str = "cppBindings";

/// Module shared by every resource on the same runtime.
pub const SHARED_MODULE_NAME: &str = "sharedCppBindings";

/// Inclusive bounds on the number of script arguments.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Arity {
    pub min: usize,
    pub max: usize,
}

impl Arity {
    pub const fn exactly(n: usize) -> Self {
        Self { min: n, max: n }
    }

    pub const fn between(min: usize, max: usize) -> Self {
        Self { min, max }
    }

    pub fn check(&self, function: &'static str, got: usize) -> Result<()> {
        if got < self.min || got > self.max {
            return Err(Error::ArityViolation { function, min: self.min, max: self.max, got });
        }
        Ok(())
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Binding {
    pub name: &'static str,
    pub arity: Arity,
}

pub const ANSWER_RPC: Binding = Binding { name: "answerRPC", arity: Arity::exactly(3) };
pub const SEND_RPC: Binding = Binding { name: "sendRPC", arity: Arity::between(1, 32) };
pub const GET_STREAMED_IN_VIRTUAL_ENTITIES: Binding =
    Binding { name: "getStreamedInVirtualEntities", arity: Arity::exactly(0) };

/// Everything installed under [`MODULE_NAME`].
pub const BINDINGS: [Binding; 3] = [ANSWER_RPC, SEND_RPC, GET_STREAMED_IN_VIRTUAL_ENTITIES];

/// `answerRPC(answerId, answer, error)`
///
/// An answer for an identifier that is not pending is dropped silently.
pub fn answer_rpc<C: Core>(dispatcher: &mut Dispatcher<C>, args: &[ScriptValue]) -> Result<()> {
    ANSWER_RPC.arity.check(ANSWER_RPC.name, args.len())?;

    let id = answer_id(&args[0])?;
    let answer = EngineValue::from_script(&args[1]).map_err(|_| Error::ArgumentTypeMismatch {
        function: ANSWER_RPC.name,
        index: 1,
        expected: "serializable value",
        found: args[1].type_name(),
    })?;
    let error = string_arg(ANSWER_RPC.name, args, 2)?;

    dispatcher.answer_rpc(id, answer, error);
    Ok(())
}

/// `sendRPC(name, ...args)`
pub fn send_rpc<C: Core>(dispatcher: &mut Dispatcher<C>, resource: &Resource, args: &[ScriptValue]) -> Result<PendingAnswer> {
    SEND_RPC.arity.check(SEND_RPC.name, args.len())?;

    let name = string_arg(SEND_RPC.name, args, 0)?;
    dispatcher.send_rpc(resource, name, &args[1..])
}

/// `getStreamedInVirtualEntities()`
pub fn get_streamed_in_virtual_entities<C: Core>(dispatcher: &Dispatcher<C>, args: &[ScriptValue]) -> Result<ScriptValue> {
    GET_STREAMED_IN_VIRTUAL_ENTITIES.arity.check(GET_STREAMED_IN_VIRTUAL_ENTITIES.name, args.len())?;
    Ok(entities::to_script_array(dispatcher.streamed_entities()))
}

/// Reads a script number as a 16-bit answer identifier.
fn answer_id(value: &ScriptValue) -> Result<AnswerId> {
    match value {
        ScriptValue::Number(n) => {
            if n.fract() != 0.0 || *n < 0.0 || *n > u16::MAX as f64 {
                return Err(Error::AnswerIdOutOfRange(*n));
            }
            Ok(AnswerId(*n as u16))
        }
        ScriptValue::BigInt(n) => u16::try_from(*n)
            .map(AnswerId)
            .map_err(|_| Error::AnswerIdOutOfRange(*n as f64)),
        other => Err(Error::ArgumentTypeMismatch {
            function: ANSWER_RPC.name,
            index: 0,
            expected: "number",
            found: other.type_name(),
        }),
    }
}

fn string_arg<'a>(function: &'static str, args: &'a [ScriptValue], index: usize) -> Result<&'a str> {
    args[index].as_str().ok_or(Error::ArgumentTypeMismatch {
        function,
        index,
        expected: "string",
        found: args[index].type_name(),
    })
}
