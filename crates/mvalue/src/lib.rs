//! # MValue
//!
//! The dynamic value model shared by the script layer and the native core.
//!
//! ## Architecture
//!
//! - [`ScriptValue`] is what script code hands us: loosely typed, possibly holding
//!   things that cannot leave the process (closures).
//! - [`EngineValue`] is the engine-wide tagged union that crosses the native boundary.
//! - [`raw`] is the fast path: one script value straight to bytes, skipping `EngineValue`.
//!
//! ## Invariants
//! - **Closed Shapes**: Both value types are exhaustive enums. A new shape is a new
//!   variant, and every conversion match must handle it.
//! - **No Silent Null**: Unrepresentable values are errors, never coerced to null.
//! - **Bounded Recursion**: Conversions refuse nesting deeper than [`MAX_DEPTH`].

pub mod engine;
pub mod entity;
pub mod raw;
pub mod script;

pub use engine::EngineValue;
pub use engine::ValueError;
pub use entity::EntityKind;
pub use entity::EntityRef;
pub use script::FunctionId;
pub use script::ScriptValue;

/// The maximum nesting depth of lists/objects before a conversion fails.
pub const MAX_DEPTH: usize = 64;
