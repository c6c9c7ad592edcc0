//! Read-only view of the streamed-in virtual entities.

use mvalue::EntityRef;
use mvalue::ScriptValue;

use crate::native::Core;

/// Snapshot of the entities the core currently has streamed in.
///
/// The returned list is owned by the caller; later streaming changes do not
/// affect it.
pub fn list_streamed_entities<C: Core + ?Sized>(core: &C) -> Vec<EntityRef> {
    core.streamed_in_virtual_entities()
}

/// The snapshot as a script array of entity references.
pub fn to_script_array(entities: Vec<EntityRef>) -> ScriptValue {
    ScriptValue::Array(entities.into_iter().map(ScriptValue::Entity).collect())
}
