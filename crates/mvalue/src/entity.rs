//! Weak references to engine-owned objects.

/// The class of engine object an [`EntityRef`] points at.
#[derive(Copy, Clone, Debug, Hash, PartialEq, Eq)]
pub enum EntityKind {
    Player,
    Vehicle,
    Ped,
    Object,
    VirtualEntity,
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Player => "player",
            Self::Vehicle => "vehicle",
            Self::Ped => "ped",
            Self::Object => "object",
            Self::VirtualEntity => "virtual-entity",
        };
        f.write_str(name)
    }
}

/// Identity of an engine object.
///
/// An `EntityRef` is a lookup key, not a handle: holding one keeps nothing alive,
/// and the object it names may already be gone when it is used.
#[derive(Copy, Clone, Debug, Hash, PartialEq, Eq)]
pub struct EntityRef {
    pub kind: EntityKind,
    pub id: u32,
}

impl EntityRef {
    pub fn new(kind: EntityKind, id: u32) -> Self {
        Self { kind, id }
    }
}

impl std::fmt::Display for EntityRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.kind, self.id)
    }
}
