//! Calling units: the script resources that issue calls and own their answers.

use crate::marshal::Mode;

/// Strong type for resource identifiers.
#[derive(Copy, Clone, Debug, Hash, PartialEq, Eq)]
pub struct ResourceId(pub u64);

impl std::fmt::Display for ResourceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "resource-{}", self.0)
    }
}

/// Per-resource settings that shape how its calls are sent.
#[derive(Clone, Debug, Default)]
pub struct ResourceConfig {
    /// Send arguments as raw byte buffers instead of engine values.
    pub raw_emit_enabled: bool,
}

/// A loaded script resource.
///
/// Pending calls refer to their owner by [`ResourceId`] only; a `Resource` never
/// keeps a call alive, and stopping it cancels everything it owns.
#[derive(Clone, Debug)]
pub struct Resource {
    id: ResourceId,
    name: String,
    config: ResourceConfig,
}

impl Resource {
    pub fn new(id: ResourceId, name: impl Into<String>) -> Self {
        Self { id, name: name.into(), config: ResourceConfig::default() }
    }

    pub fn with_config(mut self, config: ResourceConfig) -> Self {
        self.config = config;
        self
    }

    pub fn id(&self) -> ResourceId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_raw_emit_enabled(&self) -> bool {
        self.config.raw_emit_enabled
    }

    pub fn set_raw_emit_enabled(&mut self, enabled: bool) {
        self.config.raw_emit_enabled = enabled;
    }

    /// The argument encoding this resource's calls use right now.
    pub fn mode(&self) -> Mode {
        if self.config.raw_emit_enabled { Mode::RawBytes } else { Mode::Structured }
    }
}
