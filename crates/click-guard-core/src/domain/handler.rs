//! Click handler identity and the exemption marker.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a registered click handler, derived from UUID v4.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HandlerId(pub Uuid);

impl HandlerId {
    /// Allocates a fresh random identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for HandlerId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for HandlerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Resolved metadata for one click handler instance.
///
/// Immutable once built: the exemption marker is fixed at the point the
/// handler is defined and cannot be toggled afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandlerDescriptor {
    id: HandlerId,
    name: String,
    exempt: bool,
}

impl HandlerDescriptor {
    /// Describes a handler that is subject to debouncing.
    pub fn new(id: HandlerId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            exempt: false,
        }
    }

    /// Describes a handler that must never be debounced.
    pub fn exempt(id: HandlerId, name: impl Into<String>) -> Self {
        Self {
            exempt: true,
            ..Self::new(id, name)
        }
    }

    pub fn id(&self) -> HandlerId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns `true` if the handler carries the exemption marker.
    pub fn is_exempt(&self) -> bool {
        self.exempt
    }
}
