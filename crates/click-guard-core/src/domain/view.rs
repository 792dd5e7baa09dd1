//! The UI element a click is dispatched against.
//!
//! The host UI framework owns its widgets; Click Guard only ever sees them
//! through an `Arc<View>` handle and never controls their lifetime.  Two
//! handles refer to the same target exactly when they point at the same
//! allocation, which is what [`View::same_target`] checks.  Two views with
//! identical labels are still different targets.

use std::sync::Arc;

/// A host-owned UI element that can originate click events.
#[derive(Debug)]
pub struct View {
    label: String,
}

impl View {
    /// Creates a new element wrapped in the shared handle the host hands out.
    pub fn new(label: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            label: label.into(),
        })
    }

    /// Human-readable label, used only for logging.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Returns `true` if both handles refer to the same element.
    pub fn same_target(a: &Arc<View>, b: &Arc<View>) -> bool {
        Arc::ptr_eq(a, b)
    }
}
