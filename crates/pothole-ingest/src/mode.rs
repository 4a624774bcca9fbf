//! Process-wide data-origin mode.
//!
//! The mode only decides which producers are active (see
//! [`DemoSource`](crate::source::DemoSource)); the pipeline never consults it.

use std::sync::Arc;

use parking_lot::RwLock;
use pothole_core::{DEFAULT_MODE, DEMO_MODE};

/// Shared, mutable mode setting. Clones share the same value.
#[derive(Debug, Clone)]
pub struct ModeHandle {
    inner: Arc<RwLock<String>>,
}

impl Default for ModeHandle {
    fn default() -> Self {
        Self::new(DEFAULT_MODE)
    }
}

impl ModeHandle {
    pub fn new(initial: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(initial.into())),
        }
    }

    /// Current mode.
    pub fn get(&self) -> String {
        self.inner.read().clone()
    }

    /// Replace the mode, returning the previous value.
    pub fn set(&self, mode: impl Into<String>) -> String {
        std::mem::replace(&mut *self.inner.write(), mode.into())
    }

    /// Whether simulated readings should be produced.
    pub fn is_demo(&self) -> bool {
        *self.inner.read() == DEMO_MODE
    }
}
