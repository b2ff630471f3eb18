use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Maintenance flag shared between the vault and the serving layer.
///
/// The engine engages the gate for the duration of a restore. The
/// serving layer must consult it before accepting link-resolution or
/// CRUD traffic, since ordinary reads race with the in-place overwrite
/// of the data file. After a `CorruptState` restore outcome the gate
/// stays engaged until an operator intervenes.
#[derive(Debug, Clone, Default)]
pub struct ServiceGate {
    engaged: Arc<AtomicBool>,
}

impl ServiceGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn engage(&self) {
        self.engaged.store(true, Ordering::SeqCst);
    }

    pub fn release(&self) {
        self.engaged.store(false, Ordering::SeqCst);
    }

    pub fn is_engaged(&self) -> bool {
        self.engaged.load(Ordering::SeqCst)
    }
}
