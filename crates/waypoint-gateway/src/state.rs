use std::sync::Arc;

use waypoint_core::Repository;
use waypoint_vault::{FsBackupEngine, ServiceGate};

#[derive(Clone)]
pub struct AppState {
    repository: Arc<dyn Repository>,
    engine: Arc<FsBackupEngine>,
    gate: ServiceGate,
    base_url: String,
}

impl AppState {
    pub fn new(
        repository: Arc<dyn Repository>,
        engine: Arc<FsBackupEngine>,
        public_base_url: impl Into<String>,
    ) -> Self {
        let gate = engine.gate();
        Self {
            repository,
            engine,
            gate,
            base_url: public_base_url.into(),
        }
    }

    pub fn repository(&self) -> &dyn Repository {
        self.repository.as_ref()
    }

    pub fn engine(&self) -> &FsBackupEngine {
        &self.engine
    }

    pub fn gate(&self) -> &ServiceGate {
        &self.gate
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}
