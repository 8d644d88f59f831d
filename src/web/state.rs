use crate::{Config, model::ModelManager};

/// Shared by every handler. Cloning is cheap: the pool is reference counted
/// and the config lives for the whole process.
#[derive(Debug, Clone)]
pub struct AppState {
    mm: ModelManager,
    config: &'static Config,
}

impl AppState {
    pub fn new(mm: ModelManager, config: &'static Config) -> Self {
        Self { mm, config }
    }

    pub fn pool(&self) -> &ModelManager {
        &self.mm
    }

    pub fn config(&self) -> &'static Config {
        self.config
    }
}
