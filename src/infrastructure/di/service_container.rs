//! Service container for dependency injection
//!
//! Wires up the store and services from settings.

use std::sync::Arc;

use crate::application::services::BomService;
use crate::config::Settings;
use crate::infrastructure::traits::{BomStore, JsonFileStore};

/// Container holding all application services.
pub struct ServiceContainer {
    /// Application settings
    pub settings: Arc<Settings>,

    /// Part data source
    pub store: Arc<dyn BomStore>,

    /// Part hierarchy service
    pub bom: BomService,
}

impl ServiceContainer {
    /// Create a new service container backed by the configured data file.
    pub fn new(settings: Settings) -> Self {
        let store = Arc::new(JsonFileStore::new(settings.data_file.clone()));
        Self::with_deps(settings, store)
    }

    /// Create a service container with a custom store (for testing).
    pub fn with_deps(settings: Settings, store: Arc<dyn BomStore>) -> Self {
        let settings = Arc::new(settings);
        let bom = BomService::new(Arc::clone(&store));

        Self {
            settings,
            store,
            bom,
        }
    }
}
