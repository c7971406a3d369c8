//! Application state for the API server

use std::sync::Arc;

use crate::config::Config;
use crate::error::Result;
use crate::pipeline::Refresher;
use crate::sources::{ExternalSources, SourceClient};
use crate::store::CountryStore;

/// API server state
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<CountryStore>,
    pub refresher: Arc<Refresher>,
}

impl AppState {
    /// Open the configured database and wire the HTTP sources
    pub fn from_config(config: &Config) -> Result<Self> {
        let store = Arc::new(CountryStore::open(&config.db_path)?);
        let sources = Arc::new(SourceClient::new(config)?);
        Ok(Self::new(store, sources, config))
    }

    pub fn new(store: Arc<CountryStore>, sources: Arc<dyn ExternalSources>, config: &Config) -> Self {
        let refresher = Arc::new(Refresher::new(
            sources,
            store.clone(),
            config.image_path.clone(),
            config.gdp_seed,
        ));

        Self { store, refresher }
    }
}
