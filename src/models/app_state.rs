use std::fmt;
use std::sync::Arc;

use crate::interfaces::harvest::{harvest_live, HarvestError};
use crate::settings::Settings;

type Runner = dyn Fn() -> Result<Vec<String>, HarvestError> + Send + Sync;

/// Application state structure for the web server
#[derive(Clone)]
pub struct AppState {
    runner: Arc<Runner>,
}

impl fmt::Debug for AppState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppState").finish_non_exhaustive()
    }
}

impl AppState {
    /// Each request runs the full pipeline against the provider.
    pub fn new(settings: Settings) -> Self {
        let settings = Arc::new(settings);
        Self::with_runner(move || {
            let mut links = Vec::new();
            harvest_live(&settings, &mut links)?;
            Ok(links)
        })
    }

    pub fn with_runner<F>(runner: F) -> Self
    where
        F: Fn() -> Result<Vec<String>, HarvestError> + Send + Sync + 'static,
    {
        AppState {
            runner: Arc::new(runner),
        }
    }

    /// Runs the pipeline on the calling thread and returns the links.
    pub fn collect_links(&self) -> Result<Vec<String>, HarvestError> {
        (self.runner)()
    }
}
