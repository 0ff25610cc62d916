//! Shared application state.

use crate::config::Config;
use plancast_core::{Hub, HubConfig};
use std::sync::Arc;
use std::time::Duration;

/// Shared application state.
pub struct AppState {
    pub hub: Arc<Hub>,
    pub config: Config,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let hub = Arc::new(Hub::new(HubConfig {
            admin_grace: Duration::from_secs(config.admin_grace_secs),
        }));

        Self { hub, config }
    }
}
