// Application state module
// Shared by every connection on the server

use std::sync::atomic::AtomicBool;
use tokio::sync::RwLock;

use super::types::Config;
use crate::logger::AccessLogFormat;
use crate::store::Store;

/// Application state
pub struct AppState {
    pub config: Config,
    /// Mutations take the write lock, so one completes before the next begins
    pub store: RwLock<Store>,

    // Cached config values for fast access without locks
    pub cached_access_log: AtomicBool,
    pub access_log_format: AccessLogFormat,
}

impl AppState {
    pub fn new(config: Config, store: Store) -> Self {
        let cached_access_log = AtomicBool::new(config.logging.access_log);
        let access_log_format = AccessLogFormat::parse(&config.logging.access_log_format);

        Self {
            config,
            store: RwLock::new(store),
            cached_access_log,
            access_log_format,
        }
    }
}
