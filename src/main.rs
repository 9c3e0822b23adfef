use std::sync::Arc;

mod api;
mod config;
mod error;
mod logger;
mod server;
mod store;

use server::SignalHandler;

/// Config file used when no path is given on the command line
const DEFAULT_CONFIG_PATH: &str = "config";

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());
    let cfg = config::Config::load_from(&config_path)?;
    logger::init(&cfg)?;

    // Requests are handled one at a time on a single thread
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    runtime.block_on(async_main(cfg))
}

async fn async_main(cfg: config::Config) -> Result<(), Box<dyn std::error::Error>> {
    let addr = cfg.get_socket_addr()?;

    let store = store::Store::open(&cfg.storage.data_file).map_err(|e| {
        logger::log_error(&e.to_string());
        e
    })?;
    let listener = server::create_listener(addr)?;

    logger::log_server_start(
        &addr,
        &cfg,
        store.students().len(),
        store.selections().len(),
    );

    let state = Arc::new(config::AppState::new(cfg, store));

    // Use LocalSet for spawn_local support
    let local = tokio::task::LocalSet::new();
    local
        .run_until(async move {
            let signals = Arc::new(SignalHandler::new());
            server::start_signal_handler(Arc::clone(&signals))?;
            server::start_server_loop(listener, state, Arc::clone(&signals.shutdown)).await?;
            logger::log_server_stop();
            Ok::<(), Box<dyn std::error::Error>>(())
        })
        .await
}
