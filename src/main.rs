use std::sync::Arc;

use eyre::{Context, Result};
use teachbot::api::{AppState, serve};
use teachbot::backend::ProviderRouter;
use teachbot::cli::Command;
use teachbot::config::init_logger;
use teachbot::storage::new_storage;

#[tokio::main]
async fn main() -> Result<()> {
    let cmd = Command::new();
    if cmd.version() {
        cmd.print_version();
        return Ok(());
    }

    std::panic::set_hook(Box::new(|panic_info| {
        better_panic::Settings::auto().create_panic_handler()(panic_info);
    }));

    let config = cmd.get_config()?;
    init_logger(&config.log)?;
    log::debug!("Logger initialized");

    let storage = new_storage(&config.storage)
        .await
        .wrap_err("initializing storage")?;
    log::info!("Storage initialized");

    let router = ProviderRouter::new(&config.provider);
    let state = Arc::new(AppState::new(storage, router));

    serve(&config.server, state).await
}
