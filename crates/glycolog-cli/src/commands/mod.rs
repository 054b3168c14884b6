pub mod account;
pub mod config;
pub mod log;
pub mod stats;

use glycolog_core::{Config, CoreError, StoreClient};

/// Store client for the configured backend.
pub fn store_client() -> Result<StoreClient, CoreError> {
    let config = Config::load()?;
    Ok(StoreClient::from_config(&config.store)?)
}
