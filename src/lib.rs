//! Freelance Hub: session, onboarding and view routing for a freelance
//! marketplace.

pub mod api;
pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod onboarding;
pub mod session;
pub mod store;
pub mod views;

use std::sync::Arc;

use tracing::{info, warn};

use crate::config::HubConfig;
use crate::session::SessionStore;
use crate::store::{MemoryStorage, SlotStorage};

/// Open the configured storage and hydrate a session store over it.
///
/// A backend that cannot be reached at startup is replaced by in-memory
/// storage; any other storage failure is returned.
pub async fn open_session(config: &HubConfig) -> error::Result<Arc<SessionStore>> {
    let storage: Arc<dyn SlotStorage> = match store::open(&config.storage).await {
        Ok(storage) => storage,
        Err(e) if e.is_unavailable() => {
            warn!(
                backend = ?config.storage,
                error = %e,
                "Storage unavailable at startup, session will not be saved"
            );
            Arc::new(MemoryStorage::new())
        }
        Err(e) => return Err(e.into()),
    };
    info!(backend = storage.name(), auth = ?config.auth_mode, "Storage ready");

    let auth = session::authenticator(config.auth_mode, Arc::clone(&storage));
    Ok(SessionStore::open(storage, auth).await)
}
