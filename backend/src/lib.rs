pub mod config;
pub mod error;
pub mod logging;
pub mod mail;
pub mod routes;
pub mod services;
pub mod store;
pub mod test_util;

pub use config::Config;
pub use error::Error;
pub use mail::{EmailMessage, Mailer};
pub use services::{NoteService, ProfileService};
pub use store::{DocumentStore, StoreError};

use std::sync::Arc;

/// Shared application state.
///
/// Built once at startup and never mutated afterwards; handlers only read it.
pub struct AppState {
    pub config: Config,
    /// Process-wide store client, shared by both services.
    pub store: Arc<dyn DocumentStore>,
    pub profiles: ProfileService,
    pub notes: NoteService,
    pub mailer: Arc<dyn Mailer>,
}

impl AppState {
    pub fn new(config: Config, store: Arc<dyn DocumentStore>, mailer: Arc<dyn Mailer>) -> Self {
        Self {
            config,
            profiles: ProfileService::new(store.clone()),
            notes: NoteService::new(store.clone()),
            store,
            mailer,
        }
    }
}
