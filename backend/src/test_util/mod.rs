//! Helpers shared by unit and integration tests.

use std::sync::Arc;

use crate::config::{
    Config, CorsConfig, EmailConfig, LoggingConfig, ServerConfig, StoreBackend, StoreConfig,
};
use crate::mail::Mailer;
use crate::store::{DocumentStore, SqliteStore};
use crate::AppState;

pub fn test_config() -> Config {
    Config {
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 3001,
        },
        store: StoreConfig {
            backend: StoreBackend::Sqlite,
            sqlite_path: ":memory:".to_string(),
            firestore: None,
        },
        email: EmailConfig {
            from_address: "noreply@eduportal.test".to_string(),
            ..Default::default()
        },
        logging: LoggingConfig {
            level: "debug".to_string(),
        },
        cors: CorsConfig {
            origins: "*".to_string(),
        },
    }
}

/// State over a fresh in-memory store.
pub fn create_test_state(mailer: Arc<dyn Mailer>) -> AppState {
    let store = SqliteStore::in_memory().expect("Failed to open in-memory store");
    create_test_state_with_store(Arc::new(store), mailer)
}

pub fn create_test_state_with_store(
    store: Arc<dyn DocumentStore>,
    mailer: Arc<dyn Mailer>,
) -> AppState {
    AppState::new(test_config(), store, mailer)
}
