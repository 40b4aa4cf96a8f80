use std::env;
use std::time::Duration;

use mongodb::bson::doc;
use mongodb::options::ClientOptions;
use mongodb::sync::{Client, Collection};

use super::error::StoreError;
use crate::models::Student;

/// Connection string used when `MONGODB_URI` is unset (local standard port).
const DEFAULT_URI: &str = "mongodb://localhost:27017";
/// Database name used when `DB_NAME` is unset.
const DEFAULT_DB_NAME: &str = "crud_db";
/// Collection name used when `COLLECTION_NAME` is unset.
const DEFAULT_COLLECTION: &str = "students";
/// Upper bound on how long the startup ping (and every later blocking call)
/// waits for a reachable server before the driver gives up.
const SERVER_SELECTION_TIMEOUT: Duration = Duration::from_secs(3);

/// Where the records live, resolved once at startup from the environment.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub uri: String,
    pub db_name: String,
    pub collection: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            uri: DEFAULT_URI.to_string(),
            db_name: DEFAULT_DB_NAME.to_string(),
            collection: DEFAULT_COLLECTION.to_string(),
        }
    }
}

impl StoreConfig {
    /// Read `MONGODB_URI` / `DB_NAME` / `COLLECTION_NAME`, falling back to
    /// the defaults for unset or blank values.
    pub fn from_env() -> Self {
        Self {
            uri: env_or("MONGODB_URI", DEFAULT_URI),
            db_name: env_or("DB_NAME", DEFAULT_DB_NAME),
            collection: env_or("COLLECTION_NAME", DEFAULT_COLLECTION),
        }
    }

    /// One-line description of the target shown in the header status line.
    pub fn describe(&self) -> String {
        format!(
            "{} • db: {} • collection: {}",
            self.uri, self.db_name, self.collection
        )
    }
}

fn env_or(key: &str, fallback: &str) -> String {
    env::var(key)
        .ok()
        .filter(|value| !value.trim().is_empty())
        .unwrap_or_else(|| fallback.to_string())
}

/// Connection outcome held for the process lifetime. The explicit variant
/// (rather than an optional handle) forces every data path through
/// [`Store::handle`], so a failed startup connection degrades to a
/// display-only app instead of a crash.
pub enum Store {
    Connected(StoreHandle),
    Disconnected { reason: String },
}

/// Live client plus the typed collection the adapter operates on.
pub struct StoreHandle {
    config: StoreConfig,
    students: Collection<Student>,
}

impl StoreHandle {
    pub(crate) fn students(&self) -> &Collection<Student> {
        &self.students
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }
}

impl Store {
    /// Attempt the one and only connection. Failure is captured, not
    /// propagated: the UI still starts and reports the reason. There is no
    /// retry until the process restarts.
    pub fn connect(config: StoreConfig) -> Self {
        match open_handle(config) {
            Ok(handle) => Store::Connected(handle),
            Err(err) => Store::Disconnected {
                reason: err.to_string(),
            },
        }
    }

    /// Checked entry point used by every store operation. Absence of a
    /// handle is reported as a connection error before any call is made.
    pub fn handle(&self) -> Result<&StoreHandle, StoreError> {
        match self {
            Store::Connected(handle) => Ok(handle),
            Store::Disconnected { reason } => Err(StoreError::Disconnected(reason.clone())),
        }
    }

    pub fn is_connected(&self) -> bool {
        matches!(self, Store::Connected(_))
    }

    /// Text for the permanent header status line.
    pub fn status_line(&self) -> String {
        match self {
            Store::Connected(handle) => format!("Connected to {}", handle.config.describe()),
            Store::Disconnected { reason } => format!("MongoDB connection failed: {reason}"),
        }
    }
}

/// Parse the URI, cap the driver timeouts, and verify liveness with a ping
/// before handing back the collection handle.
fn open_handle(config: StoreConfig) -> Result<StoreHandle, mongodb::error::Error> {
    let mut options = ClientOptions::parse(&config.uri).run()?;
    options.server_selection_timeout = Some(SERVER_SELECTION_TIMEOUT);
    options.connect_timeout = Some(SERVER_SELECTION_TIMEOUT);

    let client = Client::with_options(options)?;
    client.database("admin").run_command(doc! {"ping": 1}).run()?;

    let students = client
        .database(&config.db_name)
        .collection(&config.collection);

    Ok(StoreHandle { config, students })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_targets_local_server() {
        let config = StoreConfig::default();
        assert_eq!(config.uri, "mongodb://localhost:27017");
        assert_eq!(config.db_name, "crud_db");
        assert_eq!(config.collection, "students");
    }

    #[test]
    fn describe_mentions_every_resolved_component() {
        let config = StoreConfig {
            uri: "mongodb://db.example:27017".to_string(),
            db_name: "school".to_string(),
            collection: "pupils".to_string(),
        };
        let described = config.describe();
        assert!(described.contains("mongodb://db.example:27017"));
        assert!(described.contains("school"));
        assert!(described.contains("pupils"));
    }

    #[test]
    fn disconnected_store_refuses_to_hand_out_a_handle() {
        let store = Store::Disconnected {
            reason: "server selection timed out".to_string(),
        };
        assert!(!store.is_connected());
        match store.handle() {
            Err(StoreError::Disconnected(reason)) => {
                assert!(reason.contains("timed out"));
            }
            _ => panic!("expected a Disconnected error"),
        }
    }

    #[test]
    fn disconnected_status_line_reports_the_failure() {
        let store = Store::Disconnected {
            reason: "connection refused".to_string(),
        };
        assert!(store.status_line().contains("connection refused"));
    }
}
