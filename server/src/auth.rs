//! Player registration and credential storage
//!
//! A name is bound to the password it was first registered with. Later
//! registrations under that name act as a login and succeed only with the
//! same password. The check and the insert happen under one lock so two
//! racing registrations of a new name cannot both win.

use crate::persistence::{JsonTable, PersistenceError};
use log::{debug, info};
use std::collections::BTreeMap;
use std::path::PathBuf;
use tokio::sync::Mutex;

/// Result of a registration attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Registration {
    Accepted,
    Rejected,
}

pub struct CredentialStore {
    credentials: Mutex<BTreeMap<String, String>>,
    table: JsonTable<String>,
}

impl CredentialStore {
    /// Opens the store, loading any previously persisted credentials.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, PersistenceError> {
        let table = JsonTable::new(path);
        let credentials = table.load().await?;
        info!(
            "Loaded {} credentials from {}",
            credentials.len(),
            table.path().display()
        );

        Ok(Self {
            credentials: Mutex::new(credentials),
            table,
        })
    }

    /// Registers `name`, or logs it in if it already exists.
    ///
    /// A new name is written to disk before it is accepted; if the write
    /// fails the name stays unregistered.
    pub async fn register(
        &self,
        name: &str,
        password: &str,
    ) -> Result<Registration, PersistenceError> {
        let mut credentials = self.credentials.lock().await;

        match credentials.get(name) {
            Some(stored) if stored == password => {
                debug!("Player {} logged in", name);
                Ok(Registration::Accepted)
            }
            Some(_) => {
                info!("Rejected registration for {}: password mismatch", name);
                Ok(Registration::Rejected)
            }
            None => {
                let mut updated = credentials.clone();
                updated.insert(name.to_string(), password.to_string());
                self.table.store(&updated).await?;
                *credentials = updated;

                info!("Registered new player {}", name);
                Ok(Registration::Accepted)
            }
        }
    }

    /// Stored password for `name`, if registered.
    pub async fn lookup(&self, name: &str) -> Option<String> {
        self.credentials.lock().await.get(name).cloned()
    }

    pub async fn len(&self) -> usize {
        self.credentials.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.credentials.lock().await.is_empty()
    }
}
