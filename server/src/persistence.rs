//! Durable key/value tables stored as JSON files
//!
//! Each table is rewritten in full on every store. The new contents go to a
//! sibling `.tmp` file which is synced and then renamed over the target, so a
//! crash leaves either the old table or the new one on disk, never a mix.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::BTreeMap;
use std::io;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::io::AsyncWriteExt;

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("i/o error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid table {}: {source}", .path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// A name-keyed table persisted at a fixed path.
#[derive(Debug)]
pub struct JsonTable<V> {
    path: PathBuf,
    _value: PhantomData<fn() -> V>,
}

impl<V> JsonTable<V>
where
    V: Serialize + DeserializeOwned,
{
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            _value: PhantomData,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the table; a missing file is an empty table.
    pub async fn load(&self) -> Result<BTreeMap<String, V>, PersistenceError> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(|source| PersistenceError::Json {
                path: self.path.clone(),
                source,
            }),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(source) => Err(self.io_error(source)),
        }
    }

    /// Replaces the stored table with `table`.
    pub async fn store(&self, table: &BTreeMap<String, V>) -> Result<(), PersistenceError> {
        let bytes = serde_json::to_vec_pretty(table).map_err(|source| PersistenceError::Json {
            path: self.path.clone(),
            source,
        })?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|source| self.io_error(source))?;
            }
        }

        let temp = self.temp_path();
        let mut file = tokio::fs::File::create(&temp)
            .await
            .map_err(|source| self.io_error(source))?;
        file.write_all(&bytes)
            .await
            .map_err(|source| self.io_error(source))?;
        file.sync_all()
            .await
            .map_err(|source| self.io_error(source))?;
        drop(file);

        tokio::fs::rename(&temp, &self.path)
            .await
            .map_err(|source| self.io_error(source))
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|name| name.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn io_error(&self, source: io::Error) -> PersistenceError {
        PersistenceError::Io {
            path: self.path.clone(),
            source,
        }
    }
}
