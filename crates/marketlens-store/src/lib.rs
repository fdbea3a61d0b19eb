//! Single-file `DuckDB` persistence for collected universes.
//!
//! A [`SnapshotStore`] holds at most one snapshot. [`SnapshotStore::save`]
//! replaces it atomically inside one transaction; [`SnapshotStore::load`]
//! reads it back exactly, including the placement of undefined features.

pub mod connection;
pub mod migrations;
mod snapshot;

use std::env;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use ::duckdb::Connection;
use marketlens_core::Universe;
use thiserror::Error;

pub use connection::AccessMode;
pub use migrations::SCHEMA_VERSION;

/// File name of the snapshot inside the marketlens home directory.
pub const SNAPSHOT_FILE: &str = "snapshot.duckdb";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("no snapshot found at {}", path.display())]
    NotFound { path: PathBuf },

    #[error("snapshot is corrupt: {0}")]
    CorruptData(String),

    #[error(transparent)]
    DuckDb(#[from] ::duckdb::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("snapshot serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    pub db_path: PathBuf,
}

impl StoreConfig {
    /// Snapshot stored as [`SNAPSHOT_FILE`] under `home`.
    pub fn in_home(home: impl AsRef<Path>) -> Self {
        Self {
            db_path: home.as_ref().join(SNAPSHOT_FILE),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self::in_home(resolve_marketlens_home())
    }
}

/// Atomic snapshot persistence for a [`Universe`].
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    config: StoreConfig,
}

impl SnapshotStore {
    /// Creates a store handle. Nothing touches the disk until `save`.
    pub fn new(config: StoreConfig) -> Self {
        Self { config }
    }

    pub fn open_default() -> Self {
        Self::new(StoreConfig::default())
    }

    pub fn path(&self) -> &Path {
        self.config.db_path.as_path()
    }

    /// Replaces any prior snapshot with `universe`.
    ///
    /// A file at the snapshot path that does not open as a database is
    /// discarded first, so a corrupt snapshot can always be overwritten.
    ///
    /// # Errors
    /// Any failure rolls the transaction back, leaving the previous
    /// snapshot intact.
    pub fn save(&self, universe: &Universe) -> Result<(), StoreError> {
        if let Some(parent) = self.path().parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let connection = self.open_for_write()?;
        migrations::apply_migrations(&connection)?;

        connection.execute_batch("BEGIN TRANSACTION")?;
        let result = snapshot::write_universe(&connection, universe);
        let rows = finalize_transaction(&connection, result)?;

        tracing::info!(
            path = %self.path().display(),
            tickers = universe.len(),
            rows,
            "snapshot saved"
        );
        Ok(())
    }

    /// Loads the stored universe.
    ///
    /// # Errors
    /// [`StoreError::NotFound`] when the file is absent or holds no snapshot;
    /// [`StoreError::CorruptData`] when it cannot be opened as a database,
    /// snapshot tables are missing, the schema version is unknown, or rows
    /// fail validation.
    pub fn load(&self) -> Result<Universe, StoreError> {
        let connection = self.open_for_read()?;
        let universe = snapshot::read_universe(&connection)?.ok_or_else(|| self.not_found())?;

        tracing::debug!(
            path = %self.path().display(),
            tickers = universe.len(),
            "snapshot loaded"
        );
        Ok(universe)
    }

    /// Whether a readable snapshot is present.
    ///
    /// # Errors
    /// Fails with [`StoreError::CorruptData`] for an unreadable file.
    pub fn exists(&self) -> Result<bool, StoreError> {
        match self.open_for_read() {
            Ok(connection) => snapshot::has_snapshot(&connection),
            Err(StoreError::NotFound { .. }) => Ok(false),
            Err(error) => Err(error),
        }
    }

    /// Deletes the snapshot file and its write-ahead log. Missing files are fine.
    pub fn clear(&self) -> Result<(), StoreError> {
        let mut wal = OsString::from(self.path().as_os_str());
        wal.push(".wal");

        for path in [self.config.db_path.clone(), PathBuf::from(wal)] {
            match fs::remove_file(&path) {
                Ok(()) => {}
                Err(error) if error.kind() == std::io::ErrorKind::NotFound => {}
                Err(error) => return Err(error.into()),
            }
        }
        tracing::info!(path = %self.path().display(), "snapshot cleared");
        Ok(())
    }

    fn open_for_write(&self) -> Result<Connection, StoreError> {
        match connection::open_connection(self.path(), AccessMode::ReadWrite) {
            Ok(connection) => Ok(connection),
            Err(error) if self.path().exists() => {
                tracing::warn!(
                    path = %self.path().display(),
                    error = %error,
                    "discarding unreadable snapshot file"
                );
                self.clear()?;
                Ok(connection::open_connection(self.path(), AccessMode::ReadWrite)?)
            }
            Err(error) => Err(error.into()),
        }
    }

    fn open_for_read(&self) -> Result<Connection, StoreError> {
        if !self.path().exists() {
            return Err(self.not_found());
        }

        let connection = connection::open_connection(self.path(), AccessMode::ReadOnly)
            .map_err(|error| {
                StoreError::CorruptData(format!(
                    "cannot open {} as a snapshot database: {error}",
                    self.path().display()
                ))
            })?;

        let missing = migrations::missing_tables(&connection)
            .map_err(|error| StoreError::CorruptData(error.to_string()))?;
        if !missing.is_empty() {
            return Err(StoreError::CorruptData(format!(
                "missing snapshot tables: {}",
                missing.join(", ")
            )));
        }
        Ok(connection)
    }

    fn not_found(&self) -> StoreError {
        StoreError::NotFound {
            path: self.config.db_path.clone(),
        }
    }
}

fn finalize_transaction<T>(
    connection: &Connection,
    result: Result<T, StoreError>,
) -> Result<T, StoreError> {
    match result {
        Ok(value) => {
            connection.execute_batch("COMMIT")?;
            Ok(value)
        }
        Err(error) => {
            let _ = connection.execute_batch("ROLLBACK");
            tracing::warn!(error = %error, "snapshot save rolled back");
            Err(error)
        }
    }
}

/// Data directory: `MARKETLENS_HOME`, else `$HOME/.marketlens`, else `.marketlens`.
pub fn resolve_marketlens_home() -> PathBuf {
    if let Some(path) = env::var_os("MARKETLENS_HOME") {
        let path = PathBuf::from(path);
        if !path.as_os_str().is_empty() {
            return path;
        }
    }

    if let Some(home) = env::var_os("HOME") {
        return PathBuf::from(home).join(".marketlens");
    }

    PathBuf::from(".marketlens")
}
