//! `DuckDB` connection opening.

use std::path::Path;

use ::duckdb::{Config, Connection};

/// Access mode for snapshot connections.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessMode {
    /// Used by `load`; never creates or modifies the file.
    ReadOnly,
    /// Used by `save`; creates the file when missing.
    ReadWrite,
}

/// Opens the snapshot database at `path`.
///
/// # Errors
/// Returns an error if the file cannot be opened as a `DuckDB` database or
/// connection configuration fails.
pub fn open_connection(path: &Path, mode: AccessMode) -> Result<Connection, ::duckdb::Error> {
    let connection = match mode {
        AccessMode::ReadWrite => Connection::open(path)?,
        AccessMode::ReadOnly => Connection::open_with_flags(
            path,
            Config::default().access_mode(::duckdb::AccessMode::ReadOnly)?,
        )?,
    };
    connection.execute_batch("PRAGMA disable_progress_bar;")?;
    Ok(connection)
}
