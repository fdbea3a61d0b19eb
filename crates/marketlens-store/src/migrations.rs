use ::duckdb::{Connection, ToSql};

/// Snapshot layout version written to `snapshot_meta.schema_version`.
pub const SCHEMA_VERSION: i32 = 1;

/// Tables a readable snapshot must contain.
pub const SNAPSHOT_TABLES: [&str; 3] = ["snapshot_meta", "tickers", "series_rows"];

struct Migration {
    version: &'static str,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[Migration {
    version: "0001_snapshot_v1",
    sql: r#"
CREATE TABLE IF NOT EXISTS snapshot_meta (
    id INTEGER PRIMARY KEY,
    schema_version INTEGER NOT NULL,
    period TEXT NOT NULL,
    collected_at TEXT NOT NULL,
    saved_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
);

CREATE TABLE IF NOT EXISTS tickers (
    symbol TEXT PRIMARY KEY,
    sector TEXT NOT NULL,
    reference_json TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS series_rows (
    symbol TEXT NOT NULL,
    date DATE NOT NULL,
    open DOUBLE NOT NULL,
    high DOUBLE NOT NULL,
    low DOUBLE NOT NULL,
    close DOUBLE NOT NULL,
    volume UBIGINT NOT NULL,
    daily_return DOUBLE,
    volatility_30 DOUBLE,
    ma_20 DOUBLE,
    ma_50 DOUBLE,
    rsi_14 DOUBLE,
    PRIMARY KEY(symbol, date)
);
"#,
}];

pub fn apply_migrations(connection: &Connection) -> Result<(), ::duckdb::Error> {
    connection.execute_batch(
        r#"
CREATE TABLE IF NOT EXISTS schema_migrations (
    version TEXT PRIMARY KEY,
    applied_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
);
"#,
    )?;

    for migration in MIGRATIONS {
        let params: [&dyn ToSql; 1] = [&migration.version];
        let applied_count: i64 = connection.query_row(
            "SELECT COUNT(*) FROM schema_migrations WHERE version = ?",
            params.as_slice(),
            |row| row.get(0),
        )?;

        if applied_count == 0 {
            connection.execute_batch(migration.sql)?;
            connection.execute(
                "INSERT INTO schema_migrations (version) VALUES (?)",
                params.as_slice(),
            )?;
        }
    }

    Ok(())
}

/// Snapshot tables absent from the database.
pub fn missing_tables(connection: &Connection) -> Result<Vec<&'static str>, ::duckdb::Error> {
    let mut missing = Vec::new();
    for table in SNAPSHOT_TABLES {
        let params: [&dyn ToSql; 1] = [&table];
        let count: i64 = connection.query_row(
            "SELECT COUNT(*) FROM information_schema.tables WHERE table_name = ?",
            params.as_slice(),
            |row| row.get(0),
        )?;
        if count == 0 {
            missing.push(table);
        }
    }
    Ok(missing)
}
