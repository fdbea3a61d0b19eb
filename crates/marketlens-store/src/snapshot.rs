//! Row-level encoding of a [`Universe`] into the snapshot tables.

use std::collections::BTreeMap;
use std::fmt::Display;

use ::duckdb::{Connection, Error as DuckError, ToSql};
use marketlens_core::{
    Bar, EnrichedRow, EnrichedSeries, HistoryPeriod, ReferenceInfo, Symbol, TickerRecord,
    TradeDate, Universe, UniverseMeta, UtcDateTime,
};

use crate::migrations::SCHEMA_VERSION;
use crate::StoreError;

const SNAPSHOT_ID: i32 = 1;

/// Replaces the stored snapshot with `universe`. Returns the series rows written.
///
/// Runs inside the caller's transaction.
pub(crate) fn write_universe(connection: &Connection, universe: &Universe) -> Result<usize, StoreError> {
    connection.execute_batch(
        "DELETE FROM series_rows; DELETE FROM tickers; DELETE FROM snapshot_meta;",
    )?;

    let meta = universe.meta();
    let period = meta.period.as_str();
    let collected_at = meta.collected_at.format_rfc3339();
    let params: [&dyn ToSql; 4] = [&SNAPSHOT_ID, &SCHEMA_VERSION, &period, &collected_at];
    connection.execute(
        "INSERT INTO snapshot_meta (id, schema_version, period, collected_at) VALUES (?, ?, ?, ?)",
        params.as_slice(),
    )?;

    let mut insert_ticker =
        connection.prepare("INSERT INTO tickers (symbol, sector, reference_json) VALUES (?, ?, ?)")?;
    let mut insert_row = connection.prepare(
        "INSERT INTO series_rows \
         (symbol, date, open, high, low, close, volume, daily_return, volatility_30, ma_20, ma_50, rsi_14) \
         VALUES (?, CAST(? AS DATE), ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )?;

    let mut written = 0;
    for record in universe.records() {
        let symbol = record.symbol.as_str();
        let reference_json = serde_json::to_string(&record.reference)?;
        let params: [&dyn ToSql; 3] = [&symbol, &record.sector, &reference_json];
        insert_ticker.execute(params.as_slice())?;

        for row in record.series.rows() {
            let date = row.date().format_iso();
            let params: [&dyn ToSql; 12] = [
                &symbol,
                &date,
                &row.bar.open,
                &row.bar.high,
                &row.bar.low,
                &row.bar.close,
                &row.bar.volume,
                &row.daily_return,
                &row.volatility_30,
                &row.ma_20,
                &row.ma_50,
                &row.rsi_14,
            ];
            insert_row.execute(params.as_slice())?;
            written += 1;
        }
    }

    Ok(written)
}

/// Whether the metadata row of a snapshot is present.
pub(crate) fn has_snapshot(connection: &Connection) -> Result<bool, StoreError> {
    let count: i64 = connection
        .query_row("SELECT COUNT(*) FROM snapshot_meta", [], |row| row.get(0))
        .map_err(corrupt)?;
    Ok(count > 0)
}

/// Reads the stored universe; `None` when no snapshot was ever written.
pub(crate) fn read_universe(connection: &Connection) -> Result<Option<Universe>, StoreError> {
    let Some(meta) = read_meta(connection)? else {
        return Ok(None);
    };

    let tickers = read_tickers(connection)?;
    let mut rows_by_symbol = read_rows(connection)?;

    let mut records = Vec::with_capacity(tickers.len());
    for ticker in tickers {
        let symbol = Symbol::parse(&ticker.symbol).map_err(corrupt)?;
        let rows = rows_by_symbol.remove(&ticker.symbol).unwrap_or_default();
        if rows.is_empty() {
            return Err(StoreError::CorruptData(format!(
                "ticker '{symbol}' has no series rows"
            )));
        }

        let series = EnrichedSeries::new(rows).map_err(corrupt)?;
        let reference = serde_json::from_str::<serde_json::Value>(&ticker.reference_json)
            .map_err(corrupt)
            .and_then(|value| ReferenceInfo::from_value(value).map_err(corrupt))?;

        records.push(TickerRecord {
            symbol,
            series,
            sector: ticker.sector,
            reference,
        });
    }

    if let Some(orphan) = rows_by_symbol.keys().next() {
        return Err(StoreError::CorruptData(format!(
            "series rows reference unknown ticker '{orphan}'"
        )));
    }

    Universe::new(meta, records).map(Some).map_err(corrupt)
}

fn read_meta(connection: &Connection) -> Result<Option<UniverseMeta>, StoreError> {
    let params: [&dyn ToSql; 1] = [&SNAPSHOT_ID];
    let raw = connection.query_row(
        "SELECT schema_version, period, collected_at FROM snapshot_meta WHERE id = ?",
        params.as_slice(),
        |row| {
            Ok((
                row.get::<_, i32>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
            ))
        },
    );

    let (version, period, collected_at) = match raw {
        Ok(values) => values,
        Err(DuckError::QueryReturnedNoRows) => return Ok(None),
        Err(error) => return Err(corrupt(error)),
    };

    if version != SCHEMA_VERSION {
        return Err(StoreError::CorruptData(format!(
            "unknown snapshot schema version {version}"
        )));
    }

    Ok(Some(UniverseMeta {
        period: period.parse::<HistoryPeriod>().map_err(corrupt)?,
        collected_at: UtcDateTime::parse(&collected_at).map_err(corrupt)?,
    }))
}

struct StoredTicker {
    symbol: String,
    sector: String,
    reference_json: String,
}

fn read_tickers(connection: &Connection) -> Result<Vec<StoredTicker>, StoreError> {
    let mut statement = connection
        .prepare("SELECT symbol, sector, reference_json FROM tickers ORDER BY symbol")
        .map_err(corrupt)?;
    let tickers = statement
        .query_map([], |row| {
            Ok(StoredTicker {
                symbol: row.get(0)?,
                sector: row.get(1)?,
                reference_json: row.get(2)?,
            })
        })
        .map_err(corrupt)?
        .collect::<Result<Vec<_>, _>>()
        .map_err(corrupt)?;
    Ok(tickers)
}

struct StoredRow {
    symbol: String,
    date: String,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: u64,
    daily_return: Option<f64>,
    volatility_30: Option<f64>,
    ma_20: Option<f64>,
    ma_50: Option<f64>,
    rsi_14: Option<f64>,
}

impl StoredRow {
    fn into_row(self) -> Result<EnrichedRow, StoreError> {
        let date = TradeDate::parse(&self.date).map_err(corrupt)?;
        let bar = Bar::new(date, self.open, self.high, self.low, self.close, self.volume)
            .map_err(|error| {
                StoreError::CorruptData(format!("{} row {}: {error}", self.symbol, self.date))
            })?;
        Ok(EnrichedRow {
            bar,
            daily_return: self.daily_return,
            volatility_30: self.volatility_30,
            ma_20: self.ma_20,
            ma_50: self.ma_50,
            rsi_14: self.rsi_14,
        })
    }
}

fn read_rows(connection: &Connection) -> Result<BTreeMap<String, Vec<EnrichedRow>>, StoreError> {
    let mut statement = connection
        .prepare(
            "SELECT symbol, CAST(date AS VARCHAR), open, high, low, close, volume, \
             daily_return, volatility_30, ma_20, ma_50, rsi_14 \
             FROM series_rows ORDER BY symbol, date",
        )
        .map_err(corrupt)?;
    let stored = statement
        .query_map([], |row| {
            Ok(StoredRow {
                symbol: row.get(0)?,
                date: row.get(1)?,
                open: row.get(2)?,
                high: row.get(3)?,
                low: row.get(4)?,
                close: row.get(5)?,
                volume: row.get(6)?,
                daily_return: row.get(7)?,
                volatility_30: row.get(8)?,
                ma_20: row.get(9)?,
                ma_50: row.get(10)?,
                rsi_14: row.get(11)?,
            })
        })
        .map_err(corrupt)?
        .collect::<Result<Vec<_>, _>>()
        .map_err(corrupt)?;

    let mut by_symbol: BTreeMap<String, Vec<EnrichedRow>> = BTreeMap::new();
    for row in stored {
        let symbol = row.symbol.clone();
        by_symbol.entry(symbol).or_default().push(row.into_row()?);
    }
    Ok(by_symbol)
}

fn corrupt(error: impl Display) -> StoreError {
    StoreError::CorruptData(error.to_string())
}
