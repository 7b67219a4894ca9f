//! Quote cache on SQLite.
//!
//! Two tables back the cache: `quotes` holds one row per (symbol, date) and
//! `windows` records every `[start, end)` request whose result was stored.
//! A request is served from the cache only when a single stored window
//! contains it, so a short window fetched last month never stands in for a
//! longer one requested today.

use crate::error::{DataError, Result};
use crate::series::{date_column, frame_dates};
use chrono::{NaiveDate, Utc};
use polars::prelude::*;
use rusqlite::{Connection, OptionalExtension, params};
use std::path::Path;

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS quotes (
        symbol TEXT NOT NULL,
        date TEXT NOT NULL,
        open REAL NOT NULL,
        high REAL NOT NULL,
        low REAL NOT NULL,
        close REAL NOT NULL,
        volume INTEGER NOT NULL,
        adjusted_close REAL NOT NULL,
        PRIMARY KEY (symbol, date)
    );
    CREATE TABLE IF NOT EXISTS windows (
        symbol TEXT NOT NULL,
        window_start TEXT NOT NULL,
        window_end TEXT NOT NULL,
        stored_at TEXT NOT NULL,
        PRIMARY KEY (symbol, window_start, window_end)
    );
";

/// One cached daily bar.
#[derive(Debug, Clone, PartialEq)]
struct Bar {
    date: NaiveDate,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: u64,
    adjusted_close: f64,
}

/// SQLite-backed quote cache.
#[derive(Debug)]
pub struct SqliteCache {
    conn: Connection,
}

impl SqliteCache {
    /// Open (or create) the cache database at `path`.
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::with_connection(Connection::open(path)?)
    }

    /// A throwaway cache held in memory.
    pub fn in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn })
    }

    /// Whether `[start, end)` for `symbol` can be answered from the cache.
    ///
    /// Windows reaching today are never served: the provider may still
    /// revise or append the latest bar.
    pub fn covers(&self, symbol: &str, start: NaiveDate, end: NaiveDate) -> Result<bool> {
        self.covers_as_of(symbol, start, end, Utc::now().date_naive())
    }

    fn covers_as_of(&self, symbol: &str, start: NaiveDate, end: NaiveDate, today: NaiveDate) -> Result<bool> {
        if end > today {
            return Ok(false);
        }
        let hit = self
            .conn
            .query_row(
                "SELECT 1 FROM windows
                 WHERE symbol = ?1 AND window_start <= ?2 AND window_end >= ?3
                 LIMIT 1",
                params![symbol, start.to_string(), end.to_string()],
                |_| Ok(()),
            )
            .optional()?;
        Ok(hit.is_some())
    }

    /// Cached bars for `symbol` in `[start, end)` as a quote frame.
    ///
    /// An empty result is [`DataError::MissingData`].
    pub fn load(&self, symbol: &str, start: NaiveDate, end: NaiveDate) -> Result<DataFrame> {
        let mut stmt = self.conn.prepare(
            "SELECT date, open, high, low, close, volume, adjusted_close FROM quotes
             WHERE symbol = ?1 AND date >= ?2 AND date < ?3
             ORDER BY date",
        )?;
        let bars = stmt
            .query_map(params![symbol, start.to_string(), end.to_string()], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, f64>(1)?,
                    row.get::<_, f64>(2)?,
                    row.get::<_, f64>(3)?,
                    row.get::<_, f64>(4)?,
                    row.get::<_, i64>(5)?,
                    row.get::<_, f64>(6)?,
                ))
            })?
            .map(|row| -> Result<Bar> {
                let (date, open, high, low, close, volume, adjusted_close) = row?;
                let date = date
                    .parse::<NaiveDate>()
                    .map_err(|e| DataError::Cache(format!("bad cached date {date}: {e}")))?;
                Ok(Bar {
                    date,
                    open,
                    high,
                    low,
                    close,
                    volume: u64::try_from(volume).unwrap_or(0),
                    adjusted_close,
                })
            })
            .collect::<Result<Vec<Bar>>>()?;

        if bars.is_empty() {
            return Err(DataError::MissingData {
                symbol: symbol.to_string(),
                reason: "nothing cached for this window".to_string(),
            });
        }
        bars_frame(symbol, &bars)
    }

    /// Store the provider's answer for `[start, end)` and remember the window.
    ///
    /// Bars already cached for the same dates are replaced.
    pub fn store(&self, symbol: &str, start: NaiveDate, end: NaiveDate, df: &DataFrame) -> Result<()> {
        let bars = frame_bars(df)?;
        let tx = self.conn.unchecked_transaction()?;
        {
            let mut insert = tx.prepare(
                "INSERT OR REPLACE INTO quotes
                 (symbol, date, open, high, low, close, volume, adjusted_close)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            )?;
            for bar in &bars {
                insert.execute(params![
                    symbol,
                    bar.date.to_string(),
                    bar.open,
                    bar.high,
                    bar.low,
                    bar.close,
                    i64::try_from(bar.volume).unwrap_or(i64::MAX),
                    bar.adjusted_close,
                ])?;
            }
        }
        tx.execute(
            "INSERT OR REPLACE INTO windows (symbol, window_start, window_end, stored_at) VALUES (?1, ?2, ?3, ?4)",
            params![symbol, start.to_string(), end.to_string(), Utc::now().to_rfc3339()],
        )?;
        tx.commit()?;
        Ok(())
    }

    /// Drop everything.
    pub fn clear_all(&self) -> Result<()> {
        self.conn.execute_batch("DELETE FROM quotes; DELETE FROM windows;")?;
        Ok(())
    }

    /// Drop one symbol.
    pub fn clear_symbol(&self, symbol: &str) -> Result<()> {
        self.conn.execute("DELETE FROM quotes WHERE symbol = ?1", params![symbol])?;
        self.conn.execute("DELETE FROM windows WHERE symbol = ?1", params![symbol])?;
        Ok(())
    }

    /// Row, symbol and window counts plus the cached date span.
    pub fn stats(&self) -> Result<CacheStats> {
        let (total_quotes, unique_symbols, first, last): (i64, i64, Option<String>, Option<String>) =
            self.conn.query_row(
                "SELECT COUNT(*), COUNT(DISTINCT symbol), MIN(date), MAX(date) FROM quotes",
                [],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
            )?;
        let windows: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM windows", [], |row| row.get(0))?;

        Ok(CacheStats {
            total_quotes: usize::try_from(total_quotes).unwrap_or(0),
            unique_symbols: usize::try_from(unique_symbols).unwrap_or(0),
            windows: usize::try_from(windows).unwrap_or(0),
            first_date: first.and_then(|d| d.parse().ok()),
            last_date: last.and_then(|d| d.parse().ok()),
        })
    }
}

/// Summary of what the cache holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheStats {
    /// Cached bars
    pub total_quotes: usize,
    /// Distinct symbols
    pub unique_symbols: usize,
    /// Stored request windows
    pub windows: usize,
    /// Earliest cached date
    pub first_date: Option<NaiveDate>,
    /// Latest cached date
    pub last_date: Option<NaiveDate>,
}

/// Read the bars out of a quote frame, skipping rows with a null date or price.
fn frame_bars(df: &DataFrame) -> Result<Vec<Bar>> {
    let dates = frame_dates(df)?;
    let price = |name: &str| -> Result<Vec<Option<f64>>> {
        Ok(df.column(name)?.cast(&DataType::Float64)?.f64()?.into_iter().collect())
    };
    let (open, high, low, close, adjusted) = (
        price("open")?,
        price("high")?,
        price("low")?,
        price("close")?,
        price("adjusted_close")?,
    );
    let volume: Vec<Option<u64>> = df
        .column("volume")?
        .cast(&DataType::UInt64)?
        .u64()?
        .into_iter()
        .collect();

    Ok((0..df.height())
        .filter_map(|i| {
            Some(Bar {
                date: dates[i]?,
                open: open[i]?,
                high: high[i]?,
                low: low[i]?,
                close: close[i]?,
                volume: volume[i].unwrap_or(0),
                adjusted_close: adjusted[i]?,
            })
        })
        .collect())
}

fn bars_frame(symbol: &str, bars: &[Bar]) -> Result<DataFrame> {
    let dates: Vec<NaiveDate> = bars.iter().map(|b| b.date).collect();
    let column = |name: &str, f: fn(&Bar) -> f64| -> Column {
        Series::new(name.into(), bars.iter().map(f).collect::<Vec<f64>>()).into()
    };

    Ok(DataFrame::new(vec![
        Series::new("symbol".into(), vec![symbol; bars.len()]).into(),
        date_column(&dates)?,
        column("open", |b| b.open),
        column("high", |b| b.high),
        column("low", |b| b.low),
        column("close", |b| b.close),
        Series::new("volume".into(), bars.iter().map(|b| b.volume).collect::<Vec<u64>>()).into(),
        column("adjusted_close", |b| b.adjusted_close),
    ])?)
}
