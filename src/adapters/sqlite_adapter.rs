//! SQLite kline store adapter.
//!
//! Schema mirrors a downloaded-exchange-data layout: an `assets` lookup
//! table, a `symbols` table tying each pair to its base and quote asset,
//! and one `klines_1d` row per symbol and timestamp.

use crate::domain::candle::Candle;
use crate::domain::config_validation::DATETIME_FORMAT;
use crate::domain::error::PairtraderError;
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;
use chrono::NaiveDateTime;
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{params, OptionalExtension};

pub struct SqliteAdapter {
    pool: Pool<SqliteConnectionManager>,
}

impl SqliteAdapter {
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, PairtraderError> {
        let db_path =
            config
                .get_string("data", "path")
                .ok_or_else(|| PairtraderError::ConfigMissing {
                    section: "data".into(),
                    key: "path".into(),
                })?;

        let pool_size = config.get_int("data", "pool_size", 4) as u32;

        let manager = SqliteConnectionManager::file(&db_path);
        let pool =
            Pool::builder()
                .max_size(pool_size)
                .build(manager)
                .map_err(|e: r2d2::Error| PairtraderError::Database {
                    reason: e.to_string(),
                })?;

        Ok(Self { pool })
    }

    pub fn in_memory() -> Result<Self, PairtraderError> {
        let manager = SqliteConnectionManager::memory();
        let pool = Pool::builder()
            .max_size(1)
            .build(manager)
            .map_err(|e: r2d2::Error| PairtraderError::Database {
                reason: e.to_string(),
            })?;

        Ok(Self { pool })
    }

    fn conn(
        &self,
    ) -> Result<r2d2::PooledConnection<SqliteConnectionManager>, PairtraderError> {
        self.pool
            .get()
            .map_err(|e: r2d2::Error| PairtraderError::Database {
                reason: e.to_string(),
            })
    }

    pub fn initialize_schema(&self) -> Result<(), PairtraderError> {
        let conn = self.conn()?;

        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS assets (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                asset TEXT NOT NULL UNIQUE
            );
            CREATE TABLE IF NOT EXISTS symbols (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                symbol TEXT NOT NULL UNIQUE,
                id_base_asset INTEGER NOT NULL REFERENCES assets(id),
                id_quote_asset INTEGER NOT NULL REFERENCES assets(id)
            );
            CREATE TABLE IF NOT EXISTS klines_1d (
                id_symbol INTEGER NOT NULL REFERENCES symbols(id),
                date_time TEXT NOT NULL,
                open REAL NOT NULL,
                high REAL NOT NULL,
                low REAL NOT NULL,
                close REAL NOT NULL,
                volume REAL NOT NULL,
                PRIMARY KEY (id_symbol, date_time)
            );
            CREATE INDEX IF NOT EXISTS idx_klines_date_time ON klines_1d(date_time);",
        )
        .map_err(|e: rusqlite::Error| PairtraderError::DatabaseQuery {
            reason: e.to_string(),
        })?;

        Ok(())
    }

    /// Insert the pair and its two assets if not present, returning the
    /// symbol row id.
    pub fn register_symbol(
        &self,
        symbol: &str,
        base_asset: &str,
        quote_asset: &str,
    ) -> Result<i64, PairtraderError> {
        let conn = self.conn()?;

        let base_id = upsert_asset(&conn, base_asset)?;
        let quote_id = upsert_asset(&conn, quote_asset)?;

        conn.execute(
            "INSERT OR IGNORE INTO symbols (symbol, id_base_asset, id_quote_asset)
             VALUES (?1, ?2, ?3)",
            params![symbol, base_id, quote_id],
        )
        .map_err(|e: rusqlite::Error| PairtraderError::DatabaseQuery {
            reason: e.to_string(),
        })?;

        symbol_id(&conn, symbol)?.ok_or_else(|| PairtraderError::UnknownSymbol {
            symbol: symbol.to_string(),
        })
    }

    pub fn insert_klines(
        &self,
        symbol: &str,
        candles: &[Candle],
    ) -> Result<(), PairtraderError> {
        let mut conn = self.conn()?;

        let id = symbol_id(&conn, symbol)?.ok_or_else(|| PairtraderError::UnknownSymbol {
            symbol: symbol.to_string(),
        })?;

        let tx =
            conn.transaction()
                .map_err(|e: rusqlite::Error| PairtraderError::DatabaseQuery {
                    reason: e.to_string(),
                })?;

        for candle in candles {
            tx.execute(
                "INSERT OR REPLACE INTO klines_1d
                 (id_symbol, date_time, open, high, low, close, volume)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    id,
                    candle.timestamp.format(DATETIME_FORMAT).to_string(),
                    candle.open,
                    candle.high,
                    candle.low,
                    candle.close,
                    candle.volume
                ],
            )
            .map_err(|e: rusqlite::Error| PairtraderError::DatabaseQuery {
                reason: e.to_string(),
            })?;
        }

        tx.commit()
            .map_err(|e: rusqlite::Error| PairtraderError::DatabaseQuery {
                reason: e.to_string(),
            })?;

        Ok(())
    }
}

fn upsert_asset(conn: &rusqlite::Connection, asset: &str) -> Result<i64, PairtraderError> {
    conn.execute(
        "INSERT OR IGNORE INTO assets (asset) VALUES (?1)",
        params![asset],
    )
    .map_err(|e: rusqlite::Error| PairtraderError::DatabaseQuery {
        reason: e.to_string(),
    })?;

    conn.query_row(
        "SELECT id FROM assets WHERE asset = ?1",
        params![asset],
        |row| row.get(0),
    )
    .map_err(|e: rusqlite::Error| PairtraderError::DatabaseQuery {
        reason: e.to_string(),
    })
}

fn symbol_id(conn: &rusqlite::Connection, symbol: &str) -> Result<Option<i64>, PairtraderError> {
    conn.query_row(
        "SELECT id FROM symbols WHERE symbol = ?1",
        params![symbol],
        |row| row.get(0),
    )
    .optional()
    .map_err(|e: rusqlite::Error| PairtraderError::DatabaseQuery {
        reason: e.to_string(),
    })
}

fn parse_db_datetime(value: &str) -> Result<NaiveDateTime, rusqlite::Error> {
    NaiveDateTime::parse_from_str(value, DATETIME_FORMAT).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(
            value.len(),
            rusqlite::types::Type::Text,
            Box::new(e),
        )
    })
}

impl DataPort for SqliteAdapter {
    fn fetch_klines(
        &self,
        symbol: &str,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<Vec<Candle>, PairtraderError> {
        let conn = self.conn()?;

        let start_str = start.format(DATETIME_FORMAT).to_string();
        let end_str = end.format(DATETIME_FORMAT).to_string();

        let query = "SELECT k.date_time, k.open, k.high, k.low, k.close, k.volume
                     FROM klines_1d k
                     JOIN symbols s ON s.id = k.id_symbol
                     WHERE s.symbol = ?1 AND k.date_time >= ?2 AND k.date_time <= ?3
                     ORDER BY k.date_time ASC";

        let mut stmt =
            conn.prepare(query)
                .map_err(|e: rusqlite::Error| PairtraderError::DatabaseQuery {
                    reason: e.to_string(),
                })?;

        let rows = stmt
            .query_map(params![symbol, start_str, end_str], |row| {
                let ts_str: String = row.get(0)?;
                Ok(Candle {
                    timestamp: parse_db_datetime(&ts_str)?,
                    open: row.get(1)?,
                    high: row.get(2)?,
                    low: row.get(3)?,
                    close: row.get(4)?,
                    volume: row.get(5)?,
                })
            })
            .map_err(|e: rusqlite::Error| PairtraderError::DatabaseQuery {
                reason: e.to_string(),
            })?;

        let mut candles = Vec::new();
        for row in rows {
            candles.push(
                row.map_err(|e: rusqlite::Error| PairtraderError::DatabaseQuery {
                    reason: e.to_string(),
                })?,
            );
        }

        Ok(candles)
    }

    fn list_symbols(&self) -> Result<Vec<String>, PairtraderError> {
        let conn = self.conn()?;

        let mut stmt = conn
            .prepare("SELECT symbol FROM symbols ORDER BY symbol")
            .map_err(|e: rusqlite::Error| PairtraderError::DatabaseQuery {
                reason: e.to_string(),
            })?;

        let rows = stmt
            .query_map([], |row| row.get(0))
            .map_err(|e: rusqlite::Error| PairtraderError::DatabaseQuery {
                reason: e.to_string(),
            })?;

        let mut symbols = Vec::new();
        for row in rows {
            symbols.push(
                row.map_err(|e: rusqlite::Error| PairtraderError::DatabaseQuery {
                    reason: e.to_string(),
                })?,
            );
        }

        Ok(symbols)
    }

    fn get_data_range(
        &self,
        symbol: &str,
    ) -> Result<Option<(NaiveDateTime, NaiveDateTime, usize)>, PairtraderError> {
        let conn = self.conn()?;

        let query = "SELECT MIN(k.date_time), MAX(k.date_time), COUNT(*)
                     FROM klines_1d k
                     JOIN symbols s ON s.id = k.id_symbol
                     WHERE s.symbol = ?1";

        let result: (Option<String>, Option<String>, i64) = conn
            .query_row(query, params![symbol], |row| {
                Ok((row.get(0)?, row.get(1)?, row.get(2)?))
            })
            .map_err(|e: rusqlite::Error| PairtraderError::DatabaseQuery {
                reason: e.to_string(),
            })?;

        match result {
            (Some(min_str), Some(max_str), count) if count > 0 => {
                let min = NaiveDateTime::parse_from_str(&min_str, DATETIME_FORMAT).map_err(
                    |e: chrono::ParseError| PairtraderError::Database {
                        reason: e.to_string(),
                    },
                )?;
                let max = NaiveDateTime::parse_from_str(&max_str, DATETIME_FORMAT).map_err(
                    |e: chrono::ParseError| PairtraderError::Database {
                        reason: e.to_string(),
                    },
                )?;
                Ok(Some((min, max, count as usize)))
            }
            _ => Ok(None),
        }
    }

    fn asset_names(&self, symbol: &str) -> Result<(String, String), PairtraderError> {
        let conn = self.conn()?;

        let query = "SELECT base.asset, quote.asset
                     FROM symbols s
                     JOIN assets base ON base.id = s.id_base_asset
                     JOIN assets quote ON quote.id = s.id_quote_asset
                     WHERE s.symbol = ?1";

        conn.query_row(query, params![symbol], |row| {
            Ok((row.get(0)?, row.get(1)?))
        })
        .optional()
        .map_err(|e: rusqlite::Error| PairtraderError::DatabaseQuery {
            reason: e.to_string(),
        })?
        .ok_or_else(|| PairtraderError::UnknownSymbol {
            symbol: symbol.to_string(),
        })
    }
}
