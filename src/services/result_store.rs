use crate::error::{AppError, Error};
use crate::models::{CompositeResult, Market, Signal};
use chrono::{DateTime, Utc};
use sqlx::{sqlite::SqliteConnectOptions, Row, SqlitePool};
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

/// One persisted analysis row, as read back from the database.
#[derive(Debug, Clone)]
pub struct StoredResult {
    pub run_id: String,
    pub symbol: String,
    pub market: Market,
    pub trend_score: Option<f64>,
    pub momentum_score: Option<f64>,
    pub range_score: Option<f64>,
    pub volume_score: Option<f64>,
    pub volatility_score: Option<f64>,
    pub composite_score: f64,
    pub signal: Signal,
    pub low_confidence: bool,
    pub created_at: DateTime<Utc>,
}

/// SQLite-backed persistence for composite results: one row per
/// (symbol, run), concurrent writers welcome (WAL mode), no cross-row
/// transactions needed.
#[derive(Debug)]
pub struct ResultStore {
    pool: SqlitePool,
}

impl ResultStore {
    pub async fn new(database_path: PathBuf) -> Result<Self, Error> {
        if let Some(parent) = database_path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let connect_options = SqliteConnectOptions::new()
            .filename(&database_path)
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            .synchronous(sqlx::sqlite::SqliteSynchronous::Normal)
            .busy_timeout(Duration::from_secs(30));

        let pool = SqlitePool::connect_with(connect_options).await?;

        let store = Self { pool };
        store.initialize_schema().await?;

        info!(path = %database_path.display(), "Result store initialized");
        Ok(store)
    }

    async fn initialize_schema(&self) -> Result<(), Error> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS analysis_results (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                run_id TEXT NOT NULL,
                symbol TEXT NOT NULL,
                market TEXT NOT NULL,
                trend_score REAL,
                momentum_score REAL,
                range_score REAL,
                volume_score REAL,
                volatility_score REAL,
                composite_score REAL NOT NULL,
                signal TEXT NOT NULL,
                low_confidence INTEGER NOT NULL DEFAULT 0,
                created_at DATETIME NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        let indexes = [
            // One row per (symbol, run); re-running a symbol replaces it.
            "CREATE UNIQUE INDEX IF NOT EXISTS idx_results_run_symbol ON analysis_results(run_id, symbol)",
            "CREATE INDEX IF NOT EXISTS idx_results_symbol_time ON analysis_results(symbol, created_at DESC)",
            "CREATE INDEX IF NOT EXISTS idx_results_time ON analysis_results(created_at DESC)",
        ];
        for index in indexes {
            sqlx::query(index).execute(&self.pool).await?;
        }

        Ok(())
    }

    /// Persist one composite result. INSERT OR REPLACE on
    /// (run_id, symbol), so a retried task cannot double-write.
    pub async fn insert(&self, run_id: &str, result: &CompositeResult) -> Result<(), Error> {
        sqlx::query(
            r#"
            INSERT OR REPLACE INTO analysis_results (
                run_id, symbol, market,
                trend_score, momentum_score, range_score, volume_score, volatility_score,
                composite_score, signal, low_confidence, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
            "#,
        )
        .bind(run_id)
        .bind(&result.symbol)
        .bind(result.market.as_str())
        .bind(result.module_score("trend"))
        .bind(result.module_score("momentum"))
        .bind(result.module_score("range"))
        .bind(result.module_score("volume"))
        .bind(result.module_score("volatility"))
        .bind(result.composite_score)
        .bind(result.signal.as_str())
        .bind(result.low_confidence)
        .bind(result.timestamp)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Most recent results, optionally restricted to one symbol.
    pub async fn get_history(
        &self,
        symbol: Option<&str>,
        limit: usize,
    ) -> Result<Vec<StoredResult>, Error> {
        let rows = match symbol {
            Some(symbol) => {
                sqlx::query(
                    r#"
                    SELECT run_id, symbol, market,
                           trend_score, momentum_score, range_score, volume_score, volatility_score,
                           composite_score, signal, low_confidence, created_at
                    FROM analysis_results
                    WHERE symbol = ?1
                    ORDER BY created_at DESC, id DESC
                    LIMIT ?2
                    "#,
                )
                .bind(symbol)
                .bind(limit as i64)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query(
                    r#"
                    SELECT run_id, symbol, market,
                           trend_score, momentum_score, range_score, volume_score, volatility_score,
                           composite_score, signal, low_confidence, created_at
                    FROM analysis_results
                    ORDER BY created_at DESC, id DESC
                    LIMIT ?1
                    "#,
                )
                .bind(limit as i64)
                .fetch_all(&self.pool)
                .await?
            }
        };

        rows.into_iter().map(Self::row_to_result).collect()
    }

    /// Delete every stored result. Returns rows removed.
    pub async fn clear_history(&self) -> Result<u64, Error> {
        let outcome = sqlx::query("DELETE FROM analysis_results")
            .execute(&self.pool)
            .await?;
        Ok(outcome.rows_affected())
    }

    /// Retain only the most recent result per symbol. Returns rows removed.
    pub async fn clear_duplicates(&self) -> Result<u64, Error> {
        let outcome = sqlx::query(
            r#"
            DELETE FROM analysis_results
            WHERE id NOT IN (
                SELECT MAX(id) FROM analysis_results GROUP BY symbol
            )
            "#,
        )
        .execute(&self.pool)
        .await?;
        Ok(outcome.rows_affected())
    }

    pub async fn count(&self) -> Result<i64, Error> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM analysis_results")
            .fetch_one(&self.pool)
            .await?;
        Ok(row.try_get("n").map_err(AppError::from)?)
    }

    fn row_to_result(row: sqlx::sqlite::SqliteRow) -> Result<StoredResult, Error> {
        let market_str: String = row.try_get("market").map_err(AppError::from)?;
        let signal_str: String = row.try_get("signal").map_err(AppError::from)?;

        Ok(StoredResult {
            run_id: row.try_get("run_id").map_err(AppError::from)?,
            symbol: row.try_get("symbol").map_err(AppError::from)?,
            market: Market::parse(&market_str).map_err(Error::Parse)?,
            trend_score: row.try_get("trend_score").map_err(AppError::from)?,
            momentum_score: row.try_get("momentum_score").map_err(AppError::from)?,
            range_score: row.try_get("range_score").map_err(AppError::from)?,
            volume_score: row.try_get("volume_score").map_err(AppError::from)?,
            volatility_score: row.try_get("volatility_score").map_err(AppError::from)?,
            composite_score: row.try_get("composite_score").map_err(AppError::from)?,
            signal: Signal::parse(&signal_str).map_err(Error::Parse)?,
            low_confidence: row.try_get("low_confidence").map_err(AppError::from)?,
            created_at: row.try_get("created_at").map_err(AppError::from)?,
        })
    }
}
