use crate::config::DatabaseConfig;
use crate::model::MatchIndexRecord;
use crate::ports::{IndexError, MatchesIndexRepository};
use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;
use tracing::{debug, info, instrument};

/// Matches index backed by the `matches_index` table in PostgreSQL
pub struct PgMatchesIndex {
    pool: PgPool,
}

impl PgMatchesIndex {
    /// Create a new index with connection pool
    pub async fn new(config: &DatabaseConfig) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(Duration::from_secs(config.connect_timeout_secs))
            .idle_timeout(Some(Duration::from_secs(config.idle_timeout_secs)))
            .connect(&config.url)
            .await
            .context("Failed to connect to PostgreSQL")?;

        info!("Connected to PostgreSQL database");

        Ok(Self { pool })
    }

    /// Run database migrations
    pub async fn run_migrations(&self) -> Result<()> {
        info!("Running database migrations");

        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .context("Failed to run migrations")?;

        info!("Database migrations completed");
        Ok(())
    }
}

#[async_trait]
impl MatchesIndexRepository for PgMatchesIndex {
    #[instrument(skip(self, record), fields(match_id = %record.id))]
    async fn upsert_match_index(&self, record: &MatchIndexRecord) -> Result<(), IndexError> {
        let size_bytes = i64::try_from(record.size_bytes).map_err(|_| {
            IndexError::Permanent(format!("size_bytes {} out of range", record.size_bytes))
        })?;

        sqlx::query(
            r#"
            INSERT INTO matches_index (
                id, date, home, away, storage_path, size_bytes, checksum, updated_at
            ) VALUES (
                $1, $2, $3, $4, $5, $6, $7, NOW()
            )
            ON CONFLICT (id) DO UPDATE SET
                date = EXCLUDED.date,
                home = EXCLUDED.home,
                away = EXCLUDED.away,
                storage_path = EXCLUDED.storage_path,
                size_bytes = EXCLUDED.size_bytes,
                checksum = EXCLUDED.checksum,
                updated_at = NOW()
            "#,
        )
        .bind(&record.id)
        .bind(record.date)
        .bind(&record.home)
        .bind(&record.away)
        .bind(&record.storage_path)
        .bind(size_bytes)
        .bind(&record.checksum)
        .execute(&self.pool)
        .await
        .map_err(classify_sqlx_error)?;

        debug!(storage_path = %record.storage_path, "Match index upserted");

        metrics::counter!("shots.index.upserts").increment(1);

        Ok(())
    }

    async fn ping(&self) -> Result<(), IndexError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(classify_sqlx_error)?;
        Ok(())
    }
}

/// Connection-level failures are transient; everything else is not
fn classify_sqlx_error(err: sqlx::Error) -> IndexError {
    match err {
        sqlx::Error::Io(_)
        | sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed => IndexError::Transient(err.to_string()),
        other => IndexError::Permanent(other.to_string()),
    }
}
