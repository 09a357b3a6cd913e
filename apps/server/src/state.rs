//! Shared application state

use crate::{
    config::Config,
    db::{CandidateStore, PostgresCandidateStore},
    services::{BulkIngestor, CandidateService},
    Result,
};
use sqlx::PgPool;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct AppStateOptions {
    pub run_migrations: bool,
}

impl Default for AppStateOptions {
    fn default() -> Self {
        Self {
            run_migrations: true,
        }
    }
}

/// Shared application state passed to all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub db_pool: PgPool,
    pub candidate_service: Arc<CandidateService>,
    pub bulk_ingestor: Arc<BulkIngestor>,
}

impl AppState {
    /// Initialize the application state
    pub async fn new(config: Config) -> Result<Self> {
        Self::new_with_options(config, AppStateOptions::default()).await
    }

    pub async fn new_with_options(config: Config, options: AppStateOptions) -> Result<Self> {
        tracing::info!("Initializing application state...");

        let config_arc = Arc::new(config);

        let db_pool = create_db_pool(config_arc.as_ref()).await?;

        if options.run_migrations {
            run_migrations(&db_pool).await?;
        }

        let state = Self::from_pool(config_arc, db_pool);

        tracing::info!("Application state initialized successfully");

        Ok(state)
    }

    /// Build the state around an existing pool (migrations are the caller's
    /// responsibility).
    pub fn from_pool(config: Arc<Config>, db_pool: PgPool) -> Self {
        let store: Arc<dyn CandidateStore> = Arc::new(PostgresCandidateStore::new(db_pool.clone()));
        let candidate_service = Arc::new(CandidateService::new(store));
        let bulk_ingestor = Arc::new(BulkIngestor::new(
            db_pool.clone(),
            config.ingest.copy_chunk_rows,
        ));

        Self {
            config,
            db_pool,
            candidate_service,
            bulk_ingestor,
        }
    }
}

pub async fn run_migrations(pool: &PgPool) -> Result<()> {
    tracing::info!("Running database migrations...");
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

pub async fn create_db_pool(config: &Config) -> Result<PgPool> {
    create_db_pool_for_url(config, &config.database.url).await
}

pub async fn create_db_pool_for_url(config: &Config, url: &str) -> Result<PgPool> {
    tracing::info!("Creating database connection pool...");

    let statement_timeout = config.database.statement_timeout_seconds;
    let lock_timeout = config.database.lock_timeout_seconds;

    let pool = sqlx::postgres::PgPoolOptions::new()
        .min_connections(config.database.pool_min_size)
        .max_connections(config.database.pool_max_size)
        .acquire_timeout(std::time::Duration::from_secs(
            config.database.pool_timeout_seconds,
        ))
        .after_connect(move |conn, _meta| {
            Box::pin(async move {
                sqlx::query(&format!("SET statement_timeout = '{}s'", statement_timeout))
                    .execute(&mut *conn)
                    .await?;

                // Fail fast on lock contention instead of queueing merges.
                sqlx::query(&format!("SET lock_timeout = '{}s'", lock_timeout))
                    .execute(&mut *conn)
                    .await?;

                Ok(())
            })
        })
        .connect(url)
        .await
        .map_err(crate::Error::Database)?;

    tracing::info!(
        "Database pool created (min: {}, max: {})",
        config.database.pool_min_size,
        config.database.pool_max_size
    );

    Ok(pool)
}
