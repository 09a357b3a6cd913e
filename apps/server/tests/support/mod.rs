//! Shared helpers for integration tests
//!
//! Two kinds of harness live here:
//! - `with_memory_app` drives the router against an in-memory candidate store
//!   and needs no database;
//! - `with_test_app` runs against PostgreSQL and is skipped when neither
//!   `TALENTRY__DATABASE__TEST_DATABASE_URL` nor `DATABASE_URL` is set.

use std::collections::HashSet;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body, Bytes},
    http::{HeaderMap, Method, Request, StatusCode},
    Router,
};
use chrono::{NaiveDate, NaiveDateTime};
use sqlx::{postgres::PgPoolOptions, PgPool};
use talentry::{
    api::create_router,
    config::{Config, DatabaseConfig, IngestConfig, LoggingConfig, ServerConfig},
    db::{CandidateStore, UpdateOutcome},
    services::{BulkIngestor, CandidateService},
    state::{run_migrations, AppState},
};
use talentry_intake::{Candidate, NaturalKey, NewCandidate, SkillLevel};
use tower::ServiceExt;

pub type TestFuture = Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send>>;

pub fn test_config() -> Config {
    Config {
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            cors_origins: Vec::new(),
            max_request_body_size: 4 * 1024 * 1024,
        },
        database: DatabaseConfig {
            url: test_database_url().unwrap_or_else(|| "postgres://localhost/unused".to_string()),
            test_database_url: test_database_url(),
            pool_min_size: 0,
            pool_max_size: 5,
            pool_timeout_seconds: 10,
            statement_timeout_seconds: 60,
            lock_timeout_seconds: 10,
        },
        ingest: IngestConfig {
            copy_chunk_rows: 2,
            max_batch_rows: 0,
        },
        logging: LoggingConfig {
            level: "warn".to_string(),
            json: false,
            file_enabled: false,
            file_directory: "./logs".to_string(),
            file_prefix: "candidate-server-test".to_string(),
            file_rotation: "never".to_string(),
            service_name: "candidate-service-test".to_string(),
        },
    }
}

pub fn test_database_url() -> Option<String> {
    std::env::var("TALENTRY__DATABASE__TEST_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .ok()
        .filter(|url| !url.trim().is_empty())
}

/// Pool on the test database with migrations applied, or `None` to skip.
pub async fn test_pool() -> anyhow::Result<Option<PgPool>> {
    test_pool_with_max(5).await
}

pub async fn test_pool_with_max(max_connections: u32) -> anyhow::Result<Option<PgPool>> {
    let Some(url) = test_database_url() else {
        eprintln!("skipping: TALENTRY__DATABASE__TEST_DATABASE_URL / DATABASE_URL not set");
        return Ok(None);
    };
    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(&url)
        .await?;
    run_migrations(&pool).await?;
    Ok(Some(pool))
}

#[derive(Clone)]
pub struct TestApp {
    pub state: AppState,
    pub router: Router,
}

impl TestApp {
    pub fn new(state: AppState) -> Self {
        let router = create_router(state.clone());
        Self { state, router }
    }

    pub async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<Vec<u8>>,
    ) -> anyhow::Result<(StatusCode, HeaderMap, Bytes)> {
        let content_type = body.as_ref().map(|_| "application/json");
        let headers: Vec<(&str, &str)> = content_type
            .map(|ct| vec![("content-type", ct)])
            .unwrap_or_default();
        self.request_with_extra_headers(method, path, body, &headers)
            .await
    }

    pub async fn request_with_extra_headers(
        &self,
        method: Method,
        path: &str,
        body: Option<Vec<u8>>,
        headers: &[(&str, &str)],
    ) -> anyhow::Result<(StatusCode, HeaderMap, Bytes)> {
        let mut builder = Request::builder().method(method).uri(path);
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        let request = builder.body(body.map(Body::from).unwrap_or_else(Body::empty))?;

        let response = self.router.clone().oneshot(request).await?;
        let status = response.status();
        let headers = response.headers().clone();
        let body = to_bytes(response.into_body(), usize::MAX).await?;
        Ok((status, headers, body))
    }

    /// Upload a batch file as the raw request body.
    pub async fn upload(
        &self,
        content_type: &str,
        body: &[u8],
    ) -> anyhow::Result<(StatusCode, serde_json::Value)> {
        let (status, _headers, body) = self
            .request_with_extra_headers(
                Method::POST,
                "/api/candidates/bulk",
                Some(body.to_vec()),
                &[("content-type", content_type)],
            )
            .await?;
        let json = if body.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&body)?
        };
        Ok((status, json))
    }
}

pub fn assert_status(actual: StatusCode, expected: StatusCode, context: &str) {
    assert_eq!(
        actual, expected,
        "{context}: expected {expected}, got {actual}"
    );
}

pub fn to_json_body(value: &serde_json::Value) -> anyhow::Result<Vec<u8>> {
    Ok(serde_json::to_vec(value)?)
}

/// Run `f` against a PostgreSQL-backed app. Skipped without a database URL.
pub async fn with_test_app<F>(f: F) -> anyhow::Result<()>
where
    F: FnOnce(TestApp) -> TestFuture,
{
    with_test_app_with_config(|_| {}, f).await
}

pub async fn with_test_app_with_config<C, F>(configure: C, f: F) -> anyhow::Result<()>
where
    C: FnOnce(&mut Config),
    F: FnOnce(TestApp) -> TestFuture,
{
    let Some(pool) = test_pool().await? else {
        return Ok(());
    };
    let mut config = test_config();
    configure(&mut config);

    let state = AppState::from_pool(Arc::new(config), pool.clone());
    let result = f(TestApp::new(state)).await;
    pool.close().await;
    result
}

/// Run `f` against an app whose candidate service uses an in-memory store.
///
/// The pool is lazy and never connects, so bulk uploads that get past
/// validation fail with a store error.
pub async fn with_memory_app<F>(f: F) -> anyhow::Result<()>
where
    F: FnOnce(TestApp, Arc<InMemoryCandidateStore>) -> TestFuture,
{
    with_memory_app_with_config(|_| {}, f).await
}

pub async fn with_memory_app_with_config<C, F>(configure: C, f: F) -> anyhow::Result<()>
where
    C: FnOnce(&mut Config),
    F: FnOnce(TestApp, Arc<InMemoryCandidateStore>) -> TestFuture,
{
    let mut config = test_config();
    configure(&mut config);

    let lazy_pool = PgPoolOptions::new()
        .max_connections(1)
        .acquire_timeout(std::time::Duration::from_millis(200))
        .connect_lazy("postgres://talentry@127.0.0.1:1/unreachable")?;

    let store = Arc::new(InMemoryCandidateStore::default());
    let state = AppState {
        config: Arc::new(config),
        db_pool: lazy_pool.clone(),
        candidate_service: Arc::new(CandidateService::new(store.clone())),
        bulk_ingestor: Arc::new(BulkIngestor::new(lazy_pool, 2)),
    };

    f(TestApp::new(state), store).await
}

pub fn unique_mail(tag: &str) -> String {
    format!("{tag}-{}@example.test", uuid::Uuid::new_v4().simple())
}

pub fn day(y: i32, m: u32, d: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d)
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .expect("valid test date")
}

pub fn candidate(name: &str, mail_id: &str, skill_set: &str, at: NaiveDateTime) -> NewCandidate {
    NewCandidate {
        name: name.to_string(),
        mail_id: mail_id.to_string(),
        skill_set: skill_set.to_string(),
        experience_months: 12,
        availability_date: at,
        primary_skill_level: SkillLevel::P1,
    }
}

/// In-memory `CandidateStore` with the same uniqueness rule as the
/// `candidates_natural_key_unique` constraint (exact raw triple).
#[derive(Default)]
pub struct InMemoryCandidateStore {
    rows: Mutex<Vec<Candidate>>,
    next_id: AtomicUsize,
    pub probe_calls: AtomicUsize,
    /// When set, `find_key_rows` reports nothing, as if a concurrent writer
    /// committed between the duplicate check and the insert.
    pub stale_probe: std::sync::atomic::AtomicBool,
}

impl InMemoryCandidateStore {
    pub fn len(&self) -> usize {
        self.rows.lock().map(|rows| rows.len()).unwrap_or_default()
    }

    pub fn rows(&self) -> Vec<Candidate> {
        self.rows.lock().map(|rows| rows.clone()).unwrap_or_default()
    }

    fn holds_exact(rows: &[Candidate], key: &NaturalKey, except: Option<i64>) -> bool {
        rows.iter()
            .filter(|row| Some(row.id) != except)
            .any(|row| row.natural_key() == *key)
    }
}

#[async_trait]
impl CandidateStore for InMemoryCandidateStore {
    async fn find_key_rows(&self, probes: &[NaturalKey]) -> talentry::Result<Vec<NaturalKey>> {
        self.probe_calls.fetch_add(1, Ordering::SeqCst);
        if self.stale_probe.load(Ordering::SeqCst) {
            return Ok(Vec::new());
        }
        // Same lookup as the `canonical_key` column: verbatim key equality.
        let wanted: HashSet<String> = probes.iter().map(NaturalKey::canonical).collect();
        let rows = self.rows.lock().map_err(|e| talentry::Error::Internal(e.to_string()))?;
        Ok(rows
            .iter()
            .map(Candidate::natural_key)
            .filter(|key| wanted.contains(&key.canonical()))
            .collect())
    }

    async fn insert(&self, candidate: &NewCandidate) -> talentry::Result<Option<Candidate>> {
        let mut rows = self.rows.lock().map_err(|e| talentry::Error::Internal(e.to_string()))?;
        if Self::holds_exact(&rows, &candidate.natural_key(), None) {
            return Ok(None);
        }
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) as i64 + 1;
        let stored = Candidate {
            id,
            name: candidate.name.clone(),
            mail_id: candidate.mail_id.clone(),
            skill_set: candidate.skill_set.clone(),
            experience_months: candidate.experience_months,
            availability_date: candidate.availability_date,
            primary_skill_level: candidate.primary_skill_level,
        };
        rows.push(stored.clone());
        Ok(Some(stored))
    }

    async fn get(&self, id: i64) -> talentry::Result<Option<Candidate>> {
        let rows = self.rows.lock().map_err(|e| talentry::Error::Internal(e.to_string()))?;
        Ok(rows.iter().find(|row| row.id == id).cloned())
    }

    async fn update(&self, id: i64, candidate: &NewCandidate) -> talentry::Result<UpdateOutcome> {
        let mut rows = self.rows.lock().map_err(|e| talentry::Error::Internal(e.to_string()))?;
        if !rows.iter().any(|row| row.id == id) {
            return Ok(UpdateOutcome::NotFound);
        }
        if Self::holds_exact(&rows, &candidate.natural_key(), Some(id)) {
            return Ok(UpdateOutcome::Conflict);
        }
        let Some(row) = rows.iter_mut().find(|row| row.id == id) else {
            return Ok(UpdateOutcome::NotFound);
        };
        row.name = candidate.name.clone();
        row.mail_id = candidate.mail_id.clone();
        row.skill_set = candidate.skill_set.clone();
        row.experience_months = candidate.experience_months;
        row.availability_date = candidate.availability_date;
        row.primary_skill_level = candidate.primary_skill_level;
        Ok(UpdateOutcome::Updated(row.clone()))
    }

    async fn delete(&self, id: i64) -> talentry::Result<bool> {
        let mut rows = self.rows.lock().map_err(|e| talentry::Error::Internal(e.to_string()))?;
        let before = rows.len();
        rows.retain(|row| row.id != id);
        Ok(rows.len() != before)
    }

    async fn ping(&self) -> talentry::Result<()> {
        Ok(())
    }
}
