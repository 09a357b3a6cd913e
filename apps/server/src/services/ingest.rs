//! COPY-based batch ingestion
//!
//! A batch is loaded verbatim into a session-private staging table with the
//! PostgreSQL COPY protocol and merged into `candidates` with a single
//! set-oriented statement, all inside one transaction:
//!
//! 1. `CREATE TEMP TABLE candidate_staging ... ON COMMIT DROP`
//! 2. `COPY candidate_staging FROM STDIN` in chunks of `copy_chunk_rows`
//! 3. grouped insert-if-absent merge
//! 4. `DELETE FROM candidate_staging`
//! 5. commit
//!
//! Any failure drops the transaction, which rolls back the merge and the
//! staging table with it. Counts are only reported for committed batches.
//!
//! The merge groups by the exact stored triple (case-sensitive text, full
//! timestamp). This is stricter than the canonical comparison
//! used on the single-record path.

use std::time::{Duration, Instant};

use sqlx::PgPool;
use talentry_intake::NewCandidate;

use crate::{metrics, Result};

const CREATE_STAGING_SQL: &str = "CREATE TEMP TABLE candidate_staging (
         row_no BIGINT NOT NULL,
         name TEXT,
         mail_id TEXT,
         skill_set TEXT,
         experience_months INTEGER,
         availability_date TIMESTAMP,
         primary_skill_level TEXT,
         canonical_key TEXT
     ) ON COMMIT DROP";

const COPY_STAGING_SQL: &str = "COPY candidate_staging
     (row_no, name, mail_id, skill_set, experience_months, availability_date,
      primary_skill_level, canonical_key)
     FROM STDIN";

/// One row per distinct exact triple not already stored. Non-key columns are
/// each the independent minimum over the group, text compared bytewise. An
/// exact triple has exactly one canonical key.
const MERGE_SQL: &str = r#"INSERT INTO candidates
         (name, mail_id, skill_set, experience_months, availability_date,
          primary_skill_level, canonical_key)
     SELECT MIN(s.name COLLATE "C"),
            s.mail_id,
            s.skill_set,
            MIN(s.experience_months),
            s.availability_date,
            MIN(s.primary_skill_level COLLATE "C"),
            MIN(s.canonical_key COLLATE "C")
     FROM candidate_staging s
     WHERE NOT EXISTS (
         SELECT 1 FROM candidates c
         WHERE c.mail_id = s.mail_id
           AND c.skill_set = s.skill_set
           AND c.availability_date = s.availability_date
     )
     GROUP BY s.mail_id, s.skill_set, s.availability_date"#;

const CLEAR_STAGING_SQL: &str = "DELETE FROM candidate_staging";

/// Outcome of a committed batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct IngestReport {
    pub inserted: u64,
    pub skipped: u64,
    pub elapsed: Duration,
}

impl IngestReport {
    pub fn total_received(&self) -> u64 {
        self.inserted + self.skipped
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.elapsed.as_millis() as u64
    }
}

/// Bulk ingestor using PostgreSQL COPY and a single merge statement
pub struct BulkIngestor {
    pool: PgPool,
    copy_chunk_rows: usize,
}

impl BulkIngestor {
    pub fn new(pool: PgPool, copy_chunk_rows: usize) -> Self {
        Self {
            pool,
            copy_chunk_rows: copy_chunk_rows.max(1),
        }
    }

    /// Ingest a batch atomically.
    ///
    /// An empty batch returns a zero report without opening a transaction.
    pub async fn ingest(&self, candidates: &[NewCandidate]) -> Result<IngestReport> {
        if candidates.is_empty() {
            return Ok(IngestReport::default());
        }

        match self.ingest_in_transaction(candidates).await {
            Ok(report) => {
                metrics::record_inserted(metrics::PATH_BULK, report.inserted);
                metrics::record_skipped(metrics::PATH_BULK, report.skipped);
                metrics::BULK_BATCH_DURATION.observe(report.elapsed.as_secs_f64());
                Ok(report)
            }
            Err(e) => {
                metrics::BULK_BATCHES_FAILED.inc();
                tracing::error!(
                    received = candidates.len(),
                    error = %e,
                    "Bulk ingestion rolled back"
                );
                Err(e)
            }
        }
    }

    async fn ingest_in_transaction(&self, candidates: &[NewCandidate]) -> Result<IngestReport> {
        let received = candidates.len() as u64;
        tracing::info!(
            "[PERF] Starting COPY-based ingestion for {} candidates",
            received
        );
        let total_start = Instant::now();

        let mut tx = self.pool.begin().await.map_err(crate::Error::Database)?;

        sqlx::query(CREATE_STAGING_SQL)
            .execute(&mut *tx)
            .await
            .map_err(crate::Error::Database)?;

        let copy_start = Instant::now();
        let mut copy = tx
            .copy_in_raw(COPY_STAGING_SQL)
            .await
            .map_err(crate::Error::Database)?;

        let mut row_no: u64 = 0;
        for chunk in candidates.chunks(self.copy_chunk_rows) {
            let mut data = String::with_capacity(chunk.len() * 96);
            for candidate in chunk {
                row_no += 1;
                push_staging_row(&mut data, row_no, candidate);
            }
            copy.send(data.as_bytes())
                .await
                .map_err(crate::Error::Database)?;
        }
        let copied = copy.finish().await.map_err(crate::Error::Database)?;
        let copy_time = copy_start.elapsed();
        tracing::debug!(
            "[PERF] COPY {} rows to candidate_staging in {:?} ({:.0} rows/sec)",
            copied,
            copy_time,
            copied as f64 / copy_time.as_secs_f64().max(f64::EPSILON)
        );

        let merge_start = Instant::now();
        let inserted = sqlx::query(MERGE_SQL)
            .execute(&mut *tx)
            .await
            .map_err(crate::Error::Database)?
            .rows_affected();
        let merge_time = merge_start.elapsed();

        sqlx::query(CLEAR_STAGING_SQL)
            .execute(&mut *tx)
            .await
            .map_err(crate::Error::Database)?;

        let commit_start = Instant::now();
        tx.commit().await.map_err(crate::Error::Database)?;
        let commit_time = commit_start.elapsed();

        let elapsed = total_start.elapsed();
        let report = IngestReport {
            inserted,
            skipped: received.saturating_sub(inserted),
            elapsed,
        };

        tracing::info!(
            "[PERF] COPY-based ingestion completed: total={:?}, copy={:?}, merge={:?}, commit={:?}, received={}, inserted={}, skipped={}",
            elapsed,
            copy_time,
            merge_time,
            commit_time,
            received,
            report.inserted,
            report.skipped
        );

        Ok(report)
    }
}

fn push_staging_row(out: &mut String, row_no: u64, candidate: &NewCandidate) {
    use std::fmt::Write;

    // Writing into a String cannot fail.
    let _ = writeln!(
        out,
        "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}",
        row_no,
        escape_copy_text(&candidate.name),
        escape_copy_text(&candidate.mail_id),
        escape_copy_text(&candidate.skill_set),
        candidate.experience_months,
        candidate.availability_date.format("%Y-%m-%d %H:%M:%S%.6f"),
        candidate.primary_skill_level.as_str(),
        escape_copy_text(&candidate.natural_key().canonical())
    );
}

/// Escape a value for the COPY text format.
fn escape_copy_text(s: &str) -> String {
    if s.is_empty() {
        return String::new();
    }
    s.replace('\\', "\\\\")
        .replace('\n', "\\n")
        .replace('\r', "\\r")
        .replace('\t', "\\t")
}
