//! PostgreSQL-backed `CandidateStore` implementation

use async_trait::async_trait;
use sqlx::{postgres::PgRow, PgPool, Row};
use talentry_intake::{Candidate, NaturalKey, NewCandidate, SkillLevel};

use crate::{
    db::traits::{CandidateStore, UpdateOutcome},
    Error, Result,
};

/// Existence probe over the `canonical_key` index.
///
/// Keys are matched verbatim. Only the raw natural-key columns of matching
/// rows are returned.
pub const EXISTING_KEYS_SQL: &str = "SELECT DISTINCT c.mail_id, c.skill_set, c.availability_date
     FROM candidates c
     WHERE c.canonical_key = ANY($1::text[])";

const CANDIDATE_COLUMNS: &str =
    "id, name, mail_id, skill_set, experience_months, availability_date, primary_skill_level";

/// PostgreSQL-backed CandidateStore implementation
#[derive(Clone)]
pub struct PostgresCandidateStore {
    pub(crate) pool: PgPool,
}

impl PostgresCandidateStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn candidate_from_row(row: &PgRow) -> Result<Candidate> {
        let level: String = row.get("primary_skill_level");
        let primary_skill_level = level
            .parse::<SkillLevel>()
            .map_err(|e| Error::Internal(format!("Stored candidate has {e}")))?;

        Ok(Candidate {
            id: row.get("id"),
            name: row.get("name"),
            mail_id: row.get("mail_id"),
            skill_set: row.get("skill_set"),
            experience_months: row.get("experience_months"),
            availability_date: row.get("availability_date"),
            primary_skill_level,
        })
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db_err) if db_err.is_unique_violation())
}

#[async_trait]
impl CandidateStore for PostgresCandidateStore {
    async fn find_key_rows(&self, probes: &[NaturalKey]) -> Result<Vec<NaturalKey>> {
        if probes.is_empty() {
            return Ok(Vec::new());
        }

        let keys: Vec<String> = probes.iter().map(NaturalKey::canonical).collect();

        let rows = sqlx::query(EXISTING_KEYS_SQL)
            .bind(&keys)
            .fetch_all(&self.pool)
            .await
            .map_err(Error::Database)?;

        Ok(rows
            .into_iter()
            .map(|r| NaturalKey {
                mail_id: r.get("mail_id"),
                skill_set: r.get("skill_set"),
                availability_date: r.get("availability_date"),
            })
            .collect())
    }

    async fn insert(&self, candidate: &NewCandidate) -> Result<Option<Candidate>> {
        let sql = format!(
            "INSERT INTO candidates
                 (name, mail_id, skill_set, experience_months, availability_date,
                  primary_skill_level, canonical_key)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING {CANDIDATE_COLUMNS}"
        );

        let result = sqlx::query(&sql)
            .bind(&candidate.name)
            .bind(&candidate.mail_id)
            .bind(&candidate.skill_set)
            .bind(candidate.experience_months)
            .bind(candidate.availability_date)
            .bind(candidate.primary_skill_level.as_str())
            .bind(candidate.natural_key().canonical())
            .fetch_one(&self.pool)
            .await;

        match result {
            Ok(row) => Ok(Some(Self::candidate_from_row(&row)?)),
            Err(e) if is_unique_violation(&e) => {
                tracing::debug!(
                    mail_id = %candidate.mail_id,
                    "Insert rejected by natural key constraint"
                );
                Ok(None)
            }
            Err(e) => Err(Error::Database(e)),
        }
    }

    async fn get(&self, id: i64) -> Result<Option<Candidate>> {
        let sql = format!("SELECT {CANDIDATE_COLUMNS} FROM candidates WHERE id = $1");
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(Error::Database)?;

        row.as_ref().map(Self::candidate_from_row).transpose()
    }

    async fn update(&self, id: i64, candidate: &NewCandidate) -> Result<UpdateOutcome> {
        let sql = format!(
            "UPDATE candidates
             SET name = $2,
                 mail_id = $3,
                 skill_set = $4,
                 experience_months = $5,
                 availability_date = $6,
                 primary_skill_level = $7,
                 canonical_key = $8
             WHERE id = $1
             RETURNING {CANDIDATE_COLUMNS}"
        );

        let result = sqlx::query(&sql)
            .bind(id)
            .bind(&candidate.name)
            .bind(&candidate.mail_id)
            .bind(&candidate.skill_set)
            .bind(candidate.experience_months)
            .bind(candidate.availability_date)
            .bind(candidate.primary_skill_level.as_str())
            .bind(candidate.natural_key().canonical())
            .fetch_optional(&self.pool)
            .await;

        match result {
            Ok(Some(row)) => Ok(UpdateOutcome::Updated(Self::candidate_from_row(&row)?)),
            Ok(None) => Ok(UpdateOutcome::NotFound),
            Err(e) if is_unique_violation(&e) => Ok(UpdateOutcome::Conflict),
            Err(e) => Err(Error::Database(e)),
        }
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM candidates WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;

        Ok(result.rows_affected() > 0)
    }

    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;
        Ok(())
    }
}
