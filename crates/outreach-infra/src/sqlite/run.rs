//! SQLite run repository implementation.
//!
//! Implements `RunRepository` from `outreach-core` using sqlx with split
//! read/write pools. The state checkpoint is stored as a JSON blob; status,
//! stage, and disposition are stored as their snake_case string forms.

use chrono::{DateTime, Utc};
use outreach_core::repository::RunRepository;
use outreach_types::error::RepositoryError;
use outreach_types::run::{Disposition, RunRecord, RunStatus, StageId};
use sqlx::Row;
use uuid::Uuid;

use super::pool::DatabasePool;

/// SQLite-backed implementation of `RunRepository`.
pub struct SqliteRunRepository {
    pool: DatabasePool,
}

impl SqliteRunRepository {
    /// Create a new repository backed by the given database pool.
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

// ---------------------------------------------------------------------------
// Internal row type
// ---------------------------------------------------------------------------

struct RunRow {
    id: String,
    status: String,
    stage: Option<String>,
    state: String,
    prompt: Option<String>,
    disposition: Option<String>,
    error: Option<String>,
    started_at: String,
    completed_at: Option<String>,
}

impl RunRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            status: row.try_get("status")?,
            stage: row.try_get("stage")?,
            state: row.try_get("state")?,
            prompt: row.try_get("prompt")?,
            disposition: row.try_get("disposition")?,
            error: row.try_get("error")?,
            started_at: row.try_get("started_at")?,
            completed_at: row.try_get("completed_at")?,
        })
    }

    fn into_record(self) -> Result<RunRecord, RepositoryError> {
        let id = parse_uuid(&self.id)?;

        let status: RunStatus = self
            .status
            .parse()
            .map_err(|e: String| RepositoryError::Query(e))?;

        let stage: Option<StageId> = self
            .stage
            .as_deref()
            .map(str::parse)
            .transpose()
            .map_err(|e: String| RepositoryError::Query(e))?;

        let disposition: Option<Disposition> = self
            .disposition
            .as_deref()
            .map(str::parse)
            .transpose()
            .map_err(|e: String| RepositoryError::Query(e))?;

        let state: serde_json::Value = serde_json::from_str(&self.state)
            .map_err(|e| RepositoryError::Query(format!("invalid state JSON: {e}")))?;

        let started_at = parse_datetime(&self.started_at)?;
        let completed_at = self
            .completed_at
            .as_deref()
            .map(parse_datetime)
            .transpose()?;

        Ok(RunRecord {
            id,
            status,
            stage,
            state,
            prompt: self.prompt,
            disposition,
            error: self.error,
            started_at,
            completed_at,
        })
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn parse_uuid(s: &str) -> Result<Uuid, RepositoryError> {
    s.parse::<Uuid>()
        .map_err(|e| RepositoryError::Query(format!("invalid UUID: {e}")))
}

fn parse_datetime(s: &str) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| RepositoryError::Query(format!("invalid datetime: {e}")))
}

fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339()
}

fn state_json(run: &RunRecord) -> Result<String, RepositoryError> {
    serde_json::to_string(&run.state)
        .map_err(|e| RepositoryError::Query(format!("serialize state: {e}")))
}

// ---------------------------------------------------------------------------
// RunRepository impl
// ---------------------------------------------------------------------------

impl RunRepository for SqliteRunRepository {
    async fn create_run(&self, run: &RunRecord) -> Result<(), RepositoryError> {
        let state = state_json(run)?;

        sqlx::query(
            r#"INSERT INTO runs
               (id, status, stage, state, prompt, disposition, error, started_at, completed_at)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(run.id.to_string())
        .bind(run.status.as_str())
        .bind(run.stage.map(|s| s.as_str()))
        .bind(&state)
        .bind(&run.prompt)
        .bind(run.disposition.map(|d| d.as_str()))
        .bind(&run.error)
        .bind(format_datetime(&run.started_at))
        .bind(run.completed_at.as_ref().map(format_datetime))
        .execute(&self.pool.writer)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        Ok(())
    }

    async fn save_run(&self, run: &RunRecord) -> Result<(), RepositoryError> {
        let state = state_json(run)?;

        let result = sqlx::query(
            r#"UPDATE runs SET
                 status = ?,
                 stage = ?,
                 state = ?,
                 prompt = ?,
                 disposition = ?,
                 error = ?,
                 completed_at = ?
               WHERE id = ?"#,
        )
        .bind(run.status.as_str())
        .bind(run.stage.map(|s| s.as_str()))
        .bind(&state)
        .bind(&run.prompt)
        .bind(run.disposition.map(|d| d.as_str()))
        .bind(&run.error)
        .bind(run.completed_at.as_ref().map(format_datetime))
        .bind(run.id.to_string())
        .execute(&self.pool.writer)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn claim_suspended(&self, run_id: &Uuid) -> Result<bool, RepositoryError> {
        // Conditional UPDATE is the compare and swap: the status predicate
        // and the write happen in one statement on the single writer.
        let result = sqlx::query(
            "UPDATE runs SET status = 'running', prompt = NULL
             WHERE id = ? AND status = 'suspended'",
        )
        .bind(run_id.to_string())
        .execute(&self.pool.writer)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        Ok(result.rows_affected() > 0)
    }

    async fn get_run(&self, run_id: &Uuid) -> Result<Option<RunRecord>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM runs WHERE id = ?")
            .bind(run_id.to_string())
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        match row {
            Some(row) => {
                let r = RunRow::from_row(&row)
                    .map_err(|e| RepositoryError::Query(e.to_string()))?;
                Ok(Some(r.into_record()?))
            }
            None => Ok(None),
        }
    }

    async fn list_runs(&self, limit: u32) -> Result<Vec<RunRecord>, RepositoryError> {
        let rows = sqlx::query("SELECT * FROM runs ORDER BY started_at DESC LIMIT ?")
            .bind(limit as i64)
            .fetch_all(&self.pool.reader)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        let mut runs = Vec::with_capacity(rows.len());
        for row in &rows {
            let r = RunRow::from_row(row)
                .map_err(|e| RepositoryError::Query(e.to_string()))?;
            runs.push(r.into_record()?);
        }
        Ok(runs)
    }

    async fn list_suspended(&self) -> Result<Vec<RunRecord>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT * FROM runs WHERE status = 'suspended' ORDER BY started_at ASC",
        )
        .fetch_all(&self.pool.reader)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        let mut runs = Vec::with_capacity(rows.len());
        for row in &rows {
            let r = RunRow::from_row(row)
                .map_err(|e| RepositoryError::Query(e.to_string()))?;
            runs.push(r.into_record()?);
        }
        Ok(runs)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    async fn test_repo() -> (tempfile::TempDir, SqliteRunRepository) {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let url = format!("sqlite://{}?mode=rwc", db_path.display());
        let pool = DatabasePool::new(&url).await.unwrap();
        (dir, SqliteRunRepository::new(pool))
    }

    fn sample_run() -> RunRecord {
        RunRecord {
            id: Uuid::now_v7(),
            status: RunStatus::Running,
            stage: None,
            state: json!({"conversation": [{"role": "human", "text": "https://jobs.example/1"}]}),
            prompt: None,
            disposition: None,
            error: None,
            started_at: Utc::now(),
            completed_at: None,
        }
    }

    #[tokio::test]
    async fn test_create_and_get_run() {
        let (_dir, repo) = test_repo().await;
        let run = sample_run();
        repo.create_run(&run).await.unwrap();

        let fetched = repo.get_run(&run.id).await.unwrap().unwrap();
        assert_eq!(fetched.id, run.id);
        assert_eq!(fetched.status, RunStatus::Running);
        assert!(fetched.stage.is_none());
        assert_eq!(fetched.state, run.state);
    }

    #[tokio::test]
    async fn test_get_missing_run_returns_none() {
        let (_dir, repo) = test_repo().await;
        assert!(repo.get_run(&Uuid::now_v7()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_save_run_updates_all_mutable_columns() {
        let (_dir, repo) = test_repo().await;
        let mut run = sample_run();
        repo.create_run(&run).await.unwrap();

        run.status = RunStatus::Suspended;
        run.stage = Some(StageId::Approve);
        run.prompt = Some("Do you approve?".to_string());
        run.state = json!({"draft": "Subject: Hi\n\nDear Jane,"});
        repo.save_run(&run).await.unwrap();

        let fetched = repo.get_run(&run.id).await.unwrap().unwrap();
        assert_eq!(fetched.status, RunStatus::Suspended);
        assert_eq!(fetched.stage, Some(StageId::Approve));
        assert_eq!(fetched.prompt.as_deref(), Some("Do you approve?"));

        run.status = RunStatus::Completed;
        run.prompt = None;
        run.disposition = Some(Disposition::Sent);
        run.completed_at = Some(Utc::now());
        repo.save_run(&run).await.unwrap();

        let fetched = repo.get_run(&run.id).await.unwrap().unwrap();
        assert_eq!(fetched.status, RunStatus::Completed);
        assert_eq!(fetched.disposition, Some(Disposition::Sent));
        assert!(fetched.prompt.is_none());
        assert!(fetched.completed_at.is_some());
    }

    #[tokio::test]
    async fn test_save_unknown_run_is_not_found() {
        let (_dir, repo) = test_repo().await;
        let run = sample_run();
        let err = repo.save_run(&run).await.unwrap_err();
        assert!(matches!(err, RepositoryError::NotFound));
    }

    #[tokio::test]
    async fn test_claim_suspended_has_a_single_winner() {
        let (_dir, repo) = test_repo().await;
        let mut run = sample_run();
        run.status = RunStatus::Suspended;
        run.prompt = Some("Do you approve?".to_string());
        repo.create_run(&run).await.unwrap();

        assert!(repo.claim_suspended(&run.id).await.unwrap());

        let fetched = repo.get_run(&run.id).await.unwrap().unwrap();
        assert_eq!(fetched.status, RunStatus::Running);
        assert!(fetched.prompt.is_none());

        // A second claim (a racing retry) loses.
        assert!(!repo.claim_suspended(&run.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_claim_suspended_ignores_non_suspended_runs() {
        let (_dir, repo) = test_repo().await;
        let run = sample_run();
        repo.create_run(&run).await.unwrap();

        assert!(!repo.claim_suspended(&run.id).await.unwrap());
        assert!(!repo.claim_suspended(&Uuid::now_v7()).await.unwrap());

        let fetched = repo.get_run(&run.id).await.unwrap().unwrap();
        assert_eq!(fetched.status, RunStatus::Running);
    }

    #[tokio::test]
    async fn test_list_runs_newest_first_with_limit() {
        let (_dir, repo) = test_repo().await;
        let mut ids = Vec::new();
        for i in 0..3 {
            let mut run = sample_run();
            run.started_at = Utc::now() + chrono::Duration::seconds(i);
            repo.create_run(&run).await.unwrap();
            ids.push(run.id);
        }

        let runs = repo.list_runs(2).await.unwrap();
        assert_eq!(runs.len(), 2);
        assert_eq!(runs[0].id, ids[2]);
        assert_eq!(runs[1].id, ids[1]);
    }

    #[tokio::test]
    async fn test_list_suspended_filters_and_orders() {
        let (_dir, repo) = test_repo().await;

        let completed = sample_run();
        repo.create_run(&completed).await.unwrap();
        let mut completed = completed;
        completed.status = RunStatus::Completed;
        completed.disposition = Some(Disposition::Rejected);
        repo.save_run(&completed).await.unwrap();

        let mut older = sample_run();
        older.status = RunStatus::Suspended;
        older.started_at = Utc::now() - chrono::Duration::minutes(5);
        repo.create_run(&older).await.unwrap();

        let mut newer = sample_run();
        newer.status = RunStatus::Suspended;
        repo.create_run(&newer).await.unwrap();

        let suspended = repo.list_suspended().await.unwrap();
        assert_eq!(suspended.len(), 2);
        assert_eq!(suspended[0].id, older.id);
        assert_eq!(suspended[1].id, newer.id);
    }
}
