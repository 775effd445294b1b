//! Run repository trait definition.
//!
//! Defines the storage interface for run records. The infrastructure layer
//! (outreach-infra) implements this trait with SQLite persistence.

use outreach_types::error::RepositoryError;
use outreach_types::run::RunRecord;
use uuid::Uuid;

/// Repository trait for run persistence.
///
/// One record per run; the record carries the full serialized state
/// checkpoint, so restoring a suspended run needs a single read.
///
/// Uses native async fn in traits (Rust 2024 edition, no async_trait macro).
pub trait RunRepository: Send + Sync {
    /// Insert a new run record.
    fn create_run(
        &self,
        run: &RunRecord,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Overwrite an existing run record by ID.
    fn save_run(
        &self,
        run: &RunRecord,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Atomically transition a suspended run to running, clearing its prompt.
    ///
    /// Returns `false` when the run does not exist or is not currently
    /// suspended. The check and the write must be a single compare and swap
    /// in storage so that concurrent resume attempts have exactly one winner.
    fn claim_suspended(
        &self,
        run_id: &Uuid,
    ) -> impl std::future::Future<Output = Result<bool, RepositoryError>> + Send;

    /// Get a run by its UUID.
    fn get_run(
        &self,
        run_id: &Uuid,
    ) -> impl std::future::Future<Output = Result<Option<RunRecord>, RepositoryError>> + Send;

    /// List runs ordered by started_at DESC.
    fn list_runs(
        &self,
        limit: u32,
    ) -> impl std::future::Future<Output = Result<Vec<RunRecord>, RepositoryError>> + Send;

    /// List runs parked in `Suspended` status, oldest first.
    fn list_suspended(
        &self,
    ) -> impl std::future::Future<Output = Result<Vec<RunRecord>, RepositoryError>> + Send;
}
