//! Storage trait abstraction.

use std::collections::HashMap;

use async_trait::async_trait;
use examsweep_core::{
    FixStatus, Item, ResultId, Risk, Run, RunId, RunSummary, Stage, SweepResult,
};

/// Error type for storage operations.
pub type Result<T> = std::result::Result<T, StorageError>;

/// Errors that can occur during storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Item not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Other error
    #[error("{0}")]
    Other(String),
}

/// Review-field mutation applied by a review-queue action.
///
/// The review fields are the only part of a persisted result that ever
/// changes after insertion, and this is the only path that changes them.
#[derive(Debug, Clone)]
pub struct ReviewUpdate {
    /// Whether the stored patches were applied to content
    pub applied: bool,
    /// New routing state, `human_approved` or `human_rejected`
    pub fix_status: FixStatus,
    /// Who made the decision
    pub reviewer: String,
    /// Optional reviewer notes
    pub notes: Option<String>,
}

/// Storage abstraction for sweep data and the variant content it audits.
///
/// This trait allows different storage backends to be plugged in. All
/// operations fail only on connectivity or serialization errors; lookup
/// misses are expressed through `Option` and empty collections.
#[async_trait]
pub trait Storage: Send + Sync {
    // === Content operations ===

    /// Load every variant whose base question's derived sequence number
    /// falls in `[from, to]` inclusive, ordered by (sequence number,
    /// variant number). An empty range yields an empty Vec.
    async fn fetch_range(&self, from: i64, to: i64) -> Result<Vec<Item>>;

    /// Load a specific set of variants by id. Unknown ids are omitted
    /// from the map, not an error.
    async fn fetch_by_ids(&self, ids: &[i64]) -> Result<HashMap<i64, Item>>;

    /// Rewrite a variant's stem.
    async fn update_variant_stem(&self, variant_id: i64, stem: &str) -> Result<()>;

    /// Rewrite a variant's global explanation.
    async fn update_variant_explanation(&self, variant_id: i64, explanation: &str) -> Result<()>;

    /// Rewrite a variant's difficulty.
    async fn update_variant_difficulty(&self, variant_id: i64, difficulty: &str) -> Result<()>;

    /// Rewrite the text of the alternative at `index` in display order.
    async fn update_alternative_text(&self, variant_id: i64, index: usize, text: &str)
        -> Result<()>;

    /// Rewrite the explanation of the alternative at `index` in display
    /// order.
    async fn update_alternative_explanation(
        &self,
        variant_id: i64,
        index: usize,
        explanation: &str,
    ) -> Result<()>;

    // === Run operations ===

    /// Persist a new run record.
    async fn create_run(&self, run: &Run) -> Result<()>;

    /// Move a run to RUNNING and stamp its start time.
    async fn mark_run_running(&self, id: RunId) -> Result<()>;

    /// Move a run to DONE with its summary and stamp its finish time.
    async fn complete_run(&self, id: RunId, summary: &RunSummary) -> Result<()>;

    /// Move a run to FAILED with an error message and stamp its finish
    /// time.
    async fn fail_run(&self, id: RunId, message: &str) -> Result<()>;

    /// Update the `fixed` count of a finished run's summary (fix phase).
    async fn update_run_fixed_count(&self, id: RunId, fixed: u64) -> Result<()>;

    /// Load a run by id.
    async fn load_run(&self, id: RunId) -> Result<Option<Run>>;

    /// List the most recent runs, newest first.
    async fn list_runs(&self, limit: usize) -> Result<Vec<Run>>;

    // === Result operations ===

    /// Persist a new result record.
    async fn insert_result(&self, result: &SweepResult) -> Result<()>;

    /// Load a result by id.
    async fn load_result(&self, id: ResultId) -> Result<Option<SweepResult>>;

    /// List a run's results in insertion order, optionally filtered by
    /// stage.
    async fn list_results(
        &self,
        run_id: RunId,
        stage: Option<Stage>,
        limit: usize,
    ) -> Result<Vec<SweepResult>>;

    /// List review-queue entries, newest first. Defaults to results
    /// waiting for review; `status` widens the view to already-decided
    /// entries, `risk` narrows by priority.
    async fn list_pending_review(
        &self,
        status: Option<FixStatus>,
        risk: Option<Risk>,
        limit: usize,
    ) -> Result<Vec<SweepResult>>;

    /// Apply a review decision to a result. Stamps the review time and
    /// clears the review-required flag.
    async fn record_review(&self, id: ResultId, update: &ReviewUpdate) -> Result<()>;

    // === Health ===

    /// Whether the backend is reachable.
    async fn health_check(&self) -> bool;
}
