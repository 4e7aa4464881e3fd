//! SQLite storage backend for the sweep.
//!
//! Holds both the audited exam content (questions, variants, alternatives)
//! and the sweep's own records (runs, results) in one database with full
//! SQL query support.

use std::collections::HashMap;
use std::path::Path;

use async_trait::async_trait;
use examsweep_core::{
    Alternative, FixStatus, Item, ResultId, Risk, Run, RunId, RunStatus, RunSummary, Stage,
    SweepResult,
};
use sqlx::Row;

use super::trait_::{Result, ReviewUpdate, Storage, StorageError};

/// SQLite storage implementation.
#[derive(Clone)]
pub struct SqliteStorage {
    /// Database connection pool
    pool: sqlx::SqlitePool,
}

impl SqliteStorage {
    /// Create a new SQLite storage instance, creating the database file
    /// and parent directory when missing.
    pub async fn new(db_path: &str) -> Result<Self> {
        if let Some(parent) = Path::new(db_path).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let options = sqlx::sqlite::SqliteConnectOptions::new()
            .filename(db_path)
            .create_if_missing(true);
        let pool = sqlx::SqlitePool::connect_with(options)
            .await
            .map_err(|e| StorageError::Other(e.to_string()))?;

        let storage = Self { pool };
        storage.init_schema().await?;

        Ok(storage)
    }

    /// Create a new SQLite storage instance from a path.
    pub async fn new_from_path(path: &Path) -> Result<Self> {
        Self::new(path.to_str().unwrap_or(":memory:")).await
    }

    /// Create an in-memory SQLite storage for testing.
    ///
    /// The pool is pinned to a single connection that never expires:
    /// every pooled connection would otherwise see its own empty
    /// in-memory database.
    pub async fn in_memory() -> Result<Self> {
        let pool = sqlx::sqlite::SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect(":memory:")
            .await
            .map_err(|e| StorageError::Other(e.to_string()))?;

        let storage = Self { pool };
        storage.init_schema().await?;

        Ok(storage)
    }

    /// Initialize the database schema.
    async fn init_schema(&self) -> Result<()> {
        // Audited content
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS questions (
                id INTEGER PRIMARY KEY,
                stem TEXT NOT NULL,
                created_at TEXT NOT NULL
            )",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::Other(e.to_string()))?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS variants (
                id INTEGER PRIMARY KEY,
                question_id INTEGER NOT NULL,
                variant_number INTEGER NOT NULL,
                stem TEXT NOT NULL,
                difficulty TEXT NOT NULL,
                explanation TEXT,
                created_at TEXT NOT NULL
            )",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::Other(e.to_string()))?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS alternatives (
                id INTEGER PRIMARY KEY,
                variant_id INTEGER NOT NULL,
                text TEXT NOT NULL,
                is_correct INTEGER NOT NULL DEFAULT 0,
                position INTEGER NOT NULL,
                explanation TEXT
            )",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::Other(e.to_string()))?;

        // Sweep records
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS sweep_runs (
                id TEXT PRIMARY KEY,
                params TEXT NOT NULL,
                status TEXT NOT NULL,
                summary TEXT,
                error TEXT,
                created_at TEXT NOT NULL,
                started_at TEXT,
                finished_at TEXT
            )",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::Other(e.to_string()))?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS sweep_results (
                id TEXT PRIMARY KEY,
                run_id TEXT NOT NULL,
                question_id INTEGER NOT NULL,
                variant_id INTEGER NOT NULL,
                stage TEXT NOT NULL,
                labels TEXT NOT NULL,
                scores TEXT NOT NULL,
                critique TEXT,
                patches TEXT,
                risk TEXT NOT NULL,
                applied INTEGER NOT NULL DEFAULT 0,
                fix_status TEXT,
                human_review_required INTEGER NOT NULL DEFAULT 0,
                fix_confidence REAL,
                reviewer TEXT,
                reviewed_at TEXT,
                review_notes TEXT,
                created_at TEXT NOT NULL
            )",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::Other(e.to_string()))?;

        // Create indexes
        sqlx::query("CREATE INDEX IF NOT EXISTS idx_variants_question ON variants(question_id)")
            .execute(&self.pool)
            .await
            .map_err(|e| StorageError::Other(e.to_string()))?;
        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_alternatives_variant ON alternatives(variant_id)",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::Other(e.to_string()))?;
        sqlx::query("CREATE INDEX IF NOT EXISTS idx_results_run ON sweep_results(run_id)")
            .execute(&self.pool)
            .await
            .map_err(|e| StorageError::Other(e.to_string()))?;
        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_results_review
             ON sweep_results(human_review_required, fix_status)",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::Other(e.to_string()))?;

        Ok(())
    }

    /// Helper to extract string from row.
    fn get_string(row: &sqlx::sqlite::SqliteRow, column: &str) -> String {
        row.try_get(column).unwrap_or_default()
    }

    /// Helper to extract an optional string from row.
    fn get_opt_string(row: &sqlx::sqlite::SqliteRow, column: &str) -> Option<String> {
        row.try_get(column).unwrap_or_default()
    }

    /// Helper to extract an integer from row.
    fn get_i64(row: &sqlx::sqlite::SqliteRow, column: &str) -> i64 {
        row.try_get(column).unwrap_or_default()
    }

    /// Helper to extract a boolean from row.
    fn get_bool(row: &sqlx::sqlite::SqliteRow, column: &str) -> bool {
        row.try_get(column).unwrap_or_default()
    }

    /// Load a variant's alternatives in display order.
    async fn load_alternatives(&self, variant_id: i64) -> Result<Vec<Alternative>> {
        let rows = sqlx::query(
            "SELECT id, text, is_correct, position, explanation
             FROM alternatives WHERE variant_id = ? ORDER BY position, id",
        )
        .bind(variant_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StorageError::Other(e.to_string()))?;

        Ok(rows
            .into_iter()
            .map(|row| Alternative {
                id: Self::get_i64(&row, "id"),
                text: Self::get_string(&row, "text"),
                is_correct: Self::get_bool(&row, "is_correct"),
                position: Self::get_i64(&row, "position"),
                explanation: Self::get_opt_string(&row, "explanation"),
            })
            .collect())
    }

    /// Build an Item from a joined variant row, loading its alternatives.
    async fn item_from_row(&self, row: &sqlx::sqlite::SqliteRow) -> Result<Item> {
        let variant_id = Self::get_i64(row, "variant_id");
        let alternatives = self.load_alternatives(variant_id).await?;

        Ok(Item {
            question_id: Self::get_i64(row, "question_id"),
            variant_id,
            sequence: Self::get_i64(row, "seq"),
            variant_number: Self::get_i64(row, "variant_number"),
            base_stem: Self::get_string(row, "base_stem"),
            stem: Self::get_string(row, "stem"),
            difficulty: Self::get_string(row, "difficulty"),
            explanation: Self::get_opt_string(row, "explanation"),
            alternatives,
        })
    }

    /// Resolve the row id of the alternative at `index` in display order.
    async fn alternative_id_at(&self, variant_id: i64, index: usize) -> Result<i64> {
        let row = sqlx::query(
            "SELECT id FROM alternatives WHERE variant_id = ?
             ORDER BY position, id LIMIT 1 OFFSET ?",
        )
        .bind(variant_id)
        .bind(index as i64)
        .fetch_one(&self.pool)
        .await;

        match row {
            Ok(row) => Ok(Self::get_i64(&row, "id")),
            Err(sqlx::Error::RowNotFound) => Err(StorageError::NotFound(format!(
                "alternative {index} of variant {variant_id}"
            ))),
            Err(e) => Err(StorageError::Other(e.to_string())),
        }
    }

    fn run_from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Run> {
        let id = Self::get_string(row, "id")
            .parse::<RunId>()
            .map_err(|e| StorageError::Other(e.to_string()))?;
        let params = serde_json::from_str(&Self::get_string(row, "params"))
            .map_err(StorageError::Json)?;
        let status: RunStatus = Self::get_string(row, "status")
            .parse()
            .map_err(StorageError::Other)?;
        let summary = Self::get_opt_string(row, "summary")
            .map(|s| serde_json::from_str(&s))
            .transpose()
            .map_err(StorageError::Json)?;

        Ok(Run {
            id,
            params,
            status,
            summary,
            error: Self::get_opt_string(row, "error"),
            created_at: Self::get_string(row, "created_at")
                .parse()
                .unwrap_or(chrono::Utc::now()),
            started_at: Self::get_opt_string(row, "started_at").and_then(|s| s.parse().ok()),
            finished_at: Self::get_opt_string(row, "finished_at").and_then(|s| s.parse().ok()),
        })
    }

    fn result_from_row(row: &sqlx::sqlite::SqliteRow) -> Result<SweepResult> {
        let id = Self::get_string(row, "id")
            .parse::<ResultId>()
            .map_err(|e| StorageError::Other(e.to_string()))?;
        let run_id = Self::get_string(row, "run_id")
            .parse::<RunId>()
            .map_err(|e| StorageError::Other(e.to_string()))?;
        let stage: Stage = Self::get_string(row, "stage")
            .parse()
            .map_err(StorageError::Other)?;
        let risk: Risk = Self::get_string(row, "risk")
            .parse()
            .map_err(StorageError::Other)?;
        let labels = serde_json::from_str(&Self::get_string(row, "labels"))
            .map_err(StorageError::Json)?;
        let scores = serde_json::from_str(&Self::get_string(row, "scores"))
            .map_err(StorageError::Json)?;
        let patches = Self::get_opt_string(row, "patches")
            .map(|s| serde_json::from_str(&s))
            .transpose()
            .map_err(StorageError::Json)?;
        let fix_status = Self::get_opt_string(row, "fix_status")
            .map(|s| s.parse())
            .transpose()
            .map_err(StorageError::Other)?;

        Ok(SweepResult {
            id,
            run_id,
            question_id: Self::get_i64(row, "question_id"),
            variant_id: Self::get_i64(row, "variant_id"),
            stage,
            labels,
            scores,
            critique: Self::get_opt_string(row, "critique"),
            patches,
            risk,
            applied: Self::get_bool(row, "applied"),
            fix_status,
            human_review_required: Self::get_bool(row, "human_review_required"),
            fix_confidence: row.try_get("fix_confidence").unwrap_or_default(),
            reviewer: Self::get_opt_string(row, "reviewer"),
            reviewed_at: Self::get_opt_string(row, "reviewed_at").and_then(|s| s.parse().ok()),
            review_notes: Self::get_opt_string(row, "review_notes"),
            created_at: Self::get_string(row, "created_at")
                .parse()
                .unwrap_or(chrono::Utc::now()),
        })
    }
}

#[async_trait]
impl Storage for SqliteStorage {
    // === Content operations ===

    async fn fetch_range(&self, from: i64, to: i64) -> Result<Vec<Item>> {
        let rows = sqlx::query(
            "SELECT v.id AS variant_id, v.question_id, v.variant_number, v.stem,
                    v.difficulty, v.explanation, q.stem AS base_stem, q.seq
             FROM variants v
             JOIN (
                 SELECT id, stem,
                        ROW_NUMBER() OVER (ORDER BY created_at, id) AS seq
                 FROM questions
             ) q ON q.id = v.question_id
             WHERE q.seq BETWEEN ? AND ?
             ORDER BY q.seq, v.variant_number",
        )
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StorageError::Other(e.to_string()))?;

        let mut items = Vec::with_capacity(rows.len());
        for row in &rows {
            items.push(self.item_from_row(row).await?);
        }

        Ok(items)
    }

    async fn fetch_by_ids(&self, ids: &[i64]) -> Result<HashMap<i64, Item>> {
        let mut items = HashMap::new();

        for &variant_id in ids {
            let row = sqlx::query(
                "SELECT v.id AS variant_id, v.question_id, v.variant_number, v.stem,
                        v.difficulty, v.explanation, q.stem AS base_stem, q.seq
                 FROM variants v
                 JOIN (
                     SELECT id, stem,
                            ROW_NUMBER() OVER (ORDER BY created_at, id) AS seq
                     FROM questions
                 ) q ON q.id = v.question_id
                 WHERE v.id = ?",
            )
            .bind(variant_id)
            .fetch_one(&self.pool)
            .await;

            match row {
                Ok(row) => {
                    items.insert(variant_id, self.item_from_row(&row).await?);
                }
                // Unknown ids are omitted, not an error
                Err(sqlx::Error::RowNotFound) => {}
                Err(e) => return Err(StorageError::Other(e.to_string())),
            }
        }

        Ok(items)
    }

    async fn update_variant_stem(&self, variant_id: i64, stem: &str) -> Result<()> {
        let res = sqlx::query("UPDATE variants SET stem = ? WHERE id = ?")
            .bind(stem)
            .bind(variant_id)
            .execute(&self.pool)
            .await
            .map_err(|e| StorageError::Other(e.to_string()))?;

        if res.rows_affected() == 0 {
            return Err(StorageError::NotFound(format!("variant {variant_id}")));
        }
        Ok(())
    }

    async fn update_variant_explanation(&self, variant_id: i64, explanation: &str) -> Result<()> {
        let res = sqlx::query("UPDATE variants SET explanation = ? WHERE id = ?")
            .bind(explanation)
            .bind(variant_id)
            .execute(&self.pool)
            .await
            .map_err(|e| StorageError::Other(e.to_string()))?;

        if res.rows_affected() == 0 {
            return Err(StorageError::NotFound(format!("variant {variant_id}")));
        }
        Ok(())
    }

    async fn update_variant_difficulty(&self, variant_id: i64, difficulty: &str) -> Result<()> {
        let res = sqlx::query("UPDATE variants SET difficulty = ? WHERE id = ?")
            .bind(difficulty)
            .bind(variant_id)
            .execute(&self.pool)
            .await
            .map_err(|e| StorageError::Other(e.to_string()))?;

        if res.rows_affected() == 0 {
            return Err(StorageError::NotFound(format!("variant {variant_id}")));
        }
        Ok(())
    }

    async fn update_alternative_text(
        &self,
        variant_id: i64,
        index: usize,
        text: &str,
    ) -> Result<()> {
        let id = self.alternative_id_at(variant_id, index).await?;

        sqlx::query("UPDATE alternatives SET text = ? WHERE id = ?")
            .bind(text)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| StorageError::Other(e.to_string()))?;

        Ok(())
    }

    async fn update_alternative_explanation(
        &self,
        variant_id: i64,
        index: usize,
        explanation: &str,
    ) -> Result<()> {
        let id = self.alternative_id_at(variant_id, index).await?;

        sqlx::query("UPDATE alternatives SET explanation = ? WHERE id = ?")
            .bind(explanation)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| StorageError::Other(e.to_string()))?;

        Ok(())
    }

    // === Run operations ===

    async fn create_run(&self, run: &Run) -> Result<()> {
        let params = serde_json::to_string(&run.params).map_err(StorageError::Json)?;
        let summary = run
            .summary
            .as_ref()
            .map(serde_json::to_string)
            .transpose()
            .map_err(StorageError::Json)?;

        sqlx::query(
            "INSERT INTO sweep_runs (id, params, status, summary, error,
                                     created_at, started_at, finished_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(run.id.to_string())
        .bind(params)
        .bind(run.status.as_str())
        .bind(summary)
        .bind(run.error.as_deref())
        .bind(run.created_at.to_rfc3339())
        .bind(run.started_at.map(|t| t.to_rfc3339()))
        .bind(run.finished_at.map(|t| t.to_rfc3339()))
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::Other(e.to_string()))?;

        Ok(())
    }

    async fn mark_run_running(&self, id: RunId) -> Result<()> {
        let res = sqlx::query("UPDATE sweep_runs SET status = 'RUNNING', started_at = ? WHERE id = ?")
            .bind(chrono::Utc::now().to_rfc3339())
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(|e| StorageError::Other(e.to_string()))?;

        if res.rows_affected() == 0 {
            return Err(StorageError::NotFound(format!("run {id}")));
        }
        Ok(())
    }

    async fn complete_run(&self, id: RunId, summary: &RunSummary) -> Result<()> {
        let summary = serde_json::to_string(summary).map_err(StorageError::Json)?;

        let res = sqlx::query(
            "UPDATE sweep_runs SET status = 'DONE', summary = ?, finished_at = ? WHERE id = ?",
        )
        .bind(summary)
        .bind(chrono::Utc::now().to_rfc3339())
        .bind(id.to_string())
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::Other(e.to_string()))?;

        if res.rows_affected() == 0 {
            return Err(StorageError::NotFound(format!("run {id}")));
        }
        Ok(())
    }

    async fn fail_run(&self, id: RunId, message: &str) -> Result<()> {
        let res = sqlx::query(
            "UPDATE sweep_runs SET status = 'FAILED', error = ?, finished_at = ? WHERE id = ?",
        )
        .bind(message)
        .bind(chrono::Utc::now().to_rfc3339())
        .bind(id.to_string())
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::Other(e.to_string()))?;

        if res.rows_affected() == 0 {
            return Err(StorageError::NotFound(format!("run {id}")));
        }
        Ok(())
    }

    async fn update_run_fixed_count(&self, id: RunId, fixed: u64) -> Result<()> {
        let run = self
            .load_run(id)
            .await?
            .ok_or_else(|| StorageError::NotFound(format!("run {id}")))?;

        let mut summary = run.summary.unwrap_or_default();
        summary.fixed = fixed;
        let summary = serde_json::to_string(&summary).map_err(StorageError::Json)?;

        sqlx::query("UPDATE sweep_runs SET summary = ? WHERE id = ?")
            .bind(summary)
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(|e| StorageError::Other(e.to_string()))?;

        Ok(())
    }

    async fn load_run(&self, id: RunId) -> Result<Option<Run>> {
        let row = sqlx::query("SELECT * FROM sweep_runs WHERE id = ?")
            .bind(id.to_string())
            .fetch_one(&self.pool)
            .await;

        match row {
            Ok(row) => Ok(Some(Self::run_from_row(&row)?)),
            Err(sqlx::Error::RowNotFound) => Ok(None),
            Err(e) => Err(StorageError::Other(e.to_string())),
        }
    }

    async fn list_runs(&self, limit: usize) -> Result<Vec<Run>> {
        let rows = sqlx::query("SELECT * FROM sweep_runs ORDER BY created_at DESC LIMIT ?")
            .bind(limit as i64)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| StorageError::Other(e.to_string()))?;

        rows.iter().map(Self::run_from_row).collect()
    }

    // === Result operations ===

    async fn insert_result(&self, result: &SweepResult) -> Result<()> {
        let labels = serde_json::to_string(&result.labels).map_err(StorageError::Json)?;
        let scores = serde_json::to_string(&result.scores).map_err(StorageError::Json)?;
        let patches = result
            .patches
            .as_ref()
            .map(serde_json::to_string)
            .transpose()
            .map_err(StorageError::Json)?;

        sqlx::query(
            "INSERT INTO sweep_results (id, run_id, question_id, variant_id, stage,
                                        labels, scores, critique, patches, risk,
                                        applied, fix_status, human_review_required,
                                        fix_confidence, reviewer, reviewed_at,
                                        review_notes, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(result.id.to_string())
        .bind(result.run_id.to_string())
        .bind(result.question_id)
        .bind(result.variant_id)
        .bind(result.stage.as_str())
        .bind(labels)
        .bind(scores)
        .bind(result.critique.as_deref())
        .bind(patches)
        .bind(result.risk.as_str())
        .bind(result.applied)
        .bind(result.fix_status.map(|s| s.as_str()))
        .bind(result.human_review_required)
        .bind(result.fix_confidence)
        .bind(result.reviewer.as_deref())
        .bind(result.reviewed_at.map(|t| t.to_rfc3339()))
        .bind(result.review_notes.as_deref())
        .bind(result.created_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::Other(e.to_string()))?;

        Ok(())
    }

    async fn load_result(&self, id: ResultId) -> Result<Option<SweepResult>> {
        let row = sqlx::query("SELECT * FROM sweep_results WHERE id = ?")
            .bind(id.to_string())
            .fetch_one(&self.pool)
            .await;

        match row {
            Ok(row) => Ok(Some(Self::result_from_row(&row)?)),
            Err(sqlx::Error::RowNotFound) => Ok(None),
            Err(e) => Err(StorageError::Other(e.to_string())),
        }
    }

    async fn list_results(
        &self,
        run_id: RunId,
        stage: Option<Stage>,
        limit: usize,
    ) -> Result<Vec<SweepResult>> {
        let rows = sqlx::query(
            "SELECT * FROM sweep_results WHERE run_id = ? ORDER BY created_at, id",
        )
        .bind(run_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StorageError::Other(e.to_string()))?;

        let mut results: Vec<SweepResult> = rows
            .iter()
            .map(Self::result_from_row)
            .collect::<Result<Vec<_>>>()?;

        if let Some(stage) = stage {
            results.retain(|r| r.stage == stage);
        }
        results.truncate(limit);

        Ok(results)
    }

    async fn list_pending_review(
        &self,
        status: Option<FixStatus>,
        risk: Option<Risk>,
        limit: usize,
    ) -> Result<Vec<SweepResult>> {
        let status = status.unwrap_or(FixStatus::PendingReview);
        // Undecided entries are exactly those still flagged for review
        let sql = if status == FixStatus::PendingReview {
            "SELECT * FROM sweep_results
             WHERE stage = 'FIX' AND fix_status = ? AND human_review_required = 1
             ORDER BY created_at DESC"
        } else {
            "SELECT * FROM sweep_results
             WHERE stage = 'FIX' AND fix_status = ?
             ORDER BY created_at DESC"
        };

        let rows = sqlx::query(sql)
            .bind(status.as_str())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| StorageError::Other(e.to_string()))?;

        let mut results: Vec<SweepResult> = rows
            .iter()
            .map(Self::result_from_row)
            .collect::<Result<Vec<_>>>()?;

        if let Some(risk) = risk {
            results.retain(|r| r.risk == risk);
        }
        results.truncate(limit);

        Ok(results)
    }

    async fn record_review(&self, id: ResultId, update: &ReviewUpdate) -> Result<()> {
        let res = sqlx::query(
            "UPDATE sweep_results
             SET applied = ?, fix_status = ?, human_review_required = 0,
                 reviewer = ?, reviewed_at = ?, review_notes = ?
             WHERE id = ?",
        )
        .bind(update.applied)
        .bind(update.fix_status.as_str())
        .bind(&update.reviewer)
        .bind(chrono::Utc::now().to_rfc3339())
        .bind(update.notes.as_deref())
        .bind(id.to_string())
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::Other(e.to_string()))?;

        if res.rows_affected() == 0 {
            return Err(StorageError::NotFound(format!("result {id}")));
        }
        Ok(())
    }

    // === Health ===

    async fn health_check(&self) -> bool {
        sqlx::query("SELECT 1").fetch_one(&self.pool).await.is_ok()
    }
}

// === Content ingestion ===

impl SqliteStorage {
    /// Insert a base question; returns its row id.
    ///
    /// `created_at` drives the derived sequence numbering, so callers
    /// control ordering explicitly.
    pub async fn insert_question(
        &self,
        stem: &str,
        created_at: examsweep_core::Time,
    ) -> Result<i64> {
        let res = sqlx::query("INSERT INTO questions (stem, created_at) VALUES (?, ?)")
            .bind(stem)
            .bind(created_at.to_rfc3339())
            .execute(&self.pool)
            .await
            .map_err(|e| StorageError::Other(e.to_string()))?;

        Ok(res.last_insert_rowid())
    }

    /// Insert a variant of a base question; returns its row id.
    pub async fn insert_variant(
        &self,
        question_id: i64,
        variant_number: i64,
        stem: &str,
        difficulty: &str,
        explanation: Option<&str>,
    ) -> Result<i64> {
        let res = sqlx::query(
            "INSERT INTO variants (question_id, variant_number, stem, difficulty,
                                   explanation, created_at)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(question_id)
        .bind(variant_number)
        .bind(stem)
        .bind(difficulty)
        .bind(explanation)
        .bind(chrono::Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::Other(e.to_string()))?;

        Ok(res.last_insert_rowid())
    }

    /// Insert an answer alternative; returns its row id.
    pub async fn insert_alternative(
        &self,
        variant_id: i64,
        text: &str,
        is_correct: bool,
        position: i64,
        explanation: Option<&str>,
    ) -> Result<i64> {
        let res = sqlx::query(
            "INSERT INTO alternatives (variant_id, text, is_correct, position, explanation)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(variant_id)
        .bind(text)
        .bind(is_correct)
        .bind(position)
        .bind(explanation)
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::Other(e.to_string()))?;

        Ok(res.last_insert_rowid())
    }
}
