//! Human review queue over FIX-stage results.

use std::sync::Arc;

use examsweep_core::{FixStatus, Item, ResultId, Risk, SweepResult};
use examsweep_storage::{ReviewUpdate, Storage};

use crate::error::PipelineError;
use crate::patch_applier::PatchApplier;

/// A queue entry joined with its source content. The item is `None` when
/// the variant has since been deleted from the content repository.
#[derive(Debug, Clone)]
pub struct ReviewEntry {
    /// The FIX-stage result awaiting (or past) review
    pub result: SweepResult,
    /// The variant the patches would touch
    pub item: Option<Item>,
}

/// State machine exposing pending fixes to a human reviewer.
///
/// Entry condition is a FIX result with `human_review_required` set and
/// `fix_status = pending_review`. Approve and reject both move the result
/// to a terminal state; terminal results can never re-enter the queue.
pub struct ReviewQueue {
    storage: Arc<dyn Storage>,
    applier: PatchApplier,
}

impl ReviewQueue {
    /// Build a review queue over a storage backend.
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        let applier = PatchApplier::new(Arc::clone(&storage));
        Self { storage, applier }
    }

    /// List queue entries joined with their source variants. Defaults to
    /// undecided entries; `status` widens to decided ones, `risk` narrows
    /// by priority.
    pub async fn list(
        &self,
        status: Option<FixStatus>,
        risk: Option<Risk>,
        limit: usize,
    ) -> Result<Vec<ReviewEntry>, PipelineError> {
        let results = self.storage.list_pending_review(status, risk, limit).await?;

        let variant_ids: Vec<i64> = results.iter().map(|r| r.variant_id).collect();
        let mut items = self.storage.fetch_by_ids(&variant_ids).await?;

        Ok(results
            .into_iter()
            .map(|result| {
                let item = items.remove(&result.variant_id);
                ReviewEntry { result, item }
            })
            .collect())
    }

    /// Approve a pending fix: apply its stored patches and record the
    /// decision. Returns the updated result.
    pub async fn approve(
        &self,
        id: ResultId,
        reviewer: &str,
    ) -> Result<SweepResult, PipelineError> {
        let result = self.load_pending(id).await?;

        let patches = result.patches.as_deref().unwrap_or(&[]);
        let applied = self.applier.apply(result.variant_id, patches).await;

        self.storage
            .record_review(
                id,
                &ReviewUpdate {
                    applied,
                    fix_status: FixStatus::HumanApproved,
                    reviewer: reviewer.to_string(),
                    notes: None,
                },
            )
            .await?;

        self.reload(id).await
    }

    /// Reject a pending fix: record the decision and optional notes.
    /// Content is never touched.
    pub async fn reject(
        &self,
        id: ResultId,
        reviewer: &str,
        notes: Option<String>,
    ) -> Result<SweepResult, PipelineError> {
        self.load_pending(id).await?;

        self.storage
            .record_review(
                id,
                &ReviewUpdate {
                    applied: false,
                    fix_status: FixStatus::HumanRejected,
                    reviewer: reviewer.to_string(),
                    notes,
                },
            )
            .await?;

        self.reload(id).await
    }

    async fn load_pending(&self, id: ResultId) -> Result<SweepResult, PipelineError> {
        let result = self
            .storage
            .load_result(id)
            .await?
            .ok_or_else(|| PipelineError::NotFound(format!("result {id}")))?;

        if !result.needs_review() {
            return Err(PipelineError::InvalidState(format!(
                "result {id} is not pending review (status {})",
                result
                    .fix_status
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| "none".to_string())
            )));
        }

        Ok(result)
    }

    async fn reload(&self, id: ResultId) -> Result<SweepResult, PipelineError> {
        self.storage
            .load_result(id)
            .await?
            .ok_or_else(|| PipelineError::NotFound(format!("result {id}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use examsweep_core::{ItemSelection, Patch, PatchKind, Run, RunParams, Stage};
    use examsweep_storage::SqliteStorage;

    use crate::error::PipelineError;

    async fn seed_pending(storage: &Arc<SqliteStorage>) -> (ResultId, i64) {
        let question_id = storage
            .insert_question("¿Cuál es el diagnóstico?", chrono::Utc::now())
            .await
            .unwrap();
        let variant_id = storage
            .insert_variant(question_id, 1, "Paciente con disnea", "MEDIUM", None)
            .await
            .unwrap();
        for i in 0..4 {
            storage
                .insert_alternative(variant_id, &format!("alternativa {i}"), i == 0, i, None)
                .await
                .unwrap();
        }

        let run = Run::new(RunParams {
            selection: ItemSelection::Range { from: 1, to: 1 },
            apply: false,
            use_judge: true,
            concurrency: 1,
        });
        storage.create_run(&run).await.unwrap();

        let mut result = SweepResult::new(run.id, question_id, variant_id, Stage::Fix);
        result.risk = Risk::Medium;
        result.fix_status = Some(FixStatus::PendingReview);
        result.human_review_required = true;
        result.patches = Some(vec![Patch {
            kind: PatchKind::Stem,
            field: "stem".to_string(),
            original: Some("Paciente con disnea".to_string()),
            proposed: "Paciente de 60 años con disnea súbita. ¿Cuál es el diagnóstico más probable?"
                .to_string(),
            rationale: Some("Formular como pregunta clínica completa.".to_string()),
            confidence: 0.8,
        }]);
        storage.insert_result(&result).await.unwrap();

        (result.id, variant_id)
    }

    #[tokio::test]
    async fn listing_joins_source_items() {
        let storage = Arc::new(SqliteStorage::in_memory().await.unwrap());
        let (_, variant_id) = seed_pending(&storage).await;

        let queue = ReviewQueue::new(storage.clone());
        let entries = queue.list(None, None, 50).await.unwrap();

        assert_eq!(entries.len(), 1);
        let item = entries[0].item.as_ref().unwrap();
        assert_eq!(item.variant_id, variant_id);
        assert_eq!(item.stem, "Paciente con disnea");

        // Priority filter narrows
        let high = queue.list(None, Some(Risk::High), 50).await.unwrap();
        assert!(high.is_empty());
    }

    #[tokio::test]
    async fn approve_applies_stored_patches_and_finalises() {
        let storage = Arc::new(SqliteStorage::in_memory().await.unwrap());
        let (result_id, variant_id) = seed_pending(&storage).await;

        let queue = ReviewQueue::new(storage.clone());
        let updated = queue.approve(result_id, "dra.soto").await.unwrap();

        assert_eq!(updated.fix_status, Some(FixStatus::HumanApproved));
        assert!(updated.applied);
        assert!(!updated.human_review_required);
        assert_eq!(updated.reviewer.as_deref(), Some("dra.soto"));
        assert!(updated.reviewed_at.is_some());

        let item = storage
            .fetch_by_ids(&[variant_id])
            .await
            .unwrap()
            .remove(&variant_id)
            .unwrap();
        assert!(item.stem.starts_with("Paciente de 60 años"));
    }

    #[tokio::test]
    async fn reject_records_notes_and_never_touches_content() {
        let storage = Arc::new(SqliteStorage::in_memory().await.unwrap());
        let (result_id, variant_id) = seed_pending(&storage).await;

        let queue = ReviewQueue::new(storage.clone());
        let updated = queue
            .reject(
                result_id,
                "dr.vera",
                Some("la corrección cambia el sentido clínico".to_string()),
            )
            .await
            .unwrap();

        assert_eq!(updated.fix_status, Some(FixStatus::HumanRejected));
        assert!(!updated.applied);
        assert_eq!(
            updated.review_notes.as_deref(),
            Some("la corrección cambia el sentido clínico")
        );

        let item = storage
            .fetch_by_ids(&[variant_id])
            .await
            .unwrap()
            .remove(&variant_id)
            .unwrap();
        assert_eq!(item.stem, "Paciente con disnea");
    }

    #[tokio::test]
    async fn terminal_states_are_final() {
        let storage = Arc::new(SqliteStorage::in_memory().await.unwrap());
        let (result_id, _) = seed_pending(&storage).await;

        let queue = ReviewQueue::new(storage.clone());
        queue.approve(result_id, "dra.soto").await.unwrap();

        let err = queue.approve(result_id, "dra.soto").await;
        assert!(matches!(err, Err(PipelineError::InvalidState(_))));

        let err = queue.reject(result_id, "dr.vera", None).await;
        assert!(matches!(err, Err(PipelineError::InvalidState(_))));
    }

    #[tokio::test]
    async fn unknown_result_is_not_found() {
        let storage = Arc::new(SqliteStorage::in_memory().await.unwrap());
        let queue = ReviewQueue::new(storage);

        let err = queue.approve(ResultId::new(), "dra.soto").await;
        assert!(matches!(err, Err(PipelineError::NotFound(_))));
    }
}
