//! Fix phase: turn a run's judge verdicts into applied or queued fixes.

use std::sync::Arc;

use examsweep_core::{FixStatus, RunId, Stage, SweepResult};
use examsweep_judge::{FixGenerator, JudgeModel};
use examsweep_quality::{AutoFixGate, GateDecision, GateInput};
use examsweep_storage::Storage;
use tracing::{info, warn};

use crate::error::PipelineError;
use crate::patch_applier::PatchApplier;

/// Counts reported by one fix phase.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FixOutcome {
    /// Items whose patches were applied automatically
    pub auto_fixed: u64,
    /// Items parked in the human review queue
    pub pending_review: u64,
    /// Items that errored (missing source content, persistence failure)
    pub errors: u64,
}

/// Consumes a run's JUDGE_EVAL results: generates a fix proposal per
/// item, gates it, then either applies the patches or queues the item for
/// human review. Writes one FIX-stage Result per consumed verdict.
pub struct FixRunner {
    storage: Arc<dyn Storage>,
    generator: FixGenerator,
    applier: PatchApplier,
}

impl FixRunner {
    /// Build a fix runner over storage and a judge model.
    pub fn new(storage: Arc<dyn Storage>, judge: Arc<dyn JudgeModel>) -> Self {
        let generator = FixGenerator::new(judge);
        let applier = PatchApplier::new(Arc::clone(&storage));
        Self {
            storage,
            generator,
            applier,
        }
    }

    /// Run the fix phase for one sweep run.
    ///
    /// Fails with `NotFound` when the run is unknown or has no JUDGE_EVAL
    /// results to consume; per-item problems are counted, not escalated.
    pub async fn run(&self, run_id: RunId, auto_apply: bool) -> Result<FixOutcome, PipelineError> {
        self.storage
            .load_run(run_id)
            .await?
            .ok_or_else(|| PipelineError::NotFound(format!("run {run_id}")))?;

        let verdicts = self
            .storage
            .list_results(run_id, Some(Stage::JudgeEval), usize::MAX)
            .await?;
        if verdicts.is_empty() {
            return Err(PipelineError::NotFound(format!(
                "run {run_id} has no judge results to fix"
            )));
        }

        let variant_ids: Vec<i64> = verdicts.iter().map(|r| r.variant_id).collect();
        let items = self.storage.fetch_by_ids(&variant_ids).await?;

        let mut outcome = FixOutcome::default();

        for verdict in &verdicts {
            let Some(item) = items.get(&verdict.variant_id) else {
                warn!(
                    variant_id = verdict.variant_id,
                    "variant vanished between evaluation and fix"
                );
                outcome.errors += 1;
                continue;
            };

            let proposal = self
                .generator
                .generate(item, &verdict.labels, verdict.critique.as_deref())
                .await;

            let decision = AutoFixGate::decide(&GateInput {
                auto_apply_requested: auto_apply,
                labels: &verdict.labels,
                risk: verdict.risk,
                overall_confidence: proposal.overall_confidence,
                requires_expert_review: proposal.requires_expert_review,
            });

            let mut fix =
                SweepResult::new(run_id, verdict.question_id, verdict.variant_id, Stage::Fix);
            fix.labels = verdict.labels.clone();
            fix.risk = verdict.risk;
            fix.critique = proposal
                .review_notes
                .clone()
                .or_else(|| verdict.critique.clone());
            fix.fix_confidence = Some(proposal.overall_confidence);

            match decision {
                GateDecision::AutoApply => {
                    let applied = self.applier.apply(verdict.variant_id, &proposal.patches).await;
                    fix.patches = Some(proposal.patches);
                    fix.applied = applied;
                    fix.fix_status = Some(FixStatus::AutoFixed);
                    outcome.auto_fixed += 1;
                }
                GateDecision::QueueForReview => {
                    fix.patches = Some(proposal.patches);
                    fix.fix_status = Some(FixStatus::PendingReview);
                    fix.human_review_required = true;
                    outcome.pending_review += 1;
                }
            }

            if let Err(err) = self.storage.insert_result(&fix).await {
                warn!(variant_id = verdict.variant_id, error = %err, "could not persist fix result");
                outcome.errors += 1;
            }
        }

        self.storage
            .update_run_fixed_count(run_id, outcome.auto_fixed)
            .await?;

        info!(
            run_id = %run_id,
            auto_fixed = outcome.auto_fixed,
            pending_review = outcome.pending_review,
            errors = outcome.errors,
            "fix phase finished"
        );

        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use examsweep_core::{Risk, Run, RunParams, ItemSelection};
    use examsweep_judge::JudgeError;
    use examsweep_storage::SqliteStorage;

    struct Scripted(String);

    #[async_trait::async_trait]
    impl JudgeModel for Scripted {
        async fn complete(&self, _system: &str, _user: &str) -> Result<String, JudgeError> {
            Ok(self.0.clone())
        }
    }

    fn proposal_body(confidence: f64) -> String {
        let content = format!(
            "{{\"patches\":[{{\"kind\":\"stem\",\"field\":\"stem\",\"proposed\":\"¿Cuál es la conducta inicial más adecuada en este paciente?\",\"confidence\":{confidence}}}],\"overall_confidence\":{confidence},\"requires_expert_review\":false}}"
        );
        serde_json::json!({"choices":[{"message":{"content": content}}]}).to_string()
    }

    async fn seed_run_with_verdict(
        storage: &Arc<SqliteStorage>,
        labels: &[&str],
        risk: Risk,
    ) -> (RunId, i64) {
        let question_id = storage
            .insert_question("¿Cuál es la conducta inicial?", chrono::Utc::now())
            .await
            .unwrap();
        let variant_id = storage
            .insert_variant(question_id, 1, "Paciente con dolor torácico", "MEDIUM", None)
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
            apply: true,
            use_judge: true,
            concurrency: 1,
        });
        storage.create_run(&run).await.unwrap();
        storage.mark_run_running(run.id).await.unwrap();
        storage
            .complete_run(run.id, &Default::default())
            .await
            .unwrap();

        let mut verdict = SweepResult::new(run.id, question_id, variant_id, Stage::JudgeEval);
        verdict.labels = labels.iter().map(|s| s.to_string()).collect();
        verdict.risk = risk;
        verdict.critique = Some("El enunciado no está formulado como pregunta.".to_string());
        storage.insert_result(&verdict).await.unwrap();

        (run.id, variant_id)
    }

    #[tokio::test]
    async fn low_risk_cosmetic_fix_is_auto_applied() {
        let storage = Arc::new(SqliteStorage::in_memory().await.unwrap());
        let (run_id, variant_id) =
            seed_run_with_verdict(&storage, &["sin_interrogacion"], Risk::Low).await;

        let judge: Arc<dyn JudgeModel> = Arc::new(Scripted(proposal_body(0.95)));
        let runner = FixRunner::new(storage.clone(), judge);
        let outcome = runner.run(run_id, true).await.unwrap();

        assert_eq!(outcome.auto_fixed, 1);
        assert_eq!(outcome.pending_review, 0);
        assert_eq!(outcome.errors, 0);

        // Patch landed in content
        let item = storage
            .fetch_by_ids(&[variant_id])
            .await
            .unwrap()
            .remove(&variant_id)
            .unwrap();
        assert_eq!(
            item.stem,
            "¿Cuál es la conducta inicial más adecuada en este paciente?"
        );

        let fixes = storage
            .list_results(run_id, Some(Stage::Fix), 100)
            .await
            .unwrap();
        assert_eq!(fixes.len(), 1);
        assert_eq!(fixes[0].fix_status, Some(FixStatus::AutoFixed));
        assert!(fixes[0].applied);
        assert!(!fixes[0].human_review_required);

        // Run summary picked up the fixed count
        let run = storage.load_run(run_id).await.unwrap().unwrap();
        assert_eq!(run.summary.unwrap().fixed, 1);
    }

    #[tokio::test]
    async fn high_risk_fix_is_queued_despite_confidence() {
        let storage = Arc::new(SqliteStorage::in_memory().await.unwrap());
        let (run_id, variant_id) =
            seed_run_with_verdict(&storage, &["clave_incorrecta"], Risk::High).await;

        let judge: Arc<dyn JudgeModel> = Arc::new(Scripted(proposal_body(0.99)));
        let runner = FixRunner::new(storage.clone(), judge);
        let outcome = runner.run(run_id, true).await.unwrap();

        assert_eq!(outcome.auto_fixed, 0);
        assert_eq!(outcome.pending_review, 1);

        // Content untouched
        let item = storage
            .fetch_by_ids(&[variant_id])
            .await
            .unwrap()
            .remove(&variant_id)
            .unwrap();
        assert_eq!(item.stem, "Paciente con dolor torácico");

        let fixes = storage
            .list_results(run_id, Some(Stage::Fix), 100)
            .await
            .unwrap();
        assert_eq!(fixes[0].fix_status, Some(FixStatus::PendingReview));
        assert!(fixes[0].human_review_required);
        assert!(!fixes[0].applied);
    }

    #[tokio::test]
    async fn broken_fix_generation_queues_with_note() {
        let storage = Arc::new(SqliteStorage::in_memory().await.unwrap());
        let (run_id, _) = seed_run_with_verdict(&storage, &["sin_interrogacion"], Risk::Low).await;

        let judge: Arc<dyn JudgeModel> = Arc::new(Scripted("no soy JSON".to_string()));
        let runner = FixRunner::new(storage.clone(), judge);
        let outcome = runner.run(run_id, true).await.unwrap();

        assert_eq!(outcome.auto_fixed, 0);
        assert_eq!(outcome.pending_review, 1);

        let fixes = storage
            .list_results(run_id, Some(Stage::Fix), 100)
            .await
            .unwrap();
        assert_eq!(fixes[0].fix_status, Some(FixStatus::PendingReview));
        assert!(fixes[0]
            .critique
            .as_deref()
            .unwrap()
            .contains("no pudo interpretarse"));
        assert_eq!(fixes[0].patches.as_deref(), Some(&[][..]));
    }

    #[tokio::test]
    async fn unknown_run_and_runs_without_verdicts_are_not_found() {
        let storage = Arc::new(SqliteStorage::in_memory().await.unwrap());
        let judge: Arc<dyn JudgeModel> = Arc::new(Scripted(proposal_body(0.9)));
        let runner = FixRunner::new(storage.clone(), judge);

        let err = runner.run(RunId::new(), true).await;
        assert!(matches!(err, Err(PipelineError::NotFound(_))));

        let run = Run::new(RunParams {
            selection: ItemSelection::Range { from: 1, to: 1 },
            apply: false,
            use_judge: false,
            concurrency: 1,
        });
        storage.create_run(&run).await.unwrap();
        let err = runner.run(run.id, true).await;
        assert!(matches!(err, Err(PipelineError::NotFound(_))));
    }
}
