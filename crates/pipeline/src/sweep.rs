//! Sweep orchestration: run lifecycle over the evaluation pipeline.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use examsweep_core::{Item, ItemSelection, Run, RunParams, RunSummary, Stage, SweepResult};
use examsweep_judge::{JudgeEvaluator, JudgeModel};
use examsweep_quality::{classify_confidence, classify_labels, PrecheckEngine};
use examsweep_storage::Storage;
use tracing::{info, warn};

use crate::error::PipelineError;
use crate::executor::{clamp_concurrency, run_all, CancelSignal};

/// Drives one sweep run end to end: create the run record, fetch the
/// batch, evaluate every item through the bounded executor, finish the
/// run with an aggregated summary.
///
/// The run reaches FAILED only when orchestration itself errors; item
/// failures are caught by the executor and counted. Cancellation yields a
/// partial DONE run with the skipped tail counted, never a FAILED one.
pub struct SweepRunner {
    storage: Arc<dyn Storage>,
    judge: Option<Arc<dyn JudgeModel>>,
    cancel: CancelSignal,
}

impl SweepRunner {
    /// Build a runner. `judge = None` disables the judge stage even for
    /// runs requesting it.
    pub fn new(
        storage: Arc<dyn Storage>,
        judge: Option<Arc<dyn JudgeModel>>,
        cancel: CancelSignal,
    ) -> Self {
        Self {
            storage,
            judge,
            cancel,
        }
    }

    /// Execute a sweep with the given parameters. Returns the finished
    /// run record; an empty batch yields a DONE run with a zero summary.
    pub async fn run(&self, params: RunParams) -> Result<Run, PipelineError> {
        let run = Run::new(params);
        self.storage.create_run(&run).await?;
        info!(run_id = %run.id, "sweep run created");

        match self.execute(&run).await {
            Ok(summary) => {
                self.storage.complete_run(run.id, &summary).await?;
                info!(
                    run_id = %run.id,
                    total = summary.total,
                    accepted = summary.accepted,
                    rejected = summary.rejected,
                    errors = summary.errors,
                    skipped = summary.skipped,
                    "sweep run done"
                );

                self.storage
                    .load_run(run.id)
                    .await?
                    .ok_or_else(|| PipelineError::NotFound(format!("run {}", run.id)))
            }
            Err(err) => {
                warn!(run_id = %run.id, error = %err, "sweep run failed");
                if let Err(fail_err) = self.storage.fail_run(run.id, &err.to_string()).await {
                    warn!(run_id = %run.id, error = %fail_err, "could not mark run failed");
                }
                Err(err)
            }
        }
    }

    async fn execute(&self, run: &Run) -> Result<RunSummary, PipelineError> {
        let items = self.fetch_batch(&run.params.selection).await?;
        self.storage.mark_run_running(run.id).await?;

        if items.is_empty() {
            return Ok(RunSummary::default());
        }

        let total = items.len() as u64;
        let accepted = Arc::new(AtomicU64::new(0));
        let rejected = Arc::new(AtomicU64::new(0));

        let engine = Arc::new(PrecheckEngine::new());
        let evaluator = self
            .judge
            .as_ref()
            .filter(|_| run.params.use_judge)
            .map(|model| Arc::new(JudgeEvaluator::new(Arc::clone(model))));

        let storage = Arc::clone(&self.storage);
        let run_id = run.id;
        let accepted_counter = Arc::clone(&accepted);
        let rejected_counter = Arc::clone(&rejected);

        let outcome = run_all(
            items,
            clamp_concurrency(run.params.concurrency),
            self.cancel.clone(),
            move |item| {
                let storage = Arc::clone(&storage);
                let engine = Arc::clone(&engine);
                let evaluator = evaluator.clone();
                let accepted = Arc::clone(&accepted_counter);
                let rejected = Arc::clone(&rejected_counter);

                async move {
                    let ok = evaluate_item(&*storage, &engine, evaluator.as_deref(), run_id, &item)
                        .await?;
                    if ok {
                        accepted.fetch_add(1, Ordering::Relaxed);
                    } else {
                        rejected.fetch_add(1, Ordering::Relaxed);
                    }
                    Ok(())
                }
            },
        )
        .await;

        Ok(RunSummary {
            total,
            accepted: accepted.load(Ordering::Relaxed),
            rejected: rejected.load(Ordering::Relaxed),
            fixed: 0,
            errors: outcome.failed,
            skipped: outcome.skipped,
        })
    }

    async fn fetch_batch(&self, selection: &ItemSelection) -> Result<Vec<Item>, PipelineError> {
        match selection {
            ItemSelection::Range { from, to } => Ok(self.storage.fetch_range(*from, *to).await?),
            ItemSelection::Ids(ids) => {
                let mut items: Vec<Item> = self
                    .storage
                    .fetch_by_ids(ids)
                    .await?
                    .into_values()
                    .collect();
                items.sort_by_key(|i| (i.sequence, i.variant_number));
                Ok(items)
            }
        }
    }
}

/// Evaluate one item: precheck always, judge when enabled, one persisted
/// Result per stage. Returns whether the item passed everything it was
/// subjected to.
async fn evaluate_item(
    storage: &dyn Storage,
    engine: &PrecheckEngine,
    evaluator: Option<&JudgeEvaluator>,
    run_id: examsweep_core::RunId,
    item: &Item,
) -> Result<bool, PipelineError> {
    let verdict = engine.evaluate(item);

    let mut precheck = SweepResult::new(run_id, item.question_id, item.variant_id, Stage::Precheck);
    precheck.labels = verdict.labels.clone();
    precheck.scores = verdict.scores.clone();
    precheck.risk = classify_labels(&verdict.labels);
    if !verdict.notes.is_empty() {
        precheck.critique = Some(verdict.notes.join("\n"));
    }
    storage.insert_result(&precheck).await?;

    let mut ok = verdict.ok;

    if let Some(evaluator) = evaluator {
        // A missing judge verdict degrades to "no judge result"
        if let Some(evaluation) = evaluator.evaluate(item).await {
            let risk =
                classify_labels(&evaluation.labels).max(classify_confidence(evaluation.confidence));

            let mut judged =
                SweepResult::new(run_id, item.question_id, item.variant_id, Stage::JudgeEval);
            judged.labels = evaluation.labels.clone();
            judged.scores = evaluation.scores.clone();
            judged
                .scores
                .insert("confidence".to_string(), evaluation.confidence);
            if !evaluation.critique.is_empty() {
                judged.critique = Some(evaluation.critique.clone());
            }
            judged.risk = risk;
            storage.insert_result(&judged).await?;

            let judge_clean = evaluation
                .labels
                .iter()
                .all(|l| l == examsweep_core::label::OK);
            ok = ok && judge_clean;
        }
    }

    Ok(ok)
}
