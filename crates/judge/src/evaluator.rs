//! Judge evaluation of one item.

use std::sync::Arc;

use examsweep_core::{Item, JudgeEvaluation};
use tracing::warn;

use crate::client::JudgeModel;
use crate::extract::parse_payload;
use crate::prompts;

/// Formats the evaluation prompt, calls the judge and parses its verdict.
///
/// Every failure mode (call error, unusable envelope, malformed JSON)
/// collapses to `None`: the caller records "no judge result" for the item
/// and the batch moves on.
pub struct JudgeEvaluator {
    model: Arc<dyn JudgeModel>,
}

impl JudgeEvaluator {
    /// Build an evaluator over a judge model.
    pub fn new(model: Arc<dyn JudgeModel>) -> Self {
        Self { model }
    }

    /// Evaluate one item. `None` means the judge produced no usable
    /// verdict; it is never pipeline-fatal.
    pub async fn evaluate(&self, item: &Item) -> Option<JudgeEvaluation> {
        let user = prompts::eval_prompt(item);

        let body = match self.model.complete(prompts::EVAL_SYSTEM, &user).await {
            Ok(body) => body,
            Err(err) => {
                warn!(variant_id = item.variant_id, error = %err, "judge call failed");
                return None;
            }
        };

        let Some(mut evaluation) = parse_payload::<JudgeEvaluation>(&body) else {
            warn!(
                variant_id = item.variant_id,
                "judge response could not be parsed"
            );
            return None;
        };

        evaluation.confidence = evaluation.confidence.clamp(0.0, 1.0);
        Some(evaluation)
    }
}
