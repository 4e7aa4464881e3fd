//! Fix generation for flagged items.

use std::sync::Arc;

use examsweep_core::{FixProposal, Item, Patch, PatchKind};
use serde::Deserialize;
use tracing::warn;

use crate::client::JudgeModel;
use crate::extract::parse_payload;
use crate::prompts;

/// Lenient wire shape of a fix response. Every field defaults so a
/// sparse-but-valid object still parses; validation happens in the
/// conversion to the domain types.
#[derive(Debug, Deserialize)]
struct FixResponse {
    #[serde(default)]
    patches: Vec<PatchJson>,
    #[serde(default)]
    overall_confidence: f64,
    #[serde(default)]
    requires_expert_review: bool,
    #[serde(default)]
    review_notes: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PatchJson {
    #[serde(default)]
    kind: String,
    #[serde(default)]
    field: String,
    #[serde(default)]
    original: Option<String>,
    #[serde(default)]
    proposed: String,
    #[serde(default)]
    rationale: Option<String>,
    #[serde(default)]
    confidence: f64,
}

/// Formats the correction prompt, calls the judge and converts its patch
/// list into a [`FixProposal`].
///
/// A failed call or unusable response degrades to an empty proposal with
/// `requires_expert_review = true` and a diagnostic note, so the item ends
/// up in front of a human, never dropped.
pub struct FixGenerator {
    model: Arc<dyn JudgeModel>,
}

impl FixGenerator {
    /// Build a generator over a judge model.
    pub fn new(model: Arc<dyn JudgeModel>) -> Self {
        Self { model }
    }

    /// Propose patches for one flagged item.
    pub async fn generate(
        &self,
        item: &Item,
        labels: &[String],
        critique: Option<&str>,
    ) -> FixProposal {
        let user = prompts::fix_prompt(item, labels, critique);

        let body = match self.model.complete(prompts::FIX_SYSTEM, &user).await {
            Ok(body) => body,
            Err(err) => {
                warn!(variant_id = item.variant_id, error = %err, "fix generation call failed");
                return FixProposal::expert_review(format!(
                    "la generación de corrección falló: {err}"
                ));
            }
        };

        let Some(response) = parse_payload::<FixResponse>(&body) else {
            warn!(
                variant_id = item.variant_id,
                "fix response could not be parsed"
            );
            return FixProposal::expert_review(
                "la respuesta del modelo corrector no pudo interpretarse",
            );
        };

        Self::convert(response)
    }

    fn convert(response: FixResponse) -> FixProposal {
        let mut patches = Vec::with_capacity(response.patches.len());
        for patch in response.patches {
            let Some(kind) = parse_kind(&patch.kind) else {
                warn!(kind = %patch.kind, "skipping patch with unknown kind");
                continue;
            };

            patches.push(Patch {
                kind,
                field: patch.field,
                original: patch.original,
                proposed: patch.proposed,
                rationale: patch.rationale,
                confidence: patch.confidence.clamp(0.0, 1.0),
            });
        }

        FixProposal {
            patches,
            overall_confidence: response.overall_confidence.clamp(0.0, 1.0),
            requires_expert_review: response.requires_expert_review,
            review_notes: response.review_notes,
        }
    }
}

fn parse_kind(kind: &str) -> Option<PatchKind> {
    match kind {
        "stem" => Some(PatchKind::Stem),
        "alternative" => Some(PatchKind::Alternative),
        "explanation" => Some(PatchKind::Explanation),
        "difficulty" => Some(PatchKind::Difficulty),
        _ => None,
    }
}
