//! Application of approved patches to persisted variant content.

use std::sync::Arc;

use examsweep_core::{Patch, PatchKind};
use examsweep_storage::Storage;
use tracing::warn;

/// Applies a patch sequence to one variant, kind-dispatched onto the
/// storage field updates.
///
/// Each patch is attempted independently: a failure is logged and does
/// not stop the rest. The sequence is not atomic; patches carry absolute
/// proposed values, so re-driving a partially applied sequence converges.
pub struct PatchApplier {
    storage: Arc<dyn Storage>,
}

impl PatchApplier {
    /// Build an applier over a storage backend.
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    /// Apply every patch to the variant. Returns true only if the whole
    /// sequence applied cleanly.
    pub async fn apply(&self, variant_id: i64, patches: &[Patch]) -> bool {
        let mut all_ok = true;

        for patch in patches {
            if let Err(message) = self.apply_one(variant_id, patch).await {
                warn!(
                    variant_id,
                    field = %patch.field,
                    kind = %patch.kind,
                    error = %message,
                    "patch application failed"
                );
                all_ok = false;
            }
        }

        all_ok
    }

    async fn apply_one(&self, variant_id: i64, patch: &Patch) -> Result<(), String> {
        match patch.kind {
            PatchKind::Stem => self
                .storage
                .update_variant_stem(variant_id, &patch.proposed)
                .await
                .map_err(|e| e.to_string()),

            PatchKind::Difficulty => self
                .storage
                .update_variant_difficulty(variant_id, &patch.proposed)
                .await
                .map_err(|e| e.to_string()),

            // A field path addressing an alternative routes the
            // explanation to that alternative; otherwise it is global
            PatchKind::Explanation => match patch.alternative_index() {
                Some(index) => self
                    .storage
                    .update_alternative_explanation(variant_id, index, &patch.proposed)
                    .await
                    .map_err(|e| e.to_string()),
                None => self
                    .storage
                    .update_variant_explanation(variant_id, &patch.proposed)
                    .await
                    .map_err(|e| e.to_string()),
            },

            PatchKind::Alternative => match patch.alternative_index() {
                Some(index) => self
                    .storage
                    .update_alternative_text(variant_id, index, &patch.proposed)
                    .await
                    .map_err(|e| e.to_string()),
                None => Err(format!(
                    "alternative patch without an index: {}",
                    patch.field
                )),
            },
        }
    }
}
