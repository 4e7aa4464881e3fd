//! Item model - one question variant under evaluation.
//!
//! Items are transient: they are assembled from the content repository at
//! fetch time and never persisted by the sweep itself.

use serde::{Deserialize, Serialize};

/// One question variant joined with its ordered answer alternatives.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    /// Identifier of the authored base question
    pub question_id: i64,

    /// Identifier of this variant
    pub variant_id: i64,

    /// Position of the base question in creation order, 1-based.
    /// Computed at fetch time; not stable under later insertions.
    pub sequence: i64,

    /// Variant number within its base question
    pub variant_number: i64,

    /// Stem of the base question
    pub base_stem: String,

    /// Stem of this variant
    pub stem: String,

    /// Declared difficulty, expected to be EASY, MEDIUM or HARD
    pub difficulty: String,

    /// Global explanation shown after answering
    pub explanation: Option<String>,

    /// Answer alternatives in display order
    pub alternatives: Vec<Alternative>,
}

impl Item {
    /// Number of alternatives flagged as correct.
    ///
    /// Well-formed variants have exactly one; the pipeline verifies this
    /// rather than assuming it.
    pub fn correct_count(&self) -> usize {
        self.alternatives.iter().filter(|a| a.is_correct).count()
    }

    /// The keyed answer, when exactly one alternative is flagged correct.
    pub fn correct_alternative(&self) -> Option<&Alternative> {
        match self.correct_count() {
            1 => self.alternatives.iter().find(|a| a.is_correct),
            _ => None,
        }
    }
}

/// One answer alternative of a variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alternative {
    /// Row identifier in the content repository
    pub id: i64,

    /// Alternative text
    pub text: String,

    /// Whether this alternative is the keyed answer
    pub is_correct: bool,

    /// Display position within the variant
    pub position: i64,

    /// Explanation of why this alternative is right or wrong
    pub explanation: Option<String>,
}
