//! Verdict types produced by the evaluation stages.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Outcome of the deterministic precheck for one item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrecheckVerdict {
    /// False iff any detected label is in the blocking set
    pub ok: bool,

    /// Labels of every violated rule, in rule order
    pub labels: Vec<String>,

    /// Heuristic scores, currently `structure`
    pub scores: BTreeMap<String, f64>,

    /// One human-readable line per violation
    pub notes: Vec<String>,
}

/// Structured judge-model output for one item.
///
/// Deserialized leniently: every field defaults when the model omits it,
/// so a sparse-but-valid JSON object still yields an evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JudgeEvaluation {
    /// Labels the judge assigned; may include labels outside the
    /// precheck vocabulary, or the neutral `ok`
    #[serde(default)]
    pub labels: Vec<String>,

    /// Named scores in [0, 1]
    #[serde(default)]
    pub scores: BTreeMap<String, f64>,

    /// Free-text rationale for the verdict
    #[serde(default)]
    pub critique: String,

    /// Judge's confidence in its own verdict, in [0, 1]
    #[serde(default)]
    pub confidence: f64,
}
