//! Result model - one audit record per item per pipeline stage.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::id::{ResultId, RunId};
use crate::patch::Patch;
use crate::Time;

/// One audit record written by a pipeline stage for one item.
///
/// Results are append-only. The only post-creation mutations are the review
/// fields (`applied`, `fix_status`, `reviewer`, `reviewed_at`,
/// `review_notes`), and those change exclusively through review-queue
/// actions. Records for the same item across stages are correlated by
/// (run id, variant id).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepResult {
    /// Unique identifier
    pub id: ResultId,

    /// Run this record belongs to
    pub run_id: RunId,

    /// Base question of the evaluated variant
    pub question_id: i64,

    /// Evaluated variant
    pub variant_id: i64,

    /// Pipeline stage that produced the record
    pub stage: Stage,

    /// Detected labels
    pub labels: Vec<String>,

    /// Named numeric scores, e.g. "structure" or judge scores
    pub scores: BTreeMap<String, f64>,

    /// Free-text rationale from the judge, when present
    pub critique: Option<String>,

    /// Proposed patches, FIX stage only
    pub patches: Option<Vec<Patch>>,

    /// Severity tier derived from the labels
    pub risk: Risk,

    /// Whether proposed patches were applied to content
    pub applied: bool,

    /// Fix routing state, FIX stage only
    pub fix_status: Option<FixStatus>,

    /// Whether the record sits in the human review queue
    pub human_review_required: bool,

    /// Overall confidence of the proposed fix, FIX stage only
    pub fix_confidence: Option<f64>,

    /// Who reviewed the record
    pub reviewer: Option<String>,

    /// When it was reviewed
    pub reviewed_at: Option<Time>,

    /// Optional reviewer notes, set on rejection
    pub review_notes: Option<String>,

    /// When the record was written
    pub created_at: Time,
}

impl SweepResult {
    /// Create an empty record for a stage; callers fill in the verdict
    /// fields before persisting.
    pub fn new(run_id: RunId, question_id: i64, variant_id: i64, stage: Stage) -> Self {
        Self {
            id: ResultId::new(),
            run_id,
            question_id,
            variant_id,
            stage,
            labels: Vec::new(),
            scores: BTreeMap::new(),
            critique: None,
            patches: None,
            risk: Risk::Low,
            applied: false,
            fix_status: None,
            human_review_required: false,
            fix_confidence: None,
            reviewer: None,
            reviewed_at: None,
            review_notes: None,
            created_at: chrono::Utc::now(),
        }
    }

    /// Whether the record is waiting for a human decision.
    pub fn needs_review(&self) -> bool {
        self.human_review_required && self.fix_status == Some(FixStatus::PendingReview)
    }
}

/// Pipeline stage that produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Stage {
    /// Deterministic structural checks
    #[serde(rename = "PRECHECK")]
    Precheck,
    /// External judge-model evaluation
    #[serde(rename = "JUDGE_EVAL")]
    JudgeEval,
    /// Fix generation and gating
    #[serde(rename = "FIX")]
    Fix,
}

impl Stage {
    /// Storage/wire representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Precheck => "PRECHECK",
            Self::JudgeEval => "JUDGE_EVAL",
            Self::Fix => "FIX",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Stage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PRECHECK" => Ok(Self::Precheck),
            "JUDGE_EVAL" => Ok(Self::JudgeEval),
            "FIX" => Ok(Self::Fix),
            other => Err(format!("unknown stage: {other}")),
        }
    }
}

/// Severity tier of a detected label set.
///
/// Ordered LOW < MEDIUM < HIGH so tiers from different sources can be
/// combined with `max`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Risk {
    /// Cosmetic findings only
    #[serde(rename = "LOW")]
    Low,
    /// Needs attention, not content-breaking
    #[serde(rename = "MEDIUM")]
    Medium,
    /// Content is wrong or unanswerable
    #[serde(rename = "HIGH")]
    High,
}

impl Risk {
    /// Storage/wire representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "LOW",
            Self::Medium => "MEDIUM",
            Self::High => "HIGH",
        }
    }
}

impl std::fmt::Display for Risk {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Risk {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "LOW" => Ok(Self::Low),
            "MEDIUM" => Ok(Self::Medium),
            "HIGH" => Ok(Self::High),
            other => Err(format!("unknown risk tier: {other}")),
        }
    }
}

/// Routing state of a FIX-stage result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FixStatus {
    /// Patches were applied without human involvement
    #[serde(rename = "auto_fixed")]
    AutoFixed,
    /// Waiting in the human review queue
    #[serde(rename = "pending_review")]
    PendingReview,
    /// Human approved; patches applied
    #[serde(rename = "human_approved")]
    HumanApproved,
    /// Human rejected; content untouched
    #[serde(rename = "human_rejected")]
    HumanRejected,
}

impl FixStatus {
    /// Storage/wire representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AutoFixed => "auto_fixed",
            Self::PendingReview => "pending_review",
            Self::HumanApproved => "human_approved",
            Self::HumanRejected => "human_rejected",
        }
    }

    /// Every state except `pending_review` is final.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::PendingReview)
    }
}

impl std::fmt::Display for FixStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for FixStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "auto_fixed" => Ok(Self::AutoFixed),
            "pending_review" => Ok(Self::PendingReview),
            "human_approved" => Ok(Self::HumanApproved),
            "human_rejected" => Ok(Self::HumanRejected),
            other => Err(format!("unknown fix status: {other}")),
        }
    }
}
