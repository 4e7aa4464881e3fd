//! Examsweep core data models.
//!
//! This crate defines the fundamental data structures of the exam-content
//! quality-assurance sweep.

#![warn(missing_docs)]

// Core identities
mod id;

// Content under evaluation
mod item;

// Sweep lifecycle
mod run;
mod result;

// Verdicts and corrections
mod verdict;
mod patch;

/// Label vocabulary and the classification sets built on it
pub mod label;

// Re-exports
pub use id::*;

// Content
pub use item::{Alternative, Item};

// Run & Result
pub use run::{ItemSelection, Run, RunParams, RunStatus, RunSummary};
pub use result::{FixStatus, Risk, Stage, SweepResult};

// Verdicts & Patches
pub use patch::{FixProposal, Patch, PatchKind};
pub use verdict::{JudgeEvaluation, PrecheckVerdict};

/// Timestamp type
pub type Time = chrono::DateTime<chrono::Utc>;
