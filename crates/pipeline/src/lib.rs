//! Sweep pipeline: bounded execution, run orchestration, fix phase and
//! the human review queue.
//!
//! The pipeline owns everything between the HTTP surface and the leaf
//! crates: it drives the precheck/judge stages over a bounded worker
//! pool, persists one audit Result per item per stage, and routes
//! generated fixes through the gate into automatic application or human
//! review.

#![warn(missing_docs)]

pub mod error;
pub mod executor;
pub mod fix_phase;
pub mod patch_applier;
pub mod review;
pub mod sweep;

pub use error::PipelineError;
pub use executor::{
    clamp_concurrency, run_all, BatchOutcome, CancelSignal, DEFAULT_CONCURRENCY, MAX_CONCURRENCY,
    MIN_CONCURRENCY,
};
pub use fix_phase::{FixOutcome, FixRunner};
pub use patch_applier::PatchApplier;
pub use review::{ReviewEntry, ReviewQueue};
pub use sweep::SweepRunner;
