//! Deterministic quality checks and gating policy for the exam sweep.
//!
//! Everything in this crate is pure: the precheck rules, the risk
//! classification and the auto-fix gate take data in and return verdicts,
//! with no I/O. Persistence and external calls live in the storage and
//! judge crates.

#![warn(missing_docs)]

pub mod gate;
pub mod precheck;
pub mod risk;

pub use gate::{is_auto_fixable, AutoFixGate, GateDecision, GateInput};
pub use precheck::PrecheckEngine;
pub use risk::{classify_confidence, classify_labels};
