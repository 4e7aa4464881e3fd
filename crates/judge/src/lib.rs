//! Judge-model integration: semantic evaluation and fix generation.
//!
//! The judge model is any text-completion endpoint reachable over an
//! OpenAI-compatible wire format. This crate owns the client, the prompt
//! construction, the tolerant response parsing and the two consumers
//! built on top of them: [`JudgeEvaluator`] and [`FixGenerator`]. Both
//! degrade on failure instead of aborting: a broken judge response means
//! "no verdict" or "needs a human", never a dead batch.

#![warn(missing_docs)]

pub mod client;
pub mod error;
pub mod evaluator;
pub mod extract;
pub mod fix;
pub mod prompts;

pub use client::{HttpJudgeClient, JudgeConfig, JudgeModel};
pub use error::JudgeError;
pub use evaluator::JudgeEvaluator;
pub use extract::{extract_payload, strip_code_fences, ResponseExtractor};
pub use fix::FixGenerator;
