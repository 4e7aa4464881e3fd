//! Shared handler state.

use std::sync::Arc;

use examsweep_judge::JudgeModel;
use examsweep_pipeline::CancelSignal;
use examsweep_storage::Storage;

/// State shared by every route handler.
#[derive(Clone)]
pub struct AppState {
    /// Content and sweep-record storage
    pub storage: Arc<dyn Storage>,

    /// Judge model, when configured; `None` disables the judge stage and
    /// the fix phase
    pub judge: Option<Arc<dyn JudgeModel>>,

    /// Cancellation signal wired to server shutdown
    pub cancel: CancelSignal,
}
