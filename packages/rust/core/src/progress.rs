//! Progress reporting hooks for long-running analyses.

use crate::model::DocumentModel;

/// Progress callback for reporting analysis status.
///
/// Document callbacks may arrive from worker threads and out of order.
pub trait ProgressReporter: Send + Sync {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called when a document has been segmented.
    fn document_done(&self, path: &str, current: usize, total: usize);
    /// Called when the analysis completes.
    fn done(&self, model: &DocumentModel);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn document_done(&self, _path: &str, _current: usize, _total: usize) {}
    fn done(&self, _model: &DocumentModel) {}
}
