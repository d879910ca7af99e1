// * Outcome of a full import run

use crate::engine::workflow::WorkflowKind;
use crate::errors::ImportError;
use std::fmt;

/// One record whose workflow failed
#[derive(Debug)]
pub struct RecordFailure {
    pub customer_id: String,
    pub error: ImportError,
}

#[derive(Debug, Default)]
pub struct ImportSummary {
    /// Records submitted for import
    pub total: usize,
    pub provisioned: usize,
    pub imported: usize,
    pub chunks: usize,
    pub failures: Vec<RecordFailure>,
}

impl ImportSummary {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            ..Self::default()
        }
    }

    /// Counts one successful record
    pub fn record_success(&mut self, kind: WorkflowKind) {
        match kind {
            WorkflowKind::Provision => self.provisioned += 1,
            WorkflowKind::Import => self.imported += 1,
        }
    }

    pub fn succeeded(&self) -> usize {
        self.provisioned + self.imported
    }

    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }
}

impl fmt::Display for ImportSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.has_failures() {
            write!(
                f,
                "Imported {} of {} customers ({} failed)",
                self.succeeded(),
                self.total,
                self.failures.len()
            )
        } else {
            write!(f, "Imported all {} customers", self.total)
        }
    }
}
