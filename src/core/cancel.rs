use std::collections::HashSet;

use crate::core::engine::JobView;

/// Optimistic "cancelling" markers keyed by job id.
#[derive(Debug, Default)]
pub struct CancellingJobs {
    ids: HashSet<String>,
}

impl CancellingJobs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false when a cancel for `id` is already pending.
    pub fn begin(&mut self, id: &str) -> bool {
        self.ids.insert(id.to_string())
    }

    pub fn finish(&mut self, id: &str) {
        self.ids.remove(id);
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Drops markers for jobs that have left the active section.
    pub fn reconcile(&mut self, view: &JobView) {
        self.ids
            .retain(|id| view.active.iter().any(|job| &job.id == id));
    }
}
