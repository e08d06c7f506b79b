use crate::core::job::Job;

/// Last non-empty job snapshot, used while a refetch is in progress.
#[derive(Debug, Clone)]
pub struct JobCache {
    cached_jobs: Vec<Job>,
    initial_load: bool,
}

impl Default for JobCache {
    fn default() -> Self {
        Self::new()
    }
}

impl JobCache {
    pub fn new() -> Self {
        Self {
            cached_jobs: Vec::new(),
            initial_load: true,
        }
    }

    /// Records an incoming snapshot. Empty snapshots leave the cache untouched.
    pub fn observe(&mut self, jobs: &[Job]) {
        if jobs.is_empty() {
            return;
        }
        self.cached_jobs = jobs.to_vec();
        self.initial_load = false;
    }

    pub fn jobs_to_use<'a>(&'a self, live: &'a [Job], is_loading: bool) -> &'a [Job] {
        if is_loading && !self.cached_jobs.is_empty() {
            &self.cached_jobs
        } else {
            live
        }
    }

    pub fn is_empty(&self) -> bool {
        self.cached_jobs.is_empty()
    }

    pub fn is_initial_load(&self) -> bool {
        self.initial_load
    }
}
