use crate::core::cache::JobCache;
use crate::core::job::{Job, StatusClass};
use crate::core::sort::{sort_bucket, ACTIVE_PRIORITY, COMPLETED_PRIORITY, FAILED_PRIORITY};

/// Categorized, ordered view of the job list plus the placeholder flags.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JobView {
    pub active: Vec<Job>,
    pub completed: Vec<Job>,
    pub failed: Vec<Job>,
    /// Jobs whose status is outside the status table.
    pub unknown: Vec<Job>,
    pub has_jobs: bool,
    pub should_show_loading: bool,
    pub should_show_empty: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Active,
    Completed,
    Failed,
    Other,
}

impl Section {
    pub const ORDER: [Section; 4] = [
        Section::Active,
        Section::Completed,
        Section::Failed,
        Section::Other,
    ];

    pub fn title(self) -> &'static str {
        match self {
            Section::Active => "Active",
            Section::Completed => "Completed",
            Section::Failed => "Failed / Canceled",
            Section::Other => "Other",
        }
    }
}

impl JobView {
    pub fn section(&self, section: Section) -> &[Job] {
        match section {
            Section::Active => &self.active,
            Section::Completed => &self.completed,
            Section::Failed => &self.failed,
            Section::Other => &self.unknown,
        }
    }

    /// All jobs in render order.
    pub fn rows(&self) -> Vec<&Job> {
        Section::ORDER
            .iter()
            .flat_map(|section| self.section(*section).iter())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.active.len() + self.completed.len() + self.failed.len() + self.unknown.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn find(&self, id: &str) -> Option<&Job> {
        self.rows().into_iter().find(|job| job.id == id)
    }
}

pub fn categorize(
    jobs_to_use: &[Job],
    cache_empty: bool,
    initial_load: bool,
    is_loading: bool,
) -> JobView {
    let mut view = JobView::default();

    for job in jobs_to_use {
        match job.class() {
            Some(StatusClass::Active) => view.active.push(job.clone()),
            Some(StatusClass::Completed) => view.completed.push(job.clone()),
            Some(StatusClass::Failed) => view.failed.push(job.clone()),
            None => view.unknown.push(job.clone()),
        }
    }

    sort_bucket(&mut view.active, &ACTIVE_PRIORITY);
    sort_bucket(&mut view.completed, &COMPLETED_PRIORITY);
    sort_bucket(&mut view.failed, &FAILED_PRIORITY);
    sort_bucket(&mut view.unknown, &ACTIVE_PRIORITY);

    view.has_jobs = !jobs_to_use.is_empty();
    view.should_show_loading = initial_load && is_loading && cache_empty;
    view.should_show_empty = !view.should_show_loading && !view.has_jobs;

    view
}

/// Cache plus memoized categorization. Cheap to call on every frame.
#[derive(Debug, Default)]
pub struct JobListModel {
    cache: JobCache,
    last_input: Option<(Vec<Job>, bool)>,
    view: JobView,
    recomputed: u64,
}

impl JobListModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, jobs: &[Job], is_loading: bool) -> &JobView {
        let unchanged = matches!(
            &self.last_input,
            Some((last_jobs, last_loading)) if *last_loading == is_loading && last_jobs.as_slice() == jobs
        );
        if unchanged {
            return &self.view;
        }

        self.cache.observe(jobs);
        let jobs_to_use = self.cache.jobs_to_use(jobs, is_loading);
        self.view = categorize(
            jobs_to_use,
            self.cache.is_empty(),
            self.cache.is_initial_load(),
            is_loading,
        );
        self.last_input = Some((jobs.to_vec(), is_loading));
        self.recomputed += 1;

        &self.view
    }

    pub fn view(&self) -> &JobView {
        &self.view
    }

    pub fn cache(&self) -> &JobCache {
        &self.cache
    }

    pub fn recompute_count(&self) -> u64 {
        self.recomputed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job(id: &str, status: &str) -> Job {
        Job::new(id, status)
    }

    fn ids(jobs: &[Job]) -> Vec<&str> {
        jobs.iter().map(|job| job.id.as_str()).collect()
    }

    #[test]
    fn partitions_by_status_class() {
        let jobs = vec![
            job("a", "running"),
            job("b", "completed"),
            job("c", "canceled"),
            job("d", "queued"),
            job("e", "failed"),
            job("f", "paused"),
        ];

        let view = categorize(&jobs, false, false, false);
        assert_eq!(ids(&view.active), vec!["a", "d"]);
        assert_eq!(ids(&view.completed), vec!["b"]);
        assert_eq!(ids(&view.failed), vec!["c", "e"]);
        assert_eq!(ids(&view.unknown), vec!["f"]);
        assert!(view.has_jobs);
        assert_eq!(view.len(), jobs.len());
    }

    #[test]
    fn loading_placeholder_only_on_first_load() {
        let view = categorize(&[], true, true, true);
        assert!(view.should_show_loading);
        assert!(!view.should_show_empty);

        let view = categorize(&[], true, false, true);
        assert!(!view.should_show_loading);
        assert!(view.should_show_empty);
    }

    #[test]
    fn empty_placeholder_when_idle_without_jobs() {
        let view = categorize(&[], true, true, false);
        assert!(!view.should_show_loading);
        assert!(view.should_show_empty);
        assert!(!view.has_jobs);
    }

    #[test]
    fn rows_follow_section_order() {
        let jobs = vec![
            job("x", "mystery"),
            job("f", "failed"),
            job("c", "completed"),
            job("a", "running"),
        ];
        let view = categorize(&jobs, false, false, false);
        let order: Vec<&str> = view.rows().into_iter().map(|job| job.id.as_str()).collect();
        assert_eq!(order, vec!["a", "c", "f", "x"]);
        assert_eq!(view.find("f").map(|job| job.status.as_str()), Some("failed"));
        assert!(view.find("zzz").is_none());
    }

    #[test]
    fn model_serves_cache_while_reloading() {
        let mut model = JobListModel::new();
        let jobs = vec![job("a", "running"), job("b", "completed")];
        model.update(&jobs, false);

        let view = model.update(&[], true);
        assert_eq!(ids(&view.active), vec!["a"]);
        assert_eq!(ids(&view.completed), vec!["b"]);
        assert!(view.has_jobs);
        assert!(!view.should_show_loading);
    }

    #[test]
    fn model_skips_recompute_for_identical_input() {
        let mut model = JobListModel::new();
        let jobs = vec![job("a", "running")];

        let first = model.update(&jobs, false).clone();
        let second = model.update(&jobs.clone(), false).clone();
        assert_eq!(first, second);
        assert_eq!(model.recompute_count(), 1);

        model.update(&jobs, true);
        assert_eq!(model.recompute_count(), 2);
    }

    #[test]
    fn model_shows_loading_before_first_snapshot() {
        let mut model = JobListModel::new();
        let view = model.update(&[], true);
        assert!(view.should_show_loading);

        let view = model.update(&[job("a", "queued")], false);
        assert!(!view.should_show_loading);
        assert!(!view.should_show_empty);
        assert!(!model.cache().is_initial_load());
    }
}
