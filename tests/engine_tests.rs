use jobdeck::core::engine::{categorize, JobListModel};
use jobdeck::core::job::{status_class, Job, StatusClass};

fn job(id: &str, status: &str) -> Job {
    Job::new(id, status)
}

fn ids(jobs: &[Job]) -> Vec<&str> {
    jobs.iter().map(|job| job.id.as_str()).collect()
}

fn mixed_jobs() -> Vec<Job> {
    let statuses = [
        "created", "queued", "preparing", "running", "idle", "acknowledgedByWorker",
        "completed", "failed", "canceled", "completedByTag", "generatingStream",
    ];
    statuses
        .iter()
        .enumerate()
        .map(|(idx, status)| {
            let mut job = job(&format!("job-{idx}"), status);
            job.created_at = Some(idx as i64 * 10);
            if idx % 2 == 0 {
                job.updated_at = Some(1_000 - idx as i64);
            }
            if idx % 3 == 0 {
                job.end_time = Some(500 + idx as i64);
            }
            job
        })
        .collect()
}

#[test]
fn every_known_job_lands_in_exactly_one_bucket() {
    let jobs = mixed_jobs();
    let view = categorize(&jobs, false, false, false);

    for job in &jobs {
        let hits = [&view.active, &view.completed, &view.failed]
            .iter()
            .filter(|bucket| bucket.iter().any(|other| other.id == job.id))
            .count();
        assert_eq!(hits, 1, "job {} ({})", job.id, job.status);
    }

    assert!(view.active.iter().all(|job| status_class(&job.status) == Some(StatusClass::Active)));
    assert!(view
        .completed
        .iter()
        .all(|job| status_class(&job.status) == Some(StatusClass::Completed)));
    assert!(view.failed.iter().all(|job| status_class(&job.status) == Some(StatusClass::Failed)));
    assert!(view.unknown.is_empty());
}

#[test]
fn bucket_order_is_newest_first_on_first_shared_field() {
    let mut a = job("a", "running");
    a.updated_at = Some(10);
    let mut b = job("b", "queued");
    b.updated_at = Some(30);
    let mut c = job("c", "preparing");
    c.updated_at = Some(20);

    let view = categorize(&[a, b, c], false, false, false);
    assert_eq!(ids(&view.active), vec!["b", "c", "a"]);
}

#[test]
fn jobs_without_timestamps_fall_back_to_created_at() {
    let first = job("1", "running");
    let mut second = job("2", "running");
    second.created_at = Some(100);

    let view = categorize(&[first, second], false, false, false);
    assert_eq!(ids(&view.active), vec!["2", "1"]);
}

#[test]
fn cached_jobs_survive_a_reload() {
    let mut model = JobListModel::new();
    let a = job("A", "running");
    let b = job("B", "completed");
    model.update(&[a, b], false);

    let view = model.update(&[], true);
    assert_eq!(ids(&view.active), vec!["A"]);
    assert_eq!(ids(&view.completed), vec!["B"]);
    assert!(view.has_jobs);
    assert!(!view.should_show_empty);
}

#[test]
fn loading_and_empty_flags_are_exclusive() {
    let mut model = JobListModel::new();
    let snapshots: Vec<(Vec<Job>, bool)> = vec![
        (vec![], true),
        (vec![], false),
        (vec![job("a", "running")], true),
        (vec![], true),
        (vec![], false),
        (vec![job("b", "failed")], false),
    ];

    for (jobs, loading) in snapshots {
        let view = model.update(&jobs, loading);
        assert!(!(view.should_show_loading && view.should_show_empty));
    }

    for initial in [false, true] {
        for loading in [false, true] {
            for cache_empty in [false, true] {
                let view = categorize(&[], cache_empty, initial, loading);
                assert!(!(view.should_show_loading && view.should_show_empty));
            }
        }
    }
}

#[test]
fn identical_inputs_give_identical_output() {
    let jobs = mixed_jobs();
    let first = categorize(&jobs, false, false, false);
    let second = categorize(&jobs.clone(), false, false, false);
    assert_eq!(first, second);

    let mut model = JobListModel::new();
    let once = model.update(&jobs, false).clone();
    let twice = model.update(&jobs, false).clone();
    assert_eq!(once, twice);
}

#[test]
fn completed_jobs_sort_by_end_time() {
    let mut a = job("a", "completed");
    a.end_time = Some(200);
    a.updated_at = Some(100);
    let mut b = job("b", "completed");
    b.end_time = Some(300);
    b.updated_at = Some(50);

    let view = categorize(&[a, b], false, false, false);
    assert_eq!(ids(&view.completed), vec!["b", "a"]);
}

#[test]
fn failed_jobs_without_shared_fields_keep_input_order() {
    let mut x = job("x", "failed");
    x.updated_at = Some(10);
    let mut y = job("y", "failed");
    y.end_time = Some(5);

    let view = categorize(&[x, y], false, false, false);
    assert_eq!(ids(&view.failed), vec!["x", "y"]);
}

#[test]
fn unmatched_statuses_are_surfaced_separately() {
    let jobs = vec![job("a", "running"), job("z", "paused")];
    let view = categorize(&jobs, false, false, false);

    assert_eq!(ids(&view.active), vec!["a"]);
    assert_eq!(ids(&view.unknown), vec!["z"]);
    assert!(view.has_jobs);
    assert_eq!(view.len(), 2);
}

#[test]
fn snapshot_with_malformed_timestamps_still_sorts() {
    let jobs: Vec<Job> = serde_json::from_str(
        r#"[
            {"id": "old", "status": "running", "updatedAt": "soon", "createdAt": 5},
            {"id": "new", "status": "running", "updatedAt": null, "createdAt": 50}
        ]"#,
    )
    .unwrap();

    let view = categorize(&jobs, false, false, false);
    assert_eq!(ids(&view.active), vec!["new", "old"]);
}

#[test]
fn terminal_buckets_fall_back_through_updated_at_then_last_update() {
    let mut a = job("a", "completed");
    a.updated_at = Some(100);
    a.created_at = Some(900);
    let mut b = job("b", "completed");
    b.updated_at = Some(300);

    let mut x = job("x", "failed");
    x.end_time = Some(5_000);
    x.last_update = Some(10);
    x.created_at = Some(900);
    let mut y = job("y", "canceled");
    y.last_update = Some(20);

    let view = categorize(&[a, x, b, y], false, false, false);
    assert_eq!(ids(&view.completed), vec!["b", "a"]);
    assert_eq!(ids(&view.failed), vec!["y", "x"]);
}
