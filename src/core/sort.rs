use std::cmp::Ordering;

use crate::core::job::Job;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimestampField {
    CreatedAt,
    UpdatedAt,
    StartTime,
    EndTime,
    LastUpdate,
}

impl TimestampField {
    pub fn read(self, job: &Job) -> Option<i64> {
        match self {
            TimestampField::CreatedAt => job.created_at,
            TimestampField::UpdatedAt => job.updated_at,
            TimestampField::StartTime => job.start_time,
            TimestampField::EndTime => job.end_time,
            TimestampField::LastUpdate => job.last_update,
        }
    }
}

pub const ACTIVE_PRIORITY: [TimestampField; 3] = [
    TimestampField::UpdatedAt,
    TimestampField::StartTime,
    TimestampField::LastUpdate,
];

pub const COMPLETED_PRIORITY: [TimestampField; 3] = [
    TimestampField::EndTime,
    TimestampField::UpdatedAt,
    TimestampField::LastUpdate,
];

pub const FAILED_PRIORITY: [TimestampField; 3] = [
    TimestampField::EndTime,
    TimestampField::UpdatedAt,
    TimestampField::LastUpdate,
];

/// Newest-first comparison on the first field both jobs carry, falling back
/// to `created_at` (absent counts as 0) when no field in `fields` qualifies.
pub fn compare_by_priority(a: &Job, b: &Job, fields: &[TimestampField]) -> Ordering {
    for field in fields {
        if let (Some(left), Some(right)) = (field.read(a), field.read(b)) {
            return right.cmp(&left);
        }
    }

    let left = a.created_at.unwrap_or(0);
    let right = b.created_at.unwrap_or(0);
    right.cmp(&left)
}

/// Stable in-place sort with the tiered comparator.
///
/// The tiered comparator is not a total order (two jobs can be compared on
/// different fields than a third), and `slice::sort_by` may panic when it
/// detects such an order, so this uses insertion sort which only moves an
/// element past strictly greater neighbours.
pub fn sort_bucket(jobs: &mut [Job], fields: &[TimestampField]) {
    for idx in 1..jobs.len() {
        let mut pos = idx;
        while pos > 0 && compare_by_priority(&jobs[pos - 1], &jobs[pos], fields) == Ordering::Greater
        {
            jobs.swap(pos - 1, pos);
            pos -= 1;
        }
    }
}
