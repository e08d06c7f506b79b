use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::core::error::JobDeckError;
use crate::core::job::{Job, STATUS_CANCELED};

pub const DEFAULT_RETENTION_DAYS: u32 = 90;

const DAY_MS: i64 = 24 * 60 * 60 * 1000;

const CANCEL_REASON: &str = "Canceled by user";

/// What a clear-history request does to terminal jobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClearHistory {
    /// Permanently delete every completed, failed or canceled job.
    DeleteAllTerminal,
    /// Permanently delete terminal jobs created more than this many days ago.
    DeleteOlderThan(u32),
    /// Hide, without deleting, terminal jobs created more than this many days ago.
    HideOlderThan(u32),
}

impl ClearHistory {
    /// Maps the "days to keep" parameter: `-1` deletes everything terminal,
    /// absent or `0` applies the retention window, `n > 0` hides older jobs.
    pub fn from_days(days: Option<i64>, retention_days: u32) -> Result<Self, JobDeckError> {
        match days {
            Some(-1) => Ok(ClearHistory::DeleteAllTerminal),
            None | Some(0) => Ok(ClearHistory::DeleteOlderThan(retention_days)),
            Some(days) if days > 0 => {
                let days = u32::try_from(days).map_err(|_| JobDeckError::InvalidRetention { days })?;
                Ok(ClearHistory::HideOlderThan(days))
            }
            Some(days) => Err(JobDeckError::InvalidRetention { days }),
        }
    }

    fn cutoff(days: u32, now_ms: i64) -> i64 {
        now_ms.saturating_sub(i64::from(days).saturating_mul(DAY_MS))
    }
}

/// Source of job snapshots and sink for user actions.
pub trait JobStore: Send {
    fn fetch_jobs(&mut self) -> Result<Vec<Job>, JobDeckError>;

    fn cancel_job(&mut self, job_id: &str) -> Result<(), JobDeckError>;

    /// Permanently removes one job regardless of its status.
    fn delete_job(&mut self, job_id: &str) -> Result<(), JobDeckError>;

    /// Cancels every non-terminal job of a session. Returns how many changed.
    fn cancel_session_jobs(&mut self, session_id: &str) -> Result<usize, JobDeckError>;

    /// Returns the number of jobs deleted or hidden.
    fn clear_history(&mut self, scope: ClearHistory) -> Result<usize, JobDeckError>;
}

pub fn now_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as i64)
        .unwrap_or(0)
}

fn mark_canceled(job: &mut Job, now_ms: i64) {
    job.status = STATUS_CANCELED.to_string();
    job.end_time = Some(now_ms);
    job.updated_at = Some(now_ms);
    job.error_message = Some(CANCEL_REASON.to_string());
}

// Entries that do not decode as a job are carried through writes untouched.
#[derive(Debug)]
enum Entry {
    Job(Job),
    Unreadable(Value),
}

#[derive(Debug, Default)]
struct Snapshot {
    entries: Vec<Entry>,
}

impl Snapshot {
    fn from_values(values: Vec<Value>, path: &Path) -> Self {
        let entries = values
            .into_iter()
            .enumerate()
            .map(|(index, value)| match serde_json::from_value::<Job>(value.clone()) {
                Ok(job) => Entry::Job(job),
                Err(err) => {
                    warn!(path = %path.display(), index, error = %err, "skipping unreadable job entry");
                    Entry::Unreadable(value)
                }
            })
            .collect();
        Self { entries }
    }

    fn jobs(&self) -> impl Iterator<Item = &Job> {
        self.entries.iter().filter_map(|entry| match entry {
            Entry::Job(job) => Some(job),
            Entry::Unreadable(_) => None,
        })
    }

    fn jobs_mut(&mut self) -> impl Iterator<Item = &mut Job> {
        self.entries.iter_mut().filter_map(|entry| match entry {
            Entry::Job(job) => Some(job),
            Entry::Unreadable(_) => None,
        })
    }

    /// Drops jobs matching `remove`; returns how many went.
    fn remove_jobs(&mut self, mut remove: impl FnMut(&Job) -> bool) -> usize {
        let before = self.entries.len();
        self.entries.retain(|entry| match entry {
            Entry::Job(job) => !remove(job),
            Entry::Unreadable(_) => true,
        });
        before - self.entries.len()
    }

    fn into_jobs(self) -> Vec<Job> {
        self.entries
            .into_iter()
            .filter_map(|entry| match entry {
                Entry::Job(job) => Some(job),
                Entry::Unreadable(_) => None,
            })
            .collect()
    }

    fn to_values(&self) -> Result<Vec<Value>, serde_json::Error> {
        self.entries
            .iter()
            .map(|entry| match entry {
                Entry::Job(job) => serde_json::to_value(job),
                Entry::Unreadable(value) => Ok(value.clone()),
            })
            .collect()
    }
}

/// Job store backed by a JSON array on disk, shared with whatever runs the jobs.
#[derive(Debug, Clone)]
pub struct FileJobStore {
    path: PathBuf,
}

impl FileJobStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<Snapshot, JobDeckError> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "job snapshot missing, treating as empty");
                return Ok(Snapshot::default());
            }
            Err(err) => {
                return Err(JobDeckError::SnapshotRead {
                    path: self.path.clone(),
                    message: err.to_string(),
                })
            }
        };

        if contents.trim().is_empty() {
            return Ok(Snapshot::default());
        }

        let values: Vec<Value> =
            serde_json::from_str(&contents).map_err(|err| JobDeckError::SnapshotParse {
                path: self.path.clone(),
                message: err.to_string(),
            })?;
        Ok(Snapshot::from_values(values, &self.path))
    }

    fn save(&self, snapshot: &Snapshot) -> Result<(), JobDeckError> {
        let write_err = |message: String| JobDeckError::SnapshotWrite {
            path: self.path.clone(),
            message,
        };

        let values = snapshot.to_values().map_err(|err| write_err(err.to_string()))?;
        let body = serde_json::to_string_pretty(&values).map_err(|err| write_err(err.to_string()))?;
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        fs::write(&tmp, body).map_err(|err| write_err(err.to_string()))?;
        fs::rename(&tmp, &self.path).map_err(|err| write_err(err.to_string()))?;
        Ok(())
    }

    pub fn cancel_job_at(&mut self, job_id: &str, now_ms: i64) -> Result<(), JobDeckError> {
        let mut snapshot = self.load()?;
        let job = snapshot
            .jobs_mut()
            .find(|job| job.id == job_id)
            .ok_or_else(|| JobDeckError::JobNotFound {
                id: job_id.to_string(),
            })?;

        if job.is_terminal() {
            info!(job_id, status = %job.status, "job already in a terminal state");
            return Ok(());
        }

        mark_canceled(job, now_ms);
        self.save(&snapshot)?;
        info!(job_id, "job canceled");
        Ok(())
    }

    pub fn delete_job_at(&mut self, job_id: &str) -> Result<(), JobDeckError> {
        let mut snapshot = self.load()?;
        if snapshot.remove_jobs(|job| job.id == job_id) == 0 {
            return Err(JobDeckError::JobNotFound {
                id: job_id.to_string(),
            });
        }

        self.save(&snapshot)?;
        info!(job_id, "job deleted");
        Ok(())
    }

    pub fn cancel_session_jobs_at(
        &mut self,
        session_id: &str,
        now_ms: i64,
    ) -> Result<usize, JobDeckError> {
        let mut snapshot = self.load()?;
        let mut canceled = 0;
        for job in snapshot
            .jobs_mut()
            .filter(|job| job.session_id.as_deref() == Some(session_id))
        {
            if !job.is_terminal() {
                mark_canceled(job, now_ms);
                canceled += 1;
            }
        }

        if canceled > 0 {
            self.save(&snapshot)?;
        }
        info!(session_id, canceled, "session jobs canceled");
        Ok(canceled)
    }

    pub fn clear_history_at(
        &mut self,
        scope: ClearHistory,
        now_ms: i64,
    ) -> Result<usize, JobDeckError> {
        let mut snapshot = self.load()?;

        let affected = match scope {
            ClearHistory::DeleteAllTerminal => snapshot.remove_jobs(|job| job.is_terminal()),
            ClearHistory::DeleteOlderThan(days) => {
                let cutoff = ClearHistory::cutoff(days, now_ms);
                snapshot.remove_jobs(|job| job.is_terminal() && job.created_at.unwrap_or(0) < cutoff)
            }
            ClearHistory::HideOlderThan(days) => {
                let cutoff = ClearHistory::cutoff(days, now_ms);
                let mut hidden = 0;
                for job in snapshot.jobs_mut() {
                    if !job.hidden && job.is_terminal() && job.created_at.unwrap_or(0) < cutoff {
                        job.hidden = true;
                        hidden += 1;
                    }
                }
                hidden
            }
        };

        if affected > 0 {
            self.save(&snapshot)?;
        }
        info!(?scope, affected, "job history cleared");
        Ok(affected)
    }
}

impl JobStore for FileJobStore {
    fn fetch_jobs(&mut self) -> Result<Vec<Job>, JobDeckError> {
        let snapshot = self.load()?;
        let total = snapshot.jobs().count();
        let visible: Vec<Job> = snapshot
            .into_jobs()
            .into_iter()
            .filter(|job| !job.hidden)
            .collect();
        debug!(total, visible = visible.len(), "fetched job snapshot");
        Ok(visible)
    }

    fn cancel_job(&mut self, job_id: &str) -> Result<(), JobDeckError> {
        self.cancel_job_at(job_id, now_ms()).map_err(|err| {
            warn!(job_id, error = %err, "cancel failed");
            err
        })
    }

    fn delete_job(&mut self, job_id: &str) -> Result<(), JobDeckError> {
        self.delete_job_at(job_id).map_err(|err| {
            warn!(job_id, error = %err, "delete failed");
            err
        })
    }

    fn cancel_session_jobs(&mut self, session_id: &str) -> Result<usize, JobDeckError> {
        self.cancel_session_jobs_at(session_id, now_ms())
    }

    fn clear_history(&mut self, scope: ClearHistory) -> Result<usize, JobDeckError> {
        self.clear_history_at(scope, now_ms())
    }
}
