pub mod cache;
pub mod cancel;
pub mod engine;
pub mod error;
pub mod formatter;
pub mod guard;
pub mod job;
pub mod sort;
pub mod store;

pub use cache::JobCache;
pub use cancel::CancellingJobs;
pub use engine::{categorize, JobListModel, JobView, Section};
pub use error::JobDeckError;
pub use guard::{InFlight, InFlightToken};
pub use job::{status_class, Job, StatusClass};
pub use store::{ClearHistory, FileJobStore, JobStore};
