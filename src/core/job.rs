use std::collections::HashMap;

use once_cell::sync::Lazy;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// The three display classes every known job status belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusClass {
    Active,
    Completed,
    Failed,
}

pub const ACTIVE_STATUSES: [&str; 9] = [
    "idle",
    "created",
    "queued",
    "acknowledgedByWorker",
    "preparing",
    "preparingInput",
    "generatingStream",
    "processingStream",
    "running",
];

pub const COMPLETED_STATUSES: [&str; 2] = ["completed", "completedByTag"];

pub const FAILED_STATUSES: [&str; 2] = ["failed", "canceled"];

const STATUS_ALIASES: [(&str, &str); 7] = [
    ("acknowledged_by_worker", "acknowledgedByWorker"),
    ("preparing_input", "preparingInput"),
    ("generating_stream", "generatingStream"),
    ("processing_stream", "processingStream"),
    ("completed_by_tag", "completedByTag"),
    ("cancelled", "canceled"),
    ("acknowledged", "acknowledgedByWorker"),
];

static STATUS_TABLE: Lazy<HashMap<&'static str, StatusClass>> = Lazy::new(|| {
    let mut table = HashMap::new();
    for status in ACTIVE_STATUSES {
        table.insert(status, StatusClass::Active);
    }
    for status in COMPLETED_STATUSES {
        table.insert(status, StatusClass::Completed);
    }
    for status in FAILED_STATUSES {
        table.insert(status, StatusClass::Failed);
    }
    for (alias, canonical) in STATUS_ALIASES {
        if let Some(class) = table.get(canonical).copied() {
            table.insert(alias, class);
        }
    }
    table
});

/// Looks up the class of a raw status string. `None` for statuses outside the table.
pub fn status_class(status: &str) -> Option<StatusClass> {
    STATUS_TABLE.get(status).copied()
}

/// Resolves aliases such as `cancelled` to the canonical status name.
/// Statuses outside the table are returned unchanged.
pub fn canonical_status(status: &str) -> &str {
    STATUS_ALIASES
        .iter()
        .find(|(alias, _)| *alias == status)
        .map(|(_, canonical)| *canonical)
        .unwrap_or(status)
}

pub const STATUS_CANCELED: &str = "canceled";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    #[serde(default)]
    pub task_type: String,
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_used: Option<String>,
    #[serde(default, deserialize_with = "lenient_count", skip_serializing_if = "Option::is_none")]
    pub tokens_sent: Option<u64>,
    #[serde(default, deserialize_with = "lenient_count", skip_serializing_if = "Option::is_none")]
    pub tokens_received: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
    #[serde(default, deserialize_with = "lenient_cost", skip_serializing_if = "Option::is_none")]
    pub cost: Option<f64>,
    #[serde(default, deserialize_with = "lenient_timestamp", skip_serializing_if = "Option::is_none")]
    pub created_at: Option<i64>,
    #[serde(default, deserialize_with = "lenient_timestamp", skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<i64>,
    #[serde(default, deserialize_with = "lenient_timestamp", skip_serializing_if = "Option::is_none")]
    pub start_time: Option<i64>,
    #[serde(default, deserialize_with = "lenient_timestamp", skip_serializing_if = "Option::is_none")]
    pub end_time: Option<i64>,
    #[serde(default, deserialize_with = "lenient_timestamp", skip_serializing_if = "Option::is_none")]
    pub last_update: Option<i64>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub hidden: bool,
}

impl Job {
    pub fn new(id: impl Into<String>, status: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            session_id: None,
            task_type: String::new(),
            status: status.into(),
            api_type: None,
            model_used: None,
            tokens_sent: None,
            tokens_received: None,
            response: None,
            error_message: None,
            metadata: None,
            cost: None,
            created_at: None,
            updated_at: None,
            start_time: None,
            end_time: None,
            last_update: None,
            hidden: false,
        }
    }

    pub fn class(&self) -> Option<StatusClass> {
        status_class(&self.status)
    }

    pub fn is_active(&self) -> bool {
        self.class() == Some(StatusClass::Active)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self.class(),
            Some(StatusClass::Completed) | Some(StatusClass::Failed)
        )
    }
}

fn is_false(value: &bool) -> bool {
    !*value
}

// Anything that is not a finite JSON number reads as an absent timestamp.
fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(timestamp_from_value))
}

// Token counts: non-negative integers only.
fn lenient_count<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(Value::as_u64))
}

// Cost arrives either as a number or as a decimal string.
fn lenient_cost<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    let cost = match value {
        Some(Value::Number(number)) => number.as_f64(),
        Some(Value::String(text)) => text.trim().parse::<f64>().ok(),
        _ => None,
    };
    Ok(cost.filter(|cost| cost.is_finite()))
}

fn timestamp_from_value(value: &Value) -> Option<i64> {
    match value {
        Value::Number(number) => number.as_i64().or_else(|| {
            number
                .as_f64()
                .filter(|float| float.is_finite())
                .map(|float| float as i64)
        }),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_listed_status_has_exactly_one_class() {
        for status in ACTIVE_STATUSES {
            assert_eq!(status_class(status), Some(StatusClass::Active));
        }
        for status in COMPLETED_STATUSES {
            assert_eq!(status_class(status), Some(StatusClass::Completed));
        }
        for status in FAILED_STATUSES {
            assert_eq!(status_class(status), Some(StatusClass::Failed));
        }
    }

    #[test]
    fn aliases_share_the_canonical_class() {
        assert_eq!(status_class("cancelled"), Some(StatusClass::Failed));
        assert_eq!(
            status_class("acknowledged_by_worker"),
            Some(StatusClass::Active)
        );
        assert_eq!(status_class("completed_by_tag"), Some(StatusClass::Completed));
    }

    #[test]
    fn unknown_status_has_no_class() {
        assert_eq!(status_class("paused"), None);
        assert_eq!(status_class(""), None);
        assert!(!Job::new("a", "paused").is_terminal());
        assert!(!Job::new("a", "paused").is_active());
    }

    #[test]
    fn deserializes_camel_case_snapshot() {
        let job: Job = serde_json::from_str(
            r#"{
                "id": "job-1",
                "sessionId": "s-1",
                "taskType": "path_finder",
                "status": "running",
                "modelUsed": "gpt",
                "tokensSent": 120,
                "createdAt": 1000,
                "updatedAt": 2000,
                "metadata": {"workflowId": "w-1"}
            }"#,
        )
        .unwrap();

        assert_eq!(job.id, "job-1");
        assert_eq!(job.session_id.as_deref(), Some("s-1"));
        assert_eq!(job.task_type, "path_finder");
        assert_eq!(job.tokens_sent, Some(120));
        assert_eq!(job.created_at, Some(1000));
        assert_eq!(job.updated_at, Some(2000));
        assert_eq!(job.end_time, None);
        assert!(!job.hidden);
        assert!(job.is_active());
    }

    #[test]
    fn malformed_timestamps_read_as_absent() {
        let job: Job = serde_json::from_str(
            r#"{
                "id": "job-2",
                "status": "failed",
                "createdAt": "yesterday",
                "updatedAt": null,
                "startTime": true,
                "endTime": 1500.7,
                "lastUpdate": {"ms": 3}
            }"#,
        )
        .unwrap();

        assert_eq!(job.created_at, None);
        assert_eq!(job.updated_at, None);
        assert_eq!(job.start_time, None);
        assert_eq!(job.end_time, Some(1500));
        assert_eq!(job.last_update, None);
        assert!(job.is_terminal());
    }

    #[test]
    fn descriptive_fields_tolerate_other_shapes() {
        let job: Job = serde_json::from_str(
            r#"{
                "id": "job-4",
                "status": "completed",
                "cost": "0.0123",
                "tokensSent": -1,
                "tokensReceived": "many"
            }"#,
        )
        .unwrap();

        assert_eq!(job.cost, Some(0.0123));
        assert_eq!(job.tokens_sent, None);
        assert_eq!(job.tokens_received, None);

        let job: Job =
            serde_json::from_str(r#"{"id": "job-5", "status": "failed", "cost": "free", "tokensSent": 12}"#)
                .unwrap();
        assert_eq!(job.cost, None);
        assert_eq!(job.tokens_sent, Some(12));
    }

    #[test]
    fn canonical_status_resolves_aliases_only() {
        assert_eq!(canonical_status("cancelled"), "canceled");
        assert_eq!(canonical_status("preparing_input"), "preparingInput");
        assert_eq!(canonical_status("running"), "running");
        assert_eq!(canonical_status("paused"), "paused");
    }

    #[test]
    fn serializes_without_absent_fields() {
        let mut job = Job::new("job-3", "queued");
        job.created_at = Some(10);
        let json = serde_json::to_value(&job).unwrap();

        assert_eq!(json["createdAt"], 10);
        assert!(json.get("endTime").is_none());
        assert!(json.get("hidden").is_none());
    }
}
