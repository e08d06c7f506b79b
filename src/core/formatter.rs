use crate::core::job::{canonical_status, Job, StatusClass};

const RESPONSE_PREVIEW_CHARS: usize = 400;

pub fn format_duration_ms(ms: i64) -> String {
    let ms = ms.max(0);
    if ms < 60_000 {
        return format!("{:.1}s", ms as f64 / 1000.0);
    }
    let total_secs = ms / 1000;
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;
    format!("{:02}:{:02}:{:02}", hours, minutes, seconds)
}

pub fn format_relative(ts: Option<i64>, now_ms: i64) -> String {
    let ts = match ts {
        Some(ts) => ts,
        None => return "-".to_string(),
    };
    let secs = now_ms.saturating_sub(ts) / 1000;
    if secs < 0 {
        "just now".to_string()
    } else if secs < 60 {
        format!("{secs}s ago")
    } else if secs < 3600 {
        format!("{}m ago", secs / 60)
    } else if secs < 86_400 {
        format!("{}h ago", secs / 3600)
    } else {
        format!("{}d ago", secs / 86_400)
    }
}

pub fn format_tokens(count: u64) -> String {
    const K: f64 = 1000.0;
    const M: f64 = K * 1000.0;
    let value = count as f64;
    if value >= M {
        format!("{:.1}M", value / M)
    } else if value >= K {
        format!("{:.1}k", value / K)
    } else {
        count.to_string()
    }
}

pub fn format_cost(cost: f64) -> String {
    if cost > 0.0 && cost < 0.01 {
        format!("${:.4}", cost)
    } else {
        format!("${:.2}", cost)
    }
}

pub fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    // No room for the ellipsis.
    if max_chars < 3 {
        return text.chars().take(max_chars).collect();
    }
    let kept: String = text.chars().take(max_chars.saturating_sub(3)).collect();
    format!("{kept}...")
}

pub fn status_label(job: &Job) -> String {
    let status = canonical_status(&job.status);
    let label = match status {
        "acknowledgedByWorker" => "Acknowledged",
        "preparingInput" => "Preparing input",
        "generatingStream" => "Generating",
        "processingStream" => "Processing",
        "completedByTag" => "Completed",
        _ => "",
    };
    if !label.is_empty() {
        return label.to_string();
    }

    let mut chars = status.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => "Unknown".to_string(),
    }
}

pub fn status_symbol(job: &Job) -> &'static str {
    match job.class() {
        Some(StatusClass::Active) => "●",
        Some(StatusClass::Completed) => "✓",
        Some(StatusClass::Failed) => "✗",
        None => "?",
    }
}

pub fn job_title(job: &Job) -> String {
    if job.task_type.is_empty() {
        return job.id.clone();
    }
    job.task_type
        .split('_')
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Elapsed run time: start (or creation) to end, or to now while active.
pub fn job_elapsed_ms(job: &Job, now_ms: i64) -> Option<i64> {
    let start = job.start_time.or(job.created_at)?;
    let end = match job.end_time {
        Some(end) => end,
        None if job.is_active() => now_ms,
        None => job.updated_at?,
    };
    Some(end.saturating_sub(start))
}

/// Second line of a sidebar card.
pub fn card_detail_line(job: &Job, now_ms: i64) -> String {
    let mut parts = Vec::new();

    if let Some(model) = &job.model_used {
        parts.push(model.clone());
    }

    match (job.tokens_sent, job.tokens_received) {
        (Some(sent), Some(received)) => {
            parts.push(format!("{}→{}", format_tokens(sent), format_tokens(received)))
        }
        (Some(sent), None) => parts.push(format!("{} sent", format_tokens(sent))),
        (None, Some(received)) => parts.push(format!("{} recv", format_tokens(received))),
        (None, None) => {}
    }

    if let Some(elapsed) = job_elapsed_ms(job, now_ms) {
        parts.push(format_duration_ms(elapsed));
    }

    let reference = job.end_time.or(job.updated_at).or(job.created_at);
    parts.push(format_relative(reference, now_ms));

    parts.join(" · ")
}

pub fn details_lines(job: &Job, now_ms: i64) -> Vec<String> {
    let mut lines = vec![
        format!("Id       : {}", job.id),
        format!("Status   : {} ({})", status_label(job), job.status),
        format!("Task     : {}", job_title(job)),
    ];

    if let Some(session) = &job.session_id {
        lines.push(format!("Session  : {session}"));
    }
    if let Some(api) = &job.api_type {
        lines.push(format!("API      : {api}"));
    }
    if let Some(model) = &job.model_used {
        lines.push(format!("Model    : {model}"));
    }

    let timestamps = [
        ("Created  ", job.created_at),
        ("Updated  ", job.updated_at),
        ("Started  ", job.start_time),
        ("Ended    ", job.end_time),
        ("Last seen", job.last_update),
    ];
    for (label, ts) in timestamps {
        if let Some(value) = ts {
            lines.push(format!("{label}: {} ({value})", format_relative(Some(value), now_ms)));
        }
    }

    if let Some(elapsed) = job_elapsed_ms(job, now_ms) {
        lines.push(format!("Duration : {}", format_duration_ms(elapsed)));
    }
    if job.tokens_sent.is_some() || job.tokens_received.is_some() {
        lines.push(format!(
            "Tokens   : sent={} received={}",
            job.tokens_sent.map(format_tokens).unwrap_or_else(|| "-".to_string()),
            job.tokens_received
                .map(format_tokens)
                .unwrap_or_else(|| "-".to_string())
        ));
    }
    if let Some(cost) = job.cost {
        lines.push(format!("Cost     : {}", format_cost(cost)));
    }

    if let Some(error) = &job.error_message {
        lines.push(String::new());
        lines.push("Error:".to_string());
        lines.extend(error.lines().map(|line| format!("  {line}")));
    }

    if let Some(response) = &job.response {
        lines.push(String::new());
        lines.push("Response:".to_string());
        let preview = truncate(response, RESPONSE_PREVIEW_CHARS);
        lines.extend(preview.lines().map(|line| format!("  {line}")));
    }

    if let Some(metadata) = &job.metadata {
        if let Ok(pretty) = serde_json::to_string_pretty(metadata) {
            lines.push(String::new());
            lines.push("Metadata:".to_string());
            lines.extend(pretty.lines().map(|line| format!("  {line}")));
        }
    }

    lines
}
