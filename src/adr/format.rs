use serde_json::Value;

use super::types::{ChangeRequestSummary, Record};

const DIVIDER: &str = "────────────────────";

/// Front matter fields shown under a record, with their display labels.
const CONTEXT_LABELS: &[(&str, &str)] = &[
    ("status", "Status"),
    ("committed-on", "Committed On"),
    ("decide-by", "Decide By"),
    ("review-by", "Review By"),
    ("impact", "Impact"),
];

/// Render one record as a Discord message fragment.
pub fn render_record(record: &Record) -> String {
    let data = &record.data;
    let mut out = String::new();
    out.push_str(DIVIDER);
    out.push('\n');

    if let Some(title) = &data.title {
        out.push_str(&format!(
            "**Problem:** [{}]({})  ·  `/adr prs {}`\n",
            title, record.url, record.name
        ));
    }

    if let Some(problem) = data.section("Problem Description") {
        out.push_str(problem);
        out.push('\n');
    }

    if let Some(solution) = data.section("Accepted Solution") {
        out.push_str("**Accepted Solution**\n");
        out.push_str(solution);
        out.push('\n');
    }

    let context: Vec<String> = CONTEXT_LABELS
        .iter()
        .filter_map(|(key, label)| {
            let value = data.field(key).and_then(display_value)?;
            Some(format!("`{}: {}`", label, value))
        })
        .collect();
    if !context.is_empty() {
        out.push_str(&context.join(" "));
        out.push('\n');
    }

    out
}

/// Render a record log: a header followed by each record.
pub fn render_log(records: &[Record]) -> String {
    let mut out = String::from("**Decision Log**\n");
    for record in records {
        out.push_str(&render_record(record));
    }
    out
}

/// Render the pull requests that touched one record file.
pub fn render_change_requests(file_name: &str, prs: &[ChangeRequestSummary], truncated: bool) -> String {
    if prs.is_empty() {
        let mut out = format!("No pull requests touched `{}`.", file_name);
        if truncated {
            out.push_str(" (only recent history was searched)");
        }
        return out;
    }

    let mut out = format!("**Pull requests for `{}`**\n", file_name);
    for pr in prs {
        out.push_str(&format!(
            "- [{}]({}) · {} · opened {}\n",
            pr.title,
            pr.url,
            pr.state,
            pr.created_at.format("%Y-%m-%d")
        ));
    }
    if truncated {
        out.push_str("_Older history was not searched._\n");
    }
    out
}

/// Falsy values (empty string, `false`, `null`) are not shown.
fn display_value(value: &Value) -> Option<String> {
    match value {
        Value::Null | Value::Bool(false) => None,
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s.clone()),
        Value::Array(items) => Some(
            items
                .iter()
                .map(|v| v.as_str().map(str::to_string).unwrap_or_else(|| v.to_string()))
                .collect::<Vec<_>>()
                .join(", "),
        ),
        other => Some(other.to_string()),
    }
}
