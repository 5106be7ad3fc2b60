use tracing::{error, info};

use super::send_chunked;
use crate::adr::filter::parse_timestamp;
use crate::adr::format::render_log;
use crate::adr::FilterCriteria;
use crate::state::Context;

const STATUSES: &[&str] = &["committed", "open", "deferred", "obsolete"];
pub(super) const IMPACTS: &[&str] = &["high", "medium", "low"];

/// List decision records, optionally filtered
#[poise::command(slash_command)]
pub async fn log(
    ctx: Context<'_>,
    #[description = "committed, open, deferred, obsolete (space or comma separated)"]
    status: Option<String>,
    #[description = "high, medium, low (space or comma separated)"] impact: Option<String>,
    #[description = "Tags; a record matches if it has any of them"] tags: Option<String>,
    #[description = "Committed on or after this date (yyyy-mm-dd)"] committed_after: Option<String>,
    #[description = "Open and due before this date (yyyy-mm-dd)"] decide_before: Option<String>,
) -> Result<(), anyhow::Error> {
    let options = LogOptions {
        status,
        impact,
        tags,
        committed_after,
        decide_before,
    };
    let criteria = match build_criteria(&options) {
        Ok(criteria) => criteria,
        Err(usage) => {
            ctx.say(usage).await?;
            return Ok(());
        }
    };

    ctx.defer().await?;
    info!(user = %ctx.author().name, ?criteria, "Decision log requested");

    let fetcher = ctx.data().record_fetcher().await;
    let records = match fetcher.fetch_records(&criteria).await {
        Ok(records) => records,
        Err(e) => {
            error!(error = %e, "Failed to fetch decision records");
            ctx.say("Sorry, I couldn't load the decision log right now.")
                .await?;
            return Ok(());
        }
    };

    info!(count = records.len(), "Decision log ready");

    if records.is_empty() {
        ctx.say("No decision records match those filters.").await?;
        return Ok(());
    }

    send_chunked(&ctx, &render_log(&records)).await
}

/// Raw option strings as typed by the user.
#[derive(Debug, Default)]
struct LogOptions {
    status: Option<String>,
    impact: Option<String>,
    tags: Option<String>,
    committed_after: Option<String>,
    decide_before: Option<String>,
}

/// Returns a user-facing usage message on bad input.
fn build_criteria(options: &LogOptions) -> Result<FilterCriteria, String> {
    Ok(FilterCriteria {
        status: vocabulary_list(options.status.as_deref(), STATUSES, "status")?,
        impact: vocabulary_list(options.impact.as_deref(), IMPACTS, "impact")?,
        tags: split_list(options.tags.as_deref()),
        committed_after: date_option(options.committed_after.as_deref())?,
        decide_before: date_option(options.decide_before.as_deref())?,
    })
}

fn split_list(raw: Option<&str>) -> Option<Vec<String>> {
    let items: Vec<String> = raw?
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();
    if items.is_empty() {
        None
    } else {
        Some(items)
    }
}

fn vocabulary_list(
    raw: Option<&str>,
    allowed: &[&str],
    option: &str,
) -> Result<Option<Vec<String>>, String> {
    let Some(items) = split_list(raw) else {
        return Ok(None);
    };
    let items: Vec<String> = items.into_iter().map(|s| s.to_lowercase()).collect();
    if let Some(bad) = items.iter().find(|s| !allowed.contains(&s.as_str())) {
        return Err(format!(
            "Unknown {} `{}`. Valid: {}",
            option,
            bad,
            allowed
                .iter()
                .map(|a| format!("`{}`", a))
                .collect::<Vec<_>>()
                .join(", ")
        ));
    }
    Ok(Some(items))
}

fn date_option(raw: Option<&str>) -> Result<Option<chrono::DateTime<chrono::Utc>>, String> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(None),
        Some(s) => parse_timestamp(s)
            .map(Some)
            .ok_or_else(|| format!("Error: unable to parse date {}. Must be yyyy-mm-dd format.", s)),
    }
}
