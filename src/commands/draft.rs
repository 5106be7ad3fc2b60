use tracing::{error, info};

use super::log::IMPACTS;
use super::send_chunked;
use crate::adr::error::AdrError;
use crate::adr::DraftRequest;
use crate::state::Context;

const DEFAULT_IMPACT: &str = "medium";

/// Prepare a new decision record from the repository template
#[poise::command(slash_command)]
pub async fn draft(
    ctx: Context<'_>,
    #[description = "Decision title"] title: String,
    #[description = "Branch to propose it on; also names the file"] branch: String,
    #[description = "high, medium, low (default medium)"] impact: Option<String>,
) -> Result<(), anyhow::Error> {
    let request = match build_request(&title, &branch, impact.as_deref()) {
        Ok(request) => request,
        Err(usage) => {
            ctx.say(usage).await?;
            return Ok(());
        }
    };

    ctx.defer().await?;
    info!(user = %ctx.author().name, branch = %request.branch, "Record draft requested");

    let drafter = ctx.data().record_drafter();
    let draft = match drafter.draft(&request).await {
        Ok(draft) => draft,
        Err(AdrError::InvalidDraft(reason)) => {
            ctx.say(format!("Error: {}", reason)).await?;
            return Ok(());
        }
        Err(e) => {
            error!(error = %e, "Failed to draft decision record");
            ctx.say("Sorry, I couldn't prepare the record right now.")
                .await?;
            return Ok(());
        }
    };

    info!(path = %draft.path, "Record draft ready");

    let text = format!(
        "Create `{}` on branch `{}` with:\n```markdown\n{}```\nthen open a pull request.",
        draft.path, request.branch, draft.content
    );
    send_chunked(&ctx, &text).await
}

/// Returns a user-facing usage message on bad input.
fn build_request(title: &str, branch: &str, impact: Option<&str>) -> Result<DraftRequest, String> {
    let title = title.trim();
    if title.is_empty() {
        return Err("A title is required.".to_string());
    }
    let impact = impact
        .map(|i| i.trim().to_lowercase())
        .filter(|i| !i.is_empty())
        .unwrap_or_else(|| DEFAULT_IMPACT.to_string());
    if !IMPACTS.contains(&impact.as_str()) {
        return Err(format!(
            "Unknown impact `{}`. Valid: `high`, `medium`, `low`",
            impact
        ));
    }
    Ok(DraftRequest {
        title: title.to_string(),
        branch: branch.trim().to_string(),
        impact,
    })
}
