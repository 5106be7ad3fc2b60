use tracing::{error, info, warn};

use super::send_chunked;
use crate::adr::format::render_change_requests;
use crate::state::Context;

/// List the pull requests that touched a decision record
#[poise::command(slash_command)]
pub async fn prs(
    ctx: Context<'_>,
    #[description = "Record file name, e.g. 0001-use-postgres.md"]
    #[autocomplete = "autocomplete_record"]
    file: String,
) -> Result<(), anyhow::Error> {
    ctx.defer().await?;

    let file_name = base_name(&file);
    info!(user = %ctx.author().name, file = file_name, "Pull request history requested");

    let builder = ctx.data().index_builder().await;
    let index = match builder.build_index().await {
        Ok(index) => index,
        Err(e) => {
            error!(error = %e, "Failed to build pull request index");
            ctx.say("Sorry, I couldn't load the pull request history right now.")
                .await?;
            return Ok(());
        }
    };

    info!(
        pages = index.pages,
        records = index.by_file.len(),
        truncated = index.truncated,
        "Pull request index built"
    );

    let text = render_change_requests(file_name, index.get(file_name), index.truncated);
    send_chunked(&ctx, &text).await
}

/// Accept a full repository path as well as a bare file name.
fn base_name(input: &str) -> &str {
    let input = input.trim();
    input.rsplit('/').next().unwrap_or(input)
}

/// Autocomplete from the record names currently in the repository.
async fn autocomplete_record(ctx: Context<'_>, partial: &str) -> Vec<String> {
    let fetcher = ctx.data().record_fetcher().await;
    let names = match fetcher.record_names().await {
        Ok(names) => names,
        Err(e) => {
            warn!(error = %e, "Record name autocomplete failed");
            return Vec::new();
        }
    };
    suggest(names, partial)
}

/// Discord shows at most 25 choices.
fn suggest(names: Vec<String>, partial: &str) -> Vec<String> {
    let partial = partial.to_lowercase();
    names
        .into_iter()
        .filter(|name| name.to_lowercase().contains(&partial))
        .take(25)
        .collect()
}
