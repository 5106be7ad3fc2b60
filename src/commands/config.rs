use crate::state::Context;

/// Show or change fetch limits (admin only)
#[poise::command(slash_command, guild_only)]
pub async fn config(
    ctx: Context<'_>,
    #[description = "page_size | max_pages | on_parse_error"] param: Option<String>,
    #[description = "New value"] value: Option<String>,
) -> Result<(), anyhow::Error> {
    let user_id = ctx.author().id.get();
    if !ctx.data().is_admin(user_id) {
        ctx.say("This command is admin-only.").await?;
        return Ok(());
    }

    match (param.as_deref(), value) {
        // Show current limits
        (None, _) => {
            let limits = ctx.data().limits.read().await;
            ctx.say(format!(
                "**Fetch limits:**\n\
                 `page_size`: {}\n\
                 `max_pages`: {}\n\
                 `on_parse_error`: {}",
                limits.page_size, limits.max_pages, limits.on_parse_error
            ))
            .await?;
        }
        // Set a parameter
        (Some(key), Some(val)) => {
            let mut limits = ctx.data().limits.write().await;
            let mut updated = *limits;
            let applied = match key {
                "page_size" => val.parse().map(|v| updated.page_size = v).is_ok(),
                "max_pages" => val.parse().map(|v| updated.max_pages = v).is_ok(),
                "on_parse_error" => val
                    .parse()
                    .map(|v| updated.on_parse_error = v)
                    .is_ok(),
                _ => {
                    ctx.say(format!(
                        "Unknown param `{}`. Valid: `page_size`, `max_pages`, `on_parse_error`",
                        key
                    ))
                    .await?;
                    return Ok(());
                }
            };

            if !applied {
                ctx.say(format!("`{}` is not a valid value for `{}`", val, key))
                    .await?;
                return Ok(());
            }
            if let Err(e) = updated.validate() {
                ctx.say(format!("Rejected: {}", e)).await?;
                return Ok(());
            }

            *limits = updated;
            ctx.say(format!("`{}` set to {}", key, val)).await?;
        }
        (Some(_), None) => {
            ctx.say("Provide both `param` and `value`. Example: `/adr config max_pages 20`")
                .await?;
        }
    }

    Ok(())
}
