use poise::serenity_prelude as serenity;
use std::time::Duration;
use tracing::{info, warn};

use crate::managers::PERM_FA_ROLE;
use crate::{Context, Error};

/// How long a confirmation dialog waits for the user's reaction.
const CONFIRM_TIMEOUT: Duration = Duration::from_secs(30);

const CHECK_IN_EMOJI: &str = "👍";
const CHECK_OUT_EMOJI: &str = "👎";

/// Outcome of a timeout-bounded confirmation exchange
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Confirmation {
    /// The user reacted with the confirmation emoji in time
    Confirmed,
    /// No matching reaction before the timeout
    TimedOut,
    /// Sending the dialog or seeding its reaction failed
    Failed,
}

/// DM an embed with a single reactable emoji and wait for the same user to
/// confirm with that emoji.
async fn await_confirmation(
    ctx: &Context<'_>,
    user: &serenity::User,
    embed: serenity::CreateEmbed,
    emoji: &str,
) -> Confirmation {
    let message = match user
        .dm(ctx.http(), serenity::CreateMessage::new().embed(embed))
        .await
    {
        Ok(message) => message,
        Err(e) => {
            warn!("Failed to DM {}: {}", user.name, e);
            return Confirmation::Failed;
        }
    };

    let reaction = serenity::ReactionType::Unicode(emoji.to_string());
    if let Err(e) = message.react(ctx.http(), reaction.clone()).await {
        warn!(
            "Failed to seed confirmation reaction for {}: {}",
            user.name, e
        );
        return Confirmation::Failed;
    }

    let confirmed = message
        .await_reaction(ctx.serenity_context().shard.clone())
        .author_id(user.id)
        .filter(move |r| r.emoji == reaction)
        .timeout(CONFIRM_TIMEOUT)
        .await;

    match confirmed {
        Some(_) => Confirmation::Confirmed,
        None => Confirmation::TimedOut,
    }
}

async fn dm_text(ctx: &Context<'_>, user: &serenity::User, text: impl Into<String>) -> Result<(), Error> {
    user.dm(ctx.http(), serenity::CreateMessage::new().content(text.into()))
        .await?;
    Ok(())
}

/// The original invocation is removed so check-ins don't pile up in the
/// channel; slash invocations have no message to delete.
async fn delete_prefix_invocation(ctx: &Context<'_>) {
    if let poise::Context::Prefix(prefix_ctx) = ctx {
        if let Err(e) = prefix_ctx.msg.delete(ctx.http()).await {
            warn!("Failed to delete invocation message: {}", e);
        }
    }
}

fn check_in_embed(match_day: &str, tier: &str) -> serenity::CreateEmbed {
    serenity::CreateEmbed::new()
        .title("Check In")
        .description(format!(
            "By checking in you are letting GMs know that you are available to play \
             on the following match day in the following tier. To confirm, react with {}",
            CHECK_IN_EMOJI
        ))
        .field("Match Day", match_day.to_string(), true)
        .field("Tier", tier.to_string(), true)
        .color(0x3498db)
}

fn check_out_embed(match_day: &str, tier: &str) -> serenity::CreateEmbed {
    serenity::CreateEmbed::new()
        .title("Check Out")
        .description(format!(
            "You are currently checked in as available for the following match day and tier. \
             Do you wish to take yourself off the availability list? To confirm you want to \
             check out, react with {}",
            CHECK_OUT_EMOJI
        ))
        .field("Match Day", match_day.to_string(), true)
        .field("Tier", tier.to_string(), true)
        .color(0x3498db)
}

/// Check in as available for the current match day
#[poise::command(prefix_command, slash_command, guild_only, aliases("checkIn", "ci"))]
pub async fn check_in(ctx: Context<'_>) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("This command can only be used in a server")?;
    let user = ctx.author().clone();
    let member = ctx
        .author_member()
        .await
        .ok_or("Could not resolve you as a server member")?
        .into_owned();

    delete_prefix_invocation(&ctx).await;

    let team_manager = ctx.data().team_manager.read().await;
    let match_day = team_manager.match_day(guild_id).await;
    let Some(tier) = team_manager
        .free_agent_tier(ctx.http(), guild_id, &member)
        .await?
    else {
        dm_text(
            &ctx,
            &user,
            "Only free agents are allowed to check in. If you are a free agent and are \
             unable to check in please message an admin.",
        )
        .await?;
        return Ok(());
    };
    drop(team_manager);

    let availability = ctx.data().availability.read().await;
    if availability
        .is_checked_in(guild_id, &match_day, &tier, user.id)
        .await
    {
        dm_text(
            &ctx,
            &user,
            format!(
                "You've already checked in. If you want to check out, use the `{}check_out` command.",
                ctx.prefix()
            ),
        )
        .await?;
        return Ok(());
    }

    if !availability.begin_dialog(user.id, &match_day, &tier) {
        dm_text(
            &ctx,
            &user,
            "You already have a confirmation pending. Please respond to it first.",
        )
        .await?;
        return Ok(());
    }

    let outcome =
        await_confirmation(&ctx, &user, check_in_embed(&match_day, &tier), CHECK_IN_EMOJI).await;
    availability.end_dialog(user.id);

    match outcome {
        Confirmation::Confirmed => {
            let added = availability
                .check_in(guild_id, &match_day, &tier, user.id)
                .await?;
            if added {
                info!(
                    "Check-in confirmed by {} for match day {} tier {}",
                    user.name, match_day, tier
                );
                dm_text(
                    &ctx,
                    &user,
                    "Thank you for checking in! GMs will now be able to see that you're available.",
                )
                .await?;
            } else {
                dm_text(&ctx, &user, "You've already checked in.").await?;
            }
        }
        Confirmation::TimedOut | Confirmation::Failed => {
            dm_text(
                &ctx,
                &user,
                "Sorry, you either didn't react quick enough or something went wrong. \
                 Please try again.",
            )
            .await?;
        }
    }
    Ok(())
}

/// Take yourself off the availability list
#[poise::command(prefix_command, slash_command, guild_only, aliases("checkOut", "co"))]
pub async fn check_out(ctx: Context<'_>) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("This command can only be used in a server")?;
    let user = ctx.author().clone();
    let member = ctx
        .author_member()
        .await
        .ok_or("Could not resolve you as a server member")?
        .into_owned();

    delete_prefix_invocation(&ctx).await;

    let team_manager = ctx.data().team_manager.read().await;
    let match_day = team_manager.match_day(guild_id).await;
    let mut tier = team_manager
        .free_agent_tier(ctx.http(), guild_id, &member)
        .await?;
    if tier.is_none() {
        tier = team_manager
            .current_tier(ctx.http(), guild_id, &member)
            .await?;
    }
    drop(team_manager);

    let Some(tier) = tier else {
        dm_text(
            &ctx,
            &user,
            "Your tier could not be determined. If you are in the league please contact \
             an admin for help.",
        )
        .await?;
        return Ok(());
    };

    let availability = ctx.data().availability.read().await;
    if !availability
        .is_checked_in(guild_id, &match_day, &tier, user.id)
        .await
    {
        dm_text(
            &ctx,
            &user,
            format!(
                "You aren't currently checked in. If you want to check in, use the `{}check_in` command.",
                ctx.prefix()
            ),
        )
        .await?;
        return Ok(());
    }

    if !availability.begin_dialog(user.id, &match_day, &tier) {
        dm_text(
            &ctx,
            &user,
            "You already have a confirmation pending. Please respond to it first.",
        )
        .await?;
        return Ok(());
    }

    let outcome = await_confirmation(
        &ctx,
        &user,
        check_out_embed(&match_day, &tier),
        CHECK_OUT_EMOJI,
    )
    .await;
    availability.end_dialog(user.id);

    match outcome {
        Confirmation::Confirmed => {
            let removed = availability
                .check_out(guild_id, &match_day, &tier, user.id)
                .await?;
            if removed {
                info!(
                    "Check-out confirmed by {} for match day {} tier {}",
                    user.name, match_day, tier
                );
                dm_text(
                    &ctx,
                    &user,
                    "You have been removed from the list. Thank you for updating your availability!",
                )
                .await?;
            } else {
                dm_text(&ctx, &user, "You aren't currently checked in.").await?;
            }
        }
        Confirmation::TimedOut | Confirmation::Failed => {
            dm_text(
                &ctx,
                &user,
                "Sorry, you either didn't react quick enough or something went wrong. \
                 Please try again.",
            )
            .await?;
        }
    }
    Ok(())
}

/// Show who's checked in for a tier
#[poise::command(
    prefix_command,
    slash_command,
    guild_only,
    aliases("checkAvailability", "ca")
)]
pub async fn check_availability(
    ctx: Context<'_>,
    #[description = "Tier name"]
    #[autocomplete = "super::tier_autocomplete"]
    tier_name: String,
    #[description = "Match day (defaults to the current one)"] match_day: Option<String>,
) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("This command can only be used in a server")?;
    let team_manager = ctx.data().team_manager.read().await;

    let Some(tier) = team_manager.match_tier_name(guild_id, &tier_name).await else {
        ctx.say(format!("No tier with name: `{}`", tier_name)).await?;
        return Ok(());
    };
    let match_day = match match_day {
        Some(day) => day,
        None => team_manager.match_day(guild_id).await,
    };

    let availability = ctx.data().availability.read().await;
    let user_ids = availability.checked_in(guild_id, &match_day, &tier).await;

    let perm_fa_role = team_manager
        .find_role_by_name(ctx.http(), guild_id, PERM_FA_ROLE)
        .await
        .ok();

    let mut message = format!(
        "```Availability for {} tier on match day {}:",
        tier, match_day
    );
    for user_id in user_ids {
        // Users who left the guild or lost their FA role are skipped
        let Ok(member) = guild_id
            .member(ctx.http(), serenity::UserId::new(user_id))
            .await
        else {
            continue;
        };
        if team_manager
            .free_agent_tier(ctx.http(), guild_id, &member)
            .await?
            .is_none()
        {
            continue;
        }
        message.push_str(&format!("\n\t{}", member.display_name()));
        if let Some(role) = &perm_fa_role {
            if member.roles.contains(&role.id) {
                message.push_str(" (Permanent FA)");
            }
        }
    }
    message.push_str("```");
    ctx.say(message).await?;
    Ok(())
}

/// Show the current match day
#[poise::command(prefix_command, slash_command, guild_only, aliases("matchDay"))]
pub async fn match_day(ctx: Context<'_>) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("This command can only be used in a server")?;
    let manager = ctx.data().team_manager.read().await;
    let day = manager.match_day(guild_id).await;
    ctx.say(format!("Current match day: {}", day)).await?;
    Ok(())
}

/// Set the current match day
#[poise::command(
    prefix_command,
    slash_command,
    guild_only,
    required_permissions = "MANAGE_GUILD",
    default_member_permissions = "MANAGE_GUILD",
    aliases("setMatchDay")
)]
pub async fn set_match_day(
    ctx: Context<'_>,
    #[description = "Match day key"] day: String,
) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("This command can only be used in a server")?;
    info!("set_match_day '{}' called by {}", day, ctx.author().name);

    let manager = ctx.data().team_manager.read().await;
    match manager.set_match_day(guild_id, &day).await {
        Ok(()) => {
            ctx.say("Done.").await?;
        }
        Err(e @ crate::error::BotError::Validation { .. }) => {
            ctx.say(format!(":x: {}", e)).await?;
        }
        Err(e) => return Err(e.into()),
    }
    Ok(())
}

/// Clear availability for a match day, or one tier within it
#[poise::command(
    prefix_command,
    slash_command,
    guild_only,
    required_permissions = "MANAGE_GUILD",
    default_member_permissions = "MANAGE_GUILD",
    aliases("clearAvailability")
)]
pub async fn clear_availability(
    ctx: Context<'_>,
    #[description = "Tier to clear (omit to clear the whole match day)"]
    #[autocomplete = "super::tier_autocomplete"]
    tier: Option<String>,
    #[description = "Match day (defaults to the current one)"] match_day: Option<String>,
) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("This command can only be used in a server")?;
    let team_manager = ctx.data().team_manager.read().await;
    let match_day = match match_day {
        Some(day) => day,
        None => team_manager.match_day(guild_id).await,
    };

    let availability = ctx.data().availability.read().await;
    match tier {
        None => availability.clear_day(guild_id, &match_day).await?,
        Some(tier_name) => {
            let tier = team_manager
                .match_tier_name(guild_id, &tier_name)
                .await
                .unwrap_or(tier_name);
            availability.clear_tier(guild_id, &match_day, &tier).await?;
        }
    }
    ctx.say("Done.").await?;
    Ok(())
}

/// Clear the entire availability store for this server
#[poise::command(
    prefix_command,
    slash_command,
    guild_only,
    required_permissions = "MANAGE_GUILD",
    default_member_permissions = "MANAGE_GUILD",
    aliases("clearAllAvailability")
)]
pub async fn clear_all_availability(ctx: Context<'_>) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("This command can only be used in a server")?;
    info!("clear_all_availability called by {}", ctx.author().name);

    let availability = ctx.data().availability.read().await;
    availability.clear_all(guild_id).await?;
    ctx.say("Done.").await?;
    Ok(())
}
