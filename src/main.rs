use anyhow::Result;
use clap::Parser;
use dotenv::dotenv;
use poise::serenity_prelude as serenity;
use tracing::{error, info, warn};

/// Discord bot for league roster management and free-agent check-ins
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Force re-sync of slash commands to all guilds (use when commands aren't showing up)
    #[arg(long, short = 's')]
    sync_commands: bool,

    /// Register commands per-guild instead of globally (faster for testing)
    #[arg(long)]
    guild_commands: bool,

    /// Specific guild ID to sync commands to (for testing)
    #[arg(long)]
    guild_id: Option<u64>,
}

mod commands;
mod error;
mod logging;
mod managers;
mod matching;
mod state;

use commands::{
    add_team, add_teams, add_tier, check_availability, check_in, check_out,
    clear_all_availability, clear_availability, franchises, free_agents, help, list_teams,
    match_day, ping, remove_franchise_prefix, remove_team, remove_tier, roster,
    set_franchise_prefix, set_match_day, team_roles, teams, teams_for_user, tier_list,
};
use managers::{
    create_shared_availability_manager, create_shared_team_manager, SharedAvailabilityManager,
    SharedTeamManager,
};
use state::{
    create_shared_availability_state, create_shared_league_state, AvailabilityState, LeagueState,
};

type Error = Box<dyn std::error::Error + Send + Sync>;
type Context<'a> = poise::Context<'a, Data, Error>;

/// Shared application state
pub struct Data {
    pub team_manager: SharedTeamManager,
    pub availability: SharedAvailabilityManager,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    let args = Args::parse();

    logging::init();

    let token = std::env::var("DISCORD_TOKEN").expect("Missing DISCORD_TOKEN environment variable");
    let command_prefix = std::env::var("COMMAND_PREFIX").unwrap_or_else(|_| "!".to_string());
    let data_path = std::env::var("DATA_PATH").unwrap_or_else(|_| "data".to_string());

    // Ensure data directory exists
    tokio::fs::create_dir_all(&data_path).await.ok();

    info!("Loading league directory...");
    let league_path = format!("{}/league.json", data_path);
    let league = LeagueState::load(&league_path).await.unwrap_or_else(|e| {
        warn!("Could not load league directory: {}, using empty state", e);
        LeagueState::new()
    });
    let shared_league = create_shared_league_state(league);

    info!("Loading availability lists...");
    let availability_path = format!("{}/availability.json", data_path);
    let availability = AvailabilityState::load(&availability_path)
        .await
        .unwrap_or_else(|e| {
            warn!("Could not load availability lists: {}, using empty state", e);
            AvailabilityState::new()
        });
    let shared_availability = create_shared_availability_state(availability);

    // Create managers
    let team_manager = create_shared_team_manager(shared_league, league_path);
    let availability_manager =
        create_shared_availability_manager(shared_availability, availability_path);

    // Extract CLI flags for use in setup
    let sync_commands = args.sync_commands;
    let guild_commands = args.guild_commands;
    let target_guild_id = args.guild_id;

    if sync_commands {
        info!("--sync-commands: Will force re-register slash commands");
    }
    if guild_commands {
        info!("--guild-commands: Will register commands per-guild (faster for testing)");
    } else {
        info!("Registering commands globally by default (takes up to 1 hour to propagate)");
    }
    if let Some(gid) = target_guild_id {
        info!("--guild-id: Targeting specific guild {}", gid);
    }

    // Build framework
    let framework = poise::Framework::builder()
        .options(poise::FrameworkOptions {
            commands: vec![
                ping(),
                help(),
                check_in(),
                check_out(),
                check_availability(),
                match_day(),
                set_match_day(),
                clear_availability(),
                clear_all_availability(),
                tier_list(),
                add_tier(),
                remove_tier(),
                franchises(),
                teams(),
                roster(),
                team_roles(),
                list_teams(),
                free_agents(),
                teams_for_user(),
                add_team(),
                add_teams(),
                remove_team(),
                set_franchise_prefix(),
                remove_franchise_prefix(),
            ],
            prefix_options: poise::PrefixFrameworkOptions {
                prefix: Some(command_prefix.clone()),
                ..Default::default()
            },
            pre_command: |ctx| {
                Box::pin(async move {
                    info!(
                        "Command '{}' invoked by {} (ID: {}) in {}",
                        ctx.command().qualified_name,
                        ctx.author().name,
                        ctx.author().id,
                        ctx.guild_id().map(|g| g.to_string()).unwrap_or_else(|| "DM".to_string())
                    );
                })
            },
            post_command: |ctx| {
                Box::pin(async move {
                    info!(
                        "Command '{}' completed for {}",
                        ctx.command().qualified_name,
                        ctx.author().name
                    );
                })
            },
            on_error: |error| {
                Box::pin(async move {
                    match error {
                        poise::FrameworkError::Command { error, ctx, .. } => {
                            error!("Error in command '{}': {}", ctx.command().qualified_name, error);
                            let _ = ctx.say(format!("An error occurred: {}", error)).await;
                        }
                        poise::FrameworkError::ArgumentParse { error, input, ctx, .. } => {
                            error!("Argument parse error in '{}': {} (input: {:?})", ctx.command().qualified_name, error, input);
                        }
                        poise::FrameworkError::MissingBotPermissions { missing_permissions, ctx, .. } => {
                            error!("Bot missing permissions for '{}': {:?}", ctx.command().qualified_name, missing_permissions);
                            let _ = ctx.say(format!("Bot is missing permissions: {:?}", missing_permissions)).await;
                        }
                        poise::FrameworkError::MissingUserPermissions { missing_permissions, ctx, .. } => {
                            error!("User {} missing permissions for '{}': {:?}", ctx.author().name, ctx.command().qualified_name, missing_permissions);
                        }
                        poise::FrameworkError::NotAnOwner { ctx, .. } => {
                            error!("User {} tried to use owner command '{}'", ctx.author().name, ctx.command().qualified_name);
                        }
                        poise::FrameworkError::GuildOnly { ctx, .. } => {
                            error!("Command '{}' is guild-only, used in DM by {}", ctx.command().qualified_name, ctx.author().name);
                        }
                        other => {
                            error!("Other framework error: {}", other);
                        }
                    }
                })
            },
            ..Default::default()
        })
        .setup(move |ctx, ready, framework| {
            let team_manager = team_manager.clone();
            let availability_manager = availability_manager.clone();

            Box::pin(async move {
                info!("Bot logged in as: {}", ready.user.name);

                // Determine which guilds to register commands for
                let guilds_to_register: Vec<serenity::GuildId> = if let Some(gid) = target_guild_id {
                    // Only register to specific guild
                    vec![serenity::GuildId::new(gid)]
                } else {
                    // Register to all guilds the bot is in
                    ready.guilds.iter().map(|g| g.id).collect()
                };

                if guild_commands || sync_commands {
                    // Register commands per-guild (faster for testing)
                    for guild_id in &guilds_to_register {
                        info!("Registering commands to guild: {}", guild_id);
                        if let Err(e) = poise::builtins::register_in_guild(
                            ctx,
                            &framework.options().commands,
                            *guild_id,
                        ).await {
                            error!("Failed to register commands for guild {}: {}", guild_id, e);
                        } else {
                            info!("Successfully registered {} commands for guild {}",
                                  framework.options().commands.len(), guild_id);
                        }
                    }
                } else {
                    // Default: Register commands globally
                    info!("Registering commands globally...");
                    if let Err(e) = poise::builtins::register_globally(
                        ctx,
                        &framework.options().commands,
                    ).await {
                        error!("Failed to register commands globally: {}", e);
                    } else {
                        info!("Successfully registered {} commands globally (may take up to 1 hour to propagate)",
                              framework.options().commands.len());
                    }
                }

                Ok(Data {
                    team_manager,
                    availability: availability_manager,
                })
            })
        })
        .build();

    let intents = serenity::GatewayIntents::non_privileged()
        | serenity::GatewayIntents::MESSAGE_CONTENT
        | serenity::GatewayIntents::GUILD_MEMBERS;

    // Log which privileged intents we're requesting
    let privileged_intents: Vec<&str> = vec![
        if intents.contains(serenity::GatewayIntents::MESSAGE_CONTENT) {
            Some("MESSAGE_CONTENT")
        } else {
            None
        },
        if intents.contains(serenity::GatewayIntents::GUILD_MEMBERS) {
            Some("GUILD_MEMBERS")
        } else {
            None
        },
        if intents.contains(serenity::GatewayIntents::GUILD_PRESENCES) {
            Some("GUILD_PRESENCES")
        } else {
            None
        },
    ]
    .into_iter()
    .flatten()
    .collect();

    info!("Requesting privileged intents: {:?}", privileged_intents);

    let mut client = serenity::ClientBuilder::new(token, intents)
        .framework(framework)
        .await?;

    info!("Starting bot...");
    if let Err(e) = client.start().await {
        // Check if it's a disallowed intents error
        let err_str = e.to_string();
        if err_str.contains("Disallowed") || err_str.contains("intents") {
            error!("Failed to start bot: {}", e);
            error!("The following privileged intents need to be enabled in the Discord Developer Portal:");
            for intent in &privileged_intents {
                error!("  - {}", intent);
            }
            error!("Go to https://discord.com/developers/applications -> Your App -> Bot -> Privileged Gateway Intents");
            return Err(anyhow::anyhow!(
                "Disallowed gateway intents. Enable these in Discord Developer Portal: {:?}",
                privileged_intents
            ));
        }
        return Err(e.into());
    }
    warn!("Bot ended.");

    Ok(())
}
