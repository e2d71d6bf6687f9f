use futures::{Stream, StreamExt};

use crate::Context;

pub mod checkin;
pub mod general;
pub mod team;
pub mod tier;

pub use checkin::{
    check_availability, check_in, check_out, clear_all_availability, clear_availability,
    match_day, set_match_day,
};
pub use general::{help, ping};
pub use team::{
    add_team, add_teams, franchises, free_agents, list_teams, remove_franchise_prefix,
    remove_team, roster, set_franchise_prefix, team_roles, teams, teams_for_user,
};
pub use tier::{add_tier, remove_tier, tier_list};

/// Autocomplete over the guild's stored tier names
pub(crate) async fn tier_autocomplete<'a>(
    ctx: Context<'a>,
    partial: &'a str,
) -> impl Stream<Item = String> + 'a {
    let Some(guild_id) = ctx.guild_id() else {
        return futures::stream::empty().boxed();
    };
    let tiers = ctx.data().team_manager.read().await.tiers(guild_id).await;
    let partial = partial.to_lowercase();
    futures::stream::iter(
        tiers
            .into_iter()
            .filter(move |tier| tier.to_lowercase().starts_with(&partial)),
    )
    .boxed()
}
