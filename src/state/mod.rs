pub mod availability;
pub mod league;

pub use availability::{
    create_shared_availability_state, AvailabilityState, GuildAvailability,
    SharedAvailabilityState,
};
pub use league::{
    create_shared_league_state, GuildLeague, LeagueState, SharedLeagueState, TeamRoles,
};
