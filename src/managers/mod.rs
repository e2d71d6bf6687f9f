pub mod availability_manager;
pub mod team_manager;

pub use availability_manager::{
    create_shared_availability_manager, AvailabilityManager, SharedAvailabilityManager,
};
pub use team_manager::{
    create_shared_team_manager, SharedTeamManager, TeamManager, GM_ROLE, PERM_FA_ROLE,
};
