use thiserror::Error;

#[derive(Error, Debug)]
pub enum BotError {
    // State persistence errors
    #[error("Failed to load state from '{path}': {source}")]
    StateLoad {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to save state to '{path}': {source}")]
    StateSave {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse state file '{path}': {source}")]
    StateParse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    // Directory lookup errors
    #[error("Role not found: {name}")]
    RoleNotFound { name: String },

    #[error("No tier with name: {name}")]
    TierNotFound { name: String },

    #[error("No team with name: {name}")]
    TeamNotFound { name: String },

    #[error("Franchise role not found for: {name}")]
    FranchiseNotFound { name: String },

    #[error("No franchise and tier roles set up for: {team}")]
    TeamRolesMissing { team: String },

    #[error("No franchise prefix set for GM: {gm}")]
    PrefixNotFound { gm: String },

    // Admin input validation; all problems are collected before reporting
    #[error("Errors with input:\n  * {}", .errors.join("\n  * "))]
    Validation { errors: Vec<String> },

    // Discord errors
    #[error("Discord API error: {message}")]
    Discord { message: String },

    #[error("Guild not found: {id}")]
    GuildNotFound { id: String },

    // Generic errors
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl From<serenity::Error> for BotError {
    fn from(err: serenity::Error) -> Self {
        BotError::Discord {
            message: err.to_string(),
        }
    }
}

impl From<std::io::Error> for BotError {
    fn from(err: std::io::Error) -> Self {
        BotError::Internal {
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for BotError {
    fn from(err: serde_json::Error) -> Self {
        BotError::Internal {
            message: err.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, BotError>;

use poise::serenity_prelude as serenity;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_lists_all_problems() {
        let err = BotError::Validation {
            errors: vec![
                "Team name not found.".to_string(),
                "Tier role not found.".to_string(),
            ],
        };
        let rendered = err.to_string();
        assert!(rendered.contains("Team name not found."));
        assert!(rendered.contains("Tier role not found."));
    }
}
