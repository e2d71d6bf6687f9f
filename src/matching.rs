//! Name resolution for teams, tiers, and franchise roles.
//!
//! Franchise roles follow the display-name grammar `<Franchise> (<GM>)`:
//! everything before the trailing parenthesized segment is the franchise
//! name, the text inside the parentheses is the GM name. Roles that don't
//! follow the grammar are skipped when scanning the guild's role set.

use once_cell::sync::Lazy;
use regex::Regex;

/// Similarity cutoff for team-name suggestions.
const TEAM_MATCH_CUTOFF: f64 = 0.4;

/// Maximum number of team-name suggestions returned.
const TEAM_MATCH_LIMIT: usize = 3;

/// Similarity cutoff for tier-name resolution.
const TIER_MATCH_CUTOFF: f64 = 0.6;

static FRANCHISE_ROLE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?P<franchise>.+?) \((?P<gm>.+)\)$").unwrap());

/// A franchise role display name split into its parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FranchiseLabel {
    pub franchise: String,
    pub gm: String,
}

/// Parse a role display name against the franchise grammar.
pub fn parse_franchise_role(name: &str) -> Option<FranchiseLabel> {
    let caps = FRANCHISE_ROLE_RE.captures(name)?;
    Some(FranchiseLabel {
        franchise: caps["franchise"].to_string(),
        gm: caps["gm"].to_string(),
    })
}

/// Result of resolving a team name from free text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TeamMatch {
    /// Case-insensitive exact match against the stored team list.
    Exact(String),
    /// No exact match; the closest candidates, possibly none.
    Suggestions(Vec<String>),
}

/// Case-insensitive similarity between two names.
fn similarity(a: &str, b: &str) -> f64 {
    strsim::normalized_levenshtein(&a.to_lowercase(), &b.to_lowercase())
}

/// Candidates scoring at or above `cutoff`, best first, at most `limit`.
pub fn closest_matches(
    input: &str,
    candidates: &[String],
    limit: usize,
    cutoff: f64,
) -> Vec<String> {
    let mut scored: Vec<(f64, &String)> = candidates
        .iter()
        .map(|c| (similarity(input, c), c))
        .filter(|(score, _)| *score >= cutoff)
        .collect();
    scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
    scored
        .into_iter()
        .take(limit)
        .map(|(_, c)| c.clone())
        .collect()
}

/// Resolve a team name: exact case-insensitive match wins, otherwise up to
/// three fuzzy suggestions.
pub fn match_team_name(input: &str, teams: &[String]) -> TeamMatch {
    for team in teams {
        if team.eq_ignore_ascii_case(input) {
            return TeamMatch::Exact(team.clone());
        }
    }
    TeamMatch::Suggestions(closest_matches(
        input,
        teams,
        TEAM_MATCH_LIMIT,
        TEAM_MATCH_CUTOFF,
    ))
}

/// Resolve a tier name: exact case-insensitive match wins, otherwise the
/// single best fuzzy candidate.
pub fn match_tier_name(input: &str, tiers: &[String]) -> Option<String> {
    for tier in tiers {
        if tier.eq_ignore_ascii_case(input) {
            return Some(tier.clone());
        }
    }
    closest_matches(input, tiers, 1, TIER_MATCH_CUTOFF)
        .into_iter()
        .next()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_franchise_role() {
        let label = parse_franchise_role("The Ocean (Shamu)").unwrap();
        assert_eq!(label.franchise, "The Ocean");
        assert_eq!(label.gm, "Shamu");
    }

    #[test]
    fn test_parse_rejects_plain_roles() {
        assert!(parse_franchise_role("Challenger").is_none());
        assert!(parse_franchise_role("General Manager").is_none());
        assert!(parse_franchise_role("Tier (unclosed").is_none());
    }

    #[test]
    fn test_parse_keeps_inner_parentheses_in_gm() {
        // Greedy GM capture, matching how the role scan always behaved
        let label = parse_franchise_role("Alpha (Beta) (Gamma)").unwrap();
        assert_eq!(label.franchise, "Alpha");
        assert_eq!(label.gm, "Beta) (Gamma");
    }

    #[test]
    fn test_exact_match_beats_fuzzy() {
        let tiers = names(&["Elite", "Challenger"]);
        assert_eq!(match_tier_name("elite", &tiers), Some("Elite".to_string()));
    }

    #[test]
    fn test_fuzzy_team_lookup() {
        let teams = names(&["Derechos", "Barbarians"]);
        match match_team_name("Derechoss", &teams) {
            TeamMatch::Suggestions(suggestions) => {
                assert_eq!(suggestions, vec!["Derechos".to_string()]);
            }
            TeamMatch::Exact(name) => panic!("unexpected exact match: {}", name),
        }
    }

    #[test]
    fn test_no_match_yields_empty_suggestions() {
        let teams = names(&["Derechos", "Barbarians"]);
        assert_eq!(
            match_team_name("Quetzalcoatl", &teams),
            TeamMatch::Suggestions(vec![])
        );
    }

    #[test]
    fn test_tier_fuzzy_fallback() {
        let tiers = names(&["Elite", "Challenger", "Prospect"]);
        assert_eq!(
            match_tier_name("Challnger", &tiers),
            Some("Challenger".to_string())
        );
        assert_eq!(match_tier_name("Bronze", &tiers), None);
    }

    #[test]
    fn test_suggestions_ranked_best_first() {
        let teams = names(&["Derechos", "Derecho", "Barbarians"]);
        match match_team_name("Derechoss", &teams) {
            TeamMatch::Suggestions(suggestions) => {
                assert_eq!(suggestions[0], "Derechos");
                assert!(suggestions.contains(&"Derecho".to_string()));
            }
            TeamMatch::Exact(name) => panic!("unexpected exact match: {}", name),
        }
    }
}
