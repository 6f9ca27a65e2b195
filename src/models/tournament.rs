//! Tournament record and its lifecycle state.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Unique identifier for a tournament.
pub type TournamentId = i32;

/// Unique identifier for a user account (managers and individual players).
pub type UserId = i32;

/// Approval state of a tournament.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq, Serialize, Deserialize)]
pub enum TournamentState {
    /// Waiting for approval; the manager may still accept or reject it.
    #[default]
    Pending,
    /// Open for participant requests and eligible to start.
    Accepted,
    /// Declined; the only state in which deletion is allowed.
    Rejected,
}

impl TournamentState {
    pub fn as_str(self) -> &'static str {
        match self {
            TournamentState::Pending => "Pending",
            TournamentState::Accepted => "Accepted",
            TournamentState::Rejected => "Rejected",
        }
    }
}

impl fmt::Display for TournamentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TournamentState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(TournamentState::Pending),
            "Accepted" => Ok(TournamentState::Accepted),
            "Rejected" => Ok(TournamentState::Rejected),
            other => Err(format!("unknown tournament state: {other}")),
        }
    }
}

/// Whether entrants are teams or individual players.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
pub enum TournamentKind {
    Team,
    Person,
}

impl TournamentKind {
    pub fn as_str(self) -> &'static str {
        match self {
            TournamentKind::Team => "Team",
            TournamentKind::Person => "Person",
        }
    }
}

impl fmt::Display for TournamentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TournamentKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Team" => Ok(TournamentKind::Team),
            "Person" => Ok(TournamentKind::Person),
            other => Err(format!("unknown tournament type: {other}")),
        }
    }
}

/// Editable tournament fields (create and update requests).
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct TournamentDetails {
    pub name: String,
    pub discipline: String,
    /// Expected number of entrants; must be a power of two.
    pub capacity: i32,
    #[serde(rename = "type")]
    pub kind: TournamentKind,
    #[serde(default)]
    pub prize: i32,
    /// Minimum team size (team tournaments only).
    #[serde(default)]
    pub min_team_size: Option<i32>,
    /// Maximum team size (team tournaments only).
    #[serde(default)]
    pub max_team_size: Option<i32>,
}

/// A stored tournament.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Tournament {
    pub id: TournamentId,
    pub manager_id: UserId,
    pub state: TournamentState,
    #[serde(flatten)]
    pub details: TournamentDetails,
}

impl Tournament {
    pub fn is_managed_by(&self, user_id: UserId) -> bool {
        self.manager_id == user_id
    }
}

/// Is `n` a positive power of two?
pub fn is_power_of_two(n: i64) -> bool {
    n > 0 && (n & (n - 1)) == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn power_of_two_boundaries() {
        assert!(!is_power_of_two(0));
        assert!(is_power_of_two(1));
        assert!(is_power_of_two(2));
        assert!(!is_power_of_two(6));
        assert!(is_power_of_two(64));
        assert!(!is_power_of_two(-4));
    }

    #[test]
    fn state_round_trips_through_text() {
        for state in [
            TournamentState::Pending,
            TournamentState::Accepted,
            TournamentState::Rejected,
        ] {
            assert_eq!(state.as_str().parse::<TournamentState>(), Ok(state));
        }
        assert!("Started".parse::<TournamentState>().is_err());
    }
}
