//! Participant (tournament entry) and its approval state.

use crate::models::tournament::{TournamentId, TournamentKind, UserId};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Unique identifier for a participant record.
pub type ParticipantId = i32;

/// Unique identifier for a team.
pub type TeamId = i32;

/// Approval state of a participation request. Only `Accepted` entries are seeded.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq, Serialize, Deserialize)]
pub enum ApprovalState {
    #[default]
    Pending,
    Accepted,
    Rejected,
}

impl ApprovalState {
    pub fn as_str(self) -> &'static str {
        match self {
            ApprovalState::Pending => "Pending",
            ApprovalState::Accepted => "Accepted",
            ApprovalState::Rejected => "Rejected",
        }
    }
}

impl fmt::Display for ApprovalState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ApprovalState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(ApprovalState::Pending),
            "Accepted" => Ok(ApprovalState::Accepted),
            "Rejected" => Ok(ApprovalState::Rejected),
            other => Err(format!("unknown participant state: {other}")),
        }
    }
}

/// Who takes part: a team or a single player, never both.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Entrant {
    Team(TeamId),
    Player(UserId),
}

/// Raw team/player references as they arrive in a participation request.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct EntrantRefs {
    #[serde(default)]
    pub team_id: Option<TeamId>,
    #[serde(default)]
    pub player_id: Option<UserId>,
}

impl Entrant {
    /// Build an entrant for a tournament of the given kind. Exactly the reference
    /// matching the kind must be present.
    pub fn from_refs(kind: TournamentKind, refs: EntrantRefs) -> Result<Self, String> {
        match (kind, refs.team_id, refs.player_id) {
            (TournamentKind::Team, Some(team), None) => Ok(Entrant::Team(team)),
            (TournamentKind::Team, _, Some(_)) => {
                Err("Player must be empty for a team tournament".to_string())
            }
            (TournamentKind::Team, None, None) => {
                Err("Team must be provided for a team tournament".to_string())
            }
            (TournamentKind::Person, None, Some(player)) => Ok(Entrant::Player(player)),
            (TournamentKind::Person, Some(_), _) => {
                Err("Team must be empty for an individual tournament".to_string())
            }
            (TournamentKind::Person, None, None) => {
                Err("Player must be provided for an individual tournament".to_string())
            }
        }
    }

    pub fn team_id(self) -> Option<TeamId> {
        match self {
            Entrant::Team(id) => Some(id),
            Entrant::Player(_) => None,
        }
    }

    pub fn player_id(self) -> Option<UserId> {
        match self {
            Entrant::Player(id) => Some(id),
            Entrant::Team(_) => None,
        }
    }
}

/// A stored participant record.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Participant {
    pub id: ParticipantId,
    pub tournament_id: TournamentId,
    pub entrant: Entrant,
    pub state: ApprovalState,
}

/// Participant as shown in tournament details: id plus resolved display name.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct ParticipantSummary {
    pub id: ParticipantId,
    pub entrant: Entrant,
    pub name: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entrant_must_match_tournament_kind() {
        let team = EntrantRefs { team_id: Some(3), player_id: None };
        let player = EntrantRefs { team_id: None, player_id: Some(7) };
        let both = EntrantRefs { team_id: Some(3), player_id: Some(7) };

        assert_eq!(Entrant::from_refs(TournamentKind::Team, team), Ok(Entrant::Team(3)));
        assert_eq!(Entrant::from_refs(TournamentKind::Person, player), Ok(Entrant::Player(7)));
        assert!(Entrant::from_refs(TournamentKind::Team, player).is_err());
        assert!(Entrant::from_refs(TournamentKind::Person, team).is_err());
        assert!(Entrant::from_refs(TournamentKind::Team, both).is_err());
        assert!(Entrant::from_refs(TournamentKind::Person, EntrantRefs::default()).is_err());
    }
}
