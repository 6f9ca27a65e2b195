//! Stages, matches and the bracket wire format.

use crate::models::participant::ParticipantId;
use crate::models::tournament::TournamentId;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Unique identifier for a stage (one round of the bracket).
pub type StageId = i32;

/// Unique identifier for a match.
pub type MatchId = i32;

/// One round of the bracket. Level 1 is the first round.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Stage {
    pub id: StageId,
    pub tournament_id: TournamentId,
    pub level: i32,
}

/// One side of a match.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct Slot {
    pub participant_id: Option<ParticipantId>,
    pub result_text: Option<String>,
    pub is_winner: bool,
}

/// A stored match.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Match {
    pub id: MatchId,
    pub stage_id: StageId,
    pub name: String,
    /// Match the winner advances to; `None` only for the final.
    pub next_match_id: Option<MatchId>,
    pub first: Slot,
    pub second: Slot,
    pub date: Option<NaiveDateTime>,
}

impl Match {
    pub fn has_winner(&self) -> bool {
        self.first.is_winner || self.second.is_winner
    }

    /// Winning participant, if both slots are filled and a winner is flagged.
    pub fn confirmed_winner(&self) -> Option<ParticipantId> {
        let first = self.first.participant_id?;
        let second = self.second.participant_id?;
        if self.first.is_winner {
            Some(first)
        } else if self.second.is_winner {
            Some(second)
        } else {
            None
        }
    }
}

/// A match together with the level of the stage it belongs to.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct StagedMatch {
    pub level: i32,
    pub game: Match,
}

/// Full replacement of a match's editable columns.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct MatchUpdate {
    pub id: MatchId,
    pub name: String,
    pub date: Option<NaiveDateTime>,
    pub first: Slot,
    pub second: Slot,
}

/// Trim result text; whitespace-only text counts as no result.
pub fn normalize_result(text: Option<&str>) -> Option<String> {
    text.map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}

/// One side of a match as rendered for clients. `name == None` means "to be decided".
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct MatchParticipant {
    pub id: Option<ParticipantId>,
    pub result_text: Option<String>,
    #[serde(default)]
    pub is_winner: bool,
    #[serde(default)]
    pub name: Option<String>,
}

impl MatchParticipant {
    pub fn to_slot(&self) -> Slot {
        Slot {
            participant_id: self.id,
            result_text: normalize_result(self.result_text.as_deref()),
            is_winner: self.is_winner,
        }
    }
}

/// A match as rendered for clients and as proposed by bracket edits.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct BracketMatch {
    pub id: MatchId,
    pub name: String,
    pub next_match_id: Option<MatchId>,
    /// Stage level as text.
    #[serde(default)]
    pub tournament_round_text: String,
    #[serde(default)]
    pub date: Option<NaiveDateTime>,
    pub participants: Vec<MatchParticipant>,
}

/// The whole bracket of a tournament, ordered by stage then match id.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct TournamentBracket {
    pub matches: Vec<BracketMatch>,
}

impl TournamentBracket {
    pub fn find(&self, id: MatchId) -> Option<&BracketMatch> {
        self.matches.iter().find(|m| m.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn game(first: Option<ParticipantId>, second: Option<ParticipantId>) -> Match {
        Match {
            id: 1,
            stage_id: 1,
            name: "Match 1".to_string(),
            next_match_id: Some(3),
            first: Slot { participant_id: first, ..Slot::default() },
            second: Slot { participant_id: second, ..Slot::default() },
            date: None,
        }
    }

    #[test]
    fn whitespace_result_is_absent() {
        assert_eq!(normalize_result(Some("   ")), None);
        assert_eq!(normalize_result(None), None);
        assert_eq!(normalize_result(Some(" 3:1 ")), Some("3:1".to_string()));
    }

    #[test]
    fn winner_needs_both_slots_filled() {
        let mut m = game(Some(10), None);
        m.first.is_winner = true;
        assert!(m.has_winner());
        assert_eq!(m.confirmed_winner(), None);

        let mut m = game(Some(10), Some(11));
        m.second.is_winner = true;
        assert_eq!(m.confirmed_winner(), Some(11));
    }
}
