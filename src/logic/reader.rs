//! Bracket reader: the committed bracket with participant names resolved.

use crate::error::{BracketError, BracketResult};
use crate::models::{
    normalize_result, BracketMatch, MatchParticipant, ParticipantId, Slot, StagedMatch,
    TournamentBracket, TournamentId,
};
use crate::store::{Store, StoreTx};
use std::collections::HashMap;

/// Current bracket of a tournament, ordered by stage then match id.
/// Empty when the tournament has not been started.
pub async fn get_bracket(store: &dyn Store, tournament_id: TournamentId) -> BracketResult<TournamentBracket> {
    let mut tx = store.begin().await?;
    read_bracket(tx.as_mut(), tournament_id).await
}

pub(crate) async fn read_bracket(
    tx: &mut dyn StoreTx,
    tournament_id: TournamentId,
) -> BracketResult<TournamentBracket> {
    if tx.tournament(tournament_id).await?.is_none() {
        return Err(BracketError::TournamentNotFound(tournament_id));
    }
    let names = tx.participant_names(tournament_id).await?;
    let matches = tx
        .bracket_matches(tournament_id)
        .await?
        .iter()
        .map(|staged| render_match(staged, &names))
        .collect();
    Ok(TournamentBracket { matches })
}

fn render_slot(slot: &Slot, names: &HashMap<ParticipantId, String>) -> MatchParticipant {
    let name = slot
        .participant_id
        .and_then(|id| names.get(&id))
        .map(|name| name.trim())
        .filter(|name| !name.is_empty())
        .map(str::to_string);
    MatchParticipant {
        id: slot.participant_id,
        result_text: normalize_result(slot.result_text.as_deref()),
        is_winner: slot.is_winner,
        name,
    }
}

pub fn render_match(staged: &StagedMatch, names: &HashMap<ParticipantId, String>) -> BracketMatch {
    let game = &staged.game;
    BracketMatch {
        id: game.id,
        name: game.name.clone(),
        next_match_id: game.next_match_id,
        tournament_round_text: staged.level.to_string(),
        date: game.date,
        participants: vec![render_slot(&game.first, names), render_slot(&game.second, names)],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Match;

    #[test]
    fn empty_slots_render_as_to_be_decided() {
        let staged = StagedMatch {
            level: 2,
            game: Match {
                id: 7,
                stage_id: 3,
                name: "Match 3".to_string(),
                next_match_id: None,
                first: Slot {
                    participant_id: Some(1),
                    result_text: Some("  ".to_string()),
                    is_winner: false,
                },
                second: Slot::default(),
                date: None,
            },
        };
        let names = HashMap::from([(1, "Red Foxes ".to_string())]);

        let rendered = render_match(&staged, &names);
        assert_eq!(rendered.tournament_round_text, "2");
        assert_eq!(rendered.participants[0].name.as_deref(), Some("Red Foxes"));
        assert_eq!(rendered.participants[0].result_text, None);
        assert_eq!(rendered.participants[1], MatchParticipant::default());
    }
}
