//! Bracket editor: validates a proposed bracket snapshot against committed results,
//! persists it and advances freshly decided winners into the next round.

use crate::error::{BracketError, BracketResult};
use crate::logic::reader::read_bracket;
use crate::models::{
    normalize_result, BracketMatch, Caller, Match, MatchId, MatchParticipant, MatchUpdate,
    ParticipantId, TournamentBracket, TournamentId,
};
use crate::store::{Store, StoreTx};
use std::collections::{BTreeMap, HashSet};

/// A decided match whose winner moves on.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Advancement {
    pub match_id: MatchId,
    pub winner: ParticipantId,
}

fn sides(proposed: &BracketMatch) -> BracketResult<(&MatchParticipant, &MatchParticipant)> {
    match proposed.participants.as_slice() {
        [first, second] => Ok((first, second)),
        _ => Err(BracketError::MalformedMatch(proposed.id)),
    }
}

fn to_update(proposed: &BracketMatch) -> BracketResult<MatchUpdate> {
    let (first, second) = sides(proposed)?;
    Ok(MatchUpdate {
        id: proposed.id,
        name: proposed.name.clone(),
        date: proposed.date,
        first: first.to_slot(),
        second: second.to_slot(),
    })
}

/// Check a proposed match against its stored state.
///
/// A decided match is frozen: participants, winner flags and result texts must be
/// resubmitted unchanged. An undecided match may gain at most one winner, and only together
/// with a result for that side.
pub fn check_match(stored: &Match, proposed: &BracketMatch) -> BracketResult<()> {
    let update = to_update(proposed)?;
    let (first, second) = (&update.first, &update.second);

    if stored.has_winner() {
        let unchanged = stored.first.participant_id == first.participant_id
            && stored.second.participant_id == second.participant_id
            && stored.first.is_winner == first.is_winner
            && stored.second.is_winner == second.is_winner
            && normalize_result(stored.first.result_text.as_deref()) == first.result_text
            && normalize_result(stored.second.result_text.as_deref()) == second.result_text;
        if !unchanged {
            return Err(BracketError::AlreadyDecided(stored.id));
        }
        return Ok(());
    }

    if first.is_winner && second.is_winner {
        return Err(BracketError::MultipleWinners(stored.id));
    }
    if [first, second]
        .iter()
        .any(|slot| slot.is_winner && slot.result_text.is_none())
    {
        return Err(BracketError::MissingResult(stored.id));
    }
    Ok(())
}

/// Validate a whole proposal inside an open transaction.
pub async fn validate_bracket(
    tx: &mut dyn StoreTx,
    tournament_id: TournamentId,
    proposed: &TournamentBracket,
    caller: Option<&Caller>,
) -> BracketResult<()> {
    if caller.is_none() {
        return Err(BracketError::Unauthenticated);
    }

    let mut seen = HashSet::with_capacity(proposed.matches.len());
    for game in &proposed.matches {
        if !seen.insert(game.id) {
            return Err(BracketError::DuplicateMatch(game.id));
        }
        let stored = tx
            .find_match(tournament_id, game.id)
            .await?
            .ok_or(BracketError::MatchNotFound(game.id))?;
        check_match(&stored, game)?;
    }
    Ok(())
}

/// Group decided matches by the match their winners advance into.
pub fn collect_advancements(updated: &[Match]) -> BTreeMap<MatchId, Vec<Advancement>> {
    let mut feeders: BTreeMap<MatchId, Vec<Advancement>> = BTreeMap::new();
    for game in updated {
        if let (Some(next), Some(winner)) = (game.next_match_id, game.confirmed_winner()) {
            feeders.entry(next).or_default().push(Advancement {
                match_id: game.id,
                winner,
            });
        }
    }
    feeders
}

/// Slot order in the next match: the feeder with the lower match id takes the first slot.
pub fn seat_order(a: Advancement, b: Advancement) -> (ParticipantId, ParticipantId) {
    if a.match_id <= b.match_id {
        (a.winner, b.winner)
    } else {
        (b.winner, a.winner)
    }
}

/// Persist a validated proposal and seat advancing winners. Runs inside the caller's transaction.
pub async fn commit_bracket(
    tx: &mut dyn StoreTx,
    tournament_id: TournamentId,
    proposed: &TournamentBracket,
) -> BracketResult<()> {
    let mut updated = Vec::with_capacity(proposed.matches.len());
    for game in &proposed.matches {
        let update = to_update(game)?;
        let row = tx
            .update_match(tournament_id, &update)
            .await?
            .ok_or(BracketError::MatchNotFound(game.id))?;
        updated.push(row);
    }

    for (next, feeders) in collect_advancements(&updated) {
        let (a, b) = match feeders.as_slice() {
            [a, b] => (*a, *b),
            [single] => {
                let sibling = tx
                    .sibling_feeder(next, single.match_id)
                    .await?
                    .and_then(|s| {
                        s.confirmed_winner().map(|winner| Advancement {
                            match_id: s.id,
                            winner,
                        })
                    });
                match sibling {
                    Some(other) => (*single, other),
                    None => {
                        log::debug!(
                            "Match {} waits for its second feeder before seating {}",
                            next,
                            single.winner
                        );
                        continue;
                    }
                }
            }
            _ => return Err(BracketError::CorruptBracket(next)),
        };
        let decided = tx
            .find_match(tournament_id, next)
            .await?
            .map(|m| m.has_winner())
            .ok_or(BracketError::CorruptBracket(next))?;
        if decided {
            log::debug!("Match {} is already decided, its seats stay as they are", next);
            continue;
        }
        let (first, second) = seat_order(a, b);
        tx.seat_participants(next, first, second).await?;
    }
    Ok(())
}

/// Validate and commit a proposed bracket in one transaction, then return the refreshed bracket.
pub async fn update_bracket(
    store: &dyn Store,
    tournament_id: TournamentId,
    proposed: &TournamentBracket,
    caller: Option<&Caller>,
) -> BracketResult<TournamentBracket> {
    if caller.is_none() {
        return Err(BracketError::Unauthenticated);
    }

    let mut tx = store.begin().await?;
    tx.lock_tournament(tournament_id)
        .await?
        .ok_or(BracketError::TournamentNotFound(tournament_id))?;

    if let Err(e) = validate_bracket(tx.as_mut(), tournament_id, proposed, caller).await {
        log::warn!("Rejected bracket edit for tournament {}: {}", tournament_id, e);
        return Err(e);
    }
    commit_bracket(tx.as_mut(), tournament_id, proposed).await?;
    tx.commit().await?;
    log::info!(
        "Committed {} match(es) for tournament {}",
        proposed.matches.len(),
        tournament_id
    );

    let mut tx = store.begin().await?;
    read_bracket(tx.as_mut(), tournament_id).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Slot;

    fn stored(first_winner: bool, first_text: Option<&str>) -> Match {
        Match {
            id: 5,
            stage_id: 1,
            name: "Match 1".to_string(),
            next_match_id: Some(7),
            first: Slot {
                participant_id: Some(1),
                result_text: first_text.map(str::to_string),
                is_winner: first_winner,
            },
            second: Slot {
                participant_id: Some(2),
                result_text: None,
                is_winner: false,
            },
            date: None,
        }
    }

    fn proposal(first: (bool, Option<&str>), second: (bool, Option<&str>)) -> BracketMatch {
        let side = |id, (is_winner, text): (bool, Option<&str>)| MatchParticipant {
            id: Some(id),
            result_text: text.map(str::to_string),
            is_winner,
            name: None,
        };
        BracketMatch {
            id: 5,
            name: "Match 1".to_string(),
            next_match_id: Some(7),
            tournament_round_text: "1".to_string(),
            date: None,
            participants: vec![side(1, first), side(2, second)],
        }
    }

    #[test]
    fn decided_match_is_frozen() {
        let m = stored(true, Some("3"));
        assert!(check_match(&m, &proposal((true, Some("3")), (false, None))).is_ok());
        assert!(matches!(
            check_match(&m, &proposal((false, Some("3")), (true, Some("4")))),
            Err(BracketError::AlreadyDecided(5))
        ));
        assert!(matches!(
            check_match(&m, &proposal((true, Some("2")), (false, None))),
            Err(BracketError::AlreadyDecided(5))
        ));
        assert!(matches!(
            check_match(&m, &proposal((true, Some("3")), (false, Some("1")))),
            Err(BracketError::AlreadyDecided(5))
        ));
    }

    #[test]
    fn decided_match_keeps_its_participants() {
        let m = stored(true, Some("3"));
        let mut swapped = proposal((true, Some("3")), (false, None));
        swapped.participants[0].id = Some(2);
        swapped.participants[1].id = Some(1);
        assert!(matches!(
            check_match(&m, &swapped),
            Err(BracketError::AlreadyDecided(5))
        ));
    }

    #[test]
    fn undecided_match_needs_one_winner_with_result() {
        let m = stored(false, None);
        assert!(check_match(&m, &proposal((false, Some("1")), (false, None))).is_ok());
        assert!(check_match(&m, &proposal((false, Some("1")), (true, Some("2")))).is_ok());
        assert!(matches!(
            check_match(&m, &proposal((true, Some("2")), (true, Some("2")))),
            Err(BracketError::MultipleWinners(5))
        ));
        assert!(matches!(
            check_match(&m, &proposal((true, None), (false, Some("1")))),
            Err(BracketError::MissingResult(5))
        ));
        assert!(matches!(
            check_match(&m, &proposal((true, Some("   ")), (false, None))),
            Err(BracketError::MissingResult(5))
        ));
    }

    #[test]
    fn proposal_needs_two_sides() {
        let mut p = proposal((false, None), (false, None));
        p.participants.pop();
        assert!(matches!(
            check_match(&stored(false, None), &p),
            Err(BracketError::MalformedMatch(5))
        ));
    }

    #[test]
    fn lower_feeder_takes_first_slot() {
        let early = Advancement { match_id: 3, winner: 40 };
        let late = Advancement { match_id: 4, winner: 10 };
        assert_eq!(seat_order(late, early), (40, 10));
        assert_eq!(seat_order(early, late), (40, 10));
    }
}
