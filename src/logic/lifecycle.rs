//! Tournament lifecycle: creation, editing, approval, deletion and participant requests.
//!
//! "Started" is not a stored state; a tournament is started once its stages exist.

use crate::error::{BracketError, BracketResult};
use crate::logic::builder::build_bracket;
use crate::models::{
    is_power_of_two, ApprovalState, Caller, Entrant, EntrantRefs, Participant, ParticipantId,
    ParticipantSummary, Tournament, TournamentDetails, TournamentId, TournamentState,
};
use crate::store::{Store, StoreTx};
use serde::{Deserialize, Serialize};

/// Tournament with its derived started flag and accepted participants.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TournamentOverview {
    #[serde(flatten)]
    pub tournament: Tournament,
    pub started: bool,
    pub participants: Vec<ParticipantSummary>,
}

/// Manager's answer to a participation request.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum Decision {
    Accept,
    Reject,
}

impl Decision {
    fn state(self) -> ApprovalState {
        match self {
            Decision::Accept => ApprovalState::Accepted,
            Decision::Reject => ApprovalState::Rejected,
        }
    }
}

pub fn validate_details(details: &TournamentDetails) -> BracketResult<()> {
    if details.capacity < 2 || !is_power_of_two(details.capacity as i64) {
        return Err(BracketError::InvalidCapacity(details.capacity));
    }
    if details.prize < 0 {
        return Err(BracketError::NegativePrize);
    }
    let sizes = [details.min_team_size, details.max_team_size];
    if sizes.iter().flatten().any(|&size| size < 1) {
        return Err(BracketError::InvalidTeamSizeRange);
    }
    if let (Some(min), Some(max)) = (details.min_team_size, details.max_team_size) {
        if min > max {
            return Err(BracketError::InvalidTeamSizeRange);
        }
    }
    Ok(())
}

fn require_caller(caller: Option<&Caller>) -> BracketResult<&Caller> {
    caller.ok_or(BracketError::Unauthenticated)
}

fn require_manager(caller: &Caller, tournament: &Tournament) -> BracketResult<()> {
    if caller.can_manage(tournament) {
        Ok(())
    } else {
        Err(BracketError::Forbidden("Only the tournament manager may do this"))
    }
}

async fn locked(tx: &mut dyn StoreTx, id: TournamentId) -> BracketResult<Tournament> {
    tx.lock_tournament(id)
        .await?
        .ok_or(BracketError::TournamentNotFound(id))
}

fn accepted_count(participants: &[Participant]) -> usize {
    participants
        .iter()
        .filter(|p| p.state == ApprovalState::Accepted)
        .count()
}

/// Create a tournament managed by the caller. It starts out `Pending`.
pub async fn create_tournament(
    store: &dyn Store,
    caller: Option<&Caller>,
    details: &TournamentDetails,
) -> BracketResult<Tournament> {
    let caller = require_caller(caller)?;
    validate_details(details)?;

    let mut tx = store.begin().await?;
    let tournament = tx.insert_tournament(caller.id, details).await?;
    tx.commit().await?;
    log::info!("User {} created tournament {}", caller.id, tournament.id);
    Ok(tournament)
}

pub async fn tournament_overview(
    store: &dyn Store,
    id: TournamentId,
) -> BracketResult<TournamentOverview> {
    let mut tx = store.begin().await?;
    let tournament = tx
        .tournament(id)
        .await?
        .ok_or(BracketError::TournamentNotFound(id))?;
    let started = tx.has_stages(id).await?;
    let mut names = tx.participant_names(id).await?;
    let participants = tx
        .participants(id)
        .await?
        .into_iter()
        .filter(|p| p.state == ApprovalState::Accepted)
        .map(|p| ParticipantSummary {
            id: p.id,
            entrant: p.entrant,
            name: names.remove(&p.id),
        })
        .collect();
    Ok(TournamentOverview {
        tournament,
        started,
        participants,
    })
}

/// Replace the editable details. Capacity and type are fixed once anyone has registered.
pub async fn update_tournament(
    store: &dyn Store,
    caller: Option<&Caller>,
    id: TournamentId,
    details: &TournamentDetails,
) -> BracketResult<Tournament> {
    let caller = require_caller(caller)?;
    validate_details(details)?;

    let mut tx = store.begin().await?;
    let mut tournament = locked(tx.as_mut(), id).await?;
    require_manager(caller, &tournament)?;
    if tx.has_stages(id).await? {
        return Err(BracketError::AlreadyStarted(id));
    }
    let current = &tournament.details;
    if (current.capacity != details.capacity || current.kind != details.kind)
        && !tx.participants(id).await?.is_empty()
    {
        return Err(BracketError::DetailsLocked);
    }

    tx.update_tournament(id, details).await?;
    tx.commit().await?;
    tournament.details = details.clone();
    Ok(tournament)
}

/// Decide whether `caller` may move `tournament` to `target`.
pub fn authorize_transition(
    tournament: &Tournament,
    caller: &Caller,
    target: TournamentState,
    started: bool,
) -> BracketResult<()> {
    if started && target != TournamentState::Accepted {
        return Err(BracketError::AlreadyStarted(tournament.id));
    }
    if caller.is_admin() {
        return Ok(());
    }
    if !tournament.is_managed_by(caller.id) {
        return Err(BracketError::Forbidden("Only the tournament manager may change its state"));
    }
    match (tournament.state, target) {
        (TournamentState::Pending, TournamentState::Accepted | TournamentState::Rejected) => Ok(()),
        (from, to) => Err(BracketError::InvalidTransition { from, to }),
    }
}

pub async fn change_state(
    store: &dyn Store,
    caller: Option<&Caller>,
    id: TournamentId,
    target: TournamentState,
) -> BracketResult<Tournament> {
    let caller = require_caller(caller)?;

    let mut tx = store.begin().await?;
    let mut tournament = locked(tx.as_mut(), id).await?;
    let started = tx.has_stages(id).await?;
    authorize_transition(&tournament, caller, target, started)?;

    tx.set_tournament_state(id, target).await?;
    tx.commit().await?;
    log::info!(
        "Tournament {} moved from {} to {} by user {}",
        id,
        tournament.state,
        target,
        caller.id
    );
    tournament.state = target;
    Ok(tournament)
}

/// Delete a rejected tournament together with everything that hangs off it.
pub async fn delete_tournament(
    store: &dyn Store,
    caller: Option<&Caller>,
    id: TournamentId,
) -> BracketResult<()> {
    let caller = require_caller(caller)?;

    let mut tx = store.begin().await?;
    let tournament = locked(tx.as_mut(), id).await?;
    require_manager(caller, &tournament)?;
    if tournament.state != TournamentState::Rejected {
        return Err(BracketError::NotDeletable);
    }
    tx.delete_tournament(id).await?;
    tx.commit().await?;
    log::info!("Tournament {} deleted by user {}", id, caller.id);
    Ok(())
}

/// Build the bracket on behalf of the manager or an admin.
pub async fn start_as(
    store: &dyn Store,
    caller: Option<&Caller>,
    id: TournamentId,
) -> BracketResult<()> {
    let caller = require_caller(caller)?;
    build_bracket(store, id, |tournament| require_manager(caller, tournament)).await
}

/// Register a team or player for an accepted tournament. The request starts `Pending`.
pub async fn request_participation(
    store: &dyn Store,
    caller: Option<&Caller>,
    id: TournamentId,
    refs: EntrantRefs,
) -> BracketResult<Participant> {
    let caller = require_caller(caller)?;

    let mut tx = store.begin().await?;
    let tournament = locked(tx.as_mut(), id).await?;
    if tournament.state != TournamentState::Accepted {
        return Err(BracketError::InvalidState {
            expected: TournamentState::Accepted,
            actual: tournament.state,
        });
    }
    if tx.has_stages(id).await? {
        return Err(BracketError::AlreadyStarted(id));
    }
    let entrant = Entrant::from_refs(tournament.details.kind, refs)
        .map_err(BracketError::InvalidEntrant)?;
    if let Entrant::Player(player_id) = entrant {
        if player_id != caller.id && !caller.is_admin() {
            return Err(BracketError::Forbidden("Players may only register themselves"));
        }
    }

    let existing = tx.participants(id).await?;
    if existing
        .iter()
        .any(|p| p.entrant == entrant && p.state != ApprovalState::Rejected)
    {
        return Err(BracketError::AlreadyRegistered);
    }
    if accepted_count(&existing) >= tournament.details.capacity as usize {
        return Err(BracketError::TournamentFull);
    }

    let participant = tx.insert_participant(id, entrant).await?;
    tx.commit().await?;
    log::info!(
        "User {} requested participation {} in tournament {}",
        caller.id,
        participant.id,
        id
    );
    Ok(participant)
}

/// Accept or reject a participation request.
pub async fn resolve_participant(
    store: &dyn Store,
    caller: Option<&Caller>,
    id: TournamentId,
    participant_id: ParticipantId,
    decision: Decision,
) -> BracketResult<Participant> {
    let caller = require_caller(caller)?;

    let mut tx = store.begin().await?;
    let tournament = locked(tx.as_mut(), id).await?;
    require_manager(caller, &tournament)?;
    if tx.has_stages(id).await? {
        return Err(BracketError::AlreadyStarted(id));
    }

    let participants = tx.participants(id).await?;
    let mut participant = participants
        .iter()
        .find(|p| p.id == participant_id)
        .cloned()
        .ok_or(BracketError::ParticipantNotFound(participant_id))?;
    let already_in = participant.state == ApprovalState::Accepted;
    if decision == Decision::Accept
        && !already_in
        && accepted_count(&participants) >= tournament.details.capacity as usize
    {
        return Err(BracketError::TournamentFull);
    }

    tx.set_participant_state(participant_id, decision.state()).await?;
    tx.commit().await?;
    participant.state = decision.state();
    Ok(participant)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TournamentKind;

    fn details(capacity: i32) -> TournamentDetails {
        TournamentDetails {
            name: "Spring Cup".to_string(),
            discipline: "Chess".to_string(),
            capacity,
            kind: TournamentKind::Person,
            prize: 0,
            min_team_size: None,
            max_team_size: None,
        }
    }

    fn tournament(state: TournamentState) -> Tournament {
        Tournament {
            id: 1,
            manager_id: 10,
            state,
            details: details(4),
        }
    }

    #[test]
    fn capacity_must_be_a_power_of_two() {
        assert!(validate_details(&details(2)).is_ok());
        assert!(validate_details(&details(16)).is_ok());
        for bad in [0, 1, 6, -4] {
            assert!(matches!(
                validate_details(&details(bad)),
                Err(BracketError::InvalidCapacity(_))
            ));
        }
    }

    #[test]
    fn team_size_range() {
        let mut d = details(4);
        d.min_team_size = Some(3);
        d.max_team_size = Some(2);
        assert!(matches!(validate_details(&d), Err(BracketError::InvalidTeamSizeRange)));
        d.max_team_size = Some(3);
        assert!(validate_details(&d).is_ok());
        d.min_team_size = Some(0);
        assert!(matches!(validate_details(&d), Err(BracketError::InvalidTeamSizeRange)));
        d.min_team_size = None;
        d.prize = -1;
        assert!(matches!(validate_details(&d), Err(BracketError::NegativePrize)));
    }

    #[test]
    fn manager_decides_pending_only() {
        let manager = Caller::user(10);
        let pending = tournament(TournamentState::Pending);
        assert!(authorize_transition(&pending, &manager, TournamentState::Accepted, false).is_ok());
        assert!(authorize_transition(&pending, &manager, TournamentState::Rejected, false).is_ok());

        let accepted = tournament(TournamentState::Accepted);
        assert!(matches!(
            authorize_transition(&accepted, &manager, TournamentState::Rejected, false),
            Err(BracketError::InvalidTransition { .. })
        ));
        assert!(matches!(
            authorize_transition(&pending, &Caller::user(11), TournamentState::Accepted, false),
            Err(BracketError::Forbidden(_))
        ));
    }

    #[test]
    fn admin_may_not_leave_accepted_once_started() {
        let admin = Caller::admin(99);
        let accepted = tournament(TournamentState::Accepted);
        assert!(authorize_transition(&accepted, &admin, TournamentState::Pending, false).is_ok());
        assert!(matches!(
            authorize_transition(&accepted, &admin, TournamentState::Rejected, true),
            Err(BracketError::AlreadyStarted(1))
        ));
    }
}
