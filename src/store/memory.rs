//! In-memory store. A transaction holds the store lock and works on a copy of the
//! state; commit swaps the copy in, drop discards it.

use super::{Store, StoreError, StoreResult, StoreTx};
use crate::models::{
    ApprovalState, Entrant, Match, MatchId, MatchUpdate, Participant, ParticipantId, Slot, Stage,
    StageId, StagedMatch, TeamId, Tournament, TournamentDetails, TournamentId, TournamentState,
    UserId,
};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Player account as far as display names are concerned.
#[derive(Clone, Debug)]
struct Person {
    given_name: String,
    family_name: String,
}

#[derive(Clone, Debug, Default)]
struct MemoryState {
    tournaments: BTreeMap<TournamentId, Tournament>,
    participants: BTreeMap<ParticipantId, Participant>,
    stages: BTreeMap<StageId, Stage>,
    matches: BTreeMap<MatchId, Match>,
    teams: BTreeMap<TeamId, String>,
    users: BTreeMap<UserId, Person>,
    last_id: i32,
}

impl MemoryState {
    /// Ids come from one sequence so they ascend in creation order across tables.
    fn next_id(&mut self) -> i32 {
        self.last_id += 1;
        self.last_id
    }

    fn tournament_mut(&mut self, id: TournamentId) -> StoreResult<&mut Tournament> {
        self.tournaments
            .get_mut(&id)
            .ok_or_else(|| StoreError::Corrupt(format!("tournament {id} does not exist")))
    }

    fn match_mut(&mut self, id: MatchId) -> StoreResult<&mut Match> {
        self.matches
            .get_mut(&id)
            .ok_or_else(|| StoreError::Corrupt(format!("match {id} does not exist")))
    }

    fn stage_of(&self, game: &Match) -> Option<&Stage> {
        self.stages.get(&game.stage_id)
    }

    fn belongs_to(&self, game: &Match, tournament_id: TournamentId) -> bool {
        self.stage_of(game)
            .map(|s| s.tournament_id == tournament_id)
            .unwrap_or(false)
    }

    fn display_name(&self, entrant: Entrant) -> Option<String> {
        match entrant {
            Entrant::Team(id) => self.teams.get(&id).cloned(),
            Entrant::Player(id) => self
                .users
                .get(&id)
                .map(|p| format!("{} {}", p.given_name, p.family_name)),
        }
    }
}

/// Store kept entirely in process memory.
#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a team so its name can be shown in brackets.
    pub async fn add_team(&self, name: impl Into<String>) -> TeamId {
        let mut state = self.state.lock().await;
        let id = state.next_id();
        state.teams.insert(id, name.into());
        id
    }

    /// Register a player account so its name can be shown in brackets.
    pub async fn add_user(
        &self,
        given_name: impl Into<String>,
        family_name: impl Into<String>,
    ) -> UserId {
        let mut state = self.state.lock().await;
        let id = state.next_id();
        state.users.insert(
            id,
            Person {
                given_name: given_name.into(),
                family_name: family_name.into(),
            },
        );
        id
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn begin(&self) -> StoreResult<Box<dyn StoreTx>> {
        let guard = self.state.clone().lock_owned().await;
        let work = guard.clone();
        Ok(Box::new(MemoryTx { guard, work }))
    }
}

struct MemoryTx {
    guard: OwnedMutexGuard<MemoryState>,
    work: MemoryState,
}

#[async_trait]
impl StoreTx for MemoryTx {
    async fn insert_tournament(
        &mut self,
        manager_id: UserId,
        details: &TournamentDetails,
    ) -> StoreResult<Tournament> {
        let tournament = Tournament {
            id: self.work.next_id(),
            manager_id,
            state: TournamentState::Pending,
            details: details.clone(),
        };
        self.work.tournaments.insert(tournament.id, tournament.clone());
        Ok(tournament)
    }

    async fn tournament(&mut self, id: TournamentId) -> StoreResult<Option<Tournament>> {
        Ok(self.work.tournaments.get(&id).cloned())
    }

    async fn lock_tournament(&mut self, id: TournamentId) -> StoreResult<Option<Tournament>> {
        // The whole store is already locked for the lifetime of the transaction.
        self.tournament(id).await
    }

    async fn update_tournament(
        &mut self,
        id: TournamentId,
        details: &TournamentDetails,
    ) -> StoreResult<()> {
        self.work.tournament_mut(id)?.details = details.clone();
        Ok(())
    }

    async fn set_tournament_state(
        &mut self,
        id: TournamentId,
        state: TournamentState,
    ) -> StoreResult<()> {
        self.work.tournament_mut(id)?.state = state;
        Ok(())
    }

    async fn delete_tournament(&mut self, id: TournamentId) -> StoreResult<()> {
        let work = &mut self.work;
        work.tournaments.remove(&id);
        work.participants.retain(|_, p| p.tournament_id != id);
        let stage_ids: Vec<StageId> = work
            .stages
            .values()
            .filter(|s| s.tournament_id == id)
            .map(|s| s.id)
            .collect();
        work.matches.retain(|_, m| !stage_ids.contains(&m.stage_id));
        work.stages.retain(|_, s| s.tournament_id != id);
        Ok(())
    }

    async fn participants(
        &mut self,
        tournament_id: TournamentId,
    ) -> StoreResult<Vec<Participant>> {
        Ok(self
            .work
            .participants
            .values()
            .filter(|p| p.tournament_id == tournament_id)
            .cloned()
            .collect())
    }

    async fn insert_participant(
        &mut self,
        tournament_id: TournamentId,
        entrant: Entrant,
    ) -> StoreResult<Participant> {
        let participant = Participant {
            id: self.work.next_id(),
            tournament_id,
            entrant,
            state: ApprovalState::Pending,
        };
        self.work.participants.insert(participant.id, participant.clone());
        Ok(participant)
    }

    async fn set_participant_state(
        &mut self,
        id: ParticipantId,
        state: ApprovalState,
    ) -> StoreResult<()> {
        let participant = self
            .work
            .participants
            .get_mut(&id)
            .ok_or_else(|| StoreError::Corrupt(format!("participant {id} does not exist")))?;
        participant.state = state;
        Ok(())
    }

    async fn participant_names(
        &mut self,
        tournament_id: TournamentId,
    ) -> StoreResult<HashMap<ParticipantId, String>> {
        Ok(self
            .work
            .participants
            .values()
            .filter(|p| p.tournament_id == tournament_id)
            .filter_map(|p| self.work.display_name(p.entrant).map(|name| (p.id, name)))
            .collect())
    }

    async fn has_stages(&mut self, tournament_id: TournamentId) -> StoreResult<bool> {
        Ok(self
            .work
            .stages
            .values()
            .any(|s| s.tournament_id == tournament_id))
    }

    async fn insert_stage(
        &mut self,
        tournament_id: TournamentId,
        level: i32,
    ) -> StoreResult<StageId> {
        let duplicate = self
            .work
            .stages
            .values()
            .any(|s| s.tournament_id == tournament_id && s.level == level);
        if duplicate {
            return Err(StoreError::Conflict(format!(
                "stage {level} of tournament {tournament_id} already exists"
            )));
        }
        let id = self.work.next_id();
        self.work.stages.insert(
            id,
            Stage {
                id,
                tournament_id,
                level,
            },
        );
        Ok(id)
    }

    async fn insert_match(
        &mut self,
        stage_id: StageId,
        name: &str,
        first: Option<ParticipantId>,
        second: Option<ParticipantId>,
    ) -> StoreResult<MatchId> {
        if !self.work.stages.contains_key(&stage_id) {
            return Err(StoreError::Corrupt(format!("stage {stage_id} does not exist")));
        }
        let id = self.work.next_id();
        self.work.matches.insert(
            id,
            Match {
                id,
                stage_id,
                name: name.to_string(),
                next_match_id: None,
                first: Slot {
                    participant_id: first,
                    ..Slot::default()
                },
                second: Slot {
                    participant_id: second,
                    ..Slot::default()
                },
                date: None,
            },
        );
        Ok(id)
    }

    async fn link_next_match(&mut self, feeders: &[MatchId], next: MatchId) -> StoreResult<()> {
        for &id in feeders {
            self.work.match_mut(id)?.next_match_id = Some(next);
        }
        Ok(())
    }

    async fn bracket_matches(
        &mut self,
        tournament_id: TournamentId,
    ) -> StoreResult<Vec<StagedMatch>> {
        let mut rows: Vec<(StageId, StagedMatch)> = self
            .work
            .matches
            .values()
            .filter_map(|m| {
                let stage = self.work.stage_of(m)?;
                (stage.tournament_id == tournament_id).then(|| {
                    (
                        stage.id,
                        StagedMatch {
                            level: stage.level,
                            game: m.clone(),
                        },
                    )
                })
            })
            .collect();
        rows.sort_by_key(|(stage_id, staged)| (*stage_id, staged.game.id));
        Ok(rows.into_iter().map(|(_, staged)| staged).collect())
    }

    async fn find_match(
        &mut self,
        tournament_id: TournamentId,
        id: MatchId,
    ) -> StoreResult<Option<Match>> {
        Ok(self
            .work
            .matches
            .get(&id)
            .filter(|m| self.work.belongs_to(m, tournament_id))
            .cloned())
    }

    async fn update_match(
        &mut self,
        tournament_id: TournamentId,
        update: &MatchUpdate,
    ) -> StoreResult<Option<Match>> {
        let in_tournament = self
            .work
            .matches
            .get(&update.id)
            .map(|m| self.work.belongs_to(m, tournament_id))
            .unwrap_or(false);
        if !in_tournament {
            return Ok(None);
        }
        let game = self.work.match_mut(update.id)?;
        game.name = update.name.clone();
        game.date = update.date;
        game.first = update.first.clone();
        game.second = update.second.clone();
        Ok(Some(game.clone()))
    }

    async fn sibling_feeder(
        &mut self,
        next: MatchId,
        exclude: MatchId,
    ) -> StoreResult<Option<Match>> {
        Ok(self
            .work
            .matches
            .values()
            .find(|m| m.next_match_id == Some(next) && m.id != exclude)
            .cloned())
    }

    async fn seat_participants(
        &mut self,
        id: MatchId,
        first: ParticipantId,
        second: ParticipantId,
    ) -> StoreResult<()> {
        let game = self.work.match_mut(id)?;
        game.first.participant_id = Some(first);
        game.second.participant_id = Some(second);
        Ok(())
    }

    async fn commit(self: Box<Self>) -> StoreResult<()> {
        let MemoryTx { mut guard, work } = *self;
        *guard = work;
        Ok(())
    }
}
