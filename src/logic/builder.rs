//! Bracket builder: turns the accepted participants of a tournament into a
//! single-elimination tree of stages and matches.

use crate::error::{BracketError, BracketResult};
use crate::models::{
    is_power_of_two, ApprovalState, MatchId, ParticipantId, Tournament, TournamentId,
    TournamentState,
};
use crate::store::{Store, StoreTx};

/// A match to be created, before it has an id.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PlannedMatch {
    pub name: String,
    pub first: Option<ParticipantId>,
    pub second: Option<ParticipantId>,
}

/// Matches of every round; `rounds[0]` is stage level 1. Match `i` of a round
/// feeds match `i / 2` of the following round.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct BracketPlan {
    pub rounds: Vec<Vec<PlannedMatch>>,
}

impl BracketPlan {
    pub fn match_count(&self) -> usize {
        self.rounds.iter().map(Vec::len).sum()
    }
}

/// Sequential match names, numbered across all rounds.
struct MatchNames {
    issued: usize,
}

impl MatchNames {
    fn next(&mut self) -> String {
        self.issued += 1;
        format!("Match {}", self.issued)
    }
}

/// Lay out the bracket for the given seeds (in seeding order). First-round
/// pairs are consecutive seeds: (0, 1), (2, 3), ...
pub fn plan_bracket(seeds: &[ParticipantId]) -> BracketResult<BracketPlan> {
    if seeds.len() < 2 {
        return Err(BracketError::NotEnoughParticipants(seeds.len()));
    }
    if !is_power_of_two(seeds.len() as i64) {
        return Err(BracketError::ParticipantCountNotPowerOfTwo(seeds.len()));
    }

    let mut names = MatchNames { issued: 0 };
    let first_round: Vec<PlannedMatch> = seeds
        .chunks(2)
        .map(|pair| PlannedMatch {
            name: names.next(),
            first: Some(pair[0]),
            second: Some(pair[1]),
        })
        .collect();

    let mut rounds = vec![first_round];
    while let Some(previous) = rounds.last().filter(|r| r.len() > 1) {
        let size = previous.len() / 2;
        let round = (0..size)
            .map(|_| PlannedMatch {
                name: names.next(),
                first: None,
                second: None,
            })
            .collect();
        rounds.push(round);
    }

    Ok(BracketPlan { rounds })
}

/// Build and persist the bracket of a tournament.
///
/// Fails when the tournament is not `Accepted`, the bracket already exists, or the
/// accepted participant count is below two or not a power of two. Everything is
/// written in one transaction; a failure leaves no stage or match behind.
pub async fn start_tournament(store: &dyn Store, tournament_id: TournamentId) -> BracketResult<()> {
    build_bracket(store, tournament_id, |_| Ok(())).await
}

/// Like [`start_tournament`], with `authorize` run against the locked tournament row
/// before anything else is checked or written.
pub(crate) async fn build_bracket(
    store: &dyn Store,
    tournament_id: TournamentId,
    authorize: impl FnOnce(&Tournament) -> BracketResult<()>,
) -> BracketResult<()> {
    let mut tx = store.begin().await?;

    // Holding the row lock serializes concurrent starts: a later call sees the stages.
    let tournament = tx
        .lock_tournament(tournament_id)
        .await?
        .ok_or(BracketError::TournamentNotFound(tournament_id))?;
    authorize(&tournament)?;
    if tx.has_stages(tournament_id).await? {
        return Err(BracketError::AlreadyStarted(tournament_id));
    }
    if tournament.state != TournamentState::Accepted {
        return Err(BracketError::InvalidState {
            expected: TournamentState::Accepted,
            actual: tournament.state,
        });
    }

    let seeds: Vec<ParticipantId> = tx
        .participants(tournament_id)
        .await?
        .into_iter()
        .filter(|p| p.state == ApprovalState::Accepted)
        .map(|p| p.id)
        .collect();
    let plan = plan_bracket(&seeds)?;

    persist_plan(tx.as_mut(), tournament_id, &plan).await?;
    tx.commit().await?;

    log::info!(
        "Built bracket for tournament {}: {} matches across {} stages",
        tournament_id,
        plan.match_count(),
        plan.rounds.len()
    );
    Ok(())
}

async fn persist_plan(
    tx: &mut dyn StoreTx,
    tournament_id: TournamentId,
    plan: &BracketPlan,
) -> BracketResult<()> {
    let mut previous: Vec<MatchId> = Vec::new();
    for (index, round) in plan.rounds.iter().enumerate() {
        let level = index as i32 + 1;
        let stage_id = tx.insert_stage(tournament_id, level).await?;

        let mut current = Vec::with_capacity(round.len());
        for planned in round {
            let id = tx
                .insert_match(stage_id, &planned.name, planned.first, planned.second)
                .await?;
            current.push(id);
        }
        for (feeders, &next) in previous.chunks(2).zip(&current) {
            tx.link_next_match(feeders, next).await?;
        }
        previous = current;
    }
    Ok(())
}
