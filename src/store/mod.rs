//! Relational store seam: transactional access to tournaments, participants, stages and matches.
//!
//! Every operation runs inside a [`StoreTx`]. Dropping a transaction without calling
//! [`StoreTx::commit`] rolls it back, so a failed operation never leaves partial writes.

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

use crate::models::{
    ApprovalState, Entrant, Match, MatchId, MatchUpdate, Participant, ParticipantId, StageId,
    StagedMatch, Tournament, TournamentDetails, TournamentId, TournamentState, UserId,
};
use async_trait::async_trait;
use std::collections::HashMap;
use thiserror::Error;

/// Store errors
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(sqlx::Error),

    /// A uniqueness constraint was violated, e.g. two concurrent bracket builds.
    #[error("Conflicting write: {0}")]
    Conflict(String),

    #[error("Migration error: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),

    /// A stored value could not be decoded into a domain type.
    #[error("Corrupt row: {0}")]
    Corrupt(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        let unique = e
            .as_database_error()
            .map(|d| d.is_unique_violation())
            .unwrap_or(false);
        if unique {
            StoreError::Conflict(e.to_string())
        } else {
            StoreError::Database(e)
        }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Entry point of a store: opens transactions.
#[async_trait]
pub trait Store: Send + Sync {
    async fn begin(&self) -> StoreResult<Box<dyn StoreTx>>;
}

/// One open transaction. All reads observe the transaction's own writes.
#[async_trait]
pub trait StoreTx: Send {
    // --- tournaments ---

    async fn insert_tournament(
        &mut self,
        manager_id: UserId,
        details: &TournamentDetails,
    ) -> StoreResult<Tournament>;

    async fn tournament(&mut self, id: TournamentId) -> StoreResult<Option<Tournament>>;

    /// Read a tournament and lock it until the transaction ends.
    async fn lock_tournament(&mut self, id: TournamentId) -> StoreResult<Option<Tournament>>;

    async fn update_tournament(
        &mut self,
        id: TournamentId,
        details: &TournamentDetails,
    ) -> StoreResult<()>;

    async fn set_tournament_state(
        &mut self,
        id: TournamentId,
        state: TournamentState,
    ) -> StoreResult<()>;

    /// Delete a tournament together with its participants, stages and matches.
    async fn delete_tournament(&mut self, id: TournamentId) -> StoreResult<()>;

    // --- participants ---

    /// All participants of a tournament, ascending by id.
    async fn participants(&mut self, tournament_id: TournamentId)
        -> StoreResult<Vec<Participant>>;

    async fn insert_participant(
        &mut self,
        tournament_id: TournamentId,
        entrant: Entrant,
    ) -> StoreResult<Participant>;

    async fn set_participant_state(
        &mut self,
        id: ParticipantId,
        state: ApprovalState,
    ) -> StoreResult<()>;

    /// Display names of the tournament's participants: team name, or the
    /// player's given and family name joined by a space.
    async fn participant_names(
        &mut self,
        tournament_id: TournamentId,
    ) -> StoreResult<HashMap<ParticipantId, String>>;

    // --- bracket ---

    async fn has_stages(&mut self, tournament_id: TournamentId) -> StoreResult<bool>;

    async fn insert_stage(&mut self, tournament_id: TournamentId, level: i32)
        -> StoreResult<StageId>;

    async fn insert_match(
        &mut self,
        stage_id: StageId,
        name: &str,
        first: Option<ParticipantId>,
        second: Option<ParticipantId>,
    ) -> StoreResult<MatchId>;

    /// Point every feeder match at `next`.
    async fn link_next_match(&mut self, feeders: &[MatchId], next: MatchId) -> StoreResult<()>;

    /// All matches of a tournament, ordered by stage then match id.
    async fn bracket_matches(&mut self, tournament_id: TournamentId)
        -> StoreResult<Vec<StagedMatch>>;

    /// A match, only if it belongs to the tournament.
    async fn find_match(
        &mut self,
        tournament_id: TournamentId,
        id: MatchId,
    ) -> StoreResult<Option<Match>>;

    /// Overwrite a match's editable columns, scoped to the tournament.
    /// Returns the row after the update, or `None` when it is not part of the tournament.
    async fn update_match(
        &mut self,
        tournament_id: TournamentId,
        update: &MatchUpdate,
    ) -> StoreResult<Option<Match>>;

    /// The other match whose winner advances into `next`.
    async fn sibling_feeder(&mut self, next: MatchId, exclude: MatchId)
        -> StoreResult<Option<Match>>;

    /// Fill both participant slots of a match, leaving results and winner flags untouched.
    async fn seat_participants(
        &mut self,
        id: MatchId,
        first: ParticipantId,
        second: ParticipantId,
    ) -> StoreResult<()>;

    async fn commit(self: Box<Self>) -> StoreResult<()>;
}
