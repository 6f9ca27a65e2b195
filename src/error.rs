//! Errors of bracket and tournament operations.

use crate::models::{MatchId, ParticipantId, TournamentId, TournamentState};
use crate::store::StoreError;
use thiserror::Error;

/// Broad failure classes; the request layer maps each to a status code.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorKind {
    /// Wrong lifecycle state or participant count.
    PreconditionFailed,
    /// Tournament, match or participant absent (or outside the tournament).
    NotFound,
    /// Proposed bracket edit breaks immutability or winner/result consistency.
    ValidationRejected,
    /// The bracket was already built, possibly by a concurrent call.
    Conflict,
    Unauthenticated,
    Forbidden,
    /// Store failure.
    Internal,
}

/// Errors that can occur during tournament and bracket operations.
#[derive(Debug, Error)]
pub enum BracketError {
    #[error("Tournament {0} not found")]
    TournamentNotFound(TournamentId),

    #[error("Match {0} not found in this tournament")]
    MatchNotFound(MatchId),

    #[error("Participant {0} not found in this tournament")]
    ParticipantNotFound(ParticipantId),

    #[error("Tournament is {actual}, expected {expected}")]
    InvalidState {
        expected: TournamentState,
        actual: TournamentState,
    },

    #[error("Cannot change tournament state from {from} to {to}")]
    InvalidTransition {
        from: TournamentState,
        to: TournamentState,
    },

    #[error("Tournament {0} has already been started")]
    AlreadyStarted(TournamentId),

    #[error("At least two accepted participants are required, found {0}")]
    NotEnoughParticipants(usize),

    #[error("The number of accepted participants must be a power of two, found {0}")]
    ParticipantCountNotPowerOfTwo(usize),

    #[error("Capacity must be a power of two of at least 2, got {0}")]
    InvalidCapacity(i32),

    #[error("Invalid range for team size constraint")]
    InvalidTeamSizeRange,

    #[error("Prize must not be negative")]
    NegativePrize,

    #[error("Capacity and type cannot change once participants exist")]
    DetailsLocked,

    #[error("{0}")]
    InvalidEntrant(String),

    #[error("Entrant is already registered for this tournament")]
    AlreadyRegistered,

    #[error("Tournament is full")]
    TournamentFull,

    #[error("Only rejected tournaments can be deleted")]
    NotDeletable,

    #[error("Authentication required")]
    Unauthenticated,

    #[error("{0}")]
    Forbidden(&'static str),

    #[error("Match {0} already has a winner, its result cannot be changed")]
    AlreadyDecided(MatchId),

    #[error("Match {0} cannot have two winners")]
    MultipleWinners(MatchId),

    #[error("Match {0}: the winner's result must be specified")]
    MissingResult(MatchId),

    #[error("Match {0} must list exactly two participants")]
    MalformedMatch(MatchId),

    #[error("Match {0} is listed more than once")]
    DuplicateMatch(MatchId),

    #[error("Bracket is inconsistent around match {0}")]
    CorruptBracket(MatchId),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl BracketError {
    pub fn kind(&self) -> ErrorKind {
        use BracketError::*;
        match self {
            TournamentNotFound(_) | MatchNotFound(_) | ParticipantNotFound(_) => {
                ErrorKind::NotFound
            }
            InvalidState { .. }
            | InvalidTransition { .. }
            | NotEnoughParticipants(_)
            | ParticipantCountNotPowerOfTwo(_)
            | InvalidCapacity(_)
            | InvalidTeamSizeRange
            | NegativePrize
            | DetailsLocked
            | InvalidEntrant(_)
            | AlreadyRegistered
            | TournamentFull
            | NotDeletable => ErrorKind::PreconditionFailed,
            AlreadyStarted(_) => ErrorKind::Conflict,
            Unauthenticated => ErrorKind::Unauthenticated,
            Forbidden(_) => ErrorKind::Forbidden,
            AlreadyDecided(_)
            | MultipleWinners(_)
            | MissingResult(_)
            | MalformedMatch(_)
            | DuplicateMatch(_) => ErrorKind::ValidationRejected,
            CorruptBracket(_) => ErrorKind::Internal,
            Store(StoreError::Conflict(_)) => ErrorKind::Conflict,
            Store(_) => ErrorKind::Internal,
        }
    }
}

pub type BracketResult<T> = Result<T, BracketError>;
