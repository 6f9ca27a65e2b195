//! Data structures for the bracket engine: tournaments, participants, stages and matches.

mod bracket;
mod caller;
mod participant;
mod tournament;

pub use bracket::{
    normalize_result, BracketMatch, Match, MatchId, MatchParticipant, MatchUpdate, Slot, Stage,
    StageId, StagedMatch, TournamentBracket,
};
pub use caller::{Caller, Role};
pub use participant::{
    ApprovalState, Entrant, EntrantRefs, Participant, ParticipantId, ParticipantSummary, TeamId,
};
pub use tournament::{
    is_power_of_two, Tournament, TournamentDetails, TournamentId, TournamentKind,
    TournamentState, UserId,
};
