//! Single-elimination tournament bracket engine: models, store, business logic and REST API.

pub mod api;
pub mod config;
pub mod error;
pub mod logic;
pub mod models;
pub mod store;

pub use error::{BracketError, BracketResult, ErrorKind};
pub use logic::{
    change_state, create_tournament, delete_tournament, get_bracket, request_participation,
    resolve_participant, start_as, start_tournament, tournament_overview, update_bracket,
    update_tournament, Decision, TournamentOverview,
};
pub use models::{
    ApprovalState, BracketMatch, Caller, Entrant, EntrantRefs, MatchId, MatchParticipant,
    Participant, ParticipantId, Role, Tournament, TournamentBracket, TournamentDetails,
    TournamentId, TournamentKind, TournamentState,
};
pub use store::{MemoryStore, PgStore, Store, StoreError};
