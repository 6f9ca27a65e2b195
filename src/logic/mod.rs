//! Bracket engine operations: building, reading and editing brackets, and the tournament lifecycle.

mod builder;
mod editor;
mod lifecycle;
mod reader;

pub use builder::{plan_bracket, start_tournament, BracketPlan, PlannedMatch};
pub use editor::{
    check_match, collect_advancements, commit_bracket, seat_order, update_bracket,
    validate_bracket, Advancement,
};
pub use lifecycle::{
    authorize_transition, change_state, create_tournament, delete_tournament,
    request_participation, resolve_participant, start_as, tournament_overview,
    update_tournament, validate_details, Decision, TournamentOverview,
};
pub use reader::{get_bracket, render_match};
