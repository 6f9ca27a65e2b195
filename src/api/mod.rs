//! REST API: tournaments, participation requests and brackets.
//!
//! Handlers expect the store as `Data<dyn Store>` and a cookie session carrying the caller.

mod error;
mod session;

pub use error::ApiError;
pub use session::{caller_from_session, remember_caller, ROLE_KEY, USER_ID_KEY};

use crate::logic::{self, Decision};
use crate::models::{
    EntrantRefs, ParticipantId, TournamentBracket, TournamentDetails, TournamentId,
    TournamentState,
};
use crate::store::Store;
use actix_session::Session;
use actix_web::{
    delete, get, post, put,
    web::{self, Data, Json, Path},
    HttpResponse, Responder,
};
use serde::{Deserialize, Serialize};

type StoreData = Data<dyn Store>;

#[derive(Serialize)]
struct HealthResponse {
    ok: bool,
    service: &'static str,
}

#[derive(Deserialize)]
struct StateBody {
    state: TournamentState,
}

#[derive(Deserialize)]
struct DecisionBody {
    decision: Decision,
}

/// Path segment: tournament id (e.g. /api/tournaments/{id})
#[derive(Deserialize)]
struct TournamentPath {
    id: TournamentId,
}

/// Path segments: tournament id and participant id
#[derive(Deserialize)]
struct ParticipantPath {
    id: TournamentId,
    pid: ParticipantId,
}

#[get("/api/health")]
async fn api_health() -> impl Responder {
    HttpResponse::Ok().json(HealthResponse {
        ok: true,
        service: "tournament-bracket",
    })
}

#[post("/api/tournaments")]
async fn api_create_tournament(
    store: StoreData,
    session: Session,
    body: Json<TournamentDetails>,
) -> Result<HttpResponse, ApiError> {
    let caller = caller_from_session(&session)?;
    let tournament = logic::create_tournament(&**store, caller.as_ref(), &body).await?;
    Ok(HttpResponse::Created().json(tournament))
}

/// Tournament details with its accepted participants.
#[get("/api/tournaments/{id}")]
async fn api_get_tournament(
    store: StoreData,
    path: Path<TournamentPath>,
) -> Result<HttpResponse, ApiError> {
    let overview = logic::tournament_overview(&**store, path.id).await?;
    Ok(HttpResponse::Ok().json(overview))
}

#[put("/api/tournaments/{id}")]
async fn api_update_tournament(
    store: StoreData,
    session: Session,
    path: Path<TournamentPath>,
    body: Json<TournamentDetails>,
) -> Result<HttpResponse, ApiError> {
    let caller = caller_from_session(&session)?;
    let tournament = logic::update_tournament(&**store, caller.as_ref(), path.id, &body).await?;
    Ok(HttpResponse::Ok().json(tournament))
}

#[delete("/api/tournaments/{id}")]
async fn api_delete_tournament(
    store: StoreData,
    session: Session,
    path: Path<TournamentPath>,
) -> Result<HttpResponse, ApiError> {
    let caller = caller_from_session(&session)?;
    logic::delete_tournament(&**store, caller.as_ref(), path.id).await?;
    Ok(HttpResponse::NoContent().finish())
}

#[put("/api/tournaments/{id}/state")]
async fn api_change_state(
    store: StoreData,
    session: Session,
    path: Path<TournamentPath>,
    body: Json<StateBody>,
) -> Result<HttpResponse, ApiError> {
    let caller = caller_from_session(&session)?;
    let tournament = logic::change_state(&**store, caller.as_ref(), path.id, body.state).await?;
    Ok(HttpResponse::Ok().json(tournament))
}

#[post("/api/tournaments/{id}/participants")]
async fn api_request_participation(
    store: StoreData,
    session: Session,
    path: Path<TournamentPath>,
    body: Json<EntrantRefs>,
) -> Result<HttpResponse, ApiError> {
    let caller = caller_from_session(&session)?;
    let participant =
        logic::request_participation(&**store, caller.as_ref(), path.id, body.into_inner()).await?;
    Ok(HttpResponse::Created().json(participant))
}

#[put("/api/tournaments/{id}/participants/{pid}")]
async fn api_resolve_participant(
    store: StoreData,
    session: Session,
    path: Path<ParticipantPath>,
    body: Json<DecisionBody>,
) -> Result<HttpResponse, ApiError> {
    let caller = caller_from_session(&session)?;
    let participant =
        logic::resolve_participant(&**store, caller.as_ref(), path.id, path.pid, body.decision)
            .await?;
    Ok(HttpResponse::Ok().json(participant))
}

/// Build the bracket; responds with the freshly built bracket.
#[post("/api/tournaments/{id}/start")]
async fn api_start_tournament(
    store: StoreData,
    session: Session,
    path: Path<TournamentPath>,
) -> Result<HttpResponse, ApiError> {
    let caller = caller_from_session(&session)?;
    logic::start_as(&**store, caller.as_ref(), path.id).await?;
    let bracket = logic::get_bracket(&**store, path.id).await?;
    Ok(HttpResponse::Ok().json(bracket))
}

#[get("/api/tournaments/{id}/bracket")]
async fn api_get_bracket(
    store: StoreData,
    path: Path<TournamentPath>,
) -> Result<HttpResponse, ApiError> {
    let bracket = logic::get_bracket(&**store, path.id).await?;
    Ok(HttpResponse::Ok().json(bracket))
}

/// Submit the full bracket; only changes that respect decided results are accepted.
#[put("/api/tournaments/{id}/bracket")]
async fn api_update_bracket(
    store: StoreData,
    session: Session,
    path: Path<TournamentPath>,
    body: Json<TournamentBracket>,
) -> Result<HttpResponse, ApiError> {
    let caller = caller_from_session(&session)?;
    let bracket = logic::update_bracket(&**store, path.id, &body, caller.as_ref()).await?;
    Ok(HttpResponse::Ok().json(bracket))
}

/// Register every API route.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(api_health)
        .service(api_create_tournament)
        .service(api_get_tournament)
        .service(api_update_tournament)
        .service(api_delete_tournament)
        .service(api_change_state)
        .service(api_request_participation)
        .service(api_resolve_participant)
        .service(api_start_tournament)
        .service(api_get_bracket)
        .service(api_update_bracket);
}
