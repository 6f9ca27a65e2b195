//! Caller identity from the cookie session written by the authorization layer.

use crate::api::ApiError;
use crate::models::{Caller, Role, UserId};
use actix_session::Session;

pub const USER_ID_KEY: &str = "user_id";
pub const ROLE_KEY: &str = "role";

/// `None` when no user is logged in. A missing role means a regular user.
pub fn caller_from_session(session: &Session) -> Result<Option<Caller>, ApiError> {
    let id = session
        .get::<UserId>(USER_ID_KEY)
        .map_err(|_| ApiError::Session)?;
    let Some(id) = id else {
        return Ok(None);
    };
    let role = session
        .get::<Role>(ROLE_KEY)
        .map_err(|_| ApiError::Session)?
        .unwrap_or_default();
    Ok(Some(Caller { id, role }))
}

/// Store the caller in the session, as the authorization layer does on login.
pub fn remember_caller(session: &Session, caller: &Caller) -> Result<(), ApiError> {
    session
        .insert(USER_ID_KEY, caller.id)
        .and_then(|_| session.insert(ROLE_KEY, caller.role))
        .map_err(|_| ApiError::Session)
}
