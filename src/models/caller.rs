//! Caller identity supplied by the authorization layer.

use crate::models::tournament::{Tournament, UserId};
use serde::{Deserialize, Serialize};

/// Role of an authenticated user.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub enum Role {
    #[default]
    User,
    Admin,
}

/// An authenticated caller.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Caller {
    pub id: UserId,
    pub role: Role,
}

impl Caller {
    pub fn user(id: UserId) -> Self {
        Self { id, role: Role::User }
    }

    pub fn admin(id: UserId) -> Self {
        Self { id, role: Role::Admin }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Managers and admins may manage a tournament.
    pub fn can_manage(&self, tournament: &Tournament) -> bool {
        self.is_admin() || tournament.is_managed_by(self.id)
    }
}
