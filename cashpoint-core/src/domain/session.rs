//! Authenticated session

use serde::Serialize;

use super::account::Role;

/// The account currently using the machine
///
/// The role is a snapshot taken at login. Admin-only operations re-check
/// the live account, so a demotion takes effect immediately.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Session {
    pub username: String,
    pub role: Role,
}

impl Session {
    pub fn new(username: impl Into<String>, role: Role) -> Self {
        Self {
            username: username.into(),
            role,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }
}
