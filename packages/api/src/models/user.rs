//! # User profile record
//!
//! The identity service owns credentials; the `users/{uid}` document owns
//! everything else about a member: how they log in (`username`), how they are
//! shown (`name`), what they may do ([`Role`]) and whether an admin has let them
//! in yet ([`UserStatus`]).
//!
//! Profiles are created at registration with `role = resident` and
//! `status = pending`. Only an admin moves a profile to `active`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use store::Record;

/// What a member may see and do.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    #[default]
    Resident,
    Admin,
    Association,
}

impl Role {
    /// Full CRUD and approval rights.
    pub fn is_admin(self) -> bool {
        matches!(self, Role::Admin)
    }

    /// Elevated read visibility: true house status, contact and occupants.
    pub fn is_privileged(self) -> bool {
        matches!(self, Role::Admin | Role::Association)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserStatus {
    /// Awaiting admin approval.
    #[default]
    Pending,
    Active,
}

/// A member profile, stored at `users/{uid}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub uid: String,
    pub email: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub role: Role,
    #[serde(default)]
    pub status: UserStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Record for User {
    const COLLECTION: &'static str = "users";
}

impl User {
    /// A freshly registered resident awaiting approval.
    pub fn new_resident(uid: String, email: String, username: String, name: String) -> Self {
        Self {
            uid,
            email,
            username,
            name,
            role: Role::Resident,
            status: UserStatus::Pending,
            created_at: Some(Utc::now()),
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == UserStatus::Active
    }

    /// Get display name, falling back to username and then email.
    pub fn display_name(&self) -> &str {
        if !self.name.trim().is_empty() {
            &self.name
        } else if !self.username.is_empty() {
            &self.username
        } else {
            &self.email
        }
    }
}
