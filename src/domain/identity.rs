// Copyright (c) 2025 - Cowboy AI, Inc.
//! Authenticated identity
//!
//! Tokens are parsed and verified outside this crate; the core only receives
//! the resulting user id and role.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Integer user id issued by the users service
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub i64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    Student,
}

/// Verified caller identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub user_id: UserId,
    pub role: Role,
}

impl Identity {
    pub const fn student(user_id: i64) -> Self {
        Self {
            user_id: UserId(user_id),
            role: Role::Student,
        }
    }

    pub const fn admin(user_id: i64) -> Self {
        Self {
            user_id: UserId(user_id),
            role: Role::Admin,
        }
    }

    /// Ids are assigned from 1 upwards; anything else did not come from a verified token
    pub const fn is_valid(&self) -> bool {
        self.user_id.0 > 0
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}
