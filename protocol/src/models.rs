//! Row types as stored by the backend, plus their validation rules.
//!
//! Every record inbound from the gateway is validated before it is
//! admitted into the cache; a single malformed row fails the whole fetch.

use std::sync::OnceLock;

use chrono::{DateTime, Utc};
use regex_lite::Regex;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::ids::{ProjectId, UserId};

fn email_regex() -> &'static Regex {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL.get_or_init(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("static pattern"))
}

/// A row type with a stable identifier and a validation rule.
///
/// The cache is generic over this: merging dedups by `id`, and every row
/// returned by the gateway passes through `validate` on the way in.
pub trait Entity {
    type Id: Copy + Eq + std::hash::Hash;

    fn id(&self) -> Self::Id;
    fn validate(&self) -> Result<(), ValidationError>;
}

/// An account profile. Created by the identity collaborator on signup;
/// read-only from this layer's perspective.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: UserId,
    pub full_name: Option<String>,
    pub email: String,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Entity for UserProfile {
    type Id = UserId;

    fn id(&self) -> UserId {
        self.id
    }

    fn validate(&self) -> Result<(), ValidationError> {
        let mut issues = ValidationError::empty();
        if !email_regex().is_match(&self.email) {
            issues.push("Email must be a valid address");
        }
        if self.updated_at < self.created_at {
            issues.push("updated_at must not precede created_at");
        }
        issues.into_result()
    }
}

/// A project assigned to exactly one user.
///
/// Assignment is required from creation onward; rows are created through
/// the mutation coordinator with `is_completed = false` and
/// `created_by_admin = true`, and are never deleted by this layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: ProjectId,
    pub assigned_user_id: UserId,
    pub title: String,
    pub description: Option<String>,
    pub is_completed: bool,
    pub created_by_admin: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Entity for Project {
    type Id = ProjectId;

    fn id(&self) -> ProjectId {
        self.id
    }

    fn validate(&self) -> Result<(), ValidationError> {
        let mut issues = ValidationError::empty();
        if self.title.trim().is_empty() {
            issues.push("Title cannot be empty");
        }
        if self.updated_at < self.created_at {
            issues.push("updated_at must not precede created_at");
        }
        issues.into_result()
    }
}

/// Normalize a free-form description: trimmed, blank collapses to `None`.
pub fn normalize_description(description: Option<String>) -> Option<String> {
    description.and_then(|d| {
        let trimmed = d.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}
