//! First-class cache keys.
//!
//! The cache is keyed by filter criteria, never by offset, and never by an
//! ad-hoc string: each key is a value type computed by one pure function
//! from the list args, so the mutation coordinator can enumerate every
//! entry a changed row may affect deterministically.

use crate::ids::UserId;
use crate::models::{Project, UserProfile};

/// Cache key for project list queries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ProjectFilter {
    pub assigned_user_id: Option<UserId>,
    pub is_completed: Option<bool>,
}

impl ProjectFilter {
    /// The unfiltered key: every project, any status.
    pub fn unfiltered() -> Self {
        Self::default()
    }

    pub fn for_user(user_id: UserId, is_completed: bool) -> Self {
        Self {
            assigned_user_id: Some(user_id),
            is_completed: Some(is_completed),
        }
    }

    pub fn by_status(is_completed: bool) -> Self {
        Self {
            assigned_user_id: None,
            is_completed: Some(is_completed),
        }
    }

    /// Whether a row belongs in the result set this key describes.
    pub fn matches(&self, project: &Project) -> bool {
        if let Some(user_id) = self.assigned_user_id
            && project.assigned_user_id != user_id
        {
            return false;
        }
        if let Some(is_completed) = self.is_completed
            && project.is_completed != is_completed
        {
            return false;
        }
        true
    }
}

/// Cache key for user-profile list queries.
///
/// The search term is stored lowercased; the backend match is
/// case-insensitive (`ilike`), so membership checks are too.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ProfileFilter {
    search_email: Option<String>,
}

impl ProfileFilter {
    pub fn new(search_email: Option<&str>) -> Self {
        Self {
            search_email: search_email
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_lowercase),
        }
    }

    pub fn search_email(&self) -> Option<&str> {
        self.search_email.as_deref()
    }

    pub fn matches(&self, profile: &UserProfile) -> bool {
        match &self.search_email {
            Some(term) => profile.email.to_lowercase().contains(term),
            None => true,
        }
    }
}
