//! Query arguments and mutation inputs.
//!
//! List arguments carry the offset/limit window on top of the filter
//! fields; the cache key is derived from the filter fields alone (see
//! [`crate::filter`]). All inputs are validated before any network call.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::ValidationError;
use crate::filter::{ProfileFilter, ProjectFilter};
use crate::ids::{ProjectId, UserId};
use crate::models::{Project, normalize_description};

/// Default page size for list queries.
pub const PAGE_SIZE_DEFAULT: u32 = 5;

/// Hard cap on the page size accepted from callers.
pub const PAGE_SIZE_MAX: u32 = 50;

fn validate_limit(limit: u32, issues: &mut ValidationError) {
    if limit == 0 || limit > PAGE_SIZE_MAX {
        issues.push(format!("Limit must be between 1 and {PAGE_SIZE_MAX}"));
    }
}

/// Arguments for the project list query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListProjectsArgs {
    pub assigned_user_id: Option<UserId>,
    pub is_completed: Option<bool>,
    pub offset: u32,
    pub limit: u32,
}

impl ListProjectsArgs {
    /// First page of the given filter at the default page size.
    pub fn first_page(assigned_user_id: Option<UserId>, is_completed: Option<bool>) -> Self {
        Self {
            assigned_user_id,
            is_completed,
            offset: 0,
            limit: PAGE_SIZE_DEFAULT,
        }
    }

    /// Same filter, different window.
    pub fn at_offset(&self, offset: u32) -> Self {
        Self { offset, ..*self }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut issues = ValidationError::empty();
        validate_limit(self.limit, &mut issues);
        issues.into_result()
    }

    /// The cache key: filter criteria excluding the window.
    pub fn filter(&self) -> ProjectFilter {
        ProjectFilter {
            assigned_user_id: self.assigned_user_id,
            is_completed: self.is_completed,
        }
    }
}

/// Arguments for the user-profile list query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListUserProfilesArgs {
    pub search_email: Option<String>,
    pub offset: u32,
    pub limit: u32,
}

impl ListUserProfilesArgs {
    pub fn first_page(search_email: Option<String>) -> Self {
        Self {
            search_email,
            offset: 0,
            limit: PAGE_SIZE_DEFAULT,
        }
    }

    pub fn at_offset(&self, offset: u32) -> Self {
        Self {
            search_email: self.search_email.clone(),
            offset,
            limit: self.limit,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut issues = ValidationError::empty();
        validate_limit(self.limit, &mut issues);
        issues.into_result()
    }

    /// The search term that actually applies: trimmed, blank collapses to
    /// no filter at all.
    pub fn effective_search(&self) -> Option<&str> {
        self.search_email
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    pub fn filter(&self) -> ProfileFilter {
        ProfileFilter::new(self.effective_search())
    }
}

/// Input to the project create path.
///
/// Assignment is required at creation; the status and provenance flags are
/// not part of the input and are forced server-side to `false` / `true`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreateProjectInput {
    pub assigned_user_id: UserId,
    pub title: String,
    pub description: Option<String>,
}

impl CreateProjectInput {
    /// Trim and validate, returning the canonical form sent to the wire.
    pub fn normalized(self) -> Result<Self, ValidationError> {
        let title = self.title.trim().to_string();
        if title.is_empty() {
            return Err(ValidationError::new("Title cannot be empty"));
        }
        Ok(Self {
            assigned_user_id: self.assigned_user_id,
            title,
            description: normalize_description(self.description),
        })
    }
}

/// A partial update to a project row.
///
/// Absent fields are untouched. `description` distinguishes "leave alone"
/// (`None`) from "set or clear" (`Some(..)`); a blank new value clears.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProjectPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_user_id: Option<UserId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_completed: Option<bool>,
}

impl ProjectPatch {
    /// Patch that reassigns the project to another user.
    pub fn reassign(user_id: UserId) -> Self {
        Self {
            assigned_user_id: Some(user_id),
            ..Self::default()
        }
    }

    /// Patch that toggles the completion status.
    pub fn set_completed(is_completed: bool) -> Self {
        Self {
            is_completed: Some(is_completed),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.assigned_user_id.is_none()
            && self.title.is_none()
            && self.description.is_none()
            && self.is_completed.is_none()
    }

    /// Trim and validate. A patch with zero fields is a contract violation
    /// and is rejected here, before any network call.
    pub fn normalized(self) -> Result<Self, ValidationError> {
        if self.is_empty() {
            return Err(ValidationError::new("Nothing to update"));
        }
        let title = match self.title {
            Some(t) => {
                let trimmed = t.trim().to_string();
                if trimmed.is_empty() {
                    return Err(ValidationError::new("Title cannot be empty"));
                }
                Some(trimmed)
            }
            None => None,
        };
        Ok(Self {
            assigned_user_id: self.assigned_user_id,
            title,
            description: self.description.map(normalize_description),
            is_completed: self.is_completed,
        })
    }

    /// Apply the patched fields onto a resident row. Timestamps are the
    /// caller's business.
    pub fn apply_to(&self, project: &mut Project) {
        if let Some(user_id) = self.assigned_user_id {
            project.assigned_user_id = user_id;
        }
        if let Some(title) = &self.title {
            project.title = title.clone();
        }
        if let Some(description) = &self.description {
            project.description = description.clone();
        }
        if let Some(is_completed) = self.is_completed {
            project.is_completed = is_completed;
        }
    }
}

/// Last-known state of a project, minus its id.
///
/// Callers that initiate an optimistic update pass this alongside the
/// patch so the coordinator can decide cache-entry membership without a
/// lookup, and can construct a best-effort row for entries the project is
/// moving into.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectSnapshot {
    pub assigned_user_id: UserId,
    pub title: String,
    pub description: Option<String>,
    pub is_completed: bool,
    pub created_by_admin: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ProjectSnapshot {
    /// Reconstitute the row this snapshot was taken from.
    pub fn as_project(&self, id: ProjectId) -> Project {
        Project {
            id,
            assigned_user_id: self.assigned_user_id,
            title: self.title.clone(),
            description: self.description.clone(),
            is_completed: self.is_completed,
            created_by_admin: self.created_by_admin,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }

    /// Best-effort row after the patch lands: snapshot merged with the
    /// patched fields, `updated_at` bumped to the supplied instant.
    pub fn merged_with(&self, id: ProjectId, patch: &ProjectPatch, now: DateTime<Utc>) -> Project {
        let mut project = self.as_project(id);
        patch.apply_to(&mut project);
        project.updated_at = now;
        project
    }
}

impl From<&Project> for ProjectSnapshot {
    fn from(p: &Project) -> Self {
        Self {
            assigned_user_id: p.assigned_user_id,
            title: p.title.clone(),
            description: p.description.clone(),
            is_completed: p.is_completed,
            created_by_admin: p.created_by_admin,
            created_at: p.created_at,
            updated_at: p.updated_at,
        }
    }
}
