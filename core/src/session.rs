//! Session context.
//!
//! The explicit context object that replaces a process-wide store: one
//! `Session` owns the gateway handle, both query caches, the drag/lock
//! state, and the config, and is passed to whatever drives the UI. Built
//! at application start, torn down at sign-out.

use std::sync::Arc;

use boardsync_protocol::{
    Entity, ListProjectsArgs, ListUserProfilesArgs, Page, Project, UserId, UserProfile,
    ValidationError,
};
use tracing::info;

use crate::cache::{ProfileCache, ProjectCache};
use crate::config::SyncConfig;
use crate::coordinator::MutationCoordinator;
use crate::dnd::DragBoard;
use crate::error::SyncResult;
use crate::gateway::DataGateway;

/// Outcome of session bootstrap: who is signed in, and their profile row
/// if one exists yet. No session at all is `(None, None)`, not an error.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthBootstrap {
    pub user_id: Option<UserId>,
    pub profile: Option<UserProfile>,
}

/// Shared state for one signed-in (or signing-in) session.
pub struct Session<G> {
    gateway: Arc<G>,
    projects: Arc<ProjectCache>,
    profiles: Arc<ProfileCache>,
    drag: DragBoard,
    config: SyncConfig,
}

impl<G> Clone for Session<G> {
    fn clone(&self) -> Self {
        Self {
            gateway: Arc::clone(&self.gateway),
            projects: Arc::clone(&self.projects),
            profiles: Arc::clone(&self.profiles),
            drag: self.drag.clone(),
            config: self.config,
        }
    }
}

impl<G: DataGateway> Session<G> {
    pub fn new(gateway: Arc<G>, config: SyncConfig) -> Self {
        Self {
            gateway,
            projects: Arc::new(ProjectCache::new()),
            profiles: Arc::new(ProfileCache::new()),
            drag: DragBoard::new(),
            config,
        }
    }

    pub fn with_defaults(gateway: Arc<G>) -> Self {
        Self::new(gateway, SyncConfig::default())
    }

    pub fn config(&self) -> SyncConfig {
        self.config
    }

    pub fn projects(&self) -> &Arc<ProjectCache> {
        &self.projects
    }

    pub fn profiles(&self) -> &Arc<ProfileCache> {
        &self.profiles
    }

    pub fn drag(&self) -> &DragBoard {
        &self.drag
    }

    /// A coordinator wired to this session's gateway and project cache.
    pub fn coordinator(&self) -> MutationCoordinator<G> {
        MutationCoordinator::new(Arc::clone(&self.gateway), Arc::clone(&self.projects))
    }

    /// Resolve the signed-in user and their profile.
    pub async fn bootstrap(&self) -> SyncResult<AuthBootstrap> {
        let Some(user_id) = self.gateway.current_user_id().await? else {
            return Ok(AuthBootstrap {
                user_id: None,
                profile: None,
            });
        };
        let profile = self.gateway.profile(user_id).await?;
        if let Some(profile) = &profile {
            profile.validate()?;
        }
        info!(user = %user_id, "session bootstrapped");
        Ok(AuthBootstrap {
            user_id: Some(user_id),
            profile,
        })
    }

    /// Sign out and tear the session state down: every cache entry keyed
    /// to this identity is dropped and the drag machine returns to idle.
    pub async fn sign_out(&self) -> SyncResult<()> {
        self.gateway.sign_out().await?;
        self.projects.clear();
        self.profiles.clear();
        self.drag.reset();
        info!("signed out, session state cleared");
        Ok(())
    }

    /// Fetch one page of projects through the cache.
    pub async fn list_projects(&self, args: &ListProjectsArgs) -> SyncResult<Page<Project>> {
        args.validate()?;
        self.check_limit(args.limit)?;
        let gateway = Arc::clone(&self.gateway);
        let call_args = args.clone();
        self.projects
            .fetch_page(args.filter(), args.offset, args.limit, move || async move {
                gateway.list_projects(&call_args).await
            })
            .await
    }

    /// Fetch one page of user profiles through the cache.
    pub async fn list_user_profiles(
        &self,
        args: &ListUserProfilesArgs,
    ) -> SyncResult<Page<UserProfile>> {
        args.validate()?;
        self.check_limit(args.limit)?;
        let gateway = Arc::clone(&self.gateway);
        let call_args = args.clone();
        self.profiles
            .fetch_page(args.filter(), args.offset, args.limit, move || async move {
                gateway.list_user_profiles(&call_args).await
            })
            .await
    }

    fn check_limit(&self, limit: u32) -> Result<(), ValidationError> {
        if limit > self.config.max_page_size {
            return Err(ValidationError::new(format!(
                "Limit must not exceed {}",
                self.config.max_page_size
            )));
        }
        Ok(())
    }
}
