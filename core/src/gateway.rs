//! The remote data gateway contract.
//!
//! Everything the core needs from the backend-as-a-service, expressed as
//! one async trait so the sync layer never sees a wire format. The real
//! implementation lives in `boardsync-backend-client`; tests substitute
//! an in-memory one.

use async_trait::async_trait;
use boardsync_protocol::{
    CreateProjectInput, ListProjectsArgs, ListUserProfilesArgs, Project, ProjectId, ProjectPatch,
    UserId, UserProfile,
};
use thiserror::Error;

/// Result type for gateway calls.
pub type GatewayResult<T> = Result<T, GatewayError>;

/// A remote call failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    /// The backend rejected the request. The message is the backend's own,
    /// passed through verbatim for presentation.
    #[error("{message}")]
    Remote {
        status: Option<u16>,
        message: String,
    },

    /// The request never produced a backend response.
    #[error("network error: {0}")]
    Network(String),
}

impl GatewayError {
    pub fn remote(status: impl Into<Option<u16>>, message: impl Into<String>) -> Self {
        Self::Remote {
            status: status.into(),
            message: message.into(),
        }
    }
}

/// Interface to the remote store.
///
/// List results are ordered by creation time descending. Rows returned
/// here are raw; the caller validates them before admitting them anywhere.
#[async_trait]
pub trait DataGateway: Send + Sync {
    /// Id of the signed-in user, or `None` without a session.
    async fn current_user_id(&self) -> GatewayResult<Option<UserId>>;

    /// Profile row for a user, or `None` when no row exists yet.
    async fn profile(&self, user_id: UserId) -> GatewayResult<Option<UserProfile>>;

    async fn list_user_profiles(
        &self,
        args: &ListUserProfilesArgs,
    ) -> GatewayResult<Vec<UserProfile>>;

    async fn list_projects(&self, args: &ListProjectsArgs) -> GatewayResult<Vec<Project>>;

    /// Insert a project and return the authoritative row.
    async fn insert_project(&self, input: &CreateProjectInput) -> GatewayResult<Project>;

    /// Apply a partial patch and return the authoritative row.
    async fn update_project(&self, id: ProjectId, patch: &ProjectPatch) -> GatewayResult<Project>;

    async fn sign_out(&self) -> GatewayResult<()>;
}
