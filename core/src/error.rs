//! Error taxonomy for cache and mutation operations.
//!
//! Guard rejections from the drag state machine are deliberately not part
//! of this taxonomy; they are informational no-ops, not failures (see
//! [`crate::dnd::GuardRejection`]).

use boardsync_protocol::ValidationError;
use thiserror::Error;

use crate::gateway::GatewayError;

/// Result type for cache and mutation operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// A fetch or mutation failed.
///
/// Whatever the path, the cache is never left partially applied: every
/// optimistic apply has a matching rollback that ran before this error
/// reached the caller.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SyncError {
    /// A row from the gateway or a caller-supplied input failed schema
    /// validation. Never retried; the message lists the failing
    /// constraints.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The remote call itself failed. Surfaced verbatim, never retried by
    /// this layer.
    #[error(transparent)]
    Gateway(#[from] GatewayError),
}
