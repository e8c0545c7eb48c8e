//! Root of the `boardsync-core` library.
//!
//! The optimistic client-side synchronization layer: a keyed cache of
//! paginated list queries, a mutation coordinator that applies speculative
//! patches and rolls them back on failure, the drag/assignment state
//! machine that gates drop-triggered mutations, and the infinite-scroll
//! pagination controller. The remote store is reached exclusively through
//! the [`gateway::DataGateway`] trait.

// All user-visible output belongs to the calling layer; core code reports
// through return values and the tracing stack.
#![deny(clippy::print_stdout, clippy::print_stderr)]

pub mod cache;
pub mod config;
pub mod coordinator;
pub mod debounce;
pub mod dnd;
pub mod error;
pub mod gateway;
pub mod scroll;
pub mod session;

pub use cache::{ProfileCache, ProjectCache, QueryCache};
pub use config::{ConfigError, SyncConfig};
pub use coordinator::MutationCoordinator;
pub use debounce::{DebounceOptions, Debouncer};
pub use dnd::{DragBoard, DragEntity, DragPhase, GuardRejection, TransferLock};
pub use error::{SyncError, SyncResult};
pub use gateway::{DataGateway, GatewayError, GatewayResult};
pub use scroll::ScrollSentinel;
pub use session::{AuthBootstrap, Session};
