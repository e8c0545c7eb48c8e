//! Drag/assignment state machine.
//!
//! Models the transfer interaction abstractly (begin / accept / cancel)
//! so the same machine serves pointer drag, keyboard reassignment, or any
//! other input mechanism. One machine per session; `Locked` is a mutual
//! exclusion flag, not a queue: a drop attempted while a mutation is in
//! flight is rejected, never deferred.

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use boardsync_protocol::{ProjectId, UserId};
use tracing::debug;

/// What is being dragged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragEntity {
    /// A project card, dropped on a status column.
    Project(ProjectId),
    /// A user row, dropped on a project card to reassign it.
    User(UserId),
}

impl fmt::Display for DragEntity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DragEntity::Project(id) => write!(f, "project {id}"),
            DragEntity::User(id) => write!(f, "user {id}"),
        }
    }
}

/// Machine state. The mutation target is always a project, whichever
/// entity is dragged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DragPhase {
    #[default]
    Idle,
    Dragging(DragEntity),
    Locked(ProjectId),
}

/// A drop did not pass its guards. Informational, not an error: the
/// machine simply does not advance, and the caller may show a notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardRejection {
    /// Another drop-triggered mutation is still in flight. Try again when
    /// it settles.
    LockHeld { updating: ProjectId },
    /// The drop payload does not match the entity this machine is
    /// tracking (stale or duplicated drop event).
    StalePayload { payload: DragEntity },
    /// The target is already in the state the drop would put it in.
    AlreadySatisfied { target: ProjectId },
}

impl fmt::Display for GuardRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GuardRejection::LockHeld { .. } => {
                write!(f, "Another update is still in progress, try again")
            }
            GuardRejection::StalePayload { .. } => write!(f, "That drop is no longer valid"),
            GuardRejection::AlreadySatisfied { .. } => write!(f, "Nothing to change"),
        }
    }
}

/// Shared drag/lock state for one session.
#[derive(Clone, Default)]
pub struct DragBoard {
    state: Arc<Mutex<DragPhase>>,
}

impl DragBoard {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, DragPhase> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn phase(&self) -> DragPhase {
        *self.lock()
    }

    pub fn is_locked(&self) -> bool {
        matches!(*self.lock(), DragPhase::Locked(_))
    }

    /// Entity currently being dragged, if any.
    pub fn dragging(&self) -> Option<DragEntity> {
        match *self.lock() {
            DragPhase::Dragging(entity) => Some(entity),
            _ => None,
        }
    }

    /// Project targeted by the in-flight mutation, if any.
    pub fn updating_project(&self) -> Option<ProjectId> {
        match *self.lock() {
            DragPhase::Locked(id) => Some(id),
            _ => None,
        }
    }

    /// Drag start. Ignored while a mutation holds the lock.
    pub fn begin_transfer(&self, entity: DragEntity) {
        let mut state = self.lock();
        if !matches!(*state, DragPhase::Locked(_)) {
            *state = DragPhase::Dragging(entity);
        }
    }

    /// Drag ended without a successful drop.
    pub fn cancel_transfer(&self) {
        let mut state = self.lock();
        if matches!(*state, DragPhase::Dragging(_)) {
            *state = DragPhase::Idle;
        }
    }

    /// Drop. Guards, in order: no other mutation in flight, the payload is
    /// the entity this machine is tracking, and the target is not already
    /// in the desired state (`already_satisfied`, decided by the caller:
    /// e.g. dropping a project on the column it is in, or a user on a
    /// project already assigned to them).
    ///
    /// On success the machine is `Locked(target)` and the returned
    /// [`TransferLock`] must be held across the mutation; dropping it
    /// releases the lock whatever the outcome.
    pub fn accept_transfer(
        &self,
        payload: DragEntity,
        target: ProjectId,
        already_satisfied: bool,
    ) -> Result<TransferLock, GuardRejection> {
        let mut state = self.lock();
        if let DragPhase::Locked(updating) = *state {
            return Err(GuardRejection::LockHeld { updating });
        }
        if *state != DragPhase::Dragging(payload) {
            return Err(GuardRejection::StalePayload { payload });
        }
        if already_satisfied {
            return Err(GuardRejection::AlreadySatisfied { target });
        }
        *state = DragPhase::Locked(target);
        debug!(%payload, %target, "transfer accepted");
        Ok(TransferLock {
            state: Arc::clone(&self.state),
            target,
        })
    }

    /// Force the machine back to `Idle`. Session teardown.
    pub fn reset(&self) {
        *self.lock() = DragPhase::Idle;
    }
}

/// Holds the drop lock while the triggered mutation is in flight.
///
/// Release happens in `Drop`, unconditionally: success, failure, or an
/// abandoned future all return the machine to `Idle`.
#[derive(Debug)]
pub struct TransferLock {
    state: Arc<Mutex<DragPhase>>,
    target: ProjectId,
}

impl TransferLock {
    pub fn target(&self) -> ProjectId {
        self.target
    }
}

impl Drop for TransferLock {
    fn drop(&mut self) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        *state = DragPhase::Idle;
    }
}
