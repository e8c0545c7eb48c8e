//! Optimistic mutation execution.
//!
//! Mutations patch every affected resident cache entry synchronously,
//! before the gateway call is issued, so the caller observes the change
//! with zero latency. Each speculative application records its inverse;
//! a failed call replays the inverses in reverse order, leaving the cache
//! bit-for-bit as it was. The coordinator does not serialize callers;
//! drop-triggered mutual exclusion belongs to [`crate::dnd::DragBoard`].

use std::sync::Arc;

use boardsync_protocol::{
    CreateProjectInput, Entity, Project, ProjectFilter, ProjectId, ProjectPatch, ProjectSnapshot,
};
use chrono::Utc;
use tracing::{debug, warn};

use crate::cache::{ProjectCache, dedup_by_id};
use crate::error::{SyncError, SyncResult};
use crate::gateway::DataGateway;

/// Inverse of one speculative cache application.
enum UndoOp {
    /// A resident copy was patched in place.
    Replace {
        filter: ProjectFilter,
        previous: Project,
    },
    /// A copy was removed from an entry it no longer matched.
    Reinsert {
        filter: ProjectFilter,
        index: usize,
        item: Project,
    },
    /// A best-effort copy was inserted into an entry it now matches.
    Remove {
        filter: ProjectFilter,
        id: ProjectId,
    },
}

/// Undoes a speculative application unless defused.
///
/// Armed right after the optimistic patches land and defused only once
/// the gateway call settled successfully, so rollback also runs when the
/// initiating caller is torn down and the mutation future is dropped
/// mid-flight.
struct SpeculationGuard {
    projects: Arc<ProjectCache>,
    undo: Option<Box<dyn FnOnce(&ProjectCache) + Send>>,
}

impl SpeculationGuard {
    fn new(projects: Arc<ProjectCache>, undo: impl FnOnce(&ProjectCache) + Send + 'static) -> Self {
        Self {
            projects,
            undo: Some(Box::new(undo)),
        }
    }

    fn defuse(mut self) {
        self.undo = None;
    }
}

impl Drop for SpeculationGuard {
    fn drop(&mut self) {
        if let Some(undo) = self.undo.take() {
            undo(&self.projects);
        }
    }
}

fn remove_everywhere(projects: &ProjectCache, id: ProjectId) {
    projects.with_entries(|entries| {
        for entry in entries.values_mut() {
            entry.items.retain(|p| p.id != id);
        }
    });
}

fn apply_rollback(projects: &ProjectCache, ledger: Vec<UndoOp>) {
    projects.with_entries(|entries| {
        for op in ledger.into_iter().rev() {
            match op {
                UndoOp::Replace { filter, previous } => {
                    if let Some(entry) = entries.get_mut(&filter) {
                        match entry.items.iter().position(|p| p.id == previous.id) {
                            Some(i) => entry.items[i] = previous,
                            None => entry.items.insert(0, previous),
                        }
                    }
                }
                UndoOp::Reinsert {
                    filter,
                    index,
                    item,
                } => {
                    if let Some(entry) = entries.get_mut(&filter)
                        && !entry.items.iter().any(|p| p.id == item.id)
                    {
                        let index = index.min(entry.items.len());
                        entry.items.insert(index, item);
                    }
                }
                UndoOp::Remove { filter, id } => {
                    if let Some(entry) = entries.get_mut(&filter) {
                        entry.items.retain(|p| p.id != id);
                    }
                }
            }
        }
    });
}

/// Executes create/update against the gateway with optimistic cache
/// application and rollback-on-failure.
pub struct MutationCoordinator<G> {
    gateway: Arc<G>,
    projects: Arc<ProjectCache>,
}

impl<G> Clone for MutationCoordinator<G> {
    fn clone(&self) -> Self {
        Self {
            gateway: Arc::clone(&self.gateway),
            projects: Arc::clone(&self.projects),
        }
    }
}

impl<G: DataGateway> MutationCoordinator<G> {
    pub fn new(gateway: Arc<G>, projects: Arc<ProjectCache>) -> Self {
        Self { gateway, projects }
    }

    /// Create a project.
    ///
    /// A temp record (fresh id, current timestamps, not completed, admin
    /// provenance) is prepended to the resident unfiltered entry before
    /// the insert is issued; on success the temp record is swapped for the
    /// authoritative row everywhere it belongs, on failure it is removed
    /// from wherever it was inserted.
    pub async fn create_project(&self, input: CreateProjectInput) -> SyncResult<Project> {
        let input = input.normalized()?;
        let now = Utc::now();
        let temp = Project {
            id: ProjectId::generate(),
            assigned_user_id: input.assigned_user_id,
            title: input.title.clone(),
            description: input.description.clone(),
            is_completed: false,
            created_by_admin: true,
            created_at: now,
            updated_at: now,
        };
        let temp_id = temp.id;

        let applied = self.projects.with_entries(|entries| {
            entries
                .get_mut(&ProjectFilter::unfiltered())
                .map(|entry| {
                    entry.items.insert(0, temp.clone());
                    dedup_by_id(&mut entry.items);
                })
                .is_some()
        });
        if applied {
            debug!(temp = %temp_id, "optimistic create applied");
        }
        let guard = SpeculationGuard::new(Arc::clone(&self.projects), move |projects| {
            remove_everywhere(projects, temp_id);
        });

        let row = match self.gateway.insert_project(&input).await {
            Ok(row) => row,
            Err(err) => {
                warn!(temp = %temp_id, %err, "create failed, removing temp record");
                return Err(err.into());
            }
        };
        row.validate()?;
        guard.defuse();

        self.projects.with_entries(|entries| {
            for (filter, entry) in entries.iter_mut() {
                entry.items.retain(|p| p.id != temp_id);
                if filter.matches(&row) {
                    entry.items.insert(0, row.clone());
                    dedup_by_id(&mut entry.items);
                }
            }
        });
        Ok(row)
    }

    /// Apply a partial patch to a project.
    ///
    /// Every resident entry is reconciled speculatively: patched in place
    /// where the row stays a member, removed where the patch moves it out
    /// of the entry's filter partition, and inserted (best-effort row from
    /// the prior snapshot merged with the patch) where it moves in. The
    /// prior state comes from `prior` when the caller tracked it, else
    /// from the first resident copy. Without either, the update goes
    /// straight to the gateway and only invalidation follows.
    pub async fn update_project(
        &self,
        id: ProjectId,
        patch: ProjectPatch,
        prior: Option<ProjectSnapshot>,
    ) -> SyncResult<Project> {
        let patch = patch.normalized()?;
        let now = Utc::now();
        let prior = prior.or_else(|| self.projects.snapshot_of(id));

        let mut ledger: Vec<UndoOp> = Vec::new();
        if let Some(prior) = &prior {
            let next_view = prior.merged_with(id, &patch, now);
            self.projects.with_entries(|entries| {
                for (filter, entry) in entries.iter_mut() {
                    let pos = entry.items.iter().position(|p| p.id == id);
                    match (pos, filter.matches(&next_view)) {
                        (Some(i), true) => {
                            let previous = entry.items[i].clone();
                            patch.apply_to(&mut entry.items[i]);
                            entry.items[i].updated_at = now;
                            ledger.push(UndoOp::Replace {
                                filter: *filter,
                                previous,
                            });
                        }
                        (Some(i), false) => {
                            let item = entry.items.remove(i);
                            ledger.push(UndoOp::Reinsert {
                                filter: *filter,
                                index: i,
                                item,
                            });
                        }
                        (None, true) => {
                            entry.items.insert(0, next_view.clone());
                            ledger.push(UndoOp::Remove { filter: *filter, id });
                        }
                        (None, false) => {}
                    }
                }
            });
            debug!(project = %id, patches = ledger.len(), "optimistic update applied");
        }
        let guard = SpeculationGuard::new(Arc::clone(&self.projects), move |projects| {
            apply_rollback(projects, ledger);
        });

        let row = match self.gateway.update_project(id, &patch).await {
            Ok(row) => row,
            Err(err) => {
                warn!(project = %id, %err, "update failed, rolling back");
                return Err(err.into());
            }
        };
        if let Err(err) = row.validate() {
            return Err(SyncError::Validation(err));
        }
        guard.defuse();

        // The optimistic state already reflects the outcome; replace the
        // speculative copies with the authoritative row and flag whatever
        // could not be reached optimistically.
        self.projects.with_entries(|entries| {
            for (filter, entry) in entries.iter_mut() {
                if let Some(i) = entry.items.iter().position(|p| p.id == row.id) {
                    if filter.matches(&row) {
                        entry.items[i] = row.clone();
                    } else {
                        entry.items.remove(i);
                    }
                }
            }
        });
        self.projects.invalidate_for(&row);
        Ok(row)
    }

}
