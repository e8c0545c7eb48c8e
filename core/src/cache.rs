//! Keyed, paginated query cache.
//!
//! One entry per filter key (offset excluded). Merging follows the
//! window: a page at offset 0 replaces the entry's items, a deeper page
//! appends and the whole list is de-duplicated by id keeping the first
//! occurrence. Identical in-flight requests are coalesced onto one
//! network round-trip, and resolving fetches are fenced by a per-key
//! sequence number so a stale response can never clobber a newer merge.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::future::Future;
use std::hash::Hash;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use boardsync_protocol::{
    Entity, Page, ProfileFilter, Project, ProjectFilter, ProjectId, ProjectSnapshot, UserProfile,
};
use tracing::{debug, warn};

use crate::error::SyncResult;
use crate::gateway::GatewayResult;

/// Cache of project list queries.
pub type ProjectCache = QueryCache<ProjectFilter, Project>;

/// Cache of user-profile list queries.
pub type ProfileCache = QueryCache<ProfileFilter, UserProfile>;

/// One resident result set.
#[derive(Debug)]
pub(crate) struct CacheEntry<T> {
    pub(crate) items: Vec<T>,
    pub(crate) next_offset: Option<u32>,
    pub(crate) stale: bool,
    /// Sequence of the newest fetch issued for this key.
    issued_seq: u64,
    /// Sequence of the newest fetch whose merge landed.
    applied_seq: u64,
    /// Offset of the most recent fetch request for this key.
    last_offset: Option<u32>,
}

impl<T> Default for CacheEntry<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            next_offset: None,
            stale: false,
            issued_seq: 0,
            applied_seq: 0,
            last_offset: None,
        }
    }
}

impl<T: Clone> CacheEntry<T> {
    fn page(&self) -> Page<T> {
        Page {
            items: self.items.clone(),
            next_offset: self.next_offset,
        }
    }
}

/// Remove later duplicates, keeping the first occurrence of each id.
pub(crate) fn dedup_by_id<T: Entity>(items: &mut Vec<T>) {
    let mut seen = HashSet::with_capacity(items.len());
    items.retain(|item| seen.insert(item.id()));
}

/// Per-key lock map so identical in-flight fetches share one round-trip.
struct Coalescer<K> {
    inflight: tokio::sync::Mutex<HashMap<K, Arc<tokio::sync::Mutex<()>>>>,
}

impl<K: Eq + Hash + Clone> Coalescer<K> {
    fn new() -> Self {
        Self {
            inflight: tokio::sync::Mutex::new(HashMap::new()),
        }
    }

    async fn acquire(&self, key: K) -> tokio::sync::OwnedMutexGuard<()> {
        let lock = {
            let mut inflight = self.inflight.lock().await;
            Arc::clone(
                inflight
                    .entry(key)
                    .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(()))),
            )
        };
        lock.lock_owned().await
    }
}

/// Keyed, paginated result cache with merge-on-fetch.
pub struct QueryCache<F, T> {
    entries: Mutex<HashMap<F, CacheEntry<T>>>,
    inflight: Coalescer<(F, u32)>,
}

impl<F, T> Default for QueryCache<F, T>
where
    F: Clone + Eq + Hash + fmt::Debug,
    T: Entity + Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<F, T> QueryCache<F, T>
where
    F: Clone + Eq + Hash + fmt::Debug,
    T: Entity + Clone,
{
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            inflight: Coalescer::new(),
        }
    }

    fn lock_entries(&self) -> MutexGuard<'_, HashMap<F, CacheEntry<T>>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Resolve one page through the supplied gateway call and merge it in.
    ///
    /// A repeat of the most recent `(filter, offset)` request is served
    /// from the resident entry without a network call; a request identical
    /// to one currently in flight waits for it instead of duplicating it.
    /// Every row is validated before the merge; a failed fetch or a
    /// malformed row leaves the entry exactly as it was.
    pub async fn fetch_page<Fut>(
        &self,
        filter: F,
        offset: u32,
        limit: u32,
        fetch: impl FnOnce() -> Fut,
    ) -> SyncResult<Page<T>>
    where
        Fut: Future<Output = GatewayResult<Vec<T>>>,
    {
        if let Some(page) = self.cached_if_current(&filter, offset) {
            return Ok(page);
        }

        let _permit = self.inflight.acquire((filter.clone(), offset)).await;

        // A coalesced twin may have landed while we waited for the permit.
        if let Some(page) = self.cached_if_current(&filter, offset) {
            return Ok(page);
        }

        let seq = {
            let mut entries = self.lock_entries();
            let entry = entries.entry(filter.clone()).or_default();
            entry.issued_seq += 1;
            entry.last_offset = Some(offset);
            entry.issued_seq
        };

        let rows = fetch().await?;
        rows.iter().try_for_each(|row| row.validate())?;

        let next_offset = if (rows.len() as u32) < limit {
            None
        } else {
            Some(offset + limit)
        };

        let mut entries = self.lock_entries();
        let entry = entries.entry(filter.clone()).or_default();
        if seq < entry.issued_seq {
            // A newer fetch for this key was issued while we were in
            // flight; merging now would clobber fresher data.
            warn!(?filter, offset, seq, newest = entry.issued_seq, "discarding stale fetch");
            return Ok(entry.page());
        }

        if offset == 0 {
            entry.items = rows;
        } else {
            entry.items.extend(rows);
            dedup_by_id(&mut entry.items);
        }
        entry.next_offset = next_offset;
        entry.applied_seq = seq;
        entry.stale = false;
        debug!(?filter, offset, items = entry.items.len(), "merged page");
        Ok(entry.page())
    }

    fn cached_if_current(&self, filter: &F, offset: u32) -> Option<Page<T>> {
        let entries = self.lock_entries();
        let entry = entries.get(filter)?;
        let current = !entry.stale
            && entry.last_offset == Some(offset)
            && entry.applied_seq == entry.issued_seq;
        current.then(|| entry.page())
    }

    /// Resident snapshot for a key, stale or not. Last-good data is kept
    /// through failed refetches; a key whose only fetch failed has no
    /// snapshot (distinct from a resident empty result).
    pub fn get(&self, filter: &F) -> Option<Page<T>> {
        let entries = self.lock_entries();
        entries
            .get(filter)
            .filter(|entry| entry.applied_seq > 0 || !entry.items.is_empty())
            .map(CacheEntry::page)
    }

    /// Mark a key stale; the next fetch for it goes back to the gateway.
    pub fn invalidate(&self, filter: &F) {
        if let Some(entry) = self.lock_entries().get_mut(filter) {
            entry.stale = true;
            debug!(?filter, "invalidated");
        }
    }

    pub fn is_stale(&self, filter: &F) -> bool {
        self.lock_entries()
            .get(filter)
            .is_some_and(|entry| entry.stale)
    }

    /// Drop every entry. Session teardown.
    pub fn clear(&self) {
        self.lock_entries().clear();
    }

    pub fn is_empty(&self) -> bool {
        self.lock_entries().is_empty()
    }

    pub(crate) fn with_entries<R>(
        &self,
        f: impl FnOnce(&mut HashMap<F, CacheEntry<T>>) -> R,
    ) -> R {
        f(&mut self.lock_entries())
    }
}

impl ProjectCache {
    /// Last-known state of a project, from its first resident copy.
    pub fn snapshot_of(&self, id: ProjectId) -> Option<ProjectSnapshot> {
        let entries = self.lock_entries();
        entries
            .values()
            .find_map(|entry| entry.items.iter().find(|p| p.id == id))
            .map(ProjectSnapshot::from)
    }

    /// Invalidate every entry that holds a copy of the given project.
    pub fn invalidate_containing(&self, id: ProjectId) {
        let mut entries = self.lock_entries();
        for (filter, entry) in entries.iter_mut() {
            if !entry.stale && entry.items.iter().any(|p| p.id == id) {
                entry.stale = true;
                debug!(?filter, project = %id, "invalidated by entity");
            }
        }
    }

    /// Invalidate every entry whose resident state disagrees with the
    /// authoritative row: a matching filter without an identical copy, or
    /// a lingering copy under a filter the row no longer satisfies.
    pub fn invalidate_for(&self, project: &Project) {
        let mut entries = self.lock_entries();
        for (filter, entry) in entries.iter_mut() {
            let resident = entry.items.iter().find(|p| p.id == project.id);
            let disagrees = if filter.matches(project) {
                resident != Some(project)
            } else {
                resident.is_some()
            };
            if disagrees && !entry.stale {
                entry.stale = true;
                debug!(?filter, project = %project.id, "invalidated for row");
            }
        }
    }
}
