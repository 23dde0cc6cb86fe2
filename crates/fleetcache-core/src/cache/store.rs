//! In-memory resource store.
//!
//! The store is the ground truth every other cache component reads: one
//! entry per distinct query key, holding the latest known value, fetch
//! status, tags, and subscriber count. Entries, the tag index, the in-flight
//! fetch table, and the request sequence counter all live behind a single
//! mutex, so every state transition is one atomic step and a read that
//! starts after a mutation's invalidation can never observe the
//! pre-mutation value.
//!
//! The store is created once at session start and dropped at session end;
//! nothing here persists across sessions.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use tokio::sync::{broadcast, watch};
use tracing::debug;

use crate::cache::entry::{CacheEntry, EntryView, FetchOutcome, FetchStatus, ResourceValue};
use crate::cache::key::{QueryKey, Tag};
use crate::cache::tags::TagIndex;

/// Capacity of the per-fetch result broadcast. Each channel carries exactly
/// one message, so a single slot per receiver is enough.
const FETCH_BROADCAST_CAPACITY: usize = 1;

struct InflightFetch {
    seq: u64,
    tx: broadcast::Sender<FetchOutcome>,
}

struct StoreState {
    entries: HashMap<QueryKey, CacheEntry>,
    tags: TagIndex,
    inflight: HashMap<QueryKey, InflightFetch>,
    next_seq: u64,
}

/// Outcome of asking the store to start a fetch for a key.
pub enum BeginFetch {
    /// The entry holds a fresh successful value; no fetch is needed.
    Hit(ResourceValue),
    /// Another fetch for this key is in flight; await its outcome.
    Join(broadcast::Receiver<FetchOutcome>),
    /// The caller leads a new fetch and must settle it with this lease.
    Lead(FetchLease),
}

/// Lease held by the leader of an in-flight fetch.
pub struct FetchLease {
    pub seq: u64,
    tx: broadcast::Sender<FetchOutcome>,
}

pub struct ResourceStore {
    state: Mutex<StoreState>,
}

impl ResourceStore {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(StoreState {
                entries: HashMap::new(),
                tags: TagIndex::new(),
                inflight: HashMap::new(),
                next_seq: 1,
            }),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, StoreState> {
        // Lock poisoning means a panic mid-bookkeeping; nothing can recover.
        self.state.lock().unwrap()
    }

    /// Current view of an entry, if one exists.
    pub fn get(&self, key: &QueryKey) -> Option<EntryView> {
        let state = self.lock();
        state.entries.get(key).map(|e| EntryView {
            status: e.status,
            value: e.value.clone(),
            error: e.error.clone(),
        })
    }

    /// Views of several entries read under one lock acquisition, so the set
    /// is consistent with respect to concurrent invalidations.
    pub fn get_many(&self, keys: &[QueryKey]) -> Vec<Option<EntryView>> {
        let state = self.lock();
        keys.iter()
            .map(|key| {
                state.entries.get(key).map(|e| EntryView {
                    status: e.status,
                    value: e.value.clone(),
                    error: e.error.clone(),
                })
            })
            .collect()
    }

    /// Register interest in a key. Creates an idle entry if none exists and
    /// returns a channel that yields every status change.
    pub fn subscribe(&self, key: &QueryKey) -> watch::Receiver<FetchStatus> {
        let mut state = self.lock();
        let entry = state
            .entries
            .entry(key.clone())
            .or_insert_with(CacheEntry::new);
        entry.subscriber_count += 1;
        entry.status_tx.subscribe()
    }

    /// Drop interest in a key. The entry is evicted once it has no
    /// subscribers and no fetch is pending for it.
    pub fn unsubscribe(&self, key: &QueryKey) {
        let mut guard = self.lock();
        let state = &mut *guard;
        let Some(entry) = state.entries.get_mut(key) else {
            return;
        };
        entry.subscriber_count = entry.subscriber_count.saturating_sub(1);
        if entry.subscriber_count == 0
            && entry.status != FetchStatus::Loading
            && !state.inflight.contains_key(key)
        {
            state.entries.remove(key);
            state.tags.unregister(key);
            debug!(key = %key, "evicted entry with no subscribers");
        }
    }

    /// Start a fetch for a key: report a cache hit, join an in-flight fetch,
    /// or hand out a lease to lead a new one. Leading transitions the entry
    /// to `Loading`.
    pub fn begin_fetch(&self, key: &QueryKey) -> BeginFetch {
        let mut guard = self.lock();
        let state = &mut *guard;

        if let Some(entry) = state.entries.get(key) {
            if entry.status == FetchStatus::Success {
                if let Some(value) = &entry.value {
                    debug!(key = %key, "cache hit");
                    return BeginFetch::Hit(value.clone());
                }
            }
        }

        if let Some(inflight) = state.inflight.get(key) {
            debug!(key = %key, seq = inflight.seq, "joining in-flight fetch");
            return BeginFetch::Join(inflight.tx.subscribe());
        }

        let seq = state.next_seq;
        state.next_seq += 1;
        let (tx, _) = broadcast::channel(FETCH_BROADCAST_CAPACITY);
        state.inflight.insert(
            key.clone(),
            InflightFetch {
                seq,
                tx: tx.clone(),
            },
        );
        let entry = state
            .entries
            .entry(key.clone())
            .or_insert_with(CacheEntry::new);
        entry.error = None;
        entry.set_status(FetchStatus::Loading);
        debug!(key = %key, seq, "cache miss, leading fetch");
        BeginFetch::Lead(FetchLease { seq, tx })
    }

    /// Apply a settled fetch result and share it with attached callers.
    ///
    /// Results land last-writer-by-sequence: a result older than the entry's
    /// applied sequence (or than an invalidation fence) is dropped without
    /// touching the entry. Dropped results are internal only; the lease's
    /// callers still receive the outcome they attached to.
    pub fn settle_fetch(
        &self,
        key: &QueryKey,
        lease: FetchLease,
        outcome: FetchOutcome,
    ) -> FetchOutcome {
        let mut guard = self.lock();
        let state = &mut *guard;

        let lease_is_current = state
            .inflight
            .get(key)
            .map(|f| f.seq == lease.seq)
            .unwrap_or(false);
        if lease_is_current {
            state.inflight.remove(key);
        }

        if let Some(entry) = state.entries.get_mut(key) {
            if lease.seq > entry.applied_seq {
                entry.applied_seq = lease.seq;
                match &outcome {
                    Ok(value) => {
                        let provided: HashSet<Tag> =
                            key.provides_tags(value).into_iter().collect();
                        entry.value = Some(value.clone());
                        entry.error = None;
                        entry.tags = provided.clone();
                        state.tags.register(key.clone(), provided);
                        entry.set_status(FetchStatus::Success);
                    }
                    Err(error) => {
                        // A failed fetch must not drop the tags of the last
                        // successful population.
                        entry.error = Some(error.clone());
                        entry.set_status(FetchStatus::Error);
                    }
                }
            } else {
                debug!(
                    key = %key,
                    seq = lease.seq,
                    applied = entry.applied_seq,
                    "dropping superseded fetch result"
                );
            }
        }

        // Callers that joined this fetch get its outcome regardless of
        // whether the store applied it.
        let _ = lease.tx.send(outcome.clone());
        outcome
    }

    /// Mark every entry registered under any of `tags` as stale, and return
    /// the affected keys that still have subscribers (the ones to refetch).
    ///
    /// An entry with a fetch in flight is fenced: the in-flight result will
    /// be dropped as superseded when it settles, so a post-invalidation read
    /// can never surface the pre-mutation value.
    pub fn invalidate(&self, tags: &[Tag]) -> Vec<QueryKey> {
        let mut guard = self.lock();
        let state = &mut *guard;

        let mut affected: HashSet<QueryKey> = HashSet::new();
        for tag in tags {
            affected.extend(state.tags.keys_for_tag(tag));
        }

        let mut to_refetch = Vec::new();
        for key in affected {
            if state.inflight.remove(&key).is_some() {
                if let Some(entry) = state.entries.get_mut(&key) {
                    entry.applied_seq = state.next_seq;
                }
                state.next_seq += 1;
            }
            if let Some(entry) = state.entries.get_mut(&key) {
                entry.error = None;
                entry.set_status(FetchStatus::Stale);
                debug!(key = %key, "entry invalidated");
                if entry.subscriber_count > 0 {
                    to_refetch.push(key);
                }
            }
        }
        to_refetch
    }

    /// Number of entries currently held.
    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().entries.is_empty()
    }
}

impl Default for ResourceStore {
    fn default() -> Self {
        Self::new()
    }
}
