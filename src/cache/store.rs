use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

use futures::FutureExt;
use futures::future::BoxFuture;
use parking_lot::Mutex;
use tokio::sync::broadcast;
use tokio::time::Instant;

use crate::common::{ApiError, CacheEvent, Result};

use super::key::{KeyFamily, KeyFilter, QueryKey};
use super::policy::{CachePolicy, PolicyTable};
use super::query::{QueryState, QueryStatus};

const EVENT_CAPACITY: usize = 256;

type AnyData = Arc<dyn Any + Send + Sync>;
type Refetcher = Arc<dyn Fn() -> BoxFuture<'static, Result<AnyData>> + Send + Sync>;

struct Entry {
    data: Option<AnyData>,
    status: QueryStatus,
    error: Option<ApiError>,
    updated_at: Option<Instant>,
    /// Set by invalidation, cleared by a fetch that started afterwards.
    stale: bool,
    generation: u64,
    policy: CachePolicy,
    observers: usize,
    last_seen: Instant,
    in_flight: usize,
    started_seq: u64,
    applied_seq: u64,
    refetch: Option<Refetcher>,
    /// Serializes fetches of this key so concurrent readers share one request.
    gate: Arc<tokio::sync::Mutex<()>>,
}

impl Entry {
    fn new(policy: CachePolicy, now: Instant) -> Self {
        Self {
            data: None,
            status: QueryStatus::Pending,
            error: None,
            updated_at: None,
            stale: false,
            generation: 0,
            policy,
            observers: 0,
            last_seen: now,
            in_flight: 0,
            started_seq: 0,
            applied_seq: 0,
            refetch: None,
            gate: Arc::new(tokio::sync::Mutex::new(())),
        }
    }

    fn is_fresh(&self, now: Instant) -> bool {
        self.status == QueryStatus::Success
            && self.data.is_some()
            && !self.stale
            && self
                .updated_at
                .is_some_and(|at| now.saturating_duration_since(at) < self.policy.fresh)
    }

    fn is_expired(&self, now: Instant) -> bool {
        self.observers == 0
            && self.in_flight == 0
            && now.saturating_duration_since(self.last_seen) >= self.policy.retained
    }
}

struct Inner {
    entries: Mutex<HashMap<QueryKey, Entry>>,
    policies: PolicyTable,
    events: broadcast::Sender<CacheEvent>,
}

/// Shared, key-addressed query cache. Cloning is cheap and every clone sees
/// the same entries; tests build their own isolated instance.
#[derive(Clone)]
pub struct QueryClient {
    inner: Arc<Inner>,
}

impl Default for QueryClient {
    fn default() -> Self {
        Self::new(PolicyTable::default())
    }
}

impl QueryClient {
    pub fn new(policies: PolicyTable) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            inner: Arc::new(Inner {
                entries: Mutex::new(HashMap::new()),
                policies,
                events,
            }),
        }
    }

    pub fn policy_for(&self, family: KeyFamily) -> CachePolicy {
        self.inner.policies.policy_for(family)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<CacheEvent> {
        self.inner.events.subscribe()
    }

    fn emit(&self, event: CacheEvent) {
        // No subscribers is fine.
        let _ = self.inner.events.send(event);
    }

    /// Returns cached data while it is fresh, otherwise fetches and stores it.
    pub async fn fetch_query<T, F>(
        &self,
        key: QueryKey,
        policy: CachePolicy,
        fetcher: F,
    ) -> Result<Arc<T>>
    where
        T: Send + Sync + 'static,
        F: Fn() -> BoxFuture<'static, Result<T>> + Send + Sync + 'static,
    {
        let data = self
            .fetch_with(key.clone(), policy, erase(fetcher), false)
            .await?;
        downcast(&key, data)
    }

    /// Like [`fetch_query`](Self::fetch_query) but ignores the fresh window.
    pub async fn refetch_query<T, F>(
        &self,
        key: QueryKey,
        policy: CachePolicy,
        fetcher: F,
    ) -> Result<Arc<T>>
    where
        T: Send + Sync + 'static,
        F: Fn() -> BoxFuture<'static, Result<T>> + Send + Sync + 'static,
    {
        let data = self
            .fetch_with(key.clone(), policy, erase(fetcher), true)
            .await?;
        downcast(&key, data)
    }

    async fn fetch_with(
        &self,
        key: QueryKey,
        policy: CachePolicy,
        refetch: Refetcher,
        force: bool,
    ) -> Result<AnyData> {
        let now = Instant::now();
        self.collect_garbage_at(now);

        let (gate, seen_seq) = {
            let mut entries = self.inner.entries.lock();
            let entry = entries
                .entry(key.clone())
                .or_insert_with(|| Entry::new(policy, now));
            entry.policy = policy;
            entry.refetch = Some(refetch.clone());
            entry.last_seen = now;

            if !force && entry.is_fresh(now) {
                if let Some(data) = &entry.data {
                    log::debug!("cache hit for {key}");
                    return Ok(data.clone());
                }
            }
            (entry.gate.clone(), entry.applied_seq)
        };

        let _guard = gate.lock_owned().await;
        {
            let entries = self.inner.entries.lock();
            if let Some(entry) = entries.get(&key) {
                let answered_while_waiting = entry.applied_seq > seen_seq
                    && entry.status == QueryStatus::Success
                    && !entry.stale;
                if answered_while_waiting || (!force && entry.is_fresh(Instant::now())) {
                    if let Some(data) = &entry.data {
                        log::debug!("joined in-flight fetch for {key}");
                        return Ok(data.clone());
                    }
                }
            }
        }

        self.run_fetch(&key, policy, refetch).await
    }

    async fn run_fetch(
        &self,
        key: &QueryKey,
        policy: CachePolicy,
        refetch: Refetcher,
    ) -> Result<AnyData> {
        let (seq, generation) = {
            let mut entries = self.inner.entries.lock();
            let entry = entries
                .entry(key.clone())
                .or_insert_with(|| Entry::new(policy, Instant::now()));
            entry.started_seq += 1;
            entry.in_flight += 1;
            if entry.data.is_none() {
                entry.status = QueryStatus::Pending;
                entry.error = None;
            }
            (entry.started_seq, entry.generation)
        };
        self.emit(CacheEvent::Fetching(key.clone()));

        let result = refetch().await;
        let now = Instant::now();

        let event = {
            let mut entries = self.inner.entries.lock();
            match entries.get_mut(key) {
                None => None,
                Some(entry) => {
                    entry.in_flight = entry.in_flight.saturating_sub(1);
                    entry.last_seen = now;
                    if seq <= entry.applied_seq {
                        log::debug!("discarding superseded response for {key}");
                        None
                    } else {
                        entry.applied_seq = seq;
                        match &result {
                            Ok(data) => {
                                entry.data = Some(data.clone());
                                entry.status = QueryStatus::Success;
                                entry.error = None;
                                entry.updated_at = Some(now);
                                entry.stale = generation != entry.generation;
                                Some(CacheEvent::Updated(key.clone()))
                            }
                            Err(err) => {
                                entry.status = QueryStatus::Error;
                                entry.error = Some(err.clone());
                                Some(CacheEvent::Failed(key.clone()))
                            }
                        }
                    }
                }
            }
        };

        if let Err(err) = &result {
            log::debug!("fetch of {key} failed: {err}");
        }
        if let Some(event) = event {
            self.emit(event);
        }
        result
    }

    /// Starts loading `key` on the current runtime unless its data is fresh.
    /// Returns whether a load was scheduled. A fetch that lands before the
    /// scheduled one gets the gate makes it a no-op.
    pub fn prefetch_query<T, F>(&self, key: QueryKey, policy: CachePolicy, fetcher: F) -> bool
    where
        T: Send + Sync + 'static,
        F: Fn() -> BoxFuture<'static, Result<T>> + Send + Sync + 'static,
    {
        let now = Instant::now();
        let seen_seq = {
            let mut entries = self.inner.entries.lock();
            let entry = entries
                .entry(key.clone())
                .or_insert_with(|| Entry::new(policy, now));
            entry.policy = policy;
            entry.refetch = Some(erase(fetcher));
            entry.last_seen = now;
            if entry.is_fresh(now) {
                return false;
            }
            entry.applied_seq
        };
        self.spawn_refetch(key, seen_seq)
    }

    fn spawn_refetch(&self, key: QueryKey, seen_seq: u64) -> bool {
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(self.clone().background_refetch(key, seen_seq));
                true
            }
            Err(_) => {
                log::debug!("no runtime available; {key} loads on next access");
                false
            }
        }
    }

    async fn background_refetch(self, key: QueryKey, seen_seq: u64) {
        let (gate, policy, refetch) = {
            let entries = self.inner.entries.lock();
            let Some(entry) = entries.get(&key) else {
                return;
            };
            let Some(refetch) = entry.refetch.clone() else {
                return;
            };
            (entry.gate.clone(), entry.policy, refetch)
        };

        let _guard = gate.lock_owned().await;
        {
            let entries = self.inner.entries.lock();
            match entries.get(&key) {
                None => return,
                Some(entry) if entry.applied_seq > seen_seq && !entry.stale => return,
                Some(_) => {}
            }
        }

        if let Err(err) = self.run_fetch(&key, policy, refetch).await {
            log::warn!("background refetch of {key} failed: {err}");
        }
    }

    /// Marks matching entries stale. Entries somebody is observing are
    /// refetched in the background; the rest refetch on next access.
    pub fn invalidate(&self, filter: impl Into<KeyFilter>) -> usize {
        let filter = filter.into();
        let mut invalidated = Vec::new();
        let mut active = Vec::new();
        {
            let mut entries = self.inner.entries.lock();
            for (key, entry) in entries.iter_mut().filter(|(key, _)| filter.matches(key)) {
                entry.stale = true;
                entry.generation += 1;
                invalidated.push(key.clone());
                if entry.observers > 0 && entry.refetch.is_some() {
                    active.push((key.clone(), entry.applied_seq));
                }
            }
        }

        log::debug!("invalidated {} entries matching {filter:?}", invalidated.len());
        let count = invalidated.len();
        for key in invalidated {
            self.emit(CacheEvent::Invalidated(key));
        }

        for (key, seen_seq) in active {
            self.spawn_refetch(key, seen_seq);
        }
        count
    }

    /// Drops matching entries outright, without refetching them.
    pub fn remove(&self, filter: impl Into<KeyFilter>) -> usize {
        let filter = filter.into();
        let removed: Vec<QueryKey> = {
            let mut entries = self.inner.entries.lock();
            let keys: Vec<QueryKey> = entries
                .keys()
                .filter(|key| filter.matches(key))
                .cloned()
                .collect();
            for key in &keys {
                entries.remove(key);
            }
            keys
        };

        let count = removed.len();
        for key in removed {
            self.emit(CacheEvent::Removed(key));
        }
        count
    }

    /// Replaces the data of one entry, creating it if needed.
    pub fn set_query_data<T: Send + Sync + 'static>(&self, key: QueryKey, value: T) {
        let now = Instant::now();
        {
            let policy = self.policy_for(key.family());
            let mut entries = self.inner.entries.lock();
            let entry = entries
                .entry(key.clone())
                .or_insert_with(|| Entry::new(policy, now));
            entry.data = Some(Arc::new(value));
            entry.status = QueryStatus::Success;
            entry.error = None;
            entry.updated_at = Some(now);
            entry.stale = false;
            entry.last_seen = now;
            entry.applied_seq = entry.started_seq;
        }
        self.emit(CacheEvent::Updated(key));
    }

    /// Rewrites the data of every matching entry that holds a `T`. Entries
    /// without data are left alone. Returns how many entries changed.
    pub fn update_query_data<T, F>(&self, filter: impl Into<KeyFilter>, update: F) -> usize
    where
        T: Send + Sync + 'static,
        F: Fn(&T) -> T,
    {
        let filter = filter.into();
        let mut updated = Vec::new();
        {
            let mut entries = self.inner.entries.lock();
            for (key, entry) in entries.iter_mut().filter(|(key, _)| filter.matches(key)) {
                let Some(current) = entry
                    .data
                    .as_ref()
                    .and_then(|data| (**data).downcast_ref::<T>())
                else {
                    continue;
                };
                let next: AnyData = Arc::new(update(current));
                entry.data = Some(next);
                updated.push(key.clone());
            }
        }

        let count = updated.len();
        for key in updated {
            self.emit(CacheEvent::Updated(key));
        }
        count
    }

    pub fn get_query_data<T: Send + Sync + 'static>(&self, key: &QueryKey) -> Option<Arc<T>> {
        let entries = self.inner.entries.lock();
        entries
            .get(key)
            .and_then(|entry| entry.data.clone())
            .and_then(|data| data.downcast::<T>().ok())
    }

    /// View-facing snapshot of one entry. An entry past its retention
    /// window is evicted first and reads as never loaded.
    pub fn state<T: Send + Sync + 'static>(&self, key: &QueryKey) -> QueryState<T> {
        let now = Instant::now();
        self.collect_garbage_at(now);
        let entries = self.inner.entries.lock();
        match entries.get(key) {
            None => QueryState::pending(),
            Some(entry) => QueryState {
                data: entry
                    .data
                    .clone()
                    .and_then(|data| data.downcast::<T>().ok()),
                status: entry.status,
                error: entry.error.clone(),
                is_fetching: entry.in_flight > 0,
                is_stale: !entry.is_fresh(now),
                is_placeholder: false,
            },
        }
    }

    pub(crate) fn observe(&self, key: &QueryKey) {
        let now = Instant::now();
        self.collect_garbage_at(now);
        let policy = self.policy_for(key.family());
        let mut entries = self.inner.entries.lock();
        let entry = entries
            .entry(key.clone())
            .or_insert_with(|| Entry::new(policy, now));
        entry.observers += 1;
        entry.last_seen = now;
    }

    pub(crate) fn unobserve(&self, key: &QueryKey) {
        let now = Instant::now();
        let mut entries = self.inner.entries.lock();
        if let Some(entry) = entries.get_mut(key) {
            entry.observers = entry.observers.saturating_sub(1);
            entry.last_seen = now;
        }
    }

    pub fn observer_count(&self, key: &QueryKey) -> usize {
        self.inner
            .entries
            .lock()
            .get(key)
            .map_or(0, |entry| entry.observers)
    }

    /// Evicts unobserved entries whose retention window has elapsed.
    ///
    /// Eviction is lazy: fetches, state reads and new observers sweep before
    /// touching the map, so this is only needed to free memory eagerly.
    pub fn collect_garbage(&self) -> usize {
        self.collect_garbage_at(Instant::now())
    }

    fn collect_garbage_at(&self, now: Instant) -> usize {
        let evicted: Vec<QueryKey> = {
            let mut entries = self.inner.entries.lock();
            let keys: Vec<QueryKey> = entries
                .iter()
                .filter(|(_, entry)| entry.is_expired(now))
                .map(|(key, _)| key.clone())
                .collect();
            for key in &keys {
                entries.remove(key);
            }
            keys
        };

        let count = evicted.len();
        for key in evicted {
            log::debug!("evicted {key}");
            self.emit(CacheEvent::Removed(key));
        }
        count
    }

    pub fn contains(&self, key: &QueryKey) -> bool {
        self.inner.entries.lock().contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.inner.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn erase<T, F>(fetcher: F) -> Refetcher
where
    T: Send + Sync + 'static,
    F: Fn() -> BoxFuture<'static, Result<T>> + Send + Sync + 'static,
{
    Arc::new(move || {
        fetcher()
            .map(|result| result.map(|value| Arc::new(value) as AnyData))
            .boxed()
    })
}

fn downcast<T: Send + Sync + 'static>(key: &QueryKey, data: AnyData) -> Result<Arc<T>> {
    data.downcast::<T>()
        .map_err(|_| ApiError::Decode(format!("cached value for {key} has an unexpected type")))
}
