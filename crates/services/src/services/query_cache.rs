//! Process-wide store of remote reads, keyed by [`QueryKey`].
//!
//! Every read goes through [`QueryCache::get`] or [`QueryCache::fetch`]. A key
//! has at most one fetch in flight; concurrent readers share it. Writes to the
//! cache only ever come from a finished fetch or from [`QueryCache::invalidate`].

use std::{
    any::Any,
    collections::HashMap,
    panic::AssertUnwindSafe,
    sync::{
        Arc, Mutex, MutexGuard,
        atomic::{AtomicU64, Ordering},
    },
    time::{Duration, Instant},
};

use chrono::{DateTime, Utc};
use futures::{
    FutureExt,
    future::{BoxFuture, Shared},
};
use strum_macros::Display;
use tokio::sync::broadcast;
use tokio_stream::{StreamExt, wrappers::BroadcastStream};
use tracing::{debug, trace, warn};

use super::{api_client::ApiError, fetchers::Fetcher, query_key::QueryKey};

type Payload = Arc<dyn Any + Send + Sync>;
type InFlight = Shared<BoxFuture<'static, Result<Payload, ApiError>>>;

const EVENT_CAPACITY: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum QueryStatus {
    Idle,
    Loading,
    Success,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum CacheEventKind {
    Loading,
    Updated,
    Failed,
    Invalidated,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEvent {
    pub key: QueryKey,
    pub kind: CacheEventKind,
}

#[derive(Debug, Clone, Default)]
pub struct CacheConfig {
    /// How long a successful read stays fresh. `None` keeps it fresh until invalidated.
    pub stale_time: Option<Duration>,
}

/// Typed snapshot of one cache slot.
#[derive(Debug)]
pub struct CacheEntry<T> {
    pub key: QueryKey,
    pub data: Option<Arc<T>>,
    pub status: QueryStatus,
    pub error: Option<ApiError>,
    pub last_fetched_at: Option<DateTime<Utc>>,
    pub is_stale: bool,
}

impl<T> Clone for CacheEntry<T> {
    fn clone(&self) -> Self {
        Self {
            key: self.key.clone(),
            data: self.data.clone(),
            status: self.status,
            error: self.error.clone(),
            last_fetched_at: self.last_fetched_at,
            is_stale: self.is_stale,
        }
    }
}

impl<T> CacheEntry<T> {
    pub fn is_loading(&self) -> bool {
        self.status == QueryStatus::Loading
    }

    /// Nothing to show yet: no data and no error.
    pub fn is_pending(&self) -> bool {
        self.data.is_none() && matches!(self.status, QueryStatus::Idle | QueryStatus::Loading)
    }
}

struct Slot {
    data: Option<Payload>,
    status: QueryStatus,
    error: Option<ApiError>,
    last_fetched_at: Option<DateTime<Utc>>,
    fetched_at: Option<Instant>,
    stale: bool,
    generation: u64,
    in_flight: Option<Pending>,
}

/// A running fetch and the generation it was started for.
struct Pending {
    id: u64,
    generation: u64,
    future: InFlight,
}

impl Slot {
    fn new() -> Self {
        Self {
            data: None,
            status: QueryStatus::Idle,
            error: None,
            last_fetched_at: None,
            fetched_at: None,
            stale: false,
            generation: 0,
            in_flight: None,
        }
    }

    fn is_expired(&self, stale_time: Option<Duration>) -> bool {
        match (stale_time, self.fetched_at) {
            (Some(ttl), Some(at)) => at.elapsed() >= ttl,
            _ => false,
        }
    }

    fn is_stale(&self, stale_time: Option<Duration>) -> bool {
        self.stale || self.is_expired(stale_time)
    }

    /// The in-flight fetch, if it started after the latest invalidation.
    fn current_fetch(&self) -> Option<InFlight> {
        self.in_flight
            .as_ref()
            .filter(|pending| pending.generation == self.generation)
            .map(|pending| pending.future.clone())
    }

    fn needs_fetch(&self, stale_time: Option<Duration>) -> bool {
        if let Some(pending) = &self.in_flight {
            // A fetch that predates an invalidation cannot answer a new read.
            return pending.generation != self.generation;
        }
        match self.status {
            QueryStatus::Idle => true,
            QueryStatus::Loading => false,
            QueryStatus::Success => self.is_stale(stale_time),
            // Errors stick until someone invalidates or retries.
            QueryStatus::Error => self.stale,
        }
    }

    fn snapshot<T: Send + Sync + 'static>(
        &self,
        key: &QueryKey,
        stale_time: Option<Duration>,
    ) -> CacheEntry<T> {
        CacheEntry {
            key: key.clone(),
            data: self.data.clone().and_then(|payload| downcast(key, payload)),
            status: self.status,
            error: self.error.clone(),
            last_fetched_at: self.last_fetched_at,
            is_stale: self.is_stale(stale_time),
        }
    }
}

fn downcast<T: Send + Sync + 'static>(key: &QueryKey, payload: Payload) -> Option<Arc<T>> {
    match payload.downcast::<T>() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!(
                key = %key,
                expected = std::any::type_name::<T>(),
                "cached value has a different type"
            );
            None
        }
    }
}

struct Inner {
    config: CacheConfig,
    slots: Mutex<HashMap<QueryKey, Slot>>,
    events: broadcast::Sender<CacheEvent>,
    next_fetch_id: AtomicU64,
}

impl Inner {
    fn slots(&self) -> MutexGuard<'_, HashMap<QueryKey, Slot>> {
        self.slots.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn emit(&self, key: &QueryKey, kind: CacheEventKind) {
        trace!(key = %key, %kind, "cache event");
        // No receivers is fine.
        let _ = self.events.send(CacheEvent {
            key: key.clone(),
            kind,
        });
    }

    fn complete(
        &self,
        key: &QueryKey,
        fetch_id: u64,
        generation: u64,
        result: &Result<Payload, ApiError>,
    ) {
        let kind = {
            let mut slots = self.slots();
            let Some(slot) = slots.get_mut(key) else {
                debug!(key = %key, "fetch finished after the cache was cleared");
                return;
            };
            if !matches!(&slot.in_flight, Some(pending) if pending.id == fetch_id) {
                debug!(key = %key, "dropping result of a superseded fetch");
                return;
            }

            slot.in_flight = None;
            // An invalidation that raced this fetch wins: keep the data, stay stale.
            slot.stale = slot.generation != generation;
            match result {
                Ok(payload) => {
                    slot.data = Some(Arc::clone(payload));
                    slot.status = QueryStatus::Success;
                    slot.error = None;
                    slot.last_fetched_at = Some(Utc::now());
                    slot.fetched_at = Some(Instant::now());
                    CacheEventKind::Updated
                }
                Err(err) => {
                    slot.status = QueryStatus::Error;
                    slot.error = Some(err.clone());
                    CacheEventKind::Failed
                }
            }
        };

        match result {
            Ok(_) => debug!(key = %key, "fetch succeeded"),
            Err(err) => warn!(key = %key, error = %err, "fetch failed"),
        }
        self.emit(key, kind);
    }
}

/// Shared store of remote reads. Clones share the same slots.
#[derive(Clone)]
pub struct QueryCache {
    inner: Arc<Inner>,
}

impl Default for QueryCache {
    fn default() -> Self {
        Self::new(CacheConfig::default())
    }
}

impl QueryCache {
    pub fn new(config: CacheConfig) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            inner: Arc::new(Inner {
                config,
                slots: Mutex::new(HashMap::new()),
                events,
                next_fetch_id: AtomicU64::new(1),
            }),
        }
    }

    pub fn config(&self) -> &CacheConfig {
        &self.inner.config
    }

    /// Current entry for the fetcher's key. Schedules a background fetch when
    /// the entry is idle or stale. Must be called inside a Tokio runtime.
    pub fn get<F: Fetcher>(&self, fetcher: &F) -> CacheEntry<F::Output> {
        let key = fetcher.key();
        let stale_time = self.inner.config.stale_time;
        let mut slots = self.inner.slots();
        let slot = slots.entry(key.clone()).or_insert_with(Slot::new);
        if slot.needs_fetch(stale_time) {
            self.start_fetch(&key, slot, fetcher);
        }
        slot.snapshot(&key, stale_time)
    }

    /// Resolves the fetcher's key, joining an in-flight fetch or starting one
    /// when the entry is idle or stale. Fresh data is returned without a request.
    pub async fn fetch<F: Fetcher>(&self, fetcher: &F) -> Result<Arc<F::Output>, ApiError> {
        let key = fetcher.key();
        let pending = {
            let stale_time = self.inner.config.stale_time;
            let mut slots = self.inner.slots();
            let slot = slots.entry(key.clone()).or_insert_with(Slot::new);

            if let Some(in_flight) = slot.current_fetch() {
                in_flight
            } else if slot.needs_fetch(stale_time) {
                self.start_fetch(&key, slot, fetcher)
            } else if slot.status == QueryStatus::Error {
                return Err(slot
                    .error
                    .clone()
                    .unwrap_or_else(|| ApiError::Transport("unknown fetch failure".into())));
            } else {
                return slot
                    .data
                    .clone()
                    .and_then(|payload| downcast(&key, payload))
                    .ok_or_else(|| type_mismatch::<F::Output>(&key));
            }
        };

        let payload = pending.await?;
        downcast(&key, payload).ok_or_else(|| type_mismatch::<F::Output>(&key))
    }

    /// Explicit user retry: forget the freshness of exactly this key, then fetch.
    pub async fn refetch<F: Fetcher>(&self, fetcher: &F) -> Result<Arc<F::Output>, ApiError> {
        let key = fetcher.key();
        {
            let mut slots = self.inner.slots();
            if let Some(slot) = slots.get_mut(&key) {
                slot.stale = true;
                slot.generation += 1;
            }
        }
        self.fetch(fetcher).await
    }

    /// Snapshot without scheduling anything.
    pub fn peek<T: Send + Sync + 'static>(&self, key: &QueryKey) -> Option<CacheEntry<T>> {
        let stale_time = self.inner.config.stale_time;
        self.inner
            .slots()
            .get(key)
            .map(|slot| slot.snapshot(key, stale_time))
    }

    /// Marks every entry under `prefix` stale. Cached data stays readable until
    /// the refetch lands. Returns how many entries matched.
    pub fn invalidate(&self, prefix: &QueryKey) -> usize {
        let matched: Vec<QueryKey> = {
            let mut slots = self.inner.slots();
            slots
                .iter_mut()
                .filter(|(key, _)| prefix.is_prefix_of(key))
                .map(|(key, slot)| {
                    slot.stale = true;
                    slot.generation += 1;
                    key.clone()
                })
                .collect()
        };

        debug!(prefix = %prefix, matched = matched.len(), "invalidated");
        for key in &matched {
            self.inner.emit(key, CacheEventKind::Invalidated);
        }
        matched.len()
    }

    /// Drops every slot, e.g. on a full reload. In-flight fetches finish but
    /// their results are discarded.
    pub fn clear(&self) {
        let dropped = {
            let mut slots = self.inner.slots();
            let keys: Vec<QueryKey> = slots.keys().cloned().collect();
            slots.clear();
            keys
        };
        for key in &dropped {
            self.inner.emit(key, CacheEventKind::Invalidated);
        }
    }

    pub fn keys(&self) -> Vec<QueryKey> {
        let mut keys: Vec<QueryKey> = self.inner.slots().keys().cloned().collect();
        keys.sort();
        keys
    }

    /// Observe changes to every key under any of `prefixes`. An empty list
    /// observes the whole cache.
    pub fn subscribe(&self, prefixes: Vec<QueryKey>) -> Subscription {
        Subscription {
            prefixes,
            events: BroadcastStream::new(self.inner.events.subscribe()),
        }
    }

    fn start_fetch<F: Fetcher>(&self, key: &QueryKey, slot: &mut Slot, fetcher: &F) -> InFlight {
        let fetch_id = self.inner.next_fetch_id.fetch_add(1, Ordering::Relaxed);
        let generation = slot.generation;
        let inner = Arc::clone(&self.inner);
        let task_key = key.clone();
        let fetcher = fetcher.clone();

        debug!(key = %key, generation, "starting fetch");
        // Runs detached so the cache is updated even if every reader goes away.
        let handle = tokio::spawn(async move {
            let result = match AssertUnwindSafe(fetcher.fetch()).catch_unwind().await {
                Ok(result) => result.map(|value| Arc::new(value) as Payload),
                Err(_) => Err(ApiError::Transport("fetch task panicked".into())),
            };
            inner.complete(&task_key, fetch_id, generation, &result);
            result
        });

        let shared = async move {
            handle
                .await
                .unwrap_or_else(|e| Err(ApiError::Transport(format!("fetch task failed: {e}"))))
        }
        .boxed()
        .shared();

        if slot.in_flight.is_some() {
            debug!(key = %key, "superseding a fetch started before invalidation");
        }
        slot.in_flight = Some(Pending {
            id: fetch_id,
            generation,
            future: shared.clone(),
        });
        slot.status = QueryStatus::Loading;
        self.inner.emit(key, CacheEventKind::Loading);
        shared
    }
}

fn type_mismatch<T>(key: &QueryKey) -> ApiError {
    ApiError::Serde(format!(
        "cached value for {key} is not a {}",
        std::any::type_name::<T>()
    ))
}

/// Stream of cache events filtered to a set of key prefixes.
pub struct Subscription {
    prefixes: Vec<QueryKey>,
    events: BroadcastStream<CacheEvent>,
}

impl Subscription {
    pub fn matches(&self, key: &QueryKey) -> bool {
        self.prefixes.is_empty() || self.prefixes.iter().any(|p| p.is_prefix_of(key))
    }

    /// Next matching event, or `None` once the cache is gone. A subscriber that
    /// fell behind gets a single `Updated` event on the root key.
    pub async fn next(&mut self) -> Option<CacheEvent> {
        while let Some(event) = self.events.next().await {
            match event {
                Ok(event) if self.matches(&event.key) => return Some(event),
                Ok(_) => continue,
                Err(err) => {
                    warn!(error = %err, "cache subscriber lagged");
                    return Some(CacheEvent {
                        key: QueryKey::root(),
                        kind: CacheEventKind::Updated,
                    });
                }
            }
        }
        None
    }
}
