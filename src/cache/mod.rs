//! Keyed cache of query results with request de-duplication,
//! invalidation-on-mutation and observer-based eviction.
//!
//! Freshness model:
//! - an entry younger than `stale_time` and not explicitly invalidated is
//!   served without touching the network;
//! - an explicitly invalidated (or empty) entry blocks on a fetch, and all
//!   concurrent callers for that key share one in-flight future;
//! - an entry merely older than `stale_time` is served immediately while a
//!   de-duplicated refetch runs in the background, so views never flicker.
//!
//! Entries unobserved for longer than `gc_time` are removed by [`sweep`],
//! which bounds memory over a long-lived session.
//!
//! [`sweep`]: QueryCache::sweep

pub mod keys;

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use futures::future::{BoxFuture, Shared};
use futures::FutureExt;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use crate::error::ClientError;

type FetchOutcome = Result<Arc<Value>, ClientError>;
type SharedFetch = Shared<BoxFuture<'static, FetchOutcome>>;

/// Lifecycle of a cache entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryState {
    Idle,
    Fetching,
    Success,
    Error,
}

struct Entry {
    data: Option<Arc<Value>>,
    fetched_at: Option<Instant>,
    state: QueryState,
    stale: bool,
    observers: usize,
    last_observed: Instant,
}

impl Entry {
    fn new(now: Instant) -> Self {
        Self {
            data: None,
            fetched_at: None,
            state: QueryState::Idle,
            stale: false,
            observers: 0,
            last_observed: now,
        }
    }

    fn fresh_data(&self, now: Instant, stale_time: Duration) -> Option<Arc<Value>> {
        if self.stale {
            return None;
        }
        let fetched_at = self.fetched_at?;
        if now.duration_since(fetched_at) > stale_time {
            return None;
        }
        self.data.clone()
    }
}

#[derive(Default)]
struct State {
    entries: HashMap<String, Entry>,
    in_flight: HashMap<String, SharedFetch>,
}

impl State {
    fn sweep(&mut self, gc_time: Duration) {
        let now = Instant::now();
        let in_flight = &self.in_flight;
        self.entries.retain(|key, entry| {
            entry.observers > 0
                || in_flight.contains_key(key)
                || now.duration_since(entry.last_observed) <= gc_time
        });
    }
}

struct Inner {
    stale_time: Duration,
    gc_time: Duration,
    state: Mutex<State>,
}

fn lock(state: &Mutex<State>) -> MutexGuard<'_, State> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

enum Plan {
    Cached(Arc<Value>),
    Wait(SharedFetch),
    Revalidate(Arc<Value>, SharedFetch),
}

/// The remote data cache. Cheap to clone; clones share the same store.
#[derive(Clone)]
pub struct QueryCache {
    inner: Arc<Inner>,
}

impl QueryCache {
    pub fn new(stale_time: Duration, gc_time: Duration) -> Self {
        Self {
            inner: Arc::new(Inner {
                stale_time,
                gc_time,
                state: Mutex::new(State::default()),
            }),
        }
    }

    /// Read through the cache. `fetcher` is consumed only when this call is
    /// the one that actually starts a network fetch for `key`.
    pub async fn query<T, F, Fut>(&self, key: &str, fetcher: F) -> Result<T, ClientError>
    where
        T: DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Value, ClientError>> + Send + 'static,
    {
        let plan = {
            let mut state = lock(&self.inner.state);
            state.sweep(self.inner.gc_time);

            let now = Instant::now();
            let entry = state
                .entries
                .entry(key.to_owned())
                .or_insert_with(|| Entry::new(now));
            entry.last_observed = now;
            let fresh = entry.fresh_data(now, self.inner.stale_time);
            let invalidated = entry.stale;
            let cached = entry.data.clone();

            match fresh {
                Some(data) => Plan::Cached(data),
                None => {
                    let fetch = match state.in_flight.get(key).cloned() {
                        Some(existing) => existing,
                        None => self.register_fetch(&mut state, key, fetcher()),
                    };
                    match cached {
                        // Aged out but not invalidated: show what we have,
                        // refresh behind the scenes.
                        Some(data) if !invalidated => Plan::Revalidate(data, fetch),
                        _ => Plan::Wait(fetch),
                    }
                }
            }
        };

        match plan {
            Plan::Cached(data) => decode(&data),
            Plan::Wait(fetch) => decode(&fetch.await?),
            Plan::Revalidate(data, fetch) => {
                tokio::spawn(async move {
                    let _ = fetch.await;
                });
                decode(&data)
            }
        }
    }

    /// Run a write; on success mark the declared key prefixes stale so the
    /// next read of each refetches. A failed mutation leaves the cache
    /// untouched.
    pub async fn mutate<T, F, Fut>(&self, op: F, invalidates: &[String]) -> Result<T, ClientError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, ClientError>>,
    {
        let outcome = op().await?;
        for key in invalidates {
            self.invalidate(key);
        }
        Ok(outcome)
    }

    /// Mark every entry whose key starts with `prefix` stale. Idempotent;
    /// racing invalidations from a mutation and the live channel are safe.
    pub fn invalidate(&self, prefix: &str) {
        let mut state = lock(&self.inner.state);
        let mut marked = 0usize;
        for (key, entry) in state.entries.iter_mut() {
            if key.starts_with(prefix) {
                entry.stale = true;
                marked += 1;
            }
        }
        if marked > 0 {
            debug!(prefix, marked, "cache entries marked stale");
        }
    }

    /// Register interest in a key; the entry is exempt from eviction while
    /// the guard lives.
    pub fn observe(&self, key: &str) -> ObserverGuard {
        let mut state = lock(&self.inner.state);
        let now = Instant::now();
        let entry = state
            .entries
            .entry(key.to_owned())
            .or_insert_with(|| Entry::new(now));
        entry.observers += 1;
        ObserverGuard {
            inner: Arc::clone(&self.inner),
            key: key.to_owned(),
        }
    }

    /// Drop entries unobserved for longer than `gc_time`.
    pub fn sweep(&self) {
        lock(&self.inner.state).sweep(self.inner.gc_time);
    }

    pub fn contains(&self, key: &str) -> bool {
        lock(&self.inner.state).entries.contains_key(key)
    }

    pub fn is_stale(&self, key: &str) -> Option<bool> {
        lock(&self.inner.state)
            .entries
            .get(key)
            .map(|entry| entry.stale)
    }

    pub fn state_of(&self, key: &str) -> Option<QueryState> {
        lock(&self.inner.state)
            .entries
            .get(key)
            .map(|entry| entry.state)
    }

    /// Create the shared in-flight future for `key`. Must be called with
    /// the state lock held so two callers cannot both register.
    fn register_fetch<Fut>(&self, state: &mut State, key: &str, fut: Fut) -> SharedFetch
    where
        Fut: Future<Output = Result<Value, ClientError>> + Send + 'static,
    {
        let inner = Arc::clone(&self.inner);
        let key_owned = key.to_owned();
        let shared: SharedFetch = async move {
            let result = fut.await.map(Arc::new);
            let mut state = lock(&inner.state);
            state.in_flight.remove(&key_owned);
            let now = Instant::now();
            let entry = state
                .entries
                .entry(key_owned)
                .or_insert_with(|| Entry::new(now));
            match &result {
                Ok(data) => {
                    entry.data = Some(Arc::clone(data));
                    entry.fetched_at = Some(now);
                    entry.stale = false;
                    entry.state = QueryState::Success;
                }
                Err(_) => {
                    // Keep any previous data; the error is the caller's to
                    // surface as a view state.
                    entry.state = QueryState::Error;
                }
            }
            result
        }
        .boxed()
        .shared();

        state.in_flight.insert(key.to_owned(), shared.clone());
        if let Some(entry) = state.entries.get_mut(key) {
            entry.state = QueryState::Fetching;
        }
        shared
    }
}

/// RAII registration of an active subscriber; dropping it stamps the
/// last-observed time so eviction starts counting from release.
pub struct ObserverGuard {
    inner: Arc<Inner>,
    key: String,
}

impl Drop for ObserverGuard {
    fn drop(&mut self) {
        let mut state = lock(&self.inner.state);
        if let Some(entry) = state.entries.get_mut(&self.key) {
            entry.observers = entry.observers.saturating_sub(1);
            entry.last_observed = Instant::now();
        }
    }
}

fn decode<T: DeserializeOwned>(value: &Arc<Value>) -> Result<T, ClientError> {
    serde_json::from_value(value.as_ref().clone()).map_err(ClientError::from)
}
