//! Keyed single-flight loading.
//!
//! [`InFlightMap`] coalesces concurrent loads of the same key into one
//! underlying future. Every caller that arrives while the load is pending
//! awaits the same [`Shared`] future and receives the same `Arc<V>`.
//!
//! - Success is cached for the lifetime of the map.
//! - Failure removes the entry, so the next caller starts a fresh attempt
//!   instead of observing the old error forever.

use std::hash::Hash;
use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;
use rustc_hash::FxHashMap;

type SharedLoad<V, E> = Shared<BoxFuture<'static, Result<Arc<V>, E>>>;

enum Entry<V, E> {
    Loading(SharedLoad<V, E>),
    Ready(Arc<V>),
}

pub struct InFlightMap<K, V, E> {
    entries: Mutex<FxHashMap<K, Entry<V, E>>>,
}

impl<K, V, E> Default for InFlightMap<K, V, E> {
    fn default() -> Self {
        Self {
            entries: Mutex::new(FxHashMap::default()),
        }
    }
}

impl<K, V, E> InFlightMap<K, V, E>
where
    K: Eq + Hash + Clone,
    V: Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached value if a load for `key` has completed successfully.
    pub fn get(&self, key: &K) -> Option<Arc<V>> {
        match self.entries.lock().get(key) {
            Some(Entry::Ready(value)) => Some(Arc::clone(value)),
            _ => None,
        }
    }

    pub fn is_loading(&self, key: &K) -> bool {
        matches!(self.entries.lock().get(key), Some(Entry::Loading(_)))
    }

    /// Number of successfully cached values.
    pub fn ready_count(&self) -> usize {
        self.entries
            .lock()
            .values()
            .filter(|entry| matches!(entry, Entry::Ready(_)))
            .count()
    }

    /// Returns the cached value, joins the pending load, or starts `load`.
    ///
    /// `load` is only invoked when no value is cached and no load is pending.
    pub async fn get_or_load<F>(&self, key: K, load: F) -> Result<Arc<V>, E>
    where
        F: FnOnce() -> BoxFuture<'static, Result<V, E>>,
    {
        let flight = {
            let mut entries = self.entries.lock();
            match entries.get(&key) {
                Some(Entry::Ready(value)) => return Ok(Arc::clone(value)),
                Some(Entry::Loading(flight)) => flight.clone(),
                None => {
                    let flight = load().map(|result| result.map(Arc::new)).boxed().shared();
                    entries.insert(key.clone(), Entry::Loading(flight.clone()));
                    flight
                }
            }
        };

        let result = flight.clone().await;

        let mut entries = self.entries.lock();
        // A later flight may already own the slot; only settle our own.
        if let Some(Entry::Loading(current)) = entries.get(&key) {
            if current.ptr_eq(&flight) {
                match &result {
                    Ok(value) => {
                        entries.insert(key, Entry::Ready(Arc::clone(value)));
                    }
                    Err(_) => {
                        entries.remove(&key);
                    }
                }
            }
        }
        result
    }
}
