//! View models recomputed from cached reads whenever their inputs change.

use super::{
    query_cache::{CacheEventKind, QueryCache, Subscription},
    query_key::QueryKey,
};

type Compute<V> = Box<dyn Fn(&QueryCache) -> V + Send + Sync>;

/// A pure projection over one or more cache keys.
///
/// The projection reads with [`QueryCache::peek`], so computing a view never
/// schedules a request.
pub struct DerivedView<V> {
    cache: QueryCache,
    inputs: Subscription,
    compute: Compute<V>,
}

impl<V> DerivedView<V> {
    pub fn new<F>(cache: &QueryCache, inputs: Vec<QueryKey>, compute: F) -> Self
    where
        F: Fn(&QueryCache) -> V + Send + Sync + 'static,
    {
        Self {
            cache: cache.clone(),
            inputs: cache.subscribe(inputs),
            compute: Box::new(compute),
        }
    }

    pub fn current(&self) -> V {
        (self.compute)(&self.cache)
    }

    /// Waits until an input settles or is invalidated and returns the
    /// recomputed view. `None` once the cache is dropped.
    pub async fn changed(&mut self) -> Option<V> {
        loop {
            let event = self.inputs.next().await?;
            // Loading alone does not change what a view shows.
            if event.kind != CacheEventKind::Loading {
                return Some(self.current());
            }
        }
    }
}
