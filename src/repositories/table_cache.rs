//! Time-boxed table snapshot cache
//!
//! One entry per [`TableId`]. A read inside the TTL is served from memory even
//! if the remote changed out-of-band; mutations drop the entry explicitly.
//! The lock is never held across a remote fetch.

use lru::LruCache;
use std::collections::HashMap;
use std::future::Future;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;

use crate::errors::StoreResult;
use crate::models::{SheetSnapshot, TableId};

struct CachedTable {
    fetched_at: Instant,
    snapshot: Arc<SheetSnapshot>,
}

struct CacheState {
    entries: LruCache<TableId, CachedTable>,
    /// Per-table count of invalidations; a fetch that raced one is not stored
    generations: HashMap<TableId, u64>,
    /// Bumped by `clear`, which invalidates every table at once
    epoch: u64,
}

impl CacheState {
    fn generation(&self, table: &TableId) -> (u64, u64) {
        (self.epoch, self.generations.get(table).copied().unwrap_or(0))
    }

    fn bump(&mut self, table: &TableId) {
        let generation = self.generations.entry(table.clone()).or_insert(0);
        *generation = generation.wrapping_add(1);
    }
}

pub struct TableCache {
    state: Mutex<CacheState>,
}

impl TableCache {
    pub fn new(max_tables: usize) -> Self {
        let capacity = NonZeroUsize::new(max_tables).unwrap_or(NonZeroUsize::MIN);
        Self {
            state: Mutex::new(CacheState {
                entries: LruCache::new(capacity),
                generations: HashMap::new(),
                epoch: 0,
            }),
        }
    }

    /// Cached snapshot if younger than `ttl`, otherwise the result of `fetch`
    pub async fn get_or_fetch<F, Fut>(
        &self,
        table: &TableId,
        ttl: Duration,
        fetch: F,
    ) -> StoreResult<Arc<SheetSnapshot>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = StoreResult<SheetSnapshot>>,
    {
        let generation = {
            let mut state = self.state.lock().await;
            if let Some(entry) = state.entries.get(table) {
                if entry.fetched_at.elapsed() < ttl {
                    debug!("Cache hit for {}", table);
                    return Ok(entry.snapshot.clone());
                }
            }
            state.generation(table)
        };

        debug!("Cache miss for {}, fetching", table);
        let snapshot = Arc::new(fetch().await?);

        let mut state = self.state.lock().await;
        if state.generation(table) == generation {
            state.entries.put(
                table.clone(),
                CachedTable {
                    fetched_at: Instant::now(),
                    snapshot: snapshot.clone(),
                },
            );
        } else {
            debug!("{} was invalidated during fetch; not caching", table);
        }
        Ok(snapshot)
    }

    pub async fn invalidate(&self, table: &TableId) {
        let mut state = self.state.lock().await;
        state.bump(table);
        if state.entries.pop(table).is_some() {
            debug!("Invalidated cached snapshot for {}", table);
        }
    }

    pub async fn clear(&self) {
        let mut state = self.state.lock().await;
        state.epoch = state.epoch.wrapping_add(1);
        state.entries.clear();
    }

    pub async fn len(&self) -> usize {
        self.state.lock().await.entries.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
