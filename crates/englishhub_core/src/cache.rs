//! crates/englishhub_core/src/cache.rs
//!
//! A client-side query cache keyed by resource type and parameters.
//!
//! Reads go through `QueryCache::fetch`, which returns a fresh cached value or
//! runs the fetcher and stores its result. Mutations call `invalidate` on
//! success; invalidated entries stay in place but are stale, so the next read
//! refetches. Errors are never cached.

use crate::domain::Id;
use crate::ports::PortResult;
use std::any::Any;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use sha2::{Digest, Sha256};
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::debug;

/// Whose data a per-user entry holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scope {
    Anonymous,
    /// SHA-256 of the bearer token, so keys and logs never carry the token itself.
    Token([u8; 32]),
}

impl Scope {
    pub fn of_token(token: &str) -> Self {
        Scope::Token(Sha256::digest(token.as_bytes()).into())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum QueryKey {
    Profile(Scope),
    Lessons { page: u32, limit: u32 },
    LessonSearch(String),
    Lesson(Id),
    MyLessons(Scope),
    Comments(Id),
}

/// A set of keys to invalidate or evict.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Invalidate {
    /// Every lesson list page and every search result.
    LessonLists,
    Lesson(Id),
    /// "My lessons" for every user.
    MyLessons,
    Comments(Id),
    /// Everything cached on behalf of one credential.
    Scope(Scope),
}

impl Invalidate {
    pub fn matches(&self, key: &QueryKey) -> bool {
        match (self, key) {
            (Invalidate::LessonLists, QueryKey::Lessons { .. } | QueryKey::LessonSearch(_)) => {
                true
            }
            (Invalidate::Lesson(id), QueryKey::Lesson(key_id)) => id == key_id,
            (Invalidate::MyLessons, QueryKey::MyLessons(_)) => true,
            (Invalidate::Comments(id), QueryKey::Comments(key_id)) => id == key_id,
            (Invalidate::Scope(scope), QueryKey::Profile(key_scope) | QueryKey::MyLessons(key_scope)) => {
                scope == key_scope
            }
            _ => false,
        }
    }
}

pub const DEFAULT_TTL: Duration = Duration::from_secs(60);
pub const DEFAULT_CAPACITY: usize = 1024;

struct Entry {
    value: Arc<dyn Any + Send + Sync>,
    stale: bool,
    fetched_at: Instant,
}

impl Entry {
    fn is_fresh(&self, ttl: Duration) -> bool {
        !self.stale && self.fetched_at.elapsed() < ttl
    }
}

/// Entries go stale `ttl` after they were fetched. At most `capacity` entries
/// are held; a full cache first drops stale entries, then the oldest one.
pub struct QueryCache {
    entries: RwLock<HashMap<QueryKey, Entry>>,
    ttl: Duration,
    capacity: usize,
}

impl Default for QueryCache {
    fn default() -> Self {
        Self::with_limits(DEFAULT_TTL, DEFAULT_CAPACITY)
    }
}

impl QueryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limits(ttl: Duration, capacity: usize) -> Self {
        Self { entries: RwLock::new(HashMap::new()), ttl, capacity: capacity.max(1) }
    }

    /// Returns the fresh cached value for `key`, or runs `fetcher` and caches its result.
    ///
    /// Concurrent misses on the same key may each run their fetcher; the last
    /// writer wins.
    pub async fn fetch<T, F, Fut>(&self, key: QueryKey, fetcher: F) -> PortResult<T>
    where
        T: Clone + Send + Sync + 'static,
        F: FnOnce() -> Fut,
        Fut: Future<Output = PortResult<T>>,
    {
        {
            let entries = self.entries.read().await;
            if let Some(entry) = entries.get(&key) {
                if entry.is_fresh(self.ttl) {
                    if let Some(value) = entry.value.downcast_ref::<T>() {
                        debug!(?key, "query cache hit");
                        return Ok(value.clone());
                    }
                }
            }
        }

        debug!(?key, "query cache miss");
        let value = fetcher().await?;
        let mut entries = self.entries.write().await;
        if !entries.contains_key(&key) && entries.len() >= self.capacity {
            let ttl = self.ttl;
            entries.retain(|_, entry| entry.is_fresh(ttl));
            if entries.len() >= self.capacity {
                let oldest = entries
                    .iter()
                    .min_by_key(|(_, entry)| entry.fetched_at)
                    .map(|(key, _)| key.clone());
                if let Some(oldest) = oldest {
                    debug!(key = ?oldest, "query cache full, dropping oldest entry");
                    entries.remove(&oldest);
                }
            }
        }
        entries.insert(
            key,
            Entry { value: Arc::new(value.clone()), stale: false, fetched_at: Instant::now() },
        );
        Ok(value)
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Reads whatever is cached for `key`, fresh or stale, without fetching.
    pub async fn peek<T>(&self, key: &QueryKey) -> Option<T>
    where
        T: Clone + Send + Sync + 'static,
    {
        let entries = self.entries.read().await;
        entries
            .get(key)
            .and_then(|entry| entry.value.downcast_ref::<T>())
            .cloned()
    }

    pub async fn is_stale(&self, key: &QueryKey) -> Option<bool> {
        self.entries.read().await.get(key).map(|entry| !entry.is_fresh(self.ttl))
    }

    /// Marks every matching entry stale. Returns how many entries were affected.
    pub async fn invalidate(&self, target: Invalidate) -> usize {
        let mut entries = self.entries.write().await;
        let mut count = 0;
        for (key, entry) in entries.iter_mut() {
            if target.matches(key) {
                entry.stale = true;
                count += 1;
            }
        }
        debug!(?target, count, "query cache invalidated");
        count
    }

    /// Drops every matching entry outright.
    pub async fn evict(&self, target: Invalidate) -> usize {
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|key, _| !target.matches(key));
        let count = before - entries.len();
        debug!(?target, count, "query cache evicted");
        count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::PortError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    async fn counted(cache: &QueryCache, key: QueryKey, calls: &AtomicUsize) -> PortResult<u32> {
        cache
            .fetch(key, || async {
                Ok(calls.fetch_add(1, Ordering::SeqCst) as u32)
            })
            .await
    }

    #[tokio::test]
    async fn fresh_entries_are_served_without_refetching() {
        let cache = QueryCache::new();
        let calls = AtomicUsize::new(0);
        let key = QueryKey::Lessons { page: 1, limit: 12 };

        assert_eq!(counted(&cache, key.clone(), &calls).await, Ok(0));
        assert_eq!(counted(&cache, key, &calls).await, Ok(0));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn invalidation_forces_the_next_read_to_refetch() {
        let cache = QueryCache::new();
        let calls = AtomicUsize::new(0);
        let key = QueryKey::Comments(Id::from("7"));

        counted(&cache, key.clone(), &calls).await.unwrap();
        assert_eq!(cache.invalidate(Invalidate::Comments(Id::from("7"))).await, 1);
        assert_eq!(cache.is_stale(&key).await, Some(true));

        assert_eq!(counted(&cache, key.clone(), &calls).await, Ok(1));
        assert_eq!(cache.is_stale(&key).await, Some(false));
    }

    #[tokio::test]
    async fn lesson_list_invalidation_covers_pages_and_searches_only() {
        let cache = QueryCache::new();
        let calls = AtomicUsize::new(0);
        counted(&cache, QueryKey::Lessons { page: 1, limit: 12 }, &calls).await.unwrap();
        counted(&cache, QueryKey::Lessons { page: 2, limit: 12 }, &calls).await.unwrap();
        counted(&cache, QueryKey::LessonSearch("tense".into()), &calls).await.unwrap();
        counted(&cache, QueryKey::Lesson(Id::from("1")), &calls).await.unwrap();

        assert_eq!(cache.invalidate(Invalidate::LessonLists).await, 3);
        assert_eq!(cache.is_stale(&QueryKey::Lesson(Id::from("1"))).await, Some(false));
    }

    #[tokio::test]
    async fn failed_fetches_are_not_cached() {
        let cache = QueryCache::new();
        let key = QueryKey::Lesson(Id::from("404"));

        let missing: PortResult<u32> = cache
            .fetch(key.clone(), || async { Err(PortError::NotFound("lesson".into())) })
            .await;
        assert!(missing.is_err());
        assert_eq!(cache.peek::<u32>(&key).await, None);
    }

    #[tokio::test]
    async fn scope_eviction_only_touches_that_credential() {
        let cache = QueryCache::new();
        let calls = AtomicUsize::new(0);
        let mine = Scope::of_token("token-1");
        let theirs = Scope::of_token("token-2");
        counted(&cache, QueryKey::Profile(mine), &calls).await.unwrap();
        counted(&cache, QueryKey::MyLessons(mine), &calls).await.unwrap();
        counted(&cache, QueryKey::Profile(theirs), &calls).await.unwrap();

        assert_eq!(cache.evict(Invalidate::Scope(mine)).await, 2);
        assert_eq!(cache.peek::<u32>(&QueryKey::Profile(theirs)).await, Some(2));
    }

    #[tokio::test]
    async fn entries_older_than_the_ttl_are_refetched() {
        let cache = QueryCache::with_limits(Duration::ZERO, DEFAULT_CAPACITY);
        let calls = AtomicUsize::new(0);
        let key = QueryKey::Lesson(Id::from("1"));

        counted(&cache, key.clone(), &calls).await.unwrap();
        assert_eq!(cache.is_stale(&key).await, Some(true));
        assert_eq!(counted(&cache, key, &calls).await, Ok(1));
    }

    #[tokio::test]
    async fn a_full_cache_drops_its_oldest_entry() {
        let cache = QueryCache::with_limits(DEFAULT_TTL, 2);
        let calls = AtomicUsize::new(0);
        for page in 1..=5 {
            counted(&cache, QueryKey::Lessons { page, limit: 12 }, &calls).await.unwrap();
            tokio::time::sleep(Duration::from_millis(2)).await;
        }

        assert_eq!(cache.len().await, 2);
        assert_eq!(cache.peek::<u32>(&QueryKey::Lessons { page: 1, limit: 12 }).await, None);
        assert_eq!(cache.peek::<u32>(&QueryKey::Lessons { page: 5, limit: 12 }).await, Some(4));
    }

    #[tokio::test]
    async fn a_full_cache_drops_stale_entries_first() {
        let cache = QueryCache::with_limits(DEFAULT_TTL, 2);
        let calls = AtomicUsize::new(0);
        let first = QueryKey::Lesson(Id::from("1"));
        let second = QueryKey::Lesson(Id::from("2"));
        counted(&cache, first.clone(), &calls).await.unwrap();
        counted(&cache, second.clone(), &calls).await.unwrap();
        cache.invalidate(Invalidate::Lesson(Id::from("2"))).await;

        counted(&cache, QueryKey::Lesson(Id::from("3")), &calls).await.unwrap();

        assert_eq!(cache.peek::<u32>(&first).await, Some(0));
        assert_eq!(cache.peek::<u32>(&second).await, None);
    }

    #[test]
    fn token_scopes_are_digests() {
        assert_eq!(Scope::of_token("abc"), Scope::of_token("abc"));
        assert_ne!(Scope::of_token("abc"), Scope::of_token("abd"));
        assert_ne!(Scope::of_token(""), Scope::Anonymous);
    }
}
