//! Short-lived cache of rendered feed pages.
//!
//! Entries expire by deadline only. Nothing on the write path touches the
//! cache, so a new or edited post may stay invisible on a cached page until
//! its entry expires or the cache is cleared.

use crate::feed::FeedKind;
use bytes::Bytes;
use quire_common::{pagination::PageNumber, util::PositiveDuration};
use std::collections::HashMap;
use tokio::{sync::RwLock, time::Instant};

#[derive(Clone, Eq, PartialEq, Debug, Hash)]
pub struct FeedCacheKey {
    pub kind: FeedKind,
    pub page: PageNumber,
}

#[derive(Clone, Debug)]
struct Entry<V> {
    value: V,
    /// `None` if the deadline lies beyond what the clock can represent.
    expires_at: Option<Instant>,
}

impl<V> Entry<V> {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.is_none_or(|expires_at| now < expires_at)
    }
}

/// Deadlines are read from the tokio clock, so paused test runtimes control
/// expiry.
#[derive(Debug)]
pub struct FeedCache<V = Bytes> {
    entries: RwLock<HashMap<FeedCacheKey, Entry<V>>>,
}

impl<V: Clone> FeedCache<V> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// An expired entry counts as a miss and is evicted.
    pub async fn get(&self, key: &FeedCacheKey) -> Option<V> {
        let now = Instant::now();
        {
            let entries = self.entries.read().await;
            match entries.get(key) {
                None => return None,
                Some(entry) if entry.is_live(now) => return Some(entry.value.clone()),
                Some(_) => {}
            }
        }

        let mut entries = self.entries.write().await;
        if entries.get(key).is_some_and(|entry| !entry.is_live(now)) {
            entries.remove(key);
        }
        None
    }

    /// Expired entries are dropped on every write.
    pub async fn put(&self, key: FeedCacheKey, value: V, ttl: PositiveDuration) {
        let now = Instant::now();
        let expires_at = now.checked_add(ttl.to_std());
        let mut entries = self.entries.write().await;
        entries.retain(|_, entry| entry.is_live(now));
        entries.insert(key, Entry { value, expires_at });
    }

    pub async fn clear(&self) {
        self.entries.write().await.clear();
    }

    /// Number of entries that have not expired yet.
    pub async fn len(&self) -> usize {
        let now = Instant::now();
        let entries = self.entries.read().await;
        entries.values().filter(|entry| entry.is_live(now)).count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl<V: Clone> Default for FeedCache<V> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        cache::{FeedCache, FeedCacheKey},
        feed::FeedKind,
    };
    use quire_common::{pagination::PageNumber, util::PositiveDuration};
    use std::time::Duration;

    fn key(page: u32) -> FeedCacheKey {
        FeedCacheKey {
            kind: FeedKind::All,
            page: PageNumber::new(page).unwrap(),
        }
    }

    fn ttl(seconds: u64) -> PositiveDuration {
        PositiveDuration::from_secs(seconds).unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn entries_expire_after_ttl() {
        let cache = FeedCache::<&str>::new();
        cache.put(key(1), "page one", ttl(20)).await;

        tokio::time::advance(Duration::from_secs(19)).await;
        assert_eq!(cache.get(&key(1)).await, Some("page one"));

        tokio::time::advance(Duration::from_secs(1)).await;
        assert_eq!(cache.get(&key(1)).await, None);
        assert!(cache.is_empty().await);
    }

    #[tokio::test(start_paused = true)]
    async fn pages_are_cached_separately() {
        let cache = FeedCache::<&str>::new();
        cache.put(key(1), "page one", ttl(20)).await;
        cache.put(key(2), "page two", ttl(20)).await;

        assert_eq!(cache.get(&key(2)).await, Some("page two"));
        assert_eq!(cache.len().await, 2);

        cache.clear().await;
        assert_eq!(cache.get(&key(1)).await, None);
        assert_eq!(cache.len().await, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn put_replaces_and_restarts_deadline() {
        let cache = FeedCache::<&str>::new();
        cache.put(key(1), "old", ttl(20)).await;
        tokio::time::advance(Duration::from_secs(15)).await;
        cache.put(key(1), "new", ttl(20)).await;
        tokio::time::advance(Duration::from_secs(15)).await;

        assert_eq!(cache.get(&key(1)).await, Some("new"));
    }

    #[tokio::test(start_paused = true)]
    async fn put_drops_expired_pages() {
        let cache = FeedCache::<&str>::new();
        for page in 1..=5000 {
            cache.put(key(page), "stale", ttl(20)).await;
        }

        tokio::time::advance(Duration::from_secs(3600)).await;
        cache.put(key(5001), "fresh", ttl(20)).await;

        assert_eq!(cache.entries.read().await.len(), 1);
        assert_eq!(cache.get(&key(5001)).await, Some("fresh"));
    }
}
