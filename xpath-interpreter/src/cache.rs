//! The expression cache (spec.md §4.8): a bounded `cache-key -> CacheEntry`
//! map wrapping the parse path to amortize repeated parsing. This is the
//! one piece of mutable state shared across evaluations (spec.md §5
//! "Shared mutable state"), so it is guarded by a single
//! [`parking_lot::Mutex`] rather than sharded — the teacher's workspace
//! already reaches for `parking_lot` over hand-rolled locking wherever it
//! needs a mutex (e.g. `xee-interpreter`'s interned-name tables), and a
//! cache lookup is cheap enough that one lock is not a bottleneck.
//!
//! Disabling the cache (skipping it entirely at the call site) must not
//! change any observable behaviour besides performance and statistics
//! (spec.md §4.8 "The cache is optional").

use std::time::{Duration, Instant};

use ahash::AHashMap;
use parking_lot::Mutex;
use xpath_ast::ast::XPath;

/// Eviction policy applied when [`ExpressionCache::set`] is called at
/// capacity with a new key (spec.md §4.8).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvictionPolicy {
    /// Evict the entry with the oldest `last_access`.
    Lru,
    /// Evict the entry with the fewest hits.
    Lfu,
    /// Evict the entry inserted longest ago.
    Fifo,
}

/// `{max-size>0, ttl?, eviction}` (spec.md §4.8).
#[derive(Debug, Clone, Copy)]
pub struct CacheOptions {
    pub max_size: usize,
    pub ttl: Option<Duration>,
    pub eviction: EvictionPolicy,
}

impl Default for CacheOptions {
    fn default() -> Self {
        CacheOptions {
            max_size: 256,
            ttl: None,
            eviction: EvictionPolicy::Lru,
        }
    }
}

#[derive(Clone)]
struct CacheEntry {
    ast: XPath,
    inserted_at: Instant,
    last_access: Instant,
    hit_count: u64,
}

/// `{size, hits, misses, hit_rate, max_size}` (spec.md §4.8).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CacheStatistics {
    pub size: usize,
    pub hits: u64,
    pub misses: u64,
    pub max_size: usize,
}

impl CacheStatistics {
    /// `hits / (hits + misses)`, or `0.0` when nothing has been looked up
    /// yet (spec.md §8: "hit-rate = hits / (hits+misses) when denominator
    /// > 0").
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

struct Inner {
    entries: AHashMap<String, CacheEntry>,
    options: CacheOptions,
    hits: u64,
    misses: u64,
}

/// A bounded, thread-safe cache from source-plus-static-context key to
/// parsed [`XPath`] (spec.md §4.8, §5 "safe under concurrent calls from
/// multiple evaluator instances").
pub struct ExpressionCache {
    inner: Mutex<Inner>,
}

impl ExpressionCache {
    pub fn new(options: CacheOptions) -> Self {
        ExpressionCache {
            inner: Mutex::new(Inner {
                entries: AHashMap::new(),
                options,
                hits: 0,
                misses: 0,
            }),
        }
    }

    /// `max-size`, `ttl=None`, `LRU` eviction.
    pub fn with_max_size(max_size: usize) -> Self {
        Self::new(CacheOptions {
            max_size,
            ..CacheOptions::default()
        })
    }

    /// `get(key)`: on hit, bumps `last_access`/`hit_count` and the hit
    /// counter; on miss (absent, or expired by `ttl`), bumps the miss
    /// counter. An expired entry is deleted on the lookup that finds it
    /// expired (spec.md §4.8).
    pub fn get(&self, key: &str) -> Option<XPath> {
        let mut inner = self.inner.lock();
        let ttl = inner.options.ttl;
        let expired = inner
            .entries
            .get(key)
            .map(|entry| ttl.is_some_and(|ttl| entry.inserted_at.elapsed() >= ttl))
            .unwrap_or(false);
        if expired {
            inner.entries.remove(key);
        }
        match inner.entries.get_mut(key) {
            Some(entry) => {
                entry.last_access = Instant::now();
                entry.hit_count += 1;
                inner.hits += 1;
                Some(entry.ast.clone())
            }
            None => {
                inner.misses += 1;
                None
            }
        }
    }

    /// `set(key, ast)`: evicts one entry by policy when at capacity and
    /// `key` is not already present, then inserts (spec.md §4.8, §8
    /// "Cache eviction at capacity deletes exactly one entry per `set` of
    /// a new key").
    pub fn set(&self, key: impl Into<String>, ast: XPath) {
        let key = key.into();
        let mut inner = self.inner.lock();
        let now = Instant::now();
        if !inner.entries.contains_key(&key) && inner.entries.len() >= inner.options.max_size && inner.options.max_size > 0 {
            Self::evict_one(&mut inner);
        }
        inner.entries.insert(
            key,
            CacheEntry {
                ast,
                inserted_at: now,
                last_access: now,
                hit_count: 0,
            },
        );
    }

    fn evict_one(inner: &mut Inner) {
        let victim = match inner.options.eviction {
            EvictionPolicy::Lru => inner.entries.iter().min_by_key(|(_, e)| e.last_access).map(|(k, _)| k.clone()),
            EvictionPolicy::Lfu => inner.entries.iter().min_by_key(|(_, e)| e.hit_count).map(|(k, _)| k.clone()),
            EvictionPolicy::Fifo => inner.entries.iter().min_by_key(|(_, e)| e.inserted_at).map(|(k, _)| k.clone()),
        };
        if let Some(victim) = victim {
            inner.entries.remove(&victim);
        }
    }

    pub fn delete(&self, key: &str) {
        self.inner.lock().entries.remove(key);
    }

    pub fn clear(&self) {
        let mut inner = self.inner.lock();
        inner.entries.clear();
        inner.hits = 0;
        inner.misses = 0;
    }

    /// Shrink to at most `n` entries, evicting by policy until the size
    /// fits (spec.md §4.8 `resize(n)`).
    pub fn resize(&self, n: usize) {
        let mut inner = self.inner.lock();
        inner.options.max_size = n;
        while inner.entries.len() > n {
            Self::evict_one(&mut inner);
        }
    }

    /// Purge every expired entry without waiting for a lookup to find it
    /// (spec.md §4.8 `clean-up`).
    pub fn clean_up(&self) {
        let mut inner = self.inner.lock();
        let Some(ttl) = inner.options.ttl else { return };
        inner.entries.retain(|_, entry| entry.inserted_at.elapsed() < ttl);
    }

    pub fn statistics(&self) -> CacheStatistics {
        let inner = self.inner.lock();
        CacheStatistics {
            size: inner.entries.len(),
            hits: inner.hits,
            misses: inner.misses,
            max_size: inner.options.max_size,
        }
    }
}

impl Default for ExpressionCache {
    fn default() -> Self {
        Self::new(CacheOptions::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use xpath_ast::context::StaticContext;
    use xpath_lexer::Version;

    fn ast(source: &str) -> XPath {
        let ctx = StaticContext::new(Version::V1_0, xpath_name::Namespaces::default());
        xpath_ast::compile(&ctx, source).unwrap()
    }

    #[test]
    fn miss_then_hit_updates_counters() {
        let cache = ExpressionCache::with_max_size(8);
        assert!(cache.get("a").is_none());
        cache.set("a", ast("1"));
        assert!(cache.get("a").is_some());
        let stats = cache.statistics();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
    }

    #[test]
    fn lru_eviction_at_capacity_keeps_the_recently_accessed_key() {
        let cache = ExpressionCache::new(CacheOptions {
            max_size: 2,
            ttl: None,
            eviction: EvictionPolicy::Lru,
        });
        cache.set("A", ast("1"));
        cache.set("B", ast("2"));
        assert!(cache.get("A").is_some());
        cache.set("C", ast("3"));
        assert!(cache.get("B").is_none(), "B should have been evicted as least recently used");
        assert!(cache.get("A").is_some());
        assert!(cache.get("C").is_some());
    }

    #[test]
    fn fifo_eviction_ignores_access_order() {
        let cache = ExpressionCache::new(CacheOptions {
            max_size: 2,
            ttl: None,
            eviction: EvictionPolicy::Fifo,
        });
        cache.set("A", ast("1"));
        cache.set("B", ast("2"));
        assert!(cache.get("A").is_some());
        cache.set("C", ast("3"));
        assert!(cache.get("A").is_none(), "A should be evicted regardless of the access in between");
        assert!(cache.get("B").is_some());
    }

    #[test]
    fn resize_evicts_down_to_the_new_limit() {
        let cache = ExpressionCache::with_max_size(4);
        cache.set("A", ast("1"));
        cache.set("B", ast("2"));
        cache.set("C", ast("3"));
        cache.resize(1);
        assert_eq!(cache.statistics().size, 1);
    }

    #[test]
    fn ttl_expiry_counts_as_a_miss() {
        let cache = ExpressionCache::new(CacheOptions {
            max_size: 8,
            ttl: Some(Duration::from_millis(0)),
            eviction: EvictionPolicy::Lru,
        });
        cache.set("A", ast("1"));
        std::thread::sleep(Duration::from_millis(2));
        assert!(cache.get("A").is_none());
    }

    #[test]
    fn hit_rate_is_zero_with_no_lookups() {
        let stats = CacheStatistics {
            size: 0,
            hits: 0,
            misses: 0,
            max_size: 8,
        };
        assert_eq!(stats.hit_rate(), 0.0);
    }
}
