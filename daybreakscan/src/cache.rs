//! TTL cache (spec §4.2): a concurrent `K -> (V, expires_at)` map per cache
//! category. `get` treats `now > expires_at` as a miss and evicts; `set`
//! always overwrites and resets expiry. Presence is determined by key
//! existence, not by whether the stored value is falsy.

use std::hash::Hash;
use std::time::Duration;

use dashmap::DashMap;

struct Entry<V> {
    value: V,
    expires_at: i64,
}

pub struct TtlCache<K, V> {
    map: DashMap<K, Entry<V>>,
    ttl: Duration,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    pub fn new(ttl: Duration) -> Self {
        Self { map: DashMap::new(), ttl }
    }

    /// `now` is injected so tests can control expiry deterministically rather
    /// than racing the wall clock.
    pub fn get(&self, key: &K, now: i64) -> Option<V> {
        let hit = self.map.get(key).map(|e| (e.value.clone(), e.expires_at));
        match hit {
            Some((value, expires_at)) if now <= expires_at => Some(value),
            Some(_) => {
                self.map.remove(key);
                None
            }
            None => None,
        }
    }

    pub fn set(&self, key: K, value: V, now: i64) {
        let expires_at = now + self.ttl.as_secs() as i64;
        self.map.insert(key, Entry { value, expires_at });
    }

    /// Evict every entry whose expiry has passed `now`. Run by the background
    /// sweeper every 60s; callers don't need this for correctness (`get`
    /// self-evicts) but it bounds memory for keys nobody re-reads.
    pub fn sweep(&self, now: i64) {
        self.map.retain(|_, entry| entry.expires_at >= now);
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Test/teardown reset hook (spec §9 "provide a test reset hook").
    pub fn clear(&self) {
        self.map.clear();
    }
}

/// Per-category cache instances with the TTLs named in spec §3/§4.2.
pub struct CacheRegistry {
    pub metadata: TtlCache<String, serde_json::Value>,
    pub liveness: TtlCache<String, serde_json::Value>,
    pub mint_authority: TtlCache<String, serde_json::Value>,
    pub price: TtlCache<String, serde_json::Value>,
    pub rug_report: TtlCache<String, serde_json::Value>,
    pub nonce: TtlCache<String, bool>,
}

impl CacheRegistry {
    pub fn new() -> Self {
        Self {
            metadata: TtlCache::new(Duration::from_secs(30 * 60)),
            liveness: TtlCache::new(Duration::from_secs(2 * 60 * 60)),
            mint_authority: TtlCache::new(Duration::from_secs(2 * 60 * 60)),
            price: TtlCache::new(Duration::from_secs(5 * 60)),
            rug_report: TtlCache::new(Duration::from_secs(30 * 60)),
            nonce: TtlCache::new(Duration::from_secs(5 * 60)),
        }
    }

    /// Background sweep tick: evict expired entries from every category.
    pub fn sweep_all(&self, now: i64) {
        self.metadata.sweep(now);
        self.liveness.sweep(now);
        self.mint_authority.sweep(now);
        self.price.sweep(now);
        self.rug_report.sweep(now);
        self.nonce.sweep(now);
    }

    pub fn clear_all(&self) {
        self.metadata.clear();
        self.liveness.clear();
        self.mint_authority.clear();
        self.price.clear();
        self.rug_report.clear();
        self.nonce.clear();
    }
}

impl Default for CacheRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn stores_and_returns_falsy_values() {
        let cache: TtlCache<String, serde_json::Value> = TtlCache::new(Duration::from_secs(60));
        for (key, value) in [("bool", json!(false)), ("zero", json!(0)), ("empty", json!("")), ("null", json!(null))] {
            cache.set(key.to_string(), value.clone(), 1_000);
            assert_eq!(cache.get(&key.to_string(), 1_000), Some(value));
        }
    }

    #[test]
    fn hit_exactly_at_expiry_miss_one_tick_later() {
        let cache: TtlCache<String, i32> = TtlCache::new(Duration::from_secs(10));
        cache.set("k".to_string(), 7, 0);
        assert_eq!(cache.get(&"k".to_string(), 10), Some(7));
        assert_eq!(cache.get(&"k".to_string(), 11), None);
    }

    #[test]
    fn set_overwrites_and_resets_expiry() {
        let cache: TtlCache<String, i32> = TtlCache::new(Duration::from_secs(10));
        cache.set("k".to_string(), 1, 0);
        cache.set("k".to_string(), 2, 5);
        assert_eq!(cache.get(&"k".to_string(), 14), Some(2));
        assert_eq!(cache.get(&"k".to_string(), 16), None);
    }

    #[test]
    fn sweep_evicts_only_expired_entries() {
        let cache: TtlCache<String, i32> = TtlCache::new(Duration::from_secs(10));
        cache.set("fresh".to_string(), 1, 100);
        cache.set("stale".to_string(), 2, 0);
        cache.sweep(50);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get(&"fresh".to_string(), 100), Some(1));
    }

    #[test]
    fn failed_batch_is_never_cached() {
        // bulk_liveness (spec §4.5) must not call `set` on a failed fetch; this
        // just documents that an absent key stays a miss, which is what makes
        // that contract safe to rely on.
        let cache: TtlCache<String, i32> = TtlCache::new(Duration::from_secs(10));
        assert_eq!(cache.get(&"never-set".to_string(), 0), None);
    }
}
