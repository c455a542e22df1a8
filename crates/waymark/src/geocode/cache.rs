//! Resolver-owned geocode cache.
//!
//! Successful resolutions are keyed by normalized name alone, so a result that was
//! only found after widening to global scope is returned directly next time.
//! Misses are keyed by (name, scope): a miss in one scope says nothing about a
//! broader one. Provider failures are never stored here.

use std::time::Duration;

use ahash::AHashMap as HashMap;
use tokio::time::Instant;

use super::{GeocodedLocation, Scope};

#[derive(Debug, Clone)]
struct Entry<T> {
    value: T,
    stored_at: Instant,
}

#[derive(Debug, Default)]
pub(crate) struct GeocodeCache {
    hits: HashMap<String, Entry<GeocodedLocation>>,
    misses: HashMap<(String, Scope), Entry<()>>,
    ttl: Option<Duration>,
}

impl GeocodeCache {
    pub(crate) fn new(ttl: Option<Duration>) -> Self {
        Self {
            ttl,
            ..Default::default()
        }
    }

    fn fresh<T>(&self, entry: &Entry<T>, now: Instant) -> bool {
        self.ttl
            .is_none_or(|ttl| now.saturating_duration_since(entry.stored_at) < ttl)
    }

    pub(crate) fn hit(&self, key: &str, now: Instant) -> Option<GeocodedLocation> {
        self.hits
            .get(key)
            .filter(|entry| self.fresh(entry, now))
            .map(|entry| entry.value.clone())
    }

    pub(crate) fn is_miss(&self, key: &str, scope: Scope, now: Instant) -> bool {
        self.misses
            .get(&(key.to_string(), scope))
            .is_some_and(|entry| self.fresh(entry, now))
    }

    /// Store a resolution. An existing live entry is kept; only an expired one is superseded.
    pub(crate) fn insert_hit(&mut self, key: String, location: GeocodedLocation, now: Instant) {
        if self.hit(&key, now).is_some() {
            return;
        }
        self.hits.insert(
            key,
            Entry {
                value: location,
                stored_at: now,
            },
        );
    }

    pub(crate) fn insert_miss(&mut self, key: String, scope: Scope, now: Instant) {
        self.misses.insert(
            (key, scope),
            Entry {
                value: (),
                stored_at: now,
            },
        );
    }

    pub(crate) fn len(&self) -> usize {
        self.hits.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use waymark_data::Coordinates;

    fn location(name: &str) -> GeocodedLocation {
        GeocodedLocation {
            name: name.to_string(),
            coordinates: Coordinates::new(-119.8138, 39.5296),
            resolved_in: Scope::Global,
        }
    }

    #[test]
    fn test_hit_is_scope_independent() {
        let now = Instant::now();
        let mut cache = GeocodeCache::new(None);
        cache.insert_hit("reno".to_string(), location("Reno"), now);
        assert_eq!(cache.hit("reno", now).unwrap().name, "Reno");
        assert!(cache.hit("Reno", now).is_none(), "keys are normalized by the caller");
    }

    #[test]
    fn test_miss_is_scope_specific() {
        let now = Instant::now();
        let mut cache = GeocodeCache::new(None);
        cache.insert_miss("atlantis".to_string(), Scope::RegionRestricted, now);
        assert!(cache.is_miss("atlantis", Scope::RegionRestricted, now));
        assert!(!cache.is_miss("atlantis", Scope::Global, now));
    }

    #[test]
    fn test_live_entry_is_not_overwritten() {
        let now = Instant::now();
        let mut cache = GeocodeCache::new(None);
        cache.insert_hit("reno".to_string(), location("Reno"), now);
        cache.insert_hit("reno".to_string(), location("Reno, NV"), now);
        assert_eq!(cache.hit("reno", now).unwrap().name, "Reno");
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_ttl_expires_and_allows_supersede() {
        let start = Instant::now();
        let later = start + Duration::from_secs(120);
        let mut cache = GeocodeCache::new(Some(Duration::from_secs(60)));
        cache.insert_hit("reno".to_string(), location("Reno"), start);
        cache.insert_miss("atlantis".to_string(), Scope::Global, start);

        assert!(cache.hit("reno", later).is_none());
        assert!(!cache.is_miss("atlantis", Scope::Global, later));

        cache.insert_hit("reno".to_string(), location("Reno, NV"), later);
        assert_eq!(cache.hit("reno", later).unwrap().name, "Reno, NV");
    }
}
