//! Time-bounded memo of assembled themes.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use chrono::NaiveDate;

use crate::domain::{DateRange, EntityKind, ThemeResult};

/// Default freshness window.
pub const DEFAULT_TTL: Duration = Duration::from_secs(5 * 60);

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub kind: EntityKind,
    pub entity_id: u64,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl CacheKey {
    pub fn new(kind: EntityKind, entity_id: u64, range: &DateRange) -> Self {
        Self {
            kind,
            entity_id,
            start: range.start,
            end: range.end,
        }
    }
}

#[derive(Debug, Clone)]
struct CacheEntry {
    stored_at: Instant,
    themes: Vec<ThemeResult>,
}

/// Entries older than the TTL are treated as absent.
///
/// Time is passed in by the caller so expiry can be tested without sleeping.
#[derive(Debug)]
pub struct ThemeCache {
    ttl: Duration,
    entries: HashMap<CacheKey, CacheEntry>,
}

impl ThemeCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: HashMap::new(),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn get(&self, key: &CacheKey, now: Instant) -> Option<&[ThemeResult]> {
        self.entries
            .get(key)
            .filter(|e| now.saturating_duration_since(e.stored_at) <= self.ttl)
            .map(|e| e.themes.as_slice())
    }

    pub fn insert(&mut self, key: CacheKey, themes: Vec<ThemeResult>, now: Instant) {
        self.entries.insert(key, CacheEntry { stored_at: now, themes });
    }

    /// Drop every entry for one entity, whatever the date range.
    pub fn invalidate_entity(&mut self, kind: EntityKind, entity_id: u64) {
        self.entries
            .retain(|key, _| !(key.kind == kind && key.entity_id == entity_id));
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn purge_expired(&mut self, now: Instant) {
        let ttl = self.ttl;
        self.entries
            .retain(|_, e| now.saturating_duration_since(e.stored_at) <= ttl);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for ThemeCache {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ThemeKind;

    fn range(day: u32) -> DateRange {
        let d = |day| NaiveDate::from_ymd_opt(2024, 1, day).unwrap();
        DateRange::new(d(1), d(day)).unwrap()
    }

    fn themes() -> Vec<ThemeResult> {
        vec![ThemeResult::new(ThemeKind::MilkProduction, Vec::new(), Vec::new())]
    }

    #[test]
    fn entries_expire_after_ttl() {
        let t0 = Instant::now();
        let mut cache = ThemeCache::new(Duration::from_secs(300));
        let key = CacheKey::new(EntityKind::Farm, 1, &range(10));
        cache.insert(key.clone(), themes(), t0);

        assert!(cache.get(&key, t0 + Duration::from_secs(299)).is_some());
        assert!(cache.get(&key, t0 + Duration::from_secs(300)).is_some());
        assert!(cache.get(&key, t0 + Duration::from_secs(301)).is_none());

        cache.purge_expired(t0 + Duration::from_secs(301));
        assert!(cache.is_empty());
    }

    #[test]
    fn key_includes_date_range() {
        let now = Instant::now();
        let mut cache = ThemeCache::default();
        cache.insert(CacheKey::new(EntityKind::Farm, 1, &range(10)), themes(), now);

        assert!(cache.get(&CacheKey::new(EntityKind::Farm, 1, &range(11)), now).is_none());
        assert!(cache.get(&CacheKey::new(EntityKind::Company, 1, &range(10)), now).is_none());
    }

    #[test]
    fn invalidate_entity_keeps_others() {
        let now = Instant::now();
        let mut cache = ThemeCache::default();
        cache.insert(CacheKey::new(EntityKind::Farm, 1, &range(10)), themes(), now);
        cache.insert(CacheKey::new(EntityKind::Farm, 1, &range(20)), themes(), now);
        cache.insert(CacheKey::new(EntityKind::Farm, 2, &range(10)), themes(), now);

        cache.invalidate_entity(EntityKind::Farm, 1);
        assert_eq!(cache.len(), 1);
        cache.clear();
        assert!(cache.is_empty());
    }
}
