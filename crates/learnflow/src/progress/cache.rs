use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use super::rules::ProgramProgress;
use crate::enrollment::EnrollmentId;

/// Bounded, time-expiring cache in front of the progress read path. Never a source of
/// truth: every mutation path invalidates or overwrites through the tracker, and a
/// miss just recomputes from durable facts.
#[derive(Debug)]
pub struct ProgressCache {
    entries: Mutex<HashMap<EnrollmentId, CacheEntry>>,
    ttl: Duration,
    capacity: usize,
}

#[derive(Debug)]
struct CacheEntry {
    stored_at: Instant,
    report: ProgramProgress,
}

impl ProgressCache {
    pub fn new(ttl: Duration, capacity: usize) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl,
            capacity,
        }
    }

    pub fn get(&self, id: &EnrollmentId) -> Option<ProgramProgress> {
        let mut entries = self.entries.lock().expect("progress cache mutex poisoned");
        match entries.get(id) {
            Some(entry) if entry.stored_at.elapsed() < self.ttl => Some(entry.report.clone()),
            Some(_) => {
                entries.remove(id);
                None
            }
            None => None,
        }
    }

    pub fn put(&self, id: EnrollmentId, report: ProgramProgress) {
        if self.capacity == 0 {
            return;
        }
        let mut entries = self.entries.lock().expect("progress cache mutex poisoned");
        if entries.len() >= self.capacity && !entries.contains_key(&id) {
            // Drop the stalest entry to stay within bounds.
            if let Some(oldest) = entries
                .iter()
                .min_by_key(|(_, entry)| entry.stored_at)
                .map(|(key, _)| key.clone())
            {
                entries.remove(&oldest);
            }
        }
        entries.insert(
            id,
            CacheEntry {
                stored_at: Instant::now(),
                report,
            },
        );
    }

    pub fn invalidate(&self, id: &EnrollmentId) {
        self.entries
            .lock()
            .expect("progress cache mutex poisoned")
            .remove(id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ProgramId;

    fn report(pct: f64) -> ProgramProgress {
        ProgramProgress {
            program_id: ProgramId("p1".to_string()),
            percentage: pct,
            courses: Vec::new(),
        }
    }

    fn id(raw: &str) -> EnrollmentId {
        EnrollmentId(raw.to_string())
    }

    #[test]
    fn serves_fresh_entries_and_drops_expired_ones() {
        let cache = ProgressCache::new(Duration::from_secs(60), 8);
        cache.put(id("e1"), report(25.0));
        assert_eq!(cache.get(&id("e1")).map(|r| r.percentage), Some(25.0));

        let expired = ProgressCache::new(Duration::ZERO, 8);
        expired.put(id("e1"), report(25.0));
        assert!(expired.get(&id("e1")).is_none());
    }

    #[test]
    fn invalidate_removes_the_entry() {
        let cache = ProgressCache::new(Duration::from_secs(60), 8);
        cache.put(id("e1"), report(25.0));
        cache.invalidate(&id("e1"));
        assert!(cache.get(&id("e1")).is_none());
    }

    #[test]
    fn capacity_is_enforced() {
        let cache = ProgressCache::new(Duration::from_secs(60), 2);
        cache.put(id("e1"), report(10.0));
        cache.put(id("e2"), report(20.0));
        cache.put(id("e3"), report(30.0));

        let held = [id("e1"), id("e2"), id("e3")]
            .iter()
            .filter(|key| cache.get(key).is_some())
            .count();
        assert!(held <= 2);
        assert_eq!(cache.get(&id("e3")).map(|r| r.percentage), Some(30.0));
    }

    #[test]
    fn zero_capacity_disables_caching() {
        let cache = ProgressCache::new(Duration::from_secs(60), 0);
        cache.put(id("e1"), report(10.0));
        assert!(cache.get(&id("e1")).is_none());
    }
}
