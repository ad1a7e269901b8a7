//! Process-local detail memo.
//!
//! Absorbs bursts of repeated requests for the same URL within one serving
//! process. Entries expire after a short TTL with an exclusive boundary: an
//! entry aged exactly the TTL is stale. Safe for concurrent readers and
//! writers; all state sits behind one mutex because entries are small and
//! the critical sections are a map lookup.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, Utc};

use tradescout_core::NormalizedDetail;

use crate::clock::Clock;

struct MemoEntry {
    value: NormalizedDetail,
    fetched_at: DateTime<Utc>,
}

/// Short-TTL in-process cache keyed by source URL.
pub struct DetailMemo {
    entries: Mutex<HashMap<String, MemoEntry>>,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl DetailMemo {
    #[must_use]
    pub fn new(ttl_secs: u64, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            // Absurdly large configured TTLs clamp instead of panicking.
            ttl: Duration::try_seconds(i64::try_from(ttl_secs).unwrap_or(i64::MAX))
                .unwrap_or(Duration::MAX),
            clock,
        }
    }

    /// Returns the cached value for `url` when present and fresh.
    #[must_use]
    pub fn get(&self, url: &str) -> Option<NormalizedDetail> {
        let entries = self.entries.lock().expect("memo lock poisoned");
        let entry = entries.get(url)?;
        if self.clock.now() - entry.fetched_at >= self.ttl {
            return None;
        }
        Some(entry.value.clone())
    }

    /// Stores `value` for `url`, stamping it with the current time.
    pub fn insert(&self, url: &str, value: NormalizedDetail) {
        let mut entries = self.entries.lock().expect("memo lock poisoned");
        entries.insert(
            url.to_owned(),
            MemoEntry {
                value,
                fetched_at: self.clock.now(),
            },
        );
    }

    /// Unconditionally drops the entry for `url` (force-refresh path).
    pub fn evict(&self, url: &str) {
        let mut entries = self.entries.lock().expect("memo lock poisoned");
        entries.remove(url);
    }
}
