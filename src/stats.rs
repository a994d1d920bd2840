//! Named request counters.
//!
//! A [`Stats`] registry is owned by whoever builds the [`Engine`][crate::engine::Engine] and
//! shared with the [admin page][crate::api] through an [`Arc`]. Counters spring into existence
//! on their first increment.

use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

pub type SharedStats = Arc<Stats>;

pub const REQUESTS: &str = "requests";
pub const LOCAL_RESPONSES: &str = "local_responses";
pub const REDIRECTED_REQUESTS: &str = "redirected_requests";
pub const REDIRECTED_SUCCESSIVELY: &str = "redirected_successively";
pub const REDIRECTED_NOWHERE: &str = "redirected_nowhere";
pub const PROXIED_REQUESTS: &str = "proxied_requests";
pub const PROXIED_REFUSALS: &str = "proxied_refusals";
pub const UPSTREAM_QUERIES: &str = "upstream_queries";
pub const UPSTREAM_ERRORS: &str = "upstream_errors";
pub const REFUSALS: &str = "refusals";
pub const PANIC_REFUSALS: &str = "panic_refusals";

/// A single `(name, value)` pair from a [`Stats::snapshot`].
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct StatTuple {
    pub key: String,
    pub value: u64,
}

#[derive(Default, Debug)]
pub struct Stats {
    counters: Mutex<BTreeMap<String, u64>>,
}

impl Stats {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one to the named counter, creating it first if needed.
    pub fn increment(&self, name: &str) {
        let mut counters = self.lock();
        match counters.get_mut(name) {
            Some(count) => *count += 1,
            None => {
                counters.insert(name.to_string(), 1);
            }
        }
    }

    /// Current value of a counter, zero if it was never incremented.
    #[must_use]
    pub fn get(&self, name: &str) -> u64 {
        self.lock().get(name).copied().unwrap_or_default()
    }

    /// All counters, sorted by name.
    #[must_use]
    pub fn snapshot(&self) -> Vec<StatTuple> {
        self.lock()
            .iter()
            .map(|(key, value)| StatTuple {
                key: key.clone(),
                value: *value,
            })
            .collect()
    }

    // The map is never left half-written, so a poisoned lock is still safe to use.
    fn lock(&self) -> MutexGuard<'_, BTreeMap<String, u64>> {
        self.counters.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
