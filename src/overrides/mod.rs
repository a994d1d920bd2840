//! Local override table.
//!
//! Overrides map a domain (optionally a `*.` wildcard) to either an IPv4 address that is
//! answered locally, or another name whose upstream `A` record is served in its place.
//!
//! The active [`OverrideTable`] is never mutated. The [admin page][crate::api] parses a
//! complete new table and installs it with [`OverrideStore::replace`]; in-flight requests keep
//! the snapshot they started with. Updates go through the [`HostsFile`] lock so that the
//! file on disk and the installed table always come from the same update.

use arc_swap::ArcSwap;
use std::sync::Arc;
use tokio::sync::Mutex;

pub mod file;
pub mod table;

pub use file::HostsFile;
pub use table::{OverrideTable, Target};

/// `SharedOverrides` is the [`OverrideStore`] handle given to the DNS engine and the admin
/// page.
pub type SharedOverrides = Arc<OverrideStore>;

/// `SharedHostsFile` serializes admin updates: the lock is held from writing the file until
/// the parsed table is installed.
pub type SharedHostsFile = Arc<Mutex<HostsFile>>;

#[derive(Debug)]
pub struct OverrideStore {
    current: ArcSwap<OverrideTable>,
}

impl OverrideStore {
    #[must_use]
    pub fn new(table: OverrideTable) -> Self {
        Self {
            current: ArcSwap::from_pointee(table),
        }
    }

    /// The snapshot installed right now.
    #[must_use]
    pub fn current(&self) -> Arc<OverrideTable> {
        self.current.load_full()
    }

    /// Atomically install a new snapshot.
    pub fn replace(&self, table: OverrideTable) {
        self.current.store(Arc::new(table));
    }
}

impl Default for OverrideStore {
    fn default() -> Self {
        Self::new(OverrideTable::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replace_leaves_held_snapshots_intact() {
        let store = OverrideStore::new(OverrideTable::parse("old.test 1.1.1.1\n"));
        let held = store.current();

        store.replace(OverrideTable::parse("new.test 2.2.2.2\n"));

        assert!(held.lookup("old.test").is_some());
        assert!(held.lookup("new.test").is_none());
        let now = store.current();
        assert!(now.lookup("old.test").is_none());
        assert!(now.lookup("new.test").is_some());
    }
}
