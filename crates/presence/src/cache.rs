//! Grace-window cache of project editors.
//!
//! A single slow or dropped poll must not blink the "being edited by"
//! indicator off. Every poll that reports an active editor refreshes that
//! project's entry; entries not refreshed within the grace window are swept.

use std::collections::HashMap;

use assess_core::types::{DbId, Timestamp};
use chrono::Duration;

use crate::client::ProjectListing;

/// Default grace window in milliseconds.
pub const DEFAULT_GRACE_MS: i64 = 6_000;

/// Last sighting of a project's editor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedEditor {
    pub name: String,
    pub last_seen: Timestamp,
}

#[derive(Debug, Clone)]
pub struct PresenceCache {
    grace: Duration,
    entries: HashMap<DbId, CachedEditor>,
}

impl PresenceCache {
    pub fn new(grace: Duration) -> Self {
        Self {
            grace,
            entries: HashMap::new(),
        }
    }

    pub fn grace(&self) -> Duration {
        self.grace
    }

    /// Fold one poll result into the cache.
    ///
    /// Upserts every project that reports an editor, then sweeps the whole
    /// cache. Projects absent from `projects` are not removed here; they age
    /// out like any other entry.
    pub fn merge_poll_result(&mut self, projects: &[ProjectListing], now: Timestamp) {
        for project in projects {
            if let Some(editing) = &project.currently_editing {
                self.entries.insert(
                    project.id,
                    CachedEditor {
                        name: editing.name.clone(),
                        last_seen: now,
                    },
                );
            }
        }
        self.sweep(now);
    }

    /// Evict entries last seen more than the grace window ago.
    pub fn sweep(&mut self, now: Timestamp) {
        let grace = self.grace;
        self.entries.retain(|_, e| now - e.last_seen <= grace);
    }

    /// The cached editor of a project, if still within the grace window.
    pub fn cached(&self, project_id: DbId, now: Timestamp) -> Option<&CachedEditor> {
        self.entries
            .get(&project_id)
            .filter(|e| now - e.last_seen <= self.grace)
    }

    /// Editor name to render for a project.
    ///
    /// `live` is the name reported for this project by the poll response
    /// being rendered, if any. It wins over the cache; the cache fills in
    /// when the response omits the editor.
    pub fn editor_for(
        &self,
        project_id: DbId,
        live: Option<&str>,
        now: Timestamp,
    ) -> Option<String> {
        live.map(str::to_string)
            .or_else(|| self.cached(project_id, now).map(|e| e.name.clone()))
    }

    /// Projects with a cache entry, regardless of age.
    pub fn project_ids(&self) -> impl Iterator<Item = DbId> + '_ {
        self.entries.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for PresenceCache {
    fn default() -> Self {
        Self::new(Duration::milliseconds(DEFAULT_GRACE_MS))
    }
}
