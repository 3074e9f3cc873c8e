//! The "who is editing" view over a stream of project-list polls.
//!
//! [`PresenceAggregator`] tags each poll with a sequence number when it is
//! issued and applies a response only if it is still the latest poll. An
//! applied response becomes the live view and is folded into the
//! grace-window cache.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use assess_core::clock::Clock;
use assess_core::types::{DbId, Timestamp};
use tokio::sync::Mutex;

use crate::cache::PresenceCache;
use crate::client::ProjectListing;
use crate::sequence::PollSequencer;

#[derive(Debug, Default)]
struct View {
    cache: PresenceCache,
    /// Editor names reported by the last applied response.
    live: HashMap<DbId, String>,
    /// Projects listed by the last applied response.
    listed: Vec<DbId>,
    /// When the last response was applied.
    applied_at: Option<Timestamp>,
}

impl View {
    /// The live editor for a project, unless the last applied response is
    /// older than the grace window.
    fn live_editor(&self, project_id: DbId, now: Timestamp) -> Option<&str> {
        let fresh = self
            .applied_at
            .is_some_and(|at| now - at <= self.cache.grace());
        if !fresh {
            return None;
        }
        self.live.get(&project_id).map(String::as_str)
    }
}

pub struct PresenceAggregator {
    sequencer: PollSequencer,
    view: Mutex<View>,
    clock: Arc<dyn Clock>,
}

impl PresenceAggregator {
    pub fn new(cache: PresenceCache, clock: Arc<dyn Clock>) -> Self {
        Self {
            sequencer: PollSequencer::new(),
            view: Mutex::new(View {
                cache,
                ..View::default()
            }),
            clock,
        }
    }

    /// Tag a poll that is about to be sent.
    pub fn begin_poll(&self) -> u64 {
        self.sequencer.issue()
    }

    /// Apply a poll response if it is still the latest issued poll.
    ///
    /// Returns `false` when the response was overtaken and discarded.
    pub async fn complete_poll(&self, seq: u64, projects: Vec<ProjectListing>) -> bool {
        let mut view = self.view.lock().await;
        if !self.sequencer.should_apply(seq) {
            tracing::debug!(
                seq,
                latest = self.sequencer.latest_issued(),
                "Discarding overtaken poll response"
            );
            return false;
        }

        let now = self.clock.now();
        view.cache.merge_poll_result(&projects, now);
        view.live = projects
            .iter()
            .filter_map(|p| {
                p.currently_editing
                    .as_ref()
                    .map(|e| (p.id, e.name.clone()))
            })
            .collect();
        view.listed = projects.iter().map(|p| p.id).collect();
        view.applied_at = Some(now);

        tracing::debug!(
            seq,
            projects = projects.len(),
            editors = view.live.len(),
            "Applied poll response"
        );
        true
    }

    /// Editor to render for a project: the live value, else a cached one
    /// still inside the grace window, else nobody.
    ///
    /// The live value ages out with the grace window too, so an editor
    /// clears even when no poll has been applied since it was reported.
    pub async fn editor_for(&self, project_id: DbId) -> Option<String> {
        let view = self.view.lock().await;
        let now = self.clock.now();
        let live = view.live_editor(project_id, now);
        view.cache.editor_for(project_id, live, now)
    }

    /// Every project with a renderable editor right now.
    pub async fn editors(&self) -> BTreeMap<DbId, String> {
        let view = self.view.lock().await;
        let now = self.clock.now();
        view.listed
            .iter()
            .copied()
            .chain(view.cache.project_ids())
            .filter_map(|id| {
                let live = view.live_editor(id, now);
                view.cache.editor_for(id, live, now).map(|name| (id, name))
            })
            .collect()
    }
}
