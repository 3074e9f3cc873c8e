//! In-process [`LeaseStore`] and [`Directory`].
//!
//! Every operation runs under one async mutex, which gives the same
//! per-project atomicity as the Postgres row lock. Used for engine tests and
//! for running the engine without a database.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::error::CoreError;
use crate::lease::store::{Directory, LeaseSnapshot, LeaseStore};
use crate::lease::{evaluate, LeaseDecision, LeaseHold, LeaseRequest};
use crate::types::{DbId, UserProfile};

#[derive(Debug, Default)]
struct MemoryProject {
    owner_user_id: DbId,
    members: HashSet<DbId>,
    hold: Option<LeaseHold>,
}

#[derive(Debug, Default)]
struct MemoryState {
    projects: HashMap<DbId, MemoryProject>,
    users: HashMap<DbId, UserProfile>,
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_user(&self, id: DbId, name: &str, email: &str) {
        let profile = UserProfile {
            id,
            name: name.to_string(),
            email: email.to_string(),
        };
        self.state.lock().await.users.insert(id, profile);
    }

    /// Create an empty project owned by `owner_user_id`.
    pub async fn add_project(&self, id: DbId, owner_user_id: DbId) {
        self.state.lock().await.projects.insert(
            id,
            MemoryProject {
                owner_user_id,
                ..MemoryProject::default()
            },
        );
    }

    /// Share a project with another user. Returns `false` if the project is
    /// unknown.
    pub async fn add_member(&self, project_id: DbId, user_id: DbId) -> bool {
        match self.state.lock().await.projects.get_mut(&project_id) {
            Some(project) => {
                project.members.insert(user_id);
                true
            }
            None => false,
        }
    }

    /// Raw lease columns, expired or not.
    pub async fn hold(&self, project_id: DbId) -> Option<LeaseHold> {
        self.state
            .lock()
            .await
            .projects
            .get(&project_id)
            .and_then(|p| p.hold)
    }
}

#[async_trait]
impl LeaseStore for MemoryStore {
    async fn apply(
        &self,
        project_id: DbId,
        request: &LeaseRequest,
    ) -> Result<Option<LeaseDecision>, CoreError> {
        let mut state = self.state.lock().await;
        let Some(project) = state.projects.get_mut(&project_id) else {
            return Ok(None);
        };

        let transition = evaluate(project.hold.as_ref(), request);
        project.hold = transition.next_hold(project.hold);
        Ok(Some(transition.decision))
    }

    async fn load(&self, project_id: DbId) -> Result<Option<LeaseSnapshot>, CoreError> {
        let state = self.state.lock().await;
        Ok(state.projects.get(&project_id).map(|p| LeaseSnapshot {
            project_id,
            hold: p.hold,
        }))
    }
}

#[async_trait]
impl Directory for MemoryStore {
    async fn profile(&self, user_id: DbId) -> Result<Option<UserProfile>, CoreError> {
        Ok(self.state.lock().await.users.get(&user_id).cloned())
    }

    async fn is_member(&self, project_id: DbId, user_id: DbId) -> Result<bool, CoreError> {
        let state = self.state.lock().await;
        Ok(state
            .projects
            .get(&project_id)
            .is_some_and(|p| p.owner_user_id == user_id || p.members.contains(&user_id)))
    }
}
