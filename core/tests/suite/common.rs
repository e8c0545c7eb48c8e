//! Shared test support: row fixtures and a programmable in-memory gateway.

use std::sync::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use boardsync_core::{DataGateway, GatewayError, GatewayResult};
use boardsync_protocol::{
    CreateProjectInput, ListProjectsArgs, ListUserProfilesArgs, Project, ProjectId, ProjectPatch,
    UserId, UserProfile,
};
use chrono::{Duration as ChronoDuration, Utc};

/// Deterministic project row; `age` staggers `created_at` so server-side
/// ordering (newest first) is stable in fixtures.
pub fn project_row(title: &str, assigned: UserId, is_completed: bool, age: i64) -> Project {
    let created = Utc::now() - ChronoDuration::seconds(age);
    Project {
        id: ProjectId::generate(),
        assigned_user_id: assigned,
        title: title.into(),
        description: None,
        is_completed,
        created_by_admin: true,
        created_at: created,
        updated_at: created,
    }
}

pub fn profile_row(email: &str, is_admin: bool) -> UserProfile {
    let now = Utc::now();
    UserProfile {
        id: UserId::generate(),
        full_name: None,
        email: email.into(),
        is_admin,
        created_at: now,
        updated_at: now,
    }
}

/// In-memory gateway with call counters, per-call failure injection, and
/// optional latency so tests can observe mid-flight optimistic state.
#[derive(Default)]
pub struct MockGateway {
    pub projects: Mutex<Vec<Project>>,
    pub profiles: Mutex<Vec<UserProfile>>,
    pub current_user: Mutex<Option<UserId>>,

    list_project_calls: AtomicU32,
    list_profile_calls: AtomicU32,
    insert_calls: AtomicU32,
    update_calls: AtomicU32,

    fail_next_insert: Mutex<Option<GatewayError>>,
    fail_next_update: Mutex<Option<GatewayError>>,
    insert_delay: Mutex<Option<Duration>>,
    update_delay: Mutex<Option<Duration>>,
}

impl MockGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_projects(rows: Vec<Project>) -> Self {
        let gateway = Self::new();
        *gateway.projects.lock().unwrap() = rows;
        gateway
    }

    pub fn with_profiles(rows: Vec<UserProfile>) -> Self {
        let gateway = Self::new();
        *gateway.profiles.lock().unwrap() = rows;
        gateway
    }

    pub fn fail_next_insert(&self, err: GatewayError) {
        *self.fail_next_insert.lock().unwrap() = Some(err);
    }

    pub fn fail_next_update(&self, err: GatewayError) {
        *self.fail_next_update.lock().unwrap() = Some(err);
    }

    pub fn delay_next_insert(&self, delay: Duration) {
        *self.insert_delay.lock().unwrap() = Some(delay);
    }

    pub fn delay_next_update(&self, delay: Duration) {
        *self.update_delay.lock().unwrap() = Some(delay);
    }

    pub fn list_project_calls(&self) -> u32 {
        self.list_project_calls.load(Ordering::SeqCst)
    }

    pub fn insert_calls(&self) -> u32 {
        self.insert_calls.load(Ordering::SeqCst)
    }

    pub fn update_calls(&self) -> u32 {
        self.update_calls.load(Ordering::SeqCst)
    }

    fn window<T: Clone>(rows: Vec<T>, offset: u32, limit: u32) -> Vec<T> {
        rows.into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .collect()
    }
}

#[async_trait]
impl DataGateway for MockGateway {
    async fn current_user_id(&self) -> GatewayResult<Option<UserId>> {
        Ok(*self.current_user.lock().unwrap())
    }

    async fn profile(&self, user_id: UserId) -> GatewayResult<Option<UserProfile>> {
        let profiles = self.profiles.lock().unwrap();
        Ok(profiles.iter().find(|p| p.id == user_id).cloned())
    }

    async fn list_user_profiles(
        &self,
        args: &ListUserProfilesArgs,
    ) -> GatewayResult<Vec<UserProfile>> {
        self.list_profile_calls.fetch_add(1, Ordering::SeqCst);
        let mut rows: Vec<_> = {
            let profiles = self.profiles.lock().unwrap();
            profiles
                .iter()
                .filter(|p| match args.effective_search() {
                    Some(term) => p.email.to_lowercase().contains(&term.to_lowercase()),
                    None => true,
                })
                .cloned()
                .collect()
        };
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(Self::window(rows, args.offset, args.limit))
    }

    async fn list_projects(&self, args: &ListProjectsArgs) -> GatewayResult<Vec<Project>> {
        self.list_project_calls.fetch_add(1, Ordering::SeqCst);
        let mut rows: Vec<_> = {
            let projects = self.projects.lock().unwrap();
            projects
                .iter()
                .filter(|p| {
                    args.assigned_user_id
                        .is_none_or(|user| p.assigned_user_id == user)
                        && args.is_completed.is_none_or(|done| p.is_completed == done)
                })
                .cloned()
                .collect()
        };
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(Self::window(rows, args.offset, args.limit))
    }

    async fn insert_project(&self, input: &CreateProjectInput) -> GatewayResult<Project> {
        self.insert_calls.fetch_add(1, Ordering::SeqCst);
        let delay = self.insert_delay.lock().unwrap().take();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(err) = self.fail_next_insert.lock().unwrap().take() {
            return Err(err);
        }

        let now = Utc::now();
        let row = Project {
            id: ProjectId::generate(),
            assigned_user_id: input.assigned_user_id,
            title: input.title.clone(),
            description: input.description.clone(),
            is_completed: false,
            created_by_admin: true,
            created_at: now,
            updated_at: now,
        };
        self.projects.lock().unwrap().insert(0, row.clone());
        Ok(row)
    }

    async fn update_project(&self, id: ProjectId, patch: &ProjectPatch) -> GatewayResult<Project> {
        self.update_calls.fetch_add(1, Ordering::SeqCst);
        let delay = self.update_delay.lock().unwrap().take();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(err) = self.fail_next_update.lock().unwrap().take() {
            return Err(err);
        }

        let mut projects = self.projects.lock().unwrap();
        let row = projects
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| GatewayError::remote(404, format!("project {id} not found")))?;
        patch.apply_to(row);
        row.updated_at = Utc::now();
        Ok(row.clone())
    }

    async fn sign_out(&self) -> GatewayResult<()> {
        *self.current_user.lock().unwrap() = None;
        Ok(())
    }
}
