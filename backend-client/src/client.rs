//! The reqwest gateway.

use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use boardsync_core::{DataGateway, GatewayError, GatewayResult};
use boardsync_protocol::{
    CreateProjectInput, ListProjectsArgs, ListUserProfilesArgs, Project, ProjectId, ProjectPatch,
    UserId, UserProfile,
};
use reqwest::{Response, StatusCode, header};
use serde_json::json;
use tracing::debug;

use crate::auth::{AuthSession, Credentials};
use crate::config::BackendConfig;

/// PostgREST: hand the affected row back in the mutation response.
const PREFER_REPRESENTATION: &str = "return=representation";

/// PostgREST: respond with a bare object instead of a one-element array.
const ACCEPT_SINGLE_OBJECT: &str = "application/vnd.pgrst.object+json";

fn net(err: reqwest::Error) -> GatewayError {
    GatewayError::Network(err.to_string())
}

/// Pull the backend's own message out of an error body. PostgREST uses
/// `message`, GoTrue uses `error_description` or `msg`, older variants a
/// bare `error`; whatever is found is surfaced verbatim.
fn remote_message(body: &str, status: StatusCode) -> String {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        for key in ["message", "error_description", "msg", "error"] {
            if let Some(message) = value.get(key).and_then(|v| v.as_str()) {
                return message.to_string();
            }
        }
    }
    let trimmed = body.trim();
    if trimmed.is_empty() {
        status
            .canonical_reason()
            .unwrap_or("request failed")
            .to_string()
    } else {
        trimmed.to_string()
    }
}

/// Gateway against a Supabase-style backend: PostgREST rows, GoTrue auth.
///
/// Requests carry the anon key; once a session is established (via
/// [`SupabaseGateway::sign_in`] or an injected token) its access token
/// takes over as the bearer so row-level policies see the user.
pub struct SupabaseGateway {
    http: reqwest::Client,
    config: BackendConfig,
    access_token: Mutex<Option<String>>,
}

impl SupabaseGateway {
    pub fn new(config: BackendConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
            access_token: Mutex::new(None),
        }
    }

    fn rest_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{table}", self.config.base_url())
    }

    fn auth_url(&self, endpoint: &str) -> String {
        format!("{}/auth/v1/{endpoint}", self.config.base_url())
    }

    fn access_token(&self) -> Option<String> {
        self.access_token
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Install or clear the session token used as the bearer.
    pub fn set_access_token(&self, token: Option<String>) {
        *self
            .access_token
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = token;
    }

    fn bearer(&self) -> String {
        self.access_token()
            .unwrap_or_else(|| self.config.anon_key().to_string())
    }

    fn request(&self, method: reqwest::Method, url: String) -> reqwest::RequestBuilder {
        self.http
            .request(method, url)
            .header("apikey", self.config.anon_key())
            .bearer_auth(self.bearer())
    }

    async fn check(response: Response) -> GatewayResult<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(GatewayError::remote(
            status.as_u16(),
            remote_message(&body, status),
        ))
    }

    /// Establish a session with an email/password pair.
    pub async fn sign_in(&self, credentials: &Credentials) -> GatewayResult<AuthSession> {
        let response = self
            .request(reqwest::Method::POST, self.auth_url("token"))
            .query(&[("grant_type", "password")])
            .json(credentials)
            .send()
            .await
            .map_err(net)?;
        let session: AuthSession = Self::check(response).await?.json().await.map_err(net)?;
        self.set_access_token(Some(session.access_token.clone()));
        debug!(user = %session.user.id, "signed in");
        Ok(session)
    }

    /// Register a new account. Depending on backend settings the session
    /// may require email confirmation before sign-in succeeds.
    pub async fn sign_up(&self, credentials: &Credentials) -> GatewayResult<AuthSession> {
        let response = self
            .request(reqwest::Method::POST, self.auth_url("signup"))
            .json(credentials)
            .send()
            .await
            .map_err(net)?;
        let session: AuthSession = Self::check(response).await?.json().await.map_err(net)?;
        self.set_access_token(Some(session.access_token.clone()));
        Ok(session)
    }

    fn list_query_base(offset: u32, limit: u32) -> Vec<(&'static str, String)> {
        vec![
            ("select", "*".to_string()),
            ("order", "created_at.desc".to_string()),
            ("offset", offset.to_string()),
            ("limit", limit.to_string()),
        ]
    }
}

#[async_trait]
impl DataGateway for SupabaseGateway {
    async fn current_user_id(&self) -> GatewayResult<Option<UserId>> {
        if self.access_token().is_none() {
            return Ok(None);
        }
        let response = self
            .request(reqwest::Method::GET, self.auth_url("user"))
            .send()
            .await
            .map_err(net)?;
        if response.status() == StatusCode::UNAUTHORIZED
            || response.status() == StatusCode::FORBIDDEN
        {
            return Ok(None);
        }
        let user: crate::auth::AuthUser =
            Self::check(response).await?.json().await.map_err(net)?;
        Ok(Some(user.id))
    }

    async fn profile(&self, user_id: UserId) -> GatewayResult<Option<UserProfile>> {
        let response = self
            .request(reqwest::Method::GET, self.rest_url("user_profiles"))
            .query(&[
                ("select", "*".to_string()),
                ("id", format!("eq.{user_id}")),
                ("limit", "1".to_string()),
            ])
            .send()
            .await
            .map_err(net)?;
        let rows: Vec<UserProfile> = Self::check(response).await?.json().await.map_err(net)?;
        Ok(rows.into_iter().next())
    }

    async fn list_user_profiles(
        &self,
        args: &ListUserProfilesArgs,
    ) -> GatewayResult<Vec<UserProfile>> {
        let mut query = Self::list_query_base(args.offset, args.limit);
        if let Some(term) = args.effective_search() {
            query.push(("email", format!("ilike.*{term}*")));
        }
        let response = self
            .request(reqwest::Method::GET, self.rest_url("user_profiles"))
            .query(&query)
            .send()
            .await
            .map_err(net)?;
        Self::check(response).await?.json().await.map_err(net)
    }

    async fn list_projects(&self, args: &ListProjectsArgs) -> GatewayResult<Vec<Project>> {
        let mut query = Self::list_query_base(args.offset, args.limit);
        if let Some(user_id) = args.assigned_user_id {
            query.push(("assigned_user_id", format!("eq.{user_id}")));
        }
        if let Some(is_completed) = args.is_completed {
            query.push(("is_completed", format!("eq.{is_completed}")));
        }
        let response = self
            .request(reqwest::Method::GET, self.rest_url("projects"))
            .query(&query)
            .send()
            .await
            .map_err(net)?;
        Self::check(response).await?.json().await.map_err(net)
    }

    async fn insert_project(&self, input: &CreateProjectInput) -> GatewayResult<Project> {
        // Status and provenance are not caller-controlled.
        let body = json!({
            "assigned_user_id": input.assigned_user_id,
            "title": input.title,
            "description": input.description,
            "is_completed": false,
            "created_by_admin": true,
        });
        let response = self
            .request(reqwest::Method::POST, self.rest_url("projects"))
            .header("Prefer", PREFER_REPRESENTATION)
            .header(header::ACCEPT, ACCEPT_SINGLE_OBJECT)
            .json(&body)
            .send()
            .await
            .map_err(net)?;
        Self::check(response).await?.json().await.map_err(net)
    }

    async fn update_project(&self, id: ProjectId, patch: &ProjectPatch) -> GatewayResult<Project> {
        let response = self
            .request(reqwest::Method::PATCH, self.rest_url("projects"))
            .query(&[("id", format!("eq.{id}"))])
            .header("Prefer", PREFER_REPRESENTATION)
            .header(header::ACCEPT, ACCEPT_SINGLE_OBJECT)
            .json(patch)
            .send()
            .await
            .map_err(net)?;
        Self::check(response).await?.json().await.map_err(net)
    }

    async fn sign_out(&self) -> GatewayResult<()> {
        if self.access_token().is_none() {
            return Ok(());
        }
        let response = self
            .request(reqwest::Method::POST, self.auth_url("logout"))
            .send()
            .await
            .map_err(net)?;
        Self::check(response).await?;
        self.set_access_token(None);
        debug!("signed out");
        Ok(())
    }
}
