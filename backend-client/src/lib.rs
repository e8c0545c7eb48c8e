//! HTTP implementation of the data gateway for a Supabase-style backend.
//!
//! Rows go through the PostgREST endpoints (`/rest/v1`), auth through
//! GoTrue (`/auth/v1`). The core never sees any of this; it talks to the
//! [`boardsync_core::DataGateway`] trait that [`SupabaseGateway`]
//! implements.

mod auth;
mod client;
mod config;

pub use auth::{AuthSession, AuthUser, Credentials};
pub use client::SupabaseGateway;
pub use config::{BackendConfig, BackendConfigError, ENV_ANON_KEY, ENV_URL};
