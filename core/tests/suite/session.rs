//! Session bootstrap, list wiring, and teardown.

use std::sync::Arc;

use boardsync_core::{DataGateway, Session, SyncError};
use boardsync_protocol::{ListProjectsArgs, ListUserProfilesArgs, UserId};
use pretty_assertions::assert_eq;

use super::common::{MockGateway, profile_row, project_row};

#[tokio::test]
async fn bootstrap_resolves_user_and_profile() {
    let profile = profile_row("admin@example.com", true);
    let gateway = Arc::new(MockGateway::with_profiles(vec![profile.clone()]));
    *gateway.current_user.lock().unwrap() = Some(profile.id);

    let session = Session::with_defaults(Arc::clone(&gateway));
    let bootstrap = session.bootstrap().await.unwrap();
    assert_eq!(bootstrap.user_id, Some(profile.id));
    assert_eq!(bootstrap.profile, Some(profile));
}

#[tokio::test]
async fn bootstrap_without_a_session_is_empty_not_an_error() {
    let session = Session::with_defaults(Arc::new(MockGateway::new()));
    let bootstrap = session.bootstrap().await.unwrap();
    assert_eq!(bootstrap.user_id, None);
    assert_eq!(bootstrap.profile, None);
}

#[tokio::test]
async fn malformed_profile_row_fails_the_fetch() {
    let gateway = Arc::new(MockGateway::with_profiles(vec![profile_row(
        "not-an-email",
        false,
    )]));
    let session = Session::with_defaults(Arc::clone(&gateway));

    let args = ListUserProfilesArgs::first_page(None);
    let err = session.list_user_profiles(&args).await.unwrap_err();
    assert!(matches!(err, SyncError::Validation(_)));
    assert_eq!(err.to_string(), "Email must be a valid address");

    // The malformed row was never admitted into the cache.
    assert_eq!(session.profiles().get(&args.filter()), None);
}

#[tokio::test]
async fn exhausted_list_is_served_from_cache() {
    let user = UserId::generate();
    let gateway = Arc::new(MockGateway::with_projects(vec![
        project_row("one", user, false, 1),
        project_row("two", user, false, 2),
    ]));
    let session = Session::with_defaults(Arc::clone(&gateway));

    let args = ListProjectsArgs::first_page(None, None);
    let page = session.list_projects(&args).await.unwrap();
    assert_eq!(page.items.len(), 2);
    assert_eq!(page.next_offset, None);

    // A repeated load of the same window is a no-op on the wire.
    let again = session.list_projects(&args).await.unwrap();
    assert_eq!(again, page);
    assert_eq!(gateway.list_project_calls(), 1);
}

#[tokio::test]
async fn list_rejects_limits_beyond_the_configured_cap() {
    let session = Session::with_defaults(Arc::new(MockGateway::new()));
    let mut args = ListProjectsArgs::first_page(None, None);
    args.limit = 51;

    let err = session.list_projects(&args).await.unwrap_err();
    assert!(matches!(err, SyncError::Validation(_)));
}

#[tokio::test]
async fn sign_out_clears_caches_and_drag_state() {
    let user = UserId::generate();
    let gateway = Arc::new(MockGateway::with_projects(vec![project_row(
        "resident", user, false, 0,
    )]));
    *gateway.profiles.lock().unwrap() = vec![profile_row("someone@example.com", false)];
    let session = Session::with_defaults(Arc::clone(&gateway));

    session
        .list_projects(&ListProjectsArgs::first_page(None, None))
        .await
        .unwrap();
    session
        .list_user_profiles(&ListUserProfilesArgs::first_page(None))
        .await
        .unwrap();
    session
        .drag()
        .begin_transfer(boardsync_core::DragEntity::User(user));
    assert!(!session.projects().is_empty());

    session.sign_out().await.unwrap();

    assert!(session.projects().is_empty());
    assert!(session.profiles().is_empty());
    assert_eq!(session.drag().phase(), boardsync_core::DragPhase::Idle);
    assert_eq!(gateway.current_user_id().await.unwrap(), None);
}
