//! Optimistic mutation flows end to end against the in-memory gateway.

use std::sync::Arc;
use std::time::Duration;

use boardsync_core::{GatewayError, Session, SyncError};
use boardsync_protocol::{
    CreateProjectInput, ListProjectsArgs, ProjectFilter, ProjectPatch, ProjectSnapshot, UserId,
};
use pretty_assertions::assert_eq;

use super::common::{MockGateway, project_row};

fn session_with(gateway: MockGateway) -> (Session<MockGateway>, Arc<MockGateway>) {
    let gateway = Arc::new(gateway);
    (Session::with_defaults(Arc::clone(&gateway)), gateway)
}

#[tokio::test]
async fn failed_update_restores_prior_title() {
    let user = UserId::generate();
    let p = project_row("original", user, false, 0);
    let (session, gateway) = session_with(MockGateway::with_projects(vec![p.clone()]));

    let args = ListProjectsArgs::first_page(None, None);
    session.list_projects(&args).await.unwrap();

    gateway.fail_next_update(GatewayError::remote(500, "permission denied"));
    let err = session
        .coordinator()
        .update_project(
            p.id,
            ProjectPatch {
                title: Some("X".into()),
                ..ProjectPatch::default()
            },
            None,
        )
        .await
        .unwrap_err();
    assert_eq!(err, SyncError::Gateway(GatewayError::remote(500, "permission denied")));

    // Original title restored, no residual temporary state.
    let entry = session.projects().get(&args.filter()).unwrap();
    assert_eq!(entry.items.len(), 1);
    assert_eq!(entry.items[0], p);
}

#[tokio::test(start_paused = true)]
async fn create_prepends_temp_then_swaps_in_authoritative_row() {
    let user = UserId::generate();
    let (session, gateway) = session_with(MockGateway::new());
    let args = ListProjectsArgs::first_page(None, None);
    session.list_projects(&args).await.unwrap();

    gateway.delay_next_insert(Duration::from_millis(50));
    let coordinator = session.coordinator();
    let create = tokio::spawn(async move {
        coordinator
            .create_project(CreateProjectInput {
                assigned_user_id: user,
                title: "T".into(),
                description: None,
            })
            .await
    });

    // Let the create task run up to its in-flight gateway call, then look
    // at the speculative state.
    tokio::time::sleep(Duration::from_millis(10)).await;
    let mid_flight = session.projects().get(&ProjectFilter::unfiltered()).unwrap();
    assert_eq!(mid_flight.items[0].title, "T");
    let temp_id = mid_flight.items[0].id;

    let row = create.await.unwrap().unwrap();
    assert_eq!(row.title, "T");
    assert_ne!(row.id, temp_id);

    let settled = session.projects().get(&ProjectFilter::unfiltered()).unwrap();
    assert_eq!(settled.items[0].id, row.id);
    assert!(settled.items.iter().all(|p| p.id != temp_id));
}

#[tokio::test]
async fn failed_create_removes_the_temp_record() {
    let user = UserId::generate();
    let (session, gateway) = session_with(MockGateway::new());
    let args = ListProjectsArgs::first_page(None, None);
    session.list_projects(&args).await.unwrap();

    gateway.fail_next_insert(GatewayError::remote(400, "row violates policy"));
    let err = session
        .coordinator()
        .create_project(CreateProjectInput {
            assigned_user_id: user,
            title: "doomed".into(),
            description: Some("  ".into()),
        })
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "row violates policy");

    let entry = session.projects().get(&args.filter()).unwrap();
    assert_eq!(entry.items.len(), 0);
}

#[tokio::test]
async fn completing_project_moves_it_between_resident_columns() {
    let user = UserId::generate();
    let p = project_row("moving", user, false, 0);
    let (session, gateway) =
        session_with(MockGateway::with_projects(vec![p.clone()]));

    // Three resident entries: in-progress (contains P), completed
    // (resident, empty), unfiltered (contains P).
    let in_progress = ListProjectsArgs::first_page(Some(user), Some(false));
    let completed = ListProjectsArgs::first_page(Some(user), Some(true));
    let unfiltered = ListProjectsArgs::first_page(None, None);
    session.list_projects(&in_progress).await.unwrap();
    session.list_projects(&completed).await.unwrap();
    session.list_projects(&unfiltered).await.unwrap();
    let fetches_before = gateway.list_project_calls();

    session
        .coordinator()
        .update_project(
            p.id,
            ProjectPatch::set_completed(true),
            Some(ProjectSnapshot::from(&p)),
        )
        .await
        .unwrap();

    let in_progress_entry = session.projects().get(&in_progress.filter()).unwrap();
    assert!(in_progress_entry.items.iter().all(|x| x.id != p.id));

    let completed_entry = session.projects().get(&completed.filter()).unwrap();
    assert_eq!(completed_entry.items.len(), 1);
    assert_eq!(completed_entry.items[0].id, p.id);
    assert!(completed_entry.items[0].is_completed);

    let unfiltered_entry = session.projects().get(&unfiltered.filter()).unwrap();
    assert!(unfiltered_entry.items[0].is_completed);

    // The move happened without refetching either column.
    assert_eq!(gateway.list_project_calls(), fetches_before);
}

#[tokio::test]
async fn failed_partition_move_rolls_back_both_columns() {
    let user = UserId::generate();
    let newer = project_row("on-top", user, false, 10);
    let p = project_row("stuck", user, false, 20);
    let (session, gateway) =
        session_with(MockGateway::with_projects(vec![newer.clone(), p.clone()]));

    let in_progress = ListProjectsArgs::first_page(Some(user), Some(false));
    let completed = ListProjectsArgs::first_page(Some(user), Some(true));
    session.list_projects(&in_progress).await.unwrap();
    session.list_projects(&completed).await.unwrap();

    gateway.fail_next_update(GatewayError::Network("connection reset".into()));
    session
        .coordinator()
        .update_project(
            p.id,
            ProjectPatch::set_completed(true),
            Some(ProjectSnapshot::from(&p)),
        )
        .await
        .unwrap_err();

    // P back in its original position, completed column empty again.
    let in_progress_entry = session.projects().get(&in_progress.filter()).unwrap();
    assert_eq!(
        in_progress_entry.items.iter().map(|x| x.id).collect::<Vec<_>>(),
        [newer.id, p.id]
    );
    assert_eq!(in_progress_entry.items[1], p);
    let completed_entry = session.projects().get(&completed.filter()).unwrap();
    assert_eq!(completed_entry.items.len(), 0);
}

#[tokio::test(start_paused = true)]
async fn torn_down_update_still_rolls_back() {
    let user = UserId::generate();
    let p = project_row("persistent", user, false, 0);
    let (session, gateway) = session_with(MockGateway::with_projects(vec![p.clone()]));
    let args = ListProjectsArgs::first_page(None, None);
    session.list_projects(&args).await.unwrap();

    gateway.delay_next_update(Duration::from_millis(100));
    let coordinator = session.coordinator();
    let id = p.id;
    let update = tokio::spawn(async move {
        coordinator
            .update_project(
                id,
                ProjectPatch {
                    title: Some("speculative".into()),
                    ..ProjectPatch::default()
                },
                None,
            )
            .await
    });

    tokio::time::sleep(Duration::from_millis(10)).await;
    let mid_flight = session.projects().get(&args.filter()).unwrap();
    assert_eq!(mid_flight.items[0].title, "speculative");

    // The initiating caller is torn down before the mutation settles; the
    // speculative state must not outlive it.
    update.abort();
    let _ = update.await;

    let entry = session.projects().get(&args.filter()).unwrap();
    assert_eq!(entry.items, vec![p]);
}

#[tokio::test]
async fn update_without_resident_copy_marks_matching_entries_stale() {
    let user = UserId::generate();
    let p = project_row("offscreen", user, false, 0);
    let (session, _gateway) =
        session_with(MockGateway::with_projects(vec![p.clone()]));

    // Only the completed column is resident, and P is not in it.
    let completed = ListProjectsArgs::first_page(Some(user), Some(true));
    session.list_projects(&completed).await.unwrap();

    session
        .coordinator()
        .update_project(p.id, ProjectPatch::set_completed(true), None)
        .await
        .unwrap();

    // P now belongs in the completed column but was never resident there;
    // the entry is flagged for refetch instead of being silently wrong.
    assert!(session.projects().is_stale(&completed.filter()));
}
