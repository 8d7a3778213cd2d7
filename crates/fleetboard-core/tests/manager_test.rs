#![allow(clippy::unwrap_used)]

// Manager behaviour against the in-process backend: ordering scenarios,
// partial failures, change-feed refreshes, and the mount lifecycle.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};
use pretty_assertions::assert_eq;

use fleetboard_core::model::PositionPatch;
use fleetboard_core::{
    ChangeKind, Collection, CollectionManager, CoreError, EntityId, ErrorOrigin, Faq, FaqPatch,
    FeedState, FooterResource, Game, ManagerOptions, MemoryBackend, MoveDirection, MoveOutcome,
    NewFaq, NewFooterResource, OrderedEntity, Phase, ReconnectConfig, ResourceCategory,
    ViewStream,
};

// ── Fixtures ────────────────────────────────────────────────────────

fn at(secs: i64) -> Option<DateTime<Utc>> {
    Utc.timestamp_opt(1_700_000_000 + secs, 0).single()
}

fn faq(id: &str, position: i64, created: i64) -> Faq {
    Faq {
        id: EntityId::from(id),
        question_it: format!("Domanda {id}"),
        question_en: format!("Question {id}"),
        answer_it: "Risposta".into(),
        answer_en: "Answer".into(),
        position: Some(position),
        is_active: true,
        created_at: at(created),
    }
}

fn resource(id: &str, category: &str, position: i64) -> FooterResource {
    FooterResource {
        id: EntityId::from(id),
        title_it: id.into(),
        title_en: id.into(),
        url: format!("https://example.com/{id}"),
        icon: None,
        category: category.into(),
        position: Some(position),
        is_active: true,
        created_at: at(0),
    }
}

fn game(id: &str, position: Option<i64>, created: i64) -> Game {
    Game {
        id: EntityId::from(id),
        tournament: "Winter Cup".into(),
        phase: "Finals".into(),
        format: "OU".into(),
        players: format!("{id} vs rival"),
        description_it: "Partita".into(),
        description_en: "Game".into(),
        image_url: "https://i.imgur.com/abc123.png".into(),
        replay_url: "https://replay.example.com/1".into(),
        position,
        created_at: at(created),
        updated_at: None,
    }
}

fn new_faq(question: &str) -> NewFaq {
    NewFaq {
        question_it: question.into(),
        question_en: question.into(),
        answer_it: "Risposta".into(),
        answer_en: "Answer".into(),
        is_active: true,
    }
}

fn ids<T: OrderedEntity>(rows: &[Arc<T>]) -> Vec<String> {
    rows.iter().map(|r| r.id().to_string()).collect()
}

fn positions<T: OrderedEntity>(rows: &[Arc<T>]) -> Vec<(String, Option<i64>)> {
    rows.iter()
        .map(|r| (r.id().to_string(), r.position()))
        .collect()
}

fn quiet() -> ManagerOptions {
    ManagerOptions::default().oneshot()
}

async fn abc_backend() -> Arc<MemoryBackend> {
    let backend = Arc::new(MemoryBackend::new());
    backend
        .seed(vec![faq("A", 1, 0), faq("B", 2, 1), faq("C", 3, 2)])
        .await;
    backend
}

async fn mounted_faqs(
    backend: &Arc<MemoryBackend>,
    options: ManagerOptions,
) -> CollectionManager<Faq, MemoryBackend> {
    let manager = CollectionManager::new(Arc::clone(backend), options);
    manager.mount().await.unwrap();
    manager
}

async fn wait_until<T: OrderedEntity>(
    view: &mut ViewStream<T>,
    done: impl Fn(&[Arc<T>]) -> bool,
) {
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            if done(&view.latest()) {
                return;
            }
            assert!(view.changed().await.is_some(), "manager dropped");
        }
    })
    .await
    .unwrap();
}

// ── Ordering scenarios ──────────────────────────────────────────────

#[tokio::test]
async fn mount_loads_sorted_rows() {
    let backend = Arc::new(MemoryBackend::new());
    backend
        .seed(vec![faq("C", 3, 0), faq("A", 1, 0), faq("B", 2, 0)])
        .await;
    let manager = mounted_faqs(&backend, quiet()).await;

    assert_eq!(ids(&manager.snapshot()), vec!["A", "B", "C"]);
    let status = manager.status();
    assert_eq!(status.phase, Phase::Ready);
    assert!(status.last_refresh.is_some());
    assert_eq!(status.feed, FeedState::Disabled);
}

#[tokio::test]
async fn move_up_swaps_with_previous_row() {
    let backend = abc_backend().await;
    let manager = mounted_faqs(&backend, quiet()).await;

    let outcome = manager
        .move_item(&EntityId::from("B"), MoveDirection::Up)
        .await
        .unwrap();

    assert_eq!(outcome, MoveOutcome::Moved);
    assert_eq!(backend.write_count(), 2);
    assert_eq!(
        positions(&manager.snapshot()),
        vec![
            ("B".into(), Some(1)),
            ("A".into(), Some(2)),
            ("C".into(), Some(3)),
        ]
    );
    assert!(manager.status().last_error.is_none());
}

#[tokio::test]
async fn boundary_moves_write_nothing() {
    let backend = abc_backend().await;
    let manager = mounted_faqs(&backend, quiet()).await;

    let up = manager
        .move_item(&EntityId::from("A"), MoveDirection::Up)
        .await
        .unwrap();
    let down = manager
        .move_item(&EntityId::from("C"), MoveDirection::Down)
        .await
        .unwrap();

    assert_eq!(up, MoveOutcome::Unchanged);
    assert_eq!(down, MoveOutcome::Unchanged);
    assert_eq!(backend.write_count(), 0);
    assert_eq!(ids(&manager.snapshot()), vec!["A", "B", "C"]);
}

#[tokio::test]
async fn up_then_down_restores_order() {
    let backend = abc_backend().await;
    let manager = mounted_faqs(&backend, quiet()).await;
    let before = positions(&manager.snapshot());

    let b = EntityId::from("B");
    manager.move_item(&b, MoveDirection::Up).await.unwrap();
    manager.move_item(&b, MoveDirection::Down).await.unwrap();

    let mut after = positions(&manager.snapshot());
    let mut expected = before;
    after.sort();
    expected.sort();
    assert_eq!(after, expected);
    assert_eq!(ids(&manager.snapshot()), vec!["A", "B", "C"]);
}

#[tokio::test]
async fn insert_appends_after_moves() {
    let backend = abc_backend().await;
    let manager = mounted_faqs(&backend, quiet()).await;
    manager
        .move_item(&EntityId::from("B"), MoveDirection::Up)
        .await
        .unwrap();

    let d = manager.insert(new_faq("D")).await.unwrap();

    assert_eq!(d.position, Some(4));
    assert_eq!(manager.snapshot().last().unwrap().id, d.id);
    assert_eq!(manager.len(), 4);
}

#[tokio::test]
async fn insert_into_empty_collection_uses_first_position() {
    let backend = Arc::new(MemoryBackend::new());
    let manager = mounted_faqs(&backend, quiet()).await;

    let first = manager.insert(new_faq("first")).await.unwrap();
    assert_eq!(first.position, Some(0));
}

#[tokio::test]
async fn unknown_id_is_not_found() {
    let backend = abc_backend().await;
    let manager = mounted_faqs(&backend, quiet()).await;

    let err = manager
        .move_item(&EntityId::from("Z"), MoveDirection::Up)
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::NotFound { .. }));
    assert_eq!(backend.write_count(), 0);
    assert!(manager.status().last_error.is_some());
}

// ── Failures ────────────────────────────────────────────────────────

#[tokio::test]
async fn partial_swap_shows_persisted_state_and_error() {
    let backend = abc_backend().await;
    let manager = mounted_faqs(&backend, quiet()).await;
    backend.fail_next_update(&EntityId::from("A")).await;

    let err = manager
        .move_item(&EntityId::from("B"), MoveDirection::Up)
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::PartialSwap { .. }));

    // B took position 1; A kept it. The refetch shows exactly that.
    assert_eq!(
        positions(&manager.snapshot()),
        vec![
            ("A".into(), Some(1)),
            ("B".into(), Some(1)),
            ("C".into(), Some(3)),
        ]
    );
    let status = manager.status();
    assert_eq!(status.phase, Phase::Ready);
    assert!(status.last_error.unwrap().contains("partly applied"));

    // The next successful write clears the error.
    manager
        .move_item(&EntityId::from("C"), MoveDirection::Up)
        .await
        .unwrap();
    assert!(manager.status().last_error.is_none());
}

#[tokio::test]
async fn write_failure_outlives_a_recovering_refetch() {
    let backend = abc_backend().await;
    let manager = mounted_faqs(&backend, quiet()).await;

    backend.fail_next_lists(1).await;
    assert!(manager.refresh().await.is_err());
    assert_eq!(manager.status().error_origin, Some(ErrorOrigin::Fetch));

    backend.fail_next_update(&EntityId::from("A")).await;
    let err = manager
        .move_item(&EntityId::from("B"), MoveDirection::Up)
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::PartialSwap { .. }));

    // The refetch succeeded and shows the duplicate, but the error stays.
    let status = manager.status();
    assert_eq!(status.phase, Phase::Ready);
    assert_eq!(status.error_origin, Some(ErrorOrigin::Write));
    assert!(status.last_error.unwrap().contains("partly applied"));
    assert_eq!(
        positions(&manager.snapshot()),
        vec![
            ("A".into(), Some(1)),
            ("B".into(), Some(1)),
            ("C".into(), Some(3)),
        ]
    );

    // Another plain refresh does not hide it either.
    manager.refresh().await.unwrap();
    assert!(manager.status().last_error.is_some());
}

#[tokio::test]
async fn failed_first_fetch_recovers_on_refresh() {
    let backend = abc_backend().await;
    backend.fail_next_lists(1).await;
    let manager = CollectionManager::<Faq, _>::new(Arc::clone(&backend), quiet());

    assert!(manager.mount().await.is_err());
    assert!(manager.is_mounted());
    assert_eq!(manager.status().phase, Phase::Error);
    assert!(manager.is_empty());

    manager.refresh().await.unwrap();
    let status = manager.status();
    assert_eq!(status.phase, Phase::Ready);
    assert!(status.last_error.is_none());
    assert_eq!(manager.len(), 3);
}

#[tokio::test]
async fn games_cannot_be_hidden() {
    let backend = Arc::new(MemoryBackend::new());
    backend
        .seed(vec![game("g1", None, 0), game("g2", None, 1)])
        .await;
    let manager = CollectionManager::<Game, _>::new(Arc::clone(&backend), quiet());
    manager.mount().await.unwrap();

    // Null positions sort as 0, then by creation time.
    assert_eq!(ids(&manager.snapshot()), vec!["g1", "g2"]);

    let err = manager
        .toggle_active(&EntityId::from("g1"))
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::Unsupported { .. }));
    assert_eq!(backend.write_count(), 0);
}

#[tokio::test]
async fn delete_drops_the_row_for_good() {
    let backend = abc_backend().await;
    let manager = mounted_faqs(&backend, quiet()).await;
    let b = EntityId::from("B");

    manager.delete(&b).await.unwrap();
    assert_eq!(ids(&manager.snapshot()), vec!["A", "C"]);

    let writes = backend.write_count();
    let err = manager.move_item(&b, MoveDirection::Up).await.unwrap_err();
    assert!(matches!(err, CoreError::NotFound { .. }));
    assert_eq!(backend.write_count(), writes);
}

#[tokio::test]
async fn deleted_rows_are_never_written_again() {
    let backend = abc_backend().await;
    let manager = mounted_faqs(&backend, quiet()).await;
    let a = EntityId::from("A");

    manager.delete(&a).await.unwrap();
    let writes = backend.write_count();

    let patch = FaqPatch {
        question_en: Some("Still there?".into()),
        ..FaqPatch::default()
    };
    let err = manager.update_fields(&a, patch).await.unwrap_err();
    assert!(matches!(err, CoreError::NotFound { .. }));
    let err = manager.set_active(&a, false).await.unwrap_err();
    assert!(matches!(err, CoreError::NotFound { .. }));
    let err = manager.toggle_active(&a).await.unwrap_err();
    assert!(matches!(err, CoreError::NotFound { .. }));
    let err = manager.delete(&a).await.unwrap_err();
    assert!(matches!(err, CoreError::NotFound { .. }));

    assert_eq!(backend.write_count(), writes);
    assert_eq!(ids(&manager.snapshot()), vec!["B", "C"]);
    assert!(manager.status().last_error.is_some());
}

#[tokio::test]
async fn toggle_and_public_visibility() {
    let backend = abc_backend().await;
    let admin = mounted_faqs(&backend, quiet()).await;
    let public = mounted_faqs(&backend, ManagerOptions::public().oneshot()).await;

    let hidden = admin.toggle_active(&EntityId::from("B")).await.unwrap();
    assert!(!hidden.is_active);

    public.refresh().await.unwrap();
    assert_eq!(ids(&public.snapshot()), vec!["A", "C"]);
    assert_eq!(ids(&admin.snapshot()), vec!["A", "B", "C"]);

    let err = public
        .move_item(&EntityId::from("C"), MoveDirection::Up)
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::Unsupported { .. }));
}

#[tokio::test]
async fn empty_patch_is_rejected_without_refetch() {
    let backend = abc_backend().await;
    let manager = mounted_faqs(&backend, quiet()).await;

    let err = manager
        .update_fields(&EntityId::from("A"), fleetboard_core::FaqPatch::default())
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::Validation { .. }));
    assert_eq!(backend.write_count(), 0);
}

// ── Grouped collections ─────────────────────────────────────────────

#[tokio::test]
async fn resources_reorder_within_their_category() {
    let backend = Arc::new(MemoryBackend::new());
    backend
        .seed(vec![
            resource("docs", "links", 0),
            resource("blog", "links", 1),
            resource("yt", "social", 0),
        ])
        .await;
    let manager = CollectionManager::<FooterResource, _>::new(Arc::clone(&backend), quiet());
    manager.mount().await.unwrap();

    // First of its own category, even though "blog" precedes it overall.
    let outcome = manager
        .move_item(&EntityId::from("yt"), MoveDirection::Up)
        .await
        .unwrap();
    assert_eq!(outcome, MoveOutcome::Unchanged);

    let tw = manager
        .insert(NewFooterResource {
            title_it: "Twitter".into(),
            title_en: "Twitter".into(),
            url: "https://twitter.com/fleet".into(),
            icon: Some("twitter".into()),
            category: ResourceCategory::Social,
            is_active: true,
        })
        .await
        .unwrap();
    assert_eq!(tw.position, Some(1));

    manager
        .move_item(&tw.id, MoveDirection::Up)
        .await
        .unwrap();

    let groups = manager.grouped();
    assert_eq!(groups.keys().collect::<Vec<_>>(), vec!["links", "social"]);
    assert_eq!(ids(&groups["links"]), vec!["docs", "blog"]);
    assert_eq!(ids(&groups["social"]), vec![tw.id.to_string(), "yt".to_owned()]);
}

// ── Change feed and lifecycle ───────────────────────────────────────

#[tokio::test]
async fn other_sessions_are_picked_up_from_the_feed() {
    let backend = abc_backend().await;
    let watcher = mounted_faqs(&backend, ManagerOptions::default()).await;
    let editor = mounted_faqs(&backend, quiet()).await;
    assert_eq!(watcher.status().feed, FeedState::Connected);

    let mut view = watcher.subscribe();
    editor
        .move_item(&EntityId::from("C"), MoveDirection::Up)
        .await
        .unwrap();

    wait_until(&mut view, |rows| ids(rows) == vec!["A", "C", "B"]).await;
    watcher.unmount().await;
}

#[tokio::test]
async fn feed_is_reopened_after_it_closes() {
    let backend = abc_backend().await;
    let options = ManagerOptions {
        resubscribe: ReconnectConfig {
            initial_delay: Duration::from_millis(10),
            max_delay: Duration::from_millis(50),
            max_retries: None,
        },
        ..ManagerOptions::default()
    };
    let manager = mounted_faqs(&backend, options).await;
    let mut view = manager.subscribe();

    backend.close_feeds(Collection::Faqs);
    backend.fail_next_subscribes(1);
    // Written while nobody listens: only the catch-up refetch can see it.
    let _: Faq = fleetboard_core::Backend::update_fields(
        backend.as_ref(),
        &EntityId::from("A"),
        &PositionPatch { position: 9 },
    )
    .await
    .unwrap();

    wait_until(&mut view, |rows| ids(rows) == vec!["B", "C", "A"]).await;

    tokio::time::timeout(Duration::from_secs(5), async {
        while manager.status().feed != FeedState::Connected {
            view.status_changed().await.unwrap();
        }
    })
    .await
    .unwrap();
    manager.unmount().await;
}

#[tokio::test]
async fn feed_outage_shows_as_reconnecting() {
    let backend = abc_backend().await;
    let manager = mounted_faqs(&backend, ManagerOptions::default()).await;
    let mut view = manager.subscribe();
    assert_eq!(manager.status().feed, FeedState::Connected);

    backend.notify(Collection::Faqs, ChangeKind::Disconnected);
    tokio::time::timeout(Duration::from_secs(5), async {
        while manager.status().feed != (FeedState::Reconnecting { attempt: 1 }) {
            view.status_changed().await.unwrap();
        }
    })
    .await
    .unwrap();

    // Stored silently during the outage; only the resync refetch sees it.
    backend.seed(vec![faq("D", 4, 3)]).await;
    backend.notify(Collection::Faqs, ChangeKind::Resync);

    wait_until(&mut view, |rows| ids(rows) == vec!["A", "B", "C", "D"]).await;
    tokio::time::timeout(Duration::from_secs(5), async {
        while manager.status().feed != FeedState::Connected {
            view.status_changed().await.unwrap();
        }
    })
    .await
    .unwrap();
    manager.unmount().await;
}

#[tokio::test]
async fn unmount_stops_updates_and_discards_late_responses() {
    let backend = abc_backend().await;
    let manager = mounted_faqs(&backend, ManagerOptions::default()).await;

    backend.set_list_delay(Some(Duration::from_millis(200))).await;
    let pending = {
        let manager = manager.clone();
        tokio::spawn(async move { manager.refresh().await })
    };
    tokio::time::sleep(Duration::from_millis(20)).await;

    let _: Faq = fleetboard_core::Backend::update_fields(
        backend.as_ref(),
        &EntityId::from("A"),
        &PositionPatch { position: 9 },
    )
    .await
    .unwrap();
    manager.unmount().await;
    pending.await.unwrap().unwrap();

    assert_eq!(ids(&manager.snapshot()), vec!["A", "B", "C"]);
    assert_eq!(manager.status().phase, Phase::Idle);
    assert!(matches!(
        manager.refresh().await,
        Err(CoreError::NotMounted { .. })
    ));
}

#[tokio::test]
async fn mount_is_idempotent() {
    let backend = abc_backend().await;
    let manager = mounted_faqs(&backend, quiet()).await;
    manager.mount().await.unwrap();
    assert_eq!(manager.len(), 3);

    manager.unmount().await;
    manager.unmount().await;
    assert!(!manager.is_mounted());
}

#[tokio::test]
async fn writes_require_a_mounted_view() {
    let backend = abc_backend().await;
    let manager = CollectionManager::<Faq, _>::new(Arc::clone(&backend), quiet());
    let err = manager.insert(new_faq("x")).await.unwrap_err();
    assert!(matches!(err, CoreError::NotMounted { .. }));
}

#[tokio::test]
async fn view_stream_yields_the_reordered_rows() {
    use futures_util::StreamExt;

    let backend = abc_backend().await;
    let manager = mounted_faqs(&backend, quiet()).await;
    let mut stream = manager.subscribe().into_stream();

    let first = stream.next().await.unwrap();
    assert_eq!(ids(&first), vec!["A", "B", "C"]);

    manager
        .move_item(&EntityId::from("C"), MoveDirection::Up)
        .await
        .unwrap();

    let reordered = tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            let rows = stream.next().await.unwrap();
            if ids(&rows) == ["A", "C", "B"] {
                return rows;
            }
        }
    })
    .await
    .unwrap();
    assert_eq!(
        positions(&reordered),
        vec![
            ("A".into(), Some(1)),
            ("C".into(), Some(2)),
            ("B".into(), Some(3)),
        ]
    );
}

#[tokio::test]
async fn dashboard_mounts_every_collection() {
    use fleetboard_core::Dashboard;

    let backend = abc_backend().await;
    backend
        .seed(vec![resource("discord", "social", 0), resource("rules", "legal", 0)])
        .await;
    backend.seed(vec![game("g1", None, 0)]).await;

    let dashboard = Dashboard::with_backend(Arc::clone(&backend), &quiet());
    dashboard.mount_all().await.unwrap();

    assert_eq!(dashboard.faqs().len(), 3);
    assert_eq!(dashboard.resources().len(), 2);
    assert_eq!(dashboard.games().len(), 1);
    assert!(dashboard.members().is_empty());
    assert_eq!(dashboard.members().status().phase, Phase::Ready);

    dashboard.unmount_all().await;
    assert_eq!(dashboard.faqs().status().phase, Phase::Idle);
    assert!(!dashboard.games().is_mounted());
}
