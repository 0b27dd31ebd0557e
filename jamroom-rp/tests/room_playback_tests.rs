//! Room orchestration integration tests
//!
//! Drive the full engine (queue manager + playback session + notification
//! bus) against an in-memory store, a stub resolver, and the clock
//! transport, asserting on both room state and the broadcast event stream.

mod helpers;

use helpers::{build_room, collect_until, drain, settle, wait_for_event, wait_for_playing};
use jamroom_common::events::RoomEvent;
use jamroom_rp::error::Error;
use jamroom_rp::room::SkipOutcome;
use jamroom_rp::transport::TransportEvent;
use tokio::time::{advance, Duration};

#[tokio::test(start_paused = true)]
async fn test_add_on_empty_room_starts_playback() {
    let mut fixture = build_room(&[("song a", 300)]).await;

    let outcome = fixture
        .room
        .add_and_maybe_start("song a", "user1")
        .await
        .unwrap();
    assert_eq!(outcome.item.position, 0);
    assert!(outcome.started);

    // queue-item-added precedes the playback state change
    let events = collect_until(&mut fixture.events, "playback_state_changed").await;
    let kinds: Vec<&str> = events.iter().map(|e| e.kind()).collect();
    let added_at = kinds.iter().position(|k| *k == "queue_item_added").unwrap();
    assert_eq!(*kinds.last().unwrap(), "playback_state_changed");
    assert!(added_at < kinds.len() - 1);

    // The state change announces the new item with zero elapsed
    match events.last().unwrap() {
        RoomEvent::PlaybackStateChanged {
            item_id,
            active,
            paused,
            elapsed_seconds,
            ..
        } => {
            assert_eq!(*item_id, Some(outcome.item.id));
            assert!(*active);
            assert!(!*paused);
            assert_eq!(*elapsed_seconds, 0);
        }
        other => panic!("unexpected event: {:?}", other),
    }

    let np = fixture.room.now_playing().await.unwrap().unwrap();
    assert_eq!(np.item.title, "song a");
    assert!(np.active);
    assert!(!np.paused);
}

#[tokio::test(start_paused = true)]
async fn test_add_while_playing_only_queues() {
    let mut fixture = build_room(&[("song a", 300), ("song b", 300)]).await;

    let first = fixture
        .room
        .add_and_maybe_start("song a", "user1")
        .await
        .unwrap();
    assert!(first.started);
    wait_for_playing(&fixture.room).await;

    let second = fixture
        .room
        .add_and_maybe_start("song b", "user2")
        .await
        .unwrap();
    assert!(!second.started);
    assert_eq!(second.item.position, 1);

    let view = fixture.room.queue_view().await.unwrap();
    assert_eq!(view.upcoming.len(), 2);
    assert_eq!(view.current_position, 0);

    // Still playing the first item
    let np = fixture.room.now_playing().await.unwrap().unwrap();
    assert_eq!(np.item.title, "song a");
    drain(&mut fixture.events);
}

#[tokio::test(start_paused = true)]
async fn test_positions_are_strictly_increasing() {
    let queries: Vec<String> = (0..8).map(|i| format!("song {i}")).collect();
    let songs: Vec<(&str, i64)> = queries.iter().map(|q| (q.as_str(), 300)).collect();
    let fixture = build_room(&songs).await;

    let mut positions = Vec::new();
    for query in &queries {
        let outcome = fixture
            .room
            .add_and_maybe_start(query, "user1")
            .await
            .unwrap();
        positions.push(outcome.item.position);
    }

    for pair in positions.windows(2) {
        assert!(pair[1] > pair[0], "positions not strictly increasing: {positions:?}");
    }
    assert_eq!(positions[0], 0);
}

#[tokio::test(start_paused = true)]
async fn test_skip_advances_to_next_item() {
    let mut fixture = build_room(&[("song a", 300), ("song b", 300)]).await;

    fixture.room.add_and_maybe_start("song a", "user1").await.unwrap();
    fixture.room.add_and_maybe_start("song b", "user1").await.unwrap();
    wait_for_playing(&fixture.room).await;
    drain(&mut fixture.events);

    let outcome = fixture.room.skip_or_stop().await.unwrap();
    match outcome {
        SkipOutcome::Skipped(item) => {
            assert_eq!(item.title, "song b");
            assert_eq!(item.position, 1);
        }
        SkipOutcome::Stopped => panic!("skip reported stopped with an item upcoming"),
    }

    wait_for_playing(&fixture.room).await;

    let view = fixture.room.queue_view().await.unwrap();
    assert_eq!(view.current_position, 1);
    assert_eq!(view.upcoming.len(), 1);
    assert_eq!(view.history.len(), 1);
    assert_eq!(view.history[0].title, "song a");

    let np = fixture.room.now_playing().await.unwrap().unwrap();
    assert_eq!(np.item.title, "song b");
    assert!(np.active);
}

#[tokio::test(start_paused = true)]
async fn test_skip_on_last_item_stops() {
    let mut fixture = build_room(&[("song a", 300)]).await;

    fixture.room.add_and_maybe_start("song a", "user1").await.unwrap();
    wait_for_playing(&fixture.room).await;
    drain(&mut fixture.events);

    let outcome = fixture.room.skip_or_stop().await.unwrap();
    assert!(matches!(outcome, SkipOutcome::Stopped));

    wait_for_event(&mut fixture.events, "playback_stopped").await;

    // Session is idle and the upcoming queue is gone
    assert!(fixture.room.now_playing().await.unwrap().is_none());
    let view = fixture.room.queue_view().await.unwrap();
    assert!(view.upcoming.is_empty());
    assert!(!view.looping);

    // Nothing left to begin
    assert!(!fixture.room.begin_playback().await.unwrap());
}

#[tokio::test(start_paused = true)]
async fn test_skip_while_idle_is_rejected() {
    let fixture = build_room(&[]).await;

    let result = fixture.room.skip_or_stop().await;
    assert!(matches!(result, Err(Error::InvalidOperation(_))));
}

#[tokio::test(start_paused = true)]
async fn test_end_of_stream_advances_queue() {
    let mut fixture = build_room(&[("song a", 60), ("song b", 600)]).await;

    fixture.room.add_and_maybe_start("song a", "user1").await.unwrap();
    fixture.room.add_and_maybe_start("song b", "user1").await.unwrap();
    wait_for_playing(&fixture.room).await;
    drain(&mut fixture.events);

    // Let the first item play out naturally
    advance(Duration::from_secs(61)).await;
    wait_for_playing(&fixture.room).await;

    let view = fixture.room.queue_view().await.unwrap();
    assert_eq!(view.current_position, 1);
    let np = fixture.room.now_playing().await.unwrap().unwrap();
    assert_eq!(np.item.title, "song b");
    assert!(np.active);
}

#[tokio::test(start_paused = true)]
async fn test_end_of_stream_on_last_item_stops() {
    let mut fixture = build_room(&[("song a", 60)]).await;

    fixture.room.add_and_maybe_start("song a", "user1").await.unwrap();
    wait_for_playing(&fixture.room).await;

    advance(Duration::from_secs(61)).await;
    wait_for_event(&mut fixture.events, "playback_stopped").await;

    assert!(fixture.room.now_playing().await.unwrap().is_none());
}

#[tokio::test(start_paused = true)]
async fn test_loop_cycles_single_item_indefinitely() {
    let fixture = build_room(&[("song a", 300)]).await;

    fixture.room.add_and_maybe_start("song a", "user1").await.unwrap();
    wait_for_playing(&fixture.room).await;
    assert!(fixture.room.toggle_loop().await.unwrap());

    for _ in 0..4 {
        let outcome = fixture.room.skip_or_stop().await.unwrap();
        assert!(
            matches!(outcome, SkipOutcome::Skipped(_)),
            "looping queue must never drain"
        );
        wait_for_playing(&fixture.room).await;

        let view = fixture.room.queue_view().await.unwrap();
        assert!(!view.upcoming.is_empty());
        assert!(view.looping);

        let np = fixture.room.now_playing().await.unwrap().unwrap();
        assert_eq!(np.item.title, "song a");
    }
}

#[tokio::test(start_paused = true)]
async fn test_remove_current_position_always_fails() {
    let mut fixture = build_room(&[("song a", 300), ("song b", 300)]).await;

    fixture.room.add_and_maybe_start("song a", "user1").await.unwrap();
    fixture.room.add_and_maybe_start("song b", "user1").await.unwrap();
    wait_for_playing(&fixture.room).await;
    drain(&mut fixture.events);

    let result = fixture.room.remove_at(0).await;
    assert!(matches!(result, Err(Error::InvalidOperation(_))));

    // Store unchanged, no removal broadcast
    let view = fixture.room.queue_view().await.unwrap();
    assert_eq!(view.upcoming.len(), 2);
    assert!(drain(&mut fixture.events)
        .iter()
        .all(|e| e.kind() != "queue_item_removed"));

    // A non-current position removes fine
    let removed = fixture.room.remove_at(1).await.unwrap();
    assert_eq!(removed.position, 1);
    let event = wait_for_event(&mut fixture.events, "queue_item_removed").await;
    match event {
        RoomEvent::QueueItemRemoved { item_id, position, .. } => {
            assert_eq!(item_id, removed.id);
            assert_eq!(position, 1);
        }
        other => panic!("unexpected event: {:?}", other),
    }
}

#[tokio::test(start_paused = true)]
async fn test_pause_freezes_elapsed_and_resume_continues() {
    let mut fixture = build_room(&[("song a", 600)]).await;

    fixture.room.add_and_maybe_start("song a", "user1").await.unwrap();
    wait_for_event(&mut fixture.events, "playback_state_changed").await;

    advance(Duration::from_secs(3)).await;
    settle().await;

    fixture.room.pause_resume().await.unwrap();
    let np = fixture.room.now_playing().await.unwrap().unwrap();
    assert!(np.paused);
    let elapsed_at_pause = np.elapsed_seconds;

    // Elapsed time is frozen for as long as the pause lasts
    advance(Duration::from_secs(10)).await;
    settle().await;

    let np = fixture.room.now_playing().await.unwrap().unwrap();
    assert!(np.paused);
    assert_eq!(np.elapsed_seconds, elapsed_at_pause);

    fixture.room.pause_resume().await.unwrap();
    advance(Duration::from_secs(3)).await;
    settle().await;

    let np = fixture.room.now_playing().await.unwrap().unwrap();
    assert!(!np.paused);
    assert!(np.elapsed_seconds > elapsed_at_pause);
}

#[tokio::test(start_paused = true)]
async fn test_pause_while_idle_rejected_without_events() {
    let mut fixture = build_room(&[]).await;
    drain(&mut fixture.events);

    let result = fixture.room.pause_resume().await;
    assert!(matches!(result, Err(Error::InvalidOperation(_))));

    settle().await;
    assert!(drain(&mut fixture.events).is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_stop_clears_upcoming_and_loop_but_keeps_history() {
    let mut fixture =
        build_room(&[("song a", 300), ("song b", 300), ("song c", 300)]).await;

    for query in ["song a", "song b", "song c"] {
        fixture.room.add_and_maybe_start(query, "user1").await.unwrap();
    }
    wait_for_playing(&fixture.room).await;
    fixture.room.toggle_loop().await.unwrap();
    fixture.room.skip_or_stop().await.unwrap();
    settle().await;
    drain(&mut fixture.events);

    fixture.room.stop().await.unwrap();
    wait_for_event(&mut fixture.events, "playback_stopped").await;

    let view = fixture.room.queue_view().await.unwrap();
    assert!(view.upcoming.is_empty());
    assert!(!view.looping);
    // Loop re-added a copy of song a at the tail before the cursor moved;
    // history still holds the original first item
    assert!(view.history.iter().any(|item| item.title == "song a"));

    // Stopping an idle room is a rejected precondition
    let result = fixture.room.stop().await;
    assert!(matches!(result, Err(Error::InvalidOperation(_))));
}

#[tokio::test(start_paused = true)]
async fn test_begin_rejected_while_session_active() {
    let fixture = build_room(&[("song a", 300)]).await;

    fixture.room.add_and_maybe_start("song a", "user1").await.unwrap();
    wait_for_playing(&fixture.room).await;

    assert!(!fixture.room.begin_playback().await.unwrap());
}

#[tokio::test(start_paused = true)]
async fn test_begin_on_empty_queue_is_noop() {
    let mut fixture = build_room(&[]).await;
    drain(&mut fixture.events);

    assert!(!fixture.room.begin_playback().await.unwrap());
    assert!(fixture.room.now_playing().await.unwrap().is_none());

    settle().await;
    assert!(drain(&mut fixture.events).is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_resolution_failure_leaves_queue_untouched() {
    let mut fixture = build_room(&[]).await;
    drain(&mut fixture.events);

    let result = fixture.room.add_and_maybe_start("unknown song", "user1").await;
    assert!(matches!(result, Err(Error::Resolution(_))));

    let view = fixture.room.queue_view().await.unwrap();
    assert!(view.upcoming.is_empty());

    settle().await;
    assert!(drain(&mut fixture.events).is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_transient_disconnect_is_ignored() {
    let mut fixture = build_room(&[("song a", 600)]).await;

    fixture.room.add_and_maybe_start("song a", "user1").await.unwrap();
    wait_for_playing(&fixture.room).await;
    drain(&mut fixture.events);

    fixture.transport_tx.send(TransportEvent::Disconnected).unwrap();
    settle().await;
    fixture.transport_tx.send(TransportEvent::Reconnecting).unwrap();
    settle().await;

    // Ride well past the grace window
    advance(Duration::from_secs(10)).await;
    settle().await;
    settle().await;

    let np = fixture.room.now_playing().await.unwrap().unwrap();
    assert!(np.active);
    let events = drain(&mut fixture.events);
    assert!(events.iter().all(|e| e.kind() != "playback_stopped"));
    assert!(events.iter().all(|e| e.kind() != "playback_disconnected"));
}

#[tokio::test(start_paused = true)]
async fn test_permanent_disconnect_stops_with_distinct_event() {
    let mut fixture = build_room(&[("song a", 600)]).await;

    fixture.room.add_and_maybe_start("song a", "user1").await.unwrap();
    wait_for_playing(&fixture.room).await;
    drain(&mut fixture.events);

    fixture.transport_tx.send(TransportEvent::Disconnected).unwrap();
    settle().await;

    // No reconnect signal inside the 5s grace window
    advance(Duration::from_secs(6)).await;

    wait_for_event(&mut fixture.events, "playback_stopped").await;
    wait_for_event(&mut fixture.events, "playback_disconnected").await;

    assert!(fixture.room.now_playing().await.unwrap().is_none());
    let view = fixture.room.queue_view().await.unwrap();
    assert!(view.upcoming.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_disconnect_while_idle_is_ignored() {
    let mut fixture = build_room(&[]).await;
    drain(&mut fixture.events);

    fixture.transport_tx.send(TransportEvent::Disconnected).unwrap();
    advance(Duration::from_secs(10)).await;
    settle().await;

    assert!(drain(&mut fixture.events).is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_cursor_survives_restart() {
    let mut fixture = build_room(&[("song a", 300), ("song b", 300)]).await;

    fixture.room.add_and_maybe_start("song a", "user1").await.unwrap();
    fixture.room.add_and_maybe_start("song b", "user1").await.unwrap();
    wait_for_playing(&fixture.room).await;
    fixture.room.skip_or_stop().await.unwrap();
    settle().await;
    drain(&mut fixture.events);

    // A second room over the same store picks up the persisted cursor
    let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
    let transport: std::sync::Arc<dyn jamroom_rp::transport::Transport> =
        std::sync::Arc::new(jamroom_rp::transport::ClockTransport::new(tx));
    let resolver: std::sync::Arc<dyn jamroom_rp::resolver::SongResolver> =
        std::sync::Arc::new(helpers::StubResolver::with_songs(&[]));
    let restarted = jamroom_rp::room::Room::start(
        fixture.db.clone(),
        resolver,
        transport,
        rx,
        "test-room".to_string(),
    )
    .await
    .unwrap();

    let view = restarted.queue_view().await.unwrap();
    assert_eq!(view.current_position, 1);
    assert_eq!(view.upcoming.len(), 1);
    assert_eq!(view.upcoming[0].title, "song b");
}
