//! Timing behaviour of the action and modifier panes, on a paused clock.

mod common;

use common::{names, session, session_with, slow_session};
use std::time::Duration;
use trisearch::{Notification, Pane, SearchConfig, Session};

fn type_str(session: &mut Session, pane: Pane, text: &str) {
    for c in text.chars() {
        session.append_char(pane, c);
    }
}

fn ms(millis: u64) -> Duration {
    Duration::from_millis(millis)
}

fn finished(notifications: &[Notification], pane: Pane) -> bool {
    notifications
        .iter()
        .any(|n| matches!(n, Notification::SearchFinished { pane: p, .. } if *p == pane))
}

#[tokio::test(start_paused = true)]
async fn test_debounce_collapses_rapid_upstream_changes() {
    let mut session = session();

    // Upstream selection changes at t=0, t=10 and t=20.
    type_str(&mut session, Pane::First, "cal");
    session.run_for(ms(10)).await;
    session.move_cursor(Pane::First, 1);
    session.run_for(ms(10)).await;
    session.move_cursor(Pane::First, 1);
    assert_eq!(session.first().selection().unwrap().name, "Call Waiting");

    session.run_for(ms(199)).await;
    assert_eq!(session.second().recomputes(), 0);
    assert!(session.second().needs_recompute());

    session.run_for(ms(2)).await;
    assert_eq!(session.second().recomputes(), 1);
    assert_eq!(names(session.second().upstream()), vec!["Call Waiting"]);
    assert_eq!(names(session.peek_results(Pane::Second)), vec!["Run"]);

    session.settle().await;
    assert_eq!(session.second().recomputes(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_read_during_debounce_matches_timer_result() {
    let mut eager = session();
    let mut patient = session();
    type_str(&mut eager, Pane::First, "song");
    type_str(&mut patient, Pane::First, "song");

    eager.run_for(ms(50)).await;
    let read = eager.results(Pane::Second);
    assert_eq!(eager.second().recomputes(), 1);
    assert!(!eager.second().needs_recompute());

    patient.settle().await;
    assert_eq!(read, patient.peek_results(Pane::Second).to_vec());

    // The superseded debounce timer never runs a second recompute.
    eager.run_for(ms(500)).await;
    assert_eq!(eager.second().recomputes(), 1);
    assert!(!eager.has_pending_timers());
}

#[tokio::test(start_paused = true)]
async fn test_fast_recompute_is_announced_at_ceiling() {
    let mut session = session();
    type_str(&mut session, Pane::First, "song");
    session.take_notifications();

    session.run_for(ms(201)).await;
    assert_eq!(session.second().recomputes(), 1);
    assert!(!finished(&session.take_notifications(), Pane::Second));
    assert!(session.is_pending(Pane::Second));

    session.run_for(ms(98)).await;
    assert!(!finished(&session.take_notifications(), Pane::Second));

    session.run_for(ms(2)).await;
    assert!(finished(&session.take_notifications(), Pane::Second));
    assert!(!session.is_pending(Pane::Second));
}

#[tokio::test(start_paused = true)]
async fn test_slow_path_announces_immediately() {
    let config = SearchConfig {
        second_pane_debounce_ms: 200,
        second_pane_ceiling_ms: 200,
        ..SearchConfig::default()
    };
    let mut session = session_with(config);
    type_str(&mut session, Pane::First, "song");
    session.take_notifications();

    session.run_for(ms(201)).await;
    assert!(finished(&session.take_notifications(), Pane::Second));
    assert!(!session.is_pending(Pane::Second));
}

// Real clock: on a paused clock the search itself takes no time.
#[tokio::test]
async fn test_slow_recompute_is_announced_without_extra_wait() {
    let mut session = slow_session(ms(150));
    let start = tokio::time::Instant::now();
    type_str(&mut session, Pane::First, "song");
    session.take_notifications();

    let mut notifications = Vec::new();
    while session.second().recomputes() == 0 {
        assert!(start.elapsed() < Duration::from_secs(5));
        session.run_for(ms(20)).await;
        notifications.extend(session.take_notifications());
    }

    // 200ms debounce plus 150ms of searching is already past the ceiling,
    // so the notice goes out with the recompute.
    assert!(start.elapsed() >= ms(350));
    assert!(finished(&notifications, Pane::Second));
    assert!(!session.is_pending(Pane::Second));
    assert_eq!(
        names(session.peek_results(Pane::Second)),
        vec!["Open", "Email To", "Rename"]
    );
}

#[tokio::test(start_paused = true)]
async fn test_read_during_settle_announces_early() {
    let mut session = session();
    type_str(&mut session, Pane::First, "song");
    session.run_for(ms(201)).await;
    session.take_notifications();

    let selection = session.selection(Pane::Second).unwrap();
    assert_eq!(selection.name, "Open");
    assert!(finished(&session.take_notifications(), Pane::Second));
    assert!(!session.is_pending(Pane::Second));
    assert_eq!(session.second().recomputes(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_empty_upstream_keeps_last_results() {
    let mut session = session();
    type_str(&mut session, Pane::First, "song");
    session.settle().await;
    assert_eq!(session.second().recomputes(), 1);

    for _ in 0..4 {
        session.delete_char(Pane::First);
    }
    assert!(session.first().selection().is_none());
    session.take_notifications();

    session.settle().await;
    assert_eq!(session.second().recomputes(), 1);
    assert_eq!(
        names(session.peek_results(Pane::Second)),
        vec!["Open", "Email To", "Rename"]
    );
    assert!(finished(&session.take_notifications(), Pane::Second));
}

// Known difference: the modifier pane waits a fixed delay after each
// action-pane recompute and has no ceiling of its own, so it can settle
// before the action pane announces.
#[tokio::test(start_paused = true)]
async fn test_modifier_pane_fixed_delay_has_no_ceiling() {
    let mut session = session();
    type_str(&mut session, Pane::First, "song");

    // Its first timer fires while the action pane is still debouncing.
    session.run_for(ms(100)).await;
    assert_eq!(session.third().recomputes(), 0);
    assert!(!session.is_pending(Pane::Third));

    session.run_for(ms(159)).await;
    assert_eq!(session.second().recomputes(), 1);
    assert_eq!(session.third().recomputes(), 0);
    assert!(session.is_pending(Pane::Third));

    session.run_for(ms(2)).await;
    assert_eq!(session.third().recomputes(), 1);
    assert!(session.is_pending(Pane::Second));

    session.settle().await;
    assert_eq!(session.third().recomputes(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_reset_cancels_downstream_timers() {
    let mut session = session();
    type_str(&mut session, Pane::First, "song");
    assert!(session.has_pending_timers());

    session.reset(Pane::First);
    assert!(!session.has_pending_timers());
    session.run_for(ms(500)).await;
    assert_eq!(session.second().recomputes(), 0);
    assert_eq!(session.third().recomputes(), 0);
}
