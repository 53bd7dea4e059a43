use super::{SinkCall, cid, harness, harness_with, worker_harness};
use crate::{AddOutcome, AggregatorConfig, MessageId, NotificationStore, SuppressedPolicy, UNSEEN};

fn mid(id: &str) -> MessageId {
    MessageId::from(id)
}

#[test]
fn test_lines_follow_position_order() {
    let h = harness();
    let c = cid("C1");
    for (id, position) in [("a", 3), ("b", 1), ("c", 2)] {
        assert_eq!(
            h.aggregator.add(&c, &mid(id), position, &format!("p{position}")),
            AddOutcome::Added
        );
    }
    let last = h.sink.last_upsert().unwrap();
    assert_eq!(last.lines, vec!["p1", "p2", "p3"]);
    assert_eq!(last.title, "Title of C1");
    assert_eq!(h.sink.upserts().len(), 3);
}

#[test]
fn test_seven_messages_roll_up() {
    let h = harness();
    let c = cid("C1");
    for i in 1..=7 {
        h.aggregator.add(&c, &mid(&format!("id{i}")), i, &format!("m{i}"));
    }
    let last = h.sink.last_upsert().unwrap();
    assert_eq!(last.lines, vec!["m3", "m4", "m5", "m6", "m7"]);
    assert_eq!(last.more_count, 2);
    assert_eq!(last.collapsed_text, "7 new messages");
    assert_eq!(last.latest_message_id, mid("id7"));
}

#[test]
fn test_single_message_collapsed_text() {
    let h = harness();
    h.aggregator.add(&cid("C1"), &mid("a"), 10, "hi");
    let last = h.sink.last_upsert().unwrap();
    assert_eq!(last.collapsed_text, "hi");
    assert_eq!(last.more_count, 0);
}

#[test]
fn test_duplicate_add_is_noop() {
    let h = harness();
    let c = cid("C1");
    assert_eq!(h.aggregator.add(&c, &mid("a"), 10, "hi"), AddOutcome::Added);
    assert_eq!(h.aggregator.add(&c, &mid("a"), 10, "hi"), AddOutcome::Duplicate);

    assert_eq!(h.store.pending(&c).unwrap().len(), 1);
    assert_eq!(h.sink.calls().len(), 1);
}

#[test]
fn test_stale_add_is_noop() {
    let h = harness();
    let c = cid("C1");
    h.store.advance_watermark(&c, 5).unwrap();

    assert_eq!(h.aggregator.add(&c, &mid("a"), 5, "old"), AddOutcome::Stale);
    assert_eq!(h.aggregator.add(&c, &mid("b"), -3, "older"), AddOutcome::Stale);
    assert!(h.store.pending(&c).unwrap().is_empty());
    assert!(h.sink.calls().is_empty());
}

#[test]
fn test_unseen_conversation_accepts_minimum_plus_one() {
    let h = harness();
    let c = cid("C1");
    assert_eq!(h.aggregator.add(&c, &mid("a"), UNSEEN, "x"), AddOutcome::Stale);
    assert_eq!(h.aggregator.add(&c, &mid("b"), UNSEEN + 1, "y"), AddOutcome::Added);
}

#[tokio::test]
async fn test_clear_folds_pending_into_watermark() {
    let h = worker_harness();
    let c = cid("C1");
    h.store.advance_watermark(&c, 1).unwrap();
    for (id, position) in [("a", 3), ("b", 7), ("c", 5)] {
        h.aggregator.add(&c, &mid(id), position, id);
    }

    h.aggregator.clear(&c);
    h.aggregator.flush().await;

    assert_eq!(h.store.watermark(&c).unwrap(), 7);
    assert!(h.store.pending(&c).unwrap().is_empty());
    assert_eq!(h.sink.calls().last(), Some(&SinkCall::Cancel(c.clone())));
}

#[tokio::test]
async fn test_clear_twice_is_idempotent() {
    let h = worker_harness();
    let c = cid("C1");
    h.aggregator.add(&c, &mid("a"), 4, "a");
    h.aggregator.clear(&c);
    h.aggregator.flush().await;
    let once = h.store.watermark(&c).unwrap();

    h.aggregator.clear(&c);
    h.aggregator.flush().await;
    assert_eq!(h.store.watermark(&c).unwrap(), once);
    assert!(h.store.pending(&c).unwrap().is_empty());
}

#[test]
fn test_clear_without_pending_keeps_watermark() {
    let h = harness();
    let c = cid("C1");
    h.aggregator.clear_blocking(&c);
    assert_eq!(h.store.watermark(&c).unwrap(), UNSEEN);

    h.store.advance_watermark(&c, 9).unwrap();
    h.aggregator.clear_blocking(&c);
    assert_eq!(h.store.watermark(&c).unwrap(), 9);
}

#[tokio::test]
async fn test_add_after_clear_respects_new_watermark() {
    let h = worker_harness();
    let c = cid("C1");
    h.aggregator.add(&c, &mid("a"), 10, "a");
    h.aggregator.clear(&c);
    h.aggregator.flush().await;

    assert_eq!(h.aggregator.add(&c, &mid("b"), 10, "b"), AddOutcome::Stale);
    assert_eq!(h.aggregator.add(&c, &mid("c"), 9, "c"), AddOutcome::Stale);
    assert_eq!(h.aggregator.add(&c, &mid("d"), 11, "d"), AddOutcome::Added);
    assert_eq!(h.sink.last_upsert().unwrap().lines, vec!["d"]);
}

#[test]
fn test_same_position_different_ids_both_kept() {
    let h = harness();
    let c = cid("C1");
    assert_eq!(h.aggregator.add(&c, &mid("x"), 4, "first"), AddOutcome::Added);
    assert_eq!(h.aggregator.add(&c, &mid("y"), 4, "second"), AddOutcome::Added);
    assert_eq!(h.sink.last_upsert().unwrap().lines, vec!["first", "second"]);
}

#[test]
fn test_enabled_flags() {
    let h = harness();
    let c = cid("C1");
    assert!(h.aggregator.is_enabled());
    assert!(h.aggregator.is_conversation_enabled(Some(&c)));
    assert!(h.aggregator.is_conversation_enabled(None));

    h.aggregator.set_conversation_enabled(&c, false);
    assert!(h.aggregator.is_enabled());
    assert!(!h.aggregator.is_conversation_enabled(Some(&c)));
    assert!(h.aggregator.is_conversation_enabled(Some(&cid("C2"))));
    assert_eq!(h.sink.calls(), vec![SinkCall::Cancel(c.clone())]);

    h.aggregator.set_enabled(false);
    assert!(!h.aggregator.is_enabled());
    assert!(!h.aggregator.is_conversation_enabled(None));
    assert_eq!(h.sink.calls().last(), Some(&SinkCall::CancelAll));

    h.aggregator.set_enabled(true);
    h.aggregator.set_conversation_enabled(&c, true);
    assert!(h.aggregator.is_enabled());
    assert!(h.aggregator.is_conversation_enabled(Some(&c)));
    // Enabling never touches the sink
    assert_eq!(h.sink.calls().len(), 2);
}

#[test]
fn test_drop_policy_ignores_suppressed_messages() {
    let h = harness();
    let c = cid("C1");
    h.aggregator.set_enabled(false);
    let before = h.sink.calls().len();

    for i in 1..=3 {
        assert_eq!(
            h.aggregator.add(&c, &mid(&format!("m{i}")), i, "x"),
            AddOutcome::Suppressed
        );
    }
    assert_eq!(h.sink.calls().len(), before);
    assert!(h.store.pending(&c).unwrap().is_empty());
}

#[test]
fn test_record_policy_tracks_suppressed_messages() {
    let h = harness_with(AggregatorConfig {
        suppressed: SuppressedPolicy::Record,
        ..AggregatorConfig::default()
    });
    let c = cid("C1");
    h.aggregator.set_conversation_enabled(&c, false);
    let before = h.sink.calls().len();

    assert_eq!(h.aggregator.add(&c, &mid("a"), 1, "one"), AddOutcome::Suppressed);
    assert_eq!(h.aggregator.add(&c, &mid("b"), 2, "two"), AddOutcome::Suppressed);
    assert_eq!(h.aggregator.add(&c, &mid("b"), 2, "two"), AddOutcome::Duplicate);
    assert_eq!(h.sink.calls().len(), before);
    assert_eq!(h.store.pending(&c).unwrap().len(), 2);

    h.aggregator.set_conversation_enabled(&c, true);
    assert_eq!(h.aggregator.add(&c, &mid("c"), 3, "three"), AddOutcome::Added);
    let last = h.sink.last_upsert().unwrap();
    assert_eq!(last.lines, vec!["one", "two", "three"]);
}

#[test]
fn test_mark_seen_trims_and_rerenders() {
    let h = harness();
    let c = cid("C1");
    for i in 1..=4 {
        h.aggregator.add(&c, &mid(&format!("m{i}")), i, &format!("t{i}"));
    }

    h.aggregator.mark_seen(&c, 2);
    assert_eq!(h.store.watermark(&c).unwrap(), 2);
    assert_eq!(h.sink.last_upsert().unwrap().lines, vec!["t3", "t4"]);
    assert_eq!(h.store.pending(&c).unwrap().len(), 2);

    // Lower positions never move the watermark back
    h.aggregator.mark_seen(&c, 1);
    assert_eq!(h.store.watermark(&c).unwrap(), 2);

    h.aggregator.mark_seen(&c, 4);
    assert!(h.store.pending(&c).unwrap().is_empty());
    assert_eq!(h.sink.calls().last(), Some(&SinkCall::Cancel(c.clone())));
}

#[tokio::test]
async fn test_sink_failure_does_not_affect_state() {
    let h = worker_harness();
    let c = cid("C1");
    h.sink.set_failing(true);
    assert_eq!(h.aggregator.add(&c, &mid("a"), 1, "a"), AddOutcome::Added);
    assert_eq!(h.store.pending(&c).unwrap().len(), 1);

    h.aggregator.clear(&c);
    h.aggregator.flush().await;
    assert_eq!(h.store.watermark(&c).unwrap(), 1);

    h.sink.set_failing(false);
    assert_eq!(h.aggregator.add(&c, &mid("b"), 2, "b"), AddOutcome::Added);
    assert_eq!(h.sink.last_upsert().unwrap().lines, vec!["b"]);
}

#[tokio::test]
async fn test_store_write_failure_is_swallowed() {
    let h = worker_harness();
    let c = cid("C1");
    h.aggregator.add(&c, &mid("a"), 1, "a");

    h.store.set_fail_writes(true);
    assert_eq!(h.aggregator.add(&c, &mid("b"), 2, "b"), AddOutcome::Failed);
    h.aggregator.set_enabled(false);
    h.aggregator.clear(&c);
    h.aggregator.flush().await;

    // Nothing was written, but the sink still got its cancel requests.
    assert!(h.aggregator.is_enabled());
    assert_eq!(h.store.pending(&c).unwrap().len(), 1);
    assert!(h.sink.calls().contains(&SinkCall::CancelAll));
    assert_eq!(h.sink.calls().last(), Some(&SinkCall::Cancel(c.clone())));

    // The next successful write persists the full state again.
    h.store.set_fail_writes(false);
    h.aggregator.clear(&c);
    h.aggregator.flush().await;
    assert_eq!(h.store.watermark(&c).unwrap(), 1);
    assert!(h.store.pending(&c).unwrap().is_empty());
}

#[tokio::test]
async fn test_clear_is_applied_by_the_worker() {
    let h = worker_harness();
    let c = cid("C1");
    h.aggregator.add(&c, &mid("a"), 3, "a");

    h.aggregator.clear(&c);
    // Nothing runs until the worker gets a turn
    assert_eq!(h.store.pending(&c).unwrap().len(), 1);

    h.aggregator.flush().await;
    assert_eq!(h.store.watermark(&c).unwrap(), 3);
    assert!(h.store.pending(&c).unwrap().is_empty());
}

#[tokio::test]
async fn test_add_after_clear_survives_queued_clear() {
    let h = worker_harness();
    for round in 0..50 {
        let c = cid(&format!("C{round}"));
        assert_eq!(h.aggregator.add(&c, &mid("m1"), 1, "one"), AddOutcome::Added);
        h.aggregator.clear(&c);
        assert_eq!(h.aggregator.add(&c, &mid("m2"), 2, "two"), AddOutcome::Added);
        h.aggregator.flush().await;

        assert_eq!(h.store.watermark(&c).unwrap(), 1);
        let pending = h.store.pending(&c).unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].message_id, mid("m2"));

        let upsert = h.sink.last_upsert().unwrap();
        assert_eq!(upsert.key, c);
        assert_eq!(upsert.lines, vec!["two"]);
        assert_ne!(h.sink.calls().last(), Some(&SinkCall::Cancel(c.clone())));
    }
}

#[tokio::test]
async fn test_clear_with_nothing_pending_spares_later_messages() {
    let h = worker_harness();
    let c = cid("C1");
    h.aggregator.clear(&c);
    assert_eq!(h.aggregator.add(&c, &mid("a"), 1, "a"), AddOutcome::Added);
    h.aggregator.flush().await;

    assert_eq!(h.store.watermark(&c).unwrap(), UNSEEN);
    assert_eq!(h.store.pending(&c).unwrap().len(), 1);
    assert!(matches!(h.sink.calls().last(), Some(SinkCall::Upsert(_))));
}

#[tokio::test]
async fn test_clear_runs_inline_after_close() {
    let h = worker_harness();
    let c = cid("C1");
    h.aggregator.add(&c, &mid("a"), 2, "a");
    h.aggregator.clear(&c);
    h.aggregator.close().await;
    // Closing drains what was queued
    assert_eq!(h.store.watermark(&c).unwrap(), 2);

    h.aggregator.add(&c, &mid("b"), 5, "b");
    h.aggregator.clear(&c);
    assert_eq!(h.store.watermark(&c).unwrap(), 5);
    assert!(h.store.pending(&c).unwrap().is_empty());
}

#[test]
fn test_conversation_named_all_is_not_the_global_switch() {
    let h = harness();
    let all = cid("all");
    h.aggregator.set_enabled(false);
    h.aggregator.set_conversation_enabled(&all, true);
    assert!(!h.aggregator.is_enabled());

    h.aggregator.set_enabled(true);
    h.aggregator.set_conversation_enabled(&all, false);
    assert!(h.aggregator.is_enabled());
    assert!(!h.aggregator.is_conversation_enabled(Some(&all)));
    assert_eq!(h.aggregator.add(&cid("C1"), &mid("a"), 1, "a"), AddOutcome::Added);
}

#[test]
fn test_refresh_deletes_entries_below_watermark() {
    let h = harness();
    let c = cid("C1");
    h.aggregator.add(&c, &mid("old"), 3, "old");
    // Watermark moved without the pending set being rewritten
    h.store.advance_watermark(&c, 4).unwrap();

    assert_eq!(h.aggregator.add(&c, &mid("new"), 6, "new"), AddOutcome::Added);
    assert_eq!(h.sink.last_upsert().unwrap().lines, vec!["new"]);
    let pending = h.store.pending(&c).unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].message_id, mid("new"));
}
