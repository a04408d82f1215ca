// SPDX-License-Identifier: MIT OR Apache-2.0

use firehose::core::event::{Author, Post};
use firehose::core::stream::mapper::StatusMapper;
use firehose::core::stream::mapper::DEFAULT_MAX_FRAME_BYTES;
use firehose::core::stream::output::sink::SinkRecord;
use firehose::core::stream::{ConnectionStatus, LogSink, SourceEvent, SourceId};
use firehose::{FireHoseAggregator, FireHoseConfig, FireHoseError};
use std::sync::Arc;

fn setup(instances: &[&str]) -> (FireHoseAggregator, LogSink) {
    let sink = LogSink::new();
    let config = FireHoseConfig::with_instances(instances.iter().copied());
    let aggregator = FireHoseAggregator::new(config, Arc::new(sink.clone())).unwrap();
    (aggregator, sink)
}

fn post(id: &str, content: &str) -> Post {
    Post::new(
        id,
        content,
        Author {
            display_name: "Alice".to_string(),
            url: "https://a.example/@alice".to_string(),
        },
        "2022-11-05T10:00:00.000Z",
    )
}

fn deliver(aggregator: &mut FireHoseAggregator, source: usize, post: Post) {
    let session_id = aggregator.session().session_id;
    aggregator.handle_event(SourceEvent::Post {
        source: SourceId(source),
        session_id,
        post,
    });
}

fn open(aggregator: &mut FireHoseAggregator, source: usize) {
    aggregator.handle_event(SourceEvent::Status {
        source: SourceId(source),
        status: ConnectionStatus::Open,
    });
}

#[test]
fn test_duplicate_across_sources_matches_once() {
    let (mut aggregator, sink) = setup(&["a.example", "b.example"]);
    open(&mut aggregator, 0);
    open(&mut aggregator, 1);
    assert_eq!(aggregator.stats().connected, 2);

    aggregator.set_query("cats").unwrap();

    deliver(&mut aggregator, 0, post("u1", "I love cats"));
    assert_eq!(sink.matches().len(), 1);
    assert_eq!(sink.matches()[0].id, "u1");
    let stats = aggregator.stats();
    assert_eq!((stats.seen, stats.matched), (1, 1));

    deliver(&mut aggregator, 1, post("u1", "I love cats"));
    assert_eq!(sink.matches().len(), 1);
    let stats = aggregator.stats();
    assert_eq!((stats.seen, stats.matched), (2, 1));
    assert_eq!(stats.connected, 2);
}

#[test]
fn test_empty_pattern_disables_matching() {
    let (mut aggregator, sink) = setup(&["a.example"]);
    aggregator.set_query("cats").unwrap();
    aggregator.set_query("").unwrap();

    assert_eq!(sink.resets(), vec![false, true, false]);
    assert!(!aggregator.is_filter_active());

    deliver(&mut aggregator, 0, post("u1", "cats"));
    deliver(&mut aggregator, 0, post("u2", ""));
    assert!(sink.matches().is_empty());
    assert_eq!(aggregator.stats().matched, 0);
    // Posts still count as seen while filtering is disabled
    assert_eq!(aggregator.stats().seen, 2);

    aggregator.set_query("cats").unwrap();
    deliver(&mut aggregator, 0, post("u1", "cats"));
    assert_eq!(sink.matches().len(), 1);
}

#[test]
fn test_changing_pattern_resets_counters_and_dedup() {
    let (mut aggregator, sink) = setup(&["a.example"]);
    open(&mut aggregator, 0);
    aggregator.set_query("cats").unwrap();

    deliver(&mut aggregator, 0, post("u1", "cats and dogs"));
    deliver(&mut aggregator, 0, post("u2", "only cats"));
    assert_eq!(aggregator.stats().matched, 2);

    aggregator.set_query("dogs").unwrap();
    let stats = aggregator.stats();
    assert_eq!((stats.seen, stats.matched, stats.connected), (0, 0, 1));

    deliver(&mut aggregator, 0, post("u1", "cats and dogs"));
    let stats = aggregator.stats();
    assert_eq!((stats.seen, stats.matched), (1, 1));
    assert_eq!(sink.displayed().len(), 1);
    assert_eq!(sink.displayed()[0].id, "u1");
}

#[test]
fn test_pattern_is_case_insensitive() {
    let (mut aggregator, sink) = setup(&["a.example"]);
    aggregator.set_query("CaTs").unwrap();
    deliver(&mut aggregator, 0, post("u1", "I love CATS"));
    assert_eq!(sink.matches().len(), 1);
}

#[test]
fn test_stale_post_is_dropped() {
    let (mut aggregator, sink) = setup(&["a.example"]);
    aggregator.set_query("cats").unwrap();
    let stale = aggregator.session().session_id;
    aggregator.set_query("cats").unwrap();

    aggregator.handle_event(SourceEvent::Post {
        source: SourceId(0),
        session_id: stale,
        post: post("u1", "cats"),
    });

    assert!(sink.matches().is_empty());
    let stats = aggregator.stats();
    assert_eq!((stats.seen, stats.matched), (0, 0));
}

#[tokio::test]
async fn test_in_flight_post_from_old_session_is_dropped() {
    let (mut aggregator, sink) = setup(&["a.example"]);
    aggregator.set_query("cats").unwrap();

    // Queued under the first session, processed after the query changed
    let tx = aggregator.event_sender();
    tx.send(SourceEvent::Post {
        source: SourceId(0),
        session_id: aggregator.session().session_id,
        post: post("u1", "cats"),
    })
    .await
    .unwrap();

    aggregator.set_query("cats").unwrap();
    assert_eq!(aggregator.drain_pending(), 1);

    assert!(sink.matches().is_empty());
    assert_eq!(aggregator.stats().seen, 0);
}

#[test]
fn test_invalid_pattern_keeps_previous_session() {
    let (mut aggregator, sink) = setup(&["a.example"]);
    aggregator.set_query("cats").unwrap();
    deliver(&mut aggregator, 0, post("u1", "cats"));
    let before = aggregator.session();

    let err = aggregator.set_query("(unclosed").unwrap_err();
    assert!(matches!(err, FireHoseError::InvalidFilter { .. }));

    assert_eq!(aggregator.session(), before);
    assert_eq!(aggregator.stats().matched, 1);
    assert_eq!(sink.resets(), vec![false, true]);

    deliver(&mut aggregator, 0, post("u1", "cats"));
    assert_eq!(sink.matches().len(), 1);
}

#[test]
fn test_connected_count_never_decreases() {
    let (mut aggregator, _) = setup(&["a.example", "b.example", "c.example"]);
    open(&mut aggregator, 0);
    aggregator.handle_event(SourceEvent::Status {
        source: SourceId(1),
        status: ConnectionStatus::Failed,
    });
    open(&mut aggregator, 2);
    aggregator.handle_event(SourceEvent::Status {
        source: SourceId(0),
        status: ConnectionStatus::Failed,
    });
    aggregator.set_query("anything").unwrap();

    assert_eq!(aggregator.stats().connected, 2);
    let states: Vec<ConnectionStatus> = aggregator
        .connection_states()
        .iter()
        .map(|s| s.status)
        .collect();
    assert_eq!(
        states,
        vec![
            ConnectionStatus::Failed,
            ConnectionStatus::Failed,
            ConnectionStatus::Open
        ]
    );
}

#[test]
fn test_matched_never_exceeds_seen() {
    let (mut aggregator, _) = setup(&["a.example", "b.example"]);
    aggregator.set_query("a").unwrap();

    let contents = ["a", "b", "a", "ab", "c", "a"];
    for (i, content) in contents.iter().enumerate() {
        deliver(&mut aggregator, i % 2, post(&format!("u{}", i % 4), content));
        let stats = aggregator.stats();
        assert!(stats.matched <= stats.seen, "{}", stats);
    }
}

#[test]
fn test_delete_frame_does_not_count_as_seen() {
    let (mut aggregator, sink) = setup(&["a.example"]);
    aggregator.set_query("cats").unwrap();

    let mapper = StatusMapper::new(DEFAULT_MAX_FRAME_BYTES);
    let frame = br#"{"event":"delete","payload":"109312345678901234"}"#;
    assert!(mapper.map(frame).unwrap().is_none());

    assert_eq!(aggregator.drain_pending(), 0);
    assert_eq!(aggregator.stats().seen, 0);
    assert!(sink.records().iter().all(|r| !matches!(r, SinkRecord::Match(_))));
}
