//! Concurrency stress tests
//!
//! Many threads call the bridge while another thread fires the readiness
//! signal. Every call must be delivered exactly once, and each thread's events
//! must arrive in the order that thread emitted them. Removals racing the
//! flush must land either in the queue or at the transport.

use std::collections::HashMap;
use std::sync::{Arc, Barrier, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use rnbridge_harness::{init_test_logging, BackendCall, LoopbackBackend};
use rnbridge_runtime::{
    Bridge, BridgeConfig, BridgeEvent, BridgeRequest, EventListenerRef, Identifier,
    RequestHandlerRef, ResponseCallback, ResponseListenerRef, TransportBackend,
};
use serde_json::json;

const PRODUCERS: usize = 8;
const EVENTS_PER_PRODUCER: usize = 250;

// ----------------------------------------------------------------------------
// Test Helpers
// ----------------------------------------------------------------------------

/// Backend that records event payloads and sleeps on every call
#[derive(Default)]
struct SlowBackend {
    events: Mutex<Vec<(u64, u64)>>,
}

impl TransportBackend for SlowBackend {
    fn send_event(&self, event: BridgeEvent) {
        let data = event.data.unwrap_or_default();
        let producer = data["producer"].as_u64().unwrap_or(u64::MAX);
        let seq = data["seq"].as_u64().unwrap_or(u64::MAX);
        thread::sleep(Duration::from_micros(20));
        self.events.lock().unwrap().push((producer, seq));
    }
    fn send_request(&self, _request: BridgeRequest, _listener: ResponseListenerRef) {}
    fn register_request_handler(&self, _: &str, _: RequestHandlerRef, _: Identifier) {}
    fn add_event_listener(&self, _: &str, _: EventListenerRef, _: Identifier) {}
    fn remove_event_listener(&self, _id: Identifier) -> Option<EventListenerRef> {
        None
    }
    fn unregister_request_handler(&self, _id: Identifier) -> Option<RequestHandlerRef> {
        None
    }
    fn is_registered(&self, _id: Identifier) -> bool {
        false
    }
}

fn quiet_bridge() -> Bridge {
    Bridge::new(BridgeConfig::quiet())
}

// ----------------------------------------------------------------------------
// Stress Tests
// ----------------------------------------------------------------------------

#[test]
fn test_concurrent_emitters_during_ready_transition() {
    init_test_logging();
    let bridge = quiet_bridge();
    let backend = Arc::new(SlowBackend::default());
    let barrier = Arc::new(Barrier::new(PRODUCERS + 1));

    let mut producers = Vec::new();
    for producer in 0..PRODUCERS {
        let bridge = bridge.clone();
        let barrier = barrier.clone();
        producers.push(thread::spawn(move || {
            barrier.wait();
            for seq in 0..EVENTS_PER_PRODUCER {
                bridge.emit_event(
                    BridgeEvent::new("tick").with_data(json!({"producer": producer, "seq": seq})),
                );
            }
        }));
    }

    barrier.wait();
    thread::sleep(Duration::from_millis(1));
    bridge.open(backend.clone()).expect("Flush failed");

    for handle in producers {
        handle.join().expect("Producer panicked");
    }

    let events = backend.events.lock().unwrap().clone();
    assert_eq!(events.len(), PRODUCERS * EVENTS_PER_PRODUCER);

    let mut per_producer: HashMap<u64, Vec<u64>> = HashMap::new();
    for (producer, seq) in events {
        per_producer.entry(producer).or_default().push(seq);
    }
    assert_eq!(per_producer.len(), PRODUCERS);
    for (producer, seqs) in per_producer {
        let expected: Vec<u64> = (0..EVENTS_PER_PRODUCER as u64).collect();
        assert_eq!(seqs, expected, "producer {} out of order", producer);
    }
    assert_eq!(bridge.pending().total(), 0);
}

#[test]
fn test_concurrent_registrations_all_delivered() {
    init_test_logging();
    let bridge = quiet_bridge();
    let backend = Arc::new(LoopbackBackend::new());
    let barrier = Arc::new(Barrier::new(PRODUCERS + 1));

    let mut workers = Vec::new();
    for worker in 0..PRODUCERS {
        let bridge = bridge.clone();
        let barrier = barrier.clone();
        workers.push(thread::spawn(move || {
            barrier.wait();
            (0..50)
                .map(|n| {
                    bridge
                        .add_event_listener(
                            &format!("worker{}.{}", worker, n),
                            Arc::new(|_: &BridgeEvent| {}),
                        )
                        .expect("Valid listener name")
                })
                .collect::<Vec<_>>()
        }));
    }

    barrier.wait();
    bridge.open(backend.clone()).expect("Flush failed");

    let mut ids = Vec::new();
    for handle in workers {
        ids.extend(handle.join().expect("Worker panicked"));
    }

    let added: Vec<Identifier> = backend
        .calls()
        .into_iter()
        .filter_map(|call| match call {
            BackendCall::AddListener { id, .. } => Some(id),
            _ => None,
        })
        .collect();
    assert_eq!(added.len(), ids.len());
    for id in ids {
        assert_eq!(added.iter().filter(|a| **a == id).count(), 1);
    }
}

#[test]
fn test_competing_ready_signals_flush_once() {
    init_test_logging();
    let bridge = quiet_bridge();
    for seq in 0..100 {
        bridge.emit_event(BridgeEvent::new("tick").with_data(json!({"producer": 0, "seq": seq})));
    }

    let backend = Arc::new(SlowBackend::default());
    let openers: Vec<_> = (0..4)
        .map(|_| {
            let bridge = bridge.clone();
            let backend = backend.clone();
            thread::spawn(move || bridge.open(backend).is_ok())
        })
        .collect();

    let successes = openers
        .into_iter()
        .map(|handle| handle.join().expect("Opener panicked"))
        .filter(|ok| *ok)
        .count();

    assert_eq!(successes, 1);
    assert_eq!(backend.events.lock().unwrap().len(), 100);
}

#[test]
fn test_removals_racing_the_flush() {
    init_test_logging();
    for _ in 0..20 {
        let bridge = quiet_bridge();
        let backend = Arc::new(LoopbackBackend::new());

        let listener_ids: Vec<Identifier> = (0..200)
            .map(|n| {
                bridge
                    .add_event_listener(&format!("event{}", n % 7), Arc::new(|_: &BridgeEvent| {}))
                    .expect("Valid listener name")
            })
            .collect();
        let handler_ids: Vec<Identifier> = (0..50)
            .map(|n| {
                bridge
                    .register_request_handler(
                        &format!("request{}", n),
                        Arc::new(|_: BridgeRequest, _: ResponseListenerRef| {}),
                    )
                    .expect("Valid handler name")
            })
            .collect();

        let barrier = Arc::new(Barrier::new(2));
        let remover = {
            let bridge = bridge.clone();
            let barrier = barrier.clone();
            let listener_ids = listener_ids.clone();
            let handler_ids = handler_ids.clone();
            thread::spawn(move || {
                barrier.wait();
                let listeners_removed = listener_ids
                    .into_iter()
                    .filter(|id| bridge.remove_event_listener(*id).is_some())
                    .count();
                let handlers_removed = handler_ids
                    .into_iter()
                    .filter(|id| bridge.unregister_request_handler(*id).is_some())
                    .count();
                (listeners_removed, handlers_removed)
            })
        };

        barrier.wait();
        bridge.open(backend.clone()).expect("Flush failed");
        let (listeners_removed, handlers_removed) = remover.join().expect("Remover panicked");

        // Each removal hits either the queue or the backend, never neither
        assert_eq!(listeners_removed, listener_ids.len());
        assert_eq!(handlers_removed, handler_ids.len());

        let calls = backend.calls();
        for id in listener_ids.iter().chain(handler_ids.iter()) {
            let registrations = calls
                .iter()
                .filter(|call| match call {
                    BackendCall::AddListener { id: added, .. } => added == id,
                    BackendCall::RegisterHandler { id: added, .. } => added == id,
                    _ => false,
                })
                .count();
            assert!(registrations <= 1, "{} registered more than once", id);
            assert!(!bridge.is_registered(*id));
        }
        let listeners_left: usize = (0..7)
            .map(|n| backend.listener_count(&format!("event{}", n)))
            .sum();
        assert_eq!(listeners_left, 0);
        assert_eq!(backend.handler_count(), 0);
        assert_eq!(bridge.pending().total(), 0);
    }
}

#[test]
fn test_large_backlog_queues_without_rescanning() {
    init_test_logging();
    const BACKLOG: usize = 50_000;
    let bridge = quiet_bridge();

    let started = Instant::now();
    for n in 0..BACKLOG {
        bridge
            .add_event_listener(&format!("event{}", n), Arc::new(|_: &BridgeEvent| {}))
            .expect("Valid listener name");
        bridge
            .send_request(
                BridgeRequest::new(format!("request{}", n)),
                Some(ResponseCallback::shared(|_| {})),
            )
            .expect("Valid request");
    }
    let queued = started.elapsed();

    let pending = bridge.pending();
    assert_eq!(pending.listeners, BACKLOG);
    assert_eq!(pending.requests, BACKLOG);
    assert!(
        queued < Duration::from_secs(10),
        "queuing {} entries took {:?}",
        2 * BACKLOG,
        queued
    );

    let backend = Arc::new(LoopbackBackend::new());
    let report = bridge.open(backend.clone()).expect("Flush failed");
    assert_eq!(report.total(), 2 * BACKLOG);
    assert_eq!(backend.calls().len(), 2 * BACKLOG);
}
