// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Integration tests for buttons, session sharing and serialized dispatch,
//! driven through an in-memory capture backend.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use dash_button::capture::{CaptureFactory, CaptureSession, FixedInterface, Packet, PacketSink};
use dash_button::dispatch::DispatchOutcome;
use dash_button::{
    CaptureError, DashButton, Error, HubEvent, InterfaceName, MacAddress, SessionPool,
};
use parking_lot::Mutex;
use tokio::sync::oneshot;

const MAC_ADDRESS: MacAddress = MacAddress::new([0x00, 0x11, 0x22, 0x33, 0x44, 0x55]);
const OTHER_MAC_ADDRESS: MacAddress = MacAddress::new([0x66, 0x77, 0x88, 0x99, 0xaa, 0xbb]);
const NETWORK_INTERFACE: &str = "en0";

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn interface(name: &str) -> InterfaceName {
    InterfaceName::new(name).unwrap()
}

#[derive(Default)]
struct MockState {
    created: AtomicU32,
    closed: AtomicU32,
    fail: AtomicBool,
    sinks: Mutex<Vec<(InterfaceName, PacketSink)>>,
}

/// In-memory capture backend that records session activity.
#[derive(Clone, Default)]
struct MockCapture {
    state: Arc<MockState>,
}

struct MockSession {
    state: Arc<MockState>,
}

impl CaptureSession for MockSession {
    fn close(&mut self) {
        self.state.closed.fetch_add(1, Ordering::SeqCst);
    }
}

impl CaptureFactory for MockCapture {
    fn create_session(
        &self,
        interface: &InterfaceName,
        sink: PacketSink,
    ) -> Result<Box<dyn CaptureSession>, CaptureError> {
        if self.state.fail.load(Ordering::SeqCst) {
            return Err(CaptureError::OpenFailed {
                interface: interface.to_string(),
                reason: "mock failure".to_string(),
            });
        }
        self.state.created.fetch_add(1, Ordering::SeqCst);
        self.state.sinks.lock().push((interface.clone(), sink));
        Ok(Box::new(MockSession {
            state: Arc::clone(&self.state),
        }))
    }
}

impl MockCapture {
    fn created(&self) -> u32 {
        self.state.created.load(Ordering::SeqCst)
    }

    fn closed(&self) -> u32 {
        self.state.closed.load(Ordering::SeqCst)
    }

    fn fail_next(&self, fail: bool) {
        self.state.fail.store(fail, Ordering::SeqCst);
    }

    /// The sink of the most recent session on `name`.
    fn sink(&self, name: &str) -> PacketSink {
        self.state
            .sinks
            .lock()
            .iter()
            .rev()
            .find(|(iface, _)| iface.as_str() == name)
            .map(|(_, sink)| sink.clone())
            .expect("no session was created on this interface")
    }

    fn emit(&self, mac: MacAddress) -> DispatchOutcome {
        self.sink(NETWORK_INTERFACE).deliver(Packet::from_source(mac))
    }

    async fn settled(&self) {
        self.sink(NETWORK_INTERFACE).settled().await;
    }
}

fn setup() -> (SessionPool, MockCapture) {
    init_tracing();
    let capture = MockCapture::default();
    let pool = SessionPool::builder(capture.clone())
        .discovery(FixedInterface::new(interface(NETWORK_INTERFACE)))
        .build()
        .unwrap();
    (pool, capture)
}

fn counter() -> Arc<AtomicU32> {
    Arc::new(AtomicU32::new(0))
}

fn count(c: &Arc<AtomicU32>) -> u32 {
    c.load(Ordering::SeqCst)
}

// ============================================================================
// Session sharing
// ============================================================================

mod session_sharing {
    use super::*;

    #[tokio::test]
    async fn creates_session_the_first_time_a_listener_is_added() {
        let (pool, capture) = setup();

        let button = DashButton::new(MAC_ADDRESS, &pool);
        assert_eq!(capture.created(), 0);

        let _sub = button.add_callback(|_| {}).unwrap();
        assert_eq!(capture.created(), 1);
    }

    #[tokio::test]
    async fn shares_sessions_amongst_buttons() {
        let (pool, capture) = setup();

        let button1 = DashButton::new(MAC_ADDRESS, &pool);
        let _sub1 = button1.add_callback(|_| {}).unwrap();
        let button2 = DashButton::new(OTHER_MAC_ADDRESS, &pool);
        let _sub2 = button2.add_callback(|_| {}).unwrap();

        assert_eq!(capture.created(), 1);
        assert_eq!(pool.ref_count(&interface(NETWORK_INTERFACE)), 2);
    }

    #[tokio::test]
    async fn many_buttons_open_one_session() {
        let (pool, capture) = setup();

        let subs: Vec<_> = (0..10u8)
            .map(|i| {
                let button = pool.button(MacAddress::new([0, 0, 0, 0, 0, i]));
                button.add_callback(|_| {}).unwrap()
            })
            .collect();

        assert_eq!(capture.created(), 1);
        for sub in &subs {
            sub.remove();
        }
        assert_eq!(capture.closed(), 1);
    }

    #[tokio::test]
    async fn removes_route_when_a_button_has_no_more_listeners() {
        let (pool, capture) = setup();

        let button = DashButton::new(MAC_ADDRESS, &pool);
        let subscription1 = button.add_callback(|_| {}).unwrap();
        let subscription2 = button.add_callback(|_| {}).unwrap();

        let session = pool.session(&interface(NETWORK_INTERFACE)).unwrap();
        assert_eq!(session.dispatcher().route_count(), 1);

        subscription1.remove();
        assert_eq!(session.dispatcher().route_count(), 1);
        subscription2.remove();
        assert_eq!(session.dispatcher().route_count(), 0);
        assert!(!capture.sink(NETWORK_INTERFACE).is_open());
    }

    #[tokio::test]
    async fn removing_a_subscription_twice_is_harmless() {
        let (pool, capture) = setup();

        let button = DashButton::new(MAC_ADDRESS, &pool);
        let subscription = button.add_callback(|_| {}).unwrap();

        subscription.remove();
        assert!(subscription.is_removed());
        assert_eq!(capture.closed(), 1);

        subscription.remove();
        assert_eq!(capture.closed(), 1);
        assert_eq!(pool.session_count(), 0);
    }

    #[tokio::test]
    async fn closes_session_when_no_more_buttons_are_listening() {
        let (pool, capture) = setup();

        let button1 = DashButton::new(MAC_ADDRESS, &pool);
        let subscription1 = button1.add_callback(|_| {}).unwrap();
        let button2 = DashButton::new(OTHER_MAC_ADDRESS, &pool);
        let subscription2 = button2.add_callback(|_| {}).unwrap();

        subscription1.remove();
        assert_eq!(capture.closed(), 0);
        subscription2.remove();
        assert_eq!(capture.closed(), 1);
    }

    #[tokio::test]
    async fn stale_subscription_does_not_close_a_new_session() {
        let (pool, capture) = setup();
        let button = DashButton::new(MAC_ADDRESS, &pool);

        let old = button.add_callback(|_| {}).unwrap();
        old.remove();
        let _new = button.add_callback(|_| {}).unwrap();
        assert_eq!(capture.created(), 2);

        old.remove();
        assert_eq!(capture.closed(), 1);
        assert!(button.is_attached());
    }

    #[tokio::test]
    async fn session_creation_failure_reaches_the_caller() {
        let (pool, capture) = setup();
        capture.fail_next(true);

        let button = DashButton::new(MAC_ADDRESS, &pool);
        let err = button.add_callback(|_| {}).unwrap_err();
        assert!(matches!(
            err,
            Error::Capture(CaptureError::OpenFailed { .. })
        ));
        assert_eq!(pool.ref_count(&interface(NETWORK_INTERFACE)), 0);
        assert_eq!(button.listener_count(), 0);

        capture.fail_next(false);
        let _sub = button.add_callback(|_| {}).unwrap();
        assert_eq!(capture.created(), 1);
        assert_eq!(pool.ref_count(&interface(NETWORK_INTERFACE)), 1);
    }

    #[tokio::test]
    async fn lifecycle_is_observable_on_the_event_bus() {
        let (pool, _capture) = setup();
        let mut events = pool.events().subscribe();

        let sub = DashButton::new(MAC_ADDRESS, &pool)
            .add_callback(|_| {})
            .unwrap();
        sub.remove();

        assert!(matches!(
            events.recv().await.unwrap(),
            HubEvent::SessionOpened { .. }
        ));
        assert!(matches!(
            events.recv().await.unwrap(),
            HubEvent::SessionClosed { .. }
        ));
    }
}

// ============================================================================
// Dispatch
// ============================================================================

mod dispatch {
    use super::*;

    #[tokio::test]
    async fn notifies_the_appropriate_listeners_for_each_packet() {
        let (pool, capture) = setup();
        let button1_calls = counter();
        let button2_calls = counter();

        let button1 = DashButton::new(MAC_ADDRESS, &pool);
        let c1 = button1_calls.clone();
        let _sub1 = button1
            .add_callback(move |press| {
                assert_eq!(press.mac(), MAC_ADDRESS);
                c1.fetch_add(1, Ordering::SeqCst);
            })
            .unwrap();
        let button2 = DashButton::new(OTHER_MAC_ADDRESS, &pool);
        let c2 = button2_calls.clone();
        let _sub2 = button2
            .add_callback(move |_| {
                c2.fetch_add(1, Ordering::SeqCst);
            })
            .unwrap();

        assert_eq!(
            capture.emit(MAC_ADDRESS),
            DispatchOutcome::Dispatched { listeners: 1 }
        );
        assert_eq!(count(&button1_calls), 1);
        assert_eq!(count(&button2_calls), 0);
    }

    #[tokio::test]
    async fn waits_for_listeners_of_a_prior_packet_before_handling_new_ones() {
        let (pool, capture) = setup();
        let calls = counter();

        let button = DashButton::new(MAC_ADDRESS, &pool);
        let c = calls.clone();
        let _sub = button
            .add_callback(move |_| {
                c.fetch_add(1, Ordering::SeqCst);
            })
            .unwrap();

        capture.emit(MAC_ADDRESS);
        assert_eq!(count(&calls), 1);
        assert_eq!(capture.emit(MAC_ADDRESS), DispatchOutcome::Dropped);
        assert_eq!(count(&calls), 1);

        capture.settled().await;
        capture.emit(MAC_ADDRESS);
        assert_eq!(count(&calls), 2);
    }

    #[tokio::test]
    async fn drops_packets_while_an_async_listener_is_pending() {
        let (pool, capture) = setup();
        let calls = counter();
        let (release_tx, release_rx) = oneshot::channel::<()>();
        let release_rx = Arc::new(Mutex::new(Some(release_rx)));

        let button = DashButton::new(MAC_ADDRESS, &pool);
        let c = calls.clone();
        let _sub = button
            .add_listener(move |_| {
                c.fetch_add(1, Ordering::SeqCst);
                let gate = release_rx.lock().take();
                async move {
                    if let Some(gate) = gate {
                        let _ = gate.await;
                    }
                    Ok::<_, std::convert::Infallible>(())
                }
            })
            .unwrap();

        assert!(matches!(
            capture.emit(MAC_ADDRESS),
            DispatchOutcome::Dispatched { .. }
        ));
        tokio::task::yield_now().await;
        assert_eq!(capture.emit(MAC_ADDRESS), DispatchOutcome::Dropped);
        assert_eq!(count(&calls), 1);

        release_tx.send(()).unwrap();
        capture.settled().await;

        assert!(matches!(
            capture.emit(MAC_ADDRESS),
            DispatchOutcome::Dispatched { .. }
        ));
        assert_eq!(count(&calls), 2);
    }

    #[tokio::test]
    async fn waits_for_all_listeners_even_if_some_failed() {
        let (pool, capture) = setup();
        let mut events = pool.events().subscribe();
        let error_count = counter();

        let button = DashButton::new(MAC_ADDRESS, &pool);

        let e = error_count.clone();
        let _sync_failure = button
            .add_callback(move |_| {
                e.fetch_add(1, Ordering::SeqCst);
                panic!("Intentional sync error");
            })
            .unwrap();

        let e = error_count.clone();
        let _async_failure = button
            .add_listener(move |_| {
                e.fetch_add(1, Ordering::SeqCst);
                async { Err::<(), _>("Intentional async error") }
            })
            .unwrap();

        let (result_tx, result_rx) = oneshot::channel::<&'static str>();
        let result_tx = Arc::new(Mutex::new(Some(result_tx)));
        let e = error_count.clone();
        let _success = button
            .add_listener(move |_| {
                let e = e.clone();
                let result_tx = result_tx.lock().take();
                async move {
                    tokio::task::yield_now().await;
                    assert_eq!(e.load(Ordering::SeqCst), 2);
                    tokio::task::yield_now().await;
                    if let Some(tx) = result_tx {
                        let _ = tx.send("success");
                    }
                    Ok::<_, std::convert::Infallible>(())
                }
            })
            .unwrap();

        assert_eq!(
            capture.emit(MAC_ADDRESS),
            DispatchOutcome::Dispatched { listeners: 3 }
        );
        assert_eq!(result_rx.await.unwrap(), "success");
        capture.settled().await;

        let mut failures = Vec::new();
        loop {
            match events.recv().await.unwrap() {
                HubEvent::ListenerFailed { error, .. } => failures.push(error),
                HubEvent::BatchSettled {
                    listeners,
                    failures: failed,
                    ..
                } => {
                    assert_eq!(listeners, 3);
                    assert_eq!(failed, 2);
                    break;
                }
                _ => {}
            }
        }
        assert_eq!(failures.len(), 2);
        assert!(failures[0].contains("Intentional sync error"));
        assert!(failures[1].contains("Intentional async error"));

        // The failures did not wedge the dispatcher
        assert!(matches!(
            capture.emit(MAC_ADDRESS),
            DispatchOutcome::Dispatched { .. }
        ));
    }

    #[tokio::test]
    async fn starts_all_listeners_before_awaiting_any() {
        let (pool, capture) = setup();
        let calls = counter();

        let button = DashButton::new(MAC_ADDRESS, &pool);
        for _ in 0..2 {
            let c = calls.clone();
            let _sub = button
                .add_listener(move |_| {
                    c.fetch_add(1, Ordering::SeqCst);
                    async {
                        tokio::task::yield_now().await;
                        Ok::<_, std::convert::Infallible>(())
                    }
                })
                .unwrap();
        }

        assert_eq!(count(&calls), 0);
        capture.emit(MAC_ADDRESS);
        assert_eq!(count(&calls), 2);
    }

    #[tokio::test]
    async fn runs_async_listeners_concurrently() {
        let (pool, capture) = setup();
        let calls = counter();
        let observed = Arc::new(Mutex::new(Vec::new()));

        let button = DashButton::new(MAC_ADDRESS, &pool);
        for _ in 0..2 {
            let calls = calls.clone();
            let observed = observed.clone();
            let _sub = button
                .add_listener(move |_| {
                    let calls = calls.clone();
                    let observed = observed.clone();
                    async move {
                        calls.fetch_add(1, Ordering::SeqCst);
                        tokio::task::yield_now().await;
                        observed.lock().push(calls.load(Ordering::SeqCst));
                        Ok::<_, std::convert::Infallible>(())
                    }
                })
                .unwrap();
        }

        capture.emit(MAC_ADDRESS);
        capture.settled().await;

        assert_eq!(*observed.lock(), vec![2, 2]);
    }

    #[tokio::test]
    async fn same_callback_registered_twice_runs_twice() {
        let (pool, capture) = setup();
        let calls = counter();
        let c = calls.clone();
        let callback = Arc::new(move |_: dash_button::ButtonPress| {
            c.fetch_add(1, Ordering::SeqCst);
        });

        let button = DashButton::new(MAC_ADDRESS, &pool);
        let cb = callback.clone();
        let first = button.add_callback(move |press| cb(press)).unwrap();
        let cb = callback.clone();
        let _second = button.add_callback(move |press| cb(press)).unwrap();

        capture.emit(MAC_ADDRESS);
        assert_eq!(count(&calls), 2);
        capture.settled().await;

        first.remove();
        capture.emit(MAC_ADDRESS);
        assert_eq!(count(&calls), 3);
    }

    #[tokio::test]
    async fn listeners_added_during_a_batch_wait_for_the_next_one() {
        let (pool, capture) = setup();
        let late_calls = counter();
        let late_subs = Arc::new(Mutex::new(Vec::new()));

        let button = DashButton::new(MAC_ADDRESS, &pool);
        let b = button.clone();
        let lc = late_calls.clone();
        let subs = late_subs.clone();
        let _sub = button
            .add_callback(move |_| {
                if subs.lock().is_empty() {
                    let lc = lc.clone();
                    let sub = b
                        .add_callback(move |_| {
                            lc.fetch_add(1, Ordering::SeqCst);
                        })
                        .unwrap();
                    subs.lock().push(sub);
                }
            })
            .unwrap();

        capture.emit(MAC_ADDRESS);
        assert_eq!(count(&late_calls), 0);
        assert_eq!(button.listener_count(), 2);

        capture.settled().await;
        capture.emit(MAC_ADDRESS);
        assert_eq!(count(&late_calls), 1);
    }

    #[tokio::test]
    async fn removal_does_not_cancel_an_invocation_in_flight() {
        let (pool, capture) = setup();
        let finished = counter();
        let (release_tx, release_rx) = oneshot::channel::<()>();
        let release_rx = Arc::new(Mutex::new(Some(release_rx)));

        let button = DashButton::new(MAC_ADDRESS, &pool);
        let f = finished.clone();
        let sub = button
            .add_listener(move |_| {
                let f = f.clone();
                let gate = release_rx.lock().take();
                async move {
                    if let Some(gate) = gate {
                        let _ = gate.await;
                    }
                    f.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, std::convert::Infallible>(())
                }
            })
            .unwrap();

        let sink = capture.sink(NETWORK_INTERFACE);
        sink.deliver(Packet::from_source(MAC_ADDRESS));
        sub.remove();
        assert!(!sink.is_open());
        assert_eq!(sink.deliver(Packet::from_source(MAC_ADDRESS)), DispatchOutcome::Closed);

        release_tx.send(()).unwrap();
        for _ in 0..10 {
            if count(&finished) == 1 {
                break;
            }
            tokio::task::yield_now().await;
        }
        assert_eq!(count(&finished), 1);
    }

    #[tokio::test]
    async fn unattributed_packets_invoke_nobody() {
        let (pool, capture) = setup();
        let calls = counter();
        let c = calls.clone();
        let _sub = DashButton::new(MAC_ADDRESS, &pool)
            .add_callback(move |_| {
                c.fetch_add(1, Ordering::SeqCst);
            })
            .unwrap();

        let sink = capture.sink(NETWORK_INTERFACE);
        assert_eq!(sink.deliver(Packet::unattributed()), DispatchOutcome::Unmatched);
        assert_eq!(capture.emit(OTHER_MAC_ADDRESS), DispatchOutcome::Unmatched);
        assert_eq!(count(&calls), 0);

        // Empty batches leave the dispatcher idle
        assert!(matches!(
            capture.emit(MAC_ADDRESS),
            DispatchOutcome::Dispatched { .. }
        ));
    }

    #[tokio::test]
    async fn interfaces_are_serialized_independently() {
        let (pool, capture) = setup();
        let (release_tx, release_rx) = oneshot::channel::<()>();
        let release_rx = Arc::new(Mutex::new(Some(release_rx)));
        let other_calls = counter();

        let slow = DashButton::new(MAC_ADDRESS, &pool);
        let _slow_sub = slow
            .add_listener(move |_| {
                let gate = release_rx.lock().take();
                async move {
                    if let Some(gate) = gate {
                        let _ = gate.await;
                    }
                    Ok::<_, std::convert::Infallible>(())
                }
            })
            .unwrap();

        let fast = DashButton::on_interface(OTHER_MAC_ADDRESS, interface("eth1"), &pool);
        let c = other_calls.clone();
        let _fast_sub = fast
            .add_callback(move |_| {
                c.fetch_add(1, Ordering::SeqCst);
            })
            .unwrap();
        assert_eq!(capture.created(), 2);

        capture.emit(MAC_ADDRESS);
        assert_eq!(capture.emit(MAC_ADDRESS), DispatchOutcome::Dropped);

        let eth1 = capture.sink("eth1");
        assert!(matches!(
            eth1.deliver(Packet::from_source(OTHER_MAC_ADDRESS)),
            DispatchOutcome::Dispatched { .. }
        ));
        assert_eq!(count(&other_calls), 1);

        release_tx.send(()).unwrap();
        capture.settled().await;
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn packets_from_a_backend_thread_reach_listeners() {
        let (pool, capture) = setup();
        let (press_tx, mut press_rx) = tokio::sync::mpsc::unbounded_channel();

        let _sub = DashButton::new(MAC_ADDRESS, &pool)
            .add_callback(move |press| {
                let _ = press_tx.send(press.mac());
            })
            .unwrap();

        let sink = capture.sink(NETWORK_INTERFACE);
        let outcome = std::thread::spawn(move || sink.deliver(Packet::from_source(MAC_ADDRESS)))
            .join()
            .unwrap();

        assert!(matches!(outcome, DispatchOutcome::Dispatched { .. }));
        assert_eq!(press_rx.recv().await, Some(MAC_ADDRESS));
    }
}
