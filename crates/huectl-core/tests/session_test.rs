#![allow(clippy::unwrap_used)]
// Behavioral tests for `BridgeSession` against a scripted in-memory bridge
// and a manual clock.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use huectl_api::Error as ApiError;
use huectl_api::models::{
    ApiGroup, ApiGroupState, ApiLight, ApiLightState, BridgeConfig, GroupsResponse,
    LightsResponse, StateUpdate,
};
use huectl_core::{
    BridgeApi, BridgeCredential, BridgeSession, Connection, ConnectionState, Connector,
    CoreError, EffectSequencer, ManualClock, ResourceKind, SessionConfig, StateChange,
};

const TOKEN: &str = "Zb3xk1-9PqLmN0aTfY7cVw2HdEoR5sUi";

// ── Fake bridge ─────────────────────────────────────────────────────

struct FakeBridge {
    clock: Arc<ManualClock>,
    lights: Mutex<LightsResponse>,
    groups: Mutex<GroupsResponse>,
    read_failures: Mutex<VecDeque<ApiError>>,
    write_failures: Mutex<VecDeque<ApiError>>,
    light_fetches: Mutex<Vec<Duration>>,
    group_fetches: AtomicUsize,
    writes: Mutex<Vec<(String, StateUpdate)>>,
}

impl FakeBridge {
    fn new(clock: Arc<ManualClock>) -> Arc<Self> {
        let lights = HashMap::from([
            ("1".to_owned(), api_light("Sofa", true)),
            ("2".to_owned(), api_light("Window", true)),
            ("3".to_owned(), api_light("Hall", false)),
        ]);
        let groups = HashMap::from([
            ("1".to_owned(), api_group("Living room", &["1", "2"])),
            ("2".to_owned(), api_group("Hallway", &["3"])),
        ]);
        Arc::new(Self {
            clock,
            lights: Mutex::new(lights),
            groups: Mutex::new(groups),
            read_failures: Mutex::new(VecDeque::new()),
            write_failures: Mutex::new(VecDeque::new()),
            light_fetches: Mutex::new(Vec::new()),
            group_fetches: AtomicUsize::new(0),
            writes: Mutex::new(Vec::new()),
        })
    }

    /// Change state behind the session's back.
    fn set_on(&self, id: &str, on: bool) {
        self.lights.lock().unwrap().get_mut(id).unwrap().state.on = on;
    }

    fn fail_reads(&self, errors: impl IntoIterator<Item = ApiError>) {
        self.read_failures.lock().unwrap().extend(errors);
    }

    fn fail_next_write(&self, error: ApiError) {
        self.write_failures.lock().unwrap().push_back(error);
    }

    fn light_fetches(&self) -> Vec<Duration> {
        self.light_fetches.lock().unwrap().clone()
    }

    fn write_count(&self) -> usize {
        self.writes.lock().unwrap().len()
    }
}

#[async_trait]
impl BridgeApi for FakeBridge {
    async fn lights(&self) -> Result<LightsResponse, ApiError> {
        self.light_fetches.lock().unwrap().push(self.clock.elapsed());
        if let Some(err) = self.read_failures.lock().unwrap().pop_front() {
            return Err(err);
        }
        Ok(self.lights.lock().unwrap().clone())
    }

    async fn groups(&self) -> Result<GroupsResponse, ApiError> {
        self.group_fetches.fetch_add(1, Ordering::SeqCst);
        Ok(self.groups.lock().unwrap().clone())
    }

    async fn set_light_state(&self, id: &str, update: &StateUpdate) -> Result<(), ApiError> {
        self.writes
            .lock()
            .unwrap()
            .push((id.to_owned(), update.clone()));
        if let Some(err) = self.write_failures.lock().unwrap().pop_front() {
            return Err(err);
        }
        let mut lights = self.lights.lock().unwrap();
        let Some(light) = lights.get_mut(id) else {
            return Err(ApiError::NotFound {
                resource: format!("/lights/{id}"),
            });
        };
        if let Some(on) = update.on {
            light.state.on = on;
        }
        if let Some(bri) = update.bri {
            light.state.bri = Some(bri);
        }
        Ok(())
    }

    async fn set_group_action(&self, id: &str, update: &StateUpdate) -> Result<(), ApiError> {
        self.writes
            .lock()
            .unwrap()
            .push((format!("group:{id}"), update.clone()));
        if !self.groups.lock().unwrap().contains_key(id) {
            return Err(ApiError::NotFound {
                resource: format!("/groups/{id}"),
            });
        }
        Ok(())
    }
}

struct FakeConnector {
    bridge: Arc<FakeBridge>,
    handshakes: AtomicUsize,
    delay: Duration,
    reject: bool,
}

impl FakeConnector {
    fn new(bridge: Arc<FakeBridge>) -> Arc<Self> {
        Arc::new(Self {
            bridge,
            handshakes: AtomicUsize::new(0),
            delay: Duration::ZERO,
            reject: false,
        })
    }

    fn slow(bridge: Arc<FakeBridge>, reject: bool) -> Arc<Self> {
        Arc::new(Self {
            bridge,
            handshakes: AtomicUsize::new(0),
            delay: Duration::from_millis(50),
            reject,
        })
    }

    fn handshakes(&self) -> usize {
        self.handshakes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Connector for FakeConnector {
    async fn connect(&self, _credential: &BridgeCredential) -> Result<Connection, ApiError> {
        self.handshakes.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if self.reject {
            return Err(ApiError::Unauthorized {
                description: "unauthorized user".into(),
            });
        }
        Ok(Connection {
            api: Arc::clone(&self.bridge) as Arc<dyn BridgeApi>,
            config: bridge_config(),
        })
    }
}

// ── Helpers ─────────────────────────────────────────────────────────

fn api_light(name: &str, on: bool) -> ApiLight {
    ApiLight {
        name: name.into(),
        light_type: "Extended color light".into(),
        modelid: Some("LCT015".into()),
        uniqueid: None,
        state: ApiLightState {
            on,
            bri: Some(200),
            xy: Some([0.45, 0.41]),
            ct: None,
            colormode: Some("xy".into()),
            reachable: true,
        },
    }
}

fn api_group(name: &str, lights: &[&str]) -> ApiGroup {
    ApiGroup {
        name: name.into(),
        lights: lights.iter().map(|s| (*s).to_owned()).collect(),
        group_type: "Room".into(),
        class: None,
        state: ApiGroupState {
            all_on: false,
            any_on: true,
        },
        action: ApiLightState::default(),
    }
}

fn bridge_config() -> BridgeConfig {
    BridgeConfig {
        name: "Hue Bridge".into(),
        bridgeid: "001788FFFE23BB1A".into(),
        modelid: "BSB002".into(),
        apiversion: "1.65.0".into(),
        swversion: "1965111030".into(),
        whitelist: Some(json!({})),
    }
}

fn credential() -> BridgeCredential {
    BridgeCredential::parse("192.168.1.20", TOKEN).unwrap()
}

fn timeout() -> ApiError {
    ApiError::Timeout { timeout_secs: 5 }
}

fn secs(s: f64) -> Duration {
    Duration::from_secs_f64(s)
}

struct Harness {
    clock: Arc<ManualClock>,
    bridge: Arc<FakeBridge>,
    connector: Arc<FakeConnector>,
    session: BridgeSession,
}

fn harness_with(config: SessionConfig) -> Harness {
    let clock = Arc::new(ManualClock::new());
    let bridge = FakeBridge::new(Arc::clone(&clock));
    let connector = FakeConnector::new(Arc::clone(&bridge));
    let session = BridgeSession::with_parts(config, connector.clone(), clock.clone());
    Harness {
        clock,
        bridge,
        connector,
        session,
    }
}

async fn connected() -> Harness {
    let h = harness_with(SessionConfig::default());
    h.session.connect(&credential()).await.unwrap();
    h
}

// ── Connection tests ────────────────────────────────────────────────

#[tokio::test]
async fn test_connect_is_idempotent() {
    let h = connected().await;
    h.session.connect(&credential()).await.unwrap();

    assert_eq!(h.connector.handshakes(), 1);
    assert_eq!(h.session.state(), ConnectionState::Connected);
    assert_eq!(h.session.bridge_info().await.unwrap().bridge_id, "001788FFFE23BB1A");
}

#[tokio::test]
async fn test_concurrent_connect_is_single_flight() {
    let clock = Arc::new(ManualClock::new());
    let bridge = FakeBridge::new(Arc::clone(&clock));
    let connector = FakeConnector::slow(bridge, false);
    let session = BridgeSession::with_parts(SessionConfig::default(), connector.clone(), clock);

    let cred = credential();
    let (a, b) = tokio::join!(session.connect(&cred), session.connect(&cred));

    assert!(a.is_ok());
    assert!(b.is_ok());
    assert_eq!(connector.handshakes(), 1);
}

#[tokio::test]
async fn test_concurrent_connect_shares_failure() {
    let clock = Arc::new(ManualClock::new());
    let bridge = FakeBridge::new(Arc::clone(&clock));
    let connector = FakeConnector::slow(bridge, true);
    let session = BridgeSession::with_parts(SessionConfig::default(), connector.clone(), clock);

    let cred = credential();
    let (a, b) = tokio::join!(session.connect(&cred), session.connect(&cred));

    assert!(matches!(a, Err(CoreError::ConnectionError { .. })));
    assert!(matches!(b, Err(CoreError::ConnectionError { .. })));
    assert_eq!(connector.handshakes(), 1);
    assert_eq!(session.state(), ConnectionState::Disconnected);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_connect_stampede_runs_one_failing_handshake() {
    const CALLERS: usize = 32;

    let clock = Arc::new(ManualClock::new());
    let bridge = FakeBridge::new(Arc::clone(&clock));
    let connector = FakeConnector::slow(bridge, true);
    let session = BridgeSession::with_parts(SessionConfig::default(), connector.clone(), clock);
    let start = Arc::new(tokio::sync::Barrier::new(CALLERS));

    let tasks: Vec<_> = (0..CALLERS)
        .map(|_| {
            let session = session.clone();
            let start = Arc::clone(&start);
            tokio::spawn(async move {
                start.wait().await;
                session.connect(&credential()).await
            })
        })
        .collect();

    for task in tasks {
        let result = task.await.unwrap();
        assert!(matches!(result, Err(CoreError::ConnectionError { .. })));
    }
    assert_eq!(connector.handshakes(), 1);
    assert_eq!(session.state(), ConnectionState::Disconnected);

    // A later call is a fresh attempt, not a replay of the old failure.
    let _ = session.connect(&credential()).await;
    assert_eq!(connector.handshakes(), 2);
}

#[tokio::test]
async fn test_close_then_operations_fail_until_reconnect() {
    let h = connected().await;
    h.session.close().await;
    h.session.close().await;

    assert!(matches!(h.session.lights(false).await, Err(CoreError::NotConnected)));
    assert!(matches!(h.session.groups(false).await, Err(CoreError::NotConnected)));

    h.session.connect(&credential()).await.unwrap();
    assert_eq!(h.connector.handshakes(), 2);
    assert!(h.session.lights(false).await.is_ok());
}

#[tokio::test]
async fn test_state_transitions_are_published() {
    let h = harness_with(SessionConfig::default());
    let mut rx = h.session.connection_state();
    assert_eq!(*rx.borrow_and_update(), ConnectionState::Disconnected);

    h.session.connect(&credential()).await.unwrap();
    assert!(rx.has_changed().unwrap());
    assert_eq!(*rx.borrow_and_update(), ConnectionState::Connected);

    h.session.close().await;
    assert_eq!(*rx.borrow_and_update(), ConnectionState::Disconnected);
}

// ── Cache tests ─────────────────────────────────────────────────────

#[tokio::test]
async fn test_reads_within_ttl_hit_cache() {
    let h = connected().await;

    let first = h.session.lights(false).await.unwrap();
    h.clock.advance(secs(0.5));
    let second = h.session.lights(false).await.unwrap();
    h.clock.advance(secs(1.4));
    let third = h.session.lights(false).await.unwrap();

    assert_eq!(h.bridge.light_fetches().len(), 1);
    assert!(Arc::ptr_eq(&first, &second));
    assert!(Arc::ptr_eq(&first, &third));
}

#[tokio::test]
async fn test_ttl_expiry_scenario() {
    let h = connected().await;

    let at_0 = h.session.lights(false).await.unwrap();
    assert!(at_0["1"].on);

    h.clock.advance(secs(1.0));
    h.bridge.set_on("1", false);

    h.clock.advance(secs(0.5));
    let at_1_5 = h.session.lights(false).await.unwrap();
    assert!(at_1_5["1"].on, "still served from cache");

    h.clock.advance(secs(1.0));
    let at_2_5 = h.session.lights(false).await.unwrap();
    assert!(!at_2_5["1"].on, "cache expired, refetched");

    assert_eq!(h.bridge.light_fetches(), vec![secs(0.0), secs(2.5)]);
}

#[tokio::test]
async fn test_bypass_cache_forces_fetch() {
    let h = connected().await;

    h.session.lights(false).await.unwrap();
    h.session.lights(true).await.unwrap();

    assert_eq!(h.bridge.light_fetches().len(), 2);
}

#[tokio::test]
async fn test_lights_and_groups_cached_separately() {
    let h = connected().await;

    h.session.lights(false).await.unwrap();
    h.session.groups(false).await.unwrap();
    h.session.groups(false).await.unwrap();

    assert_eq!(h.bridge.light_fetches().len(), 1);
    assert_eq!(h.bridge.group_fetches.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_clear_cache() {
    let h = connected().await;

    h.session.lights(false).await.unwrap();
    h.session.clear_cache().await;
    h.session.lights(false).await.unwrap();

    assert_eq!(h.bridge.light_fetches().len(), 2);
}

// ── Write tests ─────────────────────────────────────────────────────

#[tokio::test]
async fn test_write_invalidates_cache_with_ttl_remaining() {
    let h = connected().await;

    let before = h.session.lights(false).await.unwrap();
    assert!(before["1"].on);

    h.clock.advance(secs(0.1));
    h.session
        .set_light_state("1", &StateChange::off(), None)
        .await
        .unwrap();

    let after = h.session.lights(false).await.unwrap();
    assert!(!after["1"].on);
    assert_eq!(h.bridge.light_fetches(), vec![secs(0.0), secs(0.1)]);
}

#[tokio::test]
async fn test_group_write_invalidates_both_snapshots() {
    let h = connected().await;

    h.session.lights(false).await.unwrap();
    h.session.groups(false).await.unwrap();
    h.session
        .set_group_state("1", &StateChange::on().with_brightness(100), None)
        .await
        .unwrap();
    h.session.lights(false).await.unwrap();
    h.session.groups(false).await.unwrap();

    assert_eq!(h.bridge.light_fetches().len(), 2);
    assert_eq!(h.bridge.group_fetches.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_write_unknown_light_is_not_found() {
    let h = connected().await;
    h.session.lights(false).await.unwrap();

    let result = h
        .session
        .set_light_state("99", &StateChange::on(), None)
        .await;
    match result {
        Err(CoreError::NotFound { kind, id }) => {
            assert_eq!(kind, ResourceKind::Light);
            assert_eq!(id, "99");
        }
        other => panic!("expected NotFound, got {other:?}"),
    }

    h.session.lights(false).await.unwrap();
    assert_eq!(h.bridge.light_fetches().len(), 2, "stale id forces a fresh read");
}

#[tokio::test]
async fn test_write_transient_failure_is_not_retried() {
    let h = connected().await;
    h.bridge.fail_next_write(timeout());

    let result = h
        .session
        .set_light_state("1", &StateChange::off(), None)
        .await;

    assert!(matches!(result, Err(CoreError::BridgeUnavailable { attempts: 1, .. })));
    assert_eq!(h.bridge.write_count(), 1);
    assert!(h.clock.sleeps().is_empty());
}

#[tokio::test]
async fn test_rejected_write_keeps_cache() {
    let h = connected().await;
    h.session.lights(false).await.unwrap();
    h.bridge.fail_next_write(ApiError::Bridge {
        code: 201,
        address: "/lights/1/state/bri".into(),
        description: "parameter, bri, is not modifiable. Device is set to off.".into(),
    });

    let result = h
        .session
        .set_light_state("1", &StateChange::default().with_brightness(10), None)
        .await;
    assert!(matches!(result, Err(CoreError::Rejected { code: Some(201), .. })));

    h.session.lights(false).await.unwrap();
    assert_eq!(h.bridge.light_fetches().len(), 1);
}

#[tokio::test]
async fn test_empty_change_is_rejected_locally() {
    let h = connected().await;
    let result = h
        .session
        .set_light_state("1", &StateChange::default(), None)
        .await;
    assert!(matches!(result, Err(CoreError::Validation { .. })));
    assert_eq!(h.bridge.write_count(), 0);
}

// ── Retry tests ─────────────────────────────────────────────────────

#[tokio::test]
async fn test_read_recovers_after_transient_failures() {
    let h = connected().await;
    h.bridge.fail_reads([timeout(), timeout()]);

    let lights = h.session.lights(false).await.unwrap();

    assert_eq!(lights.len(), 3);
    assert_eq!(h.bridge.light_fetches(), vec![secs(0.0), secs(1.0), secs(3.0)]);
    assert_eq!(h.clock.sleeps(), vec![secs(1.0), secs(2.0)]);
}

#[tokio::test]
async fn test_retry_exhaustion_leaves_cache_untouched() {
    let h = harness_with(SessionConfig {
        cache_ttl: Duration::from_secs(60),
        ..SessionConfig::default()
    });
    h.session.connect(&credential()).await.unwrap();

    let primed = h.session.lights(false).await.unwrap();
    h.bridge.fail_reads([timeout(), timeout(), timeout()]);

    let result = h.session.lights(true).await;
    assert!(matches!(result, Err(CoreError::BridgeUnavailable { attempts: 3, .. })));
    assert_eq!(h.bridge.light_fetches().len(), 4);

    let cached = h.session.lights(false).await.unwrap();
    assert!(Arc::ptr_eq(&primed, &cached));
    assert_eq!(h.bridge.light_fetches().len(), 4);
}

#[tokio::test]
async fn test_permanent_read_error_is_not_retried() {
    let h = connected().await;
    h.bridge.fail_reads([ApiError::Bridge {
        code: 7,
        address: "/lights".into(),
        description: "invalid value".into(),
    }]);

    let result = h.session.lights(false).await;

    assert!(matches!(result, Err(CoreError::Rejected { code: Some(7), .. })));
    assert_eq!(h.bridge.light_fetches().len(), 1);
    assert!(h.clock.sleeps().is_empty());
}

#[tokio::test]
async fn test_revoked_key_disconnects_session() {
    let h = connected().await;
    h.bridge.fail_reads([ApiError::Unauthorized {
        description: "unauthorized user".into(),
    }]);

    let result = h.session.lights(false).await;

    assert!(matches!(result, Err(CoreError::ConnectionError { .. })));
    assert_eq!(h.session.state(), ConnectionState::Disconnected);
    assert!(matches!(h.session.lights(false).await, Err(CoreError::NotConnected)));
}

// ── Group lookup tests ──────────────────────────────────────────────

#[tokio::test]
async fn test_lights_in_group_by_partial_name() {
    let h = connected().await;

    let (group, lights) = h.session.lights_in_group("living").await.unwrap();

    assert_eq!(group.name, "Living room");
    let names: Vec<&str> = lights.iter().map(|l| l.name.as_str()).collect();
    assert_eq!(names, vec!["Sofa", "Window"]);
}

#[tokio::test]
async fn test_unknown_group_is_not_found() {
    let h = connected().await;
    let result = h.session.find_group("garage").await;
    assert!(matches!(
        result,
        Err(CoreError::NotFound { kind: ResourceKind::Group, .. })
    ));
}

// ── Effect tests ────────────────────────────────────────────────────

#[tokio::test]
async fn test_startup_show_timeline() {
    let h = connected().await;
    let sequencer = EffectSequencer::new(h.session.clone());

    let report = sequencer
        .startup_show(None, Duration::from_secs(30))
        .await
        .unwrap();

    assert_eq!(report.room, "Living room");
    assert_eq!(report.lights, 2);
    assert!(!report.writes.cancelled);
    // intro + 3 patterns + finish, two lights each
    assert_eq!(report.writes.applied, 10);
    assert_eq!(h.bridge.write_count(), 10);

    let holds: Vec<Duration> = h
        .clock
        .sleeps()
        .into_iter()
        .filter(|d| *d != huectl_core::effects::STAGGER)
        .collect();
    assert_eq!(holds, vec![secs(8.0), secs(6.0), secs(6.0), secs(6.0)]);

    let (_, last) = h.bridge.writes.lock().unwrap().last().cloned().unwrap();
    assert_eq!(last.xy, Some([0.4573, 0.41]));
    assert_eq!(last.bri, Some(152));
}

#[tokio::test]
async fn test_quick_effect_targets_named_room() {
    let h = connected().await;
    let sequencer = EffectSequencer::new(h.session.clone());

    let report = sequencer.quick(Some("hall")).await.unwrap();

    assert_eq!(report.room, "Hallway");
    assert_eq!(report.writes.applied, 1);
    let (id, update) = h.bridge.writes.lock().unwrap()[0].clone();
    assert_eq!(id, "3");
    assert_eq!(update.on, Some(true));
    assert_eq!(update.bri, Some(216));
}

#[tokio::test]
async fn test_cancelled_show_restores_warm_white() {
    let h = connected().await;
    let cancel = tokio_util::sync::CancellationToken::new();
    cancel.cancel();
    let sequencer = EffectSequencer::new(h.session.clone()).with_cancel(cancel);

    let report = sequencer
        .startup_show(Some("living"), Duration::from_secs(30))
        .await
        .unwrap();

    assert!(report.writes.cancelled);
    let writes = h.bridge.writes.lock().unwrap().clone();
    let (_, last) = writes.last().cloned().unwrap();
    assert_eq!(last.xy, Some([0.4573, 0.41]));
    assert_eq!(last.bri, None);
}

// ── HTTP end-to-end ─────────────────────────────────────────────────

#[tokio::test]
async fn test_http_connector_round_trip() {
    let server = MockServer::start().await;
    let key_path = |suffix: &str| format!("/api/{TOKEN}/{suffix}");

    Mock::given(method("GET"))
        .and(path(key_path("config")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": "Hue Bridge", "bridgeid": "001788FFFE23BB1A", "modelid": "BSB002",
            "apiversion": "1.65.0", "swversion": "1965111030", "whitelist": {}
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(key_path("lights")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "1": { "name": "Sofa", "type": "Dimmable light",
                   "state": { "on": true, "bri": 254, "reachable": true } }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let config = SessionConfig {
        https: false,
        port: Some(server.address().port()),
        ..SessionConfig::default()
    };
    let session = BridgeSession::new(config);
    let cred = BridgeCredential::parse("127.0.0.1", TOKEN).unwrap();

    session.connect(&cred).await.unwrap();
    session.connect(&cred).await.unwrap();
    let lights = session.lights(false).await.unwrap();
    let again = session.lights(false).await.unwrap();

    assert_eq!(lights["1"].brightness, Some(254));
    assert!(Arc::ptr_eq(&lights, &again));
    assert_eq!(session.state(), ConnectionState::Connected);
}

#[tokio::test]
async fn test_unreachable_bridge_error_hides_application_key() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let config = SessionConfig {
        https: false,
        port: Some(port),
        ..SessionConfig::default()
    };
    let session = BridgeSession::new(config);
    let cred = BridgeCredential::parse("127.0.0.1", TOKEN).unwrap();

    let err = session.connect(&cred).await.unwrap_err();
    assert!(matches!(err, CoreError::ConnectionError { .. }));
    assert!(!err.to_string().contains(TOKEN), "leaked: {err}");
    assert!(!format!("{err:?}").contains(TOKEN), "leaked: {err:?}");
}
