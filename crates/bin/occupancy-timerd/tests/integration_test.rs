//! End-to-end smoke tests for the full occupancy-timerd stack.
//!
//! Each test wires virtual switches, the accessory service, the event bus
//! and the real axum router, and exercises the HTTP layer via
//! `tower::ServiceExt::oneshot` — no TCP port is bound. Time is paused so
//! countdowns complete instantly and deterministically.

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use http_body_util::BodyExt;
use occupancy_timer_adapter_http_axum::router;
use occupancy_timer_adapter_http_axum::state::AppState;
use occupancy_timer_adapter_virtual::Simulation;
use occupancy_timer_app::aggregator::AggregatorSettings;
use occupancy_timer_app::event_bus::InProcessEventBus;
use occupancy_timer_app::services::accessory_service::AccessoryService;
use occupancy_timer_domain::accessory::AccessoryConfig;
use occupancy_timer_domain::event::{EventKind, OccupancyEvent};
use occupancy_timer_domain::id::AccessoryId;
use tokio::sync::broadcast;
use tower::ServiceExt;

struct Stack {
    app: axum::Router,
    id: AccessoryId,
    events: broadcast::Receiver<OccupancyEvent>,
}

/// Wire one accessory named `Office` with virtual switches.
fn stack(slave_count: i64, delay: i64, protected_mode: bool) -> Stack {
    simulated_stack(slave_count, delay, protected_mode, &Simulation::default())
}

fn simulated_stack(
    slave_count: i64,
    delay: i64,
    protected_mode: bool,
    simulation: &Simulation,
) -> Stack {
    let event_bus = Arc::new(InProcessEventBus::new(256));
    let events = event_bus.subscribe();
    let service = Arc::new(AccessoryService::new(
        Arc::clone(&event_bus),
        AggregatorSettings::default(),
    ));

    let config = AccessoryConfig::builder()
        .name("Office")
        .slave_count(slave_count)
        .delay_seconds(delay)
        .protected_mode(protected_mode)
        .build()
        .expect("config should be valid");
    let switches = occupancy_timer_adapter_virtual::switches_for(&config, simulation);
    let id = service
        .register(config, switches)
        .expect("accessory should register");

    Stack {
        app: router::build(AppState::new(service, event_bus)),
        id,
        events,
    }
}

impl Stack {
    async fn send(&self, request: Request<Body>) -> (StatusCode, serde_json::Value) {
        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json = if bytes.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    async fn set_switch(&self, index: usize, body: &str) -> StatusCode {
        let request = Request::builder()
            .method("PUT")
            .uri(format!("/api/accessories/{}/switches/{index}", self.id))
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        self.send(request).await.0
    }

    async fn status(&self) -> serde_json::Value {
        let request = Request::builder()
            .uri(format!("/api/accessories/{}", self.id))
            .body(Body::empty())
            .unwrap();
        let (status, json) = self.send(request).await;
        assert_eq!(status, StatusCode::OK);
        json
    }

    async fn set_delay(&self, seconds: i64) -> serde_json::Value {
        let request = Request::builder()
            .method("PUT")
            .uri(format!("/api/accessories/{}/delay", self.id))
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(format!(r#"{{"delay_seconds": {seconds}}}"#)))
            .unwrap();
        let (status, json) = self.send(request).await;
        assert_eq!(status, StatusCode::OK);
        json
    }

    fn drain(&mut self) -> Vec<EventKind> {
        let mut kinds = Vec::new();
        while let Ok(event) = self.events.try_recv() {
            kinds.push(event.kind);
        }
        kinds
    }
}

fn remaining(seconds: u32) -> EventKind {
    EventKind::RemainingChanged {
        remaining_seconds: seconds,
    }
}

fn occupancy(occupied: bool) -> EventKind {
    EventKind::OccupancyChanged { occupied }
}

// ---------------------------------------------------------------------------
// Health check
// ---------------------------------------------------------------------------

#[tokio::test]
async fn should_return_ok_when_health_check_called() {
    let stack = stack(1, 0, false);
    let request = Request::builder()
        .uri("/health")
        .body(Body::empty())
        .unwrap();
    let response = stack.app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

// ---------------------------------------------------------------------------
// Occupancy lifecycle
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn should_hold_occupancy_for_delay_then_release() {
    let mut stack = stack(2, 3, false);

    assert_eq!(stack.set_switch(0, r#"{"on": true}"#).await, StatusCode::OK);
    let status = stack.status().await;
    assert_eq!(status["occupied"], true);
    assert_eq!(status["remaining_seconds"], 3);

    assert_eq!(stack.set_switch(0, r#"{"on": false}"#).await, StatusCode::OK);
    let status = stack.status().await;
    assert_eq!(status["occupied"], true);
    assert_eq!(status["countdown_running"], true);

    tokio::time::sleep(Duration::from_millis(3_100)).await;
    let status = stack.status().await;
    assert_eq!(status["occupied"], false);
    assert_eq!(status["remaining_seconds"], 0);
    assert_eq!(status["countdown_running"], false);

    assert_eq!(
        stack.drain(),
        vec![
            occupancy(true),
            remaining(3),
            remaining(2),
            remaining(1),
            remaining(0),
            occupancy(false),
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn should_stay_occupied_while_any_switch_is_on() {
    let mut stack = stack(2, 0, false);

    stack.set_switch(0, r#"{"on": true}"#).await;
    stack.set_switch(1, r#"{"on": true}"#).await;
    stack.set_switch(0, r#"{"on": false}"#).await;
    assert_eq!(stack.status().await["occupied"], true);

    stack.set_switch(1, r#"{"on": false}"#).await;
    assert_eq!(stack.status().await["occupied"], false);

    assert_eq!(stack.drain(), vec![occupancy(true), occupancy(false)]);
}

#[tokio::test(start_paused = true)]
async fn should_cancel_countdown_when_switch_turns_back_on() {
    let mut stack = stack(1, 10, false);

    stack.set_switch(0, r#"{"on": true}"#).await;
    stack.set_switch(0, r#"{"on": false}"#).await;
    tokio::time::sleep(Duration::from_secs(4)).await;
    stack.set_switch(0, r#"{"on": true}"#).await;
    stack.drain();

    tokio::time::sleep(Duration::from_secs(30)).await;
    let status = stack.status().await;
    assert_eq!(status["occupied"], true);
    assert_eq!(status["countdown_running"], false);
    assert!(stack.drain().is_empty());
}

// ---------------------------------------------------------------------------
// Protected mode
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn should_only_accept_gated_capability_in_protected_mode() {
    let stack = stack(1, 0, true);

    assert_eq!(
        stack.set_switch(0, r#"{"on": true, "capability": "on"}"#).await,
        StatusCode::BAD_REQUEST
    );
    assert_eq!(stack.status().await["occupied"], false);

    assert_eq!(stack.set_switch(0, r#"{"on": true}"#).await, StatusCode::OK);
    let status = stack.status().await;
    assert_eq!(status["occupied"], true);
    assert_eq!(status["switches"][0]["capability"], "enabled");
}

// ---------------------------------------------------------------------------
// Reconfiguration
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn should_clamp_and_publish_new_delay() {
    let mut stack = stack(1, 0, false);

    assert_eq!(stack.set_delay(-5).await["delay_seconds"], 0);
    assert_eq!(stack.set_delay(7200).await["delay_seconds"], 3600);
    assert_eq!(stack.status().await["delay"], 3600);

    let delays: Vec<_> = stack
        .drain()
        .into_iter()
        .filter_map(|kind| match kind {
            EventKind::DelayChanged { delay } => Some(delay.seconds()),
            _ => None,
        })
        .collect();
    assert_eq!(delays, vec![0, 3600]);
}

#[tokio::test(start_paused = true)]
async fn should_apply_new_delay_to_next_countdown_only() {
    let stack = stack(1, 10, false);

    stack.set_switch(0, r#"{"on": true}"#).await;
    stack.set_switch(0, r#"{"on": false}"#).await;
    stack.set_delay(2).await;

    tokio::time::sleep(Duration::from_secs(5)).await;
    assert_eq!(stack.status().await["occupied"], true);

    tokio::time::sleep(Duration::from_millis(5_100)).await;
    assert_eq!(stack.status().await["occupied"], false);

    stack.set_switch(0, r#"{"on": true}"#).await;
    stack.set_switch(0, r#"{"on": false}"#).await;
    tokio::time::sleep(Duration::from_millis(2_100)).await;
    assert_eq!(stack.status().await["occupied"], false);
}

// ---------------------------------------------------------------------------
// Simulated switch failures
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn should_count_unreachable_switch_as_off() {
    let simulation = Simulation {
        unreachable: vec![1],
        ..Simulation::default()
    };
    let mut stack = simulated_stack(2, 0, false, &simulation);

    assert_eq!(stack.set_switch(1, r#"{"on": true}"#).await, StatusCode::OK);
    let status = stack.status().await;
    assert_eq!(status["occupied"], false);
    assert_eq!(status["switches"][1]["on"], serde_json::Value::Null);

    stack.set_switch(0, r#"{"on": true}"#).await;
    assert_eq!(stack.status().await["occupied"], true);
    assert_eq!(stack.drain(), vec![occupancy(true)]);
}

#[tokio::test(start_paused = true)]
async fn should_count_switch_slower_than_read_timeout_as_off() {
    let simulation = Simulation {
        read_latency: AggregatorSettings::default().read_timeout + Duration::from_secs(1),
        ..Simulation::default()
    };
    let stack = simulated_stack(1, 0, false, &simulation);

    stack.set_switch(0, r#"{"on": true}"#).await;
    tokio::time::sleep(Duration::from_secs(5)).await;
    assert_eq!(stack.status().await["occupied"], false);
}

// ---------------------------------------------------------------------------
// Teardown
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn should_cancel_countdown_when_accessory_is_deleted() {
    let mut stack = stack(1, 10, false);
    stack.set_switch(0, r#"{"on": true}"#).await;
    stack.set_switch(0, r#"{"on": false}"#).await;

    let request = Request::builder()
        .method("DELETE")
        .uri(format!("/api/accessories/{}", stack.id))
        .body(Body::empty())
        .unwrap();
    assert_eq!(stack.send(request).await.0, StatusCode::NO_CONTENT);
    stack.drain();

    tokio::time::sleep(Duration::from_secs(30)).await;
    assert!(stack.drain().is_empty());

    let request = Request::builder()
        .uri("/api/accessories")
        .body(Body::empty())
        .unwrap();
    let (status, json) = stack.send(request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json, serde_json::json!([]));
}
