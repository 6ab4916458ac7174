//! Axum router assembly.

use axum::Router;
use axum::routing::get;
use tower_http::trace::TraceLayer;

use occupancy_timer_app::ports::{EventPublisher, SwitchInput};

use crate::state::AppState;

/// Build the top-level axum [`Router`].
///
/// Nests API routes under `/api` and includes a [`TraceLayer`] that logs
/// each HTTP request/response at the `DEBUG` level.
pub fn build<S, P>(state: AppState<S, P>) -> Router
where
    S: SwitchInput + 'static,
    P: EventPublisher + Clone + Send + Sync + 'static,
{
    Router::new()
        .route("/health", get(health_check))
        .nest("/api", crate::api::routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_check() -> &'static str {
    "OK"
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{body_json, test_state};
    use axum::body::Body;
    use axum::http::{Request, StatusCode, header};
    use occupancy_timer_domain::accessory::AccessoryConfig;
    use tower::ServiceExt;

    fn office(protected_mode: bool) -> AccessoryConfig {
        AccessoryConfig::builder()
            .name("Office")
            .slave_count(2)
            .delay_seconds(30)
            .protected_mode(protected_mode)
            .build()
            .unwrap()
    }

    fn put_json(uri: &str, json: &str) -> Request<Body> {
        Request::builder()
            .method("PUT")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn should_return_ok_when_health_check_called() {
        let (state, _) = test_state(&[]);
        let response = build(state).oneshot(get("/health")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn should_serve_characteristic_schema() {
        let (state, _) = test_state(&[]);
        let response = build(state).oneshot(get("/api/schema")).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let schema = body_json(response).await;
        let time_remaining = schema
            .as_array()
            .unwrap()
            .iter()
            .find(|c| c["name"] == "Time Remaining")
            .unwrap();
        assert_eq!(time_remaining["format"], "uint64");
        assert_eq!(time_remaining["max_value"], 3600);
        assert_eq!(time_remaining["min_step"], 5);
    }

    #[tokio::test]
    async fn should_list_accessories_with_switches() {
        let (state, _) = test_state(&[office(false)]);
        let response = build(state)
            .oneshot(get("/api/accessories"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        let accessory = &body[0];
        assert_eq!(accessory["name"], "Office");
        assert_eq!(accessory["occupied"], false);
        assert_eq!(accessory["delay"], 30);
        assert_eq!(accessory["switches"][1]["name"], "Office 2");
        assert_eq!(accessory["switches"][1]["capability"], "on");
    }

    #[tokio::test]
    async fn should_mark_accessory_occupied_after_switch_put() {
        let (state, ids) = test_state(&[office(false)]);
        let app = build(state);
        let id = ids[0];

        let response = app
            .clone()
            .oneshot(put_json(
                &format!("/api/accessories/{id}/switches/0"),
                r#"{"on": true}"#,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["on"], true);

        let response = app
            .oneshot(get(&format!("/api/accessories/{id}")))
            .await
            .unwrap();
        let body = body_json(response).await;
        assert_eq!(body["occupied"], true);
        assert_eq!(body["switches"][0]["on"], true);
    }

    #[tokio::test]
    async fn should_reject_ungated_capability_in_protected_mode() {
        let (state, ids) = test_state(&[office(true)]);
        let app = build(state);
        let id = ids[0];

        let response = app
            .clone()
            .oneshot(put_json(
                &format!("/api/accessories/{id}/switches/0"),
                r#"{"on": true, "capability": "on"}"#,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = app
            .oneshot(get(&format!("/api/accessories/{id}")))
            .await
            .unwrap();
        assert_eq!(body_json(response).await["occupied"], false);
    }

    #[tokio::test]
    async fn should_reject_switch_index_out_of_range() {
        let (state, ids) = test_state(&[office(false)]);
        let response = build(state)
            .oneshot(put_json(
                &format!("/api/accessories/{}/switches/5", ids[0]),
                r#"{"on": true}"#,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn should_clamp_delay_and_echo_applied_value() {
        let (state, ids) = test_state(&[office(false)]);
        let response = build(state)
            .oneshot(put_json(
                &format!("/api/accessories/{}/delay", ids[0]),
                r#"{"delay_seconds": 99999}"#,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["delay_seconds"], 3600);
    }

    #[tokio::test]
    async fn should_return_404_for_unknown_or_malformed_id() {
        let (state, _) = test_state(&[]);
        let app = build(state);

        let response = app
            .clone()
            .oneshot(get(&format!(
                "/api/accessories/{}",
                occupancy_timer_domain::id::AccessoryId::new()
            )))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = app
            .oneshot(get("/api/accessories/not-a-uuid"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn should_delete_accessory() {
        let (state, ids) = test_state(&[office(false)]);
        let app = build(state);
        let uri = format!("/api/accessories/{}", ids[0]);

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("DELETE")
                    .uri(&uri)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let response = app.oneshot(get(&uri)).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
