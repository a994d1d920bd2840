use crate::api::api_error::APIError;
use crate::api::model::{stats_result, SaveHostsRequest, StatsResult};
use crate::api::page;
use crate::api::server::AppState;
use crate::error::Error;
use axum::extract::State;
use axum::response::{Html, IntoResponse, Redirect};
use axum::routing::{get, post};
use axum::{Form, Json, Router};
use axum_extra::extract::WithRejection;
use serde_json::json;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

pub(super) fn new(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/save_hosts", post(save_hosts))
        .route("/stats", get(stats))
        .route("/healthcheck", get(health_check))
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(state.config.api_timeout))
        .with_state(state)
}

#[allow(clippy::unused_async)]
async fn health_check() -> impl IntoResponse {
    Json(json!({"ok":"healthy"}))
}

#[allow(clippy::unused_async)]
async fn index(State(state): State<AppState>) -> Html<String> {
    let table = state.overrides.current();
    Html(page::index(table.lines(), &state.stats.snapshot()))
}

#[allow(clippy::unused_async)]
async fn stats(State(state): State<AppState>) -> Json<StatsResult> {
    Json(stats_result(state.stats.snapshot()))
}

async fn save_hosts(
    State(state): State<AppState>,
    WithRejection(Form(payload), _): WithRejection<Form<SaveHostsRequest>, APIError>,
) -> Result<Redirect, APIError> {
    if payload.hosts.trim().is_empty() {
        return Err(Error::MissingHosts.into());
    }

    let hosts_file = state.hosts_file.lock().await;
    let table = hosts_file.save(&payload.hosts).await?;
    tracing::info!("override table updated: {table}");
    state.overrides.replace(table);
    drop(hosts_file);
    Ok(Redirect::to("/"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::overrides::{HostsFile, OverrideStore, OverrideTable, Target};
    use crate::stats::{self, Stats};
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::sync::Mutex;
    use tower::ServiceExt;

    fn state(hosts_path: &str) -> AppState {
        let config = Config {
            dns_udp_bind_addr: "127.0.0.1:0".parse().unwrap(),
            dns_tcp_bind_addr: "127.0.0.1:0".parse().unwrap(),
            dns_tcp_timeout: Duration::from_secs(5),
            api_bind_addr: "127.0.0.1:0".parse().unwrap(),
            api_timeout: Duration::from_secs(5),
            hosts_path: hosts_path.to_string(),
            nameservers_path: String::new(),
            upstream_timeout: Duration::from_secs(3),
            fault_trigger_name: None,
        };
        AppState {
            config: Arc::new(config),
            overrides: Arc::new(OverrideStore::new(OverrideTable::parse("old.test 1.1.1.1\n"))),
            hosts_file: Arc::new(Mutex::new(HostsFile::new(hosts_path))),
            stats: Arc::new(Stats::new()),
        }
    }

    fn save_request(body: &'static str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/save_hosts")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body))
            .unwrap()
    }

    async fn body_string(response: axum::response::Response) -> String {
        let bytes = hyper::body::to_bytes(response.into_body()).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn save_hosts_installs_new_table() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hosts");
        let state = state(&path.to_string_lossy());
        let app = new(state.clone());

        let response = app
            .oneshot(save_request("hosts=foo.test+1.2.3.4%0A*.bar.test+baz.test"))
            .await
            .unwrap();

        assert!(response.status().is_redirection());
        assert_eq!(response.headers()[header::LOCATION], "/");
        let table = state.overrides.current();
        assert_eq!(table.lookup("old.test"), None);
        assert_eq!(
            table.lookup("foo.test"),
            Some(&Target::Address("1.2.3.4".parse().unwrap()))
        );
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "foo.test 1.2.3.4\n*.bar.test baz.test"
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_saves_keep_file_and_table_in_step() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hosts");
        let state = state(&path.to_string_lossy());

        let handles: Vec<_> = (1..=16u8)
            .map(|i| {
                let app = new(state.clone());
                let body = format!("hosts=host{i}.test+10.0.0.{i}");
                tokio::spawn(async move {
                    let request = Request::post("/save_hosts")
                        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                        .body(Body::from(body))
                        .unwrap();
                    app.oneshot(request).await.unwrap()
                })
            })
            .collect();
        for handle in handles {
            assert!(handle.await.unwrap().status().is_redirection());
        }

        let on_disk = OverrideTable::parse(&std::fs::read_to_string(&path).unwrap());
        let live = state.overrides.current();
        assert_eq!(on_disk.lines(), live.lines());
        assert_eq!(live.len(), 1);
    }

    #[tokio::test]
    async fn save_hosts_requires_hosts() {
        let dir = tempfile::tempdir().unwrap();
        let state = state(&dir.path().join("hosts").to_string_lossy());

        for body in ["", "hosts=", "other=1"] {
            let response = new(state.clone()).oneshot(save_request(body)).await.unwrap();
            assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{body:?}");
        }
        assert!(state.overrides.current().lookup("old.test").is_some());
    }

    #[tokio::test]
    async fn save_hosts_requires_form_content_type() {
        let state = state("/nonexistent/hosts");
        let request = Request::post("/save_hosts")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"hosts":"foo.test 1.2.3.4"}"#))
            .unwrap();

        let response = new(state).oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
    }

    #[tokio::test]
    async fn stats_returns_counters() {
        let state = state("/nonexistent/hosts");
        state.stats.increment(stats::REQUESTS);
        state.stats.increment(stats::REQUESTS);
        state.stats.increment(stats::LOCAL_RESPONSES);

        let response = new(state)
            .oneshot(Request::get("/stats").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            body_string(response).await,
            r#"{"local_responses":1,"requests":2}"#
        );
    }

    #[tokio::test]
    async fn index_shows_active_table() {
        let state = state("/nonexistent/hosts");
        let response = new(state)
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_string(response).await.contains("old.test 1.1.1.1"));
    }
}
