//! End-to-end HTTP tests for the dispatcher's admin and node surfaces.
//!
//! Spins up the **real** Axum server on an OS-assigned ephemeral port,
//! backed by an in-memory SQLite store, and drives it with `reqwest` — the
//! same pattern the teacher crate's `e2e_setup.rs` uses.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use dispatch_auth::Keys;
use dispatch_core::Scheduler;
use dispatch_store::{Database, SqliteStore};
use dispatch_web::server::build_router;
use dispatch_web::AppState;
use serde_json::json;
use tokio::net::TcpListener;

const ADMIN_KEY: &str = "admin-secret";
const NODES_KEY: &str = "nodes-secret";

/// Bind to 127.0.0.1:0, start the real router, return (base_url, server task).
async fn start_test_server() -> (String, tokio::task::JoinHandle<()>) {
    let db = Database::open_in_memory().expect("open in-memory db");
    db.run_migrations().await.expect("run migrations");
    let store = Arc::new(SqliteStore::new(db));
    let scheduler = Scheduler::new(store);
    let keys = Keys::new(ADMIN_KEY, NODES_KEY);
    let state = Arc::new(AppState {
        scheduler,
        keys: Arc::new(keys),
    });

    let app = build_router(state);

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind to port 0");
    let addr: SocketAddr = listener.local_addr().expect("get local addr");
    let base = format!("http://{addr}");

    let handle = tokio::spawn(async move {
        axum::serve(listener, app).await.ok();
    });

    tokio::time::sleep(Duration::from_millis(10)).await;
    (base, handle)
}

fn submission(node_org: &str, node_name: &str, window_end_secs: i64) -> serde_json::Value {
    let now = chrono::Utc::now();
    json!({
        "nodes": [{"organization": node_org, "name": node_name}],
        "task": {
            "window_start": (now - chrono::Duration::minutes(1)).to_rfc3339(),
            "window_end": (now + chrono::Duration::seconds(window_end_secs)).to_rfc3339(),
            "provider": "example-provider",
            "spec": {"cmd": "noop"},
        }
    })
}

#[tokio::test]
async fn happy_path_submit_claim_report_fetch() {
    let (base, _srv) = start_test_server().await;
    let client = reqwest::Client::new();

    let submit = client
        .post(format!("{base}/admin/jobs"))
        .bearer_auth(ADMIN_KEY)
        .json(&submission("o1", "n1", 3600))
        .send()
        .await
        .expect("submit request failed");
    assert_eq!(submit.status(), 200);
    let body: serde_json::Value = submit.json().await.expect("invalid JSON");
    let job_id = body["id"].as_str().expect("id present").to_string();

    let claimed = client
        .post(format!(
            "{base}/organizations/o1/foodtruck/nodes/n1/tasks/next"
        ))
        .bearer_auth(NODES_KEY)
        .send()
        .await
        .expect("claim request failed");
    assert_eq!(claimed.status(), 200);
    let claimed_body: serde_json::Value = claimed.json().await.expect("invalid JSON");
    assert_eq!(claimed_body["job_id"], job_id);
    assert_eq!(claimed_body["provider"], "example-provider");

    let status = client
        .post(format!(
            "{base}/organizations/o1/foodtruck/nodes/n1/tasks/status"
        ))
        .bearer_auth(NODES_KEY)
        .json(&json!({"job_id": job_id, "status": "success", "result": {"exit_code": 0}}))
        .send()
        .await
        .expect("status request failed");
    assert_eq!(status.status(), 200);

    let fetched = client
        .get(format!("{base}/admin/jobs/{job_id}?fetchStatuses=true"))
        .bearer_auth(ADMIN_KEY)
        .send()
        .await
        .expect("get job request failed");
    assert_eq!(fetched.status(), 200);
    let fetched_body: serde_json::Value = fetched.json().await.expect("invalid JSON");
    let statuses = fetched_body["statuses"].as_array().expect("statuses array");
    assert_eq!(statuses.len(), 1);
    assert_eq!(statuses[0]["status"], "success");
}

#[tokio::test]
async fn expired_window_never_returned_and_shows_as_expired() {
    let (base, _srv) = start_test_server().await;
    let client = reqwest::Client::new();

    let submit = client
        .post(format!("{base}/admin/jobs"))
        .bearer_auth(ADMIN_KEY)
        .json(&submission("o2", "n2", 1))
        .send()
        .await
        .expect("submit request failed");
    assert_eq!(submit.status(), 200);
    let body: serde_json::Value = submit.json().await.expect("invalid JSON");
    let job_id = body["id"].as_str().expect("id present").to_string();

    tokio::time::sleep(Duration::from_millis(1100)).await;

    let claimed = client
        .post(format!(
            "{base}/organizations/o2/foodtruck/nodes/n2/tasks/next"
        ))
        .bearer_auth(NODES_KEY)
        .send()
        .await
        .expect("claim request failed");
    assert_eq!(claimed.status(), 404);

    let fetched = client
        .get(format!("{base}/admin/jobs/{job_id}?fetchStatuses=true"))
        .bearer_auth(ADMIN_KEY)
        .send()
        .await
        .expect("get job request failed");
    let fetched_body: serde_json::Value = fetched.json().await.expect("invalid JSON");
    let statuses = fetched_body["statuses"].as_array().expect("statuses array");
    assert_eq!(statuses.len(), 1);
    assert_eq!(statuses[0]["status"], "expired");
}

#[tokio::test]
async fn fan_out_reaches_every_node_exactly_once() {
    let (base, _srv) = start_test_server().await;
    let client = reqwest::Client::new();

    let now = chrono::Utc::now();
    let body = json!({
        "nodes": [
            {"organization": "o1", "name": "n1"},
            {"organization": "o1", "name": "n2"},
            {"organization": "o2", "name": "n1"},
            {"organization": "o2", "name": "n2"},
            {"organization": "o3", "name": "n1"},
        ],
        "task": {
            "window_start": (now - chrono::Duration::minutes(1)).to_rfc3339(),
            "window_end": (now + chrono::Duration::hours(1)).to_rfc3339(),
            "provider": "example-provider",
            "spec": {},
        }
    });

    let submit = client
        .post(format!("{base}/admin/jobs"))
        .bearer_auth(ADMIN_KEY)
        .json(&body)
        .send()
        .await
        .expect("submit request failed");
    assert_eq!(submit.status(), 200);

    for (org, name) in [("o1", "n1"), ("o1", "n2"), ("o2", "n1"), ("o2", "n2"), ("o3", "n1")] {
        let claimed = client
            .post(format!(
                "{base}/organizations/{org}/foodtruck/nodes/{name}/tasks/next"
            ))
            .bearer_auth(NODES_KEY)
            .send()
            .await
            .expect("claim request failed");
        assert_eq!(claimed.status(), 200, "node {org}/{name} should have received the task");
    }

    let sixth = client
        .post(format!(
            "{base}/organizations/o9/foodtruck/nodes/unrelated/tasks/next"
        ))
        .bearer_auth(NODES_KEY)
        .send()
        .await
        .expect("claim request failed");
    assert_eq!(sixth.status(), 404);
}

#[tokio::test]
async fn validation_errors_surface_as_400() {
    let (base, _srv) = start_test_server().await;
    let client = reqwest::Client::new();

    let now = chrono::Utc::now();
    let bad = json!({
        "nodes": [{"organization": "o1", "name": "n1"}],
        "task": {
            "window_start": now.to_rfc3339(),
            "window_end": (now - chrono::Duration::hours(1)).to_rfc3339(),
            "provider": "p",
            "spec": {},
        }
    });

    let resp = client
        .post(format!("{base}/admin/jobs"))
        .bearer_auth(ADMIN_KEY)
        .json(&bad)
        .send()
        .await
        .expect("request failed");
    assert_eq!(resp.status(), 400);
    let body: serde_json::Value = resp.json().await.expect("invalid JSON");
    assert_eq!(body["message"], "window_end must be after window_start");

    let empty_nodes = json!({
        "nodes": [],
        "task": {
            "window_start": now.to_rfc3339(),
            "window_end": (now + chrono::Duration::hours(1)).to_rfc3339(),
            "provider": "p",
            "spec": {},
        }
    });
    let resp = client
        .post(format!("{base}/admin/jobs"))
        .bearer_auth(ADMIN_KEY)
        .json(&empty_nodes)
        .send()
        .await
        .expect("request failed");
    assert_eq!(resp.status(), 400);
}

#[tokio::test]
async fn auth_matrix() {
    let (base, _srv) = start_test_server().await;
    let client = reqwest::Client::new();

    // Node key on an admin route.
    let resp = client
        .get(format!("{base}/admin/jobs/whatever"))
        .bearer_auth(NODES_KEY)
        .send()
        .await
        .expect("request failed");
    assert_eq!(resp.status(), 401);
    let body: serde_json::Value = resp.json().await.expect("invalid JSON");
    assert_eq!(body["message"], "Unauthorized");

    // Admin key on a node route.
    let resp = client
        .post(format!(
            "{base}/organizations/o1/foodtruck/nodes/n1/tasks/next"
        ))
        .bearer_auth(ADMIN_KEY)
        .send()
        .await
        .expect("request failed");
    assert_eq!(resp.status(), 401);

    // Bogus key.
    let resp = client
        .get(format!("{base}/admin/jobs/whatever"))
        .bearer_auth("not-a-real-key")
        .send()
        .await
        .expect("request failed");
    assert_eq!(resp.status(), 401);

    // No key at all.
    let resp = client
        .get(format!("{base}/admin/jobs/whatever"))
        .send()
        .await
        .expect("request failed");
    assert_eq!(resp.status(), 401);

    // Correct key, unknown job id → 404.
    let resp = client
        .get(format!("{base}/admin/jobs/does-not-exist"))
        .bearer_auth(ADMIN_KEY)
        .send()
        .await
        .expect("request failed");
    assert_eq!(resp.status(), 404);
}
