use std::sync::Arc;

use chrono::Duration;
use reqwest::StatusCode;
use serde_json::json;

use coursedesk_api::app::{self, AppServices};
use coursedesk_auth::{Action, Grant, GrantFlags, PermissionGroup, UrlPath, UserAccount};
use coursedesk_core::{GroupId, UserId};
use coursedesk_infra::seed::{SeedReport, seed_demo};

struct TestServer {
    base_url: String,
    services: Arc<AppServices>,
    seed: SeedReport,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn() -> Self {
        // Same router as prod, over seeded in-memory stores, on an ephemeral port.
        let services = Arc::new(AppServices::in_memory(true).expect("services"));
        let seed = seed_demo(&services.stores).await.expect("seed");
        let app = app::router(services.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url,
            services,
            seed,
            handle,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn admin_token(&self) -> &str {
        &self.seed.admin.credential.token
    }

    fn instructor_token(&self) -> &str {
        &self.seed.instructor.credential.token
    }

    async fn node_id(&self, path: &str) -> String {
        self.services
            .stores
            .resources
            .node_by_path(&UrlPath::new(path).unwrap())
            .await
            .unwrap()
            .unwrap()
            .id
            .to_string()
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn can(client: &reqwest::Client, srv: &TestServer, token: &str, operation: &str, action: &str) -> bool {
    let res = client
        .post(srv.url("/authorize"))
        .bearer_auth(token)
        .json(&json!({ "operation": operation, "action": action }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    body["allowed"].as_bool().unwrap()
}

#[tokio::test]
async fn health_is_public() {
    let srv = TestServer::spawn().await;
    let res = reqwest::get(srv.url("/health")).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn auth_required_for_protected_endpoints() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = client.get(srv.url("/whoami")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = client
        .get(srv.url("/whoami"))
        .bearer_auth("not-a-real-token")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn identity_is_derived_from_credential() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = client
        .get(srv.url("/whoami"))
        .bearer_auth(srv.instructor_token())
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(
        body["user_id"].as_str().unwrap(),
        srv.seed.instructor.user_id.to_string()
    );
}

#[tokio::test]
async fn whoami_rejects_an_inactive_account_and_revokes_its_credential() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    // Imported stale row: inactive, yet its credential was never revoked.
    let stale = UserAccount::new(UserId::new(), "stale import", Some(srv.seed.instructor.group_id)).deactivated();
    let stale_id = stale.id;
    srv.services.admin.register_user(stale).await.unwrap();
    let issued = srv
        .services
        .stores
        .credentials
        .issue(stale_id, Duration::hours(1))
        .await
        .unwrap();

    let res = client
        .get(srv.url("/whoami"))
        .bearer_auth(&issued.token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let credential = srv
        .services
        .stores
        .credentials
        .credential(issued.credential.id)
        .await
        .unwrap()
        .unwrap();
    assert!(credential.revoked_at.is_some());
}

#[tokio::test]
async fn authorize_mirrors_the_grant_matrix() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let token = srv.instructor_token();

    assert!(can(&client, &srv, token, "courses.update", "edit").await);
    assert!(can(&client, &srv, token, "courses.index", "view").await);
    assert!(!can(&client, &srv, token, "courses.destroy", "delete").await);
    assert!(!can(&client, &srv, token, "ledger.index", "view").await);
    assert!(!can(&client, &srv, token, "no.such.operation", "view").await);

    let res = client
        .post(srv.url("/authorize"))
        .bearer_auth(token)
        .json(&json!({ "operation": "courses.index", "action": "approve" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn navigation_keeps_grouping_ancestors() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = client
        .get(srv.url("/navigation"))
        .bearer_auth(srv.instructor_token())
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let body: serde_json::Value = res.json().await.unwrap();
    let items = body["items"].as_array().unwrap();
    let paths: Vec<&str> = items.iter().map(|i| i["url_path"].as_str().unwrap()).collect();
    assert_eq!(paths, vec!["dashboard", "academic"]);

    let academic = &items[1];
    assert_eq!(academic["clickable"], false);
    let children: Vec<&str> = academic["children"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["url_path"].as_str().unwrap())
        .collect();
    assert_eq!(children, vec!["academic/courses", "academic/classes", "academic/students"]);
}

#[tokio::test]
async fn admin_endpoints_are_forbidden_without_grant() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = client
        .post(srv.url(&format!("/admin/users/{}/deactivate", srv.seed.admin.user_id)))
        .bearer_auth(srv.instructor_token())
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body, json!({ "error": "forbidden", "message": "forbidden" }));
}

#[tokio::test]
async fn grant_changes_apply_to_the_next_request() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let token = srv.instructor_token();
    let ledger = srv.node_id("financial/ledger").await;

    assert!(!can(&client, &srv, token, "ledger.index", "view").await);

    let res = client
        .put(srv.url("/admin/grants"))
        .bearer_auth(srv.admin_token())
        .json(&json!({
            "resource_id": ledger,
            "group_id": srv.seed.instructor.group_id.to_string(),
            "can_view": true,
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert!(can(&client, &srv, token, "ledger.index", "view").await);
    assert!(!can(&client, &srv, token, "ledger.entries.store", "create").await);

    let res = client
        .delete(srv.url(&format!(
            "/admin/grants/{}/{}",
            ledger, srv.seed.instructor.group_id
        )))
        .bearer_auth(srv.admin_token())
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NO_CONTENT);
    assert!(!can(&client, &srv, token, "ledger.index", "view").await);
}

#[tokio::test]
async fn set_grant_for_unknown_group_is_a_bad_request() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = client
        .put(srv.url("/admin/grants"))
        .bearer_auth(srv.admin_token())
        .json(&json!({
            "resource_id": srv.node_id("dashboard").await,
            "group_id": GroupId::new().to_string(),
            "can_view": true,
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn deactivation_locks_out_every_session_immediately() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let instructor = srv.seed.instructor.user_id;
    let second = srv
        .services
        .stores
        .credentials
        .issue(instructor, Duration::hours(1))
        .await
        .unwrap();

    let res = client
        .post(srv.url(&format!("/admin/users/{}/deactivate", instructor)))
        .bearer_auth(srv.admin_token())
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["credentials_revoked"], 2);

    for token in [srv.instructor_token(), second.token.as_str()] {
        let res = client
            .get(srv.url("/whoami"))
            .bearer_auth(token)
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }
}

#[tokio::test]
async fn admin_cannot_delete_a_group_in_use_or_a_node_with_children() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = client
        .delete(srv.url(&format!("/admin/groups/{}", srv.seed.instructor.group_id)))
        .bearer_auth(srv.admin_token())
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CONFLICT);

    let res = client
        .delete(srv.url(&format!("/admin/resources/{}", srv.node_id("academic").await)))
        .bearer_auth(srv.admin_token())
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn deleting_an_unused_group_drops_its_grants() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let admin = &srv.services.admin;

    let auditors = PermissionGroup::new(GroupId::new(), "auditors");
    let auditors_id = auditors.id;
    admin.register_group(auditors).await.unwrap();
    for path in ["reports/financial", "reports/academic"] {
        let node = srv
            .services
            .stores
            .resources
            .node_by_path(&UrlPath::new(path).unwrap())
            .await
            .unwrap()
            .unwrap();
        admin
            .set_grant(Grant {
                resource_id: node.id,
                group_id: auditors_id,
                flags: GrantFlags::only(&[Action::View]),
            })
            .await
            .unwrap();
    }

    let res = client
        .delete(srv.url(&format!("/admin/groups/{}", auditors_id)))
        .bearer_auth(srv.admin_token())
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["grants_dropped"], 2);
}

#[tokio::test]
async fn user_without_group_sees_nothing_and_may_do_nothing() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let user = UserAccount::new(UserId::new(), "unassigned", None);
    let user_id = user.id;
    srv.services.admin.register_user(user).await.unwrap();
    let issued = srv
        .services
        .stores
        .credentials
        .issue(user_id, Duration::hours(1))
        .await
        .unwrap();

    let res = client
        .get(srv.url("/navigation"))
        .bearer_auth(&issued.token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert!(body["items"].as_array().unwrap().is_empty());

    assert!(!can(&client, &srv, &issued.token, "dashboard.index", "view").await);
}
