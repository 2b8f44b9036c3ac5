//! API tests: authentication, access scoping, validation, summary caching

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use secrecy::SecretString;
use serde_json::Value;
use tower::ServiceExt;

use portald::authn::{session::issue_session, AuthOptions};
use portald::cache::TtlCache;
use portald::github::{GitHubClient, GitHubOptions, SummaryOptions};
use portald::models::{Client, Deployment, HealthStatus, Platform, Project, Role, User};
use portald::monitor::{HealthChecker, MonitorOptions};
use portald::server::serve::build_router;
use portald::server::state::ServerState;
use portald::store::{MemoryStore, Store};

const TEST_SECRET: &str = "test-session-secret";

async fn seeded_store() -> Arc<MemoryStore> {
    let store = Arc::new(MemoryStore::new());

    store
        .insert_user(User {
            id: "u-admin".to_string(),
            email: "ops@example.com".to_string(),
            role: Role::Admin,
        })
        .await;
    store
        .insert_user(User {
            id: "u-client".to_string(),
            email: "client@example.com".to_string(),
            role: Role::Client,
        })
        .await;
    store
        .insert_user(User {
            id: "u-outsider".to_string(),
            email: "outsider@example.com".to_string(),
            role: Role::Client,
        })
        .await;

    store
        .insert_client(Client {
            id: "c-1".to_string(),
            name: "Acme".to_string(),
            user_id: "u-client".to_string(),
        })
        .await;
    store
        .insert_project(Project {
            id: "p-1".to_string(),
            name: "Storefront".to_string(),
            client_id: "c-1".to_string(),
        })
        .await;
    store
        .insert_deployment(Deployment {
            id: "d-1".to_string(),
            name: "web".to_string(),
            project_id: "p-1".to_string(),
            platform: Platform::Generic,
            service_id: None,
            health_endpoint: None,
            status: HealthStatus::Unknown,
            last_checked: None,
        })
        .await;

    store
}

fn router_for(store: Arc<MemoryStore>, github_url: &str) -> axum::Router {
    let checker =
        Arc::new(HealthChecker::new(store.clone(), MonitorOptions::default()).unwrap());
    // Zero raw-data TTL so upstream call counts stay deterministic; the
    // raw cache itself is covered in test_github.rs.
    let github = Arc::new(
        GitHubClient::new(GitHubOptions {
            api_url: github_url.to_string(),
            token: None,
            cache_ttl: Duration::ZERO,
        })
        .unwrap(),
    );
    let summaries = Arc::new(TtlCache::new(Duration::from_secs(1800)));

    let state = Arc::new(ServerState::new(
        store,
        checker,
        github,
        summaries,
        SummaryOptions::default(),
        AuthOptions {
            session_secret: SecretString::from(TEST_SECRET),
        },
        reqwest::Client::new(),
    ));

    build_router(state)
}

async fn test_router() -> axum::Router {
    router_for(seeded_store().await, "http://127.0.0.1:9")
}

fn bearer(user_id: &str) -> String {
    let token = issue_session(&SecretString::from(TEST_SECRET), user_id, 3600).unwrap();
    format!("Bearer {}", token)
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_meta_routes_need_no_auth() {
    let router = test_router().await;

    let response = router
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["service"], "portald");
}

#[tokio::test]
async fn test_monitoring_requires_a_session() {
    let router = test_router().await;

    let response = router
        .oneshot(
            Request::get("/monitoring/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_garbage_token_is_unauthorized() {
    let router = test_router().await;

    let response = router
        .oneshot(
            Request::get("/monitoring/health")
                .header(header::AUTHORIZATION, "Bearer not-a-jwt")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_unknown_project_is_404_regardless_of_role() {
    for user in ["u-admin", "u-outsider"] {
        let router = test_router().await;
        let response = router
            .oneshot(
                Request::get("/monitoring/health?projectId=missing")
                    .header(header::AUTHORIZATION, bearer(user))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND, "role {}", user);
    }
}

#[tokio::test]
async fn test_foreign_project_is_forbidden_for_non_admins() {
    let router = test_router().await;

    let response = router
        .oneshot(
            Request::get("/monitoring/health?projectId=p-1")
                .header(header::AUTHORIZATION, bearer("u-outsider"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_admin_sees_any_project() {
    let router = test_router().await;

    let response = router
        .oneshot(
            Request::get("/monitoring/health?projectId=p-1")
                .header(header::AUTHORIZATION, bearer("u-admin"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["projectId"], "p-1");
    assert_eq!(body["data"]["deployments"][0]["status"], "unknown");
}

#[tokio::test]
async fn test_owner_sees_their_project_health() {
    let router = test_router().await;

    let response = router
        .oneshot(
            Request::get("/monitoring/health?projectId=p-1")
                .header(header::AUTHORIZATION, bearer("u-client"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["projectName"], "Storefront");
    // Every configured deployment gets some status, never a blank
    assert_eq!(
        body["data"]["deployments"][0]["error"],
        "No health check method configured"
    );
}

#[tokio::test]
async fn test_health_without_project_id_scopes_by_role() {
    let router = test_router().await;
    let response = router
        .oneshot(
            Request::get("/monitoring/health")
                .header(header::AUTHORIZATION, bearer("u-outsider"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"], serde_json::json!([]));

    let router = test_router().await;
    let response = router
        .oneshot(
            Request::get("/monitoring/health")
                .header(header::AUTHORIZATION, bearer("u-admin"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    let body = body_json(response).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
}

fn check_request(auth: &str, body: &str) -> Request<Body> {
    Request::post("/monitoring/check")
        .header(header::AUTHORIZATION, auth)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn test_force_check_requires_exactly_one_target() {
    let router = test_router().await;
    let response = router
        .oneshot(check_request(&bearer("u-client"), "{}"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let router = test_router().await;
    let response = router
        .oneshot(check_request(
            &bearer("u-client"),
            r#"{"deploymentId": "d-1", "projectId": "p-1"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_force_check_persists_the_fresh_result() {
    let store = seeded_store().await;
    let router = router_for(store.clone(), "http://127.0.0.1:9");

    let response = router
        .oneshot(check_request(
            &bearer("u-client"),
            r#"{"deploymentId": "d-1"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["status"], "unknown");

    let record = store.deployment("d-1").await.unwrap().unwrap();
    assert!(record.last_checked.is_some());
}

#[tokio::test]
async fn test_force_check_on_unknown_deployment_is_404() {
    let router = test_router().await;
    let response = router
        .oneshot(check_request(
            &bearer("u-admin"),
            r#"{"deploymentId": "missing"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_force_check_on_foreign_deployment_is_403() {
    let router = test_router().await;
    let response = router
        .oneshot(check_request(
            &bearer("u-outsider"),
            r#"{"deploymentId": "d-1"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_github_commits_validation() {
    let router = test_router().await;
    let response = router
        .oneshot(
            Request::get("/github/commits?owner=acme")
                .header(header::AUTHORIZATION, bearer("u-client"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let router = test_router().await;
    let response = router
        .oneshot(
            Request::get("/github/commits?owner=acme&repo=api&limit=0")
                .header(header::AUTHORIZATION, bearer("u-client"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let router = test_router().await;
    let response = router
        .oneshot(
            Request::get("/github/commits?owner=acme&repo=api&limit=101")
                .header(header::AUTHORIZATION, bearer("u-client"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

const REPO_BODY: &str = r#"{
  "name": "api",
  "full_name": "acme/api",
  "description": "Storefront API",
  "language": "TypeScript",
  "stargazers_count": 12,
  "forks_count": 3,
  "open_issues_count": 4,
  "pushed_at": "2025-01-02T00:00:00Z",
  "topics": ["commerce"],
  "html_url": "https://github.example/acme/api"
}"#;

const SUMMARY_COMMITS_BODY: &str = r#"[
  {
    "sha": "abc123",
    "commit": {
      "message": "Add checkout flow",
      "author": { "name": "Jess Dev", "email": "jess@example.com", "date": "2025-01-02T10:00:00Z" }
    },
    "author": { "login": "jessdev", "avatar_url": null },
    "html_url": "https://github.example/acme/api/commit/abc123"
  }
]"#;

#[tokio::test]
async fn test_summary_is_cached_until_refresh() {
    let mut server = mockito::Server::new_async().await;

    // Two fetch rounds expected: the initial miss and the forced refresh.
    // The in-between call must be served from the summary cache.
    let repo_mock = server
        .mock("GET", "/repos/acme/api")
        .match_query(mockito::Matcher::Any)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(REPO_BODY)
        .expect(2)
        .create_async()
        .await;
    let commits_mock = server
        .mock("GET", "/repos/acme/api/commits")
        .match_query(mockito::Matcher::Any)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(SUMMARY_COMMITS_BODY)
        .expect(2)
        .create_async()
        .await;
    let issues_mock = server
        .mock("GET", "/repos/acme/api/issues")
        .match_query(mockito::Matcher::Any)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body("[]")
        .expect(2)
        .create_async()
        .await;
    server
        .mock("GET", mockito::Matcher::Regex(r"^/repos/acme/api/contents/.*$".to_string()))
        .match_query(mockito::Matcher::Any)
        .with_status(404)
        .create_async()
        .await;

    let store = seeded_store().await;
    let router = router_for(store, &server.url());

    let request = |refresh: bool| {
        let uri = if refresh {
            "/github/summary?owner=acme&repo=api&refresh=true"
        } else {
            "/github/summary?owner=acme&repo=api"
        };
        Request::get(uri)
            .header(header::AUTHORIZATION, bearer("u-client"))
            .body(Body::empty())
            .unwrap()
    };

    let response = router.clone().oneshot(request(false)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["cached"], false);
    assert!(body["summary"]["recentActivity"]
        .as_str()
        .unwrap()
        .contains("Add checkout flow"));

    let response = router.clone().oneshot(request(false)).await.unwrap();
    let body = body_json(response).await;
    assert_eq!(body["cached"], true);

    let response = router.clone().oneshot(request(true)).await.unwrap();
    let body = body_json(response).await;
    assert_eq!(body["cached"], false);

    repo_mock.assert_async().await;
    commits_mock.assert_async().await;
    issues_mock.assert_async().await;
}
