//! HTTP surface tests, driving the router directly with `oneshot`.

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Method, Request, StatusCode, header};
use axum::routing::get;
use serde_json::{Value, json};
use std::sync::Arc;
use todo_service::api::{build_router, handle_panic};
use todo_service::db::Database;
use todo_service::scheduler::{LoopTiming, ScheduleRegistry};
use todo_service::service::TodoService;
use tower::ServiceExt;
use tower_http::catch_panic::CatchPanicLayer;

fn setup() -> (Router, Arc<ScheduleRegistry>) {
    let db = Arc::new(Database::open_in_memory().expect("Failed to create in-memory database"));
    let registry = Arc::new(ScheduleRegistry::new(Arc::clone(&db), LoopTiming::default()));
    let service = TodoService::new(db, Arc::clone(&registry), false);
    (build_router(service), registry)
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn create_task(app: &Router, title: &str, parent: &str) -> String {
    let (status, body) = send(
        app,
        Method::POST,
        "/api/tasks",
        Some(json!({"title": title, "parent": parent})),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    body["id"].as_str().unwrap().to_string()
}

mod system_tests {
    use super::*;

    async fn explode() -> &'static str {
        panic!("database password is hunter2")
    }

    #[tokio::test]
    async fn health_reports_version() {
        let (app, _registry) = setup();
        let (status, body) = send(&app, Method::GET, "/api/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
    }

    #[tokio::test]
    async fn system_info() {
        let (app, _registry) = setup();
        let (status, body) = send(&app, Method::GET, "/api/system/info", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
        assert!(body["commit"].is_string());
        assert_eq!(body["dev_mode_enabled"], false);
    }

    #[tokio::test]
    async fn panicking_handler_returns_generic_500() {
        let app = Router::new()
            .route("/boom", get(explode))
            .layer(CatchPanicLayer::custom(handle_panic));

        let (status, body) = send(&app, Method::GET, "/boom", None).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["code"], "INTERNAL_ERROR");
        assert!(body["correlation_id"].is_string());
        assert!(!body.to_string().contains("hunter2"));
    }
}

mod task_tests {
    use super::*;

    #[tokio::test]
    async fn task_lifecycle() {
        let (app, _registry) = setup();
        let id = create_task(&app, "Write report", "").await;

        let (status, body) = send(&app, Method::GET, &format!("/api/tasks/{}", id), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["task"]["title"], "Write report");
        assert_eq!(body["task"]["state"], "UNRESOLVED");
        assert_eq!(body["task"]["modified"], 0);

        let (status, body) = send(
            &app,
            Method::PATCH,
            &format!("/api/tasks/{}", id),
            Some(json!({"description": "due friday", "state": "COMPLETED"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({}));

        let (_, body) = send(&app, Method::GET, &format!("/api/tasks/{}", id), None).await;
        assert_eq!(body["task"]["description"], "due friday");
        assert_eq!(body["task"]["state"], "COMPLETED");
        assert!(body["task"]["modified"].as_i64().unwrap() > 0);

        let (status, body) =
            send(&app, Method::DELETE, &format!("/api/tasks/{}", id), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"ids": [id]}));

        let (status, body) = send(&app, Method::GET, &format!("/api/tasks/{}", id), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], "TASK_NOT_FOUND");
    }

    #[tokio::test]
    async fn create_without_title_is_bad_request() {
        let (app, _registry) = setup();
        let (status, body) = send(&app, Method::POST, "/api/tasks", Some(json!({}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "MISSING_REQUIRED_FIELD");
        assert_eq!(body["field"], "title");
    }

    #[tokio::test]
    async fn malformed_body_and_query_are_json_errors() {
        let (app, _registry) = setup();

        let request = Request::builder()
            .method(Method::POST)
            .uri("/api/tasks")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["code"], "INVALID_FIELD_VALUE");
        assert_eq!(body["field"], "body");

        let (status, body) = send(&app, Method::GET, "/api/tasks?limit=lots", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "INVALID_FIELD_VALUE");
        assert_eq!(body["field"], "query");
    }

    #[tokio::test]
    async fn complete_and_delete_cascade() {
        let (app, _registry) = setup();
        let root = create_task(&app, "Move house", "").await;
        let child = create_task(&app, "Pack books", &root).await;
        let grandchild = create_task(&app, "Buy boxes", &child).await;

        let (status, body) = send(
            &app,
            Method::POST,
            &format!("/api/tasks/{}/complete", root),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"ids": [root, child, grandchild]}));

        let (_, body) = send(&app, Method::GET, "/api/tasks?exclude_completed=true", None).await;
        assert_eq!(body, json!({"tasks": []}));

        let (_, body) = send(&app, Method::DELETE, &format!("/api/tasks/{}", root), None).await;
        assert_eq!(body["ids"].as_array().unwrap().len(), 3);

        let (_, body) = send(&app, Method::GET, "/api/tasks", None).await;
        assert_eq!(body, json!({"tasks": []}));
    }

    #[tokio::test]
    async fn parent_cycle_is_bad_request() {
        let (app, _registry) = setup();
        let parent = create_task(&app, "Parent", "").await;
        let child = create_task(&app, "Child", &parent).await;

        let (status, body) = send(
            &app,
            Method::PATCH,
            &format!("/api/tasks/{}", parent),
            Some(json!({"parent": child})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "PARENT_CYCLE");
    }

    #[tokio::test]
    async fn list_pages() {
        let (app, _registry) = setup();
        for i in 0..5 {
            create_task(&app, &format!("Task {}", i), "").await;
        }

        let (_, body) = send(&app, Method::GET, "/api/tasks?offset=1&limit=2", None).await;
        assert_eq!(body["tasks"].as_array().unwrap().len(), 2);

        let (_, body) = send(&app, Method::GET, "/api/tasks?limit=100000", None).await;
        assert_eq!(body["tasks"].as_array().unwrap().len(), 5);
    }
}

mod scheduled_task_tests {
    use super::*;

    #[tokio::test]
    async fn scheduled_task_lifecycle() {
        let (app, registry) = setup();

        let (status, body) = send(
            &app,
            Method::POST,
            "/api/scheduled-tasks",
            Some(json!({"title": "Take out bins", "expression": "0 7 * * 1"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let id = body["id"].as_str().unwrap().to_string();
        assert!(registry.is_active(&id));

        let (status, body) = send(
            &app,
            Method::PATCH,
            &format!("/api/scheduled-tasks/{}", id),
            Some(json!({"expression": "0 7 * * 2"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({}));

        let (_, body) = send(
            &app,
            Method::GET,
            &format!("/api/scheduled-tasks/{}", id),
            None,
        )
        .await;
        assert_eq!(body["scheduled_task"]["expression"], "0 7 * * 2");
        assert_eq!(body["scheduled_task"]["title"], "Take out bins");

        let (_, body) = send(&app, Method::GET, "/api/scheduled-tasks", None).await;
        assert_eq!(body["scheduled_tasks"].as_array().unwrap().len(), 1);

        let (status, body) = send(
            &app,
            Method::DELETE,
            &format!("/api/scheduled-tasks/{}", id),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"id": id}));
        assert!(!registry.is_active(&id));

        let (status, body) = send(
            &app,
            Method::DELETE,
            &format!("/api/scheduled-tasks/{}", id),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], "SCHEDULED_TASK_NOT_FOUND");
    }

    #[tokio::test]
    async fn invalid_expression_is_bad_request() {
        let (app, registry) = setup();
        let (status, body) = send(
            &app,
            Method::POST,
            "/api/scheduled-tasks",
            Some(json!({"title": "Broken", "expression": "whenever"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "INVALID_EXPRESSION");
        assert!(registry.active_ids().is_empty());
    }

    #[tokio::test]
    async fn missing_parent_is_not_found() {
        let (app, registry) = setup();
        let (status, body) = send(
            &app,
            Method::POST,
            "/api/scheduled-tasks",
            Some(json!({"title": "Orphan", "parent": "ghost000", "expression": "* * * * *"})),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], "TASK_NOT_FOUND");
        assert_eq!(body["field"], "parent");
        assert!(registry.active_ids().is_empty());
    }

    #[tokio::test]
    async fn get_unknown_is_not_found() {
        let (app, _registry) = setup();
        let (status, body) = send(&app, Method::GET, "/api/scheduled-tasks/nope0000", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], "SCHEDULED_TASK_NOT_FOUND");
    }
}
