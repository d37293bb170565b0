//! Roomcast Web Server
//!
//! Axum routes the delivery server and browser clients call: subscription
//! checks, session info, pending tasks and an internal publish hook.

pub mod error;
pub mod routes;
pub mod state;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

pub use state::AppState;

/// Create the application router.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let method_routes = Router::new()
        .route(
            "/get_pending_tasks_for_doc",
            get(routes::method::get_pending_tasks_for_doc),
        )
        .route("/can_subscribe_doc", get(routes::method::can_subscribe_doc))
        .route("/get_user_info", get(routes::method::get_user_info));

    Router::new()
        .nest("/api/method", method_routes)
        .route("/internal/publish", post(routes::internal::publish))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Run the web server.
pub async fn run_server(state: AppState, host: &str, port: u16) -> anyhow::Result<()> {
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(format!("{}:{}", host, port)).await?;
    tracing::info!("Web server listening on http://{}:{}", host, port);

    axum::serve(listener, app).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use roomcast_core::permission::{StaticPermissions, UserPermissions};
    use async_trait::async_trait;
    use roomcast_core::session::MemorySessionStore;
    use roomcast_core::{
        MemoryBroker, Publisher, RealtimeError, RealtimeResult, SessionData, SessionStore,
        SubscriptionGuard, EVENTS_CHANNEL,
    };
    use roomcast_db::{migrations::run_migrations, tasks, DbPool};
    use serde_json::{json, Value};
    use std::collections::HashMap;
    use std::sync::Arc;
    use tower::ServiceExt;

    struct Harness {
        router: Router,
        broker: Arc<MemoryBroker>,
        db: DbPool,
    }

    fn harness(ci_bypass: bool) -> Harness {
        let broker = Arc::new(MemoryBroker::new());
        let sessions = Arc::new(MemorySessionStore::new());
        sessions.insert("jane-sid", "jane@example.com").unwrap();
        sessions.insert("admin-sid", "Administrator").unwrap();

        let mut users = HashMap::new();
        users.insert(
            "jane@example.com".to_string(),
            UserPermissions {
                read: vec!["ToDo".to_string()],
                ..Default::default()
            },
        );
        let guard = SubscriptionGuard::new(Arc::new(StaticPermissions::new(users)))
            .with_ci_bypass(ci_bypass);

        let db = DbPool::in_memory().unwrap();
        run_migrations(&db).unwrap();

        let state = AppState::new(
            "site1",
            Publisher::new(broker.clone()),
            sessions,
            guard,
            Arc::new(db.clone()),
        );
        Harness {
            router: create_router(state),
            broker,
            db,
        }
    }

    async fn call(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    fn get(uri: &str, sid: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().uri(uri);
        if let Some(sid) = sid {
            builder = builder.header("cookie", format!("sid={}", sid));
        }
        builder.body(Body::empty()).unwrap()
    }

    fn post_json(uri: &str, sid: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .header(state::SESSION_HEADER, sid)
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_get_user_info() {
        let h = harness(false);

        let (status, body) = call(&h.router, get("/api/method/get_user_info", Some("jane-sid"))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"message": {"user": "jane@example.com"}}));

        let (_, body) = call(&h.router, get("/api/method/get_user_info", None)).await;
        assert_eq!(body, json!({"message": {"user": "Guest"}}));
    }

    #[tokio::test]
    async fn test_can_subscribe_doc() {
        let h = harness(false);

        let (status, body) = call(
            &h.router,
            get("/api/method/can_subscribe_doc?doctype=ToDo&docname=TD-1", Some("jane-sid")),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"message": true}));

        let (status, body) = call(
            &h.router,
            get("/api/method/can_subscribe_doc?doctype=Invoice&docname=INV-1", Some("jane-sid")),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["exc_type"], json!("PermissionError"));
    }

    #[tokio::test]
    async fn test_can_subscribe_doc_ci_bypass() {
        let h = harness(true);

        let (status, body) = call(
            &h.router,
            get("/api/method/can_subscribe_doc?doctype=Invoice&docname=INV-1", None),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"message": true}));
    }

    struct UnreachableSessions;

    #[async_trait]
    impl SessionStore for UnreachableSessions {
        async fn get_session(&self, _sid: &str) -> RealtimeResult<Option<SessionData>> {
            Err(RealtimeError::Session("redis cache unreachable".to_string()))
        }
    }

    fn unreachable_sessions_router(ci_bypass: bool) -> Router {
        let guard = SubscriptionGuard::new(Arc::new(StaticPermissions::default()))
            .with_ci_bypass(ci_bypass);
        let db = DbPool::in_memory().unwrap();
        run_migrations(&db).unwrap();
        create_router(AppState::new(
            "site1",
            Publisher::new(Arc::new(MemoryBroker::new())),
            Arc::new(UnreachableSessions),
            guard,
            Arc::new(db),
        ))
    }

    #[tokio::test]
    async fn test_ci_bypass_does_not_resume_session() {
        let router = unreachable_sessions_router(true);

        let (status, body) = call(
            &router,
            get("/api/method/can_subscribe_doc?doctype=ToDo&docname=T1", Some("abc")),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"message": true}));
    }

    #[tokio::test]
    async fn test_session_store_failure_without_bypass() {
        let router = unreachable_sessions_router(false);

        let (status, _) = call(
            &router,
            get("/api/method/can_subscribe_doc?doctype=ToDo&docname=T1", Some("abc")),
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_pending_tasks_for_doc() {
        let h = harness(false);
        let task = tasks::create_task(&h.db, Some("ToDo"), Some("TD-1")).unwrap();

        let (status, body) = call(
            &h.router,
            get("/api/method/get_pending_tasks_for_doc?doctype=ToDo&docname=TD-1", Some("jane-sid")),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"message": [task.name]}));
    }

    #[tokio::test]
    async fn test_pending_tasks_requires_login() {
        let h = harness(false);

        let (status, _) = call(
            &h.router,
            get("/api/method/get_pending_tasks_for_doc?doctype=ToDo&docname=TD-1", None),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_internal_publish_routes_and_publishes() {
        let h = harness(false);

        let (status, body) = call(
            &h.router,
            post_json(
                "/internal/publish",
                "admin-sid",
                json!({"event": "list_update", "doctype": "ToDo", "docname": "TD-1"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::ACCEPTED);
        assert_eq!(body["message"]["dispatch"], json!("sent"));
        assert_eq!(
            h.broker.payloads(EVENTS_CHANNEL),
            vec![json!({"event": "list_update", "message": {}, "room": "site1:doc:ToDo/TD-1"})]
        );
    }

    #[tokio::test]
    async fn test_internal_publish_flushes_deferred_on_completion() {
        let h = harness(false);

        let (_, body) = call(
            &h.router,
            post_json(
                "/internal/publish",
                "admin-sid",
                json!({"event": "doc_update", "user": "jane@example.com", "after_commit": true}),
            ),
        )
        .await;
        assert_eq!(body["message"]["dispatch"], json!("deferred"));
        assert_eq!(body["message"]["flushed"], json!(1));
        assert_eq!(h.broker.published().len(), 1);
    }

    #[tokio::test]
    async fn test_internal_publish_requires_administrator() {
        let h = harness(false);

        let (status, _) = call(
            &h.router,
            post_json("/internal/publish", "jane-sid", json!({"event": "x"})),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert!(h.broker.published().is_empty());
    }
}
