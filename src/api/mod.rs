//! JSON over HTTP.
//!
//! Every route is a thin wrapper around one [`TodoService`] operation.
//! Failures are returned as [`ServiceError`] bodies with a status code chosen
//! from the error kind.

mod error;
mod extract;
mod scheduled_tasks;
mod server;
mod system;
mod tasks;

pub use error::handle_panic;
pub use server::{bind, run_server, shutdown_signal};

use crate::service::TodoService;
use axum::{
    Router,
    routing::{get, post},
};
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Build the application router.
pub fn build_router(service: TodoService) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/health", get(system::health))
        .route("/api/system/info", get(system::info))
        .route("/api/tasks", get(tasks::list).post(tasks::create))
        .route(
            "/api/tasks/{id}",
            get(tasks::get).patch(tasks::update).delete(tasks::delete),
        )
        .route("/api/tasks/{id}/complete", post(tasks::complete))
        .route(
            "/api/scheduled-tasks",
            get(scheduled_tasks::list).post(scheduled_tasks::create),
        )
        .route(
            "/api/scheduled-tasks/{id}",
            get(scheduled_tasks::get)
                .patch(scheduled_tasks::update)
                .delete(scheduled_tasks::delete),
        )
        .with_state(service)
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
