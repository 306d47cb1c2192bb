use axum::{middleware, routing::get, Router};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::controllers::{health, idea::IdeaController};
use crate::infrastructure::db::DbPool;

pub mod request_id;
pub mod server;

pub use request_id::{request_id_middleware, X_REQUEST_ID};
pub use server::{ServerError, ServerHandle};

/// Build the routing table with every application route registered
pub fn build_router(pool: Arc<DbPool>, idea_controller: Arc<IdeaController>) -> Router {
    let idea_routes = Router::new()
        .route(
            "/api/ideas",
            get(IdeaController::list_ideas).post(IdeaController::create_idea),
        )
        .route(
            "/api/ideas/:ideaId",
            get(IdeaController::get_idea)
                .put(IdeaController::update_idea)
                .delete(IdeaController::delete_idea),
        )
        .with_state(idea_controller);

    Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::health_ready))
        .with_state(pool)
        .merge(idea_routes)
        .layer(middleware::from_fn(request_id_middleware))
        .layer(TraceLayer::new_for_http())
}
