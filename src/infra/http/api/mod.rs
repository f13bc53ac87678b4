pub mod error;
pub mod handlers;
pub mod models;
pub mod state;

pub use state::ApiState;

use axum::{Router, routing::get};

pub fn build_api_router(state: ApiState) -> Router {
    Router::new()
        .route(
            "/activity-groups",
            get(handlers::list_activities).post(handlers::create_activity),
        )
        .route(
            "/activity-groups/{id}",
            get(handlers::get_activity)
                .patch(handlers::update_activity)
                .delete(handlers::delete_activity),
        )
        .route(
            "/todo-items",
            get(handlers::list_todos).post(handlers::create_todo),
        )
        .route(
            "/todo-items/{id}",
            get(handlers::get_todo)
                .patch(handlers::update_todo)
                .delete(handlers::delete_todo),
        )
        .with_state(state)
}
