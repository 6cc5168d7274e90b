use axum::routing::get;
use axum::Router;

pub mod auth;
pub mod csrf;
pub mod files;
pub mod storage;
pub mod tokens;

use crate::ServiceState;

pub fn router(state: ServiceState) -> Router<ServiceState> {
    Router::new()
        .nest("/auth", auth::router(state.clone()))
        .nest("/files", files::router(state.clone()))
        .nest("/tokens", tokens::router(state.clone()))
        .nest("/storage", storage::router(state.clone()))
        .route("/csrf", get(csrf::handler))
        .with_state(state)
}
