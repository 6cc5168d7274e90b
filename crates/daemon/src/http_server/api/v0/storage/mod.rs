use axum::routing::{get, post};
use axum::Router;

use crate::ServiceState;

pub mod fetch;
pub mod upload;

pub fn router(state: ServiceState) -> Router<ServiceState> {
    Router::new()
        .route("/", post(upload::handler))
        .route("/:cid", get(fetch::handler))
        .with_state(state)
}
