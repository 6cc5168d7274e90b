use axum::routing::{get, post};
use axum::Router;

use crate::ServiceState;

pub mod create;
pub mod list;

// Re-export for convenience
pub use create::CreateRequest;

pub fn router(state: ServiceState) -> Router<ServiceState> {
    Router::new()
        .route("/", post(create::handler).get(list::handler))
        .route("/list", get(list::handler))
        .with_state(state)
}
