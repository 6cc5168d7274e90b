use axum::routing::{get, post};
use axum::Router;

use crate::ServiceState;

pub mod me;
pub mod start;
pub mod verify;

// Re-export for convenience
pub use start::StartRequest;
pub use verify::VerifyRequest;

pub fn router(state: ServiceState) -> Router<ServiceState> {
    Router::new()
        .route("/start", post(start::handler))
        .route("/verify", post(verify::handler))
        .route("/me", get(me::handler))
        .with_state(state)
}
