use axum::http::StatusCode;
use axum::routing::get;
use axum::Router;

use crate::ServiceState;

mod readiness;
mod version;

async fn livez() -> StatusCode {
    StatusCode::OK
}

pub fn router(state: ServiceState) -> Router<ServiceState> {
    Router::new()
        .route("/livez", get(livez))
        .route("/readyz", get(readiness::handler))
        .route("/versionz", get(version::handler))
        .with_state(state)
}
