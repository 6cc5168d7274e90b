use axum::routing::{get, post};
use axum::Router;

use crate::ServiceState;

pub mod issue;
pub mod list;
pub mod revoke;
pub mod validate;

// Re-export for convenience
pub use issue::IssueRequest;
pub use revoke::RevokeRequest;
pub use validate::ValidateRequest;

/// Default token lifetime in minutes (24h), applied when the requested TTL
/// is absent or non-positive
pub const DEFAULT_TOKEN_TTL_MINUTES: i64 = 24 * 60;

/// Normalize a requested TTL to an effective one
pub(crate) fn effective_ttl_minutes(requested: Option<i64>) -> i64 {
    match requested {
        Some(minutes) if minutes > 0 => minutes,
        _ => DEFAULT_TOKEN_TTL_MINUTES,
    }
}

pub fn router(state: ServiceState) -> Router<ServiceState> {
    Router::new()
        .route("/", post(issue::handler).get(list::handler))
        .route("/list", get(list::handler))
        .route("/validate", post(validate::handler))
        .route("/revoke", post(revoke::handler))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_effective_ttl_defaults() {
        assert_eq!(effective_ttl_minutes(None), DEFAULT_TOKEN_TTL_MINUTES);
        assert_eq!(effective_ttl_minutes(Some(0)), DEFAULT_TOKEN_TTL_MINUTES);
        assert_eq!(effective_ttl_minutes(Some(-10)), DEFAULT_TOKEN_TTL_MINUTES);
        assert_eq!(effective_ttl_minutes(Some(15)), 15);
    }
}
