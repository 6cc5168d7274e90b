//! Request extractors for authenticated identity
//!
//! Session credentials travel as `Authorization: Bearer <credential>`.
//! Transport of the credential to the client (cookie, local storage, CLI
//! flag) is the client's concern; the server only ever sees the header.

use axum::extract::{FromRef, FromRequestParts};
use axum::response::{IntoResponse, Response};
use http::request::Parts;
use http::StatusCode;

use common::identity::Address;

use crate::ServiceState;

/// The verified identity of the caller; rejects with 401 when absent
#[derive(Debug, Clone, Copy)]
pub struct Identity(pub Address);

/// The caller's identity if a valid session accompanies the request
///
/// Never rejects; used by presence checks.
#[derive(Debug, Clone, Copy)]
pub struct MaybeIdentity(pub Option<Address>);

#[derive(Debug, thiserror::Error)]
#[error("Unauthorized")]
pub struct Unauthorized;

impl IntoResponse for Unauthorized {
    fn into_response(self) -> Response {
        (StatusCode::UNAUTHORIZED, "Unauthorized".to_string()).into_response()
    }
}

fn bearer_credential(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(http::header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

fn resolve_identity(parts: &Parts, state: &ServiceState) -> Option<Address> {
    let credential = bearer_credential(parts)?;
    state.sessions().resolve(credential).ok()
}

#[async_trait::async_trait]
impl<S> FromRequestParts<S> for Identity
where
    ServiceState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = Unauthorized;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let state = ServiceState::from_ref(state);
        resolve_identity(parts, &state)
            .map(Identity)
            .ok_or(Unauthorized)
    }
}

#[async_trait::async_trait]
impl<S> FromRequestParts<S> for MaybeIdentity
where
    ServiceState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let state = ServiceState::from_ref(state);
        Ok(MaybeIdentity(resolve_identity(parts, &state)))
    }
}
