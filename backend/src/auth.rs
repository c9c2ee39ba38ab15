//! Caller identity, as forwarded by the authentication proxy in front of us.

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use santa_core::Identity;

use crate::error::ServiceError;

pub const EMAIL_HEADER: &str = "x-user-email";
pub const NAME_HEADER: &str = "x-user-name";

/// The authenticated caller of a request.
#[derive(Debug, Clone)]
pub struct Caller(pub Identity);

#[async_trait]
impl<S> FromRequestParts<S> for Caller
where
    S: Send + Sync,
{
    type Rejection = ServiceError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header = |name: &str| {
            parts
                .headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };

        match (header(EMAIL_HEADER), header(NAME_HEADER)) {
            (Some(email), Some(name)) => Ok(Caller(Identity::new(email, name))),
            _ => Err(ServiceError::Unauthenticated),
        }
    }
}
