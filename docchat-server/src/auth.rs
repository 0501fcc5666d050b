use axum::http::HeaderMap;
use axum::http::header::AUTHORIZATION;
use tracing::warn;

use docchat_core::{AuthenticatedUser, Data};
use docchat_utils::bearer::parse_bearer;

use crate::error::ApiError;

/// Resolve the caller from the `Authorization` header.
///
/// A missing or malformed header is rejected without contacting the identity
/// backend. Backend failures are treated the same as a rejected token.
pub async fn authenticate(data: &Data, headers: &HeaderMap) -> Result<AuthenticatedUser, ApiError> {
    let token = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(parse_bearer)
        .ok_or(ApiError::Unauthorized)?;

    match data.identity.verify(token).await {
        Ok(Some(user)) => Ok(user),
        Ok(None) => Err(ApiError::Unauthorized),
        Err(e) => {
            warn!(?e, "identity backend check failed");
            Err(ApiError::Unauthorized)
        }
    }
}
