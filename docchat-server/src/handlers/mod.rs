pub mod chat;
pub mod health;
pub mod history;
pub mod pdf;

use crate::error::ApiError;

/// Fallback for any method a route does not accept.
pub async fn method_not_allowed() -> ApiError {
    ApiError::MethodNotAllowed
}
