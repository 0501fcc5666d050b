pub mod app;
pub mod auth;
pub mod error;
pub mod handlers;

#[cfg(test)]
mod testing;

pub use app::router;
pub use error::ApiError;
