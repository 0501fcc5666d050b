/// Authorization header helpers.
pub mod bearer;
/// Environment variable readers with defaults.
pub mod env;
/// Shared time helpers.
pub mod time;
