//! Client side of docchat: the chat interface state machine, the auth gate,
//! and HTTP transports for the server and the identity backend.

pub mod api;
pub mod auth;
pub mod chat;
pub mod gate;
pub mod message;

pub use api::{ChatApi, HttpChatApi};
pub use auth::{AuthClient, Session, SessionStore, SupabaseAuth};
pub use chat::{ChatInterface, Phase};
pub use gate::{AuthGate, Route};
pub use message::{Message, Role};
