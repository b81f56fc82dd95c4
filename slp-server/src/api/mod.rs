//! HTTP API handlers for slp-server

pub mod auth;
pub mod cache;
pub mod chat;
pub mod courses;
pub mod generate;
pub mod health;

pub use auth::{auth_middleware, auth_routes, session_routes};
pub use cache::cache_routes;
pub use chat::chat_routes;
pub use courses::course_routes;
pub use generate::generate_routes;
pub use health::health_routes;
