//! # Actix Middleware Library
//!
//! Middleware shared by Agora's actix services
//!
//! ## Modules
//! - `jwt_auth`: cookie-session JWT authentication + `UserId` extractor
//! - `logging`: structured request/response logging

pub mod jwt_auth;
pub mod logging;

pub use jwt_auth::{JwtAuthMiddleware, UserId, ACCESS_TOKEN_COOKIE, REFRESH_TOKEN_COOKIE};
pub use logging::Logging;
