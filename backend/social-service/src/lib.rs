//! Agora social service: accounts, posts, follows, likes, comments, reshares
//! and the notification ledger behind a cookie-session JSON API.
pub mod config;
pub mod domain;
pub mod error;
pub mod handlers;
pub mod repository;
pub mod security;
pub mod services;
pub mod state;

pub use error::{AppError, Result};
pub use state::AppState;
