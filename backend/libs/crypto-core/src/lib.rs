//! Token and hashing primitives shared by the Agora service and its middleware.

pub mod hash;
pub mod jwt;

pub use jwt::{Claims, TokenError, TokenIssuer, TokenKind, TokenPair};
