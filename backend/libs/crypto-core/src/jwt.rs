//! Session token issuing and validation.
//!
//! Access and refresh tokens are HS256 JWTs signed with *different* secrets, so a
//! refresh token can never be replayed as an access token (and vice versa). The
//! `token_type` claim is checked as a second line.
//!
//! ```rust
//! use crypto_core::jwt::{TokenIssuer, TokenKind};
//! use uuid::Uuid;
//!
//! let issuer = TokenIssuer::new("access-secret", "refresh-secret", 900, 604_800);
//! let pair = issuer.issue_pair(Uuid::new_v4()).unwrap();
//! let claims = issuer.validate(&pair.access_token, TokenKind::Access).unwrap();
//! assert_eq!(claims.token_type, "access");
//! ```
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

const JWT_ALGORITHM: Algorithm = Algorithm::HS256;

/// JWT claims carried by both token kinds
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject (account id as UUID string)
    pub sub: String,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// "access" or "refresh"
    pub token_type: String,
    /// Unique token id; two tokens issued in the same second still differ
    pub jti: String,
}

impl Claims {
    pub fn account_id(&self) -> Result<Uuid, TokenError> {
        Uuid::parse_str(&self.sub).map_err(|_| TokenError::Invalid("malformed subject".into()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Access,
    Refresh,
}

impl TokenKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenKind::Access => "access",
            TokenKind::Refresh => "refresh",
        }
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("token expired")]
    Expired,
    #[error("invalid token: {0}")]
    Invalid(String),
    #[error("failed to sign token: {0}")]
    Signing(String),
}

/// Freshly issued access + refresh tokens
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    /// Access token lifetime in seconds
    pub access_expires_in: i64,
    /// Refresh token lifetime in seconds
    pub refresh_expires_in: i64,
}

/// Signs and validates session tokens
#[derive(Clone)]
pub struct TokenIssuer {
    access_encoding: EncodingKey,
    access_decoding: DecodingKey,
    refresh_encoding: EncodingKey,
    refresh_decoding: DecodingKey,
    access_ttl_secs: i64,
    refresh_ttl_secs: i64,
}

impl std::fmt::Debug for TokenIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenIssuer")
            .field("secrets", &"[REDACTED]")
            .field("access_ttl_secs", &self.access_ttl_secs)
            .field("refresh_ttl_secs", &self.refresh_ttl_secs)
            .finish()
    }
}

impl TokenIssuer {
    pub fn new(
        access_secret: &str,
        refresh_secret: &str,
        access_ttl_secs: i64,
        refresh_ttl_secs: i64,
    ) -> Self {
        Self {
            access_encoding: EncodingKey::from_secret(access_secret.as_bytes()),
            access_decoding: DecodingKey::from_secret(access_secret.as_bytes()),
            refresh_encoding: EncodingKey::from_secret(refresh_secret.as_bytes()),
            refresh_decoding: DecodingKey::from_secret(refresh_secret.as_bytes()),
            access_ttl_secs,
            refresh_ttl_secs,
        }
    }

    pub fn access_ttl_secs(&self) -> i64 {
        self.access_ttl_secs
    }

    pub fn refresh_ttl_secs(&self) -> i64 {
        self.refresh_ttl_secs
    }

    /// Issue a single token of the given kind
    pub fn issue(&self, account_id: Uuid, kind: TokenKind) -> Result<String, TokenError> {
        let now = Utc::now();
        let (ttl, key) = match kind {
            TokenKind::Access => (self.access_ttl_secs, &self.access_encoding),
            TokenKind::Refresh => (self.refresh_ttl_secs, &self.refresh_encoding),
        };

        let claims = Claims {
            sub: account_id.to_string(),
            iat: now.timestamp(),
            exp: (now + Duration::seconds(ttl)).timestamp(),
            token_type: kind.as_str().to_string(),
            jti: Uuid::new_v4().to_string(),
        };

        encode(&Header::new(JWT_ALGORITHM), &claims, key)
            .map_err(|e| TokenError::Signing(e.to_string()))
    }

    /// Issue both tokens for a new session
    pub fn issue_pair(&self, account_id: Uuid) -> Result<TokenPair, TokenError> {
        Ok(TokenPair {
            access_token: self.issue(account_id, TokenKind::Access)?,
            refresh_token: self.issue(account_id, TokenKind::Refresh)?,
            access_expires_in: self.access_ttl_secs,
            refresh_expires_in: self.refresh_ttl_secs,
        })
    }

    /// Validate signature, expiry and token kind
    pub fn validate(&self, token: &str, kind: TokenKind) -> Result<Claims, TokenError> {
        let key = match kind {
            TokenKind::Access => &self.access_decoding,
            TokenKind::Refresh => &self.refresh_decoding,
        };

        let mut validation = Validation::new(JWT_ALGORITHM);
        validation.validate_exp = true;
        validation.leeway = 0;

        let data = decode::<Claims>(token, key, &validation).map_err(|e| match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => TokenError::Expired,
            _ => TokenError::Invalid(e.to_string()),
        })?;

        if data.claims.token_type != kind.as_str() {
            return Err(TokenError::Invalid(format!(
                "expected {} token, got {}",
                kind.as_str(),
                data.claims.token_type
            )));
        }

        Ok(data.claims)
    }
}
