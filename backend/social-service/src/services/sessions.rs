//! Session handling: token pairs, refresh-token records, rotation of access tokens.
//!
//! Only a fingerprint of the current refresh token is kept server-side, keyed by
//! account. Logging in again replaces it; logging out removes it.
use crate::error::{AppError, Result};
use crate::repository::{RefreshTokenStore, StoreError};
use crypto_core::hash::token_fingerprint;
use crypto_core::{TokenError, TokenIssuer, TokenKind, TokenPair};
use resilience::{call_with_policy, session_store_config, ServiceConfig};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Access token minted from a valid refresh token
#[derive(Debug, Clone)]
pub struct RefreshedAccess {
    pub account_id: Uuid,
    pub access_token: String,
}

#[derive(Clone)]
pub struct SessionService {
    issuer: Arc<TokenIssuer>,
    records: Arc<dyn RefreshTokenStore>,
    policy: ServiceConfig,
}

impl SessionService {
    pub fn new(issuer: Arc<TokenIssuer>, records: Arc<dyn RefreshTokenStore>) -> Self {
        Self {
            issuer,
            records,
            policy: session_store_config(),
        }
    }

    pub fn issuer(&self) -> Arc<TokenIssuer> {
        self.issuer.clone()
    }

    async fn with_records<F, Fut, T>(&self, f: F) -> std::result::Result<T, StoreError>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = std::result::Result<T, StoreError>>,
    {
        call_with_policy(&self.policy, StoreError::is_transient, || StoreError::Timeout, f).await
    }

    /// Issue a token pair and record the refresh token for the account
    pub async fn open(&self, account_id: Uuid) -> Result<TokenPair> {
        let pair = self.issuer.issue_pair(account_id)?;
        let fingerprint = token_fingerprint(&pair.refresh_token);
        let ttl = u64::try_from(pair.refresh_expires_in).unwrap_or_default();

        self.with_records(|| self.records.put(account_id, &fingerprint, ttl))
            .await?;

        info!(account_id = %account_id, "Session opened");
        Ok(pair)
    }

    /// Mint a new access token. The refresh token must verify and must be the
    /// one currently on record for its account.
    pub async fn refresh(&self, refresh_token: Option<&str>) -> Result<RefreshedAccess> {
        let token = refresh_token
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| AppError::Unauthorized("Unauthorized, No Refresh Token".into()))?;

        let claims = self
            .issuer
            .validate(token, TokenKind::Refresh)
            .map_err(|e| match e {
                TokenError::Expired => {
                    AppError::Unauthorized("Unauthorized, Refresh Token Expired".into())
                }
                other => {
                    debug!(error = %other, "Refresh token rejected");
                    AppError::Unauthorized("Unauthorized, Invalid Refresh Token".into())
                }
            })?;
        let account_id = claims.account_id()?;

        let stored = self.with_records(|| self.records.get(account_id)).await?;
        if stored.as_deref() != Some(token_fingerprint(token).as_str()) {
            warn!(account_id = %account_id, "Refresh token not on record");
            return Err(AppError::Unauthorized(
                "Unauthorized, Invalid Refresh Token".into(),
            ));
        }

        let access_token = self.issuer.issue(account_id, TokenKind::Access)?;
        debug!(account_id = %account_id, "Access token refreshed");
        Ok(RefreshedAccess {
            account_id,
            access_token,
        })
    }

    /// Drop the refresh record. Unverifiable tokens are ignored; the caller
    /// clears cookies regardless.
    pub async fn close(&self, refresh_token: Option<&str>) -> Result<()> {
        let Some(token) = refresh_token.filter(|t| !t.is_empty()) else {
            return Ok(());
        };
        let account_id = match self
            .issuer
            .validate(token, TokenKind::Refresh)
            .and_then(|claims| claims.account_id())
        {
            Ok(id) => id,
            Err(e) => {
                debug!(error = %e, "Logout with unverifiable refresh token");
                return Ok(());
            }
        };

        self.with_records(|| self.records.remove(account_id)).await?;
        info!(account_id = %account_id, "Session closed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::MemoryRefreshTokenStore;

    fn service() -> SessionService {
        SessionService::new(
            Arc::new(TokenIssuer::new("access", "refresh", 900, 3600)),
            Arc::new(MemoryRefreshTokenStore::new()),
        )
    }

    #[tokio::test]
    async fn test_refresh_requires_token_on_record() {
        let sessions = service();
        let account_id = Uuid::new_v4();

        let first = sessions.open(account_id).await.unwrap();
        let refreshed = sessions.refresh(Some(&first.refresh_token)).await.unwrap();
        assert_eq!(refreshed.account_id, account_id);

        // A second login replaces the record; the first refresh token stops working
        let second = sessions.open(account_id).await.unwrap();
        let err = sessions.refresh(Some(&first.refresh_token)).await.unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));
        assert!(sessions.refresh(Some(&second.refresh_token)).await.is_ok());
    }

    #[tokio::test]
    async fn test_logout_revokes_refresh() {
        let sessions = service();
        let pair = sessions.open(Uuid::new_v4()).await.unwrap();

        sessions.close(Some(&pair.refresh_token)).await.unwrap();
        let err = sessions.refresh(Some(&pair.refresh_token)).await.unwrap_err();
        assert_eq!(err.to_string(), "Unauthorized, Invalid Refresh Token");
    }

    #[tokio::test]
    async fn test_missing_or_garbage_tokens() {
        let sessions = service();
        assert!(matches!(
            sessions.refresh(None).await,
            Err(AppError::Unauthorized(_))
        ));
        assert!(matches!(
            sessions.refresh(Some("not-a-jwt")).await,
            Err(AppError::Unauthorized(_))
        ));
        assert!(sessions.close(Some("not-a-jwt")).await.is_ok());
        assert!(sessions.close(None).await.is_ok());
    }

    #[tokio::test]
    async fn test_access_token_cannot_refresh() {
        let sessions = service();
        let pair = sessions.open(Uuid::new_v4()).await.unwrap();
        assert!(sessions.refresh(Some(&pair.access_token)).await.is_err());
    }
}
