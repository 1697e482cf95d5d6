use crate::repository::{MemoryRefreshTokenStore, RefreshTokenStore};
use crate::services::{
    AccountService, EngagementToggle, ImageStore, NotificationLedger, PostService,
    RelationshipToggle, SessionService, Stores,
};
use crypto_core::TokenIssuer;
use std::sync::Arc;

/// Attributes applied to both session cookies
#[derive(Debug, Clone, Copy)]
pub struct CookieSettings {
    pub secure: bool,
    pub access_max_age_secs: i64,
    pub refresh_max_age_secs: i64,
}

/// Everything a request handler needs, shared across workers
#[derive(Clone)]
pub struct AppState {
    pub accounts: AccountService,
    pub posts: PostService,
    pub relationships: RelationshipToggle,
    pub engagement: EngagementToggle,
    pub notifications: NotificationLedger,
    pub sessions: SessionService,
    pub cookies: CookieSettings,
    pub max_upload_bytes: usize,
}

impl AppState {
    pub fn new(
        stores: Stores,
        images: Arc<dyn ImageStore>,
        issuer: Arc<TokenIssuer>,
        refresh_tokens: Arc<dyn RefreshTokenStore>,
        secure_cookies: bool,
        max_upload_bytes: usize,
    ) -> Self {
        let ledger = NotificationLedger::new(stores.clone());
        let cookies = CookieSettings {
            secure: secure_cookies,
            access_max_age_secs: issuer.access_ttl_secs(),
            refresh_max_age_secs: issuer.refresh_ttl_secs(),
        };
        Self {
            accounts: AccountService::new(stores.clone(), images.clone()),
            posts: PostService::new(stores.clone(), images),
            relationships: RelationshipToggle::new(stores.clone(), ledger.clone()),
            engagement: EngagementToggle::new(stores, ledger.clone()),
            notifications: ledger,
            sessions: SessionService::new(issuer, refresh_tokens),
            cookies,
            max_upload_bytes,
        }
    }

    /// Fully in-process state over the given stores, with non-secure cookies
    pub fn in_memory(stores: Stores, images: Arc<dyn ImageStore>, issuer: Arc<TokenIssuer>) -> Self {
        Self::new(
            stores,
            images,
            issuer,
            Arc::new(MemoryRefreshTokenStore::new()),
            false,
            5 * 1024 * 1024,
        )
    }

    pub fn issuer(&self) -> Arc<TokenIssuer> {
        self.sessions.issuer()
    }
}
