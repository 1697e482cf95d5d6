//! Business logic: the Account Directory, Content Store, Notification Ledger,
//! Relationship Toggle and Engagement Toggle, plus session and image handling.
pub mod accounts;
pub mod engagement;
pub mod follow;
pub mod media;
pub mod notifications;
pub mod posts;
pub mod sessions;

pub use accounts::{AccountService, SignupInput};
pub use engagement::{EngagementToggle, LikeOutcome};
pub use follow::{FollowOutcome, RelationshipToggle};
pub use media::{ImageSource, ImageStore, UploadOptions};
pub use notifications::NotificationLedger;
pub use posts::PostService;
pub use sessions::SessionService;

use crate::domain::models::{Account, Post};
use crate::domain::views::{AccountSummary, Directory};
use crate::error::{AppError, Result};
use crate::repository::{AccountStore, MemoryStore, NotificationStore, PostStore, StoreError};
use resilience::{call_with_policy, document_store_config, ServiceConfig};
use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;
use tracing::warn;
use uuid::Uuid;

/// Handles to the three document stores plus the call policy applied to each call
#[derive(Clone)]
pub struct Stores {
    pub accounts: Arc<dyn AccountStore>,
    pub posts: Arc<dyn PostStore>,
    pub notifications: Arc<dyn NotificationStore>,
    policy: ServiceConfig,
}

impl Stores {
    pub fn new(
        accounts: Arc<dyn AccountStore>,
        posts: Arc<dyn PostStore>,
        notifications: Arc<dyn NotificationStore>,
        policy: ServiceConfig,
    ) -> Self {
        Self {
            accounts,
            posts,
            notifications,
            policy,
        }
    }

    /// All three stores over one fresh in-memory backend
    pub fn in_memory() -> Self {
        let store = Arc::new(MemoryStore::new());
        Self::new(
            store.clone(),
            store.clone(),
            store,
            document_store_config(),
        )
    }

    pub fn policy(&self) -> &ServiceConfig {
        &self.policy
    }

    /// Run one store call under the timeout and transient-only retry policy
    pub async fn call<F, Fut, T>(&self, op: &'static str, f: F) -> std::result::Result<T, StoreError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = std::result::Result<T, StoreError>>,
    {
        call_with_policy(&self.policy, StoreError::is_transient, || StoreError::Timeout, f)
            .await
            .map_err(|e| {
                if e.is_transient() {
                    warn!(op, error = %e, "Store call failed after retries");
                }
                e
            })
    }

    pub async fn require_account(&self, id: Uuid) -> Result<Account> {
        self.call("accounts.find_by_id", || self.accounts.find_by_id(id))
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".into()))
    }

    pub async fn require_post(&self, id: Uuid) -> Result<Post> {
        self.call("posts.find", || self.posts.find(id))
            .await?
            .ok_or_else(|| AppError::NotFound("Post not found".into()))
    }

    /// Summaries for every account referenced in a response
    pub async fn directory(&self, ids: impl IntoIterator<Item = Uuid>) -> Result<Directory> {
        let unique: Vec<Uuid> = ids.into_iter().collect::<HashSet<_>>().into_iter().collect();
        let accounts = self
            .call("accounts.find_many", || self.accounts.find_many(&unique))
            .await?;
        Ok(accounts
            .iter()
            .map(|a| (a.id, AccountSummary::from(a)))
            .collect())
    }
}
