//! Shared fixtures for the service-level integration tests.
#![allow(dead_code)]

use social_service::domain::models::{Account, AccountSet, Notification, NotificationType};
use social_service::repository::{
    AccountStore, MemoryStore, NotificationStore, StoreError, StoreResult,
};
use social_service::services::media::MediaError;
use social_service::services::{
    EngagementToggle, ImageSource, ImageStore, NotificationLedger, PostService,
    RelationshipToggle, Stores, UploadOptions,
};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

/// Image store that records calls and hands back predictable URLs
#[derive(Default)]
pub struct RecordingImageStore {
    pub uploads: Mutex<Vec<UploadOptions>>,
    pub destroyed: Mutex<Vec<String>>,
}

#[async_trait::async_trait]
impl ImageStore for RecordingImageStore {
    async fn upload(&self, _: ImageSource, options: &UploadOptions) -> Result<String, MediaError> {
        let mut uploads = self.uploads.lock().unwrap();
        uploads.push(options.clone());
        Ok(format!(
            "https://res.example.com/demo/image/upload/v1/img{}.png",
            uploads.len()
        ))
    }

    async fn destroy(&self, public_id: &str) -> Result<(), MediaError> {
        self.destroyed.lock().unwrap().push(public_id.to_string());
        Ok(())
    }
}

pub struct Harness {
    pub memory: Arc<MemoryStore>,
    pub stores: Stores,
    pub ledger: NotificationLedger,
    pub relationships: RelationshipToggle,
    pub engagement: EngagementToggle,
    pub posts: PostService,
    pub images: Arc<RecordingImageStore>,
}

impl Harness {
    pub fn new() -> Self {
        let memory = Arc::new(MemoryStore::new());
        let stores = Stores::new(
            memory.clone(),
            memory.clone(),
            memory.clone(),
            resilience::document_store_config(),
        );
        Self::with_stores(memory, stores)
    }

    /// Route account writes through `accounts` while keeping posts and notifications in memory
    pub fn with_accounts(accounts: Arc<dyn AccountStore>, memory: Arc<MemoryStore>) -> Self {
        let stores = Stores::new(
            accounts,
            memory.clone(),
            memory.clone(),
            resilience::document_store_config(),
        );
        Self::with_stores(memory, stores)
    }

    /// Route notification calls through `notifications` while keeping accounts and posts in memory
    pub fn with_notifications(
        notifications: Arc<dyn NotificationStore>,
        memory: Arc<MemoryStore>,
    ) -> Self {
        let stores = Stores::new(
            memory.clone(),
            memory.clone(),
            notifications,
            resilience::document_store_config(),
        );
        Self::with_stores(memory, stores)
    }

    fn with_stores(memory: Arc<MemoryStore>, stores: Stores) -> Self {
        let images = Arc::new(RecordingImageStore::default());
        let ledger = NotificationLedger::new(stores.clone());
        Self {
            relationships: RelationshipToggle::new(stores.clone(), ledger.clone()),
            engagement: EngagementToggle::new(stores.clone(), ledger.clone()),
            posts: PostService::new(stores.clone(), images.clone()),
            ledger,
            stores,
            memory,
            images,
        }
    }

    /// Insert an account directly; the credential hash is a placeholder
    pub async fn account(&self, username: &str) -> Uuid {
        let account = Account::new(
            username.to_string(),
            username.to_uppercase(),
            format!("{}@example.com", username),
            "not-a-real-hash".to_string(),
        );
        self.stores.accounts.insert(&account).await.unwrap();
        account.id
    }

    pub async fn load(&self, id: Uuid) -> Account {
        self.stores.accounts.find_by_id(id).await.unwrap().unwrap()
    }

    pub async fn post(&self, author: Uuid, text: &str) -> Uuid {
        self.posts
            .create(author, Some(text.to_string()), None)
            .await
            .unwrap()
            .id
    }

    pub async fn notifications_for(&self, to: Uuid) -> Vec<Notification> {
        self.stores.notifications.list_for_recipient(to).await.unwrap()
    }

    pub async fn count_of(&self, to: Uuid, kind: NotificationType) -> usize {
        self.notifications_for(to)
            .await
            .iter()
            .filter(|n| n.kind == kind)
            .count()
    }
}

/// Account store that fails selected set writes before delegating to memory
pub struct FlakyAccounts {
    inner: Arc<MemoryStore>,
    /// Remaining transient failures injected into any set write
    pub transient_failures: AtomicUsize,
    /// While set, writes to the `following` set fail as unavailable
    pub following_down: AtomicBool,
    pub set_write_attempts: AtomicUsize,
}

impl FlakyAccounts {
    pub fn new(inner: Arc<MemoryStore>) -> Self {
        Self {
            inner,
            transient_failures: AtomicUsize::new(0),
            following_down: AtomicBool::new(false),
            set_write_attempts: AtomicUsize::new(0),
        }
    }

    fn inject(&self, set: AccountSet) -> StoreResult<()> {
        self.set_write_attempts.fetch_add(1, Ordering::SeqCst);
        if set == AccountSet::Following && self.following_down.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("connection reset".into()));
        }
        let injected = self
            .transient_failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if injected {
            return Err(StoreError::Unavailable("connection reset".into()));
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl AccountStore for FlakyAccounts {
    async fn insert(&self, account: &Account) -> StoreResult<()> {
        self.inner.insert(account).await
    }

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<Account>> {
        self.inner.find_by_id(id).await
    }

    async fn find_by_username(&self, username: &str) -> StoreResult<Option<Account>> {
        self.inner.find_by_username(username).await
    }

    async fn find_by_email(&self, email: &str) -> StoreResult<Option<Account>> {
        self.inner.find_by_email(email).await
    }

    async fn find_many(&self, ids: &[Uuid]) -> StoreResult<Vec<Account>> {
        self.inner.find_many(ids).await
    }

    async fn add_to_set(&self, id: Uuid, set: AccountSet, member: Uuid) -> StoreResult<bool> {
        self.inject(set)?;
        self.inner.add_to_set(id, set, member).await
    }

    async fn remove_from_set(&self, id: Uuid, set: AccountSet, member: Uuid) -> StoreResult<bool> {
        self.inject(set)?;
        self.inner.remove_from_set(id, set, member).await
    }

    async fn save_profile(&self, account: &Account) -> StoreResult<bool> {
        self.inner.save_profile(account).await
    }

    async fn search(&self, query: &str) -> StoreResult<Vec<Account>> {
        self.inner.search(query).await
    }

    async fn list_except(&self, id: Uuid) -> StoreResult<Vec<Account>> {
        self.inner.list_except(id).await
    }

    async fn sample_except(&self, id: Uuid, limit: usize) -> StoreResult<Vec<Account>> {
        self.inner.sample_except(id, limit).await
    }
}
