use super::StoreError;
use crate::domain::models::{Account, AccountSet, Comment, Notification, NotificationKey, Post};
use uuid::Uuid;

pub type StoreResult<T> = Result<T, StoreError>;

/// Account Directory storage.
///
/// Set operations are single-record and atomic: add-if-absent / remove-if-present.
/// They return whether the account exists, not whether the set changed.
#[async_trait::async_trait]
pub trait AccountStore: Send + Sync {
    /// Insert a new account. Repeating the insert with the same id is a no-op;
    /// a taken username or email yields `StoreError::Conflict`.
    async fn insert(&self, account: &Account) -> StoreResult<()>;

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<Account>>;

    async fn find_by_username(&self, username: &str) -> StoreResult<Option<Account>>;

    async fn find_by_email(&self, email: &str) -> StoreResult<Option<Account>>;

    /// Accounts for the given ids; missing ids are skipped
    async fn find_many(&self, ids: &[Uuid]) -> StoreResult<Vec<Account>>;

    async fn add_to_set(&self, id: Uuid, set: AccountSet, member: Uuid) -> StoreResult<bool>;

    async fn remove_from_set(&self, id: Uuid, set: AccountSet, member: Uuid) -> StoreResult<bool>;

    /// Overwrite the profile fields (names, email, credential, images, bio, link).
    /// Relation sets are left untouched.
    async fn save_profile(&self, account: &Account) -> StoreResult<bool>;

    /// Case-insensitive substring match on username, email or full name
    async fn search(&self, query: &str) -> StoreResult<Vec<Account>>;

    /// Every account except `id`, ordered by full name
    async fn list_except(&self, id: Uuid) -> StoreResult<Vec<Account>>;

    /// Up to `limit` random accounts other than `id`
    async fn sample_except(&self, id: Uuid, limit: usize) -> StoreResult<Vec<Account>>;
}

/// Content Store: posts with embedded, insertion-ordered comments
#[async_trait::async_trait]
pub trait PostStore: Send + Sync {
    /// Insert a post; repeating with the same id is a no-op
    async fn insert(&self, post: &Post) -> StoreResult<()>;

    async fn find(&self, id: Uuid) -> StoreResult<Option<Post>>;

    /// All posts, newest first
    async fn list_all(&self) -> StoreResult<Vec<Post>>;

    /// Posts written by any of `authors`, newest first
    async fn list_by_authors(&self, authors: &[Uuid]) -> StoreResult<Vec<Post>>;

    /// Posts whose like set contains `account_id`, newest first
    async fn list_liked_by(&self, account_id: Uuid) -> StoreResult<Vec<Post>>;

    /// Add-if-absent on the like set. Returns whether the post exists.
    async fn add_like(&self, post_id: Uuid, account_id: Uuid) -> StoreResult<bool>;

    /// Remove-if-present on the like set. Returns whether the post exists.
    async fn remove_like(&self, post_id: Uuid, account_id: Uuid) -> StoreResult<bool>;

    /// Append a comment; repeating with the same comment id is a no-op.
    /// Returns whether the post exists.
    async fn push_comment(&self, post_id: Uuid, comment: &Comment) -> StoreResult<bool>;

    /// Returns whether the comment exists
    async fn update_comment_text(
        &self,
        post_id: Uuid,
        comment_id: Uuid,
        text: &str,
    ) -> StoreResult<bool>;

    /// Returns whether a comment was removed
    async fn remove_comment(&self, post_id: Uuid, comment_id: Uuid) -> StoreResult<bool>;

    /// Replace text and image. Returns whether the post exists.
    async fn update_content(
        &self,
        post_id: Uuid,
        text: Option<&str>,
        img: Option<&str>,
    ) -> StoreResult<bool>;

    /// Returns whether a post was removed
    async fn delete(&self, post_id: Uuid) -> StoreResult<bool>;
}

/// Notification Ledger storage
#[async_trait::async_trait]
pub trait NotificationStore: Send + Sync {
    /// Insert `notification` unless one with the same key exists; either way
    /// return the stored record.
    async fn create_if_absent(&self, notification: &Notification) -> StoreResult<Notification>;

    async fn find_by_key(&self, key: &NotificationKey) -> StoreResult<Option<Notification>>;

    /// Returns whether a record was removed
    async fn delete_matching(&self, key: &NotificationKey) -> StoreResult<bool>;

    /// Newest first
    async fn list_for_recipient(&self, to: Uuid) -> StoreResult<Vec<Notification>>;

    /// Returns the number of records flipped
    async fn mark_all_read(&self, to: Uuid) -> StoreResult<u64>;

    /// Flip only `ids`, and only those addressed to `to`. Returns the number flipped.
    async fn mark_read_many(&self, to: Uuid, ids: &[Uuid]) -> StoreResult<u64>;

    /// Recipient-scoped; `None` when no such notification is addressed to `to`
    async fn mark_read(&self, id: Uuid, to: Uuid) -> StoreResult<Option<Notification>>;

    /// Recipient-scoped; returns whether a record was removed
    async fn delete(&self, id: Uuid, to: Uuid) -> StoreResult<bool>;

    async fn delete_all(&self, to: Uuid) -> StoreResult<u64>;

    async fn count_unread(&self, to: Uuid) -> StoreResult<u64>;
}

/// Single-valid-refresh-token record per account
#[async_trait::async_trait]
pub trait RefreshTokenStore: Send + Sync {
    /// Replace the account's record; earlier tokens stop matching
    async fn put(&self, account_id: Uuid, fingerprint: &str, ttl_secs: u64) -> StoreResult<()>;

    async fn get(&self, account_id: Uuid) -> StoreResult<Option<String>>;

    async fn remove(&self, account_id: Uuid) -> StoreResult<()>;
}
