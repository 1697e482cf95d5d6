//! In-process stores backed by `DashMap`.
//!
//! Used by tests and `STORE_BACKEND=memory` development runs. Each record is a
//! map entry, so single-record updates are atomic under the entry's shard lock,
//! which matches the per-document atomicity of the PostgreSQL stores.
use super::traits::{AccountStore, NotificationStore, PostStore, RefreshTokenStore, StoreResult};
use super::StoreError;
use crate::domain::models::{Account, AccountSet, Comment, Notification, NotificationKey, Post};
use chrono::Utc;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use rand::seq::SliceRandom;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use uuid::Uuid;

/// Record plus insertion sequence, used to break `created_at` ties
#[derive(Debug, Clone)]
struct Sequenced<T> {
    seq: u64,
    record: T,
}

#[derive(Default)]
pub struct MemoryStore {
    accounts: DashMap<Uuid, Account>,
    usernames: DashMap<String, Uuid>,
    emails: DashMap<String, Uuid>,
    posts: DashMap<Uuid, Sequenced<Post>>,
    notifications: DashMap<Uuid, Sequenced<Notification>>,
    notification_keys: DashMap<NotificationKey, Uuid>,
    seq: AtomicU64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_seq(&self) -> u64 {
        self.seq.fetch_add(1, Ordering::Relaxed)
    }

    fn newest_first<T: Clone>(
        mut items: Vec<Sequenced<T>>,
        created_at: impl Fn(&T) -> chrono::DateTime<Utc>,
    ) -> Vec<T> {
        items.sort_by(|a, b| {
            created_at(&b.record)
                .cmp(&created_at(&a.record))
                .then(b.seq.cmp(&a.seq))
        });
        items.into_iter().map(|s| s.record).collect()
    }

    fn posts_where(&self, filter: impl Fn(&Post) -> bool) -> Vec<Post> {
        let matching: Vec<Sequenced<Post>> = self
            .posts
            .iter()
            .filter(|entry| filter(&entry.record))
            .map(|entry| entry.value().clone())
            .collect();
        Self::newest_first(matching, |p| p.created_at)
    }

    /// Claim `value` in a uniqueness index for `id`
    fn claim(
        index: &DashMap<String, Uuid>,
        value: &str,
        id: Uuid,
        constraint: &str,
    ) -> StoreResult<()> {
        match index.entry(value.to_string()) {
            Entry::Occupied(existing) if *existing.get() != id => {
                Err(StoreError::Conflict(constraint.to_string()))
            }
            Entry::Occupied(_) => Ok(()),
            Entry::Vacant(slot) => {
                slot.insert(id);
                Ok(())
            }
        }
    }
}

#[async_trait::async_trait]
impl AccountStore for MemoryStore {
    async fn insert(&self, account: &Account) -> StoreResult<()> {
        if self.accounts.contains_key(&account.id) {
            return Ok(());
        }
        Self::claim(&self.usernames, &account.username, account.id, "accounts_username_key")?;
        if let Err(e) = Self::claim(&self.emails, &account.email, account.id, "accounts_email_key")
        {
            self.usernames.remove(&account.username);
            return Err(e);
        }
        self.accounts.insert(account.id, account.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<Account>> {
        Ok(self.accounts.get(&id).map(|a| a.clone()))
    }

    async fn find_by_username(&self, username: &str) -> StoreResult<Option<Account>> {
        let id = self.usernames.get(username).map(|r| *r.value());
        Ok(id.and_then(|id| self.accounts.get(&id).map(|a| a.clone())))
    }

    async fn find_by_email(&self, email: &str) -> StoreResult<Option<Account>> {
        let id = self.emails.get(email).map(|r| *r.value());
        Ok(id.and_then(|id| self.accounts.get(&id).map(|a| a.clone())))
    }

    async fn find_many(&self, ids: &[Uuid]) -> StoreResult<Vec<Account>> {
        Ok(ids
            .iter()
            .filter_map(|id| self.accounts.get(id).map(|a| a.clone()))
            .collect())
    }

    async fn add_to_set(&self, id: Uuid, set: AccountSet, member: Uuid) -> StoreResult<bool> {
        match self.accounts.get_mut(&id) {
            Some(mut account) => {
                let members = set.members_mut(account.value_mut());
                if !members.contains(&member) {
                    members.push(member);
                }
                account.updated_at = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn remove_from_set(&self, id: Uuid, set: AccountSet, member: Uuid) -> StoreResult<bool> {
        match self.accounts.get_mut(&id) {
            Some(mut account) => {
                set.members_mut(account.value_mut()).retain(|m| *m != member);
                account.updated_at = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn save_profile(&self, account: &Account) -> StoreResult<bool> {
        let Some(current) = self.accounts.get(&account.id).map(|a| a.clone()) else {
            return Ok(false);
        };

        if current.username != account.username {
            Self::claim(&self.usernames, &account.username, account.id, "accounts_username_key")?;
        }
        if current.email != account.email {
            if let Err(e) =
                Self::claim(&self.emails, &account.email, account.id, "accounts_email_key")
            {
                if current.username != account.username {
                    self.usernames.remove(&account.username);
                }
                return Err(e);
            }
            self.emails.remove(&current.email);
        }
        if current.username != account.username {
            self.usernames.remove(&current.username);
        }

        if let Some(mut stored) = self.accounts.get_mut(&account.id) {
            stored.username = account.username.clone();
            stored.full_name = account.full_name.clone();
            stored.email = account.email.clone();
            stored.password_hash = account.password_hash.clone();
            stored.profile_img = account.profile_img.clone();
            stored.cover_img = account.cover_img.clone();
            stored.bio = account.bio.clone();
            stored.link = account.link.clone();
            stored.updated_at = Utc::now();
        }
        Ok(true)
    }

    async fn search(&self, query: &str) -> StoreResult<Vec<Account>> {
        let needle = query.to_lowercase();
        let mut found: Vec<Account> = self
            .accounts
            .iter()
            .filter(|a| {
                a.username.to_lowercase().contains(&needle)
                    || a.email.to_lowercase().contains(&needle)
                    || a.full_name.to_lowercase().contains(&needle)
            })
            .map(|a| a.clone())
            .collect();
        found.sort_by(|a, b| a.full_name.cmp(&b.full_name));
        Ok(found)
    }

    async fn list_except(&self, id: Uuid) -> StoreResult<Vec<Account>> {
        let mut accounts: Vec<Account> = self
            .accounts
            .iter()
            .filter(|a| a.id != id)
            .map(|a| a.clone())
            .collect();
        accounts.sort_by(|a, b| a.full_name.cmp(&b.full_name));
        Ok(accounts)
    }

    async fn sample_except(&self, id: Uuid, limit: usize) -> StoreResult<Vec<Account>> {
        let mut accounts: Vec<Account> = self
            .accounts
            .iter()
            .filter(|a| a.id != id)
            .map(|a| a.clone())
            .collect();
        accounts.shuffle(&mut rand::thread_rng());
        accounts.truncate(limit);
        Ok(accounts)
    }
}

#[async_trait::async_trait]
impl PostStore for MemoryStore {
    async fn insert(&self, post: &Post) -> StoreResult<()> {
        let seq = self.next_seq();
        self.posts.entry(post.id).or_insert_with(|| Sequenced {
            seq,
            record: post.clone(),
        });
        Ok(())
    }

    async fn find(&self, id: Uuid) -> StoreResult<Option<Post>> {
        Ok(self.posts.get(&id).map(|p| p.record.clone()))
    }

    async fn list_all(&self) -> StoreResult<Vec<Post>> {
        Ok(self.posts_where(|_| true))
    }

    async fn list_by_authors(&self, authors: &[Uuid]) -> StoreResult<Vec<Post>> {
        Ok(self.posts_where(|p| authors.contains(&p.author_id)))
    }

    async fn list_liked_by(&self, account_id: Uuid) -> StoreResult<Vec<Post>> {
        Ok(self.posts_where(|p| p.likes.contains(&account_id)))
    }

    async fn add_like(&self, post_id: Uuid, account_id: Uuid) -> StoreResult<bool> {
        match self.posts.get_mut(&post_id) {
            Some(mut post) => {
                if !post.record.likes.contains(&account_id) {
                    post.record.likes.push(account_id);
                }
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn remove_like(&self, post_id: Uuid, account_id: Uuid) -> StoreResult<bool> {
        match self.posts.get_mut(&post_id) {
            Some(mut post) => {
                post.record.likes.retain(|id| *id != account_id);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn push_comment(&self, post_id: Uuid, comment: &Comment) -> StoreResult<bool> {
        match self.posts.get_mut(&post_id) {
            Some(mut post) => {
                if post.record.comment(comment.id).is_none() {
                    post.record.comments.push(comment.clone());
                }
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn update_comment_text(
        &self,
        post_id: Uuid,
        comment_id: Uuid,
        text: &str,
    ) -> StoreResult<bool> {
        let Some(mut post) = self.posts.get_mut(&post_id) else {
            return Ok(false);
        };
        match post.record.comments.iter_mut().find(|c| c.id == comment_id) {
            Some(comment) => {
                comment.text = text.to_string();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn remove_comment(&self, post_id: Uuid, comment_id: Uuid) -> StoreResult<bool> {
        let Some(mut post) = self.posts.get_mut(&post_id) else {
            return Ok(false);
        };
        let before = post.record.comments.len();
        post.record.comments.retain(|c| c.id != comment_id);
        Ok(post.record.comments.len() < before)
    }

    async fn update_content(
        &self,
        post_id: Uuid,
        text: Option<&str>,
        img: Option<&str>,
    ) -> StoreResult<bool> {
        match self.posts.get_mut(&post_id) {
            Some(mut post) => {
                post.record.text = text.map(str::to_string);
                post.record.img = img.map(str::to_string);
                post.record.updated_at = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete(&self, post_id: Uuid) -> StoreResult<bool> {
        Ok(self.posts.remove(&post_id).is_some())
    }
}

#[async_trait::async_trait]
impl NotificationStore for MemoryStore {
    async fn create_if_absent(&self, notification: &Notification) -> StoreResult<Notification> {
        let seq = self.next_seq();
        // The key index entry is the uniqueness constraint: only the caller that
        // wins the vacant slot inserts a record.
        let id = *self
            .notification_keys
            .entry(notification.key())
            .or_insert_with(|| {
                self.notifications.insert(
                    notification.id,
                    Sequenced {
                        seq,
                        record: notification.clone(),
                    },
                );
                notification.id
            });

        self.notifications
            .get(&id)
            .map(|n| n.record.clone())
            .ok_or_else(|| StoreError::Backend("notification neither inserted nor found".into()))
    }

    async fn find_by_key(&self, key: &NotificationKey) -> StoreResult<Option<Notification>> {
        let id = self.notification_keys.get(key).map(|r| *r.value());
        Ok(id.and_then(|id| self.notifications.get(&id).map(|n| n.record.clone())))
    }

    async fn delete_matching(&self, key: &NotificationKey) -> StoreResult<bool> {
        match self.notification_keys.remove(key) {
            Some((_, id)) => Ok(self.notifications.remove(&id).is_some()),
            None => Ok(false),
        }
    }

    async fn list_for_recipient(&self, to: Uuid) -> StoreResult<Vec<Notification>> {
        let matching: Vec<Sequenced<Notification>> = self
            .notifications
            .iter()
            .filter(|n| n.record.to == to)
            .map(|n| n.value().clone())
            .collect();
        Ok(Self::newest_first(matching, |n| n.created_at))
    }

    async fn mark_all_read(&self, to: Uuid) -> StoreResult<u64> {
        let mut flipped = 0;
        for mut entry in self.notifications.iter_mut() {
            if entry.record.to == to && !entry.record.read {
                entry.record.read = true;
                flipped += 1;
            }
        }
        Ok(flipped)
    }

    async fn mark_read_many(&self, to: Uuid, ids: &[Uuid]) -> StoreResult<u64> {
        let mut flipped = 0;
        for id in ids {
            if let Some(mut entry) = self.notifications.get_mut(id) {
                if entry.record.to == to && !entry.record.read {
                    entry.record.read = true;
                    flipped += 1;
                }
            }
        }
        Ok(flipped)
    }

    async fn mark_read(&self, id: Uuid, to: Uuid) -> StoreResult<Option<Notification>> {
        match self.notifications.get_mut(&id) {
            Some(mut entry) if entry.record.to == to => {
                entry.record.read = true;
                Ok(Some(entry.record.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn delete(&self, id: Uuid, to: Uuid) -> StoreResult<bool> {
        match self.notifications.remove_if(&id, |_, n| n.record.to == to) {
            Some((_, removed)) => {
                self.notification_keys
                    .remove_if(&removed.record.key(), |_, indexed| *indexed == id);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_all(&self, to: Uuid) -> StoreResult<u64> {
        let ids: Vec<Uuid> = self
            .notifications
            .iter()
            .filter(|n| n.record.to == to)
            .map(|n| *n.key())
            .collect();

        let mut removed = 0;
        for id in ids {
            if NotificationStore::delete(self, id, to).await? {
                removed += 1;
            }
        }
        Ok(removed)
    }

    async fn count_unread(&self, to: Uuid) -> StoreResult<u64> {
        Ok(self
            .notifications
            .iter()
            .filter(|n| n.record.to == to && !n.record.read)
            .count() as u64)
    }
}

/// In-process refresh token records with expiry
#[derive(Default)]
pub struct MemoryRefreshTokenStore {
    records: DashMap<Uuid, (String, Instant)>,
}

impl MemoryRefreshTokenStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl RefreshTokenStore for MemoryRefreshTokenStore {
    async fn put(&self, account_id: Uuid, fingerprint: &str, ttl_secs: u64) -> StoreResult<()> {
        let expires_at = Instant::now() + Duration::from_secs(ttl_secs);
        self.records
            .insert(account_id, (fingerprint.to_string(), expires_at));
        Ok(())
    }

    async fn get(&self, account_id: Uuid) -> StoreResult<Option<String>> {
        let record = self.records.get(&account_id).map(|r| r.value().clone());
        match record {
            Some((fingerprint, expires_at)) if expires_at > Instant::now() => Ok(Some(fingerprint)),
            Some(_) => {
                self.records.remove(&account_id);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn remove(&self, account_id: Uuid) -> StoreResult<()> {
        self.records.remove(&account_id);
        Ok(())
    }
}
