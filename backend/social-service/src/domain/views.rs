//! Response shapes. Credential hashes never appear here.
use super::models::{Account, Comment, Notification, NotificationType, Post};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use uuid::Uuid;

/// Full profile of an account as returned by profile/auth endpoints
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountProfile {
    pub id: Uuid,
    pub username: String,
    pub full_name: String,
    pub email: String,
    pub profile_img: Option<String>,
    pub cover_img: Option<String>,
    pub bio: String,
    pub link: String,
    pub followers: Vec<Uuid>,
    pub following: Vec<Uuid>,
    pub liked_posts: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl From<&Account> for AccountProfile {
    fn from(account: &Account) -> Self {
        Self {
            id: account.id,
            username: account.username.clone(),
            full_name: account.full_name.clone(),
            email: account.email.clone(),
            profile_img: account.profile_img.clone(),
            cover_img: account.cover_img.clone(),
            bio: account.bio.clone(),
            link: account.link.clone(),
            followers: account.followers.clone(),
            following: account.following.clone(),
            liked_posts: account.liked_posts.clone(),
            created_at: account.created_at,
        }
    }
}

/// Author card embedded in posts, comments and notifications
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountSummary {
    pub id: Uuid,
    pub username: String,
    pub full_name: String,
    pub profile_img: Option<String>,
}

impl From<&Account> for AccountSummary {
    fn from(account: &Account) -> Self {
        Self {
            id: account.id,
            username: account.username.clone(),
            full_name: account.full_name.clone(),
            profile_img: account.profile_img.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentView {
    pub id: Uuid,
    /// `None` when the author account no longer exists
    pub user: Option<AccountSummary>,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostView {
    pub id: Uuid,
    pub user: Option<AccountSummary>,
    pub text: Option<String>,
    pub img: Option<String>,
    pub likes: Vec<Uuid>,
    pub comments: Vec<CommentView>,
    pub is_reshare: bool,
    pub original_post: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Lookup table from account id to summary, built once per response
pub type Directory = HashMap<Uuid, AccountSummary>;

impl CommentView {
    pub fn render(comment: &Comment, directory: &Directory) -> Self {
        Self {
            id: comment.id,
            user: directory.get(&comment.author_id).cloned(),
            text: comment.text.clone(),
            created_at: comment.created_at,
        }
    }
}

impl PostView {
    pub fn render(post: &Post, directory: &Directory) -> Self {
        Self {
            id: post.id,
            user: directory.get(&post.author_id).cloned(),
            text: post.text.clone(),
            img: post.img.clone(),
            likes: post.likes.clone(),
            comments: post
                .comments
                .iter()
                .map(|c| CommentView::render(c, directory))
                .collect(),
            is_reshare: post.is_reshare,
            original_post: post.original_post,
            created_at: post.created_at,
            updated_at: post.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationView {
    pub id: Uuid,
    pub from: Option<AccountSummary>,
    pub to: Uuid,
    #[serde(rename = "type")]
    pub kind: NotificationType,
    pub post: Option<Uuid>,
    pub read: bool,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

impl NotificationView {
    pub fn render(notification: &Notification, directory: &Directory) -> Self {
        let from = directory.get(&notification.from).cloned();
        let actor = from
            .as_ref()
            .map(|a| a.username.as_str())
            .unwrap_or("Someone");
        Self {
            id: notification.id,
            message: notification.kind.message(actor),
            from,
            to: notification.to,
            kind: notification.kind,
            post: notification.post,
            read: notification.read,
            created_at: notification.created_at,
        }
    }
}
