use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Account entity - identity plus the denormalized relation sets
///
/// `followers`, `following` and `liked_posts` have set semantics: insertion order
/// is kept but a member appears at most once. They are only mutated through the
/// single-field add/remove operations of the account store.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct Account {
    pub id: Uuid,
    pub username: String,
    pub full_name: String,
    pub email: String,
    pub password_hash: String,
    pub profile_img: Option<String>,
    pub cover_img: Option<String>,
    pub bio: String,
    pub link: String,
    pub followers: Vec<Uuid>,
    pub following: Vec<Uuid>,
    pub liked_posts: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Account {
    pub fn new(username: String, full_name: String, email: String, password_hash: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            username,
            full_name,
            email,
            password_hash,
            profile_img: None,
            cover_img: None,
            bio: String::new(),
            link: String::new(),
            followers: Vec::new(),
            following: Vec::new(),
            liked_posts: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_following(&self, other: Uuid) -> bool {
        self.following.contains(&other)
    }
}

/// Which relation set of an account a set operation targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccountSet {
    Followers,
    Following,
    LikedPosts,
}

impl AccountSet {
    pub fn column(&self) -> &'static str {
        match self {
            AccountSet::Followers => "followers",
            AccountSet::Following => "following",
            AccountSet::LikedPosts => "liked_posts",
        }
    }

    pub fn members_mut<'a>(&self, account: &'a mut Account) -> &'a mut Vec<Uuid> {
        match self {
            AccountSet::Followers => &mut account.followers,
            AccountSet::Following => &mut account.following,
            AccountSet::LikedPosts => &mut account.liked_posts,
        }
    }
}

/// Comment embedded in a post; its id is unique within the parent post only
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: Uuid,
    pub author_id: Uuid,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

impl Comment {
    pub fn new(author_id: Uuid, text: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            author_id,
            text,
            created_at: Utc::now(),
        }
    }
}

/// Post entity; a reshare is a post of its own with independent likes/comments
#[derive(Debug, Clone, PartialEq)]
pub struct Post {
    pub id: Uuid,
    pub author_id: Uuid,
    pub text: Option<String>,
    pub img: Option<String>,
    pub likes: Vec<Uuid>,
    pub comments: Vec<Comment>,
    pub is_reshare: bool,
    pub original_post: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Post {
    pub fn new(author_id: Uuid, text: Option<String>, img: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            author_id,
            text,
            img,
            likes: Vec::new(),
            comments: Vec::new(),
            is_reshare: false,
            original_post: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn reshare_of(original: &Post, actor_id: Uuid, actor_username: &str) -> Self {
        let text = format!(
            "Reposted by @{}: {}",
            actor_username,
            original.text.as_deref().unwrap_or_default()
        );
        let mut post = Self::new(actor_id, Some(text), original.img.clone());
        post.is_reshare = true;
        post.original_post = Some(original.id);
        post
    }

    pub fn comment(&self, comment_id: Uuid) -> Option<&Comment> {
        self.comments.iter().find(|c| c.id == comment_id)
    }

    pub fn is_liked_by(&self, account_id: Uuid) -> bool {
        self.likes.contains(&account_id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationType {
    Follow,
    Like,
    Comment,
    Reshare,
}

impl NotificationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationType::Follow => "follow",
            NotificationType::Like => "like",
            NotificationType::Comment => "comment",
            NotificationType::Reshare => "reshare",
        }
    }

    /// Human-readable line shown to the recipient
    pub fn message(&self, actor_username: &str) -> String {
        match self {
            NotificationType::Follow => format!("{} started following you", actor_username),
            NotificationType::Like => format!("{} liked your post", actor_username),
            NotificationType::Comment => format!("{} commented on your post", actor_username),
            NotificationType::Reshare => format!("{} reshared your post", actor_username),
        }
    }
}

impl fmt::Display for NotificationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NotificationType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "follow" => Ok(NotificationType::Follow),
            "like" => Ok(NotificationType::Like),
            "comment" => Ok(NotificationType::Comment),
            "reshare" => Ok(NotificationType::Reshare),
            other => Err(format!("unknown notification type: {}", other)),
        }
    }
}

/// The identity of a notification fact: at most one notification exists per key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NotificationKey {
    pub from: Uuid,
    pub to: Uuid,
    pub kind: NotificationType,
    pub post: Option<Uuid>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub id: Uuid,
    pub from: Uuid,
    pub to: Uuid,
    pub kind: NotificationType,
    pub post: Option<Uuid>,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    pub fn new(key: NotificationKey) -> Self {
        Self {
            id: Uuid::new_v4(),
            from: key.from,
            to: key.to,
            kind: key.kind,
            post: key.post,
            read: false,
            created_at: Utc::now(),
        }
    }

    pub fn key(&self) -> NotificationKey {
        NotificationKey {
            from: self.from,
            to: self.to,
            kind: self.kind,
            post: self.post,
        }
    }
}

/// Profile fields an account may change about itself
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProfileUpdate {
    pub full_name: Option<String>,
    pub username: Option<String>,
    pub email: Option<String>,
    pub bio: Option<String>,
    pub link: Option<String>,
    pub current_password: Option<String>,
    pub new_password: Option<String>,
    /// Encoded image (data URI or remote URL) to upload as the new avatar
    pub profile_img: Option<String>,
    /// Encoded image to upload as the new cover
    pub cover_img: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reshare_text_and_linkage() {
        let author = Uuid::new_v4();
        let mut original = Post::new(author, Some("hello".into()), Some("https://img/x.png".into()));
        original.likes.push(Uuid::new_v4());

        let actor = Uuid::new_v4();
        let reshare = Post::reshare_of(&original, actor, "alice");

        assert_eq!(reshare.text.as_deref(), Some("Reposted by @alice: hello"));
        assert_eq!(reshare.img, original.img);
        assert!(reshare.is_reshare);
        assert_eq!(reshare.original_post, Some(original.id));
        assert_eq!(reshare.author_id, actor);
        assert!(reshare.likes.is_empty());
        assert_ne!(reshare.id, original.id);
    }

    #[test]
    fn test_reshare_of_image_only_post() {
        let original = Post::new(Uuid::new_v4(), None, Some("https://img/y.png".into()));
        let reshare = Post::reshare_of(&original, Uuid::new_v4(), "bob");
        assert_eq!(reshare.text.as_deref(), Some("Reposted by @bob: "));
    }

    #[test]
    fn test_notification_type_round_trip() {
        for kind in [
            NotificationType::Follow,
            NotificationType::Like,
            NotificationType::Comment,
            NotificationType::Reshare,
        ] {
            assert_eq!(kind.as_str().parse::<NotificationType>(), Ok(kind));
        }
        assert!("poke".parse::<NotificationType>().is_err());
    }

    #[test]
    fn test_notification_messages() {
        assert_eq!(
            NotificationType::Follow.message("alice"),
            "alice started following you"
        );
        assert_eq!(NotificationType::Reshare.message("bob"), "bob reshared your post");
    }
}
