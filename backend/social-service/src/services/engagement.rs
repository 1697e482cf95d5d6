//! Engagement Toggle: likes, comments and reshares on posts.
use super::{NotificationLedger, Stores};
use crate::domain::models::{AccountSet, Comment, NotificationKey, NotificationType, Post};
use crate::error::{AppError, Result};
use serde::Serialize;
use tracing::{error, info};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LikeOutcome {
    pub liked: bool,
}

impl LikeOutcome {
    pub fn message(&self) -> &'static str {
        if self.liked {
            "Post liked successfully"
        } else {
            "Post unliked successfully"
        }
    }
}

#[derive(Clone)]
pub struct EngagementToggle {
    stores: Stores,
    ledger: NotificationLedger,
}

fn comment_text(text: &str) -> Result<&str> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(AppError::Validation("Comment cannot be empty".into()));
    }
    Ok(trimmed)
}

impl EngagementToggle {
    pub fn new(stores: Stores, ledger: NotificationLedger) -> Self {
        Self { stores, ledger }
    }

    /// Like or unlike, decided by whether the actor is in the post's likes.
    ///
    /// The actor's liked-posts index is written first and the post's likes last.
    pub async fn toggle_like(&self, actor: Uuid, post_id: Uuid) -> Result<LikeOutcome> {
        let post = self.stores.require_post(post_id).await?;
        let accounts = self.stores.accounts.as_ref();
        let posts = self.stores.posts.as_ref();
        let key = NotificationKey {
            from: actor,
            to: post.author_id,
            kind: NotificationType::Like,
            post: Some(post_id),
        };

        let liked = !post.is_liked_by(actor);
        let indexed = if liked {
            self.stores
                .call("accounts.liked_posts", || {
                    accounts.add_to_set(actor, AccountSet::LikedPosts, post_id)
                })
                .await?
        } else {
            self.stores
                .call("accounts.liked_posts", || {
                    accounts.remove_from_set(actor, AccountSet::LikedPosts, post_id)
                })
                .await?
        };
        if !indexed {
            return Err(AppError::NotFound("User not found".into()));
        }

        let written = if liked {
            self.stores
                .call("posts.add_like", || posts.add_like(post_id, actor))
                .await
        } else {
            self.stores
                .call("posts.remove_like", || posts.remove_like(post_id, actor))
                .await
        };
        match written {
            Ok(true) => {}
            Ok(false) => {
                error!(
                    actor = %actor,
                    post_id = %post_id,
                    repair = "liked_posts_index",
                    "Post vanished after liked-posts index was updated"
                );
                return Err(AppError::NotFound("Post not found".into()));
            }
            Err(e) => {
                error!(
                    actor = %actor,
                    post_id = %post_id,
                    error = %e,
                    repair = "liked_posts_index",
                    "Post likes not updated; liked-posts index is out of step"
                );
                return Err(e.into());
            }
        }

        if liked {
            self.ledger
                .record_quietly(actor, post.author_id, NotificationType::Like, Some(post_id))
                .await;
        } else {
            self.ledger.retract_quietly(key).await;
        }

        info!(actor = %actor, post_id = %post_id, liked, "Like toggled");
        Ok(LikeOutcome { liked })
    }

    /// Append a comment; the stored text is trimmed
    pub async fn add_comment(&self, actor: Uuid, post_id: Uuid, text: &str) -> Result<Comment> {
        let text = comment_text(text)?;
        let post = self.stores.require_post(post_id).await?;

        let comment = Comment::new(actor, text.to_string());
        let pushed = self
            .stores
            .call("posts.push_comment", || {
                self.stores.posts.push_comment(post_id, &comment)
            })
            .await?;
        if !pushed {
            return Err(AppError::NotFound("Post not found".into()));
        }

        self.ledger
            .record_quietly(actor, post.author_id, NotificationType::Comment, Some(post_id))
            .await;

        info!(actor = %actor, post_id = %post_id, comment_id = %comment.id, "Comment added");
        Ok(comment)
    }

    /// Only the comment's author may edit it
    pub async fn edit_comment(
        &self,
        actor: Uuid,
        post_id: Uuid,
        comment_id: Uuid,
        text: &str,
    ) -> Result<Comment> {
        let post = self.stores.require_post(post_id).await?;
        let mut comment = post
            .comment(comment_id)
            .cloned()
            .ok_or_else(|| AppError::NotFound("Comment not found".into()))?;
        if comment.author_id != actor {
            return Err(AppError::Unauthorized(
                "You can only edit your own comments".into(),
            ));
        }
        let text = comment_text(text)?;

        let updated = self
            .stores
            .call("posts.update_comment_text", || {
                self.stores.posts.update_comment_text(post_id, comment_id, text)
            })
            .await?;
        if !updated {
            return Err(AppError::NotFound("Comment not found".into()));
        }

        comment.text = text.to_string();
        Ok(comment)
    }

    /// The comment's author or the post's author may delete a comment
    pub async fn delete_comment(&self, actor: Uuid, post_id: Uuid, comment_id: Uuid) -> Result<()> {
        let post = self.stores.require_post(post_id).await?;
        let comment = post
            .comment(comment_id)
            .ok_or_else(|| AppError::NotFound("Comment not found".into()))?;
        if comment.author_id != actor && post.author_id != actor {
            return Err(AppError::Unauthorized(
                "You can only delete your own comments or comments on your posts".into(),
            ));
        }

        let removed = self
            .stores
            .call("posts.remove_comment", || {
                self.stores.posts.remove_comment(post_id, comment_id)
            })
            .await?;
        if !removed {
            return Err(AppError::NotFound("Comment not found".into()));
        }

        info!(actor = %actor, post_id = %post_id, comment_id = %comment_id, "Comment deleted");
        Ok(())
    }

    /// Create a reshare of `original_id` authored by the actor
    pub async fn reshare(&self, actor: Uuid, original_id: Uuid) -> Result<Post> {
        let original = self
            .stores
            .call("posts.find", || self.stores.posts.find(original_id))
            .await?
            .ok_or_else(|| AppError::NotFound("Original post not found".into()))?;
        let account = self.stores.require_account(actor).await?;

        let post = Post::reshare_of(&original, actor, &account.username);
        self.stores
            .call("posts.insert", || self.stores.posts.insert(&post))
            .await?;

        self.ledger
            .record_quietly(actor, original.author_id, NotificationType::Reshare, Some(post.id))
            .await;

        info!(actor = %actor, original = %original_id, post_id = %post.id, "Post reshared");
        Ok(post)
    }
}
