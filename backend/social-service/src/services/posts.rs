//! Content Store operations: authoring posts and reading feeds.
use super::media::{destroy_quietly, ImageSource, ImageStore, UploadOptions};
use super::Stores;
use crate::domain::models::{Comment, Post};
use crate::domain::views::{CommentView, PostView};
use crate::error::{AppError, Result};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

/// Blank strings count as absent
fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

#[derive(Clone)]
pub struct PostService {
    stores: Stores,
    images: Arc<dyn ImageStore>,
}

impl PostService {
    pub fn new(stores: Stores, images: Arc<dyn ImageStore>) -> Self {
        Self { stores, images }
    }

    async fn upload(&self, encoded: String) -> Result<String> {
        let url = self
            .images
            .upload(ImageSource::Encoded(encoded), &UploadOptions::default())
            .await?;
        Ok(url)
    }

    /// Whether deleting `img` along with `post` is safe. A reshare starts out
    /// pointing at the original's image and owns only an image it was given later.
    async fn owns_image(&self, post: &Post, img: &str) -> bool {
        let Some(original_id) = post.original_post.filter(|_| post.is_reshare) else {
            return true;
        };
        match self
            .stores
            .call("posts.find", || self.stores.posts.find(original_id))
            .await
        {
            Ok(Some(original)) => original.img.as_deref() != Some(img),
            // The original's delete already released its image
            Ok(None) => true,
            Err(e) => {
                warn!(post_id = %post.id, error = %e, "Could not resolve image owner; keeping image");
                false
            }
        }
    }

    /// A post needs text, an image, or both. The image is uploaded before the
    /// post is stored and the hosted URL is kept.
    pub async fn create(
        &self,
        actor: Uuid,
        text: Option<String>,
        img: Option<String>,
    ) -> Result<Post> {
        let text = non_blank(text);
        let img = non_blank(img);
        if text.is_none() && img.is_none() {
            return Err(AppError::Validation("Post cannot be empty".into()));
        }

        self.stores.require_account(actor).await?;

        let img = match img {
            Some(encoded) => Some(self.upload(encoded).await?),
            None => None,
        };

        let post = Post::new(actor, text, img);
        self.stores
            .call("posts.insert", || self.stores.posts.insert(&post))
            .await?;

        info!(actor = %actor, post_id = %post.id, "Post created");
        Ok(post)
    }

    /// Replace text and/or image. Absent fields are left as they are.
    pub async fn edit(
        &self,
        actor: Uuid,
        post_id: Uuid,
        text: Option<String>,
        img: Option<String>,
    ) -> Result<Post> {
        let mut post = self.stores.require_post(post_id).await?;
        if post.author_id != actor {
            return Err(AppError::Unauthorized(
                "You are not authorized to edit this post".into(),
            ));
        }

        if let Some(text) = non_blank(text) {
            post.text = Some(text);
        }
        let replaced = match non_blank(img) {
            Some(encoded) => {
                let url = self.upload(encoded).await?;
                std::mem::replace(&mut post.img, Some(url))
            }
            None => None,
        };

        let updated = self
            .stores
            .call("posts.update_content", || {
                self.stores
                    .posts
                    .update_content(post_id, post.text.as_deref(), post.img.as_deref())
            })
            .await?;
        if !updated {
            return Err(AppError::NotFound("Post not found".into()));
        }

        if let Some(old) = replaced {
            if self.owns_image(&post, &old).await {
                destroy_quietly(self.images.as_ref(), &old).await;
            }
        }

        info!(actor = %actor, post_id = %post_id, "Post edited");
        self.stores.require_post(post_id).await
    }

    pub async fn delete(&self, actor: Uuid, post_id: Uuid) -> Result<()> {
        let post = self.stores.require_post(post_id).await?;
        if post.author_id != actor {
            return Err(AppError::Unauthorized(
                "You are not authorized to delete this post".into(),
            ));
        }

        let removed = self
            .stores
            .call("posts.delete", || self.stores.posts.delete(post_id))
            .await?;
        if !removed {
            return Err(AppError::NotFound("Post not found".into()));
        }

        if let Some(img) = post.img.as_deref() {
            if self.owns_image(&post, img).await {
                destroy_quietly(self.images.as_ref(), img).await;
            }
        }

        info!(actor = %actor, post_id = %post_id, "Post deleted");
        Ok(())
    }

    /// Render posts with author and commenter summaries filled in
    pub async fn hydrate(&self, posts: &[Post]) -> Result<Vec<PostView>> {
        let ids = posts.iter().flat_map(|p| {
            std::iter::once(p.author_id).chain(p.comments.iter().map(|c| c.author_id))
        });
        let directory = self.stores.directory(ids).await?;
        Ok(posts
            .iter()
            .map(|p| PostView::render(p, &directory))
            .collect())
    }

    pub async fn render_comment(&self, comment: &Comment) -> Result<CommentView> {
        let directory = self.stores.directory([comment.author_id]).await?;
        Ok(CommentView::render(comment, &directory))
    }

    pub async fn view(&self, post_id: Uuid) -> Result<PostView> {
        let post = self.stores.require_post(post_id).await?;
        let mut views = self.hydrate(std::slice::from_ref(&post)).await?;
        views
            .pop()
            .ok_or_else(|| AppError::Internal("Server Error".into()))
    }

    /// Every post, newest first
    pub async fn all(&self) -> Result<Vec<PostView>> {
        let posts = self
            .stores
            .call("posts.list_all", || self.stores.posts.list_all())
            .await?;
        self.hydrate(&posts).await
    }

    /// Posts by accounts the actor follows, newest first
    pub async fn following_feed(&self, actor: Uuid) -> Result<Vec<PostView>> {
        let account = self.stores.require_account(actor).await?;
        let posts = self
            .stores
            .call("posts.list_by_authors", || {
                self.stores.posts.list_by_authors(&account.following)
            })
            .await?;
        self.hydrate(&posts).await
    }

    /// Posts the given account has liked
    pub async fn liked_by(&self, account_id: Uuid) -> Result<Vec<PostView>> {
        self.stores.require_account(account_id).await?;
        let posts = self
            .stores
            .call("posts.list_liked_by", || {
                self.stores.posts.list_liked_by(account_id)
            })
            .await?;
        self.hydrate(&posts).await
    }

    /// Posts authored by the account with this username
    pub async fn by_username(&self, username: &str) -> Result<Vec<PostView>> {
        let account = self
            .stores
            .call("accounts.find_by_username", || {
                self.stores.accounts.find_by_username(username)
            })
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".into()))?;
        let authors = [account.id];
        let posts = self
            .stores
            .call("posts.list_by_authors", || {
                self.stores.posts.list_by_authors(&authors)
            })
            .await?;
        self.hydrate(&posts).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_blank() {
        assert_eq!(non_blank(Some("hi".into())), Some("hi".to_string()));
        assert_eq!(non_blank(Some("  ".into())), None);
        assert_eq!(non_blank(None), None);
    }
}
