//! Local copy of loaded posts with optimistic comment and like changes.
use crate::error::{SyncError, SyncResult};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::debug;
use uuid::Uuid;

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct CommentAuthor {
    pub id: Uuid,
    pub username: String,
}

/// Comment as returned by the API
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ServerComment {
    pub id: Uuid,
    pub user: Option<CommentAuthor>,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

/// Post as returned by the API. Fields the client does not track are ignored.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ServerPost {
    pub id: Uuid,
    #[serde(default)]
    pub likes: Vec<Uuid>,
    #[serde(default)]
    pub comments: Vec<ServerComment>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommentId {
    Server(Uuid),
    /// Optimistic entry that has not been acknowledged yet
    Local(u64),
}

#[derive(Debug, Clone, PartialEq)]
pub struct LocalComment {
    pub id: CommentId,
    pub author: Option<Uuid>,
    pub text: String,
    pub created_at: Option<DateTime<Utc>>,
    /// A delete request is in flight
    pub deleting: bool,
}

impl From<ServerComment> for LocalComment {
    fn from(comment: ServerComment) -> Self {
        Self {
            id: CommentId::Server(comment.id),
            author: comment.user.map(|u| u.id),
            text: comment.text,
            created_at: Some(comment.created_at),
            deleting: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LocalPost {
    pub id: Uuid,
    pub likes: Vec<Uuid>,
    pub comments: Vec<LocalComment>,
}

impl LocalPost {
    pub fn is_liked_by(&self, account: Uuid) -> bool {
        self.likes.contains(&account)
    }

    fn set_liked(&mut self, account: Uuid, liked: bool) {
        if liked {
            if !self.likes.contains(&account) {
                self.likes.push(account);
            }
        } else {
            self.likes.retain(|id| *id != account);
        }
    }

    fn comment_mut(&mut self, id: CommentId) -> Option<&mut LocalComment> {
        self.comments.iter_mut().find(|c| c.id == id)
    }
}

impl From<ServerPost> for LocalPost {
    fn from(post: ServerPost) -> Self {
        let mut likes = Vec::with_capacity(post.likes.len());
        for id in post.likes {
            if !likes.contains(&id) {
                likes.push(id);
            }
        }
        Self {
            id: post.id,
            likes,
            comments: post.comments.into_iter().map(LocalComment::from).collect(),
        }
    }
}

/// Ticket for an optimistic comment. Settle it with
/// [`FeedState::confirm_comment`] or [`FeedState::reject_comment`].
#[derive(Debug)]
#[must_use = "an optimistic comment stays pending until its ticket is settled"]
pub struct PendingComment {
    post: Uuid,
    local: u64,
    text: String,
}

impl PendingComment {
    pub fn post(&self) -> Uuid {
        self.post
    }

    /// Trimmed text to send to the server
    pub fn text(&self) -> &str {
        &self.text
    }
}

#[derive(Debug, Default)]
pub struct FeedState {
    posts: Vec<LocalPost>,
    next_local: u64,
}

impl FeedState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace local state with a freshly fetched feed. Pending entries are dropped.
    pub fn load(&mut self, posts: Vec<ServerPost>) {
        self.posts = posts.into_iter().map(LocalPost::from).collect();
    }

    pub fn posts(&self) -> &[LocalPost] {
        &self.posts
    }

    pub fn post(&self, id: Uuid) -> Option<&LocalPost> {
        self.posts.iter().find(|p| p.id == id)
    }

    fn post_mut(&mut self, id: Uuid) -> SyncResult<&mut LocalPost> {
        self.posts
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or(SyncError::UnknownPost(id))
    }

    pub fn begin_comment(
        &mut self,
        post: Uuid,
        author: Uuid,
        text: &str,
    ) -> SyncResult<PendingComment> {
        let text = text.trim();
        if text.is_empty() {
            return Err(SyncError::EmptyComment);
        }
        let local = self.next_local;
        let entry = self.post_mut(post)?;
        entry.comments.push(LocalComment {
            id: CommentId::Local(local),
            author: Some(author),
            text: text.to_string(),
            created_at: None,
            deleting: false,
        });
        self.next_local += 1;
        Ok(PendingComment {
            post,
            local,
            text: text.to_string(),
        })
    }

    /// Swap the optimistic entry for the server's comment, keeping its position
    pub fn confirm_comment(
        &mut self,
        ticket: PendingComment,
        comment: ServerComment,
    ) -> SyncResult<()> {
        let entry = self.post_mut(ticket.post)?;
        let server_id = CommentId::Server(comment.id);
        let slot = entry
            .comments
            .iter()
            .position(|c| c.id == CommentId::Local(ticket.local))
            .ok_or(SyncError::StaleTicket(ticket.local))?;

        // A reload may already have brought the server copy in
        if entry.comments.iter().any(|c| c.id == server_id) {
            entry.comments.remove(slot);
        } else {
            entry.comments[slot] = LocalComment::from(comment);
        }
        Ok(())
    }

    /// Drop the optimistic entry and hand back the text for the input box
    pub fn reject_comment(&mut self, ticket: PendingComment) -> String {
        if let Some(entry) = self.posts.iter_mut().find(|p| p.id == ticket.post) {
            entry
                .comments
                .retain(|c| c.id != CommentId::Local(ticket.local));
        }
        ticket.text
    }

    /// Apply an edit the server has already accepted
    pub fn apply_comment_edit(&mut self, post: Uuid, comment: Uuid, text: &str) -> SyncResult<()> {
        let entry = self.post_mut(post)?;
        let local = entry
            .comment_mut(CommentId::Server(comment))
            .ok_or(SyncError::UnknownComment(post))?;
        local.text = text.trim().to_string();
        Ok(())
    }

    pub fn begin_comment_delete(&mut self, post: Uuid, comment: Uuid) -> SyncResult<()> {
        self.mark_deleting(post, comment, true)
    }

    pub fn reject_comment_delete(&mut self, post: Uuid, comment: Uuid) -> SyncResult<()> {
        self.mark_deleting(post, comment, false)
    }

    pub fn confirm_comment_delete(&mut self, post: Uuid, comment: Uuid) -> SyncResult<()> {
        let entry = self.post_mut(post)?;
        entry.comments.retain(|c| c.id != CommentId::Server(comment));
        Ok(())
    }

    fn mark_deleting(&mut self, post: Uuid, comment: Uuid, deleting: bool) -> SyncResult<()> {
        let entry = self.post_mut(post)?;
        let local = entry
            .comment_mut(CommentId::Server(comment))
            .ok_or(SyncError::UnknownComment(post))?;
        local.deleting = deleting;
        Ok(())
    }

    /// Flip the actor's like locally. Returns whether the post was liked before.
    pub fn begin_like_toggle(&mut self, post: Uuid, actor: Uuid) -> SyncResult<bool> {
        let entry = self.post_mut(post)?;
        let previous = entry.is_liked_by(actor);
        entry.set_liked(actor, !previous);
        Ok(previous)
    }

    /// Make local membership match the server's `liked` answer
    pub fn reconcile_like(&mut self, post: Uuid, actor: Uuid, liked: bool) -> SyncResult<()> {
        let entry = self.post_mut(post)?;
        if entry.is_liked_by(actor) != liked {
            debug!(post_id = %post, liked, "Local like state diverged from server");
        }
        entry.set_liked(actor, liked);
        Ok(())
    }

    pub fn rollback_like(&mut self, post: Uuid, actor: Uuid, previous: bool) -> SyncResult<()> {
        let entry = self.post_mut(post)?;
        entry.set_liked(actor, previous);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn server_comment(author: Uuid, text: &str) -> ServerComment {
        ServerComment {
            id: Uuid::new_v4(),
            user: Some(CommentAuthor {
                id: author,
                username: "alice".into(),
            }),
            text: text.into(),
            created_at: Utc::now(),
        }
    }

    fn feed_with_post() -> (FeedState, Uuid) {
        let post = Uuid::new_v4();
        let mut feed = FeedState::new();
        feed.load(vec![ServerPost {
            id: post,
            likes: vec![],
            comments: vec![],
        }]);
        (feed, post)
    }

    #[test]
    fn test_server_post_deserializes_from_api_shape() {
        let id = Uuid::new_v4();
        let author = Uuid::new_v4();
        let body = json!({
            "id": id,
            "user": null,
            "text": "hello",
            "likes": [author, author],
            "comments": [{
                "id": Uuid::new_v4(),
                "user": { "id": author, "username": "alice", "fullName": "Alice" },
                "text": "hi",
                "createdAt": "2024-01-01T00:00:00Z"
            }],
            "isReshare": false
        });
        let post: ServerPost = serde_json::from_value(body).unwrap();
        let local = LocalPost::from(post);
        assert_eq!(local.likes, vec![author]);
        assert_eq!(local.comments[0].author, Some(author));
    }

    #[test]
    fn test_optimistic_comment_confirmed_in_place() {
        let (mut feed, post) = feed_with_post();
        let author = Uuid::new_v4();

        let first = feed.begin_comment(post, author, " first ").unwrap();
        let second = feed.begin_comment(post, author, "second").unwrap();
        assert_eq!(first.text(), "first");
        assert_eq!(feed.post(post).unwrap().comments.len(), 2);

        let confirmed = server_comment(author, "first");
        let confirmed_id = confirmed.id;
        feed.confirm_comment(first, confirmed).unwrap();

        let comments = &feed.post(post).unwrap().comments;
        assert_eq!(comments[0].id, CommentId::Server(confirmed_id));
        assert!(comments[0].created_at.is_some());
        assert!(matches!(comments[1].id, CommentId::Local(_)));

        assert_eq!(feed.reject_comment(second), "second");
        assert_eq!(feed.post(post).unwrap().comments.len(), 1);
    }

    #[test]
    fn test_blank_comment_never_enters_feed() {
        let (mut feed, post) = feed_with_post();
        assert_eq!(
            feed.begin_comment(post, Uuid::new_v4(), "   ").unwrap_err(),
            SyncError::EmptyComment
        );
        assert!(feed.post(post).unwrap().comments.is_empty());
    }

    #[test]
    fn test_confirm_after_reload_is_stale() {
        let (mut feed, post) = feed_with_post();
        let author = Uuid::new_v4();
        let ticket = feed.begin_comment(post, author, "hi").unwrap();
        feed.load(vec![ServerPost {
            id: post,
            likes: vec![],
            comments: vec![],
        }]);
        assert!(matches!(
            feed.confirm_comment(ticket, server_comment(author, "hi")),
            Err(SyncError::StaleTicket(_))
        ));
    }

    #[test]
    fn test_comment_delete_lifecycle() {
        let (mut feed, post) = feed_with_post();
        let author = Uuid::new_v4();
        let ticket = feed.begin_comment(post, author, "bye").unwrap();
        let comment = server_comment(author, "bye");
        let comment_id = comment.id;
        feed.confirm_comment(ticket, comment).unwrap();

        feed.begin_comment_delete(post, comment_id).unwrap();
        assert!(feed.post(post).unwrap().comments[0].deleting);
        feed.reject_comment_delete(post, comment_id).unwrap();
        assert!(!feed.post(post).unwrap().comments[0].deleting);

        feed.apply_comment_edit(post, comment_id, " edited ").unwrap();
        assert_eq!(feed.post(post).unwrap().comments[0].text, "edited");

        feed.begin_comment_delete(post, comment_id).unwrap();
        feed.confirm_comment_delete(post, comment_id).unwrap();
        assert!(feed.post(post).unwrap().comments.is_empty());
    }

    #[test]
    fn test_like_toggle_reconcile_and_rollback() {
        let (mut feed, post) = feed_with_post();
        let actor = Uuid::new_v4();

        let previous = feed.begin_like_toggle(post, actor).unwrap();
        assert!(!previous);
        assert!(feed.post(post).unwrap().is_liked_by(actor));

        // Server disagrees, e.g. a concurrent toggle from another tab
        feed.reconcile_like(post, actor, false).unwrap();
        assert!(!feed.post(post).unwrap().is_liked_by(actor));

        let previous = feed.begin_like_toggle(post, actor).unwrap();
        feed.rollback_like(post, actor, previous).unwrap();
        assert!(feed.post(post).unwrap().likes.is_empty());

        assert_eq!(
            feed.begin_like_toggle(Uuid::nil(), actor).unwrap_err(),
            SyncError::UnknownPost(Uuid::nil())
        );
    }
}
