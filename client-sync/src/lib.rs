//! Client-side state for the social feed.
//!
//! Holds local copies of server state, applies optimistic changes before a
//! request returns and reconciles them once the server answers. Nothing here
//! performs I/O; callers issue the HTTP request and feed the outcome back in.

pub mod badge;
pub mod error;
pub mod feed;
pub mod session;

pub use badge::{PollTicket, UnreadBadge};
pub use error::{SyncError, SyncResult};
pub use feed::{
    CommentAuthor, CommentId, FeedState, LocalComment, LocalPost, PendingComment, ServerComment,
    ServerPost,
};
pub use session::SessionState;
