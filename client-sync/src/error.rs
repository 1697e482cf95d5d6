use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SyncError {
    #[error("Comment cannot be empty")]
    EmptyComment,

    #[error("post {0} is not loaded")]
    UnknownPost(Uuid),

    #[error("comment is not present in post {0}")]
    UnknownComment(Uuid),

    /// The optimistic entry for this ticket was already confirmed or rejected
    #[error("pending comment {0} was already settled")]
    StaleTicket(u64),
}

pub type SyncResult<T> = std::result::Result<T, SyncError>;
