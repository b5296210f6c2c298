use crate::api::ApiError;
use crate::collection::CollectionError;
use crate::connectivity::Action;

#[derive(Clone, Debug, thiserror::Error)]
pub enum SyncError {
    #[error("You are offline; {0} needs a connection")]
    Offline(Action),

    #[error("{0}")]
    Validation(String),

    #[error("{0} is not on the board")]
    UnknownItem(String),

    /// The item was created optimistically and the store has not returned its id yet.
    #[error("{0} is still being saved")]
    PendingCreate(String),

    #[error(transparent)]
    Store(#[from] ApiError),
}

impl From<CollectionError> for SyncError {
    fn from(e: CollectionError) -> Self {
        match e {
            CollectionError::UnknownGroup(id) | CollectionError::UnknownBookmark(id) => {
                SyncError::UnknownItem(id)
            }
        }
    }
}

pub type SyncResult<T> = Result<T, SyncError>;
