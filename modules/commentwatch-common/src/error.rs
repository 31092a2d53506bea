use thiserror::Error;

#[derive(Error, Debug)]
pub enum CommentWatchError {
    /// Records and the comments they describe no longer line up.
    #[error("Data integrity error: {0}")]
    Integrity(String),
}
