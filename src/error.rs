use crate::scheduler::InvalidRating;
use crate::store::StoreError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReviewError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("invalid rating {0}, expected 1..=5")]
    InvalidRating(i64),

    #[error("card {0} not found")]
    CardNotFound(i64),

    #[error("storage error: {0}")]
    Storage(#[from] StoreError),
}

impl From<InvalidRating> for ReviewError {
    fn from(InvalidRating(rating): InvalidRating) -> Self {
        ReviewError::InvalidRating(rating)
    }
}

impl ReviewError {
    /// Only store failures may succeed when the caller tries again.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ReviewError::Storage(_))
    }
}

pub type Result<T> = std::result::Result<T, ReviewError>;
