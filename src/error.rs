/// Error types shared by the gallery core, its persistence and its config.
use thiserror::Error;

use crate::state::image::ImageId;

#[derive(Debug, Error)]
pub enum GalleryError {
    /// SQLite failure while loading or storing the gallery
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// The persisted snapshot or config could not be (de)serialized
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A rating outside 0..=5 where the caller asked for strict validation
    #[error("rating {0} is out of range (expected 0 to 5)")]
    InvalidRating(u8),

    /// A snapshot contained the same image id twice
    #[error("snapshot contains image id {0} more than once")]
    DuplicateImageId(ImageId),

    /// A stored image id too large for the allocator to stay ahead of
    #[error("image id {0} is out of range")]
    ImageIdOutOfRange(u64),

    #[error("could not determine a data directory for the gallery database")]
    NoDataDir,
}

pub type Result<T> = std::result::Result<T, GalleryError>;
