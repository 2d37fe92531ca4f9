use thiserror::Error;

#[derive(Error, Debug)]
pub enum PackError {
    #[error("Invalid pack request: {0}")]
    InvalidRequest(String),

    #[error("Failed to unpack scanline {row}: need {needed} bytes, have {available}")]
    Unpack {
        row: u32,
        needed: usize,
        available: usize,
    },

    #[error("Failed to parse JPEG thumbnail: {0}")]
    Thumbnail(String),

    #[error("Failed to allocate buffer: {0}")]
    Allocation(String),

    #[error("Failed to encode DNG: {0}")]
    Encode(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, PackError>;
