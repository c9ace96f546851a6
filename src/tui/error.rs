use thiserror::Error;
use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum TuiError {
    #[error("IO/Terminal error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Store error: {0}")]
    StoreError(#[from] StoreError),

    #[error("Key binding error: {0}")]
    KeyBindingError(String),

    #[error("Terminal too small: need at least {min_width}x{min_height}")]
    TooSmall { min_width: u16, min_height: u16 },
}
