use std::error::Error;
use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CoreErrorCode {
    Io,
    UnrecognizedFormat,
    TruncatedBuffer,
    ChecksumMismatch,
    BlockNotFound,
    InvalidSlot,
    FormatMismatch,
    UnsupportedOperation,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreError {
    pub code: CoreErrorCode,
    pub message: String,
}

impl CoreError {
    pub fn new(code: CoreErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn truncated(what: &str, len: usize, need: usize) -> Self {
        Self::new(
            CoreErrorCode::TruncatedBuffer,
            format!("{what} too short: len={len}, need at least {need}"),
        )
    }

    pub fn block_not_found(key: u32) -> Self {
        Self::new(
            CoreErrorCode::BlockNotFound,
            format!("block {key:#010X} not present"),
        )
    }

    pub fn invalid_slot(message: impl Into<String>) -> Self {
        Self::new(CoreErrorCode::InvalidSlot, message)
    }
}

impl fmt::Display for CoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}: {}", self.code, self.message)
    }
}

impl Error for CoreError {}
