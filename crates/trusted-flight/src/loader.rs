//! Token loader
//!
//! The token is provisioned out-of-band and may be swapped by an operator
//! between two arming attempts, so sources are read fresh on every call.

use crate::error::{Error, Result};
use crate::limits::MAX_TOKEN_LENGTH;
use crate::token::RawToken;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

/// Where the raw token artifact comes from
pub trait TokenSource: Send + Sync {
    /// Read the current token artifact
    ///
    /// Absence, read failures and empty artifacts are all errors that map to
    /// [`Denial::MissingToken`](crate::Denial::MissingToken).
    fn load(&self) -> Result<RawToken>;
}

impl<T: TokenSource + ?Sized> TokenSource for std::sync::Arc<T> {
    fn load(&self) -> Result<RawToken> {
        (**self).load()
    }
}

/// Token artifact stored in a file at a fixed path
#[derive(Debug, Clone)]
pub struct FileTokenSource {
    path: PathBuf,
}

impl FileTokenSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TokenSource for FileTokenSource {
    fn load(&self) -> Result<RawToken> {
        let unreadable = |e: std::io::Error| Error::TokenUnreadable {
            path: self.path.display().to_string(),
            reason: e.to_string(),
        };

        // One byte past the limit is enough to tell an oversized artifact apart
        let mut bytes = Vec::new();
        File::open(&self.path)
            .map_err(unreadable)?
            .take(MAX_TOKEN_LENGTH as u64 + 1)
            .read_to_end(&mut bytes)
            .map_err(unreadable)?;
        if bytes.len() > MAX_TOKEN_LENGTH {
            return Err(Error::TokenTooLarge {
                size: bytes.len(),
                max: MAX_TOKEN_LENGTH,
            });
        }

        tracing::debug!(path = %self.path.display(), len = bytes.len(), "read token artifact");

        RawToken::from_artifact(bytes)
            .ok_or_else(|| Error::TokenEmpty(self.path.display().to_string()))
    }
}
