//! Defines the crate-level [`Error`] type returned by [`crate::store`]
//! operations.

use std::io;
use std::path::{Path, PathBuf};

/// Represents the result of an article-store operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error reading or deriving articles.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Returned when the article directory or a specific article file does
    /// not exist.
    #[error("not found: `{}`", .path.display())]
    NotFound { path: PathBuf },

    /// Returned when an article's front-matter block can't be parsed. The
    /// store recovers from this by treating the front-matter as empty, so
    /// callers of [`crate::store::ArticleStore`] only see it in logs.
    #[error("malformed front-matter in `{id}`: {reason}")]
    MalformedFrontMatter { id: String, reason: String },

    /// Returned for I/O failures other than a missing file.
    #[error("reading `{}`: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Returned when serializing articles to JSON fails.
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Classifies an [`io::Error`] raised while reading `path`: a missing file
    /// becomes [`Error::NotFound`], anything else [`Error::Io`].
    pub(crate) fn from_io(path: &Path, err: io::Error) -> Error {
        match err.kind() {
            io::ErrorKind::NotFound => Error::NotFound {
                path: path.to_owned(),
            },
            _ => Error::Io {
                path: path.to_owned(),
                source: err,
            },
        }
    }

    /// Returns true for [`Error::NotFound`].
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound { .. })
    }
}
