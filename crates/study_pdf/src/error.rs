//! Error types shared by the composer and the data URL helpers.

use thiserror::Error;

/// Failures while turning a data URL or raw bytes into a usable image.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The data URL did not contain the `base64,` marker.
    #[error("Invalid data URL: missing `base64,` marker")]
    MissingBase64Marker,

    /// The payload after the marker was not valid base64.
    #[error("Invalid base64 payload: {0}")]
    Base64(#[from] base64::DecodeError),

    /// The decoded bytes could not be read as an image.
    #[error("Unsupported or corrupt image: {0}")]
    Image(String),
}

/// Failures while composing a document.
#[derive(Debug, Error)]
pub enum ComposeError {
    /// Required content is missing, e.g. no sections were supplied.
    #[error("{0}")]
    Content(String),

    /// The background template could not be decoded into an image.
    #[error("Background template could not be used: {0}")]
    Background(#[source] DecodeError),

    /// No usable font family could be loaded.
    #[error("Fonts unavailable: {0}")]
    Fonts(#[source] genpdf::error::Error),

    /// The layout engine failed while rendering or serializing the document.
    #[error("Document layout failed: {0}")]
    Layout(#[from] genpdf::error::Error),

    /// The section outline could not be written into the rendered document.
    #[cfg(feature = "bookmarks")]
    #[error("Bookmark injection failed: {0}")]
    Bookmarks(#[from] crate::bookmarks::BookmarkError),
}

/// Coarse classification used by callers that map errors onto transport status codes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Missing or empty user input.
    Content,
    /// Unexpected failures inside composition.
    Layout,
}

impl ComposeError {
    /// Returns the category of this error.
    ///
    /// An undecodable background is reported as a layout failure: the template is validated as a
    /// data URL before composition starts, so a failure here happens inside the layout step.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Content(_) => ErrorCategory::Content,
            Self::Background(_) | Self::Fonts(_) | Self::Layout(_) => ErrorCategory::Layout,
            #[cfg(feature = "bookmarks")]
            Self::Bookmarks(_) => ErrorCategory::Layout,
        }
    }
}

/// Result alias for composition.
pub type Result<T> = std::result::Result<T, ComposeError>;
