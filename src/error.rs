use std::path::PathBuf;

use thiserror::Error;

/// Failures while loading posts, docs, templates or dictionaries.
///
/// None of these reach a visitor directly: handlers log them and fall back
/// to an empty result or the not-found page.
#[derive(Debug, Error)]
pub enum ContentError {
    #[error("IO error when reading `{0}`")]
    Io(PathBuf, #[source] std::io::Error),

    #[error("invalid front matter in `{0}`: {1}")]
    FrontMatter(PathBuf, String),

    #[error("invalid message dictionary `{0}`")]
    Messages(PathBuf, #[source] serde_json::Error),

    #[error("hosted store request failed")]
    Http(#[from] reqwest::Error),

    #[error("hosted store answered with status {0}")]
    Status(reqwest::StatusCode),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Error, ErrorKind};

    #[test]
    fn io_error_names_the_path() {
        let err = ContentError::Io(
            PathBuf::from("content/layout.html"),
            Error::new(ErrorKind::NotFound, "missing"),
        );
        let display = err.to_string();
        assert!(display.contains("IO error"));
        assert!(display.contains("content/layout.html"));
    }

    #[test]
    fn status_error_shows_code() {
        let err = ContentError::Status(reqwest::StatusCode::UNAUTHORIZED);
        assert!(err.to_string().contains("401"));
    }
}
