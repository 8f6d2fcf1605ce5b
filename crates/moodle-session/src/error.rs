//! Error types for session loading and course scraping.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("failed to read {path:?}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{path:?} is not a mozLz4 session archive")]
    UnrecognizedArchive { path: PathBuf },

    #[error("failed to decompress session archive {path:?}")]
    Decompress {
        path: PathBuf,
        #[source]
        source: lz4_flex::block::DecompressError,
    },

    #[error("no Firefox session archive found")]
    NoSessionArchive,

    #[error("invalid host {0:?}")]
    InvalidHost(String),

    #[error("malformed JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("could not find the session key on the course page")]
    MissingSessionKey,

    #[error("platform error {code}: {message}")]
    Platform { code: String, message: String },

    #[error("unexpected page structure: {0}")]
    Scrape(String),

    #[error("unknown group {0:?}")]
    UnknownGroup(String),

    #[error("unknown participant {0:?}")]
    UnknownParticipant(String),

    #[error("group update for user {user_id} was not applied")]
    UpdateNotApplied { user_id: u64 },

    #[error("could not read last access {text:?}")]
    LastAccess {
        text: String,
        #[source]
        source: lateness::ParseError,
    },
}

pub type Result<T> = std::result::Result<T, SessionError>;
