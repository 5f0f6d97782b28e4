// Copyright (c) Verse Bridge Explorer
// SPDX-License-Identifier: Apache-2.0

use thiserror::Error;

/// Failures talking to the bridge indexer
#[derive(Debug, Error)]
pub enum IndexerError {
    #[error("indexer transport error: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("indexer request timed out")]
    Timeout,

    #[error("indexer returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("indexer query failed: {}", .0.join("; "))]
    Graphql(Vec<String>),

    #[error("malformed indexer response: {0}")]
    MalformedResponse(String),

    #[error("request cancelled")]
    Cancelled,
}

impl From<reqwest::Error> for IndexerError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            IndexerError::Timeout
        } else if e.is_decode() {
            IndexerError::MalformedResponse(e.to_string())
        } else {
            IndexerError::Transport(e)
        }
    }
}

/// Invalid or missing settings, reported once at startup
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set in environment")]
    Missing(&'static str),

    #[error("{name} has invalid value '{value}': {reason}")]
    Invalid {
        name: &'static str,
        value: String,
        reason: String,
    },
}
