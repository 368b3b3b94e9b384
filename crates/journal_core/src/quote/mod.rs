//! Inspirational quote fetch and single-slot cache.
//!
//! # Responsibility
//! - Fetch one quote with a single unauthenticated GET and decode it.
//! - Keep at most one cached quote locally.
//!
//! # Invariants
//! - A failed fetch is reported once; there is no retry or cancellation.
//! - Cache writes never surface errors to the caller.
//! - Quote text is never logged.

mod cache;
mod client;

pub use cache::{fetch_and_cache, QuoteCache, SqliteQuoteCache};
pub use client::{
    decode_quote_payload, QuoteClient, DEFAULT_QUOTE_BASE_URL, DEFAULT_QUOTE_TIMEOUT,
};

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type QuoteResult<T> = Result<T, QuoteError>;

/// Quote value decoded from the remote short-key JSON shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quote {
    #[serde(rename = "q")]
    pub quote: String,
    #[serde(rename = "a")]
    pub author: String,
}

impl Quote {
    pub fn new(quote: impl Into<String>, author: impl Into<String>) -> Self {
        Self {
            quote: quote.into(),
            author: author.into(),
        }
    }

    /// Two-paragraph display form: the quote, a blank line, `- author`.
    pub fn display_text(&self) -> String {
        format!("{}\n\n- {}", self.quote, self.author)
    }
}

/// Failure kinds of a quote fetch. None of them are retried.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuoteError {
    /// Configured base URL cannot be parsed.
    BaseUrl(String),
    /// Endpoint URL built from the base is invalid.
    BuiltUrl(String),
    /// Transport failed or the response body could not be read.
    InvalidData(String),
    /// The server responded without a quote.
    NoData,
    /// The server responded with a non-success status.
    StatusCode(u16),
    /// The payload is not a quote.
    UnableToDecode(String),
}

impl QuoteError {
    /// Stable machine-readable code for logs and FFI envelopes.
    pub fn code(&self) -> &'static str {
        match self {
            Self::BaseUrl(_) => "base_url",
            Self::BuiltUrl(_) => "built_url",
            Self::InvalidData(_) => "invalid_data",
            Self::NoData => "no_data",
            Self::StatusCode(_) => "status_code",
            Self::UnableToDecode(_) => "unable_to_decode",
        }
    }
}

impl Display for QuoteError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BaseUrl(detail) => {
                write!(f, "unable to reach the server due to invalid URL: {detail}")
            }
            Self::BuiltUrl(detail) => write!(
                f,
                "unable to reach the server due to invalid built URL: {detail}"
            ),
            Self::InvalidData(detail) => write!(f, "data error from API call: {detail}"),
            Self::NoData => write!(f, "the server responded with no data"),
            Self::StatusCode(status) => write!(f, "status code error: HTTP {status}"),
            Self::UnableToDecode(detail) => write!(f, "unable to decode data: {detail}"),
        }
    }
}

impl Error for QuoteError {}
