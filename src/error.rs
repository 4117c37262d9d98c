use reqwest::StatusCode;
use thiserror::Error;

/// Failures of a single listing fetch. All of them end up as a
/// `PostsError` message on the presenter side.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The content API answered with a non-success status.
    #[error("listing request failed with status {0}")]
    Status(StatusCode),

    /// The request never produced a response (DNS, TLS, connection reset).
    #[error("listing request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The body was not the expected listing shape.
    #[error("invalid response body: {0}")]
    Malformed(String),

    /// Well-formed listing without items.
    #[error(
        "no posts returned; ensure the source name is spelled correctly (private sources are inaccessible)"
    )]
    EmptySource,

    /// A configured title replacement pattern does not compile.
    #[error("invalid title replacement pattern: {0}")]
    TitleRule(#[from] regex::Error),

    /// The configured base URL cannot be combined into a request URL.
    #[error("invalid listing url: {0}")]
    Url(#[from] url::ParseError),
}
