//! Error types for the companion gateway

use thiserror::Error;

/// Result type alias for gateway operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in the companion gateway
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Connection reset by the upstream peer (retryable)
    #[error("transport reset: {0}")]
    TransportReset(String),

    /// Upstream rejected the request (auth, quota, bad request, server error)
    #[error("upstream rejected request with status {status}: {body}")]
    UpstreamRejected { status: u16, body: String },

    /// Upstream answered with a body we could not interpret
    #[error("malformed upstream response: {0}")]
    MalformedResponse(String),

    /// Chat completion failed
    #[error("chat completion failed: {0}")]
    Completion(Box<Error>),

    /// Text-to-speech error
    #[error("TTS error: {0}")]
    Tts(Box<Error>),

    /// Audio playback error
    #[error("audio error: {0}")]
    Audio(String),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP error
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Base64 decoding error
    #[error("decode error: {0}")]
    Decode(#[from] base64::DecodeError),
}

impl Error {
    /// Whether this error is a connection reset that is safe to retry
    #[must_use]
    pub const fn is_transport_reset(&self) -> bool {
        matches!(self, Self::TransportReset(_))
    }
}
