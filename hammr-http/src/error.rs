use std::time::Duration;

pub type Result<T> = std::result::Result<T, Error>;

/// Stable label for a failed exchange, used as a log field by the handlers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum HttpTransportErrorKind {
    InvalidUrl,
    UnsupportedScheme,
    InvalidRequest,
    Send,
    Timeout,
    Body,
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid url: {0}")]
    InvalidUrl(String),

    #[error("only http:// and https:// URLs are supported: {0}")]
    UnsupportedScheme(String),

    /// A header or body the request builder refused.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("request to node failed: {0}")]
    Send(#[from] hyper_util::client::legacy::Error),

    #[error("node did not answer within {0:?}")]
    Timeout(Duration),

    #[error("failed to read response body: {0}")]
    Body(#[from] hyper::Error),
}

impl Error {
    #[must_use]
    pub fn transport_error_kind(&self) -> HttpTransportErrorKind {
        match self {
            Self::InvalidUrl(_) => HttpTransportErrorKind::InvalidUrl,
            Self::UnsupportedScheme(_) => HttpTransportErrorKind::UnsupportedScheme,
            Self::InvalidRequest(_) => HttpTransportErrorKind::InvalidRequest,
            Self::Send(_) => HttpTransportErrorKind::Send,
            Self::Timeout(_) => HttpTransportErrorKind::Timeout,
            Self::Body(_) => HttpTransportErrorKind::Body,
        }
    }
}
