//! Domain errors for extraction, fetching and persistence.

use reqwest::StatusCode;

#[derive(thiserror::Error, Debug)]
pub enum ScrapeError {
    #[error("missing required section: {0}")]
    MissingRequiredSection(&'static str),

    #[error("malformed date in {field}: {value:?} (expected DD-MM-YYYY)")]
    MalformedDate { field: &'static str, value: String },

    #[error("no response from {url} after {attempts} attempts (last error: {cause})")]
    NoResponse {
        url: String,
        attempts: u32,
        cause: String,
    },

    #[error("listing page yielded no member identifiers")]
    EmptyIdentifierUniverse,

    #[error("invalid member identifier {0:?}")]
    InvalidIdentifier(String),

    #[error("identifier {0} is not in the current identifier universe")]
    UnknownIdentifier(String),

    #[error("unexpected status {status} for {url}")]
    HttpStatus { url: String, status: StatusCode },

    #[error("invalid throttle mean {0}s")]
    InvalidThrottle(f64),

    #[error("selector error: {0}")]
    Selector(String),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl ScrapeError {
    /// Fatal errors end the whole run; the rest only abort the current record.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::NoResponse { .. } | Self::EmptyIdentifierUniverse
        )
    }
}
