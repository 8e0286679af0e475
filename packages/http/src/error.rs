use mountfs_core::Error as CoreError;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// No response arrived: connection refused, timeout, broken body.
    #[error("request to {url} failed: {message}")]
    Request { url: String, message: String },

    #[error("received HTTP status {status} from {url}")]
    Status { status: u16, url: String },

    #[error("undecodable response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),
}

impl From<Error> for CoreError {
    fn from(error: Error) -> Self {
        match error {
            Error::Request { .. } | Error::Status { .. } => CoreError::transport(error.to_string()),
            Error::Decode { .. } => CoreError::malformed(0, error.to_string()),
            Error::UrlParse(_) => CoreError::invalid_config(error.to_string()),
        }
    }
}
