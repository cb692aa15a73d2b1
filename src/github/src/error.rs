/// Errors from the GitHub contents client
#[derive(Debug, thiserror::Error)]
pub enum GithubError {
    /// HTTP transport error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    /// API returned an error response
    #[error("API error ({status}): {message}")]
    Api {
        /// HTTP status code
        status: u16,
        /// Error message from the API
        message: String,
    },
    /// JSON deserialization error
    #[error("Deserialization error: {0}")]
    Deserialize(#[from] serde_json::Error),
    /// File content was not valid base64
    #[error("Base64 decode error: {0}")]
    Decode(#[from] base64::DecodeError),
    /// A build descriptor was missing or could not be interpreted
    #[error("Descriptor error: {0}")]
    Descriptor(String),
    /// Client configuration could not be turned into request headers
    #[error("Invalid client configuration: {0}")]
    Config(String),
}

impl GithubError {
    /// Whether this is an API response with the given status code
    pub fn is_status(&self, code: u16) -> bool {
        matches!(self, GithubError::Api { status, .. } if *status == code)
    }
}
