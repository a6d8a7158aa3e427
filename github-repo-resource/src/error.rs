use thiserror::Error as ThisError;

/// Everything that can go wrong while processing a single CloudFormation event.
/// Only `InvalidEvent` and the errors from sending the response make it out of the handler,
/// the rest are logged and reported back to CloudFormation as FAILED.
#[derive(Debug, ThisError)]
pub enum Error {
    /// Bad env vars, only possible at cold start
    #[error("invalid configuration: {0}")]
    Config(String),

    /// The event cannot be addressed back to CloudFormation, e.g. no ResponseURL
    #[error("invalid CloudFormation event: {0}")]
    InvalidEvent(#[source] serde_json::Error),

    #[error("missing RequestType")]
    MissingRequestType,

    #[error("missing resource property: {0}")]
    MissingProperty(&'static str),

    #[error("invalid value for resource property {name}: {value:?}")]
    InvalidProperty { name: &'static str, value: String },

    /// Transport level failure: DNS, TLS, connection reset, etc.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// GitHub answered with a non-2xx status
    #[error("GitHub API error ({status}): {body}")]
    Api { status: u16, body: String },

    /// The pre-signed callback URL rejected the response
    #[error("CloudFormation callback rejected with status {status}: {body}")]
    Callback { status: u16, body: String },

    #[error("failed to serialize the response: {0}")]
    Serialize(#[source] serde_json::Error),
}
