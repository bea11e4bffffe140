use thiserror::Error;

/// Failure talking to the archive backend.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Invalid response: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for GatewayError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            GatewayError::Decode(err.to_string())
        } else {
            GatewayError::Network(err.to_string())
        }
    }
}

pub type GatewayResult<T> = Result<T, GatewayError>;

/// Input rejected before anything is sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Plate number is required")]
    EmptyPlateNumber,

    #[error("Reject reason is required")]
    EmptyRejectReason,
}

/// A listing call that produced nothing to apply.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("Failed to load requests: {0}")]
    Gateway(#[from] GatewayError),

    #[error("Failed to load requests: response carried no data")]
    MissingData,

    /// A newer load for the same list was issued before this one resolved.
    #[error("Superseded by a newer load")]
    Superseded,
}

/// An approve/reject/rollback submission that did not go through.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ActionError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("An action for request {0} is already in progress")]
    InProgress(String),

    #[error("Action failed: {0}")]
    Gateway(#[from] GatewayError),

    #[error("Action failed: the server did not accept it")]
    Unsuccessful,
}

/// A new-request submission that did not go through.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmissionError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Failed to send request: {0}")]
    Gateway(#[from] GatewayError),

    #[error("Failed to send request: the server did not accept it")]
    Unsuccessful,
}
