use thiserror::Error;

/// Failure surface of the network boundary. Callers decide recovery; the
/// gateway itself never retries.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Missing or rejected credential. Recovered by prompting sign-in.
    #[error("sign-in required")]
    AuthRequired,

    /// The requested content does not exist. Rendered as an empty state,
    /// not treated as an exceptional path.
    #[error("not found")]
    NotFound,

    /// Any other non-2xx response. `message` carries the raw response body.
    #[error("remote error ({status}): {message}")]
    Remote { status: u16, message: String },

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
}

impl GatewayError {
    /// Map a non-2xx status + body to the error taxonomy.
    pub fn from_status(status: u16, message: String) -> Self {
        match status {
            401 => GatewayError::AuthRequired,
            404 => GatewayError::NotFound,
            _ => GatewayError::Remote { status, message },
        }
    }
}
