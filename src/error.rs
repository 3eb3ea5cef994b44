// Client-side error taxonomy for backend calls and navigation
use thiserror::Error;

/// Failure of one backend call, classified by where it went wrong
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ClientError {
    // 4xx: caller-data problems, expired session (401), denied access (403)
    #[error("request failed with status {status}: {message}")]
    Client { status: u16, message: String },

    // 5xx: backend fault
    #[error("server error {status}: {message}")]
    Server { status: u16, message: String },

    // Transport failure, including timeouts
    #[error("network error: {0}")]
    Network(String),

    // 2xx response whose envelope reported `success: false`
    #[error("{0}")]
    Rejected(String),

    // Body did not match the expected envelope
    #[error("invalid response body: {0}")]
    Decode(String),
}

impl ClientError {
    /// Classify a non-success HTTP status
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        if status >= 500 {
            ClientError::Server { status, message }
        } else {
            ClientError::Client { status, message }
        }
    }

    /// HTTP status, when the failure came from a response
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Client { status, .. } | ClientError::Server { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            ClientError::Client { message, .. } => message,
            ClientError::Server { message, .. } => message,
            ClientError::Network(msg) => msg,
            ClientError::Rejected(msg) => msg,
            ClientError::Decode(msg) => msg,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(401)
    }

    pub fn is_forbidden(&self) -> bool {
        self.status() == Some(403)
    }

    pub fn is_network(&self) -> bool {
        matches!(self, ClientError::Network(_))
    }

    /// Get error code for caller-side messaging
    pub fn error_code(&self) -> &'static str {
        match self {
            ClientError::Client { status: 400, .. } => "BAD_REQUEST",
            ClientError::Client { status: 401, .. } => "UNAUTHORIZED",
            ClientError::Client { status: 403, .. } => "FORBIDDEN",
            ClientError::Client { status: 404, .. } => "NOT_FOUND",
            ClientError::Client { status: 409, .. } => "CONFLICT",
            ClientError::Client { status: 422, .. } => "UNPROCESSABLE_ENTITY",
            ClientError::Client { status: 429, .. } => "TOO_MANY_REQUESTS",
            ClientError::Client { .. } => "CLIENT_ERROR",
            ClientError::Server { status: 502, .. } => "BAD_GATEWAY",
            ClientError::Server { status: 503, .. } => "SERVICE_UNAVAILABLE",
            ClientError::Server { .. } => "INTERNAL_SERVER_ERROR",
            ClientError::Network(_) => "NETWORK_ERROR",
            ClientError::Rejected(_) => "REJECTED",
            ClientError::Decode(_) => "INVALID_RESPONSE",
        }
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(err: serde_json::Error) -> Self {
        ClientError::Decode(err.to_string())
    }
}

/// Navigation could not settle on a route
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NavigationError {
    #[error("navigation to {path} exceeded {hops} redirects")]
    RedirectLoop { path: String, hops: usize },
}
