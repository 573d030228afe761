use std::fmt;
use thiserror::Error;

/// Hosted service a remote call was made to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Service {
    Embedding,
    Completion,
}

impl fmt::Display for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Service::Embedding => write!(f, "embedding"),
            Service::Completion => write!(f, "completion"),
        }
    }
}

/// Errors produced by the retrieval pipeline
#[derive(Debug, Error)]
pub enum RagError {
    /// Missing credential, missing directory or an invalid knob
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A source file that is not valid UTF-8 text
    #[error("cannot decode {file}: {message}")]
    Decode { file: String, message: String },

    /// The embedding or completion call failed or timed out
    #[error("{service} service error: {message}")]
    RemoteService {
        service: Service,
        message: String,
        timed_out: bool,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl RagError {
    pub fn remote(service: Service, message: impl Into<String>) -> Self {
        RagError::RemoteService {
            service,
            message: message.into(),
            timed_out: false,
        }
    }

    pub fn timeout(service: Service) -> Self {
        RagError::RemoteService {
            service,
            message: "request timed out".to_string(),
            timed_out: true,
        }
    }

    /// Map a transport failure of `reqwest` onto the taxonomy
    pub fn from_http(service: Service, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            RagError::timeout(service)
        } else {
            RagError::remote(service, err.to_string())
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, RagError::RemoteService { timed_out: true, .. })
    }
}

pub type Result<T> = std::result::Result<T, RagError>;
