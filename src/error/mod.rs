use axum::http::StatusCode;
use std::error::Error as StdError;
use std::fmt::Display;
use thiserror::Error;

pub mod codes;
pub mod helpers;

pub use codes::{describe_error_code, ErrorCode};
pub use helpers::{common, ErrorExt};

type BoxedSource = Box<dyn StdError + Send + Sync>;

/// The unified error type for brain-service
#[derive(Error, Debug)]
pub enum BrainError {
    #[error("[E{code:04}] Configuration error: {message}")]
    Config {
        code: u16,
        message: String,
        #[source]
        source: Option<BoxedSource>,
    },

    #[error("[E{code:04}] Invalid parameter: {message}")]
    InvalidParameter {
        code: u16,
        message: String,
        field: Option<String>,
    },

    #[error("[E{code:04}] Bad request: {message}")]
    BadRequest { code: u16, message: String },

    #[error("[E{code:04}] Not found: {message}")]
    NotFound {
        code: u16,
        message: String,
        resource: Option<String>,
    },

    /// `partial_write` is set when an upstream mutation was already issued
    /// before the failure, so callers know the two services may disagree.
    #[error("[E{code:04}] Internal error: {message}")]
    Internal {
        code: u16,
        message: String,
        partial_write: bool,
        #[source]
        source: Option<BoxedSource>,
    },

    #[error("[E{code:04}] Upstream {service} error: {message}")]
    Upstream {
        code: u16,
        message: String,
        service: String,
        status: Option<u16>,
        #[source]
        source: Option<BoxedSource>,
    },
}

impl BrainError {
    /// Create a configuration error with default code
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            code: ErrorCode::CONFIG_GENERIC,
            message: message.into(),
            source: None,
        }
    }

    /// Create a configuration error with specific code
    pub fn config_with_code(code: u16, message: impl Into<String>) -> Self {
        Self::Config {
            code,
            message: message.into(),
            source: None,
        }
    }

    /// Create an invalid parameter error with default code
    pub fn invalid_parameter(message: impl Into<String>) -> Self {
        Self::InvalidParameter {
            code: ErrorCode::PARAM_GENERIC,
            message: message.into(),
            field: None,
        }
    }

    /// Create an invalid parameter error with specific code and field
    pub fn invalid_parameter_with_code(
        code: u16,
        message: impl Into<String>,
        field: Option<String>,
    ) -> Self {
        Self::InvalidParameter {
            code,
            message: message.into(),
            field,
        }
    }

    /// Create a bad request error with specific code
    pub fn bad_request_with_code(code: u16, message: impl Into<String>) -> Self {
        Self::BadRequest {
            code,
            message: message.into(),
        }
    }

    /// Create a not found error with default code
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            code: ErrorCode::NOT_FOUND_GENERIC,
            message: message.into(),
            resource: None,
        }
    }

    /// Create a not found error with specific code and resource id
    pub fn not_found_with_code(
        code: u16,
        message: impl Into<String>,
        resource: Option<String>,
    ) -> Self {
        Self::NotFound {
            code,
            message: message.into(),
            resource,
        }
    }

    /// Create an internal error with default code
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            code: ErrorCode::INTERNAL_GENERIC,
            message: message.into(),
            partial_write: false,
            source: None,
        }
    }

    /// Create an internal error with specific code
    pub fn internal_with_code(code: u16, message: impl Into<String>) -> Self {
        Self::Internal {
            code,
            message: message.into(),
            partial_write: false,
            source: None,
        }
    }

    /// Create an upstream error for a named service
    pub fn upstream(
        code: u16,
        service: impl Into<String>,
        status: Option<u16>,
        message: impl Into<String>,
    ) -> Self {
        Self::Upstream {
            code,
            message: message.into(),
            service: service.into(),
            status,
            source: None,
        }
    }

    /// Add a source error to this error
    ///
    /// Variants that carry no source are returned unchanged.
    pub fn with_source(mut self, source: impl Into<BoxedSource>) -> Self {
        match &mut self {
            Self::Config { source: src, .. }
            | Self::Internal { source: src, .. }
            | Self::Upstream { source: src, .. } => {
                *src = Some(source.into());
            }
            Self::InvalidParameter { .. } | Self::BadRequest { .. } | Self::NotFound { .. } => {}
        }
        self
    }

    /// Add context to the error message
    pub fn with_context(mut self, context: impl Display) -> Self {
        match &mut self {
            Self::Config { message, .. }
            | Self::InvalidParameter { message, .. }
            | Self::BadRequest { message, .. }
            | Self::NotFound { message, .. }
            | Self::Internal { message, .. }
            | Self::Upstream { message, .. } => {
                *message = format!("{}: {}", message, context);
            }
        }
        self
    }

    /// Mark an internal error as having happened after a mutation was issued.
    ///
    /// Any other variant is converted into an internal error first, keeping
    /// its message, since a failure after a write is never a client problem.
    pub fn after_partial_write(self) -> Self {
        match self {
            Self::Internal {
                code,
                message,
                source,
                ..
            } => Self::Internal {
                code,
                message,
                partial_write: true,
                source,
            },
            other => Self::Internal {
                code: ErrorCode::INTERNAL_GENERIC,
                message: other.user_message(),
                partial_write: true,
                source: Some(Box::new(other)),
            },
        }
    }

    /// Get the error code
    pub fn code(&self) -> u16 {
        match self {
            Self::Config { code, .. }
            | Self::InvalidParameter { code, .. }
            | Self::BadRequest { code, .. }
            | Self::NotFound { code, .. }
            | Self::Internal { code, .. }
            | Self::Upstream { code, .. } => *code,
        }
    }

    /// True when an upstream mutation was issued before this error occurred
    pub fn is_partial_write(&self) -> bool {
        matches!(
            self,
            Self::Internal {
                partial_write: true,
                ..
            }
        )
    }

    /// True for errors caused by the caller's input
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidParameter { .. } | Self::BadRequest { .. } | Self::NotFound { .. }
        )
    }

    /// HTTP status this error is reported with
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidParameter { .. } | Self::BadRequest { .. } => StatusCode::BAD_REQUEST,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::Config { .. } | Self::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Upstream { status, .. } => status
                .and_then(|s| StatusCode::from_u16(s).ok())
                .filter(|s| s.is_client_error() || s.is_server_error())
                .unwrap_or(StatusCode::BAD_GATEWAY),
        }
    }

    /// Get a user-facing message without codes or source chains
    pub fn user_message(&self) -> String {
        match self {
            Self::Config { message, .. } => format!("Configuration problem: {}", message),
            Self::InvalidParameter { message, field, .. } => match field {
                Some(f) => format!("Invalid parameter '{}': {}", f, message),
                None => format!("Invalid parameter: {}", message),
            },
            Self::BadRequest { message, .. } => message.clone(),
            Self::NotFound { message, .. } => message.clone(),
            Self::Internal {
                message,
                partial_write,
                ..
            } => {
                if *partial_write {
                    format!("{} (a partial update may have been applied)", message)
                } else {
                    message.clone()
                }
            }
            Self::Upstream { message, .. } => message.clone(),
        }
    }

    /// Get a developer-friendly error message with full chain
    pub fn developer_message(&self) -> String {
        let mut out = self.to_string();
        let mut current = StdError::source(self);
        while let Some(cause) = current {
            out.push_str(&format!("\n  caused by: {}", cause));
            current = StdError::source(cause);
        }
        out
    }

    /// Get the process exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config { .. } => 2,
            _ => 1,
        }
    }
}

/// Type alias for Results using BrainError
pub type Result<T> = std::result::Result<T, BrainError>;

impl From<serde_json::Error> for BrainError {
    fn from(err: serde_json::Error) -> Self {
        BrainError::internal("Failed to serialize JSON payload").with_source(err)
    }
}

impl From<toml::de::Error> for BrainError {
    fn from(err: toml::de::Error) -> Self {
        BrainError::config_with_code(ErrorCode::CONFIG_PARSE_ERROR, "Invalid TOML syntax")
            .with_source(err)
    }
}
