//! Typed error handling for the stark admin
//!
//! Only programming mistakes and infrastructure failures are errors here.
//! A form that fails validation or an edit on a missing row are ordinary
//! responses, not errors.
//!
//! # Error Categories
//!
//! - [`ConfigError`]: registration and declaration mistakes (unknown column,
//!   duplicate registration, unknown route name, ...)
//! - [`RequestError`]: requests that cannot be routed or parsed
//! - [`StorageError`]: failures reported by a data source
//!
//! # Example
//!
//! ```rust,ignore
//! match site.urls().reverse("stark:app_host_list", &[]) {
//!     Ok(path) => println!("{path}"),
//!     Err(StarkError::Config(ConfigError::UnknownRoute { name })) => {
//!         eprintln!("no route named {name}");
//!     }
//!     Err(e) => eprintln!("{e}"),
//! }
//! ```

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

/// The main error type for the admin
#[derive(Debug, thiserror::Error)]
pub enum StarkError {
    /// Declaration or registration mistakes
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Requests that cannot be routed or parsed
    #[error(transparent)]
    Request(#[from] RequestError),

    /// Data source failures
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// Internal errors (should not happen in normal operation)
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Error response structure for HTTP responses
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error code for programmatic handling
    pub code: String,
    /// Human-readable error message
    pub message: String,
}

impl StarkError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            StarkError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            StarkError::Request(e) => e.status_code(),
            StarkError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
            StarkError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error code for this error
    pub fn error_code(&self) -> &'static str {
        match self {
            StarkError::Config(e) => e.error_code(),
            StarkError::Request(e) => e.error_code(),
            StarkError::Storage(_) => "STORAGE_ERROR",
            StarkError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Convert to an error response
    pub fn to_response(&self) -> ErrorResponse {
        ErrorResponse {
            code: self.error_code().to_string(),
            message: self.to_string(),
        }
    }
}

impl IntoResponse for StarkError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::warn!(code = self.error_code(), error = %self, "request failed");
        }
        (status, Json(self.to_response())).into_response()
    }
}

impl From<anyhow::Error> for StarkError {
    fn from(err: anyhow::Error) -> Self {
        StarkError::Storage(StorageError(err))
    }
}

// =============================================================================
// Configuration Errors
// =============================================================================

/// Mistakes in how models, handlers and routes were declared
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A column, facet or form field names a field the model does not have
    #[error("{model} has no field named '{field}'")]
    UnknownField { model: String, field: String },

    /// The same model was registered twice under the same prefix
    #[error("{model} is already registered{}", prefix_suffix(.prefix))]
    DuplicateRegistration {
        model: String,
        prefix: Option<String>,
    },

    /// Two routes resolved to the same name
    #[error("route name '{name}' is already in use")]
    DuplicateRouteName { name: String },

    /// Two routes resolved to the same path
    #[error("route path '{path}' is served by both '{first}' and '{second}'")]
    DuplicateRoutePath {
        path: String,
        first: String,
        second: String,
    },

    /// Reverse lookup on a name nobody registered
    #[error("no route named '{name}'")]
    UnknownRoute { name: String },

    /// Reverse lookup without enough positional arguments
    #[error("route '{name}' expects {expected} argument(s), got {given}")]
    ArgumentMismatch {
        name: String,
        expected: usize,
        given: usize,
    },

    /// A relation field points at a model with no registered source
    #[error("no data source registered for related model '{model}'")]
    UnknownRelation { model: String },

    /// A configuration file could not be read
    #[error("failed to read configuration: {0}")]
    Io(#[from] std::io::Error),

    /// A configuration file could not be parsed
    #[error("invalid configuration: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

fn prefix_suffix(prefix: &Option<String>) -> String {
    prefix
        .as_ref()
        .map(|p| format!(" with prefix '{}'", p))
        .unwrap_or_default()
}

impl ConfigError {
    pub fn error_code(&self) -> &'static str {
        match self {
            ConfigError::UnknownField { .. } => "UNKNOWN_FIELD",
            ConfigError::DuplicateRegistration { .. } => "DUPLICATE_REGISTRATION",
            ConfigError::DuplicateRouteName { .. } => "DUPLICATE_ROUTE_NAME",
            ConfigError::DuplicateRoutePath { .. } => "DUPLICATE_ROUTE_PATH",
            ConfigError::UnknownRoute { .. } => "UNKNOWN_ROUTE",
            ConfigError::ArgumentMismatch { .. } => "ROUTE_ARGUMENT_MISMATCH",
            ConfigError::UnknownRelation { .. } => "UNKNOWN_RELATION",
            ConfigError::Io(_) => "CONFIG_IO_ERROR",
            ConfigError::Yaml(_) => "CONFIG_PARSE_ERROR",
        }
    }
}

// =============================================================================
// Request Errors
// =============================================================================

/// Requests that cannot be routed or understood
#[derive(Debug, thiserror::Error)]
pub enum RequestError {
    /// No route matches the path
    #[error("no admin route matches '{path}'")]
    RouteNotFound { path: String },

    /// A path argument expected to be a primary key is not an integer
    #[error("'{value}' is not a valid primary key")]
    InvalidPrimaryKey { value: String },

    /// The request body could not be decoded
    #[error("malformed request body: {message}")]
    MalformedBody { message: String },

    /// Admin views only answer GET and POST
    #[error("method {method} is not allowed")]
    MethodNotAllowed { method: String },
}

impl RequestError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            RequestError::RouteNotFound { .. } => StatusCode::NOT_FOUND,
            RequestError::InvalidPrimaryKey { .. } => StatusCode::NOT_FOUND,
            RequestError::MalformedBody { .. } => StatusCode::BAD_REQUEST,
            RequestError::MethodNotAllowed { .. } => StatusCode::METHOD_NOT_ALLOWED,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            RequestError::RouteNotFound { .. } => "ROUTE_NOT_FOUND",
            RequestError::InvalidPrimaryKey { .. } => "INVALID_PRIMARY_KEY",
            RequestError::MalformedBody { .. } => "MALFORMED_BODY",
            RequestError::MethodNotAllowed { .. } => "METHOD_NOT_ALLOWED",
        }
    }
}

// =============================================================================
// Storage Errors
// =============================================================================

/// A failure reported by a data source
#[derive(Debug, thiserror::Error)]
#[error("storage error: {0}")]
pub struct StorageError(pub anyhow::Error);
