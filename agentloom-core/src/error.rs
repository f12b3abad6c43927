//! Error types for the Agentloom core library.
//!
//! Every fallible operation in the client returns [`AgentloomResult`]. Errors
//! are reported to the user and never abort the process, so each variant
//! carries enough context to be printed on its own.
//!
//! # Error Codes Reference
//!
//! | Code Range | Category | Description |
//! |------------|----------|-------------|
//! | E1001-E1099 | Auth | Login, MFA, token storage and session errors |
//! | E2001-E2099 | Config | Environment, config file, and validation errors |
//! | E3001-E3099 | API | Transport, server-reported and decoding errors |
//! | E4001-E4099 | Stream | Chat stream transport and protocol errors |
//! | E5001-E5099 | Wizard | Step validation and follow-up failures |
//! | E9001-E9099 | General | Internal, IO and serialization errors |

use std::fmt;
use thiserror::Error;
use tracing::{error, warn};

#[derive(Debug, Error)]
pub enum AgentloomError {
    // ========================================================================
    // Auth Errors (E1001-E1099)
    // ========================================================================
    /// No token is stored and the endpoint requires one
    #[error("[E1001] Not logged in")]
    NotAuthenticated,

    /// Server rejected the credentials or the token
    #[error("[E1002] Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// Login succeeded partially and a second factor is required
    #[error("[E1003] Multi-factor verification required")]
    MfaRequired { challenge_token: String },

    /// Token store could not be read or written
    #[error("[E1004] Token storage error: {0}")]
    TokenStorage(String),

    /// Server denied the action for the current user
    #[error("[E1005] Permission denied: {0}")]
    PermissionDenied(String),

    // ========================================================================
    // Configuration Errors (E2001-E2099)
    // ========================================================================
    /// Configuration file parse error
    #[error("[E2001] Failed to parse configuration: {0}")]
    ConfigParseError(String),

    /// Invalid configuration value
    #[error("[E2002] Invalid configuration value for '{key}': {message}")]
    InvalidConfigValue { key: String, message: String },

    /// Required configuration is missing
    #[error("[E2003] Missing required configuration: {0}")]
    MissingConfig(String),

    // ========================================================================
    // API Errors (E3001-E3099)
    // ========================================================================
    /// Request could not be sent or the connection broke
    #[error("[E3001] API request failed: {0}")]
    ApiRequestFailed(String),

    /// Response body did not match the expected shape
    #[error("[E3002] Failed to parse API response: {0}")]
    ApiParseError(String),

    /// Server answered with a non-success status; `detail` is surfaced verbatim
    #[error("[E3003] {detail}")]
    Server { status: u16, detail: String },

    /// Resource does not exist
    #[error("[E3004] Not found: {0}")]
    NotFound(String),

    /// Server could not be reached at all
    #[error("[E3005] Service unavailable: {0}")]
    ServiceUnavailable(String),

    /// Request exceeded its deadline
    #[error("[E3006] Request timed out after {0} seconds")]
    Timeout(u64),

    // ========================================================================
    // Stream Errors (E4001-E4099)
    // ========================================================================
    /// Chat stream broke mid-read
    #[error("[E4001] Connection error: {0}")]
    StreamInterrupted(String),

    /// Chat stream produced no data within the idle window
    #[error("[E4002] Chat stream idle for {0} seconds")]
    StreamIdle(u64),

    // ========================================================================
    // Wizard Errors (E5001-E5099)
    // ========================================================================
    /// A required field of the current step is missing or invalid
    #[error("[E5001] {field}: {message}")]
    Validation { field: String, message: String },

    /// The wizard cannot move in the requested direction
    #[error("[E5002] Invalid wizard transition: {0}")]
    InvalidTransition(String),

    /// A post-create step failed; the created resource is kept
    #[error("[E5003] Follow-up '{step}' failed: {message}")]
    FollowUpFailed { step: String, message: String },

    // ========================================================================
    // General Errors (E9001-E9099)
    // ========================================================================
    /// Internal error (unexpected state)
    #[error("[E9001] Internal error: {0}")]
    Internal(String),

    /// Operation not supported
    #[error("[E9002] Not supported: {0}")]
    NotSupported(String),

    /// IO error
    #[error("[E9003] IO error: {0}")]
    IoError(String),

    /// Serialization error
    #[error("[E9004] Serialization error: {0}")]
    SerializationError(String),
}

impl AgentloomError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        AgentloomError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn server(status: u16, detail: impl Into<String>) -> Self {
        AgentloomError::Server {
            status,
            detail: detail.into(),
        }
    }

    /// Map a failed HTTP status and its body to an error.
    ///
    /// Bodies shaped like `{"detail": "..."}` keep the detail text as-is. FastAPI
    /// style validation lists (`{"detail": [{"msg": ...}]}`) are joined.
    pub fn from_response(status: u16, body: &str) -> Self {
        let detail = extract_detail(body).unwrap_or_else(|| {
            if body.trim().is_empty() {
                format!("Request failed with status {}", status)
            } else {
                body.trim().to_string()
            }
        });

        match status {
            401 => AgentloomError::AuthenticationFailed(detail),
            403 => AgentloomError::PermissionDenied(detail),
            404 => AgentloomError::NotFound(detail),
            502..=504 => AgentloomError::ServiceUnavailable(detail),
            _ => AgentloomError::server(status, detail),
        }
    }
}

fn extract_detail(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    match value.get("detail")? {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Array(items) => {
            let messages: Vec<String> = items
                .iter()
                .filter_map(|item| item.get("msg").and_then(|m| m.as_str()))
                .map(str::to_string)
                .collect();
            if messages.is_empty() {
                None
            } else {
                Some(messages.join("; "))
            }
        }
        other => Some(other.to_string()),
    }
}

/// Result type alias for Agentloom operations.
pub type AgentloomResult<T> = Result<T, AgentloomError>;

// ============================================================================
// From trait implementations for seamless error propagation
// ============================================================================

impl From<reqwest::Error> for AgentloomError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            AgentloomError::Timeout(30)
        } else if err.is_connect() {
            AgentloomError::ServiceUnavailable(err.to_string())
        } else if err.is_status() {
            match err.status().map(|s| s.as_u16()) {
                Some(401) => AgentloomError::AuthenticationFailed(err.to_string()),
                Some(403) => AgentloomError::PermissionDenied(err.to_string()),
                Some(404) => AgentloomError::NotFound(err.to_string()),
                Some(code) => AgentloomError::server(code, err.to_string()),
                None => AgentloomError::ApiRequestFailed(err.to_string()),
            }
        } else if err.is_decode() {
            AgentloomError::ApiParseError(err.to_string())
        } else {
            AgentloomError::ApiRequestFailed(err.to_string())
        }
    }
}

impl From<serde_json::Error> for AgentloomError {
    fn from(err: serde_json::Error) -> Self {
        AgentloomError::SerializationError(err.to_string())
    }
}

impl From<std::io::Error> for AgentloomError {
    fn from(err: std::io::Error) -> Self {
        AgentloomError::IoError(err.to_string())
    }
}

impl From<toml::ser::Error> for AgentloomError {
    fn from(err: toml::ser::Error) -> Self {
        AgentloomError::SerializationError(err.to_string())
    }
}

impl From<config::ConfigError> for AgentloomError {
    fn from(err: config::ConfigError) -> Self {
        match err {
            config::ConfigError::NotFound(key) => AgentloomError::InvalidConfigValue {
                key,
                message: "Key not found".to_string(),
            },
            config::ConfigError::FileParse { uri, cause } => AgentloomError::ConfigParseError(
                format!("Failed to parse {}: {}", uri.unwrap_or_default(), cause),
            ),
            config::ConfigError::Type {
                origin,
                unexpected,
                expected,
                key,
            } => AgentloomError::InvalidConfigValue {
                key: key.unwrap_or_else(|| origin.map(|o| o.to_string()).unwrap_or_default()),
                message: format!("Expected {}, got {}", expected, unexpected),
            },
            _ => AgentloomError::ConfigParseError(err.to_string()),
        }
    }
}

// ============================================================================
// Error categorization helpers
// ============================================================================

impl AgentloomError {
    /// Returns true if this error means the user must (re)authenticate.
    pub fn is_auth_error(&self) -> bool {
        matches!(
            self,
            AgentloomError::NotAuthenticated
                | AgentloomError::AuthenticationFailed(_)
                | AgentloomError::MfaRequired { .. }
                | AgentloomError::TokenStorage(_)
        )
    }

    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            AgentloomError::ConfigParseError(_)
                | AgentloomError::InvalidConfigValue { .. }
                | AgentloomError::MissingConfig(_)
        )
    }

    pub fn is_stream_error(&self) -> bool {
        matches!(
            self,
            AgentloomError::StreamInterrupted(_) | AgentloomError::StreamIdle(_)
        )
    }

    /// Returns true if the same request could succeed later unchanged.
    ///
    /// The client never retries on its own; this only drives the hint printed
    /// next to the error.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            AgentloomError::ServiceUnavailable(_)
                | AgentloomError::Timeout(_)
                | AgentloomError::StreamInterrupted(_)
                | AgentloomError::StreamIdle(_)
                | AgentloomError::ApiRequestFailed(_)
        )
    }

    /// Returns an error code suitable for logging or external reporting.
    pub fn error_code(&self) -> &'static str {
        match self {
            AgentloomError::NotAuthenticated => "E1001",
            AgentloomError::AuthenticationFailed(_) => "E1002",
            AgentloomError::MfaRequired { .. } => "E1003",
            AgentloomError::TokenStorage(_) => "E1004",
            AgentloomError::PermissionDenied(_) => "E1005",
            AgentloomError::ConfigParseError(_) => "E2001",
            AgentloomError::InvalidConfigValue { .. } => "E2002",
            AgentloomError::MissingConfig(_) => "E2003",
            AgentloomError::ApiRequestFailed(_) => "E3001",
            AgentloomError::ApiParseError(_) => "E3002",
            AgentloomError::Server { .. } => "E3003",
            AgentloomError::NotFound(_) => "E3004",
            AgentloomError::ServiceUnavailable(_) => "E3005",
            AgentloomError::Timeout(_) => "E3006",
            AgentloomError::StreamInterrupted(_) => "E4001",
            AgentloomError::StreamIdle(_) => "E4002",
            AgentloomError::Validation { .. } => "E5001",
            AgentloomError::InvalidTransition(_) => "E5002",
            AgentloomError::FollowUpFailed { .. } => "E5003",
            AgentloomError::Internal(_) => "E9001",
            AgentloomError::NotSupported(_) => "E9002",
            AgentloomError::IoError(_) => "E9003",
            AgentloomError::SerializationError(_) => "E9004",
        }
    }

    /// Returns a user-friendly suggestion for how to resolve this error.
    pub fn user_suggestion(&self) -> Option<&'static str> {
        match self {
            AgentloomError::NotAuthenticated => Some("Run 'agentloom login' first"),
            AgentloomError::AuthenticationFailed(_) => {
                Some("Your session may have expired. Run 'agentloom login' again")
            }
            AgentloomError::MfaRequired { .. } => {
                Some("Complete sign-in with 'agentloom login --mfa-code <code>'")
            }
            AgentloomError::PermissionDenied(_) => {
                Some("Ask an administrator to grant the required permission")
            }
            AgentloomError::ServiceUnavailable(_) => {
                Some("Check that the API base URL is correct and the server is running")
            }
            AgentloomError::MissingConfig(_) | AgentloomError::InvalidConfigValue { .. } => {
                Some("Run 'agentloom config init' to create a configuration file")
            }
            _ => None,
        }
    }

    /// Log this error with appropriate severity level.
    pub fn log(&self) {
        let code = self.error_code();
        let suggestion = self.user_suggestion();

        if self.is_transient() {
            warn!(
                error_code = %code,
                suggestion = suggestion,
                "Transient error occurred: {}",
                self
            );
        } else {
            error!(
                error_code = %code,
                suggestion = suggestion,
                "Error occurred: {}",
                self
            );
        }
    }
}

// ============================================================================
// User-friendly error formatting for CLI
// ============================================================================

/// Format an error for CLI display with suggestions.
pub struct CliErrorDisplay<'a> {
    error: &'a AgentloomError,
    show_suggestion: bool,
}

impl<'a> CliErrorDisplay<'a> {
    pub fn new(error: &'a AgentloomError) -> Self {
        Self {
            error,
            show_suggestion: true,
        }
    }

    pub fn without_suggestion(mut self) -> Self {
        self.show_suggestion = false;
        self
    }
}

impl<'a> fmt::Display for CliErrorDisplay<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.error)?;

        if self.show_suggestion {
            if let Some(suggestion) = self.error.user_suggestion() {
                writeln!(f)?;
                writeln!(f, "  Suggestion: {}", suggestion)?;
            }
        }

        if self.error.is_transient() {
            writeln!(f)?;
            writeln!(f, "  This error may be temporary. Try the command again.")?;
        }

        Ok(())
    }
}
