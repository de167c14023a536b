//! Authentication error taxonomy.
//!
//! Every failure raised by this crate is an [`AuthError`]: a closed
//! [`AuthErrorKind`] carrying the stable code, plus optional public details,
//! an optional internal cause and a captured backtrace.
//!
//! Two serializations exist and must not be mixed up:
//! - [`ProblemDetails`] is safe to send to untrusted clients.
//! - [`LogRecord`] carries internal reasons, the cause chain and the
//!   backtrace, and only ever goes to logs.

use chrono::{DateTime, Utc};
use http::StatusCode;
use serde::Serialize;
use std::backtrace::{Backtrace, BacktraceStatus};
use std::collections::BTreeMap;
use std::error::Error as StdError;
use std::fmt;
use thiserror::Error;
use tracing::{error, warn};

/// Boxed error used as an internal diagnostic cause.
pub type BoxedCause = Box<dyn StdError + Send + Sync + 'static>;

/// Per-field validation messages.
pub type FieldErrors = BTreeMap<String, Vec<String>>;

/// Closed set of failure kinds. One variant per stable error code.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthErrorKind {
    /// No credential was presented
    #[error("authentication token missing")]
    MissingToken,

    /// Credential is structurally unusable before any crypto runs
    #[error("token malformed: {reason}")]
    Malformed {
        /// Internal description of the malformation
        reason: String,
    },

    /// Signature, algorithm or payload verification failed
    #[error("token invalid")]
    Invalid,

    /// Valid structure and signature, past expiration
    #[error("token expired at {expired_at}")]
    Expired {
        /// Expiration instant carried by the token
        expired_at: DateTime<Utc>,
    },

    /// Authenticated but not allowed
    #[error("forbidden: {reason}")]
    Forbidden {
        /// Client-safe reason
        reason: String,
    },

    /// Device binding violated
    #[error("device mismatch")]
    DeviceMismatch,

    /// Revocation store reported the token identifier
    #[error("token revoked")]
    Revoked,

    /// Configured algorithm cannot be served by the key provider
    #[error("unsupported algorithm: {algorithm}")]
    UnsupportedAlgorithm {
        /// Algorithm that was requested
        algorithm: String,
    },

    /// Referenced user does not exist
    #[error("user not found")]
    UserNotFound,

    /// Credential check failed
    #[error("password mismatch")]
    PasswordMismatch,

    /// Caller-raised domain failure
    #[error("{message}")]
    Business {
        /// Client-safe message
        message: String,
        /// Response status
        status: StatusCode,
    },

    /// Input rejected, with per-field messages
    #[error("validation failed: {message}")]
    Validation {
        /// Client-safe summary
        message: String,
        /// Offending fields
        fields: FieldErrors,
    },

    /// Key material could not be resolved
    #[error("key configuration error: {reason}")]
    Configuration {
        /// Internal description, never sent to clients
        reason: String,
    },

    /// Key material resolved but could not be parsed
    #[error("key import failed: {reason}")]
    KeyImport {
        /// Which key failed
        reason: String,
    },
}

/// Stable error codes for programmatic handling at the boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// `AUTH_MISSING_TOKEN`
    MissingToken,
    /// `AUTH_MALFORMED`
    Malformed,
    /// `AUTH_INVALID`
    Invalid,
    /// `AUTH_EXPIRED`
    Expired,
    /// `AUTH_FORBIDDEN`
    Forbidden,
    /// `AUTH_DEVICE_MISMATCH`
    DeviceMismatch,
    /// `AUTH_REVOKED`
    Revoked,
    /// `AUTH_UNSUPPORTED_ALGORITHM`
    UnsupportedAlgorithm,
    /// `USER_NOT_FOUND`
    UserNotFound,
    /// `PASSWORD_MISMATCH`
    PasswordMismatch,
    /// `BUSINESS_ERROR`
    BusinessError,
    /// `VALIDATION_ERROR`
    ValidationError,
    /// `CONFIGURATION_ERROR`
    ConfigurationError,
    /// `KEY_IMPORT_ERROR`
    KeyImportError,
}

impl ErrorCode {
    /// Get the string representation of the error code
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::MissingToken => "AUTH_MISSING_TOKEN",
            Self::Malformed => "AUTH_MALFORMED",
            Self::Invalid => "AUTH_INVALID",
            Self::Expired => "AUTH_EXPIRED",
            Self::Forbidden => "AUTH_FORBIDDEN",
            Self::DeviceMismatch => "AUTH_DEVICE_MISMATCH",
            Self::Revoked => "AUTH_REVOKED",
            Self::UnsupportedAlgorithm => "AUTH_UNSUPPORTED_ALGORITHM",
            Self::UserNotFound => "USER_NOT_FOUND",
            Self::PasswordMismatch => "PASSWORD_MISMATCH",
            Self::BusinessError => "BUSINESS_ERROR",
            Self::ValidationError => "VALIDATION_ERROR",
            Self::ConfigurationError => "CONFIGURATION_ERROR",
            Self::KeyImportError => "KEY_IMPORT_ERROR",
        }
    }

    /// Default HTTP status for this code
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::MissingToken
            | Self::Malformed
            | Self::Invalid
            | Self::Expired
            | Self::Revoked
            | Self::PasswordMismatch => StatusCode::UNAUTHORIZED,
            Self::Forbidden | Self::DeviceMismatch => StatusCode::FORBIDDEN,
            Self::UserNotFound => StatusCode::NOT_FOUND,
            Self::ValidationError => StatusCode::UNPROCESSABLE_ENTITY,
            Self::BusinessError => StatusCode::BAD_REQUEST,
            Self::UnsupportedAlgorithm | Self::ConfigurationError | Self::KeyImportError => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for ErrorCode {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl AuthErrorKind {
    /// Get the error code for this kind
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::MissingToken => ErrorCode::MissingToken,
            Self::Malformed { .. } => ErrorCode::Malformed,
            Self::Invalid => ErrorCode::Invalid,
            Self::Expired { .. } => ErrorCode::Expired,
            Self::Forbidden { .. } => ErrorCode::Forbidden,
            Self::DeviceMismatch => ErrorCode::DeviceMismatch,
            Self::Revoked => ErrorCode::Revoked,
            Self::UnsupportedAlgorithm { .. } => ErrorCode::UnsupportedAlgorithm,
            Self::UserNotFound => ErrorCode::UserNotFound,
            Self::PasswordMismatch => ErrorCode::PasswordMismatch,
            Self::Business { .. } => ErrorCode::BusinessError,
            Self::Validation { .. } => ErrorCode::ValidationError,
            Self::Configuration { .. } => ErrorCode::ConfigurationError,
            Self::KeyImport { .. } => ErrorCode::KeyImportError,
        }
    }

    /// Client-safe message. Internal reasons are never included.
    fn public_message(&self) -> String {
        match self {
            Self::MissingToken => "Authentication token is required".to_string(),
            Self::Malformed { .. } => "Authentication token is malformed".to_string(),
            Self::Invalid => "Authentication token is invalid".to_string(),
            Self::Expired { .. } => "Authentication token has expired".to_string(),
            Self::Forbidden { reason } => reason.clone(),
            Self::DeviceMismatch => "Token is bound to a different device".to_string(),
            Self::Revoked => "Authentication token has been revoked".to_string(),
            Self::UserNotFound => "User not found".to_string(),
            Self::PasswordMismatch => "Invalid credentials".to_string(),
            Self::Business { message, .. } => message.clone(),
            Self::Validation { message, .. } => message.clone(),
            Self::UnsupportedAlgorithm { .. } | Self::Configuration { .. } | Self::KeyImport { .. } => {
                "Internal server error".to_string()
            }
        }
    }
}

/// Authentication failure raised by every component of this crate.
#[derive(Debug)]
pub struct AuthError {
    kind: AuthErrorKind,
    details: Option<serde_json::Value>,
    cause: Option<BoxedCause>,
    backtrace: Backtrace,
}

impl AuthError {
    fn new(kind: AuthErrorKind) -> Self {
        Self {
            kind,
            details: None,
            cause: None,
            backtrace: Backtrace::capture(),
        }
    }

    /// No credential presented.
    #[must_use]
    pub fn missing_token() -> Self {
        Self::new(AuthErrorKind::MissingToken)
    }

    /// Structurally invalid credential.
    #[must_use]
    pub fn malformed(reason: impl Into<String>) -> Self {
        Self::new(AuthErrorKind::Malformed {
            reason: reason.into(),
        })
    }

    /// Verification failure. The underlying cause stays internal.
    #[must_use]
    pub fn invalid(cause: impl Into<BoxedCause>) -> Self {
        Self::new(AuthErrorKind::Invalid).with_cause(cause)
    }

    /// Token past its expiration.
    #[must_use]
    pub fn expired(exp: i64) -> Self {
        let expired_at = DateTime::from_timestamp(exp, 0).unwrap_or_else(Utc::now);
        Self::new(AuthErrorKind::Expired { expired_at })
    }

    /// Operation denied for an authenticated subject.
    #[must_use]
    pub fn forbidden(reason: impl Into<String>) -> Self {
        Self::new(AuthErrorKind::Forbidden {
            reason: reason.into(),
        })
    }

    /// Device binding violated.
    #[must_use]
    pub fn device_mismatch() -> Self {
        Self::new(AuthErrorKind::DeviceMismatch)
    }

    /// Externally revoked token identifier.
    #[must_use]
    pub fn revoked() -> Self {
        Self::new(AuthErrorKind::Revoked)
    }

    /// Algorithm the provider cannot serve.
    #[must_use]
    pub fn unsupported_algorithm(algorithm: impl Into<String>) -> Self {
        Self::new(AuthErrorKind::UnsupportedAlgorithm {
            algorithm: algorithm.into(),
        })
    }

    /// Unknown user.
    #[must_use]
    pub fn user_not_found() -> Self {
        Self::new(AuthErrorKind::UserNotFound)
    }

    /// Credential mismatch.
    #[must_use]
    pub fn password_mismatch() -> Self {
        Self::new(AuthErrorKind::PasswordMismatch)
    }

    /// Domain failure with the default 400 status.
    #[must_use]
    pub fn business(message: impl Into<String>) -> Self {
        Self::business_with_status(message, StatusCode::BAD_REQUEST)
    }

    /// Domain failure with an explicit status.
    #[must_use]
    pub fn business_with_status(message: impl Into<String>, status: StatusCode) -> Self {
        Self::new(AuthErrorKind::Business {
            message: message.into(),
            status,
        })
    }

    /// Input validation failure with per-field messages.
    #[must_use]
    pub fn validation(message: impl Into<String>, fields: FieldErrors) -> Self {
        Self::new(AuthErrorKind::Validation {
            message: message.into(),
            fields,
        })
    }

    /// Validation failure for a single field.
    #[must_use]
    pub fn field(field: impl Into<String>, message: impl Into<String>) -> Self {
        let message = message.into();
        let mut fields = FieldErrors::new();
        fields.insert(field.into(), vec![message.clone()]);
        Self::validation(message, fields)
    }

    /// Key material could not be resolved.
    #[must_use]
    pub fn configuration(reason: impl Into<String>) -> Self {
        Self::new(AuthErrorKind::Configuration {
            reason: reason.into(),
        })
    }

    /// Key material could not be parsed.
    #[must_use]
    pub fn key_import(reason: impl Into<String>, cause: impl Into<BoxedCause>) -> Self {
        Self::new(AuthErrorKind::KeyImport {
            reason: reason.into(),
        })
        .with_cause(cause)
    }

    /// Attach public structured details.
    #[must_use]
    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    /// Attach an internal cause. Only ever surfaces in log records.
    #[must_use]
    pub fn with_cause(mut self, cause: impl Into<BoxedCause>) -> Self {
        self.cause = Some(cause.into());
        self
    }

    /// The failure kind.
    #[must_use]
    pub fn kind(&self) -> &AuthErrorKind {
        &self.kind
    }

    /// The stable code.
    #[must_use]
    pub fn code(&self) -> ErrorCode {
        self.kind.code()
    }

    /// HTTP status for the boundary layer.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match &self.kind {
            AuthErrorKind::Business { status, .. } => *status,
            kind => kind.code().status(),
        }
    }

    /// Public details, if any.
    #[must_use]
    pub fn details(&self) -> Option<&serde_json::Value> {
        self.details.as_ref()
    }

    /// Per-field validation messages, if any.
    #[must_use]
    pub fn fields(&self) -> Option<&FieldErrors> {
        match &self.kind {
            AuthErrorKind::Validation { fields, .. } => Some(fields),
            _ => None,
        }
    }

    /// Network-safe representation.
    #[must_use]
    pub fn to_problem(&self) -> ProblemDetails {
        ProblemDetails {
            code: self.code(),
            message: self.kind.public_message(),
            status: self.status().as_u16(),
            details: self.details.clone(),
            fields: self.fields().cloned(),
        }
    }

    /// Log representation. May contain sensitive diagnostics.
    #[must_use]
    pub fn to_log_record(&self) -> LogRecord {
        let mut causes = Vec::new();
        let mut current = self.source();
        while let Some(err) = current {
            causes.push(err.to_string());
            current = err.source();
        }

        let stack = match self.backtrace.status() {
            BacktraceStatus::Captured => Some(self.backtrace.to_string()),
            _ => None,
        };

        LogRecord {
            code: self.code(),
            message: self.kind.to_string(),
            status: self.status().as_u16(),
            details: self.details.clone(),
            fields: self.fields().cloned(),
            causes,
            stack,
        }
    }

    /// Emit the log record through `tracing`.
    pub fn log(&self) {
        let record = self.to_log_record();
        let causes = record.causes.join(": ");
        if self.status().is_server_error() {
            error!(
                code = %record.code,
                status = record.status,
                causes = %causes,
                "{}", record.message
            );
        } else {
            warn!(
                code = %record.code,
                status = record.status,
                causes = %causes,
                "{}", record.message
            );
        }
    }
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.kind, f)
    }
}

impl StdError for AuthError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.cause
            .as_deref()
            .map(|cause| cause as &(dyn StdError + 'static))
    }
}

/// Client-facing problem object.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProblemDetails {
    /// Stable code
    pub code: ErrorCode,
    /// Client-safe message
    pub message: String,
    /// HTTP status
    pub status: u16,
    /// Public details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
    /// Per-field validation messages
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<FieldErrors>,
}

/// Internal log record.
#[derive(Debug, Clone, Serialize)]
pub struct LogRecord {
    /// Stable code
    pub code: ErrorCode,
    /// Full internal message
    pub message: String,
    /// HTTP status
    pub status: u16,
    /// Public details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
    /// Per-field validation messages
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<FieldErrors>,
    /// Cause chain, outermost first
    pub causes: Vec<String>,
    /// Backtrace when captured
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_default_statuses() {
        assert_eq!(AuthError::expired(0).status(), StatusCode::UNAUTHORIZED);
        assert_eq!(AuthError::forbidden("no").status(), StatusCode::FORBIDDEN);
        assert_eq!(
            AuthError::validation("bad", FieldErrors::new()).status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(AuthError::device_mismatch().status(), StatusCode::FORBIDDEN);
        assert_eq!(AuthError::user_not_found().status(), StatusCode::NOT_FOUND);
        assert_eq!(
            AuthError::configuration("missing").status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_business_status_override() {
        let err = AuthError::business_with_status("group is full", StatusCode::CONFLICT);
        assert_eq!(err.status(), StatusCode::CONFLICT);
        assert_eq!(err.code(), ErrorCode::BusinessError);
        assert_eq!(err.to_problem().message, "group is full");
    }

    #[test]
    fn test_problem_hides_internal_cause() {
        let cause = std::io::Error::new(std::io::ErrorKind::Other, "InvalidSignature deadbeef");
        let err = AuthError::invalid(cause);
        let problem = err.to_problem();

        assert_eq!(problem.code, ErrorCode::Invalid);
        assert_eq!(problem.status, 401);
        let json = serde_json::to_string(&problem).unwrap();
        assert!(!json.contains("InvalidSignature"));
        assert!(!json.contains("deadbeef"));

        let record = err.to_log_record();
        assert_eq!(record.causes, vec!["InvalidSignature deadbeef".to_string()]);
    }

    #[test]
    fn test_configuration_reason_stays_internal() {
        let err = AuthError::configuration("JWT_SECRET_FILE=/etc/secret unreadable");
        let problem = err.to_problem();
        assert_eq!(problem.message, "Internal server error");
        assert!(err.to_log_record().message.contains("/etc/secret"));
    }

    #[test]
    fn test_field_errors_exposed() {
        let err = AuthError::field("sub", "subject is required");
        let problem = err.to_problem();
        assert_eq!(problem.status, 422);
        let fields = problem.fields.unwrap();
        assert_eq!(fields["sub"], vec!["subject is required".to_string()]);
    }

    #[test]
    fn test_details_serialized() {
        let err = AuthError::forbidden("role required").with_details(json!({"required": ["admin"]}));
        let value = serde_json::to_value(err.to_problem()).unwrap();
        assert_eq!(value["code"], "AUTH_FORBIDDEN");
        assert_eq!(value["details"]["required"][0], "admin");
        assert!(value.get("fields").is_none());
    }

    #[test]
    fn test_codes_are_unique() {
        let codes = [
            ErrorCode::MissingToken,
            ErrorCode::Malformed,
            ErrorCode::Invalid,
            ErrorCode::Expired,
            ErrorCode::Forbidden,
            ErrorCode::DeviceMismatch,
            ErrorCode::Revoked,
            ErrorCode::UnsupportedAlgorithm,
            ErrorCode::UserNotFound,
            ErrorCode::PasswordMismatch,
            ErrorCode::BusinessError,
            ErrorCode::ValidationError,
            ErrorCode::ConfigurationError,
            ErrorCode::KeyImportError,
        ];
        let unique: std::collections::HashSet<_> = codes.iter().map(ErrorCode::as_str).collect();
        assert_eq!(unique.len(), codes.len());
    }
}
