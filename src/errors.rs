// ABOUTME: Unified error handling for the authorization core
// ABOUTME: Defines error codes, HTTP status mapping, and the gateway rejection JSON shape
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Aegis Platform

//! # Unified Error Handling
//!
//! Central error taxonomy for the authorization core. Every error carries an
//! [`ErrorCode`] that the external gateway maps onto an HTTP status:
//! validation failures are 400, name conflicts and referential-integrity
//! violations are 409, a missing acting principal is 401, a missing target
//! entity is 404, an authorization denial is 403, and store/crypto failures
//! are 500. Cache transport failures exist in the taxonomy but are swallowed
//! with logging at the call sites — the store is always a safe fallback.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

/// Standard error codes used throughout the core
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCode {
    // Validation (1000-1999)
    #[serde(rename = "INVALID_FORMAT")]
    InvalidFormat = 1000,
    #[serde(rename = "MISSING_REQUIRED_FIELD")]
    MissingRequiredField = 1001,

    // Conflicts (2000-2999)
    #[serde(rename = "DUPLICATE_NAME")]
    DuplicateName = 2000,
    #[serde(rename = "REFERENCED_ENTITY")]
    ReferencedEntity = 2001,

    // Lookup (3000-3999)
    #[serde(rename = "RESOURCE_NOT_FOUND")]
    ResourceNotFound = 3000,
    #[serde(rename = "PRINCIPAL_NOT_FOUND")]
    PrincipalNotFound = 3001,

    // Authorization (4000-4999)
    #[serde(rename = "PERMISSION_DENIED")]
    PermissionDenied = 4000,

    // Crypto (5000-5999)
    #[serde(rename = "DECRYPTION_FAILED")]
    DecryptionFailed = 5000,

    // External services (6000-6999)
    #[serde(rename = "EXTERNAL_SERVICE_ERROR")]
    ExternalServiceError = 6000,

    // Internal (9000-9999)
    #[serde(rename = "INTERNAL_ERROR")]
    InternalError = 9000,
    #[serde(rename = "DATABASE_ERROR")]
    DatabaseError = 9001,
    #[serde(rename = "CACHE_ERROR")]
    CacheError = 9002,
    #[serde(rename = "CONFIG_ERROR")]
    ConfigError = 9003,
}

impl ErrorCode {
    /// Get the HTTP status code for this error
    #[must_use]
    pub const fn http_status(&self) -> u16 {
        match self {
            Self::InvalidFormat | Self::MissingRequiredField => 400,
            Self::PrincipalNotFound => 401,
            Self::PermissionDenied => 403,
            Self::ResourceNotFound => 404,
            Self::DuplicateName | Self::ReferencedEntity => 409,
            Self::ExternalServiceError => 502,
            Self::DecryptionFailed
            | Self::InternalError
            | Self::DatabaseError
            | Self::CacheError
            | Self::ConfigError => 500,
        }
    }

    /// Get a user-facing description of this error code
    #[must_use]
    pub const fn description(&self) -> &'static str {
        match self {
            Self::InvalidFormat => "The provided value has an invalid format",
            Self::MissingRequiredField => "A required field is missing",
            Self::DuplicateName => "An entity with this name already exists",
            Self::ReferencedEntity => "The entity is still referenced and cannot be deleted",
            Self::ResourceNotFound => "The requested entity was not found",
            Self::PrincipalNotFound => "The acting principal was not found",
            Self::PermissionDenied => "You do not have permission to perform this action",
            Self::DecryptionFailed => "Stored credential could not be decrypted",
            Self::ExternalServiceError => "An external service encountered an error",
            Self::InternalError => "An internal error occurred",
            Self::DatabaseError => "Database operation failed",
            Self::CacheError => "Cache operation failed",
            Self::ConfigError => "Configuration error encountered",
        }
    }
}

/// Unified error type for the core
#[derive(Debug, Error)]
pub struct AppError {
    /// Error code
    pub code: ErrorCode,
    /// Human-readable error message
    pub message: String,
    /// Source error for error chaining
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl AppError {
    /// Create a new error with the given code and message
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            source: None,
        }
    }

    /// Attach a source error for chaining
    #[must_use]
    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Get the HTTP status code for this error
    #[must_use]
    pub const fn http_status(&self) -> u16 {
        self.code.http_status()
    }

    /// Malformed name or value
    pub fn invalid_format(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidFormat, message)
    }

    /// Empty or absent required field
    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::MissingRequiredField,
            format!("{} is required", field.into()),
        )
    }

    /// Case-insensitive name collision
    pub fn duplicate_name(name: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::DuplicateName,
            format!("name '{}' already exists", name.into()),
        )
    }

    /// Referential-integrity violation blocking a delete
    pub fn referenced_entity(entity: impl Into<String>, count: i64) -> Self {
        Self::new(
            ErrorCode::ReferencedEntity,
            format!("{} is referenced by {count} record(s)", entity.into()),
        )
    }

    /// Target entity not found
    pub fn not_found(entity: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::ResourceNotFound,
            format!("{} not found", entity.into()),
        )
    }

    /// Acting principal not found
    pub fn principal_not_found(user_id: Uuid) -> Self {
        Self::new(
            ErrorCode::PrincipalNotFound,
            format!("principal {user_id} not found"),
        )
    }

    /// Authorization denial with the permission that was missing
    pub fn permission_denied(permission: impl Into<String>) -> Self {
        Self::new(ErrorCode::PermissionDenied, permission)
    }

    /// Decryption failure. The message is deliberately generic: a wrong key
    /// and corrupted ciphertext must be indistinguishable to the caller.
    #[must_use]
    pub fn decryption_failed() -> Self {
        Self::new(ErrorCode::DecryptionFailed, "decryption failed")
    }

    /// External provider failure
    pub fn external_service(service: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::ExternalServiceError,
            format!("{}: {}", service.into(), message.into()),
        )
    }

    /// Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }

    /// Relational store failure
    pub fn database(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::DatabaseError, message)
    }

    /// Key-value cache failure (logged and swallowed at call sites)
    pub fn cache(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::CacheError, message)
    }

    /// Configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ConfigError, message)
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code.description(), self.message)
    }
}

/// Result type alias for convenience
pub type AppResult<T> = Result<T, AppError>;

/// Rejection body the gateway serializes for denied or failed requests
#[derive(Debug, Serialize, Deserialize)]
pub struct RejectionBody {
    /// Human-readable error description
    pub error: String,
    /// HTTP status the gateway responds with
    pub status: u16,
    /// Permission involved in the decision, when applicable
    #[serde(skip_serializing_if = "Option::is_none")]
    pub permission: Option<String>,
    /// When the rejection was produced
    pub timestamp: DateTime<Utc>,
}

impl From<&AppError> for RejectionBody {
    fn from(error: &AppError) -> Self {
        let permission = match error.code {
            ErrorCode::PermissionDenied => Some(error.message.clone()),
            _ => None,
        };
        Self {
            error: error.code.description().to_owned(),
            status: error.http_status(),
            permission,
            timestamp: Utc::now(),
        }
    }
}

/// Conversion from `anyhow::Error` (store boundary) into the unified type
impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::new(ErrorCode::DatabaseError, error.to_string())
    }
}

impl From<sqlx::Error> for AppError {
    fn from(error: sqlx::Error) -> Self {
        Self::new(ErrorCode::DatabaseError, error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_http_status() {
        assert_eq!(ErrorCode::InvalidFormat.http_status(), 400);
        assert_eq!(ErrorCode::PrincipalNotFound.http_status(), 401);
        assert_eq!(ErrorCode::PermissionDenied.http_status(), 403);
        assert_eq!(ErrorCode::ResourceNotFound.http_status(), 404);
        assert_eq!(ErrorCode::DuplicateName.http_status(), 409);
        assert_eq!(ErrorCode::DatabaseError.http_status(), 500);
    }

    #[test]
    fn test_rejection_body_carries_permission() {
        let error = AppError::permission_denied("article:create");
        let body = RejectionBody::from(&error);

        assert_eq!(body.status, 403);
        assert_eq!(body.permission.as_deref(), Some("article:create"));
    }

    #[test]
    fn test_rejection_body_serialization() {
        let error = AppError::duplicate_name("editor");
        let body = RejectionBody::from(&error);

        let json = serde_json::to_string(&body).unwrap();
        assert!(json.contains("\"status\":409"));
        assert!(!json.contains("permission"));
    }
}
