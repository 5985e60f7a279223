// ABOUTME: Core data model for permissions, roles, OAuth tokens, and blacklist entries
// ABOUTME: Includes name format validation and token expiry helpers
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Aegis Platform

//! Data definitions for the authorization core.
//!
//! These types are owned by the relational store; cached copies are
//! disposable projections with TTLs and may be dropped at any time.

use crate::constants::{limits, tokens::REFRESH_LOOKAHEAD_SECS};
use crate::errors::{AppError, AppResult};
use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;
use uuid::Uuid;

/// An atomic capability named `resource:action` (e.g. `article:create`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permission {
    /// Unique identifier
    pub id: Uuid,
    /// Unique name in `resource:action` form
    pub name: String,
    /// Resource part of the name
    pub resource: String,
    /// Action part of the name
    pub action: String,
    /// Optional description
    pub description: Option<String>,
    /// When this permission was created
    pub created_at: DateTime<Utc>,
}

impl Permission {
    /// Build a permission from a validated `resource:action` name
    ///
    /// # Errors
    ///
    /// Returns an error if the name does not match the required format
    pub fn new(name: &str, description: Option<String>) -> AppResult<Self> {
        let (resource, action) = validate_permission_name(name)?;
        Ok(Self {
            id: Uuid::new_v4(),
            name: name.to_owned(),
            resource,
            action,
            description,
            created_at: Utc::now(),
        })
    }
}

/// A named group of permissions granted to users
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    /// Unique identifier
    pub id: Uuid,
    /// Unique name (3-50 chars, alnum/space/hyphen/underscore)
    pub name: String,
    /// Optional description
    pub description: Option<String>,
    /// When this role was created
    pub created_at: DateTime<Utc>,
    /// When this role was last updated
    pub updated_at: DateTime<Utc>,
}

impl Role {
    /// Build a role from a validated name
    ///
    /// # Errors
    ///
    /// Returns an error if the name fails validation
    pub fn new(name: &str, description: Option<String>) -> AppResult<Self> {
        validate_role_name(name)?;
        let now = Utc::now();
        Ok(Self {
            id: Uuid::new_v4(),
            name: name.to_owned(),
            description,
            created_at: now,
            updated_at: now,
        })
    }
}

/// Junction row linking a role to a permission (unique pair, no ordering)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RolePermission {
    pub role_id: Uuid,
    pub permission_id: Uuid,
}

/// Third-party OAuth providers whose tokens the vault manages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OAuthProvider {
    Google,
    Facebook,
    Github,
    Apple,
}

impl OAuthProvider {
    /// Canonical lowercase name, as persisted
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Google => "google",
            Self::Facebook => "facebook",
            Self::Github => "github",
            Self::Apple => "apple",
        }
    }
}

impl fmt::Display for OAuthProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OAuthProvider {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "google" => Ok(Self::Google),
            "facebook" => Ok(Self::Facebook),
            "github" => Ok(Self::Github),
            "apple" => Ok(Self::Apple),
            other => Err(AppError::invalid_format(format!(
                "unknown oauth provider '{other}'"
            ))),
        }
    }
}

/// OAuth token entity as persisted: access and refresh tokens are ciphertext
///
/// At most one current token per (user, provider) is treated as authoritative
/// by lookup. Plaintext only ever exists in [`DecryptedOAuthToken`], which is
/// never written back to the store or any cache.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OAuthToken {
    /// Unique identifier
    pub id: Uuid,
    /// User who owns this token
    pub user_id: Uuid,
    /// Provider that issued the token
    pub provider: OAuthProvider,
    /// Encrypted access token (base64: \[12-byte nonce\]\[ciphertext\])
    pub access_token: String,
    /// Encrypted refresh token, when the provider issued one
    pub refresh_token: Option<String>,
    /// Token type (usually "Bearer")
    pub token_type: Option<String>,
    /// When the access token expires; `None` means it never expires
    pub expires_at: Option<DateTime<Utc>>,
    /// When this token was first stored
    pub created_at: DateTime<Utc>,
    /// When this token was last updated
    pub updated_at: DateTime<Utc>,
}

impl OAuthToken {
    /// Check if the access token is already expired
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.expires_at
            .is_some_and(|expires_at| Utc::now() > expires_at)
    }

    /// Check if the token expires within the proactive-refresh window.
    /// Distinct from [`Self::is_expired`]: this fires 5 minutes ahead.
    #[must_use]
    pub fn needs_refresh(&self) -> bool {
        self.expires_at.is_some_and(|expires_at| {
            Utc::now() + chrono::Duration::seconds(REFRESH_LOOKAHEAD_SECS) >= expires_at
        })
    }
}

/// Decrypted OAuth token for outbound API calls
///
/// This is never stored — it only exists in memory during a request.
#[derive(Debug, Clone)]
pub struct DecryptedOAuthToken {
    /// Plaintext access token
    pub access_token: String,
    /// Plaintext refresh token, when present
    pub refresh_token: Option<String>,
    /// Token type (usually "Bearer")
    pub token_type: Option<String>,
    /// When the access token expires
    pub expires_at: Option<DateTime<Utc>>,
}

/// Why a token was revoked
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlacklistReason {
    Logout,
    PasswordChange,
    SecurityBreach,
    AdminRevoked,
    AccountDeleted,
    AccountSuspended,
    TokenExpired,
}

impl BlacklistReason {
    /// Canonical snake_case name, as persisted
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Logout => "logout",
            Self::PasswordChange => "password_change",
            Self::SecurityBreach => "security_breach",
            Self::AdminRevoked => "admin_revoked",
            Self::AccountDeleted => "account_deleted",
            Self::AccountSuspended => "account_suspended",
            Self::TokenExpired => "token_expired",
        }
    }
}

impl fmt::Display for BlacklistReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BlacklistReason {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "logout" => Ok(Self::Logout),
            "password_change" => Ok(Self::PasswordChange),
            "security_breach" => Ok(Self::SecurityBreach),
            "admin_revoked" => Ok(Self::AdminRevoked),
            "account_deleted" => Ok(Self::AccountDeleted),
            "account_suspended" => Ok(Self::AccountSuspended),
            "token_expired" => Ok(Self::TokenExpired),
            other => Err(AppError::invalid_format(format!(
                "unknown blacklist reason '{other}'"
            ))),
        }
    }
}

/// A revoked token, keyed by the SHA-256 hash of the raw bearer token
///
/// `expires_at` mirrors the underlying token's natural expiry: past that
/// point the entry is redundant because the token would be rejected as
/// expired anyway, which makes the row eligible for cleanup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlacklistEntry {
    /// Unique identifier
    pub id: Uuid,
    /// Base64-encoded SHA-256 hash of the raw token (unique)
    pub token_hash: String,
    /// User the token belonged to, for audit only
    pub user_id: Option<Uuid>,
    /// When the token was revoked
    pub blacklisted_at: DateTime<Utc>,
    /// Natural expiry of the underlying token
    pub expires_at: DateTime<Utc>,
    /// Why the token was revoked
    pub reason: BlacklistReason,
}

impl BlacklistEntry {
    /// Build a new entry for a token hash
    #[must_use]
    pub fn new(
        token_hash: String,
        user_id: Option<Uuid>,
        reason: BlacklistReason,
        expires_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            token_hash,
            user_id,
            blacklisted_at: Utc::now(),
            expires_at,
            reason,
        }
    }
}

fn permission_name_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[a-z_]+:[a-z_]+$").expect("valid permission name pattern"))
}

fn role_name_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z0-9 _-]+$").expect("valid role name pattern"))
}

/// Validate a permission name and split it into (resource, action)
///
/// # Errors
///
/// Returns an `InvalidFormat` error when the name is empty, longer than 100
/// characters, or not a lowercase two-part `resource:action` pattern
pub fn validate_permission_name(name: &str) -> AppResult<(String, String)> {
    if name.is_empty() {
        return Err(AppError::missing_field("permission name"));
    }
    if name.len() > limits::PERMISSION_NAME_MAX {
        return Err(AppError::invalid_format(format!(
            "permission name exceeds {} characters",
            limits::PERMISSION_NAME_MAX
        )));
    }
    if !permission_name_regex().is_match(name) {
        return Err(AppError::invalid_format(format!(
            "permission name '{name}' must match resource:action"
        )));
    }
    let (resource, action) = name.split_once(':').ok_or_else(|| {
        AppError::invalid_format(format!("permission name '{name}' must match resource:action"))
    })?;
    Ok((resource.to_owned(), action.to_owned()))
}

/// Validate a role name (3-50 chars, alnum/space/hyphen/underscore)
///
/// # Errors
///
/// Returns an `InvalidFormat` error when the name fails any rule
pub fn validate_role_name(name: &str) -> AppResult<()> {
    if name.is_empty() {
        return Err(AppError::missing_field("role name"));
    }
    if name.len() < limits::ROLE_NAME_MIN || name.len() > limits::ROLE_NAME_MAX {
        return Err(AppError::invalid_format(format!(
            "role name must be {}-{} characters",
            limits::ROLE_NAME_MIN,
            limits::ROLE_NAME_MAX
        )));
    }
    if !role_name_regex().is_match(name) {
        return Err(AppError::invalid_format(format!(
            "role name '{name}' contains invalid characters"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_permission_name_valid() {
        let (resource, action) = validate_permission_name("article:create").unwrap();
        assert_eq!(resource, "article");
        assert_eq!(action, "create");
    }

    #[test]
    fn test_permission_name_invalid() {
        for bad in ["", "article", "article:", ":create", "Article:Create", "a:b:c", "art icle:create"] {
            assert!(
                validate_permission_name(bad).is_err(),
                "expected '{bad}' to be rejected"
            );
        }
    }

    #[test]
    fn test_role_name_bounds() {
        assert!(validate_role_name("ab").is_err());
        assert!(validate_role_name(&"a".repeat(51)).is_err());
        assert!(validate_role_name("content editor-2_test").is_ok());
        assert!(validate_role_name("editor!").is_err());
    }

    #[test]
    fn test_token_refresh_window() {
        let mut token = OAuthToken {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            provider: OAuthProvider::Google,
            access_token: "ciphertext".into(),
            refresh_token: None,
            token_type: Some("Bearer".into()),
            expires_at: Some(Utc::now() + chrono::Duration::minutes(2)),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        // Expires in 2 minutes: inside the 5-minute lookahead, not yet expired
        assert!(!token.is_expired());
        assert!(token.needs_refresh());

        // No expiry: never expires, never refreshes
        token.expires_at = None;
        assert!(!token.is_expired());
        assert!(!token.needs_refresh());

        // Already past expiry
        token.expires_at = Some(Utc::now() - chrono::Duration::minutes(1));
        assert!(token.is_expired());
        assert!(token.needs_refresh());
    }

    #[test]
    fn test_provider_round_trip() {
        for p in [
            OAuthProvider::Google,
            OAuthProvider::Facebook,
            OAuthProvider::Github,
            OAuthProvider::Apple,
        ] {
            assert_eq!(p.as_str().parse::<OAuthProvider>().unwrap(), p);
        }
        assert!("strava".parse::<OAuthProvider>().is_err());
    }
}
