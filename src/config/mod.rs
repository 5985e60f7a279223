// ABOUTME: Environment configuration management for deployment-specific settings
// ABOUTME: Loads database URL, token encryption key material, cache backend, and audit capacity
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Aegis Platform

//! Environment-based configuration for the authorization core.
//!
//! Everything is env-var driven; there is no config file. The token
//! encryption key accepts arbitrary-length material (the encryptor derives a
//! 32-byte key via SHA-256), so operators may set a passphrase directly.

/// Cache backend and Redis connection configuration
pub mod cache;

use crate::constants::{audit::DEFAULT_AUDIT_CAPACITY, env_names};
use crate::errors::{AppError, AppResult};
use base64::{engine::general_purpose, Engine};
use rand::RngCore;
use std::env;
use tracing::warn;

/// Top-level configuration for the authorization core
#[derive(Debug, Clone)]
pub struct CoreConfig {
    /// Relational store connection URL
    pub database_url: String,
    /// Key material for the token encryptor (arbitrary length)
    pub token_encryption_key: Vec<u8>,
    /// Cache backend configuration
    pub cache: crate::cache::CacheConfig,
    /// Bounded capacity of the audit log
    pub audit_capacity: usize,
}

impl CoreConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns a config error if `DATABASE_URL` is missing
    pub fn from_env() -> AppResult<Self> {
        let database_url = env::var(env_names::DATABASE_URL)
            .map_err(|_| AppError::config(format!("{} is required", env_names::DATABASE_URL)))?;

        Ok(Self {
            database_url,
            token_encryption_key: load_or_generate_encryption_key(),
            cache: cache::cache_config_from_env(),
            audit_capacity: env::var(env_names::AUDIT_CAPACITY)
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_AUDIT_CAPACITY),
        })
    }
}

/// Load token encryption key material from the environment, or generate a
/// development key with a loud warning.
///
/// The generated key is logged so a developer can pin it for the next run;
/// losing it makes every stored token undecryptable.
#[must_use]
pub fn load_or_generate_encryption_key() -> Vec<u8> {
    if let Ok(material) = env::var(env_names::TOKEN_ENCRYPTION_KEY) {
        return material.into_bytes();
    }

    warn!(
        "{} not found in environment",
        env_names::TOKEN_ENCRYPTION_KEY
    );
    warn!("Generating temporary token encryption key - NOT SECURE FOR PRODUCTION");

    let mut key = [0u8; 32];
    rand::rngs::OsRng.fill_bytes(&mut key);

    let encoded = general_purpose::STANDARD.encode(key);
    warn!(
        "Generated key (save for production): {}={}",
        env_names::TOKEN_ENCRYPTION_KEY,
        encoded
    );

    key.to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_generated_key_when_env_missing() {
        env::remove_var(env_names::TOKEN_ENCRYPTION_KEY);
        let key = load_or_generate_encryption_key();
        assert_eq!(key.len(), 32);
    }

    #[test]
    #[serial]
    fn test_key_from_environment() {
        env::set_var(env_names::TOKEN_ENCRYPTION_KEY, "my passphrase");
        let key = load_or_generate_encryption_key();
        assert_eq!(key, b"my passphrase");
        env::remove_var(env_names::TOKEN_ENCRYPTION_KEY);
    }
}
