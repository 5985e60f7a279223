// ABOUTME: Cache backend selection and Redis connection tuning from environment
// ABOUTME: Builds a CacheConfig with retry, timeout, and TTL settings
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Aegis Platform

use crate::cache::{CacheConfig, CacheTtlConfig};
use crate::constants::cache::{DEFAULT_CACHE_MAX_ENTRIES, DEFAULT_CLEANUP_INTERVAL_SECS};
use crate::constants::{env_names, redis};
use std::env;
use std::time::Duration;

/// Redis connection and retry configuration
#[derive(Debug, Clone)]
pub struct RedisConnectionConfig {
    /// Connection timeout in seconds
    pub connection_timeout_secs: u64,
    /// Response/command timeout in seconds
    pub response_timeout_secs: u64,
    /// Number of reconnection retries after connection drop
    pub reconnection_retries: usize,
    /// Exponential backoff base for retry delays
    pub retry_exponent_base: u64,
    /// Maximum retry delay in milliseconds
    pub max_retry_delay_ms: u64,
    /// Number of retries for initial connection at startup
    pub initial_connection_retries: u32,
    /// Initial retry delay in milliseconds (doubles with exponential backoff)
    pub initial_retry_delay_ms: u64,
}

impl Default for RedisConnectionConfig {
    fn default() -> Self {
        Self {
            connection_timeout_secs: redis::CONNECTION_TIMEOUT_SECS,
            response_timeout_secs: redis::RESPONSE_TIMEOUT_SECS,
            reconnection_retries: redis::RECONNECTION_RETRIES,
            retry_exponent_base: redis::RETRY_EXPONENT_BASE,
            max_retry_delay_ms: redis::MAX_RETRY_DELAY_MS,
            initial_connection_retries: redis::INITIAL_CONNECTION_RETRIES,
            initial_retry_delay_ms: redis::INITIAL_RETRY_DELAY_MS,
        }
    }
}

/// Build a cache configuration from environment variables.
///
/// The Redis backend is selected when `CACHE_BACKEND=redis` (requiring
/// `REDIS_URL`) or when `REDIS_URL` is set on its own; otherwise the
/// in-memory backend is used.
#[must_use]
pub fn cache_config_from_env() -> CacheConfig {
    let redis_url = match env::var(env_names::CACHE_BACKEND).as_deref() {
        Ok("redis") => env::var(env_names::REDIS_URL).ok(),
        Ok("memory") => None,
        _ => env::var(env_names::REDIS_URL).ok(),
    };

    CacheConfig {
        max_entries: env::var(env_names::CACHE_MAX_ENTRIES)
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_CACHE_MAX_ENTRIES),
        redis_url,
        cleanup_interval: env::var(env_names::CACHE_CLEANUP_INTERVAL_SECS)
            .ok()
            .and_then(|s| s.parse().ok())
            .map_or_else(
                || Duration::from_secs(DEFAULT_CLEANUP_INTERVAL_SECS),
                Duration::from_secs,
            ),
        enable_background_cleanup: true,
        redis_connection: RedisConnectionConfig::default(),
        ttl: CacheTtlConfig::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_memory_backend_ignores_redis_url() {
        env::set_var(env_names::CACHE_BACKEND, "memory");
        env::set_var(env_names::REDIS_URL, "redis://localhost:6379");

        let config = cache_config_from_env();
        assert!(config.redis_url.is_none());

        env::remove_var(env_names::CACHE_BACKEND);
        env::remove_var(env_names::REDIS_URL);
    }

    #[test]
    #[serial]
    fn test_redis_url_selects_redis_backend() {
        env::remove_var(env_names::CACHE_BACKEND);
        env::set_var(env_names::REDIS_URL, "redis://localhost:6379");

        let config = cache_config_from_env();
        assert_eq!(config.redis_url.as_deref(), Some("redis://localhost:6379"));

        env::remove_var(env_names::REDIS_URL);
    }
}
