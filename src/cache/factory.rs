// ABOUTME: Cache factory for environment-based backend selection
// ABOUTME: Dispatches to the in-memory or Redis backend behind one concrete type
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Aegis Platform

use super::{
    failing::FailingCache, memory::InMemoryCache, redis::RedisCache, CacheConfig, CacheKey,
    CacheProvider,
};
use crate::cache::CacheTtlConfig;
use crate::errors::AppResult;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Unified cache handle dispatching to the configured backend
///
/// Services hold this by value (it is cheap to clone) and ask it for the
/// TTL tier of each key, so the tier table lives in exactly one place.
#[derive(Clone)]
pub struct Cache {
    backend: Backend,
    ttl: CacheTtlConfig,
}

#[derive(Clone)]
enum Backend {
    Memory(InMemoryCache),
    Redis(RedisCache),
    Failing(FailingCache),
}

impl Cache {
    /// Create new cache instance based on configuration: Redis when a URL is
    /// configured, in-memory otherwise
    ///
    /// # Errors
    ///
    /// Returns an error if backend initialization fails
    pub async fn new(config: CacheConfig) -> AppResult<Self> {
        let ttl = config.ttl.clone();

        let backend = if config.redis_url.is_some() {
            tracing::info!("Initializing Redis cache backend");
            Backend::Redis(RedisCache::new(config).await?)
        } else {
            tracing::info!(
                "Initializing in-memory cache (max entries: {})",
                config.max_entries
            );
            Backend::Memory(InMemoryCache::new(config).await?)
        };

        Ok(Self { backend, ttl })
    }

    /// Create a cache whose every operation fails with a transport error.
    ///
    /// For fault-injection tests and drills: services built over this
    /// handle must keep answering correctly from the store.
    #[must_use]
    pub fn failing() -> Self {
        Self {
            backend: Backend::Failing(FailingCache),
            ttl: CacheTtlConfig::default(),
        }
    }

    /// Create cache from environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if cache initialization fails
    pub async fn from_env() -> AppResult<Self> {
        Self::new(crate::config::cache::cache_config_from_env()).await
    }

    /// TTL tier configured for this key
    #[must_use]
    pub const fn ttl_for(&self, key: &CacheKey) -> Duration {
        self.ttl.ttl_for(key)
    }

    /// Store value in cache with TTL
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or storage fails
    pub async fn set<T: Serialize + Send + Sync>(
        &self,
        key: &CacheKey,
        value: &T,
        ttl: Duration,
    ) -> AppResult<()> {
        match &self.backend {
            Backend::Memory(c) => c.set(key, value, ttl).await,
            Backend::Redis(c) => c.set(key, value, ttl).await,
            Backend::Failing(c) => c.set(key, value, ttl).await,
        }
    }

    /// Retrieve value from cache
    ///
    /// # Errors
    ///
    /// Returns an error if deserialization fails
    pub async fn get<T: for<'de> Deserialize<'de>>(&self, key: &CacheKey) -> AppResult<Option<T>> {
        match &self.backend {
            Backend::Memory(c) => c.get(key).await,
            Backend::Redis(c) => c.get(key).await,
            Backend::Failing(c) => c.get(key).await,
        }
    }

    /// Remove single cache entry
    ///
    /// # Errors
    ///
    /// Returns an error if invalidation fails
    pub async fn invalidate(&self, key: &CacheKey) -> AppResult<()> {
        match &self.backend {
            Backend::Memory(c) => c.invalidate(key).await,
            Backend::Redis(c) => c.invalidate(key).await,
            Backend::Failing(c) => c.invalidate(key).await,
        }
    }

    /// Remove all cache entries matching pattern
    ///
    /// # Errors
    ///
    /// Returns an error if pattern invalidation fails
    pub async fn invalidate_pattern(&self, pattern: &str) -> AppResult<u64> {
        match &self.backend {
            Backend::Memory(c) => c.invalidate_pattern(pattern).await,
            Backend::Redis(c) => c.invalidate_pattern(pattern).await,
            Backend::Failing(c) => c.invalidate_pattern(pattern).await,
        }
    }

    /// Check if key exists in cache
    ///
    /// # Errors
    ///
    /// Returns an error if existence check fails
    pub async fn exists(&self, key: &CacheKey) -> AppResult<bool> {
        match &self.backend {
            Backend::Memory(c) => c.exists(key).await,
            Backend::Redis(c) => c.exists(key).await,
            Backend::Failing(c) => c.exists(key).await,
        }
    }

    /// Get remaining TTL for key
    ///
    /// # Errors
    ///
    /// Returns an error if TTL check fails
    pub async fn ttl(&self, key: &CacheKey) -> AppResult<Option<Duration>> {
        match &self.backend {
            Backend::Memory(c) => c.ttl(key).await,
            Backend::Redis(c) => c.ttl(key).await,
            Backend::Failing(c) => c.ttl(key).await,
        }
    }

    /// Verify cache backend is healthy
    ///
    /// # Errors
    ///
    /// Returns an error if health check fails
    pub async fn health_check(&self) -> AppResult<()> {
        match &self.backend {
            Backend::Memory(c) => c.health_check().await,
            Backend::Redis(c) => c.health_check().await,
            Backend::Failing(c) => c.health_check().await,
        }
    }

    /// Clear all cache entries
    ///
    /// # Errors
    ///
    /// Returns an error if clear operation fails
    pub async fn clear_all(&self) -> AppResult<()> {
        match &self.backend {
            Backend::Memory(c) => c.clear_all().await,
            Backend::Redis(c) => c.clear_all().await,
            Backend::Failing(c) => c.clear_all().await,
        }
    }
}
