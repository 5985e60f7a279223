// ABOUTME: Cache abstraction layer for authorization and credential lookups
// ABOUTME: Pluggable backend support (in-memory, Redis) behind a single provider trait
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Aegis Platform

//! Cache-aside layer shared by the decision engine, token vault, and
//! blacklist. Cached values are disposable projections of the relational
//! store: every entry carries a TTL, and callers treat a cache failure as a
//! miss, falling back to the source of truth.

/// Fault-injection cache backend for degraded-path testing
pub mod failing;
/// Cache factory for environment-based backend selection
pub mod factory;
/// In-memory cache implementation
pub mod memory;
/// Redis cache implementation
pub mod redis;

use crate::config::cache::RedisConnectionConfig;
use crate::constants::cache::{
    DEFAULT_CACHE_MAX_ENTRIES, DEFAULT_CLEANUP_INTERVAL_SECS, TTL_BLACKLIST_SECS, TTL_LIST_SECS,
    TTL_OAUTH_TOKEN_SECS, TTL_PERMISSION_CHECK_SECS, TTL_PERMISSION_SECS,
    TTL_ROLE_PERMISSIONS_SECS, TTL_ROLE_SECS, TTL_USER_PERMISSIONS_SECS,
};
use crate::errors::AppResult;
use crate::models::OAuthProvider;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use uuid::Uuid;

/// Cache provider trait for pluggable backend implementations
///
/// # Examples
///
/// ```rust,no_run
/// use aegis_core::cache::{CacheConfig, CacheKey, CacheProvider};
/// use aegis_core::cache::memory::InMemoryCache;
/// use std::time::Duration;
/// use uuid::Uuid;
/// # async fn example() -> Result<(), aegis_core::errors::AppError> {
///
/// let config = CacheConfig {
///     enable_background_cleanup: false, // Disable for example
///     ..Default::default()
/// };
/// let cache: InMemoryCache = InMemoryCache::new(config).await?;
///
/// let key = CacheKey::PermissionCheck {
///     user_id: Uuid::new_v4(),
///     permission: "article:create".to_owned(),
/// };
///
/// cache.set(&key, &true, Duration::from_secs(900)).await?;
/// let cached: Option<bool> = cache.get(&key).await?;
/// cache.invalidate(&key).await?;
/// # Ok(())
/// # }
/// ```
#[async_trait::async_trait]
pub trait CacheProvider: Send + Sync + Clone {
    /// Create new cache instance with configuration
    ///
    /// # Errors
    ///
    /// Returns an error if cache initialization fails
    async fn new(config: CacheConfig) -> AppResult<Self>
    where
        Self: Sized;

    /// Store value in cache with TTL
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or storage fails
    async fn set<T: Serialize + Send + Sync>(
        &self,
        key: &CacheKey,
        value: &T,
        ttl: Duration,
    ) -> AppResult<()>;

    /// Retrieve value from cache (`None` on miss or expiry)
    ///
    /// # Errors
    ///
    /// Returns an error if deserialization fails
    async fn get<T: for<'de> Deserialize<'de>>(&self, key: &CacheKey) -> AppResult<Option<T>>;

    /// Remove single cache entry
    ///
    /// # Errors
    ///
    /// Returns an error if invalidation fails
    async fn invalidate(&self, key: &CacheKey) -> AppResult<()>;

    /// Remove all cache entries matching pattern (e.g. `perm:list:*`).
    ///
    /// Invalidation by enumerating a prefix is O(cache size) in the worst
    /// case and is not atomic with respect to concurrent readers; a reader
    /// racing the sweep may serve one last stale hit. Known consistency gap,
    /// bounded by the entry TTL.
    ///
    /// # Errors
    ///
    /// Returns an error if pattern invalidation fails
    async fn invalidate_pattern(&self, pattern: &str) -> AppResult<u64>;

    /// Check if key exists in cache
    ///
    /// # Errors
    ///
    /// Returns an error if existence check fails
    async fn exists(&self, key: &CacheKey) -> AppResult<bool>;

    /// Get remaining TTL for key
    ///
    /// # Errors
    ///
    /// Returns an error if TTL check fails
    async fn ttl(&self, key: &CacheKey) -> AppResult<Option<Duration>>;

    /// Verify cache backend is healthy
    ///
    /// # Errors
    ///
    /// Returns an error if health check fails
    async fn health_check(&self) -> AppResult<()>;

    /// Clear all cache entries (for testing/admin)
    ///
    /// # Errors
    ///
    /// Returns an error if clear operation fails
    async fn clear_all(&self) -> AppResult<()>;
}

/// Cache configuration
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Maximum number of entries (for in-memory cache)
    pub max_entries: usize,
    /// Redis connection URL (selects the Redis backend when set)
    pub redis_url: Option<String>,
    /// Cleanup interval for expired entries
    pub cleanup_interval: Duration,
    /// Enable background cleanup task (false in tests to avoid runtime conflicts)
    pub enable_background_cleanup: bool,
    /// Redis connection and retry configuration
    pub redis_connection: RedisConnectionConfig,
    /// Cache TTL tiers
    pub ttl: CacheTtlConfig,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_entries: DEFAULT_CACHE_MAX_ENTRIES,
            redis_url: None,
            cleanup_interval: Duration::from_secs(DEFAULT_CLEANUP_INTERVAL_SECS),
            enable_background_cleanup: true,
            redis_connection: RedisConnectionConfig::default(),
            ttl: CacheTtlConfig::default(),
        }
    }
}

/// TTL tiers for the cached surfaces, in seconds
#[derive(Debug, Clone)]
pub struct CacheTtlConfig {
    /// Individual permission records (default: 24 hours)
    pub permission_secs: u64,
    /// Individual role records (default: 30 minutes)
    pub role_secs: u64,
    /// Paginated list and count caches (default: 15 minutes)
    pub list_secs: u64,
    /// Role permission sets (default: 1 hour)
    pub role_permissions_secs: u64,
    /// Per-user permission sets (default: 15 minutes)
    pub user_permissions_secs: u64,
    /// Boolean permission-check results (default: 15 minutes)
    pub permission_check_secs: u64,
    /// Encrypted OAuth token entities (default: 30 minutes)
    pub oauth_token_secs: u64,
    /// Blacklist hash hits (default: 30 minutes)
    pub blacklist_secs: u64,
}

impl Default for CacheTtlConfig {
    fn default() -> Self {
        Self {
            permission_secs: TTL_PERMISSION_SECS,
            role_secs: TTL_ROLE_SECS,
            list_secs: TTL_LIST_SECS,
            role_permissions_secs: TTL_ROLE_PERMISSIONS_SECS,
            user_permissions_secs: TTL_USER_PERMISSIONS_SECS,
            permission_check_secs: TTL_PERMISSION_CHECK_SECS,
            oauth_token_secs: TTL_OAUTH_TOKEN_SECS,
            blacklist_secs: TTL_BLACKLIST_SECS,
        }
    }
}

impl CacheTtlConfig {
    /// Get the TTL tier for a specific cache key
    #[must_use]
    pub const fn ttl_for(&self, key: &CacheKey) -> Duration {
        let secs = match key {
            CacheKey::Permission { .. } | CacheKey::PermissionByName { .. } => self.permission_secs,
            CacheKey::Role { .. } | CacheKey::RoleByName { .. } => self.role_secs,
            CacheKey::PermissionList { .. } | CacheKey::RoleList { .. } => self.list_secs,
            CacheKey::RolePermissions { .. } => self.role_permissions_secs,
            CacheKey::UserPermissions { .. } => self.user_permissions_secs,
            CacheKey::PermissionCheck { .. } => self.permission_check_secs,
            CacheKey::OAuthToken { .. } => self.oauth_token_secs,
            CacheKey::BlacklistedToken { .. } => self.blacklist_secs,
        };
        Duration::from_secs(secs)
    }
}

/// Structured cache key covering every cached surface of the core
///
/// The `Display` form is the literal backend key (prefixed with the
/// namespace constant in shared backends). Keys group under prefixes so
/// that list caches and per-user entries can be invalidated by sweep.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    /// Permission record by id
    Permission { id: Uuid },
    /// Permission record by (lowercased) name
    PermissionByName { name: String },
    /// Paginated permission list
    PermissionList { limit: u32, offset: u32 },
    /// Role record by id
    Role { id: Uuid },
    /// Role record by (lowercased) name
    RoleByName { name: String },
    /// Paginated role list
    RoleList { limit: u32, offset: u32 },
    /// Permission name set granted to a role
    RolePermissions { role_id: Uuid },
    /// Permission name set resolved for a user
    UserPermissions { user_id: Uuid },
    /// Boolean result of a single permission check
    PermissionCheck { user_id: Uuid, permission: String },
    /// Encrypted OAuth token entity for a (user, provider)
    OAuthToken {
        user_id: Uuid,
        provider: OAuthProvider,
    },
    /// Revoked-token hash hit
    BlacklistedToken { hash: String },
}

impl CacheKey {
    /// Pattern matching every paginated permission list entry
    #[must_use]
    pub fn permission_list_pattern() -> String {
        "perm:list:*".to_owned()
    }

    /// Pattern matching every paginated role list entry
    #[must_use]
    pub fn role_list_pattern() -> String {
        "role:list:*".to_owned()
    }

    /// Pattern matching everything cached for one user: resolved permission
    /// sets, boolean check results, and token entities
    #[must_use]
    pub fn user_pattern(user_id: Uuid) -> String {
        format!("user:{user_id}:*")
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Permission { id } => write!(f, "perm:id:{id}"),
            Self::PermissionByName { name } => write!(f, "perm:name:{name}"),
            Self::PermissionList { limit, offset } => write!(f, "perm:list:{limit}:{offset}"),
            Self::Role { id } => write!(f, "role:id:{id}"),
            Self::RoleByName { name } => write!(f, "role:name:{name}"),
            Self::RoleList { limit, offset } => write!(f, "role:list:{limit}:{offset}"),
            Self::RolePermissions { role_id } => write!(f, "role:perms:{role_id}"),
            Self::UserPermissions { user_id } => write!(f, "user:{user_id}:perms"),
            Self::PermissionCheck {
                user_id,
                permission,
            } => write!(f, "user:{user_id}:check:{permission}"),
            Self::OAuthToken { user_id, provider } => {
                write!(f, "user:{user_id}:token:{provider}")
            }
            Self::BlacklistedToken { hash } => write!(f, "bl:{hash}"),
        }
    }
}
