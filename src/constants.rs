// ABOUTME: Shared constants for cache TTL tiers, validation limits, and environment names
// ABOUTME: Central place for tunable defaults so services and config agree on values
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Aegis Platform

/// Cache tuning defaults and TTL tiers
pub mod cache {
    /// Namespace prefix applied to every key in shared backends (Redis)
    pub const CACHE_KEY_PREFIX: &str = "aegis:";

    /// Default maximum entries for the in-memory backend
    pub const DEFAULT_CACHE_MAX_ENTRIES: usize = 10_000;

    /// Default interval between expired-entry cleanup sweeps
    pub const DEFAULT_CLEANUP_INTERVAL_SECS: u64 = 300;

    // TTL tiers reflect volatility and blast radius. Individual records are
    // long-lived; per-user permission sets and boolean check results are the
    // surface most likely to go stale and carry the highest correctness
    // stakes, so they get the shortest tier.

    /// Individual permission records (24 hours)
    pub const TTL_PERMISSION_SECS: u64 = 86_400;
    /// Individual role records (30 minutes)
    pub const TTL_ROLE_SECS: u64 = 1_800;
    /// Paginated list and aggregate caches (15 minutes)
    pub const TTL_LIST_SECS: u64 = 900;
    /// Role permission sets (1 hour)
    pub const TTL_ROLE_PERMISSIONS_SECS: u64 = 3_600;
    /// Per-user permission sets (15 minutes)
    pub const TTL_USER_PERMISSIONS_SECS: u64 = 900;
    /// Boolean permission-check results (15 minutes)
    pub const TTL_PERMISSION_CHECK_SECS: u64 = 900;
    /// Encrypted OAuth token entities (30 minutes)
    pub const TTL_OAUTH_TOKEN_SECS: u64 = 1_800;
    /// Blacklist hash hits (30 minutes)
    pub const TTL_BLACKLIST_SECS: u64 = 1_800;
}

/// Redis connection defaults
pub mod redis {
    pub const CONNECTION_TIMEOUT_SECS: u64 = 5;
    pub const RESPONSE_TIMEOUT_SECS: u64 = 2;
    pub const RECONNECTION_RETRIES: usize = 6;
    pub const RETRY_EXPONENT_BASE: u64 = 2;
    pub const MAX_RETRY_DELAY_MS: u64 = 10_000;
    pub const INITIAL_CONNECTION_RETRIES: u32 = 3;
    pub const INITIAL_RETRY_DELAY_MS: u64 = 500;
}

/// Validation limits for names
pub mod limits {
    /// Maximum permission name length (`resource:action`)
    pub const PERMISSION_NAME_MAX: usize = 100;
    /// Minimum role name length
    pub const ROLE_NAME_MIN: usize = 3;
    /// Maximum role name length
    pub const ROLE_NAME_MAX: usize = 50;
    /// Default page size for list queries
    pub const DEFAULT_PAGE_SIZE: u32 = 20;
    /// Maximum page size for list queries
    pub const MAX_PAGE_SIZE: u32 = 100;
}

/// Token lifecycle defaults
pub mod tokens {
    /// Proactive refresh lookahead window in seconds (5 minutes)
    pub const REFRESH_LOOKAHEAD_SECS: i64 = 300;
}

/// Audit log defaults
pub mod audit {
    /// Default bounded capacity of the in-process audit buffer
    pub const DEFAULT_AUDIT_CAPACITY: usize = 10_000;
}

/// Environment variable names consumed by `config`
pub mod env_names {
    pub const DATABASE_URL: &str = "DATABASE_URL";
    pub const TOKEN_ENCRYPTION_KEY: &str = "AEGIS_TOKEN_ENCRYPTION_KEY";
    pub const CACHE_BACKEND: &str = "CACHE_BACKEND";
    pub const REDIS_URL: &str = "REDIS_URL";
    pub const CACHE_MAX_ENTRIES: &str = "CACHE_MAX_ENTRIES";
    pub const CACHE_CLEANUP_INTERVAL_SECS: &str = "CACHE_CLEANUP_INTERVAL_SECS";
    pub const AUDIT_CAPACITY: &str = "AEGIS_AUDIT_CAPACITY";
}

/// Service identity for structured logging
pub mod service_names {
    pub const AEGIS_CORE: &str = "aegis-core";
}
