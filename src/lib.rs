// ABOUTME: Main library entry point for the Aegis authorization core
// ABOUTME: Exposes the RBAC decision engine, token vault, blacklist, cache, and audit modules
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Aegis Platform

#![deny(unsafe_code)]

//! # Aegis Core
//!
//! Authorization decision and credential lifecycle core for the Aegis content
//! platform. This crate sits on the hot path of every authenticated request:
//! the gateway extracts a principal and a presented bearer token, asks the
//! [`blacklist::TokenBlacklist`] whether the token has been revoked, then asks
//! the [`authz::AuthzEngine`] whether the principal may perform the requested
//! action.
//!
//! ## Architecture
//!
//! - **`models`**: permission/role/token data definitions and name validation
//! - **`crypto`**: AES-256-GCM token encryption and SHA-256 token hashing
//! - **`cache`**: cache-aside layer with in-memory and Redis backends
//! - **`store`**: relational source-of-truth behind the [`store::AuthStore`] trait
//! - **`authz`**: role/permission decision engine with tiered result caching
//! - **`tokens`**: encrypted OAuth token lifecycle (store, decrypt, refresh)
//! - **`blacklist`**: hash-based token revocation registry
//! - **`audit`**: bounded in-process trail of every authorization decision
//!
//! Plaintext credentials exist only in memory: tokens are encrypted before
//! every write and are never placed in any cache in decrypted form. Cache
//! failures degrade to source-of-truth reads and never fail a business
//! operation.
//!
//! ## Example
//!
//! ```rust,no_run
//! use aegis_core::authz::{AuthzEngine, OwnershipRegistry};
//! use aegis_core::audit::AuditLog;
//! use aegis_core::cache::{factory::Cache, CacheConfig};
//! use aegis_core::store::sqlite::SqliteStore;
//! use aegis_core::store::AuthStore;
//! use std::sync::Arc;
//! use uuid::Uuid;
//!
//! # async fn example() -> aegis_core::errors::AppResult<()> {
//! let store = Arc::new(SqliteStore::new("sqlite:aegis.db").await?);
//! let cache = Cache::new(CacheConfig::default()).await?;
//! let audit = Arc::new(AuditLog::default());
//! let engine = AuthzEngine::new(store, cache, audit, OwnershipRegistry::new());
//!
//! let user_id = Uuid::new_v4();
//! if engine.can_user_perform_action(user_id, "article", "create").await? {
//!     // proceed
//! }
//! # Ok(())
//! # }
//! ```

/// Bounded audit trail of authorization decisions
pub mod audit;

/// Role/permission based authorization decision engine
pub mod authz;

/// Token revocation (blacklist) registry
pub mod blacklist;

/// Cache-aside layer with pluggable backends
pub mod cache;

/// Environment-based configuration
pub mod config;

/// Shared constants: TTL tiers, limits, env variable names
pub mod constants;

/// Token encryption and hashing primitives
pub mod crypto;

/// Unified error handling
pub mod errors;

/// Structured logging setup
pub mod logging;

/// Core data model: permissions, roles, tokens, blacklist entries
pub mod models;

/// Relational store abstraction and SQLite implementation
pub mod store;

/// Encrypted OAuth token lifecycle management
pub mod tokens;
