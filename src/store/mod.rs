// ABOUTME: Relational store abstraction for the authorization core
// ABOUTME: Trait boundary for permissions, roles, tokens, and blacklist persistence
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Aegis Platform

//! Source-of-truth store boundary.
//!
//! The cache holds disposable projections; this trait is where correctness
//! lives. Implementations must be safe for concurrent use; the services add
//! no locking around them. Bulk operations are transactional: one failing
//! row rolls back the whole batch.

pub mod sqlite;

use crate::models::{BlacklistEntry, OAuthProvider, OAuthToken, Permission, Role};
use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Core store abstraction trait
///
/// All store implementations must implement this trait to provide a
/// consistent interface for the service layer.
#[async_trait]
pub trait AuthStore: Send + Sync + Clone {
    /// Run store migrations to set up schema
    async fn migrate(&self) -> Result<()>;

    // ================================
    // Permissions
    // ================================

    /// Persist a new permission
    async fn create_permission(&self, permission: &Permission) -> Result<()>;

    /// Persist a batch of permissions in a single transaction (all-or-nothing)
    async fn create_permissions(&self, permissions: &[Permission]) -> Result<()>;

    /// Get permission by ID
    async fn get_permission(&self, id: Uuid) -> Result<Option<Permission>>;

    /// Get permission by name (case-insensitive)
    async fn get_permission_by_name(&self, name: &str) -> Result<Option<Permission>>;

    /// List permissions with pagination
    async fn list_permissions(&self, limit: u32, offset: u32) -> Result<Vec<Permission>>;

    /// Update a permission's description
    async fn update_permission_description(
        &self,
        id: Uuid,
        description: Option<&str>,
    ) -> Result<()>;

    /// Delete a permission (caller enforces referential-integrity guards)
    async fn delete_permission(&self, id: Uuid) -> Result<()>;

    /// Number of roles still referencing a permission
    async fn count_roles_with_permission(&self, permission_id: Uuid) -> Result<i64>;

    // ================================
    // Roles
    // ================================

    /// Persist a new role
    async fn create_role(&self, role: &Role) -> Result<()>;

    /// Get role by ID
    async fn get_role(&self, id: Uuid) -> Result<Option<Role>>;

    /// Get role by name (case-insensitive)
    async fn get_role_by_name(&self, name: &str) -> Result<Option<Role>>;

    /// List roles with pagination
    async fn list_roles(&self, limit: u32, offset: u32) -> Result<Vec<Role>>;

    /// Update a role's description and bump `updated_at`
    async fn update_role_description(&self, id: Uuid, description: Option<&str>) -> Result<()>;

    /// Delete a role (caller enforces referential-integrity guards)
    async fn delete_role(&self, id: Uuid) -> Result<()>;

    /// Number of users still holding a role
    async fn count_users_with_role(&self, role_id: Uuid) -> Result<i64>;

    // ================================
    // Role permissions
    // ================================

    /// Link a permission to a role; already-linked pairs are a no-op
    async fn assign_permission_to_role(&self, role_id: Uuid, permission_id: Uuid) -> Result<()>;

    /// Link a batch of permissions to a role in a single transaction
    async fn assign_permissions_to_role(
        &self,
        role_id: Uuid,
        permission_ids: &[Uuid],
    ) -> Result<()>;

    /// Unlink a permission from a role
    async fn remove_permission_from_role(&self, role_id: Uuid, permission_id: Uuid) -> Result<()>;

    /// All permissions granted to a role
    async fn get_role_permissions(&self, role_id: Uuid) -> Result<Vec<Permission>>;

    // ================================
    // User role reference
    // ================================

    /// The user's current role, if any ("no role assigned" is a valid state)
    async fn get_user_role(&self, user_id: Uuid) -> Result<Option<Uuid>>;

    /// Assign or replace the user's role
    async fn set_user_role(&self, user_id: Uuid, role_id: Uuid) -> Result<()>;

    /// Remove the user's role assignment
    async fn clear_user_role(&self, user_id: Uuid) -> Result<()>;

    // ================================
    // OAuth tokens (ciphertext at rest)
    // ================================

    /// Insert a new token row
    async fn insert_oauth_token(&self, token: &OAuthToken) -> Result<()>;

    /// Replace a token row's ciphertext and expiry, bumping `updated_at`
    async fn update_oauth_token(&self, token: &OAuthToken) -> Result<()>;

    /// The authoritative (most recently updated) token for a (user, provider)
    async fn get_oauth_token(
        &self,
        user_id: Uuid,
        provider: OAuthProvider,
    ) -> Result<Option<OAuthToken>>;

    /// Every token row for a user, across providers
    async fn get_user_oauth_tokens(&self, user_id: Uuid) -> Result<Vec<OAuthToken>>;

    /// Delete all token rows for a (user, provider)
    async fn delete_oauth_token(&self, user_id: Uuid, provider: OAuthProvider) -> Result<()>;

    /// Delete token rows whose expiry has passed; returns rows removed
    async fn delete_expired_oauth_tokens(&self, now: DateTime<Utc>) -> Result<u64>;

    // ================================
    // Token blacklist
    // ================================

    /// Insert a revocation entry keyed by unique token hash
    async fn insert_blacklist_entry(&self, entry: &BlacklistEntry) -> Result<()>;

    /// Insert a batch of revocation entries in a single transaction
    async fn insert_blacklist_entries(&self, entries: &[BlacklistEntry]) -> Result<()>;

    /// Look up a revocation entry by token hash
    async fn get_blacklist_entry(&self, token_hash: &str) -> Result<Option<BlacklistEntry>>;

    /// Delete entries whose window has closed; returns rows removed
    async fn delete_expired_blacklist_entries(&self, now: DateTime<Utc>) -> Result<u64>;

    /// Delete entries expiring before a cutoff; returns rows removed
    async fn delete_blacklist_entries_expiring_before(&self, cutoff: DateTime<Utc>) -> Result<u64>;
}
