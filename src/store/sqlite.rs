// ABOUTME: SQLite store implementation using sqlx with runtime queries
// ABOUTME: Owns schema migrations and row mapping for all authorization tables
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Aegis Platform

//! SQLite persistence layer.
//!
//! UUIDs are stored as TEXT and timestamps as RFC 3339 TEXT, which keeps the
//! schema portable and the rows readable in the sqlite shell. Name lookups
//! compare case-insensitively so "Editor" and "editor" are the same role.

use super::AuthStore;
use crate::models::{BlacklistEntry, BlacklistReason, OAuthProvider, OAuthToken, Permission, Role};
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{Row, SqlitePool};
use tracing::{debug, info};
use uuid::Uuid;

/// SQLite-backed store
#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Create a new store, creating the database file if needed
    ///
    /// # Errors
    ///
    /// Returns an error if the connection pool cannot be established
    pub async fn new(database_url: &str) -> Result<Self> {
        // rwc mode creates the file on first run
        let connect_url = if database_url.contains('?') {
            database_url.to_owned()
        } else {
            format!("{database_url}?mode=rwc")
        };

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(&connect_url)
            .await
            .context("failed to connect to SQLite database")?;

        Ok(Self { pool })
    }

    /// Access the underlying pool (used by maintenance tooling)
    #[must_use]
    pub const fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    fn row_to_permission(row: &sqlx::sqlite::SqliteRow) -> Result<Permission> {
        Ok(Permission {
            id: parse_uuid(&row.try_get::<String, _>("id")?)?,
            name: row.try_get("name")?,
            resource: row.try_get("resource")?,
            action: row.try_get("action")?,
            description: row.try_get("description")?,
            created_at: parse_timestamp(&row.try_get::<String, _>("created_at")?)?,
        })
    }

    fn row_to_role(row: &sqlx::sqlite::SqliteRow) -> Result<Role> {
        Ok(Role {
            id: parse_uuid(&row.try_get::<String, _>("id")?)?,
            name: row.try_get("name")?,
            description: row.try_get("description")?,
            created_at: parse_timestamp(&row.try_get::<String, _>("created_at")?)?,
            updated_at: parse_timestamp(&row.try_get::<String, _>("updated_at")?)?,
        })
    }

    fn row_to_oauth_token(row: &sqlx::sqlite::SqliteRow) -> Result<OAuthToken> {
        Ok(OAuthToken {
            id: parse_uuid(&row.try_get::<String, _>("id")?)?,
            user_id: parse_uuid(&row.try_get::<String, _>("user_id")?)?,
            provider: row
                .try_get::<String, _>("provider")?
                .parse()
                .map_err(|e| anyhow!("{e}"))?,
            access_token: row.try_get("access_token")?,
            refresh_token: row.try_get("refresh_token")?,
            token_type: row.try_get("token_type")?,
            expires_at: row
                .try_get::<Option<String>, _>("expires_at")?
                .map(|s| parse_timestamp(&s))
                .transpose()?,
            created_at: parse_timestamp(&row.try_get::<String, _>("created_at")?)?,
            updated_at: parse_timestamp(&row.try_get::<String, _>("updated_at")?)?,
        })
    }

    fn row_to_blacklist_entry(row: &sqlx::sqlite::SqliteRow) -> Result<BlacklistEntry> {
        Ok(BlacklistEntry {
            id: parse_uuid(&row.try_get::<String, _>("id")?)?,
            token_hash: row.try_get("token_hash")?,
            user_id: row
                .try_get::<Option<String>, _>("user_id")?
                .map(|s| parse_uuid(&s))
                .transpose()?,
            blacklisted_at: parse_timestamp(&row.try_get::<String, _>("blacklisted_at")?)?,
            expires_at: parse_timestamp(&row.try_get::<String, _>("expires_at")?)?,
            reason: row
                .try_get::<String, _>("reason")?
                .parse::<BlacklistReason>()
                .map_err(|e| anyhow!("{e}"))?,
        })
    }
}

fn parse_uuid(s: &str) -> Result<Uuid> {
    Uuid::parse_str(s).with_context(|| format!("invalid uuid in store: {s}"))
}

fn parse_timestamp(s: &str) -> Result<DateTime<Utc>> {
    Ok(DateTime::parse_from_rfc3339(s)
        .with_context(|| format!("invalid timestamp in store: {s}"))?
        .with_timezone(&Utc))
}

#[async_trait]
impl AuthStore for SqliteStore {
    async fn migrate(&self) -> Result<()> {
        info!("Running SQLite store migrations");

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS permissions (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL UNIQUE COLLATE NOCASE,
                resource TEXT NOT NULL,
                action TEXT NOT NULL,
                description TEXT,
                created_at TEXT NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS roles (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL UNIQUE COLLATE NOCASE,
                description TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS role_permissions (
                role_id TEXT NOT NULL REFERENCES roles(id),
                permission_id TEXT NOT NULL REFERENCES permissions(id),
                PRIMARY KEY (role_id, permission_id)
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS user_roles (
                user_id TEXT PRIMARY KEY,
                role_id TEXT NOT NULL REFERENCES roles(id),
                assigned_at TEXT NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS oauth_tokens (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                provider TEXT NOT NULL,
                access_token TEXT NOT NULL,
                refresh_token TEXT,
                token_type TEXT,
                expires_at TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_oauth_tokens_user_provider
             ON oauth_tokens(user_id, provider)",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS token_blacklist (
                id TEXT PRIMARY KEY,
                token_hash TEXT NOT NULL UNIQUE,
                user_id TEXT,
                blacklisted_at TEXT NOT NULL,
                expires_at TEXT NOT NULL,
                reason TEXT NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_token_blacklist_expires
             ON token_blacklist(expires_at)",
        )
        .execute(&self.pool)
        .await?;

        info!("SQLite store migrations completed");
        Ok(())
    }

    // ================================
    // Permissions
    // ================================

    async fn create_permission(&self, permission: &Permission) -> Result<()> {
        sqlx::query(
            r"
            INSERT INTO permissions (id, name, resource, action, description, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            ",
        )
        .bind(permission.id.to_string())
        .bind(&permission.name)
        .bind(&permission.resource)
        .bind(&permission.action)
        .bind(&permission.description)
        .bind(permission.created_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn create_permissions(&self, permissions: &[Permission]) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        for permission in permissions {
            sqlx::query(
                r"
                INSERT INTO permissions (id, name, resource, action, description, created_at)
                VALUES (?, ?, ?, ?, ?, ?)
                ",
            )
            .bind(permission.id.to_string())
            .bind(&permission.name)
            .bind(&permission.resource)
            .bind(&permission.action)
            .bind(&permission.description)
            .bind(permission.created_at.to_rfc3339())
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        debug!("Created {} permissions in one transaction", permissions.len());
        Ok(())
    }

    async fn get_permission(&self, id: Uuid) -> Result<Option<Permission>> {
        let row = sqlx::query("SELECT * FROM permissions WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(Self::row_to_permission).transpose()
    }

    async fn get_permission_by_name(&self, name: &str) -> Result<Option<Permission>> {
        let row = sqlx::query("SELECT * FROM permissions WHERE name = ? COLLATE NOCASE")
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(Self::row_to_permission).transpose()
    }

    async fn list_permissions(&self, limit: u32, offset: u32) -> Result<Vec<Permission>> {
        let rows = sqlx::query("SELECT * FROM permissions ORDER BY name LIMIT ? OFFSET ?")
            .bind(i64::from(limit))
            .bind(i64::from(offset))
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(Self::row_to_permission).collect()
    }

    async fn update_permission_description(
        &self,
        id: Uuid,
        description: Option<&str>,
    ) -> Result<()> {
        sqlx::query("UPDATE permissions SET description = ? WHERE id = ?")
            .bind(description)
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn delete_permission(&self, id: Uuid) -> Result<()> {
        sqlx::query("DELETE FROM permissions WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn count_roles_with_permission(&self, permission_id: Uuid) -> Result<i64> {
        let row = sqlx::query("SELECT COUNT(*) as cnt FROM role_permissions WHERE permission_id = ?")
            .bind(permission_id.to_string())
            .fetch_one(&self.pool)
            .await?;

        Ok(row.try_get("cnt")?)
    }

    // ================================
    // Roles
    // ================================

    async fn create_role(&self, role: &Role) -> Result<()> {
        sqlx::query(
            r"
            INSERT INTO roles (id, name, description, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?)
            ",
        )
        .bind(role.id.to_string())
        .bind(&role.name)
        .bind(&role.description)
        .bind(role.created_at.to_rfc3339())
        .bind(role.updated_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get_role(&self, id: Uuid) -> Result<Option<Role>> {
        let row = sqlx::query("SELECT * FROM roles WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(Self::row_to_role).transpose()
    }

    async fn get_role_by_name(&self, name: &str) -> Result<Option<Role>> {
        let row = sqlx::query("SELECT * FROM roles WHERE name = ? COLLATE NOCASE")
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(Self::row_to_role).transpose()
    }

    async fn list_roles(&self, limit: u32, offset: u32) -> Result<Vec<Role>> {
        let rows = sqlx::query("SELECT * FROM roles ORDER BY name LIMIT ? OFFSET ?")
            .bind(i64::from(limit))
            .bind(i64::from(offset))
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(Self::row_to_role).collect()
    }

    async fn update_role_description(&self, id: Uuid, description: Option<&str>) -> Result<()> {
        sqlx::query("UPDATE roles SET description = ?, updated_at = ? WHERE id = ?")
            .bind(description)
            .bind(Utc::now().to_rfc3339())
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn delete_role(&self, id: Uuid) -> Result<()> {
        sqlx::query("DELETE FROM roles WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn count_users_with_role(&self, role_id: Uuid) -> Result<i64> {
        let row = sqlx::query("SELECT COUNT(*) as cnt FROM user_roles WHERE role_id = ?")
            .bind(role_id.to_string())
            .fetch_one(&self.pool)
            .await?;

        Ok(row.try_get("cnt")?)
    }

    // ================================
    // Role permissions
    // ================================

    async fn assign_permission_to_role(&self, role_id: Uuid, permission_id: Uuid) -> Result<()> {
        // OR IGNORE makes re-assignment a no-op rather than a constraint error
        sqlx::query(
            "INSERT OR IGNORE INTO role_permissions (role_id, permission_id) VALUES (?, ?)",
        )
        .bind(role_id.to_string())
        .bind(permission_id.to_string())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn assign_permissions_to_role(
        &self,
        role_id: Uuid,
        permission_ids: &[Uuid],
    ) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        for permission_id in permission_ids {
            sqlx::query(
                "INSERT OR IGNORE INTO role_permissions (role_id, permission_id) VALUES (?, ?)",
            )
            .bind(role_id.to_string())
            .bind(permission_id.to_string())
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn remove_permission_from_role(&self, role_id: Uuid, permission_id: Uuid) -> Result<()> {
        sqlx::query("DELETE FROM role_permissions WHERE role_id = ? AND permission_id = ?")
            .bind(role_id.to_string())
            .bind(permission_id.to_string())
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn get_role_permissions(&self, role_id: Uuid) -> Result<Vec<Permission>> {
        let rows = sqlx::query(
            r"
            SELECT p.* FROM permissions p
            INNER JOIN role_permissions rp ON rp.permission_id = p.id
            WHERE rp.role_id = ?
            ORDER BY p.name
            ",
        )
        .bind(role_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::row_to_permission).collect()
    }

    // ================================
    // User role reference
    // ================================

    async fn get_user_role(&self, user_id: Uuid) -> Result<Option<Uuid>> {
        let row = sqlx::query("SELECT role_id FROM user_roles WHERE user_id = ?")
            .bind(user_id.to_string())
            .fetch_optional(&self.pool)
            .await?;

        row.map(|r| parse_uuid(&r.try_get::<String, _>("role_id")?))
            .transpose()
    }

    async fn set_user_role(&self, user_id: Uuid, role_id: Uuid) -> Result<()> {
        sqlx::query(
            r"
            INSERT INTO user_roles (user_id, role_id, assigned_at)
            VALUES (?, ?, ?)
            ON CONFLICT(user_id) DO UPDATE SET role_id = excluded.role_id,
                                               assigned_at = excluded.assigned_at
            ",
        )
        .bind(user_id.to_string())
        .bind(role_id.to_string())
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn clear_user_role(&self, user_id: Uuid) -> Result<()> {
        sqlx::query("DELETE FROM user_roles WHERE user_id = ?")
            .bind(user_id.to_string())
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    // ================================
    // OAuth tokens
    // ================================

    async fn insert_oauth_token(&self, token: &OAuthToken) -> Result<()> {
        sqlx::query(
            r"
            INSERT INTO oauth_tokens
                (id, user_id, provider, access_token, refresh_token, token_type,
                 expires_at, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            ",
        )
        .bind(token.id.to_string())
        .bind(token.user_id.to_string())
        .bind(token.provider.as_str())
        .bind(&token.access_token)
        .bind(&token.refresh_token)
        .bind(&token.token_type)
        .bind(token.expires_at.map(|t| t.to_rfc3339()))
        .bind(token.created_at.to_rfc3339())
        .bind(token.updated_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn update_oauth_token(&self, token: &OAuthToken) -> Result<()> {
        sqlx::query(
            r"
            UPDATE oauth_tokens
            SET access_token = ?, refresh_token = ?, token_type = ?,
                expires_at = ?, updated_at = ?
            WHERE id = ?
            ",
        )
        .bind(&token.access_token)
        .bind(&token.refresh_token)
        .bind(&token.token_type)
        .bind(token.expires_at.map(|t| t.to_rfc3339()))
        .bind(token.updated_at.to_rfc3339())
        .bind(token.id.to_string())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get_oauth_token(
        &self,
        user_id: Uuid,
        provider: OAuthProvider,
    ) -> Result<Option<OAuthToken>> {
        // The most recently updated row is authoritative
        let row = sqlx::query(
            r"
            SELECT * FROM oauth_tokens
            WHERE user_id = ? AND provider = ?
            ORDER BY updated_at DESC
            LIMIT 1
            ",
        )
        .bind(user_id.to_string())
        .bind(provider.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(Self::row_to_oauth_token).transpose()
    }

    async fn get_user_oauth_tokens(&self, user_id: Uuid) -> Result<Vec<OAuthToken>> {
        let rows = sqlx::query(
            "SELECT * FROM oauth_tokens WHERE user_id = ? ORDER BY provider, updated_at DESC",
        )
        .bind(user_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::row_to_oauth_token).collect()
    }

    async fn delete_oauth_token(&self, user_id: Uuid, provider: OAuthProvider) -> Result<()> {
        sqlx::query("DELETE FROM oauth_tokens WHERE user_id = ? AND provider = ?")
            .bind(user_id.to_string())
            .bind(provider.as_str())
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn delete_expired_oauth_tokens(&self, now: DateTime<Utc>) -> Result<u64> {
        let result =
            sqlx::query("DELETE FROM oauth_tokens WHERE expires_at IS NOT NULL AND expires_at < ?")
                .bind(now.to_rfc3339())
                .execute(&self.pool)
                .await?;

        Ok(result.rows_affected())
    }

    // ================================
    // Token blacklist
    // ================================

    async fn insert_blacklist_entry(&self, entry: &BlacklistEntry) -> Result<()> {
        sqlx::query(
            r"
            INSERT INTO token_blacklist
                (id, token_hash, user_id, blacklisted_at, expires_at, reason)
            VALUES (?, ?, ?, ?, ?, ?)
            ",
        )
        .bind(entry.id.to_string())
        .bind(&entry.token_hash)
        .bind(entry.user_id.map(|u| u.to_string()))
        .bind(entry.blacklisted_at.to_rfc3339())
        .bind(entry.expires_at.to_rfc3339())
        .bind(entry.reason.as_str())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn insert_blacklist_entries(&self, entries: &[BlacklistEntry]) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        for entry in entries {
            // Re-revoking the same token must not fail the batch
            sqlx::query(
                r"
                INSERT OR IGNORE INTO token_blacklist
                    (id, token_hash, user_id, blacklisted_at, expires_at, reason)
                VALUES (?, ?, ?, ?, ?, ?)
                ",
            )
            .bind(entry.id.to_string())
            .bind(&entry.token_hash)
            .bind(entry.user_id.map(|u| u.to_string()))
            .bind(entry.blacklisted_at.to_rfc3339())
            .bind(entry.expires_at.to_rfc3339())
            .bind(entry.reason.as_str())
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn get_blacklist_entry(&self, token_hash: &str) -> Result<Option<BlacklistEntry>> {
        let row = sqlx::query("SELECT * FROM token_blacklist WHERE token_hash = ?")
            .bind(token_hash)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(Self::row_to_blacklist_entry).transpose()
    }

    async fn delete_expired_blacklist_entries(&self, now: DateTime<Utc>) -> Result<u64> {
        let result = sqlx::query("DELETE FROM token_blacklist WHERE expires_at < ?")
            .bind(now.to_rfc3339())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    async fn delete_blacklist_entries_expiring_before(&self, cutoff: DateTime<Utc>) -> Result<u64> {
        let result = sqlx::query("DELETE FROM token_blacklist WHERE expires_at < ?")
            .bind(cutoff.to_rfc3339())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}
