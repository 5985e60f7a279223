// ABOUTME: RBAC decision engine with cache-aside reads and write-through invalidation
// ABOUTME: Permission/role CRUD, decision checks, and referential-integrity guards
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Aegis Platform

use super::{OwnershipRegistry, Principal};
use crate::audit::{AuditEntry, AuditLog, CheckRule, DecisionReason};
use crate::cache::{factory::Cache, CacheKey};
use crate::constants::limits::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
use crate::errors::{AppError, AppResult};
use crate::models::{Permission, Role};
use crate::store::AuthStore;
use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Authorization decision engine.
///
/// Reads go cache-first with a fall-back to the store; writes hit the store
/// first, then replace singleton cache entries and sweep list caches. Cache
/// transport failures are logged and swallowed, never propagated: the store
/// is always a safe fallback.
///
/// Known consistency gap: boolean check results have their own TTL tier and
/// are not swept when a role's permission set changes, only when the user's
/// role assignment changes. A revoked permission can read as granted for up
/// to the check-result TTL.
pub struct AuthzEngine<S: AuthStore> {
    store: Arc<S>,
    cache: Cache,
    audit: Arc<AuditLog>,
    ownership: OwnershipRegistry,
}

impl<S: AuthStore> AuthzEngine<S> {
    /// Create an engine over a store, cache, audit sink, and ownership table
    #[must_use]
    pub fn new(
        store: Arc<S>,
        cache: Cache,
        audit: Arc<AuditLog>,
        ownership: OwnershipRegistry,
    ) -> Self {
        Self {
            store,
            cache,
            audit,
            ownership,
        }
    }

    /// The audit log decisions are recorded into
    #[must_use]
    pub fn audit(&self) -> &Arc<AuditLog> {
        &self.audit
    }

    // ================================
    // Permission CRUD
    // ================================

    /// Create a permission after validating the name and checking uniqueness
    ///
    /// # Errors
    ///
    /// Returns an `InvalidFormat` error for a malformed name, `DuplicateName`
    /// for a case-insensitive collision, or a store error
    pub async fn create_permission(
        &self,
        name: &str,
        description: Option<String>,
    ) -> AppResult<Permission> {
        let permission = Permission::new(name, description)?;

        if self.store.get_permission_by_name(name).await?.is_some() {
            return Err(AppError::duplicate_name(name));
        }

        self.store.create_permission(&permission).await?;
        info!(permission = %permission.name, id = %permission.id, "Created permission");

        self.write_through_permission(&permission).await;
        self.cache_sweep(&CacheKey::permission_list_pattern()).await;

        Ok(permission)
    }

    /// Create a batch of permissions in one all-or-nothing transaction
    ///
    /// # Errors
    ///
    /// Returns the first validation or duplicate-name error; the store
    /// rolls back the whole batch if any row fails
    pub async fn create_permissions(
        &self,
        specs: &[(String, Option<String>)],
    ) -> AppResult<Vec<Permission>> {
        let mut permissions = Vec::with_capacity(specs.len());
        for (name, description) in specs {
            if self.store.get_permission_by_name(name).await?.is_some() {
                return Err(AppError::duplicate_name(name));
            }
            if permissions
                .iter()
                .any(|p: &Permission| p.name.eq_ignore_ascii_case(name))
            {
                return Err(AppError::duplicate_name(name));
            }
            permissions.push(Permission::new(name, description.clone())?);
        }

        self.store.create_permissions(&permissions).await?;
        info!(count = permissions.len(), "Created permission batch");

        for permission in &permissions {
            self.write_through_permission(permission).await;
        }
        self.cache_sweep(&CacheKey::permission_list_pattern()).await;

        Ok(permissions)
    }

    /// Fetch a permission by id
    ///
    /// # Errors
    ///
    /// Returns `ResourceNotFound` if no permission has this id
    pub async fn get_permission(&self, id: Uuid) -> AppResult<Permission> {
        let key = CacheKey::Permission { id };
        if let Some(permission) = self.cache_get::<Permission>(&key).await {
            return Ok(permission);
        }

        let permission = self
            .store
            .get_permission(id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("permission {id}")))?;

        self.cache_put(&key, &permission).await;
        Ok(permission)
    }

    /// Fetch a permission by name (case-insensitive)
    ///
    /// # Errors
    ///
    /// Returns `ResourceNotFound` if no permission has this name
    pub async fn get_permission_by_name(&self, name: &str) -> AppResult<Permission> {
        let key = CacheKey::PermissionByName {
            name: name.to_lowercase(),
        };
        if let Some(permission) = self.cache_get::<Permission>(&key).await {
            return Ok(permission);
        }

        let permission = self
            .store
            .get_permission_by_name(name)
            .await?
            .ok_or_else(|| AppError::not_found(format!("permission '{name}'")))?;

        self.cache_put(&key, &permission).await;
        Ok(permission)
    }

    /// List permissions, paginated and ordered by name
    ///
    /// # Errors
    ///
    /// Returns a store error if the query fails
    pub async fn list_permissions(&self, limit: u32, offset: u32) -> AppResult<Vec<Permission>> {
        let limit = clamp_page_size(limit);
        let key = CacheKey::PermissionList { limit, offset };
        if let Some(permissions) = self.cache_get::<Vec<Permission>>(&key).await {
            return Ok(permissions);
        }

        let permissions = self.store.list_permissions(limit, offset).await?;
        if !permissions.is_empty() {
            self.cache_put(&key, &permissions).await;
        }
        Ok(permissions)
    }

    /// Update a permission's description
    ///
    /// # Errors
    ///
    /// Returns `ResourceNotFound` if the permission does not exist
    pub async fn update_permission_description(
        &self,
        id: Uuid,
        description: Option<String>,
    ) -> AppResult<Permission> {
        let mut permission = self
            .store
            .get_permission(id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("permission {id}")))?;

        self.store
            .update_permission_description(id, description.as_deref())
            .await?;
        permission.description = description;

        self.write_through_permission(&permission).await;
        self.cache_sweep(&CacheKey::permission_list_pattern()).await;

        Ok(permission)
    }

    /// Referential-integrity guard: a permission cannot be deleted while any
    /// role still references it
    ///
    /// # Errors
    ///
    /// Returns `ReferencedEntity` with the blocking count
    pub async fn can_delete_permission(&self, id: Uuid) -> AppResult<()> {
        let count = self.store.count_roles_with_permission(id).await?;
        if count > 0 {
            return Err(AppError::referenced_entity("permission", count));
        }
        Ok(())
    }

    /// Delete a permission after the referential-integrity guard passes
    ///
    /// # Errors
    ///
    /// Returns `ResourceNotFound` or `ReferencedEntity`
    pub async fn delete_permission(&self, id: Uuid) -> AppResult<()> {
        let permission = self
            .store
            .get_permission(id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("permission {id}")))?;

        self.can_delete_permission(id).await?;
        self.store.delete_permission(id).await?;
        info!(permission = %permission.name, "Deleted permission");

        self.cache_drop(&CacheKey::Permission { id }).await;
        self.cache_drop(&CacheKey::PermissionByName {
            name: permission.name.to_lowercase(),
        })
        .await;
        self.cache_sweep(&CacheKey::permission_list_pattern()).await;

        Ok(())
    }

    // ================================
    // Role CRUD
    // ================================

    /// Create a role after validating the name and checking uniqueness
    ///
    /// # Errors
    ///
    /// Returns `InvalidFormat`, `DuplicateName`, or a store error
    pub async fn create_role(&self, name: &str, description: Option<String>) -> AppResult<Role> {
        let role = Role::new(name, description)?;

        if self.store.get_role_by_name(name).await?.is_some() {
            return Err(AppError::duplicate_name(name));
        }

        self.store.create_role(&role).await?;
        info!(role = %role.name, id = %role.id, "Created role");

        self.write_through_role(&role).await;
        self.cache_sweep(&CacheKey::role_list_pattern()).await;

        Ok(role)
    }

    /// Fetch a role by id
    ///
    /// # Errors
    ///
    /// Returns `ResourceNotFound` if no role has this id
    pub async fn get_role(&self, id: Uuid) -> AppResult<Role> {
        let key = CacheKey::Role { id };
        if let Some(role) = self.cache_get::<Role>(&key).await {
            return Ok(role);
        }

        let role = self
            .store
            .get_role(id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("role {id}")))?;

        self.cache_put(&key, &role).await;
        Ok(role)
    }

    /// Fetch a role by name (case-insensitive)
    ///
    /// # Errors
    ///
    /// Returns `ResourceNotFound` if no role has this name
    pub async fn get_role_by_name(&self, name: &str) -> AppResult<Role> {
        let key = CacheKey::RoleByName {
            name: name.to_lowercase(),
        };
        if let Some(role) = self.cache_get::<Role>(&key).await {
            return Ok(role);
        }

        let role = self
            .store
            .get_role_by_name(name)
            .await?
            .ok_or_else(|| AppError::not_found(format!("role '{name}'")))?;

        self.cache_put(&key, &role).await;
        Ok(role)
    }

    /// List roles, paginated and ordered by name
    ///
    /// # Errors
    ///
    /// Returns a store error if the query fails
    pub async fn list_roles(&self, limit: u32, offset: u32) -> AppResult<Vec<Role>> {
        let limit = clamp_page_size(limit);
        let key = CacheKey::RoleList { limit, offset };
        if let Some(roles) = self.cache_get::<Vec<Role>>(&key).await {
            return Ok(roles);
        }

        let roles = self.store.list_roles(limit, offset).await?;
        if !roles.is_empty() {
            self.cache_put(&key, &roles).await;
        }
        Ok(roles)
    }

    /// Update a role's description
    ///
    /// # Errors
    ///
    /// Returns `ResourceNotFound` if the role does not exist
    pub async fn update_role_description(
        &self,
        id: Uuid,
        description: Option<String>,
    ) -> AppResult<Role> {
        let role = self
            .store
            .get_role(id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("role {id}")))?;

        self.store
            .update_role_description(id, description.as_deref())
            .await?;

        // Re-read for the bumped updated_at
        let updated = self
            .store
            .get_role(id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("role {id}")))?;
        debug!(role = %role.name, "Updated role description");

        self.write_through_role(&updated).await;
        self.cache_sweep(&CacheKey::role_list_pattern()).await;

        Ok(updated)
    }

    /// Referential-integrity guard: a role cannot be deleted while any user
    /// still holds it
    ///
    /// # Errors
    ///
    /// Returns `ReferencedEntity` with the blocking count
    pub async fn can_delete_role(&self, id: Uuid) -> AppResult<()> {
        let count = self.store.count_users_with_role(id).await?;
        if count > 0 {
            return Err(AppError::referenced_entity("role", count));
        }
        Ok(())
    }

    /// Delete a role after the referential-integrity guard passes
    ///
    /// # Errors
    ///
    /// Returns `ResourceNotFound` or `ReferencedEntity`
    pub async fn delete_role(&self, id: Uuid) -> AppResult<()> {
        let role = self
            .store
            .get_role(id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("role {id}")))?;

        self.can_delete_role(id).await?;
        self.store.delete_role(id).await?;
        info!(role = %role.name, "Deleted role");

        self.cache_drop(&CacheKey::Role { id }).await;
        self.cache_drop(&CacheKey::RoleByName {
            name: role.name.to_lowercase(),
        })
        .await;
        self.cache_drop(&CacheKey::RolePermissions { role_id: id }).await;
        self.cache_sweep(&CacheKey::role_list_pattern()).await;

        Ok(())
    }

    // ================================
    // Role-permission links
    // ================================

    /// Grant a permission to a role; granting an already-granted permission
    /// is a no-op
    ///
    /// # Errors
    ///
    /// Returns `ResourceNotFound` if either side does not exist
    pub async fn assign_permission_to_role(
        &self,
        role_id: Uuid,
        permission_id: Uuid,
    ) -> AppResult<()> {
        self.get_role(role_id).await?;
        self.get_permission(permission_id).await?;

        self.store
            .assign_permission_to_role(role_id, permission_id)
            .await?;
        self.cache_drop(&CacheKey::RolePermissions { role_id }).await;

        Ok(())
    }

    /// Grant a batch of permissions to a role in one transaction, skipping
    /// already-granted pairs
    ///
    /// # Errors
    ///
    /// Returns `ResourceNotFound` if the role or any permission is missing
    pub async fn assign_permissions_to_role(
        &self,
        role_id: Uuid,
        permission_ids: &[Uuid],
    ) -> AppResult<()> {
        self.get_role(role_id).await?;
        for permission_id in permission_ids {
            self.get_permission(*permission_id).await?;
        }

        self.store
            .assign_permissions_to_role(role_id, permission_ids)
            .await?;
        self.cache_drop(&CacheKey::RolePermissions { role_id }).await;

        Ok(())
    }

    /// Revoke a permission from a role
    ///
    /// # Errors
    ///
    /// Returns a store error if the delete fails
    pub async fn remove_permission_from_role(
        &self,
        role_id: Uuid,
        permission_id: Uuid,
    ) -> AppResult<()> {
        self.store
            .remove_permission_from_role(role_id, permission_id)
            .await?;
        self.cache_drop(&CacheKey::RolePermissions { role_id }).await;

        Ok(())
    }

    /// All permissions granted to a role
    ///
    /// # Errors
    ///
    /// Returns a store error if the query fails
    pub async fn get_role_permissions(&self, role_id: Uuid) -> AppResult<Vec<Permission>> {
        Ok(self.store.get_role_permissions(role_id).await?)
    }

    // ================================
    // User-role assignment
    // ================================

    /// Assign a role to a user, replacing any previous role, then sweep
    /// everything cached for that user so stale grants are bounded by the
    /// sweep rather than the TTL
    ///
    /// # Errors
    ///
    /// Returns `ResourceNotFound` if the role does not exist
    pub async fn assign_role_to_user(&self, user_id: Uuid, role_id: Uuid) -> AppResult<()> {
        self.get_role(role_id).await?;

        self.store.set_user_role(user_id, role_id).await?;
        info!(%user_id, %role_id, "Assigned role to user");

        self.cache_sweep(&CacheKey::user_pattern(user_id)).await;
        Ok(())
    }

    /// Remove the user's role assignment and sweep their cached entries
    ///
    /// # Errors
    ///
    /// Returns a store error if the delete fails
    pub async fn remove_role_from_user(&self, user_id: Uuid) -> AppResult<()> {
        self.store.clear_user_role(user_id).await?;
        info!(%user_id, "Removed role from user");

        self.cache_sweep(&CacheKey::user_pattern(user_id)).await;
        Ok(())
    }

    // ================================
    // Decision checks
    // ================================

    /// Whether the user's role grants a single permission. The most
    /// latency-sensitive operation in the core: check-result cache first,
    /// then the resolved user permission set, then the store.
    ///
    /// # Errors
    ///
    /// Returns a store error if resolution fails; a missing permission is a
    /// normal `false`, never an error
    pub async fn has_permission(&self, user_id: Uuid, permission: &str) -> AppResult<bool> {
        let started = Instant::now();
        let (granted, reason) = self.check_permission(user_id, permission).await?;
        self.record(
            user_id,
            CheckRule::Permission(permission.to_owned()),
            granted,
            reason,
            started,
        );
        Ok(granted)
    }

    /// AND over a permission set: true iff every permission is granted
    ///
    /// # Errors
    ///
    /// Returns a store error if resolution fails
    pub async fn has_permissions(&self, user_id: Uuid, permissions: &[&str]) -> AppResult<bool> {
        let started = Instant::now();
        let mut granted = true;
        let mut reason = DecisionReason::PermissionGranted;

        for permission in permissions {
            let (ok, r) = self.check_permission(user_id, permission).await?;
            if !ok {
                granted = false;
                reason = r;
                break;
            }
        }

        self.record(
            user_id,
            CheckRule::AllOf(permissions.iter().map(|&s| s.to_owned()).collect()),
            granted,
            reason,
            started,
        );
        Ok(granted)
    }

    /// OR over a permission set: true iff at least one permission is
    /// granted, short-circuiting on the first success. Evaluated as
    /// sequential single checks, not one batched query.
    ///
    /// # Errors
    ///
    /// Returns a store error if resolution fails
    pub async fn has_any_permission(&self, user_id: Uuid, permissions: &[&str]) -> AppResult<bool> {
        let started = Instant::now();
        let mut granted = false;
        let mut reason = DecisionReason::PermissionMissing;

        for permission in permissions {
            let (ok, r) = self.check_permission(user_id, permission).await?;
            if ok {
                granted = true;
                reason = r;
                break;
            }
            reason = r;
        }

        self.record(
            user_id,
            CheckRule::AnyOf(permissions.iter().map(|&s| s.to_owned()).collect()),
            granted,
            reason,
            started,
        );
        Ok(granted)
    }

    /// The canonical middleware question: composes `resource:action` and
    /// checks it as a single permission
    ///
    /// # Errors
    ///
    /// Returns a store error if resolution fails
    pub async fn can_user_perform_action(
        &self,
        user_id: Uuid,
        resource: &str,
        action: &str,
    ) -> AppResult<bool> {
        let started = Instant::now();
        let permission = format!("{resource}:{action}");
        let (granted, reason) = self.check_permission(user_id, &permission).await?;
        self.record(
            user_id,
            CheckRule::ResourceAction {
                resource: resource.to_owned(),
                action: action.to_owned(),
            },
            granted,
            reason,
            started,
        );
        Ok(granted)
    }

    /// Whether the user holds a role with the given name (case-insensitive)
    ///
    /// # Errors
    ///
    /// Returns a store error if resolution fails
    pub async fn has_role(&self, user_id: Uuid, role_name: &str) -> AppResult<bool> {
        let started = Instant::now();

        let (granted, reason) = match self.store.get_user_role(user_id).await? {
            None => (false, DecisionReason::NoRoleAssigned),
            Some(role_id) => {
                let role = self.get_role(role_id).await?;
                if role.name.eq_ignore_ascii_case(role_name) {
                    (true, DecisionReason::RoleMatched)
                } else {
                    (false, DecisionReason::RoleMismatch)
                }
            }
        };

        self.record(
            user_id,
            CheckRule::Role(role_name.to_owned()),
            granted,
            reason,
            started,
        );
        Ok(granted)
    }

    /// Whether the user owns a resource, via the resolver registered for
    /// its type. A type with no registered resolver fails closed.
    ///
    /// # Errors
    ///
    /// Returns an error if the registered resolver's lookup fails
    pub async fn user_owns_resource(
        &self,
        user_id: Uuid,
        resource_type: &str,
        resource_id: Uuid,
    ) -> AppResult<bool> {
        let started = Instant::now();

        let (granted, reason) = match self.ownership.resolver(resource_type) {
            Some(resolver) => {
                if resolver.owns(user_id, resource_id).await? {
                    (true, DecisionReason::OwnershipConfirmed)
                } else {
                    (false, DecisionReason::OwnershipDenied)
                }
            }
            None => {
                warn!(resource_type, "No ownership resolver registered; denying");
                (false, DecisionReason::UnknownResourceType)
            }
        };

        self.record(
            user_id,
            CheckRule::Ownership {
                resource_type: resource_type.to_owned(),
                resource_id,
            },
            granted,
            reason,
            started,
        );
        Ok(granted)
    }

    /// Guard form for gateways: `Ok(())` when the principal holds the
    /// permission, `PermissionDenied` otherwise
    ///
    /// # Errors
    ///
    /// Returns `PermissionDenied` carrying the missing permission name, or a
    /// store error if resolution fails
    pub async fn require_permission(
        &self,
        principal: &Principal,
        permission: &str,
    ) -> AppResult<()> {
        if self.has_permission(principal.user_id, permission).await? {
            Ok(())
        } else {
            Err(AppError::permission_denied(permission))
        }
    }

    /// The permission names the user's role resolves to (empty when the
    /// user has no role)
    ///
    /// # Errors
    ///
    /// Returns a store error if resolution fails
    pub async fn get_user_permissions(&self, user_id: Uuid) -> AppResult<Vec<String>> {
        Ok(self
            .resolve_user_permissions(user_id)
            .await?
            .unwrap_or_default())
    }

    // ================================
    // Internals
    // ================================

    /// One permission check without audit recording, so composite checks
    /// audit once at the top
    async fn check_permission(
        &self,
        user_id: Uuid,
        permission: &str,
    ) -> AppResult<(bool, DecisionReason)> {
        let key = CacheKey::PermissionCheck {
            user_id,
            permission: permission.to_owned(),
        };
        if let Some(granted) = self.cache_get::<bool>(&key).await {
            let reason = if granted {
                DecisionReason::PermissionGranted
            } else {
                DecisionReason::PermissionMissing
            };
            return Ok((granted, reason));
        }

        let (granted, reason) = match self.resolve_user_permissions(user_id).await? {
            None => (false, DecisionReason::NoRoleAssigned),
            Some(names) => {
                if names.iter().any(|n| n == permission) {
                    (true, DecisionReason::PermissionGranted)
                } else {
                    (false, DecisionReason::PermissionMissing)
                }
            }
        };

        // Negative results are cached too: a denied hot path matters as
        // much as a granted one, and the short check tier bounds staleness
        self.cache_put(&key, &granted).await;
        Ok((granted, reason))
    }

    /// Resolve the user's permission name set through the cache;
    /// `None` means the user has no role assigned
    async fn resolve_user_permissions(&self, user_id: Uuid) -> AppResult<Option<Vec<String>>> {
        let key = CacheKey::UserPermissions { user_id };
        if let Some(names) = self.cache_get::<Option<Vec<String>>>(&key).await {
            return Ok(names);
        }

        let names = match self.store.get_user_role(user_id).await? {
            None => None,
            Some(role_id) => Some(self.role_permission_names(role_id).await?),
        };

        // Nil sets are never cached; the boolean check cache already
        // covers the roleless path
        if names.is_some() {
            self.cache_put(&key, &names).await;
        }
        Ok(names)
    }

    async fn role_permission_names(&self, role_id: Uuid) -> AppResult<Vec<String>> {
        let key = CacheKey::RolePermissions { role_id };
        if let Some(names) = self.cache_get::<Vec<String>>(&key).await {
            return Ok(names);
        }

        let names: Vec<String> = self
            .store
            .get_role_permissions(role_id)
            .await?
            .into_iter()
            .map(|p| p.name)
            .collect();

        if !names.is_empty() {
            self.cache_put(&key, &names).await;
        }
        Ok(names)
    }

    async fn write_through_permission(&self, permission: &Permission) {
        self.cache_put(&CacheKey::Permission { id: permission.id }, permission)
            .await;
        self.cache_put(
            &CacheKey::PermissionByName {
                name: permission.name.to_lowercase(),
            },
            permission,
        )
        .await;
    }

    async fn write_through_role(&self, role: &Role) {
        self.cache_put(&CacheKey::Role { id: role.id }, role).await;
        self.cache_put(
            &CacheKey::RoleByName {
                name: role.name.to_lowercase(),
            },
            role,
        )
        .await;
    }

    fn record(
        &self,
        user_id: Uuid,
        check: CheckRule,
        granted: bool,
        reason: DecisionReason,
        started: Instant,
    ) {
        self.audit.record(AuditEntry {
            timestamp: Utc::now(),
            user_id,
            check,
            granted,
            reason,
            duration: started.elapsed(),
        });
    }

    // Cache failures degrade to the store; they never fail the operation

    async fn cache_get<T: DeserializeOwned>(&self, key: &CacheKey) -> Option<T> {
        match self.cache.get(key).await {
            Ok(value) => value,
            Err(e) => {
                warn!("cache read failed for {key}: {e}");
                None
            }
        }
    }

    async fn cache_put<T: Serialize + Send + Sync>(&self, key: &CacheKey, value: &T) {
        let ttl = self.cache.ttl_for(key);
        if let Err(e) = self.cache.set(key, value, ttl).await {
            warn!("cache write failed for {key}: {e}");
        }
    }

    async fn cache_drop(&self, key: &CacheKey) {
        if let Err(e) = self.cache.invalidate(key).await {
            warn!("cache invalidation failed for {key}: {e}");
        }
    }

    async fn cache_sweep(&self, pattern: &str) {
        match self.cache.invalidate_pattern(pattern).await {
            Ok(count) => debug!("swept {count} cache entries matching {pattern}"),
            Err(e) => warn!("cache sweep failed for {pattern}: {e}"),
        }
    }
}

/// Clamp a requested page size into the allowed window
const fn clamp_page_size(limit: u32) -> u32 {
    if limit == 0 {
        DEFAULT_PAGE_SIZE
    } else if limit > MAX_PAGE_SIZE {
        MAX_PAGE_SIZE
    } else {
        limit
    }
}
