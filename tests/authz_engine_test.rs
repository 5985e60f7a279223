// ABOUTME: Integration tests for the RBAC decision engine over a real SQLite store
// ABOUTME: Covers CRUD, decision semantics, integrity guards, and audit recording
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Aegis Platform

use aegis_core::audit::AuditLog;
use aegis_core::authz::{AuthzEngine, OwnershipRegistry, OwnershipResolver, Principal};
use aegis_core::cache::{factory::Cache, CacheConfig, CacheKey};
use aegis_core::errors::{AppResult, ErrorCode};
use aegis_core::store::sqlite::SqliteStore;
use aegis_core::store::AuthStore;
use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;
use tempfile::TempDir;
use uuid::Uuid;

/// Helper: engine over a file-backed SQLite store and an in-memory cache.
/// The TempDir must outlive the engine or the database file disappears.
async fn create_test_engine() -> Result<(TempDir, AuthzEngine<SqliteStore>)> {
    let dir = tempfile::tempdir()?;
    let url = format!("sqlite:{}", dir.path().join("test.db").display());

    let store = Arc::new(SqliteStore::new(&url).await?);
    store.migrate().await?;

    let cache = Cache::new(CacheConfig {
        enable_background_cleanup: false,
        ..Default::default()
    })
    .await?;

    let engine = AuthzEngine::new(
        store,
        cache,
        Arc::new(AuditLog::default()),
        OwnershipRegistry::new(),
    );
    Ok((dir, engine))
}

/// Helper: an "editor" role holding only `article:create`, assigned to a
/// fresh user
async fn seed_editor(engine: &AuthzEngine<SqliteStore>) -> Result<Uuid> {
    let permission = engine.create_permission("article:create", None).await?;
    let role = engine.create_role("editor", None).await?;
    engine
        .assign_permission_to_role(role.id, permission.id)
        .await?;

    let user_id = Uuid::new_v4();
    engine.assign_role_to_user(user_id, role.id).await?;
    Ok(user_id)
}

#[tokio::test]
async fn test_editor_scenario() -> Result<()> {
    let (_dir, engine) = create_test_engine().await?;
    let user_id = seed_editor(&engine).await?;

    assert!(engine.has_permission(user_id, "article:create").await?);
    assert!(!engine.has_permission(user_id, "article:delete").await?);
    assert!(
        engine
            .can_user_perform_action(user_id, "article", "create")
            .await?
    );

    Ok(())
}

#[tokio::test]
async fn test_and_or_semantics() -> Result<()> {
    let (_dir, engine) = create_test_engine().await?;
    let user_id = seed_editor(&engine).await?;
    engine.create_permission("article:delete", None).await?;

    // AND requires every permission; the user only holds article:create
    assert!(
        !engine
            .has_permissions(user_id, &["article:create", "article:delete"])
            .await?
    );
    assert!(engine.has_permissions(user_id, &["article:create"]).await?);

    // OR short-circuits on the first grant
    assert!(
        engine
            .has_any_permission(user_id, &["article:delete", "article:create"])
            .await?
    );
    assert!(
        !engine
            .has_any_permission(user_id, &["article:delete", "article:publish"])
            .await?
    );

    // Vacuous cases
    assert!(engine.has_permissions(user_id, &[]).await?);
    assert!(!engine.has_any_permission(user_id, &[]).await?);

    Ok(())
}

#[tokio::test]
async fn test_user_without_role_is_denied() -> Result<()> {
    let (_dir, engine) = create_test_engine().await?;
    seed_editor(&engine).await?;

    let stranger = Uuid::new_v4();
    assert!(!engine.has_permission(stranger, "article:create").await?);
    assert!(!engine.has_role(stranger, "editor").await?);

    Ok(())
}

#[tokio::test]
async fn test_duplicate_names_conflict() -> Result<()> {
    let (_dir, engine) = create_test_engine().await?;

    engine.create_permission("article:create", None).await?;
    let err = engine
        .create_permission("article:create", None)
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::DuplicateName);
    assert_eq!(err.http_status(), 409);

    engine.create_role("editor", None).await?;
    // Name collisions are case-insensitive
    let err = engine.create_role("Editor", None).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::DuplicateName);

    Ok(())
}

#[tokio::test]
async fn test_name_validation() -> Result<()> {
    let (_dir, engine) = create_test_engine().await?;

    for bad in ["Article:Create", "article", "a:b:c", ""] {
        let err = engine.create_permission(bad, None).await.unwrap_err();
        assert_eq!(err.http_status(), 400, "expected '{bad}' to be rejected");
    }

    let err = engine.create_role("ab", None).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::InvalidFormat);

    Ok(())
}

#[tokio::test]
async fn test_delete_role_guard() -> Result<()> {
    let (_dir, engine) = create_test_engine().await?;
    let role = engine.create_role("editor", None).await?;
    let user_id = Uuid::new_v4();
    engine.assign_role_to_user(user_id, role.id).await?;

    let err = engine.delete_role(role.id).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::ReferencedEntity);

    engine.remove_role_from_user(user_id).await?;
    engine.delete_role(role.id).await?;

    let err = engine.get_role(role.id).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::ResourceNotFound);

    Ok(())
}

#[tokio::test]
async fn test_delete_permission_guard() -> Result<()> {
    let (_dir, engine) = create_test_engine().await?;
    let permission = engine.create_permission("article:create", None).await?;
    let role = engine.create_role("editor", None).await?;
    engine
        .assign_permission_to_role(role.id, permission.id)
        .await?;

    let err = engine.delete_permission(permission.id).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::ReferencedEntity);

    engine
        .remove_permission_from_role(role.id, permission.id)
        .await?;
    engine.delete_permission(permission.id).await?;

    Ok(())
}

#[tokio::test]
async fn test_assignment_is_idempotent() -> Result<()> {
    let (_dir, engine) = create_test_engine().await?;
    let permission = engine.create_permission("article:create", None).await?;
    let role = engine.create_role("editor", None).await?;

    engine
        .assign_permission_to_role(role.id, permission.id)
        .await?;
    engine
        .assign_permission_to_role(role.id, permission.id)
        .await?;

    assert_eq!(engine.get_role_permissions(role.id).await?.len(), 1);

    Ok(())
}

#[tokio::test]
async fn test_bulk_create_and_assign() -> Result<()> {
    let (_dir, engine) = create_test_engine().await?;

    let specs: Vec<(String, Option<String>)> = vec![
        ("article:create".into(), None),
        ("article:update".into(), Some("edit existing articles".into())),
        ("article:delete".into(), None),
    ];
    let permissions = engine.create_permissions(&specs).await?;
    assert_eq!(permissions.len(), 3);

    // A batch containing a duplicate fails as a whole
    let bad: Vec<(String, Option<String>)> =
        vec![("banner:create".into(), None), ("article:create".into(), None)];
    let err = engine.create_permissions(&bad).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::DuplicateName);
    let err = engine.get_permission_by_name("banner:create").await.unwrap_err();
    assert_eq!(err.code, ErrorCode::ResourceNotFound);

    let role = engine.create_role("editor", None).await?;
    let ids: Vec<Uuid> = permissions.iter().map(|p| p.id).collect();
    engine.assign_permissions_to_role(role.id, &ids).await?;
    assert_eq!(engine.get_role_permissions(role.id).await?.len(), 3);

    Ok(())
}

#[tokio::test]
async fn test_update_description_is_visible() -> Result<()> {
    let (_dir, engine) = create_test_engine().await?;
    let permission = engine.create_permission("article:create", None).await?;

    // Warm the cache, then update
    engine.get_permission(permission.id).await?;
    engine
        .update_permission_description(permission.id, Some("create new articles".into()))
        .await?;

    let fetched = engine.get_permission(permission.id).await?;
    assert_eq!(fetched.description.as_deref(), Some("create new articles"));

    Ok(())
}

#[tokio::test]
async fn test_role_change_takes_effect_immediately() -> Result<()> {
    let (_dir, engine) = create_test_engine().await?;
    let user_id = seed_editor(&engine).await?;

    // Warm the check cache with a grant
    assert!(engine.has_permission(user_id, "article:create").await?);

    // Moving the user to a permissionless role sweeps their cached entries
    let viewer = engine.create_role("viewer", None).await?;
    engine.assign_role_to_user(user_id, viewer.id).await?;

    assert!(!engine.has_permission(user_id, "article:create").await?);

    // And removing the role entirely
    engine.remove_role_from_user(user_id).await?;
    assert!(!engine.has_permission(user_id, "article:create").await?);

    Ok(())
}

#[tokio::test]
async fn test_case_insensitive_lookup() -> Result<()> {
    let (_dir, engine) = create_test_engine().await?;
    let user_id = seed_editor(&engine).await?;

    let role = engine.get_role_by_name("EDITOR").await?;
    assert_eq!(role.name, "editor");
    assert!(engine.has_role(user_id, "Editor").await?);

    Ok(())
}

#[tokio::test]
async fn test_pagination() -> Result<()> {
    let (_dir, engine) = create_test_engine().await?;

    for resource in ["article", "banner", "category", "ebook"] {
        engine
            .create_permission(&format!("{resource}:create"), None)
            .await?;
    }

    let page = engine.list_permissions(2, 0).await?;
    assert_eq!(page.len(), 2);
    assert_eq!(page[0].name, "article:create");

    let rest = engine.list_permissions(2, 2).await?;
    assert_eq!(rest.len(), 2);
    assert_eq!(rest[0].name, "category:create");

    Ok(())
}

#[tokio::test]
async fn test_require_permission_guard() -> Result<()> {
    let (_dir, engine) = create_test_engine().await?;
    let user_id = seed_editor(&engine).await?;
    let principal = Principal::new(Uuid::new_v4());

    engine
        .require_permission(&Principal::new(user_id), "article:create")
        .await?;

    let err = engine
        .require_permission(&principal, "article:create")
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::PermissionDenied);
    assert_eq!(err.http_status(), 403);

    Ok(())
}

struct OwnOddResources;

#[async_trait]
impl OwnershipResolver for OwnOddResources {
    async fn owns(&self, _user_id: Uuid, resource_id: Uuid) -> AppResult<bool> {
        Ok(resource_id.as_bytes()[15] % 2 == 1)
    }
}

#[tokio::test]
async fn test_ownership_registry() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let url = format!("sqlite:{}", dir.path().join("test.db").display());
    let store = Arc::new(SqliteStore::new(&url).await?);
    store.migrate().await?;

    let cache = Cache::new(CacheConfig {
        enable_background_cleanup: false,
        ..Default::default()
    })
    .await?;

    let mut ownership = OwnershipRegistry::new();
    ownership.register("article", Arc::new(OwnOddResources));
    let engine = AuthzEngine::new(store, cache, Arc::new(AuditLog::default()), ownership);

    let user_id = Uuid::new_v4();
    let odd = Uuid::from_bytes([0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 1]);
    let even = Uuid::from_bytes([0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 2]);

    assert!(engine.user_owns_resource(user_id, "article", odd).await?);
    assert!(!engine.user_owns_resource(user_id, "article", even).await?);

    // Unregistered types fail closed instead of erroring
    assert!(!engine.user_owns_resource(user_id, "ebook", odd).await?);

    Ok(())
}

#[tokio::test]
async fn test_decisions_are_audited() -> Result<()> {
    let (_dir, engine) = create_test_engine().await?;
    let user_id = seed_editor(&engine).await?;

    engine.has_permission(user_id, "article:create").await?;
    engine.has_permission(user_id, "article:delete").await?;
    engine
        .has_any_permission(user_id, &["article:create", "article:delete"])
        .await?;

    let audit = engine.audit();
    // One entry per public decision, composites audit once
    assert_eq!(audit.by_user(user_id).len(), 3);
    assert_eq!(audit.denied_only().len(), 1);

    let stats = audit.stats();
    assert_eq!(stats.granted, 2);
    assert_eq!(stats.unique_users, 1);

    Ok(())
}

#[tokio::test]
async fn test_roleless_permission_set_is_not_cached() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let url = format!("sqlite:{}", dir.path().join("test.db").display());

    let store = Arc::new(SqliteStore::new(&url).await?);
    store.migrate().await?;

    let cache = Cache::new(CacheConfig {
        enable_background_cleanup: false,
        ..Default::default()
    })
    .await?;
    let engine = AuthzEngine::new(
        store,
        cache.clone(),
        Arc::new(AuditLog::default()),
        OwnershipRegistry::new(),
    );

    let editor = seed_editor(&engine).await?;
    let stranger = Uuid::new_v4();

    assert!(!engine.has_permission(stranger, "article:create").await?);

    // A user with no role resolves to a nil permission set, and nil sets
    // must not occupy cache entries; only resolved sets do
    assert!(
        !cache
            .exists(&CacheKey::UserPermissions { user_id: stranger })
            .await?
    );

    assert!(engine.has_permission(editor, "article:create").await?);
    assert!(
        cache
            .exists(&CacheKey::UserPermissions { user_id: editor })
            .await?
    );

    Ok(())
}
