// ABOUTME: Tests for the in-memory cache backend
// ABOUTME: Covers TTL expiration, pattern sweeps, capacity eviction, and the factory
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Aegis Platform

use aegis_core::cache::{factory::Cache, CacheConfig, CacheKey};
use aegis_core::models::OAuthProvider;
use anyhow::Result;
use std::time::Duration;
use uuid::Uuid;

/// Helper: in-memory cache with background cleanup disabled (avoids tokio
/// runtime conflicts in tests)
async fn create_test_cache(max_entries: usize) -> Result<Cache> {
    let config = CacheConfig {
        max_entries,
        redis_url: None,
        enable_background_cleanup: false,
        ..Default::default()
    };
    Ok(Cache::new(config).await?)
}

fn check_key(user_id: Uuid, permission: &str) -> CacheKey {
    CacheKey::PermissionCheck {
        user_id,
        permission: permission.to_owned(),
    }
}

#[tokio::test]
async fn test_cache_set_and_get() -> Result<()> {
    let cache = create_test_cache(100).await?;
    let key = check_key(Uuid::new_v4(), "article:create");

    cache.set(&key, &true, Duration::from_secs(10)).await?;

    let retrieved: Option<bool> = cache.get(&key).await?;
    assert_eq!(retrieved, Some(true));

    Ok(())
}

#[tokio::test]
async fn test_cache_expiration() -> Result<()> {
    let cache = create_test_cache(100).await?;
    let key = check_key(Uuid::new_v4(), "article:create");

    cache.set(&key, &true, Duration::from_secs(1)).await?;
    assert!(cache.exists(&key).await?);

    tokio::time::sleep(Duration::from_millis(1100)).await;

    let retrieved: Option<bool> = cache.get(&key).await?;
    assert_eq!(retrieved, None);
    assert!(!cache.exists(&key).await?);

    Ok(())
}

#[tokio::test]
async fn test_cache_invalidate() -> Result<()> {
    let cache = create_test_cache(100).await?;
    let key = check_key(Uuid::new_v4(), "article:create");

    cache.set(&key, &true, Duration::from_secs(60)).await?;
    cache.invalidate(&key).await?;

    let retrieved: Option<bool> = cache.get(&key).await?;
    assert_eq!(retrieved, None);

    Ok(())
}

#[tokio::test]
async fn test_user_pattern_sweep_is_scoped() -> Result<()> {
    let cache = create_test_cache(100).await?;
    let user_a = Uuid::new_v4();
    let user_b = Uuid::new_v4();

    cache
        .set(&check_key(user_a, "article:create"), &true, Duration::from_secs(60))
        .await?;
    cache
        .set(&check_key(user_a, "article:delete"), &false, Duration::from_secs(60))
        .await?;
    cache
        .set(
            &CacheKey::OAuthToken {
                user_id: user_a,
                provider: OAuthProvider::Google,
            },
            &"ciphertext",
            Duration::from_secs(60),
        )
        .await?;
    cache
        .set(&check_key(user_b, "article:create"), &true, Duration::from_secs(60))
        .await?;

    let swept = cache
        .invalidate_pattern(&CacheKey::user_pattern(user_a))
        .await?;
    assert_eq!(swept, 3);

    // Everything under user A is gone, user B is untouched
    let a: Option<bool> = cache.get(&check_key(user_a, "article:create")).await?;
    assert_eq!(a, None);
    let b: Option<bool> = cache.get(&check_key(user_b, "article:create")).await?;
    assert_eq!(b, Some(true));

    Ok(())
}

#[tokio::test]
async fn test_list_pattern_sweep() -> Result<()> {
    let cache = create_test_cache(100).await?;

    for offset in [0, 20, 40] {
        cache
            .set(
                &CacheKey::PermissionList { limit: 20, offset },
                &vec!["article:create".to_owned()],
                Duration::from_secs(60),
            )
            .await?;
    }
    let record_key = CacheKey::Permission { id: Uuid::new_v4() };
    cache
        .set(&record_key, &"record", Duration::from_secs(60))
        .await?;

    let swept = cache
        .invalidate_pattern(&CacheKey::permission_list_pattern())
        .await?;
    assert_eq!(swept, 3);

    // The sweep leaves singleton records alone
    assert!(cache.exists(&record_key).await?);

    Ok(())
}

#[tokio::test]
async fn test_capacity_eviction() -> Result<()> {
    let cache = create_test_cache(3).await?;
    let user_id = Uuid::new_v4();

    for i in 0..5 {
        cache
            .set(
                &check_key(user_id, &format!("resource_{i}:read")),
                &true,
                Duration::from_secs(60),
            )
            .await?;
    }

    // LRU keeps the most recent entries
    let oldest: Option<bool> = cache.get(&check_key(user_id, "resource_0:read")).await?;
    assert_eq!(oldest, None);
    let newest: Option<bool> = cache.get(&check_key(user_id, "resource_4:read")).await?;
    assert_eq!(newest, Some(true));

    Ok(())
}

#[tokio::test]
async fn test_ttl_reporting() -> Result<()> {
    let cache = create_test_cache(100).await?;
    let key = check_key(Uuid::new_v4(), "article:create");

    cache.set(&key, &true, Duration::from_secs(60)).await?;

    let remaining = cache.ttl(&key).await?.expect("key should have a TTL");
    assert!(remaining <= Duration::from_secs(60));
    assert!(remaining > Duration::from_secs(50));

    let missing = cache
        .ttl(&check_key(Uuid::new_v4(), "other:read"))
        .await?;
    assert_eq!(missing, None);

    Ok(())
}

#[tokio::test]
async fn test_clear_all() -> Result<()> {
    let cache = create_test_cache(100).await?;
    let key = check_key(Uuid::new_v4(), "article:create");

    cache.set(&key, &true, Duration::from_secs(60)).await?;
    cache.clear_all().await?;

    assert!(!cache.exists(&key).await?);
    cache.health_check().await?;

    Ok(())
}
