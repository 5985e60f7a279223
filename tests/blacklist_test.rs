// ABOUTME: Integration tests for the token revocation blacklist
// ABOUTME: Covers single and bulk revocation, cache priming, and expiry cleanup
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Aegis Platform

use aegis_core::blacklist::TokenBlacklist;
use aegis_core::cache::{factory::Cache, CacheConfig};
use aegis_core::crypto::TokenEncryptor;
use aegis_core::models::{BlacklistReason, OAuthProvider, OAuthToken};
use aegis_core::store::sqlite::SqliteStore;
use aegis_core::store::AuthStore;
use anyhow::Result;
use chrono::{Duration, Utc};
use std::sync::Arc;
use tempfile::TempDir;
use uuid::Uuid;

const KEY_MATERIAL: &[u8] = b"test passphrase";

async fn create_test_blacklist() -> Result<(TempDir, Arc<SqliteStore>, TokenBlacklist<SqliteStore>)>
{
    let dir = tempfile::tempdir()?;
    let url = format!("sqlite:{}", dir.path().join("test.db").display());

    let store = Arc::new(SqliteStore::new(&url).await?);
    store.migrate().await?;

    let cache = Cache::new(CacheConfig {
        enable_background_cleanup: false,
        ..Default::default()
    })
    .await?;

    let blacklist = TokenBlacklist::new(store.clone(), cache, TokenEncryptor::new(KEY_MATERIAL));
    Ok((dir, store, blacklist))
}

/// Helper: persist an encrypted token row the way the lifecycle manager
/// would, returning the plaintext access token
async fn seed_token(
    store: &SqliteStore,
    user_id: Uuid,
    provider: OAuthProvider,
    plaintext: &str,
) -> Result<String> {
    let encryptor = TokenEncryptor::new(KEY_MATERIAL);
    let now = Utc::now();
    let token = OAuthToken {
        id: Uuid::new_v4(),
        user_id,
        provider,
        access_token: encryptor.encrypt(plaintext)?,
        refresh_token: None,
        token_type: Some("Bearer".into()),
        expires_at: Some(now + Duration::hours(1)),
        created_at: now,
        updated_at: now,
    };
    store.insert_oauth_token(&token).await?;
    Ok(plaintext.to_owned())
}

#[tokio::test]
async fn test_blacklist_then_check() -> Result<()> {
    let (_dir, _store, blacklist) = create_test_blacklist().await?;
    let user_id = Uuid::new_v4();

    blacklist
        .blacklist_token(
            "bearer-abc123",
            Some(user_id),
            BlacklistReason::Logout,
            Utc::now() + Duration::hours(1),
        )
        .await?;

    // Immediately visible, and other tokens are unaffected
    assert!(blacklist.is_token_blacklisted("bearer-abc123").await?);
    assert!(!blacklist.is_token_blacklisted("bearer-other").await?);

    Ok(())
}

#[tokio::test]
async fn test_raw_token_is_never_persisted() -> Result<()> {
    let (_dir, store, blacklist) = create_test_blacklist().await?;

    let entry = blacklist
        .blacklist_token(
            "bearer-secret",
            None,
            BlacklistReason::AdminRevoked,
            Utc::now() + Duration::hours(1),
        )
        .await?;

    assert_ne!(entry.token_hash, "bearer-secret");
    assert_eq!(entry.token_hash, TokenEncryptor::hash_token("bearer-secret"));

    let fetched = store
        .get_blacklist_entry(&entry.token_hash)
        .await?
        .expect("entry should exist");
    assert_eq!(fetched.reason, BlacklistReason::AdminRevoked);

    Ok(())
}

#[tokio::test]
async fn test_check_falls_back_to_store_on_cold_cache() -> Result<()> {
    let (_dir, store, blacklist) = create_test_blacklist().await?;

    blacklist
        .blacklist_token(
            "bearer-xyz",
            None,
            BlacklistReason::SecurityBreach,
            Utc::now() + Duration::hours(1),
        )
        .await?;

    // A second blacklist instance with a cold cache must still see the
    // revocation through the store
    let cold_cache = Cache::new(CacheConfig {
        enable_background_cleanup: false,
        ..Default::default()
    })
    .await?;
    let cold = TokenBlacklist::new(store, cold_cache, TokenEncryptor::new(KEY_MATERIAL));

    assert!(cold.is_token_blacklisted("bearer-xyz").await?);

    Ok(())
}

#[tokio::test]
async fn test_blacklist_all_user_tokens() -> Result<()> {
    let (_dir, store, blacklist) = create_test_blacklist().await?;
    let user_id = Uuid::new_v4();
    let other_user = Uuid::new_v4();

    let google = seed_token(&store, user_id, OAuthProvider::Google, "google-access").await?;
    let github = seed_token(&store, user_id, OAuthProvider::Github, "github-access").await?;
    let bystander =
        seed_token(&store, other_user, OAuthProvider::Google, "bystander-access").await?;

    let revoked = blacklist
        .blacklist_all_user_tokens(
            user_id,
            BlacklistReason::PasswordChange,
            Utc::now() + Duration::hours(1),
        )
        .await?;
    assert_eq!(revoked, 2);

    assert!(blacklist.is_token_blacklisted(&google).await?);
    assert!(blacklist.is_token_blacklisted(&github).await?);
    assert!(!blacklist.is_token_blacklisted(&bystander).await?);

    Ok(())
}

#[tokio::test]
async fn test_bulk_revoke_with_no_tokens_is_zero() -> Result<()> {
    let (_dir, _store, blacklist) = create_test_blacklist().await?;

    let revoked = blacklist
        .blacklist_all_user_tokens(
            Uuid::new_v4(),
            BlacklistReason::AccountDeleted,
            Utc::now() + Duration::hours(1),
        )
        .await?;
    assert_eq!(revoked, 0);

    Ok(())
}

#[tokio::test]
async fn test_bulk_revoke_is_idempotent() -> Result<()> {
    let (_dir, store, blacklist) = create_test_blacklist().await?;
    let user_id = Uuid::new_v4();

    seed_token(&store, user_id, OAuthProvider::Google, "google-access").await?;

    blacklist
        .blacklist_all_user_tokens(
            user_id,
            BlacklistReason::AccountSuspended,
            Utc::now() + Duration::hours(1),
        )
        .await?;

    // Revoking again must not fail on the unique hash constraint
    blacklist
        .blacklist_all_user_tokens(
            user_id,
            BlacklistReason::AccountSuspended,
            Utc::now() + Duration::hours(1),
        )
        .await?;

    assert!(blacklist.is_token_blacklisted("google-access").await?);

    Ok(())
}

#[tokio::test]
async fn test_expired_entry_cleanup() -> Result<()> {
    let (_dir, store, blacklist) = create_test_blacklist().await?;

    blacklist
        .blacklist_token(
            "bearer-stale",
            None,
            BlacklistReason::TokenExpired,
            Utc::now() - Duration::minutes(5),
        )
        .await?;
    blacklist
        .blacklist_token(
            "bearer-live",
            None,
            BlacklistReason::Logout,
            Utc::now() + Duration::hours(1),
        )
        .await?;

    let removed = blacklist.delete_expired_entries().await?;
    assert_eq!(removed, 1);

    let stale_hash = TokenEncryptor::hash_token("bearer-stale");
    assert!(store.get_blacklist_entry(&stale_hash).await?.is_none());
    assert!(blacklist.is_token_blacklisted("bearer-live").await?);

    Ok(())
}

#[tokio::test]
async fn test_cleanup_by_cutoff() -> Result<()> {
    let (_dir, _store, blacklist) = create_test_blacklist().await?;

    blacklist
        .blacklist_token(
            "bearer-soon",
            None,
            BlacklistReason::Logout,
            Utc::now() + Duration::minutes(10),
        )
        .await?;
    blacklist
        .blacklist_token(
            "bearer-later",
            None,
            BlacklistReason::Logout,
            Utc::now() + Duration::hours(5),
        )
        .await?;

    let removed = blacklist
        .delete_entries_expiring_before(Utc::now() + Duration::hours(1))
        .await?;
    assert_eq!(removed, 1);

    Ok(())
}
