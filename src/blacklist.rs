// ABOUTME: Hash-based token revocation registry
// ABOUTME: Blacklist writes prime the cache so the next check is a hit
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Aegis Platform

//! Token revocation.
//!
//! Raw bearer tokens are never persisted: entries are keyed by the SHA-256
//! hash of the presented token. `is_token_blacklisted` runs on every
//! authenticated request, so revocations write the cache eagerly and only
//! positive hits are cached — a cached "not revoked" would delay a
//! revocation by the whole TTL.

use crate::cache::{factory::Cache, CacheKey};
use crate::crypto::TokenEncryptor;
use crate::errors::AppResult;
use crate::models::{BlacklistEntry, BlacklistReason};
use crate::store::AuthStore;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

/// Token revocation registry
pub struct TokenBlacklist<S: AuthStore> {
    store: Arc<S>,
    cache: Cache,
    encryptor: TokenEncryptor,
}

impl<S: AuthStore> TokenBlacklist<S> {
    /// Create a blacklist over a store and cache. The encryptor is needed
    /// for bulk revocation, which hashes a user's stored (encrypted) tokens.
    #[must_use]
    pub fn new(store: Arc<S>, cache: Cache, encryptor: TokenEncryptor) -> Self {
        Self {
            store,
            cache,
            encryptor,
        }
    }

    /// Revoke a single presented token.
    ///
    /// `expires_at` mirrors the underlying token's natural expiry; past that
    /// point the entry is redundant and eligible for cleanup. The cache is
    /// primed so the very next check is a hit.
    ///
    /// # Errors
    ///
    /// Returns a store error if the insert fails
    pub async fn blacklist_token(
        &self,
        token: &str,
        user_id: Option<Uuid>,
        reason: BlacklistReason,
        expires_at: DateTime<Utc>,
    ) -> AppResult<BlacklistEntry> {
        let hash = TokenEncryptor::hash_token(token);
        let entry = BlacklistEntry::new(hash.clone(), user_id, reason, expires_at);

        self.store.insert_blacklist_entry(&entry).await?;
        info!(?user_id, %reason, "Blacklisted token");

        self.prime(&hash).await;
        Ok(entry)
    }

    /// Whether a presented token has been revoked. Checked on every
    /// authenticated request: cache first, store on miss, and only positive
    /// hits are written back.
    ///
    /// # Errors
    ///
    /// Returns a store error if the lookup fails
    pub async fn is_token_blacklisted(&self, token: &str) -> AppResult<bool> {
        let hash = TokenEncryptor::hash_token(token);
        let key = CacheKey::BlacklistedToken { hash: hash.clone() };

        match self.cache.get::<bool>(&key).await {
            Ok(Some(true)) => return Ok(true),
            Ok(_) => {}
            Err(e) => warn!("blacklist cache read failed: {e}"),
        }

        if self.store.get_blacklist_entry(&hash).await?.is_some() {
            self.prime(&hash).await;
            return Ok(true);
        }
        Ok(false)
    }

    /// Revoke every token currently stored for a user in one transaction
    /// (logout-everywhere, password change, suspension, compromise).
    ///
    /// Stored access tokens are decrypted in memory only long enough to
    /// hash them. A token whose ciphertext cannot be opened is skipped with
    /// a warning: it cannot be presented as a bearer token either. Returns
    /// the number of entries written.
    ///
    /// # Errors
    ///
    /// Returns a store error if the lookup or batch insert fails
    pub async fn blacklist_all_user_tokens(
        &self,
        user_id: Uuid,
        reason: BlacklistReason,
        fallback_expires_at: DateTime<Utc>,
    ) -> AppResult<u64> {
        let tokens = self.store.get_user_oauth_tokens(user_id).await?;

        let mut entries = Vec::with_capacity(tokens.len());
        for token in &tokens {
            let plaintext = match self.encryptor.decrypt(&token.access_token) {
                Ok(p) => p,
                Err(e) => {
                    warn!(%user_id, provider = %token.provider, "Skipping undecryptable token during bulk revoke: {e}");
                    continue;
                }
            };
            let hash = TokenEncryptor::hash_token(&plaintext);
            // Mirror the token's own expiry when it has one
            let expires_at = token.expires_at.unwrap_or(fallback_expires_at);
            entries.push(BlacklistEntry::new(hash, Some(user_id), reason, expires_at));
        }

        if entries.is_empty() {
            return Ok(0);
        }

        self.store.insert_blacklist_entries(&entries).await?;
        info!(%user_id, count = entries.len(), %reason, "Blacklisted all user tokens");

        for entry in &entries {
            self.prime(&entry.token_hash).await;
        }

        Ok(entries.len() as u64)
    }

    /// Delete entries whose window has closed; returns rows removed
    ///
    /// # Errors
    ///
    /// Returns a store error if the delete fails
    pub async fn delete_expired_entries(&self) -> AppResult<u64> {
        let removed = self
            .store
            .delete_expired_blacklist_entries(Utc::now())
            .await?;
        if removed > 0 {
            info!(removed, "Cleaned up expired blacklist entries");
        }
        Ok(removed)
    }

    /// Delete entries expiring before a cutoff; returns rows removed
    ///
    /// # Errors
    ///
    /// Returns a store error if the delete fails
    pub async fn delete_entries_expiring_before(
        &self,
        cutoff: DateTime<Utc>,
    ) -> AppResult<u64> {
        let removed = self
            .store
            .delete_blacklist_entries_expiring_before(cutoff)
            .await?;
        if removed > 0 {
            info!(removed, %cutoff, "Cleaned up blacklist entries by cutoff");
        }
        Ok(removed)
    }

    /// Cache a positive hit. Failures are swallowed: the store remains the
    /// source of truth for revocation.
    async fn prime(&self, hash: &str) {
        let key = CacheKey::BlacklistedToken {
            hash: hash.to_owned(),
        };
        let ttl = self.cache.ttl_for(&key);
        if let Err(e) = self.cache.set(&key, &true, ttl).await {
            warn!("blacklist cache write failed: {e}");
        }
    }
}
