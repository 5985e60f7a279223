// ABOUTME: Encrypted OAuth token lifecycle manager
// ABOUTME: Store, cached retrieval, in-memory decryption, single-flight refresh, cleanup
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Aegis Platform

//! OAuth token vault.
//!
//! Tokens are encrypted before every write and the cache only ever holds
//! ciphertext entities; plaintext exists in memory for the duration of a
//! call and is never written back anywhere. Refreshes are single-flight per
//! (user, provider): concurrent "needs refresh" detections serialize on a
//! per-key lock so the external provider sees one exchange.

pub mod providers;

pub use providers::{HttpProviderClient, ProviderClient, ProviderCredentials, RefreshedToken};

use crate::cache::{factory::Cache, CacheKey};
use crate::crypto::TokenEncryptor;
use crate::errors::{AppError, AppResult};
use crate::models::{DecryptedOAuthToken, OAuthProvider, OAuthToken};
use crate::store::AuthStore;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Plaintext token material handed over by the gateway after a provider
/// exchange. Only ever passed by reference into [`TokenManager`], which
/// encrypts it before anything is persisted.
#[derive(Debug, Clone)]
pub struct RawTokenData {
    /// Plaintext access token
    pub access_token: String,
    /// Plaintext refresh token, when the provider issued one
    pub refresh_token: Option<String>,
    /// Token type (usually "Bearer")
    pub token_type: Option<String>,
    /// When the access token expires
    pub expires_at: Option<DateTime<Utc>>,
}

/// Encrypted OAuth token lifecycle manager
pub struct TokenManager<S: AuthStore> {
    store: Arc<S>,
    cache: Cache,
    encryptor: TokenEncryptor,
    provider_client: Arc<dyn ProviderClient>,
    refresh_locks: DashMap<(Uuid, OAuthProvider), Arc<Mutex<()>>>,
}

impl<S: AuthStore> TokenManager<S> {
    /// Create a manager over a store, cache, encryptor, and provider client
    #[must_use]
    pub fn new(
        store: Arc<S>,
        cache: Cache,
        encryptor: TokenEncryptor,
        provider_client: Arc<dyn ProviderClient>,
    ) -> Self {
        Self {
            store,
            cache,
            encryptor,
            provider_client,
            refresh_locks: DashMap::new(),
        }
    }

    /// Encrypt and persist a token for a (user, provider), replacing any
    /// current token. The plaintext is never stored or cached.
    ///
    /// # Errors
    ///
    /// Returns a crypto error if encryption fails or a store error if the
    /// write fails
    pub async fn store_oauth_token(
        &self,
        user_id: Uuid,
        provider: OAuthProvider,
        raw: &RawTokenData,
    ) -> AppResult<OAuthToken> {
        let access_token = self.encryptor.encrypt(&raw.access_token)?;
        let refresh_token = raw
            .refresh_token
            .as_deref()
            .map(|t| self.encryptor.encrypt(t))
            .transpose()?;
        let now = Utc::now();

        let token = match self.store.get_oauth_token(user_id, provider).await? {
            Some(mut existing) => {
                existing.access_token = access_token;
                existing.refresh_token = refresh_token;
                existing.token_type = raw.token_type.clone();
                existing.expires_at = raw.expires_at;
                existing.updated_at = now;
                self.store.update_oauth_token(&existing).await?;
                existing
            }
            None => {
                let token = OAuthToken {
                    id: Uuid::new_v4(),
                    user_id,
                    provider,
                    access_token,
                    refresh_token,
                    token_type: raw.token_type.clone(),
                    expires_at: raw.expires_at,
                    created_at: now,
                    updated_at: now,
                };
                self.store.insert_oauth_token(&token).await?;
                token
            }
        };

        info!(%user_id, %provider, "Stored encrypted OAuth token");
        self.cache_put(&CacheKey::OAuthToken { user_id, provider }, &token)
            .await;

        Ok(token)
    }

    /// The current (ciphertext) token entity for a (user, provider),
    /// cache-aside
    ///
    /// # Errors
    ///
    /// Returns a store error if the lookup fails
    pub async fn get_token(
        &self,
        user_id: Uuid,
        provider: OAuthProvider,
    ) -> AppResult<Option<OAuthToken>> {
        let key = CacheKey::OAuthToken { user_id, provider };
        if let Some(token) = self.cache_get::<OAuthToken>(&key).await {
            return Ok(Some(token));
        }

        let token = self.store.get_oauth_token(user_id, provider).await?;
        if let Some(ref token) = token {
            self.cache_put(&key, token).await;
        }
        Ok(token)
    }

    /// Decrypt the current token in memory for an outbound API call. The
    /// decrypted value is never written back to any cache.
    ///
    /// # Errors
    ///
    /// Returns `DecryptionFailed` if the ciphertext cannot be opened
    pub async fn get_decrypted_token(
        &self,
        user_id: Uuid,
        provider: OAuthProvider,
    ) -> AppResult<Option<DecryptedOAuthToken>> {
        let Some(token) = self.get_token(user_id, provider).await? else {
            return Ok(None);
        };

        let access_token = self.encryptor.decrypt(&token.access_token)?;
        let refresh_token = token
            .refresh_token
            .as_deref()
            .map(|ct| self.encryptor.decrypt(ct))
            .transpose()?;

        Ok(Some(DecryptedOAuthToken {
            access_token,
            refresh_token,
            token_type: token.token_type,
            expires_at: token.expires_at,
        }))
    }

    /// Force a refresh exchange with the external provider, serialized per
    /// (user, provider)
    ///
    /// # Errors
    ///
    /// Returns `ResourceNotFound` when no token or refresh token exists, an
    /// `ExternalServiceError` from the provider, or a crypto/store error
    pub async fn refresh_token(
        &self,
        user_id: Uuid,
        provider: OAuthProvider,
    ) -> AppResult<OAuthToken> {
        let lock = self.refresh_lock(user_id, provider);
        let _guard = lock.lock().await;

        let token = self
            .store
            .get_oauth_token(user_id, provider)
            .await?
            .ok_or_else(|| AppError::not_found(format!("{provider} token for user {user_id}")))?;

        self.exchange_and_persist(token).await
    }

    /// Refresh only when the token is inside the proactive-refresh window.
    ///
    /// Returns the current token when a refresh happened (here or in a
    /// concurrent call this one waited behind), `None` when no refresh was
    /// needed.
    ///
    /// # Errors
    ///
    /// Same failure modes as [`Self::refresh_token`]
    pub async fn refresh_if_needed(
        &self,
        user_id: Uuid,
        provider: OAuthProvider,
    ) -> AppResult<Option<OAuthToken>> {
        let Some(token) = self.get_token(user_id, provider).await? else {
            return Ok(None);
        };
        if !token.needs_refresh() {
            return Ok(None);
        }

        let lock = self.refresh_lock(user_id, provider);
        let _guard = lock.lock().await;

        // Re-read under the lock: a concurrent caller may have refreshed
        // while this one waited
        let token = self
            .store
            .get_oauth_token(user_id, provider)
            .await?
            .ok_or_else(|| AppError::not_found(format!("{provider} token for user {user_id}")))?;
        if !token.needs_refresh() {
            debug!(%user_id, %provider, "Token already refreshed by concurrent call");
            return Ok(Some(token));
        }

        Ok(Some(self.exchange_and_persist(token).await?))
    }

    /// Delete the current token for a (user, provider), e.g. on logout
    ///
    /// # Errors
    ///
    /// Returns a store error if the delete fails
    pub async fn delete_token(&self, user_id: Uuid, provider: OAuthProvider) -> AppResult<()> {
        self.store.delete_oauth_token(user_id, provider).await?;
        self.cache_drop(&CacheKey::OAuthToken { user_id, provider })
            .await;
        info!(%user_id, %provider, "Deleted OAuth token");
        Ok(())
    }

    /// Bulk-delete rows whose expiry has passed; returns the count removed.
    /// Intended for a periodic background job, not the request path. Cached
    /// entities for deleted rows age out by TTL.
    ///
    /// # Errors
    ///
    /// Returns a store error if the delete fails
    pub async fn cleanup_expired_tokens(&self) -> AppResult<u64> {
        let removed = self.store.delete_expired_oauth_tokens(Utc::now()).await?;
        if removed > 0 {
            info!(removed, "Cleaned up expired OAuth tokens");
        }
        Ok(removed)
    }

    async fn exchange_and_persist(&self, mut token: OAuthToken) -> AppResult<OAuthToken> {
        let refresh_ciphertext = token.refresh_token.as_deref().ok_or_else(|| {
            AppError::not_found(format!("refresh token for {}", token.provider))
        })?;
        let refresh_plaintext = self.encryptor.decrypt(refresh_ciphertext)?;

        let refreshed = self
            .provider_client
            .refresh(token.provider, &refresh_plaintext)
            .await?;

        token.access_token = self.encryptor.encrypt(&refreshed.access_token)?;
        if let Some(new_refresh) = refreshed.refresh_token.as_deref() {
            // Providers that rotate refresh tokens return a new one; keep
            // the old ciphertext when they don't
            token.refresh_token = Some(self.encryptor.encrypt(new_refresh)?);
        }
        if refreshed.token_type.is_some() {
            token.token_type = refreshed.token_type;
        }
        token.expires_at = refreshed.expires_at;
        token.updated_at = Utc::now();

        self.store.update_oauth_token(&token).await?;
        info!(user_id = %token.user_id, provider = %token.provider, "Refreshed OAuth token");

        self.cache_put(
            &CacheKey::OAuthToken {
                user_id: token.user_id,
                provider: token.provider,
            },
            &token,
        )
        .await;

        Ok(token)
    }

    fn refresh_lock(&self, user_id: Uuid, provider: OAuthProvider) -> Arc<Mutex<()>> {
        self.refresh_locks
            .entry((user_id, provider))
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
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
}
