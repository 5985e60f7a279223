// ABOUTME: External OAuth provider client for refresh-token exchanges
// ABOUTME: Trait boundary plus an HTTP implementation over each provider's token endpoint
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Aegis Platform

use crate::errors::{AppError, AppResult};
use crate::models::OAuthProvider;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use tracing::debug;

/// A fresh access/refresh pair returned by a provider exchange
#[derive(Debug, Clone)]
pub struct RefreshedToken {
    /// New plaintext access token
    pub access_token: String,
    /// New plaintext refresh token; providers that rotate refresh tokens
    /// return one, others return `None` and the old one stays valid
    pub refresh_token: Option<String>,
    /// Token type (usually "Bearer")
    pub token_type: Option<String>,
    /// When the new access token expires
    pub expires_at: Option<DateTime<Utc>>,
}

/// External OAuth provider collaborator.
///
/// The lifecycle manager only needs one operation: exchange a refresh token
/// for a new access/refresh pair. Tests substitute this with a fake.
#[async_trait]
pub trait ProviderClient: Send + Sync {
    /// Exchange a refresh token at the provider's token endpoint
    ///
    /// # Errors
    ///
    /// Returns an `ExternalServiceError` if the exchange fails
    async fn refresh(
        &self,
        provider: OAuthProvider,
        refresh_token: &str,
    ) -> AppResult<RefreshedToken>;
}

/// Per-provider OAuth client credentials
#[derive(Debug, Clone)]
pub struct ProviderCredentials {
    pub client_id: String,
    pub client_secret: String,
}

/// Wire shape of a standard OAuth2 token-endpoint response
#[derive(Debug, Deserialize)]
struct TokenEndpointResponse {
    access_token: String,
    refresh_token: Option<String>,
    token_type: Option<String>,
    expires_in: Option<i64>,
}

/// HTTP provider client speaking the standard `grant_type=refresh_token`
/// form exchange against each provider's token endpoint
pub struct HttpProviderClient {
    client: reqwest::Client,
    credentials: std::collections::HashMap<OAuthProvider, ProviderCredentials>,
}

impl HttpProviderClient {
    /// Build a client with credentials for the providers in use
    #[must_use]
    pub fn new(
        credentials: std::collections::HashMap<OAuthProvider, ProviderCredentials>,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            credentials,
        }
    }

    const fn token_endpoint(provider: OAuthProvider) -> &'static str {
        match provider {
            OAuthProvider::Google => "https://oauth2.googleapis.com/token",
            OAuthProvider::Facebook => "https://graph.facebook.com/v18.0/oauth/access_token",
            OAuthProvider::Github => "https://github.com/login/oauth/access_token",
            OAuthProvider::Apple => "https://appleid.apple.com/auth/token",
        }
    }
}

#[async_trait]
impl ProviderClient for HttpProviderClient {
    async fn refresh(
        &self,
        provider: OAuthProvider,
        refresh_token: &str,
    ) -> AppResult<RefreshedToken> {
        let credentials = self.credentials.get(&provider).ok_or_else(|| {
            AppError::config(format!("no OAuth credentials configured for {provider}"))
        })?;

        debug!(%provider, "Exchanging refresh token");

        let response = self
            .client
            .post(Self::token_endpoint(provider))
            .header("Accept", "application/json")
            .form(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh_token),
                ("client_id", credentials.client_id.as_str()),
                ("client_secret", credentials.client_secret.as_str()),
            ])
            .send()
            .await
            .map_err(|e| AppError::external_service(provider.as_str(), e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(AppError::external_service(
                provider.as_str(),
                format!("token endpoint returned {status}"),
            ));
        }

        let body: TokenEndpointResponse = response
            .json()
            .await
            .map_err(|e| AppError::external_service(provider.as_str(), e.to_string()))?;

        Ok(RefreshedToken {
            access_token: body.access_token,
            refresh_token: body.refresh_token,
            token_type: body.token_type,
            expires_at: body.expires_in.map(|secs| Utc::now() + Duration::seconds(secs)),
        })
    }
}
