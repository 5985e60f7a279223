// ABOUTME: Fault-injection cache backend whose every operation errors
// ABOUTME: Lets tests and drills exercise the degraded-cache fallback paths
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Aegis Platform

use super::{CacheConfig, CacheKey, CacheProvider};
use crate::errors::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Cache backend that fails every operation with a transport error.
///
/// Services must treat a cache failure as a miss and fall back to the
/// store; constructing them over this backend is how that contract is
/// exercised without a real outage.
#[derive(Debug, Clone, Copy, Default)]
pub struct FailingCache;

fn unavailable() -> AppError {
    AppError::cache("cache backend unavailable")
}

#[async_trait::async_trait]
impl CacheProvider for FailingCache {
    async fn new(_config: CacheConfig) -> AppResult<Self> {
        Ok(Self)
    }

    async fn set<T: Serialize + Send + Sync>(
        &self,
        _key: &CacheKey,
        _value: &T,
        _ttl: Duration,
    ) -> AppResult<()> {
        Err(unavailable())
    }

    async fn get<T: for<'de> Deserialize<'de>>(&self, _key: &CacheKey) -> AppResult<Option<T>> {
        Err(unavailable())
    }

    async fn invalidate(&self, _key: &CacheKey) -> AppResult<()> {
        Err(unavailable())
    }

    async fn invalidate_pattern(&self, _pattern: &str) -> AppResult<u64> {
        Err(unavailable())
    }

    async fn exists(&self, _key: &CacheKey) -> AppResult<bool> {
        Err(unavailable())
    }

    async fn ttl(&self, _key: &CacheKey) -> AppResult<Option<Duration>> {
        Err(unavailable())
    }

    async fn health_check(&self) -> AppResult<()> {
        Err(unavailable())
    }

    async fn clear_all(&self) -> AppResult<()> {
        Err(unavailable())
    }
}
