// ABOUTME: Ownership strategy registry mapping resource types to lookup functions
// ABOUTME: Supplied at startup; unknown resource types deny instead of erroring
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Aegis Platform

use crate::errors::AppResult;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

/// Strategy for answering "does this user own that resource?"
///
/// One resolver is registered per resource type (e.g. "article", "ebook");
/// the owning service implements the lookup against its own tables.
#[async_trait]
pub trait OwnershipResolver: Send + Sync {
    /// Whether `user_id` owns the resource identified by `resource_id`
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying lookup fails
    async fn owns(&self, user_id: Uuid, resource_id: Uuid) -> AppResult<bool>;
}

/// Registry of ownership resolvers keyed by resource type.
///
/// Checks against a resource type with no registered resolver are denied,
/// not errored: an unconfigured type must fail closed.
#[derive(Clone, Default)]
pub struct OwnershipRegistry {
    resolvers: HashMap<String, Arc<dyn OwnershipResolver>>,
}

impl OwnershipRegistry {
    /// Create an empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a resolver for a resource type, replacing any previous one
    pub fn register(
        &mut self,
        resource_type: impl Into<String>,
        resolver: Arc<dyn OwnershipResolver>,
    ) {
        self.resolvers.insert(resource_type.into(), resolver);
    }

    /// Look up the resolver for a resource type
    #[must_use]
    pub fn resolver(&self, resource_type: &str) -> Option<&Arc<dyn OwnershipResolver>> {
        self.resolvers.get(resource_type)
    }

    /// Resource types with a registered resolver
    #[must_use]
    pub fn registered_types(&self) -> Vec<&str> {
        self.resolvers.keys().map(String::as_str).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct AlwaysOwns;

    #[async_trait]
    impl OwnershipResolver for AlwaysOwns {
        async fn owns(&self, _user_id: Uuid, _resource_id: Uuid) -> AppResult<bool> {
            Ok(true)
        }
    }

    #[tokio::test]
    async fn test_registry_lookup() {
        let mut registry = OwnershipRegistry::new();
        registry.register("article", Arc::new(AlwaysOwns));

        assert!(registry.resolver("article").is_some());
        assert!(registry.resolver("ebook").is_none());

        let resolver = registry.resolver("article").unwrap();
        assert!(resolver.owns(Uuid::new_v4(), Uuid::new_v4()).await.unwrap());
    }
}
