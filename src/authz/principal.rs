// ABOUTME: Typed request principal threaded explicitly through the call chain
// ABOUTME: Replaces ambient string-keyed context lookups with a concrete value
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Aegis Platform

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The authenticated identity a request is acting as.
///
/// The gateway constructs one of these after primary authentication and
/// passes it down explicitly; nothing in the core reads ambient request
/// state. It deliberately carries no role snapshot: decision paths resolve
/// the current role through the store, so a concurrent role change is
/// never masked by a stale copy taken at login.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    /// The acting user
    pub user_id: Uuid,
}

impl Principal {
    /// Build a principal for an authenticated user
    #[must_use]
    pub const fn new(user_id: Uuid) -> Self {
        Self { user_id }
    }
}
