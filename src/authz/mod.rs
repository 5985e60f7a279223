// ABOUTME: Authorization decision engine module
// ABOUTME: Exposes the RBAC engine, typed principal, and ownership strategy registry
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Aegis Platform

//! Role/permission based authorization decisions.
//!
//! The engine answers four question shapes: a single permission, an AND set,
//! an OR set, and a `resource:action` pair. Boolean check results are cached
//! on the shortest TTL tier because they are the surface most likely to go
//! stale after a role change. Every public decision is recorded in the audit
//! log exactly once.

mod engine;
mod ownership;
mod principal;

pub use engine::AuthzEngine;
pub use ownership::{OwnershipRegistry, OwnershipResolver};
pub use principal::Principal;
