// ABOUTME: Bounded in-memory audit log for authorization decisions
// ABOUTME: FIFO ring buffer with query helpers and aggregate statistics
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Aegis Platform

//! In-memory audit trail.
//!
//! Every public authorization decision lands here exactly once. The buffer is
//! bounded: when full, the oldest entry is dropped. This is an operational
//! window into recent decisions, not durable compliance storage.

use crate::constants::audit::DEFAULT_AUDIT_CAPACITY;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;
use uuid::Uuid;

/// What was checked when a decision was made
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CheckRule {
    /// A single permission name
    Permission(String),
    /// All of the listed permissions (AND)
    AllOf(Vec<String>),
    /// Any of the listed permissions (OR)
    AnyOf(Vec<String>),
    /// A resource/action pair checked as `resource:action`
    ResourceAction { resource: String, action: String },
    /// Membership in a named role
    Role(String),
    /// Ownership of a specific resource
    Ownership {
        resource_type: String,
        resource_id: Uuid,
    },
}

/// Why a decision came out the way it did
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionReason {
    /// The user's role grants the permission
    PermissionGranted,
    /// The user's role does not grant the permission
    PermissionMissing,
    /// The user has no role assigned
    NoRoleAssigned,
    /// The user holds the required role
    RoleMatched,
    /// The user does not hold the required role
    RoleMismatch,
    /// The user owns the resource
    OwnershipConfirmed,
    /// The user does not own the resource
    OwnershipDenied,
    /// No ownership resolver is registered for the resource type
    UnknownResourceType,
}

/// One recorded authorization decision
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    /// When the decision was made
    pub timestamp: DateTime<Utc>,
    /// The user the decision was about
    pub user_id: Uuid,
    /// What was checked
    pub check: CheckRule,
    /// Whether access was granted
    pub granted: bool,
    /// Why
    pub reason: DecisionReason,
    /// How long the evaluation took
    pub duration: Duration,
}

/// Aggregate statistics over the current buffer contents
#[derive(Debug, Clone, Serialize)]
pub struct AuditStats {
    /// Entries currently held
    pub total: usize,
    /// Granted decisions
    pub granted: usize,
    /// Denied decisions
    pub denied: usize,
    /// Distinct users seen
    pub unique_users: usize,
    /// Mean evaluation latency across held entries
    pub avg_duration: Duration,
}

/// Bounded FIFO buffer of recent authorization decisions
///
/// Query methods return defensive copies so callers never hold the lock.
pub struct AuditLog {
    entries: Mutex<VecDeque<AuditEntry>>,
    capacity: usize,
}

impl AuditLog {
    /// Create a log holding at most `capacity` entries
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Mutex::new(VecDeque::with_capacity(capacity.min(1024))),
            capacity: capacity.max(1),
        }
    }

    /// Record a decision, evicting the oldest entry when full
    pub fn record(&self, entry: AuditEntry) {
        let mut entries = self.lock();
        if entries.len() >= self.capacity {
            entries.pop_front();
        }
        entries.push_back(entry);
    }

    /// All entries, oldest first
    #[must_use]
    pub fn entries(&self) -> Vec<AuditEntry> {
        self.lock().iter().cloned().collect()
    }

    /// Entries for one user, oldest first
    #[must_use]
    pub fn by_user(&self, user_id: Uuid) -> Vec<AuditEntry> {
        self.lock()
            .iter()
            .filter(|e| e.user_id == user_id)
            .cloned()
            .collect()
    }

    /// Denied decisions only, oldest first
    #[must_use]
    pub fn denied_only(&self) -> Vec<AuditEntry> {
        self.lock()
            .iter()
            .filter(|e| !e.granted)
            .cloned()
            .collect()
    }

    /// Entries recorded at or after `cutoff`
    #[must_use]
    pub fn since(&self, cutoff: DateTime<Utc>) -> Vec<AuditEntry> {
        self.lock()
            .iter()
            .filter(|e| e.timestamp >= cutoff)
            .cloned()
            .collect()
    }

    /// Number of entries currently held
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether the log is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Drop all entries
    pub fn clear(&self) {
        self.lock().clear();
    }

    /// Aggregate statistics over current contents
    #[must_use]
    pub fn stats(&self) -> AuditStats {
        let entries = self.lock();

        let total = entries.len();
        let granted = entries.iter().filter(|e| e.granted).count();
        let unique_users = entries
            .iter()
            .map(|e| e.user_id)
            .collect::<std::collections::HashSet<_>>()
            .len();
        let total_duration: Duration = entries.iter().map(|e| e.duration).sum();
        let avg_duration = if total == 0 {
            Duration::ZERO
        } else {
            total_duration / u32::try_from(total).unwrap_or(u32::MAX)
        };

        AuditStats {
            total,
            granted,
            denied: total - granted,
            unique_users,
            avg_duration,
        }
    }

    /// A record-only writer panicking mid-push cannot corrupt the deque, so
    /// a poisoned lock is recoverable
    fn lock(&self) -> std::sync::MutexGuard<'_, VecDeque<AuditEntry>> {
        self.entries
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl Default for AuditLog {
    fn default() -> Self {
        Self::new(DEFAULT_AUDIT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(user_id: Uuid, granted: bool) -> AuditEntry {
        AuditEntry {
            timestamp: Utc::now(),
            user_id,
            check: CheckRule::Permission("article:create".into()),
            granted,
            reason: if granted {
                DecisionReason::PermissionGranted
            } else {
                DecisionReason::PermissionMissing
            },
            duration: Duration::from_micros(250),
        }
    }

    #[test]
    fn test_fifo_eviction_at_capacity() {
        let log = AuditLog::new(3);
        let users: Vec<Uuid> = (0..5).map(|_| Uuid::new_v4()).collect();

        for user in &users {
            log.record(entry(*user, true));
        }

        let held = log.entries();
        assert_eq!(held.len(), 3);
        // Oldest two were evicted
        assert_eq!(held[0].user_id, users[2]);
        assert_eq!(held[2].user_id, users[4]);
    }

    #[test]
    fn test_filters() {
        let log = AuditLog::default();
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();

        log.record(entry(alice, true));
        log.record(entry(bob, false));
        log.record(entry(alice, false));

        assert_eq!(log.by_user(alice).len(), 2);
        assert_eq!(log.denied_only().len(), 2);
        assert!(log.denied_only().iter().all(|e| !e.granted));
    }

    #[test]
    fn test_since_cutoff() {
        let log = AuditLog::default();
        log.record(entry(Uuid::new_v4(), true));

        let future = Utc::now() + chrono::Duration::hours(1);
        assert!(log.since(future).is_empty());

        let past = Utc::now() - chrono::Duration::hours(1);
        assert_eq!(log.since(past).len(), 1);
    }

    #[test]
    fn test_stats() {
        let log = AuditLog::default();
        let alice = Uuid::new_v4();

        log.record(entry(alice, true));
        log.record(entry(alice, false));
        log.record(entry(Uuid::new_v4(), true));

        let stats = log.stats();
        assert_eq!(stats.total, 3);
        assert_eq!(stats.granted, 2);
        assert_eq!(stats.denied, 1);
        assert_eq!(stats.unique_users, 2);
        assert!(stats.avg_duration > Duration::ZERO);
    }

    #[test]
    fn test_empty_stats() {
        let log = AuditLog::new(10);
        let stats = log.stats();
        assert_eq!(stats.total, 0);
        assert_eq!(stats.avg_duration, Duration::ZERO);
    }
}
