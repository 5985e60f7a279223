// ABOUTME: Cryptographic primitives for credential storage
// ABOUTME: Token encryption (AES-256-GCM) and token hashing (SHA-256) live here
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Aegis Platform

//! Cryptography for the credential lifecycle: authenticated encryption of
//! OAuth tokens at rest and one-way hashing of bearer tokens for the
//! revocation blacklist.

/// AES-256-GCM token encryption and SHA-256 token hashing
pub mod tokens;

pub use tokens::TokenEncryptor;
