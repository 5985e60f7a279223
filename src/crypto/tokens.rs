// ABOUTME: AES-256-GCM token encryption with SHA-256 key derivation and token hashing
// ABOUTME: Nonce is prepended to the ciphertext and the whole blob is base64 encoded
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Aegis Platform

use crate::errors::{AppError, AppResult};
use aes_gcm::aead::generic_array::GenericArray;
use aes_gcm::{aead::Aead, Aes256Gcm, KeyInit};
use base64::{engine::general_purpose, Engine};
use rand::RngCore;
use sha2::{Digest, Sha256};
use zeroize::Zeroize;

/// GCM nonce length in bytes
const NONCE_LEN: usize = 12;

/// Symmetric authenticated encryption for OAuth tokens at rest.
///
/// Key material of arbitrary length is SHA-256-hashed to exactly 32 bytes,
/// so operators may supply a passphrase rather than raw key bytes. Every
/// encryption call draws a fresh random nonce; identical plaintexts never
/// produce identical ciphertexts.
pub struct TokenEncryptor {
    key: [u8; 32],
}

impl TokenEncryptor {
    /// Derive an encryptor from arbitrary key material
    #[must_use]
    pub fn new(key_material: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(key_material);
        let digest = hasher.finalize();

        let mut key = [0u8; 32];
        key.copy_from_slice(&digest);
        Self { key }
    }

    /// Encrypt a plaintext token for storage.
    ///
    /// Output layout: base64(\[12-byte nonce\]\[ciphertext\]). An empty
    /// plaintext encrypts to an empty string rather than a zero-length
    /// authenticated blob, so absent optional tokens round-trip as absent.
    ///
    /// # Errors
    ///
    /// Returns an internal error if the AEAD seal operation fails
    pub fn encrypt(&self, plaintext: &str) -> AppResult<String> {
        if plaintext.is_empty() {
            return Ok(String::new());
        }

        let cipher = Aes256Gcm::new(GenericArray::from_slice(&self.key));

        let mut nonce_bytes = [0u8; NONCE_LEN];
        rand::rngs::OsRng.fill_bytes(&mut nonce_bytes);
        let nonce = GenericArray::from_slice(&nonce_bytes);

        let ciphertext = cipher
            .encrypt(nonce, plaintext.as_bytes())
            .map_err(|_| AppError::internal("encryption failed"))?;

        let mut blob = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        blob.extend_from_slice(&nonce_bytes);
        blob.extend_from_slice(&ciphertext);

        Ok(general_purpose::STANDARD.encode(blob))
    }

    /// Decrypt a stored token blob back to plaintext.
    ///
    /// Every failure mode — bad base64, truncated blob, wrong key, corrupted
    /// ciphertext — collapses to the same generic `DecryptionFailed` error so
    /// callers cannot distinguish key problems from data corruption.
    ///
    /// # Errors
    ///
    /// Returns `DecryptionFailed` on any length or authentication failure
    pub fn decrypt(&self, encrypted: &str) -> AppResult<String> {
        if encrypted.is_empty() {
            return Ok(String::new());
        }

        let blob = general_purpose::STANDARD
            .decode(encrypted)
            .map_err(|_| AppError::decryption_failed())?;

        if blob.len() <= NONCE_LEN {
            return Err(AppError::decryption_failed());
        }

        let cipher = Aes256Gcm::new(GenericArray::from_slice(&self.key));
        let nonce = GenericArray::from_slice(&blob[..NONCE_LEN]);

        let plaintext = cipher
            .decrypt(nonce, &blob[NONCE_LEN..])
            .map_err(|_| AppError::decryption_failed())?;

        String::from_utf8(plaintext).map_err(|_| AppError::decryption_failed())
    }

    /// Hash a raw bearer token for blacklist lookups.
    ///
    /// SHA-256, base64 encoded. Deterministic: the blacklist stores and
    /// matches only these hashes, never raw tokens.
    #[must_use]
    pub fn hash_token(token: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(token.as_bytes());
        general_purpose::STANDARD.encode(hasher.finalize())
    }
}

impl Drop for TokenEncryptor {
    fn drop(&mut self) {
        self.key.zeroize();
    }
}

impl Clone for TokenEncryptor {
    fn clone(&self) -> Self {
        Self { key: self.key }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encryptor() -> TokenEncryptor {
        TokenEncryptor::new(b"test passphrase of arbitrary length")
    }

    #[test]
    fn test_round_trip() {
        let enc = encryptor();
        for s in ["ya29.a0AfH6SMB", "", "日本語トークン🔐", &"x".repeat(8192)] {
            let ciphertext = enc.encrypt(s).unwrap();
            assert_eq!(enc.decrypt(&ciphertext).unwrap(), s);
        }
    }

    #[test]
    fn test_empty_plaintext_fast_path() {
        let enc = encryptor();
        assert_eq!(enc.encrypt("").unwrap(), "");
        assert_eq!(enc.decrypt("").unwrap(), "");
    }

    #[test]
    fn test_nonce_randomness() {
        let enc = encryptor();
        let a = enc.encrypt("same plaintext").unwrap();
        let b = enc.encrypt("same plaintext").unwrap();

        assert_ne!(a, b);
        assert_eq!(enc.decrypt(&a).unwrap(), "same plaintext");
        assert_eq!(enc.decrypt(&b).unwrap(), "same plaintext");
    }

    #[test]
    fn test_wrong_key_is_generic_failure() {
        let ciphertext = encryptor().encrypt("secret").unwrap();
        let other = TokenEncryptor::new(b"a different passphrase");

        let err = other.decrypt(&ciphertext).unwrap_err();
        assert_eq!(err.code, crate::errors::ErrorCode::DecryptionFailed);

        // Corruption maps to the same error kind as a wrong key
        let err = encryptor().decrypt("not base64!!").unwrap_err();
        assert_eq!(err.code, crate::errors::ErrorCode::DecryptionFailed);
    }

    #[test]
    fn test_hash_token_deterministic() {
        let a = TokenEncryptor::hash_token("bearer-abc");
        let b = TokenEncryptor::hash_token("bearer-abc");
        let c = TokenEncryptor::hash_token("bearer-abd");

        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
