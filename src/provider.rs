//! Crypto primitives behind an injectable capability
//!
//! The container codec never talks to the platform crypto directly; it goes
//! through a [`CryptoProvider`] passed in by the caller. Production code uses
//! [`SystemProvider`]; tests can substitute a seeded provider to get
//! deterministic salts and nonces.

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce};
use pbkdf2::pbkdf2_hmac;
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::Sha256;
use zeroize::Zeroizing;

use crate::error::{EncboxError, ErrorCategory, ErrorKind, Result};

/// Length of the key-derivation salt in bytes
pub const SALT_LEN: usize = 16;

/// Length of the AES-GCM nonce in bytes
pub const NONCE_LEN: usize = 12;

/// Length of the derived AES-256 key in bytes
pub const KEY_LEN: usize = 32;

/// PBKDF2-HMAC-SHA256 iteration count.
///
/// Tunable security/latency trade-off: high enough to make offline brute
/// force costly, low enough to keep one derivation well under a second on
/// commodity hardware. Note that the container format carries no version
/// byte, so raising this orphans every previously written container.
pub const PBKDF2_ITERATIONS: u32 = 250_000;

/// The cryptographic capabilities the container codec depends on.
///
/// Salt, nonce, and key lengths are enforced by array types; passing a
/// wrong-length salt is a compile error, not a runtime condition.
pub trait CryptoProvider {
    /// Fill `buf` with cryptographically secure random bytes.
    ///
    /// Implementations must fail rather than fall back to a weaker source.
    fn random_bytes(&self, buf: &mut [u8]) -> Result<()>;

    /// Derive a 256-bit key from a password and salt.
    ///
    /// Deterministic given the same inputs and intentionally expensive.
    /// Cannot fail for well-formed inputs. The key is wiped when the
    /// returned guard is dropped.
    fn derive_key(&self, password: &[u8], salt: &[u8; SALT_LEN]) -> Zeroizing<[u8; KEY_LEN]>;

    /// Authenticated encryption with no associated data. Returns the
    /// ciphertext with the integrity tag embedded.
    fn aead_encrypt(
        &self,
        key: &[u8; KEY_LEN],
        nonce: &[u8; NONCE_LEN],
        plaintext: &[u8],
    ) -> Result<Vec<u8>>;

    /// Authenticated decryption. Fails opaquely on any tag mismatch;
    /// callers must not surface more detail than "it failed".
    fn aead_decrypt(
        &self,
        key: &[u8; KEY_LEN],
        nonce: &[u8; NONCE_LEN],
        ciphertext: &[u8],
    ) -> Result<Vec<u8>>;
}

/// Production provider: OS random source, PBKDF2-HMAC-SHA256, AES-256-GCM.
pub struct SystemProvider;

impl CryptoProvider for SystemProvider {
    fn random_bytes(&self, buf: &mut [u8]) -> Result<()> {
        OsRng.try_fill_bytes(buf).map_err(|e| {
            EncboxError::with_kind_and_source(
                ErrorCategory::Internal,
                ErrorKind::PlatformUnavailable,
                "secure random source unavailable",
                e,
            )
        })
    }

    fn derive_key(&self, password: &[u8], salt: &[u8; SALT_LEN]) -> Zeroizing<[u8; KEY_LEN]> {
        let mut key = Zeroizing::new([0u8; KEY_LEN]);
        pbkdf2_hmac::<Sha256>(password, salt, PBKDF2_ITERATIONS, &mut *key);
        key
    }

    fn aead_encrypt(
        &self,
        key: &[u8; KEY_LEN],
        nonce: &[u8; NONCE_LEN],
        plaintext: &[u8],
    ) -> Result<Vec<u8>> {
        let cipher = Aes256Gcm::new(&(*key).into());
        cipher
            .encrypt(Nonce::from_slice(nonce), plaintext)
            .map_err(|_| {
                EncboxError::with_kind(
                    ErrorCategory::Internal,
                    ErrorKind::CipherFailure,
                    "AEAD encryption failed",
                )
            })
    }

    fn aead_decrypt(
        &self,
        key: &[u8; KEY_LEN],
        nonce: &[u8; NONCE_LEN],
        ciphertext: &[u8],
    ) -> Result<Vec<u8>> {
        let cipher = Aes256Gcm::new(&(*key).into());
        cipher
            .decrypt(Nonce::from_slice(nonce), ciphertext)
            .map_err(|_| {
                EncboxError::with_kind(
                    ErrorCategory::User,
                    ErrorKind::DecryptionFailed,
                    "authentication failed",
                )
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derive_key_deterministic() {
        let salt = [7u8; SALT_LEN];
        let k1 = SystemProvider.derive_key(b"password", &salt);
        let k2 = SystemProvider.derive_key(b"password", &salt);
        assert_eq!(*k1, *k2);
    }

    #[test]
    fn test_derive_key_salt_sensitivity() {
        let k1 = SystemProvider.derive_key(b"password", &[1u8; SALT_LEN]);
        let k2 = SystemProvider.derive_key(b"password", &[2u8; SALT_LEN]);
        assert_ne!(*k1, *k2);
    }

    #[test]
    fn test_derive_key_password_sensitivity() {
        let salt = [1u8; SALT_LEN];
        let k1 = SystemProvider.derive_key(b"password", &salt);
        let k2 = SystemProvider.derive_key(b"passworD", &salt);
        assert_ne!(*k1, *k2);
    }

    #[test]
    fn test_random_bytes_fills_buffer() {
        // 32 zero bytes after a successful fill is a ~2^-256 event.
        let mut buf = [0u8; 32];
        SystemProvider.random_bytes(&mut buf).unwrap();
        assert_ne!(buf, [0u8; 32]);
    }

    #[test]
    fn test_aead_rejects_bad_tag() {
        let key = [3u8; KEY_LEN];
        let nonce = [4u8; NONCE_LEN];
        let mut sealed = SystemProvider.aead_encrypt(&key, &nonce, b"payload").unwrap();
        let last = sealed.len() - 1;
        sealed[last] ^= 0x01;
        let err = SystemProvider
            .aead_decrypt(&key, &nonce, &sealed)
            .expect_err("expected tag mismatch");
        assert_eq!(err.kind, Some(ErrorKind::DecryptionFailed));
    }
}
