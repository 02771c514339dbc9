/// Self-contained authenticated envelopes for vault secrets.
///
/// Format, base64-encoded:
/// [version(1B) | nonce(12B) | ciphertext + tag(16B)]
///
/// The cipher is AES-256-GCM, chosen explicitly rather than left to a
/// library default: every envelope carries an authentication tag, so a
/// wrong key or a flipped byte fails decryption instead of yielding
/// garbage plaintext.
use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Nonce,
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use serde::{de::DeserializeOwned, Serialize};

use crate::codec;
use crate::crypto::sensitive::MasterKey;
use crate::error::{Result, VaultError};

pub const ENVELOPE_VERSION: u8 = 0x01;
pub const NONCE_LEN: usize = 12;
pub const TAG_LEN: usize = 16;

const MIN_PACKED_LEN: usize = 1 + NONCE_LEN + TAG_LEN;

/// Encrypt a JSON-serializable payload into an opaque envelope string.
///
/// The payload is serialized with serde_json before encryption; decrypt
/// reverses that exactly, preserving strings, numbers, and nesting.
pub fn encrypt<T: Serialize>(payload: &T, key: &MasterKey) -> Result<String> {
    let plaintext =
        serde_json::to_vec(payload).map_err(|e| VaultError::Serialization(e.to_string()))?;

    let cipher = Aes256Gcm::new_from_slice(key.as_bytes())
        .map_err(|e| VaultError::Encryption(e.to_string()))?;

    let nonce_bytes: [u8; NONCE_LEN] = codec::random_bytes();
    let nonce = Nonce::from_slice(&nonce_bytes);

    let ciphertext = cipher
        .encrypt(nonce, plaintext.as_slice())
        .map_err(|e| VaultError::Encryption(e.to_string()))?;

    let mut packed = Vec::with_capacity(1 + NONCE_LEN + ciphertext.len());
    packed.push(ENVELOPE_VERSION);
    packed.extend_from_slice(&nonce_bytes);
    packed.extend_from_slice(&ciphertext);

    Ok(BASE64.encode(packed))
}

/// Decrypt an envelope string back into its payload.
///
/// Every failure path returns [`VaultError::Decryption`]: malformed
/// encoding, unknown version, tag verification failure (wrong key or
/// corrupted ciphertext), or plaintext that does not parse as the
/// requested type. Partially-decrypted data is never returned.
pub fn decrypt<T: DeserializeOwned>(envelope: &str, key: &MasterKey) -> Result<T> {
    let packed = BASE64
        .decode(envelope)
        .map_err(|e| VaultError::Decryption(format!("envelope is not valid base64: {e}")))?;

    if packed.len() < MIN_PACKED_LEN {
        return Err(VaultError::Decryption(format!(
            "envelope too short: {} bytes (minimum {MIN_PACKED_LEN})",
            packed.len()
        )));
    }

    let version = packed[0];
    if version != ENVELOPE_VERSION {
        return Err(VaultError::Decryption(format!(
            "unsupported envelope version: {version}"
        )));
    }

    let nonce = Nonce::from_slice(&packed[1..1 + NONCE_LEN]);
    let ciphertext = &packed[1 + NONCE_LEN..];

    let cipher = Aes256Gcm::new_from_slice(key.as_bytes())
        .map_err(|e| VaultError::Decryption(e.to_string()))?;

    let plaintext = cipher
        .decrypt(nonce, ciphertext)
        .map_err(|_| VaultError::Decryption("wrong key or corrupted data".into()))?;

    serde_json::from_slice(&plaintext)
        .map_err(|e| VaultError::Decryption(format!("payload does not parse: {e}")))
}
