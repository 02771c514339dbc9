/// Dual-mode key derivation for vault master keys.
///
/// Two selectable algorithms, chosen once when a secret is first encrypted
/// and persisted with the record:
/// - Standard: PBKDF2-HMAC-SHA256, 100,000 rounds. Fast unlock (<50ms).
/// - MemoryHard: Argon2id, p=1, t=2, m=1 MiB.
///
/// The Argon2id parameters are deliberately low: the target is a 1-2 second
/// interactive unlock, not maximal brute-force resistance. They are a
/// calibration knob; raising them invalidates no stored data as long as a
/// new mode tag is introduced for the new parameters.
use std::fmt;
use std::str::FromStr;
use std::time::{Duration, Instant};

use argon2::{Algorithm, Argon2, Params, Version};
use pbkdf2::pbkdf2_hmac;
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use crate::codec;
use crate::crypto::sensitive::{MasterKey, KEY_LEN};
use crate::error::{Result, VaultError};

pub const SALT_LEN: usize = 16;

const PBKDF2_ITERATIONS: u32 = 100_000;

const ARGON2_TIME_COST: u32 = 2;
const ARGON2_MEMORY_KIB: u32 = 1024; // 1 MiB
const ARGON2_PARALLELISM: u32 = 1;

/// Sanity bound on a single derivation; exceeding it signals host resource
/// exhaustion, not a tunable work factor.
const DERIVATION_LIMIT: Duration = Duration::from_secs(10);

/// How a master key is derived from a secret.
///
/// The wire tags (`standard`, `argon2`, `legacy`) are a persisted contract;
/// unknown tags are rejected at deserialization, never defaulted. A missing
/// tag on an old record deserializes as [`DerivationMode::Standard`] via
/// `#[serde(default)]` at the record level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DerivationMode {
    /// PBKDF2-HMAC-SHA256, salted, 100,000 rounds.
    #[default]
    #[serde(rename = "standard")]
    Standard,
    /// Argon2id, salted, tuned for interactive use.
    #[serde(rename = "argon2")]
    MemoryHard,
    /// Unsalted SHA-256 of signature and identity, predating salted
    /// derivation. Read-only: every write path rejects it.
    #[serde(rename = "legacy")]
    Legacy,
}

impl DerivationMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            DerivationMode::Standard => "standard",
            DerivationMode::MemoryHard => "argon2",
            DerivationMode::Legacy => "legacy",
        }
    }
}

impl fmt::Display for DerivationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DerivationMode {
    type Err = VaultError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "standard" => Ok(DerivationMode::Standard),
            "argon2" => Ok(DerivationMode::MemoryHard),
            "legacy" => Ok(DerivationMode::Legacy),
            other => Err(VaultError::InvalidInput(format!(
                "unknown derivation mode: {other:?}"
            ))),
        }
    }
}

/// Generate a random 16-byte salt.
pub fn generate_salt() -> [u8; SALT_LEN] {
    codec::random_bytes()
}

/// Derive a 256-bit key from a secret and a 16-byte salt.
///
/// Pure and deterministic: the same (secret, salt, mode) triple always
/// yields the same key, which is what lets decryption re-derive the key
/// instead of persisting it.
pub fn derive(secret: &[u8], salt: &[u8], mode: DerivationMode) -> Result<MasterKey> {
    if secret.is_empty() {
        return Err(VaultError::InvalidInput("secret must not be empty".into()));
    }
    if salt.len() != SALT_LEN {
        return Err(VaultError::InvalidInput(format!(
            "salt must be {SALT_LEN} bytes, got {}",
            salt.len()
        )));
    }

    let started = Instant::now();
    let key = match mode {
        DerivationMode::Standard => derive_pbkdf2(secret, salt),
        DerivationMode::MemoryHard => derive_argon2id(secret, salt)?,
        DerivationMode::Legacy => {
            // Legacy derivation is not salt-based; it lives in the master key
            // service as a read-only compatibility path.
            return Err(VaultError::InvalidInput(
                "legacy mode is not supported by salted derivation".into(),
            ));
        }
    };

    let elapsed = started.elapsed();
    if elapsed > DERIVATION_LIMIT {
        return Err(VaultError::DerivationTimeout {
            elapsed,
            limit: DERIVATION_LIMIT,
        });
    }

    Ok(key)
}

fn derive_pbkdf2(secret: &[u8], salt: &[u8]) -> MasterKey {
    let mut output = [0u8; KEY_LEN];
    pbkdf2_hmac::<Sha256>(secret, salt, PBKDF2_ITERATIONS, &mut output);
    MasterKey::new(output)
}

fn derive_argon2id(secret: &[u8], salt: &[u8]) -> Result<MasterKey> {
    let params = Params::new(
        ARGON2_MEMORY_KIB,
        ARGON2_TIME_COST,
        ARGON2_PARALLELISM,
        Some(KEY_LEN),
    )
    .map_err(|e| VaultError::KeyDerivation(e.to_string()))?;

    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

    let mut output = [0u8; KEY_LEN];
    argon2
        .hash_password_into(secret, salt, &mut output)
        .map_err(|e| VaultError::KeyDerivation(e.to_string()))?;

    Ok(MasterKey::new(output))
}
