/// Master key derivation bound to a wallet identity.
///
/// The external signer produces a signature over a fixed unlock message;
/// that signature is the high-entropy secret, and the salt is derived from
/// the identity itself. The same (identity, signature, mode) triple always
/// regenerates the same key, so nothing but the mode tag is persisted.
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::crypto::kdf::{self, DerivationMode, SALT_LEN};
use crate::crypto::sensitive::MasterKey;
use crate::error::{Result, VaultError};

/// The message the external signer must sign to unlock a vault.
///
/// Deterministic per identity: anything volatile in here (the original
/// design embedded a timestamp) changes the signature and with it the
/// derived key, making stored records undecryptable in later sessions.
pub fn unlock_message(identity_id: &str) -> String {
    format!("PassNexus Master Key Derivation\nAddress: {identity_id}")
}

/// Deterministic salt for an identity: first 16 bytes of SHA-256(identity).
///
/// Not random by design. The salt only needs to differ between identities;
/// deriving it from the identity avoids persisting it anywhere.
pub fn salt_for_identity(identity_id: &str) -> Result<[u8; SALT_LEN]> {
    if identity_id.is_empty() {
        return Err(VaultError::InvalidInput(
            "identity id must not be empty".into(),
        ));
    }
    let digest = Sha256::digest(identity_id.as_bytes());
    let mut salt = [0u8; SALT_LEN];
    salt.copy_from_slice(&digest[..SALT_LEN]);
    Ok(salt)
}

/// Derive the master key for an identity from a fresh session signature.
///
/// The signature must come from the signer each session and must never be
/// cached across restarts; persisted, it would be equivalent to the master
/// key itself.
///
/// `Legacy` reproduces the pre-salt derivation (plain SHA-256 of
/// signature and identity) so records written before mode tagging stay
/// readable. Write paths reject it; see [`crate::policy`].
pub fn derive_master_key(
    identity_id: &str,
    signature: &str,
    mode: DerivationMode,
) -> Result<MasterKey> {
    if signature.is_empty() {
        return Err(VaultError::InvalidInput(
            "signature must not be empty".into(),
        ));
    }

    let key = match mode {
        DerivationMode::Legacy => {
            let mut hasher = Sha256::new();
            hasher.update(signature.as_bytes());
            hasher.update(identity_id.as_bytes());
            MasterKey::new(hasher.finalize().into())
        }
        DerivationMode::Standard | DerivationMode::MemoryHard => {
            let salt = salt_for_identity(identity_id)?;
            kdf::derive(signature.as_bytes(), &salt, mode)?
        }
    };

    debug!(identity = identity_id, mode = %mode, "Master key derived");
    Ok(key)
}
