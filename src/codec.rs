/// Byte/string conversion helpers used across the crate.
///
/// Everything that crosses the crate boundary as a string (envelopes, salts,
/// keys in the CLI) goes through these functions so that encoding errors are
/// reported uniformly as input-validation failures.
use rand::RngCore;

use crate::error::{Result, VaultError};

/// Encode bytes as a lowercase hex string.
pub fn to_hex(bytes: &[u8]) -> String {
    hex::encode(bytes)
}

/// Decode a hex string into bytes.
pub fn from_hex(s: &str) -> Result<Vec<u8>> {
    hex::decode(s).map_err(|e| VaultError::InvalidInput(format!("invalid hex: {e}")))
}

/// Decode bytes as UTF-8.
pub fn from_utf8(bytes: Vec<u8>) -> Result<String> {
    String::from_utf8(bytes).map_err(|e| VaultError::InvalidInput(format!("invalid UTF-8: {e}")))
}

/// Fill a fixed-size array with OS-provided randomness.
pub fn random_bytes<const N: usize>() -> [u8; N] {
    let mut buf = [0u8; N];
    rand::rngs::OsRng.fill_bytes(&mut buf);
    buf
}
