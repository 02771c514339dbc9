/// Wrapper for master key material that is automatically zeroized on drop.
use subtle::ConstantTimeEq;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::{Result, VaultError};

pub const KEY_LEN: usize = 32;

/// A 256-bit symmetric key, zeroized when dropped.
///
/// Held only in memory for the lifetime of a session; never serialized.
/// Equality is constant-time.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct MasterKey([u8; KEY_LEN]);

impl MasterKey {
    pub fn new(bytes: [u8; KEY_LEN]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.0
    }

    pub fn from_slice(slice: &[u8]) -> Result<Self> {
        if slice.len() != KEY_LEN {
            return Err(VaultError::InvalidInput(format!(
                "key must be {KEY_LEN} bytes, got {}",
                slice.len()
            )));
        }
        let mut bytes = [0u8; KEY_LEN];
        bytes.copy_from_slice(slice);
        Ok(Self(bytes))
    }

    pub fn from_hex(s: &str) -> Result<Self> {
        let bytes = crate::codec::from_hex(s)?;
        Self::from_slice(&bytes)
    }

    pub fn to_hex(&self) -> String {
        crate::codec::to_hex(&self.0)
    }
}

impl AsRef<[u8]> for MasterKey {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl PartialEq for MasterKey {
    fn eq(&self, other: &Self) -> bool {
        self.0.ct_eq(&other.0).into()
    }
}

impl Eq for MasterKey {}

impl std::fmt::Debug for MasterKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Never print key bytes.
        f.write_str("MasterKey(..)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_slice_length_check() {
        assert!(MasterKey::from_slice(&[0u8; 32]).is_ok());
        assert!(MasterKey::from_slice(&[0u8; 16]).is_err());
    }

    #[test]
    fn test_hex_roundtrip() {
        let key = MasterKey::new([0xAB; 32]);
        let hex = key.to_hex();
        assert_eq!(hex.len(), 64);
        assert_eq!(MasterKey::from_hex(&hex).unwrap(), key);
    }

    #[test]
    fn test_eq() {
        assert_eq!(MasterKey::new([1; 32]), MasterKey::new([1; 32]));
        assert_ne!(MasterKey::new([1; 32]), MasterKey::new([2; 32]));
    }

    #[test]
    fn test_debug_hides_bytes() {
        let key = MasterKey::new([0x42; 32]);
        assert_eq!(format!("{key:?}"), "MasterKey(..)");
    }
}
