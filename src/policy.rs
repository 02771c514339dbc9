/// Record policy: ties each record's derivation mode to its later decryption.
///
/// Flow: the signer produces a signature over the identity's unlock message →
/// the master key service derives a key for the record's stored mode → the
/// envelope layer decrypts each secret field. Keys are cached per mode for
/// the session's lifetime and dropped (zeroized) on [`VaultSession::clear`].
use std::collections::{BTreeMap, HashMap};

use tracing::{info, warn};

use crate::crypto::envelope;
use crate::crypto::kdf::DerivationMode;
use crate::crypto::sensitive::MasterKey;
use crate::error::{Result, VaultError};
use crate::master;
use crate::record::{new_record_id, now_millis, CardBrand, CardEntry, CardSecrets, PasswordEntry, VaultRecord};

/// External signer boundary. Implementations wrap a wallet or test fixture;
/// the signature is treated as opaque secret-equivalent bytes.
pub trait SignatureProvider {
    fn sign_message(&self, message: &str) -> Result<String>;
}

/// Session-scoped master key cache for a single identity.
///
/// Exclusively owned by its caller; holds at most one key per derivation
/// mode, requesting one signature per (session, mode). Dropping the session
/// or calling [`clear`](Self::clear) zeroizes every cached key.
pub struct VaultSession {
    identity_id: String,
    keys: HashMap<DerivationMode, MasterKey>,
}

impl VaultSession {
    pub fn new(identity_id: impl Into<String>) -> Self {
        Self {
            identity_id: identity_id.into(),
            keys: HashMap::new(),
        }
    }

    pub fn identity_id(&self) -> &str {
        &self.identity_id
    }

    /// Return the cached key for `mode`, deriving it first if needed.
    ///
    /// Derivation requests a fresh signature from the signer; the signature
    /// itself is never stored, only the derived key.
    pub fn key_for_mode(
        &mut self,
        mode: DerivationMode,
        signer: &dyn SignatureProvider,
    ) -> Result<MasterKey> {
        if let Some(key) = self.keys.get(&mode) {
            return Ok(key.clone());
        }

        let message = master::unlock_message(&self.identity_id);
        let signature = signer.sign_message(&message)?;
        let key = master::derive_master_key(&self.identity_id, &signature, mode)?;
        self.keys.insert(mode, key.clone());

        info!(identity = %self.identity_id, mode = %mode, "Session key derived");
        Ok(key)
    }

    pub fn is_unlocked(&self, mode: DerivationMode) -> bool {
        self.keys.contains_key(&mode)
    }

    /// Drop all cached keys (vault lock / logout). Keys zeroize on drop.
    pub fn clear(&mut self) {
        self.keys.clear();
    }
}

/// Encrypt each secret field independently and stamp the record with `mode`.
///
/// `Legacy` is rejected: it exists only so pre-salt records stay readable,
/// and new writes must never regress to the weaker derivation.
pub fn create_record(
    secret_fields: &BTreeMap<String, String>,
    metadata: BTreeMap<String, String>,
    mode: DerivationMode,
    key: &MasterKey,
) -> Result<VaultRecord> {
    reject_legacy_write(mode)?;

    let mut secrets = BTreeMap::new();
    for (name, value) in secret_fields {
        secrets.insert(name.clone(), envelope::encrypt(value, key)?);
    }

    let now = now_millis();
    let record = VaultRecord {
        id: new_record_id(),
        metadata,
        secrets,
        encryption_mode: mode,
        created_at: now,
        updated_at: now,
    };

    info!(record_id = %record.id, mode = %mode, fields = record.secrets.len(), "Record created");
    Ok(record)
}

/// Decrypt every secret field of a record.
///
/// Re-derives (or reuses the session-cached) key for the record's stored
/// mode. All-or-nothing: if any single field fails to decrypt, the whole
/// open fails and nothing is returned.
pub fn open_record(
    record: &VaultRecord,
    session: &mut VaultSession,
    signer: &dyn SignatureProvider,
) -> Result<BTreeMap<String, String>> {
    let key = session.key_for_mode(record.encryption_mode, signer)?;

    let mut revealed = BTreeMap::new();
    for (name, sealed) in &record.secrets {
        match envelope::decrypt::<String>(sealed, &key) {
            Ok(value) => {
                revealed.insert(name.clone(), value);
            }
            Err(e) => {
                warn!(record_id = %record.id, field = %name, error = %e, "Record open failed");
                return Err(e);
            }
        }
    }

    Ok(revealed)
}

/// Re-encrypt a record under a new derivation mode.
///
/// The only supported way to change a record's mode: every secret field is
/// decrypted and sealed into a brand-new envelope under the new mode's key.
/// Metadata, id, and creation time are preserved.
pub fn rotate_record(
    record: &VaultRecord,
    new_mode: DerivationMode,
    session: &mut VaultSession,
    signer: &dyn SignatureProvider,
) -> Result<VaultRecord> {
    reject_legacy_write(new_mode)?;

    let revealed = open_record(record, session, signer)?;
    let new_key = session.key_for_mode(new_mode, signer)?;

    let mut secrets = BTreeMap::new();
    for (name, value) in &revealed {
        secrets.insert(name.clone(), envelope::encrypt(value, &new_key)?);
    }

    info!(record_id = %record.id, from = %record.encryption_mode, to = %new_mode, "Record rotated");
    Ok(VaultRecord {
        id: record.id.clone(),
        metadata: record.metadata.clone(),
        secrets,
        encryption_mode: new_mode,
        created_at: record.created_at,
        updated_at: now_millis(),
    })
}

/// Update cleartext metadata only. Secret fields and the mode tag are
/// untouched; re-encryption on edit is not part of this operation.
pub fn update_metadata(
    record: &mut VaultRecord,
    updates: impl IntoIterator<Item = (String, String)>,
) {
    for (name, value) in updates {
        record.metadata.insert(name, value);
    }
    record.updated_at = now_millis();
}

fn reject_legacy_write(mode: DerivationMode) -> Result<()> {
    if mode == DerivationMode::Legacy {
        return Err(VaultError::InvalidInput(
            "legacy mode is read-only; new records must use standard or argon2".into(),
        ));
    }
    Ok(())
}

impl PasswordEntry {
    /// Encrypt a password into a new entry stamped with `mode`.
    pub fn create(
        title: impl Into<String>,
        username: impl Into<String>,
        password: &str,
        url: Option<String>,
        mode: DerivationMode,
        key: &MasterKey,
    ) -> Result<Self> {
        reject_legacy_write(mode)?;
        let now = now_millis();
        Ok(Self {
            id: new_record_id(),
            title: title.into(),
            username: username.into(),
            encrypted_password: envelope::encrypt(&password, key)?,
            url,
            ipfs_cid: None,
            encryption_mode: mode,
            created_at: now,
            updated_at: now,
        })
    }

    /// Decrypt the password using the entry's stored mode.
    pub fn reveal(
        &self,
        session: &mut VaultSession,
        signer: &dyn SignatureProvider,
    ) -> Result<String> {
        let key = session.key_for_mode(self.encryption_mode, signer)?;
        envelope::decrypt(&self.encrypted_password, &key)
    }
}

impl CardEntry {
    #[allow(clippy::too_many_arguments)]
    pub fn create(
        item_name: impl Into<String>,
        folder: impl Into<String>,
        cardholder_name: impl Into<String>,
        card_number: &str,
        brand: CardBrand,
        expiry_month: impl Into<String>,
        expiry_year: impl Into<String>,
        cvv: &str,
        notes: Option<String>,
        mode: DerivationMode,
        key: &MasterKey,
    ) -> Result<Self> {
        reject_legacy_write(mode)?;
        let now = now_millis();
        Ok(Self {
            id: new_record_id(),
            item_name: item_name.into(),
            folder: folder.into(),
            cardholder_name: cardholder_name.into(),
            card_number: envelope::encrypt(&card_number, key)?,
            brand,
            expiry_month: expiry_month.into(),
            expiry_year: expiry_year.into(),
            cvv: envelope::encrypt(&cvv, key)?,
            notes,
            encryption_mode: mode,
            created_at: now,
            updated_at: now,
        })
    }

    /// Decrypt number and CVV together. All-or-nothing: if either field
    /// fails, no partial card is returned.
    pub fn reveal(
        &self,
        session: &mut VaultSession,
        signer: &dyn SignatureProvider,
    ) -> Result<CardSecrets> {
        let key = session.key_for_mode(self.encryption_mode, signer)?;
        let card_number = envelope::decrypt(&self.card_number, &key)?;
        let cvv = envelope::decrypt(&self.cvv, &key)?;
        Ok(CardSecrets { card_number, cvv })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    const IDENTITY: &str = "0x1111111111111111111111111111111111111111";

    struct FakeSigner {
        signature: String,
        calls: Cell<usize>,
    }

    impl FakeSigner {
        fn new(signature: &str) -> Self {
            Self {
                signature: signature.into(),
                calls: Cell::new(0),
            }
        }
    }

    impl SignatureProvider for FakeSigner {
        fn sign_message(&self, _message: &str) -> Result<String> {
            self.calls.set(self.calls.get() + 1);
            Ok(self.signature.clone())
        }
    }

    fn secret_fields() -> BTreeMap<String, String> {
        BTreeMap::from([
            ("password".into(), "hunter2".into()),
            ("recovery_code".into(), "0000-1111".into()),
        ])
    }

    #[test]
    fn test_create_open_roundtrip() {
        let signer = FakeSigner::new("sig-a");
        let mut session = VaultSession::new(IDENTITY);
        let key = session
            .key_for_mode(DerivationMode::Standard, &signer)
            .unwrap();

        let record = create_record(
            &secret_fields(),
            BTreeMap::from([("title".into(), "router".into())]),
            DerivationMode::Standard,
            &key,
        )
        .unwrap();

        assert_eq!(record.metadata["title"], "router");
        let revealed = open_record(&record, &mut session, &signer).unwrap();
        assert_eq!(revealed, secret_fields());
    }

    #[test]
    fn test_legacy_write_rejected() {
        let key = MasterKey::new([7; 32]);
        let result = create_record(
            &secret_fields(),
            BTreeMap::new(),
            DerivationMode::Legacy,
            &key,
        );
        assert!(matches!(result, Err(VaultError::InvalidInput(_))));
    }

    #[test]
    fn test_single_bad_field_fails_whole_open() {
        let signer = FakeSigner::new("sig-a");
        let mut session = VaultSession::new(IDENTITY);
        let key = session
            .key_for_mode(DerivationMode::Standard, &signer)
            .unwrap();

        let mut record = create_record(
            &secret_fields(),
            BTreeMap::new(),
            DerivationMode::Standard,
            &key,
        )
        .unwrap();

        // Corrupt one of the two envelopes.
        let sealed = record.secrets.get_mut("recovery_code").unwrap();
        *sealed = sealed.replacen(|c: char| c.is_ascii_alphanumeric(), "x", 1);

        let result = open_record(&record, &mut session, &signer);
        assert!(matches!(result, Err(VaultError::Decryption(_))));
    }

    #[test]
    fn test_wrong_signature_fails_decryption() {
        let signer = FakeSigner::new("sig-a");
        let mut session = VaultSession::new(IDENTITY);
        let key = session
            .key_for_mode(DerivationMode::Standard, &signer)
            .unwrap();
        let record = create_record(
            &secret_fields(),
            BTreeMap::new(),
            DerivationMode::Standard,
            &key,
        )
        .unwrap();

        let other_signer = FakeSigner::new("sig-b");
        let mut other_session = VaultSession::new(IDENTITY);
        let result = open_record(&record, &mut other_session, &other_signer);
        assert!(matches!(result, Err(VaultError::Decryption(_))));
    }

    #[test]
    fn test_session_caches_key_per_mode() {
        let signer = FakeSigner::new("sig-a");
        let mut session = VaultSession::new(IDENTITY);

        let key = session
            .key_for_mode(DerivationMode::Standard, &signer)
            .unwrap();
        let record = create_record(
            &secret_fields(),
            BTreeMap::new(),
            DerivationMode::Standard,
            &key,
        )
        .unwrap();

        open_record(&record, &mut session, &signer).unwrap();
        open_record(&record, &mut session, &signer).unwrap();
        // One signature request total: derivation + both opens share the key.
        assert_eq!(signer.calls.get(), 1);

        session.clear();
        assert!(!session.is_unlocked(DerivationMode::Standard));
        open_record(&record, &mut session, &signer).unwrap();
        assert_eq!(signer.calls.get(), 2);
    }

    #[test]
    fn test_rotate_record_changes_mode() {
        let signer = FakeSigner::new("sig-a");
        let mut session = VaultSession::new(IDENTITY);
        let key = session
            .key_for_mode(DerivationMode::Standard, &signer)
            .unwrap();
        let record = create_record(
            &secret_fields(),
            BTreeMap::from([("title".into(), "router".into())]),
            DerivationMode::Standard,
            &key,
        )
        .unwrap();

        let rotated =
            rotate_record(&record, DerivationMode::MemoryHard, &mut session, &signer).unwrap();

        assert_eq!(rotated.id, record.id);
        assert_eq!(rotated.encryption_mode, DerivationMode::MemoryHard);
        assert_eq!(rotated.created_at, record.created_at);
        // Fresh envelopes, not the old ciphertexts.
        assert_ne!(rotated.secrets["password"], record.secrets["password"]);

        let revealed = open_record(&rotated, &mut session, &signer).unwrap();
        assert_eq!(revealed, secret_fields());
    }

    #[test]
    fn test_rotate_to_legacy_rejected() {
        let signer = FakeSigner::new("sig-a");
        let mut session = VaultSession::new(IDENTITY);
        let key = session
            .key_for_mode(DerivationMode::Standard, &signer)
            .unwrap();
        let record = create_record(
            &secret_fields(),
            BTreeMap::new(),
            DerivationMode::Standard,
            &key,
        )
        .unwrap();

        let result = rotate_record(&record, DerivationMode::Legacy, &mut session, &signer);
        assert!(matches!(result, Err(VaultError::InvalidInput(_))));
    }

    #[test]
    fn test_update_metadata_leaves_secrets_alone() {
        let key = MasterKey::new([9; 32]);
        let mut record = create_record(
            &secret_fields(),
            BTreeMap::from([("title".into(), "old".into())]),
            DerivationMode::Standard,
            &key,
        )
        .unwrap();
        let sealed_before = record.secrets.clone();

        update_metadata(&mut record, [("title".to_string(), "new".to_string())]);
        assert_eq!(record.metadata["title"], "new");
        assert_eq!(record.secrets, sealed_before);
        assert_eq!(record.encryption_mode, DerivationMode::Standard);
    }

    #[test]
    fn test_password_entry_create_reveal() {
        let signer = FakeSigner::new("sig-a");
        let mut session = VaultSession::new(IDENTITY);
        let key = session
            .key_for_mode(DerivationMode::MemoryHard, &signer)
            .unwrap();

        let entry = PasswordEntry::create(
            "email",
            "alice",
            "hunter2",
            Some("https://mail.example".into()),
            DerivationMode::MemoryHard,
            &key,
        )
        .unwrap();

        assert_eq!(entry.encryption_mode, DerivationMode::MemoryHard);
        assert_eq!(entry.reveal(&mut session, &signer).unwrap(), "hunter2");
    }

    #[test]
    fn test_card_reveal_all_or_nothing() {
        let signer = FakeSigner::new("sig-a");
        let mut session = VaultSession::new(IDENTITY);
        let key = session
            .key_for_mode(DerivationMode::Standard, &signer)
            .unwrap();

        let mut card = CardEntry::create(
            "personal visa",
            "finance",
            "Alice Example",
            "4111111111111111",
            CardBrand::Visa,
            "04",
            "2031",
            "042",
            None,
            DerivationMode::Standard,
            &key,
        )
        .unwrap();

        let secrets = card.reveal(&mut session, &signer).unwrap();
        assert_eq!(secrets.card_number, "4111111111111111");
        assert_eq!(secrets.cvv, "042");

        // Corrupt only the CVV envelope: the number still decrypts but the
        // reveal as a whole must fail.
        card.cvv = card.card_number.clone();
        card.cvv.replace_range(0..1, "B");
        assert!(card.reveal(&mut session, &signer).is_err());
    }
}
