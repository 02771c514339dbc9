/// Vault record models.
///
/// These structs are the persisted wire contract: cleartext metadata,
/// envelope-encrypted secret fields, and the derivation mode tag stamped at
/// creation time. Field names (`encryptedPassword`, `encryptionMode`, ...)
/// round-trip exactly; other components embed these shapes as-is.
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::crypto::kdf::DerivationMode;

/// A generic vault record: cleartext metadata plus independently encrypted
/// secret fields.
///
/// `encryptionMode` defaults to `standard` on deserialization so records
/// written before mode tagging stay readable; an unknown tag is a
/// deserialization error, never a default.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VaultRecord {
    pub id: String,
    /// Non-secret fields, stored in cleartext.
    pub metadata: BTreeMap<String, String>,
    /// Secret field name -> envelope string.
    pub secrets: BTreeMap<String, String>,
    /// Write-once: changing it requires re-encrypting every secret field.
    #[serde(default)]
    pub encryption_mode: DerivationMode,
    /// Epoch milliseconds.
    pub created_at: i64,
    pub updated_at: i64,
}

/// A stored password entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PasswordEntry {
    pub id: String,
    pub title: String,
    pub username: String,
    /// Envelope string; see [`crate::crypto::envelope`].
    pub encrypted_password: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Content identifier of the record's blob copy, if uploaded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ipfs_cid: Option<String>,
    #[serde(default)]
    pub encryption_mode: DerivationMode,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Card network, closed set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CardBrand {
    Visa,
    Mastercard,
    Amex,
    Discover,
}

/// A stored payment card. Number and CVV are envelope-encrypted; everything
/// else is cleartext metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardEntry {
    pub id: String,
    pub item_name: String,
    pub folder: String,
    pub cardholder_name: String,
    /// Envelope string.
    pub card_number: String,
    pub brand: CardBrand,
    pub expiry_month: String,
    pub expiry_year: String,
    /// Envelope string.
    pub cvv: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default)]
    pub encryption_mode: DerivationMode,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Decrypted card secrets; only returned when every field decrypts.
#[derive(Debug, PartialEq, Eq)]
pub struct CardSecrets {
    pub card_number: String,
    pub cvv: String,
}

pub(crate) fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

pub(crate) fn new_record_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
