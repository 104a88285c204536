//! Envelopes for payloads of any size: AES-256-CBC for the data, RSA for the
//! ephemeral key.

use crate::*;
use serde::{Deserialize, Deserializer, Serialize, de::Error as DError};
use zeroize::Zeroizing;

/// The envelope structure that holds the encrypted payload along with the
/// wrapped key needed to open it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HybridResult {
    /// The ephemeral symmetric key, encrypted to the recipient
    encrypted_key: AsymmetricResult,
    /// The data encrypted under the ephemeral key. Never carries the key.
    payload: SymmetricResult,
}

impl std::fmt::Display for HybridResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "HybridResult {{ encrypted_key: {}, payload: {} }}",
            hex::encode(self.encrypted_key.ciphertext()),
            self.payload,
        )
    }
}

impl<'de> Deserialize<'de> for HybridResult {
    fn deserialize<D>(d: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(rename = "HybridResult", deny_unknown_fields)]
        struct HybridResultHelper {
            encrypted_key: AsymmetricResult,
            payload: SymmetricResult,
        }

        let helper = HybridResultHelper::deserialize(d)?;
        if helper.payload.key().is_some() {
            return Err(DError::custom("payload must not carry a key"));
        }
        Ok(HybridResult {
            encrypted_key: helper.encrypted_key,
            payload: helper.payload,
        })
    }
}

impl HybridResult {
    /// Assemble an envelope from a wrapped key and a payload. Any key
    /// embedded in `payload` is dropped.
    pub fn from_parts(encrypted_key: AsymmetricResult, payload: SymmetricResult) -> Self {
        let payload = if payload.key().is_some() {
            payload.without_key()
        } else {
            payload
        };
        Self {
            encrypted_key,
            payload,
        }
    }

    /// The wrapped ephemeral key
    pub fn encrypted_key(&self) -> &AsymmetricResult {
        &self.encrypted_key
    }

    /// The symmetrically encrypted payload
    pub fn payload(&self) -> &SymmetricResult {
        &self.payload
    }

    /// Decrypt this envelope. See [`decrypt`].
    pub fn decrypt(&self, recipient_private_key: &PrivateKey) -> Result<Vec<u8>> {
        decrypt(self, recipient_private_key)
    }
}

/// Encrypt `data` of any size to the holder of `recipient_public_key`.
///
/// 1. Create a random 32 byte ephemeral key.
/// 2. Encrypt the data with the ephemeral key (AES-256-CBC).
/// 3. Encrypt the ephemeral key with the recipient's public key (RSA).
///
/// The ephemeral key only leaves this function in its wrapped form.
pub fn encrypt<B: AsRef<[u8]>>(data: B, recipient_public_key: &PublicKey) -> Result<HybridResult> {
    let data = data.as_ref();
    tracing::debug!(
        len = data.len(),
        size = %recipient_public_key.key_size(),
        "hybrid encrypt"
    );
    let ephemeral_key = symmetric::generate_key();
    let payload = symmetric::encrypt(data, Some(ephemeral_key.as_slice()))?;
    let encrypted_key = asymmetric::encrypt(ephemeral_key.as_slice(), recipient_public_key)?;
    Ok(HybridResult::from_parts(encrypted_key, payload))
}

/// Decrypt an envelope with the recipient's private key.
///
/// 1. Recover the ephemeral key, failing with [`Error::KeyRecoveryFailed`].
/// 2. Decrypt the payload, failing with [`Error::PayloadDecryptionFailed`].
pub fn decrypt(envelope: &HybridResult, recipient_private_key: &PrivateKey) -> Result<Vec<u8>> {
    tracing::debug!(len = envelope.payload.ciphertext().len(), "hybrid decrypt");
    let ephemeral_key = asymmetric::decrypt(&envelope.encrypted_key, recipient_private_key)
        .map(Zeroizing::new)
        .map_err(|_| {
            tracing::warn!("envelope key recovery failed");
            Error::KeyRecoveryFailed
        })?;
    if ephemeral_key.len() != KEY_LEN {
        tracing::warn!("envelope key recovery failed");
        return Err(Error::KeyRecoveryFailed);
    }
    symmetric::decrypt(&envelope.payload, Some(ephemeral_key.as_slice())).map_err(|e| {
        tracing::warn!(error = %e, "envelope payload decryption failed");
        Error::PayloadDecryptionFailed(Box::new(e))
    })
}

/// Encrypt the UTF-8 bytes of `data`.
pub fn encrypt_str(data: &str, recipient_public_key: &PublicKey) -> Result<HybridResult> {
    encrypt(data.as_bytes(), recipient_public_key)
}

/// Decrypt an envelope that holds UTF-8 text.
pub fn decrypt_to_string(
    envelope: &HybridResult,
    recipient_private_key: &PrivateKey,
) -> Result<String> {
    Ok(String::from_utf8(decrypt(envelope, recipient_private_key)?)?)
}
