//! RSA with PKCS#1 v1.5 padding for encryption and SHA-256 signatures.

use crate::*;
use rand::rngs::OsRng;
use rsa::{Pkcs1v15Encrypt, Pkcs1v15Sign, RsaPrivateKey, traits::PublicKeyParts};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// The output of a direct asymmetric encryption.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AsymmetricResult {
    /// As long as the modulus of the recipient key
    #[serde(with = "util::b64_or_bin")]
    ciphertext: Vec<u8>,
}

impl std::fmt::Display for AsymmetricResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "AsymmetricResult {{ ciphertext: {} }}",
            hex::encode(&self.ciphertext)
        )
    }
}

impl AsymmetricResult {
    /// Wrap a ciphertext received out of band
    pub fn from_ciphertext(ciphertext: Vec<u8>) -> Self {
        Self { ciphertext }
    }

    /// The encrypted bytes
    pub fn ciphertext(&self) -> &[u8] {
        &self.ciphertext
    }

    /// Decrypt this result. See [`decrypt`].
    pub fn decrypt(&self, private_key: &PrivateKey) -> Result<Vec<u8>> {
        decrypt(self, private_key)
    }
}

/// A message together with its signature.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SignatureResult {
    /// The signed message
    #[serde(with = "util::b64_or_bin")]
    data: Vec<u8>,
    /// PKCS#1 v1.5 signature over the SHA-256 digest of `data`
    #[serde(with = "util::b64_or_bin")]
    signature: Vec<u8>,
}

impl std::fmt::Display for SignatureResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "SignatureResult {{ data: {}, signature: {} }}",
            hex::encode(&self.data),
            hex::encode(&self.signature)
        )
    }
}

impl SignatureResult {
    /// Pair a message with a signature received out of band
    pub fn from_parts(data: Vec<u8>, signature: Vec<u8>) -> Self {
        Self { data, signature }
    }

    /// The signed message
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// The signature bytes
    pub fn signature(&self) -> &[u8] {
        &self.signature
    }

    /// Check the signature. See [`verify`].
    pub fn verify(&self, public_key: &PublicKey) -> bool {
        verify(self, public_key)
    }
}

/// Generate a new key pair with a modulus of `bit_length` bits.
///
/// Only the sizes in [`KeySize`] are accepted; anything else fails with
/// [`Error::KeySizeUnsupported`] before any key material is generated.
pub fn generate_key_pair(bit_length: usize) -> Result<KeyPair> {
    generate_key_pair_with_size(KeySize::from_bits(bit_length)?)
}

/// Generate a new key pair of the given size.
pub fn generate_key_pair_with_size(size: KeySize) -> Result<KeyPair> {
    tracing::debug!(%size, "generating key pair");
    let sk = RsaPrivateKey::new(&mut OsRng, size.bits() as usize).map_err(|e| {
        tracing::warn!(error = %e, "rsa key generation failed");
        Error::KeyGeneration
    })?;
    let private_key = PrivateKey::try_from(sk)?;
    Ok(KeyPair {
        public_key: private_key.public_key(),
        private_key,
    })
}

/// Encrypt a short message directly under `public_key`.
///
/// At most `key size in bytes - 11` bytes are accepted; longer input fails
/// with [`Error::PlaintextTooLarge`] without touching the cipher. Use
/// [`crate::hybrid::encrypt`] for anything bigger.
pub fn encrypt<B: AsRef<[u8]>>(plaintext: B, public_key: &PublicKey) -> Result<AsymmetricResult> {
    let plaintext = plaintext.as_ref();
    let max = max_plaintext_len(public_key);
    if plaintext.len() > max {
        return Err(Error::PlaintextTooLarge {
            max,
            actual: plaintext.len(),
        });
    }
    tracing::debug!(len = plaintext.len(), size = %public_key.key_size(), "rsa encrypt");
    let ciphertext = public_key
        .as_ref()
        .encrypt(&mut OsRng, Pkcs1v15Encrypt, plaintext)
        .map_err(|_| Error::EncryptionFailed)?;
    Ok(AsymmetricResult { ciphertext })
}

/// Decrypt a result produced by [`encrypt`].
///
/// Every failure, whether bad padding, a wrong key or a ciphertext of the
/// wrong length, is reported as the same [`Error::DecryptionFailed`].
pub fn decrypt(result: &AsymmetricResult, private_key: &PrivateKey) -> Result<Vec<u8>> {
    tracing::debug!(len = result.ciphertext.len(), "rsa decrypt");
    private_key
        .as_ref()
        .decrypt_blinded(&mut OsRng, Pkcs1v15Encrypt, &result.ciphertext)
        .map_err(|_| Error::DecryptionFailed)
}

/// Sign the SHA-256 digest of `data`.
pub fn sign<B: AsRef<[u8]>>(data: B, private_key: &PrivateKey) -> Result<SignatureResult> {
    let data = data.as_ref();
    let digest = Sha256::digest(data);
    tracing::debug!(len = data.len(), size = %private_key.key_size(), "rsa sign");
    let signature = private_key
        .as_ref()
        .sign_with_rng(&mut OsRng, Pkcs1v15Sign::new::<Sha256>(), &digest)
        .map_err(|_| Error::SigningFailed)?;
    Ok(SignatureResult {
        data: data.to_vec(),
        signature,
    })
}

/// Check `result.signature` against the SHA-256 digest of `result.data`.
///
/// Never errors: a mismatched, truncated or otherwise malformed signature is
/// simply `false`.
pub fn verify(result: &SignatureResult, public_key: &PublicKey) -> bool {
    let digest = Sha256::digest(&result.data);
    let valid = public_key
        .as_ref()
        .verify(Pkcs1v15Sign::new::<Sha256>(), &digest, &result.signature)
        .is_ok();
    tracing::debug!(valid, "rsa verify");
    valid
}

/// Encrypt the UTF-8 bytes of `plaintext`.
pub fn encrypt_str(plaintext: &str, public_key: &PublicKey) -> Result<AsymmetricResult> {
    encrypt(plaintext.as_bytes(), public_key)
}

/// Decrypt a result that holds UTF-8 text.
pub fn decrypt_to_string(result: &AsymmetricResult, private_key: &PrivateKey) -> Result<String> {
    Ok(String::from_utf8(decrypt(result, private_key)?)?)
}

/// Sign the UTF-8 bytes of `data`.
pub fn sign_str(data: &str, private_key: &PrivateKey) -> Result<SignatureResult> {
    sign(data.as_bytes(), private_key)
}

/// The largest plaintext [`encrypt`] accepts for `public_key`.
pub fn max_plaintext_len(public_key: &PublicKey) -> usize {
    public_key.as_ref().size().saturating_sub(PKCS1_V15_OVERHEAD)
}
