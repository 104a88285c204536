//! Symmetric, asymmetric and hybrid encryption envelopes
//!
//! Every operation is a stateless function that returns a structured result
//! rather than a concatenated byte blob. Each result type is consumed by the
//! matching decrypt or verify call and can be turned into text and back.
//!
//! * [`symmetric`]: AES-256-CBC with PKCS#7 padding and a fresh random IV per
//!   call. Produces a [`SymmetricResult`].
//! * [`asymmetric`]: RSA key pairs, PKCS#1 v1.5 encryption of short messages
//!   and PKCS#1 v1.5 signatures over SHA-256. Produces an [`AsymmetricResult`]
//!   or a [`SignatureResult`].
//! * [`hybrid`]: encrypts payloads of any size for an RSA public key.
//!   Produces a [`HybridResult`].
//! * [`codec`]: structured text (JSON, base64 byte fields) for every result,
//!   plus a compact base64 form for [`AsymmetricResult`].
//! * [`file`]: whole-file adapters that write atomically.
//!
//! The hybrid scheme works as follows:
//!
//! 1. Create a random 32 byte ephemeral key.
//! 2. Encrypt the payload with the ephemeral key and a random IV.
//! 3. Encrypt the ephemeral key with the recipient's RSA public key.
//! 4. The envelope is the wrapped key plus the IV and payload ciphertext.
//!    The ephemeral key itself never appears in it.
//!
//! Decryption reverses this: the private key recovers the ephemeral key,
//! which then decrypts the payload. A failure in the first step is a
//! [`Error::KeyRecoveryFailed`], in the second a
//! [`Error::PayloadDecryptionFailed`].
//!
//! Direct RSA encryption is limited to `key size in bytes - 11` bytes:
//!
//! | Key size | Max direct plaintext | Wrapped key / signature |
//! | -------- | -------------------- | ----------------------- |
//! | 2048 | 245 | 256 |
//! | 3072 | 373 | 384 |
//! | 4096 | 501 | 512 |
//!
//! CBC mode provides confidentiality only. A modified payload is not
//! reliably detected; sign the envelope text with [`asymmetric::sign`] when
//! integrity matters.
//!
//! # Usage
//! ```
//! use rsa_envelope::{StructuredText, HybridResult, asymmetric, hybrid, symmetric};
//!
//! let key_pair = asymmetric::generate_key_pair(2048).unwrap();
//! let plaintext = vec![7u8; 1 << 16];
//!
//! // Too large for RSA on its own
//! assert!(asymmetric::encrypt(&plaintext, key_pair.public_key()).is_err());
//!
//! let envelope = hybrid::encrypt(&plaintext, key_pair.public_key()).unwrap();
//! let text = envelope.to_text().unwrap();
//!
//! let received = HybridResult::from_text(&text).unwrap();
//! assert_eq!(plaintext, hybrid::decrypt(&received, key_pair.private_key()).unwrap());
//!
//! // Symmetric only, with a generated key returned alongside the ciphertext
//! let sealed = symmetric::encrypt(b"hello world", None).unwrap();
//! let key = sealed.key().unwrap().to_vec();
//! assert_eq!(b"hello world".to_vec(), symmetric::decrypt(&sealed, Some(key.as_slice())).unwrap());
//!
//! let signed = asymmetric::sign(b"transfer:100", key_pair.private_key()).unwrap();
//! assert!(asymmetric::verify(&signed, key_pair.public_key()));
//! ```
//!
//! All results implement [`serde::Serialize`] and [`serde::Deserialize`].
//! Human readable formats get base64 strings, binary formats get raw bytes.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(
    missing_docs,
    missing_debug_implementations,
    missing_copy_implementations,
    trivial_casts,
    trivial_numeric_casts,
    unused,
    clippy::mod_module_files
)]
#![deny(clippy::unwrap_used)]

pub mod asymmetric;
pub mod codec;
mod error;
pub mod file;
pub mod hybrid;
mod key_size;
mod keys;
pub mod symmetric;
mod util;

/// The symmetric key length in bytes
pub const KEY_LEN: usize = 32;
/// The initialization vector length in bytes
pub const IV_LEN: usize = 16;
/// The AES block length in bytes
pub const BLOCK_LEN: usize = 16;
/// The bytes PKCS#1 v1.5 encryption padding takes out of the modulus
pub const PKCS1_V15_OVERHEAD: usize = 11;

pub use asymmetric::{AsymmetricResult, SignatureResult};
pub use codec::{CompactText, JsonCodec, StructuredText, TextCodec};
pub use error::{Error, Result};
pub use hybrid::HybridResult;
pub use key_size::KeySize;
pub use keys::{KeyPair, PrivateKey, PublicKey};
pub use symmetric::SymmetricResult;
