//! Text forms for every result type.
//!
//! The structured form is produced by a [`TextCodec`], JSON by default. Byte
//! fields are standard base64 under fixed field names in a fixed order.
//! Any structural defect while decoding is an [`Error::Format`], never a
//! decryption error.
//!
//! ```
//! use rsa_envelope::{StructuredText, asymmetric, hybrid, HybridResult};
//!
//! let key_pair = asymmetric::generate_key_pair(2048).unwrap();
//! let envelope = hybrid::encrypt(b"Hello World!", key_pair.public_key()).unwrap();
//!
//! let text = envelope.to_text().unwrap();
//! let restored = HybridResult::from_text(&text).unwrap();
//! assert_eq!(envelope, restored);
//! assert_eq!(b"Hello World!".to_vec(), restored.decrypt(key_pair.private_key()).unwrap());
//! ```

use crate::*;
use serde::{Serialize, de::DeserializeOwned};

/// A reversible mapping between values and text.
pub trait TextCodec {
    /// Encode `value` as text
    fn encode<T: Serialize + ?Sized>(&self, value: &T) -> Result<String>;
    /// Decode text back into a value, failing with [`Error::Format`]
    fn decode<T: DeserializeOwned>(&self, text: &str) -> Result<T>;
}

/// JSON text through `serde_json`.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct JsonCodec {
    /// Indent the output across multiple lines
    pub pretty: bool,
}

impl JsonCodec {
    /// Single line output
    pub const fn compact() -> Self {
        Self { pretty: false }
    }

    /// Indented multi-line output
    pub const fn pretty() -> Self {
        Self { pretty: true }
    }
}

impl TextCodec for JsonCodec {
    fn encode<T: Serialize + ?Sized>(&self, value: &T) -> Result<String> {
        let text = if self.pretty {
            serde_json::to_string_pretty(value)?
        } else {
            serde_json::to_string(value)?
        };
        Ok(text)
    }

    fn decode<T: DeserializeOwned>(&self, text: &str) -> Result<T> {
        Ok(serde_json::from_str(text)?)
    }
}

/// Types with a structured text form.
pub trait StructuredText: Serialize + DeserializeOwned {
    /// Encode with the default [`JsonCodec`]
    fn to_text(&self) -> Result<String> {
        self.to_text_with(&JsonCodec::default())
    }

    /// Decode with the default [`JsonCodec`]
    fn from_text(text: &str) -> Result<Self> {
        Self::from_text_with(&JsonCodec::default(), text)
    }

    /// Encode with a specific codec
    fn to_text_with<C: TextCodec>(&self, codec: &C) -> Result<String> {
        codec.encode(self)
    }

    /// Decode with a specific codec
    fn from_text_with<C: TextCodec>(codec: &C, text: &str) -> Result<Self> {
        codec.decode(text)
    }
}

impl StructuredText for SymmetricResult {}
impl StructuredText for AsymmetricResult {}
impl StructuredText for SignatureResult {}
impl StructuredText for HybridResult {}
impl StructuredText for KeyPair {}

/// Types whose only content is a single byte sequence, written as bare
/// base64 with no field structure.
pub trait CompactText: Sized {
    /// Encode as base64
    fn to_compact(&self) -> String;
    /// Decode base64, failing with [`Error::Format`]
    fn from_compact(text: &str) -> Result<Self>;
}

impl CompactText for AsymmetricResult {
    fn to_compact(&self) -> String {
        util::encode_b64(self.ciphertext())
    }

    fn from_compact(text: &str) -> Result<Self> {
        let ciphertext = util::decode_b64(text)?;
        if ciphertext.is_empty() {
            return Err(Error::Format("empty ciphertext".to_string()));
        }
        Ok(AsymmetricResult::from_ciphertext(ciphertext))
    }
}

/// Encode any result in its structured text form.
pub fn to_text<T: StructuredText>(value: &T) -> Result<String> {
    value.to_text()
}

/// Decode any result from its structured text form.
pub fn from_text<T: StructuredText>(text: &str) -> Result<T> {
    T::from_text(text)
}
