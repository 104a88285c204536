//! AES-256-CBC with PKCS#7 padding.
//!
//! Every call to [`encrypt`] draws a fresh 16 byte IV from the operating
//! system RNG. CBC carries no authentication tag, so a corrupted ciphertext
//! is only noticed when its final block happens to unpad badly.

use crate::*;
use aes::Aes256;
use cbc::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit, block_padding::Pkcs7};
use rand::{RngCore, rngs::OsRng};
use serde::{
    Deserialize, Deserializer, Serialize, Serializer,
    de::{Error as DError, MapAccess, SeqAccess, Visitor},
    ser::SerializeStruct,
};
use zeroize::Zeroizing;

type Aes256CbcEnc = cbc::Encryptor<Aes256>;
type Aes256CbcDec = cbc::Decryptor<Aes256>;

/// The output of a symmetric encryption.
#[derive(Clone, PartialEq, Eq)]
pub struct SymmetricResult {
    /// Initialization vector, unique per encryption
    iv: Vec<u8>,
    /// Padded ciphertext, a multiple of [`BLOCK_LEN`] long
    ciphertext: Vec<u8>,
    /// Only present when the key was generated by [`encrypt`]
    key: Option<Zeroizing<Vec<u8>>>,
}

impl std::fmt::Debug for SymmetricResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SymmetricResult")
            .field("iv", &hex::encode(&self.iv))
            .field("ciphertext", &hex::encode(&self.ciphertext))
            .field("key", &self.key.as_ref().map(|_| ".."))
            .finish()
    }
}

impl std::fmt::Display for SymmetricResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "SymmetricResult {{ iv: {}, ciphertext: {} }}",
            hex::encode(&self.iv),
            hex::encode(&self.ciphertext),
        )
    }
}

const FIELDS: &[&str] = &["iv", "ciphertext", "key"];

impl Serialize for SymmetricResult {
    fn serialize<S>(&self, s: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        if s.is_human_readable() {
            let len = if self.key.is_some() { 3 } else { 2 };
            let mut state = s.serialize_struct("SymmetricResult", len)?;
            state.serialize_field("iv", &util::encode_b64(&self.iv))?;
            state.serialize_field("ciphertext", &util::encode_b64(&self.ciphertext))?;
            match &self.key {
                Some(key) => {
                    let key = Zeroizing::new(util::encode_b64(key.as_slice()));
                    state.serialize_field("key", key.as_str())?
                }
                None => state.skip_field("key")?,
            }
            state.end()
        } else {
            let mut state = s.serialize_struct("SymmetricResult", 3)?;
            state.serialize_field("iv", &Bytes(&self.iv))?;
            state.serialize_field("ciphertext", &Bytes(&self.ciphertext))?;
            state.serialize_field("key", &self.key.as_ref().map(|k| Bytes(k.as_slice())))?;
            state.end()
        }
    }
}

/// Routes a borrowed slice through [`util::b64_or_bin`].
struct Bytes<'a>(&'a [u8]);

impl Serialize for Bytes<'_> {
    fn serialize<S>(&self, s: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        util::b64_or_bin::serialize(self.0, s)
    }
}

impl<'de> Deserialize<'de> for SymmetricResult {
    fn deserialize<D>(d: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        if d.is_human_readable() {
            struct SymmetricResultVisitor;

            impl<'de> Visitor<'de> for SymmetricResultVisitor {
                type Value = SymmetricResult;

                fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
                    write!(f, "a map representing a SymmetricResult")
                }

                fn visit_map<A>(self, mut map: A) -> std::result::Result<Self::Value, A::Error>
                where
                    A: MapAccess<'de>,
                {
                    let mut iv: Option<String> = None;
                    let mut ciphertext: Option<String> = None;
                    let mut key: Option<Zeroizing<String>> = None;

                    while let Some(field) = map.next_key::<String>()? {
                        match field.as_str() {
                            "iv" => {
                                if iv.is_some() {
                                    return Err(DError::duplicate_field("iv"));
                                }
                                iv = Some(map.next_value()?);
                            }
                            "ciphertext" => {
                                if ciphertext.is_some() {
                                    return Err(DError::duplicate_field("ciphertext"));
                                }
                                ciphertext = Some(map.next_value()?);
                            }
                            "key" => {
                                if key.is_some() {
                                    return Err(DError::duplicate_field("key"));
                                }
                                key = Some(Zeroizing::new(map.next_value()?));
                            }
                            _ => return Err(DError::unknown_field(&field, FIELDS)),
                        }
                    }

                    let iv = iv.ok_or_else(|| DError::missing_field("iv"))?;
                    let ciphertext = ciphertext.ok_or_else(|| DError::missing_field("ciphertext"))?;

                    let iv = util::decode_b64(&iv)
                        .map_err(|_| DError::custom("invalid base64 in iv"))?;
                    let ciphertext = util::decode_b64(&ciphertext)
                        .map_err(|_| DError::custom("invalid base64 in ciphertext"))?;
                    let key = key
                        .map(|k| util::decode_b64(&k).map(Zeroizing::new))
                        .transpose()
                        .map_err(|_| DError::custom("invalid base64 in key"))?;

                    Ok(SymmetricResult {
                        iv,
                        ciphertext,
                        key,
                    })
                }
            }
            d.deserialize_struct("SymmetricResult", FIELDS, SymmetricResultVisitor)
        } else {
            struct SymmetricResultVisitor;

            impl<'de> Visitor<'de> for SymmetricResultVisitor {
                type Value = SymmetricResult;

                fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
                    write!(f, "struct SymmetricResult")
                }

                fn visit_seq<A>(self, mut seq: A) -> std::result::Result<Self::Value, A::Error>
                where
                    A: SeqAccess<'de>,
                {
                    let iv: ByteBuf = seq
                        .next_element()?
                        .ok_or_else(|| DError::missing_field("iv"))?;
                    let ciphertext: ByteBuf = seq
                        .next_element()?
                        .ok_or_else(|| DError::missing_field("ciphertext"))?;
                    let key: Option<ByteBuf> = seq
                        .next_element()?
                        .ok_or_else(|| DError::missing_field("key"))?;

                    Ok(SymmetricResult {
                        iv: iv.0,
                        ciphertext: ciphertext.0,
                        key: key.map(|k| Zeroizing::new(k.0)),
                    })
                }
            }
            d.deserialize_struct("SymmetricResult", FIELDS, SymmetricResultVisitor)
        }
    }
}

struct ByteBuf(Vec<u8>);

impl<'de> Deserialize<'de> for ByteBuf {
    fn deserialize<D>(d: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        util::b64_or_bin::deserialize(d).map(ByteBuf)
    }
}

impl SymmetricResult {
    /// Assemble a result from its parts, e.g. an IV and ciphertext that were
    /// stored separately. Lengths are checked by [`decrypt`], not here.
    pub fn from_parts(iv: Vec<u8>, ciphertext: Vec<u8>, key: Option<Vec<u8>>) -> Self {
        Self {
            iv,
            ciphertext,
            key: key.map(Zeroizing::new),
        }
    }

    /// The initialization vector
    pub fn iv(&self) -> &[u8] {
        &self.iv
    }

    /// The padded ciphertext
    pub fn ciphertext(&self) -> &[u8] {
        &self.ciphertext
    }

    /// The generated key, if [`encrypt`] created one
    pub fn key(&self) -> Option<&[u8]> {
        self.key.as_ref().map(|k| k.as_slice())
    }

    /// A copy of this result with any embedded key removed
    pub fn without_key(&self) -> Self {
        Self {
            iv: self.iv.clone(),
            ciphertext: self.ciphertext.clone(),
            key: None,
        }
    }

    /// Decrypt this result. See [`decrypt`].
    pub fn decrypt(&self, key: Option<&[u8]>) -> Result<Vec<u8>> {
        decrypt(self, key)
    }
}

/// Generate a random 32 byte key.
pub fn generate_key() -> Zeroizing<[u8; KEY_LEN]> {
    let mut key = Zeroizing::new([0u8; KEY_LEN]);
    OsRng.fill_bytes(&mut key[..]);
    key
}

/// Encrypt `plaintext` under a fresh random IV.
///
/// With `key == None` a new key is generated and returned in
/// [`SymmetricResult::key`]. A supplied key must be exactly 32 bytes and is
/// never copied into the result.
pub fn encrypt<B: AsRef<[u8]>>(plaintext: B, key: Option<&[u8]>) -> Result<SymmetricResult> {
    let mut iv = [0u8; IV_LEN];
    OsRng.fill_bytes(&mut iv);
    match key {
        Some(key) => {
            let key = key_array(key)?;
            Ok(encrypt_with_iv(plaintext.as_ref(), key, iv))
        }
        None => {
            let key = generate_key();
            let mut result = encrypt_with_iv(plaintext.as_ref(), &key, iv);
            result.key = Some(Zeroizing::new(key.to_vec()));
            Ok(result)
        }
    }
}

pub(crate) fn encrypt_with_iv(
    plaintext: &[u8],
    key: &[u8; KEY_LEN],
    iv: [u8; IV_LEN],
) -> SymmetricResult {
    tracing::debug!(len = plaintext.len(), "aes-256-cbc encrypt");
    let ciphertext =
        Aes256CbcEnc::new(key.into(), (&iv).into()).encrypt_padded_vec_mut::<Pkcs7>(plaintext);
    SymmetricResult {
        iv: iv.to_vec(),
        ciphertext,
        key: None,
    }
}

/// Decrypt a [`SymmetricResult`].
///
/// An explicitly supplied `key` always takes precedence over a key embedded
/// in `result`.
pub fn decrypt(result: &SymmetricResult, key: Option<&[u8]>) -> Result<Vec<u8>> {
    let key = key.or_else(|| result.key()).ok_or(Error::KeyMissing)?;
    let key = key_array(key)?;
    let iv: &[u8; IV_LEN] = result
        .iv
        .as_slice()
        .try_into()
        .map_err(|_| Error::IvLengthInvalid(result.iv.len()))?;
    tracing::debug!(len = result.ciphertext.len(), "aes-256-cbc decrypt");
    Aes256CbcDec::new(key.into(), iv.into())
        .decrypt_padded_vec_mut::<Pkcs7>(&result.ciphertext)
        .map_err(|_| Error::PaddingInvalid)
}

/// Encrypt the UTF-8 bytes of `plaintext`.
pub fn encrypt_str(plaintext: &str, key: Option<&[u8]>) -> Result<SymmetricResult> {
    encrypt(plaintext.as_bytes(), key)
}

/// Decrypt a result that holds UTF-8 text.
pub fn decrypt_to_string(result: &SymmetricResult, key: Option<&[u8]>) -> Result<String> {
    Ok(String::from_utf8(decrypt(result, key)?)?)
}

fn key_array(key: &[u8]) -> Result<&[u8; KEY_LEN]> {
    key.try_into().map_err(|_| Error::KeyLengthInvalid(key.len()))
}
