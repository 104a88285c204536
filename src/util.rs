use crate::*;
use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use rsa::traits::PublicKeyParts;
use serde::{
    Deserialize, Deserializer, Serializer,
    de::{Error as DError, SeqAccess, Visitor},
};

pub fn key_size_from_modulus<K: PublicKeyParts>(key: &K) -> Result<KeySize> {
    KeySize::from_bits(key.size() * 8)
}

pub fn encode_b64<B: AsRef<[u8]>>(bytes: B) -> String {
    BASE64.encode(bytes)
}

pub fn decode_b64(text: &str) -> Result<Vec<u8>> {
    Ok(BASE64.decode(text.trim())?)
}

/// Base64 text for human readable formats, raw bytes otherwise.
pub mod b64_or_bin {
    use super::*;

    pub fn serialize<T, S>(bytes: &T, s: S) -> std::result::Result<S::Ok, S::Error>
    where
        T: AsRef<[u8]> + ?Sized,
        S: Serializer,
    {
        if s.is_human_readable() {
            s.serialize_str(&encode_b64(bytes.as_ref()))
        } else {
            s.serialize_bytes(bytes.as_ref())
        }
    }

    pub fn deserialize<'de, D>(d: D) -> std::result::Result<Vec<u8>, D::Error>
    where
        D: Deserializer<'de>,
    {
        if d.is_human_readable() {
            let text = String::deserialize(d)?;
            decode_b64(&text).map_err(DError::custom)
        } else {
            d.deserialize_byte_buf(BytesVisitor)
        }
    }
}

pub struct BytesVisitor;

impl<'de> Visitor<'de> for BytesVisitor {
    type Value = Vec<u8>;

    fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "a byte sequence")
    }

    fn visit_bytes<E: DError>(self, v: &[u8]) -> std::result::Result<Self::Value, E> {
        Ok(v.to_vec())
    }

    fn visit_byte_buf<E: DError>(self, v: Vec<u8>) -> std::result::Result<Self::Value, E> {
        Ok(v)
    }

    fn visit_seq<A>(self, mut seq: A) -> std::result::Result<Self::Value, A::Error>
    where
        A: SeqAccess<'de>,
    {
        let mut out = Vec::with_capacity(seq.size_hint().unwrap_or(0));
        while let Some(b) = seq.next_element::<u8>()? {
            out.push(b);
        }
        Ok(out)
    }
}
