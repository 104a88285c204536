use crate::{Error, PKCS1_V15_OVERHEAD};
use derive_more::Display;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// The RSA modulus sizes supported by this crate.
///
/// * `Rsa2048`: the default. Directly encrypts at most 245 bytes and is the
///   fastest to generate and use.
/// * `Rsa3072`: roughly 128-bit classical security. Directly encrypts at most
///   373 bytes.
/// * `Rsa4096`: the largest and slowest. Directly encrypts at most 501 bytes.
///
/// Hybrid envelopes only ever wrap a 32 byte symmetric key, so every size
/// works for payloads of any length.
#[derive(
    Copy,
    Clone,
    Debug,
    Default,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    rkyv::Archive,
    rkyv::Serialize,
    rkyv::Deserialize,
    Display,
)]
#[rkyv(compare(PartialEq), derive(Debug))]
pub enum KeySize {
    #[default]
    #[display("RSA-2048")]
    /// 2048-bit modulus
    Rsa2048,
    #[display("RSA-3072")]
    /// 3072-bit modulus
    Rsa3072,
    #[display("RSA-4096")]
    /// 4096-bit modulus
    Rsa4096,
}

impl Serialize for KeySize {
    fn serialize<S>(&self, s: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        if s.is_human_readable() {
            s.serialize_str(&self.to_string())
        } else {
            s.serialize_u16(self.bits())
        }
    }
}

impl<'de> Deserialize<'de> for KeySize {
    fn deserialize<D>(d: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        if d.is_human_readable() {
            let s = String::deserialize(d)?;
            s.parse().map_err(serde::de::Error::custom)
        } else {
            let bits = u16::deserialize(d)?;
            KeySize::from_bits(bits as usize).map_err(serde::de::Error::custom)
        }
    }
}

impl std::str::FromStr for KeySize {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bits = s
            .strip_prefix("RSA-")
            .unwrap_or(s)
            .parse::<usize>()
            .map_err(|_| Error::Format(format!("invalid key size `{s}`")))?;
        Self::from_bits(bits)
    }
}

impl KeySize {
    /// Every allowed size, smallest first.
    pub const ALL: [KeySize; 3] = [KeySize::Rsa2048, KeySize::Rsa3072, KeySize::Rsa4096];

    /// Look up a size from a bit length, failing with
    /// [`Error::KeySizeUnsupported`] for anything outside the allowed set.
    pub fn from_bits(bits: usize) -> crate::Result<Self> {
        Self::ALL
            .into_iter()
            .find(|size| size.bits() as usize == bits)
            .ok_or(Error::KeySizeUnsupported(bits))
    }

    /// The modulus length in bits
    pub const fn bits(&self) -> u16 {
        match self {
            Self::Rsa2048 => 2048,
            Self::Rsa3072 => 3072,
            Self::Rsa4096 => 4096,
        }
    }

    /// The modulus length in bytes, which is also the ciphertext and
    /// signature length
    pub const fn bytes(&self) -> usize {
        self.bits() as usize / 8
    }

    /// The largest plaintext PKCS#1 v1.5 encryption accepts under this size
    pub const fn max_plaintext_len(&self) -> usize {
        self.bytes() - PKCS1_V15_OVERHEAD
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rkyv::{access, deserialize, rancor::Error as RkyvError, to_bytes};
    use rstest::*;

    #[rstest]
    #[case::rsa2048(KeySize::Rsa2048, "RSA-2048")]
    #[case::rsa3072(KeySize::Rsa3072, "RSA-3072")]
    #[case::rsa4096(KeySize::Rsa4096, "RSA-4096")]
    fn serialization_human_readable(#[case] size: KeySize, #[case] value: &str) {
        let serialized = serde_json::to_string(&size).unwrap();
        assert_eq!(serialized, format!("\"{}\"", value));
        let deserialized: KeySize = serde_json::from_str(&serialized).unwrap();
        assert_eq!(size, deserialized);
    }

    #[rstest]
    #[case::rsa2048(KeySize::Rsa2048)]
    #[case::rsa3072(KeySize::Rsa3072)]
    #[case::rsa4096(KeySize::Rsa4096)]
    fn serialization_non_human_readable(#[case] size: KeySize) {
        let serialized = postcard::to_stdvec(&size).unwrap();
        let deserialized: KeySize = postcard::from_bytes(&serialized).unwrap();
        assert_eq!(size, deserialized);
    }

    #[rstest]
    #[case::rsa2048(KeySize::Rsa2048)]
    #[case::rsa3072(KeySize::Rsa3072)]
    #[case::rsa4096(KeySize::Rsa4096)]
    fn rkyv_tests(#[case] size: KeySize) {
        let serialized = to_bytes::<RkyvError>(&size).unwrap();
        let archive = access::<ArchivedKeySize, RkyvError>(&serialized[..]).unwrap();
        assert_eq!(archive, &size);
        let deserialized = deserialize::<KeySize, RkyvError>(archive).unwrap();
        assert_eq!(deserialized, size);
    }

    #[rstest]
    #[case(2048, 245)]
    #[case(3072, 373)]
    #[case(4096, 501)]
    fn max_plaintext(#[case] bits: usize, #[case] max: usize) {
        let size = KeySize::from_bits(bits).unwrap();
        assert_eq!(size.bits() as usize, bits);
        assert_eq!(size.max_plaintext_len(), max);
    }

    #[rstest]
    #[case(0)]
    #[case(1024)]
    #[case(2047)]
    #[case(8192)]
    #[case(1 << 20)]
    fn unsupported_sizes(#[case] bits: usize) {
        assert!(matches!(
            KeySize::from_bits(bits),
            Err(Error::KeySizeUnsupported(b)) if b == bits
        ));
    }

    #[test]
    fn all_sizes_ascending() {
        let bits: Vec<u16> = KeySize::ALL.iter().map(KeySize::bits).collect();
        assert_eq!(bits, vec![2048, 3072, 4096]);
        for size in KeySize::ALL {
            assert_eq!(KeySize::from_bits(size.bits() as usize).unwrap(), size);
        }
    }

    #[test]
    fn binary_rejects_unsupported_bits() {
        let serialized = postcard::to_stdvec(&1024u16).unwrap();
        assert!(postcard::from_bytes::<KeySize>(&serialized).is_err());
    }

    #[test]
    fn parse() {
        assert_eq!("RSA-3072".parse::<KeySize>().unwrap(), KeySize::Rsa3072);
        assert_eq!("4096".parse::<KeySize>().unwrap(), KeySize::Rsa4096);
        assert!(matches!(
            "RSA-1024".parse::<KeySize>(),
            Err(Error::KeySizeUnsupported(1024))
        ));
        assert!(matches!("big".parse::<KeySize>(), Err(Error::Format(_))));
        assert_eq!(KeySize::default(), KeySize::Rsa2048);
    }
}
