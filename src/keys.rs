use crate::{Error, KeySize, Result, util::*};
use rsa::{
    RsaPrivateKey, RsaPublicKey,
    pkcs8::{DecodePrivateKey, DecodePublicKey, EncodePrivateKey, EncodePublicKey, LineEnding},
};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::{
    fmt::{self, Debug, Display, Formatter},
    ops::Deref,
};
use zeroize::Zeroizing;

macro_rules! serde_impl {
    ($name:ident, $err:expr) => {
        impl Serialize for $name {
            fn serialize<S>(&self, s: S) -> std::result::Result<S::Ok, S::Error>
            where
                S: Serializer,
            {
                if s.is_human_readable() {
                    let pem = self.to_pem().map_err(serde::ser::Error::custom)?;
                    s.serialize_str(&pem)
                } else {
                    let der = self.to_der().map_err(serde::ser::Error::custom)?;
                    s.serialize_bytes(&der)
                }
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D>(d: D) -> std::result::Result<Self, D::Error>
            where
                D: Deserializer<'de>,
            {
                if d.is_human_readable() {
                    let pem = Zeroizing::new(String::deserialize(d)?);
                    Self::from_pem(&pem).map_err(|e| serde::de::Error::custom(format!("{}: {}", $err, e)))
                } else {
                    let der = Zeroizing::new(d.deserialize_byte_buf(BytesVisitor)?);
                    Self::from_der(&der).map_err(|e| serde::de::Error::custom(format!("{}: {}", $err, e)))
                }
            }
        }
    };
}

/// A public encryption and verification key
#[derive(Clone, Eq, PartialEq)]
#[repr(transparent)]
pub struct PublicKey(RsaPublicKey);

impl AsRef<RsaPublicKey> for PublicKey {
    fn as_ref(&self) -> &RsaPublicKey {
        &self.0
    }
}

impl Deref for PublicKey {
    type Target = RsaPublicKey;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl Debug for PublicKey {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        let der = self.to_der().map_err(|_| fmt::Error)?;
        write!(f, "{} {{ {} }}", self.key_size(), hex::encode(der))
    }
}

impl Display for PublicKey {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        let pem = self.to_pem().map_err(|_| fmt::Error)?;
        f.write_str(&pem)
    }
}

impl TryFrom<RsaPublicKey> for PublicKey {
    type Error = Error;

    fn try_from(pk: RsaPublicKey) -> Result<Self> {
        key_size_from_modulus(&pk)?;
        Ok(PublicKey(pk))
    }
}

serde_impl!(PublicKey, "invalid public key");

impl PublicKey {
    /// Parse a `PUBLIC KEY` (SubjectPublicKeyInfo) PEM block
    pub fn from_pem(pem: &str) -> Result<Self> {
        let pk = RsaPublicKey::from_public_key_pem(pem.trim())
            .map_err(|e| Error::Format(format!("public key PEM: {}", e)))?;
        Self::try_from(pk)
    }

    /// Parse DER encoded SubjectPublicKeyInfo
    pub fn from_der(der: &[u8]) -> Result<Self> {
        let pk = RsaPublicKey::from_public_key_der(der)
            .map_err(|e| Error::Format(format!("public key DER: {}", e)))?;
        Self::try_from(pk)
    }

    /// Encode as a `PUBLIC KEY` PEM block
    pub fn to_pem(&self) -> Result<String> {
        self.0
            .to_public_key_pem(LineEnding::LF)
            .map_err(|e| Error::Format(e.to_string()))
    }

    /// Encode as DER
    pub fn to_der(&self) -> Result<Vec<u8>> {
        self.0
            .to_public_key_der()
            .map(|doc| doc.as_bytes().to_vec())
            .map_err(|e| Error::Format(e.to_string()))
    }

    /// The modulus size of this key
    pub fn key_size(&self) -> KeySize {
        // Construction rejects any other size
        key_size_from_modulus(&self.0).unwrap_or_default()
    }
}

/// A private decryption and signing key
///
/// The underlying key material is zeroized on drop.
#[derive(Clone, Eq, PartialEq)]
#[repr(transparent)]
pub struct PrivateKey(RsaPrivateKey);

impl AsRef<RsaPrivateKey> for PrivateKey {
    fn as_ref(&self) -> &RsaPrivateKey {
        &self.0
    }
}

impl Deref for PrivateKey {
    type Target = RsaPrivateKey;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl Debug for PrivateKey {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{} {{ .. }}", self.key_size())
    }
}

impl TryFrom<RsaPrivateKey> for PrivateKey {
    type Error = Error;

    fn try_from(sk: RsaPrivateKey) -> Result<Self> {
        key_size_from_modulus(&sk)?;
        Ok(PrivateKey(sk))
    }
}

serde_impl!(PrivateKey, "invalid private key");

impl PrivateKey {
    /// Parse a PKCS#8 `PRIVATE KEY` PEM block
    pub fn from_pem(pem: &str) -> Result<Self> {
        let sk = RsaPrivateKey::from_pkcs8_pem(pem.trim())
            .map_err(|e| Error::Format(format!("private key PEM: {}", e)))?;
        Self::try_from(sk)
    }

    /// Parse DER encoded PKCS#8
    pub fn from_der(der: &[u8]) -> Result<Self> {
        let sk = RsaPrivateKey::from_pkcs8_der(der)
            .map_err(|e| Error::Format(format!("private key DER: {}", e)))?;
        Self::try_from(sk)
    }

    /// Encode as a PKCS#8 `PRIVATE KEY` PEM block
    pub fn to_pem(&self) -> Result<Zeroizing<String>> {
        self.0
            .to_pkcs8_pem(LineEnding::LF)
            .map_err(|e| Error::Format(e.to_string()))
    }

    /// Encode as PKCS#8 DER
    pub fn to_der(&self) -> Result<Zeroizing<Vec<u8>>> {
        self.0
            .to_pkcs8_der()
            .map(|doc| Zeroizing::new(doc.as_bytes().to_vec()))
            .map_err(|e| Error::Format(e.to_string()))
    }

    /// The public half of this key
    pub fn public_key(&self) -> PublicKey {
        PublicKey(self.0.to_public_key())
    }

    /// The modulus size of this key
    pub fn key_size(&self) -> KeySize {
        key_size_from_modulus(&self.0).unwrap_or_default()
    }
}

/// A matching public/private key pair.
///
/// Only [`crate::asymmetric::generate_key_pair`] creates one.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct KeyPair {
    pub(crate) public_key: PublicKey,
    pub(crate) private_key: PrivateKey,
}

impl<'de> Deserialize<'de> for KeyPair {
    fn deserialize<D>(d: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(rename = "KeyPair", deny_unknown_fields)]
        struct KeyPairHelper {
            public_key: PublicKey,
            private_key: PrivateKey,
        }

        let helper = KeyPairHelper::deserialize(d)?;
        if helper.private_key.public_key() != helper.public_key {
            return Err(serde::de::Error::custom(
                "public key does not belong to the private key",
            ));
        }
        Ok(KeyPair {
            public_key: helper.public_key,
            private_key: helper.private_key,
        })
    }
}

impl KeyPair {
    /// The public key, to hand to senders
    pub fn public_key(&self) -> &PublicKey {
        &self.public_key
    }

    /// The private key, to keep secret
    pub fn private_key(&self) -> &PrivateKey {
        &self.private_key
    }

    /// Split into the public and private key
    pub fn into_parts(self) -> (PublicKey, PrivateKey) {
        (self.public_key, self.private_key)
    }

    /// The modulus size shared by both keys
    pub fn key_size(&self) -> KeySize {
        self.public_key.key_size()
    }
}
