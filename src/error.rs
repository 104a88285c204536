use thiserror::Error;

/// The error type for this crate.
#[derive(Debug, Error)]
pub enum Error {
    /// Malformed serialized structure. Never raised for tampered ciphertext.
    #[error("Format error: {0}")]
    Format(String),
    /// No key was supplied and none is embedded in the result
    #[error("No symmetric key supplied or embedded")]
    KeyMissing,
    /// Symmetric key is not 32 bytes
    #[error("Invalid symmetric key length {0}, expected 32")]
    KeyLengthInvalid(usize),
    /// Asymmetric modulus size outside the allowed set
    #[error("Unsupported key size {0} bits")]
    KeySizeUnsupported(usize),
    /// Initialization vector is not 16 bytes
    #[error("Invalid IV length {0}, expected 16")]
    IvLengthInvalid(usize),
    /// Recovered padding bytes are inconsistent
    #[error("Invalid padding")]
    PaddingInvalid,
    /// Plaintext exceeds what the asymmetric key can encrypt directly
    #[error("Plaintext too large: {actual} bytes, at most {max} allowed")]
    PlaintextTooLarge {
        /// The largest plaintext the key accepts
        max: usize,
        /// The length that was supplied
        actual: usize,
    },
    /// Asymmetric decryption failed
    #[error("Decryption failed")]
    DecryptionFailed,
    /// The wrapped symmetric key of an envelope could not be recovered
    #[error("Key recovery failed")]
    KeyRecoveryFailed,
    /// The envelope payload could not be decrypted with the recovered key
    #[error("Payload decryption failed: {0}")]
    PayloadDecryptionFailed(#[source] Box<Error>),
    /// Error from the RSA key generator
    #[error("Key generation failed")]
    KeyGeneration,
    /// Error from the RSA encryption primitive
    #[error("Encryption failed")]
    EncryptionFailed,
    /// Error from the RSA signing primitive
    #[error("Signing failed")]
    SigningFailed,
    /// Decrypted bytes are not valid UTF-8 text
    #[error("Decrypted data is not valid UTF-8")]
    InvalidUtf8,
    /// File adapter I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Format(e.to_string())
    }
}

impl From<base64::DecodeError> for Error {
    fn from(e: base64::DecodeError) -> Self {
        Error::Format(e.to_string())
    }
}

impl From<std::string::FromUtf8Error> for Error {
    fn from(_: std::string::FromUtf8Error) -> Self {
        Error::InvalidUtf8
    }
}

/// A specialized `Result` type for this crate.
pub type Result<T> = std::result::Result<T, Error>;
