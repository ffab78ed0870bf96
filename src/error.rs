use std::io;
use std::path::PathBuf;

/// Faults raised while loading, validating or persisting the secret key.
///
/// `ReadFailed` and `InvalidFormat` are recoverable: [`crate::KeyStore::load_or_create`]
/// reports them through [`crate::KeySource::Regenerated`] and carries on with a fresh key.
#[derive(Debug, thiserror::Error)]
pub enum KeyStoreError {
    #[error("could not read key file '{}'", .path.display())]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid key: {0}")]
    InvalidFormat(String),

    #[error("failed to save generated key to '{}'", .path.display())]
    PersistFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("key file '{}' already exists", .0.display())]
    AlreadyExists(PathBuf),

    #[error("OS random generator unavailable")]
    Rng,
}

impl KeyStoreError {
    /// Whether startup can continue by generating a new key.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::ReadFailed { .. } | Self::InvalidFormat(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum EncryptError {
    #[error("OS random generator unavailable")]
    Rng,
}

impl EncryptError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Rng => "rng_unavailable",
        }
    }
}

/// Reasons a token was rejected.
///
/// `InvalidSignature` covers a wrong key and a tampered token alike.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum DecryptError {
    #[error("token is not valid url-safe base64 or is too short")]
    MalformedEncoding,

    #[error("invalid or corrupted token, or wrong key")]
    InvalidSignature,

    #[error("unsupported token version")]
    UnsupportedVersion,

    #[error("invalid padding in decrypted message")]
    InvalidPadding,

    #[error("token has expired")]
    Expired,

    #[error("decrypted message is not valid UTF-8")]
    NotUtf8,
}

impl DecryptError {
    /// Stable machine-readable name, used in JSON output.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MalformedEncoding => "malformed_encoding",
            Self::InvalidSignature => "invalid_signature",
            Self::UnsupportedVersion => "unsupported_version",
            Self::InvalidPadding => "invalid_padding",
            Self::Expired => "expired",
            Self::NotUtf8 => "not_utf8",
        }
    }
}
