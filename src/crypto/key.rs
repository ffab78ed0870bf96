use std::fmt;

use base64::{
    Engine as _, alphabet,
    engine::{GeneralPurpose, GeneralPurposeConfig},
};
use zeroize::{Zeroize, Zeroizing};

use super::{HALF_KEY_LEN, KEY_LEN, cipher::secure_random};
use crate::error::KeyStoreError;

/// Url-safe base64 with padding required. Non-zero trailing bits in the last
/// character are ignored on decode, as other Fernet implementations do.
const KEY_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new().with_decode_allow_trailing_bits(true),
);

/// The 32-byte secret shared by everyone allowed to read tokens.
///
/// The first half signs tokens, the second half encrypts them. Text form is
/// url-safe base64 with padding (44 characters).
pub struct SecretKey {
    signing: [u8; HALF_KEY_LEN],
    encryption: [u8; HALF_KEY_LEN],
}

impl Drop for SecretKey {
    fn drop(&mut self) {
        self.signing.zeroize();
        self.encryption.zeroize();
    }
}

impl fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecretKey(<redacted>)")
    }
}

impl SecretKey {
    /// Generate a key from the OS random generator.
    pub fn generate() -> Result<Self, KeyStoreError> {
        let mut bytes = Zeroizing::new([0u8; KEY_LEN]);
        secure_random(bytes.as_mut_slice()).map_err(|_| KeyStoreError::Rng)?;
        Ok(Self::from_bytes(*bytes))
    }

    pub fn from_bytes(mut bytes: [u8; KEY_LEN]) -> Self {
        let mut signing = [0u8; HALF_KEY_LEN];
        let mut encryption = [0u8; HALF_KEY_LEN];
        signing.copy_from_slice(&bytes[..HALF_KEY_LEN]);
        encryption.copy_from_slice(&bytes[HALF_KEY_LEN..]);
        bytes.zeroize();

        Self {
            signing,
            encryption,
        }
    }

    /// Parse the text form. Surrounding whitespace is ignored.
    ///
    /// # Errors
    ///
    /// Returns [`KeyStoreError::InvalidFormat`] if the text is not url-safe
    /// base64 or does not decode to exactly 32 bytes.
    pub fn from_base64(encoded: &str) -> Result<Self, KeyStoreError> {
        let decoded = Zeroizing::new(
            KEY_ENGINE
                .decode(encoded.trim())
                .map_err(|_| KeyStoreError::InvalidFormat("not url-safe base64".into()))?,
        );

        let bytes: [u8; KEY_LEN] = decoded.as_slice().try_into().map_err(|_| {
            KeyStoreError::InvalidFormat(format!(
                "decoded to {} bytes, expected {KEY_LEN}",
                decoded.len()
            ))
        })?;

        Ok(Self::from_bytes(bytes))
    }

    pub fn to_base64(&self) -> Zeroizing<String> {
        let mut bytes = Zeroizing::new([0u8; KEY_LEN]);
        bytes[..HALF_KEY_LEN].copy_from_slice(&self.signing);
        bytes[HALF_KEY_LEN..].copy_from_slice(&self.encryption);
        Zeroizing::new(KEY_ENGINE.encode(bytes.as_slice()))
    }

    pub(crate) fn signing_key(&self) -> &[u8; HALF_KEY_LEN] {
        &self.signing
    }

    pub(crate) fn encryption_key(&self) -> &[u8; HALF_KEY_LEN] {
        &self.encryption
    }
}
