use crate::crypto::{IV_LEN, TIMESTAMP_LEN, VER_LEN, VERSION};
use crate::error::DecryptError;

/// The fixed-width prefix of every token.
///
/// ```text
/// VERSION (1) | TIMESTAMP (8, big-endian) | IV (16)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenHeader {
    version: u8,
    timestamp: u64,
    iv: [u8; IV_LEN],
}

impl TokenHeader {
    pub const LEN: usize = VER_LEN + TIMESTAMP_LEN + IV_LEN;

    pub fn new(timestamp: u64, iv: [u8; IV_LEN]) -> Self {
        Self {
            version: VERSION,
            timestamp,
            iv,
        }
    }

    /// Unix seconds at encryption time.
    pub fn timestamp(&self) -> u64 {
        self.timestamp
    }

    pub fn iv(&self) -> &[u8; IV_LEN] {
        &self.iv
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(Self::LEN);

        buf.push(self.version);
        buf.extend_from_slice(&self.timestamp.to_be_bytes());
        buf.extend_from_slice(&self.iv);

        buf
    }

    /// Parse a header from the start of `data`.
    ///
    /// Only call this on bytes whose signature has been verified: the version
    /// check reports [`DecryptError::UnsupportedVersion`], which must not be
    /// observable for forged tokens.
    pub fn from_bytes(data: &[u8]) -> Result<Self, DecryptError> {
        if data.len() < Self::LEN {
            return Err(DecryptError::MalformedEncoding);
        }

        let version = data[0];
        if version != VERSION {
            return Err(DecryptError::UnsupportedVersion);
        }

        let mut offset = VER_LEN;
        let timestamp = u64::from_be_bytes(
            data[offset..offset + TIMESTAMP_LEN]
                .try_into()
                .map_err(|_| DecryptError::MalformedEncoding)?,
        );
        offset += TIMESTAMP_LEN;

        let iv: [u8; IV_LEN] = data[offset..offset + IV_LEN]
            .try_into()
            .map_err(|_| DecryptError::MalformedEncoding)?;

        Ok(Self {
            version,
            timestamp,
            iv,
        })
    }
}
