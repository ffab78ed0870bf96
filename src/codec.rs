//! Authenticated token encoding and decoding.
//!
//! Token layout before base64url encoding:
//! ```text
//! VERSION (1) | TIMESTAMP (8) | IV (16) | CIPHERTEXT (16 * n) | HMAC (32)
//! ```
//! The HMAC covers everything before it and is keyed with the signing half
//! of the [`SecretKey`]; AES-128-CBC uses the encrypting half.

use std::fmt;

use base64::{Engine as _, engine::general_purpose::URL_SAFE};
use chrono::Utc;

use crate::crypto::{
    BLOCK_LEN, HMAC_LEN, IV_LEN, MAX_CLOCK_SKEW, MIN_TOKEN_LEN, SecretKey, TokenHeader, cipher, mac,
};
use crate::error::{DecryptError, EncryptError};

/// An encrypted message in its url-safe base64 text form.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Token(String);

impl Token {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for Token {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for Token {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// Encrypts and decrypts tokens with one borrowed key.
///
/// Tokens are accepted regardless of age unless a maximum age is set with
/// [`TokenCodec::with_max_age`].
#[derive(Debug, Clone, Copy)]
pub struct TokenCodec<'k> {
    key: &'k SecretKey,
    max_age: Option<u64>,
}

impl<'k> TokenCodec<'k> {
    pub fn new(key: &'k SecretKey) -> Self {
        Self { key, max_age: None }
    }

    /// Reject tokens older than `max_age` seconds, or dated more than
    /// [`MAX_CLOCK_SKEW`] seconds in the future.
    pub fn with_max_age(mut self, max_age: Option<u64>) -> Self {
        self.max_age = max_age;
        self
    }

    pub fn max_age(&self) -> Option<u64> {
        self.max_age
    }

    pub fn encrypt(&self, plaintext: &[u8]) -> Result<Token, EncryptError> {
        self.encrypt_at_time(plaintext, unix_now())
    }

    /// Encrypt with an explicit timestamp instead of the current time.
    pub fn encrypt_at_time(&self, plaintext: &[u8], timestamp: u64) -> Result<Token, EncryptError> {
        let iv = cipher::generate_iv().map_err(|_| EncryptError::Rng)?;
        Ok(self.encrypt_with_iv(plaintext, timestamp, &iv))
    }

    pub(crate) fn encrypt_with_iv(
        &self,
        plaintext: &[u8],
        timestamp: u64,
        iv: &[u8; IV_LEN],
    ) -> Token {
        let ciphertext = cipher::encrypt(self.key.encryption_key(), iv, plaintext);

        let mut data = TokenHeader::new(timestamp, *iv).to_bytes();
        data.reserve(ciphertext.len() + HMAC_LEN);
        data.extend_from_slice(&ciphertext);

        let tag = mac::sign(self.key.signing_key(), &data);
        data.extend_from_slice(&tag);

        Token(URL_SAFE.encode(data))
    }

    pub fn decrypt(&self, token: &Token) -> Result<Vec<u8>, DecryptError> {
        self.decrypt_at_time(token, unix_now())
    }

    /// Decrypt a token holding UTF-8 text.
    pub fn decrypt_str(&self, token: &Token) -> Result<String, DecryptError> {
        let plaintext = self.decrypt(token)?;
        String::from_utf8(plaintext).map_err(|_| DecryptError::NotUtf8)
    }

    /// Decrypt as if the current time were `now` (Unix seconds).
    pub fn decrypt_at_time(&self, token: &Token, now: u64) -> Result<Vec<u8>, DecryptError> {
        let data = decode(token)?;
        let (header, ciphertext) = self.verify(&data)?;
        self.check_age(header.timestamp(), now)?;

        cipher::decrypt(self.key.encryption_key(), header.iv(), ciphertext)
    }

    /// Unix seconds embedded in an authentic token. No age check is applied.
    pub fn extract_timestamp(&self, token: &Token) -> Result<u64, DecryptError> {
        let data = decode(token)?;
        let (header, _) = self.verify(&data)?;
        Ok(header.timestamp())
    }

    /// Check the tag, then the version; nothing else is read before the tag matches.
    fn verify<'d>(&self, data: &'d [u8]) -> Result<(TokenHeader, &'d [u8]), DecryptError> {
        let (signed, tag) = data.split_at(data.len() - HMAC_LEN);

        if !mac::verify(self.key.signing_key(), signed, tag) {
            return Err(DecryptError::InvalidSignature);
        }

        let header = TokenHeader::from_bytes(signed)?;
        Ok((header, &signed[TokenHeader::LEN..]))
    }

    fn check_age(&self, timestamp: u64, now: u64) -> Result<(), DecryptError> {
        let Some(max_age) = self.max_age else {
            return Ok(());
        };

        if now.saturating_sub(timestamp) > max_age
            || timestamp.saturating_sub(now) > MAX_CLOCK_SKEW
        {
            return Err(DecryptError::Expired);
        }
        Ok(())
    }
}

/// Base64-decode and check the structural length.
fn decode(token: &Token) -> Result<Vec<u8>, DecryptError> {
    let data = URL_SAFE
        .decode(token.as_str().trim())
        .map_err(|_| DecryptError::MalformedEncoding)?;

    if data.len() < MIN_TOKEN_LEN
        || (data.len() - TokenHeader::LEN - HMAC_LEN) % BLOCK_LEN != 0
    {
        return Err(DecryptError::MalformedEncoding);
    }

    Ok(data)
}

fn unix_now() -> u64 {
    u64::try_from(Utc::now().timestamp()).unwrap_or(0)
}
