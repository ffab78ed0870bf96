mod codec;
mod crypto;
mod error;
mod keystore;
mod outcome;
mod storage;

pub use crate::codec::{Token, TokenCodec};
pub use crate::crypto::{MAX_CLOCK_SKEW, SecretKey};
pub use crate::error::{DecryptError, EncryptError, KeyStoreError};
pub use crate::keystore::{KeySource, KeyStore, LoadedKey};
pub use crate::outcome::Outcome;

use std::path::{Path, PathBuf};

/// Key file name used when no path is configured.
pub const DEFAULT_KEY_FILE: &str = "mykey.key";

/// `mykey.key` in the working directory.
pub fn default_key_path() -> PathBuf {
    PathBuf::from(DEFAULT_KEY_FILE)
}

/// Load the key at `path`, generating and saving one if it is missing or invalid.
pub fn load_or_create_key(path: impl AsRef<Path>) -> Result<SecretKey, KeyStoreError> {
    KeyStore::new(path.as_ref())
        .load_or_create()
        .map(LoadedKey::into_key)
}

pub fn encrypt(key: &SecretKey, plaintext: &str) -> Result<Token, EncryptError> {
    TokenCodec::new(key).encrypt(plaintext.as_bytes())
}

pub fn decrypt(key: &SecretKey, token: &Token) -> Result<String, DecryptError> {
    TokenCodec::new(key).decrypt_str(token)
}
