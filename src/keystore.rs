//! Lifecycle of the persisted secret key.

use std::path::{Path, PathBuf};

use tracing::{debug, error, warn};
use zeroize::Zeroizing;

use crate::crypto::SecretKey;
use crate::error::KeyStoreError;
use crate::storage::Storage;

/// Where the key returned by [`KeyStore::load_or_create`] came from.
#[derive(Debug)]
pub enum KeySource {
    /// A valid key was read from the key file.
    Loaded,
    /// No key file existed; a new key was generated and saved.
    Generated,
    /// The key file was unreadable or invalid and has been replaced.
    Regenerated { cause: KeyStoreError },
}

#[derive(Debug)]
pub struct LoadedKey {
    key: SecretKey,
    source: KeySource,
}

impl LoadedKey {
    pub fn key(&self) -> &SecretKey {
        &self.key
    }

    pub fn source(&self) -> &KeySource {
        &self.source
    }

    pub fn into_key(self) -> SecretKey {
        self.key
    }
}

/// Owns the key file. Reads at most once and writes at most once per call.
#[derive(Debug, Clone)]
pub struct KeyStore {
    storage: Storage,
}

impl KeyStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            storage: Storage::new(path.into()),
        }
    }

    pub fn path(&self) -> &Path {
        self.storage.path()
    }

    /// Return the persisted key, generating and saving one if needed.
    ///
    /// A valid existing key is never overwritten. A generated key is only
    /// returned once it has been written to disk.
    ///
    /// # Errors
    ///
    /// Returns [`KeyStoreError::PersistFailed`] if a new key cannot be saved;
    /// the caller cannot continue without a durable key.
    pub fn load_or_create(&self) -> Result<LoadedKey, KeyStoreError> {
        let cause = if self.storage.exists() {
            match self.load_existing() {
                Ok(key) => {
                    debug!(path = %self.path().display(), "loaded key");
                    return Ok(LoadedKey {
                        key,
                        source: KeySource::Loaded,
                    });
                }
                Err(e) if e.is_recoverable() => {
                    warn!(path = %self.path().display(), error = %e, "key file unusable, generating a new key");
                    Some(e)
                }
                Err(e) => return Err(e),
            }
        } else {
            None
        };

        let key = self.create()?;
        let source = match cause {
            Some(cause) => KeySource::Regenerated { cause },
            None => KeySource::Generated,
        };

        Ok(LoadedKey { key, source })
    }

    /// Write a fresh key, replacing an existing file only when `overwrite` is set.
    ///
    /// Tokens made with a replaced key can no longer be decrypted.
    pub fn generate_new(&self, overwrite: bool) -> Result<SecretKey, KeyStoreError> {
        if self.storage.exists() && !overwrite {
            return Err(KeyStoreError::AlreadyExists(self.path().to_path_buf()));
        }
        self.create()
    }

    fn load_existing(&self) -> Result<SecretKey, KeyStoreError> {
        let data = Zeroizing::new(self.storage.load().map_err(|source| {
            KeyStoreError::ReadFailed {
                path: self.path().to_path_buf(),
                source,
            }
        })?);

        let text = std::str::from_utf8(&data)
            .map_err(|_| KeyStoreError::InvalidFormat("key file is not text".into()))?;

        SecretKey::from_base64(text)
    }

    fn create(&self) -> Result<SecretKey, KeyStoreError> {
        let key = SecretKey::generate()?;

        if let Err(source) = self.storage.save(key.to_base64().as_bytes()) {
            error!(path = %self.path().display(), error = %source, "failed to persist key");
            return Err(KeyStoreError::PersistFailed {
                path: self.path().to_path_buf(),
                source,
            });
        }

        debug!(path = %self.path().display(), "generated new key");
        Ok(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    const ZERO_KEY: &str = "AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA=";

    #[test]
    fn missing_file_generates_and_persists() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("mykey.key");
        let store = KeyStore::new(&path);

        let loaded = store.load_or_create().unwrap();
        assert!(matches!(loaded.source(), KeySource::Generated));

        let on_disk = fs::read_to_string(&path).unwrap();
        assert_eq!(on_disk.len(), 44);
        assert_eq!(on_disk, *loaded.key().to_base64());
    }

    #[test]
    fn second_load_returns_same_key() {
        let dir = tempdir().unwrap();
        let store = KeyStore::new(dir.path().join("mykey.key"));

        let first = store.load_or_create().unwrap();
        let second = store.load_or_create().unwrap();

        assert!(matches!(second.source(), KeySource::Loaded));
        assert_eq!(*first.key().to_base64(), *second.key().to_base64());
    }

    #[test]
    fn valid_existing_key_is_not_overwritten() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("mykey.key");
        fs::write(&path, format!("{ZERO_KEY}\n")).unwrap();

        let loaded = KeyStore::new(&path).load_or_create().unwrap();

        assert!(matches!(loaded.source(), KeySource::Loaded));
        assert_eq!(*loaded.key().to_base64(), ZERO_KEY);
        assert_eq!(fs::read_to_string(&path).unwrap(), format!("{ZERO_KEY}\n"));
    }

    #[test]
    fn invalid_key_is_regenerated() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("mykey.key");
        fs::write(&path, "not a key").unwrap();

        let loaded = KeyStore::new(&path).load_or_create().unwrap();

        match loaded.source() {
            KeySource::Regenerated {
                cause: KeyStoreError::InvalidFormat(_),
            } => {}
            other => panic!("expected regeneration after InvalidFormat, got: {other:?}"),
        }
        assert_eq!(fs::read_to_string(&path).unwrap(), *loaded.key().to_base64());
    }

    #[test]
    fn key_with_trailing_bits_is_loaded_untouched() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("mykey.key");
        let text = format!("{}B=", "A".repeat(42));
        fs::write(&path, &text).unwrap();

        let loaded = KeyStore::new(&path).load_or_create().unwrap();

        assert!(matches!(loaded.source(), KeySource::Loaded));
        assert_eq!(*loaded.key().to_base64(), ZERO_KEY);
        assert_eq!(fs::read_to_string(&path).unwrap(), text);
    }

    #[cfg(unix)]
    #[test]
    fn unreadable_key_is_regenerated() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir().unwrap();
        let path = dir.path().join("mykey.key");
        fs::write(&path, ZERO_KEY).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o000)).unwrap();
        if fs::read(&path).is_ok() {
            // permission bits are not enforced for root
            return;
        }

        let loaded = KeyStore::new(&path).load_or_create().unwrap();

        match loaded.source() {
            KeySource::Regenerated {
                cause: KeyStoreError::ReadFailed { path: p, .. },
            } => assert_eq!(p, &path),
            other => panic!("expected regeneration after ReadFailed, got: {other:?}"),
        }
        let on_disk = fs::read_to_string(&path).unwrap();
        assert_eq!(on_disk, *loaded.key().to_base64());
        assert_ne!(on_disk, ZERO_KEY);
    }

    #[test]
    fn short_key_is_regenerated() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("mykey.key");
        // valid base64, 16 bytes
        fs::write(&path, "AAAAAAAAAAAAAAAAAAAAAA==").unwrap();

        let loaded = KeyStore::new(&path).load_or_create().unwrap();
        assert!(matches!(loaded.source(), KeySource::Regenerated { .. }));
    }

    #[test]
    fn binary_garbage_is_regenerated() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("mykey.key");
        fs::write(&path, [0xff, 0xfe, 0x00, 0x80]).unwrap();

        let loaded = KeyStore::new(&path).load_or_create().unwrap();
        assert!(matches!(
            loaded.source(),
            KeySource::Regenerated {
                cause: KeyStoreError::InvalidFormat(_)
            }
        ));
    }

    #[test]
    fn unwritable_path_is_fatal() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("mykey.key");
        // a directory can be neither read as a key nor replaced by one
        fs::create_dir(&path).unwrap();

        match KeyStore::new(&path).load_or_create() {
            Err(KeyStoreError::PersistFailed { path: p, .. }) => assert_eq!(p, path),
            other => panic!("expected PersistFailed, got: {other:?}"),
        }
    }

    #[test]
    fn generate_new_refuses_to_overwrite() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("mykey.key");
        fs::write(&path, ZERO_KEY).unwrap();
        let store = KeyStore::new(&path);

        assert!(matches!(
            store.generate_new(false),
            Err(KeyStoreError::AlreadyExists(_))
        ));
        assert_eq!(fs::read_to_string(&path).unwrap(), ZERO_KEY);

        let key = store.generate_new(true).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), *key.to_base64());
    }
}
