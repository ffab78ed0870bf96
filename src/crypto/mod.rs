//! Cryptographic primitives for the token format.
//!
//! Provides the secret key, AES-128-CBC, HMAC-SHA256 and the token header layout.

pub mod cipher;
pub mod header;
pub mod key;
pub mod mac;

pub use header::TokenHeader;
pub use key::SecretKey;

/// Token format version byte.
pub const VERSION: u8 = 0x80;
/// Length of the secret key (32 bytes).
pub const KEY_LEN: usize = 32;
/// Length of each key half: signing and encrypting (16 bytes).
pub const HALF_KEY_LEN: usize = 16;
/// Length of the version field (1 byte).
pub const VER_LEN: usize = 1;
/// Length of the timestamp field (8 bytes, big-endian Unix seconds).
pub const TIMESTAMP_LEN: usize = 8;
/// Length of the initialization vector (16 bytes).
pub const IV_LEN: usize = 16;
/// AES block size (16 bytes).
pub const BLOCK_LEN: usize = 16;
/// Length of the HMAC-SHA256 tag (32 bytes).
pub const HMAC_LEN: usize = 32;
/// Smallest decoded token: header, one ciphertext block and the tag.
pub const MIN_TOKEN_LEN: usize = TokenHeader::LEN + BLOCK_LEN + HMAC_LEN;
/// How far in the future a token timestamp may lie when a TTL is enforced.
pub const MAX_CLOCK_SKEW: u64 = 60;
