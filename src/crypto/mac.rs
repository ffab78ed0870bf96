use super::{HALF_KEY_LEN, HMAC_LEN};
use hmac::{
    Hmac, Mac,
    digest::{KeyInit, generic_array::GenericArray},
};
use sha2::Sha256;
use zeroize::Zeroizing;

type HmacSha256 = Hmac<Sha256>;

/// SHA-256 block size, the HMAC key size.
const MAC_KEY_LEN: usize = 64;

fn keyed(signing_key: &[u8; HALF_KEY_LEN]) -> HmacSha256 {
    // HMAC zero-pads short keys to the block size, so this is the same MAC
    let mut block = Zeroizing::new([0u8; MAC_KEY_LEN]);
    block[..HALF_KEY_LEN].copy_from_slice(signing_key);
    <HmacSha256 as KeyInit>::new(GenericArray::from_slice(block.as_slice()))
}

/// Compute the tag over `data`
pub(crate) fn sign(signing_key: &[u8; HALF_KEY_LEN], data: &[u8]) -> [u8; HMAC_LEN] {
    let mut mac = keyed(signing_key);
    mac.update(data);
    mac.finalize().into_bytes().into()
}

/// Check `tag` against `data` in constant time
pub(crate) fn verify(signing_key: &[u8; HALF_KEY_LEN], data: &[u8], tag: &[u8]) -> bool {
    let mut mac = keyed(signing_key);
    mac.update(data);
    mac.verify_slice(tag).is_ok()
}
