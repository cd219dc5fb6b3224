//! Share-code generation.
//!
//! Codes are opaque capabilities: 16 bytes from the OS RNG, hex
//! encoded. The token space is far above the 2^40 the collision model
//! assumes; uniqueness is still enforced by the store's constraint,
//! with the caller regenerating on a reported collision.

use larder_core::ShareCode;
use rand::rngs::OsRng;
use rand::RngCore;

/// Number of random bytes in a share code.
pub const CODE_ENTROPY_BYTES: usize = 16;

/// Generate a fresh share code.
pub fn generate_share_code() -> ShareCode {
    let mut bytes = [0u8; CODE_ENTROPY_BYTES];
    OsRng.fill_bytes(&mut bytes);
    ShareCode::from_entropy(&bytes)
}
