//! License key generation and input normalization.
//!
//! Keys look like `GNP-XXXX-XXXX-XXXX`: a configurable prefix followed by
//! three segments drawn from an alphabet that excludes visually confusable
//! characters (0/O, 1/I). Uniqueness is enforced by the store's primary key;
//! callers retry on collision rather than trusting the entropy alone.

use rand::Rng;

/// 32 characters, no 0/O or 1/I.
pub const KEY_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

pub const SEGMENT_LEN: usize = 4;
pub const SEGMENT_COUNT: usize = 3;

/// Generate a random license key with the given prefix.
///
/// Uses `thread_rng`, a CSPRNG. Predictable keys here would be directly
/// forgeable entitlements, so a weaker generator is not an option.
pub fn generate(prefix: &str) -> String {
    let mut rng = rand::thread_rng();
    let mut key = String::with_capacity(prefix.len() + SEGMENT_COUNT * (SEGMENT_LEN + 1));
    key.push_str(prefix);
    for _ in 0..SEGMENT_COUNT {
        key.push('-');
        for _ in 0..SEGMENT_LEN {
            key.push(KEY_ALPHABET[rng.gen_range(0..KEY_ALPHABET.len())] as char);
        }
    }
    key
}

/// Normalize a client-supplied key: trim whitespace, uppercase.
///
/// All three client operations accept keys case-insensitively.
pub fn normalize(raw: &str) -> String {
    raw.trim().to_ascii_uppercase()
}
