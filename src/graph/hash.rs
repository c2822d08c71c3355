//! Deterministic string hashing.
//!
//! Everything that must look random but stay stable across renders (seed
//! jitter, group and circle hues, signatures) goes through these helpers.

/// Fold a string into a running 32-bit `h * 31 + c` hash over UTF-16 units.
#[inline]
pub fn fold_str(mut hash: i32, s: &str) -> i32 {
    for unit in s.encode_utf16() {
        hash = hash.wrapping_shl(5).wrapping_sub(hash).wrapping_add(unit as i32);
    }
    hash
}

/// Fold a single character code into a running hash.
#[inline]
pub fn fold_code(hash: i32, code: i32) -> i32 {
    hash.wrapping_shl(5).wrapping_sub(hash).wrapping_add(code)
}

/// Hash of a whole string.
#[inline]
pub fn string_hash(s: &str) -> i32 {
    fold_str(0, s)
}

/// Pseudo-random offset in `[-0.5, 0.5]` derived from an id and a salt.
pub fn hash_offset(id: &str, salt: u32) -> f64 {
    let hash = fold_str(fold_str(0, id), &salt.to_string());
    f64::from(hash & 0x7fff_ffff) / f64::from(0x7fff_ffff) - 0.5
}

/// Stable hue in degrees for an id.
pub fn hue(id: &str, salt: u32, multiplier: f64) -> f64 {
    (hash_offset(id, salt).abs() * multiplier) % 360.0
}
