//! Well label vocabulary and sanitization.

use unicode_normalization::UnicodeNormalization;

/// Label of the lowest-energy well of a group.
pub const GLOBAL_MINIMUM: &str = "well";
/// Label of conformers without a usable energy and without a prior label.
pub const UNKNOWN: &str = "unknown";

/// Canonicalizes a label for storage: NFC normalization, then every
/// non-ASCII character is dropped.
pub fn sanitize_label(raw: &str) -> String {
    raw.nfc().filter(char::is_ascii).collect()
}

/// Base label of the 1-based `bucket`: `well` for the first, `iso{k-1}` after.
pub fn bucket_label(bucket: usize) -> String {
    if bucket <= 1 {
        GLOBAL_MINIMUM.to_string()
    } else {
        format!("iso{}", bucket - 1)
    }
}

/// Alphabetic suffix of the 0-based `position` within a bucket.
///
/// `a`..`z`, then `aa`, `ab`, ... (bijective base 26).
pub fn member_suffix(position: usize) -> String {
    let mut n = position + 1;
    let mut out = Vec::new();
    while n > 0 {
        n -= 1;
        out.push(b'a' + (n % 26) as u8);
        n /= 26;
    }
    out.iter().rev().map(|&b| char::from(b)).collect()
}

/// Full label of a bucket member. Singletons keep the bare base label.
pub fn member_label(bucket: usize, position: usize, bucket_len: usize) -> String {
    let base = bucket_label(bucket);
    if bucket_len > 1 {
        format!("{base}_{}", member_suffix(position))
    } else {
        base
    }
}
