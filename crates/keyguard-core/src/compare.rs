//! Constant-time equality for secrets.

use subtle::ConstantTimeEq;

/// Compare two byte slices without leaking the position of a mismatch.
///
/// Returns `true` iff both slices have equal length and identical contents.
///
/// Unequal lengths return `false` immediately. This reveals only the length,
/// which is public for every value this crate compares (tags, digests, MACs).
/// For equal lengths every byte is examined and the control flow does not
/// depend on the contents.
#[must_use]
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    bool::from(a.ct_eq(b))
}
