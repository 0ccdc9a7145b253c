//! Small helpers shared across the crate.

use std::borrow::Cow;
use std::ops::Add;

/// Computes the sum of two 2-tuples.
pub fn tuple_2_add<A: Add<X>, B: Add<Y>, X, Y>(left: (A, B), right: (X, Y)) -> (A::Output, B::Output) {
    (left.0 + right.0, left.1 + right.1)
}

/// Normalizes a raw bit string to exactly `width` characters: short values
/// are left-zero-padded, long values keep their rightmost `width` bits.
pub fn normalize_bits(value: &str, width: u32) -> Cow<str> {
    let width = width as usize;
    let len = value.chars().count();
    if len == width {
        Cow::Borrowed(value)
    } else if len > width {
        let skip = len - width;
        Cow::Owned(value.chars().skip(skip).collect())
    } else {
        let mut padded = String::with_capacity(width);
        for _ in len..width {
            padded.push('0');
        }
        padded.push_str(value);
        Cow::Owned(padded)
    }
}

#[test]
fn test_normalize_bits() {
    assert_eq!(normalize_bits("1", 4), "0001");
    assert_eq!(normalize_bits("1010", 4), "1010");
    assert_eq!(normalize_bits("111010", 4), "1010");
    assert_eq!(normalize_bits("", 2), "00");
}
