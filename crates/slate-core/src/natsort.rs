//! Natural ("numeric-aware") string ordering.
//!
//! Runs of ASCII digits are compared by numeric value, everything else
//! character by character, so `"2" < "10"` and `"A2" < "A10"`.

use std::cmp::Ordering;

/// Compare two strings in natural order.
///
/// Strings that differ only in leading zeros (`"01"` vs `"1"`) are ordered by
/// plain byte comparison, so `Equal` is returned only for identical strings.
pub fn compare(a: &str, b: &str) -> Ordering {
    let mut x = a.as_bytes();
    let mut y = b.as_bytes();
    loop {
        match (x.first(), y.first()) {
            (None, None) => return a.cmp(b),
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(cx), Some(cy)) if cx.is_ascii_digit() && cy.is_ascii_digit() => {
                let (dx, rx) = split_digits(x);
                let (dy, ry) = split_digits(y);
                let ord = compare_digits(dx, dy);
                if ord != Ordering::Equal {
                    return ord;
                }
                x = rx;
                y = ry;
            }
            (Some(_), Some(_)) => {
                let (cx, rx) = split_char(x);
                let (cy, ry) = split_char(y);
                let ord = cx.cmp(cy);
                if ord != Ordering::Equal {
                    return ord;
                }
                x = rx;
                y = ry;
            }
        }
    }
}

/// Report whether `a` sorts before `b` in natural order.
pub fn less(a: &str, b: &str) -> bool {
    compare(a, b) == Ordering::Less
}

/// Sort a slice of strings in natural order.
pub fn sort<S: AsRef<str>>(v: &mut [S]) {
    v.sort_by(|a, b| compare(a.as_ref(), b.as_ref()));
}

fn split_digits(s: &[u8]) -> (&[u8], &[u8]) {
    let end = s.iter().position(|c| !c.is_ascii_digit()).unwrap_or(s.len());
    s.split_at(end)
}

// Splits off one UTF-8 encoded character (or one byte of a non-leading
// position, which cannot occur for input coming from a `&str`).
fn split_char(s: &[u8]) -> (&[u8], &[u8]) {
    let width = match s[0] {
        b if b < 0x80 => 1,
        b if b >= 0xF0 => 4,
        b if b >= 0xE0 => 3,
        b if b >= 0xC0 => 2,
        _ => 1,
    };
    s.split_at(width.min(s.len()))
}

fn compare_digits(a: &[u8], b: &[u8]) -> Ordering {
    let a = trim_zeros(a);
    let b = trim_zeros(b);
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

fn trim_zeros(s: &[u8]) -> &[u8] {
    let start = s.iter().position(|&c| c != b'0').unwrap_or(s.len());
    &s[start..]
}
