use std::hint::black_box;

/// Check whether two strings differ, without revealing through timing where they differ.
///
/// Strings of different lengths differ immediately; Hawk does not treat the length of a MAC
/// as secret.  Otherwise every byte pair is examined exactly once.
pub fn strings_differ(a: &str, b: &str) -> bool {
    bytes_differ(a.as_bytes(), b.as_bytes(), |x, y| x ^ y)
}

/// The comparison loop behind `strings_differ`, with the per-pair step supplied by the caller
/// so that it can be observed.
fn bytes_differ<F>(a: &[u8], b: &[u8], mut step: F) -> bool
where
    F: FnMut(u8, u8) -> u8,
{
    if a.len() != b.len() {
        return true;
    }
    let mut acc = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        acc |= black_box(step(*x, *y));
    }
    black_box(acc) != 0
}
