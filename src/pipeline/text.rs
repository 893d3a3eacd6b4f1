//! Shared text-offset and identifier helpers.
//!
//! Every position in the pipeline is a UTF-8 byte offset into the original
//! document; every length, window and distance threshold is counted in
//! characters. These helpers translate between the two.

use uuid::Uuid;

/// Namespace for content-derived record ids.
const ID_NAMESPACE: Uuid = Uuid::from_u128(0x6c3f_0e2a_91b4_5d17_a8e0_4f62_d9c3_7b15);

/// Deterministic id for a record from its kind and content key.
pub fn content_id(kind: &str, parts: &[&str]) -> Uuid {
    let mut key = String::with_capacity(kind.len() + parts.iter().map(|p| p.len() + 1).sum::<usize>());
    key.push_str(kind);
    for part in parts {
        key.push('\u{1f}');
        key.push_str(part);
    }
    Uuid::new_v5(&ID_NAMESPACE, key.as_bytes())
}

pub fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

pub fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// Largest char boundary `<= index`.
pub fn floor_boundary(text: &str, index: usize) -> usize {
    let mut i = index.min(text.len());
    while !text.is_char_boundary(i) {
        i -= 1;
    }
    i
}

/// Smallest char boundary `>= index`.
pub fn ceil_boundary(text: &str, index: usize) -> usize {
    let mut i = index.min(text.len());
    while !text.is_char_boundary(i) {
        i += 1;
    }
    i
}

/// Byte offset reached by walking `chars` characters back from `from`.
pub fn back_chars(text: &str, from: usize, chars: usize) -> usize {
    let from = floor_boundary(text, from);
    text[..from]
        .char_indices()
        .rev()
        .nth(chars.saturating_sub(1))
        .map(|(i, _)| if chars == 0 { from } else { i })
        .unwrap_or(0)
}

/// Byte offset reached by walking `chars` characters forward from `from`.
pub fn forward_chars(text: &str, from: usize, chars: usize) -> usize {
    let from = ceil_boundary(text, from);
    text[from..]
        .char_indices()
        .nth(chars)
        .map(|(i, _)| from + i)
        .unwrap_or(text.len())
}

/// Number of characters between two byte offsets, in either order.
pub fn char_distance(text: &str, a: usize, b: usize) -> usize {
    let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
    let lo = floor_boundary(text, lo);
    let hi = floor_boundary(text, hi);
    char_len(&text[lo..hi])
}

/// Byte range covering `chars` characters on each side of `[start, end)`.
pub fn window(text: &str, start: usize, end: usize, chars: usize) -> (usize, usize) {
    (back_chars(text, start, chars), forward_chars(text, end, chars))
}

/// Slice of `text` around `[start, end)`, `chars` characters each side.
pub fn window_slice(text: &str, start: usize, end: usize, chars: usize) -> &str {
    let (lo, hi) = window(text, start, end, chars);
    &text[lo..hi]
}
