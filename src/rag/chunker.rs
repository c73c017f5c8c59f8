//! Fixed-size character chunking.
//!
//! Chunks are consecutive, non-overlapping windows of `max_chars` Unicode
//! scalar values. Concatenating the chunks of a text in order yields the
//! text back unchanged.

/// Window size used by the ingester when none is configured.
pub const DEFAULT_MAX_CHARS: usize = 1500;

/// Split `text` into windows of `max_chars` characters.
///
/// Every window but the last holds exactly `max_chars` characters; the last
/// holds the remainder. Empty input yields no chunks. A `max_chars` of zero
/// is treated as one.
pub fn chunk_text(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut chunks = Vec::with_capacity(text.len() / max_chars + 1);

    let mut start = 0;
    let mut count = 0;
    for (idx, _) in text.char_indices() {
        if count == max_chars {
            chunks.push(text[start..idx].to_string());
            start = idx;
            count = 0;
        }
        count += 1;
    }
    if start < text.len() {
        chunks.push(text[start..].to_string());
    }

    chunks
}
