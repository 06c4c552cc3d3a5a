//! Fixed-size overlapping character chunks, the unit of embedding and retrieval.

/// Splits `text` into ordered chunks of at most `chunk_size` characters where
/// consecutive chunks share `overlap` characters. Returns at least one chunk
/// for any non-empty input; empty input yields no chunks (callers validate
/// length before chunking).
///
/// Operates on `char` boundaries so multi-byte text never splits mid-codepoint.
pub fn chunk_text(text: &str, chunk_size: usize, overlap: usize) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    if chars.is_empty() {
        return Vec::new();
    }

    let size = chunk_size.max(1);
    let step = size.saturating_sub(overlap).max(1);

    let mut chunks = Vec::new();
    let mut start = 0;
    while start < chars.len() {
        let end = (start + size).min(chars.len());
        chunks.push(chars[start..end].iter().collect());
        if end == chars.len() {
            break;
        }
        start += step;
    }
    chunks
}
