//! Outbound text chunking.

/// Split a long message into chunks that respect a platform's character
/// limit.
///
/// Slice boundaries are aligned to UTF-8 char boundaries so multi-byte
/// content (Cyrillic, CJK, emoji) never panics. Prefers splitting at
/// newlines when one falls inside the window.
pub fn split_message(text: &str, max_len: usize) -> Vec<&str> {
    assert!(max_len > 0, "max_len must be positive");

    if text.len() <= max_len {
        return vec![text];
    }

    let mut chunks = Vec::new();
    let mut start = 0;

    while start < text.len() {
        let mut end = (start + max_len).min(text.len());
        while !text.is_char_boundary(end) {
            end -= 1;
        }
        let break_at = if end < text.len() {
            text[start..end]
                .rfind('\n')
                .map(|i| start + i + 1)
                .unwrap_or(end)
        } else {
            end
        };
        chunks.push(&text[start..break_at]);
        start = break_at;
    }

    chunks
}
