//! Splits summary text into pieces that fit a single embed description.
//!
//! Limits are measured in characters, not bytes: Discord counts code points,
//! and splitting on a byte index could land inside a multi-byte character.

/// Split `text` into chunks of at most `limit` characters, preferring to
/// break at newlines so bullet points stay intact.
///
/// A newline is only used as the break point when it falls past the halfway
/// mark of the chunk; an earlier one would waste too much of the limit.
/// Each emitted chunk is right-trimmed and the remainder left-trimmed, so a
/// break at a newline does not leak blank lines across chunks.
pub fn split_into_chunks(text: &str, limit: usize) -> Vec<String> {
    if text.chars().count() <= limit {
        return vec![text.to_string()];
    }

    let mut chunks = Vec::new();
    let mut remaining = text;

    while !remaining.is_empty() {
        if remaining.chars().count() <= limit {
            chunks.push(remaining.to_string());
            break;
        }

        // Byte offset just past the `limit`-th character.
        let byte_limit = remaining
            .char_indices()
            .nth(limit)
            .map_or(remaining.len(), |(i, _)| i);

        let mut split_point = byte_limit;
        if let Some(newline) = remaining[..byte_limit].rfind('\n') {
            // Only break there if the newline is not too early.
            if remaining[..newline].chars().count() > limit / 2 {
                split_point = newline + 1; // keep the newline in this chunk
            }
        }

        chunks.push(remaining[..split_point].trim_end().to_string());
        remaining = remaining[split_point..].trim_start();
    }

    chunks
}
