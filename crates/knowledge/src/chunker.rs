//! Text chunking with configurable size and overlap.

use crate::types::ChunkCandidate;

/// Chunk text into overlapping windows of `chunk_size` characters.
///
/// Windows advance by `chunk_size - overlap`. A trailing window shorter than
/// a tenth of `chunk_size` is dropped unless it is the only one.
pub fn chunk_text(text: &str, chunk_size: usize, overlap: usize) -> Vec<ChunkCandidate> {
    let chars: Vec<char> = text.chars().collect();
    if chars.is_empty() || chunk_size == 0 {
        return vec![];
    }

    let step = if chunk_size > overlap {
        chunk_size - overlap
    } else {
        chunk_size
    };

    let mut chunks = Vec::new();
    let mut position = 0u32;
    let mut start = 0;

    while start < chars.len() {
        let end = (start + chunk_size).min(chars.len());
        let window = &chars[start..end];

        if !chunks.is_empty() && window.len() < chunk_size / 10 {
            break;
        }

        let text: String = window.iter().collect();
        let text = text.trim();
        if !text.is_empty() {
            chunks.push(ChunkCandidate {
                position,
                text: text.to_string(),
            });
            position += 1;
        }

        if end == chars.len() {
            break;
        }
        start += step;
    }

    tracing::debug!(
        "Chunked text into {} chunks (size: {}, overlap: {})",
        chunks.len(),
        chunk_size,
        overlap
    );

    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_text_basic() {
        let text = "勞".repeat(1000);
        let chunks = chunk_text(&text, 200, 50);

        assert_eq!(chunks[0].position, 0);
        assert_eq!(chunks[1].position, 1);
        assert!(chunks.iter().all(|c| c.text.chars().count() <= 200));
    }

    #[test]
    fn test_chunk_text_no_overlap() {
        let text = "a".repeat(300);
        let chunks = chunk_text(&text, 100, 0);
        assert_eq!(chunks.len(), 3);
    }

    #[test]
    fn test_chunk_text_empty() {
        assert!(chunk_text("", 100, 10).is_empty());
    }

    #[test]
    fn test_short_text_single_chunk() {
        let chunks = chunk_text("短", 500, 50);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, "短");
    }

    #[test]
    fn test_chunk_text_with_overlap() {
        let text: String = "甲乙丙丁戊己庚辛壬癸".repeat(10);
        let chunks = chunk_text(&text, 50, 10);

        let first_tail: String = chunks[0].text.chars().skip(40).collect();
        let second_head: String = chunks[1].text.chars().take(10).collect();
        assert_eq!(first_tail, second_head);
    }
}
