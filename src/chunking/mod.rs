//! Overlapping window chunker for knowledge-base documents
//!
//! Windows are measured in characters (Unicode scalar values). Every window
//! after the first starts `overlap` characters before the end of the previous
//! one, so a sentence straddling a boundary appears whole in at least one
//! chunk once it is shorter than the overlap.

use crate::config::ChunkingConfig;
use crate::error::{HuntError, Result};

/// A window of document text with its position in the source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextChunk {
    /// Position of the chunk within its document, starting at 0
    pub ordinal: usize,
    /// Character offset of the first character of the window
    pub start_char: usize,
    /// Window text
    pub content: String,
}

/// Splits document text into overlapping windows
#[derive(Debug, Clone, Copy)]
pub struct Chunker {
    max_chars: usize,
    overlap: usize,
}

impl Chunker {
    /// Create a chunker, failing fast on parameters that cannot make progress
    pub fn new(max_chars: usize, overlap: usize) -> Result<Self> {
        if max_chars == 0 {
            return Err(HuntError::ChunkingConfig {
                max_chars,
                overlap,
                message: "max_chars must be greater than 0".to_string(),
            });
        }

        if overlap >= max_chars {
            return Err(HuntError::ChunkingConfig {
                max_chars,
                overlap,
                message: "overlap must be smaller than max_chars".to_string(),
            });
        }

        Ok(Self { max_chars, overlap })
    }

    /// Build a chunker from the `[chunking]` configuration section
    pub fn from_config(config: &ChunkingConfig) -> Result<Self> {
        Self::new(config.max_chars, config.overlap)
    }

    pub fn max_chars(&self) -> usize {
        self.max_chars
    }

    pub fn overlap(&self) -> usize {
        self.overlap
    }

    /// Split `text` into ordered, overlapping chunks
    ///
    /// Empty text yields no chunks. Text of at most `max_chars` characters
    /// yields exactly one chunk equal to the input.
    pub fn chunk(&self, text: &str) -> Vec<TextChunk> {
        // Byte offset of every char boundary, including the end of the text
        let boundaries: Vec<usize> = text
            .char_indices()
            .map(|(idx, _)| idx)
            .chain(std::iter::once(text.len()))
            .collect();
        let total_chars = boundaries.len() - 1;

        let mut chunks = Vec::new();
        if total_chars == 0 {
            return chunks;
        }

        let mut start = 0;
        loop {
            let end = (start + self.max_chars).min(total_chars);
            chunks.push(TextChunk {
                ordinal: chunks.len(),
                start_char: start,
                content: text[boundaries[start]..boundaries[end]].to_string(),
            });

            if end == total_chars {
                break;
            }

            // end - overlap > start because overlap < max_chars
            start = end - self.overlap;
        }

        chunks
    }
}

impl Default for Chunker {
    fn default() -> Self {
        Self {
            max_chars: 3000,
            overlap: 300,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Drop the shared prefix of every chunk after the first and concatenate
    fn reassemble(chunks: &[TextChunk], overlap: usize) -> String {
        let mut out = String::new();
        for (i, chunk) in chunks.iter().enumerate() {
            if i == 0 {
                out.push_str(&chunk.content);
            } else {
                out.extend(chunk.content.chars().skip(overlap));
            }
        }
        out
    }

    fn sample_text(len: usize) -> String {
        "The lantern swings above the cellar door. "
            .chars()
            .cycle()
            .take(len)
            .collect()
    }

    #[test]
    fn test_rejects_overlap_not_smaller_than_window() {
        assert!(matches!(
            Chunker::new(300, 300),
            Err(HuntError::ChunkingConfig { .. })
        ));
        assert!(Chunker::new(100, 500).is_err());
        assert!(Chunker::new(0, 0).is_err());
        assert!(Chunker::new(10, 0).is_ok());
    }

    #[test]
    fn test_short_document_is_one_chunk() {
        let chunker = Chunker::default();
        let chunks = chunker.chunk("A short clue.");
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].content, "A short clue.");
        assert_eq!(chunks[0].ordinal, 0);
    }

    #[test]
    fn test_exact_window_length_is_one_chunk() {
        let chunker = Chunker::default();
        let text = sample_text(3000);
        let chunks = chunker.chunk(&text);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].content, text);
    }

    #[test]
    fn test_empty_text_has_no_chunks() {
        assert!(Chunker::default().chunk("").is_empty());
    }

    #[test]
    fn test_one_past_window_makes_two_chunks() {
        let chunker = Chunker::new(10, 3).unwrap();
        let chunks = chunker.chunk("abcdefghijk");
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].content, "abcdefghij");
        assert_eq!(chunks[1].content, "hijk");
        assert_eq!(chunks[1].start_char, 7);
    }

    #[test]
    fn test_coverage_and_exact_overlap() {
        for (max_chars, overlap) in [(3000, 300), (50, 10), (7, 6), (10, 0)] {
            let chunker = Chunker::new(max_chars, overlap).unwrap();
            for len in [1, max_chars - 1, max_chars, max_chars + 1, max_chars * 5 + 3] {
                let text = sample_text(len);
                let chunks = chunker.chunk(&text);

                assert_eq!(reassemble(&chunks, overlap), text);

                for pair in chunks.windows(2) {
                    let prev: Vec<char> = pair[0].content.chars().collect();
                    let next: Vec<char> = pair[1].content.chars().collect();
                    assert_eq!(prev.len(), max_chars);
                    assert_eq!(&prev[prev.len() - overlap..], &next[..overlap]);
                }

                for (i, chunk) in chunks.iter().enumerate() {
                    assert_eq!(chunk.ordinal, i);
                    assert!(chunk.content.chars().count() <= max_chars);
                }
            }
        }
    }

    #[test]
    fn test_multibyte_text_splits_on_char_boundaries() {
        let chunker = Chunker::new(4, 1).unwrap();
        let text = "ñandú él acá";
        let chunks = chunker.chunk(text);

        assert_eq!(chunks[0].content, "ñand");
        assert_eq!(chunks[1].content, "dú é");
        assert_eq!(reassemble(&chunks, 1), text);
    }
}
