//! Lexical overlap signal: word n-gram Jaccard similarity

use ahash::AHashSet;

/// Shingle width for lexical overlap
pub const NGRAM_SIZE: usize = 5;

/// Lowercased word tokens with punctuation treated as whitespace
pub fn normalize_tokens(text: &str) -> Vec<String> {
    text.chars()
        .map(|c| {
            if c.is_alphanumeric() {
                c.to_lowercase().collect::<String>()
            } else {
                " ".to_string()
            }
        })
        .collect::<String>()
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

/// Set of `n`-token windows; empty when there are fewer than `n` tokens
pub fn shingles(tokens: &[String], n: usize) -> AHashSet<&[String]> {
    if n == 0 {
        return AHashSet::new();
    }
    tokens.windows(n).collect()
}

/// |A ∩ B| / |A ∪ B|, 0.0 when both sets are empty
pub fn jaccard(a: &AHashSet<&[String]>, b: &AHashSet<&[String]>) -> f32 {
    let (small, large) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    let intersection = small.iter().filter(|s| large.contains(*s)).count();
    let union = a.len() + b.len() - intersection;

    if union == 0 {
        return 0.0;
    }

    intersection as f32 / union as f32
}

/// 5-gram Jaccard overlap between two texts
pub fn ngram_jaccard(text_a: &str, text_b: &str) -> f32 {
    let tokens_a = normalize_tokens(text_a);
    let tokens_b = normalize_tokens(text_b);
    jaccard(
        &shingles(&tokens_a, NGRAM_SIZE),
        &shingles(&tokens_b, NGRAM_SIZE),
    )
}
