//! Trigram embedding provider using character n-gram content-aware embeddings.

use crate::embeddings::provider::EmbeddingProvider;
use lawqa_core::AppResult;
use std::collections::{HashMap, HashSet};

/// Character n-gram embedding provider for local, offline operation.
///
/// Generates deterministic embeddings from character bigrams and trigrams
/// of each text segment. Chinese text has no word spacing, so segments are
/// split on whitespace and punctuation and the n-grams stand in for words.
/// Not semantically accurate like neural embedding models, but consistent
/// and content-dependent, which is enough for tests and offline use.
#[derive(Debug)]
pub struct TrigramProvider {
    dimensions: usize,
}

impl TrigramProvider {
    /// Create a new trigram provider with specified dimensions.
    pub fn new(dimensions: usize) -> Self {
        Self { dimensions }
    }

    /// Generate an n-gram embedding for text.
    fn generate_trigram_embedding(&self, text: &str) -> AppResult<Vec<f32>> {
        let mut embedding = vec![0.0; self.dimensions];
        if self.dimensions == 0 {
            return Ok(embedding);
        }

        let lower = text.to_lowercase();

        let stop_words: HashSet<&str> = [
            "the", "is", "at", "which", "on", "a", "an", "as", "are", "was", "were", "for", "to",
            "of", "in", "and", "or", "but", "with", "by", "from", "this", "that", "be",
        ]
        .iter()
        .copied()
        .collect();

        let mut segment_freq: HashMap<&str, u32> = HashMap::new();
        for segment in lower
            .split(is_separator)
            .filter(|s| !s.is_empty() && !stop_words.contains(s))
        {
            *segment_freq.entry(segment).or_insert(0) += 1;
        }

        for (segment, freq) in &segment_freq {
            let chars: Vec<char> = segment.chars().collect();
            let weight = (*freq as f32).sqrt();

            for n in [2usize, 3] {
                for window in chars.windows(n) {
                    let gram: String = window.iter().collect();
                    let idx = (hash(&gram, 37) as usize) % self.dimensions;
                    embedding[idx] += weight;
                }
            }

            // Also encode the whole segment
            let idx = (hash(segment, 31) as usize) % self.dimensions;
            embedding[idx] += *freq as f32;
        }

        // Normalize to unit vector
        let norm: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for v in &mut embedding {
                *v /= norm;
            }
        }

        Ok(embedding)
    }
}

fn is_separator(c: char) -> bool {
    c.is_whitespace()
        || c.is_ascii_punctuation()
        || "，。、；：？！「」『』（）《》【】〔〕…—～".contains(c)
}

fn hash(text: &str, multiplier: u64) -> u64 {
    text.bytes()
        .fold(0u64, |acc, b| acc.wrapping_mul(multiplier).wrapping_add(b as u64))
}

#[async_trait::async_trait]
impl EmbeddingProvider for TrigramProvider {
    fn provider_name(&self) -> &str {
        "trigram"
    }

    fn model_name(&self) -> &str {
        "trigram-v1"
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        texts
            .iter()
            .map(|text| self.generate_trigram_embedding(text))
            .collect()
    }
}
