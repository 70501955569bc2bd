use crate::error::{ProvisionError, Result};

use super::Embedder;

/// Two Korean sentences followed by their English translations.
pub const SAMPLE_TEXTS: [&str; 4] = [
    "안녕하세요, 저는 백엔드 개발자입니다.",
    "Spring Boot와 JPA를 사용한 경험이 있습니다.",
    "Hello, I am a backend developer.",
    "I have experience with Spring Boot and JPA.",
];

pub const CROSS_LINGUAL_THRESHOLD: f32 = 0.6;

#[derive(Debug, Clone, PartialEq)]
pub struct SimilarityReport {
    pub model: String,
    pub dimension: usize,
    /// Korean vs English "backend developer".
    pub cross_lingual: f32,
    /// Korean "backend developer" vs Korean "Spring Boot".
    pub related: f32,
}

impl SimilarityReport {
    pub fn passes(&self) -> bool {
        self.cross_lingual > CROSS_LINGUAL_THRESHOLD
    }
}

/// Returns 0.0 for empty, mismatched or zero-norm vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

/// Embed the sample texts and measure multilingual similarity.
pub fn run_similarity_check(embedder: &dyn Embedder) -> Result<SimilarityReport> {
    let mut embeddings = Vec::with_capacity(SAMPLE_TEXTS.len());
    for text in SAMPLE_TEXTS {
        let embedding = embedder.embed(text)?;
        let preview: String = text.chars().take(20).collect();
        tracing::info!(
            "Generated embedding for: '{preview}...' -> Dimension: {}",
            embedding.len()
        );
        embeddings.push(embedding);
    }

    let dimension = embeddings[0].len();
    if let Some(other) = embeddings.iter().find(|e| e.len() != dimension) {
        return Err(ProvisionError::embedding(format!(
            "inconsistent embedding dimensions: {dimension} vs {}",
            other.len()
        )));
    }

    Ok(SimilarityReport {
        model: embedder.model().to_string(),
        dimension,
        cross_lingual: cosine_similarity(&embeddings[0], &embeddings[2]),
        related: cosine_similarity(&embeddings[0], &embeddings[1]),
    })
}
