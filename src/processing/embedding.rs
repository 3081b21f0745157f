//! Embedding generation and résumé-similarity scoring.

use std::thread;
use std::time::Duration;

use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
use thiserror::Error;

use crate::domain::job::Similarity;

#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("failed to initialize embedding model: {0}")]
    Init(String),
    #[error("failed to generate embedding: {0}")]
    Generation(String),
}

/// Embedding-provider seam. The production implementation wraps a local
/// fastembed model; tests substitute deterministic stubs.
pub trait TextEmbedder {
    fn embed(&mut self, text: &str) -> Result<Vec<f32>, EmbeddingError>;
}

pub struct FastembedEmbedder {
    model: TextEmbedding,
}

impl FastembedEmbedder {
    /// Loads the embedding model, downloading it on first use.
    pub fn new() -> Result<Self, EmbeddingError> {
        let model = TextEmbedding::try_new(InitOptions::new(EmbeddingModel::AllMiniLML6V2))
            .map_err(|error| EmbeddingError::Init(format!("{error:?}")))?;
        Ok(Self { model })
    }
}

impl TextEmbedder for FastembedEmbedder {
    fn embed(&mut self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        self.model
            .embed(vec![text.to_string()], None)
            .map_err(|error| EmbeddingError::Generation(format!("{error:?}")))?
            .into_iter()
            .next()
            .ok_or_else(|| EmbeddingError::Generation("provider returned an empty batch".to_string()))
    }
}

/// Normalize a vector to unit length.
///
/// Returns the original vector when the norm is zero.
pub fn normalize_embedding(vec: &[f32]) -> Vec<f32> {
    let norm = vec.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm == 0.0 {
        vec.to_vec()
    } else {
        vec.iter().map(|x| x / norm).collect()
    }
}

/// Cosine similarity of two vectors. `None` when the dimensions differ or
/// either vector has zero norm.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Option<f32> {
    if a.len() != b.len() || a.is_empty() {
        return None;
    }

    let dot = a.iter().zip(b).map(|(x, y)| x * y).sum::<f32>();
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return None;
    }

    Some(dot / (norm_a * norm_b))
}

/// Scores a posting description against the résumé.
///
/// The two texts are embedded independently with `inter_call_delay` between
/// the provider calls. Any provider failure or degenerate vector yields
/// [`Similarity::Unavailable`] instead of an error; scores are clamped to
/// `[0, 1]`.
pub fn resume_similarity<E>(
    embedder: &mut E,
    description: &str,
    resume: &str,
    inter_call_delay: Duration,
) -> Similarity
where
    E: TextEmbedder + ?Sized,
{
    let description_vec = match embedder.embed(description) {
        Ok(vector) => vector,
        Err(error) => {
            log::warn!("Failed to embed description: {error}");
            return Similarity::Unavailable;
        }
    };

    thread::sleep(inter_call_delay);

    let resume_vec = match embedder.embed(resume) {
        Ok(vector) => vector,
        Err(error) => {
            log::warn!("Failed to embed resume: {error}");
            return Similarity::Unavailable;
        }
    };

    match cosine_similarity(&description_vec, &resume_vec) {
        Some(value) => Similarity::Scored(value.clamp(0.0, 1.0)),
        None => Similarity::Unavailable,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedEmbedder {
        vectors: Vec<Vec<f32>>,
    }

    impl TextEmbedder for FixedEmbedder {
        fn embed(&mut self, _text: &str) -> Result<Vec<f32>, EmbeddingError> {
            if self.vectors.is_empty() {
                return Err(EmbeddingError::Generation("exhausted".to_string()));
            }
            Ok(self.vectors.remove(0))
        }
    }

    struct FailingEmbedder;

    impl TextEmbedder for FailingEmbedder {
        fn embed(&mut self, _text: &str) -> Result<Vec<f32>, EmbeddingError> {
            Err(EmbeddingError::Generation("provider down".to_string()))
        }
    }

    #[test]
    fn normalize_leaves_zero_vector_unchanged() {
        assert_eq!(normalize_embedding(&[0.0, 0.0]), vec![0.0, 0.0]);
    }

    #[test]
    fn normalize_yields_unit_length() {
        let normalized = normalize_embedding(&[3.0, 4.0]);
        let norm = normalized.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-6);
    }

    #[test]
    fn cosine_of_identical_vectors_is_one() {
        let similarity = cosine_similarity(&[0.2, 0.5, 0.3], &[0.2, 0.5, 0.3]).unwrap();
        assert!((similarity - 1.0).abs() < 1e-6);
    }

    #[test]
    fn cosine_of_orthogonal_vectors_is_zero() {
        let similarity = cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).unwrap();
        assert!(similarity.abs() < 1e-6);
    }

    #[test]
    fn cosine_rejects_degenerate_input() {
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), None);
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 0.0]), None);
        assert_eq!(cosine_similarity(&[], &[]), None);
    }

    #[test]
    fn identical_texts_score_maximally() {
        let mut embedder = FixedEmbedder {
            vectors: vec![vec![0.1, 0.7, 0.2], vec![0.1, 0.7, 0.2]],
        };
        let score = resume_similarity(&mut embedder, "same", "same", Duration::ZERO);
        match score {
            Similarity::Scored(value) => assert!((value - 1.0).abs() < 1e-6),
            Similarity::Unavailable => panic!("expected a score"),
        }
    }

    #[test]
    fn provider_failure_is_unavailable() {
        let mut embedder = FailingEmbedder;
        assert_eq!(
            resume_similarity(&mut embedder, "a", "b", Duration::ZERO),
            Similarity::Unavailable
        );
    }

    #[test]
    fn second_call_failure_is_unavailable() {
        let mut embedder = FixedEmbedder {
            vectors: vec![vec![1.0, 0.0]],
        };
        assert_eq!(
            resume_similarity(&mut embedder, "a", "b", Duration::ZERO),
            Similarity::Unavailable
        );
    }

    #[test]
    fn zero_vector_embedding_is_unavailable() {
        let mut embedder = FixedEmbedder {
            vectors: vec![vec![0.0, 0.0], vec![1.0, 0.0]],
        };
        assert_eq!(
            resume_similarity(&mut embedder, "a", "b", Duration::ZERO),
            Similarity::Unavailable
        );
    }

    #[test]
    fn negative_cosine_clamps_to_zero() {
        let mut embedder = FixedEmbedder {
            vectors: vec![vec![1.0, 0.0], vec![-1.0, 0.0]],
        };
        assert_eq!(
            resume_similarity(&mut embedder, "a", "b", Duration::ZERO),
            Similarity::Scored(0.0)
        );
    }
}
