use serde::{Deserialize, Serialize};

/// An untyped posting exactly as the search API returned it. Field names and
/// shapes vary by source; the transformer normalizes them.
pub type RawPosting = serde_json::Map<String, serde_json::Value>;

/// Résumé-relevance score of a posting.
///
/// `Unavailable` marks postings whose score could not be computed (provider
/// failure, degenerate embedding) so downstream ranking can tell them apart
/// from genuinely dissimilar ones.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", content = "score", rename_all = "lowercase")]
pub enum Similarity {
    Scored(f32),
    Unavailable,
}

impl Similarity {
    /// Collapses to the stored representation: `Unavailable` is 0.0,
    /// never null.
    pub fn score(self) -> f32 {
        match self {
            Similarity::Scored(value) => value,
            Similarity::Unavailable => 0.0,
        }
    }
}

impl Default for Similarity {
    fn default() -> Self {
        Similarity::Unavailable
    }
}

/// A posting after the transformer has run: fixed shape, lowercased matching
/// fields, enriched description, salary bounds and résumé score.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NormalizedPosting {
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub company: String,
    #[serde(default)]
    pub company_url: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub job_url: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub salary_low: Option<f64>,
    #[serde(default)]
    pub salary_high: Option<f64>,
    #[serde(default)]
    pub resume_similarity: Similarity,
    #[serde(default)]
    pub job_type: Option<String>,
    #[serde(default)]
    pub job_is_remote: Option<String>,
    #[serde(default)]
    pub job_benefits: Option<String>,
    #[serde(default)]
    pub job_apply_link: Option<String>,
}

impl NormalizedPosting {
    /// Natural key used for deduplication and idempotent loads. Stable for
    /// the lifetime of the record.
    pub fn primary_key(&self) -> String {
        format!("{} - {}", self.company, self.title)
    }
}

/// A stored job row: a [`NormalizedPosting`] plus surrogate id and the cached
/// embedding of the posting itself.
#[derive(Debug, Clone, PartialEq)]
pub struct PersistedJob {
    pub id: i32,
    pub primary_key: String,
    pub date: String,
    pub resume_similarity: f32,
    pub title: String,
    pub company: String,
    pub company_url: String,
    pub location: String,
    pub job_url: String,
    pub description: String,
    pub salary_low: Option<f64>,
    pub salary_high: Option<f64>,
    pub job_type: Option<String>,
    pub job_is_remote: Option<String>,
    pub job_benefits: Option<String>,
    pub embedding: Option<Vec<f32>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primary_key_joins_company_and_title() {
        let posting = NormalizedPosting {
            company: "acme".to_string(),
            title: "staff engineer".to_string(),
            ..Default::default()
        };
        assert_eq!(posting.primary_key(), "acme - staff engineer");
    }

    #[test]
    fn unavailable_similarity_scores_zero() {
        assert_eq!(Similarity::Unavailable.score(), 0.0);
        assert_eq!(Similarity::Scored(0.73).score(), 0.73);
    }

    #[test]
    fn similarity_round_trips_through_json() {
        let scored = serde_json::to_string(&Similarity::Scored(0.5)).unwrap();
        assert_eq!(
            serde_json::from_str::<Similarity>(&scored).unwrap(),
            Similarity::Scored(0.5)
        );
        let unavailable = serde_json::to_string(&Similarity::Unavailable).unwrap();
        assert_eq!(
            serde_json::from_str::<Similarity>(&unavailable).unwrap(),
            Similarity::Unavailable
        );
    }
}
