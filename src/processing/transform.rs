//! Normalization pipeline over a batch of raw postings.

use std::collections::HashSet;
use std::time::Duration;

use serde_json::Value;

use crate::domain::job::{NormalizedPosting, RawPosting, Similarity};
use crate::processing::embedding::{TextEmbedder, resume_similarity};
use crate::processing::salary::parse_salary;
use crate::processing::scrape::DescriptionFetcher;

/// Source-specific keys that never make it into the normalized schema.
const NOISE_FIELDS: &[&str] = &[
    "job_id",
    "employer_logo",
    "job_google_link",
    "job_posting_language",
];

/// Renaming table from search-API field names to the normalized schema.
const KEY_MAP: &[(&str, &str)] = &[
    ("job_posted_at_datetime_utc", "date"),
    ("posted_date", "date"),
    ("job_title", "title"),
    ("employer_name", "company"),
    ("company_name", "company"),
    ("employer_website", "company_url"),
    ("job_location", "location"),
    ("job_description", "description"),
    ("job_employment_type", "job_type"),
    ("job_min_salary", "salary_low"),
    ("job_max_salary", "salary_high"),
];

/// Fields lower-cased for consistent matching downstream.
const LOWERCASE_FIELDS: &[&str] = &["title", "location", "company"];

#[derive(Debug, Default)]
struct TransformStats {
    raw: usize,
    deduplicated: usize,
    missing_keys: usize,
    descriptions_fetched: usize,
    scored: usize,
}

pub fn drop_noise_fields(batch: &mut [RawPosting]) {
    for record in batch.iter_mut() {
        for key in NOISE_FIELDS {
            record.remove(*key);
        }
    }
}

/// Serializes a value with recursively sorted object keys. Two structurally
/// equal records canonicalize to the same string regardless of key order or
/// nesting.
fn canonical_json(value: &Value, out: &mut String) {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            out.push('{');
            for (i, key) in keys.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&Value::String((*key).clone()).to_string());
                out.push(':');
                canonical_json(&map[key.as_str()], out);
            }
            out.push('}');
        }
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                canonical_json(item, out);
            }
            out.push(']');
        }
        other => out.push_str(&other.to_string()),
    }
}

/// Removes structural duplicates, keeping first occurrences in order.
/// Deduplicating an already-deduplicated batch is a no-op.
pub fn dedup(batch: Vec<RawPosting>) -> Vec<RawPosting> {
    let mut seen = HashSet::new();
    let mut unique = Vec::with_capacity(batch.len());
    for record in batch {
        let mut canonical = String::new();
        canonical_json(&Value::Object(record.clone()), &mut canonical);
        if seen.insert(canonical) {
            unique.push(record);
        }
    }
    unique
}

pub fn rename_keys(batch: &mut [RawPosting]) {
    for record in batch.iter_mut() {
        for (from, to) in KEY_MAP {
            if let Some(value) = record.remove(*from) {
                record.insert((*to).to_string(), value);
            }
        }
    }
}

pub fn lowercase_fields(batch: &mut [RawPosting]) {
    for record in batch.iter_mut() {
        for key in LOWERCASE_FIELDS {
            if let Some(Value::String(text)) = record.get_mut(*key) {
                *text = text.to_lowercase();
            }
        }
    }
}

fn string_field(record: &RawPosting, key: &str) -> Option<String> {
    match record.get(key)? {
        Value::String(text) => Some(text.clone()),
        Value::Null => None,
        Value::Bool(flag) => Some(flag.to_string()),
        Value::Number(number) => Some(number.to_string()),
        other => Some(other.to_string()),
    }
}

fn number_field(record: &RawPosting, key: &str) -> Option<f64> {
    match record.get(key)? {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.parse().ok(),
        _ => None,
    }
}

/// Fallback when the source reports no single location field.
fn composed_location(record: &RawPosting) -> Option<String> {
    let parts: Vec<String> = ["job_city", "job_state", "job_country"]
        .iter()
        .filter_map(|key| string_field(record, key))
        .filter(|part| !part.is_empty())
        .collect();
    if parts.is_empty() {
        None
    } else {
        Some(parts.join(", ").to_lowercase())
    }
}

fn to_normalized(record: &RawPosting) -> NormalizedPosting {
    NormalizedPosting {
        date: string_field(record, "date").unwrap_or_default(),
        title: string_field(record, "title").unwrap_or_default(),
        company: string_field(record, "company").unwrap_or_default(),
        company_url: string_field(record, "company_url").unwrap_or_default(),
        location: string_field(record, "location")
            .or_else(|| composed_location(record))
            .unwrap_or_default(),
        job_url: string_field(record, "job_url").unwrap_or_default(),
        description: string_field(record, "description").unwrap_or_default(),
        salary_low: number_field(record, "salary_low"),
        salary_high: number_field(record, "salary_high"),
        resume_similarity: Similarity::Unavailable,
        job_type: string_field(record, "job_type"),
        job_is_remote: string_field(record, "job_is_remote"),
        job_benefits: string_field(record, "job_benefits"),
        job_apply_link: string_field(record, "job_apply_link"),
    }
}

/// Runs the fixed normalization steps over a raw batch: drop noise, dedup,
/// rename, lowercase, enrich descriptions, extract salary, score against the
/// résumé. Per-record failures degrade that record, never the batch.
pub async fn transform_batch<E>(
    raw: Vec<RawPosting>,
    fetcher: &DescriptionFetcher,
    embedder: &mut E,
    resume_text: Option<&str>,
    embed_delay: Duration,
) -> Vec<NormalizedPosting>
where
    E: TextEmbedder + ?Sized,
{
    let mut stats = TransformStats {
        raw: raw.len(),
        ..Default::default()
    };

    let mut batch = raw;
    drop_noise_fields(&mut batch);
    let mut batch = dedup(batch);
    stats.deduplicated = batch.len();
    rename_keys(&mut batch);
    lowercase_fields(&mut batch);

    let mut postings = Vec::with_capacity(batch.len());
    for record in &batch {
        let mut posting = to_normalized(record);
        if posting.title.is_empty() || posting.company.is_empty() {
            log::warn!("Skipping raw record with missing title or company");
            stats.missing_keys += 1;
            continue;
        }

        if posting.description.is_empty() {
            let listing_url = posting
                .job_apply_link
                .as_deref()
                .filter(|url| !url.is_empty())
                .or_else(|| Some(posting.job_url.as_str()).filter(|url| !url.is_empty()));
            if let Some(url) = listing_url {
                posting.description = fetcher.fetch_text(url).await.unwrap_or_default();
                if !posting.description.is_empty() {
                    stats.descriptions_fetched += 1;
                }
            }
        }

        if posting.salary_low.is_none() && posting.salary_high.is_none() {
            let (low, high) = parse_salary(&posting.description);
            posting.salary_low = low;
            posting.salary_high = high;
        }
        // The thousands heuristic can invert bounds that straddle 100.
        if let (Some(low), Some(high)) = (posting.salary_low, posting.salary_high)
            && low > high
        {
            posting.salary_low = None;
            posting.salary_high = None;
        }

        if let Some(resume) = resume_text {
            posting.resume_similarity =
                resume_similarity(embedder, &posting.description, resume, embed_delay);
            if matches!(posting.resume_similarity, Similarity::Scored(_)) {
                stats.scored += 1;
            }
        }

        postings.push(posting);
    }

    log::info!(
        "Transformed {} raw records: {} after dedup, {} missing keys, {} descriptions fetched, {} scored",
        stats.raw,
        stats.deduplicated,
        stats.missing_keys,
        stats.descriptions_fetched,
        stats.scored,
    );

    postings
}
