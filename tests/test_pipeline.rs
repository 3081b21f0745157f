mod common;

use std::time::Duration;

use serde_json::json;
use tempfile::tempdir;

use jobhunter::SOURCE_TAG;
use jobhunter::domain::job::RawPosting;
use jobhunter::processing::load_processed;
use jobhunter::processing::scrape::DescriptionFetcher;
use jobhunter::processing::transform::transform_batch;
use jobhunter::repository::{DieselRepository, JobReader};
use jobhunter::staging;

use common::{StubEmbedder, TestDb};

fn raw_posting(company: &str, title: &str) -> RawPosting {
    json!({
        "job_title": title,
        "employer_name": company,
        "job_location": "Remote",
        "job_url": format!("https://example.com/{company}/{title}"),
        "job_description": format!("{title} at {company}. Salary $120,000.00 per year."),
    })
    .as_object()
    .expect("object literal")
    .clone()
}

#[tokio::test]
async fn transform_and_load_scenario() {
    let db = TestDb::new("test_transform_and_load_scenario.db");
    let repo = DieselRepository::new(db.pool());
    let mut embedder = StubEmbedder;
    let fetcher = DescriptionFetcher::new(1);

    // Three raw postings, one a structural duplicate of another.
    let raw = vec![
        raw_posting("Acme", "Engineer"),
        raw_posting("Globex", "Analyst"),
        raw_posting("Acme", "Engineer"),
    ];

    let postings = transform_batch(
        raw,
        &fetcher,
        &mut embedder,
        Some("seasoned engineer resume"),
        Duration::ZERO,
    )
    .await;

    assert_eq!(postings.len(), 2);
    for posting in &postings {
        assert_eq!(
            posting.primary_key(),
            format!("{} - {}", posting.company, posting.title)
        );
        assert_eq!(posting.salary_low, Some(120_000.0));
    }

    let processed = tempdir().expect("tempdir");
    for posting in &postings {
        staging::stage(posting, SOURCE_TAG, processed.path()).expect("stage");
    }

    let first = load_processed(processed.path(), &repo, &mut embedder).expect("first load");
    assert_eq!(first.inserted, 2);
    assert_eq!(first.skipped, 0);

    let after_first = repo.list_jobs().expect("list");
    assert_eq!(after_first.len(), 2);

    // Second load of the same batch: zero insertions, zero mutations.
    let second = load_processed(processed.path(), &repo, &mut embedder).expect("second load");
    assert_eq!(second.inserted, 0);
    assert_eq!(second.skipped, 2);

    let after_second = repo.list_jobs().expect("list again");
    assert_eq!(after_first, after_second);
}

#[tokio::test]
async fn load_skips_malformed_processed_files() {
    let db = TestDb::new("test_load_skips_malformed.db");
    let repo = DieselRepository::new(db.pool());
    let mut embedder = StubEmbedder;
    let fetcher = DescriptionFetcher::new(1);

    let postings = transform_batch(
        vec![raw_posting("Acme", "Engineer")],
        &fetcher,
        &mut embedder,
        None,
        Duration::ZERO,
    )
    .await;

    let processed = tempdir().expect("tempdir");
    for posting in &postings {
        staging::stage(posting, SOURCE_TAG, processed.path()).expect("stage");
    }
    // Unparseable JSON is dropped while reading the directory; well-formed
    // JSON of the wrong shape is counted by the loader.
    std::fs::write(processed.path().join("jobsearch-junk.json"), b"{oops")
        .expect("write junk file");
    std::fs::write(
        processed.path().join("jobsearch-wrong-shape.json"),
        br#"{"title": 123}"#,
    )
    .expect("write wrong-shape file");

    let stats = load_processed(processed.path(), &repo, &mut embedder).expect("load");
    assert_eq!(stats.inserted, 1);
    assert_eq!(stats.failed, 1);
    assert_eq!(repo.list_jobs().expect("list").len(), 1);
}

#[tokio::test]
async fn loaded_rows_carry_cached_embeddings() {
    let db = TestDb::new("test_loaded_rows_carry_embeddings.db");
    let repo = DieselRepository::new(db.pool());
    let mut embedder = StubEmbedder;
    let fetcher = DescriptionFetcher::new(1);

    let postings = transform_batch(
        vec![raw_posting("Acme", "Engineer")],
        &fetcher,
        &mut embedder,
        None,
        Duration::ZERO,
    )
    .await;

    let processed = tempdir().expect("tempdir");
    for posting in &postings {
        staging::stage(posting, SOURCE_TAG, processed.path()).expect("stage");
    }
    load_processed(processed.path(), &repo, &mut embedder).expect("load");

    let jobs = repo.list_jobs().expect("list");
    let embedding = jobs[0].embedding.as_ref().expect("cached embedding");
    // Stored embeddings are unit-normalized.
    let norm = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
    assert!((norm - 1.0).abs() < 1e-5);
}
