//! Pipeline orchestration: extract, transform, load.

use std::path::Path;
use std::time::Duration;

use thiserror::Error;

use crate::SOURCE_TAG;
use crate::domain::job::{NormalizedPosting, RawPosting};
use crate::models::config::AppConfig;
use crate::processing::embedding::{TextEmbedder, normalize_embedding};
use crate::processing::scrape::DescriptionFetcher;
use crate::processing::transform::transform_batch;
use crate::repository::{JobReader, JobWriter, RepositoryError};
use crate::search::{SearchApi, SearchClient};
use crate::staging::{self, StagingError};

pub mod embedding;
pub mod salary;
pub mod scrape;
pub mod transform;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Staging(#[from] StagingError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Counts reported by a full pipeline run. Per-record problems degrade these
/// counts instead of failing the run.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct PipelineReport {
    pub jobs_fetched: usize,
    pub jobs_transformed: usize,
    pub jobs_inserted: usize,
    pub jobs_skipped: usize,
}

/// Loader counts for one processed batch.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct LoadStats {
    pub inserted: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Fetches every page for every position/location pair and stages each
/// posting as one raw JSON file. A failing term is logged and the matrix
/// continues.
pub async fn extract<A: SearchApi>(
    config: &AppConfig,
    client: &SearchClient<A>,
) -> Result<usize, PipelineError> {
    staging::ensure_dirs(&config.raw_dir, &config.processed_dir)?;

    let mut fetched = 0;
    for position in &config.positions {
        for location in &config.locations {
            let term = search_term(position, location);
            log::info!("Searching for `{term}`");
            match client
                .fetch_all_pages(
                    &term,
                    config.search.pages,
                    &config.search.country,
                    &config.search.date_posted,
                )
                .await
            {
                Ok(postings) => {
                    for posting in &postings {
                        if let Err(error) = staging::stage(posting, SOURCE_TAG, &config.raw_dir) {
                            log::error!("Failed to stage raw posting: {error}");
                        }
                    }
                    log::info!("Found {} jobs for `{term}`", postings.len());
                    fetched += postings.len();
                }
                Err(error) => log::error!("Extraction failed for `{term}`: {error}"),
            }
        }
    }

    Ok(fetched)
}

fn search_term(position: &str, location: &str) -> String {
    if location.is_empty() {
        position.to_string()
    } else {
        format!("{position} in {location}")
    }
}

/// Reads raw staged files, runs the normalization pipeline, and stages the
/// processed batch.
pub async fn transform<E>(
    config: &AppConfig,
    fetcher: &DescriptionFetcher,
    embedder: &mut E,
) -> Result<usize, PipelineError>
where
    E: TextEmbedder + ?Sized,
{
    let raw_values = staging::load_all(&config.raw_dir)?;

    // Raw files hold either one posting or one page worth of postings.
    let mut batch: Vec<RawPosting> = Vec::new();
    for value in raw_values {
        match value {
            serde_json::Value::Object(record) => batch.push(record),
            serde_json::Value::Array(items) => {
                for item in items {
                    match item {
                        serde_json::Value::Object(record) => batch.push(record),
                        other => log::warn!("Skipping non-object raw record: {other}"),
                    }
                }
            }
            other => log::warn!("Skipping non-object raw record: {other}"),
        }
    }

    let resume_text = read_resume(config);
    let postings = transform_batch(
        batch,
        fetcher,
        embedder,
        resume_text.as_deref(),
        Duration::from_millis(config.embedding.inter_call_delay_ms),
    )
    .await;

    for posting in &postings {
        staging::stage(posting, SOURCE_TAG, &config.processed_dir)?;
    }

    Ok(postings.len())
}

fn read_resume(config: &AppConfig) -> Option<String> {
    let path = config.resume_path.as_ref()?;
    match std::fs::read_to_string(path) {
        Ok(text) => Some(text),
        Err(error) => {
            log::warn!(
                "Failed to read resume at {}; similarity scoring disabled: {error}",
                path.display()
            );
            None
        }
    }
}

/// Loads every processed posting into the job store. First write wins: an
/// existing `primary_key` row is logged and skipped, never updated. Safe to
/// re-run; record-level idempotence only, no batch atomicity.
pub fn load_processed<R, E>(
    processed_dir: &Path,
    repo: &R,
    embedder: &mut E,
) -> Result<LoadStats, PipelineError>
where
    R: JobReader + JobWriter,
    E: TextEmbedder + ?Sized,
{
    let values = staging::load_all(processed_dir)?;

    let mut stats = LoadStats::default();
    for value in values {
        let posting: NormalizedPosting = match serde_json::from_value(value) {
            Ok(posting) => posting,
            Err(error) => {
                log::warn!("Skipping malformed processed record: {error}");
                stats.failed += 1;
                continue;
            }
        };

        let primary_key = posting.primary_key();
        if repo.job_exists(&primary_key)? {
            log::info!("{primary_key} already in database, skipping");
            stats.skipped += 1;
            continue;
        }

        // Cache the posting's own embedding so downstream ranking never
        // recomputes it.
        let embedding = match embedder.embed(&format!("{} {}", posting.description, posting.title))
        {
            Ok(vector) => Some(normalize_embedding(&vector)),
            Err(error) => {
                log::warn!("Failed to embed `{primary_key}`: {error}");
                None
            }
        };

        repo.create_job(&posting, embedding.as_deref())?;
        log::info!("Uploaded {primary_key} to database");
        stats.inserted += 1;
    }

    Ok(stats)
}

/// Runs the full pipeline: clear staging, extract, transform, load.
pub async fn run<A, R, E>(
    config: &AppConfig,
    client: &SearchClient<A>,
    repo: &R,
    embedder: &mut E,
) -> Result<PipelineReport, PipelineError>
where
    A: SearchApi,
    R: JobReader + JobWriter,
    E: TextEmbedder + ?Sized,
{
    staging::ensure_dirs(&config.raw_dir, &config.processed_dir)?;
    // Staged leftovers of a previous run are cleared first.
    staging::clear(&config.raw_dir)?;
    staging::clear(&config.processed_dir)?;

    let jobs_fetched = extract(config, client).await?;

    let fetcher = DescriptionFetcher::new(config.search.page_concurrency.max(1));
    let jobs_transformed = transform(config, &fetcher, embedder).await?;

    let stats = load_processed(&config.processed_dir, repo, embedder)?;

    let report = PipelineReport {
        jobs_fetched,
        jobs_transformed,
        jobs_inserted: stats.inserted,
        jobs_skipped: stats.skipped,
    };
    log::info!(
        "Pipeline finished: {} fetched, {} transformed, {} inserted, {} skipped as duplicates",
        report.jobs_fetched,
        report.jobs_transformed,
        report.jobs_inserted,
        report.jobs_skipped,
    );

    Ok(report)
}
