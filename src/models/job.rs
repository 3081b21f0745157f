//! Diesel row models for the jobs table.

use bytemuck::cast_slice;
use diesel::prelude::*;

use crate::domain::job::{NormalizedPosting, PersistedJob};
use crate::schema::jobs;

#[derive(Debug, Queryable, Identifiable)]
#[diesel(table_name = jobs)]
pub struct Job {
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
    pub embeddings: Option<Vec<u8>>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = jobs)]
pub struct NewJob<'a> {
    pub primary_key: &'a str,
    pub date: &'a str,
    pub resume_similarity: f32,
    pub title: &'a str,
    pub company: &'a str,
    pub company_url: &'a str,
    pub location: &'a str,
    pub job_url: &'a str,
    pub description: &'a str,
    pub salary_low: Option<f64>,
    pub salary_high: Option<f64>,
    pub job_type: Option<&'a str>,
    pub job_is_remote: Option<&'a str>,
    pub job_benefits: Option<&'a str>,
    pub embeddings: Option<Vec<u8>>,
}

impl<'a> NewJob<'a> {
    pub fn from_posting(
        primary_key: &'a str,
        posting: &'a NormalizedPosting,
        embedding: Option<&[f32]>,
    ) -> Self {
        Self {
            primary_key,
            date: &posting.date,
            resume_similarity: posting.resume_similarity.score(),
            title: &posting.title,
            company: &posting.company,
            company_url: &posting.company_url,
            location: &posting.location,
            job_url: &posting.job_url,
            description: &posting.description,
            salary_low: posting.salary_low,
            salary_high: posting.salary_high,
            job_type: posting.job_type.as_deref(),
            job_is_remote: posting.job_is_remote.as_deref(),
            job_benefits: posting.job_benefits.as_deref(),
            embeddings: embedding.map(|vector| cast_slice(vector).to_vec()),
        }
    }
}

impl From<Job> for PersistedJob {
    fn from(job: Job) -> Self {
        PersistedJob {
            id: job.id,
            primary_key: job.primary_key,
            date: job.date,
            resume_similarity: job.resume_similarity,
            title: job.title,
            company: job.company,
            company_url: job.company_url,
            location: job.location,
            job_url: job.job_url,
            description: job.description,
            salary_low: job.salary_low,
            salary_high: job.salary_high,
            job_type: job.job_type,
            job_is_remote: job.job_is_remote,
            job_benefits: job.job_benefits,
            // Blob alignment is not guaranteed, so copy instead of casting
            // in place.
            embedding: job
                .embeddings
                .map(|blob| bytemuck::pod_collect_to_vec(&blob)),
        }
    }
}
