use crate::db::{DbConnection, DbPool};
use crate::domain::job::{NormalizedPosting, PersistedJob};

pub mod errors;
pub mod job;

pub use errors::{RepositoryError, RepositoryResult};

/// Diesel-backed repository over the job store.
///
/// Every operation checks one connection out of the pool, acts, and returns
/// it. Concurrent writers across processes are not coordinated here; callers
/// run one loader at a time.
#[derive(Clone)]
pub struct DieselRepository {
    pool: DbPool,
}

impl DieselRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub(crate) fn conn(&self) -> RepositoryResult<DbConnection> {
        Ok(self.pool.get()?)
    }
}

pub trait JobReader {
    /// Whether a row with this natural key is already stored.
    fn job_exists(&self, primary_key: &str) -> RepositoryResult<bool>;
    fn list_jobs(&self) -> RepositoryResult<Vec<PersistedJob>>;
}

pub trait JobWriter {
    /// Inserts a posting under its natural key. The caller checks existence
    /// first; a duplicate key surfaces as a database error.
    fn create_job(
        &self,
        posting: &NormalizedPosting,
        embedding: Option<&[f32]>,
    ) -> RepositoryResult<usize>;
    fn set_job_embedding(&self, job_id: i32, embedding: &[f32]) -> RepositoryResult<usize>;
}
