use diesel::prelude::*;

use crate::domain::job::{NormalizedPosting, PersistedJob};
use crate::models::job::{Job, NewJob};
use crate::repository::{DieselRepository, JobReader, JobWriter, RepositoryResult};

impl JobReader for DieselRepository {
    fn job_exists(&self, primary_key: &str) -> RepositoryResult<bool> {
        use crate::schema::jobs;

        let mut conn = self.conn()?;

        let count: i64 = jobs::table
            .filter(jobs::primary_key.eq(primary_key))
            .count()
            .get_result(&mut conn)?;

        Ok(count > 0)
    }

    fn list_jobs(&self) -> RepositoryResult<Vec<PersistedJob>> {
        use crate::schema::jobs;

        let mut conn = self.conn()?;

        let rows = jobs::table.order(jobs::id.asc()).load::<Job>(&mut conn)?;

        Ok(rows.into_iter().map(Into::into).collect())
    }
}

impl JobWriter for DieselRepository {
    fn create_job(
        &self,
        posting: &NormalizedPosting,
        embedding: Option<&[f32]>,
    ) -> RepositoryResult<usize> {
        use crate::schema::jobs;

        let mut conn = self.conn()?;

        let primary_key = posting.primary_key();
        let new_job = NewJob::from_posting(&primary_key, posting, embedding);

        let inserted = diesel::insert_into(jobs::table)
            .values(&new_job)
            .execute(&mut conn)?;

        Ok(inserted)
    }

    fn set_job_embedding(&self, job_id: i32, embedding: &[f32]) -> RepositoryResult<usize> {
        use crate::schema::jobs;

        let mut conn = self.conn()?;

        // Convert &[f32] to &[u8]
        let blob: Vec<u8> = bytemuck::cast_slice(embedding).to_vec();

        let affected = diesel::update(jobs::table.filter(jobs::id.eq(job_id)))
            .set(jobs::embeddings.eq(blob))
            .execute(&mut conn)?;

        Ok(affected)
    }
}
