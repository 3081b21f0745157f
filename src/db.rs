//! SQLite connection pooling and schema bootstrap.

use diesel::connection::SimpleConnection;
use diesel::r2d2::{ConnectionManager, Pool, PoolError, PooledConnection};
use diesel::sqlite::SqliteConnection;

pub type DbPool = Pool<ConnectionManager<SqliteConnection>>;
pub type DbConnection = PooledConnection<ConnectionManager<SqliteConnection>>;

/// Builds an r2d2 pool over the given SQLite database file, creating the
/// file on first use.
pub fn establish_connection_pool(database_url: &str) -> Result<DbPool, PoolError> {
    let manager = ConnectionManager::<SqliteConnection>::new(database_url);
    Pool::builder().build(manager)
}

/// Creates the jobs table and its natural-key index when missing. Safe to
/// run on every startup.
pub fn init_schema(conn: &mut SqliteConnection) -> diesel::QueryResult<()> {
    conn.batch_execute(
        "CREATE TABLE IF NOT EXISTS jobs (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            primary_key TEXT NOT NULL UNIQUE,
            date TEXT NOT NULL DEFAULT '',
            resume_similarity REAL NOT NULL DEFAULT 0,
            title TEXT NOT NULL DEFAULT '',
            company TEXT NOT NULL DEFAULT '',
            company_url TEXT NOT NULL DEFAULT '',
            location TEXT NOT NULL DEFAULT '',
            job_url TEXT NOT NULL DEFAULT '',
            description TEXT NOT NULL DEFAULT '',
            salary_low DOUBLE,
            salary_high DOUBLE,
            job_type TEXT,
            job_is_remote TEXT,
            job_benefits TEXT,
            embeddings BLOB
        );
        CREATE UNIQUE INDEX IF NOT EXISTS idx_jobs_primary_key ON jobs(primary_key);",
    )
}
