//! Helpers for integration tests.

use jobhunter::db::{DbPool, establish_connection_pool, init_schema};
use jobhunter::processing::embedding::{EmbeddingError, TextEmbedder};

/// Temporary database used in integration tests.
pub struct TestDb {
    filename: String,
    pool: DbPool,
}

impl TestDb {
    pub fn new(filename: &str) -> Self {
        std::fs::remove_file(filename).ok(); // Clean up old DB

        let pool =
            establish_connection_pool(filename).expect("Failed to establish SQLite connection.");
        let mut conn = pool
            .get()
            .expect("Failed to get SQLite connection from pool.");
        init_schema(&mut conn).expect("Failed to initialize schema.");
        drop(conn);

        TestDb {
            filename: filename.to_string(),
            pool,
        }
    }

    pub fn pool(&self) -> DbPool {
        self.pool.clone()
    }
}

impl Drop for TestDb {
    fn drop(&mut self) {
        std::fs::remove_file(&self.filename).ok();
        std::fs::remove_file(format!("{}-shm", &self.filename)).ok();
        std::fs::remove_file(format!("{}-wal", &self.filename)).ok();
    }
}

/// Deterministic embedder: folds bytes into a small fixed vector, so equal
/// texts embed equally and tests never touch a model.
pub struct StubEmbedder;

impl TextEmbedder for StubEmbedder {
    fn embed(&mut self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let mut vector = vec![0.1_f32; 8];
        for (i, byte) in text.bytes().enumerate() {
            vector[i % 8] += byte as f32 / 255.0;
        }
        Ok(vector)
    }
}
