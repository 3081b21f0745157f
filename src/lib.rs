pub mod db;
pub mod domain;
pub mod models;
pub mod processing;
pub mod repository;
pub mod schema;
pub mod search;
pub mod staging;

/// Source tag embedded in staged file names.
pub const SOURCE_TAG: &str = "jobsearch";
