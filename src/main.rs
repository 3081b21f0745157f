use std::env;

use jobhunter::db::{establish_connection_pool, init_schema};
use jobhunter::models::config::AppConfig;
use jobhunter::processing;
use jobhunter::processing::embedding::FastembedEmbedder;
use jobhunter::repository::DieselRepository;
use jobhunter::search::{HttpSearchApi, SearchClient};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let config_path = env::var("JOBHUNTER_CONFIG").unwrap_or_else(|_| "config".to_string());
    let config = match AppConfig::load(&config_path) {
        Ok(config) => config,
        Err(e) => {
            log::error!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };
    if config.positions.is_empty() {
        log::error!("No search positions configured; nothing to do");
        std::process::exit(1);
    }

    let pool = match establish_connection_pool(&config.database_url) {
        Ok(pool) => pool,
        Err(e) => {
            log::error!("Failed to establish database connection: {e}");
            std::process::exit(1);
        }
    };
    match pool.get() {
        Ok(mut conn) => {
            if let Err(e) = init_schema(&mut conn) {
                log::error!("Failed to initialize database schema: {e}");
                std::process::exit(1);
            }
        }
        Err(e) => {
            log::error!("Failed to get database connection: {e}");
            std::process::exit(1);
        }
    }
    let repo = DieselRepository::new(pool);

    let mut embedder = match FastembedEmbedder::new() {
        Ok(embedder) => embedder,
        Err(e) => {
            log::error!("Failed to initialize embedder: {e}");
            std::process::exit(1);
        }
    };

    let api = HttpSearchApi::new(&config.search);
    let client = SearchClient::new(api, config.search.clone());

    match processing::run(&config, &client, &repo, &mut embedder).await {
        Ok(report) => log::info!(
            "Run complete: {} jobs fetched, {} transformed, {} inserted, {} skipped",
            report.jobs_fetched,
            report.jobs_transformed,
            report.jobs_inserted,
            report.jobs_skipped,
        ),
        Err(e) => {
            log::error!("Pipeline failed: {e}");
            std::process::exit(1);
        }
    }
}
