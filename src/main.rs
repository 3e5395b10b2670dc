mod config;
mod database;
mod merge;
mod models;
mod report;
mod utils;

use config::MergeConfig;
use database::MongoDB;
use dotenv::dotenv;
use merge::processor::RunSummary;
use merge::IdentityMergeProcessor;
use std::process::ExitCode;
use utils::AppError;

#[tokio::main]
async fn main() -> ExitCode {
    // Load environment variables
    dotenv().ok();

    // Initialize logger
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    match execute().await {
        Ok(summary) => {
            report::print_summary(&summary);
            ExitCode::SUCCESS
        }
        Err(e) => {
            log::error!("❌ Merge aborted: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn execute() -> Result<RunSummary, AppError> {
    let config = MergeConfig::from_env()?;

    report::print_banner(&config.users_collection, config.dry_run);
    log::info!("📊 Database: {}", config.database_name);

    let db = MongoDB::new(
        &config.database_url,
        &config.database_name,
        &config.users_collection,
    )
    .await?;
    log::info!("✅ MongoDB connected successfully");

    let outcome = IdentityMergeProcessor::new(&db, config.prefixes.clone(), config.dry_run)
        .run()
        .await;

    // Closed on success and on error alike
    db.close().await;

    outcome
}
