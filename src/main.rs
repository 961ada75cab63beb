use std::path::PathBuf;

use anyhow::Result;
use ar_trainer_lib::config::config_path_from_env;
use ar_trainer_lib::TrainerConfig;

const DEFAULT_CONTENT_DIR: &str = "fixtures";

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env before reading any environment settings
    dotenvy::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = TrainerConfig::load(config_path_from_env().as_deref())?;

    let content_dir = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONTENT_DIR));

    ar_trainer_lib::run(content_dir, config).await
}
