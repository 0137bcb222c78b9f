use anyhow::Result;
use chapter_portal::logger::{self, LogConfig};
use chapter_portal::{AppConfig, Portal};
use clap::Parser;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    // .env 缺失不是错误
    dotenv::dotenv().ok();

    let cfg = AppConfig::parse();
    logger::init(LogConfig::with_format(cfg.log_format));

    info!("starting chapter portal v{}", chapter_portal::VERSION);
    let portal = Portal::from_config(&cfg)?;
    portal.serve().await
}
