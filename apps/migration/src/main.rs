//! Migration CLI tool.

use anyhow::bail;
use sea_orm_migration::prelude::*;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt().with_env_filter("info").init();

    let url_flag = std::env::args().any(|a| a == "-u" || a.starts_with("--database-url"));
    if std::env::var("DATABASE_URL").is_err() && !url_flag {
        bail!("DATABASE_URL is not set and no --database-url was given");
    }

    tracing::info!("Running database migrations");
    cli::run_cli(migration::Migrator).await;
    Ok(())
}
