use dotenvy::dotenv;
use expense_tracker::backend;
use expense_tracker::database::db::{connection, migrate};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let pool = connection::get_db_pool().await?;
    migrate::run_migrations(&pool).await?;

    backend::run_server(pool).await?;
    Ok(())
}
