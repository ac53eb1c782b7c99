mod departments;
mod documents;
mod employees;
mod onboarding;
mod payroll;
mod problem;
mod profile;
mod recruitment;
mod rostering;
mod router;
mod telemetry;
mod travel;
mod workflow;

use std::net::SocketAddr;

use tracing::info;
use workright_storage::Database;
use workright_util::{load_env_file, AppConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    load_env_file();
    let config = AppConfig::from_env()?;

    telemetry::init_tracing(&config)?;
    let metrics = telemetry::init_metrics()?;

    let database = Database::connect_with(&config.database_url, config.db_max_connections).await?;
    database.run_migrations().await?;
    info!(stage = "storage", url = %config.database_url, "database ready");

    let state = router::AppState::new(metrics, database);

    let addr: SocketAddr = config.bind_addr;
    info!(stage = "app", %addr, env = %config.environment.as_str(), "starting HTTP server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router::app_router(state))
        .await
        .map_err(|err| err.into())
}
