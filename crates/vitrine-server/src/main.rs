mod scheduler;

use std::sync::Arc;

use tracing_subscriber::EnvFilter;
use vitrine_db::PgStore;
use vitrine_engine::{RotationScheduler, SystemClock};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = vitrine_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let pool_config = vitrine_db::PoolConfig::from_app_config(&config);
    let pool = vitrine_db::connect_pool(&config.database_url, pool_config).await?;
    vitrine_db::ping(&pool).await?;
    let applied = vitrine_db::run_migrations(&pool).await?;
    if applied > 0 {
        tracing::info!(applied, "migrations applied");
    }

    let rotation = Arc::new(RotationScheduler::new(PgStore::new(pool), SystemClock));
    let _scheduler = scheduler::build_scheduler(rotation, &config.rotation_tick_cron).await?;

    tracing::info!(env = %config.env, "vitrine-server running; rotation tick registered");
    shutdown_signal().await;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to listen for ctrl-c");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, starting graceful shutdown");
}
