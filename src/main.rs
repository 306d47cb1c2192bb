use ideahive_backend::infrastructure::config::{Config, LogFormat};
use ideahive_backend::infrastructure::db::{connect_with_retry, run_migrations, RetryPolicy, MIGRATOR};
use ideahive_backend::infrastructure::http::ServerHandle;
use ideahive_backend::App;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::from_env()?;

    // Initialize logging
    init_logging(&config);

    tracing::info!(
        environment = ?config.environment,
        "Starting IdeaHive Backend on {}:{}",
        config.host,
        config.port
    );

    // Wait for the database, it may still be starting alongside us
    let retry_policy = RetryPolicy::with_timeout(config.database_connect_timeout());
    let pool = connect_with_retry(&config.database_url, &retry_policy).await?;

    run_migrations(&pool, &MIGRATOR).await?;

    let address = config.server_address();
    let shutdown_timeout = config.shutdown_timeout();
    let app = App::new(config, pool)?;

    let server = ServerHandle::bind(&address, app.router())
        .await?
        .with_drain_timeout(shutdown_timeout);

    server.run_until(shutdown_signal()).await?;

    app.pool.close().await;
    tracing::info!("Shutdown complete");

    Ok(())
}

fn init_logging(config: &Config) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "ideahive_backend=debug,tower_http=debug".into());

    if config.log_format == LogFormat::Json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().pretty())
            .init();
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
