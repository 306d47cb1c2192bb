use sqlx::migrate::{MigrateError, Migrator};
use sqlx::postgres::{PgConnection, PgPool, PgPoolOptions};
use sqlx::Connection;
use std::io;
use std::time::{Duration, Instant};

pub type DbPool = PgPool;

/// Schema set applied to every database the application talks to.
pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

const MAX_CONNECTIONS: u32 = 10;
const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(3);
const MIN_ATTEMPT_TIMEOUT: Duration = Duration::from_millis(100);

pub async fn create_pool(database_url: &str) -> Result<DbPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(MAX_CONNECTIONS)
        .acquire_timeout(ACQUIRE_TIMEOUT)
        .connect(database_url)
        .await
}

pub async fn check_connection(pool: &DbPool) -> Result<bool, sqlx::Error> {
    sqlx::query("SELECT 1").fetch_one(pool).await.map(|_| true)
}

/// Apply `schema` to the database behind `pool`.
///
/// Versions already recorded in `_sqlx_migrations` are skipped, so running
/// this against an up-to-date database is a no-op.
pub async fn run_migrations(pool: &DbPool, schema: &Migrator) -> Result<(), MigrateError> {
    schema.run(pool).await?;
    tracing::info!(migrations = schema.iter().count(), "Database migrations applied");
    Ok(())
}

/// Backoff schedule for waiting on a database that is still starting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    pub initial_interval: Duration,
    pub max_interval: Duration,
    pub multiplier: u32,
    /// Total budget; no attempt starts after it has elapsed.
    pub timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            initial_interval: Duration::from_millis(100),
            max_interval: Duration::from_secs(5),
            multiplier: 2,
            timeout: Duration::from_secs(60),
        }
    }
}

impl RetryPolicy {
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            timeout,
            ..Self::default()
        }
    }

    /// Delay after the `attempt`-th failure (zero based).
    pub fn interval(&self, attempt: u32) -> Duration {
        self.initial_interval
            .saturating_mul(self.multiplier.saturating_pow(attempt))
            .min(self.max_interval)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConnectError {
    #[error("database not ready after {attempts} attempts in {elapsed:?}: {source}")]
    Timeout {
        attempts: u32,
        elapsed: Duration,
        #[source]
        source: sqlx::Error,
    },
}

/// Connect and ping until the database answers or `policy.timeout` runs out.
///
/// Failed attempts are only logged; the caller sees the last error once the
/// budget is spent.
pub async fn connect_with_retry(
    database_url: &str,
    policy: &RetryPolicy,
) -> Result<DbPool, ConnectError> {
    let started = Instant::now();
    let deadline = started + policy.timeout;
    let mut attempts: u32 = 0;

    loop {
        attempts += 1;
        let attempt_timeout = deadline
            .saturating_duration_since(Instant::now())
            .clamp(MIN_ATTEMPT_TIMEOUT, ACQUIRE_TIMEOUT);

        match try_connect(database_url, attempt_timeout).await {
            Ok(pool) => {
                tracing::info!(
                    attempts,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Database connection verified"
                );
                return Ok(pool);
            }
            Err(err) => {
                let remaining = deadline.saturating_duration_since(Instant::now());
                if remaining.is_zero() {
                    return Err(ConnectError::Timeout {
                        attempts,
                        elapsed: started.elapsed(),
                        source: err,
                    });
                }

                tracing::debug!(attempt = attempts, error = %err, "Database not ready yet");
                tokio::time::sleep(policy.interval(attempts - 1).min(remaining)).await;
            }
        }
    }
}

/// One connection plus `SELECT 1`, bounded by `attempt_timeout`.
///
/// The pool is only built once that connection has answered.
async fn try_connect(database_url: &str, attempt_timeout: Duration) -> Result<DbPool, sqlx::Error> {
    let probe = async {
        let mut conn = PgConnection::connect(database_url).await?;
        sqlx::query("SELECT 1").execute(&mut conn).await?;
        conn.close().await
    };

    match tokio::time::timeout(attempt_timeout, probe).await {
        Ok(result) => result?,
        Err(_) => {
            return Err(sqlx::Error::Io(io::Error::new(
                io::ErrorKind::TimedOut,
                format!("no answer within {:?}", attempt_timeout),
            )))
        }
    }

    create_pool(database_url).await
}
