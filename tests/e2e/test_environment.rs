use crate::e2e::helpers;

use helpers::{EnvironmentError, ProvisionOptions, TestEnvironment};
use hyper::StatusCode;
use ideahive_backend::infrastructure::config::DatabaseSettings;
use ideahive_backend::infrastructure::db::{
    check_connection, connect_with_retry, run_migrations, RetryPolicy, MIGRATOR,
};
use pretty_assertions::assert_eq;
use serial_test::serial;
use std::net::SocketAddr;
use std::time::{Duration, Instant};
use test_context::test_context;
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

/// Points testcontainers at another Docker endpoint until dropped
struct DockerHostOverride {
    previous: Option<String>,
}

impl DockerHostOverride {
    fn set(value: &str) -> Self {
        let previous = std::env::var("DOCKER_HOST").ok();
        std::env::set_var("DOCKER_HOST", value);
        Self { previous }
    }
}

impl Drop for DockerHostOverride {
    fn drop(&mut self) {
        match &self.previous {
            Some(value) => std::env::set_var("DOCKER_HOST", value),
            None => std::env::remove_var("DOCKER_HOST"),
        }
    }
}

async fn eventually_unreachable(host: &str, port: u16, within: Duration) -> bool {
    let deadline = Instant::now() + within;
    loop {
        if TcpStream::connect((host, port)).await.is_err() {
            return true;
        }
        if Instant::now() >= deadline {
            return false;
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
}

/// A loopback port nothing is listening on right now
async fn free_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap().port()
}

/// Start relaying `port` to `upstream` only after `delay` has passed
fn forward_after(delay: Duration, port: u16, upstream: SocketAddr) -> JoinHandle<()> {
    tokio::spawn(async move {
        tokio::time::sleep(delay).await;
        let listener = TcpListener::bind(("127.0.0.1", port)).await.unwrap();
        while let Ok((mut inbound, _)) = listener.accept().await {
            tokio::spawn(async move {
                if let Ok(mut outbound) = TcpStream::connect(upstream).await {
                    let _ = tokio::io::copy_bidirectional(&mut inbound, &mut outbound).await;
                }
            });
        }
    })
}

#[test_context(TestEnvironment)]
#[tokio::test]
#[serial]
async fn it_should_build_connection_string_from_the_assigned_port(env: &mut TestEnvironment) {
    let assigned_port = env.store().mapped_port().await.unwrap();
    let database = env.database();

    assert_eq!(database.port, assigned_port);
    assert_eq!(env.config.database_url, database.connection_string());
    assert_eq!(
        env.config.database_url,
        format!(
            "postgres://postgres:secret@{}:{}/testdb?sslmode=disable",
            database.host, assigned_port
        )
    );
}

#[test_context(TestEnvironment)]
#[tokio::test]
#[serial]
async fn it_should_keep_the_application_listen_address_in_config(env: &mut TestEnvironment) {
    assert_eq!(env.config.server_address(), "0.0.0.0:8080");

    // The test listener itself is on an OS-assigned loopback port
    let listener = env.listener_addr();
    assert!(listener.ip().is_loopback());
    assert_ne!(listener.port(), 8080);
}

#[test_context(TestEnvironment)]
#[tokio::test]
#[serial]
async fn it_should_answer_ping_and_http_right_after_setup(env: &mut TestEnvironment) {
    assert!(check_connection(&env.pool).await.unwrap());

    // Any status will do; the connection itself must succeed
    let response = env.client.get("/").await.unwrap();
    response.assert_status(StatusCode::NOT_FOUND);

    let response = env.client.get("/health").await.unwrap();
    response.assert_status(StatusCode::OK);
}

#[test_context(TestEnvironment)]
#[tokio::test]
#[serial]
async fn it_should_keep_polling_until_the_database_starts_answering(env: &mut TestEnvironment) {
    let database = env.database().clone();
    let upstream = tokio::net::lookup_host((database.host.as_str(), database.port))
        .await
        .unwrap()
        .find(SocketAddr::is_ipv4)
        .expect("no ipv4 address for the database host");

    let port = free_port().await;
    let delay = Duration::from_millis(500);
    let forwarder = forward_after(delay, port, upstream);

    let late = DatabaseSettings {
        host: "127.0.0.1".to_string(),
        port,
        ..database
    };
    let policy = RetryPolicy {
        initial_interval: Duration::from_millis(50),
        max_interval: Duration::from_millis(200),
        multiplier: 2,
        timeout: Duration::from_secs(10),
    };

    let started = Instant::now();
    let pool = connect_with_retry(&late.connection_string(), &policy)
        .await
        .unwrap();

    assert!(started.elapsed() >= delay);
    assert!(check_connection(&pool).await.unwrap());

    pool.close().await;
    forwarder.abort();
}

#[test_context(TestEnvironment)]
#[tokio::test]
#[serial]
async fn it_should_derive_the_connect_timeout_from_the_readiness_budget(
    env: &mut TestEnvironment,
) {
    assert_eq!(
        env.config.database_connect_timeout(),
        ProvisionOptions::default().readiness.timeout
    );
}

#[test_context(TestEnvironment)]
#[tokio::test]
#[serial]
async fn it_should_migrate_idempotently(env: &mut TestEnvironment) {
    let schema_before = env.fixtures.schema_snapshot().await.unwrap();
    let migrations_before = env.fixtures.applied_migrations().await.unwrap();

    run_migrations(&env.pool, &MIGRATOR).await.unwrap();
    run_migrations(&env.pool, &MIGRATOR).await.unwrap();

    assert_eq!(env.fixtures.schema_snapshot().await.unwrap(), schema_before);
    assert_eq!(
        env.fixtures.applied_migrations().await.unwrap(),
        migrations_before
    );
    assert_eq!(migrations_before.len(), MIGRATOR.iter().count());

    let idea_columns: Vec<&str> = schema_before
        .iter()
        .filter(|(table, ..)| table == "ideas")
        .map(|(_, column, ..)| column.as_str())
        .collect();
    assert_eq!(
        idea_columns,
        vec!["id", "title", "description", "created_at", "updated_at"]
    );
}

#[test_context(TestEnvironment)]
#[tokio::test]
#[serial]
async fn it_should_enforce_primary_key_uniqueness(env: &mut TestEnvironment) {
    let idea = env.fixtures.create_idea("Unique", None).await.unwrap();

    let duplicate = sqlx::query("INSERT INTO ideas (id, title) VALUES ($1, 'Again')")
        .bind(idea.id)
        .execute(&env.pool)
        .await;

    let err = duplicate.unwrap_err();
    let db_err = err.as_database_error().expect("expected a database error");
    assert!(db_err.is_unique_violation());
}

#[tokio::test]
#[serial]
async fn it_should_release_listener_and_store_on_teardown() {
    let env = TestEnvironment::setup().await.unwrap();
    let listener = env.listener_addr();
    let host = env.database().host.clone();
    let port = env.database().port;

    env.teardown().await.unwrap();

    assert!(TcpStream::connect(listener).await.is_err());
    assert!(
        eventually_unreachable(&host, port, Duration::from_secs(10)).await,
        "database still reachable on {}:{} after teardown",
        host,
        port
    );
}

#[tokio::test]
#[serial]
async fn it_should_give_each_environment_its_own_store() {
    let first = TestEnvironment::setup().await.unwrap();
    let second = TestEnvironment::setup().await.unwrap();

    assert_ne!(first.store().container_id(), second.store().container_id());
    assert_ne!(first.database().port, second.database().port);
    assert_ne!(first.listener_addr(), second.listener_addr());

    first.fixtures.create_idea("Only in first", None).await.unwrap();
    assert_eq!(first.fixtures.idea_count().await.unwrap(), 1);
    assert_eq!(second.fixtures.idea_count().await.unwrap(), 0);

    first.teardown().await.unwrap();
    second.teardown().await.unwrap();
}

#[tokio::test]
#[serial]
async fn it_should_fail_setup_when_container_backend_is_unreachable() {
    let _docker_host = DockerHostOverride::set("tcp://127.0.0.1:1");

    let options = ProvisionOptions {
        readiness: RetryPolicy::with_timeout(Duration::from_secs(1)),
        ..ProvisionOptions::default()
    };
    let listen_port = free_port().await;
    let listen_addr = format!("127.0.0.1:{}", listen_port);

    match TestEnvironment::setup_listening_on(options, &listen_addr).await {
        Err(EnvironmentError::Provision(_)) => {}
        Err(other) => panic!("expected a provisioning error, got {other}"),
        Ok(env) => {
            let _ = env.teardown().await;
            panic!("setup succeeded against an unreachable backend");
        }
    }

    // Provisioning failed first, so no listener was ever bound
    assert!(
        TcpStream::connect(("127.0.0.1", listen_port)).await.is_err(),
        "something is listening on {} after a failed setup",
        listen_addr
    );
}

#[tokio::test]
#[serial]
async fn it_should_fail_setup_when_image_cannot_be_pulled() {
    let options = ProvisionOptions {
        image_tag: "no-such-tag-for-ideahive-tests".to_string(),
        ..ProvisionOptions::default()
    };

    let result = TestEnvironment::setup_with(options).await;

    assert!(matches!(result, Err(EnvironmentError::Provision(_))));
}
