use pam::api::{create_app_state, router};
use pam::clients::{ClientError, PamClient};
use pam::config::{Config, SecurityConfig};
use pam::db::Store;
use pam::domain::DataKind;
use pam::services::ManualClock;
use std::sync::Arc;

/// Serves the real router over SQLite on an ephemeral port.
async fn spawn_server() -> (String, Arc<ManualClock>) {
    let mut config = Config::default();
    config.security = SecurityConfig {
        argon2_memory_cost_kib: 256,
        argon2_time_cost: 1,
        argon2_parallelism: 1,
    };

    let store = Store::in_memory().await.expect("in-memory sqlite");
    let clock = Arc::new(ManualClock::default());
    let state = create_app_state(config, Arc::new(store), clock.clone(), None);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, router(state)).await.unwrap();
    });

    (format!("http://{addr}"), clock)
}

#[tokio::test]
async fn client_round_trip() {
    let (url, clock) = spawn_server().await;
    let client = PamClient::new(&url).unwrap();

    client.register("alice", "pw1").await.unwrap();
    client
        .upload("bank pin", DataKind::Credential, b"1234")
        .await
        .unwrap();

    let (kind, bytes) = client.get("bank pin").await.unwrap();
    assert_eq!(kind, DataKind::Credential);
    assert_eq!(bytes, b"1234");
    assert_eq!(client.list().await.unwrap(), vec!["bank pin"]);

    clock.advance(chrono::Duration::seconds(301));
    assert!(matches!(
        client.get("bank pin").await,
        Err(ClientError::Unauthenticated)
    ));

    client.authenticate("alice", "pw1").await.unwrap();
    assert_eq!(client.get("bank pin").await.unwrap().1, b"1234");
}

#[tokio::test]
async fn client_maps_domain_failures() {
    let (url, _) = spawn_server().await;
    let client = PamClient::new(&url).unwrap();

    client.register("alice", "pw1").await.unwrap();

    let other = PamClient::new(&url).unwrap();
    assert!(matches!(
        other.register("alice", "pw2").await,
        Err(ClientError::UsernameTaken)
    ));
    assert!(matches!(
        other.authenticate("alice", "nope").await,
        Err(ClientError::WrongCredentials)
    ));
    assert!(matches!(
        other.list().await,
        Err(ClientError::Unauthenticated)
    ));

    assert!(matches!(
        client.get("missing").await,
        Err(ClientError::DataDoesNotExist)
    ));
}
