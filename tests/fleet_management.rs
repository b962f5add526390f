mod common;

use common::{FakeRuntime, RecordingNotifier, fleet, seeded_store};
use epoxi::container::StatsSample;
use epoxi::fleet::{FleetError, NewServer};
use epoxi::notify::Channel;
use epoxi::proxy::ProxyRoutes;
use epoxi::schema::{JavaRuntime, Modpack};
use epoxi::store::{MemoryStore, Store, StoreError};
use std::sync::Arc;
use tempfile::TempDir;

fn forge() -> Modpack {
    Modpack {
        id: "forge".to_string(),
        startup_script: "run.sh".to_string(),
        java_runtime: JavaRuntime::Java17,
    }
}

fn new_server(id: &str, hostname: &str) -> NewServer {
    NewServer {
        id: id.to_string(),
        name: format!("Server {}", id),
        startup_script: "start.sh".to_string(),
        java_runtime: JavaRuntime::Java21,
        proxy_hostname: hostname.to_string(),
        initial_season: None,
    }
}

#[tokio::test]
async fn test_register_modpack_creates_template_volume() {
    let runtime = FakeRuntime::new();
    let store = Arc::new(MemoryStore::new());
    let notifier = RecordingNotifier::new();
    let fleet = fleet(&runtime, &store, &notifier, None);

    let modpack = fleet.register_modpack(forge()).await.unwrap();

    assert_eq!(modpack.id, "forge");
    assert!(runtime.has_volume("epoxi-modpack_forge"));
    assert_eq!(fleet.list_modpacks().await.unwrap(), vec![forge()]);
}

#[tokio::test]
async fn test_duplicate_modpack_is_a_conflict() {
    let runtime = FakeRuntime::new();
    let store = Arc::new(MemoryStore::new());
    let notifier = RecordingNotifier::new();
    let fleet = fleet(&runtime, &store, &notifier, None);

    fleet.register_modpack(forge()).await.unwrap();
    let err = fleet.register_modpack(forge()).await.unwrap_err();

    assert!(matches!(
        err,
        FleetError::Store(StoreError::AlreadyExists { .. })
    ));
    assert_eq!(
        runtime
            .calls()
            .iter()
            .filter(|call| *call == "create_volume epoxi-modpack_forge")
            .count(),
        1
    );
}

#[tokio::test]
async fn test_invalid_modpack_touches_nothing() {
    let runtime = FakeRuntime::new();
    let store = Arc::new(MemoryStore::new());
    let notifier = RecordingNotifier::new();
    let fleet = fleet(&runtime, &store, &notifier, None);

    let err = fleet
        .register_modpack(Modpack {
            startup_script: "../escape.sh".to_string(),
            ..forge()
        })
        .await
        .unwrap_err();

    assert!(matches!(err, FleetError::Validation(_)));
    assert!(runtime.calls().is_empty());
    assert!(store.list_modpacks().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_delete_modpack_removes_volume() {
    let runtime = FakeRuntime::new();
    let store = Arc::new(MemoryStore::new());
    let notifier = RecordingNotifier::new();
    let fleet = fleet(&runtime, &store, &notifier, None);
    fleet.register_modpack(forge()).await.unwrap();

    fleet.delete_modpack("forge").await.unwrap();

    assert!(!runtime.has_volume("epoxi-modpack_forge"));
    assert!(store.list_modpacks().await.unwrap().is_empty());
    assert!(notifier.sent().is_empty());
}

#[tokio::test]
async fn test_delete_modpack_survives_missing_volume() {
    let runtime = FakeRuntime::new();
    let store = seeded_store().await;
    let notifier = RecordingNotifier::new();
    let fleet = fleet(&runtime, &store, &notifier, None);

    fleet.delete_modpack("vanilla").await.unwrap();

    assert!(store.list_modpacks().await.unwrap().is_empty());
    assert_eq!(
        notifier.count_containing(Channel::Admin, "remove modpack volume failed"),
        1
    );
    assert!(fleet.delete_modpack("vanilla").await.unwrap_err().is_not_found());
}

#[tokio::test]
async fn test_register_server_defaults_and_routes() {
    let dir = TempDir::new().unwrap();
    let hosts = dir.path().join("proxy").join("hosts.json");
    let runtime = FakeRuntime::new();
    let store = Arc::new(MemoryStore::new());
    let notifier = RecordingNotifier::new();
    let fleet = fleet(&runtime, &store, &notifier, Some(hosts.clone()));

    let server = fleet
        .register_server(new_server("02", "mc.example.org"))
        .await
        .unwrap();

    assert_eq!(server.current_season, "02.000.00");
    assert_eq!(fleet.get_server("02").await.unwrap(), server);
    // Registration does not touch the runtime.
    assert!(runtime.calls().is_empty());

    let mappings = ProxyRoutes::new(&hosts).mappings().await.unwrap();
    assert_eq!(
        mappings.get("mc.example.org").map(String::as_str),
        Some("epoxi-server-02:25565")
    );
}

#[tokio::test]
async fn test_register_server_rejects_invalid_fields() {
    let runtime = FakeRuntime::new();
    let store = Arc::new(MemoryStore::new());
    let notifier = RecordingNotifier::new();
    let fleet = fleet(&runtime, &store, &notifier, None);

    let err = fleet
        .register_server(new_server("02", "not a hostname"))
        .await
        .unwrap_err();
    assert!(matches!(err, FleetError::Validation(_)));

    let err = fleet
        .register_server(NewServer {
            initial_season: Some("2.1.0".to_string()),
            ..new_server("02", "")
        })
        .await
        .unwrap_err();
    assert!(matches!(err, FleetError::Validation(_)));

    assert!(fleet.list_servers().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_update_hostname_moves_route() {
    let dir = TempDir::new().unwrap();
    let hosts = dir.path().join("hosts.json");
    tokio::fs::write(&hosts, r#"{"mappings": {}, "listen": ":25565"}"#)
        .await
        .unwrap();
    let runtime = FakeRuntime::new();
    let store = Arc::new(MemoryStore::new());
    let notifier = RecordingNotifier::new();
    let fleet = fleet(&runtime, &store, &notifier, Some(hosts.clone()));
    fleet
        .register_server(new_server("02", "old.example.org"))
        .await
        .unwrap();

    let server = fleet
        .update_hostname("02", "new.example.org")
        .await
        .unwrap();

    assert_eq!(server.proxy_hostname, "new.example.org");
    assert_eq!(
        store.get_server("02").await.unwrap().proxy_hostname,
        "new.example.org"
    );

    let mappings = ProxyRoutes::new(&hosts).mappings().await.unwrap();
    assert!(!mappings.contains_key("old.example.org"));
    assert!(mappings.contains_key("new.example.org"));

    let document: serde_json::Value =
        serde_json::from_str(&tokio::fs::read_to_string(&hosts).await.unwrap()).unwrap();
    assert_eq!(document["listen"], ":25565");
}

#[tokio::test]
async fn test_broken_proxy_file_does_not_fail_registration() {
    let dir = TempDir::new().unwrap();
    let hosts = dir.path().join("hosts.json");
    tokio::fs::write(&hosts, "not json").await.unwrap();
    let runtime = FakeRuntime::new();
    let store = Arc::new(MemoryStore::new());
    let notifier = RecordingNotifier::new();
    let fleet = fleet(&runtime, &store, &notifier, Some(hosts.clone()));

    fleet
        .register_server(new_server("02", "mc.example.org"))
        .await
        .unwrap();

    assert_eq!(
        notifier.count_containing(Channel::Admin, "update proxy route failed"),
        1
    );
    assert_eq!(tokio::fs::read_to_string(&hosts).await.unwrap(), "not json");
}

#[tokio::test(start_paused = true)]
async fn test_delete_server_removes_container_row_and_route() {
    let dir = TempDir::new().unwrap();
    let hosts = dir.path().join("hosts.json");
    let runtime = FakeRuntime::new();
    let store = Arc::new(MemoryStore::new());
    let notifier = RecordingNotifier::new();
    let fleet = fleet(&runtime, &store, &notifier, Some(hosts.clone()));
    fleet
        .register_server(new_server("02", "mc.example.org"))
        .await
        .unwrap();
    fleet.create("02").await.unwrap();
    fleet.start("02").await.unwrap();

    fleet.delete_server("02").await.unwrap();

    assert!(runtime.container("epoxi-server-02").is_none());
    assert!(fleet.get_server("02").await.unwrap_err().is_not_found());
    assert!(ProxyRoutes::new(&hosts).mappings().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_delete_server_without_container() {
    let runtime = FakeRuntime::new();
    let store = seeded_store().await;
    let notifier = RecordingNotifier::new();
    let fleet = fleet(&runtime, &store, &notifier, None);

    fleet.delete_server("01").await.unwrap();

    assert!(store.list_servers().await.unwrap().is_empty());
    assert!(notifier.on(Channel::Admin).is_empty());
}

#[tokio::test]
async fn test_delete_server_keeps_row_when_removal_fails() {
    let runtime = FakeRuntime::with_running("epoxi-server-01");
    runtime.fail("remove");
    let store = seeded_store().await;
    let notifier = RecordingNotifier::new();
    let fleet = fleet(&runtime, &store, &notifier, None);

    let err = fleet.delete_server("01").await.unwrap_err();

    assert!(matches!(err, FleetError::Lifecycle(_)));
    assert!(store.get_server("01").await.is_ok());
}

#[tokio::test]
async fn test_status_all_reports_every_server() {
    let runtime = FakeRuntime::with_running("epoxi-server-01");
    runtime.set_stats(
        "epoxi-server-01",
        StatsSample {
            cpu_delta: 10,
            system_delta: 100,
            core_count: 1,
            memory_usage: 100,
            memory_limit: 400,
        },
    );
    let store = seeded_store().await;
    let notifier = RecordingNotifier::new();
    let fleet = fleet(&runtime, &store, &notifier, None);
    fleet
        .register_server(new_server("02", ""))
        .await
        .unwrap();

    let statuses = fleet.status_all().await.unwrap();

    assert_eq!(statuses.len(), 2);
    let first = statuses.iter().find(|s| s.server_id == "01").unwrap();
    assert!(first.running);
    assert!((first.memory_percent - 25.0).abs() < 1e-9);
    let second = statuses.iter().find(|s| s.server_id == "02").unwrap();
    assert!(!second.running);
}

#[tokio::test]
async fn test_lifecycle_on_unknown_server() {
    let runtime = FakeRuntime::new();
    let store = Arc::new(MemoryStore::new());
    let notifier = RecordingNotifier::new();
    let fleet = fleet(&runtime, &store, &notifier, None);

    assert!(fleet.create("09").await.unwrap_err().is_not_found());
    assert!(fleet.status("09").await.unwrap_err().is_not_found());
    assert!(matches!(
        fleet.stop("Bad Id").await.unwrap_err(),
        FleetError::Validation(_)
    ));
    assert!(runtime.calls().is_empty());
}
