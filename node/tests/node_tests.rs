//! Node wiring: storage backends, persistence across restarts and the
//! served HTTP API.

use std::time::Duration;

use cadastre_ledger::LedgerStatus;
use cadastre_node::{CadastreNode, NodeConfig, NodeError, StorageBackend};
use cadastre_types::{OwnerAddress, ParcelId};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

const OWNER: &str = "0x52908400098527886e0f7030069857d2e4169ee7";
const AUTHORITY: &str = "0x8617e340b3d01fa5f11f306f4090fd50e238070d";

fn memory_config() -> NodeConfig {
    NodeConfig {
        storage: StorageBackend::Memory,
        bind_address: "127.0.0.1".into(),
        rpc_port: 0,
        session_secret: Some("node-test-session".into()),
        vault_secret: Some("node-test-vault".into()),
        authority_addresses: vec![AUTHORITY.into()],
        ..NodeConfig::default()
    }
}

fn lmdb_config(dir: &std::path::Path) -> NodeConfig {
    NodeConfig {
        storage: StorageBackend::Lmdb,
        data_dir: dir.join("data"),
        lmdb_map_size: 16 * 1024 * 1024,
        ledger_snapshot: Some(dir.join("ledger.json")),
        ..memory_config()
    }
}

async fn http_get(addr: std::net::SocketAddr, path: &str) -> String {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    let request = format!("GET {path} HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n");
    stream.write_all(request.as_bytes()).await.unwrap();
    let mut response = String::new();
    stream.read_to_string(&mut response).await.unwrap();
    response
}

#[tokio::test]
async fn memory_node_serves_health_and_stops_on_request() {
    let node = CadastreNode::new(memory_config()).unwrap();
    let stop = node.shutdown_handle();

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = tokio::spawn(node.run_on(listener));

    let health = http_get(addr, "/api/health").await;
    assert!(health.starts_with("HTTP/1.1 200"), "{health}");
    assert!(health.contains("\"status\":\"healthy\""));

    let metrics = http_get(addr, "/metrics").await;
    assert!(metrics.contains("cadastre_parcel_count"));

    stop.shutdown();
    let result = tokio::time::timeout(Duration::from_secs(5), server)
        .await
        .expect("node should stop")
        .unwrap();
    assert!(result.is_ok());
}

#[tokio::test]
async fn metrics_route_can_be_disabled() {
    let config = NodeConfig {
        enable_metrics: false,
        ..memory_config()
    };
    let node = CadastreNode::new(config).unwrap();
    let stop = node.shutdown_handle();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = tokio::spawn(node.run_on(listener));

    let metrics = http_get(addr, "/metrics").await;
    assert!(metrics.starts_with("HTTP/1.1 404"), "{metrics}");

    stop.shutdown();
    let _ = tokio::time::timeout(Duration::from_secs(5), server).await;
}

#[tokio::test]
async fn lmdb_node_keeps_parcels_and_salts_across_restarts() {
    let dir = tempfile::tempdir().unwrap();
    let owner = OwnerAddress::parse(OWNER).unwrap();
    let authority = OwnerAddress::parse(AUTHORITY).unwrap();
    let parcel = ParcelId::new(42).unwrap();

    let registered = {
        let node = CadastreNode::new(lmdb_config(dir.path())).unwrap();
        node.state()
            .registry
            .register_parcel(parcel, owner, authority)
            .await
            .unwrap()
    };

    let node = CadastreNode::new(lmdb_config(dir.path())).unwrap();
    let registry = &node.state().registry;

    let mine = registry.parcels_of(&owner).unwrap();
    assert_eq!(mine.len(), 1);
    assert_eq!(mine[0].commitment, registered.commitment);

    let view = registry.parcel(parcel).await.unwrap();
    assert_eq!(view.ledger_status, Some(LedgerStatus::Matched));

    let secret = registry.owner_secret(parcel, &owner).unwrap();
    assert_eq!(secret.commitment, registered.commitment);
}

#[tokio::test]
async fn wrong_vault_secret_cannot_open_salts() {
    let dir = tempfile::tempdir().unwrap();
    let owner = OwnerAddress::parse(OWNER).unwrap();
    let authority = OwnerAddress::parse(AUTHORITY).unwrap();
    let parcel = ParcelId::new(7).unwrap();

    {
        let node = CadastreNode::new(lmdb_config(dir.path())).unwrap();
        node.state()
            .registry
            .register_parcel(parcel, owner, authority)
            .await
            .unwrap();
    }

    let config = NodeConfig {
        vault_secret: Some("a different vault secret".into()),
        ..lmdb_config(dir.path())
    };
    let node = CadastreNode::new(config).unwrap();
    assert!(node.state().registry.owner_secret(parcel, &owner).is_err());
}

#[test]
fn empty_existing_data_dir_is_refused() {
    let dir = tempfile::tempdir().unwrap();
    let config = NodeConfig {
        data_dir: dir.path().to_path_buf(),
        ..lmdb_config(dir.path())
    };
    assert!(matches!(
        CadastreNode::new(config),
        Err(NodeError::Integrity(_))
    ));
}

#[test]
fn invalid_config_is_refused() {
    let config = NodeConfig {
        authority_addresses: vec!["0x1234".into()],
        ..memory_config()
    };
    assert!(matches!(CadastreNode::new(config), Err(NodeError::Config(_))));
}
