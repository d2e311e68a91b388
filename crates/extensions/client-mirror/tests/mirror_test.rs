//! Mirror client against a live server.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;

use wsdom_channel_web::{DomServer, DomServerConfig};
use wsdom_client_mirror::{CaptureOptions, MirrorClient, MirrorUpdate};
use wsdom_sandbox::ModuleRegistry;

const PAGE: &str = r#"<html><body><input id="box" type="checkbox"><p id="out">idle</p></body></html>"#;

async fn start_server() -> (DomServer, String) {
    let config = DomServerConfig {
        port: 0,
        document_html: PAGE.to_string(),
        ..Default::default()
    };
    let server = DomServer::new(config, Arc::new(ModuleRegistry::new()));
    let addr = server.start().await.unwrap();
    (server, format!("ws://{}/ws", addr))
}

async fn next_update(updates: &mut mpsc::UnboundedReceiver<MirrorUpdate>) -> MirrorUpdate {
    tokio::time::timeout(Duration::from_secs(5), updates.recv())
        .await
        .expect("timed out waiting for an update")
        .expect("client stopped")
}

#[tokio::test]
async fn test_mirror_receives_snapshot() {
    let (server, url) = start_server().await;
    let (client, mut updates) = MirrorClient::connect(&url, CaptureOptions::default())
        .await
        .unwrap();

    assert_eq!(
        next_update(&mut updates).await,
        MirrorUpdate::Applied { applied: 1, total: 1 }
    );
    assert!(client.body_html().contains(r#"<p id="out">idle</p>"#));
    assert!(client.is_connected());
    server.stop();
}

#[tokio::test]
async fn test_click_round_trip() {
    let (server, url) = start_server().await;
    let (client, mut updates) = MirrorClient::connect(&url, CaptureOptions::default())
        .await
        .unwrap();
    next_update(&mut updates).await;

    assert!(client.click_by_id("box"));
    assert_eq!(
        next_update(&mut updates).await,
        MirrorUpdate::Applied { applied: 1, total: 1 }
    );
    let checked = client.with_mirror(|mirror| {
        let doc = mirror.document();
        doc.get_element_by_id("box").map(|box_| doc.checked(box_))
    });
    assert_eq!(checked, Some(true));

    assert!(!client.click_by_id("missing"));
    server.stop();
}
