//! End-to-end tests over a real listener and WebSocket client.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use serde_json::json;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

use wsdom_channel_web::{DomServer, DomServerConfig, SessionEvent};
use wsdom_dom::{DomCapabilities, PropertyValue};
use wsdom_protocols::{Mutation, NodeRef, WireMessage};
use wsdom_sandbox::ModuleRegistry;

type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

// ============================================================================
// Test Helpers
// ============================================================================

const PAGE: &str = r#"<html><body><input id="box" type="checkbox"><button id="inc">+</button><span id="count">0</span></body></html>"#;

async fn start_server(modules: ModuleRegistry, preload: &[&str]) -> (DomServer, SocketAddr) {
    start_server_with_ttl(modules, preload, 300).await
}

async fn start_server_with_ttl(
    modules: ModuleRegistry,
    preload: &[&str],
    session_ttl_secs: u64,
) -> (DomServer, SocketAddr) {
    let config = DomServerConfig {
        port: 0,
        document_html: PAGE.to_string(),
        preload: preload.iter().map(|s| s.to_string()).collect(),
        session_ttl_secs,
        ..Default::default()
    };
    let server = DomServer::new(config, Arc::new(modules));
    let addr = server.start().await.unwrap();
    (server, addr)
}

async fn connect(addr: SocketAddr) -> Client {
    let (client, _) = tokio_tungstenite::connect_async(format!("ws://{}/ws", addr))
        .await
        .unwrap();
    client
}

async fn connect_to_session(addr: SocketAddr, session: &str) -> Client {
    let (client, _) =
        tokio_tungstenite::connect_async(format!("ws://{}/ws?session={}", addr, session))
            .await
            .unwrap();
    client
}

async fn next_message(client: &mut Client) -> WireMessage {
    loop {
        let frame = tokio::time::timeout(Duration::from_secs(5), client.next())
            .await
            .expect("timed out waiting for a message")
            .expect("connection closed")
            .unwrap();
        if let Message::Text(text) = frame {
            return WireMessage::from_json(text.as_str()).unwrap();
        }
    }
}

async fn send_click(client: &mut Client, id: &str) {
    let message = json!({
        "type": "event",
        "event": {
            "type": "click",
            "target": {"type": "xpath", "xpath": format!(r#"//*[@id="{}"]"#, id)},
            "timestamp": 1,
            "clientX": 3.0,
            "clientY": 4.0,
            "button": 0,
            "buttons": 1
        }
    });
    client
        .send(Message::Text(message.to_string().into()))
        .await
        .unwrap();
}

fn set_property(id: &str, name: &str, value: &str) -> Mutation {
    Mutation::SetProperty {
        target: NodeRef::xpath(format!(r#"//*[@id="{}"]"#, id)),
        name: name.to_string(),
        value: value.to_string(),
    }
}

async fn wait_for_sessions(server: &DomServer, count: usize) {
    for _ in 0..200 {
        if server.session_count() == count {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("expected {} sessions, have {}", count, server.session_count());
}

async fn wait_until_detached(server: &DomServer, id: &str) {
    for _ in 0..200 {
        if server.session(id).is_some_and(|s| !s.is_attached()) {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("session {} never detached", id);
}

fn counter_modules() -> ModuleRegistry {
    let modules = ModuleRegistry::new();
    modules
        .register_fn("app://counter", |userland| {
            let dom = userland.dom_mut();
            if let Some(button) = dom.document().get_element_by_id("inc") {
                dom.add_event_listener(button, "click", |dom, _| {
                    if let Some(count) = dom.document().get_element_by_id("count") {
                        let _ = dom.set_property(count, "textContent", PropertyValue::from("1"));
                    }
                });
            }
            Ok(())
        })
        .unwrap();
    modules
}

// ============================================================================
// Tests
// ============================================================================

#[tokio::test]
async fn test_snapshot_on_connect() {
    let (server, addr) = start_server(ModuleRegistry::new(), &[]).await;
    let mut client = connect(addr).await;

    let body = r#"<input id="box" type="checkbox"><button id="inc">+</button><span id="count">0</span>"#;
    assert_eq!(
        next_message(&mut client).await,
        WireMessage::batch(vec![Mutation::body_snapshot(body)])
    );
    wait_for_sessions(&server, 1).await;
    server.stop();
}

#[tokio::test]
async fn test_click_on_checkbox_is_mirrored() {
    let (server, addr) = start_server(ModuleRegistry::new(), &[]).await;
    let mut client = connect(addr).await;
    next_message(&mut client).await;

    send_click(&mut client, "box").await;
    assert_eq!(
        next_message(&mut client).await,
        WireMessage::batch(vec![set_property("box", "checked", "true")])
    );

    send_click(&mut client, "box").await;
    assert_eq!(
        next_message(&mut client).await,
        WireMessage::batch(vec![set_property("box", "checked", "false")])
    );
    server.stop();
}

#[tokio::test]
async fn test_preloaded_module_reacts_to_clicks() {
    let modules = counter_modules();
    let (server, addr) = start_server(modules, &["app://counter"]).await;
    let mut client = connect(addr).await;
    next_message(&mut client).await;

    send_click(&mut client, "inc").await;
    assert_eq!(
        next_message(&mut client).await,
        WireMessage::batch(vec![set_property("count", "textContent", "1")])
    );
    server.stop();
}

#[tokio::test]
async fn test_malformed_message_gets_error_reply() {
    let (server, addr) = start_server(ModuleRegistry::new(), &[]).await;
    let mut client = connect(addr).await;
    next_message(&mut client).await;

    client
        .send(Message::Text("{\"type\":\"event\"".into()))
        .await
        .unwrap();
    match next_message(&mut client).await {
        WireMessage::Error { error, error_info } => {
            assert_eq!(error, "Invalid message");
            assert!(!error_info.is_empty());
        }
        other => panic!("expected error, got {:?}", other),
    }

    // The session survives.
    send_click(&mut client, "box").await;
    assert!(matches!(
        next_message(&mut client).await,
        WireMessage::MutationBatch { .. }
    ));
    server.stop();
}

#[tokio::test]
async fn test_client_events_are_published() {
    let (server, addr) = start_server(ModuleRegistry::new(), &[]).await;
    let mut events = server.subscribe();
    let mut client = connect(addr).await;
    next_message(&mut client).await;

    send_click(&mut client, "box").await;
    let event = tokio::time::timeout(Duration::from_secs(5), events.recv())
        .await
        .unwrap()
        .unwrap();
    match &event {
        SessionEvent::ClientEvent { event, .. } => {
            assert_eq!(event.event_type(), "click");
            assert_eq!(event.target(), &NodeRef::xpath(r#"//*[@id="box"]"#));
        }
        other => panic!("unexpected {:?}", other),
    }
    assert!(server.session(event.session_id()).is_some());
    server.stop();
}

#[tokio::test]
async fn test_sessions_are_isolated() {
    let (server, addr) = start_server(ModuleRegistry::new(), &[]).await;
    let mut first = connect(addr).await;
    let mut second = connect(addr).await;
    next_message(&mut first).await;
    next_message(&mut second).await;
    wait_for_sessions(&server, 2).await;

    send_click(&mut first, "box").await;
    next_message(&mut first).await;

    let ids: Vec<String> = server
        .state()
        .sessions
        .iter()
        .map(|s| s.key().clone())
        .collect();
    let mut checked = Vec::new();
    for id in ids {
        let session = server.session(&id).unwrap();
        checked.push(
            session
                .eval_string("document.getElementById('box').checked")
                .await
                .unwrap(),
        );
    }
    checked.sort_by_key(|v| v.to_string());
    assert_eq!(checked, vec![json!(false), json!(true)]);
    server.stop();
}

#[tokio::test]
async fn test_disconnect_keeps_session_for_reconnect() {
    let (server, addr) = start_server(ModuleRegistry::new(), &[]).await;
    let mut client = connect_to_session(addr, "keep").await;
    next_message(&mut client).await;
    wait_for_sessions(&server, 1).await;

    client.close(None).await.unwrap();
    wait_until_detached(&server, "keep").await;
    assert_eq!(server.session_count(), 1);
    assert!(!server.session("keep").unwrap().is_closed());
    server.stop();
}

#[tokio::test]
async fn test_disconnect_with_zero_ttl_closes_session() {
    let (server, addr) = start_server_with_ttl(ModuleRegistry::new(), &[], 0).await;
    let mut client = connect(addr).await;
    next_message(&mut client).await;
    wait_for_sessions(&server, 1).await;
    let id = server.state().sessions.iter().next().unwrap().key().clone();
    let session = server.session(&id).unwrap();

    client.close(None).await.unwrap();
    wait_for_sessions(&server, 0).await;
    assert!(session.is_closed());
    server.stop();
}

#[tokio::test]
async fn test_detached_session_expires() {
    let (server, addr) = start_server_with_ttl(ModuleRegistry::new(), &[], 1).await;
    let mut client = connect_to_session(addr, "brief").await;
    next_message(&mut client).await;

    client.close(None).await.unwrap();
    wait_until_detached(&server, "brief").await;
    wait_for_sessions(&server, 0).await;
    server.stop();
}

#[tokio::test]
async fn test_reconnect_receives_live_snapshot() {
    let (server, addr) = start_server(counter_modules(), &["app://counter"]).await;
    let mut client = connect_to_session(addr, "abc").await;
    next_message(&mut client).await;

    send_click(&mut client, "inc").await;
    assert_eq!(
        next_message(&mut client).await,
        WireMessage::batch(vec![set_property("count", "textContent", "1")])
    );
    client.close(None).await.unwrap();
    wait_until_detached(&server, "abc").await;

    let mut client = connect_to_session(addr, "abc").await;
    let body = r#"<input id="box" type="checkbox"><button id="inc">+</button><span id="count">1</span>"#;
    assert_eq!(
        next_message(&mut client).await,
        WireMessage::batch(vec![Mutation::body_snapshot(body)])
    );
    assert_eq!(server.session_count(), 1);
    assert!(server.session("abc").unwrap().is_attached());

    // The resumed session still reacts to the same listeners.
    send_click(&mut client, "box").await;
    assert_eq!(
        next_message(&mut client).await,
        WireMessage::batch(vec![set_property("box", "checked", "true")])
    );
    server.stop();
}

#[tokio::test]
async fn test_invalid_session_id_is_rejected() {
    let (server, addr) = start_server(ModuleRegistry::new(), &[]).await;
    let result =
        tokio_tungstenite::connect_async(format!("ws://{}/ws?session=a%20b", addr)).await;
    match result {
        Err(tokio_tungstenite::tungstenite::Error::Http(response)) => {
            assert_eq!(response.status(), 400);
        }
        other => panic!("expected HTTP 400, got {:?}", other.map(|_| ())),
    }
    assert_eq!(server.session_count(), 0);
    server.stop();
}
