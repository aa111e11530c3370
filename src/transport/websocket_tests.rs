use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

use crate::broker::Coordinator;
use crate::testing::{coordinator_with, fake_world};
use crate::transport::message::{ServerMessage, Temperature};
use crate::transport::websocket::start_websocket_server;

type Ws = WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>;

async fn setup_server() -> (SocketAddr, Coordinator) {
    let coordinator = coordinator_with(Arc::new(fake_world()), 3);
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind");
    let addr = listener.local_addr().expect("No local address");
    tokio::spawn(start_websocket_server(listener, coordinator.clone()));
    (addr, coordinator)
}

async fn connect_client(addr: SocketAddr) -> Ws {
    let (mut ws, _) = connect_async(format!("ws://{addr}"))
        .await
        .expect("WebSocket handshake failed");
    // every connection is greeted with the current list
    match next_event(&mut ws).await {
        ServerMessage::TopicsList { .. } => {}
        other => panic!("Expected TopicsList greeting, got {other:?}"),
    }
    ws
}

async fn send(ws: &mut Ws, value: Value) {
    ws.send(WsMessage::Text(value.to_string().into()))
        .await
        .expect("Failed to send message");
}

async fn next_event(ws: &mut Ws) -> ServerMessage {
    let frame = tokio::time::timeout(Duration::from_secs(2), ws.next())
        .await
        .expect("Timed out waiting for a server event")
        .expect("Stream ended")
        .expect("Read error");
    let raw_data = frame.into_data();
    serde_json::from_slice(&raw_data).unwrap_or_else(|e| {
        panic!(
            "Failed to deserialize ServerMessage from '{:?}': {}",
            raw_data, e
        )
    })
}

#[tokio::test]
async fn test_add_subscribe_delete_end_to_end() {
    let (addr, _coordinator) = setup_server().await;
    let mut ws_a = connect_client(addr).await;
    let mut ws_b = connect_client(addr).await;

    send(&mut ws_a, json!({"type": "add_topic", "name": "London"})).await;
    for ws in [&mut ws_a, &mut ws_b] {
        assert_eq!(
            next_event(ws).await,
            ServerMessage::TopicsList {
                topics: vec!["London".to_string()]
            }
        );
        assert_eq!(
            next_event(ws).await,
            ServerMessage::TopicAdded {
                name: "London".to_string()
            }
        );
    }

    send(&mut ws_a, json!({"type": "subscribe", "topic": "London"})).await;
    match next_event(&mut ws_a).await {
        ServerMessage::WeatherUpdate(payload) => {
            assert_eq!(payload.city, "London");
            assert_eq!(payload.temp, Temperature::Celsius(20));
        }
        other => panic!("Expected WeatherUpdate, got {other:?}"),
    }

    send(&mut ws_b, json!({"type": "delete_topic", "topic": "London"})).await;
    assert_eq!(
        next_event(&mut ws_a).await,
        ServerMessage::TopicForceLeft {
            name: "London".to_string()
        }
    );
    assert_eq!(
        next_event(&mut ws_a).await,
        ServerMessage::TopicDeleted {
            name: "London".to_string()
        }
    );
    assert_eq!(
        next_event(&mut ws_a).await,
        ServerMessage::TopicsList { topics: vec![] }
    );
    assert_eq!(
        next_event(&mut ws_b).await,
        ServerMessage::TopicDeleted {
            name: "London".to_string()
        }
    );
}

#[tokio::test]
async fn test_invalid_requests_get_validation_errors() {
    let (addr, _coordinator) = setup_server().await;
    let mut ws = connect_client(addr).await;

    ws.send(WsMessage::Text("not json".into()))
        .await
        .expect("Failed to send message");
    match next_event(&mut ws).await {
        ServerMessage::ValidationError { message } => {
            assert!(message.starts_with("Malformed request"));
        }
        other => panic!("Expected ValidationError, got {other:?}"),
    }

    send(&mut ws, json!({"type": "add_topic", "name": "Atlantis"})).await;
    assert_eq!(
        next_event(&mut ws).await,
        ServerMessage::validation_error("Could not find a location named 'Atlantis'")
    );
}

#[tokio::test]
async fn test_disconnect_cleans_up_subscriptions() {
    let (addr, coordinator) = setup_server().await;
    coordinator.add_topic("Tokyo").await.unwrap();
    let mut ws = connect_client(addr).await;

    send(&mut ws, json!({"type": "subscribe", "topic": "Tokyo"})).await;
    assert!(matches!(
        next_event(&mut ws).await,
        ServerMessage::WeatherUpdate(_)
    ));
    assert!(coordinator.broker().subscriptions.is_active("Tokyo"));

    ws.close(None).await.expect("Failed to close WebSocket");
    drop(ws);

    let mut cleaned = false;
    for _ in 0..50 {
        {
            let broker = coordinator.broker();
            if broker.clients.is_empty() && broker.subscriptions.active_topics().is_empty() {
                cleaned = true;
            }
        }
        if cleaned {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert!(cleaned, "client was not cleaned up after disconnect");
}
