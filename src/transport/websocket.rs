//! WebSocket gateway
//!
//! Accepts connections, registers a `Client` for each, and turns JSON
//! frames into coordinator calls. Outbound traffic never touches the socket
//! directly: everything goes through the client's channel and a per
//! connection send loop, so a slow peer only stalls itself.

use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::spawn;
use tokio::sync::mpsc;
use tokio_tungstenite::accept_async;
use tracing::{debug, info, warn};
use tungstenite::protocol::Message as WsMessage;

use crate::broker::Coordinator;
use crate::broker::topic::ConnectionId;
use crate::client::Client;
use crate::transport::message::{ClientMessage, ServerMessage};
use crate::utils::error::TopicError;

pub async fn start_websocket_server(listener: TcpListener, coordinator: Coordinator) {
    if let Ok(addr) = listener.local_addr() {
        info!("WebSocket server listening on ws://{addr}");
    }

    loop {
        match listener.accept().await {
            Ok((stream, peer)) => {
                debug!("accepted TCP connection from {peer}");
                spawn(handle_connection(stream, coordinator.clone()));
            }
            Err(e) => warn!("failed to accept connection: {e}"),
        }
    }
}

async fn handle_connection(stream: TcpStream, coordinator: Coordinator) {
    let ws_stream = match accept_async(stream).await {
        Ok(ws) => ws,
        Err(e) => {
            warn!("WebSocket handshake error: {e}");
            return;
        }
    };
    let (mut ws_sender, mut ws_receiver) = ws_stream.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<WsMessage>();
    let client = Client::new(tx);
    let client_id = client.id.clone();
    {
        let mut broker = coordinator.broker();
        broker.register_client(client);
        let list = broker.topics_list();
        broker.send_to(&client_id, &list);
    }
    info!("{client_id} connected");

    {
        let coordinator = coordinator.clone();
        let client_id = client_id.clone();

        spawn(async move {
            while let Some(msg) = rx.recv().await {
                if let Err(e) = ws_sender.send(msg).await {
                    debug!("failed to send message to {client_id}: {e}");
                    break;
                }
            }

            // idempotent; the read loop runs it again when it exits
            coordinator.unsubscribe_all(&client_id);
            debug!("send loop closed for {client_id}");
        });
    }

    while let Some(frame) = ws_receiver.next().await {
        let msg = match frame {
            Ok(msg) => msg,
            Err(e) => {
                debug!("read error from {client_id}: {e}");
                break;
            }
        };
        if msg.is_close() {
            break;
        }
        if !msg.is_text() {
            continue;
        }
        if let Ok(text) = msg.to_text() {
            handle_text(&coordinator, &client_id, text).await;
        }
    }

    info!("{client_id} disconnected");
    coordinator.unsubscribe_all(&client_id);
}

/// Parses one inbound frame and dispatches it.
pub(crate) async fn handle_text(coordinator: &Coordinator, client_id: &ConnectionId, text: &str) {
    match serde_json::from_str::<ClientMessage>(text) {
        Ok(msg) => handle_client_message(coordinator, client_id, msg).await,
        Err(err) => {
            warn!(
                "invalid client message from {client_id}: {err} | {}",
                text.chars().take(100).collect::<String>()
            );
            reject(
                coordinator,
                client_id,
                TopicError::InvalidInput(format!("Malformed request: {err}")),
            );
        }
    }
}

pub async fn handle_client_message(
    coordinator: &Coordinator,
    client_id: &ConnectionId,
    msg: ClientMessage,
) {
    match msg {
        ClientMessage::Subscribe { topic } => {
            if let Err(err) = coordinator.subscribe(client_id, &topic).await {
                reject(coordinator, client_id, err);
            }
        }
        ClientMessage::Unsubscribe => {
            if let Some(topic) = coordinator.unsubscribe(client_id) {
                info!("{client_id} unsubscribed from {topic}");
            }
        }
        ClientMessage::AddTopic { name } => {
            if let Err(err) = coordinator.add_topic(&name).await {
                reject(coordinator, client_id, err);
            }
        }
        ClientMessage::DeleteTopic { topic } => {
            if let Err(err) = coordinator.remove_topic(&topic) {
                reject(coordinator, client_id, err);
            }
        }
        ClientMessage::ListTopics => {
            let broker = coordinator.broker();
            broker.send_to(client_id, &broker.topics_list());
        }
    }
}

fn reject(coordinator: &Coordinator, client_id: &ConnectionId, err: TopicError) {
    warn!("rejected request from {client_id}: {err}");
    coordinator
        .broker()
        .send_to(client_id, &ServerMessage::validation_error(err.to_string()));
}
