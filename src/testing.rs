//! Helpers shared by the unit tests of several modules.

use std::sync::Arc;

use tokio::sync::mpsc::{self, UnboundedReceiver};
use tungstenite::protocol::Message as WsMessage;

use crate::broker::topic::ConnectionId;
use crate::broker::{Broker, Coordinator};
use crate::client::Client;
use crate::config::TopicSettings;
use crate::source::fake::FakeSource;
use crate::transport::message::ServerMessage;

pub(crate) fn fake_world() -> FakeSource {
    FakeSource::new()
        .with_city("London", 51.5074, -0.1278)
        .with_city("Tokyo", 35.6762, 139.6503)
        .with_city("Lima", -12.0464, -77.0428)
        .with_city("Paris", 48.8566, 2.3522)
        .with_alias("Londres", "London")
}

pub(crate) fn coordinator_with(source: Arc<FakeSource>, max_topics: usize) -> Coordinator {
    let broker = Broker::new(&TopicSettings {
        max_topics,
        seed: Vec::new(),
    });
    Coordinator::new(broker, source)
}

pub(crate) fn connect(broker: &mut Broker) -> (ConnectionId, UnboundedReceiver<WsMessage>) {
    let (tx, rx) = mpsc::unbounded_channel::<WsMessage>();
    let client = Client::new(tx);
    let id = client.id.clone();
    broker.register_client(client);
    (id, rx)
}

/// Everything queued for a connection so far, decoded.
pub(crate) fn drain(rx: &mut UnboundedReceiver<WsMessage>) -> Vec<ServerMessage> {
    let mut received = Vec::new();
    while let Ok(frame) = rx.try_recv() {
        match frame {
            WsMessage::Text(text) => received.push(
                serde_json::from_str(text.as_str()).expect("server sent invalid JSON"),
            ),
            other => panic!("Expected a text message, got {other:?}"),
        }
    }
    received
}

pub(crate) fn weather_updates(messages: &[ServerMessage]) -> usize {
    messages
        .iter()
        .filter(|m| matches!(m, ServerMessage::WeatherUpdate(_)))
        .count()
}
