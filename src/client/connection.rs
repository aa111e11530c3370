use tokio::sync::mpsc::UnboundedSender;
use tungstenite::protocol::Message as WsMessage;

use crate::broker::topic::ConnectionId;

/// One connected WebSocket peer as the broker sees it.
///
/// The broker never touches the socket; it pushes frames into `sender` and
/// the connection's send loop writes them out.
#[derive(Debug)]
pub struct Client {
    /// Unique identifier, `client-<uuid>`.
    pub id: ConnectionId,

    /// Channel drained by the connection's send loop.
    pub sender: UnboundedSender<WsMessage>,
}

impl Client {
    pub fn new(sender: UnboundedSender<WsMessage>) -> Self {
        Self {
            id: format!("client-{}", uuid::Uuid::new_v4()),
            sender,
        }
    }
}
