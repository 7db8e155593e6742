//! WebSocket session wrapping an established connection.

use futures::{SinkExt, StreamExt};
use livefeed_core::Envelope;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::{Error as WsError, Message, Utf8Bytes};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Client session wrapping an established WebSocket stream.
pub struct WsSession {
    ws: WsStream,
}

impl WsSession {
    /// Creates a session from an established stream.
    #[must_use]
    pub fn new(ws: WsStream) -> Self {
        Self { ws }
    }

    /// Sends an envelope to the server as a text frame.
    ///
    /// An envelope that fails to serialize is logged and skipped rather
    /// than tearing down the session.
    ///
    /// # Errors
    /// Returns the transport error if the write fails.
    pub async fn send(&mut self, envelope: &Envelope) -> Result<(), WsError> {
        match envelope.encode() {
            Ok(frame) => self.ws.send(Message::Text(frame.into())).await,
            Err(e) => {
                tracing::warn!("Dropping unencodable {} frame: {}", envelope.kind, e);
                Ok(())
            }
        }
    }

    /// Receives the next text frame from the server.
    ///
    /// Binary, ping and pong frames are skipped; pings are answered by the
    /// underlying protocol implementation.
    ///
    /// # Returns
    /// `Ok(Some(frame))` if received, `Ok(None)` if the connection closed.
    ///
    /// # Errors
    /// Returns the transport error if the read fails.
    pub async fn recv(&mut self) -> Result<Option<Utf8Bytes>, WsError> {
        loop {
            match self.ws.next().await {
                Some(Ok(Message::Text(frame))) => return Ok(Some(frame)),
                Some(Ok(Message::Close(_))) | None => return Ok(None),
                Some(Ok(_)) => {}
                Some(Err(e)) => return Err(e),
            }
        }
    }

    /// Closes the session, sending a close frame if the peer still listens.
    pub async fn close(&mut self) {
        let _ = self.ws.close(None).await;
    }
}
