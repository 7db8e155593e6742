//! Client builder and main client implementation.

use crate::dispatch::Dispatcher;
use crate::error::ClientError;
use crate::observer::FeedObserver;
use crate::reconnect::{ReconnectConfig, ReconnectState};
use crate::session::WsSession;
use crate::state::FeedState;
use livefeed_core::{CommentMessage, Envelope, NotificationMessage, kind};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use url::Url;

/// Builder for configuring and creating a feed client.
pub struct ClientBuilder {
    origin: String,
    path: String,
    connect_timeout: Duration,
    reconnect_config: ReconnectConfig,
    retention: usize,
    channel_capacity: usize,
    observers: Vec<Arc<dyn FeedObserver>>,
}

impl ClientBuilder {
    /// Creates a new client builder for the application origin the feed
    /// server is reachable under (e.g. `https://blog.example.com`).
    ///
    /// The streaming endpoint is derived from the origin: `https` maps to
    /// `wss`, `http` to `ws`, and the path defaults to `/ws`.
    #[must_use]
    pub fn new(origin: impl Into<String>) -> Self {
        Self {
            origin: origin.into(),
            path: "/ws".to_string(),
            connect_timeout: Duration::from_secs(5),
            reconnect_config: ReconnectConfig::default(),
            retention: 256,
            channel_capacity: 256,
            observers: Vec::new(),
        }
    }

    /// Sets the streaming endpoint path.
    #[must_use]
    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    /// Sets the connection timeout.
    #[must_use]
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Enables or disables automatic reconnection.
    #[must_use]
    pub fn reconnect(mut self, enabled: bool) -> Self {
        self.reconnect_config.enabled = enabled;
        self
    }

    /// Sets the fixed delay between reconnection attempts.
    #[must_use]
    pub fn reconnect_delay(mut self, delay: Duration) -> Self {
        self.reconnect_config.delay = delay;
        self
    }

    /// Sets the maximum reconnection attempts (0 = unlimited).
    #[must_use]
    pub fn max_reconnect_attempts(mut self, max: usize) -> Self {
        self.reconnect_config.max_attempts = max;
        self
    }

    /// Sets the per-buffer retention cap for received messages.
    #[must_use]
    pub fn retention(mut self, cap: usize) -> Self {
        self.retention = cap;
        self
    }

    /// Sets the outbound command channel capacity.
    #[must_use]
    pub fn channel_capacity(mut self, capacity: usize) -> Self {
        self.channel_capacity = capacity;
        self
    }

    /// Registers an observer for lifecycle and message events.
    ///
    /// Observers must be registered before `build`; they are invoked from
    /// the client task in frame-arrival order.
    #[must_use]
    pub fn observer(mut self, observer: Arc<dyn FeedObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    /// Builds the client and handle.
    ///
    /// # Errors
    /// Returns `ClientError` if the configured origin is not a valid URL or
    /// has no streaming-scheme equivalent. This is the only error surfaced
    /// to callers; everything after construction is absorbed by the client
    /// task and reported through logs and the reactive state.
    pub fn build(self) -> Result<(Client, ClientHandle), ClientError> {
        let url = endpoint_url(&self.origin, &self.path)?;
        let state = Arc::new(FeedState::new(self.retention));
        let dispatcher = Dispatcher::new(state.clone(), self.observers);
        let (cmd_tx, cmd_rx) = mpsc::channel(self.channel_capacity);

        let client = Client {
            url,
            connect_timeout: self.connect_timeout,
            reconnect_state: ReconnectState::new(self.reconnect_config),
            dispatcher,
            cmd_rx,
        };

        let handle = ClientHandle { cmd_tx, state };

        Ok((client, handle))
    }
}

/// Derives the streaming endpoint from an application origin.
fn endpoint_url(origin: &str, path: &str) -> Result<Url, ClientError> {
    let mut url = Url::parse(origin).map_err(|source| ClientError::InvalidEndpoint {
        url: origin.to_string(),
        source,
    })?;

    let scheme = match url.scheme() {
        "https" | "wss" => "wss",
        "http" | "ws" => "ws",
        other => {
            return Err(ClientError::UnsupportedScheme {
                scheme: other.to_string(),
            });
        }
    };

    if url.set_scheme(scheme).is_err() {
        return Err(ClientError::UnsupportedScheme {
            scheme: url.scheme().to_string(),
        });
    }
    url.set_path(path);

    Ok(url)
}

/// The main client instance, owner of the only socket handle.
pub struct Client {
    url: Url,
    connect_timeout: Duration,
    reconnect_state: ReconnectState,
    dispatcher: Dispatcher,
    cmd_rx: mpsc::Receiver<ClientCommand>,
}

impl Client {
    /// Runs the client: connects to the feed endpoint, dispatches inbound
    /// frames, and reconnects on unexpected connection loss.
    ///
    /// Returns `Ok(())` after an explicit [`ClientHandle::disconnect`].
    ///
    /// # Errors
    /// Returns `ClientError::MaxReconnectAttempts` once the reconnection
    /// budget is spent; calling `run` again retries immediately, and the
    /// budget is restored only by a successful open.
    pub async fn run(&mut self) -> Result<(), ClientError> {
        loop {
            match self.connect_and_run().await {
                Ok(()) => {
                    // Caller-initiated teardown; never re-enters reconnection
                    self.dispatcher.mark_disconnected();
                    return Ok(());
                }
                Err(e) => {
                    tracing::error!("Connection error: {:?}", e);
                    self.dispatcher.mark_disconnected();

                    if let Some(delay) = self.reconnect_state.on_failure() {
                        tracing::info!(
                            "Reconnecting in {:?} (attempt {})...",
                            delay,
                            self.reconnect_state.attempts()
                        );
                        if self.wait_before_reconnect(delay).await {
                            return Ok(());
                        }
                    } else {
                        tracing::error!("Max reconnect attempts reached");
                        return Err(ClientError::MaxReconnectAttempts);
                    }
                }
            }
        }
    }

    async fn connect_and_run(&mut self) -> Result<(), ClientError> {
        let (ws, _) = tokio::time::timeout(self.connect_timeout, connect_async(self.url.as_str()))
            .await
            .map_err(|_| ClientError::ConnectTimeout)??;

        self.reconnect_state.on_success();
        self.dispatcher.mark_connected();
        tracing::info!("Connected to {}", self.url);

        let mut session = WsSession::new(ws);

        loop {
            tokio::select! {
                cmd = self.cmd_rx.recv() => {
                    match cmd {
                        Some(ClientCommand::Send(envelope)) => {
                            session.send(&envelope).await?;
                        }
                        Some(ClientCommand::Disconnect) | None => {
                            session.close().await;
                            return Ok(());
                        }
                    }
                }

                frame = session.recv() => {
                    match frame {
                        Ok(Some(text)) => self.dispatcher.handle_frame(text.as_str()),
                        Ok(None) => return Err(ClientError::ConnectionClosed),
                        Err(e) => return Err(ClientError::Transport(e)),
                    }
                }
            }
        }
    }

    /// Waits out the reconnect delay while still honoring commands.
    ///
    /// Returns true if a disconnect arrived during the wait, which cancels
    /// the pending attempt; sends during the wait are dropped with a
    /// warning since no connection exists.
    async fn wait_before_reconnect(&mut self, delay: Duration) -> bool {
        let sleep = tokio::time::sleep(delay);
        tokio::pin!(sleep);

        loop {
            tokio::select! {
                () = &mut sleep => return false,

                cmd = self.cmd_rx.recv() => {
                    match cmd {
                        Some(ClientCommand::Send(envelope)) => {
                            tracing::warn!("Not connected, dropping {} frame", envelope.kind);
                        }
                        Some(ClientCommand::Disconnect) | None => return true,
                    }
                }
            }
        }
    }
}

/// Handle for sending frames and reading the reactive feed state.
///
/// Cheap to clone; one client task serves any number of handles.
#[derive(Clone)]
pub struct ClientHandle {
    cmd_tx: mpsc::Sender<ClientCommand>,
    state: Arc<FeedState>,
}

impl ClientHandle {
    /// Sends an envelope to the server.
    ///
    /// Best-effort: when the client is not connected the frame is dropped
    /// with a warning. Never blocks and never returns an error, so callers
    /// can send opportunistically.
    pub fn send(&self, envelope: Envelope) {
        if !self.state.is_connected() {
            tracing::warn!("Not connected, dropping {} frame", envelope.kind);
            return;
        }

        if let Err(e) = self.cmd_tx.try_send(ClientCommand::Send(envelope)) {
            tracing::warn!("Client task unavailable, dropping frame: {}", e);
        }
    }

    /// Registers interest in a server-side topic.
    ///
    /// Fire-and-forget: the protocol has no acknowledgment frame, so
    /// success is only observable through subsequently received messages.
    pub fn subscribe(&self, topic: &str) {
        self.send(Envelope::control(kind::SUBSCRIBE, topic));
    }

    /// Withdraws interest in a server-side topic. Fire-and-forget.
    pub fn unsubscribe(&self, topic: &str) {
        self.send(Envelope::control(kind::UNSUBSCRIBE, topic));
    }

    /// Disconnects from the server and stops the client task.
    ///
    /// Terminal for the session: a disconnect also cancels any pending
    /// reconnection attempt.
    pub fn disconnect(&self) {
        if let Err(e) = self.cmd_tx.try_send(ClientCommand::Disconnect) {
            tracing::warn!("Client task unavailable: {}", e);
        }
    }

    /// Returns true while the connection is open.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.state.is_connected()
    }

    /// Snapshot of buffered notifications, newest first.
    #[must_use]
    pub fn notifications(&self) -> Vec<NotificationMessage> {
        self.state.notifications()
    }

    /// Snapshot of buffered comments, newest first.
    #[must_use]
    pub fn comments(&self) -> Vec<CommentMessage> {
        self.state.comments()
    }
}

/// Commands that can be sent to the client task.
#[derive(Debug)]
pub enum ClientCommand {
    /// Send an envelope to the server.
    Send(Envelope),
    /// Disconnect from the server.
    Disconnect,
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::{SinkExt, StreamExt};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::net::TcpListener;
    use tokio_tungstenite::tungstenite::Message;

    #[derive(Default)]
    struct CountingObserver {
        connects: AtomicUsize,
        disconnects: AtomicUsize,
        notifications: AtomicUsize,
    }

    impl FeedObserver for CountingObserver {
        fn on_connect(&self) {
            self.connects.fetch_add(1, Ordering::SeqCst);
        }

        fn on_disconnect(&self) {
            self.disconnects.fetch_add(1, Ordering::SeqCst);
        }

        fn on_notification(&self, _notification: &NotificationMessage) {
            self.notifications.fetch_add(1, Ordering::SeqCst);
        }
    }

    async fn bind_server() -> (TcpListener, String) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let origin = format!("http://{}", listener.local_addr().unwrap());
        (listener, origin)
    }

    async fn wait_until(mut condition: impl FnMut() -> bool) {
        for _ in 0..500 {
            if condition() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("condition not met within timeout");
    }

    const NOTIFICATION_FRAME: &str = r#"{"kind":"NOTIFICATION","payload":{"id":1,"title":"t","content":"c","type":"info","recipientId":"u1","createdAt":"2024-01-01T00:00:00Z"},"timestamp":"2024-01-01T00:00:00Z"}"#;

    #[test]
    fn test_endpoint_from_https_origin() {
        let url = endpoint_url("https://blog.example.com", "/ws").unwrap();
        assert_eq!(url.as_str(), "wss://blog.example.com/ws");
    }

    #[test]
    fn test_endpoint_from_http_origin_with_port() {
        let url = endpoint_url("http://127.0.0.1:8080", "/ws").unwrap();
        assert_eq!(url.as_str(), "ws://127.0.0.1:8080/ws");
    }

    #[test]
    fn test_endpoint_replaces_origin_path() {
        let url = endpoint_url("https://blog.example.com/app", "/ws").unwrap();
        assert_eq!(url.as_str(), "wss://blog.example.com/ws");
    }

    #[test]
    fn test_endpoint_rejects_unknown_scheme() {
        let result = endpoint_url("ftp://blog.example.com", "/ws");
        assert!(matches!(
            result,
            Err(ClientError::UnsupportedScheme { .. })
        ));
    }

    #[test]
    fn test_endpoint_rejects_invalid_origin() {
        let result = endpoint_url("not an origin", "/ws");
        assert!(matches!(result, Err(ClientError::InvalidEndpoint { .. })));
    }

    #[test]
    fn test_builder_defaults() {
        let builder = ClientBuilder::new("https://blog.example.com");
        assert_eq!(builder.path, "/ws");
        assert_eq!(builder.connect_timeout, Duration::from_secs(5));
        assert_eq!(builder.reconnect_config.delay, Duration::from_secs(3));
        assert_eq!(builder.reconnect_config.max_attempts, 5);
        assert_eq!(builder.retention, 256);
    }

    #[tokio::test]
    async fn test_connect_dispatches_notification() {
        let (listener, origin) = bind_server().await;
        let server = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();
            // Malformed and unknown frames ahead of the real one; neither
            // may disturb the connection or the buffers
            ws.send(Message::Text("{not json".into())).await.unwrap();
            ws.send(Message::Text(
                r#"{"kind":"PRESENCE","payload":{},"timestamp":"2024-01-01T00:00:00Z"}"#.into(),
            ))
            .await
            .unwrap();
            ws.send(Message::Text(NOTIFICATION_FRAME.into()))
                .await
                .unwrap();
            // Hold the connection open until the client disconnects
            while let Some(msg) = ws.next().await {
                if msg.is_err() {
                    break;
                }
            }
        });

        let observer = Arc::new(CountingObserver::default());
        let (mut client, handle) = ClientBuilder::new(origin)
            .observer(observer.clone())
            .build()
            .unwrap();
        let client_task = tokio::spawn(async move { client.run().await });

        wait_until(|| handle.is_connected()).await;
        wait_until(|| observer.notifications.load(Ordering::SeqCst) == 1).await;

        let notifications = handle.notifications();
        assert_eq!(notifications.len(), 1);
        assert_eq!(notifications[0].id, 1);
        assert_eq!(notifications[0].recipient_id, "u1");
        assert_eq!(observer.connects.load(Ordering::SeqCst), 1);
        assert!(handle.is_connected());
        assert!(handle.comments().is_empty());

        handle.disconnect();
        client_task.await.unwrap().unwrap();
        assert!(!handle.is_connected());
        server.abort();
    }

    #[tokio::test]
    async fn test_reconnects_after_unexpected_close() {
        let (listener, origin) = bind_server().await;
        let accepts = Arc::new(AtomicUsize::new(0));
        let server_accepts = accepts.clone();
        let server = tokio::spawn(async move {
            // First connection dropped immediately, second held open
            let (stream, _) = listener.accept().await.unwrap();
            let ws = tokio_tungstenite::accept_async(stream).await.unwrap();
            server_accepts.fetch_add(1, Ordering::SeqCst);
            drop(ws);

            let (stream, _) = listener.accept().await.unwrap();
            let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();
            server_accepts.fetch_add(1, Ordering::SeqCst);
            while let Some(msg) = ws.next().await {
                if msg.is_err() {
                    break;
                }
            }
        });

        let observer = Arc::new(CountingObserver::default());
        let (mut client, handle) = ClientBuilder::new(origin)
            .reconnect_delay(Duration::from_millis(50))
            .observer(observer.clone())
            .build()
            .unwrap();
        let client_task = tokio::spawn(async move { client.run().await });

        wait_until(|| accepts.load(Ordering::SeqCst) == 2).await;
        wait_until(|| observer.connects.load(Ordering::SeqCst) == 2).await;

        assert!(handle.is_connected());
        assert!(observer.disconnects.load(Ordering::SeqCst) >= 1);

        handle.disconnect();
        client_task.await.unwrap().unwrap();
        server.abort();
    }

    #[tokio::test]
    async fn test_run_returns_after_exhausting_attempts() {
        let (listener, origin) = bind_server().await;
        let server = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let ws = tokio_tungstenite::accept_async(stream).await.unwrap();
            drop(ws);
            // Nothing listens afterwards: every reconnect attempt fails
            drop(listener);
        });

        let (mut client, handle) = ClientBuilder::new(origin)
            .reconnect_delay(Duration::from_millis(20))
            .max_reconnect_attempts(2)
            .build()
            .unwrap();

        let result = client.run().await;
        assert!(matches!(result, Err(ClientError::MaxReconnectAttempts)));
        assert!(!handle.is_connected());
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_disconnect_does_not_reconnect() {
        let (listener, origin) = bind_server().await;
        let accepts = Arc::new(AtomicUsize::new(0));
        let server_accepts = accepts.clone();
        let server = tokio::spawn(async move {
            loop {
                let (stream, _) = listener.accept().await.unwrap();
                server_accepts.fetch_add(1, Ordering::SeqCst);
                tokio::spawn(async move {
                    let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();
                    while let Some(msg) = ws.next().await {
                        if msg.is_err() {
                            break;
                        }
                    }
                });
            }
        });

        let (mut client, handle) = ClientBuilder::new(origin)
            .reconnect_delay(Duration::from_millis(20))
            .build()
            .unwrap();
        let client_task = tokio::spawn(async move { client.run().await });

        wait_until(|| handle.is_connected()).await;
        handle.disconnect();

        let result = tokio::time::timeout(Duration::from_secs(2), client_task)
            .await
            .unwrap()
            .unwrap();
        assert!(result.is_ok());
        assert!(!handle.is_connected());

        // The close after an explicit disconnect must not trigger a reconnect
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(accepts.load(Ordering::SeqCst), 1);
        server.abort();
    }

    #[tokio::test]
    async fn test_disconnect_cancels_pending_reconnect() {
        let (listener, origin) = bind_server().await;
        let accepts = Arc::new(AtomicUsize::new(0));
        let server_accepts = accepts.clone();
        let server = tokio::spawn(async move {
            loop {
                let (stream, _) = listener.accept().await.unwrap();
                server_accepts.fetch_add(1, Ordering::SeqCst);
                tokio::spawn(async move {
                    let ws = tokio_tungstenite::accept_async(stream).await.unwrap();
                    drop(ws);
                });
            }
        });

        let observer = Arc::new(CountingObserver::default());
        let (mut client, handle) = ClientBuilder::new(origin)
            .reconnect_delay(Duration::from_secs(5))
            .observer(observer.clone())
            .build()
            .unwrap();
        let client_task = tokio::spawn(async move { client.run().await });

        // Wait until the client has lost the first connection and is
        // sitting inside its reconnect delay
        wait_until(|| observer.disconnects.load(Ordering::SeqCst) >= 1).await;
        handle.disconnect();

        // Well under the 5s delay: the pending attempt was cancelled
        let result = tokio::time::timeout(Duration::from_secs(1), client_task)
            .await
            .unwrap()
            .unwrap();
        assert!(result.is_ok());

        tokio::time::sleep(Duration::from_millis(300)).await;
        assert_eq!(accepts.load(Ordering::SeqCst), 1);
        server.abort();
    }

    #[tokio::test]
    async fn test_subscribe_sends_control_frame() {
        let (listener, origin) = bind_server().await;
        let (frame_tx, mut frame_rx) = mpsc::channel::<String>(1);
        let server = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();
            while let Some(Ok(msg)) = ws.next().await {
                if let Message::Text(text) = msg {
                    let _ = frame_tx.send(text.to_string()).await;
                }
            }
        });

        let (mut client, handle) = ClientBuilder::new(origin).build().unwrap();
        let client_task = tokio::spawn(async move { client.run().await });

        wait_until(|| handle.is_connected()).await;
        handle.subscribe("comments");

        let frame = tokio::time::timeout(Duration::from_secs(2), frame_rx.recv())
            .await
            .unwrap()
            .unwrap();
        let envelope = Envelope::decode(&frame).unwrap();
        assert_eq!(envelope.kind, kind::SUBSCRIBE);
        assert_eq!(envelope.payload["topic"], "comments");

        handle.unsubscribe("comments");
        let frame = tokio::time::timeout(Duration::from_secs(2), frame_rx.recv())
            .await
            .unwrap()
            .unwrap();
        let envelope = Envelope::decode(&frame).unwrap();
        assert_eq!(envelope.kind, kind::UNSUBSCRIBE);

        handle.disconnect();
        let _ = client_task.await;
        server.abort();
    }

    #[tokio::test]
    async fn test_send_while_disconnected_is_noop() {
        let (_listener, origin) = bind_server().await;
        let (client, handle) = ClientBuilder::new(origin).build().unwrap();

        // No running task, no connection: sends are dropped, never panic
        drop(client);
        handle.send(Envelope::control(kind::SUBSCRIBE, "comments"));
        handle.subscribe("notifications");

        assert!(!handle.is_connected());
        assert!(handle.notifications().is_empty());
        assert!(handle.comments().is_empty());
    }
}
