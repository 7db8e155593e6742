//! Example feed client printing realtime notifications and comments.
//!
//! Run with: `cargo run --example feed_client`
//!
//! Expects a livefeed server reachable at `http://127.0.0.1:8080`
//! (override with the `LIVEFEED_ORIGIN` environment variable).

use livefeed_client::{ClientBuilder, FeedObserver};
use livefeed_core::{CommentMessage, NotificationMessage};
use std::sync::Arc;
use std::time::Duration;

struct PrintObserver;

impl FeedObserver for PrintObserver {
    fn on_connect(&self) {
        println!("[feed] connected");
    }

    fn on_disconnect(&self) {
        println!("[feed] disconnected");
    }

    fn on_notification(&self, notification: &NotificationMessage) {
        println!(
            "[feed] notification #{}: {} - {}",
            notification.id, notification.title, notification.content
        );
    }

    fn on_comment(&self, comment: &CommentMessage) {
        println!(
            "[feed] {} commented on \"{}\": {}",
            comment.author.username, comment.post.title, comment.content
        );
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing for logging
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let origin = std::env::var("LIVEFEED_ORIGIN")
        .unwrap_or_else(|_| "http://127.0.0.1:8080".to_string());

    println!("Connecting to feed at {}", origin);

    let (mut client, handle) = ClientBuilder::new(origin)
        .connect_timeout(Duration::from_secs(5))
        .max_reconnect_attempts(3)
        .observer(Arc::new(PrintObserver))
        .build()?;

    // Spawn the client connection task
    let client_task = tokio::spawn(async move {
        if let Err(e) = client.run().await {
            eprintln!("[feed] error: {}", e);
        }
    });

    // Give the connection a moment, then register topic interest
    tokio::time::sleep(Duration::from_millis(100)).await;
    handle.subscribe("notifications");
    handle.subscribe("comments");

    println!("Listening for feed events, Ctrl-C to stop");
    tokio::signal::ctrl_c().await?;

    println!("\nDisconnecting...");
    handle.disconnect();
    tokio::time::timeout(Duration::from_secs(2), client_task)
        .await
        .ok();

    println!(
        "Buffered at exit: {} notifications, {} comments",
        handle.notifications().len(),
        handle.comments().len()
    );
    Ok(())
}
