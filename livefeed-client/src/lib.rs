//! # Livefeed Client
//!
//! Client-side engine for the livefeed realtime stream.
//!
//! This crate provides:
//! - Client builder with configuration options
//! - Automatic bounded reconnection with a fixed retry interval
//! - Frame decoding and typed dispatch to buffers and observers
//! - Topic subscribe/unsubscribe control frames

pub mod builder;
pub mod dispatch;
pub mod error;
pub mod observer;
pub mod reconnect;
pub mod session;
pub mod state;

pub use builder::{Client, ClientBuilder, ClientCommand, ClientHandle};
pub use dispatch::Dispatcher;
pub use error::ClientError;
pub use observer::FeedObserver;
pub use reconnect::{ReconnectConfig, ReconnectState};
pub use state::FeedState;
