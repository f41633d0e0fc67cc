//! # gateway-messaging
//!
//! the message-box transport the gateway consumes to exchange opaque
//! envelope payloads with peers and ingest incoming payment messages.

pub mod adapter;
pub mod error;
pub mod http;
pub mod memory;

pub use adapter::{subscribe, InboundMessage, ListPendingOptions, MessageBox, MessagingAdapter, PaymentPayload, Subscription};
pub use error::{Error, Result};
pub use http::HttpMessagingAdapter;
pub use memory::MemoryMessagingAdapter;
