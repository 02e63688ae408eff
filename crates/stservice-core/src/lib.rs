//! # stservice Core
//!
//! The contract between the dispatch controller and the services it drives.
//!
//! This crate provides:
//! - The [`Service`] trait every handler implements, and the [`Reply`] it returns
//! - The message model for group and private chat events ([`GroupMessage`],
//!   [`PrivateMessage`]) decoded from OneBot v11 payloads ([`MessageEvent`])
//! - The [`ChatMessage`] trait that lets the controller treat both message
//!   kinds with a single dispatch algorithm
//! - Error types for service setup and event decoding
//!
//! ```rust,ignore
//! use stservice_core::{GroupMessage, PrivateMessage, Reply, Service};
//!
//! struct Ping;
//!
//! impl Service for Ping {
//!     fn on_group_message(&self, msg: &GroupMessage, _post: bool) -> Reply {
//!         self.answer(&msg.text)
//!     }
//!
//!     fn on_private_message(&self, msg: &PrivateMessage, _post: bool) -> Reply {
//!         self.answer(&msg.text)
//!     }
//! }
//!
//! impl Ping {
//!     fn answer(&self, text: &str) -> Reply {
//!         if text.trim() == "/ping" {
//!             Reply::block("pong")
//!         } else {
//!             Reply::pass()
//!         }
//!     }
//! }
//! ```

pub mod error;
pub mod message;
pub mod service;

pub use error::{BoxError, EventError, EventResult, ServiceError, ServiceResult};
pub use message::{
    Anonymous, ChatMessage, GroupMessage, MessageEvent, MessageKind, PrivateMessage,
};
pub use service::{BoxedService, Reply, Service};
