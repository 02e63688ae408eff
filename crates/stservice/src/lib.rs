//! # stservice
//!
//! Priority-tiered message dispatch for chat bots.
//!
//! ## Overview
//!
//! Services react to group and private chat messages. Each service is
//! registered under a unique name in a numeric priority tier; tiers are
//! visited in ascending order, and a tier in which no service votes to
//! propagate ends the dispatch. A service's textual output can be fed to
//! named post-services for logging, echoing or forwarding.
//!
//! ```text
//! ┌───────────┐     ┌────────────┐     ┌──────────────────────────────┐
//! │ Transport │────▶│ Controller │────▶│ tier 0: gate                 │ stop? ──▶ done
//! │ (OneBot)  │     │            │────▶│ tier 1: echo, ping ──▶ audit │ (post, one level)
//! └───────────┘     └────────────┘────▶│ tier 2: fallback             │
//!                                      └──────────────────────────────┘
//! ```
//!
//! - **Controller**: owns the services and runs the tiered dispatch
//! - **Services**: implementors of [`Service`](core::Service)
//! - **Runtime**: configuration, logging and per-service overrides
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use stservice::prelude::*;
//!
//! struct Echo;
//!
//! impl Service for Echo {
//!     fn on_group_message(&self, msg: &GroupMessage, _post: bool) -> Reply {
//!         match msg.text.strip_prefix("/echo ") {
//!             Some(rest) => Reply::block(rest),
//!             None => Reply::pass(),
//!         }
//!     }
//!
//!     fn on_private_message(&self, _msg: &PrivateMessage, _post: bool) -> Reply {
//!         Reply::pass()
//!     }
//! }
//!
//! fn main() -> anyhow::Result<()> {
//!     let mut runtime = ServiceRuntime::load()?;
//!     runtime.register(ServiceRecord::new("echo", Echo, 1))?;
//!     runtime.handle_event(&GroupMessage::new(1, 2, "/echo hi").into());
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - `toml-config` (default): TOML configuration files
//! - `yaml-config`: YAML configuration files
//! - `json-log`: JSON log output

pub use stservice_core as core;
pub use stservice_framework as framework;
pub use stservice_runtime as runtime;

/// Prelude module for convenient imports.
///
/// ```rust,ignore
/// use stservice::prelude::*;
/// ```
pub mod prelude {
    // Runtime - main entry point
    pub use stservice_runtime::{RuntimeError, RuntimeResult, ServiceRuntime};

    // Dispatch
    pub use stservice_framework::{Controller, DispatchStatus, ServiceRecord};

    // Service contract and message model
    pub use stservice_core::{
        GroupMessage, MessageEvent, PrivateMessage, Reply, Service, ServiceError, ServiceResult,
    };
}
