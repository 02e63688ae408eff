//! # stservice Framework
//!
//! The dispatch controller and the registration records it owns.
//!
//! This layer provides:
//! - [`ServiceRecord`]: a service together with its name, priority tier and
//!   post-service list, built before registration
//! - [`Controller`]: the registry plus priority index, and the tiered
//!   dispatch algorithm for group and private messages
//! - [`DispatchStatus`]: the status code handed back to the transport
//!
//! ```text
//! transport ──▶ Controller ──▶ tier 0: [gate]            ── all vote "stop" ──▶ done
//!                         └──▶ tier 1: [echo, ping]      ── output ──▶ post: [audit]
//!                         └──▶ tier 2: [fallback]
//!              (tiers < 0 hold post-only services and are never scanned)
//! ```

pub mod controller;
pub mod record;

pub use controller::{Controller, DispatchStatus};
pub use record::ServiceRecord;
