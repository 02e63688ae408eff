//! Echo Bot Example
//!
//! A small bot demonstrating tiered dispatch with post-services.
//!
//! # Service Layout
//!
//! ```text
//! tier  0: blocklist          swallows messages from blocked users
//! tier  1: echo, ping         answer commands; output goes to post-services
//! tier  2: unhandled          counts what gets past tier 1 (one open vote suffices)
//! tier -1: sender, audit      post-only: emit the reply / log it
//! ```
//!
//! The bot reads OneBot v11 event payloads, one JSON object per line, from
//! stdin and writes `send_*_msg` actions to stdout. Logs go to stderr
//! unless a configuration file says otherwise.
//!
//! # Usage
//!
//! ```bash
//! echo '{"post_type":"message","message_type":"private","user_id":1,"raw_message":"/ping"}' \
//!     | cargo run --package echo-bot -- --admin 1
//! ```

mod services;

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use stservice::prelude::*;
use stservice::runtime::{LogOutput, StConfig};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

use crate::services::{Audit, Blocklist, Echo, Ping, Sender, Unhandled};

#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Configuration file (defaults to stservice.toml in the current directory)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Configuration profile
    #[arg(short, long)]
    profile: Option<String>,

    /// User allowed to run /block
    #[arg(long, default_value_t = 0)]
    admin: i64,

    /// Users blocked from the start
    #[arg(long = "block", value_name = "USER_ID")]
    blocked: Vec<i64>,
}

fn build_runtime(args: Args) -> Result<ServiceRuntime> {
    // stdout carries the outgoing actions, keep logs off it
    let mut defaults = StConfig::default();
    defaults.logging.output = LogOutput::Stderr;

    let mut builder = ServiceRuntime::builder().defaults(defaults);
    if let Some(path) = args.config {
        builder = builder.config_file(path);
    }
    if let Some(profile) = args.profile {
        builder = builder.profile(profile);
    }
    let mut runtime = builder.build()?;

    runtime.register(
        ServiceRecord::new("blocklist", Blocklist::new(args.admin, args.blocked), 0)
            .post_service("sender"),
    )?;
    runtime.register(
        ServiceRecord::new("echo", Echo, 1)
            .post_service("sender")
            .post_service("audit"),
    )?;
    runtime.register(
        ServiceRecord::new("ping", Ping, 1)
            .post_service("sender")
            .post_service("audit"),
    )?;
    runtime.register(ServiceRecord::new("unhandled", Unhandled::default(), 2))?;
    runtime.register(ServiceRecord::new("sender", Sender, -1))?;
    runtime.register(ServiceRecord::new("audit", Audit, -1))?;

    Ok(runtime)
}

#[tokio::main]
async fn main() -> Result<()> {
    let runtime = build_runtime(Args::parse())?;
    info!("{}", runtime.stats());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }

        if let Err(e) = runtime.handle_json(&line) {
            warn!("Skipping malformed event: {e}");
        }
    }

    info!("Input closed, shutting down");
    Ok(())
}
