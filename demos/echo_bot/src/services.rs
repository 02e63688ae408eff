//! Services registered by the echo bot.

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::RwLock;
use serde_json::json;
use stservice::prelude::*;
use tracing::{debug, info};

// ============================================================================
// Tier 0: Blocklist
// ============================================================================

/// Swallows messages from blocked users.
///
/// The admin can extend the list at runtime with `/block <user_id>`.
pub struct Blocklist {
    admin: i64,
    initial: Vec<i64>,
    blocked: RwLock<HashSet<i64>>,
}

impl Blocklist {
    pub fn new(admin: i64, initial: Vec<i64>) -> Self {
        Self {
            admin,
            initial,
            blocked: RwLock::new(HashSet::new()),
        }
    }

    fn check(&self, user_id: i64, text: &str) -> Reply {
        if user_id == self.admin
            && let Some(target) = text.strip_prefix("/block ")
        {
            return match target.trim().parse::<i64>() {
                Ok(target) => {
                    self.blocked.write().insert(target);
                    Reply::block(format!("Blocked {target}"))
                }
                Err(_) => Reply::block("Usage: /block <user_id>"),
            };
        }

        if self.blocked.read().contains(&user_id) {
            debug!(user_id, "Dropping message from blocked user");
            Reply::swallow()
        } else {
            Reply::pass()
        }
    }
}

impl Service for Blocklist {
    fn init(&mut self) -> ServiceResult {
        self.blocked.get_mut().extend(self.initial.drain(..));
        info!(count = self.blocked.get_mut().len(), "Blocklist loaded");
        Ok(())
    }

    fn on_group_message(&self, msg: &GroupMessage, _post: bool) -> Reply {
        self.check(msg.user_id, &msg.text)
    }

    fn on_private_message(&self, msg: &PrivateMessage, _post: bool) -> Reply {
        self.check(msg.user_id, &msg.text)
    }
}

// ============================================================================
// Tier 1: Commands
// ============================================================================

/// `/echo <text>` answers with the text.
pub struct Echo;

impl Echo {
    fn answer(text: &str) -> Reply {
        match text.strip_prefix("/echo ") {
            Some(rest) if !rest.trim().is_empty() => Reply::block(rest),
            _ => Reply::pass(),
        }
    }
}

impl Service for Echo {
    fn on_group_message(&self, msg: &GroupMessage, _post: bool) -> Reply {
        Self::answer(&msg.text)
    }

    fn on_private_message(&self, msg: &PrivateMessage, _post: bool) -> Reply {
        Self::answer(&msg.text)
    }
}

/// `/ping` answers with "Pong!".
pub struct Ping;

impl Service for Ping {
    fn on_group_message(&self, msg: &GroupMessage, _post: bool) -> Reply {
        if msg.text.trim() == "/ping" {
            Reply::block("Pong!")
        } else {
            Reply::pass()
        }
    }

    fn on_private_message(&self, msg: &PrivateMessage, _post: bool) -> Reply {
        if msg.text.trim() == "/ping" {
            Reply::block("Pong!")
        } else {
            Reply::pass()
        }
    }
}

// ============================================================================
// Tier 2: Fallback
// ============================================================================

/// Counts messages that reach the last tier.
#[derive(Default)]
pub struct Unhandled {
    count: AtomicUsize,
}

impl Service for Unhandled {
    fn on_group_message(&self, msg: &GroupMessage, _post: bool) -> Reply {
        let n = self.count.fetch_add(1, Ordering::Relaxed) + 1;
        debug!(group_id = msg.group_id, total = n, "Unhandled group message");
        Reply::pass()
    }

    fn on_private_message(&self, msg: &PrivateMessage, _post: bool) -> Reply {
        let n = self.count.fetch_add(1, Ordering::Relaxed) + 1;
        debug!(user_id = msg.user_id, total = n, "Unhandled private message");
        Reply::pass()
    }
}

// ============================================================================
// Post-only: Sender
// ============================================================================

/// Turns command output into OneBot `send_*_msg` actions on stdout.
pub struct Sender;

impl Service for Sender {
    fn on_group_message(&self, msg: &GroupMessage, post: bool) -> Reply {
        if post {
            let action = json!({
                "action": "send_group_msg",
                "params": { "group_id": msg.group_id, "message": msg.text },
            });
            println!("{action}");
        }
        Reply::pass()
    }

    fn on_private_message(&self, msg: &PrivateMessage, post: bool) -> Reply {
        if post {
            let action = json!({
                "action": "send_private_msg",
                "params": { "user_id": msg.user_id, "message": msg.text },
            });
            println!("{action}");
        }
        Reply::pass()
    }
}

/// Logs every reply the bot sends.
pub struct Audit;

impl Service for Audit {
    fn on_group_message(&self, msg: &GroupMessage, post: bool) -> Reply {
        if post {
            info!(group_id = msg.group_id, reply = %msg.text, "[Group] reply sent");
        }
        Reply::pass()
    }

    fn on_private_message(&self, msg: &PrivateMessage, post: bool) -> Reply {
        if post {
            info!(user_id = msg.user_id, reply = %msg.text, "[Private] reply sent");
        }
        Reply::pass()
    }
}
