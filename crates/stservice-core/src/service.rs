//! The service contract.
//!
//! A [`Service`] reacts to group and private chat messages. Every reaction
//! produces a [`Reply`]: an optional textual output and a vote on whether
//! the message may travel on to later priority tiers.
//!
//! The `post` flag passed to each reaction tells the service whether it is
//! being run as a primary handler or as a post-service fed with another
//! service's output. A post-service's reply is ignored by the controller.

use crate::error::ServiceResult;
use crate::message::{GroupMessage, PrivateMessage};

/// The outcome of one service reaction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reply {
    /// Text produced by the service. Empty means "no output".
    pub output: String,
    /// Whether the original message may reach later tiers.
    pub propagate: bool,
}

impl Reply {
    /// Creates a reply with the given output and propagate vote.
    pub fn new(output: impl Into<String>, propagate: bool) -> Self {
        Self {
            output: output.into(),
            propagate,
        }
    }

    /// No output; the message keeps travelling.
    pub fn pass() -> Self {
        Self::new(String::new(), true)
    }

    /// No output; the message stops after this tier unless a sibling opens it.
    pub fn swallow() -> Self {
        Self::new(String::new(), false)
    }

    /// Output that does not hold the message back.
    pub fn forward(output: impl Into<String>) -> Self {
        Self::new(output, true)
    }

    /// Output that consumes the message.
    pub fn block(output: impl Into<String>) -> Self {
        Self::new(output, false)
    }

    /// Returns `true` if the reply carries output for post-services.
    pub fn has_output(&self) -> bool {
        !self.output.is_empty()
    }
}

/// A unit that reacts to chat messages.
///
/// Implementations must be `Send + Sync` so a populated controller can be
/// shared with the transport. Use interior mutability for state that
/// changes across messages.
///
/// Reactions must not fail: any internal problem is the service's own to
/// handle, and it should still answer with a (possibly empty) [`Reply`].
/// A panic here unwinds through the whole dispatch of that message.
pub trait Service: Send + Sync {
    /// One-time setup, run by the controller when the service is registered.
    fn init(&mut self) -> ServiceResult {
        Ok(())
    }

    /// Reacts to a group message.
    fn on_group_message(&self, msg: &GroupMessage, post: bool) -> Reply;

    /// Reacts to a private message.
    fn on_private_message(&self, msg: &PrivateMessage, post: bool) -> Reply;
}

/// A boxed, type-erased service.
pub type BoxedService = Box<dyn Service>;

impl<S: Service + ?Sized> Service for Box<S> {
    fn init(&mut self) -> ServiceResult {
        (**self).init()
    }

    fn on_group_message(&self, msg: &GroupMessage, post: bool) -> Reply {
        (**self).on_group_message(msg, post)
    }

    fn on_private_message(&self, msg: &PrivateMessage, post: bool) -> Reply {
        (**self).on_private_message(msg, post)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ServiceError;

    struct Upper;

    impl Service for Upper {
        fn on_group_message(&self, msg: &GroupMessage, _post: bool) -> Reply {
            Reply::forward(msg.text.to_uppercase())
        }

        fn on_private_message(&self, _msg: &PrivateMessage, post: bool) -> Reply {
            if post { Reply::swallow() } else { Reply::pass() }
        }
    }

    struct Failing;

    impl Service for Failing {
        fn init(&mut self) -> ServiceResult {
            Err(ServiceError::init("no config"))
        }

        fn on_group_message(&self, _msg: &GroupMessage, _post: bool) -> Reply {
            Reply::pass()
        }

        fn on_private_message(&self, _msg: &PrivateMessage, _post: bool) -> Reply {
            Reply::pass()
        }
    }

    #[test]
    fn test_reply_constructors() {
        assert_eq!(Reply::pass(), Reply::new("", true));
        assert_eq!(Reply::swallow(), Reply::new("", false));
        assert!(Reply::forward("x").propagate);
        assert!(!Reply::block("x").propagate);
        assert!(Reply::block("x").has_output());
        assert!(!Reply::pass().has_output());
    }

    #[test]
    fn test_boxed_service_delegates() {
        let mut svc: BoxedService = Box::new(Upper);
        assert!(svc.init().is_ok());

        let msg = GroupMessage::new(1, 2, "hi");
        assert_eq!(svc.on_group_message(&msg, false), Reply::forward("HI"));

        let msg = PrivateMessage::new(2, "hi");
        assert_eq!(svc.on_private_message(&msg, true), Reply::swallow());
    }

    #[test]
    fn test_default_init_and_override() {
        let mut failing: BoxedService = Box::new(Failing);
        assert!(matches!(failing.init(), Err(ServiceError::Init { .. })));
    }
}
