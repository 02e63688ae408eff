//! The service controller.
//!
//! The [`Controller`] owns every registered [`ServiceRecord`] and routes
//! messages to them by priority tier.
//!
//! # Tiered Dispatch
//!
//! When a message is dispatched:
//!
//! 1. Tiers are visited in ascending numeric order; negative tiers are
//!    skipped, they only hold post-services
//! 2. Every service in the tier runs, in registration order
//! 3. A service that answers with non-empty output has that output fed to
//!    each of its post-services as the message text; post-service replies
//!    are discarded
//! 4. If no service in the tier voted to propagate, dispatch stops
//!
//! ```rust,ignore
//! use stservice_framework::{Controller, ServiceRecord};
//!
//! let mut controller = Controller::new();
//!
//! // Tier 0 acts as a gate: swallowing here hides the message from tier 1.
//! controller.register(ServiceRecord::new("gate", Blocklist::default(), 0))?;
//! controller.register(ServiceRecord::new("echo", Echo, 1).post_service("audit"))?;
//! controller.register(ServiceRecord::new("audit", Audit::default(), -1))?;
//!
//! controller.dispatch_group(&GroupMessage::new(123, 456, "/echo hi"));
//! ```

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use tracing::{Level, debug, span, trace, warn};

use stservice_core::{ChatMessage, GroupMessage, MessageEvent, PrivateMessage, ServiceResult};

use crate::record::ServiceRecord;

/// Status code returned to the transport after a dispatch.
///
/// Dispatch currently always reports [`DispatchStatus::OK`]; the code is
/// reserved and carries no information about what the services did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DispatchStatus(i32);

impl DispatchStatus {
    /// The fixed status every dispatch returns.
    pub const OK: Self = Self(0);

    /// Returns the raw status code.
    pub fn code(self) -> i32 {
        self.0
    }
}

impl From<DispatchStatus> for i32 {
    fn from(status: DispatchStatus) -> Self {
        status.0
    }
}

/// Routes chat messages to registered services by priority tier.
///
/// Register every service first, then dispatch. Registration takes
/// `&mut self` and dispatch takes `&self`, so once setup is done the
/// controller can be shared (e.g. behind an `Arc`) with a transport that
/// delivers messages from several tasks.
#[derive(Default)]
pub struct Controller {
    /// Service name to record.
    services: HashMap<String, ServiceRecord>,
    /// Priority tier to service names, in registration order.
    tiers: BTreeMap<i32, Vec<String>>,
}

impl Controller {
    /// Creates an empty controller.
    pub fn new() -> Self {
        Self {
            services: HashMap::new(),
            tiers: BTreeMap::new(),
        }
    }

    /// Registers a service.
    ///
    /// Returns `Ok(false)` without touching anything if a service with the
    /// same name is already registered; the original stays in place.
    /// Otherwise the record is added to its tier and the service's
    /// [`init`](stservice_core::Service::init) runs once, returning `Ok(true)`.
    ///
    /// # Errors
    ///
    /// An `init` failure is returned unchanged. The record stays registered
    /// and keeps its name.
    pub fn register(&mut self, record: ServiceRecord) -> ServiceResult<bool> {
        if self.services.contains_key(record.name()) {
            warn!(service = record.name(), "Service already registered, ignoring");
            return Ok(false);
        }

        let name = record.name().to_string();
        let priority = record.priority();
        self.tiers.entry(priority).or_default().push(name.clone());

        debug!(
            service = %name,
            priority,
            post_only = record.is_post_only(),
            post_services = record.post_names().len(),
            "Registered service"
        );

        let record = self.services.entry(name).or_insert(record);
        record.service_mut().init()?;
        Ok(true)
    }

    /// Dispatches a group message.
    pub fn dispatch_group(&self, msg: &GroupMessage) -> DispatchStatus {
        self.dispatch_message(msg)
    }

    /// Dispatches a private message.
    pub fn dispatch_private(&self, msg: &PrivateMessage) -> DispatchStatus {
        self.dispatch_message(msg)
    }

    /// Dispatches a decoded message of either kind.
    pub fn dispatch(&self, event: &MessageEvent) -> DispatchStatus {
        match event {
            MessageEvent::Group(msg) => self.dispatch_group(msg),
            MessageEvent::Private(msg) => self.dispatch_private(msg),
        }
    }

    fn dispatch_message<M: ChatMessage>(&self, msg: &M) -> DispatchStatus {
        let kind = M::KIND;
        let span = span!(
            Level::DEBUG,
            "dispatch",
            kind = %kind,
            message_id = msg.message_id(),
            user_id = msg.user_id()
        );
        let _enter = span.enter();

        // Negative tiers hold post-only services.
        for (&priority, names) in self.tiers.range(0..) {
            if names.is_empty() {
                continue;
            }

            let mut tier_propagates = false;

            for name in names {
                let Some(record) = self.services.get(name) else {
                    continue;
                };

                let reply = msg.deliver(record.service(), false);
                trace!(
                    service = %name,
                    priority,
                    propagate = reply.propagate,
                    has_output = reply.has_output(),
                    "Service replied"
                );

                tier_propagates |= reply.propagate;

                if reply.has_output() {
                    self.run_post_services(record, msg, &reply.output);
                }
            }

            if !tier_propagates {
                debug!(priority, "Tier stopped propagation");
                break;
            }
        }

        DispatchStatus::OK
    }

    /// Feeds `output` to each post-service of `record`, discarding replies.
    fn run_post_services<M: ChatMessage>(&self, record: &ServiceRecord, msg: &M, output: &str) {
        if record.post_names().is_empty() {
            return;
        }

        let chained = msg.with_text(output);
        for post_name in record.post_names() {
            match self.services.get(post_name) {
                Some(post) => {
                    chained.deliver(post.service(), true);
                    trace!(service = record.name(), post_service = %post_name, "Ran post-service");
                }
                None => {
                    trace!(
                        service = record.name(),
                        post_service = %post_name,
                        "Post-service not registered, skipping"
                    );
                }
            }
        }
    }

    /// Returns the number of registered services.
    pub fn len(&self) -> usize {
        self.services.len()
    }

    /// Returns `true` if no service is registered.
    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }

    /// Returns `true` if a service with this name is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.services.contains_key(name)
    }

    /// Returns the priority tier of a registered service.
    pub fn priority_of(&self, name: &str) -> Option<i32> {
        self.services.get(name).map(ServiceRecord::priority)
    }

    /// Returns the post-service names of a registered service.
    pub fn post_services_of(&self, name: &str) -> Option<&[String]> {
        self.services.get(name).map(ServiceRecord::post_names)
    }

    /// Returns every tier that has at least one service, ascending.
    pub fn tiers(&self) -> impl Iterator<Item = i32> + '_ {
        self.tiers.keys().copied()
    }

    /// Returns the service names in a tier, in registration order.
    pub fn names_at(&self, priority: i32) -> &[String] {
        self.tiers.get(&priority).map(Vec::as_slice).unwrap_or(&[])
    }
}

impl fmt::Debug for Controller {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Controller")
            .field("service_count", &self.services.len())
            .field("tiers", &self.tiers)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use stservice_core::{Reply, Service, ServiceError};

    #[derive(Debug, Clone, PartialEq, Eq)]
    struct Call {
        service: &'static str,
        text: String,
        post: bool,
    }

    type CallLog = Arc<Mutex<Vec<Call>>>;

    /// Records every invocation and answers with a fixed reply.
    struct Probe {
        name: &'static str,
        log: CallLog,
        reply: Reply,
    }

    impl Probe {
        fn new(name: &'static str, log: &CallLog, reply: Reply) -> Self {
            Self {
                name,
                log: Arc::clone(log),
                reply,
            }
        }

        fn record(&self, text: &str, post: bool) -> Reply {
            self.log.lock().push(Call {
                service: self.name,
                text: text.to_string(),
                post,
            });
            self.reply.clone()
        }
    }

    impl Service for Probe {
        fn on_group_message(&self, msg: &GroupMessage, post: bool) -> Reply {
            self.record(&msg.text, post)
        }

        fn on_private_message(&self, msg: &PrivateMessage, post: bool) -> Reply {
            self.record(&msg.text, post)
        }
    }

    struct CountingInit {
        inits: Arc<AtomicUsize>,
        fail: bool,
    }

    impl Service for CountingInit {
        fn init(&mut self) -> ServiceResult {
            self.inits.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(ServiceError::init("resource unavailable"))
            } else {
                Ok(())
            }
        }

        fn on_group_message(&self, _msg: &GroupMessage, _post: bool) -> Reply {
            Reply::pass()
        }

        fn on_private_message(&self, _msg: &PrivateMessage, _post: bool) -> Reply {
            Reply::pass()
        }
    }

    fn new_log() -> CallLog {
        Arc::new(Mutex::new(Vec::new()))
    }

    fn called(log: &CallLog) -> Vec<&'static str> {
        log.lock().iter().map(|c| c.service).collect()
    }

    fn probe(name: &'static str, log: &CallLog, reply: Reply, priority: i32) -> ServiceRecord {
        ServiceRecord::new(name, Probe::new(name, log, reply), priority)
    }

    fn group(text: &str) -> GroupMessage {
        GroupMessage::new(100, 200, text)
    }

    #[test]
    fn test_dispatch_empty_controller() {
        let controller = Controller::new();
        assert!(controller.is_empty());
        assert_eq!(controller.dispatch_group(&group("hi")), DispatchStatus::OK);
        assert_eq!(
            controller
                .dispatch_private(&PrivateMessage::new(1, "hi"))
                .code(),
            0
        );
    }

    #[test]
    fn test_register_runs_init_once() {
        let inits = Arc::new(AtomicUsize::new(0));
        let mut controller = Controller::new();

        let svc = CountingInit {
            inits: Arc::clone(&inits),
            fail: false,
        };
        assert!(controller.register(ServiceRecord::new("svc", svc, 0)).unwrap());
        assert_eq!(inits.load(Ordering::SeqCst), 1);

        controller.dispatch_group(&group("a"));
        controller.dispatch_group(&group("b"));
        assert_eq!(inits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_duplicate_registration_is_rejected() {
        let log = new_log();
        let inits = Arc::new(AtomicUsize::new(0));
        let mut controller = Controller::new();

        assert!(
            controller
                .register(probe("svc", &log, Reply::pass(), 0))
                .unwrap()
        );

        let duplicate = CountingInit {
            inits: Arc::clone(&inits),
            fail: false,
        };
        assert!(
            !controller
                .register(ServiceRecord::new("svc", duplicate, 5).post_service("x"))
                .unwrap()
        );

        // The rejected record was never initialized and left no trace.
        assert_eq!(inits.load(Ordering::SeqCst), 0);
        assert_eq!(controller.len(), 1);
        assert_eq!(controller.priority_of("svc"), Some(0));
        assert_eq!(controller.post_services_of("svc"), Some(&[][..]));
        assert_eq!(controller.tiers().collect::<Vec<_>>(), vec![0]);
        assert_eq!(controller.names_at(0), ["svc"]);
        assert!(controller.names_at(5).is_empty());

        // The original service still receives messages.
        controller.dispatch_group(&group("hi"));
        assert_eq!(called(&log), vec!["svc"]);
    }

    #[test]
    fn test_init_failure_is_returned() {
        let inits = Arc::new(AtomicUsize::new(0));
        let mut controller = Controller::new();

        let svc = CountingInit {
            inits: Arc::clone(&inits),
            fail: true,
        };
        let err = controller
            .register(ServiceRecord::new("broken", svc, 0))
            .unwrap_err();

        assert!(matches!(err, ServiceError::Init { .. }));
        assert_eq!(inits.load(Ordering::SeqCst), 1);
        assert!(controller.contains("broken"));
        assert_eq!(controller.names_at(0), ["broken"]);
    }

    #[test]
    fn test_failed_init_keeps_name_taken() {
        let inits = Arc::new(AtomicUsize::new(0));
        let log = new_log();
        let mut controller = Controller::new();

        let svc = CountingInit {
            inits: Arc::clone(&inits),
            fail: true,
        };
        assert!(controller.register(ServiceRecord::new("broken", svc, 0)).is_err());

        // A retry under the same name is a duplicate; init does not run again.
        assert!(
            !controller
                .register(probe("broken", &log, Reply::pass(), 1))
                .unwrap()
        );
        assert_eq!(inits.load(Ordering::SeqCst), 1);
        assert_eq!(controller.len(), 1);
        assert_eq!(controller.priority_of("broken"), Some(0));

        // The failed service still sits in tier 0 and lets messages through.
        controller
            .register(probe("after", &log, Reply::pass(), 1))
            .unwrap();
        controller.dispatch_group(&group("hi"));
        assert_eq!(called(&log), vec!["after"]);
    }

    #[test]
    fn test_swallowing_tier_stops_later_tiers() {
        let log = new_log();
        let mut controller = Controller::new();
        controller
            .register(probe("gate", &log, Reply::swallow(), 0))
            .unwrap();
        controller
            .register(probe("one", &log, Reply::pass(), 1))
            .unwrap();
        controller
            .register(probe("two", &log, Reply::pass(), 2))
            .unwrap();

        controller.dispatch_group(&group("hi"));
        assert_eq!(called(&log), vec!["gate"]);
    }

    #[test]
    fn test_one_propagate_vote_opens_tier() {
        let log = new_log();
        let mut controller = Controller::new();
        controller
            .register(probe("open", &log, Reply::pass(), 0))
            .unwrap();
        controller
            .register(probe("closed", &log, Reply::swallow(), 0))
            .unwrap();
        controller
            .register(probe("next", &log, Reply::swallow(), 1))
            .unwrap();
        controller
            .register(probe("never", &log, Reply::pass(), 2))
            .unwrap();

        controller.dispatch_private(&PrivateMessage::new(1, "hi"));
        assert_eq!(called(&log), vec!["open", "closed", "next"]);
    }

    #[test]
    fn test_all_services_in_tier_run_despite_swallow() {
        let log = new_log();
        let mut controller = Controller::new();
        controller
            .register(probe("first", &log, Reply::swallow(), 0))
            .unwrap();
        controller
            .register(probe("second", &log, Reply::swallow(), 0))
            .unwrap();

        controller.dispatch_group(&group("hi"));
        assert_eq!(called(&log), vec!["first", "second"]);
    }

    #[test]
    fn test_tiers_run_in_ascending_order() {
        let log = new_log();
        let mut controller = Controller::new();
        controller
            .register(probe("ten", &log, Reply::pass(), 10))
            .unwrap();
        controller
            .register(probe("zero", &log, Reply::pass(), 0))
            .unwrap();
        controller
            .register(probe("three", &log, Reply::pass(), 3))
            .unwrap();

        controller.dispatch_group(&group("hi"));
        assert_eq!(called(&log), vec!["zero", "three", "ten"]);
        assert_eq!(controller.tiers().collect::<Vec<_>>(), vec![0, 3, 10]);
    }

    #[test]
    fn test_negative_priority_never_runs_as_primary() {
        let log = new_log();
        let mut controller = Controller::new();
        controller
            .register(probe("hidden", &log, Reply::pass(), -1))
            .unwrap();
        controller
            .register(probe("visible", &log, Reply::pass(), 0))
            .unwrap();

        controller.dispatch_group(&group("hi"));
        controller.dispatch_private(&PrivateMessage::new(1, "hi"));
        assert_eq!(called(&log), vec!["visible", "visible"]);
        assert!(controller.contains("hidden"));
    }

    #[test]
    fn test_post_service_receives_output() {
        let log = new_log();
        let mut controller = Controller::new();
        controller
            .register(probe("echo", &log, Reply::forward("X"), 0).post_service("audit"))
            .unwrap();
        controller
            .register(probe("audit", &log, Reply::swallow(), -1))
            .unwrap();
        controller
            .register(probe("later", &log, Reply::pass(), 1))
            .unwrap();

        let mut msg = group("original");
        msg.message_id = 31;
        controller.dispatch_group(&msg);

        let calls = log.lock().clone();
        assert_eq!(
            calls,
            vec![
                Call {
                    service: "echo",
                    text: "original".to_string(),
                    post: false,
                },
                Call {
                    service: "audit",
                    text: "X".to_string(),
                    post: true,
                },
                // The post-service's swallow vote does not close the tier.
                Call {
                    service: "later",
                    text: "original".to_string(),
                    post: false,
                },
            ]
        );
    }

    #[test]
    fn test_post_service_output_is_not_chained() {
        let log = new_log();
        let mut controller = Controller::new();
        controller
            .register(probe("primary", &log, Reply::forward("one"), 0).post_service("middle"))
            .unwrap();
        controller
            .register(probe("middle", &log, Reply::forward("two"), -1).post_service("tail"))
            .unwrap();
        controller
            .register(probe("tail", &log, Reply::pass(), -1))
            .unwrap();

        controller.dispatch_group(&group("hi"));
        assert_eq!(called(&log), vec!["primary", "middle"]);
    }

    #[test]
    fn test_empty_output_skips_post_services() {
        let log = new_log();
        let mut controller = Controller::new();
        controller
            .register(probe("quiet", &log, Reply::pass(), 0).post_service("audit"))
            .unwrap();
        controller
            .register(probe("audit", &log, Reply::pass(), -1))
            .unwrap();

        controller.dispatch_group(&group("hi"));
        assert_eq!(called(&log), vec!["quiet"]);
    }

    #[test]
    fn test_dangling_post_service_is_skipped() {
        let log = new_log();
        let mut controller = Controller::new();
        controller
            .register(
                probe("echo", &log, Reply::forward("out"), 0)
                    .post_service("missing")
                    .post_service("audit"),
            )
            .unwrap();
        controller
            .register(probe("audit", &log, Reply::pass(), -1))
            .unwrap();

        assert_eq!(controller.dispatch_group(&group("hi")), DispatchStatus::OK);
        assert_eq!(called(&log), vec!["echo", "audit"]);
    }

    #[test]
    fn test_post_service_registered_later_is_resolved() {
        let log = new_log();
        let mut controller = Controller::new();
        controller
            .register(probe("echo", &log, Reply::forward("out"), 0).post_service("audit"))
            .unwrap();

        controller.dispatch_group(&group("first"));
        controller
            .register(probe("audit", &log, Reply::pass(), -1))
            .unwrap();
        controller.dispatch_group(&group("second"));

        assert_eq!(called(&log), vec!["echo", "echo", "audit"]);
    }

    #[test]
    fn test_duplicate_post_names_run_twice() {
        let log = new_log();
        let mut controller = Controller::new();
        controller
            .register(
                probe("echo", &log, Reply::forward("out"), 0)
                    .post_service("audit")
                    .post_service("audit"),
            )
            .unwrap();
        controller
            .register(probe("audit", &log, Reply::pass(), -1))
            .unwrap();

        controller.dispatch_group(&group("hi"));
        assert_eq!(called(&log), vec!["echo", "audit", "audit"]);
    }

    #[test]
    fn test_primary_service_as_post_target_runs_in_both_roles() {
        let log = new_log();
        let mut controller = Controller::new();
        controller
            .register(probe("echo", &log, Reply::forward("out"), 0).post_service("logger"))
            .unwrap();
        controller
            .register(probe("logger", &log, Reply::pass(), 1))
            .unwrap();

        controller.dispatch_group(&group("hi"));

        let calls = log.lock().clone();
        assert_eq!(calls.len(), 3);
        assert_eq!((calls[1].service, calls[1].post), ("logger", true));
        assert_eq!((calls[2].service, calls[2].post), ("logger", false));
        assert_eq!(calls[2].text, "hi");
    }

    #[test]
    fn test_registration_order_within_tier() {
        let log = new_log();
        let mut controller = Controller::new();
        controller
            .register(probe("a", &log, Reply::pass(), 1))
            .unwrap();
        controller
            .register(probe("b", &log, Reply::pass(), 1))
            .unwrap();
        controller
            .register(probe("c", &log, Reply::pass(), 1))
            .unwrap();

        for _ in 0..3 {
            controller.dispatch_group(&group("hi"));
        }

        assert_eq!(
            called(&log),
            vec!["a", "b", "c", "a", "b", "c", "a", "b", "c"]
        );
        assert_eq!(controller.names_at(1), ["a", "b", "c"]);
    }

    #[test]
    fn test_dispatch_event_routes_by_kind() {
        let log = new_log();
        let mut controller = Controller::new();
        controller
            .register(probe("svc", &log, Reply::pass(), 0))
            .unwrap();

        controller.dispatch(&MessageEvent::from(group("in group")));
        controller.dispatch(&MessageEvent::from(PrivateMessage::new(1, "in private")));

        let texts: Vec<String> = log.lock().iter().map(|c| c.text.clone()).collect();
        assert_eq!(texts, vec!["in group", "in private"]);
    }

    #[test]
    fn test_controller_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Controller>();
    }
}
