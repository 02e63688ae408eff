//! Registration records.
//!
//! A [`ServiceRecord`] bundles a service with everything the controller needs
//! to route to it: a unique name, a priority tier, and the names of the
//! post-services that receive its non-empty output.
//!
//! ```rust,ignore
//! use stservice_framework::ServiceRecord;
//!
//! let record = ServiceRecord::new("echo", Echo, 1)
//!     .post_service("audit")
//!     .post_service("forward");
//! ```

use std::fmt;

use stservice_core::{BoxedService, Service};

/// A service awaiting registration, with its routing metadata.
pub struct ServiceRecord {
    name: String,
    service: BoxedService,
    priority: i32,
    post_services: Vec<String>,
}

impl ServiceRecord {
    /// Creates a record with an empty post-service list.
    ///
    /// Negative priorities mark post-only services: they are never run as
    /// primary handlers but can be named as post-services.
    pub fn new(name: impl Into<String>, service: impl Service + 'static, priority: i32) -> Self {
        Self::from_boxed(name, Box::new(service), priority)
    }

    /// Creates a record from an already boxed service.
    pub fn from_boxed(name: impl Into<String>, service: BoxedService, priority: i32) -> Self {
        Self {
            name: name.into(),
            service,
            priority,
            post_services: Vec::new(),
        }
    }

    /// Appends a post-service name (builder pattern).
    ///
    /// Names are kept in call order and are not deduplicated: listing a
    /// post-service twice runs it twice.
    pub fn post_service(mut self, name: impl Into<String>) -> Self {
        self.post_services.push(name.into());
        self
    }

    /// Appends several post-service names (builder pattern).
    pub fn post_services<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.post_services.extend(names.into_iter().map(Into::into));
        self
    }

    /// Replaces the priority tier before registration.
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Returns the record's unique name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the priority tier.
    pub fn priority(&self) -> i32 {
        self.priority
    }

    /// Returns `true` if this service is only reachable as a post-service.
    pub fn is_post_only(&self) -> bool {
        self.priority < 0
    }

    /// Returns the post-service names in invocation order.
    pub fn post_names(&self) -> &[String] {
        &self.post_services
    }

    pub(crate) fn service(&self) -> &dyn Service {
        self.service.as_ref()
    }

    pub(crate) fn service_mut(&mut self) -> &mut BoxedService {
        &mut self.service
    }
}

impl fmt::Debug for ServiceRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceRecord")
            .field("name", &self.name)
            .field("priority", &self.priority)
            .field("post_services", &self.post_services)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stservice_core::{GroupMessage, PrivateMessage, Reply};

    struct Noop;

    impl Service for Noop {
        fn on_group_message(&self, _msg: &GroupMessage, _post: bool) -> Reply {
            Reply::pass()
        }

        fn on_private_message(&self, _msg: &PrivateMessage, _post: bool) -> Reply {
            Reply::pass()
        }
    }

    #[test]
    fn test_new_record_has_no_post_services() {
        let record = ServiceRecord::new("noop", Noop, 3);
        assert_eq!(record.name(), "noop");
        assert_eq!(record.priority(), 3);
        assert!(record.post_names().is_empty());
        assert!(!record.is_post_only());
    }

    #[test]
    fn test_post_services_keep_order_and_duplicates() {
        let record = ServiceRecord::new("noop", Noop, 0)
            .post_service("audit")
            .post_service("forward")
            .post_service("audit");

        assert_eq!(record.post_names(), ["audit", "forward", "audit"]);
    }

    #[test]
    fn test_post_services_extend() {
        let record = ServiceRecord::new("noop", Noop, 0)
            .post_service("a")
            .post_services(["b", "c"]);

        assert_eq!(record.post_names(), ["a", "b", "c"]);
    }

    #[test]
    fn test_negative_priority_is_post_only() {
        let record = ServiceRecord::new("audit", Noop, -1);
        assert!(record.is_post_only());
        assert!(!record.with_priority(0).is_post_only());
    }

    #[test]
    fn test_debug_omits_service() {
        let record = ServiceRecord::new("noop", Noop, 2).post_service("x");
        let debug = format!("{record:?}");
        assert!(debug.contains("\"noop\""));
        assert!(debug.contains("priority: 2"));
    }
}
