//! Inbound invocation metadata
//!
//! An invocation is whatever triggered the relay: an HTTP request from a
//! scheduler, a browser hitting the management console, a health probe.
//! Only the request body and a couple of headers are needed to tell a
//! scheduled run apart from everything else.

use serde_json::Value;
use std::collections::HashMap;

/// Origin the management console sends as `referer` when it pings the relay
pub const MANAGEMENT_CONSOLE_ORIGIN: &str = "https://manage.auth0.com/";

/// Body + headers of one inbound invocation
#[derive(Debug, Clone, Default)]
pub struct Invocation {
    body: Value,
    headers: HashMap<String, String>,
}

impl Invocation {
    pub fn new(body: Value) -> Self {
        Self {
            body,
            headers: HashMap::new(),
        }
    }

    /// Adds a header; names are matched case-insensitively
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
        self
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    pub fn body(&self) -> &Value {
        &self.body
    }

    /// Whether this invocation came from the scheduler
    ///
    /// Either the body carries an active schedule, or the management console
    /// issued a conditional request on its behalf. Everything else is
    /// interactive traffic and must be passed through untouched.
    pub fn is_scheduled_run(&self) -> bool {
        let scheduled = self.body.get("schedule").is_some_and(is_truthy)
            && self.body.get("state").and_then(Value::as_str) == Some("active");

        let console_ping = self.header("referer") == Some(MANAGEMENT_CONSOLE_ORIGIN)
            && self.header("if-none-match").is_some();

        scheduled || console_ping
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_active_schedule_is_scheduled() {
        let invocation = Invocation::new(json!({ "schedule": "*/5 * * * *", "state": "active" }));
        assert!(invocation.is_scheduled_run());
    }

    #[test]
    fn test_inactive_schedule_is_not_scheduled() {
        let invocation = Invocation::new(json!({ "schedule": "*/5 * * * *", "state": "inactive" }));
        assert!(!invocation.is_scheduled_run());
    }

    #[test]
    fn test_active_state_without_schedule_is_not_scheduled() {
        let invocation = Invocation::new(json!({ "state": "active" }));
        assert!(!invocation.is_scheduled_run());

        let invocation = Invocation::new(json!({ "schedule": "", "state": "active" }));
        assert!(!invocation.is_scheduled_run());

        let invocation = Invocation::new(json!({ "schedule": null, "state": "active" }));
        assert!(!invocation.is_scheduled_run());
    }

    #[test]
    fn test_console_conditional_request_is_scheduled() {
        let invocation = Invocation::default()
            .with_header("Referer", MANAGEMENT_CONSOLE_ORIGIN)
            .with_header("If-None-Match", "W/\"abc\"");
        assert!(invocation.is_scheduled_run());
    }

    #[test]
    fn test_console_referer_without_conditional_header_is_not_scheduled() {
        let invocation = Invocation::default().with_header("referer", MANAGEMENT_CONSOLE_ORIGIN);
        assert!(!invocation.is_scheduled_run());
    }

    #[test]
    fn test_other_referer_is_not_scheduled() {
        let invocation = Invocation::default()
            .with_header("referer", "https://example.com/")
            .with_header("if-none-match", "etag");
        assert!(!invocation.is_scheduled_run());
    }

    #[test]
    fn test_empty_invocation_is_not_scheduled() {
        assert!(!Invocation::default().is_scheduled_run());
        assert!(!Invocation::new(json!("not an object")).is_scheduled_run());
    }

    #[test]
    fn test_truthiness() {
        assert!(is_truthy(&json!(1)));
        assert!(is_truthy(&json!({})));
        assert!(!is_truthy(&json!(0)));
        assert!(!is_truthy(&json!(false)));
    }
}
