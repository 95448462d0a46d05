//! Log type and severity filtering

use logrelay_core::domain::log::LogEntry;
use std::collections::HashSet;

pub const LEVEL_DEBUG: u8 = 0;
pub const LEVEL_INFO: u8 = 1;
pub const LEVEL_WARNING: u8 = 2;
pub const LEVEL_ERROR: u8 = 3;
pub const LEVEL_CRITICAL: u8 = 4;

/// Severity of an identity-provider event type code
///
/// Unknown codes are treated as informational.
pub fn level_of(log_type: &str) -> u8 {
    match log_type {
        "limit_wc" | "limit_sul" | "limit_mu" | "api_limit" => LEVEL_CRITICAL,
        "f" | "fapi" | "fc" | "fco" | "fcoa" | "fcp" | "fcph" | "fcpn" | "fcpr" | "fcu" | "fd"
        | "fdeaz" | "fdecc" | "fede" | "fens" | "feacft" | "feccft" | "feoobft" | "feotpft"
        | "fepft" | "fercft" | "fi" | "flo" | "fn" | "fp" | "fs" | "fsa" | "fu" | "fv"
        | "fvr" => LEVEL_ERROR,
        "w" | "pwd_leak" | "signup_pwd_leak" | "reset_pwd_leak" | "depnote" => LEVEL_WARNING,
        "sapi" | "seacft" | "seccft" | "sertft" | "ssa" => LEVEL_DEBUG,
        _ => LEVEL_INFO,
    }
}

/// Drops entries that should not be forwarded
#[derive(Debug, Clone, Default)]
pub struct LogFilter {
    types: HashSet<String>,
    min_level: u8,
}

impl LogFilter {
    pub fn new(types: impl IntoIterator<Item = String>, min_level: u8) -> Self {
        Self {
            types: types.into_iter().collect(),
            min_level,
        }
    }

    pub fn is_noop(&self) -> bool {
        self.types.is_empty() && self.min_level == LEVEL_DEBUG
    }

    pub fn accepts(&self, entry: &LogEntry) -> bool {
        if self.is_noop() {
            return true;
        }

        let log_type = entry.log_type().unwrap_or_default();

        if !self.types.is_empty() && !self.types.contains(log_type) {
            return false;
        }

        level_of(log_type) >= self.min_level
    }

    pub fn apply(&self, entries: &[LogEntry]) -> Vec<LogEntry> {
        entries
            .iter()
            .filter(|entry| self.accepts(entry))
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn entry(log_type: &str) -> LogEntry {
        LogEntry::new(json!({ "log_id": log_type, "type": log_type }))
    }

    #[test]
    fn test_default_filter_accepts_everything() {
        let filter = LogFilter::default();
        assert!(filter.is_noop());
        assert!(filter.accepts(&entry("sapi")));
        assert!(filter.accepts(&LogEntry::new(json!({ "log_id": "no-type" }))));
    }

    #[test]
    fn test_type_filter() {
        let filter = LogFilter::new(vec!["s".to_string(), "f".to_string()], LEVEL_DEBUG);
        let kept = filter.apply(&[entry("s"), entry("sapi"), entry("f")]);
        let types: Vec<_> = kept.iter().filter_map(LogEntry::log_type).collect();
        assert_eq!(types, vec!["s", "f"]);
    }

    #[test]
    fn test_level_filter() {
        let filter = LogFilter::new(Vec::new(), LEVEL_ERROR);
        assert!(filter.accepts(&entry("f")));
        assert!(filter.accepts(&entry("limit_wc")));
        assert!(!filter.accepts(&entry("s")));
        assert!(!filter.accepts(&entry("w")));
    }

    #[test]
    fn test_type_and_level_combine() {
        let filter = LogFilter::new(vec!["s".to_string(), "fp".to_string()], LEVEL_WARNING);
        assert!(filter.accepts(&entry("fp")));
        assert!(!filter.accepts(&entry("s")));
        assert!(!filter.accepts(&entry("f")));
    }

    #[test]
    fn test_level_of() {
        assert_eq!(level_of("f"), LEVEL_ERROR);
        assert_eq!(level_of("w"), LEVEL_WARNING);
        assert_eq!(level_of("sapi"), LEVEL_DEBUG);
        assert_eq!(level_of("s"), LEVEL_INFO);
        assert_eq!(level_of("something-new"), LEVEL_INFO);
    }
}
