//! Event name matching for callback groups

use regex::Regex;

/// Compiled form of a group pattern
#[derive(Debug, Clone)]
pub enum EventMatcher {
    /// No pattern: every event name matches
    Any,
    /// Unanchored regex search
    Regex(Regex),
    /// Fallback for patterns that are not valid regexes
    Exact(String),
}

impl EventMatcher {
    pub fn new(pattern: Option<&str>) -> Self {
        let Some(pattern) = pattern else {
            return EventMatcher::Any;
        };

        match Regex::new(pattern) {
            Ok(re) => EventMatcher::Regex(re),
            Err(e) => {
                log::debug!(
                    "[HOOKS] Pattern '{}' is not a valid regex, matching it literally: {}",
                    pattern,
                    e
                );
                EventMatcher::Exact(pattern.to_string())
            }
        }
    }

    pub fn matches(&self, event_name: &str) -> bool {
        match self {
            EventMatcher::Any => true,
            EventMatcher::Regex(re) => re.is_match(event_name),
            EventMatcher::Exact(raw) => raw == event_name,
        }
    }
}

/// Whether a group with `pattern` applies to `event_name`. Never fails.
pub fn matches(event_name: &str, pattern: Option<&str>) -> bool {
    EventMatcher::new(pattern).matches(event_name)
}
