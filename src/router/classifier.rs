use crate::domain::Destination;

/// Substring that marks a line as coming from the device firmware
/// application rather than from the operating system.
pub const APPLICATION_MARKER: &str = "[firmware]";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub excluded: bool,
    pub immediate: bool,
    pub destination: Destination,
}

/// Classify a rendered line against the configured pattern lists.
///
/// Matching is case-sensitive substring containment; one matching entry is
/// enough. The three answers are independent here; precedence (exclusion
/// first) is applied by the router.
pub fn classify(text: &str, exclude: &[String], immediate: &[String]) -> Classification {
    Classification {
        excluded: contains_any(text, exclude),
        immediate: contains_any(text, immediate),
        destination: destination_of(text),
    }
}

pub fn destination_of(text: &str) -> Destination {
    if text.contains(APPLICATION_MARKER) {
        Destination::Application
    } else {
        Destination::System
    }
}

fn contains_any(text: &str, patterns: &[String]) -> bool {
    patterns.iter().any(|p| text.contains(p.as_str()))
}
