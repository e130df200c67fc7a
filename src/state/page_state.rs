/// Frontier state definitions for tracking crawl progress
///
/// A URL known to the frontier is in exactly one of these states. States only
/// move forward: queued, then in flight, then visited.
use std::fmt;

/// Represents where a URL currently sits in the frontier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UrlState {
    /// Accepted but not yet dispatched to a worker
    Queued,

    /// Dispatched; a page pipeline is running for it
    InFlight,

    /// Pipeline completed, successfully or not
    Visited,
}

impl UrlState {
    /// Returns true once no further processing will happen for the URL
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Visited)
    }

    /// Short lowercase label used in logs and output
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::InFlight => "in_flight",
            Self::Visited => "visited",
        }
    }
}

impl fmt::Display for UrlState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal() {
        assert!(!UrlState::Queued.is_terminal());
        assert!(UrlState::Visited.is_terminal());
        assert!(!UrlState::InFlight.is_terminal());
    }

    #[test]
    fn test_display() {
        assert_eq!(UrlState::InFlight.to_string(), "in_flight");
        assert_eq!(format!("{}", UrlState::Visited), "visited");
    }
}
