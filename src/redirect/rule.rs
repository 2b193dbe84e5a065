//! Redirect rules and decision outcomes.

use serde::{Deserialize, Serialize};

/// Status description carried by every redirect.
pub const MOVED_PERMANENTLY: &str = "Moved Permanently";

/// Maps an exact request path to an absolute target URL.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct RedirectRule {
    /// Exact path to match, including the leading slash. Case-sensitive.
    pub match_path: String,

    /// Absolute URL sent back in the `Location` header.
    pub target_url: String,
}

impl RedirectRule {
    pub fn new(match_path: impl Into<String>, target_url: impl Into<String>) -> Self {
        Self {
            match_path: match_path.into(),
            target_url: target_url.into(),
        }
    }
}

/// A short-circuit redirect response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Redirect {
    pub status_code: u16,
    pub status_description: &'static str,
    pub location: String,
}

impl Redirect {
    /// Build a `301 Moved Permanently` to `location`.
    pub fn moved_permanently(location: impl Into<String>) -> Self {
        Self {
            status_code: 301,
            status_description: MOVED_PERMANENTLY,
            location: location.into(),
        }
    }
}

/// Outcome of a redirect decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum Action {
    /// Forward the original request to the origin untouched.
    Passthrough,
    /// Answer the client directly, bypassing the origin.
    Redirect(Redirect),
}

impl Action {
    /// Metric/log label for this outcome.
    pub fn label(&self) -> &'static str {
        match self {
            Action::Passthrough => "passthrough",
            Action::Redirect(_) => "redirect",
        }
    }

    pub fn is_passthrough(&self) -> bool {
        matches!(self, Action::Passthrough)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_moved_permanently_shape() {
        let redirect = Redirect::moved_permanently("https://example.com/");
        assert_eq!(redirect.status_code, 301);
        assert_eq!(redirect.status_description, "Moved Permanently");
        assert_eq!(redirect.location, "https://example.com/");
    }

    #[test]
    fn test_action_serializes_tagged() {
        let json = serde_json::to_value(Action::Passthrough).unwrap();
        assert_eq!(json, serde_json::json!({ "action": "passthrough" }));

        let json = serde_json::to_value(Action::Redirect(Redirect::moved_permanently("https://a.example/"))).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "action": "redirect",
                "statusCode": 301,
                "statusDescription": "Moved Permanently",
                "location": "https://a.example/",
            })
        );
    }
}
