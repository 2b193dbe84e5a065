//! Redirect table lookup.
//!
//! # Responsibilities
//! - Hold the passthrough set, the rule list and the default target
//! - Decide, for one request path, between passthrough and redirect
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks)
//! - O(1) passthrough and rule lookup via hash sets/maps
//! - Rules keep their configured order for listing
//! - Duplicate match paths are rejected at build time

use std::collections::{HashMap, HashSet};

use crate::redirect::rule::{Action, Redirect, RedirectRule};

const DEFAULT_PASSTHROUGH: [&str; 2] = ["/", "/index.html"];
const DEFAULT_TARGET: &str = "https://aws.amazon.com/jp/";
const PAGE1_PATH: &str = "/page1.html";
const PAGE1_TARGET: &str =
    "https://docs.aws.amazon.com/ja_jp/AmazonCloudFront/latest/DeveloperGuide/Introduction.html";

/// Error building a redirect table.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TableError {
    #[error("duplicate redirect rule for path {0:?}")]
    DuplicateMatchPath(String),
}

/// Compiled redirect rules.
#[derive(Debug, Clone)]
pub struct RedirectTable {
    passthrough: HashSet<String>,
    rules: Vec<RedirectRule>,
    /// match_path -> index into `rules`.
    index: HashMap<String, usize>,
    default_target: String,
}

impl RedirectTable {
    /// Build a table from its parts.
    pub fn new<P, S>(
        passthrough: P,
        rules: Vec<RedirectRule>,
        default_target: impl Into<String>,
    ) -> Result<Self, TableError>
    where
        P: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut index = HashMap::with_capacity(rules.len());
        for (i, rule) in rules.iter().enumerate() {
            if index.insert(rule.match_path.clone(), i).is_some() {
                return Err(TableError::DuplicateMatchPath(rule.match_path.clone()));
            }
        }

        Ok(Self {
            passthrough: passthrough.into_iter().map(Into::into).collect(),
            rules,
            index,
            default_target: default_target.into(),
        })
    }

    /// Decide what to do with a request for `request_path`.
    ///
    /// The path is compared verbatim: no query stripping, normalization or
    /// percent-decoding. Input that is empty or lacks a leading slash is not
    /// rejected and lands on the default target.
    pub fn decide(&self, request_path: &str) -> Action {
        if self.passthrough.contains(request_path) {
            return Action::Passthrough;
        }

        Action::Redirect(Redirect::moved_permanently(self.target_for(request_path)))
    }

    /// Target URL a non-passthrough path would redirect to.
    pub fn target_for(&self, request_path: &str) -> &str {
        self.index
            .get(request_path)
            .map(|&i| self.rules[i].target_url.as_str())
            .unwrap_or(&self.default_target)
    }

    pub fn is_passthrough(&self, request_path: &str) -> bool {
        self.passthrough.contains(request_path)
    }

    pub fn rules(&self) -> &[RedirectRule] {
        &self.rules
    }

    /// Passthrough paths, sorted for stable output.
    pub fn passthrough_paths(&self) -> Vec<&str> {
        let mut paths: Vec<&str> = self.passthrough.iter().map(String::as_str).collect();
        paths.sort_unstable();
        paths
    }

    pub fn default_target(&self) -> &str {
        &self.default_target
    }
}

impl Default for RedirectTable {
    /// The site's built-in redirects.
    fn default() -> Self {
        let rules = vec![RedirectRule::new(PAGE1_PATH, PAGE1_TARGET)];
        Self::new(DEFAULT_PASSTHROUGH, rules, DEFAULT_TARGET)
            .expect("built-in redirect rules have unique match paths")
    }
}
