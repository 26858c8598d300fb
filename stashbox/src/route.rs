//! Request classification.
//!
//! A [`RouteTable`] is an ordered list of [`RouteRule`]s. The first rule
//! whose [`Matcher`] accepts a request decides the [`Strategy`]. Requests the
//! worker must not touch at all (non-`GET`, non-HTTP schemes) are rejected
//! before any rule is consulted.

use std::fmt;

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use stashbox_core::{Destination, FetchRequest};

/// A caching strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// Fresh data from the network, cached copy when offline.
    NetworkFirst,
    /// Cached copy when present, network otherwise.
    CacheFirst,
    /// Cached copy now, refreshed in the background.
    StaleWhileRevalidate,
    /// Everything no other rule claimed. Behaves like [`Strategy::NetworkFirst`].
    Default,
}

impl Strategy {
    /// Returns the label used in logs and metrics.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Strategy::NetworkFirst => "network_first",
            Strategy::CacheFirst => "cache_first",
            Strategy::StaleWhileRevalidate => "stale_while_revalidate",
            Strategy::Default => "default",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Condition a request must satisfy for a rule to apply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Matcher {
    /// The full URL contains the substring.
    UrlContains(SmolStr),
    /// The request has this destination.
    Destination(Destination),
    /// Every request.
    Always,
}

impl Matcher {
    /// Returns `true` if `request` satisfies the condition.
    pub fn matches(&self, request: &FetchRequest) -> bool {
        match self {
            Matcher::UrlContains(pattern) => request.url().as_str().contains(pattern.as_str()),
            Matcher::Destination(destination) => request.destination() == *destination,
            Matcher::Always => true,
        }
    }
}

/// A single `(matcher, strategy)` pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteRule {
    matcher: Matcher,
    strategy: Strategy,
}

impl RouteRule {
    /// Creates a rule.
    pub fn new(matcher: Matcher, strategy: Strategy) -> Self {
        Self { matcher, strategy }
    }

    /// Routes URLs containing `pattern` to `strategy`.
    pub fn url_contains(pattern: impl Into<SmolStr>, strategy: Strategy) -> Self {
        Self::new(Matcher::UrlContains(pattern.into()), strategy)
    }

    /// Returns the matcher.
    pub fn matcher(&self) -> &Matcher {
        &self.matcher
    }

    /// Returns the strategy this rule selects.
    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    /// Returns `true` if the rule applies to `request`.
    pub fn matches(&self, request: &FetchRequest) -> bool {
        self.matcher.matches(request)
    }
}

/// Ordered rule table, first match wins.
///
/// # Example
///
/// ```
/// use stashbox::route::{RouteTable, Strategy};
/// use stashbox_core::{Destination, FetchRequest};
///
/// let table = RouteTable::from_patterns(&["https://api.github.com/"], &["/assets/"]);
///
/// let avatar = FetchRequest::get("https://example.com/assets/avatar.webp").unwrap();
/// assert_eq!(table.classify(&avatar), Some(Strategy::CacheFirst));
///
/// let page = FetchRequest::get("https://example.com/about")
///     .unwrap()
///     .with_destination(Destination::Document);
/// assert_eq!(table.classify(&page), Some(Strategy::StaleWhileRevalidate));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteTable {
    rules: Vec<RouteRule>,
}

impl RouteTable {
    /// Creates a table from explicit rules.
    pub fn new(rules: Vec<RouteRule>) -> Self {
        Self { rules }
    }

    /// Builds the standard table: network-first patterns, then cache-first
    /// patterns, then documents as stale-while-revalidate, then the default.
    pub fn from_patterns<N, C>(network_first: &[N], cache_first: &[C]) -> Self
    where
        N: AsRef<str>,
        C: AsRef<str>,
    {
        let network = network_first
            .iter()
            .map(|pattern| RouteRule::url_contains(pattern.as_ref(), Strategy::NetworkFirst));
        let cache = cache_first
            .iter()
            .map(|pattern| RouteRule::url_contains(pattern.as_ref(), Strategy::CacheFirst));
        let rules = network
            .chain(cache)
            .chain([
                RouteRule::new(
                    Matcher::Destination(Destination::Document),
                    Strategy::StaleWhileRevalidate,
                ),
                RouteRule::new(Matcher::Always, Strategy::Default),
            ])
            .collect();
        Self { rules }
    }

    /// Appends a rule at the lowest priority.
    pub fn push(&mut self, rule: RouteRule) {
        self.rules.push(rule);
    }

    /// Returns the rules in priority order.
    pub fn rules(&self) -> &[RouteRule] {
        &self.rules
    }

    /// Picks the strategy for `request`, or `None` if the request must pass
    /// through untouched.
    pub fn classify(&self, request: &FetchRequest) -> Option<Strategy> {
        if !request.is_interceptable() {
            return None;
        }
        let strategy = self
            .rules
            .iter()
            .find(|rule| rule.matches(request))
            .map(RouteRule::strategy)
            .unwrap_or(Strategy::Default);
        Some(strategy)
    }
}

#[cfg(test)]
mod tests {
    use http::Method;

    use super::*;
    use crate::config::{DEFAULT_CACHE_FIRST, DEFAULT_NETWORK_FIRST};

    fn table() -> RouteTable {
        RouteTable::from_patterns(DEFAULT_NETWORK_FIRST, DEFAULT_CACHE_FIRST)
    }

    fn get(url: &str) -> FetchRequest {
        FetchRequest::get(url).unwrap()
    }

    #[test]
    fn api_is_network_first() {
        let request = get("https://api.github.com/users/someone/repos");
        assert_eq!(table().classify(&request), Some(Strategy::NetworkFirst));
    }

    #[test]
    fn assets_and_fonts_are_cache_first() {
        for url in [
            "https://portfolio.example/assets/logo.webp",
            "https://portfolio.example/styles.css",
            "https://portfolio.example/script.js",
            "https://fonts.googleapis.com/css2?family=Inter",
            "https://fonts.gstatic.com/s/inter/v12/font.woff2",
        ] {
            assert_eq!(table().classify(&get(url)), Some(Strategy::CacheFirst), "{url}");
        }
    }

    #[test]
    fn network_first_wins_over_cache_first() {
        // Both lists match; network-first is consulted first.
        let request = get("https://api.github.com/assets/data.json");
        assert_eq!(table().classify(&request), Some(Strategy::NetworkFirst));
    }

    #[test]
    fn cache_first_wins_over_document() {
        let request = get("https://portfolio.example/assets/resume.html")
            .with_destination(Destination::Document);
        assert_eq!(table().classify(&request), Some(Strategy::CacheFirst));
    }

    #[test]
    fn documents_are_stale_while_revalidate() {
        let request = get("https://portfolio.example/").with_destination(Destination::Document);
        assert_eq!(table().classify(&request), Some(Strategy::StaleWhileRevalidate));
    }

    #[test]
    fn everything_else_is_default() {
        let request = get("https://portfolio.example/data/projects.json");
        assert_eq!(table().classify(&request), Some(Strategy::Default));
    }

    #[test]
    fn non_get_and_non_http_pass_through() {
        let post = FetchRequest::new(
            Method::POST,
            url::Url::parse("https://portfolio.example/assets/x.png").unwrap(),
        );
        assert_eq!(table().classify(&post), None);

        let extension = get("chrome-extension://abc/assets/icon.png");
        assert_eq!(table().classify(&extension), None);
    }

    #[test]
    fn empty_table_falls_back_to_default() {
        let request = get("https://portfolio.example/anything");
        assert_eq!(RouteTable::default().classify(&request), Some(Strategy::Default));
    }

    #[test]
    fn rules_are_individually_testable() {
        let rule = RouteRule::url_contains("/assets/", Strategy::CacheFirst);
        assert!(rule.matches(&get("https://portfolio.example/assets/a.png")));
        assert!(!rule.matches(&get("https://portfolio.example/index.html")));
    }
}
