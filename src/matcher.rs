//! Path pattern matching and query string parsing.
//!
//! Patterns are matched segment by segment: literal segments must match
//! exactly, placeholder segments bind exactly one non-empty segment.

use crate::error::{MockError, Result};
use std::borrow::Cow;
use std::collections::{HashMap, HashSet};
use std::fmt;

/// A parsed route path such as `/test/{name}/{id}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPattern {
    raw: String,
    segments: Vec<PatternSegment>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum PatternSegment {
    Literal(String),
    Param(String),
}

impl PathPattern {
    /// Parse a path pattern.
    ///
    /// Placeholders are written `{name}`; `<name>` and `<converter:name>`
    /// are accepted as well. Placeholder names must be unique.
    pub fn parse(path: &str) -> Result<Self> {
        let invalid = |reason: &str| MockError::InvalidPathPattern {
            path: path.to_string(),
            reason: reason.to_string(),
        };

        if !path.starts_with('/') {
            return Err(invalid("must start with '/'"));
        }

        let mut seen = HashSet::new();
        let mut segments = Vec::new();

        for part in path.split('/') {
            let segment = match placeholder_name(part) {
                Some(name) => {
                    if name.is_empty() || name.contains(['{', '}', '<', '>', '/']) {
                        return Err(invalid(&format!("invalid placeholder '{}'", part)));
                    }
                    if !seen.insert(name) {
                        return Err(invalid(&format!("duplicate placeholder '{}'", name)));
                    }
                    PatternSegment::Param(name.to_string())
                }
                None => PatternSegment::Literal(part.to_string()),
            };
            segments.push(segment);
        }

        Ok(Self {
            raw: path.to_string(),
            segments,
        })
    }

    /// The pattern as written.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Placeholder names in declaration order.
    pub fn param_names(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|s| match s {
            PatternSegment::Param(name) => Some(name.as_str()),
            PatternSegment::Literal(_) => None,
        })
    }

    /// Segment texts with placeholder delimiters removed.
    pub fn bare_segments(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().map(|s| match s {
            PatternSegment::Literal(lit) => lit.as_str(),
            PatternSegment::Param(name) => name.as_str(),
        })
    }

    /// Number of literal segments, used to rank overlapping patterns.
    pub fn literal_count(&self) -> usize {
        self.segments
            .iter()
            .filter(|s| matches!(s, PatternSegment::Literal(_)))
            .count()
    }

    /// The pattern with placeholder names erased.
    ///
    /// Two patterns with the same normalized form match exactly the same paths.
    pub fn normalized(&self) -> String {
        self.segments
            .iter()
            .map(|s| match s {
                PatternSegment::Literal(lit) => lit.as_str(),
                PatternSegment::Param(_) => "{}",
            })
            .collect::<Vec<_>>()
            .join("/")
    }

    /// Match a concrete request path, returning the bound placeholder values.
    pub fn matches(&self, path: &str) -> Option<HashMap<String, String>> {
        let parts: Vec<&str> = path.split('/').collect();
        if parts.len() != self.segments.len() {
            return None;
        }

        let mut params = HashMap::new();
        for (segment, part) in self.segments.iter().zip(parts) {
            let value = decode_component(part);
            match segment {
                PatternSegment::Literal(lit) => {
                    if *lit != value {
                        return None;
                    }
                }
                PatternSegment::Param(name) => {
                    if value.is_empty() {
                        return None;
                    }
                    params.insert(name.clone(), value.into_owned());
                }
            }
        }

        Some(params)
    }
}

impl fmt::Display for PathPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

fn placeholder_name(segment: &str) -> Option<&str> {
    if let Some(inner) = segment.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
        return Some(inner);
    }
    segment
        .strip_prefix('<')
        .and_then(|s| s.strip_suffix('>'))
        .map(|inner| inner.rsplit(':').next().unwrap_or(inner))
}

/// Split a configured path into its route part and embedded query string.
pub fn split_path_and_query(path: &str) -> (&str, Option<&str>) {
    match path.split_once('?') {
        Some((route, query)) => (route, Some(query)),
        None => (path, None),
    }
}

/// Parse a query string into key-value pairs.
///
/// A repeated key keeps its last value.
pub fn parse_query_string(query: &str) -> HashMap<String, String> {
    let query = query.strip_prefix('?').unwrap_or(query);
    let mut params = HashMap::new();

    for part in query.split('&') {
        if part.is_empty() {
            continue;
        }
        let (key, value) = part.split_once('=').unwrap_or((part, ""));
        params.insert(decode_query_component(key), decode_query_component(value));
    }

    params
}

fn decode_component(s: &str) -> Cow<'_, str> {
    urlencoding::decode(s).unwrap_or(Cow::Borrowed(s))
}

fn decode_query_component(s: &str) -> String {
    let spaced = s.replace('+', " ");
    decode_component(&spaced).into_owned()
}
