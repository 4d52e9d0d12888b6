//! Endpoint definitions.
//!
//! Normalizes raw configuration records into the immutable definitions the
//! dispatcher routes on.

use crate::config::EndpointRecord;
use crate::error::{MockError, Result};
use crate::matcher::{split_path_and_query, PathPattern};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Supported HTTP methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Head,
    Options,
}

impl HttpMethod {
    /// Every supported method.
    pub const ALL: [HttpMethod; 7] = [
        HttpMethod::Get,
        HttpMethod::Post,
        HttpMethod::Put,
        HttpMethod::Patch,
        HttpMethod::Delete,
        HttpMethod::Head,
        HttpMethod::Options,
    ];

    /// Uppercase method name.
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Head => "HEAD",
            HttpMethod::Options => "OPTIONS",
        }
    }
}

impl FromStr for HttpMethod {
    type Err = MockError;

    fn from_str(s: &str) -> Result<Self> {
        let upper = s.trim().to_ascii_uppercase();
        HttpMethod::ALL
            .into_iter()
            .find(|m| m.as_str() == upper)
            .ok_or_else(|| MockError::InvalidMethod {
                method: s.to_string(),
            })
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One configured mock route.
#[derive(Debug, Clone, PartialEq)]
pub struct EndpointDefinition {
    /// HTTP method to answer
    pub method: HttpMethod,
    /// Route path pattern
    pub pattern: PathPattern,
    /// Query string embedded in the configured path; not part of the route
    pub query: Option<String>,
    /// Response body, possibly containing `{{name}}` placeholders
    pub response_template: serde_json::Value,
    /// Response status code
    pub status_code: u16,
    /// Response headers
    pub headers: HashMap<String, String>,
    /// Internal route identifier
    pub route_id: String,
}

impl EndpointDefinition {
    /// Create a definition answering `200` with no extra headers.
    pub fn new(
        method: HttpMethod,
        path: &str,
        response_template: serde_json::Value,
    ) -> Result<Self> {
        let (route, query) = split_path_and_query(path);
        let pattern = PathPattern::parse(route)?;
        let route_id = route_id(method, &pattern);

        Ok(Self {
            method,
            pattern,
            query: query.map(String::from),
            response_template,
            status_code: 200,
            headers: HashMap::new(),
            route_id,
        })
    }

    /// Set the response status code.
    pub fn with_status_code(mut self, status: u16) -> Result<Self> {
        if !(100..=599).contains(&status) {
            return Err(MockError::InvalidStatusCode { status });
        }
        self.status_code = status;
        Ok(self)
    }

    /// Add a response header.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }
}

/// Derive the route identifier: lowercase method followed by the path with
/// `/` turned into `_` and placeholder delimiters dropped.
pub fn route_id(method: HttpMethod, pattern: &PathPattern) -> String {
    let path = pattern.bare_segments().collect::<Vec<_>>().join("_");
    format!("{}{}", method.as_str().to_ascii_lowercase(), path)
}

/// Build a definition from the record at `index` in the configuration.
pub fn build_definition(index: usize, record: &EndpointRecord) -> Result<EndpointDefinition> {
    let missing = |field| MockError::MissingField { index, field };

    let method: HttpMethod = record.method.as_deref().ok_or_else(|| missing("method"))?.parse()?;
    let path = record.path.as_deref().ok_or_else(|| missing("path"))?;
    let body = record
        .response_body
        .clone()
        .ok_or_else(|| missing("response_body"))?;

    let mut definition = EndpointDefinition::new(method, path, body)?
        .with_status_code(record.status_code.unwrap_or(200))?;
    definition.headers = record.headers.clone();

    Ok(definition)
}

/// Build every definition, stopping at the first malformed record.
pub fn build_definitions(records: &[EndpointRecord]) -> Result<Vec<EndpointDefinition>> {
    records
        .iter()
        .enumerate()
        .map(|(index, record)| build_definition(index, record))
        .collect()
}
