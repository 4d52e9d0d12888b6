//! Route registry and request dispatch.
//!
//! The registry is filled once at startup and only read afterwards, so a
//! shared `&Dispatcher` can serve any number of concurrent requests.

use crate::config::MockServerConfig;
use crate::endpoint::{EndpointDefinition, HttpMethod};
use crate::error::{MockError, Result};
use crate::matcher::parse_query_string;
use crate::template::TemplateEngine;
use std::collections::HashMap;
use tracing::{debug, info, warn};

/// Parameters extracted from one request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParameterSet {
    /// Values bound by path placeholders
    pub path_params: HashMap<String, String>,
    /// Values parsed from the query string
    pub query_params: HashMap<String, String>,
}

impl ParameterSet {
    /// Path parameters overlaid by query parameters.
    pub fn merged(&self) -> HashMap<String, String> {
        let mut merged = self.path_params.clone();
        merged.extend(
            self.query_params
                .iter()
                .map(|(k, v)| (k.clone(), v.clone())),
        );
        merged
    }
}

/// The response computed for one request.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderResult {
    pub body: serde_json::Value,
    pub status_code: u16,
    pub headers: HashMap<String, String>,
}

/// Result of matching a request against the registered endpoints.
#[derive(Debug)]
pub struct MatchResult<'a> {
    /// The matched endpoint
    pub definition: &'a EndpointDefinition,
    /// Parameters captured during matching
    pub params: ParameterSet,
}

/// Route table keyed by method, dispatching requests to endpoint definitions.
#[derive(Debug, Default)]
pub struct Dispatcher {
    routes: HashMap<HttpMethod, Vec<EndpointDefinition>>,
    template_engine: TemplateEngine,
}

impl Dispatcher {
    /// Create an empty dispatcher.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty dispatcher rendering with `engine`.
    pub fn with_template_engine(engine: TemplateEngine) -> Self {
        Self {
            routes: HashMap::new(),
            template_engine: engine,
        }
    }

    /// Build every endpoint in `config` and register it.
    pub fn from_config(config: &MockServerConfig, engine: TemplateEngine) -> Result<Self> {
        let mut dispatcher = Self::with_template_engine(engine);
        for definition in config.definitions()? {
            dispatcher.register(definition);
        }
        info!(endpoints = dispatcher.len(), "Mock endpoints registered");
        Ok(dispatcher)
    }

    /// Register an endpoint.
    ///
    /// An endpoint with the same method and an equivalent pattern replaces the
    /// earlier one, which is returned.
    pub fn register(&mut self, definition: EndpointDefinition) -> Option<EndpointDefinition> {
        info!(
            route_id = %definition.route_id,
            method = %definition.method,
            path = %definition.pattern,
            status = definition.status_code,
            "Registering endpoint"
        );

        let routes = self.routes.entry(definition.method).or_default();
        let key = definition.pattern.normalized();

        match routes.iter_mut().find(|r| r.pattern.normalized() == key) {
            Some(existing) => {
                warn!(
                    route_id = %definition.route_id,
                    replaced = %existing.pattern,
                    "Replacing previously registered endpoint"
                );
                Some(std::mem::replace(existing, definition))
            }
            None => {
                routes.push(definition);
                None
            }
        }
    }

    /// Number of registered endpoints.
    pub fn len(&self) -> usize {
        self.routes.values().map(Vec::len).sum()
    }

    /// Whether no endpoint is registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Find the endpoint answering a request.
    ///
    /// When several patterns match, the one with the most literal segments
    /// wins; ties go to the earliest registration.
    pub fn find_match(
        &self,
        method: HttpMethod,
        path: &str,
        query_string: Option<&str>,
    ) -> Option<MatchResult<'_>> {
        let mut best: Option<(&EndpointDefinition, HashMap<String, String>)> = None;

        for definition in self.routes.get(&method)? {
            if let Some(params) = definition.pattern.matches(path) {
                let better = best.as_ref().map_or(true, |(current, _)| {
                    definition.pattern.literal_count() > current.pattern.literal_count()
                });
                if better {
                    best = Some((definition, params));
                }
            }
        }

        best.map(|(definition, path_params)| MatchResult {
            definition,
            params: ParameterSet {
                path_params,
                query_params: parse_query_string(query_string.unwrap_or("")),
            },
        })
    }

    /// Dispatch a request and render its response.
    pub fn dispatch(
        &self,
        method: &str,
        path: &str,
        query_string: Option<&str>,
    ) -> Result<RenderResult> {
        let not_found = || MockError::RouteNotFound {
            method: method.to_ascii_uppercase(),
            path: path.to_string(),
        };

        let method: HttpMethod = method.parse().map_err(|_| not_found())?;
        let matched = self
            .find_match(method, path, query_string)
            .ok_or_else(not_found)?;
        let definition = matched.definition;

        debug!(
            route_id = %definition.route_id,
            method = %method,
            path = %path,
            "Request matched endpoint"
        );

        let body = self
            .template_engine
            .render_json(&definition.response_template, &matched.params.merged())?;

        Ok(RenderResult {
            body,
            status_code: definition.status_code,
            headers: definition.headers.clone(),
        })
    }

    /// Methods with an endpoint matching `path`, in canonical order.
    pub fn allowed_methods(&self, path: &str) -> Vec<HttpMethod> {
        HttpMethod::ALL
            .into_iter()
            .filter(|method| {
                self.routes
                    .get(method)
                    .is_some_and(|routes| routes.iter().any(|r| r.pattern.matches(path).is_some()))
            })
            .collect()
    }
}
