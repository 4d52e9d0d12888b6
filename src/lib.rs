//! Loki Mock Server
//!
//! A configuration-driven HTTP mock server. Each configured endpoint becomes a
//! live route returning a JSON body, with `{{name}}` placeholders filled from
//! path and query parameters at request time.
//!
//! # Features
//!
//! - **Declarative Endpoints**: Method, path pattern, body, status and headers
//! - **Path Parameters**: `/users/{id}` (or `/users/<id>`) binds `id`
//! - **Query Parameters**: Override path parameters of the same name
//! - **Partial Templates**: Unknown placeholders are returned verbatim
//!
//! # Example Configuration
//!
//! ```json
//! [
//!   { "method": "GET", "path": "/test", "response_body": {"message": "Hello, world!"} },
//!   { "method": "POST", "path": "/test/{name}/{id}", "status_code": 201,
//!     "headers": {"X-Custom": "value"},
//!     "response_body": {"message": "Hello, {{name}}! Your ID is {{id}}."} }
//! ]
//! ```

pub mod config;
pub mod dispatcher;
pub mod endpoint;
pub mod error;
pub mod matcher;
pub mod server;
pub mod template;

pub use config::MockServerConfig;
pub use dispatcher::{Dispatcher, ParameterSet, RenderResult};
pub use endpoint::{build_definitions, EndpointDefinition, HttpMethod};
pub use error::{MockError, Result};
pub use server::{MockServer, ServerConfig};
pub use template::TemplateEngine;
