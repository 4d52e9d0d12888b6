//! Configuration for the mock server.
//!
//! The endpoint document is a top-level list of records:
//!
//! ```json
//! [
//!   { "method": "GET", "path": "/test", "response_body": {"message": "Hello, world!"} },
//!   { "method": "POST", "path": "/test/{name}/{id}", "status_code": 201,
//!     "headers": {"X-Custom": "value"},
//!     "response_body": {"message": "Hello, {{name}}! Your ID is {{id}}."} }
//! ]
//! ```

use crate::endpoint::{build_definitions, EndpointDefinition};
use crate::error::{MockError, Result};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Environment variable naming the endpoint file.
pub const ENDPOINTS_ENV_VAR: &str = "MOCK_ENDPOINTS_JSON";

/// The loaded endpoint document.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct MockServerConfig {
    /// Endpoint records in document order
    pub endpoints: Vec<EndpointRecord>,
}

/// One raw endpoint record, as written in the configuration document.
///
/// Required fields are optional here so that a missing one can be reported
/// by name when the record is turned into an [`EndpointDefinition`].
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct EndpointRecord {
    /// HTTP method, any case
    #[serde(default)]
    pub method: Option<String>,

    /// Route path, optionally with an embedded query string
    #[serde(default)]
    pub path: Option<String>,

    /// Response body template (`null` is a valid body)
    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub response_body: Option<serde_json::Value>,

    /// Response status code (default 200)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,

    /// Response headers
    #[serde(default)]
    pub headers: HashMap<String, String>,
}

/// Keeps an explicit `null` distinct from an absent field.
fn present<'de, D>(deserializer: D) -> std::result::Result<Option<serde_json::Value>, D::Error>
where
    D: Deserializer<'de>,
{
    serde_json::Value::deserialize(deserializer).map(Some)
}

impl MockServerConfig {
    /// Parse a JSON endpoint document.
    pub fn from_json_str(content: &str) -> Result<Self> {
        serde_json::from_str(content).map_err(|e| MockError::ConfigParse(e.to_string()))
    }

    /// Parse a YAML endpoint document.
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        serde_yaml::from_str(content).map_err(|e| MockError::ConfigParse(e.to_string()))
    }

    /// Load the endpoint document from a `.json`, `.yaml` or `.yml` file.
    pub fn from_file(path: &Path) -> Result<Self> {
        if !validate_config_file(path) {
            return Err(MockError::InvalidConfigFile {
                path: path.to_path_buf(),
            });
        }

        let content = std::fs::read_to_string(path)?;
        match extension(path).as_deref() {
            Some("json") => Self::from_json_str(&content),
            _ => Self::from_yaml_str(&content),
        }
    }

    /// Build every endpoint definition, failing on the first malformed record.
    pub fn definitions(&self) -> Result<Vec<EndpointDefinition>> {
        build_definitions(&self.endpoints)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        self.definitions().map(|_| ())
    }
}

/// Whether `path` names an existing file with a supported extension.
pub fn validate_config_file(path: &Path) -> bool {
    path.is_file() && matches!(extension(path).as_deref(), Some("json" | "yaml" | "yml"))
}

fn extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tokio_test::{assert_err, assert_ok};

    const SAMPLE: &str = r#"[
        {"method": "GET", "path": "/test", "response_body": {"message": "Hello, world!"}},
        {"method": "POST", "path": "/test/{name}/{id}", "status_code": 201,
         "headers": {"X-Custom": "value"},
         "response_body": {"message": "Hello, {{name}}! Your ID is {{id}}."}}
    ]"#;

    fn write_temp(suffix: &str, content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_parse_endpoint_document() {
        let config = MockServerConfig::from_json_str(SAMPLE).unwrap();
        assert_eq!(config.endpoints.len(), 2);

        let first = &config.endpoints[0];
        assert_eq!(first.method.as_deref(), Some("GET"));
        assert_eq!(first.status_code, None);
        assert!(first.headers.is_empty());

        let second = &config.endpoints[1];
        assert_eq!(second.status_code, Some(201));
        assert_eq!(second.headers.get("X-Custom"), Some(&"value".to_string()));
    }

    #[test]
    fn test_null_body_is_present() {
        let config =
            MockServerConfig::from_json_str(r#"[{"method": "GET", "path": "/", "response_body": null}]"#)
                .unwrap();
        assert_eq!(config.endpoints[0].response_body, Some(serde_json::Value::Null));

        let config = MockServerConfig::from_json_str(r#"[{"method": "GET", "path": "/"}]"#).unwrap();
        assert_eq!(config.endpoints[0].response_body, None);
    }

    #[test]
    fn test_parse_yaml_document() {
        let yaml = r#"
- method: get
  path: /users/{id}
  status_code: 200
  response_body:
    id: "{{id}}"
"#;
        let config = MockServerConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(config.endpoints.len(), 1);
        assert_eq!(
            config.endpoints[0].response_body,
            Some(serde_json::json!({"id": "{{id}}"}))
        );
    }

    #[test]
    fn test_load_config_file_valid() {
        let file = write_temp(".json", SAMPLE);
        assert_ok!(MockServerConfig::from_file(file.path()));

        let config = MockServerConfig::from_file(file.path()).unwrap();
        assert_eq!(config, MockServerConfig::from_json_str(SAMPLE).unwrap());
    }

    #[test]
    fn test_load_config_file_invalid_path() {
        let result = MockServerConfig::from_file(Path::new("invalid_path.json"));
        assert!(matches!(result, Err(MockError::InvalidConfigFile { .. })));
    }

    #[test]
    fn test_load_config_file_invalid_extension() {
        let file = write_temp(".txt", SAMPLE);
        let result = MockServerConfig::from_file(file.path());
        assert!(matches!(result, Err(MockError::InvalidConfigFile { .. })));
    }

    #[test]
    fn test_load_config_file_malformed() {
        let file = write_temp(".json", "{ not json");
        assert_err!(MockServerConfig::from_file(file.path()));

        let result = MockServerConfig::from_file(file.path());
        assert!(matches!(result, Err(MockError::ConfigParse(_))));
    }

    #[test]
    fn test_validate_reports_missing_field() {
        let config = MockServerConfig::from_json_str(
            r#"[{"method": "GET", "path": "/ok", "response_body": {}}, {"method": "GET", "response_body": {}}]"#,
        )
        .unwrap();
        assert!(matches!(
            config.validate(),
            Err(MockError::MissingField {
                index: 1,
                field: "path"
            })
        ));
    }
}
