//! Template engine for dynamic responses.
//!
//! A response template is the JSON text of the configured body. Every
//! `{{name}}` placeholder whose name is a known parameter is replaced by the
//! parameter value; unknown placeholders are written back unchanged. The
//! substituted text is then parsed as JSON again.

use crate::error::{MockError, Result};
use regex::{Captures, Regex};
use std::borrow::Cow;
use std::collections::HashMap;

const PLACEHOLDER_PATTERN: &str = r"\{\{([^}]+)\}\}";

/// Whether a serialized template contains anything to substitute.
pub fn has_placeholders(template: &str) -> bool {
    template.contains("{{") && template.contains("}}")
}

/// Template engine for rendering response bodies.
#[derive(Debug, Clone)]
pub struct TemplateEngine {
    placeholder: Regex,
    escape_values: bool,
}

impl TemplateEngine {
    /// Create a template engine that inserts parameter values verbatim.
    pub fn new() -> Self {
        Self {
            placeholder: Regex::new(PLACEHOLDER_PATTERN).expect("placeholder pattern is valid"),
            escape_values: false,
        }
    }

    /// JSON-escape parameter values before inserting them.
    ///
    /// With escaping on, a value containing quotes or control characters can
    /// no longer break out of the surrounding JSON string.
    pub fn with_escaping(mut self, escape_values: bool) -> Self {
        self.escape_values = escape_values;
        self
    }

    /// Distinct placeholder names in order of first appearance.
    pub fn placeholders<'t>(&self, template: &'t str) -> Vec<&'t str> {
        let mut names: Vec<&str> = Vec::new();
        for caps in self.placeholder.captures_iter(template) {
            if let Some(m) = caps.get(1) {
                if !names.contains(&m.as_str()) {
                    names.push(m.as_str());
                }
            }
        }
        names
    }

    /// Render a serialized JSON template with the given parameters.
    ///
    /// Substituted values are never expanded again, even when they look like
    /// placeholders themselves.
    pub fn render(
        &self,
        template: &str,
        params: &HashMap<String, String>,
    ) -> Result<serde_json::Value> {
        let mut substitutions: HashMap<&str, Cow<'_, str>> = HashMap::new();
        for name in self.placeholders(template) {
            let value = match params.get(name.trim()) {
                Some(value) if self.escape_values => Cow::Owned(escape_json(value)),
                Some(value) => Cow::Borrowed(value.as_str()),
                None => Cow::Owned(format!("{{{{{}}}}}", name)),
            };
            substitutions.insert(name, value);
        }

        let rendered = self
            .placeholder
            .replace_all(template, |caps: &Captures<'_>| match substitutions.get(&caps[1]) {
                Some(value) => value.to_string(),
                None => caps[0].to_string(),
            });

        serde_json::from_str(&rendered).map_err(|source| MockError::TemplateDecode {
            template: template.to_string(),
            source,
        })
    }

    /// Render a structured template, skipping the text round trip when it
    /// holds no placeholders.
    pub fn render_json(
        &self,
        template: &serde_json::Value,
        params: &HashMap<String, String>,
    ) -> Result<serde_json::Value> {
        let text = template.to_string();
        if has_placeholders(&text) {
            self.render(&text, params)
        } else {
            Ok(template.clone())
        }
    }
}

impl Default for TemplateEngine {
    fn default() -> Self {
        Self::new()
    }
}

fn escape_json(value: &str) -> String {
    let quoted = serde_json::Value::String(value.to_string()).to_string();
    quoted[1..quoted.len() - 1].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const TEMPLATE: &str = r#"{"message": "Hello, {{name}}! Your ID is {{id}}."}"#;

    fn params(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_render_with_valid_params() {
        let engine = TemplateEngine::new();
        let result = engine
            .render(TEMPLATE, &params(&[("name", "John Doe"), ("id", "12345")]))
            .unwrap();
        assert_eq!(result, json!({"message": "Hello, John Doe! Your ID is 12345."}));
    }

    #[test]
    fn test_render_with_unrelated_params() {
        let engine = TemplateEngine::new();
        let result = engine.render(TEMPLATE, &params(&[("age", "23")])).unwrap();
        assert_eq!(result, json!({"message": "Hello, {{name}}! Your ID is {{id}}."}));
    }

    #[test]
    fn test_render_with_missing_parameter() {
        let engine = TemplateEngine::new();
        let template = r#"{"message": "Hello, {{name}}! Your age is {{age}}."}"#;
        let result = engine
            .render(template, &params(&[("name", "John Doe"), ("id", "12345")]))
            .unwrap();
        assert_eq!(result, json!({"message": "Hello, John Doe! Your age is {{age}}."}));
    }

    #[test]
    fn test_partial_substitution() {
        let engine = TemplateEngine::new();
        let result = engine
            .render(r#"{"a":"{{x}}","b":"{{y}}"}"#, &params(&[("x", "1")]))
            .unwrap();
        assert_eq!(result, json!({"a": "1", "b": "{{y}}"}));
    }

    #[test]
    fn test_render_is_idempotent() {
        let engine = TemplateEngine::new();
        let p = params(&[("name", "Ana")]);
        assert_eq!(
            engine.render(TEMPLATE, &p).unwrap(),
            engine.render(TEMPLATE, &p).unwrap()
        );
    }

    #[test]
    fn test_render_with_empty_template() {
        let engine = TemplateEngine::new();
        let err = engine
            .render("", &params(&[("name", "John Doe")]))
            .unwrap_err();
        assert!(matches!(err, MockError::TemplateDecode { .. }));
    }

    #[test]
    fn test_unescaped_quote_breaks_json() {
        let engine = TemplateEngine::new();
        let err = engine
            .render(TEMPLATE, &params(&[("name", r#"John "JD" Doe"#)]))
            .unwrap_err();
        match err {
            MockError::TemplateDecode { template, .. } => assert_eq!(template, TEMPLATE),
            other => panic!("Expected TemplateDecode, got {:?}", other),
        }
    }

    #[test]
    fn test_escaping_keeps_json_valid() {
        let engine = TemplateEngine::new().with_escaping(true);
        let result = engine
            .render(TEMPLATE, &params(&[("name", "John \"JD\"\nDoe"), ("id", "7")]))
            .unwrap();
        assert_eq!(
            result,
            json!({"message": "Hello, John \"JD\"\nDoe! Your ID is 7."})
        );
    }

    #[test]
    fn test_substituted_values_are_not_expanded() {
        let engine = TemplateEngine::new();
        let result = engine
            .render(
                r#"{"a":"{{name}}","b":"{{id}}"}"#,
                &params(&[("name", "{{id}}"), ("id", "42")]),
            )
            .unwrap();
        assert_eq!(result, json!({"a": "{{id}}", "b": "42"}));
    }

    #[test]
    fn test_placeholders_in_order_of_first_appearance() {
        let engine = TemplateEngine::new();
        let names = engine.placeholders(r#"{"a":"{{b}} {{a}} {{b}}","c":["{{c}}"]}"#);
        assert_eq!(names, vec!["b", "a", "c"]);
    }

    #[test]
    fn test_whitespace_inside_placeholder() {
        let engine = TemplateEngine::new();
        let result = engine
            .render(r#"{"a":"{{ x }}","b":"{{ y }}"}"#, &params(&[("x", "1")]))
            .unwrap();
        assert_eq!(result, json!({"a": "1", "b": "{{ y }}"}));
    }

    #[test]
    fn test_placeholder_can_produce_non_string_values() {
        let engine = TemplateEngine::new();
        let result = engine
            .render(r#"{"count": {{n}}}"#, &params(&[("n", "3")]))
            .unwrap();
        assert_eq!(result, json!({"count": 3}));
    }

    #[test]
    fn test_render_json_fast_path() {
        let engine = TemplateEngine::new();
        let template = json!({"message": "Hello, world!", "items": [1, 2, 3]});
        let result = engine
            .render_json(&template, &params(&[("message", "ignored")]))
            .unwrap();
        assert_eq!(result, template);
    }

    #[test]
    fn test_render_json_substitutes() {
        let engine = TemplateEngine::new();
        let template = json!({"id": "{{id}}", "tags": ["user-{{id}}", "static"]});
        let result = engine.render_json(&template, &params(&[("id", "9")])).unwrap();
        assert_eq!(result, json!({"id": "9", "tags": ["user-9", "static"]}));
    }

    #[test]
    fn test_has_placeholders() {
        assert!(has_placeholders(r#"{"a":"{{x}}"}"#));
        assert!(!has_placeholders(r#"{"a":"{{x"}"#));
        assert!(!has_placeholders(r#"{"a":"x"}"#));
    }
}
