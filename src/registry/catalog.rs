//! The fixed set of OTel templates.
//!
//! Component templates come first: the index templates compose them and
//! the cluster rejects an index template whose components are missing.

use serde_json::Value;

use crate::cluster::{ContentRegistry, TemplateKind, JSON};
use crate::error::CodecError;

/// Version stamped into every template. Bump when any source changes.
pub const TEMPLATE_VERSION: u64 = 9;

/// Placeholder substituted with [`TEMPLATE_VERSION`].
pub const TEMPLATE_VERSION_VARIABLE: &str = "${xpack.oteldata.template.version}";

/// One template the registry maintains.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TemplateConfig {
    pub kind: TemplateKind,
    pub name: &'static str,
    source: &'static str,
}

impl TemplateConfig {
    const fn component(name: &'static str, source: &'static str) -> Self {
        Self {
            kind: TemplateKind::Component,
            name,
            source,
        }
    }

    const fn index(name: &'static str, source: &'static str) -> Self {
        Self {
            kind: TemplateKind::Index,
            name,
            source,
        }
    }

    /// Render the source with the current version and parse it.
    pub fn load(&self, codec: &dyn ContentRegistry) -> Result<Value, CodecError> {
        let source = self
            .source
            .replace(TEMPLATE_VERSION_VARIABLE, &TEMPLATE_VERSION.to_string());
        codec.parse(JSON, &source)
    }
}

/// All templates in install order.
pub fn templates() -> &'static [TemplateConfig] {
    TEMPLATES
}

static TEMPLATES: &[TemplateConfig] = &[
    TemplateConfig::component(
        "otel@mappings",
        r#"{
          "version": ${xpack.oteldata.template.version},
          "template": {
            "mappings": {
              "dynamic": false,
              "date_detection": false,
              "properties": {
                "@timestamp": { "type": "date_nanos", "ignore_malformed": false },
                "observed_timestamp": { "type": "date_nanos" },
                "attributes": { "type": "passthrough", "dynamic": true, "priority": 10 },
                "resource": {
                  "properties": {
                    "attributes": { "type": "passthrough", "dynamic": true, "priority": 20 },
                    "dropped_attributes_count": { "type": "long" }
                  }
                },
                "scope": {
                  "properties": {
                    "name": { "type": "keyword", "ignore_above": 1024 },
                    "version": { "type": "keyword", "ignore_above": 1024 },
                    "attributes": { "type": "passthrough", "dynamic": true, "priority": 30 }
                  }
                },
                "data_stream": {
                  "properties": {
                    "type": { "type": "constant_keyword" },
                    "dataset": { "type": "constant_keyword" },
                    "namespace": { "type": "constant_keyword" }
                  }
                }
              }
            }
          },
          "_meta": { "description": "Base mappings for OTel data streams", "managed": true }
        }"#,
    ),
    TemplateConfig::component(
        "otel@settings",
        r#"{
          "version": ${xpack.oteldata.template.version},
          "template": {
            "settings": {
              "index": {
                "mode": "logsdb",
                "sort": { "field": ["resource.attributes.host.name", "@timestamp"] }
              }
            }
          },
          "_meta": { "description": "Base settings for OTel data streams", "managed": true }
        }"#,
    ),
    TemplateConfig::component(
        "semconv-resource-to-ecs@mappings",
        r#"{
          "version": ${xpack.oteldata.template.version},
          "template": {
            "mappings": {
              "properties": {
                "host.name": { "type": "alias", "path": "resource.attributes.host.name" },
                "service.name": { "type": "alias", "path": "resource.attributes.service.name" },
                "service.version": { "type": "alias", "path": "resource.attributes.service.version" }
              }
            }
          },
          "_meta": { "description": "Aliases from semantic conventions to ECS", "managed": true }
        }"#,
    ),
    TemplateConfig::component(
        "metrics-otel@mappings",
        r#"{
          "version": ${xpack.oteldata.template.version},
          "template": {
            "settings": { "index": { "mode": "time_series" } },
            "mappings": {
              "properties": {
                "metrics": { "type": "passthrough", "dynamic": true, "priority": 40, "time_series_dimension": false },
                "unit": { "type": "keyword", "time_series_dimension": true },
                "start_timestamp": { "type": "date_nanos" }
              }
            }
          },
          "_meta": { "description": "Mappings for OTel metrics", "managed": true }
        }"#,
    ),
    TemplateConfig::index(
        "logs-otel@template",
        r#"{
          "version": ${xpack.oteldata.template.version},
          "index_patterns": ["logs-*.otel-*"],
          "priority": 120,
          "data_stream": {},
          "allow_auto_create": true,
          "composed_of": ["otel@mappings", "otel@settings", "semconv-resource-to-ecs@mappings"],
          "template": {
            "mappings": {
              "properties": {
                "body": {
                  "properties": {
                    "text": { "type": "match_only_text" },
                    "structured": { "type": "flattened" }
                  }
                },
                "severity_text": { "type": "keyword" },
                "severity_number": { "type": "byte" },
                "trace_id": { "type": "keyword" },
                "span_id": { "type": "keyword" }
              }
            }
          },
          "_meta": { "description": "Default template for OTel logs", "managed": true }
        }"#,
    ),
    TemplateConfig::index(
        "metrics-otel@template",
        r#"{
          "version": ${xpack.oteldata.template.version},
          "index_patterns": ["metrics-*.otel-*"],
          "priority": 120,
          "data_stream": {},
          "allow_auto_create": true,
          "composed_of": ["otel@mappings", "semconv-resource-to-ecs@mappings", "metrics-otel@mappings"],
          "_meta": { "description": "Default template for OTel metrics", "managed": true }
        }"#,
    ),
    TemplateConfig::index(
        "traces-otel@template",
        r#"{
          "version": ${xpack.oteldata.template.version},
          "index_patterns": ["traces-*.otel-*"],
          "priority": 120,
          "data_stream": {},
          "allow_auto_create": true,
          "composed_of": ["otel@mappings", "otel@settings", "semconv-resource-to-ecs@mappings"],
          "template": {
            "mappings": {
              "properties": {
                "trace_id": { "type": "keyword" },
                "span_id": { "type": "keyword" },
                "parent_span_id": { "type": "keyword" },
                "name": { "type": "keyword" },
                "kind": { "type": "keyword" },
                "duration": { "type": "long" },
                "status": {
                  "properties": { "code": { "type": "keyword" } }
                }
              }
            }
          },
          "_meta": { "description": "Default template for OTel traces", "managed": true }
        }"#,
    ),
];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::JsonContentRegistry;

    #[test]
    fn test_every_template_parses_with_version() {
        for template in templates() {
            let body = template
                .load(&JsonContentRegistry)
                .unwrap_or_else(|e| panic!("{} failed to parse: {}", template.name, e));
            assert_eq!(body["version"], TEMPLATE_VERSION, "{}", template.name);
            assert_eq!(body["_meta"]["managed"], true, "{}", template.name);
        }
    }

    #[test]
    fn test_components_precede_index_templates() {
        let first_index = templates()
            .iter()
            .position(|t| t.kind == TemplateKind::Index)
            .unwrap();
        assert!(templates()[first_index..]
            .iter()
            .all(|t| t.kind == TemplateKind::Index));
    }

    #[test]
    fn test_index_templates_only_compose_known_components() {
        let components: Vec<_> = templates()
            .iter()
            .filter(|t| t.kind == TemplateKind::Component)
            .map(|t| t.name)
            .collect();

        for template in templates().iter().filter(|t| t.kind == TemplateKind::Index) {
            let body = template.load(&JsonContentRegistry).unwrap();
            for composed in body["composed_of"].as_array().unwrap() {
                let name = composed.as_str().unwrap();
                assert!(components.contains(&name), "{} composes unknown {}", template.name, name);
            }
        }
    }
}
