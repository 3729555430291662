//! Serialization of API documents to YAML or JSON.
//!
//! The serialized document is the Swagger 2.0 record assembled by
//! [`OpenApiBuilder`](crate::openapi_builder::OpenApiBuilder). Paths and verbs are kept in
//! `BTreeMap`s, so the same input always serializes to the same text.

use crate::openapi_builder::ApiDocument;
use anyhow::{Context, Result};
use log::debug;
use std::fs;
use std::path::Path;

/// Serializes an API document to YAML format.
///
/// # Example
///
/// ```
/// use routes_from_source::openapi_builder::OpenApiBuilder;
/// use routes_from_source::serializer::serialize_yaml;
///
/// let doc = OpenApiBuilder::new().build();
/// let yaml = serialize_yaml(&doc).unwrap();
/// assert!(yaml.contains("swagger:"));
/// ```
pub fn serialize_yaml(doc: &ApiDocument) -> Result<String> {
    debug!("Serializing API document to YAML");
    serde_yaml::to_string(doc).context("Failed to serialize API document to YAML")
}

/// Serializes an API document to pretty-printed JSON.
pub fn serialize_json(doc: &ApiDocument) -> Result<String> {
    debug!("Serializing API document to JSON");
    serde_json::to_string_pretty(doc).context("Failed to serialize API document to JSON")
}

/// Writes string content to a file, creating parent directories and overwriting any
/// existing file.
pub fn write_to_file(content: &str, path: &Path) -> Result<()> {
    debug!("Writing content to file: {}", path.display());

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }

    fs::write(path, content)
        .with_context(|| format!("Failed to write to file: {}", path.display()))?;

    debug!("Successfully wrote {} bytes to {}", content.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directive::HttpVerb;
    use crate::openapi_builder::{ApiOperation, Info, OpenApiBuilder, Parameter, Tag};
    use tempfile::TempDir;

    fn create_test_document() -> ApiDocument {
        let mut builder = OpenApiBuilder::new().with_info(Info {
            title: "Test API".to_string(),
            version: "1.0.0".to_string(),
            description: "A test API".to_string(),
        });
        builder.add_declaration(
            Tag {
                name: "order".to_string(),
                description: "Orders".to_string(),
            },
            &[ApiOperation {
                path: "/order/:id".to_string(),
                verb: HttpVerb::Get,
                tags: vec!["order".to_string()],
                summary: "Get an order".to_string(),
                description: String::new(),
                operation_id: "Order.get".to_string(),
                parameters: vec![Parameter {
                    name: "id".to_string(),
                    location: "path".to_string(),
                    description: "Order id".to_string(),
                    required: true,
                    type_name: "integer".to_string(),
                }],
            }],
        );
        builder.build()
    }

    #[test]
    fn test_serialize_yaml() {
        let yaml = serialize_yaml(&create_test_document()).unwrap();

        assert!(yaml.contains("swagger:"));
        assert!(yaml.contains("2.0"));
        assert!(yaml.contains("title: Test API"));
        assert!(yaml.contains("/order/{id}"));
        assert!(yaml.contains("get:"));
        assert!(yaml.contains("operationId: Order.get"));
        assert!(yaml.contains("in: path"));
    }

    #[test]
    fn test_serialize_json() {
        let json = serialize_json(&create_test_document()).unwrap();

        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed["swagger"], "2.0");
        assert_eq!(parsed["info"]["title"], "Test API");
        assert_eq!(parsed["tags"][0]["name"], "order");

        let operation = &parsed["paths"]["/order/{id}"]["get"];
        assert_eq!(operation["summary"], "Get an order");
        assert_eq!(operation["parameters"][0]["required"], true);
        assert_eq!(operation["parameters"][0]["type"], "integer");
        assert_eq!(operation["responses"]["200"]["description"], "Successful response");
    }

    #[test]
    fn test_serialize_json_pretty_format() {
        let json = serialize_json(&create_test_document()).unwrap();
        assert!(json.contains('\n'));
        assert!(json.lines().count() > 5, "Pretty printed JSON should have multiple lines");
    }

    #[test]
    fn test_serialization_is_stable() {
        let doc = create_test_document();
        assert_eq!(serialize_yaml(&doc).unwrap(), serialize_yaml(&doc.clone()).unwrap());
    }

    #[test]
    fn test_write_to_file_creates_directories() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("docs").join("swagger.yaml");

        write_to_file("test content", &file_path).unwrap();

        assert_eq!(fs::read_to_string(&file_path).unwrap(), "test content");
    }

    #[test]
    fn test_write_yaml_file_end_to_end() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("swagger.yaml");

        let doc = create_test_document();
        write_to_file(&serialize_yaml(&doc).unwrap(), &file_path).unwrap();

        let content = fs::read_to_string(&file_path).unwrap();
        let deserialized: ApiDocument = serde_yaml::from_str(&content).unwrap();
        assert_eq!(deserialized, doc);
    }
}
