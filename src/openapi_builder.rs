//! API documentation model.
//!
//! [`ApiDocModelBuilder`] turns the directives of every exposed handler into an
//! [`ApiOperation`], and [`ApiDocument`] collects the operations into a Swagger 2.0 document.

use crate::directive::{DirectiveKind, DirectiveMatcher, HttpVerb};
use crate::error::Error;
use crate::introspector::{Declaration, FieldDescriptor, MethodDescriptor};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Documentation facts for one exposed handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiOperation {
    pub path: String,
    pub verb: HttpVerb,
    pub tags: Vec<String>,
    pub summary: String,
    pub description: String,
    pub operation_id: String,
    pub parameters: Vec<Parameter>,
}

/// Swagger parameter object, built from one field of a binding struct
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    #[serde(rename = "in")]
    pub location: String,
    pub description: String,
    pub required: bool,
    /// Swagger primitive type, empty when the field type has none
    #[serde(rename = "type", default, skip_serializing_if = "String::is_empty")]
    pub type_name: String,
}

impl Parameter {
    /// `json` names the parameter, `label` describes it, `in` locates it, and a `required`
    /// rule inside `binding` makes it mandatory.
    pub fn from_field(field: &FieldDescriptor) -> Self {
        let tag = |key: &str| field.tags.get(key).cloned().unwrap_or_default();
        Self {
            name: tag("json"),
            location: tag("in"),
            description: tag("label"),
            required: field
                .tags
                .get("binding")
                .map(|rules| rules.split(',').any(|rule| rule.trim() == "required"))
                .unwrap_or(false),
            type_name: swagger_type(&field.type_name).to_string(),
        }
    }
}

/// Swagger 2.0 primitive type of a Rust field type.
pub fn swagger_type(rust_type: &str) -> &'static str {
    match rust_type {
        "i8" | "i16" | "i32" | "i64" | "i128" | "isize" | "u8" | "u16" | "u32" | "u64"
        | "u128" | "usize" => "integer",
        "f32" | "f64" => "number",
        "bool" => "boolean",
        "String" | "str" | "char" => "string",
        _ => "",
    }
}

/// Documentation group of a controller declaration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub name: String,
    pub description: String,
}

/// Builds documentation operations from declarations of one run.
pub struct ApiDocModelBuilder<'a> {
    declarations: Vec<&'a Declaration>,
    matcher: DirectiveMatcher,
}

impl<'a> ApiDocModelBuilder<'a> {
    /// `declarations` is every declaration of the run; `@Params` looks names up among them.
    pub fn new(declarations: impl IntoIterator<Item = &'a Declaration>) -> Self {
        Self {
            declarations: declarations.into_iter().collect(),
            matcher: DirectiveMatcher::default(),
        }
    }

    /// Documentation group of a declaration: `@Controller <tag> [desc...]`, else its name.
    pub fn controller_tag(&self, decl: &Declaration) -> Tag {
        match self.matcher.parse(&decl.doc).controller() {
            Some((name, description)) => Tag { name, description },
            None => Tag {
                name: decl.name.clone(),
                description: String::new(),
            },
        }
    }

    /// Operations of every exposed method of `decl`, in method order.
    pub fn build(&self, decl: &Declaration) -> Vec<ApiOperation> {
        let controller = self.controller_tag(decl);
        decl.methods
            .iter()
            .filter_map(|method| self.build_operation(decl, method, &controller))
            .collect()
    }

    fn build_operation(
        &self,
        decl: &Declaration,
        method: &MethodDescriptor,
        controller: &Tag,
    ) -> Option<ApiOperation> {
        let api = self.matcher.api_from_first_line(&method.doc)?;
        let directives = self.matcher.parse(&method.doc);

        let mut operation = ApiOperation {
            path: api.path().unwrap_or_default().to_string(),
            verb: api.verb()?,
            tags: vec![controller.name.clone()],
            summary: String::new(),
            description: String::new(),
            operation_id: format!("{}.{}", decl.name, method.name),
            parameters: Vec::new(),
        };

        for directive in &directives.directives {
            match directive.kind {
                DirectiveKind::Summary => operation.summary = directive.text().to_string(),
                DirectiveKind::Desc => operation.description = directive.text().to_string(),
                DirectiveKind::Tag => operation.tags = directive.tokens(),
                DirectiveKind::Params => {
                    let name = directive.first_token().unwrap_or_default();
                    match self.lookup(name) {
                        Ok(params) => {
                            operation.parameters =
                                params.fields.iter().map(Parameter::from_field).collect()
                        }
                        Err(e) => {
                            warn!("{} ({}.{})", e, decl.name, method.name);
                            operation.parameters = Vec::new();
                        }
                    }
                }
                _ => {}
            }
        }

        debug!(
            "Operation {} {} with {} parameters",
            operation.verb,
            operation.path,
            operation.parameters.len()
        );
        Some(operation)
    }

    fn lookup(&self, name: &str) -> Result<&'a Declaration, Error> {
        self.declarations
            .iter()
            .copied()
            .find(|decl| decl.name == name)
            .ok_or_else(|| Error::Lookup {
                name: name.to_string(),
            })
    }
}

/// Swagger info object
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Info {
    pub title: String,
    pub version: String,
    pub description: String,
}

impl Default for Info {
    fn default() -> Self {
        Self {
            title: "Generated API".to_string(),
            version: "1.0.0".to_string(),
            description: "API documentation generated from controller directives".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    pub description: String,
}

/// Swagger operation object
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Operation {
    pub tags: Vec<String>,
    pub summary: String,
    pub description: String,
    #[serde(rename = "operationId")]
    pub operation_id: String,
    pub produces: Vec<String>,
    pub parameters: Vec<Parameter>,
    pub responses: BTreeMap<String, Response>,
}

impl From<&ApiOperation> for Operation {
    fn from(api: &ApiOperation) -> Self {
        let mut responses = BTreeMap::new();
        responses.insert(
            "200".to_string(),
            Response {
                description: "Successful response".to_string(),
            },
        );
        Self {
            tags: api.tags.clone(),
            summary: api.summary.clone(),
            description: api.description.clone(),
            operation_id: api.operation_id.clone(),
            produces: vec!["application/json".to_string()],
            parameters: api.parameters.clone(),
            responses,
        }
    }
}

/// Complete Swagger 2.0 document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiDocument {
    pub swagger: String,
    pub info: Info,
    pub tags: Vec<Tag>,
    /// Path -> lowercase verb -> operation
    pub paths: BTreeMap<String, BTreeMap<String, Operation>>,
}

/// Accumulates operations and tags into an [`ApiDocument`].
pub struct OpenApiBuilder {
    info: Info,
    tags: Vec<Tag>,
    paths: BTreeMap<String, BTreeMap<String, Operation>>,
}

impl OpenApiBuilder {
    pub fn new() -> Self {
        debug!("Initializing OpenApiBuilder");
        Self {
            info: Info::default(),
            tags: Vec::new(),
            paths: BTreeMap::new(),
        }
    }

    pub fn with_info(mut self, info: Info) -> Self {
        self.info = info;
        self
    }

    /// Adds the operations of one declaration under its documentation tag.
    ///
    /// Declarations without operations add nothing, not even their tag.
    pub fn add_declaration(&mut self, tag: Tag, operations: &[ApiOperation]) {
        if operations.is_empty() {
            return;
        }
        self.tags.push(tag);
        for operation in operations {
            self.add_operation(operation);
        }
    }

    /// Adds one operation; a later operation with the same path and verb replaces it.
    pub fn add_operation(&mut self, operation: &ApiOperation) {
        debug!("Adding operation: {} {}", operation.verb, operation.path);
        self.paths
            .entry(Self::convert_path_format(&operation.path))
            .or_default()
            .insert(operation.verb.doc_key(), Operation::from(operation));
    }

    /// Convert path format from :param to Swagger {param} format
    fn convert_path_format(path: &str) -> String {
        path.split('/')
            .map(|part| match part.strip_prefix(':') {
                Some(name) => format!("{{{}}}", name),
                None => part.to_string(),
            })
            .collect::<Vec<_>>()
            .join("/")
    }

    pub fn build(self) -> ApiDocument {
        ApiDocument {
            swagger: "2.0".to_string(),
            info: self.info,
            tags: self.tags,
            paths: self.paths,
        }
    }
}

impl Default for OpenApiBuilder {
    fn default() -> Self {
        Self::new()
    }
}
