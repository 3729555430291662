//! Route model: which handler methods become routes, and how they are registered.

use crate::directive::{DirectiveMatcher, HttpVerb};
use crate::error::{Error, Result};
use crate::introspector::{Declaration, MethodDescriptor, TypeRef};
use log::debug;
use regex::Regex;
use serde::Serialize;
use std::sync::LazyLock;

static PATH_PARAM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r":([A-Za-z_][A-Za-z0-9_]*)").expect("valid path parameter regex"));

/// Path parameter name that is coerced to an integer.
pub const INTEGER_PATH_PARAM: &str = "id";

/// Registration shape selected from a handler signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TemplateVariant {
    /// Handler called with the context and the path parameters
    Simple,
    /// A request struct is bound and validated before the handler runs
    BoundStruct,
    /// Handler returns nothing and receives only the context
    Void,
}

impl TemplateVariant {
    /// Template id in a [`TemplateSet`](crate::synthesizer::TemplateSet).
    pub fn template_id(&self) -> &'static str {
        match self {
            TemplateVariant::Simple => "simple",
            TemplateVariant::BoundStruct => "bound_struct",
            TemplateVariant::Void => "void",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Coercion {
    Integer,
    Text,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PathParam {
    /// Token as written in the path, the key of the context lookup
    pub name: String,
    /// Local variable the generated handler binds the value to
    pub binding: String,
    pub coercion: Coercion,
}

impl PathParam {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            binding: format!("path_{}", name),
            coercion: coercion_for(name),
        }
    }
}

/// Request struct a handler takes after its path parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundType {
    pub ty: TypeRef,
    /// Handler takes the struct behind a reference or pointer
    pub by_reference: bool,
}

/// Resolved routing facts for one exposed handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteSpec {
    pub owner: String,
    pub verb: HttpVerb,
    pub path: String,
    pub path_params: Vec<PathParam>,
    /// Request struct implied by the handler's non-context parameters
    pub bound_type: Option<BoundType>,
    /// Normalized middleware call expressions
    pub middleware: Vec<String>,
    pub handler: String,
    pub has_receiver: bool,
    pub variant: TemplateVariant,
}

impl RouteSpec {
    pub fn uses_integer_coercion(&self) -> bool {
        self.path_params
            .iter()
            .any(|param| param.coercion == Coercion::Integer)
    }

    pub fn bound_type_name(&self) -> Option<String> {
        self.bound_type.as_ref().map(|bound| bound.ty.to_string())
    }
}

/// Knobs of the route model that depend on the target runtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteOptions {
    /// Parameter type that marks a numeric path argument rather than a request struct
    pub numeric_sentinel: String,
    /// Module prefix of middleware calls
    pub middleware_namespace: String,
}

impl Default for RouteOptions {
    fn default() -> Self {
        Self {
            numeric_sentinel: "i64".to_string(),
            middleware_namespace: "middleware".to_string(),
        }
    }
}

pub struct RouteModelBuilder {
    options: RouteOptions,
    matcher: DirectiveMatcher,
}

impl RouteModelBuilder {
    pub fn new(options: RouteOptions) -> Self {
        Self {
            options,
            matcher: DirectiveMatcher::default(),
        }
    }

    /// Builds the route of one method.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotApi`] when the method's first doc line is not an Api directive.
    pub fn build(&self, owner: &str, method: &MethodDescriptor) -> Result<RouteSpec> {
        let api = self
            .matcher
            .api_from_first_line(&method.doc)
            .ok_or_else(|| Error::NotApi {
                method: format!("{}.{}", owner, method.name),
            })?;

        let verb = api.verb().unwrap_or(HttpVerb::Any);
        let path = api.path().unwrap_or_default().to_string();
        let path_params = extract_path_params(&path)
            .iter()
            .map(|name| PathParam::new(name))
            .collect();

        let directives = self.matcher.parse(&method.doc);
        let middleware = directives
            .middleware()
            .iter()
            .map(|token| normalize_middleware(&self.options.middleware_namespace, token))
            .collect();

        let bound_type = self.bound_type(method);
        let variant = if method.result_count == 0 {
            TemplateVariant::Void
        } else if bound_type.is_some() {
            TemplateVariant::BoundStruct
        } else {
            TemplateVariant::Simple
        };

        debug!(
            "Route {} {} -> {}.{} ({:?})",
            verb, path, owner, method.name, variant
        );

        Ok(RouteSpec {
            owner: owner.to_string(),
            verb,
            path,
            path_params,
            bound_type,
            middleware,
            handler: method.name.clone(),
            has_receiver: method.has_receiver,
            variant,
        })
    }

    /// Routes of every API method of a declaration, skipping the others.
    pub fn build_all(&self, decl: &Declaration) -> Vec<RouteSpec> {
        decl.methods
            .iter()
            .filter_map(|method| match self.build(&decl.name, method) {
                Ok(route) => Some(route),
                Err(e) => {
                    debug!("Skipping method: {}", e);
                    None
                }
            })
            .collect()
    }

    /// Three parameters bind their last one; two parameters bind the second unless it is the
    /// numeric sentinel. A candidate of unknown type never binds.
    ///
    /// Qualified types only resolve from a reference or pointer parameter, so they are
    /// passed by reference.
    fn bound_type(&self, method: &MethodDescriptor) -> Option<BoundType> {
        let candidate = match method.params.as_slice() {
            [_, _, last] => last,
            [_, second] if second.ty.to_string() != self.options.numeric_sentinel => second,
            _ => return None,
        };
        candidate.ty.is_known().then(|| BoundType {
            ty: candidate.ty.clone(),
            by_reference: matches!(candidate.ty, TypeRef::Qualified { .. }),
        })
    }
}

/// Names of the `:name` segments of a path, in order, duplicates kept.
pub fn extract_path_params(path: &str) -> Vec<String> {
    PATH_PARAM
        .captures_iter(path)
        .map(|caps| caps[1].to_string())
        .collect()
}

fn coercion_for(name: &str) -> Coercion {
    if name == INTEGER_PATH_PARAM {
        Coercion::Integer
    } else {
        Coercion::Text
    }
}

/// `Auth` becomes `middleware::Auth()`; a token already ending in `)` is kept as a call.
pub fn normalize_middleware(namespace: &str, token: &str) -> String {
    if token.ends_with(')') {
        format!("{}::{}", namespace, token)
    } else {
        format!("{}::{}()", namespace, token)
    }
}
