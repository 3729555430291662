//! Code synthesis from route models and table schemas.
//!
//! Every unit is rendered from a [`TemplateSet`] with `minijinja`, then canonicalized:
//! the text is parsed with `syn::parse_file` and printed with `prettyplease`. Text that does
//! not parse is a [`Error::RenderError`] carrying the offending output.
//!
//! # Example
//!
//! ```no_run
//! use routes_from_source::introspector::Declaration;
//! use routes_from_source::route_model::{RouteModelBuilder, RouteOptions};
//! use routes_from_source::synthesizer::{CodeSynthesizer, SynthOptions, TemplateSet};
//!
//! # fn demo(decl: &Declaration) -> routes_from_source::error::Result<()> {
//! let routes = RouteModelBuilder::new(RouteOptions::default()).build_all(decl);
//! let synthesizer = CodeSynthesizer::new(&TemplateSet::canonical(), SynthOptions::default())?;
//! if let Some(unit) = synthesizer.render_route_unit(&decl.name, &routes, &[])? {
//!     println!("{}", unit.unit.text);
//! }
//! # Ok(())
//! # }
//! ```

pub mod templates;

pub use templates::TemplateSet;

use crate::error::{Error, Result};
use crate::introspector::SourceIntrospector;
use crate::naming::{rust_ident, single_line, to_camel_case, to_snake_case};
use crate::parser::AstParser;
use crate::introspector::TypeRef;
use crate::route_model::{PathParam, RouteSpec};
use crate::schema_source::{ColumnInfo, ColumnType, TableInfo};
use log::debug;
use minijinja::{AutoEscape, Environment, UndefinedBehavior};
use serde::Serialize;
use std::path::PathBuf;

/// Names and paths the generated code refers to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SynthOptions {
    /// Crate providing `Router`, `Context`, `respond`, `validate` and `codes`
    pub runtime_crate: String,
    pub controller_module: String,
    pub middleware_module: String,
    pub middleware_namespace: String,
    /// Integer type used for `id` path parameters
    pub numeric_sentinel: String,
}

impl Default for SynthOptions {
    fn default() -> Self {
        Self {
            runtime_crate: "egin".to_string(),
            controller_module: "crate::controller".to_string(),
            middleware_module: "crate::middleware".to_string(),
            middleware_namespace: "middleware".to_string(),
            numeric_sentinel: "i64".to_string(),
        }
    }
}

/// One canonicalized output file, `path` relative to its output directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedUnit {
    pub path: PathBuf,
    pub text: String,
}

/// The route module of one declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteUnit {
    pub declaration: String,
    pub module: String,
    pub unit: RenderedUnit,
    pub entry_points: Vec<EntryPoint>,
}

/// A registration function of a route module.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct EntryPoint {
    pub name: String,
    pub module: String,
    /// Router entry points take `r`; validator registration takes nothing
    pub takes_router: bool,
}

#[derive(Serialize)]
struct HandleContext<'a> {
    method: String,
    path: String,
    call: String,
    path_args: &'a [PathParam],
    params_struct: String,
    params_by_ref: bool,
    middleware: &'a [String],
    int_type: &'a str,
}

#[derive(Serialize)]
struct UnitContext<'a> {
    entity: &'a str,
    module: &'a str,
    uses_integer: bool,
    handles: Vec<String>,
    validators: &'a [String],
    runtime: &'a str,
    controller_module: &'a str,
    middleware_module: &'a str,
    middleware_namespace: &'a str,
}

#[derive(Serialize)]
struct ExportContext<'a> {
    modules: Vec<String>,
    entries: Vec<EntryContext<'a>>,
    runtime: &'a str,
}

#[derive(Serialize)]
struct EntryContext<'a> {
    module: String,
    name: &'a str,
    takes_router: bool,
}

#[derive(Serialize)]
struct FieldContext {
    ident: String,
    rust_type: String,
    comment: String,
    json: String,
    label: String,
}

#[derive(Serialize)]
struct TableContext<'a> {
    table: &'a str,
    table_literal: String,
    table_comment: String,
    entity: String,
    route: String,
    tag: String,
    description: String,
    connection: String,
    fields: Vec<FieldContext>,
    soft_delete: bool,
    runtime: &'a str,
    int_type: &'a str,
}

/// Column that marks rows as deleted instead of removing them.
pub const SOFT_DELETE_COLUMN: &str = "is_deleted";

pub struct CodeSynthesizer {
    env: Environment<'static>,
    options: SynthOptions,
}

impl CodeSynthesizer {
    /// Compiles every template of `templates`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::RenderError`] when a template body has invalid syntax.
    pub fn new(templates: &TemplateSet, options: SynthOptions) -> Result<Self> {
        let mut env = Environment::new();
        env.set_undefined_behavior(UndefinedBehavior::Strict);
        env.set_auto_escape_callback(|_| AutoEscape::None);
        for (id, body) in &templates.templates {
            env.add_template_owned(id.clone(), body.clone())
                .map_err(|e| Error::RenderError {
                    message: format!("template {} (v{}): {}", id, templates.version, e),
                    text: body.clone(),
                })?;
        }
        debug!(
            "Loaded {} templates (v{})",
            templates.templates.len(),
            templates.version
        );
        Ok(Self { env, options })
    }

    /// Renders the registration statement of one route, not yet canonicalized.
    pub fn render_route(&self, route: &RouteSpec) -> Result<String> {
        let call = if route.has_receiver {
            format!("controller::{}::default().{}", route.owner, route.handler)
        } else {
            format!("controller::{}::{}", route.owner, route.handler)
        };
        let context = HandleContext {
            method: format!("{:?}", route.verb.as_str()),
            path: format!("{:?}", route.path),
            call,
            path_args: &route.path_params,
            params_struct: route
                .bound_type
                .as_ref()
                .map(|bound| match &bound.ty {
                    TypeRef::Qualified { .. } => bound.ty.to_string(),
                    ty => format!("controller::{}", ty),
                })
                .unwrap_or_default(),
            params_by_ref: route.bound_type.as_ref().is_some_and(|bound| bound.by_reference),
            middleware: &route.middleware,
            int_type: &self.options.numeric_sentinel,
        };
        self.render(route.variant.template_id(), &context)
    }

    /// Renders the route module of a declaration.
    ///
    /// Returns `None` when `routes` is empty: a declaration without APIs produces no file.
    pub fn render_route_unit(
        &self,
        declaration: &str,
        routes: &[RouteSpec],
        validators: &[String],
    ) -> Result<Option<RouteUnit>> {
        if routes.is_empty() {
            debug!("No routes for {}, skipping", declaration);
            return Ok(None);
        }

        let module = module_name(declaration);
        let handles = routes
            .iter()
            .map(|route| self.render_route(route))
            .collect::<Result<Vec<_>>>()?;

        let context = UnitContext {
            entity: declaration,
            module: &module,
            uses_integer: routes.iter().any(RouteSpec::uses_integer_coercion),
            handles,
            validators,
            runtime: &self.options.runtime_crate,
            controller_module: &self.options.controller_module,
            middleware_module: &self.options.middleware_module,
            middleware_namespace: &self.options.middleware_namespace,
        };
        let path = PathBuf::from(format!("{}.rs", module));
        let text = self.render_canonical("route_unit", &context)?;
        let entry_points = entry_points(&module, &path, &text)?;

        Ok(Some(RouteUnit {
            declaration: declaration.to_string(),
            module,
            unit: RenderedUnit { path, text },
            entry_points,
        }))
    }

    /// Renders the registry over all route modules.
    ///
    /// Entry points are sorted by name so the output does not depend on the order in which
    /// units were produced.
    pub fn render_export(&self, units: &[RouteUnit]) -> Result<RenderedUnit> {
        let mut modules: Vec<&str> = units.iter().map(|u| u.module.as_str()).collect();
        modules.sort_unstable();
        modules.dedup();

        let mut entries: Vec<&EntryPoint> = units.iter().flat_map(|u| &u.entry_points).collect();
        entries.sort();

        let context = ExportContext {
            modules: modules.into_iter().map(rust_ident).collect(),
            entries: entries
                .into_iter()
                .map(|entry| EntryContext {
                    module: rust_ident(&entry.module),
                    name: &entry.name,
                    takes_router: entry.takes_router,
                })
                .collect(),
            runtime: &self.options.runtime_crate,
        };
        Ok(RenderedUnit {
            path: PathBuf::from("mod.rs"),
            text: self.render_canonical("route_export", &context)?,
        })
    }

    /// Renders the data model of one table.
    pub fn render_model(
        &self,
        connection: &str,
        table: &TableInfo,
        columns: &[ColumnInfo],
    ) -> Result<RenderedUnit> {
        let context = self.table_context(connection, table, columns);
        Ok(RenderedUnit {
            path: PathBuf::from(format!("{}.rs", to_snake_case(&table.name))),
            text: self.render_canonical("model", &context)?,
        })
    }

    /// Renders a directive-annotated controller scaffold for one table.
    pub fn render_controller(
        &self,
        table: &TableInfo,
        columns: &[ColumnInfo],
    ) -> Result<RenderedUnit> {
        let context = self.table_context("", table, columns);
        Ok(RenderedUnit {
            path: PathBuf::from(format!("{}.rs", to_snake_case(&table.name))),
            text: self.render_canonical("controller", &context)?,
        })
    }

    fn table_context<'a>(
        &'a self,
        connection: &str,
        table: &'a TableInfo,
        columns: &[ColumnInfo],
    ) -> TableContext<'a> {
        let fields = columns
            .iter()
            .map(|column| FieldContext {
                ident: rust_ident(&column.name),
                rust_type: self.rust_type(&column.data_type),
                comment: single_line(&column.comment),
                json: format!("{:?}", column.name),
                label: format!("{:?}", single_line(&column.comment)),
            })
            .collect();
        let entity = to_camel_case(&table.name);

        TableContext {
            table: &table.name,
            table_literal: format!("{:?}", table.name),
            table_comment: single_line(&table.comment),
            tag: entity.clone(),
            entity,
            route: table.name.clone(),
            description: single_line(&table.comment),
            connection: format!("{:?}", connection),
            fields,
            soft_delete: columns.iter().any(|c| c.name == SOFT_DELETE_COLUMN),
            runtime: &self.options.runtime_crate,
            int_type: &self.options.numeric_sentinel,
        }
    }

    fn rust_type(&self, data_type: &ColumnType) -> String {
        match data_type {
            ColumnType::Text => "String".to_string(),
            ColumnType::Integer => "i32".to_string(),
            ColumnType::Other(raw) => match raw.as_str() {
                "int" | "integer" | "mediumint" => "i32".to_string(),
                "smallint" => "i16".to_string(),
                "bigint" => self.options.numeric_sentinel.clone(),
                "float" => "f32".to_string(),
                "double" | "decimal" => "f64".to_string(),
                "bool" | "boolean" | "bit" => "bool".to_string(),
                other => rust_ident(other),
            },
        }
    }

    fn render<S: Serialize>(&self, id: &str, context: &S) -> Result<String> {
        let template = self.env.get_template(id).map_err(|e| Error::RenderError {
            message: format!("unknown template {}: {}", id, e),
            text: String::new(),
        })?;
        template.render(context).map_err(|e| Error::RenderError {
            message: format!("template {}: {}", id, e),
            text: String::new(),
        })
    }

    fn render_canonical<S: Serialize>(&self, id: &str, context: &S) -> Result<String> {
        let raw = self.render(id, context)?;
        canonicalize(&raw)
    }
}

/// File stem of the route module of a declaration.
///
/// Keywords that cannot be raw identifiers get a trailing `_`; other keywords keep their
/// name and are escaped where the module is referenced.
fn module_name(declaration: &str) -> String {
    let module = to_snake_case(declaration);
    match module.as_str() {
        "crate" | "self" | "super" => format!("{}_", module),
        _ => module,
    }
}

/// Parses generated text and prints it back in canonical formatting.
pub fn canonicalize(text: &str) -> Result<String> {
    let file = syn::parse_file(text).map_err(|e| Error::RenderError {
        message: format!("generated code does not parse: {}", e),
        text: text.to_string(),
    })?;
    Ok(prettyplease::unparse(&file))
}

/// Registration functions of a rendered route module, found by introspecting its text.
fn entry_points(module: &str, path: &std::path::Path, text: &str) -> Result<Vec<EntryPoint>> {
    let parsed = AstParser::parse_source(path, text)?;
    let unit = SourceIntrospector::introspect(&parsed)?;
    Ok(unit
        .functions()
        .filter(|f| f.name.starts_with("reg_"))
        .map(|f| EntryPoint {
            name: f.name.clone(),
            module: module.to_string(),
            takes_router: f.name.ends_with("_router"),
        })
        .collect())
}
