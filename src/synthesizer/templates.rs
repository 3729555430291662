//! Versioned template sets.
//!
//! Earlier revisions of the route templates differed in middleware call syntax and in how
//! validation errors were reported. Version 4 is the only set shipped; a project can replace
//! individual templates through a YAML override file.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Registration of a handler taking the context and its path parameters.
pub const SIMPLE: &str = r#"
r.handle({{ method }}, {{ path }}, |ctx: &mut Context| {
    {% include "path_args" %}
    let reply = {{ call }}(ctx{% for arg in path_args %}, {{ arg.binding }}{% endfor %});
    respond(ctx, reply);
}{% for m in middleware %}, {{ m }}{% endfor %});
"#;

/// Registration that binds and validates a request struct before calling the handler.
pub const BOUND_STRUCT: &str = r#"
r.handle({{ method }}, {{ path }}, |ctx: &mut Context| {
    {% include "path_args" %}
    let params: {{ params_struct }} = match ctx.bind() {
        Ok(params) => params,
        Err(err) => {
            let errs = validate::translate(&err);
            ctx.json(200, json!({ "code": codes::ERROR_PARAM, "message": errs }));
            ctx.abort();
            return;
        }
    };
    let reply = {{ call }}(ctx{% for arg in path_args %}, {{ arg.binding }}{% endfor %}, {% if params_by_ref %}&{% endif %}params);
    respond(ctx, reply);
}{% for m in middleware %}, {{ m }}{% endfor %});
"#;

/// Registration of a handler that returns nothing.
pub const VOID: &str = r#"
r.handle({{ method }}, {{ path }}, |ctx: &mut Context| {
    {{ call }}(ctx);
}{% for m in middleware %}, {{ m }}{% endfor %});
"#;

/// Path parameter bindings shared by the handler templates.
pub const PATH_ARGS: &str = r#"
{%- for arg in path_args %}
{%- if arg.coercion == "integer" %}
    let {{ arg.binding }} = {{ int_type }}::from_str(ctx.param("{{ arg.name }}")).unwrap_or(0);
{%- else %}
    let {{ arg.binding }} = ctx.param("{{ arg.name }}").to_string();
{%- endif %}
{%- endfor %}
"#;

/// One route module per controller declaration.
pub const ROUTE_UNIT: &str = r#"
//! Routes of `{{ entity }}`, generated from its directives. Do not edit.
#![allow(unused_imports)]
{% if uses_integer %}
use std::str::FromStr;
{% endif %}
use serde_json::json;
use {{ runtime }}::{codes, respond, validate, Context, Router};
use {{ controller_module }} as controller;
use {{ middleware_module }} as {{ middleware_namespace }};

pub fn reg_{{ module }}_router(r: &mut Router) {
{% for handle in handles %}
{{ handle }}
{% endfor %}
}
{% if validators %}
pub fn reg_{{ module }}_custom_validate_funcs() {
    validate::register_custom_funcs(&[{% for v in validators %}controller::{{ v }}, {% endfor %}]);
}
{% endif %}
"#;

/// Registry calling every entry point of every route module.
pub const ROUTE_EXPORT: &str = r#"
//! Route registry, generated. Do not edit.
{% for m in modules %}
pub mod {{ m }};
{% endfor %}
use {{ runtime }}::Router;

#[allow(unused_variables)]
pub fn register(r: &mut Router) {
{% for e in entries %}
    {{ e.module }}::{{ e.name }}({% if e.takes_router %}r{% endif %});
{% endfor %}
}
"#;

/// Data model of one table.
pub const MODEL: &str = r#"
//! Model of table `{{ table }}`{% if table_comment %}: {{ table_comment }}{% endif %}. Generated, do not edit.
use serde::{Deserialize, Serialize};
use {{ runtime }}::db::Model;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct {{ entity }} {
{% for f in fields %}
{% if f.comment %}
    /// {{ f.comment }}
{% endif %}
    pub {{ f.ident }}: {{ f.rust_type }},
{% endfor %}
}

impl Model for {{ entity }} {
    const CONNECTION: &'static str = {{ connection }};
    const TABLE: &'static str = {{ table_literal }};
    const SOFT_DELETE: bool = {{ soft_delete }};
}
"#;

/// Directive-annotated CRUD controller scaffold for one table.
pub const CONTROLLER: &str = r#"
//! Controller of table `{{ table }}`. Generated scaffold, edit freely.
use serde::Deserialize;
use {{ runtime }}::{Context, Reply};

/// @Controller {{ tag }} {{ description }}
#[derive(Debug, Default)]
pub struct {{ entity }};

#[derive(Debug, Default, Deserialize)]
pub struct {{ entity }}ListParams {
    #[tag(json = "page", in = "query", label = "Page number", binding = "required")]
    pub page: {{ int_type }},
    #[tag(json = "page_size", in = "query", label = "Page size")]
    pub page_size: {{ int_type }},
}

#[derive(Debug, Default, Deserialize)]
pub struct {{ entity }}Form {
{% for f in fields %}
    #[tag(json = {{ f.json }}, in = "body", label = {{ f.label }})]
    pub {{ f.ident }}: {{ f.rust_type }},
{% endfor %}
}

impl {{ entity }} {
    /// @GetApi /{{ route }}
    /// @Summary List {{ table }}
    /// @Params {{ entity }}ListParams
    pub fn list(&self, _ctx: &mut Context, _params: {{ entity }}ListParams) -> Reply {
        Reply::not_implemented()
    }

    /// @GetApi /{{ route }}/:id
    /// @Summary Get one {{ table }} record
    pub fn get(&self, _ctx: &mut Context, _id: {{ int_type }}) -> Reply {
        Reply::not_implemented()
    }

    /// @PostApi /{{ route }}
    /// @Summary Create a {{ table }} record
    /// @Params {{ entity }}Form
    pub fn create(&self, _ctx: &mut Context, _form: {{ entity }}Form) -> Reply {
        Reply::not_implemented()
    }

    /// @PutApi /{{ route }}/:id
    /// @Summary Update a {{ table }} record
    /// @Params {{ entity }}Form
    pub fn update(&self, _ctx: &mut Context, _id: {{ int_type }}, _form: {{ entity }}Form) -> Reply {
        Reply::not_implemented()
    }

    /// @DeleteApi /{{ route }}/:id
    /// @Summary Delete a {{ table }} record
    pub fn delete(&self, _ctx: &mut Context, _id: {{ int_type }}) -> Reply {
        Reply::not_implemented()
    }
}
"#;

/// Template bodies keyed by id, tagged with the revision they belong to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateSet {
    pub version: u32,
    pub templates: BTreeMap<String, String>,
}

impl TemplateSet {
    pub const CANONICAL_VERSION: u32 = 4;

    /// The built-in version 4 set.
    pub fn canonical() -> Self {
        let templates = [
            ("simple", SIMPLE),
            ("bound_struct", BOUND_STRUCT),
            ("void", VOID),
            ("path_args", PATH_ARGS),
            ("route_unit", ROUTE_UNIT),
            ("route_export", ROUTE_EXPORT),
            ("model", MODEL),
            ("controller", CONTROLLER),
        ]
        .into_iter()
        .map(|(id, body)| (id.to_string(), body.to_string()))
        .collect();

        Self {
            version: Self::CANONICAL_VERSION,
            templates,
        }
    }

    /// Loads a YAML override file and merges it over the canonical set.
    ///
    /// The file has the same shape as the set itself; its `version` replaces the canonical
    /// one and each listed template replaces the built-in body with the same id.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let overrides: TemplateSet = serde_yaml::from_str(&content).map_err(|e| {
            Error::Config(format!("invalid template set {}: {}", path.display(), e))
        })?;

        let mut set = Self::canonical();
        set.version = overrides.version;
        set.templates.extend(overrides.templates);
        Ok(set)
    }

    pub fn get(&self, id: &str) -> Option<&str> {
        self.templates.get(id).map(String::as_str)
    }

    pub fn with_template(mut self, id: &str, body: &str) -> Self {
        self.templates.insert(id.to_string(), body.to_string());
        self
    }
}

impl Default for TemplateSet {
    fn default() -> Self {
        Self::canonical()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_canonical_set_has_every_variant() {
        let set = TemplateSet::canonical();
        assert_eq!(set.version, 4);
        for id in ["simple", "bound_struct", "void", "path_args", "route_unit", "route_export", "model", "controller"] {
            assert!(set.get(id).is_some(), "missing template {}", id);
        }
    }

    #[test]
    fn test_load_merges_overrides() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("templates.yaml");
        fs::write(
            &path,
            "version: 5\ntemplates:\n  void: \"r.handle({{ method }}, {{ path }}, |ctx: &mut Context| {});\"\n",
        )
        .unwrap();

        let set = TemplateSet::load(&path).unwrap();
        assert_eq!(set.version, 5);
        assert!(set.get("void").unwrap().starts_with("r.handle("));
        assert_eq!(set.get("simple"), Some(SIMPLE));
    }

    #[test]
    fn test_load_rejects_malformed_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("templates.yaml");
        fs::write(&path, "version: [not a number").unwrap();
        assert!(matches!(TemplateSet::load(&path), Err(Error::Config(_))));
    }
}
