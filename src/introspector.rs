//! Structural facts about one parsed source unit.
//!
//! The introspector knows nothing about directives. It reduces a `syn::File` to the items the
//! generators care about: struct declarations with their tagged fields and inherent methods,
//! free functions, and top-level `static`/`const` variables.

use crate::error::{Error, Result};
use crate::parser::ParsedFile;
use log::debug;
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use syn::{FnArg, ImplItem, Item, Pat, ReturnType, Type};

/// Field attribute carrying binding tags, e.g. `#[tag(json = "id", binding = "required")]`.
pub const TAG_ATTRIBUTE: &str = "tag";

/// All items extracted from one source file, in source order.
#[derive(Debug, Clone)]
pub struct SourceUnit {
    pub path: PathBuf,
    pub items: Vec<SourceItem>,
}

/// A top-level item kind the generators distinguish.
#[derive(Debug, Clone)]
pub enum SourceItem {
    Struct(Declaration),
    Function(FunctionInfo),
    Variable(VarDescriptor),
}

/// A struct declaration together with the methods of its inherent impls.
#[derive(Debug, Clone, Default)]
pub struct Declaration {
    pub name: String,
    pub fields: Vec<FieldDescriptor>,
    pub methods: Vec<MethodDescriptor>,
    pub doc: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldDescriptor {
    pub name: String,
    pub tags: BTreeMap<String, String>,
    /// Best-effort type name, empty when the type is not a simple path
    pub type_name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MethodDescriptor {
    pub name: String,
    pub doc: Vec<String>,
    /// Typed parameters without the `self` receiver. Index 0 is the request context.
    pub params: Vec<ParamDescriptor>,
    pub result_count: usize,
    pub has_receiver: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamDescriptor {
    pub name: String,
    pub ty: TypeRef,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionInfo {
    pub name: String,
    pub doc: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VarDescriptor {
    pub name: String,
    pub ty: TypeRef,
}

/// The type shapes the generators can reason about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeRef {
    /// A bare identifier such as `i64` or `OrderFilter`
    Named(String),
    /// A two-segment path such as `gin::Context`
    Qualified { module: String, name: String },
    Unknown,
}

impl TypeRef {
    /// Resolves a parameter type: a bare identifier, or a reference/pointer to a two-segment
    /// path. Every other shape is `Unknown`.
    pub fn of_parameter(ty: &Type) -> Self {
        match ty {
            Type::Path(_) => match plain_segments(ty).as_deref() {
                Some([name]) => TypeRef::Named(name.clone()),
                _ => TypeRef::Unknown,
            },
            Type::Reference(reference) => Self::qualified(&reference.elem),
            Type::Ptr(pointer) => Self::qualified(&pointer.elem),
            _ => TypeRef::Unknown,
        }
    }

    /// Resolves the declared type of a variable: a bare identifier or a two-segment path.
    pub fn of_value(ty: &Type) -> Self {
        match plain_segments(ty).as_deref() {
            Some([name]) => TypeRef::Named(name.clone()),
            Some([module, name]) => TypeRef::Qualified {
                module: module.clone(),
                name: name.clone(),
            },
            _ => TypeRef::Unknown,
        }
    }

    fn qualified(ty: &Type) -> Self {
        match plain_segments(ty).as_deref() {
            Some([module, name]) => TypeRef::Qualified {
                module: module.clone(),
                name: name.clone(),
            },
            _ => TypeRef::Unknown,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, TypeRef::Unknown)
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeRef::Named(name) => write!(f, "{}", name),
            TypeRef::Qualified { module, name } => write!(f, "{}::{}", module, name),
            TypeRef::Unknown => Ok(()),
        }
    }
}

/// Path segments of a type written as a plain path without generics, `qself` or leading `::`.
fn plain_segments(ty: &Type) -> Option<Vec<String>> {
    let Type::Path(type_path) = ty else {
        return None;
    };
    if type_path.qself.is_some() || type_path.path.leading_colon.is_some() {
        return None;
    }
    type_path
        .path
        .segments
        .iter()
        .map(|segment| segment.arguments.is_none().then(|| segment.ident.to_string()))
        .collect()
}

impl SourceUnit {
    pub fn declarations(&self) -> impl Iterator<Item = &Declaration> {
        self.items.iter().filter_map(|item| match item {
            SourceItem::Struct(decl) => Some(decl),
            _ => None,
        })
    }

    pub fn functions(&self) -> impl Iterator<Item = &FunctionInfo> {
        self.items.iter().filter_map(|item| match item {
            SourceItem::Function(func) => Some(func),
            _ => None,
        })
    }

    pub fn variables(&self) -> impl Iterator<Item = &VarDescriptor> {
        self.items.iter().filter_map(|item| match item {
            SourceItem::Variable(var) => Some(var),
            _ => None,
        })
    }
}

/// Extracts declarations, functions and variables from parsed files.
pub struct SourceIntrospector;

impl SourceIntrospector {
    /// Introspects one parsed file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ParseError`] when a `#[tag(...)]` attribute is malformed.
    pub fn introspect(parsed: &ParsedFile) -> Result<SourceUnit> {
        let file = &parsed.syntax_tree;
        let mut methods: BTreeMap<String, Vec<MethodDescriptor>> = BTreeMap::new();

        for item in &file.items {
            if let Item::Impl(item_impl) = item {
                if item_impl.trait_.is_some() {
                    continue;
                }
                let Some(owner) = impl_owner(&item_impl.self_ty) else {
                    continue;
                };
                let entry = methods.entry(owner).or_default();
                for impl_item in &item_impl.items {
                    if let ImplItem::Fn(method) = impl_item {
                        entry.push(method_descriptor(&method.attrs, &method.sig));
                    }
                }
            }
        }

        let mut items = Vec::new();
        for item in &file.items {
            match item {
                Item::Struct(item_struct) => {
                    let name = item_struct.ident.to_string();
                    let fields = struct_fields(&item_struct.fields, &parsed.path)?;
                    items.push(SourceItem::Struct(Declaration {
                        methods: methods.remove(&name).unwrap_or_default(),
                        doc: doc_lines(&item_struct.attrs),
                        name,
                        fields,
                    }));
                }
                Item::Fn(item_fn) => items.push(SourceItem::Function(FunctionInfo {
                    name: item_fn.sig.ident.to_string(),
                    doc: doc_lines(&item_fn.attrs),
                })),
                Item::Static(item_static) => items.push(SourceItem::Variable(VarDescriptor {
                    name: item_static.ident.to_string(),
                    ty: TypeRef::of_value(&item_static.ty),
                })),
                Item::Const(item_const) => items.push(SourceItem::Variable(VarDescriptor {
                    name: item_const.ident.to_string(),
                    ty: TypeRef::of_value(&item_const.ty),
                })),
                _ => {}
            }
        }

        debug!(
            "Introspected {}: {} items",
            parsed.path.display(),
            items.len()
        );

        Ok(SourceUnit {
            path: parsed.path.clone(),
            items,
        })
    }

    /// Introspects every parsed file, failing on the first malformed one.
    pub fn introspect_all(parsed_files: &[ParsedFile]) -> Result<Vec<SourceUnit>> {
        parsed_files.iter().map(Self::introspect).collect()
    }
}

fn impl_owner(self_ty: &Type) -> Option<String> {
    match self_ty {
        Type::Path(type_path) if type_path.qself.is_none() => type_path
            .path
            .segments
            .last()
            .map(|segment| segment.ident.to_string()),
        _ => None,
    }
}

fn method_descriptor(attrs: &[syn::Attribute], sig: &syn::Signature) -> MethodDescriptor {
    let mut has_receiver = false;
    let mut params = Vec::new();
    for input in &sig.inputs {
        match input {
            FnArg::Receiver(_) => has_receiver = true,
            FnArg::Typed(pat_type) => params.push(ParamDescriptor {
                name: match pat_type.pat.as_ref() {
                    Pat::Ident(pat_ident) => pat_ident.ident.to_string(),
                    _ => "_".to_string(),
                },
                ty: TypeRef::of_parameter(&pat_type.ty),
            }),
        }
    }

    let result_count = match &sig.output {
        ReturnType::Default => 0,
        ReturnType::Type(_, ty) => match ty.as_ref() {
            Type::Tuple(tuple) => tuple.elems.len(),
            _ => 1,
        },
    };

    MethodDescriptor {
        name: sig.ident.to_string(),
        doc: doc_lines(attrs),
        params,
        result_count,
        has_receiver,
    }
}

fn struct_fields(fields: &syn::Fields, path: &Path) -> Result<Vec<FieldDescriptor>> {
    let syn::Fields::Named(named) = fields else {
        return Ok(Vec::new());
    };

    named
        .named
        .iter()
        .filter_map(|field| field.ident.as_ref().map(|ident| (ident, field)))
        .map(|(ident, field)| {
            Ok(FieldDescriptor {
                name: ident.to_string(),
                tags: field_tags(&field.attrs, path)?,
                type_name: TypeRef::of_value(&field.ty).to_string(),
            })
        })
        .collect()
}

fn field_tags(attrs: &[syn::Attribute], path: &Path) -> Result<BTreeMap<String, String>> {
    let mut tags = BTreeMap::new();
    for attr in attrs {
        if !attr.path().is_ident(TAG_ATTRIBUTE) {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            let key = meta
                .path
                .get_ident()
                .map(|ident| ident.to_string())
                .ok_or_else(|| meta.error("expected a tag key"))?;
            let value: syn::LitStr = meta.value()?.parse()?;
            tags.insert(key, value.value());
            Ok(())
        })
        .map_err(|e| Error::ParseError {
            file: path.to_path_buf(),
            message: format!("invalid #[{}] attribute: {}", TAG_ATTRIBUTE, e),
        })?;
    }
    Ok(tags)
}

/// Doc-comment lines with the comment decoration stripped.
///
/// Each `///` line is one entry, empty lines included. Block doc comments contribute their
/// non-blank lines with any leading `*` removed.
pub fn doc_lines(attrs: &[syn::Attribute]) -> Vec<String> {
    let mut lines = Vec::new();
    for attr in attrs {
        if !attr.path().is_ident("doc") {
            continue;
        }
        let syn::Meta::NameValue(name_value) = &attr.meta else {
            continue;
        };
        let syn::Expr::Lit(syn::ExprLit {
            lit: syn::Lit::Str(text),
            ..
        }) = &name_value.value
        else {
            continue;
        };

        let value = text.value();
        if value.contains('\n') {
            lines.extend(
                value
                    .lines()
                    .map(|line| line.trim().trim_start_matches('*').trim().to_string())
                    .filter(|line| !line.is_empty()),
            );
        } else {
            lines.push(value.trim().to_string());
        }
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::AstParser;

    fn unit(code: &str) -> SourceUnit {
        let parsed = AstParser::parse_source(Path::new("test.rs"), code).unwrap();
        SourceIntrospector::introspect(&parsed).unwrap()
    }

    fn param_type(src: &str) -> TypeRef {
        TypeRef::of_parameter(&syn::parse_str::<Type>(src).unwrap())
    }

    #[test]
    fn test_parameter_type_shapes() {
        assert_eq!(param_type("i64"), TypeRef::Named("i64".to_string()));
        assert_eq!(
            param_type("&mut gin::Context"),
            TypeRef::Qualified {
                module: "gin".to_string(),
                name: "Context".to_string()
            }
        );
        assert_eq!(param_type("*const dto::Filter").to_string(), "dto::Filter");
        assert_eq!(param_type("&mut Context"), TypeRef::Unknown);
        assert_eq!(param_type("Vec<i64>"), TypeRef::Unknown);
        assert_eq!(param_type("a::b::C"), TypeRef::Unknown);
        assert_eq!(param_type("(i64, i64)").to_string(), "");
    }

    #[test]
    fn test_value_type_shapes() {
        let ty = syn::parse_str::<Type>("validate::CustomValidateFunc").unwrap();
        assert_eq!(TypeRef::of_value(&ty).to_string(), "validate::CustomValidateFunc");
        let ty = syn::parse_str::<Type>("&str").unwrap();
        assert!(!TypeRef::of_value(&ty).is_known());
    }

    #[test]
    fn test_declaration_with_methods() {
        let unit = unit(
            r#"
            /// @Controller order Order management
            pub struct Order;

            impl Order {
                /// @GetApi /order/:id
                /// @Middleware Auth
                pub fn get(&self, ctx: &mut Context, id: i64, params: OrderFilter) -> Reply {
                    Reply::ok()
                }

                pub fn helper(ctx: &mut Context) {}
            }

            impl Display for Order {
                fn fmt(&self, f: &mut Formatter) -> Result { Ok(()) }
            }
            "#,
        );

        let decls: Vec<_> = unit.declarations().collect();
        assert_eq!(decls.len(), 1);
        let order = decls[0];
        assert_eq!(order.name, "Order");
        assert_eq!(order.doc, vec!["@Controller order Order management"]);
        assert_eq!(order.methods.len(), 2);

        let get = &order.methods[0];
        assert_eq!(get.name, "get");
        assert_eq!(get.doc, vec!["@GetApi /order/:id", "@Middleware Auth"]);
        assert!(get.has_receiver);
        assert_eq!(get.result_count, 1);
        assert_eq!(get.params.len(), 3);
        assert_eq!(get.params[0].ty, TypeRef::Unknown);
        assert_eq!(get.params[1].name, "id");
        assert_eq!(get.params[1].ty, TypeRef::Named("i64".to_string()));
        assert_eq!(get.params[2].ty, TypeRef::Named("OrderFilter".to_string()));

        let helper = &order.methods[1];
        assert!(!helper.has_receiver);
        assert_eq!(helper.result_count, 0);
    }

    #[test]
    fn test_result_count_for_tuples() {
        let unit = unit(
            r#"
            pub struct Stats;
            impl Stats {
                fn none(&self, ctx: &mut Context) -> () {}
                fn pair(&self, ctx: &mut Context) -> (Reply, u16) { todo!() }
            }
            "#,
        );
        let stats = unit.declarations().next().unwrap();
        assert_eq!(stats.methods[0].result_count, 0);
        assert_eq!(stats.methods[1].result_count, 2);
    }

    #[test]
    fn test_field_tags() {
        let unit = unit(
            r#"
            pub struct OrderFilter {
                #[tag(json = "id", label = "Order id", in = "path", binding = "required,min=1")]
                pub id: i64,
                #[tag(json = "status")]
                pub status: Option<String>,
                pub note: String,
            }
            "#,
        );
        let filter = unit.declarations().next().unwrap();
        assert_eq!(filter.fields.len(), 3);

        let id = &filter.fields[0];
        assert_eq!(id.type_name, "i64");
        assert_eq!(id.tags.get("json").unwrap(), "id");
        assert_eq!(id.tags.get("in").unwrap(), "path");
        assert_eq!(id.tags.get("binding").unwrap(), "required,min=1");

        assert_eq!(filter.fields[1].type_name, "");
        assert!(filter.fields[2].tags.is_empty());
    }

    #[test]
    fn test_malformed_tag_is_parse_error() {
        let parsed = AstParser::parse_source(
            Path::new("bad.rs"),
            "pub struct F { #[tag(json)] pub id: i64 }",
        )
        .unwrap();
        assert!(matches!(
            SourceIntrospector::introspect(&parsed),
            Err(Error::ParseError { .. })
        ));
    }

    #[test]
    fn test_functions_and_variables() {
        let unit = unit(
            r#"
            pub static PHONE: validate::CustomValidateFunc = validate::phone;
            const LIMIT: usize = 10;
            pub fn reg_order_router(r: &mut Router) {}
            "#,
        );
        let vars: Vec<_> = unit.variables().collect();
        assert_eq!(vars.len(), 2);
        assert_eq!(vars[0].name, "PHONE");
        assert_eq!(vars[0].ty.to_string(), "validate::CustomValidateFunc");
        assert_eq!(vars[1].ty, TypeRef::Named("usize".to_string()));

        let funcs: Vec<_> = unit.functions().map(|f| f.name.as_str()).collect();
        assert_eq!(funcs, vec!["reg_order_router"]);
    }

    #[test]
    fn test_block_doc_comment() {
        let unit = unit(
            r#"
            pub struct Order;
            impl Order {
                /**
                 * @PostApi /order
                 * @Summary Create an order
                 */
                fn create(&self, ctx: &mut Context) {}
            }
            "#,
        );
        let order = unit.declarations().next().unwrap();
        assert_eq!(
            order.methods[0].doc,
            vec!["@PostApi /order", "@Summary Create an order"]
        );
    }
}
