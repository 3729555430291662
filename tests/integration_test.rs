use pretty_assertions::assert_eq;
use routes_from_source::{
    config::GeneratorConfig,
    directive::HttpVerb,
    generator::Generator,
    introspector::SourceIntrospector,
    output::{FsSink, MemorySink},
    parser::AstParser,
    route_model::{RouteModelBuilder, RouteOptions, TemplateVariant},
    serializer::{serialize_json, serialize_yaml},
};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// Helper function to create a temporary project with controller sources
fn create_test_project(files: Vec<(&str, &str)>) -> TempDir {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");

    for (path, content) in files {
        let file_path = temp_dir.path().join("src/controller").join(path);
        if let Some(parent) = file_path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent directories");
        }
        fs::write(&file_path, content).expect("Failed to write test file");
    }

    temp_dir
}

fn generator(project: &Path) -> Generator {
    Generator::new(project.to_path_buf(), GeneratorConfig::default())
        .expect("Failed to create generator")
}

#[test]
fn test_order_routes_end_to_end() {
    let temp_dir = create_test_project(vec![(
        "order.rs",
        include_str!("fixtures/order_controller.rs"),
    )]);
    let generator = generator(temp_dir.path());
    let units = generator.load_units().unwrap();

    let mut sink = MemorySink::new();
    let routes = generator.generate_routes(&units, &mut sink).unwrap();

    // OrderCache has no APIs and produces nothing
    assert_eq!(routes.len(), 1);
    let keys: Vec<_> = sink.units.keys().map(|k| k.display().to_string()).collect();
    assert_eq!(keys, vec!["mod.rs", "order.rs"]);

    let order = sink.get("order.rs").unwrap();
    assert!(order.contains("use std::str::FromStr;"));
    assert!(order.contains("pub fn reg_order_router(r: &mut Router)"));

    // GET /order/:id binds OrderFilter and passes the coerced id
    assert!(order.contains("\"/order/:id\""));
    assert!(order.contains("let path_id = i64::from_str(ctx.param(\"id\")).unwrap_or(0);"));
    assert!(order.contains("let params: controller::OrderFilter = match ctx.bind()"));
    assert!(order.contains("controller::Order::default().get(ctx, path_id, params)"));
    assert!(order.contains("middleware::Auth()"));

    // DELETE keeps both middleware calls in order
    assert!(order.contains("controller::Order::default().delete(ctx, path_id)"));
    let auth = order.rfind("middleware::Auth()").unwrap();
    let limit = order.find("middleware::RateLimit(10)").unwrap();
    assert!(auth < limit);

    // Void handler only receives the context
    assert!(order.contains("controller::Order::default().ping(ctx);"));

    // Associated function without receiver
    assert!(order.contains("\"ANY\""));
    assert!(order.contains("controller::Order::lookup(ctx, params)"));

    // Not an API: first doc line is prose
    assert!(!order.contains("recalculate"));

    assert!(order.contains("pub fn reg_order_custom_validate_funcs()"));
    assert!(order.contains("controller::PHONE_RULE"));

    let export = sink.get("mod.rs").unwrap();
    assert!(export.contains("pub mod order;"));
    let validators = export.find("order::reg_order_custom_validate_funcs();").unwrap();
    let router = export.find("order::reg_order_router(r);").unwrap();
    assert!(validators < router, "entry points are sorted by name");
}

#[test]
fn test_route_specs_from_fixture() {
    let parsed = AstParser::parse_source(
        Path::new("order.rs"),
        include_str!("fixtures/order_controller.rs"),
    )
    .unwrap();
    let unit = SourceIntrospector::introspect(&parsed).unwrap();
    let order = unit.declarations().find(|d| d.name == "Order").unwrap();

    let routes = RouteModelBuilder::new(RouteOptions::default()).build_all(order);
    let summary: Vec<_> = routes
        .iter()
        .map(|r| (r.verb, r.path.as_str(), r.variant, r.bound_type_name()))
        .collect();
    assert_eq!(
        summary,
        vec![
            (HttpVerb::Get, "/order/:id", TemplateVariant::BoundStruct, Some("OrderFilter".to_string())),
            (HttpVerb::Delete, "/order/:id", TemplateVariant::Simple, None),
            (HttpVerb::Post, "/order/:id/ping", TemplateVariant::Void, None),
            (HttpVerb::Any, "/order/lookup", TemplateVariant::BoundStruct, Some("LookupQuery".to_string())),
        ]
    );
}

#[test]
fn test_api_document_end_to_end() {
    let temp_dir = create_test_project(vec![(
        "order.rs",
        include_str!("fixtures/order_controller.rs"),
    )]);
    let generator = generator(temp_dir.path());
    let units = generator.load_units().unwrap();
    let doc = generator.generate_docs(&units);

    assert_eq!(doc.swagger, "2.0");
    assert_eq!(doc.tags.len(), 1);
    assert_eq!(doc.tags[0].name, "order");
    assert_eq!(doc.tags[0].description, "Order management");

    let item = &doc.paths["/order/{id}"];
    let verbs: Vec<_> = item.keys().cloned().collect();
    assert_eq!(verbs, vec!["delete", "get"]);

    let get = &item["get"];
    assert_eq!(get.summary, "Get one order");
    assert_eq!(get.operation_id, "Order.get");
    assert_eq!(get.tags, vec!["order"]);
    assert_eq!(get.parameters.len(), 2);
    assert_eq!(get.parameters[0].name, "id");
    assert_eq!(get.parameters[0].location, "path");
    assert_eq!(get.parameters[0].type_name, "integer");
    assert!(get.parameters[0].required);
    assert_eq!(get.parameters[1].name, "status");
    assert!(!get.parameters[1].required);

    assert_eq!(item["delete"].tags, vec!["order", "admin"]);
    assert!(item["delete"].parameters.is_empty());

    let lookup = &doc.paths["/order/lookup"]["any"];
    assert_eq!(lookup.description, "Looks an order up by its public code");

    assert!(!doc.paths.contains_key("/order/recalculate"));
}

#[test]
fn test_yaml_and_json_serialization() {
    let temp_dir = create_test_project(vec![(
        "order.rs",
        include_str!("fixtures/order_controller.rs"),
    )]);
    let generator = generator(temp_dir.path());
    let units = generator.load_units().unwrap();
    let doc = generator.generate_docs(&units);

    let yaml = serialize_yaml(&doc).unwrap();
    assert!(yaml.contains("swagger:"));
    assert!(yaml.contains("operationId: Order.get"));

    let json = serialize_json(&doc).unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed["paths"]["/order/{id}"]["get"]["parameters"][0]["in"], "path");
}

#[test]
fn test_generation_is_idempotent() {
    let temp_dir = create_test_project(vec![
        ("order.rs", include_str!("fixtures/order_controller.rs")),
        ("user.rs", include_str!("fixtures/user_controller.rs")),
    ]);
    let generator = generator(temp_dir.path());
    let routes_dir = temp_dir.path().join("src/routes");

    let run = || {
        let units = generator.load_units().unwrap();
        let mut sink = FsSink::new(routes_dir.clone());
        generator.generate_routes(&units, &mut sink).unwrap();
        let docs = serialize_yaml(&generator.generate_docs(&units)).unwrap();
        let mut files: Vec<(String, String)> = fs::read_dir(&routes_dir)
            .unwrap()
            .map(|entry| {
                let path = entry.unwrap().path();
                (
                    path.file_name().unwrap().to_string_lossy().to_string(),
                    fs::read_to_string(&path).unwrap(),
                )
            })
            .collect();
        files.sort();
        (files, docs)
    };

    let first = run();
    let second = run();
    assert_eq!(first, second);
    let names: Vec<_> = first.0.iter().map(|(name, _)| name.as_str()).collect();
    assert_eq!(names, vec!["mod.rs", "order.rs", "user.rs"]);
}

#[test]
fn test_generated_code_is_formatted() {
    let temp_dir = create_test_project(vec![(
        "order.rs",
        include_str!("fixtures/order_controller.rs"),
    )]);
    let generator = generator(temp_dir.path());
    let units = generator.load_units().unwrap();
    let mut sink = MemorySink::new();
    generator.generate_routes(&units, &mut sink).unwrap();

    for text in sink.units.values() {
        let reparsed = syn::parse_file(text).expect("generated code parses");
        assert_eq!(&prettyplease::unparse(&reparsed), text);
    }
}

#[test]
fn test_empty_project_handling() {
    let temp_dir = create_test_project(vec![]);
    fs::create_dir_all(temp_dir.path().join("src/controller")).unwrap();
    let generator = generator(temp_dir.path());
    let units = generator.load_units().unwrap();
    assert!(units.is_empty());

    let mut sink = MemorySink::new();
    let routes = generator.generate_routes(&units, &mut sink).unwrap();
    assert!(routes.is_empty());
    let export = sink.get("mod.rs").unwrap();
    assert!(export.contains("pub fn register(r: &mut Router)"));
    assert!(!export.contains("pub mod"));

    assert!(generator.generate_docs(&units).paths.is_empty());
}

#[test]
fn test_controller_scaffold_feeds_route_generation() {
    let temp_dir = create_test_project(vec![]);
    let controller_dir = temp_dir.path().join("src/controller");
    fs::create_dir_all(&controller_dir).unwrap();
    let generator = generator(temp_dir.path());

    let mut sink = FsSink::new(controller_dir);
    generator.generate_controller("invoice", None, &mut sink).unwrap();

    let units = generator.load_units().unwrap();
    let mut routes = MemorySink::new();
    generator.generate_routes(&units, &mut routes).unwrap();

    let invoice = routes.get("invoice.rs").unwrap();
    assert!(invoice.contains("pub fn reg_invoice_router(r: &mut Router)"));
    assert!(invoice.contains("controller::Invoice::default().list(ctx, params)"));
    assert!(invoice.contains("controller::Invoice::default().update(ctx, path_id, params)"));

    let doc = generator.generate_docs(&units);
    assert_eq!(doc.tags[0].name, "Invoice");
    let list = &doc.paths["/invoice"]["get"];
    assert_eq!(list.parameters.len(), 2);
    assert!(list.parameters[0].required);
}

#[test]
fn test_keyword_names_and_qualified_forms_generate_valid_code() {
    let temp_dir = create_test_project(vec![(
        "loop.rs",
        r#"
/// @Controller loop Retry loops
pub struct Loop;

impl Loop {
    /// @GetApi /loop/:type
    pub fn kind(&self, ctx: &mut Context) -> Reply {
        Reply::ok()
    }

    /// @PostApi /loop
    pub fn create(&self, ctx: &mut Context, form: &dto::LoopForm) -> Reply {
        Reply::ok()
    }
}
"#,
    )]);
    let generator = generator(temp_dir.path());
    let units = generator.load_units().unwrap();

    let mut sink = MemorySink::new();
    generator.generate_routes(&units, &mut sink).unwrap();

    let unit = sink.get("loop.rs").unwrap();
    assert!(unit.contains("let path_type = ctx.param(\"type\").to_string();"));
    assert!(unit.contains("controller::Loop::default().kind(ctx, path_type)"));
    assert!(unit.contains("let params: dto::LoopForm = match ctx.bind()"));
    assert!(unit.contains("controller::Loop::default().create(ctx, &params)"));

    let export = sink.get("mod.rs").unwrap();
    assert!(export.contains("pub mod r#loop;"));
    assert!(export.contains("r#loop::reg_loop_router(r);"));
}
