//! routes-from-source - route registration, validation wiring and API docs from controller
//! directives.
//!
//! Controller handlers are annotated with `@Keyword argument...` lines in their doc comments:
//!
//! ```ignore
//! /// @Controller order Order management
//! pub struct Order;
//!
//! impl Order {
//!     /// @GetApi /order/:id
//!     /// @Middleware Auth
//!     /// @Params OrderFilter
//!     pub fn get(&self, ctx: &mut Context, id: i64, params: OrderFilter) -> Reply { .. }
//! }
//! ```
//!
//! From these the crate generates one route module per controller, a registry calling every
//! module's entry points, and a Swagger 2.0 document. Models and controller scaffolds can be
//! generated from a table schema.
//!
//! # Architecture
//!
//! 1. [`scanner`] - Recursively scans the controller directory for Rust files
//! 2. [`parser`] - Parses Rust source files into syntax trees
//! 3. [`introspector`] - Extracts declarations, methods, tags and variables
//! 4. [`directive`] - Parses doc lines into typed directives
//! 5. [`route_model`] - Decides which methods are routes and how they are registered
//! 6. [`openapi_builder`] - Builds API operations and the documentation document
//! 7. [`synthesizer`] - Renders and formats the generated code
//! 8. [`serializer`] / [`output`] - Write documents and generated units
//!
//! [`generator`] drives one run; [`cli`] is the command-line front end.
//!
//! # Example Usage
//!
//! ```no_run
//! use routes_from_source::config::GeneratorConfig;
//! use routes_from_source::generator::Generator;
//! use routes_from_source::output::FsSink;
//! use routes_from_source::serializer::serialize_yaml;
//! use std::path::PathBuf;
//!
//! # fn main() -> anyhow::Result<()> {
//! let project = PathBuf::from("./my-project");
//! let generator = Generator::new(project.clone(), GeneratorConfig::default())?;
//! let units = generator.load_units()?;
//!
//! let mut sink = FsSink::new(project.join("src/routes"));
//! generator.generate_routes(&units, &mut sink)?;
//!
//! println!("{}", serialize_yaml(&generator.generate_docs(&units))?);
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod config;
pub mod directive;
pub mod error;
pub mod generator;
pub mod introspector;
pub mod naming;
pub mod openapi_builder;
pub mod output;
pub mod parser;
pub mod route_model;
pub mod scanner;
pub mod schema_source;
pub mod serializer;
pub mod synthesizer;
