use crate::config::GeneratorConfig;
use crate::generator::{CatalogTarget, Generator};
use crate::output::FsSink;
use crate::schema_source::{SchemaSource, SnapshotSchemaSource};
use crate::serializer::{serialize_json, serialize_yaml, write_to_file};
use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use log::{debug, info};
use std::path::PathBuf;

/// Generate route registration, validation wiring and API docs from controller directives
#[derive(Parser, Debug)]
#[command(name = "routes-from-source")]
#[command(author, version, about, long_about = None)]
pub struct CliArgs {
    /// Path to the project directory
    #[arg(value_name = "PROJECT_PATH", default_value = ".")]
    pub project_path: PathBuf,

    /// Generate the API document
    #[arg(long = "docs")]
    pub docs: bool,

    /// API document format (yaml or json)
    #[arg(short = 'f', long = "format", value_enum, default_value = "yaml")]
    pub output_format: OutputFormat,

    /// API document output file (if not specified, outputs to stdout)
    #[arg(short = 'o', long = "docs-output", value_name = "FILE")]
    pub docs_output: Option<PathBuf>,

    /// Generate route modules for every controller
    #[arg(long = "routes")]
    pub routes: bool,

    /// Generate data models from the table schema
    #[arg(long = "models")]
    pub models: bool,

    /// Generate a controller scaffold for --table
    #[arg(long = "controller")]
    pub controller: bool,

    /// Database connection name
    #[arg(long = "connection", default_value = "default")]
    pub connection: String,

    /// Database name
    #[arg(long = "database")]
    pub database: Option<String>,

    /// Table name (models: only this table; controller: required)
    #[arg(long = "table")]
    pub table: Option<String>,

    /// Catalog snapshot file (overrides the configuration)
    #[arg(long = "schema-snapshot", value_name = "FILE")]
    pub schema_snapshot: Option<PathBuf>,

    /// Configuration file (default: routes-from-source.yaml in the project directory)
    #[arg(short = 'c', long = "config", value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,
}

/// Output format options
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// YAML format
    Yaml,
    /// JSON format
    Json,
}

impl CliArgs {
    fn catalog_target(&self) -> Option<CatalogTarget> {
        self.database.as_ref().map(|database| CatalogTarget {
            connection: self.connection.clone(),
            database: database.clone(),
        })
    }
}

/// Parse command line arguments
pub fn parse_args() -> Result<CliArgs> {
    let args = CliArgs::parse();
    parse_args_from_parsed(args)
}

/// Validate and log already-parsed arguments
pub fn parse_args_from_parsed(args: CliArgs) -> Result<CliArgs> {
    debug!("Parsed arguments: {:?}", args);

    if !args.project_path.is_dir() {
        anyhow::bail!(
            "Project path is not a directory: {}",
            args.project_path.display()
        );
    }

    if !(args.docs || args.routes || args.models || args.controller) {
        anyhow::bail!("Nothing to do: pass at least one of --docs, --routes, --models, --controller");
    }

    if args.models && args.database.is_none() {
        anyhow::bail!("--models needs --database");
    }

    if args.controller && args.table.is_none() {
        anyhow::bail!("--controller needs --table");
    }

    info!("Project path: {}", args.project_path.display());
    Ok(args)
}

/// Run every requested action
pub fn run(args: CliArgs) -> Result<()> {
    let mut config = GeneratorConfig::discover(&args.project_path, args.config.as_deref())
        .context("Failed to load configuration")?;
    if let Some(snapshot) = &args.schema_snapshot {
        config.schema_snapshot = Some(snapshot.clone());
    }

    let project = args.project_path.clone();
    let generator = Generator::new(project.clone(), config)?;
    let config = generator.config();

    if args.docs || args.routes {
        let units = generator.load_units()?;

        if args.docs {
            info!("Building API document...");
            let document = generator.generate_docs(&units);
            let content = match args.output_format {
                OutputFormat::Yaml => serialize_yaml(&document)?,
                OutputFormat::Json => serialize_json(&document)?,
            };
            if let Some(output_path) = &args.docs_output {
                write_to_file(&content, output_path)?;
                info!("Wrote API document to {}", output_path.display());
            } else {
                println!("{}", content);
            }
        }

        if args.routes {
            info!("Generating routes...");
            let mut sink = FsSink::new(project.join(&config.routes_dir));
            let routes = generator.generate_routes(&units, &mut sink)?;
            info!("Wrote {} route modules to {}", routes.len(), sink.root().display());
        }
    }

    let wants_schema = args.models || args.controller;
    let schema = match &config.schema_snapshot {
        Some(path) if wants_schema => Some(
            SnapshotSchemaSource::load(&project.join(path))
                .with_context(|| format!("Failed to load schema snapshot {}", path.display())),
        ),
        _ => None,
    };

    if args.models {
        let target = args
            .catalog_target()
            .context("--models needs --database")?;
        match &schema {
            Some(Ok(source)) => {
                let mut sink = FsSink::new(project.join(&config.model_dir));
                generator.generate_models(source, &target, args.table.as_deref(), &mut sink)?;
            }
            Some(Err(e)) => log::warn!("Skipping models: {:#}", e),
            None => log::warn!("Skipping models: no schema snapshot configured"),
        }
    }

    if args.controller {
        let table = args.table.as_deref().context("--controller needs --table")?;
        let target = args.catalog_target();
        let source = match &schema {
            Some(Ok(source)) => Some(source as &dyn SchemaSource),
            Some(Err(e)) => {
                log::warn!("Generating controller without schema: {:#}", e);
                None
            }
            None => None,
        };
        let mut sink = FsSink::new(project.join(&config.controller_dir));
        generator.generate_controller(
            table,
            source.zip(target.as_ref()),
            &mut sink,
        )?;
    }

    info!("Generation complete!");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn args(argv: &[&str]) -> CliArgs {
        CliArgs::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_flags_are_combinable() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().to_str().unwrap();
        let parsed = parse_args_from_parsed(args(&[
            "routes-from-source",
            path,
            "--docs",
            "--routes",
            "-f",
            "json",
        ]))
        .unwrap();
        assert!(parsed.docs && parsed.routes);
        assert!(matches!(parsed.output_format, OutputFormat::Json));
        assert_eq!(parsed.connection, "default");
    }

    #[test]
    fn test_requires_an_action() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().to_str().unwrap();
        assert!(parse_args_from_parsed(args(&["routes-from-source", path])).is_err());
    }

    #[test]
    fn test_controller_requires_table() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().to_str().unwrap();
        assert!(parse_args_from_parsed(args(&["routes-from-source", path, "--controller"])).is_err());
        assert!(parse_args_from_parsed(args(&[
            "routes-from-source",
            path,
            "--controller",
            "--table",
            "user",
        ]))
        .is_ok());
    }

    #[test]
    fn test_run_writes_routes_and_docs() {
        let temp_dir = TempDir::new().unwrap();
        let controller_dir = temp_dir.path().join("src/controller");
        fs::create_dir_all(&controller_dir).unwrap();
        fs::write(
            controller_dir.join("ping.rs"),
            "pub struct Ping;\nimpl Ping {\n    /// @GetApi /ping\n    pub fn ping(ctx: &mut Context) -> Reply { Reply::ok() }\n}\n",
        )
        .unwrap();
        let docs = temp_dir.path().join("docs/swagger.json");

        let path = temp_dir.path().to_str().unwrap();
        let docs_arg = docs.to_str().unwrap();
        run(args(&[
            "routes-from-source",
            path,
            "--routes",
            "--docs",
            "-f",
            "json",
            "-o",
            docs_arg,
        ]))
        .unwrap();

        let route = fs::read_to_string(temp_dir.path().join("src/routes/ping.rs")).unwrap();
        assert!(route.contains("controller::Ping::ping(ctx)"));
        assert!(temp_dir.path().join("src/routes/mod.rs").exists());
        let doc: serde_json::Value = serde_json::from_str(&fs::read_to_string(docs).unwrap()).unwrap();
        assert!(doc["paths"]["/ping"]["get"].is_object());
    }
}
