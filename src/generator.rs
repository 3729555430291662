//! One generation run: load the controller sources once, then produce any combination of
//! route modules, API documentation, models and controller scaffolds.

use crate::config::GeneratorConfig;
use crate::error::{Error, Result};
use crate::introspector::{SourceIntrospector, SourceUnit};
use crate::openapi_builder::{ApiDocModelBuilder, ApiDocument, OpenApiBuilder};
use crate::output::OutputSink;
use crate::parser::AstParser;
use crate::route_model::RouteModelBuilder;
use crate::scanner::FileScanner;
use crate::schema_source::{SchemaSource, TableInfo};
use crate::synthesizer::{CodeSynthesizer, RouteUnit};
use log::{debug, info, warn};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

/// Connection and database a schema query runs against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogTarget {
    pub connection: String,
    pub database: String,
}

pub struct Generator {
    project_dir: PathBuf,
    config: GeneratorConfig,
    synthesizer: CodeSynthesizer,
}

impl Generator {
    pub fn new(project_dir: PathBuf, config: GeneratorConfig) -> Result<Self> {
        let templates = config.template_set(&project_dir)?;
        let synthesizer = CodeSynthesizer::new(&templates, config.synth_options())?;
        Ok(Self {
            project_dir,
            config,
            synthesizer,
        })
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    pub fn project_dir(&self) -> &Path {
        &self.project_dir
    }

    /// Scans, parses and introspects every controller source.
    ///
    /// # Errors
    ///
    /// A single unparseable file or inaccessible entry fails the whole load: no output is
    /// generated from a partial view of the sources.
    pub fn load_units(&self) -> Result<Vec<SourceUnit>> {
        let source_dir = self.project_dir.join(&self.config.source_dir);
        info!("Scanning {}", source_dir.display());
        let rust_files = FileScanner::new(source_dir).scan()?.into_complete()?;

        let parsed = AstParser::parse_files(&rust_files)?;
        let units = SourceIntrospector::introspect_all(&parsed)?;
        info!("Loaded {} source files", units.len());
        Ok(units)
    }

    /// Writes one route module per declaration with APIs, then the registry module.
    ///
    /// Returns the route units in generation order.
    pub fn generate_routes(
        &self,
        units: &[SourceUnit],
        sink: &mut dyn OutputSink,
    ) -> Result<Vec<RouteUnit>> {
        let builder = RouteModelBuilder::new(self.config.route_options());
        let mut generated: Vec<RouteUnit> = Vec::new();
        let mut modules = BTreeSet::new();

        for unit in units {
            let validators: Vec<String> = unit
                .variables()
                .filter(|var| var.ty.to_string() == self.config.validator_type)
                .map(|var| var.name.clone())
                .collect();

            for decl in unit.declarations() {
                let routes = builder.build_all(decl);
                let Some(route_unit) =
                    self.synthesizer
                        .render_route_unit(&decl.name, &routes, &validators)?
                else {
                    continue;
                };

                if !modules.insert(route_unit.module.clone()) {
                    warn!(
                        "Duplicate route module {} from {}, skipping",
                        route_unit.module,
                        unit.path.display()
                    );
                    continue;
                }

                sink.write_unit(&route_unit.unit.path, &route_unit.unit.text)?;
                debug!(
                    "{}: {} routes -> {}",
                    decl.name,
                    routes.len(),
                    route_unit.unit.path.display()
                );
                generated.push(route_unit);
            }
        }

        let export = self.synthesizer.render_export(&generated)?;
        sink.write_unit(&export.path, &export.text)?;
        info!("Generated {} route modules", generated.len());
        Ok(generated)
    }

    /// Builds the API document of every declaration.
    ///
    /// `@Params` names are resolved against the declarations of all loaded units.
    pub fn generate_docs(&self, units: &[SourceUnit]) -> ApiDocument {
        let doc_builder = ApiDocModelBuilder::new(units.iter().flat_map(SourceUnit::declarations));
        let mut builder = OpenApiBuilder::new().with_info(self.config.info.clone());

        for decl in units.iter().flat_map(SourceUnit::declarations) {
            let operations = doc_builder.build(decl);
            builder.add_declaration(doc_builder.controller_tag(decl), &operations);
        }

        let document = builder.build();
        info!("Documented {} paths", document.paths.len());
        document
    }

    /// Writes one model per table: the named table, or every table of the database.
    ///
    /// A schema source failure is logged and ends the step, keeping the models written so
    /// far. Returns the paths of the written models.
    pub fn generate_models(
        &self,
        source: &dyn SchemaSource,
        target: &CatalogTarget,
        table: Option<&str>,
        sink: &mut dyn OutputSink,
    ) -> Result<Vec<PathBuf>> {
        let mut written = Vec::new();

        let tables = match self.select_tables(source, target, table) {
            Ok(tables) => tables,
            Err(e) => return absorb_schema_error(e, written),
        };

        for table in &tables {
            let columns = match source.columns(&target.connection, &target.database, &table.name) {
                Ok(columns) => columns,
                Err(e) => return absorb_schema_error(e, written),
            };
            let unit = self
                .synthesizer
                .render_model(&target.connection, table, &columns)?;
            sink.write_unit(&unit.path, &unit.text)?;
            debug!("Model of {} -> {}", table.name, unit.path.display());
            written.push(unit.path);
        }

        info!("Generated {} models", written.len());
        Ok(written)
    }

    /// Writes a controller scaffold for `table`.
    ///
    /// With a schema source, the form struct gets one field per column and the table comment
    /// becomes the controller description. Without one, or when the table is unknown, the
    /// scaffold has an empty form.
    pub fn generate_controller(
        &self,
        table: &str,
        schema: Option<(&dyn SchemaSource, &CatalogTarget)>,
        sink: &mut dyn OutputSink,
    ) -> Result<PathBuf> {
        if table.trim().is_empty() {
            return Err(Error::InvalidArgument(
                "a table name is required to generate a controller".to_string(),
            ));
        }

        let mut info = TableInfo {
            name: table.to_string(),
            comment: String::new(),
        };
        let mut columns = Vec::new();

        if let Some((source, target)) = schema {
            let described = source
                .table(&target.connection, &target.database, table)
                .and_then(|found| match found {
                    Some(found) => {
                        let cols = source.columns(&target.connection, &target.database, table)?;
                        Ok(Some((found, cols)))
                    }
                    None => Ok(None),
                });
            match described {
                Ok(Some((found, cols))) => {
                    info = found;
                    columns = cols;
                }
                Ok(None) => warn!("Table {} not found, generating an empty form", table),
                Err(e) if !e.is_fatal() => warn!("{}", e),
                Err(e) => return Err(e),
            }
        }

        let unit = self.synthesizer.render_controller(&info, &columns)?;
        sink.write_unit(&unit.path, &unit.text)?;
        info!("Generated controller {}", unit.path.display());
        Ok(unit.path)
    }

    fn select_tables(
        &self,
        source: &dyn SchemaSource,
        target: &CatalogTarget,
        table: Option<&str>,
    ) -> Result<Vec<TableInfo>> {
        match table {
            Some(name) => Ok(source
                .table(&target.connection, &target.database, name)?
                .into_iter()
                .collect()),
            None => source.tables(&target.connection, &target.database),
        }
    }
}

fn absorb_schema_error(error: Error, written: Vec<PathBuf>) -> Result<Vec<PathBuf>> {
    if error.is_fatal() {
        return Err(error);
    }
    warn!("{}", error);
    Ok(written)
}
