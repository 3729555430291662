use crate::error::{Error, Result};
use log::{debug, error};
use std::fs;
use std::path::{Path, PathBuf};

/// AST (Abstract Syntax Tree) parser for Rust source files.
///
/// The `AstParser` uses the `syn` crate to parse controller sources into a syntax tree that
/// the [`introspector`](crate::introspector) then reduces to declarations and methods.
///
/// # Example
///
/// ```no_run
/// use routes_from_source::parser::AstParser;
/// use std::path::Path;
///
/// let parsed = AstParser::parse_file(Path::new("src/controller/order.rs")).unwrap();
/// println!("Parsed {} items", parsed.syntax_tree.items.len());
/// ```
pub struct AstParser;

/// A successfully parsed Rust file with its abstract syntax tree.
#[derive(Debug, Clone)]
pub struct ParsedFile {
    /// Path to the source file
    pub path: PathBuf,
    /// The parsed abstract syntax tree
    pub syntax_tree: syn::File,
}

impl AstParser {
    /// Parses a single Rust source file into an AST.
    ///
    /// # Errors
    ///
    /// Returns [`Error::IoError`] if the file cannot be read and [`Error::ParseError`] if it
    /// contains invalid Rust syntax.
    pub fn parse_file(path: &Path) -> Result<ParsedFile> {
        debug!("Parsing file: {}", path.display());

        let content = fs::read_to_string(path)?;
        Self::parse_source(path, &content)
    }

    /// Parses in-memory source text attributed to `path`.
    pub fn parse_source(path: &Path, content: &str) -> Result<ParsedFile> {
        let syntax_tree = syn::parse_file(content).map_err(|e| Error::ParseError {
            file: path.to_path_buf(),
            message: e.to_string(),
        })?;

        debug!("Successfully parsed file: {}", path.display());

        Ok(ParsedFile {
            path: path.to_path_buf(),
            syntax_tree,
        })
    }

    /// Parses every file, stopping at the first failure.
    ///
    /// Generated routes are only trusted when the whole controller tree parses, so a single
    /// syntax error fails the batch instead of yielding a partial result.
    pub fn parse_files(paths: &[PathBuf]) -> Result<Vec<ParsedFile>> {
        debug!("Parsing {} files", paths.len());

        let mut parsed = Vec::with_capacity(paths.len());
        for path in paths {
            match Self::parse_file(path) {
                Ok(file) => parsed.push(file),
                Err(e) => {
                    error!("Failed to parse {}: {}", path.display(), e);
                    return Err(e);
                }
            }
        }

        debug!("Parsing complete: {} files", parsed.len());
        Ok(parsed)
    }
}
