use crate::error::{Error, Result};
use log::warn;
use std::path::PathBuf;
use walkdir::WalkDir;

/// File scanner for traversing controller directories.
///
/// The `FileScanner` recursively walks a directory to find all Rust source files. It skips
/// the `target` directory and hidden directories, and visits entries in file-name order so
/// that a run over unchanged input always sees the files in the same sequence.
///
/// # Example
///
/// ```no_run
/// use routes_from_source::scanner::FileScanner;
/// use std::path::PathBuf;
///
/// let scanner = FileScanner::new(PathBuf::from("./src/controller"));
/// let result = scanner.scan().unwrap();
/// println!("Found {} Rust files", result.rust_files.len());
/// ```
pub struct FileScanner {
    root_path: PathBuf,
}

/// Result of directory scanning operation.
pub struct ScanResult {
    /// List of paths to all discovered `.rs` files, in traversal order
    pub rust_files: Vec<PathBuf>,
    /// Warning messages for any issues encountered (e.g., inaccessible directories)
    pub warnings: Vec<String>,
}

impl ScanResult {
    /// The discovered files, provided the walk reached every entry.
    ///
    /// # Errors
    ///
    /// Returns [`Error::IoError`] listing the inaccessible entries when the scan has
    /// warnings: generation never runs on part of the sources.
    pub fn into_complete(self) -> Result<Vec<PathBuf>> {
        if self.warnings.is_empty() {
            return Ok(self.rust_files);
        }
        Err(Error::IoError(std::io::Error::other(format!(
            "incomplete scan: {}",
            self.warnings.join("; ")
        ))))
    }
}

impl FileScanner {
    /// Creates a new `FileScanner` for the specified root directory.
    pub fn new(root_path: PathBuf) -> Self {
        Self { root_path }
    }

    /// Scans the directory tree and collects all `.rs` files.
    ///
    /// Inaccessible entries are logged and reported in [`ScanResult::warnings`]; scanning
    /// continues past them.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if the root is not an existing directory.
    pub fn scan(&self) -> Result<ScanResult> {
        if !self.root_path.is_dir() {
            return Err(Error::InvalidArgument(format!(
                "not a directory: {}",
                self.root_path.display()
            )));
        }

        let mut rust_files = Vec::new();
        let mut warnings = Vec::new();

        for entry in WalkDir::new(&self.root_path)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| {
                if e.path() == self.root_path {
                    return true;
                }

                let file_name = e.file_name().to_string_lossy();
                let is_hidden = file_name.starts_with('.');
                let is_target = file_name == "target";

                !is_hidden && !is_target
            })
        {
            match entry {
                Ok(entry) => {
                    let path = entry.path();
                    if path.is_file() && path.extension().and_then(|s| s.to_str()) == Some("rs") {
                        rust_files.push(path.to_path_buf());
                    }
                }
                Err(e) => {
                    let warning = format!("Failed to access path: {}", e);
                    warn!("{}", warning);
                    warnings.push(warning);
                }
            }
        }

        Ok(ScanResult {
            rust_files,
            warnings,
        })
    }
}
