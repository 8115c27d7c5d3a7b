use crate::error::{Error, Result};
use crate::language::language_key;
use log::{debug, warn};
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Files picked up when no include filter is configured.
pub const DEFAULT_FILE_FILTER: &str = r".*\.(clj|coffee|cs|dart|erl|exs?|go|java|js|lua|php?|pl|pm|py|rb|ts)$";

/// Decoded text of one source file plus its language key.
#[derive(Debug, Clone)]
pub struct SourceUnit {
    pub path: PathBuf,
    pub text: String,
    /// Lower-cased extension including the dot, e.g. `.rb`
    pub language: String,
}

impl SourceUnit {
    /// Reads a file; invalid UTF-8 sequences are replaced rather than rejected.
    pub fn read(path: &Path) -> Result<Self> {
        let bytes = fs::read(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            text: String::from_utf8_lossy(&bytes).into_owned(),
            language: language_key(path),
        })
    }
}

/// File scanner for traversing source directories.
///
/// The `FileScanner` recursively walks the input directory and keeps the files
/// whose path matches one of the include filters and none of the exclude
/// filters. Hidden directories (starting with `.`) and `target` are skipped.
/// A single file may be given as input as well.
///
/// # Example
///
/// ```no_run
/// use openapi_from_comments::scanner::FileScanner;
/// use std::path::PathBuf;
///
/// let scanner = FileScanner::new(PathBuf::from("./src")).unwrap();
/// let result = scanner.scan().unwrap();
/// println!("Found {} source files", result.files.len());
/// ```
pub struct FileScanner {
    root_path: PathBuf,
    include: Vec<Regex>,
    exclude: Vec<Regex>,
}

/// Result of directory scanning operation.
pub struct ScanResult {
    /// Matching files in traversal order (sorted by file name per directory)
    pub files: Vec<PathBuf>,
    /// Warning messages for any issues encountered (e.g., inaccessible directories)
    pub warnings: Vec<String>,
}

impl FileScanner {
    /// Creates a scanner using [`DEFAULT_FILE_FILTER`] and no exclude filter.
    pub fn new(root_path: PathBuf) -> Result<Self> {
        Self::with_filters(root_path, &[DEFAULT_FILE_FILTER.to_string()], &[])
    }

    /// Creates a scanner with explicit filters.
    ///
    /// # Arguments
    ///
    /// * `include` - Patterns selecting files; the default filter is used when empty
    /// * `exclude` - Patterns rejecting files or directories
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidPattern`] for a pattern that does not compile.
    pub fn with_filters(root_path: PathBuf, include: &[String], exclude: &[String]) -> Result<Self> {
        let include = if include.is_empty() {
            vec![compile(DEFAULT_FILE_FILTER)?]
        } else {
            include.iter().map(|p| compile(p)).collect::<Result<Vec<_>>>()?
        };
        let exclude = exclude
            .iter()
            .filter(|p| !p.is_empty())
            .map(|p| compile(p))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            root_path,
            include,
            exclude,
        })
    }

    /// Scans the directory tree and collects the matching files.
    ///
    /// Inaccessible entries are logged and reported as warnings; scanning continues.
    ///
    /// # Errors
    ///
    /// Returns [`Error::FileDiscovery`] when nothing matched.
    pub fn scan(&self) -> Result<ScanResult> {
        let mut files = Vec::new();
        let mut warnings = Vec::new();

        for entry in WalkDir::new(&self.root_path)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| {
                if e.path() == self.root_path {
                    return true;
                }
                let file_name = e.file_name().to_string_lossy();
                let skipped_dir = e.file_type().is_dir() && (file_name.starts_with('.') || file_name == "target");
                !skipped_dir && !self.is_excluded(e.path())
            })
        {
            match entry {
                Ok(entry) => {
                    let path = entry.path();
                    if path.is_file() && self.is_included(path) {
                        debug!("found file: {}", path.display());
                        files.push(path.to_path_buf());
                    }
                }
                Err(e) => {
                    let warning = format!("Failed to access path: {}", e);
                    warn!("{}", warning);
                    warnings.push(warning);
                }
            }
        }

        if files.is_empty() {
            return Err(Error::FileDiscovery {
                path: self.root_path.clone(),
                message: "No files found".to_string(),
            });
        }

        Ok(ScanResult { files, warnings })
    }

    /// Scans and decodes every matching file.
    pub fn read_sources(&self) -> Result<Vec<SourceUnit>> {
        let scanned = self.scan()?;
        scanned.files.iter().map(|path| SourceUnit::read(path)).collect()
    }

    fn is_included(&self, path: &Path) -> bool {
        let text = self.filter_text(path);
        self.include.iter().any(|re| re.is_match(&text))
    }

    fn is_excluded(&self, path: &Path) -> bool {
        let text = self.filter_text(path);
        self.exclude.iter().any(|re| re.is_match(&text))
    }

    /// Filters match the path relative to the input with forward slashes.
    fn filter_text(&self, path: &Path) -> String {
        let relative = match path.strip_prefix(&self.root_path) {
            Ok(rel) if !rel.as_os_str().is_empty() => rel,
            _ => path,
        };
        relative.to_string_lossy().replace('\\', "/")
    }
}

fn compile(pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|source| Error::InvalidPattern {
        pattern: pattern.to_string(),
        source,
    })
}
