use anyhow::{Result, Context, anyhow};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::migration::Script;

// @module: File and directory utilities

/// Extension of source script files
pub const SQL_EXTENSION: &str = "sql";

// @struct: File operations utility
pub struct FileManager;

impl FileManager {
    // @checks: File existence
    pub fn file_exists<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref().exists() && path.as_ref().is_file()
    }

    // @checks: Directory existence
    pub fn dir_exists<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref().exists() && path.as_ref().is_dir()
    }

    // @creates: Directory and parents if needed
    pub fn ensure_dir<P: AsRef<Path>>(path: P) -> Result<()> {
        let path = path.as_ref();
        if !path.exists() {
            fs::create_dir_all(path)?;
        }
        Ok(())
    }

    /// Find files with a specific extension in a directory, sorted by path
    pub fn find_files<P: AsRef<Path>>(dir: P, extension: &str) -> Result<Vec<PathBuf>> {
        let mut result = Vec::new();
        let normalized_ext = extension.trim_start_matches('.');

        for entry in WalkDir::new(dir.as_ref()).follow_links(true) {
            let entry = entry.context("Failed to read directory entry")?;
            let path = entry.path();

            if path.is_file() {
                if let Some(ext) = path.extension() {
                    if ext.to_string_lossy().eq_ignore_ascii_case(normalized_ext) {
                        result.push(path.to_path_buf());
                    }
                }
            }
        }

        result.sort();
        Ok(result)
    }

    /// Expand input paths into script files
    ///
    /// Files are taken as given; directories are searched recursively for
    /// `.sql` files.
    pub fn collect_sql_files(inputs: &[PathBuf]) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        for input in inputs {
            if Self::dir_exists(input) {
                files.extend(Self::find_files(input, SQL_EXTENSION)?);
            } else if Self::file_exists(input) {
                files.push(input.clone());
            } else {
                return Err(anyhow!("Input path does not exist: {:?}", input));
            }
        }
        Ok(files)
    }

    /// Read one script; the body must be valid UTF-8
    pub fn load_script<P: AsRef<Path>>(path: P) -> Result<Script> {
        let path = path.as_ref();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .ok_or_else(|| anyhow!("Not a file path: {:?}", path))?;

        let bytes = fs::read(path).with_context(|| format!("Failed to read file: {:?}", path))?;
        let body = String::from_utf8(bytes)
            .map_err(|e| anyhow!("{} is not valid UTF-8: {}", name, e.utf8_error()))?;

        Ok(Script::new(name, body))
    }

    /// Load every script under the input paths, rejecting duplicate base names
    pub fn load_scripts(inputs: &[PathBuf]) -> Result<Vec<Script>> {
        let mut seen = HashSet::new();
        let mut scripts = Vec::new();

        for path in Self::collect_sql_files(inputs)? {
            let script = Self::load_script(&path)?;
            if !seen.insert(script.name.clone()) {
                return Err(anyhow!(
                    "Duplicate script name {} ({:?}); script names must be unique within a batch",
                    script.name,
                    path
                ));
            }
            scripts.push(script);
        }

        Ok(scripts)
    }

    /// Write a string to a file
    pub fn write_to_file<P: AsRef<Path>>(path: P, content: &str) -> Result<()> {
        Self::write_bytes(path, content.as_bytes())
    }

    /// Write bytes to a file, creating the parent directory
    pub fn write_bytes<P: AsRef<Path>>(path: P, content: &[u8]) -> Result<()> {
        if let Some(parent) = path.as_ref().parent() {
            Self::ensure_dir(parent)?;
        }

        fs::write(&path, content)
            .with_context(|| format!("Failed to write to file: {:?}", path.as_ref()))?;

        Ok(())
    }
}
