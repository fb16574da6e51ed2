//! Native binding library lookup
//!
//! Resolves a library name to a file using platform naming conventions and
//! an ordered list of search paths, then opens it with `libloading`.

use libloading::Library;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Library loading errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LoadError {
    /// Library file not found in search paths
    #[error("Library not found: {0}")]
    LibraryNotFound(String),

    /// Symbol not found in library
    #[error("Symbol '{symbol}' not found in library '{library}'")]
    SymbolNotFound { library: String, symbol: String },

    #[error("Failed to load library: {0}")]
    LoadFailed(String),
}

/// Dynamic library locator with platform-specific path resolution
pub struct LibraryLoader {
    search_paths: Vec<PathBuf>,
}

impl LibraryLoader {
    /// Create a new library loader with default search paths
    pub fn new() -> Self {
        Self {
            search_paths: Self::default_search_paths(),
        }
    }

    /// Default paths plus `extra`, which are searched first and in order
    pub fn with_search_paths(extra: &[PathBuf]) -> Self {
        let mut loader = Self::new();
        for path in extra.iter().rev() {
            loader.add_search_path(path.clone());
        }
        loader
    }

    /// Platform library search paths
    ///
    /// - macOS: /usr/lib, /usr/local/lib, /opt/homebrew/lib
    /// - Linux: /usr/lib, /usr/local/lib, /lib (+ lib64 variants)
    /// - Windows: System32
    /// - All platforms: current working directory first
    fn default_search_paths() -> Vec<PathBuf> {
        let mut paths = Vec::new();

        #[cfg(target_os = "macos")]
        {
            paths.push(PathBuf::from("/usr/lib"));
            paths.push(PathBuf::from("/usr/local/lib"));
            paths.push(PathBuf::from("/opt/homebrew/lib"));
        }

        #[cfg(target_os = "linux")]
        {
            paths.push(PathBuf::from("/usr/lib"));
            paths.push(PathBuf::from("/usr/local/lib"));
            paths.push(PathBuf::from("/lib"));

            if cfg!(target_pointer_width = "64") {
                paths.push(PathBuf::from("/usr/lib64"));
                paths.push(PathBuf::from("/lib64"));
            }
        }

        #[cfg(target_os = "windows")]
        {
            paths.push(PathBuf::from("C:\\Windows\\System32"));
            if let Ok(system_root) = std::env::var("SystemRoot") {
                paths.push(PathBuf::from(format!("{}\\System32", system_root)));
            }
        }

        if let Ok(cwd) = std::env::current_dir() {
            paths.insert(0, cwd);
        }

        paths
    }

    /// Candidate file names for `name`, most preferred first
    ///
    /// - macOS: lib{name}.dylib, lib{name}.so, {name}.dylib, {name}.so
    /// - Linux: lib{name}.so, {name}.so
    /// - Windows: {name}.dll, lib{name}.dll
    fn candidate_file_names(name: &str) -> Vec<String> {
        let extensions: &[&str] = if cfg!(target_os = "windows") {
            &["dll"]
        } else if cfg!(target_os = "macos") {
            &["dylib", "so"]
        } else {
            &["so"]
        };

        let prefixes: &[&str] = if cfg!(target_os = "windows") {
            &["", "lib"]
        } else {
            &["lib", ""]
        };

        let mut names = Vec::new();
        for prefix in prefixes {
            for ext in extensions {
                names.push(format!("{}{}.{}", prefix, name, ext));
            }
        }
        names
    }

    /// Resolve a library name or path to an existing file
    pub fn resolve_library_path(&self, name: &str) -> Option<PathBuf> {
        let path = Path::new(name);
        if path.is_absolute() {
            return path.exists().then(|| path.to_path_buf());
        }

        let candidates = Self::candidate_file_names(name);
        self.search_paths.iter().find_map(|dir| {
            candidates
                .iter()
                .map(|file| dir.join(file))
                .find(|full| full.exists())
        })
    }

    /// Open a library by name or absolute path
    ///
    /// # Safety
    ///
    /// Opening a library runs its initializers in this process; the caller
    /// must trust it.
    pub unsafe fn open(&self, name: &str) -> Result<(PathBuf, Library), LoadError> {
        let path = self
            .resolve_library_path(name)
            .ok_or_else(|| LoadError::LibraryNotFound(name.to_string()))?;

        debug!(library = name, path = %path.display(), "opening native library");
        let library = Library::new(&path).map_err(|e| LoadError::LoadFailed(e.to_string()))?;
        Ok((path, library))
    }

    /// Add a custom search path (prepended to search list)
    pub fn add_search_path(&mut self, path: PathBuf) {
        self.search_paths.insert(0, path);
    }

    pub fn search_paths(&self) -> &[PathBuf] {
        &self.search_paths
    }
}

impl Default for LibraryLoader {
    fn default() -> Self {
        Self::new()
    }
}
