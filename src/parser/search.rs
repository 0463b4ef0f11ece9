use camino::{Utf8Path, Utf8PathBuf};

/// Ordered set of directories used to resolve relative paths in diagnostics.
///
/// Insertion order is resolution precedence: the first directory containing
/// the path wins. Duplicates are allowed and harmless; removal drops the
/// first occurrence only.
#[derive(Debug, Clone, Default)]
pub struct SearchDirs {
    dirs: Vec<Utf8PathBuf>,
}

impl SearchDirs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole set.
    pub fn set(&mut self, dirs: Vec<Utf8PathBuf>) {
        self.dirs = dirs;
    }

    pub fn add(&mut self, dir: Utf8PathBuf) {
        self.dirs.push(dir);
    }

    /// Remove the first occurrence of `dir`, if present.
    pub fn remove(&mut self, dir: &Utf8Path) {
        if let Some(pos) = self.dirs.iter().position(|d| d == dir) {
            self.dirs.remove(pos);
        }
    }

    pub fn dirs(&self) -> &[Utf8PathBuf] {
        &self.dirs
    }

    /// Resolve a possibly relative path from a diagnostic.
    ///
    /// Absolute paths come back unchanged. Relative paths are probed against
    /// each directory in order; if no candidate exists on disk the input is
    /// returned as-is rather than failing.
    pub fn resolve(&self, path: &Utf8Path) -> Utf8PathBuf {
        if path.is_absolute() {
            return path.to_path_buf();
        }
        for dir in &self.dirs {
            let candidate = dir.join(path);
            if candidate.exists() {
                return candidate;
            }
        }
        path.to_path_buf()
    }
}
