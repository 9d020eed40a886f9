//! Local audio file library.
//!
//! The player serves whatever regular files live in its audio directory.
//! Identifiers are bare filenames; anything that could escape the directory
//! (path separators, `..`, exotic characters) is rejected before it ever
//! touches the filesystem.

use std::path::{Path, PathBuf};

/// Returns true if `name` is a safe audio file identifier.
///
/// Allowed: ASCII letters, digits, spaces, `.`, `_`, `-`. No path
/// separators, no parent-directory references, no empty names.
pub fn is_safe_name(name: &str) -> bool {
    if name.is_empty() || name.contains("..") || name.contains('/') || name.contains('\\') {
        return false;
    }
    name.chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | ' ' | '-'))
}

/// The player's set of locally available audio files.
#[derive(Debug, Clone)]
pub struct AudioLibrary {
    dir: PathBuf,
}

impl AudioLibrary {
    /// Creates a library over the given directory.
    ///
    /// The directory does not need to exist yet; a missing directory simply
    /// behaves as an empty library.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Returns the library directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Lists available file identifiers, sorted.
    pub fn list(&self) -> Vec<String> {
        let entries = match std::fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(_) => return Vec::new(),
        };
        let mut files: Vec<String> = entries
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.path().is_file())
            .filter_map(|entry| entry.file_name().into_string().ok())
            .collect();
        files.sort();
        files
    }

    /// Resolves a file identifier to its on-disk path.
    ///
    /// Returns `None` when the identifier is unsafe or the file does not
    /// exist as a regular file.
    pub fn resolve(&self, name: &str) -> Option<PathBuf> {
        if !is_safe_name(name) {
            return None;
        }
        let path = self.dir.join(name);
        if path.is_file() {
            Some(path)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn library_with(files: &[&str]) -> (tempfile::TempDir, AudioLibrary) {
        let dir = tempfile::tempdir().unwrap();
        for name in files {
            std::fs::write(dir.path().join(name), b"audio").unwrap();
        }
        let library = AudioLibrary::new(dir.path());
        (dir, library)
    }

    #[test]
    fn safe_names_accepted() {
        assert!(is_safe_name("chime.mp3"));
        assert!(is_safe_name("my file_01-final.mp3"));
    }

    #[test]
    fn unsafe_names_rejected() {
        assert!(!is_safe_name(""));
        assert!(!is_safe_name("../etc/passwd"));
        assert!(!is_safe_name("a/b.mp3"));
        assert!(!is_safe_name("a\\b.mp3"));
        assert!(!is_safe_name("name?.mp3"));
    }

    #[test]
    fn list_is_sorted() {
        let (_dir, library) = library_with(&["b.mp3", "a.mp3", "c.mp3"]);
        assert_eq!(library.list(), vec!["a.mp3", "b.mp3", "c.mp3"]);
    }

    #[test]
    fn list_is_empty_for_missing_dir() {
        let library = AudioLibrary::new("/nonexistent/audio");
        assert!(library.list().is_empty());
    }

    #[test]
    fn resolve_existing_file() {
        let (dir, library) = library_with(&["chime.mp3"]);
        assert_eq!(
            library.resolve("chime.mp3"),
            Some(dir.path().join("chime.mp3"))
        );
    }

    #[test]
    fn resolve_rejects_missing_and_unsafe() {
        let (_dir, library) = library_with(&["chime.mp3"]);
        assert!(library.resolve("other.mp3").is_none());
        assert!(library.resolve("../chime.mp3").is_none());
    }
}
