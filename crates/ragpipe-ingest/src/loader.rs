//! Text loaders keyed by file extension. Parsing richer formats (`.pdf`,
//! `.docx`) is a collaborator concern: implement `TextLoader` for them and
//! register it; the registry only routes.

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use ragpipe_core::error::{Error, Result};
use ragpipe_core::traits::TextLoader;

/// Reads `.txt` and `.md` files, falling back to a lossy read when the
/// bytes are not valid UTF-8.
pub struct PlainTextLoader;

impl TextLoader for PlainTextLoader {
    fn extensions(&self) -> &[&str] {
        &["txt", "md"]
    }

    fn extract_text(&self, path: &Path) -> Result<String> {
        match fs::read_to_string(path) {
            Ok(content) => Ok(content),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(Error::NotFound(format!("file not found: {}", path.display())))
            }
            Err(_) => {
                let bytes = fs::read(path)
                    .map_err(|e| Error::Operation(format!("read {}: {e}", path.display())))?;
                Ok(String::from_utf8_lossy(&bytes).to_string())
            }
        }
    }
}

pub struct LoaderRegistry {
    by_ext: HashMap<String, Arc<dyn TextLoader>>,
}

impl LoaderRegistry {
    pub fn new() -> Self {
        Self { by_ext: HashMap::new() }
    }

    /// Registry with the built-in plain-text loader installed.
    pub fn with_defaults() -> Self {
        let mut reg = Self::new();
        reg.register(Arc::new(PlainTextLoader));
        reg
    }

    pub fn register(&mut self, loader: Arc<dyn TextLoader>) {
        for ext in loader.extensions() {
            self.by_ext.insert(ext.to_lowercase(), Arc::clone(&loader));
        }
    }

    pub fn supports(&self, path: &Path) -> bool {
        self.lookup(path).is_ok()
    }

    pub fn extract_text(&self, path: &Path) -> Result<String> {
        self.lookup(path)?.extract_text(path)
    }

    fn lookup(&self, path: &Path) -> Result<&Arc<dyn TextLoader>> {
        let ext = path
            .extension()
            .and_then(|s| s.to_str())
            .map(str::to_lowercase)
            .ok_or_else(|| Error::NotFound(format!("no file extension: {}", path.display())))?;
        self.by_ext
            .get(&ext)
            .ok_or_else(|| Error::NotFound(format!("no loader registered for .{ext}")))
    }
}

impl Default for LoaderRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn routes_by_extension_case_insensitively() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("NOTES.TXT");
        fs::write(&path, "hello").unwrap();

        let reg = LoaderRegistry::with_defaults();
        assert!(reg.supports(&path));
        assert_eq!(reg.extract_text(&path).unwrap(), "hello");
    }

    #[test]
    fn unknown_extension_is_not_found() {
        let reg = LoaderRegistry::with_defaults();
        let err = reg.extract_text(Path::new("report.pdf")).unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
        let err = reg.extract_text(Path::new("no_extension")).unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[test]
    fn invalid_utf8_falls_back_to_lossy_read() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("binary.txt");
        let mut f = fs::File::create(&path).unwrap();
        f.write_all(&[0x66, 0x6f, 0x6f, 0xff, 0x62, 0x61, 0x72]).unwrap();

        let reg = LoaderRegistry::with_defaults();
        let text = reg.extract_text(&path).unwrap();
        assert!(text.starts_with("foo"));
        assert!(text.ends_with("bar"));
    }
}
