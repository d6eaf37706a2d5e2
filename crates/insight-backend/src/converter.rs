//! Path-driven document converter
//!
//! Infers the [`DocumentFormat`] from a file extension, builds the matching
//! strategy from a [`ParserRegistry`] and parses the file.

use std::path::Path;
use std::time::Instant;

use insight_core::{DocumentFormat, ParseError, ParseOptions, ParseResult, Result, Source};

use crate::registry::{default_registry, ParserConfig, ParserRegistry};

/// Converter over a registry.
///
/// # Examples
///
/// ```rust
/// use insight_backend::DocumentConverter;
///
/// let dir = tempfile::tempdir()?;
/// let path = dir.path().join("notes.md");
/// std::fs::write(&path, "# Notes\n\nBody text.")?;
///
/// let result = DocumentConverter::new().convert(&path)?;
/// assert_eq!(result.parser(), Some("markdown"));
/// assert_eq!(result.items.len(), 2);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug, Clone)]
pub struct DocumentConverter {
    registry: ParserRegistry,
    config: ParserConfig,
}

impl Default for DocumentConverter {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentConverter {
    /// Converter over [`default_registry`].
    #[must_use = "creating a converter that is not used is a waste of resources"]
    pub fn new() -> Self {
        Self::with_registry(default_registry())
    }

    /// Converter over a caller-supplied registry.
    #[must_use = "creating a converter that is not used is a waste of resources"]
    pub fn with_registry(registry: ParserRegistry) -> Self {
        Self {
            registry,
            config: ParserConfig::new(),
        }
    }

    /// Construction options handed to every strategy the converter builds.
    #[must_use = "returns the updated converter"]
    pub fn with_parser_config(mut self, config: ParserConfig) -> Self {
        self.config = config;
        self
    }

    /// Registry the converter builds strategies from.
    #[inline]
    #[must_use]
    pub const fn registry(&self) -> &ParserRegistry {
        &self.registry
    }

    /// Format for a path.
    ///
    /// # Errors
    ///
    /// [`ParseError::FormatDetection`] when the extension is missing or unknown.
    pub fn detect_format(path: &Path) -> Result<DocumentFormat> {
        let ext = path
            .extension()
            .and_then(|s| s.to_str())
            .ok_or_else(|| {
                ParseError::FormatDetection(format!(
                    "No file extension found: {}",
                    path.display()
                ))
            })?;
        DocumentFormat::from_extension(ext)
            .ok_or_else(|| ParseError::FormatDetection(format!("Unsupported format: {ext}")))
    }

    /// Convert a file with default options.
    ///
    /// # Errors
    ///
    /// As [`DocumentConverter::convert_with`].
    pub fn convert<P: AsRef<Path>>(&self, path: P) -> Result<ParseResult> {
        self.convert_with(path, &ParseOptions::new())
    }

    /// Convert a file.
    ///
    /// The file's extension is passed on as the `extension` option unless
    /// the caller set one.
    ///
    /// # Errors
    ///
    /// [`ParseError::FormatDetection`] for an unknown extension, a registry
    /// error when the format's strategy is not registered, or whatever the
    /// strategy reports.
    pub fn convert_with<P: AsRef<Path>>(
        &self,
        path: P,
        options: &ParseOptions,
    ) -> Result<ParseResult> {
        let path = path.as_ref();
        let format = Self::detect_format(path)?;
        let parser = self.registry.create(format.parser_name(), &self.config)?;

        let mut options = options.clone();
        if options.extension.is_none() {
            options.extension = path
                .extension()
                .and_then(|ext| ext.to_str())
                .map(str::to_string);
        }

        let start = Instant::now();
        let result = parser.parse(Source::from(path), &options)?;
        log::debug!(
            "Converted {} as {:?} with '{}' in {:.2?} ({} items)",
            path.display(),
            format,
            parser.name(),
            start.elapsed(),
            result.items.len()
        );
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::Parser;
    use serde_json::json;

    struct Stub;

    impl Parser for Stub {
        fn name(&self) -> &'static str {
            "stub"
        }

        fn parse(&self, source: Source, options: &ParseOptions) -> Result<ParseResult> {
            let mut result = ParseResult::new(self.name());
            result.metadata.insert("kind".into(), json!(source.kind()));
            result
                .metadata
                .insert("extension".into(), json!(options.extension));
            Ok(result)
        }
    }

    /// Test 1: unknown and missing extensions are detection failures
    #[test]
    fn test_unknown_extension() {
        let converter = DocumentConverter::new();
        for name in ["archive.zip", "README"] {
            let err = converter.convert(name).unwrap_err();
            assert!(matches!(err, ParseError::FormatDetection(_)), "{name}");
        }
    }

    /// Test 2: format name routes to the registered strategy
    #[test]
    fn test_routes_through_registry() {
        let mut registry = ParserRegistry::new();
        registry.register("excel", |_| Ok(Stub)).unwrap();
        let converter = DocumentConverter::with_registry(registry);

        let result = converter.convert("/tmp/Budget.XLSX").unwrap();
        assert_eq!(result.parser(), Some("stub"));
        assert_eq!(result.metadata["kind"], json!("path"));
        assert_eq!(result.metadata["extension"], json!("XLSX"));

        let options = ParseOptions::new().with_extension(".xls");
        let result = converter.convert_with("/tmp/budget.xlsx", &options).unwrap();
        assert_eq!(result.metadata["extension"], json!(".xls"));
    }

    /// Test 3: known format without a registered strategy
    #[test]
    fn test_unregistered_format() {
        let converter = DocumentConverter::with_registry(ParserRegistry::new());
        let err = converter.convert("slides.pptx").unwrap_err();
        assert!(matches!(err, ParseError::RegistryLookup(_)));
    }

    /// Test 4: missing files surface from the strategy
    #[test]
    fn test_missing_file() {
        let err = DocumentConverter::new()
            .convert("/definitely/missing/report.pdf")
            .unwrap_err();
        assert!(matches!(err, ParseError::SourceNotFound(_)));
    }
}
