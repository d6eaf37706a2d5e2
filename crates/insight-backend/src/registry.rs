//! Capability registry mapping format names to strategy constructors.
//!
//! The host application builds one registry at startup (usually with
//! [`default_registry`]) and then only reads from it. Registering a name
//! twice replaces the earlier constructor, which is how tests and alternate
//! implementations shadow the built-in strategies.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use insight_core::{Metadata, ParseError, Result};

use crate::audio::AudioBackend;
use crate::docx::DocxBackend;
use crate::html::HtmlBackend;
use crate::legacy::{DocBackend, PptBackend};
use crate::markdown::MarkdownBackend;
use crate::pdf::PdfBackend;
use crate::pptx::PptxBackend;
use crate::traits::Parser;
use crate::xlsx::ExcelBackend;

/// Construction options passed to a constructor.
pub type ParserConfig = Metadata;

/// Type-erased strategy constructor.
pub type ParserConstructor =
    Arc<dyn Fn(&ParserConfig) -> Result<Box<dyn Parser>> + Send + Sync + 'static>;

/// Name to constructor table.
///
/// # Examples
///
/// ```rust
/// use insight_backend::{default_registry, ParserConfig};
///
/// let registry = default_registry();
/// let parser = registry.create("html", &ParserConfig::new())?;
/// assert_eq!(parser.name(), "html");
/// # Ok::<(), insight_core::ParseError>(())
/// ```
#[derive(Clone, Default)]
pub struct ParserRegistry {
    constructors: HashMap<String, ParserConstructor>,
}

impl ParserRegistry {
    /// Empty registry.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a constructor under `name`, replacing any earlier one.
    ///
    /// The `P: Parser` bound is the capability check; names are matched
    /// case-insensitively.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::InvalidRegistration`] for a blank name.
    pub fn register<P, F>(&mut self, name: &str, constructor: F) -> Result<()>
    where
        P: Parser + 'static,
        F: Fn(&ParserConfig) -> Result<P> + Send + Sync + 'static,
    {
        let key = normalize_name(name);
        if key.is_empty() {
            return Err(ParseError::InvalidRegistration(
                "parser name must not be blank".to_string(),
            ));
        }
        let erased: ParserConstructor = Arc::new(move |config: &ParserConfig| {
            constructor(config).map(|parser| Box::new(parser) as Box<dyn Parser>)
        });
        if self.constructors.insert(key.clone(), erased).is_some() {
            log::debug!("Parser '{key}' re-registered; previous constructor replaced");
        }
        Ok(())
    }

    /// Register a stateless strategy built with `Default`.
    ///
    /// # Errors
    ///
    /// As [`ParserRegistry::register`].
    pub fn register_default<P>(&mut self, name: &str) -> Result<()>
    where
        P: Parser + Default + 'static,
    {
        self.register(name, |_| Ok(P::default()))
    }

    /// Constructor registered under `name`.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::RegistryLookup`] if nothing is registered.
    pub fn lookup(&self, name: &str) -> Result<ParserConstructor> {
        self.constructors
            .get(&normalize_name(name))
            .cloned()
            .ok_or_else(|| ParseError::RegistryLookup(name.to_string()))
    }

    /// Build the strategy registered under `name`.
    ///
    /// # Errors
    ///
    /// [`ParseError::RegistryLookup`] if nothing is registered, or whatever
    /// the constructor reports for unusable options.
    pub fn create(&self, name: &str, config: &ParserConfig) -> Result<Box<dyn Parser>> {
        let constructor = self.lookup(name)?;
        constructor(config)
    }

    /// True if `name` is registered.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.constructors.contains_key(&normalize_name(name))
    }

    /// Registered names, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.constructors.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl fmt::Debug for ParserRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParserRegistry")
            .field("names", &self.names())
            .finish()
    }
}

fn normalize_name(name: &str) -> String {
    name.trim().to_ascii_lowercase()
}

/// Registry holding every built-in strategy.
///
/// Names: `markdown`, `html`, `pdf`, `docx`, `doc`, `pptx`, `ppt`, `excel`,
/// `audio`. The audio constructor reads [`crate::audio::AudioConfig`] from
/// the construction options.
#[must_use]
pub fn default_registry() -> ParserRegistry {
    let mut registry = ParserRegistry::new();
    let registrations: [(&str, fn(&mut ParserRegistry, &str) -> Result<()>); 8] = [
        ("markdown", ParserRegistry::register_default::<MarkdownBackend>),
        ("html", ParserRegistry::register_default::<HtmlBackend>),
        ("pdf", ParserRegistry::register_default::<PdfBackend>),
        ("docx", ParserRegistry::register_default::<DocxBackend>),
        ("doc", ParserRegistry::register_default::<DocBackend>),
        ("pptx", ParserRegistry::register_default::<PptxBackend>),
        ("ppt", ParserRegistry::register_default::<PptBackend>),
        ("excel", ParserRegistry::register_default::<ExcelBackend>),
    ];
    for (name, register) in registrations {
        if let Err(e) = register(&mut registry, name) {
            log::warn!("Failed to register built-in parser '{name}': {e}");
        }
    }
    if let Err(e) = registry.register("audio", AudioBackend::from_config) {
        log::warn!("Failed to register built-in parser 'audio': {e}");
    }
    registry
}

#[cfg(test)]
mod tests {
    use super::*;
    use insight_core::{ParseOptions, ParseResult, Source};
    use serde_json::json;

    #[derive(Debug, Default)]
    struct EchoParser {
        label: String,
    }

    impl Parser for EchoParser {
        fn name(&self) -> &'static str {
            "echo"
        }

        fn parse(&self, _source: Source, _options: &ParseOptions) -> Result<ParseResult> {
            let mut result = ParseResult::new(self.name());
            result.metadata.insert("label".into(), json!(self.label));
            Ok(result)
        }
    }

    /// Test 1: register then lookup/create round trip
    #[test]
    fn test_register_lookup_create() {
        let mut registry = ParserRegistry::new();
        registry.register_default::<EchoParser>("x").unwrap();

        let constructor = registry.lookup("x").unwrap();
        let parser = constructor(&ParserConfig::new()).unwrap();
        assert_eq!(parser.name(), "echo");

        let parser = registry.create("x", &ParserConfig::new()).unwrap();
        assert_eq!(parser.name(), "echo");
    }

    /// Test 2: last registration wins
    #[test]
    fn test_last_registration_wins() {
        let mut registry = ParserRegistry::new();
        registry
            .register("x", |_| Ok(EchoParser { label: "first".into() }))
            .unwrap();
        registry
            .register("X", |_| Ok(EchoParser { label: "second".into() }))
            .unwrap();

        let parser = registry.create("x", &ParserConfig::new()).unwrap();
        let result = parser.parse(Source::content(""), &ParseOptions::new()).unwrap();
        assert_eq!(result.metadata["label"], json!("second"));
        assert_eq!(registry.names(), vec!["x"]);
    }

    /// Test 3: unknown names are lookup failures
    #[test]
    fn test_lookup_missing() {
        let registry = ParserRegistry::new();
        assert!(matches!(registry.lookup("rtf"), Err(ParseError::RegistryLookup(_))));
        assert!(matches!(
            registry.create("rtf", &ParserConfig::new()),
            Err(ParseError::RegistryLookup(_))
        ));
    }

    /// Test 4: blank names are rejected
    #[test]
    fn test_blank_name_rejected() {
        let mut registry = ParserRegistry::new();
        let err = registry.register_default::<EchoParser>("  ").unwrap_err();
        assert!(matches!(err, ParseError::InvalidRegistration(_)));
    }

    /// Test 5: constructor receives config
    #[test]
    fn test_constructor_reads_config() {
        let mut registry = ParserRegistry::new();
        registry
            .register("echo", |config: &ParserConfig| {
                let label = config
                    .get("label")
                    .and_then(|v| v.as_str())
                    .unwrap_or("none")
                    .to_string();
                Ok(EchoParser { label })
            })
            .unwrap();

        let mut config = ParserConfig::new();
        config.insert("label".into(), json!("configured"));
        let parser = registry.create("echo", &config).unwrap();
        let result = parser.parse(Source::content(""), &ParseOptions::new()).unwrap();
        assert_eq!(result.metadata["label"], json!("configured"));
    }

    /// Test 6: default registry covers every built-in format
    #[test]
    fn test_default_registry_names() {
        let registry = default_registry();
        assert_eq!(
            registry.names(),
            vec!["audio", "doc", "docx", "excel", "html", "markdown", "pdf", "ppt", "pptx"]
        );
        for name in registry.names() {
            let parser = registry.create(name, &ParserConfig::new()).unwrap();
            assert_eq!(parser.name(), name);
        }
    }

    #[test]
    fn test_registry_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ParserRegistry>();
    }
}
