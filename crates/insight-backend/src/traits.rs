//! Core trait definitions for format strategies

use insight_core::{ParseOptions, ParseResult, Result, Source};

/// A format-specific extraction strategy.
///
/// Implementations hold no per-call mutable state, so one instance may be
/// shared across threads and called concurrently.
pub trait Parser: Send + Sync {
    /// Name recorded as `metadata.parser` in results.
    fn name(&self) -> &'static str;

    /// Extract content from `source`.
    ///
    /// # Errors
    ///
    /// Returns a [`insight_core::ParseError`]; no partial result is ever
    /// returned alongside an error.
    fn parse(&self, source: Source, options: &ParseOptions) -> Result<ParseResult>;

    /// Parse in-memory bytes.
    ///
    /// # Errors
    ///
    /// As [`Parser::parse`].
    fn parse_bytes(&self, data: &[u8], options: &ParseOptions) -> Result<ParseResult> {
        self.parse(Source::from(data), options)
    }

    /// Parse a file on disk.
    ///
    /// # Errors
    ///
    /// As [`Parser::parse`].
    fn parse_file<P: AsRef<std::path::Path>>(
        &self,
        path: P,
        options: &ParseOptions,
    ) -> Result<ParseResult>
    where
        Self: Sized,
    {
        self.parse(Source::from(path.as_ref()), options)
    }
}
