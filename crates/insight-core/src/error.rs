//! Error types for parse operations.
//!
//! Every strategy reports failures through [`ParseError`]. Decoder and
//! transcription errors from third-party crates never cross the strategy
//! boundary raw: they are wrapped in one of the variants below with the
//! original error kept as the `source()` for diagnostics.

use std::error::Error as StdError;
use std::path::Path;

use thiserror::Error;

/// Boxed cause carried by wrapping variants.
pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// Error kinds a caller can branch on.
///
/// # Examples
///
/// ```rust,ignore
/// use insight_core::ParseError;
///
/// match parser.parse(source, &options) {
///     Ok(result) => println!("{} items", result.items.len()),
///     Err(ParseError::SourceNotFound(path)) => eprintln!("missing: {path}"),
///     Err(ParseError::CapabilityUnavailable(what)) => eprintln!("install {what}"),
///     Err(e) => eprintln!("parse failed: {e}"),
/// }
/// ```
#[derive(Error, Debug)]
pub enum ParseError {
    /// A path-like input does not exist on the filesystem.
    #[error("Source not found: {0}")]
    SourceNotFound(String),

    /// The input shape matches none of the variants the strategy accepts.
    #[error("Unsupported source type: {0}")]
    UnsupportedSourceType(String),

    /// A readable stream produced something other than text or bytes.
    #[error("Unsupported stream payload: {0}")]
    UnsupportedStreamYield(String),

    /// No format, extension or content type could be determined.
    #[error("Format detection error: {0}")]
    FormatDetection(String),

    /// A format decoder rejected the input as structurally invalid.
    #[error("Failed to decode {format} input: {source}")]
    DecodeFailure {
        /// Format the decoder was reading (e.g. "pdf").
        format: &'static str,
        /// Decoder error.
        #[source]
        source: BoxError,
    },

    /// An external capability the strategy depends on is not available.
    #[error("Capability unavailable: {0}")]
    CapabilityUnavailable(String),

    /// An external decoder or transcriber failed on otherwise valid input.
    #[error("{operation} failed: {source}")]
    ExternalOperation {
        /// Human-readable operation name (e.g. "extract text from page 3").
        operation: String,
        /// Underlying failure.
        #[source]
        source: BoxError,
    },

    /// The requested strategy name is not registered.
    #[error("No parser registered under '{0}'")]
    RegistryLookup(String),

    /// A registration was attempted with an unusable name or constructor.
    #[error("Invalid parser registration: {0}")]
    InvalidRegistration(String),

    /// A recognized option carried a value of the wrong shape.
    #[error("Invalid parse options: {0}")]
    InvalidOptions(String),

    /// Reading an existing source failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ParseError {
    /// Missing-source error for a path.
    #[inline]
    #[must_use = "creates an error that should be returned or handled"]
    pub fn not_found(path: impl AsRef<Path>) -> Self {
        Self::SourceNotFound(path.as_ref().display().to_string())
    }

    /// Decode failure wrapping any decoder error.
    #[inline]
    #[must_use = "creates an error that should be returned or handled"]
    pub fn decode<E>(format: &'static str, source: E) -> Self
    where
        E: Into<BoxError>,
    {
        Self::DecodeFailure {
            format,
            source: source.into(),
        }
    }

    /// Decode failure described by a message only.
    #[inline]
    #[must_use = "creates an error that should be returned or handled"]
    pub fn decode_msg(format: &'static str, message: impl Into<String>) -> Self {
        Self::decode(format, message.into())
    }

    /// External operation failure wrapping any error.
    #[inline]
    #[must_use = "creates an error that should be returned or handled"]
    pub fn external<E>(operation: impl Into<String>, source: E) -> Self
    where
        E: Into<BoxError>,
    {
        Self::ExternalOperation {
            operation: operation.into(),
            source: source.into(),
        }
    }

    /// True for errors caused by the input rather than the environment.
    #[inline]
    #[must_use]
    pub const fn is_input_error(&self) -> bool {
        matches!(
            self,
            Self::SourceNotFound(_)
                | Self::UnsupportedSourceType(_)
                | Self::UnsupportedStreamYield(_)
                | Self::FormatDetection(_)
                | Self::DecodeFailure { .. }
                | Self::InvalidOptions(_)
        )
    }
}

/// Result alias used across the workspace.
pub type Result<T> = std::result::Result<T, ParseError>;
