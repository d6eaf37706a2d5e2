//! Shared utility functions for strategy implementations.
//!
//! URL resolution, image MIME detection, lenient attribute parsing and the
//! final metadata overlay every strategy applies before returning.

use insight_core::{Metadata, ParseOptions, ParseResult};
use url::{Position, Url};

// ========== Image MIME Type Constants ==========

/// MIME type for PNG images.
pub const MIME_IMAGE_PNG: &str = "image/png";

/// MIME type for JPEG images.
pub const MIME_IMAGE_JPEG: &str = "image/jpeg";

/// MIME type for GIF images.
pub const MIME_IMAGE_GIF: &str = "image/gif";

/// MIME type for BMP images.
pub const MIME_IMAGE_BMP: &str = "image/bmp";

/// MIME type for SVG images.
pub const MIME_IMAGE_SVG: &str = "image/svg+xml";

/// MIME type for TIFF images.
pub const MIME_IMAGE_TIFF: &str = "image/tiff";

/// MIME type for WebP images.
pub const MIME_IMAGE_WEBP: &str = "image/webp";

/// Detect image MIME type from a file extension.
///
/// # Examples
///
/// ```
/// use insight_backend::utils::{mime_type_from_extension, MIME_IMAGE_PNG};
///
/// assert_eq!(mime_type_from_extension("PNG"), Some(MIME_IMAGE_PNG));
/// assert_eq!(mime_type_from_extension("unknown"), None);
/// ```
#[inline]
#[must_use = "returns the detected MIME type"]
pub fn mime_type_from_extension(extension: &str) -> Option<&'static str> {
    match extension.to_ascii_lowercase().as_str() {
        "png" => Some(MIME_IMAGE_PNG),
        "jpg" | "jpeg" => Some(MIME_IMAGE_JPEG),
        "gif" => Some(MIME_IMAGE_GIF),
        "bmp" => Some(MIME_IMAGE_BMP),
        "svg" => Some(MIME_IMAGE_SVG),
        "tif" | "tiff" => Some(MIME_IMAGE_TIFF),
        "webp" => Some(MIME_IMAGE_WEBP),
        _ => None,
    }
}

/// Detect image MIME type from a URL or path, ignoring query and fragment.
#[must_use = "returns the detected MIME type"]
pub fn mime_type_from_url(url: &str) -> Option<&'static str> {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    let file_name = path.rsplit('/').next().unwrap_or(path);
    let (_, extension) = file_name.rsplit_once('.')?;
    mime_type_from_extension(extension)
}

/// Placeholder origin for joining against bases that are not absolute URLs.
const RELATIVE_ORIGIN: &str = "http://relative.invalid/";

/// Resolve `href` against `base`.
///
/// Standard base + relative joining: dot segments are removed and a bare
/// query or fragment attaches to the base document. A base that is not an
/// absolute URL (such as `docs/` or `/static/`) is joined the same way and
/// the result stays relative. Without a base, `href` is returned unchanged.
///
/// # Examples
///
/// ```
/// use insight_backend::utils::resolve_url;
///
/// assert_eq!(resolve_url(Some("http://a.com/docs/"), "pic.jpg"), "http://a.com/docs/pic.jpg");
/// assert_eq!(resolve_url(Some("http://a.com/docs/"), "/pic.jpg"), "http://a.com/pic.jpg");
/// assert_eq!(resolve_url(Some("/static/docs/"), "../pic.jpg"), "/static/pic.jpg");
/// assert_eq!(resolve_url(None, "pic.jpg"), "pic.jpg");
/// ```
#[must_use]
pub fn resolve_url(base: Option<&str>, href: &str) -> String {
    let Some(base) = base.map(str::trim).filter(|b| !b.is_empty()) else {
        return href.to_string();
    };
    if let Ok(base_url) = Url::parse(base) {
        return base_url
            .join(href)
            .map_or_else(|_| href.to_string(), String::from);
    }
    if Url::parse(href).is_ok() {
        return href.to_string();
    }
    join_relative(base, href).unwrap_or_else(|| href.to_string())
}

/// Join under [`RELATIVE_ORIGIN`], then strip the placeholder back off.
fn join_relative(base: &str, href: &str) -> Option<String> {
    let origin = Url::parse(RELATIVE_ORIGIN).ok()?;
    let joined = origin.join(base).ok()?.join(href).ok()?;
    if joined.host_str() != origin.host_str() {
        // Network-path reference (`//host/...`)
        return joined.as_str().strip_prefix("http:").map(str::to_string);
    }
    let path = &joined[Position::BeforePath..];
    if base.starts_with('/') || href.starts_with('/') {
        Some(path.to_string())
    } else {
        Some(path.trim_start_matches('/').to_string())
    }
}

/// Parse a non-negative integer attribute; anything else is `None`.
///
/// Negative values are dropped along with percentages and other non-numeric
/// text.
#[inline]
#[must_use]
pub fn parse_dimension(value: Option<&str>) -> Option<u32> {
    value.and_then(|v| v.trim().parse::<u32>().ok())
}

/// Record the declared content type and overlay caller metadata.
#[must_use]
pub fn finish_result(
    mut result: ParseResult,
    content_type: &str,
    options: &ParseOptions,
) -> ParseResult {
    result
        .metadata
        .insert("content_type".to_string(), content_type.into());
    result.with_caller_metadata(&options.metadata)
}

/// Build a metadata map from key/value pairs.
#[must_use]
pub fn metadata_from<I, K>(pairs: I) -> Metadata
where
    I: IntoIterator<Item = (K, serde_json::Value)>,
    K: Into<String>,
{
    pairs.into_iter().map(|(k, v)| (k.into(), v)).collect()
}
