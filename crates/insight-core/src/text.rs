//! Text helpers shared by the strategies.
//!
//! [`build_items_from_chunks`] is the funnel every simple strategy routes its
//! chunks through: it owns id assignment, position counting and length
//! computation, so those invariants hold without each strategy re-checking.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::types::{Metadata, ParseItem};

static PARAGRAPH_BREAK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\n{2,}").expect("Invalid paragraph break regex"));

/// Callback producing per-item metadata from `(chunk index, normalized text)`.
pub type MetadataFn<'a> = &'a dyn Fn(usize, &str) -> Metadata;

/// Collapse whitespace runs to one space and trim both ends.
#[must_use]
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Split text on blank lines into normalized, non-empty paragraphs.
#[must_use]
pub fn split_into_paragraphs(text: &str) -> Vec<String> {
    let unified = text.replace("\r\n", "\n").replace('\r', "\n");
    PARAGRAPH_BREAK
        .split(&unified)
        .map(normalize_whitespace)
        .filter(|paragraph| !paragraph.is_empty())
        .collect()
}

/// Turn raw chunks into items.
///
/// Chunk `n` (1-based, counting skipped chunks) gets id `chunk-<n>`.
/// Positions start at `start_index` and advance only for emitted items.
#[must_use]
pub fn build_items_from_chunks<I, S>(
    chunks: I,
    start_index: usize,
    metadata_fn: Option<MetadataFn<'_>>,
) -> Vec<ParseItem>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut position = start_index;
    let mut items = Vec::new();
    for (offset, chunk) in chunks.into_iter().enumerate() {
        let index = offset + 1;
        let text = normalize_whitespace(chunk.as_ref());
        if text.is_empty() {
            continue;
        }
        let metadata = metadata_fn.map_or_else(Metadata::new, |f| f(index, &text));
        items.push(
            ParseItem::new(format!("chunk-{index}"), text, position).with_metadata(metadata),
        );
        position += 1;
    }
    items
}

/// Position the next item appended after `items` should take.
#[inline]
#[must_use]
pub fn next_position(items: &[ParseItem]) -> usize {
    items.last().map_or(1, |item| item.position + 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_normalize_whitespace() {
        assert_eq!(normalize_whitespace("  a \t b\n\nc  "), "a b c");
        assert_eq!(normalize_whitespace("\u{3000}全角\u{3000}"), "全角");
        assert_eq!(normalize_whitespace(" \n\t "), "");
    }

    #[test]
    fn test_split_handles_all_line_endings() {
        let text = "First\r\n\r\nSecond\r\rThird\n\n\n\nFourth";
        assert_eq!(
            split_into_paragraphs(text),
            vec!["First", "Second", "Third", "Fourth"]
        );
    }

    #[test]
    fn test_split_keeps_single_newlines_inside_paragraph() {
        assert_eq!(split_into_paragraphs("line one\nline two"), vec!["line one line two"]);
    }

    #[test]
    fn test_split_drops_blank_pieces() {
        assert!(split_into_paragraphs("\n\n   \n\n").is_empty());
    }

    #[test]
    fn test_build_items_skips_empty_chunks() {
        let items = build_items_from_chunks(["alpha", "   ", "beta  gamma"], 1, None);
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].id, "chunk-1");
        assert_eq!(items[0].position, 1);
        assert_eq!(items[1].id, "chunk-3");
        assert_eq!(items[1].position, 2);
        assert_eq!(items[1].text.as_deref(), Some("beta gamma"));
        assert_eq!(items[1].length, Some(10));
    }

    #[test]
    fn test_build_items_start_index_and_metadata() {
        let page = |index: usize, text: &str| {
            let mut metadata = Metadata::new();
            metadata.insert("page".into(), json!(2));
            metadata.insert("chunk".into(), json!(index));
            metadata.insert("chars".into(), json!(text.len()));
            metadata
        };
        let items = build_items_from_chunks(vec!["x".to_string()], 7, Some(&page));
        assert_eq!(items[0].position, 7);
        assert_eq!(items[0].metadata["page"], json!(2));
        assert_eq!(items[0].metadata["chunk"], json!(1));
    }

    #[test]
    fn test_next_position() {
        assert_eq!(next_position(&[]), 1);
        let items = build_items_from_chunks(["a", "b"], 4, None);
        assert_eq!(next_position(&items), 6);
    }
}
