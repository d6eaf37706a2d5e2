//! Legacy Office binaries (.doc / .ppt)
//!
//! No structured reader is used; both strategies run
//! [`insight_legacy::carve_text`] over the raw bytes and emit one item per
//! recovered fragment. Results are flagged `legacy_format = true`.

use insight_core::{
    build_items_from_chunks, normalize_binary_source, Metadata, ParseOptions, ParseResult, Result,
    Source, MIME_DOC, MIME_PPT,
};
use insight_legacy::{carve_text, has_cfb_signature};
use serde_json::json;

use crate::traits::Parser;
use crate::utils::finish_result;

fn parse_legacy(
    parser: &'static str,
    content_type: &str,
    source: Source,
    options: &ParseOptions,
) -> Result<ParseResult> {
    let input = normalize_binary_source(source)?;
    let ole_container = has_cfb_signature(&input.data);
    if !ole_container {
        log::debug!("{parser}: input lacks the OLE2 signature, carving anyway");
    }
    let carved = carve_text(&input.data);

    let segment = |index: usize, _: &str| {
        let mut metadata = Metadata::new();
        metadata.insert("segment".to_string(), json!(index));
        metadata
    };
    let items = build_items_from_chunks(&carved.fragments, 1, Some(&segment));
    log::debug!(
        "{parser}: {} fragments carved as {}",
        items.len(),
        carved.encoding
    );

    let mut result = ParseResult::new(parser);
    result.source = input.resolved_path;
    result
        .metadata
        .insert("legacy_format".to_string(), json!(true));
    result
        .metadata
        .insert("chunk_count".to_string(), json!(items.len()));
    result
        .metadata
        .insert("encoding".to_string(), json!(carved.encoding.label()));
    result
        .metadata
        .insert("ole_container".to_string(), json!(ole_container));
    result.items = items;
    Ok(finish_result(result, content_type, options))
}

/// Word 97-2003 strategy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct DocBackend;

impl Parser for DocBackend {
    fn name(&self) -> &'static str {
        "doc"
    }

    fn parse(&self, source: Source, options: &ParseOptions) -> Result<ParseResult> {
        parse_legacy(self.name(), MIME_DOC, source, options)
    }
}

/// `PowerPoint` 97-2003 strategy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct PptBackend;

impl Parser for PptBackend {
    fn name(&self) -> &'static str {
        "ppt"
    }

    fn parse(&self, source: Source, options: &ParseOptions) -> Result<ParseResult> {
        parse_legacy(self.name(), MIME_PPT, source, options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use insight_core::ParseError;
    use insight_legacy::CFB_MAGIC_SIGNATURE;

    fn utf16le(text: &str) -> Vec<u8> {
        text.encode_utf16().flat_map(u16::to_le_bytes).collect()
    }

    /// Test 1: UTF-16LE doc text with CJK
    #[test]
    fn test_doc_utf16_with_cjk() {
        let data = utf16le("Legacy doc paragraph\n第二段文本");
        let result = DocBackend.parse_bytes(&data, &ParseOptions::new()).unwrap();

        let joined = result.full_text();
        assert!(joined.contains("Legacy doc paragraph"));
        assert!(joined.contains("第二段文本"));
        assert_eq!(result.metadata["legacy_format"], json!(true));
        assert_eq!(result.metadata["encoding"], json!("utf-16-le"));
        assert_eq!(result.metadata["content_type"], json!("application/msword"));
        assert_eq!(result.metadata["ole_container"], json!(false));
    }

    /// Test 2: fragments become items with segment metadata
    #[test]
    fn test_ppt_fragments() {
        let mut data = CFB_MAGIC_SIGNATURE.to_vec();
        data.extend([0u8; 8]);
        data.extend(utf16le("Slide title"));
        data.extend([0u8; 8]);
        data.extend(utf16le("Speaker notes here"));
        let result = PptBackend.parse_bytes(&data, &ParseOptions::new()).unwrap();

        let texts: Vec<&str> = result.items.iter().filter_map(|i| i.text.as_deref()).collect();
        assert!(texts.contains(&"Slide title"));
        assert!(texts.contains(&"Speaker notes here"));
        assert_eq!(result.metadata["parser"], json!("ppt"));
        assert_eq!(result.metadata["ole_container"], json!(true));
        assert_eq!(result.metadata["chunk_count"], json!(result.items.len()));
        for item in &result.items {
            assert!(item.metadata["segment"].as_u64().unwrap() >= 1);
        }
        let positions: Vec<usize> = result.items.iter().map(|i| i.position).collect();
        assert_eq!(positions, (1..=result.items.len()).collect::<Vec<_>>());
    }

    /// Test 3: 8-bit text wins as Latin-1
    #[test]
    fn test_latin1_text() {
        let data = b"Plain ASCII body\x00\x01\x02Second run of text".to_vec();
        let result = DocBackend.parse_bytes(&data, &ParseOptions::new()).unwrap();
        assert_eq!(result.metadata["encoding"], json!("latin-1"));
        let texts: Vec<&str> = result.items.iter().filter_map(|i| i.text.as_deref()).collect();
        assert_eq!(texts, vec!["Plain ASCII body", "Second run of text"]);
    }

    /// Test 4: literal content is rejected
    #[test]
    fn test_literal_content_rejected() {
        let err = DocBackend
            .parse(Source::content("not bytes"), &ParseOptions::new())
            .unwrap_err();
        assert!(matches!(err, ParseError::UnsupportedSourceType(_)));
    }
}
