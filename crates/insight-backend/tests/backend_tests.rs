//! End-to-end tests through the default registry.
//!
//! Fixtures are synthesized in-test: ZIP packages with `zip`, PDFs with
//! `lopdf`, WAV clips with `hound`.

use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use insight_audio::{AudioError, TranscriptionRequest};
use insight_backend::{
    default_registry, AudioBackend, DocumentConverter, Parser, ParserConfig, ParserRegistry,
};
use insight_core::{Metadata, ParseError, ParseOptions, ParseResult, Source};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};
use serde_json::json;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn create(registry: &ParserRegistry, name: &str) -> Box<dyn Parser> {
    registry.create(name, &ParserConfig::new()).unwrap()
}

fn texts(result: &ParseResult) -> Vec<&str> {
    result
        .items
        .iter()
        .filter_map(|item| item.text.as_deref())
        .collect()
}

fn assert_positions_increase(result: &ParseResult) {
    for pair in result.items.windows(2) {
        assert!(pair[0].position < pair[1].position);
    }
    for item in &result.items {
        if let Some(text) = &item.text {
            assert_eq!(item.length, Some(text.chars().count()));
        }
    }
}

fn zip_package(parts: &[(&str, &str)]) -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let options = zip::write::SimpleFileOptions::default();
    for (name, content) in parts {
        writer.start_file(*name, options).unwrap();
        writer.write_all(content.as_bytes()).unwrap();
    }
    writer.finish().unwrap().into_inner()
}

/// One-page PDF; `text` is drawn with a Type1 font when given.
fn pdf_bytes(text: Option<&str>) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });
    let operations = match text {
        Some(text) => vec![
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec!["F1".into(), 24.into()]),
            Operation::new("Td", vec![72.into(), 700.into()]),
            Operation::new("Tj", vec![Object::string_literal(text)]),
            Operation::new("ET", vec![]),
        ],
        None => Vec::new(),
    };
    let content = Content { operations };
    let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => content_id,
    });
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![page_id.into()],
            "Count" => 1,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut data = Vec::new();
    doc.save_to(&mut data).unwrap();
    data
}

fn write_wav(path: &Path) {
    let spec = hound::WavSpec {
        channels: 2,
        sample_rate: 16_000,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec).unwrap();
    for _ in 0..8_000 {
        writer.write_sample(500_i16).unwrap();
        writer.write_sample(-500_i16).unwrap();
    }
    writer.finalize().unwrap();
}

fn utf16le(text: &str) -> Vec<u8> {
    text.encode_utf16().flat_map(u16::to_le_bytes).collect()
}

/// Test 1: Markdown image resolved against base_url
#[test]
fn test_markdown_image_with_base_url() {
    init_logging();
    let parser = create(&default_registry(), "markdown");
    let options = ParseOptions::new().with_base_url("http://a.com/docs/");
    let result = parser.parse(Source::from("![alt](pic.jpg)"), &options).unwrap();

    assert_eq!(result.attachments.len(), 1);
    let url = result.attachments[0].url.as_deref().unwrap();
    assert!(url.starts_with("http://a.com/"));
    assert_eq!(result.parser(), Some("markdown"));
}

/// Test 2: HTML without block tags falls back to raw text
#[test]
fn test_html_fallback_extraction() {
    init_logging();
    let parser = create(&default_registry(), "html");
    let result = parser
        .parse(Source::from("Just plain text with no tags"), &ParseOptions::new())
        .unwrap();

    assert!(!result.items.is_empty());
    assert!(texts(&result).iter().any(|t| t.contains("Just plain text")));
}

/// Test 3: blank single-page PDF
#[test]
fn test_blank_pdf() {
    init_logging();
    let parser = create(&default_registry(), "pdf");
    let result = parser
        .parse(Source::from(pdf_bytes(None)), &ParseOptions::new())
        .unwrap();

    assert_eq!(result.metadata["page_count"], json!(1));
    assert!(result.items.is_empty());
    assert_eq!(result.metadata["content_type"], json!("application/pdf"));
}

/// Test 4: text PDF items carry their page
#[test]
fn test_text_pdf() {
    init_logging();
    let parser = create(&default_registry(), "pdf");
    let result = parser
        .parse(Source::from(pdf_bytes(Some("Hello PDF"))), &ParseOptions::new())
        .unwrap();

    assert!(result.full_text().contains("Hello PDF"));
    assert_eq!(result.items[0].id, "page-1-chunk-1");
    assert_eq!(result.items[0].metadata["page"], json!(1));
    assert_positions_increase(&result);
}

/// Test 5: non-PDF bytes are a decode failure
#[test]
fn test_pdf_garbage() {
    let parser = create(&default_registry(), "pdf");
    let err = parser
        .parse(Source::from(b"not a pdf".to_vec()), &ParseOptions::new())
        .unwrap_err();
    assert!(matches!(err, ParseError::DecodeFailure { format: "pdf", .. }));
}

/// Test 6: legacy .doc bytes
#[test]
fn test_legacy_doc_bytes() {
    init_logging();
    let parser = create(&default_registry(), "doc");
    let data = utf16le("Legacy doc paragraph\n第二段文本");
    let result = parser.parse(Source::from(data), &ParseOptions::new()).unwrap();

    let joined = texts(&result).concat();
    assert!(joined.contains("Legacy doc paragraph"));
    assert!(joined.contains("第二段文本"));
    assert_eq!(result.metadata["legacy_format"], json!(true));
}

/// Test 7: missing path-like strings fail for every path-accepting strategy
#[test]
fn test_missing_path_everywhere() {
    init_logging();
    let registry = default_registry();
    for name in registry.names() {
        let parser = create(&registry, name);
        let err = parser
            .parse(Source::from("no/such/dir/input.bin"), &ParseOptions::new())
            .unwrap_err();
        assert!(
            matches!(err, ParseError::SourceNotFound(_)),
            "{name} returned {err:?}"
        );
    }
}

/// Test 8: caller metadata wins, parser included when overridden
#[test]
fn test_metadata_override() {
    let registry = default_registry();
    let parser = create(&registry, "html");

    let mut caller = Metadata::new();
    caller.insert("content_type".into(), json!("text/x-custom"));
    caller.insert("tenant".into(), json!("acme"));
    let options = ParseOptions::new().with_metadata(caller.clone());
    let result = parser
        .parse(Source::content("<p>Hello</p>"), &options)
        .unwrap();
    assert_eq!(result.metadata["content_type"], json!("text/x-custom"));
    assert_eq!(result.metadata["tenant"], json!("acme"));
    assert_eq!(result.metadata["parser"], json!("html"));

    caller.insert("parser".into(), json!("mine"));
    let options = ParseOptions::new().with_metadata(caller);
    let result = parser
        .parse(Source::content("<p>Hello</p>"), &options)
        .unwrap();
    assert_eq!(result.metadata["parser"], json!("mine"));
}

/// Test 9: DOCX and PPTX read from disk through the converter
#[test]
fn test_converter_office_files() {
    init_logging();
    let dir = tempfile::tempdir().unwrap();

    let docx = dir.path().join("report.docx");
    std::fs::write(
        &docx,
        zip_package(&[(
            "word/document.xml",
            r#"<w:document xmlns:w="w"><w:body>
                <w:p><w:r><w:t>Quarterly report</w:t></w:r></w:p>
                <w:tbl><w:tr><w:tc><w:p><w:r><w:t>Q1</w:t></w:r></w:p></w:tc>
                <w:tc><w:p><w:r><w:t>42</w:t></w:r></w:p></w:tc></w:tr></w:tbl>
            </w:body></w:document>"#,
        )]),
    )
    .unwrap();

    let pptx = dir.path().join("deck.pptx");
    std::fs::write(
        &pptx,
        zip_package(&[(
            "ppt/slides/slide1.xml",
            r#"<p:sld xmlns:p="p" xmlns:a="a"><p:cSld><p:spTree><p:sp><p:txBody>
                <a:p><a:r><a:t>Roadmap</a:t></a:r></a:p>
            </p:txBody></p:sp></p:spTree></p:cSld></p:sld>"#,
        )]),
    )
    .unwrap();

    let converter = DocumentConverter::new();
    let result = converter.convert(&docx).unwrap();
    assert_eq!(texts(&result), vec!["Quarterly report", "Q1 42"]);
    assert_eq!(result.source.as_deref(), docx.to_str());
    assert_positions_increase(&result);

    let result = converter.convert(&pptx).unwrap();
    assert_eq!(result.parser(), Some("pptx"));
    assert_eq!(texts(&result), vec!["Roadmap"]);
}

/// Test 10: Excel without any format hint
#[test]
fn test_excel_requires_format() {
    let parser = create(&default_registry(), "excel");
    let err = parser
        .parse(Source::from(vec![0_u8; 16]), &ParseOptions::new())
        .unwrap_err();
    assert!(matches!(err, ParseError::FormatDetection(_)));
}

/// Test 11: audio from a named stream, temp file removed afterwards
#[test]
fn test_audio_stream_with_mock_recognizer() {
    init_logging();
    let dir = tempfile::tempdir().unwrap();
    let wav = dir.path().join("meeting.wav");
    write_wav(&wav);
    let data = std::fs::read(&wav).unwrap();

    let seen: Arc<Mutex<Option<PathBuf>>> = Arc::new(Mutex::new(None));
    let seen_in_recognizer = Arc::clone(&seen);
    let recognizer = move |path: &Path, request: &TranscriptionRequest| {
        *seen_in_recognizer.lock().unwrap() = Some(path.to_path_buf());
        assert_eq!(request.lang.as_deref(), Some("en"));
        Ok::<_, AudioError>("mock transcription".to_string())
    };

    let mut registry = ParserRegistry::new();
    registry
        .register("audio", move |config: &ParserConfig| {
            AudioBackend::from_config(config)
                .map(|backend| backend.with_recognizer(Arc::new(recognizer.clone())))
        })
        .unwrap();
    let mut config = ParserConfig::new();
    config.insert("lang".into(), json!("en"));
    let parser = registry.create("audio", &config).unwrap();

    let result = parser
        .parse(
            Source::named_reader("meeting.wav", Cursor::new(data)),
            &ParseOptions::new(),
        )
        .unwrap();

    assert_eq!(texts(&result), vec!["mock transcription"]);
    assert_eq!(result.segments.len(), 1);
    assert_eq!(result.segments[0].end_time, Some(0.5));
    let attachment = &result.attachments[0];
    assert_eq!(attachment.url.as_deref(), Some("meeting.wav"));
    assert!(attachment.data.is_none());
    assert_eq!(attachment.channel_count, Some(2));
    assert_eq!(result.metadata["channels"], json!(2));
    assert_eq!(result.metadata["frame_rate"], json!(16_000));
    assert_eq!(result.metadata["lang"], json!("en"));

    let staged = seen.lock().unwrap().clone().unwrap();
    assert_ne!(staged, wav);
    assert!(!staged.exists());
}

/// Test 12: unknown registry names
#[test]
fn test_unknown_parser_name() {
    let registry = default_registry();
    for name in ["epub", "", "PDFX"] {
        let created = registry.create(name, &ParserConfig::new());
        assert!(
            matches!(created, Err(ParseError::RegistryLookup(_))),
            "{name:?} should not resolve"
        );
    }
    assert!(registry.create("PDF", &ParserConfig::new()).is_ok());
}
