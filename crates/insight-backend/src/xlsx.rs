//! Microsoft Excel (.xlsx / .xls) backend using calamine
//!
//! Worksheets are read in workbook order and rows in sheet order. Each row
//! with at least one non-empty cell becomes one item whose text is the
//! normalized cell values joined by `" | "`.
//!
//! ## Format selection
//!
//! `.xlsx` and `.xls` need different decoders. The format is chosen from, in
//! order: the `extension` option, an exact `content_type` match, then the
//! source path (or stream name) suffix. Anything else is a format detection
//! error.

use std::io::Cursor;

use calamine::{Data, Range, Reader, Xls, Xlsx};
use chrono::NaiveDateTime;
use insight_core::{
    normalize_binary_source, normalize_whitespace, Metadata, ParseError, ParseItem, ParseOptions,
    ParseResult, Result, Source, MIME_XLS, MIME_XLSX,
};
use serde_json::json;

use crate::traits::Parser;
use crate::utils::{finish_result, metadata_from};

/// Supported workbook flavours.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExcelFormat {
    /// Office Open XML workbook
    Xlsx,
    /// BIFF8 (Excel 97-2003) workbook
    Xls,
}

impl ExcelFormat {
    /// Format for a dotted, lowercase extension.
    ///
    /// # Errors
    ///
    /// [`ParseError::FormatDetection`] for anything but `.xlsx` / `.xls`.
    pub fn from_extension(extension: &str) -> Result<Self> {
        match extension {
            ".xlsx" => Ok(Self::Xlsx),
            ".xls" => Ok(Self::Xls),
            other => Err(ParseError::FormatDetection(format!(
                "unsupported Excel extension: {other}"
            ))),
        }
    }

    /// Canonical content type.
    #[inline]
    #[must_use]
    pub const fn content_type(self) -> &'static str {
        match self {
            Self::Xlsx => MIME_XLSX,
            Self::Xls => MIME_XLS,
        }
    }

    /// Resolve the format from options and the source's own name.
    ///
    /// # Errors
    ///
    /// [`ParseError::FormatDetection`] when nothing names a format or the
    /// named extension is not a workbook.
    pub fn detect(options: &ParseOptions, source_hint: Option<String>) -> Result<Self> {
        let content_type_hint = options
            .essence_content_type()
            .and_then(|content_type| match content_type.as_str() {
                MIME_XLSX => Some(".xlsx".to_string()),
                MIME_XLS => Some(".xls".to_string()),
                _ => None,
            });
        let extension = options
            .dotted_extension()
            .or(content_type_hint)
            .or(source_hint)
            .ok_or_else(|| {
                ParseError::FormatDetection(
                    "unable to determine Excel extension; provide extension '.xlsx' or '.xls'"
                        .to_string(),
                )
            })?;
        Self::from_extension(&extension.to_ascii_lowercase())
    }
}

/// Rows extracted from one workbook.
#[derive(Debug, Default)]
struct SheetRows {
    items: Vec<ParseItem>,
    sheet_names: Vec<String>,
    row_stats: Metadata,
}

/// Excel strategy (`.xlsx` and `.xls`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ExcelBackend;

impl ExcelBackend {
    /// Create a new Excel backend
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    fn read_workbook<R>(workbook: &mut R) -> Result<SheetRows>
    where
        R: Reader<Cursor<Vec<u8>>>,
        R::Error: std::error::Error + Send + Sync + 'static,
    {
        let mut rows = SheetRows::default();
        for sheet_name in workbook.sheet_names() {
            let range = workbook
                .worksheet_range(&sheet_name)
                .map_err(|e| ParseError::decode("excel", e))?;
            let emitted = Self::append_rows(&mut rows.items, &sheet_name, &range);
            rows.row_stats.insert(sheet_name.clone(), json!(emitted));
            rows.sheet_names.push(sheet_name);
        }
        Ok(rows)
    }

    /// Append one item per non-empty row; returns how many were emitted.
    fn append_rows(items: &mut Vec<ParseItem>, sheet_name: &str, range: &Range<Data>) -> usize {
        let first_row = range.start().map_or(0, |(row, _)| row as usize);
        let mut emitted = 0;
        for (offset, cells) in range.rows().enumerate() {
            let row_number = first_row + offset + 1;
            let texts: Vec<String> = cells
                .iter()
                .filter_map(cell_text)
                .collect();
            if texts.is_empty() {
                continue;
            }
            let metadata = metadata_from([
                ("sheet", json!(sheet_name)),
                ("row", json!(row_number)),
                ("columns", json!(texts.len())),
            ]);
            items.push(
                ParseItem::new(
                    format!("{sheet_name}-row-{row_number}"),
                    normalize_whitespace(&texts.join(" | ")),
                    items.len() + 1,
                )
                .with_metadata(metadata),
            );
            emitted += 1;
        }
        emitted
    }
}

/// Rendering for date and time cells.
const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Normalized display text of a cell; `None` when empty.
///
/// Date-formatted serials and ISO timestamps render as `YYYY-MM-DD HH:MM:SS`,
/// booleans as `True` / `False`.
fn cell_text(cell: &Data) -> Option<String> {
    let text = match cell {
        Data::Empty => return None,
        Data::Bool(true) => "True".to_string(),
        Data::Bool(false) => "False".to_string(),
        Data::DateTime(serial) if serial.is_datetime() => serial
            .as_datetime()
            .map_or_else(|| cell.to_string(), |dt| dt.format(DATETIME_FORMAT).to_string()),
        Data::DateTimeIso(iso) => NaiveDateTime::parse_from_str(iso, "%Y-%m-%dT%H:%M:%S%.f")
            .map_or_else(|_| normalize_whitespace(iso), |dt| {
                dt.format(DATETIME_FORMAT).to_string()
            }),
        Data::String(s) | Data::DurationIso(s) => normalize_whitespace(s),
        other => normalize_whitespace(&other.to_string()),
    };
    (!text.is_empty()).then_some(text)
}

impl Parser for ExcelBackend {
    fn name(&self) -> &'static str {
        "excel"
    }

    fn parse(&self, source: Source, options: &ParseOptions) -> Result<ParseResult> {
        let source_hint = source.extension_hint();
        let input = normalize_binary_source(source)?;
        let format = ExcelFormat::detect(options, source_hint)?;
        log::debug!("Excel: reading {} bytes as {format:?}", input.data.len());

        let cursor = Cursor::new(input.data);
        let rows = match format {
            ExcelFormat::Xlsx => {
                let mut workbook: Xlsx<_> =
                    Xlsx::new(cursor).map_err(|e| ParseError::decode("excel", e))?;
                Self::read_workbook(&mut workbook)?
            }
            ExcelFormat::Xls => {
                let mut workbook: Xls<_> =
                    Xls::new(cursor).map_err(|e| ParseError::decode("excel", e))?;
                Self::read_workbook(&mut workbook)?
            }
        };

        let mut result = ParseResult::new(self.name());
        result.source = input.resolved_path;
        result.items = rows.items;
        result
            .metadata
            .insert("sheet_count".to_string(), json!(rows.sheet_names.len()));
        result
            .metadata
            .insert("sheet_names".to_string(), json!(rows.sheet_names));
        result
            .metadata
            .insert("row_stats".to_string(), rows.row_stats.into());
        Ok(finish_result(result, format.content_type(), options))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ooxml::test_support::build_package;

    const WORKBOOK: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"
  xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">
  <sheets>
    <sheet name="Data" sheetId="1" r:id="rId1"/>
    <sheet name="Blank" sheetId="2" r:id="rId2"/>
  </sheets>
</workbook>"#;

    const WORKBOOK_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
  <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/>
  <Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet2.xml"/>
</Relationships>"#;

    const ROOT_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
  <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/>
</Relationships>"#;

    const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
  <Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
  <Default Extension="xml" ContentType="application/xml"/>
  <Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/>
  <Override PartName="/xl/worksheets/sheet1.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/>
  <Override PartName="/xl/worksheets/sheet2.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/>
</Types>"#;

    const SHEET1: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">
  <sheetData>
    <row r="1">
      <c r="A1" t="inlineStr"><is><t>Name</t></is></c>
      <c r="B1" t="inlineStr"><is><t>Score</t></is></c>
    </row>
    <row r="2">
      <c r="A2" t="inlineStr"><is><t>  Alice   Smith </t></is></c>
      <c r="B2"><v>42</v></c>
      <c r="C2"><v>3.5</v></c>
    </row>
    <row r="4">
      <c r="A4" t="inlineStr"><is><t>   </t></is></c>
    </row>
    <row r="5">
      <c r="B5" t="inlineStr"><is><t>Bob</t></is></c>
    </row>
  </sheetData>
</worksheet>"#;

    const SHEET2: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">
  <sheetData/>
</worksheet>"#;

    fn workbook_bytes() -> Vec<u8> {
        build_package(&[
            ("[Content_Types].xml", CONTENT_TYPES),
            ("_rels/.rels", ROOT_RELS),
            ("xl/workbook.xml", WORKBOOK),
            ("xl/_rels/workbook.xml.rels", WORKBOOK_RELS),
            ("xl/worksheets/sheet1.xml", SHEET1),
            ("xl/worksheets/sheet2.xml", SHEET2),
        ])
    }

    const STYLES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">
  <cellXfs count="2">
    <xf numFmtId="0" fontId="0" fillId="0" borderId="0"/>
    <xf numFmtId="14" fontId="0" fillId="0" borderId="0" applyNumberFormat="1"/>
  </cellXfs>
</styleSheet>"#;

    const DATED_SHEET: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">
  <sheetData>
    <row r="1">
      <c r="A1" s="1"><v>45292</v></c>
      <c r="B1" t="b"><v>1</v></c>
      <c r="C1" t="b"><v>0</v></c>
      <c r="D1"><v>45292</v></c>
    </row>
  </sheetData>
</worksheet>"#;

    /// Test 1: rows become items, empty rows skipped
    #[test]
    fn test_xlsx_rows() {
        let options = ParseOptions::new().with_extension("xlsx");
        let result = ExcelBackend.parse_bytes(&workbook_bytes(), &options).unwrap();

        let summary: Vec<(&str, &str, usize)> = result
            .items
            .iter()
            .map(|i| (i.id.as_str(), i.text.as_deref().unwrap(), i.position))
            .collect();
        assert_eq!(
            summary,
            vec![
                ("Data-row-1", "Name | Score", 1),
                ("Data-row-2", "Alice Smith | 42 | 3.5", 2),
                ("Data-row-5", "Bob", 3),
            ]
        );
        assert_eq!(result.items[1].metadata["columns"], json!(3));
        assert_eq!(result.items[2].metadata["sheet"], json!("Data"));
        assert_eq!(result.metadata["sheet_names"], json!(["Data", "Blank"]));
        assert_eq!(result.metadata["sheet_count"], json!(2));
        assert_eq!(result.metadata["row_stats"], json!({"Data": 3, "Blank": 0}));
        assert_eq!(result.metadata["content_type"], json!(MIME_XLSX));
    }

    /// Test 2: content type selects the decoder when no extension is given
    #[test]
    fn test_content_type_detection() {
        let options = ParseOptions::new().with_content_type(MIME_XLSX);
        let result = ExcelBackend.parse_bytes(&workbook_bytes(), &options).unwrap();
        assert_eq!(result.items.len(), 3);
    }

    /// Test 3: bytes without any hint cannot be classified
    #[test]
    fn test_missing_extension() {
        let err = ExcelBackend
            .parse_bytes(&workbook_bytes(), &ParseOptions::new())
            .unwrap_err();
        assert!(matches!(err, ParseError::FormatDetection(_)));
    }

    /// Test 4: explicit extension beats content type, and must be a workbook
    #[test]
    fn test_extension_precedence() {
        let options = ParseOptions::new()
            .with_extension(".csv")
            .with_content_type(MIME_XLSX);
        let err = ExcelBackend.parse_bytes(&workbook_bytes(), &options).unwrap_err();
        assert!(matches!(err, ParseError::FormatDetection(ref m) if m.contains(".csv")));
    }

    /// Test 5: the path suffix is used when nothing else is given
    #[test]
    fn test_path_suffix_detection() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Report.XLSX");
        std::fs::write(&path, workbook_bytes()).unwrap();
        let result = ExcelBackend.parse_file(&path, &ParseOptions::new()).unwrap();
        assert_eq!(result.items.len(), 3);
        assert_eq!(result.source.as_deref(), Some(path.to_str().unwrap()));
    }

    /// Test 6: date-formatted serials and booleans render as display text
    #[test]
    fn test_date_and_bool_cells() {
        let bytes = build_package(&[
            ("[Content_Types].xml", CONTENT_TYPES),
            ("_rels/.rels", ROOT_RELS),
            ("xl/workbook.xml", WORKBOOK),
            ("xl/_rels/workbook.xml.rels", WORKBOOK_RELS),
            ("xl/styles.xml", STYLES),
            ("xl/worksheets/sheet1.xml", DATED_SHEET),
            ("xl/worksheets/sheet2.xml", SHEET2),
        ]);
        let options = ParseOptions::new().with_extension(".xlsx");
        let result = ExcelBackend.parse_bytes(&bytes, &options).unwrap();

        assert_eq!(result.items.len(), 1);
        assert_eq!(
            result.items[0].text.as_deref(),
            Some("2024-01-01 00:00:00 | True | False | 45292")
        );
        assert_eq!(result.items[0].metadata["columns"], json!(4));
    }

    /// Test 7: corrupt workbook is a decode failure
    #[test]
    fn test_corrupt_xls() {
        let options = ParseOptions::new().with_extension(".xls");
        let err = ExcelBackend.parse_bytes(b"garbage", &options).unwrap_err();
        assert!(matches!(err, ParseError::DecodeFailure { format: "excel", .. }));
    }

    #[test]
    fn test_cell_text() {
        assert_eq!(cell_text(&Data::Empty), None);
        assert_eq!(cell_text(&Data::Float(2.0)).as_deref(), Some("2"));
        assert_eq!(cell_text(&Data::Int(-7)).as_deref(), Some("-7"));
        assert_eq!(cell_text(&Data::Bool(true)).as_deref(), Some("True"));
        assert_eq!(cell_text(&Data::Bool(false)).as_deref(), Some("False"));
        assert_eq!(
            cell_text(&Data::DateTimeIso("2024-03-05T14:30:00".into())).as_deref(),
            Some("2024-03-05 14:30:00")
        );
        assert_eq!(
            cell_text(&Data::DateTimeIso("not a date".into())).as_deref(),
            Some("not a date")
        );
        assert_eq!(cell_text(&Data::String(" \t ".into())), None);
    }
}
