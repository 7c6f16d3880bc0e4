//! Native document-to-markdown engine
//!
//! PDF text comes from lopdf page by page (pdf-extract when lopdf cannot load
//! the file); scanned PDFs go through `PdfOcr` when OCR is requested. DOCX,
//! PPTX and HTML are read with docx-rs, zip + quick-xml and scraper.

use std::collections::HashMap;
use std::path::Path;

use regex::Regex;
use scraper::{ElementRef, Html, Node};

use crate::config::OcrConfig;
use crate::error::{Error, Result};
use crate::types::DocumentFormat;

use super::engine::{ConversionEngine, ConversionOptions, ConvertedDocument, ConvertedPage};
use super::ocr::PdfOcr;

/// Glyph names that leak into PDF text from some fonts
fn glyph_map() -> HashMap<&'static str, &'static str> {
    let mut map = HashMap::new();
    map.insert("uni2010", "-");
    map.insert("uni2013", "-");
    map.insert("uni2014", "--");
    map.insert("uni2018", "'");
    map.insert("uni2019", "'");
    map.insert("uni201C", "\"");
    map.insert("uni201D", "\"");
    map.insert("uni2022", "* ");
    map.insert("uni2026", "...");
    map.insert("uni00A0", " ");
    map
}

/// Normalise PDF text: glyph names, typographic punctuation, ligatures, NULs,
/// trailing whitespace and blank lines
fn cleanup_pdf_text(text: &str) -> String {
    let mut result = text.replace('\0', "");

    for (glyph_name, replacement) in glyph_map() {
        result = result.replace(&format!("({})", glyph_name), replacement);
        result = result.replace(&format!("<{}>", glyph_name), replacement);
    }

    result = result
        .replace(['\u{2010}', '\u{2011}', '\u{2013}'], "-")
        .replace('\u{2014}', "--")
        .replace(['\u{2018}', '\u{2019}'], "'")
        .replace(['\u{201C}', '\u{201D}'], "\"")
        .replace('\u{2022}', "* ")
        .replace('\u{2026}', "...")
        .replace('\u{00A0}', " ")
        .replace('\u{FB01}', "fi")
        .replace('\u{FB02}', "fl")
        .replace('\u{FB00}', "ff")
        .replace('\u{FB03}', "ffi")
        .replace('\u{FB04}', "ffl");

    // column layouts come out as long runs of spaces
    if let Ok(spaces) = Regex::new(r"[ \t]{2,}") {
        result = spaces.replace_all(&result, " ").into_owned();
    }

    result
        .lines()
        .map(|l| l.trim())
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Default conversion engine
#[derive(Debug, Clone)]
pub struct NativeEngine {
    ocr: PdfOcr,
}

impl NativeEngine {
    pub fn new(ocr_config: &OcrConfig) -> Self {
        Self {
            ocr: PdfOcr::new(ocr_config),
        }
    }

    fn convert_pdf(&self, path: &Path, options: &ConversionOptions) -> Result<ConvertedDocument> {
        if options.ocr {
            let pages = self.ocr.ocr_pages(path)?;
            return Ok(ConvertedDocument::new(
                pages
                    .iter()
                    .enumerate()
                    .map(|(i, text)| ConvertedPage::from_markdown(i as u32 + 1, cleanup_pdf_text(text)))
                    .collect(),
            ));
        }

        let data = std::fs::read(path)?;
        match lopdf::Document::load_mem(&data) {
            Ok(doc) => {
                let mut pages = Vec::new();
                for page_number in doc.get_pages().keys() {
                    let text = match doc.extract_text(&[*page_number]) {
                        Ok(text) => text,
                        Err(e) => {
                            tracing::debug!("Could not extract text for page {}: {}", page_number, e);
                            String::new()
                        }
                    };
                    pages.push(ConvertedPage::from_markdown(*page_number, cleanup_pdf_text(&text)));
                }
                Ok(ConvertedDocument::new(pages))
            }
            Err(e) => {
                tracing::warn!("lopdf could not load {}: {}, trying pdf-extract", path.display(), e);
                let text = pdf_extract::extract_text_from_mem(&data).map_err(|e| {
                    Error::conversion(display_name(path), format!("Failed to read PDF: {}", e))
                })?;
                Ok(ConvertedDocument::new(vec![ConvertedPage::from_markdown(
                    1,
                    cleanup_pdf_text(&text),
                )]))
            }
        }
    }

    fn convert_docx(&self, path: &Path, options: &ConversionOptions) -> Result<ConvertedDocument> {
        let data = std::fs::read(path)?;
        let docx = docx_rs::read_docx(&data)
            .map_err(|e| Error::conversion(display_name(path), e.to_string()))?;

        let mut blocks: Vec<String> = Vec::new();

        for child in docx.document.children {
            match child {
                docx_rs::DocumentChild::Paragraph(p) => {
                    let text = paragraph_text(&p);
                    let text = text.trim();
                    if text.is_empty() {
                        continue;
                    }
                    let style = p.property.style.as_ref().map(|s| s.val.as_str());
                    if let Some(level) = style.and_then(heading_level) {
                        blocks.push(format!("{} {}", "#".repeat(level), text));
                    } else if p.property.numbering_property.is_some() {
                        blocks.push(format!("- {}", text));
                    } else {
                        blocks.push(text.to_string());
                    }
                }
                docx_rs::DocumentChild::Table(table) => {
                    let mut rows = Vec::new();
                    for row in &table.rows {
                        #[allow(irrefutable_let_patterns)]
                        let docx_rs::TableChild::TableRow(row) = row else { continue };
                        let mut cells = Vec::new();
                        for cell in &row.cells {
                            #[allow(irrefutable_let_patterns)]
                            let docx_rs::TableRowChild::TableCell(cell) = cell else { continue };
                            let text = cell
                                .children
                                .iter()
                                .filter_map(|c| match c {
                                    docx_rs::TableCellContent::Paragraph(p) => Some(paragraph_text(p)),
                                    _ => None,
                                })
                                .map(|t| t.trim().to_string())
                                .filter(|t| !t.is_empty())
                                .collect::<Vec<_>>()
                                .join(" ");
                            cells.push(text);
                        }
                        rows.push(cells);
                    }
                    if let Some(rendered) = render_table(&rows, options.table_structure) {
                        blocks.push(rendered);
                    }
                }
                _ => {}
            }
        }

        Ok(single_page(blocks.join("\n\n")))
    }

    fn convert_pptx(&self, path: &Path) -> Result<ConvertedDocument> {
        use std::io::Read;

        let file = std::fs::File::open(path)?;
        let mut archive = zip::ZipArchive::new(file)
            .map_err(|e| Error::conversion(display_name(path), e.to_string()))?;

        let mut slide_names: Vec<String> = archive
            .file_names()
            .filter(|name| name.starts_with("ppt/slides/slide") && name.ends_with(".xml"))
            .map(|s| s.to_string())
            .collect();
        slide_names.sort_by_key(|name| slide_number(name));

        let mut pages = Vec::new();
        for (i, slide_name) in slide_names.iter().enumerate() {
            let mut xml = String::new();
            if let Ok(mut entry) = archive.by_name(slide_name) {
                if let Err(e) = entry.read_to_string(&mut xml) {
                    tracing::debug!("Could not read {}: {}", slide_name, e);
                }
            }
            let number = i as u32 + 1;
            let text = extract_text_from_slide_xml(&xml);
            let markdown = if text.is_empty() {
                String::new()
            } else {
                format!("## Slide {}\n\n{}", number, text)
            };
            pages.push(ConvertedPage::from_markdown(number, markdown));
        }

        Ok(ConvertedDocument::new(pages))
    }

    fn convert_html(&self, path: &Path, options: &ConversionOptions) -> Result<ConvertedDocument> {
        let raw = std::fs::read(path)?;
        Ok(single_page(html_to_markdown(
            &String::from_utf8_lossy(&raw),
            options.table_structure,
        )))
    }
}

impl ConversionEngine for NativeEngine {
    fn convert(
        &self,
        path: &Path,
        format: DocumentFormat,
        options: &ConversionOptions,
    ) -> Result<ConvertedDocument> {
        if !options.allows(format) {
            return Err(Error::UnsupportedFormat(format!(
                "{} ({})",
                display_name(path),
                format
            )));
        }

        match format {
            DocumentFormat::Pdf => self.convert_pdf(path, options),
            DocumentFormat::Docx => self.convert_docx(path, options),
            DocumentFormat::Pptx => self.convert_pptx(path),
            DocumentFormat::Html => self.convert_html(path, options),
            DocumentFormat::Unsupported => Err(Error::UnsupportedFormat(display_name(path))),
        }
    }

    fn name(&self) -> &str {
        "native"
    }
}

fn single_page(markdown: String) -> ConvertedDocument {
    ConvertedDocument::new(vec![ConvertedPage::from_markdown(1, markdown)])
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

/// `Heading1`..`Heading6` and `Title` style ids
fn heading_level(style: &str) -> Option<usize> {
    let style = style.to_lowercase();
    if style == "title" {
        return Some(1);
    }
    style
        .strip_prefix("heading")
        .and_then(|n| n.trim().parse::<usize>().ok())
        .filter(|n| (1..=6).contains(n))
}

fn paragraph_text(p: &docx_rs::Paragraph) -> String {
    let mut text = String::new();
    for child in &p.children {
        if let docx_rs::ParagraphChild::Run(run) = child {
            for child in &run.children {
                match child {
                    docx_rs::RunChild::Text(t) => text.push_str(&t.text),
                    docx_rs::RunChild::Tab(_) => text.push('\t'),
                    docx_rs::RunChild::Break(_) => text.push('\n'),
                    _ => {}
                }
            }
        }
    }
    text
}

fn slide_number(name: &str) -> u32 {
    name.trim_start_matches("ppt/slides/slide")
        .trim_end_matches(".xml")
        .parse()
        .unwrap_or(u32::MAX)
}

/// Collect `<a:t>` runs, one line per `<a:p>` paragraph
fn extract_text_from_slide_xml(xml: &str) -> String {
    use quick_xml::events::Event;
    use quick_xml::Reader;

    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut lines = Vec::new();
    let mut current_line: Vec<String> = Vec::new();
    let mut in_text_element = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) if e.local_name().as_ref() == b"t" => {
                in_text_element = true;
            }
            Ok(Event::Text(e)) if in_text_element => {
                if let Ok(text) = e.unescape() {
                    let text = text.trim();
                    if !text.is_empty() {
                        current_line.push(text.to_string());
                    }
                }
            }
            Ok(Event::End(e)) => match e.local_name().as_ref() {
                b"t" => in_text_element = false,
                b"p" => {
                    if !current_line.is_empty() {
                        lines.push(current_line.join(" "));
                        current_line.clear();
                    }
                }
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => {
                tracing::debug!("Slide XML error: {}", e);
                break;
            }
            _ => {}
        }
    }

    if !current_line.is_empty() {
        lines.push(current_line.join(" "));
    }

    lines.join("\n")
}

/// Render rows as a markdown table (first row is the header), or as plain
/// lines when table structure is off
fn render_table(rows: &[Vec<String>], table_structure: bool) -> Option<String> {
    let rows: Vec<&Vec<String>> = rows
        .iter()
        .filter(|r| r.iter().any(|c| !c.trim().is_empty()))
        .collect();
    if rows.is_empty() {
        return None;
    }

    if !table_structure {
        return Some(
            rows.iter()
                .map(|r| r.join(" "))
                .collect::<Vec<_>>()
                .join("\n"),
        );
    }

    let width = rows.iter().map(|r| r.len()).max().unwrap_or(0).max(1);
    let format_row = |row: &Vec<String>| {
        let mut cells: Vec<String> = row
            .iter()
            .map(|c| c.replace('|', "\\|").replace('\n', " "))
            .collect();
        cells.resize(width, String::new());
        format!("| {} |", cells.join(" | "))
    };

    let mut out = vec![format_row(rows[0])];
    out.push(format!("|{}", " --- |".repeat(width)));
    out.extend(rows[1..].iter().map(|r| format_row(r)));
    Some(out.join("\n"))
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn element_text(el: ElementRef<'_>) -> String {
    collapse_whitespace(&el.text().collect::<Vec<_>>().join(" "))
}

/// Convert an HTML page into markdown blocks
pub(crate) fn html_to_markdown(html: &str, table_structure: bool) -> String {
    let document = Html::parse_document(html);
    let root = document.root_element();
    let body = root
        .children()
        .filter_map(ElementRef::wrap)
        .find(|e| e.value().name() == "body")
        .unwrap_or(root);

    let mut blocks = Vec::new();
    render_html_block(body, table_structure, &mut blocks);
    blocks.join("\n\n")
}

fn render_html_block(el: ElementRef<'_>, table_structure: bool, out: &mut Vec<String>) {
    let name = el.value().name();
    match name {
        "script" | "style" | "head" | "noscript" | "template" => {}
        "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
            let level: usize = name[1..].parse().unwrap_or(1);
            let text = element_text(el);
            if !text.is_empty() {
                out.push(format!("{} {}", "#".repeat(level), text));
            }
        }
        "p" | "blockquote" | "caption" | "figcaption" => {
            let text = element_text(el);
            if !text.is_empty() {
                out.push(text);
            }
        }
        "li" => {
            let text = element_text(el);
            if !text.is_empty() {
                out.push(format!("- {}", text));
            }
        }
        "pre" => {
            let text: String = el.text().collect();
            if !text.trim().is_empty() {
                out.push(format!("```\n{}\n```", text.trim_end()));
            }
        }
        "table" => {
            let rows: Vec<Vec<String>> = el
                .descendants()
                .filter_map(ElementRef::wrap)
                .filter(|e| e.value().name() == "tr")
                .map(|tr| {
                    tr.children()
                        .filter_map(ElementRef::wrap)
                        .filter(|c| matches!(c.value().name(), "td" | "th"))
                        .map(element_text)
                        .collect()
                })
                .collect();
            if let Some(rendered) = render_table(&rows, table_structure) {
                out.push(rendered);
            }
        }
        _ => {
            for child in el.children() {
                match child.value() {
                    Node::Element(_) => {
                        if let Some(child_el) = ElementRef::wrap(child) {
                            render_html_block(child_el, table_structure, out);
                        }
                    }
                    Node::Text(text) => {
                        let text = collapse_whitespace(text);
                        if !text.is_empty() {
                            out.push(text);
                        }
                    }
                    _ => {}
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cleanup_pdf_text() {
        let cleaned = cleanup_pdf_text("  \u{FB01}nal  \n\n\0 \u{201C}quoted\u{201D} \n   ");
        assert_eq!(cleaned, "final\n\"quoted\"");

        let cleaned = cleanup_pdf_text("Revenue      2023\t\t  2024");
        assert_eq!(cleaned, "Revenue 2023 2024");
    }

    #[test]
    fn test_heading_level() {
        assert_eq!(heading_level("Heading1"), Some(1));
        assert_eq!(heading_level("heading3"), Some(3));
        assert_eq!(heading_level("Title"), Some(1));
        assert_eq!(heading_level("Heading9"), None);
        assert_eq!(heading_level("Normal"), None);
    }

    #[test]
    fn test_html_to_markdown() {
        let html = r#"<html><head><title>t</title><style>p{}</style></head><body>
            <h1>Annual   Report</h1>
            <p>Revenue grew.</p>
            <ul><li>One</li><li>Two</li></ul>
            <table><tr><th>Year</th><th>Sales</th></tr><tr><td>2024</td><td>10 | 12</td></tr></table>
            <script>var x = 1;</script>
        </body></html>"#;

        let md = html_to_markdown(html, true);
        assert_eq!(
            md,
            "# Annual Report\n\nRevenue grew.\n\n- One\n\n- Two\n\n| Year | Sales |\n| --- | --- |\n| 2024 | 10 \\| 12 |"
        );
    }

    #[test]
    fn test_html_tables_without_structure() {
        let html = "<body><table><tr><td>a</td><td>b</td></tr></table></body>";
        assert_eq!(html_to_markdown(html, false), "a b");
    }

    #[test]
    fn test_slide_xml_extraction() {
        let xml = r#"<p:sld xmlns:a="a" xmlns:p="p"><p:cSld><p:spTree>
            <p:sp><p:txBody><a:p><a:r><a:t>Quarterly</a:t></a:r><a:r><a:t>Update</a:t></a:r></a:p>
            <a:p><a:r><a:t>Sales &amp; Margin</a:t></a:r></a:p></p:txBody></p:sp>
        </p:spTree></p:cSld></p:sld>"#;
        assert_eq!(extract_text_from_slide_xml(xml), "Quarterly Update\nSales & Margin");
    }

    #[test]
    fn test_slide_number_ordering() {
        let mut names = vec![
            "ppt/slides/slide10.xml".to_string(),
            "ppt/slides/slide2.xml".to_string(),
            "ppt/slides/slide1.xml".to_string(),
        ];
        names.sort_by_key(|n| slide_number(n));
        assert_eq!(names[0], "ppt/slides/slide1.xml");
        assert_eq!(names[2], "ppt/slides/slide10.xml");
    }

    #[test]
    fn test_docx_conversion() {
        use docx_rs::{Docx, Paragraph, Run};

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("memo.docx");
        let file = std::fs::File::create(&path).unwrap();
        Docx::new()
            .add_paragraph(Paragraph::new().add_run(Run::new().add_text("Budget memo")).style("Heading1"))
            .add_paragraph(Paragraph::new().add_run(Run::new().add_text("Spending is flat.")))
            .build()
            .pack(file)
            .unwrap();

        let engine = NativeEngine::new(&OcrConfig::default());
        let doc = engine
            .convert(&path, DocumentFormat::Docx, &ConversionOptions::new(false))
            .unwrap();

        assert_eq!(doc.pages.len(), 1);
        assert_eq!(doc.first_page_content_units(), 2);
        assert_eq!(doc.export_markdown(), "# Budget memo\n\nSpending is flat.\n");
    }

    #[test]
    fn test_empty_html_has_no_content_units() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("blank.html");
        std::fs::write(&path, "<html><body>   </body></html>").unwrap();

        let engine = NativeEngine::new(&OcrConfig::default());
        let doc = engine
            .convert(&path, DocumentFormat::Html, &ConversionOptions::new(false))
            .unwrap();
        assert_eq!(doc.first_page_content_units(), 0);
    }

    #[test]
    fn test_legacy_binary_doc_is_conversion_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("old.doc");
        std::fs::write(&path, [0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1]).unwrap();

        let engine = NativeEngine::new(&OcrConfig::default());
        let err = engine
            .convert(&path, DocumentFormat::Docx, &ConversionOptions::new(false))
            .unwrap_err();
        assert!(err.is_retryable_conversion());
    }
}
