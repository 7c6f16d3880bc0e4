//! Markdown loader: reads a converted markdown file as one plain-text document

use pulldown_cmark::{Event, Options, Parser, Tag, TagEnd};
use scraper::Html;
use std::path::Path;

use crate::error::{Error, Result};

/// Text loaded from a markdown artifact
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedDocument {
    /// Plain text, one element per blank-line separated block
    pub text: String,
    /// Source path as a string, kept for logging
    pub source: String,
}

/// Loads `.md` files and renders them to plain-text elements
pub struct MarkdownLoader;

impl MarkdownLoader {
    /// Load a markdown file. Rejects paths that are not existing `.md` /
    /// `.markdown` files and content that is not UTF-8.
    pub fn load(path: &Path) -> Result<LoadedDocument> {
        let is_markdown = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| matches!(e.to_lowercase().as_str(), "md" | "markdown"))
            .unwrap_or(false);
        if !is_markdown {
            return Err(Error::load(path, "not a markdown file"));
        }
        if !path.is_file() {
            return Err(Error::load(path, "file does not exist"));
        }

        let bytes = std::fs::read(path)?;
        let raw = String::from_utf8(bytes)
            .map_err(|e| Error::load(path, format!("invalid UTF-8: {}", e)))?;

        Ok(LoadedDocument {
            text: Self::render_text(&raw),
            source: path.display().to_string(),
        })
    }

    /// Render markdown into plain text: headings, paragraphs, list items,
    /// table rows and code blocks become blank-line separated elements
    pub fn render_text(markdown: &str) -> String {
        let parser = Parser::new_ext(markdown, Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH);

        let mut elements: Vec<String> = Vec::new();
        let mut current = String::new();
        let mut in_code_block = false;
        let mut html_block = String::new();
        let mut in_html_block = false;

        for event in parser {
            match event {
                Event::Start(Tag::HtmlBlock) => {
                    flush(&mut current, &mut elements);
                    in_html_block = true;
                }
                Event::End(TagEnd::HtmlBlock) => {
                    in_html_block = false;
                    current.push_str(&html_text(&html_block));
                    html_block.clear();
                    flush(&mut current, &mut elements);
                }
                Event::Start(Tag::CodeBlock(_)) => {
                    flush(&mut current, &mut elements);
                    in_code_block = true;
                }
                Event::End(TagEnd::CodeBlock) => {
                    in_code_block = false;
                    flush(&mut current, &mut elements);
                }
                Event::Start(Tag::Item) => flush(&mut current, &mut elements),
                Event::End(
                    TagEnd::Paragraph
                    | TagEnd::Heading(_)
                    | TagEnd::Item
                    | TagEnd::TableHead
                    | TagEnd::TableRow,
                ) => flush(&mut current, &mut elements),
                Event::End(TagEnd::TableCell) => current.push(' '),
                Event::Text(text) | Event::Code(text) => {
                    current.push_str(&text);
                }
                Event::SoftBreak => current.push(if in_code_block { '\n' } else { ' ' }),
                Event::HardBreak => current.push('\n'),
                // block HTML arrives line by line; parse it once complete
                Event::Html(html) if in_html_block => html_block.push_str(&html),
                Event::Html(html) | Event::InlineHtml(html) => {
                    current.push_str(&html_text(&html));
                }
                _ => {}
            }
        }
        flush(&mut current, &mut elements);

        elements.join("\n\n")
    }
}

fn flush(current: &mut String, elements: &mut Vec<String>) {
    let text = current.trim();
    if !text.is_empty() {
        elements.push(text.to_string());
    }
    current.clear();
}

/// Text content of an HTML fragment, entities decoded, whitespace collapsed
fn html_text(html: &str) -> String {
    let fragment = Html::parse_fragment(html);
    let text: String = fragment.root_element().text().collect();
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
