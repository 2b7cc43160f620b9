//! Conversation export rendering.
//!
//! # Responsibility
//! - Render exported conversation markdown as a standalone HTML page or a
//!   Word document.
//! - Name export files deterministically from their content.
//!
//! # Invariants
//! - Markup in the input is escaped before any formatting is applied, so
//!   user text can never inject tags.
//! - PDF conversion happens outside core; core only produces the HTML.

use docx_rs::{Docx, Paragraph, Run, Style, StyleType};
use sha2::{Digest, Sha256};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::io::Cursor;
use std::str::FromStr;

pub const DEFAULT_EXPORT_TITLE: &str = "Conversation Export";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ExportFormat {
    Html,
    #[default]
    Pdf,
    Docx,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            Self::Html => "html",
            Self::Pdf => "pdf",
            Self::Docx => "docx",
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            Self::Html => "text/html; charset=utf-8",
            Self::Pdf => "application/pdf",
            Self::Docx => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidExportFormat(pub String);

impl Display for InvalidExportFormat {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "unsupported export format `{}`; expected html|pdf|docx", self.0)
    }
}

impl Error for InvalidExportFormat {}

impl FromStr for ExportFormat {
    type Err = InvalidExportFormat;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "html" => Ok(Self::Html),
            "pdf" => Ok(Self::Pdf),
            "docx" => Ok(Self::Docx),
            _ => Err(InvalidExportFormat(value.to_string())),
        }
    }
}

#[derive(Debug)]
pub enum ExportError {
    Docx(String),
}

impl Display for ExportError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Docx(message) => write!(f, "docx rendering failed: {message}"),
        }
    }
}

impl Error for ExportError {}

/// Escapes `&`, `<`, `>` and quotes for text and attribute positions.
pub fn escape_html(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            other => escaped.push(other),
        }
    }
    escaped
}

/// Line-oriented markdown subset: `#`..`####` headings, `---` rules,
/// paragraphs, and `<br>` for blank lines.
pub fn markdown_to_html(markdown: &str, title: &str) -> String {
    let body = escape_html(markdown)
        .lines()
        .map(render_line)
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r#"<!DOCTYPE html>
<html>
<head>
<meta charset="UTF-8">
<title>{title}</title>
<style>
body {{ font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, Arial, sans-serif; max-width: 800px; margin: 40px auto; padding: 20px; line-height: 1.6; color: #333; }}
h1 {{ color: #2c3e50; border-bottom: 2px solid #3498db; padding-bottom: 10px; }}
h2 {{ color: #34495e; margin-top: 24px; }}
h3, h4 {{ color: #7f8c8d; }}
p {{ margin: 12px 0; }}
hr {{ border: none; border-top: 1px solid #ddd; margin: 24px 0; }}
</style>
</head>
<body>
{body}
</body>
</html>
"#,
        title = escape_html(title),
    )
}

fn render_line(line: &str) -> String {
    const HEADINGS: [(&str, &str); 4] = [("#### ", "h4"), ("### ", "h3"), ("## ", "h2"), ("# ", "h1")];
    for (prefix, tag) in HEADINGS {
        if let Some(text) = line.strip_prefix(prefix) {
            return format!("<{tag}>{text}</{tag}>");
        }
    }
    match line.trim() {
        "---" => "<hr>".to_string(),
        "" => "<br>".to_string(),
        _ => format!("<p>{line}</p>"),
    }
}

/// One block of a Word export.
#[derive(Debug, Clone, PartialEq, Eq)]
enum DocxBlock<'a> {
    Heading(u8, &'a str),
    Rule,
    Paragraph(&'a str),
}

const DOCX_RULE: &str = "__________________________________________________";

/// Blank lines are dropped; every other line is trimmed before classifying.
fn docx_blocks(markdown: &str) -> Vec<DocxBlock<'_>> {
    const HEADINGS: [(&str, u8); 4] = [("#### ", 4), ("### ", 3), ("## ", 2), ("# ", 1)];
    markdown
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| {
            for (prefix, level) in HEADINGS {
                if let Some(text) = line.strip_prefix(prefix) {
                    return DocxBlock::Heading(level, text);
                }
            }
            if line.starts_with("---") {
                DocxBlock::Rule
            } else {
                DocxBlock::Paragraph(line)
            }
        })
        .collect()
}

fn heading_style(level: u8) -> Style {
    let size = match level {
        1 => 32,
        2 => 28,
        3 => 26,
        _ => 24,
    };
    Style::new(format!("Heading{level}"), StyleType::Paragraph)
        .name(format!("Heading {level}"))
        .size(size)
        .bold()
}

/// Renders the same line-oriented subset as [`markdown_to_html`] into a
/// `.docx` package, opened by a `Title` paragraph.
pub fn markdown_to_docx(markdown: &str, title: &str) -> Result<Vec<u8>, ExportError> {
    let mut docx = Docx::new().add_style(
        Style::new("Title", StyleType::Paragraph)
            .name("Title")
            .size(48)
            .bold(),
    );
    for level in 1..=4 {
        docx = docx.add_style(heading_style(level));
    }
    docx = docx.add_paragraph(text_paragraph(title).style("Title"));

    for block in docx_blocks(markdown) {
        let paragraph = match block {
            DocxBlock::Heading(level, text) => {
                text_paragraph(text).style(&format!("Heading{level}"))
            }
            DocxBlock::Rule => text_paragraph(DOCX_RULE),
            DocxBlock::Paragraph(text) => text_paragraph(text),
        };
        docx = docx.add_paragraph(paragraph);
    }

    let mut buffer = Cursor::new(Vec::new());
    docx.build()
        .pack(&mut buffer)
        .map_err(|err| ExportError::Docx(err.to_string()))?;
    Ok(buffer.into_inner())
}

fn text_paragraph(text: &str) -> Paragraph {
    Paragraph::new().add_run(Run::new().add_text(text))
}

/// `conversation-<unix seconds>-<first 8 hex of sha256(markdown)>.<ext>`
pub fn export_filename(markdown: &str, format: ExportFormat, unix_seconds: u64) -> String {
    let digest = Sha256::digest(markdown.as_bytes());
    let short = hex::encode(&digest[..4]);
    format!("conversation-{unix_seconds}-{short}.{}", format.extension())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn markup_is_escaped_before_formatting() {
        let html = markdown_to_html("# <b>Title</b>\n<script>alert(1)</script>", "t");
        assert!(html.contains("<h1>&lt;b&gt;Title&lt;/b&gt;</h1>"));
        assert!(html.contains("<p>&lt;script&gt;alert(1)&lt;/script&gt;</p>"));
        assert!(!html.contains("<script>"));
    }

    #[test]
    fn line_kinds_render_to_matching_tags() {
        let html = markdown_to_html("## Sub\n#### Deep\n\n ---\nplain", "t");
        assert!(html.contains("<h2>Sub</h2>"));
        assert!(html.contains("<h4>Deep</h4>"));
        assert!(html.contains("<br>"));
        assert!(html.contains("<hr>"));
        assert!(html.contains("<p>plain</p>"));
    }

    #[test]
    fn heading_needs_space_after_hashes() {
        let html = markdown_to_html("#tag", "t");
        assert!(html.contains("<p>#tag</p>"));
    }

    #[test]
    fn title_is_escaped() {
        let html = markdown_to_html("x", "A & B");
        assert!(html.contains("<title>A &amp; B</title>"));
    }

    #[test]
    fn filename_uses_timestamp_and_content_hash() {
        let name = export_filename("hello", ExportFormat::Pdf, 1_700_000_000);
        // sha256("hello") starts with 2cf24dba.
        assert_eq!(name, "conversation-1700000000-2cf24dba.pdf");
    }

    #[test]
    fn format_parse_is_case_insensitive() {
        assert_eq!("HTML".parse::<ExportFormat>().unwrap(), ExportFormat::Html);
        assert_eq!(" pdf ".parse::<ExportFormat>().unwrap(), ExportFormat::Pdf);
        assert_eq!("Docx".parse::<ExportFormat>().unwrap(), ExportFormat::Docx);
        assert!("odt".parse::<ExportFormat>().is_err());
        assert_eq!(ExportFormat::default(), ExportFormat::Pdf);
    }

    #[test]
    fn docx_blocks_skip_blank_lines_and_classify_the_rest() {
        let blocks = docx_blocks("# Chat\n\n  ## Sub  \n--- \n#tag\n   \nhello <b>");
        assert_eq!(
            blocks,
            vec![
                DocxBlock::Heading(1, "Chat"),
                DocxBlock::Heading(2, "Sub"),
                DocxBlock::Rule,
                DocxBlock::Paragraph("#tag"),
                DocxBlock::Paragraph("hello <b>"),
            ]
        );
    }

    fn docx_document_xml(bytes: &[u8]) -> String {
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).expect("docx is a zip package");
        let mut entry = archive
            .by_name("word/document.xml")
            .expect("document part present");
        let mut xml = String::new();
        std::io::Read::read_to_string(&mut entry, &mut xml).expect("utf-8 document part");
        xml
    }

    #[test]
    fn docx_export_contains_title_headings_and_escaped_text() {
        let bytes = markdown_to_docx("# Chat\nuser: <b>hi</b> & bye\n---", "Weekly sync")
            .expect("docx renders");
        assert!(bytes.starts_with(b"PK"));

        let xml = docx_document_xml(&bytes);
        assert!(xml.contains("Weekly sync"));
        assert!(xml.contains("Heading1"));
        assert!(xml.contains("Chat"));
        assert!(xml.contains("user: &lt;b"));
        assert!(xml.contains("&amp; bye"));
        assert!(xml.contains(DOCX_RULE));
        assert!(!xml.contains("<b>hi"));
    }
}
