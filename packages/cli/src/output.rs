//! Text and JSON formatting for command output.

use console::style;
use textwrap::{fill, Options};

use nusach_engine::{Diagnostics, Paragraph, ParagraphStream};

use crate::error::Result;

/// Indentation per outline level.
const LEVEL_INDENT: &str = "  ";

/// Format one paragraph, wrapped at `width`.
///
/// The number hangs in front of the first line; following lines, including
/// the body under a title, align with the text after the number.
pub fn format_paragraph(paragraph: &Paragraph, width: usize) -> String {
    let indent = LEVEL_INDENT.repeat(paragraph.depth);
    let initial = format!("{indent}{}. ", paragraph.number);
    let hanging = " ".repeat(initial.chars().count());

    paragraph
        .text
        .split('\n')
        .enumerate()
        .map(|(i, line)| {
            let first = if i == 0 { initial.as_str() } else { hanging.as_str() };
            let options = Options::new(width)
                .initial_indent(first)
                .subsequent_indent(&hanging);
            fill(line, options)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Format an assembled document as wrapped plain text.
pub fn format_text(stream: &ParagraphStream, width: usize) -> String {
    stream
        .iter()
        .map(|p| format_paragraph(p, width))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Format an assembled document, diagnostics included, as JSON.
pub fn format_json(stream: &ParagraphStream) -> Result<String> {
    Ok(serde_json::to_string_pretty(stream)?)
}

/// Print diagnostics to stderr.
pub fn print_diagnostics(diagnostics: &Diagnostics) {
    for diagnostic in diagnostics {
        eprintln!(
            "{} {diagnostic}",
            style("warning:").for_stderr().yellow().bold()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn paragraph(number: &str, depth: usize, text: &str) -> Paragraph {
        Paragraph {
            number: number.to_string(),
            depth,
            text: text.to_string(),
            title: String::new(),
            body: text.to_string(),
            section_id: number.to_string(),
        }
    }

    #[test]
    fn test_format_short_paragraph() {
        assert_eq!(format_paragraph(&paragraph("1", 0, "היקף"), 80), "1. היקף");
        assert_eq!(
            format_paragraph(&paragraph("1.2", 1, "היקף"), 80),
            "  1.2. היקף"
        );
    }

    #[test]
    fn test_format_wraps_with_hanging_indent() {
        let text = "alpha beta gamma delta";
        assert_eq!(
            format_paragraph(&paragraph("1", 0, text), 14),
            "1. alpha beta\n   gamma delta"
        );
    }

    #[test]
    fn test_format_title_and_body_lines() {
        let p = paragraph("2", 0, "כותרת\nגוף");
        assert_eq!(format_paragraph(&p, 80), "2. כותרת\n   גוף");
    }

    #[test]
    fn test_format_text_joins_paragraphs() {
        let stream = ParagraphStream {
            paragraphs: vec![paragraph("1", 0, "א"), paragraph("1.1", 1, "ב")],
            diagnostics: Diagnostics::new(),
        };
        assert_eq!(format_text(&stream, 80), "1. א\n  1.1. ב");
    }

    #[test]
    fn test_format_json() {
        let stream = ParagraphStream {
            paragraphs: vec![paragraph("1", 0, "א")],
            diagnostics: Diagnostics::new(),
        };
        let json: serde_json::Value = serde_json::from_str(&format_json(&stream).unwrap()).unwrap();
        assert_eq!(json["paragraphs"][0]["number"], "1");
        assert_eq!(json["paragraphs"][0]["section_id"], "1");
    }
}
