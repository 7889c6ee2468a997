use serde::Serialize;

use crate::ast::{Node, NodeKind};
use crate::parser::Parsed;

/// One-based line and column; columns count characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Span {
    pub start: Position,
    pub end: Position,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub code: String,
    pub message: String,
    pub span: Span,
    /// Byte offsets of the hole in the source.
    pub begin: usize,
    pub end: usize,
}

pub const CODE_MISSING: &str = "P001";
pub const CODE_WRONG: &str = "P002";

/// Maps byte offsets to lines and columns.
#[derive(Debug, Clone)]
pub struct LineIndex<'a> {
    text: &'a str,
    line_starts: Vec<usize>,
}

impl<'a> LineIndex<'a> {
    pub fn new(text: &'a str) -> Self {
        let mut line_starts = vec![0];
        line_starts.extend(
            text.bytes()
                .enumerate()
                .filter(|(_, byte)| *byte == b'\n')
                .map(|(index, _)| index + 1),
        );
        Self { text, line_starts }
    }

    fn clamp(&self, offset: usize) -> usize {
        let mut offset = offset.min(self.text.len());
        while !self.text.is_char_boundary(offset) {
            offset -= 1;
        }
        offset
    }

    fn line_of(&self, offset: usize) -> usize {
        match self.line_starts.binary_search(&offset) {
            Ok(line) => line,
            Err(next) => next - 1,
        }
    }

    pub fn position(&self, offset: usize) -> Position {
        let offset = self.clamp(offset);
        let line = self.line_of(offset);
        let column = self.text[self.line_starts[line]..offset].chars().count();
        Position {
            line: line + 1,
            column: column + 1,
        }
    }

    /// Zero-based line and UTF-16 column, as editors count them.
    pub fn utf16_position(&self, offset: usize) -> (u32, u32) {
        let offset = self.clamp(offset);
        let line = self.line_of(offset);
        let column: usize = self.text[self.line_starts[line]..offset]
            .chars()
            .map(char::len_utf16)
            .sum();
        (line as u32, column as u32)
    }

    /// Inverse of [`LineIndex::utf16_position`]; out-of-range positions
    /// clamp to the end of the line or text.
    pub fn offset_at(&self, line: u32, utf16_column: u32) -> usize {
        let Some(&start) = self.line_starts.get(line as usize) else {
            return self.text.len();
        };
        let mut remaining = utf16_column as usize;
        for (index, ch) in self.text[start..].char_indices() {
            if ch == '\n' || remaining == 0 {
                return start + index;
            }
            remaining = remaining.saturating_sub(ch.len_utf16());
        }
        self.text.len()
    }
}

/// One diagnostic per Missing/Wrong hole, in source order.
pub fn diagnostics(parsed: &Parsed, text: &str) -> Vec<Diagnostic> {
    let index = LineIndex::new(text);
    parsed
        .holes()
        .into_iter()
        .filter_map(|hole| hole_diagnostic(&index, hole))
        .collect()
}

fn hole_diagnostic(index: &LineIndex<'_>, hole: &Node) -> Option<Diagnostic> {
    let code = match hole.kind {
        NodeKind::Missing { .. } => CODE_MISSING,
        NodeKind::Wrong { .. } => CODE_WRONG,
        _ => return None,
    };
    Some(Diagnostic {
        code: code.to_string(),
        message: hole.hole_message()?.to_string(),
        span: Span {
            start: index.position(hole.begin),
            end: index.position(hole.end),
        },
        begin: hole.begin,
        end: hole.end,
    })
}

pub fn render_diagnostics(path: &str, diagnostics: &[Diagnostic]) -> String {
    let mut output = String::new();
    for (index, diagnostic) in diagnostics.iter().enumerate() {
        if index > 0 {
            output.push('\n');
        }
        output.push_str(&render_diagnostic(path, diagnostic));
    }
    output
}

pub fn render_diagnostic(path: &str, diagnostic: &Diagnostic) -> String {
    let start = &diagnostic.span.start;
    format!(
        "error[{}] {}:{}:{} {}",
        diagnostic.code, path, start.line, start.column, diagnostic.message
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{parse_source, ParseOptions};

    #[test]
    fn positions_are_one_based() {
        let index = LineIndex::new("ab\ncé\n");
        assert_eq!(index.position(0), Position { line: 1, column: 1 });
        assert_eq!(index.position(3), Position { line: 2, column: 1 });
        // 'é' is two bytes but one column.
        assert_eq!(index.position(6), Position { line: 2, column: 3 });
        assert_eq!(index.position(100), Position { line: 3, column: 1 });
    }

    #[test]
    fn utf16_positions_round_trip_through_offsets() {
        let text = "x\n\u{1F600}y";
        let index = LineIndex::new(text);
        let y = text.find('y').unwrap();
        assert_eq!(index.utf16_position(y), (1, 2));
        assert_eq!(index.offset_at(1, 2), y);
        assert_eq!(index.offset_at(0, 99), 1);
        assert_eq!(index.offset_at(9, 0), text.len());
    }

    #[test]
    fn holes_render_with_location() {
        let text = "int x;\nint y";
        let parsed = parse_source(text, ParseOptions::interpretation());
        let found = diagnostics(&parsed, text);
        assert_eq!(found.len(), 1);
        assert_eq!(
            render_diagnostics("/a.c", &found),
            "error[P001] /a.c:2:6 missing ';'"
        );
    }
}
