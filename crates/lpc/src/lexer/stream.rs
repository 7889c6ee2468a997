/// Cursor over source text. Positions are byte offsets into the text and
/// always sit on a char boundary.
#[derive(Debug, Clone)]
pub struct CharStream<'a> {
    text: &'a str,
    pos: usize,
}

impl<'a> CharStream<'a> {
    pub fn new(text: &'a str) -> Self {
        Self { text, pos: 0 }
    }

    pub fn text(&self) -> &'a str {
        self.text
    }

    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    /// Moves the cursor, clamping to the end of the text and backing off to the
    /// closest char boundary.
    pub fn reset(&mut self, pos: usize) {
        let mut pos = pos.min(self.text.len());
        while !self.text.is_char_boundary(pos) {
            pos -= 1;
        }
        self.pos = pos;
    }

    pub fn is_at_end(&self) -> bool {
        self.pos >= self.text.len()
    }

    pub fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    pub fn peek_nth(&self, n: usize) -> Option<char> {
        self.rest().chars().nth(n)
    }

    pub fn starts_with(&self, literal: &str) -> bool {
        self.rest().starts_with(literal)
    }

    pub fn advance(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += ch.len_utf8();
        Some(ch)
    }

    /// Advances by up to `count` chars and returns how many were actually consumed.
    pub fn advance_by(&mut self, count: usize) -> usize {
        let mut consumed = 0;
        while consumed < count && self.advance().is_some() {
            consumed += 1;
        }
        consumed
    }

    pub fn advance_while(&mut self, mut pred: impl FnMut(char) -> bool) -> &'a str {
        let start = self.pos;
        while let Some(ch) = self.peek() {
            if !pred(ch) {
                break;
            }
            self.pos += ch.len_utf8();
        }
        &self.text[start..self.pos]
    }

    /// Advances past the next occurrence of `literal`. Returns `false` (with the
    /// cursor at the end of the text) when it does not occur.
    pub fn skip_past(&mut self, literal: &str) -> bool {
        match self.rest().find(literal) {
            Some(index) => {
                self.pos += index + literal.len();
                true
            }
            None => {
                self.pos = self.text.len();
                false
            }
        }
    }

    pub fn slice(&self, begin: usize, end: usize) -> &'a str {
        let end = end.min(self.text.len());
        self.text.get(begin.min(end)..end).unwrap_or("")
    }

    fn rest(&self) -> &'a str {
        &self.text[self.pos..]
    }
}

/// Turns raw bytes into source text. Valid UTF-8 is taken as is; anything else
/// is reduced to its ASCII bytes.
pub fn decode_source(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(text) => text.to_string(),
        Err(_) => bytes
            .iter()
            .filter(|byte| byte.is_ascii())
            .map(|byte| *byte as char)
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advance_by_is_bounded_by_the_text() {
        let mut stream = CharStream::new("abc");
        assert_eq!(stream.advance_by(2), 2);
        assert_eq!(stream.advance_by(5), 1);
        assert!(stream.is_at_end());
        assert_eq!(stream.advance(), None);
    }

    #[test]
    fn lookahead_does_not_move_the_cursor() {
        let stream = CharStream::new("<<=x");
        assert!(stream.starts_with("<<="));
        assert_eq!(stream.peek_nth(3), Some('x'));
        assert_eq!(stream.position(), 0);
    }

    #[test]
    fn skip_past_stops_after_the_literal() {
        let mut stream = CharStream::new("/* a */ b");
        stream.advance_by(2);
        assert!(stream.skip_past("*/"));
        assert_eq!(stream.position(), 7);
        assert!(!stream.skip_past("*/"));
        assert!(stream.is_at_end());
    }

    #[test]
    fn reset_lands_on_a_char_boundary() {
        let mut stream = CharStream::new("aé");
        stream.reset(2);
        assert_eq!(stream.position(), 1);
        assert_eq!(stream.peek(), Some('é'));
    }

    #[test]
    fn decode_source_filters_invalid_utf8_to_ascii() {
        assert_eq!(decode_source("int x;".as_bytes()), "int x;");
        assert_eq!(decode_source(&[b'i', 0xff, b'n', b't']), "int");
    }
}
