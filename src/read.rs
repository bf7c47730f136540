use regex::Regex;

/// Cursor over a single input line.
///
/// Positions are byte offsets into the line. The cursor only ever moves forward
/// and never leaves the line.
#[derive(Debug, Clone)]
pub struct Reader<'de> {
    line: &'de str,
    position: usize,
}

impl<'de> Reader<'de> {
    pub fn new(line: &'de str) -> Self {
        Reader { line, position: 0 }
    }

    pub fn line(&self) -> &'de str {
        self.line
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn rest(&self) -> &'de str {
        &self.line[self.position..]
    }

    /// The next character, or `None` at the end of the line.
    pub fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    pub fn skip(&mut self) {
        if let Some(c) = self.peek() {
            self.position += c.len_utf8();
        }
    }

    /// Moves forward `count` bytes, clamped to the end of the line.
    pub fn advance(&mut self, count: usize) {
        self.position = (self.position + count).min(self.line.len());
    }

    /// Matches `pattern` anchored at the cursor without moving it.
    ///
    /// Only a match starting exactly at the cursor counts; a match further
    /// along the line is ignored.
    pub fn match_at(&self, pattern: &Regex) -> Option<&'de str> {
        let rest = self.rest();
        pattern
            .find(rest)
            .filter(|m| m.start() == 0)
            .map(|m| &rest[..m.end()])
    }
}
