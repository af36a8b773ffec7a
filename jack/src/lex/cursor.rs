//! Character scanner with rewind support.

/// Saved cursor position that can be restored with [`Cursor::reset`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mark {
    offset: usize,
    line: u32,
}

impl Mark {
    #[inline]
    pub fn line(&self) -> u32 {
        self.line
    }
}

pub struct Cursor<'a> {
    original: &'a str,
    /// Byte offset of the next character to be consumed.
    offset: usize,
    /// Line of the next character, starting at 1.
    line: u32,
}

impl<'a> Cursor<'a> {
    pub fn new(source_code: &'a str) -> Self {
        Self {
            original: source_code,
            offset: 0,
            line: 1,
        }
    }

    /// Look at the next character without consuming it.
    #[inline]
    pub fn peek(&self) -> Option<char> {
        self.original[self.offset..].chars().next()
    }

    /// Consume the next character.
    ///
    /// Returns `None` at the end of the source.
    pub fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.offset += c.len_utf8();
        if c == '\n' {
            self.line += 1;
        }
        Some(c)
    }

    /// Consume characters while the predicate holds.
    pub fn bump_while(&mut self, predicate: impl Fn(char) -> bool) {
        while let Some(c) = self.peek() {
            if !predicate(c) {
                break;
            }
            self.bump();
        }
    }

    #[inline]
    pub fn offset(&self) -> u32 {
        self.offset as u32
    }

    #[inline]
    pub fn line(&self) -> u32 {
        self.line
    }

    #[inline]
    pub fn mark(&self) -> Mark {
        Mark {
            offset: self.offset,
            line: self.line,
        }
    }

    /// Rewind to a previously marked position.
    #[inline]
    pub fn reset(&mut self, mark: Mark) {
        debug_assert!(mark.offset <= self.original.len());
        self.offset = mark.offset;
        self.line = mark.line;
    }

    #[cfg(test)]
    pub fn at_end(&self) -> bool {
        self.offset >= self.original.len()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_bump_counts_lines() {
        let mut cursor = Cursor::new("a\nb");
        assert_eq!(cursor.bump(), Some('a'));
        assert_eq!(cursor.line(), 1);
        assert_eq!(cursor.bump(), Some('\n'));
        assert_eq!(cursor.line(), 2);
        assert_eq!(cursor.bump(), Some('b'));
        assert_eq!(cursor.bump(), None);
        assert!(cursor.at_end());
    }

    #[test]
    fn test_reset_restores_line() {
        let mut cursor = Cursor::new("/\n/");
        let mark = cursor.mark();
        cursor.bump();
        cursor.bump();
        assert_eq!(cursor.line(), 2);

        cursor.reset(mark);
        assert_eq!(cursor.offset(), 0);
        assert_eq!(cursor.line(), 1);
        assert_eq!(cursor.peek(), Some('/'));
    }
}
