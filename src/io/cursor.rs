//! The input cursor: a position-tracking reader over a textual stream.
//!
//! `InputCursor` is the low-level primitive every `read` implementation
//! builds on: `read_token` pulls the next maximal run of non-whitespace
//! characters, `read_whitespace` consumes the configured separator (under
//! either strictness policy), and `read_eof` asserts nothing but trailing
//! whitespace remains.

use std::collections::VecDeque;

use crate::error::IoError;
use crate::io::format::{NumericStrictness, Whitespace, WhitespaceStrictness};
use crate::span::Position;

const RECENTLY_READ_CAPACITY: usize = 8;

/// A forward-only cursor over in-memory source text, tracking byte offset
/// and 1-based line/column as it advances.
pub struct InputCursor<'a> {
    source: &'a str,
    chars: std::iter::Peekable<std::str::CharIndices<'a>>,
    position: Position,
    recently_read: VecDeque<String>,
}

impl<'a> InputCursor<'a> {
    /// Creates a cursor positioned at the start of `source`.
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            chars: source.char_indices().peekable(),
            position: Position::start(),
            recently_read: VecDeque::new(),
        }
    }

    /// The cursor's current position.
    pub fn position(&self) -> Position {
        self.position
    }

    fn peek_char(&mut self) -> Option<char> {
        self.chars.peek().map(|&(_, c)| c)
    }

    fn bump(&mut self) -> Option<char> {
        let (_, ch) = self.chars.next()?;
        self.position.advance(ch);
        Some(ch)
    }

    fn remember(&mut self, token: &str) {
        if self.recently_read.len() == RECENTLY_READ_CAPACITY {
            self.recently_read.pop_front();
        }
        self.recently_read.push_back(token.to_string());
    }

    fn error(&self, message: impl Into<String>) -> IoError {
        IoError::with_context(
            self.position,
            message,
            self.recently_read.iter().cloned().collect(),
        )
    }

    /// Reads the next maximal run of non-whitespace characters.
    ///
    /// # Errors
    /// Returns an [`IoError`] if the cursor is already at end-of-input.
    pub fn read_token(&mut self) -> Result<String, IoError> {
        let start_offset = self.position.offset;
        let mut saw_any = false;
        while let Some(ch) = self.peek_char() {
            if ch.is_whitespace() {
                break;
            }
            saw_any = true;
            self.bump();
        }
        if !saw_any {
            return Err(self.error("expected a token but found end of input or whitespace"));
        }
        let token = &self.source[start_offset..self.position.offset];
        self.remember(token);
        Ok(token.to_string())
    }

    /// Consumes the separator between tokens: exactly one whitespace
    /// character, never a run.
    ///
    /// Under [`WhitespaceStrictness::Precise`], that character must be
    /// exactly the one denoted by `separator`. Under
    /// [`WhitespaceStrictness::Flexible`], any single whitespace character is
    /// accepted. Runs are never collapsed: a doubled separator leaves a
    /// stray whitespace character that the next `read_token` rejects.
    ///
    /// # Errors
    /// Returns an [`IoError`] if no matching whitespace character is present.
    pub fn read_whitespace(
        &mut self,
        separator: Whitespace,
        strictness: WhitespaceStrictness,
    ) -> Result<(), IoError> {
        match strictness {
            WhitespaceStrictness::Precise => {
                let want = separator.as_char();
                if self.peek_char() == Some(want) {
                    self.bump();
                    Ok(())
                } else {
                    Err(self.error(format!(
                        "expected separator {want:?} but found {:?}",
                        self.peek_char()
                    )))
                }
            }
            WhitespaceStrictness::Flexible => {
                if self.peek_char().is_some_and(char::is_whitespace) {
                    self.bump();
                    Ok(())
                } else {
                    Err(self.error("expected whitespace but found none"))
                }
            }
        }
    }

    /// Consumes any trailing whitespace and asserts nothing but end-of-input
    /// remains.
    ///
    /// # Errors
    /// Returns an [`IoError`] if non-whitespace characters remain.
    pub fn read_eof(&mut self) -> Result<(), IoError> {
        while let Some(ch) = self.peek_char() {
            if !ch.is_whitespace() {
                return Err(self.error("expected end of input but found more content"));
            }
            self.bump();
        }
        Ok(())
    }

    /// Reads a token and parses it as a signed 64-bit integer under the
    /// given numeric strictness.
    ///
    /// # Errors
    /// Returns an [`IoError`] if the token is not present, or (under
    /// [`NumericStrictness::Precise`]) is not canonically spelled (no
    /// leading `+`, no `-0`, no unnecessary leading zeros).
    pub fn read_integer(&mut self, strictness: NumericStrictness) -> Result<i64, IoError> {
        let token = self.read_token()?;
        if strictness == NumericStrictness::Precise {
            validate_precise_integer_spelling(&token)
                .map_err(|m| self.error(format!("'{token}' is not a canonical integer: {m}")))?;
        }
        token
            .parse::<i64>()
            .map_err(|e| self.error(format!("'{token}' is not a valid integer: {e}")))
    }
}

fn validate_precise_integer_spelling(token: &str) -> Result<(), &'static str> {
    let digits = token.strip_prefix('-').unwrap_or(token);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err("expected an optional '-' followed by one or more digits");
    }
    if token.starts_with('+') {
        return Err("leading '+' is not permitted");
    }
    if digits.len() > 1 && digits.starts_with('0') {
        return Err("unnecessary leading zero");
    }
    if token == "-0" {
        return Err("'-0' is not a canonical spelling of zero");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_tokens_separated_by_precise_whitespace() {
        let mut cursor = InputCursor::new("12 34");
        assert_eq!(cursor.read_token().unwrap(), "12");
        cursor
            .read_whitespace(Whitespace::Space, WhitespaceStrictness::Precise)
            .unwrap();
        assert_eq!(cursor.read_token().unwrap(), "34");
        cursor.read_eof().unwrap();
    }

    #[test]
    fn flexible_whitespace_accepts_any_single_whitespace_character() {
        for ws in ["\t", "\n", " "] {
            let source = format!("12{ws}34");
            let mut cursor = InputCursor::new(&source);
            assert_eq!(cursor.read_token().unwrap(), "12");
            cursor
                .read_whitespace(Whitespace::Space, WhitespaceStrictness::Flexible)
                .unwrap();
            assert_eq!(cursor.read_token().unwrap(), "34");
        }
    }

    #[test]
    fn precise_whitespace_rejects_wrong_character() {
        let mut cursor = InputCursor::new("12\t34");
        cursor.read_token().unwrap();
        assert!(cursor
            .read_whitespace(Whitespace::Space, WhitespaceStrictness::Precise)
            .is_err());
    }

    #[test]
    fn precise_whitespace_does_not_collapse_a_doubled_separator() {
        let mut cursor = InputCursor::new("1  2");
        assert_eq!(cursor.read_token().unwrap(), "1");
        cursor
            .read_whitespace(Whitespace::Space, WhitespaceStrictness::Precise)
            .unwrap();
        // the second space is left over: it isn't part of a token, so reading
        // one fails rather than silently skipping it.
        assert!(cursor.read_token().is_err());
    }

    #[test]
    fn precise_integer_rejects_leading_zero_and_plus() {
        assert!(validate_precise_integer_spelling("007").is_err());
        assert!(validate_precise_integer_spelling("+5").is_err());
        assert!(validate_precise_integer_spelling("-0").is_err());
        assert!(validate_precise_integer_spelling("0").is_ok());
        assert!(validate_precise_integer_spelling("-12").is_ok());
    }

    #[test]
    fn read_integer_parses_under_flexible_strictness() {
        let mut cursor = InputCursor::new("+007");
        assert_eq!(cursor.read_integer(NumericStrictness::Flexible).unwrap(), 7);
    }

    #[test]
    fn read_eof_fails_on_trailing_content() {
        let mut cursor = InputCursor::new("12 garbage");
        cursor.read_token().unwrap();
        cursor
            .read_whitespace(Whitespace::Space, WhitespaceStrictness::Precise)
            .unwrap();
        assert!(cursor.read_eof().is_err());
    }
}
