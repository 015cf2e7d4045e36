//! The output writer: the symmetric counterpart to [`super::cursor::InputCursor`].
//!
//! Writes tokens and separators to any [`std::fmt::Write`] sink, surfacing a
//! stream failure as an [`IoError`] rather than panicking.

use crate::error::IoError;
use crate::io::format::Whitespace;
use crate::span::Position;

/// Writes a variable's textual form to an in-memory sink.
pub struct OutputWriter<'a> {
    sink: &'a mut dyn std::fmt::Write,
    wrote_any: bool,
}

impl<'a> OutputWriter<'a> {
    /// Wraps `sink` for writing.
    pub fn new(sink: &'a mut dyn std::fmt::Write) -> Self {
        Self {
            sink,
            wrote_any: false,
        }
    }

    fn fail(&self, message: impl Into<String>) -> IoError {
        IoError::new(Position::start(), message)
    }

    /// Writes `token` verbatim.
    ///
    /// # Errors
    /// Returns an [`IoError`] if the underlying sink fails.
    pub fn write_token(&mut self, token: &str) -> Result<(), IoError> {
        self.sink
            .write_str(token)
            .map_err(|e| self.fail(format!("write failed: {e}")))?;
        self.wrote_any = true;
        Ok(())
    }

    /// Writes the separator character.
    ///
    /// # Errors
    /// Returns an [`IoError`] if the underlying sink fails.
    pub fn write_whitespace(&mut self, separator: Whitespace) -> Result<(), IoError> {
        self.sink
            .write_char(separator.as_char())
            .map_err(|e| self.fail(format!("write failed: {e}")))
    }

    /// Writes `value` formatted as a canonical integer.
    ///
    /// # Errors
    /// Returns an [`IoError`] if the underlying sink fails.
    pub fn write_integer(&mut self, value: i64) -> Result<(), IoError> {
        self.write_token(&value.to_string())
    }

    /// Whether anything has been written through this writer yet.
    pub fn wrote_any(&self) -> bool {
        self.wrote_any
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_tokens_and_separators() {
        let mut out = String::new();
        {
            let mut writer = OutputWriter::new(&mut out);
            writer.write_integer(12).unwrap();
            writer.write_whitespace(Whitespace::Space).unwrap();
            writer.write_integer(-34).unwrap();
        }
        assert_eq!(out, "12 -34");
    }

    #[test]
    fn tracks_whether_anything_was_written() {
        let mut out = String::new();
        let mut writer = OutputWriter::new(&mut out);
        assert!(!writer.wrote_any());
        writer.write_token("x").unwrap();
        assert!(writer.wrote_any());
    }
}
