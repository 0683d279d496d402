//! Streaming reader for instance files
//!
//! Reads byte by byte from a buffered source, decompressing gzip, xz, lzma and
//! bzip2 on the fly.
//! All methods report malformed input as [`ExtractError::Parse`] carrying the
//! current line number.

use crate::Lit;
use bzip2::read::MultiBzDecoder;
use flate2::read::MultiGzDecoder;
use gbd_domain::{Compression, ExtractError};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use xz2::read::XzDecoder;
use xz2::stream::Stream;

const BUFFER_SIZE: usize = 1 << 16;

/// Byte-level tokenizer over a (possibly compressed) instance file
pub struct InstanceReader {
    inner: Box<dyn BufRead>,
    line: usize,
}

impl InstanceReader {
    /// Open `path`, decompressing according to its extension
    pub fn open(path: &Path) -> Result<Self, ExtractError> {
        let compression = Compression::from_path(path);
        let file = File::open(path)?;
        let inner: Box<dyn BufRead> = match compression {
            Compression::None => Box::new(BufReader::with_capacity(BUFFER_SIZE, file)),
            Compression::Gzip => Box::new(BufReader::with_capacity(
                BUFFER_SIZE,
                MultiGzDecoder::new(file),
            )),
            Compression::Xz => Box::new(BufReader::with_capacity(
                BUFFER_SIZE,
                XzDecoder::new_multi_decoder(file),
            )),
            Compression::Lzma => {
                let stream = Stream::new_lzma_decoder(u64::MAX).map_err(|e| {
                    ExtractError::UnsupportedCompression(format!(
                        "lzma decoder for {}: {}",
                        path.display(),
                        e
                    ))
                })?;
                Box::new(BufReader::with_capacity(
                    BUFFER_SIZE,
                    XzDecoder::new_stream(file, stream),
                ))
            }
            Compression::Bzip2 => Box::new(BufReader::with_capacity(
                BUFFER_SIZE,
                MultiBzDecoder::new(file),
            )),
        };
        Ok(Self { inner, line: 1 })
    }

    /// Read from an already opened source
    pub fn from_reader<R: BufRead + 'static>(reader: R) -> Self {
        Self {
            inner: Box::new(reader),
            line: 1,
        }
    }

    /// Current 1-based line number
    pub fn line(&self) -> usize {
        self.line
    }

    fn parse_error(&self, message: impl Into<String>) -> ExtractError {
        ExtractError::Parse {
            line: self.line,
            message: message.into(),
        }
    }

    /// Next byte without consuming it; `None` at end of input
    pub fn peek(&mut self) -> Result<Option<u8>, ExtractError> {
        Ok(self.inner.fill_buf()?.first().copied())
    }

    /// Whether the input is exhausted
    pub fn eof(&mut self) -> Result<bool, ExtractError> {
        Ok(self.peek()?.is_none())
    }

    /// Consume one byte
    pub fn skip(&mut self) -> Result<(), ExtractError> {
        if let Some(byte) = self.peek()? {
            if byte == b'\n' {
                self.line += 1;
            }
            self.inner.consume(1);
        }
        Ok(())
    }

    /// Skip whitespace including line breaks; false at end of input
    pub fn skip_whitespace(&mut self) -> Result<bool, ExtractError> {
        loop {
            match self.peek()? {
                Some(byte) if byte.is_ascii_whitespace() => self.skip()?,
                Some(_) => return Ok(true),
                None => return Ok(false),
            }
        }
    }

    /// Skip the rest of the current line; false if no input follows it
    pub fn skip_line(&mut self) -> Result<bool, ExtractError> {
        loop {
            match self.peek()? {
                Some(b'\n') => {
                    self.skip()?;
                    return Ok(!self.eof()?);
                }
                Some(_) => self.skip()?,
                None => return Ok(false),
            }
        }
    }

    /// Read the rest of the current line, without the line break
    pub fn read_line(&mut self) -> Result<String, ExtractError> {
        let mut bytes = Vec::new();
        while let Some(byte) = self.peek()? {
            self.skip()?;
            if byte == b'\n' {
                break;
            }
            bytes.push(byte);
        }
        String::from_utf8(bytes).map_err(|_| self.parse_error("line is not valid UTF-8"))
    }

    /// Consume `expected` exactly
    pub fn skip_string(&mut self, expected: &str) -> Result<(), ExtractError> {
        for &want in expected.as_bytes() {
            match self.peek()? {
                Some(byte) if byte == want => self.skip()?,
                _ => return Err(self.parse_error(format!("expected '{}'", expected))),
            }
        }
        Ok(())
    }

    /// Read a signed decimal token as written (leading whitespace skipped)
    ///
    /// Returns `None` at end of input.
    pub fn read_number_token(&mut self) -> Result<Option<String>, ExtractError> {
        if !self.skip_whitespace()? {
            return Ok(None);
        }

        let mut token = String::new();
        if let Some(sign @ (b'-' | b'+')) = self.peek()? {
            token.push(sign as char);
            self.skip()?;
        }
        while let Some(byte) = self.peek()? {
            if !byte.is_ascii_digit() {
                break;
            }
            token.push(byte as char);
            self.skip()?;
        }

        if token.is_empty() || token == "-" || token == "+" {
            let found = match self.peek()? {
                Some(byte) => format!("'{}'", byte.escape_ascii()),
                None => "end of input".to_string(),
            };
            return Err(self.parse_error(format!("expected a number, found {}", found)));
        }
        Ok(Some(token))
    }

    /// Read a signed integer
    pub fn read_integer(&mut self) -> Result<i64, ExtractError> {
        let token = self
            .read_number_token()?
            .ok_or_else(|| self.parse_error("unexpected end of input"))?;
        token
            .parse()
            .map_err(|_| self.parse_error(format!("integer out of range: {}", token)))
    }

    /// Read an unsigned integer
    pub fn read_unsigned(&mut self) -> Result<u64, ExtractError> {
        let token = self
            .read_number_token()?
            .ok_or_else(|| self.parse_error("unexpected end of input"))?;
        token
            .trim_start_matches('+')
            .parse()
            .map_err(|_| self.parse_error(format!("expected an unsigned integer: {}", token)))
    }

    /// Read literals up to the terminating `0` into `clause`
    ///
    /// A clause cut off by the end of input is accepted as terminated.
    pub fn read_literals(&mut self, clause: &mut Vec<Lit>) -> Result<(), ExtractError> {
        clause.clear();
        loop {
            if !self.skip_whitespace()? {
                return Ok(());
            }
            let value = self.read_integer()?;
            if value == 0 {
                return Ok(());
            }
            let lit = Lit::from_dimacs(value)
                .ok_or_else(|| self.parse_error(format!("literal out of range: {}", value)))?;
            clause.push(lit);
        }
    }

    /// Read the next DIMACS clause, skipping comment and header lines
    ///
    /// Returns false at end of input.
    pub fn read_clause(&mut self, clause: &mut Vec<Lit>) -> Result<bool, ExtractError> {
        loop {
            if !self.skip_whitespace()? {
                clause.clear();
                return Ok(false);
            }
            match self.peek()? {
                Some(b'c') | Some(b'p') => {
                    self.skip_line()?;
                }
                _ => break,
            }
        }
        self.read_literals(clause)?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn reader(text: &str) -> InstanceReader {
        InstanceReader::from_reader(Cursor::new(text.as_bytes().to_vec()))
    }

    #[test]
    fn test_mixed_tokens() {
        let mut r = reader("123 137 no   -7 mer\n ci\n");
        assert_eq!(r.read_integer().unwrap(), 123);
        assert!(r.skip_whitespace().unwrap());
        assert_eq!(r.read_integer().unwrap(), 137);
        assert!(r.skip_whitespace().unwrap());
        r.skip_string("no").unwrap();
        assert_eq!(r.read_integer().unwrap(), -7);
        assert!(r.skip_line().unwrap());
        assert_eq!(r.line(), 2);
        assert!(r.skip_whitespace().unwrap());
        r.skip_string("ci").unwrap();
        assert!(!r.eof().unwrap());
        assert!(!r.skip_whitespace().unwrap());
        assert!(r.eof().unwrap());
    }

    #[test]
    fn test_skip_string_mismatch() {
        let mut r = reader("Hello World!");
        r.skip_string("Hello").unwrap();
        assert!(r.skip_whitespace().unwrap());
        assert!(r.skip_string("Word").is_err());
    }

    #[test]
    fn test_number_tokens_keep_sign() {
        let mut r = reader("+3 -0 12");
        assert_eq!(r.read_number_token().unwrap().as_deref(), Some("+3"));
        assert_eq!(r.read_number_token().unwrap().as_deref(), Some("-0"));
        assert_eq!(r.read_unsigned().unwrap(), 12);
        assert_eq!(r.read_number_token().unwrap(), None);
    }

    #[test]
    fn test_non_number_is_an_error() {
        let mut r = reader("\n\nx1");
        match r.read_integer() {
            Err(ExtractError::Parse { line, .. }) => assert_eq!(line, 3),
            other => panic!("unexpected {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_read_clauses() {
        let mut r = reader("c comment\np cnf 3 2\n1 -2 0\nc mid\n-3\n 2 0\n3");
        let mut clause = Vec::new();

        assert!(r.read_clause(&mut clause).unwrap());
        let dimacs: Vec<i64> = clause.iter().map(|l| l.to_dimacs()).collect();
        assert_eq!(dimacs, vec![1, -2]);

        assert!(r.read_clause(&mut clause).unwrap());
        let dimacs: Vec<i64> = clause.iter().map(|l| l.to_dimacs()).collect();
        assert_eq!(dimacs, vec![-3, 2]);

        assert!(r.read_clause(&mut clause).unwrap());
        assert_eq!(clause.len(), 1);

        assert!(!r.read_clause(&mut clause).unwrap());
        assert!(clause.is_empty());
    }

    #[test]
    fn test_read_line() {
        let mut r = reader("p wcnf 3 4 10\n1 2 0\n");
        assert_eq!(r.read_line().unwrap(), "p wcnf 3 4 10");
        assert_eq!(r.line(), 2);
    }
}
