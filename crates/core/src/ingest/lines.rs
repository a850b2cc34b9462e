//! Forward-only, lazily read line sequence.

use std::io::{self, BufRead};

/// Reads one line at a time from a [`BufRead`] source.
///
/// `\n` and `\r\n` terminators are stripped and the final line may be
/// unterminated. Skipped lines are consumed as raw bytes and never decoded.
#[derive(Debug)]
pub struct LineSource<R> {
    reader: R,
    scratch: Vec<u8>,
    lines_read: u64,
}

impl<R: BufRead> LineSource<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            scratch: Vec::new(),
            lines_read: 0,
        }
    }

    /// Lines consumed so far, skipped or returned.
    pub fn lines_read(&self) -> u64 {
        self.lines_read
    }

    /// Discards up to `n` lines. Returns how many were skipped, fewer than
    /// `n` only if the source ended.
    pub fn skip_lines(&mut self, n: u64) -> io::Result<u64> {
        let mut skipped = 0;
        while skipped < n {
            self.scratch.clear();
            if self.reader.read_until(b'\n', &mut self.scratch)? == 0 {
                break;
            }
            skipped += 1;
            self.lines_read += 1;
        }
        Ok(skipped)
    }

    /// Reads the next line without its terminator, or `None` at end of input.
    ///
    /// Invalid UTF-8 is reported as [`io::ErrorKind::InvalidData`].
    pub fn next_line(&mut self) -> io::Result<Option<String>> {
        let mut line = String::new();
        if self.reader.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        if line.ends_with('\n') {
            line.pop();
            if line.ends_with('\r') {
                line.pop();
            }
        }
        self.lines_read += 1;
        Ok(Some(line))
    }
}

impl<R: BufRead> Iterator for LineSource<R> {
    type Item = io::Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_line().transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn source(text: &str) -> LineSource<Cursor<Vec<u8>>> {
        LineSource::new(Cursor::new(text.as_bytes().to_vec()))
    }

    #[test]
    fn test_strips_terminators() {
        let lines: Vec<String> = source("kot\r\npies\nmysz")
            .collect::<io::Result<_>>()
            .unwrap();
        assert_eq!(lines, vec!["kot", "pies", "mysz"]);
    }

    #[test]
    fn test_trailing_newline_does_not_add_line() {
        let mut src = source("a\nb\n");
        assert_eq!(src.next_line().unwrap().as_deref(), Some("a"));
        assert_eq!(src.next_line().unwrap().as_deref(), Some("b"));
        assert_eq!(src.next_line().unwrap(), None);
        assert_eq!(src.lines_read(), 2);
    }

    #[test]
    fn test_blank_lines_are_lines() {
        let lines: Vec<String> = source("a\n\nb").collect::<io::Result<_>>().unwrap();
        assert_eq!(lines, vec!["a", "", "b"]);
    }

    #[test]
    fn test_skip_then_take() {
        let mut src = source("0\n1\n2\n3\n4");
        assert_eq!(src.skip_lines(3).unwrap(), 3);
        assert_eq!(src.next_line().unwrap().as_deref(), Some("3"));
        assert_eq!(src.lines_read(), 4);
    }

    #[test]
    fn test_skip_lines_then_iterate() {
        let mut src = source("0\n1\n2\n3");
        let skipped: u64 = src.skip_lines(2u64).unwrap();
        assert_eq!(skipped, 2);
        let rest: Vec<String> = src.by_ref().collect::<io::Result<_>>().unwrap();
        assert_eq!(rest, vec!["2", "3"]);
        assert_eq!(src.lines_read(), 4);
    }

    #[test]
    fn test_skip_past_end() {
        let mut src = source("0\n1");
        assert_eq!(src.skip_lines(10).unwrap(), 2);
        assert_eq!(src.next_line().unwrap(), None);
    }

    #[test]
    fn test_skip_does_not_decode() {
        let mut bytes = vec![0xFF, 0xFE, b'\n'];
        bytes.extend_from_slice("żółw\n".as_bytes());
        let mut src = LineSource::new(Cursor::new(bytes));
        assert_eq!(src.skip_lines(1).unwrap(), 1);
        assert_eq!(src.next_line().unwrap().as_deref(), Some("żółw"));
    }

    #[test]
    fn test_invalid_utf8_reported() {
        let mut src = LineSource::new(Cursor::new(vec![0xFF, b'\n']));
        let err = src.next_line().unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }
}
