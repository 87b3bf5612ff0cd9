//! Pull cursor over the lines of a running process's output.

use std::io::{self, BufRead};

/// Result of pulling one line from a [`LineSource`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NextLine {
    Line(String),
    EndOfStream,
}

/// A lazy, forward-only sequence of lines read from a byte stream.
///
/// `peek` reads at most one line ahead and keeps it until `advance` hands it
/// out. Once the underlying reader returns no more data the source stays at
/// [`NextLine::EndOfStream`].
#[derive(Debug)]
pub struct LineSource<R> {
    reader: R,
    lookahead: Option<NextLine>,
    lines_read: usize,
}

impl<R: BufRead> LineSource<R> {
    pub fn new(reader: R) -> Self {
        LineSource {
            reader,
            lookahead: None,
            lines_read: 0,
        }
    }

    fn fill(&mut self) -> io::Result<&NextLine> {
        let next = match self.lookahead.take() {
            Some(next) => next,
            None => self.read_line()?,
        };
        Ok(&*self.lookahead.insert(next))
    }

    fn read_line(&mut self) -> io::Result<NextLine> {
        let mut buf = Vec::new();
        if self.reader.read_until(b'\n', &mut buf)? == 0 {
            return Ok(NextLine::EndOfStream);
        }
        if buf.last() == Some(&b'\n') {
            buf.pop();
            if buf.last() == Some(&b'\r') {
                buf.pop();
            }
        }
        self.lines_read += 1;
        Ok(NextLine::Line(String::from_utf8_lossy(&buf).into_owned()))
    }

    /// Look at the next line without consuming it.
    pub fn peek(&mut self) -> io::Result<Option<&str>> {
        match self.fill()? {
            NextLine::Line(line) => Ok(Some(line.as_str())),
            NextLine::EndOfStream => Ok(None),
        }
    }

    pub fn has_next(&mut self) -> io::Result<bool> {
        Ok(self.peek()?.is_some())
    }

    /// Consume the next line.
    pub fn advance(&mut self) -> io::Result<NextLine> {
        self.fill()?;
        match self.lookahead.take() {
            Some(NextLine::EndOfStream) | None => {
                self.lookahead = Some(NextLine::EndOfStream);
                Ok(NextLine::EndOfStream)
            }
            Some(line) => Ok(line),
        }
    }

    /// Number of lines pulled from the reader so far, including a peeked one.
    pub fn lines_read(&self) -> usize {
        self.lines_read
    }
}

impl<R: BufRead> Iterator for LineSource<R> {
    type Item = io::Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.advance() {
            Ok(NextLine::Line(line)) => Some(Ok(line)),
            Ok(NextLine::EndOfStream) => None,
            Err(e) => Some(Err(e)),
        }
    }
}

impl<R: BufRead> std::iter::FusedIterator for LineSource<R> {}
