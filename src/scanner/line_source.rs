use crate::error::Result;
use encoding_rs::Encoding;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

const READ_BUFFER_SIZE: usize = 64 * 1024;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceLine {
    Text { number: usize, text: String },
    /// The raw bytes are not valid in the configured encoding.
    Undecodable { number: usize, byte_len: usize },
}

impl SourceLine {
    pub fn number(&self) -> usize {
        match self {
            SourceLine::Text { number, .. } | SourceLine::Undecodable { number, .. } => *number,
        }
    }
}

/// Opens files and decodes them line by line with a fixed encoding.
#[derive(Debug, Clone, Copy)]
pub struct LineSource {
    encoding: &'static Encoding,
}

impl LineSource {
    pub fn new(encoding: &'static Encoding) -> Self {
        Self { encoding }
    }

    pub fn encoding(&self) -> &'static Encoding {
        self.encoding
    }

    pub fn open<P: AsRef<Path>>(&self, path: P) -> Result<DecodedLines<BufReader<File>>> {
        let file = File::open(path.as_ref())?;
        Ok(self.read(BufReader::with_capacity(READ_BUFFER_SIZE, file)))
    }

    pub fn read<R: BufRead>(&self, reader: R) -> DecodedLines<R> {
        DecodedLines {
            reader,
            encoding: self.encoding,
            buffer: Vec::new(),
            number: 0,
            pending_cr: false,
            failed: false,
        }
    }
}

/// Iterator over the lines of one input. `\n`, `\r\n` and a lone `\r` all
/// end a line. Undecodable lines are yielded as [`SourceLine::Undecodable`]
/// so the caller can log and skip them; an I/O error is yielded once and
/// ends the iteration.
pub struct DecodedLines<R> {
    reader: R,
    encoding: &'static Encoding,
    buffer: Vec<u8>,
    number: usize,
    pending_cr: bool,
    failed: bool,
}

impl<R: BufRead> DecodedLines<R> {
    /// Fills `buffer` with the next line, terminator excluded. Returns false
    /// at end of input.
    fn read_line_bytes(&mut self) -> io::Result<bool> {
        self.buffer.clear();

        loop {
            let available = match self.reader.fill_buf() {
                Ok(available) => available,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            };

            if available.is_empty() {
                self.pending_cr = false;
                return Ok(!self.buffer.is_empty());
            }

            // the `\n` of a `\r\n` pair may arrive in the next chunk
            if self.pending_cr {
                self.pending_cr = false;
                if available[0] == b'\n' {
                    self.reader.consume(1);
                    continue;
                }
            }

            match available.iter().position(|&b| b == b'\n' || b == b'\r') {
                Some(end) => {
                    self.pending_cr = available[end] == b'\r';
                    self.buffer.extend_from_slice(&available[..end]);
                    self.reader.consume(end + 1);
                    return Ok(true);
                }
                None => {
                    let len = available.len();
                    self.buffer.extend_from_slice(available);
                    self.reader.consume(len);
                }
            }
        }
    }
}

impl<R: BufRead> Iterator for DecodedLines<R> {
    type Item = Result<SourceLine>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }

        match self.read_line_bytes() {
            Ok(false) => None,
            Ok(true) => {
                self.number += 1;

                let line = match self
                    .encoding
                    .decode_without_bom_handling_and_without_replacement(&self.buffer)
                {
                    Some(text) => SourceLine::Text {
                        number: self.number,
                        text: text.into_owned(),
                    },
                    None => SourceLine::Undecodable {
                        number: self.number,
                        byte_len: self.buffer.len(),
                    },
                };
                Some(Ok(line))
            }
            Err(e) => {
                self.failed = true;
                Some(Err(e.into()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn collect(source: LineSource, bytes: &[u8]) -> Vec<SourceLine> {
        source
            .read(Cursor::new(bytes.to_vec()))
            .collect::<Result<Vec<_>>>()
            .unwrap()
    }

    fn text(number: usize, text: &str) -> SourceLine {
        SourceLine::Text {
            number,
            text: text.to_string(),
        }
    }

    #[test]
    fn test_lines_with_and_without_trailing_newline() {
        let source = LineSource::new(encoding_rs::UTF_8);
        let lines = collect(source, b"first\r\nsecond\n\nlast");

        assert_eq!(
            lines,
            vec![text(1, "first"), text(2, "second"), text(3, ""), text(4, "last")]
        );
    }

    #[test]
    fn test_lone_carriage_return_ends_a_line() {
        let source = LineSource::new(encoding_rs::UTF_8);
        let lines = collect(source, b"one\rtwo\r\rthree\r\nfour\r");

        assert_eq!(
            lines,
            vec![
                text(1, "one"),
                text(2, "two"),
                text(3, ""),
                text(4, "three"),
                text(5, "four"),
            ]
        );
    }

    #[test]
    fn test_crlf_split_across_buffer_refills() {
        let source = LineSource::new(encoding_rs::UTF_8);
        let reader = BufReader::with_capacity(4, Cursor::new(b"abc\r\ndef\n".to_vec()));
        let lines = source.read(reader).collect::<Result<Vec<_>>>().unwrap();

        assert_eq!(lines, vec![text(1, "abc"), text(2, "def")]);
    }

    #[test]
    fn test_undecodable_line_is_reported_and_reading_continues() {
        let source = LineSource::new(encoding_rs::UTF_8);
        let lines = collect(source, b"ok\n\xff\xfe broken\nafter\n");

        assert_eq!(lines.len(), 3);
        assert_eq!(
            lines[1],
            SourceLine::Undecodable {
                number: 2,
                byte_len: 9
            }
        );
        assert_eq!(lines[2], text(3, "after"));
        assert_eq!(lines[2].number(), 3);
    }

    #[test]
    fn test_shift_jis_decoding() {
        let (encoded, _, _) = encoding_rs::SHIFT_JIS.encode("[ERROR] ディスク満杯\n");
        let source = LineSource::new(encoding_rs::SHIFT_JIS);
        let lines = collect(source, &encoded);

        assert_eq!(lines, vec![text(1, "[ERROR] ディスク満杯")]);
    }

    #[test]
    fn test_open_missing_file_fails() {
        let source = LineSource::new(encoding_rs::UTF_8);
        assert!(source.open("/no/such/input.log").is_err());
    }
}
