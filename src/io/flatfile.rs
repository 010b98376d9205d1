//! # Flat-File Reading and Writing
//!
//! Minimal delimited-text layer shared by the genotype and pipeline
//! files: CSV or TAB delimited rows with double-quote quoting, quotes
//! escaped by doubling, and embedded newlines allowed inside quoted
//! fields. Unix line endings on output; `\r\n` tolerated on input.

use std::io::{BufRead, Write};

use crate::error::{PhyloscanError, Result};

/// Field delimiter of a flat file
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FlatFileFormat {
    /// Comma separated values
    #[default]
    Csv,
    /// Tab separated values
    Tab,
}

impl FlatFileFormat {
    fn delimiter(self) -> char {
        match self {
            FlatFileFormat::Csv => ',',
            FlatFileFormat::Tab => '\t',
        }
    }
}

/// Reads delimited rows from a buffered source
pub struct FlatFileReader<R: BufRead> {
    reader: R,
    format: FlatFileFormat,
    line: u64,
}

impl<R: BufRead> FlatFileReader<R> {
    pub fn new(reader: R, format: FlatFileFormat) -> Self {
        Self {
            reader,
            format,
            line: 0,
        }
    }

    /// One-based line number of the last row read
    pub fn line(&self) -> u64 {
        self.line
    }

    /// Read the next record, or `None` at end of input. Blank lines are
    /// skipped.
    pub fn read_row(&mut self) -> Result<Option<Vec<String>>> {
        let delimiter = self.format.delimiter();
        let mut fields: Vec<String> = Vec::new();
        let mut field = String::new();
        let mut in_quotes = false;
        let mut started = false;
        let mut line = String::new();

        loop {
            line.clear();
            if self.reader.read_line(&mut line)? == 0 {
                if !started {
                    return Ok(None);
                }
                if in_quotes {
                    return Err(PhyloscanError::bad_input(format!(
                        "unterminated quoted field at line {}",
                        self.line
                    )));
                }
                break;
            }
            self.line += 1;

            let trimmed = line.trim_end_matches(&['\n', '\r'][..]);
            if !started && !in_quotes && trimmed.is_empty() {
                continue;
            }
            started = true;

            let mut chars = trimmed.chars().peekable();
            while let Some(c) = chars.next() {
                if in_quotes {
                    if c == '"' {
                        if chars.peek() == Some(&'"') {
                            chars.next();
                            field.push('"');
                        } else {
                            in_quotes = false;
                        }
                    } else {
                        field.push(c);
                    }
                } else if c == '"' && field.is_empty() {
                    in_quotes = true;
                } else if c == delimiter {
                    fields.push(std::mem::take(&mut field));
                } else {
                    field.push(c);
                }
            }

            if in_quotes {
                // the quoted field continues on the next physical line
                field.push('\n');
            } else {
                break;
            }
        }

        fields.push(field);
        Ok(Some(fields))
    }
}

/// Writes delimited rows to a sink
pub struct FlatFileWriter<W: Write> {
    writer: W,
    format: FlatFileFormat,
}

impl<W: Write> FlatFileWriter<W> {
    pub fn new(writer: W, format: FlatFileFormat) -> Self {
        Self { writer, format }
    }

    /// Write one record, quoting fields that need it
    pub fn write_row<S: AsRef<str>>(&mut self, row: &[S]) -> Result<()> {
        let delimiter = self.format.delimiter();
        let mut out = String::new();
        for (i, value) in row.iter().enumerate() {
            if i > 0 {
                out.push(delimiter);
            }
            let value = value.as_ref();
            if value.contains(&[delimiter, '"', '\n', '\r'][..]) {
                out.push('"');
                for c in value.chars() {
                    if c == '"' {
                        out.push('"');
                    }
                    out.push(c);
                }
                out.push('"');
            } else {
                out.push_str(value);
            }
        }
        out.push('\n');
        self.writer.write_all(out.as_bytes())?;
        Ok(())
    }

    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn read_all(text: &str, format: FlatFileFormat) -> Vec<Vec<String>> {
        let mut reader = FlatFileReader::new(Cursor::new(text.to_string()), format);
        let mut out = Vec::new();
        while let Some(row) = reader.read_row().unwrap() {
            out.push(row);
        }
        out
    }

    #[test]
    fn test_plain_rows() {
        let rows = read_all("a,b,c\n1,2,3\n", FlatFileFormat::Csv);
        assert_eq!(rows, vec![vec!["a", "b", "c"], vec!["1", "2", "3"]]);
    }

    #[test]
    fn test_tab_delimited_rows() {
        let rows = read_all("a\tb\nc\td\n", FlatFileFormat::Tab);
        assert_eq!(rows, vec![vec!["a", "b"], vec!["c", "d"]]);
    }

    #[test]
    fn test_quoted_fields() {
        let rows = read_all("\"x,y\",\"he said \"\"hi\"\"\",z\n", FlatFileFormat::Csv);
        assert_eq!(rows, vec![vec!["x,y", "he said \"hi\"", "z"]]);
    }

    #[test]
    fn test_crlf_and_blank_lines() {
        let rows = read_all("a,b\r\n\r\nc,d\r\n", FlatFileFormat::Csv);
        assert_eq!(rows, vec![vec!["a", "b"], vec!["c", "d"]]);
    }

    #[test]
    fn test_write_quotes_only_when_needed() {
        let mut buffer = Vec::new();
        {
            let mut writer = FlatFileWriter::new(&mut buffer, FlatFileFormat::Csv);
            writer.write_row(&["plain", "with,comma", "with\"quote"]).unwrap();
            writer.flush().unwrap();
        }
        assert_eq!(
            String::from_utf8(buffer).unwrap(),
            "plain,\"with,comma\",\"with\"\"quote\"\n"
        );
    }

    #[test]
    fn test_round_trip_with_embedded_newline() {
        let mut buffer = Vec::new();
        {
            let mut writer = FlatFileWriter::new(&mut buffer, FlatFileFormat::Csv);
            writer.write_row(&["a\nb", "c"]).unwrap();
        }
        let rows = read_all(&String::from_utf8(buffer).unwrap(), FlatFileFormat::Csv);
        assert_eq!(rows, vec![vec!["a\nb", "c"]]);
    }

    #[test]
    fn test_unterminated_quote_is_rejected() {
        let mut reader = FlatFileReader::new(
            Cursor::new("\"never closed\n".to_string()),
            FlatFileFormat::Csv,
        );
        assert!(matches!(
            reader.read_row(),
            Err(PhyloscanError::BadInputFormat { .. })
        ));
    }
}
