//! Header-driven CSV decoding for hotel imports.
//!
//! The decoder turns an uploaded byte buffer into [`RawRow`]s keyed by the
//! header's column names. Blank lines are skipped and never counted as rows,
//! while a row whose width differs from the header, or broken quoting, aborts
//! the whole decode.

use std::collections::HashMap;

use csv::{ReaderBuilder, StringRecord, Trim};
use thiserror::Error;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Fatal decode failures. Any of these rejects the whole upload.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("Invalid Record Length: columns length is {expected}, got {found} on line {line}")]
    InconsistentColumns {
        line: u64,
        expected: usize,
        found: usize,
    },
    #[error("{0}")]
    Malformed(String),
}

impl From<csv::Error> for DecodeError {
    fn from(err: csv::Error) -> Self {
        DecodeError::Malformed(err.to_string())
    }
}

/// One decoded data line as a column name to raw value mapping.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawRow {
    values: HashMap<String, String>,
}

impl RawRow {
    fn from_record(header: &StringRecord, record: &StringRecord) -> Self {
        header
            .iter()
            .zip(record.iter())
            .map(|(column, value)| (column.to_string(), value.to_string()))
            .collect()
    }

    /// Raw value for `column`, or `None` when the header has no such column.
    pub fn get(&self, column: &str) -> Option<&str> {
        self.values.get(column).map(String::as_str)
    }

}

impl<K, V> FromIterator<(K, V)> for RawRow
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(column, value)| (column.into(), value.into()))
                .collect(),
        }
    }
}

/// Decode `buffer` into rows, in input order.
///
/// The first non-blank line is the header. An empty or whitespace-only buffer
/// yields no rows rather than an error; callers decide what zero rows means.
pub fn decode(buffer: &[u8]) -> Result<Vec<RawRow>, DecodeError> {
    let buffer = buffer.strip_prefix(UTF8_BOM).unwrap_or(buffer);
    check_quotes(buffer)?;

    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(buffer);

    let mut header: Option<StringRecord> = None;
    let mut rows = Vec::new();

    for result in reader.records() {
        let record = result?;
        if is_blank(&record) {
            continue;
        }

        let Some(columns) = header.as_ref() else {
            header = Some(record);
            continue;
        };

        if record.len() != columns.len() {
            return Err(DecodeError::InconsistentColumns {
                line: record.position().map(|pos| pos.line()).unwrap_or_default(),
                expected: columns.len(),
                found: record.len(),
            });
        }

        rows.push(RawRow::from_record(columns, &record));
    }

    log::debug!("decoded {} csv rows", rows.len());
    Ok(rows)
}

/// The reader treats a stray quote as data and lets an unclosed one run to
/// the end of the input, so quoting is checked up front.
fn check_quotes(buffer: &[u8]) -> Result<(), DecodeError> {
    let mut line: u64 = 1;
    let mut opened_on: Option<u64> = None;
    let mut field_start = true;
    let mut after_close = false;
    let mut bytes = buffer.iter().copied().peekable();

    while let Some(byte) = bytes.next() {
        if opened_on.is_some() {
            match byte {
                b'"' if bytes.peek() == Some(&b'"') => {
                    bytes.next();
                }
                b'"' => {
                    opened_on = None;
                    after_close = true;
                }
                b'\n' => line += 1,
                _ => {}
            }
            continue;
        }

        match byte {
            b',' => {
                field_start = true;
                after_close = false;
            }
            b'\n' => {
                line += 1;
                field_start = true;
                after_close = false;
            }
            b'\r' => {}
            b'"' if field_start => {
                opened_on = Some(line);
                field_start = false;
            }
            b'"' => {
                return Err(DecodeError::Malformed(format!(
                    "Invalid Opening Quote: a quote is found inside a field at line {line}"
                )));
            }
            b' ' | b'\t' if after_close => {}
            _ if after_close => {
                return Err(DecodeError::Malformed(format!(
                    "Invalid Closing Quote: unexpected character after a closing quote at line {line}"
                )));
            }
            _ => field_start = false,
        }
    }

    match opened_on {
        Some(opened) => Err(DecodeError::Malformed(format!(
            "Quote Not Closed: the parsing is finished with an opening quote at line {opened}"
        ))),
        None => Ok(()),
    }
}

// A whitespace-only line trims down to a single empty field.
fn is_blank(record: &StringRecord) -> bool {
    record.len() <= 1 && record.iter().all(str::is_empty)
}
