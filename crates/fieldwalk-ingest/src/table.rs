//! Reading uploaded tabular payloads.
//!
//! Delimited text and spreadsheets are both turned into a header row plus a
//! lazy sequence of string rows. Column meaning is decided later by the
//! normalizer.

use std::io::Cursor;

use calamine::{Data, Range, Reader, open_workbook_auto_from_rs};
use fieldwalk_core::{Error, Result};

/// Row stream of a table. Cells are raw strings, not yet trimmed.
///
/// Delimited text is parsed row by row. Workbooks are decoded whole by the
/// reader and each row is turned into strings only when it is pulled.
pub type Rows = Box<dyn Iterator<Item = Vec<String>> + Send>;

/// A parsed table: a header row and the data rows beneath it.
pub struct Table {
    /// Header cells as they appear in the file
    pub headers: Vec<String>,
    /// Data rows
    pub rows: Rows,
}

impl Table {
    /// Builds a table from in-memory rows.
    pub fn from_rows(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self {
            headers,
            rows: Box::new(rows.into_iter()),
        }
    }
}

impl std::fmt::Debug for Table {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Table")
            .field("headers", &self.headers)
            .finish_non_exhaustive()
    }
}

/// Supported payload families.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TabularFormat {
    /// CSV/TSV and friends
    Delimited,
    /// Excel and OpenDocument workbooks
    Spreadsheet,
}

impl TabularFormat {
    /// Picks the format from a file name's extension.
    pub fn from_file_name(name: &str) -> Result<Self> {
        let ext = name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "csv" | "tsv" | "txt" => Ok(Self::Delimited),
            "xlsx" | "xlsm" | "xls" | "xlsb" | "ods" => Ok(Self::Spreadsheet),
            _ => Err(Error::unsupported_format(name)),
        }
    }
}

/// Parses a payload according to its file name.
pub fn read_table(name: &str, bytes: Vec<u8>) -> Result<Table> {
    match TabularFormat::from_file_name(name)? {
        TabularFormat::Delimited => read_delimited(bytes),
        TabularFormat::Spreadsheet => read_spreadsheet(bytes),
    }
}

/// Parses delimited text. The delimiter is sniffed from the first lines.
pub fn read_delimited(bytes: Vec<u8>) -> Result<Table> {
    let content = decode_text(bytes);
    let delimiter = sniff_delimiter(&content);

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(true)
        .from_reader(Cursor::new(content.into_bytes()));

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| Error::schema(format!("unreadable header row: {e}"), Vec::new()))?
        .iter()
        .map(str::to_string)
        .collect();

    let rows = reader
        .into_records()
        .enumerate()
        .filter_map(|(idx, result)| match result {
            Ok(record) => Some(record.iter().map(str::to_string).collect()),
            Err(e) => {
                tracing::warn!(row = idx + 2, error = %e, "Skipping unreadable row");
                None
            }
        });

    Ok(Table {
        headers,
        rows: Box::new(rows),
    })
}

/// Parses the first worksheet of a workbook. Row 1 is the header.
pub fn read_spreadsheet(bytes: Vec<u8>) -> Result<Table> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))
        .map_err(|e| Error::validation_field("file", format!("failed to open spreadsheet: {e}")))?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| Error::schema("spreadsheet contains no sheets", Vec::new()))?
        .map_err(|e| Error::validation_field("file", format!("failed to read sheet: {e}")))?;

    // The sheet is decoded up front; rows are rendered to text as they are read.
    let (height, width) = range.get_size();
    let headers = if height > 0 {
        row_text(&range, 0, width)
    } else {
        Vec::new()
    };
    let rows = (1..height).map(move |row| row_text(&range, row, width));

    Ok(Table {
        headers,
        rows: Box::new(rows),
    })
}

fn row_text(range: &Range<Data>, row: usize, width: usize) -> Vec<String> {
    (0..width)
        .map(|col| range.get((row, col)).map(cell_text).unwrap_or_default())
        .collect()
}

/// Renders a cell as text. Whole floats lose their `.0` so numeric ids survive.
fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", *f as i64),
        other => other.to_string(),
    }
}

/// UTF-8 first (BOM stripped); EUC-KR for legacy spreadsheet exports.
fn decode_text(bytes: Vec<u8>) -> String {
    match String::from_utf8(bytes) {
        Ok(s) => match s.strip_prefix('\u{feff}') {
            Some(stripped) => stripped.to_string(),
            None => s,
        },
        Err(e) => {
            let bytes = e.into_bytes();
            let (decoded, _, _) = encoding_rs::EUC_KR.decode(&bytes);
            decoded.into_owned()
        }
    }
}

/// Picks the delimiter that splits the first lines most consistently.
fn sniff_delimiter(content: &str) -> u8 {
    let candidates = [b',', b'\t', b';', b'|'];
    let sample: Vec<&str> = content.lines().take(10).collect();

    let mut best = b',';
    let mut best_score = 0usize;

    for &delim in &candidates {
        let counts: Vec<usize> = sample
            .iter()
            .map(|line| {
                csv::ReaderBuilder::new()
                    .delimiter(delim)
                    .has_headers(false)
                    .flexible(true)
                    .from_reader(line.as_bytes())
                    .records()
                    .next()
                    .and_then(|r| r.ok())
                    .map(|r| r.len())
                    .unwrap_or(1)
            })
            .collect();

        let Some(&target) = counts.first() else {
            continue;
        };
        if target <= 1 {
            continue;
        }
        let consistent = counts.iter().filter(|&&c| c == target).count();
        let score = consistent * target;
        if score > best_score {
            best_score = score;
            best = delim;
        }
    }

    best
}
