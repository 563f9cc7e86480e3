//! Identifier files: an Excel workbook or CSV export with a username column,
//! or a plain text list with one identifier per line.

use calamine::{open_workbook_auto, Data, Range, Reader};
use purge_core::{IdentifierSet, PurgeError};
use std::path::Path;

/// Header names that mark the identifier column, matched as case-insensitive
/// substrings. The first matching column wins.
const COLUMN_HINTS: &[&str] = &["username", "discord"];

pub fn load(path: &Path) -> purge_core::Result<IdentifierSet> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    match ext.as_str() {
        "txt" => Ok(from_lines(&std::fs::read_to_string(path)?)),
        "xlsx" | "xlsm" | "xls" | "ods" => from_workbook(path),
        _ => from_csv(std::fs::File::open(path)?),
    }
}

pub fn from_lines(content: &str) -> IdentifierSet {
    IdentifierSet::from_raw(content.lines())
}

pub fn from_csv<R: std::io::Read>(reader: R) -> purge_core::Result<IdentifierSet> {
    let mut rdr = csv::ReaderBuilder::new().flexible(true).from_reader(reader);
    let column = username_column(rdr.headers()?.iter())?;

    let mut set = IdentifierSet::new();
    for record in rdr.records() {
        let record = record?;
        if let Some(cell) = record.get(column) {
            set.extend_raw([cell]);
        }
    }
    Ok(set)
}

/// First worksheet of an Excel or OpenDocument workbook.
pub fn from_workbook(path: &Path) -> purge_core::Result<IdentifierSet> {
    let mut workbook =
        open_workbook_auto(path).map_err(|e| PurgeError::Spreadsheet(e.to_string()))?;
    let sheet = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| PurgeError::Spreadsheet("workbook has no sheets".into()))?;
    let range = workbook
        .worksheet_range(&sheet)
        .map_err(|e| PurgeError::Spreadsheet(e.to_string()))?;
    from_range(&range)
}

pub fn from_range(range: &Range<Data>) -> purge_core::Result<IdentifierSet> {
    let mut rows = range.rows();
    let header = rows.next().ok_or(PurgeError::NoUsernameColumn)?;
    let column = username_column(header.iter().map(|c| c.to_string()))?;

    let mut set = IdentifierSet::new();
    for row in rows {
        if let Some(cell) = row.get(column) {
            set.extend_raw([cell.to_string()]);
        }
    }
    Ok(set)
}

fn username_column<I, S>(headers: I) -> purge_core::Result<usize>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    headers
        .into_iter()
        .position(|h| {
            let h = h.as_ref().to_lowercase();
            COLUMN_HINTS.iter().any(|hint| h.contains(hint))
        })
        .ok_or(PurgeError::NoUsernameColumn)
}
