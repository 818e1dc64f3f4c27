use std::ffi::OsString;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::types::{COLUMNS, ContactRecord, columns_for};

use rust_xlsxwriter::{ColNum, Format, RowNum, Workbook, XlsxError};

/// Byte order mark so spreadsheet tools detect UTF-8.
const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Longest string a single worksheet cell accepts.
pub const XLSX_MAX_CELL_CHARS: usize = 32_767;

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("XLSX error: {0}")]
    Xlsx(#[from] XlsxError),
    #[error("Too many rows for a worksheet: {0}")]
    TooManyRows(usize),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportPaths {
    pub csv: PathBuf,
    pub xlsx: PathBuf,
}

impl ExportPaths {
    /// `<stem>.csv` and `<stem>.xlsx`, keeping any dots already in the stem.
    pub fn from_stem(stem: impl AsRef<Path>) -> Self {
        let with_ext = |ext: &str| {
            let mut name = OsString::from(stem.as_ref().as_os_str());
            name.push(ext);
            PathBuf::from(name)
        };
        Self {
            csv: with_ext(".csv"),
            xlsx: with_ext(".xlsx"),
        }
    }
}

pub fn export_csv(records: &[ContactRecord], path: impl AsRef<Path>) -> Result<(), ExportError> {
    let columns = columns_for(records);
    let include_error = columns.len() == COLUMNS.len();

    let mut file = File::create(path.as_ref())?;
    file.write_all(UTF8_BOM)?;

    let mut writer = csv::Writer::from_writer(file);
    writer.write_record(columns)?;
    for record in records {
        writer.write_record(record.row(include_error))?;
    }
    writer.flush()?;

    log::info!("Wrote {} rows to {}", records.len(), path.as_ref().display());
    Ok(())
}

pub fn export_xlsx(records: &[ContactRecord], path: impl AsRef<Path>) -> Result<(), ExportError> {
    let columns = columns_for(records);
    let include_error = columns.len() == COLUMNS.len();

    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    let header = Format::new().set_bold();

    for (col, name) in columns.iter().enumerate() {
        worksheet.write_string_with_format(0, col as ColNum, *name, &header)?;
    }

    for (i, record) in records.iter().enumerate() {
        let row = RowNum::try_from(i + 1).map_err(|_| ExportError::TooManyRows(records.len()))?;
        for (col, value) in record.row(include_error).into_iter().enumerate() {
            if !value.is_empty() {
                worksheet.write_string(row, col as ColNum, fit_cell(value, &record.url, col))?;
            }
        }
    }

    workbook.save(path.as_ref())?;

    log::info!("Wrote {} rows to {}", records.len(), path.as_ref().display());
    Ok(())
}

/// Cuts a value down to what a worksheet cell can hold. The CSV keeps the
/// full text.
fn fit_cell(value: String, url: &str, col: usize) -> String {
    if value.chars().count() <= XLSX_MAX_CELL_CHARS {
        return value;
    }
    log::warn!(
        "Truncating {} column for {} to {} characters in XLSX",
        COLUMNS[col],
        url,
        XLSX_MAX_CELL_CHARS
    );
    value.chars().take(XLSX_MAX_CELL_CHARS).collect()
}

/// Writes the same table as CSV and XLSX next to each other, replacing
/// any previous run's files.
pub fn export_all(
    records: &[ContactRecord],
    stem: impl AsRef<Path>,
) -> Result<ExportPaths, ExportError> {
    let paths = ExportPaths::from_stem(stem);
    export_csv(records, &paths.csv)?;
    export_xlsx(records, &paths.xlsx)?;
    Ok(paths)
}
