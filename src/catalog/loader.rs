//! Task table readers for spreadsheet and CSV sources
//!
//! Both formats share one layout: a header row, then one task per row with
//! task id, comma-separated keywords and canned answer in the first three
//! columns. Extra columns are ignored.

use super::{CatalogError, TaskRecord, TaskTable};
use calamine::{open_workbook_auto, Data, Reader};
use std::path::Path;
use tracing::{debug, info};

const SPREADSHEET_EXTENSIONS: &[&str] = &["xlsx", "xlsm", "xlsb", "xls", "ods"];

/// Load a task table, choosing the reader from the file extension.
///
/// `sheet` selects a worksheet by name; spreadsheets default to the first
/// sheet. It is ignored for CSV files.
pub fn load_table(path: &Path, sheet: Option<&str>) -> Result<TaskTable, CatalogError> {
    if !path.exists() {
        return Err(CatalogError::NotFound(path.display().to_string()));
    }

    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_lowercase)
        .unwrap_or_default();

    let records = if extension == "csv" {
        read_csv(path)?
    } else if SPREADSHEET_EXTENSIONS.contains(&extension.as_str()) {
        read_spreadsheet(path, sheet)?
    } else {
        return Err(CatalogError::UnsupportedFormat(extension));
    };

    let table = TaskTable::from_records(records);
    info!(
        path = %path.display(),
        entries = table.keywords.len(),
        answers = table.answers.len(),
        "Loaded task table"
    );
    Ok(table)
}

fn read_spreadsheet(path: &Path, sheet: Option<&str>) -> Result<Vec<TaskRecord>, CatalogError> {
    let mut workbook = open_workbook_auto(path)
        .map_err(|e| CatalogError::Spreadsheet(format!("failed to open workbook: {e}")))?;

    let sheet_names = workbook.sheet_names();
    let sheet_name = match sheet {
        Some(name) => sheet_names
            .iter()
            .find(|candidate| candidate.as_str() == name)
            .cloned()
            .ok_or_else(|| CatalogError::Spreadsheet(format!("sheet '{name}' not found")))?,
        None => sheet_names.first().cloned().ok_or(CatalogError::EmptySheet)?,
    };

    let range = workbook
        .worksheet_range(&sheet_name)
        .map_err(|e| CatalogError::Spreadsheet(format!("failed to read sheet '{sheet_name}': {e}")))?;

    debug!(sheet = %sheet_name, rows = range.height(), "Reading worksheet");

    let records = range
        .rows()
        .skip(1)
        .map(|row| {
            let cells: Vec<String> = row.iter().map(cell_to_string).collect();
            TaskRecord::from_cells(&cells)
        })
        .collect();

    Ok(records)
}

fn read_csv(path: &Path) -> Result<Vec<TaskRecord>, CatalogError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)?;

    let mut records = Vec::new();
    for row in reader.records() {
        let row = row?;
        let cells: Vec<String> = row.iter().map(str::to_string).collect();
        records.push(TaskRecord::from_cells(&cells));
    }

    Ok(records)
}

/// Render a spreadsheet cell as text; whole floats lose their `.0`
pub(crate) fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Int(i) => i.to_string(),
        Data::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", *f as i64),
        Data::Float(f) => f.to_string(),
        Data::String(s) => s.clone(),
        Data::Bool(b) => b.to_string(),
        Data::DateTime(dt) => dt.to_string(),
        Data::DateTimeIso(s) => s.clone(),
        Data::DurationIso(s) => s.clone(),
        Data::Error(_) | Data::Empty => String::new(),
    }
}
