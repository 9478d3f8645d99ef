//! Persist citation tables and listing snapshots.
//!
//! Bare file names land in the output directory. A path without an
//! `.xlsx` or `.csv` extension gets `.xlsx` appended. When the file already
//! exists and overwriting is off, a timestamp suffix is inserted before the
//! extension instead of failing.

use crate::error::OutputError;
use crate::model::{column_headers, OutputRow};
use chrono::{DateTime, Local};
use rust_xlsxwriter::{Format, Workbook};
use std::path::{Path, PathBuf};
use tracing::info;

/// Directory used for bare file names.
pub const DEFAULT_OUTPUT_DIR: &str = "output";

const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Where and how to write a table.
#[derive(Debug, Clone)]
pub struct OutputTarget {
    pub save_path: PathBuf,
    pub overwrite: bool,
    /// Directory prepended to bare file names.
    pub output_dir: PathBuf,
}

impl OutputTarget {
    pub fn new(save_path: impl Into<PathBuf>, overwrite: bool) -> Self {
        Self {
            save_path: save_path.into(),
            overwrite,
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
        }
    }

    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableFormat {
    Xlsx,
    Csv,
}

/// File name stem used when no save path is given.
pub fn default_save_name(now: DateTime<Local>) -> String {
    now.format(TIMESTAMP_FORMAT).to_string()
}

/// Apply extension and directory defaults to a requested save path.
pub fn normalize_save_path(save_path: &Path, output_dir: &Path) -> (PathBuf, TableFormat) {
    let (path, format) = match extension_lowercase(save_path).as_deref() {
        Some("csv") => (save_path.to_path_buf(), TableFormat::Csv),
        Some("xlsx") => (save_path.to_path_buf(), TableFormat::Xlsx),
        _ => {
            let mut raw = save_path.as_os_str().to_os_string();
            raw.push(".xlsx");
            (PathBuf::from(raw), TableFormat::Xlsx)
        }
    };

    let is_bare = path.parent().map_or(true, |p| p.as_os_str().is_empty());
    let path = if is_bare { output_dir.join(path) } else { path };
    (path, format)
}

/// Final destination for a table, avoiding collisions unless `overwrite`.
pub fn resolve_output_path(
    target: &OutputTarget,
    now: DateTime<Local>,
) -> (PathBuf, TableFormat) {
    let (path, format) = normalize_save_path(&target.save_path, &target.output_dir);
    if target.overwrite || !path.exists() {
        return (path, format);
    }

    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let ext = path.extension().map(|e| e.to_string_lossy().into_owned());
    let stamp = now.format(TIMESTAMP_FORMAT).to_string();
    let file_name = |attempt: u32| {
        let suffix = if attempt == 1 {
            stamp.clone()
        } else {
            format!("{stamp}_{attempt}")
        };
        match &ext {
            Some(ext) => format!("{stem}_{suffix}.{ext}"),
            None => format!("{stem}_{suffix}"),
        }
    };

    // Same-second collisions get a counter after the timestamp.
    let mut attempt = 1;
    let mut renamed = path.with_file_name(file_name(attempt));
    while renamed.exists() {
        attempt += 1;
        renamed = path.with_file_name(file_name(attempt));
    }
    info!(
        "file exists and overwrite is off, writing to {}",
        renamed.display()
    );
    (renamed, format)
}

/// Write `rows` as a table with one citation column per target year.
/// Returns the path actually written.
pub fn write_rows(
    rows: &[OutputRow],
    target_years: &[String],
    target: &OutputTarget,
) -> Result<PathBuf, OutputError> {
    let (path, format) = resolve_output_path(target, Local::now());
    ensure_parent(&path)?;

    let headers = column_headers(target_years);
    match format {
        TableFormat::Xlsx => write_xlsx(&path, &headers, rows)?,
        TableFormat::Csv => write_csv(&path, &headers, rows)?,
    }

    info!(rows = rows.len(), "data saved to {}", path.display());
    Ok(path)
}

/// Save the rendered listing for later inspection.
pub fn save_listing_snapshot(
    markup: &str,
    scholar_id: &str,
    output_dir: &Path,
    now: DateTime<Local>,
) -> Result<PathBuf, OutputError> {
    let path = output_dir.join(format!(
        "scholar_{scholar_id}_{}.html",
        now.format(TIMESTAMP_FORMAT)
    ));
    ensure_parent(&path)?;
    std::fs::write(&path, markup).map_err(|source| OutputError::Io {
        path: path.clone(),
        source,
    })?;
    info!("listing html saved to {}", path.display());
    Ok(path)
}

fn write_xlsx(path: &Path, headers: &[String], rows: &[OutputRow]) -> Result<(), OutputError> {
    let xlsx_err = |source| OutputError::Xlsx {
        path: path.to_path_buf(),
        source,
    };

    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    let bold = Format::new().set_bold();

    for (col, header) in headers.iter().enumerate() {
        worksheet
            .write_string_with_format(0, col as u16, header, &bold)
            .map_err(xlsx_err)?;
    }

    for (i, row) in rows.iter().enumerate() {
        let r = i as u32 + 1;
        worksheet.write_string(r, 0, &row.scholar_id).map_err(xlsx_err)?;
        worksheet.write_string(r, 1, &row.title).map_err(xlsx_err)?;
        worksheet
            .write_string(r, 2, &row.publication_year)
            .map_err(xlsx_err)?;
        for (j, value) in row.citation_values().into_iter().enumerate() {
            worksheet
                .write_number(r, (j + 3) as u16, value as f64)
                .map_err(xlsx_err)?;
        }
    }

    workbook.save(path).map_err(xlsx_err)
}

fn write_csv(path: &Path, headers: &[String], rows: &[OutputRow]) -> Result<(), OutputError> {
    let csv_err = |source| OutputError::Csv {
        path: path.to_path_buf(),
        source,
    };

    let mut wtr = csv::Writer::from_path(path).map_err(csv_err)?;
    wtr.write_record(headers).map_err(csv_err)?;

    for row in rows {
        let mut record = vec![
            row.scholar_id.clone(),
            row.title.clone(),
            row.publication_year.clone(),
        ];
        record.extend(row.citation_values().iter().map(i64::to_string));
        wtr.write_record(&record).map_err(csv_err)?;
    }

    wtr.flush().map_err(|source| OutputError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn ensure_parent(path: &Path) -> Result<(), OutputError> {
    let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) else {
        return Ok(());
    };
    std::fs::create_dir_all(parent).map_err(|source| OutputError::CreateDir {
        path: parent.to_path_buf(),
        source,
    })
}

fn extension_lowercase(path: &Path) -> Option<String> {
    path.extension()
        .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
}
