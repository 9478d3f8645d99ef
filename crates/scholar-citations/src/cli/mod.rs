//! Command-line surface of the `scholar-citations` binary.

pub mod extract_cmd;
pub mod output;

use crate::error::ConfigError;
use crate::years::YearSpec;
use clap::{ArgGroup, Parser};
use std::path::{Path, PathBuf};

/// Harvest per-year citation counts from a Google Scholar profile.
#[derive(Debug, Parser)]
#[command(name = "scholar-citations", version, about, long_about = None)]
#[command(group(ArgGroup::new("identity").required(true).multiple(false).args(["scholar_id", "from_txt"])))]
pub struct Cli {
    /// Scholar profile id (the `user=` parameter of the profile URL)
    #[arg(short = 's', long)]
    pub scholar_id: Option<String>,

    /// Text file with one scholar id per line
    #[arg(long, value_name = "FILE")]
    pub from_txt: Option<PathBuf>,

    /// Publication year or inclusive range, e.g. 2023 or 2020:2023
    #[arg(short = 'y', long, default_value_t = YearSpec::current())]
    pub year: YearSpec,

    /// Output file; `.csv` writes CSV, anything else becomes `.xlsx`
    #[arg(short = 'o', long, value_name = "PATH")]
    pub save_path: Option<PathBuf>,

    /// Replace an existing output file instead of adding a timestamp
    #[arg(long)]
    pub overwrite: bool,

    /// Also save the expanded profile listing as HTML
    #[arg(long)]
    pub save_html: bool,

    /// Print run reports as JSON on stdout
    #[arg(long)]
    pub json: bool,

    /// Suppress the progress bar and summary
    #[arg(short, long)]
    pub quiet: bool,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,
}

/// Read scholar ids from a batch file. Blank lines and `#` comments are
/// skipped.
pub fn load_batch_ids(path: &Path) -> Result<Vec<String>, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::BatchFileMissing(path.to_path_buf()));
    }
    let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::BatchFileUnreadable {
        path: path.to_path_buf(),
        source,
    })?;

    let ids: Vec<String> = raw
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect();

    if ids.is_empty() {
        return Err(ConfigError::BatchFileEmpty(path.to_path_buf()));
    }
    Ok(ids)
}

/// Save path for one id of a batch: `<base>_<id>` with the extension kept,
/// or `<id>` when no base was given.
pub fn batch_save_path(base: Option<&Path>, scholar_id: &str) -> PathBuf {
    let Some(base) = base else {
        return PathBuf::from(scholar_id);
    };
    let stem = base
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let file_name = match base.extension() {
        Some(ext) => format!("{stem}_{scholar_id}.{}", ext.to_string_lossy()),
        None => format!("{stem}_{scholar_id}"),
    };
    base.with_file_name(file_name)
}
