use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

use chrono::Local;
use log::{error, info};
use serde::Serialize;

use crate::quiz::error::ExportError;
use crate::quiz::session::ResultRow;

const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";
const OPTION_SEPARATOR: &str = " | ";

#[derive(Serialize)]
struct CsvRow<'a> {
    question_number: usize,
    question: &'a str,
    question_type: &'static str,
    user_answer: &'a str,
    correct_answer: &'a str,
    options: String,
    is_correct: bool,
}

impl<'a> From<&'a ResultRow> for CsvRow<'a> {
    fn from(row: &'a ResultRow) -> Self {
        CsvRow {
            question_number: row.question_number,
            question: &row.question,
            question_type: row.question_type.label(),
            user_answer: row.user_answer.as_deref().unwrap_or(""),
            correct_answer: &row.correct_answer,
            options: row.options.join(OPTION_SEPARATOR),
            is_correct: row.is_correct,
        }
    }
}

fn validate_name(name: &str) -> Result<&str, ExportError> {
    let name = name.trim();
    let is_plain = !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(&['/', '\\'][..]);
    if is_plain {
        Ok(name)
    } else {
        Err(ExportError::InvalidName(name.to_string()))
    }
}

/// Writes one CSV row per result under `dir`, creating it if needed.
///
/// The file is named `{name}_{timestamp}.csv`. An existing file is never
/// overwritten; a `_N` counter is appended until the name is free.
pub fn write_results(
    results: &[ResultRow],
    dir: &Path,
    name: &str,
) -> Result<PathBuf, ExportError> {
    if results.is_empty() {
        return Err(ExportError::NoResults);
    }
    let name = validate_name(name)?;
    let stem = format!("{}_{}", name, Local::now().format(TIMESTAMP_FORMAT));

    match save(results, dir, &stem) {
        Ok(path) => {
            info!("Results saved to {:?}", path);
            Ok(path)
        }
        Err(e) => {
            error!("Error saving results to CSV: {}", e);
            Err(e)
        }
    }
}

fn save(results: &[ResultRow], dir: &Path, stem: &str) -> Result<PathBuf, ExportError> {
    fs::create_dir_all(dir).map_err(|source| ExportError::Io {
        path: dir.to_path_buf(),
        source,
    })?;

    let (path, file) = create_unique(dir, stem)?;
    let mut writer = csv::Writer::from_writer(file);
    for row in results {
        writer.serialize(CsvRow::from(row))?;
    }
    match writer.flush() {
        Ok(()) => Ok(path),
        Err(source) => Err(ExportError::Io { path, source }),
    }
}

fn create_unique(dir: &Path, stem: &str) -> Result<(PathBuf, File), ExportError> {
    let mut counter = 0u32;
    loop {
        let file_name = match counter {
            0 => format!("{}.csv", stem),
            n => format!("{}_{}.csv", stem, n),
        };
        let path = dir.join(file_name);
        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => return Ok((path, file)),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => counter += 1,
            Err(source) => return Err(ExportError::Io { path, source }),
        }
    }
}
