//! Upload resolution: answer straight from an uploaded CSV when one carries an
//! `answer` column, otherwise let the caller fall through to the model.
//!
//! Every call stages files in its own `tempfile::TempDir` below the configured scratch
//! root, so concurrent uploads never share paths and everything is removed when the
//! guard drops, on success and on every error path.

use std::fs;
use std::io::{self, Cursor};
use std::path::{Component, Path, PathBuf};

use bytes::Bytes;
use thiserror::Error;

/// Name of the column whose first value is returned as the answer.
pub const ANSWER_COLUMN: &str = "answer";

const EXTRACT_DIR: &str = "extracted";

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("scratch storage error: {0}")]
    Io(#[from] io::Error),
    #[error("invalid zip archive: {0}")]
    Zip(#[from] zip::result::ZipError),
    #[error("invalid csv: {0}")]
    Csv(#[from] csv::Error),
}

/// A file received alongside a question.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub filename: String,
    pub bytes: Bytes,
}

impl UploadedFile {
    pub fn new(filename: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        Self {
            filename: filename.into(),
            bytes: bytes.into(),
        }
    }

    fn is_zip(&self) -> bool {
        self.filename.ends_with(".zip")
    }

    fn is_csv(&self) -> bool {
        self.filename.ends_with(".csv")
    }
}

#[derive(Debug, Clone)]
pub struct UploadResolver {
    scratch_root: PathBuf,
    accept_bare_csv: bool,
}

impl UploadResolver {
    /// `accept_bare_csv` extends the CSV shortcut to uploads that are not wrapped in a ZIP.
    pub fn new(scratch_root: impl Into<PathBuf>, accept_bare_csv: bool) -> Self {
        Self {
            scratch_root: scratch_root.into(),
            accept_bare_csv,
        }
    }

    pub fn scratch_root(&self) -> &Path {
        &self.scratch_root
    }

    /// Resolve an optional upload to a ready answer. `None` means "ask the model".
    /// Errors are logged and treated as "no answer".
    pub fn resolve(&self, file: Option<&UploadedFile>) -> Option<String> {
        let file = file?;
        match self.try_resolve(file) {
            Ok(answer) => answer,
            Err(e) => {
                tracing::warn!(error = %e, filename = %file.filename, "upload could not be read, falling back to model");
                None
            }
        }
    }

    /// Same as `resolve` but reports staging, archive and CSV errors.
    pub fn try_resolve(&self, file: &UploadedFile) -> Result<Option<String>, UploadError> {
        let handles_csv = self.accept_bare_csv && file.is_csv();
        if !file.is_zip() && !handles_csv {
            tracing::debug!(filename = %file.filename, "upload is not a zip; no direct answer");
            return Ok(None);
        }

        fs::create_dir_all(&self.scratch_root)?;
        let scratch = tempfile::Builder::new()
            .prefix("upload-")
            .tempdir_in(&self.scratch_root)?;

        let stored = scratch.path().join(safe_file_name(&file.filename));
        fs::write(&stored, &file.bytes)?;

        let csv_path = if file.is_zip() {
            let target = scratch.path().join(EXTRACT_DIR);
            fs::create_dir_all(&target)?;
            match extract_zip(&stored, &target)? {
                Some(p) => p,
                None => {
                    tracing::debug!(filename = %file.filename, "zip contains no top-level csv");
                    return Ok(None);
                }
            }
        } else {
            stored
        };

        let answer = first_answer_cell(&csv_path)?;
        if answer.is_some() {
            tracing::info!(filename = %file.filename, "answer read from uploaded csv");
        }
        Ok(answer)
    }
}

/// Strip any directory part a client put in the upload name.
fn safe_file_name(name: &str) -> String {
    Path::new(name)
        .file_name()
        .and_then(|n| n.to_str())
        .filter(|n| !n.is_empty())
        .unwrap_or("upload")
        .to_string()
}

/// Unpack `archive` into `target` and return the first top-level `.csv` entry in archive order.
/// Entries whose names would escape `target` are skipped.
fn extract_zip(archive: &Path, target: &Path) -> Result<Option<PathBuf>, UploadError> {
    let reader = Cursor::new(fs::read(archive)?);
    let mut zip = zip::ZipArchive::new(reader)?;
    let mut first_csv: Option<PathBuf> = None;

    for i in 0..zip.len() {
        let mut entry = zip.by_index(i)?;
        let Some(rel) = entry.enclosed_name() else {
            tracing::warn!(name = %entry.name(), "skipping zip entry with unsafe path");
            continue;
        };
        let out = target.join(&rel);

        if entry.is_dir() {
            fs::create_dir_all(&out)?;
            continue;
        }
        if let Some(parent) = out.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut f = fs::File::create(&out)?;
        io::copy(&mut entry, &mut f)?;

        let top_level = rel.components().count() == 1
            && matches!(rel.components().next(), Some(Component::Normal(_)));
        if first_csv.is_none() && top_level && rel.to_string_lossy().ends_with(".csv") {
            first_csv = Some(out);
        }
    }

    Ok(first_csv)
}

/// First data-row value of the `answer` column, if the column and a row exist.
fn first_answer_cell(path: &Path) -> Result<Option<String>, UploadError> {
    let mut rdr = csv::ReaderBuilder::new().flexible(true).from_path(path)?;

    let idx = rdr
        .headers()?
        .iter()
        .position(|h| h.trim_start_matches('\u{feff}') == ANSWER_COLUMN);
    let Some(idx) = idx else {
        return Ok(None);
    };

    match rdr.records().next() {
        Some(record) => Ok(record?.get(idx).map(str::to_string)),
        None => Ok(None),
    }
}
