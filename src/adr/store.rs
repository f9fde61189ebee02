//! Numbered ADR files on disk.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex_lite::Regex;
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use crate::error::FileSystemError;

static NON_ALNUM_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-z0-9]+").expect("Invalid regex"));

static NUMBER_PREFIX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{4})-").expect("Invalid regex"));

/// Path of the written ADR, or why it could not be written.
pub type SaveResult = Result<PathBuf, FileSystemError>;

/// Lowercase `title` and collapse every non-alphanumeric run into one hyphen.
///
/// A title with no ASCII alphanumerics yields an empty slug.
pub fn slugify(title: &str) -> String {
    let lower = title.to_lowercase();
    NON_ALNUM_RE
        .replace_all(&lower, "-")
        .trim_matches('-')
        .to_string()
}

/// `NNNN-slug.md`.
pub fn adr_filename(number: u32, title: &str) -> String {
    format!("{:04}-{}.md", number, slugify(title))
}

/// Number of an ADR filename, if it starts with exactly four digits and a hyphen.
pub fn parse_number(file_name: &str) -> Option<u32> {
    NUMBER_PREFIX_RE
        .captures(file_name)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// One past the highest existing ADR number in `dir`.
///
/// Returns 1 when the directory is missing, holds no numbered files, or
/// cannot be read.
pub fn next_number(dir: &Path) -> u32 {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return 1,
        Err(e) => {
            warn!(dir = %dir.display(), error = %e, "Could not scan ADR directory; starting at 1");
            return 1;
        }
    };

    entries
        .filter_map(Result::ok)
        .filter_map(|entry| entry.file_name().to_str().and_then(parse_number))
        .max()
        .map_or(1, |highest| highest + 1)
}

/// Create `dir` and its parents. An existing directory is fine.
pub fn ensure_directory(dir: &Path) -> Result<(), FileSystemError> {
    fs::create_dir_all(dir).map_err(|e| FileSystemError::from_io(dir, e))
}

/// Write `content` as the next numbered ADR in `dir`.
pub fn save(content: &str, title: &str, dir: &Path) -> SaveResult {
    ensure_directory(dir)?;
    save_from(dir, next_number(dir), title, content)
}

/// Write `content` as ADR `number` in an existing `dir`.
///
/// If that filename is already taken, `number + 1` is tried once before
/// giving up.
pub fn save_from(dir: &Path, number: u32, title: &str, content: &str) -> SaveResult {
    let path = match write_new(dir, number, title, content) {
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
            warn!(
                number,
                "ADR number taken while saving; retrying with the next number"
            );
            write_new(dir, number + 1, title, content)
                .map_err(|e| FileSystemError::from_io(dir.join(adr_filename(number + 1, title)), e))?
        }
        Err(e) => return Err(FileSystemError::from_io(dir.join(adr_filename(number, title)), e)),
        Ok(path) => path,
    };

    info!(path = %path.display(), "ADR saved");
    Ok(path)
}

/// Write through a temp file and refuse to replace an existing file.
fn write_new(dir: &Path, number: u32, title: &str, content: &str) -> io::Result<PathBuf> {
    let path = dir.join(adr_filename(number, title));
    debug!(path = %path.display(), "Writing ADR");

    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(content.as_bytes())?;
    if !content.ends_with('\n') {
        tmp.write_all(b"\n")?;
    }
    tmp.persist_noclobber(&path).map_err(|e| e.error)?;
    Ok(path)
}
