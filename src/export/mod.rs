//! Serializers for the current view. Both formats omit the expense id and write
//! through a temporary file that only replaces the destination once complete.

mod csv_file;
mod pdf_report;

use std::fs::File;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tempfile::NamedTempFile;

pub use csv_file::{read_csv, write_csv, CsvRow, CSV_HEADER};
pub use pdf_report::{render_pdf, REPORT_TITLE};

/// Column headings shared by both export formats.
pub const EXPORT_COLUMNS: [&str; 3] = ["Amount", "Category", "Time"];

#[cfg(unix)]
const EXPORT_MODE: u32 = 0o644;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportKind {
    Csv,
    Pdf,
}

impl ExportKind {
    pub fn extension(self) -> &'static str {
        match self {
            ExportKind::Csv => "csv",
            ExportKind::Pdf => "pdf",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ExportKind::Csv => "CSV",
            ExportKind::Pdf => "PDF",
        }
    }

    /// File name offered when the user has not picked one yet.
    pub fn default_file_name(self) -> String {
        format!("expenses.{}", self.extension())
    }
}

/// Outcome of a finished export, used for the status message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportReport {
    pub kind: ExportKind,
    pub path: PathBuf,
    pub rows: usize,
    /// Only PDF output is paginated.
    pub pages: Option<usize>,
}

/// Append `.pdf` unless the path already ends with it (case-insensitively).
pub fn with_pdf_suffix(path: &Path) -> PathBuf {
    let has_suffix = path
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case("pdf"))
        .unwrap_or(false);
    if has_suffix {
        path.to_path_buf()
    } else {
        let mut raw = path.as_os_str().to_os_string();
        raw.push(".pdf");
        PathBuf::from(raw)
    }
}

/// Run `write` against a temporary file beside `destination`, then move it
/// into place. On any failure the destination is left untouched.
pub(crate) fn write_atomically<F>(destination: &Path, write: F) -> Result<()>
where
    F: FnOnce(&mut File) -> Result<()>,
{
    let dir = match destination.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };

    let mut tmp = NamedTempFile::new_in(&dir)
        .with_context(|| format!("failed to create a temporary file in {}", dir.display()))?;
    write(tmp.as_file_mut())?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;

        // Temporary files are created owner-only; exports are ordinary files.
        tmp.as_file()
            .set_permissions(std::fs::Permissions::from_mode(EXPORT_MODE))
            .context("failed to set export permissions")?;
    }
    tmp.as_file()
        .sync_all()
        .context("failed to flush export to disk")?;
    tmp.persist(destination)
        .map_err(|err| err.error)
        .with_context(|| format!("failed to write {}", destination.display()))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::fs;

    use anyhow::anyhow;

    use super::*;

    #[test]
    fn pdf_suffix_is_appended_once() {
        assert_eq!(with_pdf_suffix(Path::new("report")), PathBuf::from("report.pdf"));
        assert_eq!(
            with_pdf_suffix(Path::new("out/report.PDF")),
            PathBuf::from("out/report.PDF")
        );
        assert_eq!(
            with_pdf_suffix(Path::new("report.txt")),
            PathBuf::from("report.txt.pdf")
        );
    }

    #[test]
    fn failed_write_leaves_existing_file_alone() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("expenses.csv");
        fs::write(&dest, "previous").unwrap();

        let result = write_atomically(&dest, |_| Err(anyhow!("render failed")));

        assert!(result.is_err());
        assert_eq!(fs::read_to_string(&dest).unwrap(), "previous");
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[cfg(unix)]
    #[test]
    fn exports_are_readable_by_others() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("expenses.csv");
        write_atomically(&dest, |_| Ok(())).unwrap();

        let mode = fs::metadata(&dest).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, EXPORT_MODE);
    }

    #[test]
    fn missing_directory_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("absent").join("expenses.csv");

        assert!(write_atomically(&dest, |_| Ok(())).is_err());
        assert!(!dest.exists());
    }
}
