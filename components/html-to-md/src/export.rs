//! Export orchestrator - converts HTML files on disk and copies their assets
//!
//! The exporter reads a document, converts it with [`MarkdownConverter`],
//! writes the Markdown next to the source (or under an export directory) and,
//! when exporting to a separate directory, copies every referenced local asset
//! to the same relative path under that directory.
//!
//! # Failure Policy
//!
//! - A referenced asset that is not a regular file is skipped
//! - Existing directories are not an error, so concurrent exports may create
//!   the same directory
//! - Any other I/O failure is fatal for that document only; batch conversion
//!   records it and moves on unless `stop_on_error` is set
//!
//! # Examples
//!
//! ```rust,no_run
//! use html_to_md_converter::export::{ExportOptions, Exporter};
//!
//! let exporter = Exporter::new(ExportOptions {
//!     export_dir: Some("export".into()),
//!     ..Default::default()
//! });
//! let report = exporter.convert_tree("site".as_ref()).expect("export failed");
//! println!("{} converted, {} failed", report.converted.len(), report.failed.len());
//! ```

use std::fs;
use std::path::{Component, Path, PathBuf};

use walkdir::WalkDir;

use crate::converter::{AssetReference, MarkdownConverter};
use crate::error::ExportError;

/// File extensions treated as HTML documents
const HTML_EXTENSIONS: &[&str] = &["html", "htm"];

/// Extension of converted documents
const MARKDOWN_EXTENSION: &str = "md";

/// Export configuration
#[derive(Debug, Clone, Default)]
pub struct ExportOptions {
    /// Root of the exported tree; `None` writes Markdown next to each source
    pub export_dir: Option<PathBuf>,
    /// Abort a batch at the first failing document
    pub stop_on_error: bool,
}

/// Outcome of exporting one document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileReport {
    pub source: PathBuf,
    pub output: PathBuf,
    /// Asset copies written under the export directory
    pub assets_copied: Vec<PathBuf>,
    /// Asset references that were not copied
    pub assets_skipped: usize,
}

/// Outcome of a folder or tree export
#[derive(Debug, Default)]
pub struct BatchReport {
    pub converted: Vec<FileReport>,
    pub failed: Vec<ExportError>,
}

impl BatchReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Whether `path` names an HTML document by extension
pub fn is_html_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            HTML_EXTENSIONS
                .iter()
                .any(|html| ext.eq_ignore_ascii_case(html))
        })
}

/// Output path for a converted document
///
/// Same base name with a `.md` extension, placed in `export_dir` when given and
/// next to the source otherwise.
pub fn markdown_path(source: &Path, export_dir: Option<&Path>) -> PathBuf {
    let file_name = source
        .file_name()
        .map(|name| Path::new(name).with_extension(MARKDOWN_EXTENSION))
        .unwrap_or_else(|| PathBuf::from(format!("export.{MARKDOWN_EXTENSION}")));

    match export_dir {
        Some(dir) => dir.join(file_name),
        None => source.with_file_name(file_name),
    }
}

/// Relative on-disk path for an asset reference
///
/// Query and fragment suffixes are stripped. References that are empty,
/// absolute or climb out of the document directory yield `None`.
pub fn asset_relative_path(reference: &AssetReference) -> Option<PathBuf> {
    let raw = reference.as_str();
    let end = raw.find(['?', '#']).unwrap_or(raw.len());
    let path = Path::new(&raw[..end]);

    let mut relative = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Normal(part) => relative.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => return None,
        }
    }

    if relative.as_os_str().is_empty() {
        None
    } else {
        Some(relative)
    }
}

/// Create `dir` and its parents, treating an existing directory as success
fn ensure_dir(dir: &Path) -> Result<(), ExportError> {
    if dir.as_os_str().is_empty() {
        return Ok(());
    }
    match fs::create_dir_all(dir) {
        Ok(()) => Ok(()),
        Err(_) if dir.is_dir() => Ok(()),
        Err(source) => Err(ExportError::CreateDir {
            path: dir.to_path_buf(),
            source,
        }),
    }
}

/// Whether two paths name the same existing directory
fn same_dir(a: &Path, b: &Path) -> bool {
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

/// Converts HTML files and exports them with their assets
#[derive(Debug, Clone, Default)]
pub struct Exporter {
    converter: MarkdownConverter,
    options: ExportOptions,
}

impl Exporter {
    pub fn new(options: ExportOptions) -> Self {
        Self {
            converter: MarkdownConverter::new(),
            options,
        }
    }

    pub fn options(&self) -> &ExportOptions {
        &self.options
    }

    /// Convert a file, a folder's top level, or (with `recursive`) a whole tree
    pub fn convert_path(&self, path: &Path, recursive: bool) -> Result<BatchReport, ExportError> {
        if !path.is_dir() {
            let report = self.convert_file(path)?;
            return Ok(BatchReport {
                converted: vec![report],
                failed: Vec::new(),
            });
        }
        if recursive {
            self.convert_tree(path)
        } else {
            self.convert_folder(path)
        }
    }

    /// Convert one HTML file into the configured export directory
    pub fn convert_file(&self, path: &Path) -> Result<FileReport, ExportError> {
        self.export_file(path, self.options.export_dir.as_deref())
    }

    /// Convert every HTML file directly inside `dir`
    pub fn convert_folder(&self, dir: &Path) -> Result<BatchReport, ExportError> {
        let _span = tracing::info_span!("convert_folder", dir = %dir.display()).entered();

        let entries = fs::read_dir(dir).map_err(|source| ExportError::ReadDir {
            path: dir.to_path_buf(),
            source,
        })?;

        let mut files = Vec::new();
        for entry in entries {
            let entry = match entry {
                Ok(entry) => entry,
                Err(source) => {
                    self.skip_unreadable(ExportError::ReadDir {
                        path: dir.to_path_buf(),
                        source,
                    })?;
                    continue;
                }
            };
            let path = entry.path();
            if path.is_file() && is_html_file(&path) {
                files.push(path);
            }
        }
        files.sort();

        let export_dir = self.options.export_dir.as_deref();
        self.run_batch(files.into_iter().map(|file| (file, export_dir.map(Path::to_path_buf))))
    }

    /// Log and skip a directory entry that cannot be read, unless the batch
    /// stops on the first error
    fn skip_unreadable(&self, error: ExportError) -> Result<(), ExportError> {
        if self.options.stop_on_error {
            return Err(error);
        }
        tracing::warn!(error = %error, "Skipping unreadable directory entry");
        Ok(())
    }

    /// Convert every HTML file in the tree rooted at `dir`
    ///
    /// Each file is exported under `export_dir/<relative parent>`, mirroring
    /// the source structure. Symlinks are not followed.
    pub fn convert_tree(&self, dir: &Path) -> Result<BatchReport, ExportError> {
        let _span = tracing::info_span!("convert_tree", dir = %dir.display()).entered();

        let mut jobs = Vec::new();
        for entry in WalkDir::new(dir).sort_by_file_name() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    let path = err.path().unwrap_or(dir).to_path_buf();
                    let source = err
                        .into_io_error()
                        .unwrap_or_else(|| std::io::Error::other("directory walk failed"));
                    self.skip_unreadable(ExportError::ReadDir { path, source })?;
                    continue;
                }
            };
            if !entry.file_type().is_file() || !is_html_file(entry.path()) {
                continue;
            }

            let export_dir = self.options.export_dir.as_ref().map(|root| {
                let relative_parent = entry
                    .path()
                    .parent()
                    .and_then(|parent| parent.strip_prefix(dir).ok())
                    .unwrap_or_else(|| Path::new(""));
                root.join(relative_parent)
            });
            jobs.push((entry.into_path(), export_dir));
        }

        let report = self.run_batch(jobs)?;
        tracing::info!(
            dir = %dir.display(),
            converted = report.converted.len(),
            failed = report.failed.len(),
            "Tree conversion complete"
        );
        Ok(report)
    }

    fn run_batch<I>(&self, jobs: I) -> Result<BatchReport, ExportError>
    where
        I: IntoIterator<Item = (PathBuf, Option<PathBuf>)>,
    {
        let mut report = BatchReport::default();
        for (file, export_dir) in jobs {
            match self.export_file(&file, export_dir.as_deref()) {
                Ok(file_report) => report.converted.push(file_report),
                Err(error) if self.options.stop_on_error => return Err(error),
                Err(error) => {
                    tracing::warn!(path = %file.display(), error = %error, "Failed to convert document");
                    report.failed.push(error);
                }
            }
        }
        Ok(report)
    }

    fn export_file(&self, path: &Path, export_dir: Option<&Path>) -> Result<FileReport, ExportError> {
        let _span = tracing::info_span!("convert_file", path = %path.display()).entered();

        let bytes = fs::read(path).map_err(|source| ExportError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let result = self
            .converter
            .convert_bytes(&bytes)
            .map_err(|source| ExportError::Decode {
                path: path.to_path_buf(),
                source,
            })?;

        let output = markdown_path(path, export_dir);
        let mut assets_copied = Vec::new();
        let mut assets_skipped = 0;

        let source_dir = path.parent().unwrap_or_else(|| Path::new(""));
        match export_dir {
            Some(dir) => {
                ensure_dir(dir)?;
                if same_dir(source_dir_or_cwd(source_dir), dir) {
                    // Assets already sit next to the Markdown
                    assets_skipped = result.assets.len();
                } else {
                    for asset in &result.assets {
                        match copy_asset(asset, source_dir, dir)? {
                            Some(copied) => assets_copied.push(copied),
                            None => assets_skipped += 1,
                        }
                    }
                }
            }
            None => assets_skipped = result.assets.len(),
        }

        fs::write(&output, result.markdown.as_bytes()).map_err(|source| ExportError::Write {
            path: output.clone(),
            source,
        })?;

        tracing::info!(
            source = %path.display(),
            output = %output.display(),
            assets = assets_copied.len(),
            "Converted document"
        );

        Ok(FileReport {
            source: path.to_path_buf(),
            output,
            assets_copied,
            assets_skipped,
        })
    }
}

fn source_dir_or_cwd(dir: &Path) -> &Path {
    if dir.as_os_str().is_empty() {
        Path::new(".")
    } else {
        dir
    }
}

/// Copy one asset from `source_dir` to the same relative path under `export_dir`
///
/// Returns `Ok(None)` when the reference is skipped.
fn copy_asset(
    asset: &AssetReference,
    source_dir: &Path,
    export_dir: &Path,
) -> Result<Option<PathBuf>, ExportError> {
    let Some(relative) = asset_relative_path(asset) else {
        tracing::debug!(asset = %asset, "Skipping asset outside the document directory");
        return Ok(None);
    };

    let source = source_dir.join(&relative);
    if !source.is_file() {
        tracing::debug!(asset = %asset, path = %source.display(), "Skipping missing asset");
        return Ok(None);
    }

    let target = export_dir.join(&relative);
    if let Some(parent) = target.parent() {
        ensure_dir(parent)?;
    }
    fs::copy(&source, &target).map_err(|source_err| ExportError::CopyAsset {
        path: source.clone(),
        source: source_err,
    })?;

    Ok(Some(target))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_markdown_path_alongside_source() {
        let path = markdown_path(Path::new("site/docs/page.html"), None);
        assert_eq!(path, PathBuf::from("site/docs/page.md"));
    }

    #[test]
    fn test_markdown_path_under_export_dir() {
        let path = markdown_path(Path::new("site/page.htm"), Some(Path::new("out")));
        assert_eq!(path, PathBuf::from("out/page.md"));
    }

    #[test]
    fn test_is_html_file() {
        assert!(is_html_file(Path::new("a.html")));
        assert!(is_html_file(Path::new("a.HTM")));
        assert!(!is_html_file(Path::new("a.txt")));
        assert!(!is_html_file(Path::new("html")));
    }

    #[test]
    fn test_asset_relative_path() {
        let rel = |s: &str| asset_relative_path(&AssetReference::new(s));
        assert_eq!(rel("img/a.png"), Some(PathBuf::from("img/a.png")));
        assert_eq!(rel("./img/a.png?v=2"), Some(PathBuf::from("img/a.png")));
        assert_eq!(rel("files/doc.pdf#page=3"), Some(PathBuf::from("files/doc.pdf")));
        assert_eq!(rel("#top"), None);
        assert_eq!(rel("../secret.txt"), None);
        assert_eq!(rel("/etc/passwd"), None);
    }

    #[test]
    fn test_ensure_dir_is_idempotent() {
        let tmp = TempDir::new().expect("temp dir");
        let dir = tmp.path().join("a/b");
        ensure_dir(&dir).expect("first create");
        ensure_dir(&dir).expect("second create");
        assert!(dir.is_dir());
    }

    #[test]
    fn test_export_without_export_dir_writes_alongside() {
        let tmp = TempDir::new().expect("temp dir");
        let page = tmp.path().join("page.html");
        fs::write(&page, r#"<b>x</b><img src="pic.png">"#).expect("write page");

        let report = Exporter::default().convert_file(&page).expect("export");
        assert_eq!(report.output, tmp.path().join("page.md"));
        assert!(report.assets_copied.is_empty());
        assert_eq!(report.assets_skipped, 1);
        let markdown = fs::read_to_string(&report.output).expect("read md");
        assert_eq!(markdown, "**x**  \n![Placeholder](pic.png)");
    }

    #[test]
    fn test_export_dir_equal_to_source_dir_copies_nothing() {
        let tmp = TempDir::new().expect("temp dir");
        let page = tmp.path().join("page.html");
        fs::write(&page, r#"<img src="pic.png">"#).expect("write page");
        fs::write(tmp.path().join("pic.png"), b"png").expect("write asset");

        let exporter = Exporter::new(ExportOptions {
            export_dir: Some(tmp.path().to_path_buf()),
            ..Default::default()
        });
        let report = exporter.convert_file(&page).expect("export");
        assert!(report.assets_copied.is_empty());
        assert_eq!(fs::read(tmp.path().join("pic.png")).expect("asset"), b"png");
    }

    #[test]
    fn test_unreadable_entry_is_skipped_unless_stopping() {
        let error = || ExportError::ReadDir {
            path: PathBuf::from("site/locked"),
            source: std::io::Error::from(std::io::ErrorKind::PermissionDenied),
        };

        assert!(Exporter::default().skip_unreadable(error()).is_ok());

        let stopping = Exporter::new(ExportOptions {
            stop_on_error: true,
            ..Default::default()
        });
        let err = stopping.skip_unreadable(error()).expect_err("stops");
        assert_eq!(err.path(), Path::new("site/locked"));
    }
}
