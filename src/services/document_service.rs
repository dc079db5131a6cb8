use crate::error::{Error, Result};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tokio::fs;
use tokio::process::Command;

pub const PDF_MIME: &str = "application/pdf";
pub const DOCX_MIME: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Pdf,
    Docx,
}

impl DocumentKind {
    /// Resolve the document type from the declared content type. The file
    /// extension is only consulted when the browser sent a generic type.
    pub fn detect(content_type: Option<&str>, file_name: Option<&str>) -> Result<Self> {
        let declared = content_type
            .map(|ct| ct.split(';').next().unwrap_or("").trim().to_ascii_lowercase())
            .unwrap_or_default();

        match declared.as_str() {
            PDF_MIME => return Ok(DocumentKind::Pdf),
            DOCX_MIME => return Ok(DocumentKind::Docx),
            "" | "application/octet-stream" => {}
            other => return Err(Error::UnsupportedMediaType(other.to_string())),
        }

        let ext = file_name
            .and_then(|n| Path::new(n).extension())
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());

        match ext.as_deref() {
            Some("pdf") => Ok(DocumentKind::Pdf),
            Some("docx") => Ok(DocumentKind::Docx),
            _ => Err(Error::UnsupportedMediaType(if declared.is_empty() {
                "unknown".to_string()
            } else {
                declared
            })),
        }
    }

    pub fn mime(self) -> &'static str {
        match self {
            DocumentKind::Pdf => PDF_MIME,
            DocumentKind::Docx => DOCX_MIME,
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            DocumentKind::Pdf => "pdf",
            DocumentKind::Docx => "docx",
        }
    }

    /// Reject bodies whose leading bytes contradict the declared type.
    pub fn check_signature(self, data: &[u8]) -> Result<()> {
        let ok = match self {
            DocumentKind::Pdf => data.starts_with(b"%PDF"),
            DocumentKind::Docx => data.starts_with(b"PK\x03\x04"),
        };
        if ok {
            Ok(())
        } else {
            Err(Error::UnsupportedMediaType(format!(
                "file content is not a valid {} document",
                self.extension().to_uppercase()
            )))
        }
    }
}

/// Per-upload scratch directory. Everything written for one request lives
/// here and is removed by [`UploadWorkspace::close`] (or on drop).
pub struct UploadWorkspace {
    dir: TempDir,
    kind: DocumentKind,
    document: PathBuf,
}

impl UploadWorkspace {
    /// Create the workspace under `root`, or the system temp dir when unset.
    pub async fn create(kind: DocumentKind, data: &[u8], root: Option<&Path>) -> Result<Self> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("quiz-upload-");
        let dir = match root {
            Some(root) => builder.tempdir_in(root)?,
            None => builder.tempdir()?,
        };
        let document = dir.path().join(format!("document.{}", kind.extension()));
        fs::write(&document, data).await?;
        tracing::debug!(path = ?dir.path(), "Created upload workspace");
        Ok(Self {
            dir,
            kind,
            document,
        })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn document_path(&self) -> &Path {
        &self.document
    }

    pub async fn document_bytes(&self) -> Result<Vec<u8>> {
        Ok(fs::read(&self.document).await?)
    }

    /// Render up to `max_pages` pages as base64 PNGs in page order.
    pub async fn render_pages(&self, dpi: u32, max_pages: usize) -> Result<Vec<String>> {
        let pdf = match self.kind {
            DocumentKind::Pdf => self.document.clone(),
            DocumentKind::Docx => self.convert_to_pdf().await?,
        };

        let prefix = self.dir.path().join("page");
        let output = Command::new("pdftoppm")
            .arg("-png")
            .arg("-r")
            .arg(dpi.to_string())
            .arg("-l")
            .arg(max_pages.to_string())
            .arg(&pdf)
            .arg(&prefix)
            .output()
            .await
            .map_err(|e| {
                tracing::error!("Failed to run pdftoppm: {}", e);
                Error::Conversion("pdftoppm not available".to_string())
            })?;

        if !output.status.success() {
            tracing::error!("pdftoppm failed: {}", String::from_utf8_lossy(&output.stderr));
            return Err(Error::Conversion("PDF page rendering failed".to_string()));
        }

        let mut pages = Vec::new();
        let mut entries = fs::read_dir(self.dir.path()).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) == Some("png") {
                if let Some(number) = page_number(&path) {
                    pages.push((number, path));
                }
            }
        }
        pages.sort_by_key(|(number, _)| *number);
        pages.truncate(max_pages);

        let mut images = Vec::with_capacity(pages.len());
        for (number, path) in pages {
            let data = fs::read(&path).await?;
            tracing::debug!(page = number, bytes = data.len(), "Encoded page image");
            images.push(BASE64.encode(&data));
        }

        if images.is_empty() {
            return Err(Error::Conversion("Document produced no pages".to_string()));
        }
        Ok(images)
    }

    async fn convert_to_pdf(&self) -> Result<PathBuf> {
        let outdir = self.dir.path().join("converted");
        fs::create_dir_all(&outdir).await?;

        let profile = self.dir.path().join("lo-profile");
        let output = Command::new("libreoffice")
            .args(libreoffice_args(&self.document, &outdir, &profile))
            .output()
            .await
            .map_err(|e| Error::Conversion(format!("Failed to run libreoffice: {}", e)))?;

        if !output.status.success() {
            return Err(Error::Conversion(format!(
                "LibreOffice PDF conversion failed: {}",
                String::from_utf8_lossy(&output.stderr)
            )));
        }

        let mut entries = fs::read_dir(&outdir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let p = entry.path();
            if p.extension().and_then(|e| e.to_str()) == Some("pdf") {
                return Ok(p);
            }
        }
        Err(Error::Conversion("LibreOffice produced no PDF output".to_string()))
    }

    /// Remove the workspace. Failures are logged and swallowed.
    pub fn close(self) {
        let path = self.dir.path().to_path_buf();
        if let Err(e) = self.dir.close() {
            tracing::warn!(path = ?path, error = %e, "Failed to remove upload workspace");
        } else {
            tracing::debug!(path = ?path, "Removed upload workspace");
        }
    }
}

// Each conversion gets its own LibreOffice profile; with the shared default
// profile a second instance hands off to the first and writes nothing.
fn libreoffice_args(document: &Path, outdir: &Path, profile: &Path) -> Vec<OsString> {
    vec![
        OsString::from(format!("-env:UserInstallation=file://{}", profile.display())),
        OsString::from("--headless"),
        OsString::from("--norestore"),
        OsString::from("--convert-to"),
        OsString::from("pdf"),
        OsString::from("--outdir"),
        outdir.as_os_str().to_owned(),
        document.as_os_str().to_owned(),
    ]
}

// pdftoppm names pages `page-1.png`, `page-01.png`, ... depending on count.
fn page_number(path: &Path) -> Option<u32> {
    path.file_stem()?
        .to_str()?
        .rsplit('-')
        .next()?
        .parse()
        .ok()
}
