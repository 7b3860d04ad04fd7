use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{Context, Result, bail};
use regex::Regex;
use tracing::{info, warn};

/// In-order, one-call-per-page access to a paginated document's text.
pub trait PageSource {
    fn page_count(&self) -> usize;

    /// Text of the zero-based page `index`.
    fn page_text(&self, index: usize) -> Result<String>;
}

/// Pages pulled from a [`PageSource`]. Failed pages are kept as empty
/// strings so page adjacency is preserved for the normalizer.
#[derive(Debug, Default)]
pub struct ExtractedPages {
    pub pages: Vec<String>,
    /// One-based numbers of pages whose extraction failed.
    pub failed_pages: Vec<usize>,
    pub empty_page_count: usize,
    pub warnings: Vec<String>,
}

pub fn collect_pages(source: &dyn PageSource, max_pages: Option<usize>) -> ExtractedPages {
    let total = source.page_count();
    let limit = max_pages.map_or(total, |max| max.min(total));
    let mut extraction = ExtractedPages {
        pages: Vec::with_capacity(limit),
        ..ExtractedPages::default()
    };

    for index in 0..limit {
        let page_number = index + 1;
        if index % 10 == 0 {
            info!(page = page_number, total = limit, "extracting page text");
        }

        match source.page_text(index) {
            Ok(text) => extraction.pages.push(text),
            Err(error) => {
                warn!(page = page_number, error = %error, "page extraction failed; continuing");
                extraction
                    .warnings
                    .push(format!("page {page_number} extraction failed: {error:#}"));
                extraction.failed_pages.push(page_number);
                extraction.pages.push(String::new());
            }
        }
    }

    extraction.empty_page_count = extraction
        .pages
        .iter()
        .filter(|page| non_whitespace_char_count(page) == 0)
        .count();

    extraction
}

pub fn non_whitespace_char_count(text: &str) -> usize {
    text.chars()
        .filter(|character| !character.is_whitespace())
        .count()
}

/// Poppler-backed page source: `pdfinfo` for the page count and one
/// `pdftotext` call per page.
#[derive(Debug)]
pub struct PdftotextSource {
    pdf_path: PathBuf,
    page_count: usize,
}

impl PdftotextSource {
    pub fn open(pdf_path: &Path) -> Result<Self> {
        let output = Command::new("pdfinfo")
            .arg(pdf_path)
            .output()
            .with_context(|| format!("failed to execute pdfinfo for {}", pdf_path.display()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            bail!(
                "pdfinfo returned non-zero exit status for {}: {}",
                pdf_path.display(),
                stderr.trim()
            );
        }

        let info = String::from_utf8_lossy(&output.stdout);
        let page_count = parse_pdfinfo_page_count(&info)?;
        info!(path = %pdf_path.display(), pages = page_count, "opened PDF");

        Ok(Self {
            pdf_path: pdf_path.to_path_buf(),
            page_count,
        })
    }
}

impl PageSource for PdftotextSource {
    fn page_count(&self) -> usize {
        self.page_count
    }

    fn page_text(&self, index: usize) -> Result<String> {
        let page_number = (index + 1).to_string();
        let output = Command::new("pdftotext")
            .arg("-enc")
            .arg("UTF-8")
            .arg("-f")
            .arg(&page_number)
            .arg("-l")
            .arg(&page_number)
            .arg(&self.pdf_path)
            .arg("-")
            .output()
            .with_context(|| {
                format!("failed to execute pdftotext for {}", self.pdf_path.display())
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            bail!(
                "pdftotext returned non-zero exit status for {} page {}: {}",
                self.pdf_path.display(),
                page_number,
                stderr.trim()
            );
        }

        Ok(String::from_utf8_lossy(&output.stdout)
            .replace(['\u{000C}', '\u{0000}'], ""))
    }
}

pub fn parse_pdfinfo_page_count(info: &str) -> Result<usize> {
    let pages_regex =
        Regex::new(r"(?m)^Pages:\s+(\d+)\s*$").context("failed to compile pdfinfo pages regex")?;

    pages_regex
        .captures(info)
        .and_then(|captures| captures.get(1))
        .context("pdfinfo output has no page count")?
        .as_str()
        .parse::<usize>()
        .context("invalid page count in pdfinfo output")
}

pub fn command_version(program: &str, args: &[&str]) -> String {
    match Command::new(program).args(args).output() {
        Ok(output) => {
            // poppler tools print their version banner on stderr
            let text = if output.stdout.is_empty() {
                String::from_utf8_lossy(&output.stderr).into_owned()
            } else {
                String::from_utf8_lossy(&output.stdout).into_owned()
            };
            text.lines().next().unwrap_or_default().trim().to_string()
        }
        Err(_) => "unavailable".to_string(),
    }
}
