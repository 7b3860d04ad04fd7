use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceFormat {
    Pdf,
    Xml,
}

impl SourceFormat {
    pub fn from_extension(ext: &str) -> Option<Self> {
        if ext.eq_ignore_ascii_case("pdf") {
            Some(Self::Pdf)
        } else if ext.eq_ignore_ascii_case("xml") {
            Some(Self::Xml)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceEntry {
    pub filename: String,
    pub format: SourceFormat,
    pub bytes: u64,
    pub sha256: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceInventoryManifest {
    pub manifest_version: u32,
    pub generated_at: String,
    pub source_directory: String,
    pub source_count: usize,
    pub sources: Vec<SourceEntry>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ToolVersions {
    pub pdftotext: String,
    pub pdfinfo: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct PdfConversionCounts {
    pub page_count: usize,
    pub failed_page_count: usize,
    pub empty_page_count: usize,
    pub blank_line_runs_collapsed: usize,
    pub dehyphenation_merges: usize,
    pub boilerplate_lines_removed: usize,
    pub discarded_leading_lines: usize,
    pub outline_entries: usize,
    pub units_total: usize,
    pub units_by_kind: BTreeMap<String, usize>,
    pub output_chars: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct PdfConversionManifest {
    pub manifest_version: u32,
    pub run_id: String,
    pub status: String,
    pub started_at: String,
    pub updated_at: String,
    pub input_path: String,
    pub input_sha256: String,
    pub output_path: String,
    pub tool_versions: ToolVersions,
    pub failed_pages: Vec<usize>,
    pub dropped_trailing_heading: Option<String>,
    pub counts: PdfConversionCounts,
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct XmlFileReport {
    pub input_path: String,
    pub output_path: String,
    pub status: String,
    pub input_sha256: Option<String>,
    pub input_bytes: Option<u64>,
    pub divisions: usize,
    pub sections: usize,
    pub orphan_sections: usize,
    pub paragraphs: usize,
    pub auxiliary_blocks: usize,
    pub citations: usize,
    pub unknown_division_types: Vec<String>,
    pub output_chars: usize,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct XmlConversionManifest {
    pub manifest_version: u32,
    pub run_id: String,
    pub started_at: String,
    pub updated_at: String,
    pub converted_count: usize,
    pub failed_count: usize,
    pub files: Vec<XmlFileReport>,
}
