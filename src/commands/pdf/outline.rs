use std::path::Path;
use std::process::Command;

use anyhow::{Context, Result, bail};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutlineEntry {
    /// 1 for top-level bookmarks.
    pub level: usize,
    pub title: String,
    pub page: Option<u32>,
}

pub fn extract_outline_with_pdftohtml(pdf_path: &Path) -> Result<Vec<OutlineEntry>> {
    let output = Command::new("pdftohtml")
        .arg("-xml")
        .arg("-i")
        .arg("-f")
        .arg("1")
        .arg("-l")
        .arg("1")
        .arg(pdf_path)
        .arg("-stdout")
        .output()
        .with_context(|| format!("failed to execute pdftohtml for {}", pdf_path.display()))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        bail!(
            "pdftohtml returned non-zero exit status for {}: {}",
            pdf_path.display(),
            stderr.trim()
        );
    }

    parse_outline_xml(&String::from_utf8_lossy(&output.stdout))
}

/// Reads `<outline><item page="N">..</item><outline>..</outline></outline>`
/// where a nested `<outline>` holds the children of the item before it.
pub fn parse_outline_xml(xml: &str) -> Result<Vec<OutlineEntry>> {
    let parse_options = roxmltree::ParsingOptions {
        allow_dtd: true,
        ..roxmltree::ParsingOptions::default()
    };
    let doc = roxmltree::Document::parse_with_options(xml, parse_options)
        .context("failed to parse pdftohtml outline xml")?;

    let mut entries = Vec::new();
    for item in doc
        .descendants()
        .filter(|node| node.is_element() && node.has_tag_name("item"))
    {
        let level = item
            .ancestors()
            .filter(|node| node.has_tag_name("outline"))
            .count();
        if level == 0 {
            continue;
        }

        let title = item
            .descendants()
            .filter(|node| node.is_text())
            .filter_map(|node| node.text())
            .collect::<String>()
            .split_whitespace()
            .collect::<Vec<&str>>()
            .join(" ");
        if title.is_empty() {
            continue;
        }

        entries.push(OutlineEntry {
            level,
            title,
            page: item.attribute("page").and_then(|page| page.parse().ok()),
        });
    }

    Ok(entries)
}

pub fn render_table_of_contents(entries: &[OutlineEntry]) -> String {
    if entries.is_empty() {
        return String::new();
    }

    let mut lines = vec!["## Table of Contents\n".to_string()];
    for entry in entries {
        let indent = "  ".repeat(entry.level.saturating_sub(1));
        match entry.page {
            Some(page) => lines.push(format!("{indent}- {} (Page {page})", entry.title)),
            None => lines.push(format!("{indent}- {}", entry.title)),
        }
    }
    lines.push("\n".to_string());

    lines.join("\n")
}
