use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use chrono::Utc;
use roxmltree::Node;
use tracing::{error, info};

use crate::cli::XmlArgs;
use crate::markup::{Emphasis, EmphasisKind, EmphasisOptions};
use crate::model::{XmlConversionManifest, XmlFileReport};
use crate::util::{now_utc_string, sha256_file, utc_compact_string, write_json_pretty, write_text};

use super::element::{DivisionType, ElementKind};
use super::inline::InlineRenderer;
use super::walker::{ContextStack, HierarchyWalker, WalkState, WalkStats};

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DocumentMetadata {
    pub title: Option<String>,
    pub title_number: Option<String>,
    pub amendment_date: Option<String>,
}

impl DocumentMetadata {
    fn extract(root: Node<'_, '_>, inline: &InlineRenderer) -> Self {
        Self {
            title: find_text(root, inline, |node| node.has_tag_name("TITLE")),
            title_number: find_text(root, inline, |node| {
                node.has_tag_name("IDNO") && node.attribute("TYPE") == Some("title")
            }),
            amendment_date: find_text(root, inline, |node| node.has_tag_name("AMDDATE")),
        }
    }

    fn render(&self) -> Vec<String> {
        let mut lines = Vec::new();
        if let Some(title) = &self.title {
            lines.push(format!("# {title}"));
            lines.push(String::new());
        }
        if let Some(number) = &self.title_number {
            lines.push(format!("{} {number}", EmphasisKind::Bold.wrap("Title:")));
        }
        if let Some(date) = &self.amendment_date {
            lines.push(format!("{} {date}", EmphasisKind::Bold.wrap("Last Updated:")));
        }
        lines.push(String::new());
        lines.push("---".to_string());
        lines.push(String::new());
        lines
    }
}

fn find_text<'a, 'input>(
    root: Node<'a, 'input>,
    inline: &InlineRenderer,
    predicate: impl Fn(Node<'a, 'input>) -> bool,
) -> Option<String> {
    root.descendants()
        .skip(1)
        .find(|node| node.is_element() && predicate(*node))
        .map(|node| inline.text(node))
        .filter(|text| !text.is_empty())
}

#[derive(Debug)]
pub struct EcfrConversion {
    pub markdown: String,
    pub metadata: DocumentMetadata,
    pub stats: WalkStats,
    pub context: ContextStack,
    pub orphan_sections: usize,
}

/// Converts a whole eCFR document: metadata header, every `DIV1` subtree,
/// then any `SECTION` division that sits outside all `DIV1`s.
#[derive(Debug)]
pub struct EcfrConverter {
    inline: InlineRenderer,
    emphasis: Emphasis,
}

impl EcfrConverter {
    pub fn new(emphasis: EmphasisOptions) -> Result<Self> {
        Ok(Self {
            inline: InlineRenderer::new()?,
            emphasis: Emphasis::new(emphasis)?,
        })
    }

    pub fn convert(&self, xml: &str) -> Result<EcfrConversion> {
        let parse_options = roxmltree::ParsingOptions {
            allow_dtd: true,
            ..roxmltree::ParsingOptions::default()
        };
        let doc = roxmltree::Document::parse_with_options(xml, parse_options)
            .context("failed to parse XML document")?;
        let root = doc.root_element();

        let metadata = DocumentMetadata::extract(root, &self.inline);
        let mut blocks = metadata.render();

        let walker = HierarchyWalker::new(&self.inline, &self.emphasis);
        let mut state = WalkState::default();

        for division in root
            .descendants()
            .filter(|node| node.is_element() && node.has_tag_name("DIV1"))
        {
            blocks.push(walker.render_division(division, &mut state));
        }

        let mut orphan_sections = 0usize;
        for section in root.descendants().filter(|node| is_orphan_section(*node)) {
            orphan_sections += 1;
            blocks.push(walker.render_division(section, &mut state));
        }

        Ok(EcfrConversion {
            markdown: blocks.join("\n"),
            metadata,
            stats: state.stats,
            context: state.context,
            orphan_sections,
        })
    }
}

fn is_orphan_section(node: Node<'_, '_>) -> bool {
    node.has_tag_name("DIV8")
        && ElementKind::of(node) == ElementKind::Division(DivisionType::Section)
        && !node
            .ancestors()
            .skip(1)
            .any(|ancestor| ancestor.has_tag_name("DIV1"))
}

pub fn run(args: XmlArgs) -> Result<()> {
    let started_ts = Utc::now();
    let started_at = now_utc_string();
    let run_id = format!("xml-{}", utc_compact_string(started_ts));

    let converter = EcfrConverter::new(EmphasisOptions::from(&args.emphasis))?;

    let missing = args
        .inputs
        .iter()
        .filter(|path| !path.exists())
        .map(|path| path.display().to_string())
        .collect::<Vec<String>>();
    if !missing.is_empty() {
        bail!("missing input files: {}", missing.join(", "));
    }

    let mut reports = Vec::with_capacity(args.inputs.len());
    for input in &args.inputs {
        let output = output_path_for(input, args.output_dir.as_deref());
        info!(input = %input.display(), output = %output.display(), "converting");

        match convert_file(&converter, input, &output) {
            Ok(report) => reports.push(report),
            Err(err) => {
                error!(input = %input.display(), error = %format!("{err:#}"), "conversion failed");
                reports.push(XmlFileReport {
                    input_path: input.display().to_string(),
                    output_path: output.display().to_string(),
                    status: "failed".to_string(),
                    input_sha256: None,
                    input_bytes: None,
                    divisions: 0,
                    sections: 0,
                    orphan_sections: 0,
                    paragraphs: 0,
                    auxiliary_blocks: 0,
                    citations: 0,
                    unknown_division_types: Vec::new(),
                    output_chars: 0,
                    error: Some(format!("{err:#}")),
                });
            }
        }
    }

    let converted_count = reports
        .iter()
        .filter(|report| report.status == "completed")
        .count();
    let failed_count = reports.len() - converted_count;

    let manifest = XmlConversionManifest {
        manifest_version: 1,
        run_id: run_id.clone(),
        started_at,
        updated_at: now_utc_string(),
        converted_count,
        failed_count,
        files: reports,
    };

    let manifest_path = args.manifest_path.clone().unwrap_or_else(|| {
        let dir = args
            .output_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from("."));
        dir.join(format!("{run_id}.manifest.json"))
    });
    write_json_pretty(&manifest_path, &manifest)?;
    info!(path = %manifest_path.display(), "wrote conversion manifest");

    if failed_count > 0 {
        bail!(
            "converted {}/{} files successfully",
            converted_count,
            converted_count + failed_count
        );
    }

    info!(files = converted_count, "all files converted");
    Ok(())
}

fn convert_file(converter: &EcfrConverter, input: &Path, output: &Path) -> Result<XmlFileReport> {
    let xml = fs::read_to_string(input)
        .with_context(|| format!("failed to read {}", input.display()))?;
    let (input_sha256, input_bytes) = sha256_file(input)?;

    let conversion = converter
        .convert(&xml)
        .with_context(|| format!("failed to convert {}", input.display()))?;
    write_text(output, &conversion.markdown)?;

    let input_mb = input_bytes as f64 / (1024.0 * 1024.0);
    let output_mb = conversion.markdown.len() as f64 / (1024.0 * 1024.0);
    info!(
        input = %input.display(),
        input_mb = %format!("{input_mb:.1}"),
        output_mb = %format!("{output_mb:.1}"),
        title = %conversion.metadata.title.as_deref().unwrap_or(""),
        sections = conversion.stats.sections,
        last_context = %conversion.context.breadcrumb(),
        "converted file"
    );

    Ok(XmlFileReport {
        input_path: input.display().to_string(),
        output_path: output.display().to_string(),
        status: "completed".to_string(),
        input_sha256: Some(input_sha256),
        input_bytes: Some(input_bytes),
        divisions: conversion.stats.divisions,
        sections: conversion.stats.sections,
        orphan_sections: conversion.orphan_sections,
        paragraphs: conversion.stats.paragraphs,
        auxiliary_blocks: conversion.stats.auxiliary_blocks,
        citations: conversion.stats.citations,
        unknown_division_types: conversion
            .stats
            .unknown_division_types
            .iter()
            .cloned()
            .collect(),
        output_chars: conversion.markdown.len(),
        error: None,
    })
}

fn output_path_for(input: &Path, output_dir: Option<&Path>) -> PathBuf {
    let file_name = input
        .file_stem()
        .map(|stem| format!("{}.md", stem.to_string_lossy()))
        .unwrap_or_else(|| "output.md".to_string());

    match output_dir {
        Some(dir) => dir.join(file_name),
        None => input.with_file_name(file_name),
    }
}

