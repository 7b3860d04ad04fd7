use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::Result;
use chrono::Utc;
use tracing::{info, warn};

use crate::cli::PdfArgs;
use crate::markup::{Emphasis, EmphasisOptions};
use crate::model::{PdfConversionCounts, PdfConversionManifest, ToolVersions};
use crate::util::{now_utc_string, sha256_file, utc_compact_string, write_json_pretty, write_text};

use super::normalize::{NormalizeOptions, NormalizeStats, TextNormalizer};
use super::outline::{extract_outline_with_pdftohtml, render_table_of_contents};
use super::page_extract::{
    ExtractedPages, PageSource, PdftotextSource, collect_pages, command_version,
};
use super::render::{DocumentHeader, render_document};
use super::segment::{SectionSegmenter, Segmentation};

/// Normalizer and segmenter for one configuration; reusable across documents.
#[derive(Debug)]
pub struct PdfPipeline {
    normalizer: TextNormalizer,
    segmenter: SectionSegmenter,
}

#[derive(Debug)]
pub struct PdfConversion {
    pub markdown: String,
    pub extraction: ExtractedPages,
    pub normalize_stats: NormalizeStats,
    pub segmentation: Segmentation,
}

impl PdfPipeline {
    pub fn new(
        normalize: NormalizeOptions,
        emphasis: EmphasisOptions,
        extra_heading_patterns: &[String],
    ) -> Result<Self> {
        Ok(Self {
            normalizer: TextNormalizer::new(normalize)?,
            segmenter: SectionSegmenter::new(Emphasis::new(emphasis)?, extra_heading_patterns)?,
        })
    }

    pub fn convert(
        &self,
        source: &dyn PageSource,
        max_pages: Option<usize>,
        header: &DocumentHeader,
        table_of_contents: &str,
    ) -> PdfConversion {
        let extraction = collect_pages(source, max_pages);
        let (text, normalize_stats) = self.normalizer.normalize_pages(&extraction.pages);
        info!(chars = text.len(), "normalized document text");

        let segmentation = self.segmenter.segment(&text);
        info!(units = segmentation.units.len(), "identified document units");

        let markdown = render_document(header, table_of_contents, &segmentation.units);

        PdfConversion {
            markdown,
            extraction,
            normalize_stats,
            segmentation,
        }
    }
}

pub fn run(args: PdfArgs) -> Result<()> {
    let started_ts = Utc::now();
    let started_at = now_utc_string();
    let run_id = format!("pdf-{}", utc_compact_string(started_ts));

    info!(input = %args.input.display(), run_id = %run_id, "starting pdf conversion");

    let (input_sha256, _) = sha256_file(&args.input)?;
    let source = PdftotextSource::open(&args.input)?;

    let pipeline = PdfPipeline::new(
        NormalizeOptions::from(&args),
        EmphasisOptions::from(&args.emphasis),
        &args.extra_heading_patterns,
    )?;

    let mut warnings = Vec::new();
    let outline = if args.no_toc {
        Vec::new()
    } else {
        match extract_outline_with_pdftohtml(&args.input) {
            Ok(entries) => entries,
            Err(error) => {
                warn!(error = %error, "could not extract PDF bookmarks");
                warnings.push(format!("outline unavailable: {error:#}"));
                Vec::new()
            }
        }
    };

    let header = DocumentHeader {
        title: args.title.clone().unwrap_or_else(|| {
            args.input
                .file_stem()
                .and_then(|stem| stem.to_str())
                .unwrap_or("Document")
                .to_string()
        }),
        subtitle: args.subtitle.clone(),
    };

    let conversion = pipeline.convert(
        &source,
        args.max_pages,
        &header,
        &render_table_of_contents(&outline),
    );

    write_text(&args.output, &conversion.markdown)?;
    info!(
        path = %args.output.display(),
        chars = conversion.markdown.len(),
        "wrote markdown"
    );

    if let Some(units_path) = &args.units_path {
        write_json_pretty(units_path, &conversion.segmentation)?;
        info!(path = %units_path.display(), "wrote unit sequence");
    }

    let extraction = &conversion.extraction;
    let segmentation = &conversion.segmentation;
    warnings.extend(extraction.warnings.iter().cloned());

    if !extraction.failed_pages.is_empty() {
        warn!(
            failed = extraction.failed_pages.len(),
            empty = extraction.empty_page_count,
            "some pages contributed no text"
        );
    }
    if segmentation.discarded_leading_lines > 0 {
        warn!(
            lines = segmentation.discarded_leading_lines,
            "discarded text before the first recognized heading"
        );
        warnings.push(format!(
            "{} lines before the first recognized heading were discarded",
            segmentation.discarded_leading_lines
        ));
    }
    if let Some(label) = &segmentation.dropped_trailing_heading {
        warn!(heading = %label, "dropped final heading with no content");
        warnings.push(format!("final heading without content dropped: {label}"));
    }

    let mut units_by_kind = BTreeMap::<String, usize>::new();
    for unit in &segmentation.units {
        *units_by_kind.entry(unit.kind.as_str().to_string()).or_insert(0) += 1;
    }

    let manifest = PdfConversionManifest {
        manifest_version: 1,
        run_id,
        status: "completed".to_string(),
        started_at,
        updated_at: now_utc_string(),
        input_path: args.input.display().to_string(),
        input_sha256,
        output_path: args.output.display().to_string(),
        tool_versions: ToolVersions {
            pdftotext: command_version("pdftotext", &["-v"]),
            pdfinfo: command_version("pdfinfo", &["-v"]),
        },
        failed_pages: extraction.failed_pages.clone(),
        dropped_trailing_heading: segmentation.dropped_trailing_heading.clone(),
        counts: PdfConversionCounts {
            page_count: extraction.pages.len(),
            failed_page_count: extraction.failed_pages.len(),
            empty_page_count: extraction.empty_page_count,
            blank_line_runs_collapsed: conversion.normalize_stats.blank_line_runs_collapsed,
            dehyphenation_merges: conversion.normalize_stats.dehyphenation_merges,
            boilerplate_lines_removed: conversion.normalize_stats.boilerplate_lines_removed,
            discarded_leading_lines: segmentation.discarded_leading_lines,
            outline_entries: outline.len(),
            units_total: segmentation.units.len(),
            units_by_kind,
            output_chars: conversion.markdown.len(),
        },
        warnings,
    };

    let manifest_path = args.manifest_path.clone().unwrap_or_else(|| {
        let mut path = PathBuf::from(&args.output);
        path.set_extension("manifest.json");
        path
    });
    write_json_pretty(&manifest_path, &manifest)?;

    info!(path = %manifest_path.display(), "wrote conversion manifest");
    info!(
        pages = manifest.counts.page_count,
        units = manifest.counts.units_total,
        "pdf conversion completed"
    );

    Ok(())
}
