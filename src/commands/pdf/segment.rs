use anyhow::{Context, Result, bail};
use regex::Regex;
use serde::Serialize;
use tracing::debug;

use crate::markup::{Emphasis, HeadingLevel};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitKind {
    Chapter,
    Section,
    Table,
    Figure,
    Subsubsection,
    Subsection,
    MainSection,
    Item,
    /// Matched by a caller-supplied pattern; rendered from its source label.
    Heading,
}

impl UnitKind {
    pub fn as_str(self) -> &'static str {
        match self {
            UnitKind::Chapter => "chapter",
            UnitKind::Section => "section",
            UnitKind::Table => "table",
            UnitKind::Figure => "figure",
            UnitKind::Subsubsection => "subsubsection",
            UnitKind::Subsection => "subsection",
            UnitKind::MainSection => "main_section",
            UnitKind::Item => "item",
            UnitKind::Heading => "heading",
        }
    }

    /// `None` for lettered items, which render as a bold inline label.
    pub fn heading_level(self) -> Option<HeadingLevel> {
        match self {
            UnitKind::Chapter => Some(HeadingLevel::new(1)),
            UnitKind::Section => Some(HeadingLevel::new(2)),
            UnitKind::MainSection
            | UnitKind::Table
            | UnitKind::Figure
            | UnitKind::Heading => Some(HeadingLevel::new(3)),
            UnitKind::Subsection => Some(HeadingLevel::new(4)),
            UnitKind::Subsubsection => Some(HeadingLevel::new(5)),
            UnitKind::Item => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StructuralUnit {
    pub kind: UnitKind,
    pub number: String,
    pub title: String,
    pub content: String,
    pub source_label: String,
}

#[derive(Debug, Default, Serialize)]
pub struct Segmentation {
    pub units: Vec<StructuralUnit>,
    /// Non-blank lines seen before the first recognized heading.
    pub discarded_leading_lines: usize,
    /// Source label of a final heading dropped because nothing followed it.
    pub dropped_trailing_heading: Option<String>,
}

#[derive(Debug)]
struct SectionPattern {
    regex: Regex,
    kind: UnitKind,
}

/// Ordered heading table evaluated top-down; the first match wins.
///
/// Order is a tie-break: the chapter/section keywords and table/figure
/// captions come before the bare numeric forms, and deeper numeric forms
/// come before shallower ones.
#[derive(Debug)]
pub struct SectionSegmenter {
    patterns: Vec<SectionPattern>,
    emphasis: Emphasis,
}

const BUILTIN_PATTERNS: &[(&str, UnitKind)] = &[
    (r"^CHAPTER\s+(\d+)\s+(.+)$", UnitKind::Chapter),
    (r"^SECTION\s+(\d+)\s+(.+)$", UnitKind::Section),
    (r"^TABLE\s+(\d+(?:\.\d+)*)\s*[-–]\s*(.+)$", UnitKind::Table),
    (r"^FIGURE\s+(\d+(?:\.\d+)*)\s*[-–]\s*(.+)$", UnitKind::Figure),
    (r"^(\d+\.\d+\.\d+)\s+(.+)$", UnitKind::Subsubsection),
    (r"^(\d+\.\d+)\s+(.+)$", UnitKind::Subsection),
    (r"^(\d+)\s+(.+)$", UnitKind::MainSection),
    (r"^([A-Z])\.\s+(.+)$", UnitKind::Item),
];

impl SectionSegmenter {
    pub fn new(emphasis: Emphasis, extra_patterns: &[String]) -> Result<Self> {
        let mut patterns = Vec::with_capacity(BUILTIN_PATTERNS.len() + extra_patterns.len());
        for (pattern, kind) in BUILTIN_PATTERNS {
            let regex = Regex::new(&format!("(?i){pattern}"))
                .with_context(|| format!("failed to compile {} heading regex", kind.as_str()))?;
            patterns.push(SectionPattern { regex, kind: *kind });
        }

        for pattern in extra_patterns {
            let regex = Regex::new(&format!("(?i){pattern}"))
                .with_context(|| format!("invalid extra heading pattern: {pattern}"))?;
            if regex.captures_len() < 3 {
                bail!("extra heading pattern needs number and title captures: {pattern}");
            }
            patterns.push(SectionPattern {
                regex,
                kind: UnitKind::Heading,
            });
        }

        Ok(Self { patterns, emphasis })
    }

    /// Classifies a trimmed, non-blank line against the ordered table.
    pub fn classify(&self, line: &str) -> Option<(UnitKind, String, String)> {
        self.patterns.iter().find_map(|pattern| {
            let captures = pattern.regex.captures(line)?;
            let number = captures.get(1).map_or("", |m| m.as_str()).trim();
            let title = captures.get(2).map_or("", |m| m.as_str()).trim();
            Some((pattern.kind, number.to_string(), title.to_string()))
        })
    }

    pub fn segment(&self, text: &str) -> Segmentation {
        #[derive(Debug)]
        struct OpenUnit {
            kind: UnitKind,
            number: String,
            title: String,
            source_label: String,
            body_lines: Vec<String>,
        }

        let finalize = |open: OpenUnit| -> StructuralUnit {
            let body = open.body_lines.join("\n");
            StructuralUnit {
                kind: open.kind,
                number: open.number,
                title: open.title,
                content: self.emphasis.format_body(body.trim()),
                source_label: open.source_label,
            }
        };

        let mut segmentation = Segmentation::default();
        let mut current: Option<OpenUnit> = None;

        for raw_line in text.lines() {
            let line = raw_line.trim();
            if line.is_empty() {
                continue;
            }

            if let Some((kind, number, title)) = self.classify(line) {
                if let Some(open) = current.take() {
                    segmentation.units.push(finalize(open));
                }
                debug!(kind = kind.as_str(), number = %number, "opened unit");
                current = Some(OpenUnit {
                    kind,
                    number,
                    title,
                    source_label: line.to_string(),
                    body_lines: Vec::new(),
                });
                continue;
            }

            match current.as_mut() {
                Some(open) => open.body_lines.push(line.to_string()),
                None => segmentation.discarded_leading_lines += 1,
            }
        }

        if let Some(open) = current.take() {
            if open.body_lines.is_empty() {
                segmentation.dropped_trailing_heading = Some(open.source_label);
            } else {
                segmentation.units.push(finalize(open));
            }
        }

        segmentation
    }
}
