use std::collections::BTreeSet;

use roxmltree::Node;
use tracing::debug;

use crate::markup::{Emphasis, EmphasisKind};

use super::element::{DivisionType, ElementKind, children_of_kind, first_child_of_kind};
use super::inline::InlineRenderer;

/// Most recent heading seen at each ancestor level. Entries are replaced
/// when a division of that level is visited and never cleared within a
/// document.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ContextStack {
    pub title: String,
    pub chapter: String,
    pub part: String,
    pub subpart: String,
    pub section: String,
}

impl ContextStack {
    pub fn record(&mut self, division: &DivisionType, heading: &str) {
        let slot = match division {
            DivisionType::Title => &mut self.title,
            DivisionType::Chapter => &mut self.chapter,
            DivisionType::Part => &mut self.part,
            DivisionType::Subpart => &mut self.subpart,
            DivisionType::Section => &mut self.section,
            DivisionType::Subchapter | DivisionType::Other(_) => return,
        };
        *slot = heading.to_string();
    }

    pub fn breadcrumb(&self) -> String {
        [
            &self.title,
            &self.chapter,
            &self.part,
            &self.subpart,
            &self.section,
        ]
        .iter()
        .filter(|value| !value.is_empty())
        .map(|value| value.as_str())
        .collect::<Vec<&str>>()
        .join(" > ")
    }
}

#[derive(Debug, Default, Clone)]
pub struct WalkStats {
    pub divisions: usize,
    pub sections: usize,
    pub paragraphs: usize,
    pub auxiliary_blocks: usize,
    pub citations: usize,
    pub unknown_division_types: BTreeSet<String>,
}

/// Per-document mutable state threaded through the recursion.
#[derive(Debug, Default)]
pub struct WalkState {
    pub context: ContextStack,
    pub stats: WalkStats,
}

/// Ensures a section heading carries the `§` symbol exactly once. Headings
/// that do not start with a section number are returned unchanged.
pub fn format_section_number(heading: &str) -> String {
    let heading = heading.trim();
    if heading.starts_with('§') {
        return heading.to_string();
    }

    let first_token = heading.split_whitespace().next().unwrap_or("");
    let is_number = first_token.chars().any(|ch| ch.is_ascii_digit())
        && first_token
            .chars()
            .all(|ch| ch.is_ascii_digit() || ch == '.' || ch == '-');

    if is_number {
        format!("§ {heading}")
    } else {
        heading.to_string()
    }
}

/// Pre-order renderer for a division subtree.
///
/// For each division: heading, then authority/source/editorial-note blocks
/// in that fixed order, then direct paragraphs, then direct citations,
/// then child divisions with a different tag.
#[derive(Debug)]
pub struct HierarchyWalker<'r> {
    inline: &'r InlineRenderer,
    emphasis: &'r Emphasis,
}

impl<'r> HierarchyWalker<'r> {
    pub fn new(inline: &'r InlineRenderer, emphasis: &'r Emphasis) -> Self {
        Self { inline, emphasis }
    }

    pub fn render_division(&self, node: Node<'_, '_>, state: &mut WalkState) -> String {
        let division = match ElementKind::of(node) {
            ElementKind::Division(division) => division,
            _ => DivisionType::Other(node.tag_name().name().to_string()),
        };
        state.stats.divisions += 1;
        if let DivisionType::Other(raw) = &division {
            if state.stats.unknown_division_types.insert(raw.clone()) {
                debug!(division_type = %raw, "rendering unrecognized division type at deepest level");
            }
        }

        let mut blocks = Vec::<String>::new();

        if let Some(head) = first_child_of_kind(node, &ElementKind::Heading) {
            let mut heading = self.inline.text(head);
            state.context.record(&division, &heading);
            if division == DivisionType::Section {
                heading = format_section_number(&heading);
                state.stats.sections += 1;
                debug!(section = %heading, context = %state.context.breadcrumb(), "section");
            }
            blocks.push(format!("\n{}\n", division.heading_level().heading(&heading)));
        }

        for kind in [
            ElementKind::Authority,
            ElementKind::Source,
            ElementKind::EditorialNote,
        ] {
            if let Some(block) = first_child_of_kind(node, &kind) {
                let rendered = self.render_auxiliary(block);
                if !rendered.is_empty() {
                    state.stats.auxiliary_blocks += 1;
                    blocks.push(rendered);
                }
            }
        }

        for paragraph in children_of_kind(node, ElementKind::Paragraph) {
            let text = self.inline.text(paragraph);
            if text.is_empty() {
                continue;
            }
            state.stats.paragraphs += 1;
            blocks.push(format!("\n{}\n", self.emphasis.annotate(&text)));
        }

        for citation in children_of_kind(node, ElementKind::Citation) {
            let text = self.inline.text(citation);
            if text.is_empty() {
                continue;
            }
            state.stats.citations += 1;
            blocks.push(format!("\n{}\n", EmphasisKind::Italic.wrap(&text)));
        }

        let own_tag = node.tag_name().name();
        for child in node.children() {
            if matches!(ElementKind::of(child), ElementKind::Division(_))
                && child.tag_name().name() != own_tag
            {
                blocks.push(self.render_division(child, state));
            }
        }

        blocks.join("\n")
    }

    /// Bold `HED` label line followed by each `PSPACE`/`P` body line.
    fn render_auxiliary(&self, node: Node<'_, '_>) -> String {
        let mut lines = Vec::<String>::new();

        if let Some(label) = node
            .children()
            .find(|child| child.is_element() && child.has_tag_name("HED"))
        {
            let label = self.inline.text(label);
            if !label.is_empty() {
                lines.push(format!("\n{}", EmphasisKind::Bold.wrap(&label)));
            }
        }

        for body in node.children().filter(|child| {
            child.is_element() && (child.has_tag_name("PSPACE") || child.has_tag_name("P"))
        }) {
            let text = self.inline.text(body);
            if !text.is_empty() {
                lines.push(text);
            }
        }

        if lines.is_empty() {
            return String::new();
        }

        lines.push(String::new());
        lines.join("\n")
    }
}
