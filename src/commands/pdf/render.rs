use crate::markup::EmphasisKind;

use super::segment::{StructuralUnit, UnitKind};

/// Heading line for one unit. Tables and figures use the composite
/// `Table N - Title` form at a fixed depth; the generic kind repeats the
/// matched source line verbatim.
pub fn unit_heading(unit: &StructuralUnit) -> String {
    let text = match unit.kind {
        UnitKind::Chapter => format!("Chapter {}: {}", unit.number, unit.title),
        UnitKind::Section => format!("Section {}: {}", unit.number, unit.title),
        UnitKind::MainSection | UnitKind::Subsection | UnitKind::Subsubsection => {
            format!("{} {}", unit.number, unit.title)
        }
        UnitKind::Table => format!("Table {} - {}", unit.number, unit.title),
        UnitKind::Figure => format!("Figure {} - {}", unit.number, unit.title),
        UnitKind::Heading => unit.source_label.clone(),
        UnitKind::Item => {
            let label = EmphasisKind::Bold.wrap(&format!("{}.", unit.number));
            return format!("{label} {}", unit.title);
        }
    };

    match unit.kind.heading_level() {
        Some(level) => level.heading(&text),
        None => text,
    }
}

#[derive(Debug, Clone, Default)]
pub struct DocumentHeader {
    pub title: String,
    pub subtitle: Option<String>,
}

pub fn render_document(
    header: &DocumentHeader,
    table_of_contents: &str,
    units: &[StructuralUnit],
) -> String {
    let mut blocks = Vec::with_capacity(units.len() * 2 + 2);

    blocks.push(format!("# {}\n", header.title));
    if let Some(subtitle) = header.subtitle.as_deref().filter(|value| !value.is_empty()) {
        blocks.push(format!("{}\n", EmphasisKind::Italic.wrap(subtitle)));
    }

    for unit in units {
        blocks.push(format!("\n{}\n", unit_heading(unit)));
        if !unit.content.is_empty() {
            blocks.push(format!("{}\n", unit.content));
        }
    }

    format!("{table_of_contents}{}", blocks.join("\n"))
}
