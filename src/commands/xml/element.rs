use roxmltree::Node;

use crate::markup::HeadingLevel;

/// Value of a division's `TYPE` attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DivisionType {
    Title,
    Chapter,
    Subchapter,
    Part,
    Subpart,
    Section,
    /// Any other type (subject groups, appendices, missing `TYPE`), kept
    /// verbatim so it can be reported.
    Other(String),
}

impl DivisionType {
    pub fn parse(raw: &str) -> Self {
        let normalized = raw.trim().to_ascii_uppercase();
        match normalized.as_str() {
            "TITLE" => DivisionType::Title,
            "CHAPTER" => DivisionType::Chapter,
            "SUBCHAP" | "SUBCHAPTER" => DivisionType::Subchapter,
            "PART" => DivisionType::Part,
            "SUBPART" => DivisionType::Subpart,
            "SECTION" => DivisionType::Section,
            _ => DivisionType::Other(normalized),
        }
    }

    pub fn heading_level(&self) -> HeadingLevel {
        match self {
            DivisionType::Title => HeadingLevel::new(1),
            DivisionType::Chapter => HeadingLevel::new(2),
            DivisionType::Subchapter => HeadingLevel::new(3),
            DivisionType::Part => HeadingLevel::new(4),
            DivisionType::Subpart => HeadingLevel::new(5),
            DivisionType::Section | DivisionType::Other(_) => HeadingLevel::DEEPEST,
        }
    }
}

/// Structural role of a markup element inside a division.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ElementKind {
    Division(DivisionType),
    Heading,
    Paragraph,
    Authority,
    Source,
    EditorialNote,
    Citation,
    Other,
}

impl ElementKind {
    pub fn of(node: Node<'_, '_>) -> Self {
        if !node.is_element() {
            return ElementKind::Other;
        }

        match node.tag_name().name() {
            "HEAD" => ElementKind::Heading,
            "P" => ElementKind::Paragraph,
            "AUTH" => ElementKind::Authority,
            "SOURCE" => ElementKind::Source,
            "EDNOTE" => ElementKind::EditorialNote,
            "CITA" => ElementKind::Citation,
            tag if is_division_tag(tag) => {
                ElementKind::Division(DivisionType::parse(node.attribute("TYPE").unwrap_or("")))
            }
            _ => ElementKind::Other,
        }
    }
}

/// `DIV1` through `DIV9`.
pub fn is_division_tag(tag: &str) -> bool {
    tag.strip_prefix("DIV")
        .map(|depth| !depth.is_empty() && depth.chars().all(|ch| ch.is_ascii_digit()))
        .unwrap_or(false)
}

pub fn first_child_of_kind<'a, 'input>(
    node: Node<'a, 'input>,
    kind: &ElementKind,
) -> Option<Node<'a, 'input>> {
    node.children().find(|child| ElementKind::of(*child) == *kind)
}

pub fn children_of_kind<'a, 'input>(
    node: Node<'a, 'input>,
    kind: ElementKind,
) -> impl Iterator<Item = Node<'a, 'input>> {
    node.children()
        .filter(move |child| ElementKind::of(*child) == kind)
}
