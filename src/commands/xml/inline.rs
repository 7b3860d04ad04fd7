use anyhow::{Context, Result};
use regex::Regex;
use roxmltree::Node;

use crate::markup::EmphasisKind;

/// Marker for an inline element, if it carries one. `E` elements choose
/// by their `T` code and default to italic.
pub fn inline_emphasis(node: Node<'_, '_>) -> Option<EmphasisKind> {
    match node.tag_name().name() {
        "E" => match node.attribute("T").unwrap_or("03") {
            "01" | "02" => Some(EmphasisKind::Bold),
            "03" | "04" => Some(EmphasisKind::Italic),
            _ => None,
        },
        "I" => Some(EmphasisKind::Italic),
        "B" => Some(EmphasisKind::Bold),
        "SU" => Some(EmphasisKind::Superscript),
        "SB" => Some(EmphasisKind::Subscript),
        _ => None,
    }
}

/// Flattens an element's text and nested inline markup into one
/// annotated, whitespace-normalized string.
#[derive(Debug)]
pub struct InlineRenderer {
    whitespace: Regex,
    space_before_punctuation: Regex,
    sentence_gap: Regex,
}

impl InlineRenderer {
    pub fn new() -> Result<Self> {
        Ok(Self {
            whitespace: Regex::new(r"\s+").context("failed to compile whitespace regex")?,
            space_before_punctuation: Regex::new(r"\s+([.,:;!?])")
                .context("failed to compile punctuation spacing regex")?,
            sentence_gap: Regex::new(r"([.!?])\s*([A-Z])")
                .context("failed to compile sentence gap regex")?,
        })
    }

    pub fn text(&self, node: Node<'_, '_>) -> String {
        let mut content = String::new();
        if let Some(text) = node.text() {
            content.push_str(text);
        }

        for child in node.children().filter(|child| child.is_element()) {
            let inner = self.text(child);
            match inline_emphasis(child) {
                Some(kind) if !inner.is_empty() => content.push_str(&kind.wrap(&inner)),
                _ => content.push_str(&inner),
            }

            if let Some(tail) = child.tail() {
                content.push_str(tail);
            }
        }

        self.clean(&content)
    }

    pub fn clean(&self, text: &str) -> String {
        let text = self.whitespace.replace_all(text.trim(), " ");
        let text = self.space_before_punctuation.replace_all(&text, "${1}");
        self.sentence_gap
            .replace_all(&text, "${1} ${2}")
            .into_owned()
    }
}
