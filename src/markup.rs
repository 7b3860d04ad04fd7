//! Output vocabulary shared by both pipelines: leveled `#` headings,
//! inline emphasis markers, and the keyword/cross-reference pass that runs
//! over assembled body text.

use anyhow::{Context, Result};
use regex::Regex;

/// Heading depth, 1 (outermost) through 6.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct HeadingLevel(u8);

impl HeadingLevel {
    pub const DEEPEST: HeadingLevel = HeadingLevel(6);

    /// Out-of-range values are clamped into 1..=6.
    pub fn new(level: u8) -> Self {
        Self(level.clamp(1, 6))
    }

    pub fn get(self) -> u8 {
        self.0
    }

    pub fn marker(self) -> String {
        "#".repeat(usize::from(self.get()))
    }

    pub fn heading(self, text: &str) -> String {
        format!("{} {}", self.marker(), text)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmphasisKind {
    Bold,
    Italic,
    Superscript,
    Subscript,
}

impl EmphasisKind {
    pub fn marker(self) -> &'static str {
        match self {
            EmphasisKind::Bold => "**",
            EmphasisKind::Italic => "*",
            EmphasisKind::Superscript => "^",
            EmphasisKind::Subscript => "_",
        }
    }

    pub fn wrap(self, inner: &str) -> String {
        let marker = self.marker();
        format!("{marker}{inner}{marker}")
    }
}

#[derive(Debug, Clone, Copy)]
pub struct EmphasisOptions {
    pub references: bool,
    pub keywords: bool,
}

impl Default for EmphasisOptions {
    fn default() -> Self {
        Self {
            references: true,
            keywords: true,
        }
    }
}

impl From<&crate::cli::EmphasisArgs> for EmphasisOptions {
    fn from(args: &crate::cli::EmphasisArgs) -> Self {
        Self {
            references: !args.no_reference_emphasis,
            keywords: !args.no_keyword_emphasis,
        }
    }
}

/// Keyword and cross-reference emphasis over plain text.
///
/// Rules run in a fixed order: numeric `x.y.z` references, `Section N`,
/// `Chapter N`, mandatory terms, then permissive terms. A match that is
/// already enclosed in the marker it would receive is left alone, so the
/// pass is idempotent over its own output.
#[derive(Debug)]
pub struct Emphasis {
    options: EmphasisOptions,
    numeric_reference: Regex,
    section_reference: Regex,
    chapter_reference: Regex,
    mandatory_terms: Regex,
    permissive_terms: Regex,
    bullet_marker: Regex,
    letter_marker: Regex,
    number_marker: Regex,
}

impl Emphasis {
    pub fn new(options: EmphasisOptions) -> Result<Self> {
        Ok(Self {
            options,
            numeric_reference: Regex::new(r"\b\d+\.\d+\.\d+\b")
                .context("failed to compile numeric reference regex")?,
            section_reference: Regex::new(r"\bSection \d+\b")
                .context("failed to compile section reference regex")?,
            chapter_reference: Regex::new(r"\bChapter \d+\b")
                .context("failed to compile chapter reference regex")?,
            mandatory_terms: Regex::new(r"(?i)\b(?:shall|must|required|mandatory)\b")
                .context("failed to compile mandatory term regex")?,
            permissive_terms: Regex::new(r"(?i)\b(?:may|optional|recommended)\b")
                .context("failed to compile permissive term regex")?,
            bullet_marker: Regex::new(r"(?m)^[-•][ \t]+")
                .context("failed to compile bullet marker regex")?,
            letter_marker: Regex::new(r"(?m)^[ \t]*\([a-z]\)[ \t]+")
                .context("failed to compile lettered marker regex")?,
            number_marker: Regex::new(r"(?m)^[ \t]*\d+\)[ \t]+")
                .context("failed to compile numbered marker regex")?,
        })
    }

    /// Cross-reference pass followed by the keyword pass.
    pub fn annotate(&self, text: &str) -> String {
        let text = self.annotate_references(text);
        self.annotate_keywords(&text)
    }

    pub fn annotate_references(&self, text: &str) -> String {
        if !self.options.references {
            return text.to_string();
        }

        let bold = EmphasisKind::Bold;
        let text = wrap_unmarked(&self.numeric_reference, text, bold);
        let text = wrap_unmarked(&self.section_reference, &text, bold);
        wrap_unmarked(&self.chapter_reference, &text, bold)
    }

    pub fn annotate_keywords(&self, text: &str) -> String {
        if !self.options.keywords {
            return text.to_string();
        }

        let text = wrap_unmarked(&self.mandatory_terms, text, EmphasisKind::Bold);
        wrap_unmarked(&self.permissive_terms, &text, EmphasisKind::Italic)
    }

    /// Rewrites list-like line prefixes into the output list vocabulary.
    pub fn format_list_markers(&self, text: &str) -> String {
        let text = self.bullet_marker.replace_all(text, "- ");
        let text = self.letter_marker.replace_all(&text, "  - ");
        self.number_marker.replace_all(&text, "  1. ").into_owned()
    }

    /// List markers, then cross-references, then keywords.
    pub fn format_body(&self, text: &str) -> String {
        self.annotate(&self.format_list_markers(text))
    }
}

fn wrap_unmarked(regex: &Regex, text: &str, kind: EmphasisKind) -> String {
    let marker = kind.marker();
    let mut out = String::with_capacity(text.len());
    let mut last = 0usize;

    for found in regex.find_iter(text) {
        out.push_str(&text[last..found.start()]);
        let enclosed =
            text[..found.start()].ends_with(marker) && text[found.end()..].starts_with(marker);
        if enclosed {
            out.push_str(found.as_str());
        } else {
            out.push_str(&kind.wrap(found.as_str()));
        }
        last = found.end();
    }

    out.push_str(&text[last..]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn emphasis() -> Emphasis {
        Emphasis::new(EmphasisOptions::default()).expect("emphasis regexes compile")
    }

    #[test]
    fn heading_level_clamps_and_renders_marker() {
        assert_eq!(HeadingLevel::new(0).get(), 1);
        assert_eq!(HeadingLevel::new(9), HeadingLevel::DEEPEST);
        assert_eq!(HeadingLevel::new(3).heading("Scope"), "### Scope");
    }

    #[test]
    fn keywords_keep_original_casing() {
        let engine = emphasis();
        assert_eq!(
            engine.annotate("Equipment shall be tested"),
            "Equipment **shall** be tested"
        );
        assert_eq!(
            engine.annotate("testing may be deferred"),
            "testing *may* be deferred"
        );
        assert_eq!(
            engine.annotate("Testing is MANDATORY, or Optional"),
            "Testing is **MANDATORY**, or *Optional*"
        );
    }

    #[test]
    fn keywords_respect_word_boundaries() {
        let engine = emphasis();
        assert_eq!(
            engine.annotate("Mayor dismay, mustard and requirements"),
            "Mayor dismay, mustard and requirements"
        );
    }

    #[test]
    fn references_are_bolded() {
        let engine = emphasis();
        assert_eq!(
            engine.annotate("See 2.3.4 and Section 5 of Chapter 12."),
            "See **2.3.4** and **Section 5** of **Chapter 12**."
        );
        assert_eq!(engine.annotate("See 2.3 only"), "See 2.3 only");
    }

    #[test]
    fn text_without_keywords_is_unchanged() {
        let engine = emphasis();
        let text = "This part applies to all vessels.";
        assert_eq!(engine.annotate(text), text);
    }

    #[test]
    fn annotate_is_idempotent_on_its_output() {
        let engine = emphasis();
        let once = engine.annotate("Hulls shall be gauged per 7.1.2; repairs may wait. Section 3");
        assert_eq!(engine.annotate(&once), once);
    }

    #[test]
    fn disabled_classes_pass_text_through() {
        let engine = Emphasis::new(EmphasisOptions {
            references: false,
            keywords: true,
        })
        .expect("emphasis regexes compile");
        assert_eq!(engine.annotate("1.2.3 shall"), "1.2.3 **shall**");
    }

    #[test]
    fn list_markers_are_normalized() {
        let engine = emphasis();
        let text = "• first\n(b) lettered\n2) numbered\nplain";
        assert_eq!(
            engine.format_list_markers(text),
            "- first\n  - lettered\n  1. numbered\nplain"
        );
    }

    #[test]
    fn emphasis_kinds_wrap_with_their_markers() {
        assert_eq!(EmphasisKind::Superscript.wrap("2"), "^2^");
        assert_eq!(EmphasisKind::Subscript.wrap("x"), "_x_");
        assert_eq!(EmphasisKind::Italic.wrap("i"), "*i*");
    }
}
