use anyhow::{Context, Result};
use regex::{Captures, Regex};

/// Switches for each normalization pass. Every pass is on by default.
#[derive(Debug, Clone)]
pub struct NormalizeOptions {
    pub collapse_blank_lines: bool,
    pub collapse_spaces: bool,
    /// Joins `word-\nword` into `wordword`. Also merges genuine hyphenated
    /// compounds that happen to break at a line end.
    pub rejoin_hyphenation: bool,
    pub strip_boilerplate: bool,
    /// Literal prefixes identifying running header/footer lines.
    pub running_header_prefixes: Vec<String>,
}

impl Default for NormalizeOptions {
    fn default() -> Self {
        Self {
            collapse_blank_lines: true,
            collapse_spaces: true,
            rejoin_hyphenation: true,
            strip_boilerplate: true,
            running_header_prefixes: vec!["ABS".to_string(), "PART 7".to_string()],
        }
    }
}

impl From<&crate::cli::PdfArgs> for NormalizeOptions {
    fn from(args: &crate::cli::PdfArgs) -> Self {
        Self {
            collapse_blank_lines: !args.no_collapse_blank_lines,
            collapse_spaces: !args.no_collapse_spaces,
            rejoin_hyphenation: !args.no_rejoin_hyphenation,
            strip_boilerplate: !args.no_strip_boilerplate,
            running_header_prefixes: args.header_prefixes.clone(),
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct NormalizeStats {
    pub blank_line_runs_collapsed: usize,
    pub dehyphenation_merges: usize,
    pub boilerplate_lines_removed: usize,
}

#[derive(Debug)]
pub struct TextNormalizer {
    options: NormalizeOptions,
    blank_line_run: Regex,
    horizontal_space: Regex,
    hyphen_break: Regex,
    page_number_line: Regex,
}

impl TextNormalizer {
    pub fn new(options: NormalizeOptions) -> Result<Self> {
        Ok(Self {
            options,
            blank_line_run: Regex::new(r"\n\s*\n\s*\n")
                .context("failed to compile blank line regex")?,
            horizontal_space: Regex::new(r"[ \t]+")
                .context("failed to compile horizontal space regex")?,
            hyphen_break: Regex::new(r"(\w+)-\s*\n\s*(\w+)")
                .context("failed to compile hyphen break regex")?,
            page_number_line: Regex::new(r"^\s*Page \d+")
                .context("failed to compile page number regex")?,
        })
    }

    /// Concatenates pages with a paragraph break and runs the enabled
    /// passes in order over the whole stream.
    pub fn normalize_pages(&self, pages: &[String]) -> (String, NormalizeStats) {
        let joined = pages
            .iter()
            .map(|page| page.trim())
            .filter(|page| !page.is_empty())
            .collect::<Vec<&str>>()
            .join("\n\n");
        self.normalize(&joined)
    }

    pub fn normalize(&self, text: &str) -> (String, NormalizeStats) {
        let mut stats = NormalizeStats::default();
        let mut text = text.replace("\r\n", "\n");

        if self.options.collapse_blank_lines {
            let (collapsed, count) = self.collapse_blank_lines(&text);
            text = collapsed;
            stats.blank_line_runs_collapsed = count;
        }
        if self.options.collapse_spaces {
            text = self.collapse_spaces(&text);
        }
        if self.options.rejoin_hyphenation {
            let (joined, merges) = self.rejoin_hyphenation(&text);
            text = joined;
            stats.dehyphenation_merges = merges;
        }
        if self.options.strip_boilerplate {
            let (stripped, removed) = self.strip_boilerplate(&text);
            text = stripped;
            stats.boilerplate_lines_removed = removed;
        }

        (text.trim().to_string(), stats)
    }

    pub fn collapse_blank_lines(&self, text: &str) -> (String, usize) {
        let count = self.blank_line_run.find_iter(text).count();
        (self.blank_line_run.replace_all(text, "\n\n").into_owned(), count)
    }

    pub fn collapse_spaces(&self, text: &str) -> String {
        self.horizontal_space.replace_all(text, " ").into_owned()
    }

    pub fn rejoin_hyphenation(&self, text: &str) -> (String, usize) {
        let mut merges = 0usize;
        let joined = self
            .hyphen_break
            .replace_all(text, |captures: &Captures| {
                merges += 1;
                format!("{}{}", &captures[1], &captures[2])
            })
            .into_owned();
        (joined, merges)
    }

    pub fn strip_boilerplate(&self, text: &str) -> (String, usize) {
        let mut removed = 0usize;
        let kept = text
            .split('\n')
            .filter(|line| {
                let boilerplate = self.is_boilerplate_line(line);
                if boilerplate {
                    removed += 1;
                }
                !boilerplate
            })
            .collect::<Vec<&str>>()
            .join("\n");
        (kept, removed)
    }

    fn is_boilerplate_line(&self, line: &str) -> bool {
        if self.page_number_line.is_match(line) {
            return true;
        }

        let trimmed = line.trim_start();
        self.options
            .running_header_prefixes
            .iter()
            .filter(|prefix| !prefix.is_empty())
            .any(|prefix| trimmed.starts_with(prefix.as_str()))
    }
}
