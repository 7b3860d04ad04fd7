use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "regdoc",
    version,
    about = "Convert regulatory PDFs and eCFR XML into heading-annotated markdown"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List convertible sources in a directory with their hashes.
    Inventory(InventoryArgs),
    /// Convert a paginated PDF through the line-pattern segmenter.
    Pdf(PdfArgs),
    /// Convert one or more eCFR XML files through the tree walker.
    Xml(XmlArgs),
}

#[derive(Args, Debug, Clone)]
pub struct InventoryArgs {
    #[arg(long, default_value = ".")]
    pub source_dir: PathBuf,

    #[arg(long)]
    pub manifest_path: Option<PathBuf>,

    #[arg(long, default_value_t = false)]
    pub dry_run: bool,
}

#[derive(Args, Debug, Clone)]
pub struct EmphasisArgs {
    /// Leave x.y.z, "Section N" and "Chapter N" references unbolded.
    #[arg(long, default_value_t = false)]
    pub no_reference_emphasis: bool,

    /// Leave shall/must/may style terms unemphasized.
    #[arg(long, default_value_t = false)]
    pub no_keyword_emphasis: bool,
}

#[derive(Args, Debug, Clone)]
pub struct PdfArgs {
    #[arg(long)]
    pub input: PathBuf,

    #[arg(long)]
    pub output: PathBuf,

    /// Document title for the leading heading; defaults to the input file stem.
    #[arg(long)]
    pub title: Option<String>,

    #[arg(long)]
    pub subtitle: Option<String>,

    #[arg(long)]
    pub max_pages: Option<usize>,

    /// Lines starting with one of these literals are dropped as running headers.
    #[arg(long = "header-prefix", default_values = ["ABS", "PART 7"])]
    pub header_prefixes: Vec<String>,

    /// Additional heading regex (number and title captures), tried after the built-in table.
    #[arg(long = "extra-heading-pattern")]
    pub extra_heading_patterns: Vec<String>,

    #[arg(long, default_value_t = false)]
    pub no_collapse_blank_lines: bool,

    #[arg(long, default_value_t = false)]
    pub no_collapse_spaces: bool,

    #[arg(long, default_value_t = false)]
    pub no_rejoin_hyphenation: bool,

    #[arg(long, default_value_t = false)]
    pub no_strip_boilerplate: bool,

    #[arg(long, default_value_t = false)]
    pub no_toc: bool,

    /// Write the segmented unit sequence as JSON.
    #[arg(long)]
    pub units_path: Option<PathBuf>,

    #[arg(long)]
    pub manifest_path: Option<PathBuf>,

    #[command(flatten)]
    pub emphasis: EmphasisArgs,
}

#[derive(Args, Debug, Clone)]
pub struct XmlArgs {
    #[arg(long = "input", required = true)]
    pub inputs: Vec<PathBuf>,

    /// Directory for `<stem>.md` outputs; defaults to each input's directory.
    #[arg(long)]
    pub output_dir: Option<PathBuf>,

    #[arg(long)]
    pub manifest_path: Option<PathBuf>,

    #[command(flatten)]
    pub emphasis: EmphasisArgs,
}
