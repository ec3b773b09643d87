use crate::book::{BookOptions, TrailingSection, DEFAULT_MAX_INFERRED_GAP};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "pdfexplode")]
#[command(about = "Split a PDF book into one file per section, driven by a hand-written index")]
#[command(version)]
pub struct Cli {
    /// Tool used to count and extract pages
    #[arg(long, value_enum, default_value = "lopdf", global = true)]
    pub backend: BackendKind,

    /// Longest section (in pages) whose end may be inferred from the next section
    #[arg(long, default_value_t = DEFAULT_MAX_INFERRED_GAP, global = true)]
    pub max_gap: u32,

    /// How far the last section runs when the index gives no end page
    #[arg(long, value_enum, default_value = "extend", global = true)]
    pub trailing_section: TrailingArg,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    pub fn book_options(&self) -> BookOptions {
        BookOptions {
            max_inferred_gap: self.max_gap,
            trailing_section: self.trailing_section.into(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum BackendKind {
    /// Read and write PDFs in-process
    Lopdf,
    /// Shell out to pdfinfo and pdfjam
    Poppler,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum TrailingArg {
    /// Run to the last page of the document
    Extend,
    /// Stop at its first page
    Single,
}

impl From<TrailingArg> for TrailingSection {
    fn from(arg: TrailingArg) -> Self {
        match arg {
            TrailingArg::Extend => TrailingSection::ExtendToEnd,
            TrailingArg::Single => TrailingSection::SinglePage,
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct BookArgs {
    /// A book to process: index file, PDF, description (repeatable)
    #[arg(
        long = "book",
        num_args = 3,
        value_names = ["INDEX", "PDF", "DESCRIPTION"],
        required = true
    )]
    pub book: Vec<String>,
}

/// One (index, document, description) triple from the command line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookSpec {
    pub index: PathBuf,
    pub pdf: PathBuf,
    pub description: String,
}

impl BookArgs {
    pub fn specs(&self) -> Vec<BookSpec> {
        self.book
            .chunks_exact(3)
            .map(|triple| BookSpec {
                index: PathBuf::from(&triple[0]),
                pdf: PathBuf::from(&triple[1]),
                description: triple[2].clone(),
            })
            .collect()
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run as MCP server
    Mcp,

    /// List each book's sections with their resolved pages
    Sections {
        #[command(flatten)]
        books: BookArgs,
    },

    /// Report pages not covered by any section
    Missing {
        #[command(flatten)]
        books: BookArgs,
    },

    /// Write every section to its own PDF
    #[command(alias = "split")]
    Explode {
        #[command(flatten)]
        books: BookArgs,

        /// Output directory
        #[arg(short, long)]
        output_dir: PathBuf,
    },
}
