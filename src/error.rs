use std::ops::RangeInclusive;
use std::path::PathBuf;
use thiserror::Error;

/// Failures of the page-counting and page-extraction collaborators.
#[derive(Error, Debug)]
pub enum ToolError {
    #[error("Failed to run {tool}: {source}")]
    Spawn {
        tool: String,
        #[source]
        source: std::io::Error,
    },

    #[error(
        "{}\n{tool} failed with args {args:?}\nSTDOUT:\n{stdout}\nSTDERR:\n{stderr}",
        "-".repeat(70)
    )]
    CommandFailed {
        tool: String,
        args: Vec<String>,
        stdout: String,
        stderr: String,
    },

    #[error("{tool} {} didn't return a page count", .path.display())]
    NoPageCount { tool: String, path: PathBuf },

    #[error("Failed to open PDF: {}: {source}", .path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: lopdf::Error,
    },

    #[error("Failed to save PDF: {}: {reason}", .path.display())]
    Save { path: PathBuf, reason: String },

    #[error("Page {page} is out of range (1-{total})")]
    PageOutOfRange { page: u32, total: u32 },
}

/// A section whose pages run past the end of its document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Overflow {
    pub section: String,
    pub pages: RangeInclusive<u32>,
}

#[derive(Error, Debug)]
pub enum BookError {
    #[error("Failed to read index {}: {source}", .path.display())]
    ReadIndex {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse line {line} of {} ({reason}):\n[{text}]", .path.display())]
    Malformed {
        path: PathBuf,
        line: usize,
        reason: String,
        text: String,
    },

    #[error("Invalid last page '{value}' for '{section}' on line {line} of {}", .path.display())]
    InvalidLastPage {
        path: PathBuf,
        line: usize,
        section: String,
        value: String,
    },

    #[error("Failed to count pages of {}: {source}", .path.display())]
    PageCount {
        path: PathBuf,
        #[source]
        source: ToolError,
    },

    #[error(
        "{section} p{first_page} in {book} followed by {next_section} p{next_first_page} \
         (more than {max_gap} pages apart)"
    )]
    ImplausibleGap {
        book: String,
        section: String,
        first_page: u32,
        next_section: String,
        next_first_page: u32,
        max_gap: u32,
    },

    #[error("Sections with pages too high in {book} ({total_pages} pages):\n{}", format_overflows(.overflows))]
    PagesOutOfRange {
        book: String,
        total_pages: u32,
        overflows: Vec<Overflow>,
    },

    #[error("Failed to create directory: {}: {source}", .path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to extract '{section}': {source}")]
    Extract {
        section: String,
        #[source]
        source: ToolError,
    },
}

fn format_overflows(overflows: &[Overflow]) -> String {
    overflows
        .iter()
        .map(|o| {
            let (start, end) = (*o.pages.start(), *o.pages.end());
            if start == end {
                format!("  {}: {}", o.section, start)
            } else {
                format!("  {}: {}-{}", o.section, start, end)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}
