pub mod document;
pub mod poppler;

pub use document::LopdfBackend;
pub use poppler::PopplerBackend;

use crate::error::ToolError;
use std::path::Path;

/// The two things a book needs from its source document.
pub trait PdfBackend {
    /// Total number of pages in `document`
    fn page_count(&self, document: &Path) -> Result<u32, ToolError>;

    /// Write pages `first..=last` (1-based) of `document` to `output`
    fn extract(&self, document: &Path, first: u32, last: u32, output: &Path)
        -> Result<(), ToolError>;
}
