use anyhow::Result;
use rmcp::{
    ServerHandler, ServiceExt,
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::{ServerCapabilities, ServerInfo},
    schemars, tool, tool_handler, tool_router,
};
use serde::{Deserialize, Serialize};

use crate::book::{page_runs, Book, BookOptions, TrailingSection};
use crate::pdf::LopdfBackend;

// Request structs for tools

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct BookRequest {
    #[schemars(description = "Path to the index file (CSV lines of name, first page, optional last page)")]
    pub index: String,
    #[schemars(description = "Path to the PDF the index describes")]
    pub path: String,
    #[schemars(description = "Free-form description of the book")]
    #[serde(default)]
    pub description: String,
    #[schemars(description = "Longest section in pages whose end may be inferred (default: 6)")]
    #[serde(default)]
    pub max_gap: Option<u32>,
    #[schemars(description = "Keep an open-ended last section to one page instead of running it to the end of the document (default: false)")]
    #[serde(default)]
    pub single_page_last_section: bool,
}

impl BookRequest {
    fn options(&self) -> BookOptions {
        let mut options = BookOptions::default();
        if let Some(max_gap) = self.max_gap {
            options.max_inferred_gap = max_gap;
        }
        if self.single_page_last_section {
            options.trailing_section = TrailingSection::SinglePage;
        }
        options
    }

    fn open(&self, backend: &LopdfBackend) -> Result<Book, String> {
        Book::open(
            &self.index,
            &self.path,
            &self.description,
            backend,
            &self.options(),
        )
        .map_err(|e| format!("Error: {}", e))
    }
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ExplodeRequest {
    #[serde(flatten)]
    pub book: BookRequest,
    #[schemars(description = "Directory to write one PDF per section into")]
    pub output_dir: String,
}

#[derive(Debug, Clone)]
pub struct BookServer {
    tool_router: ToolRouter<Self>,
}

impl BookServer {
    pub fn new() -> Self {
        Self {
            tool_router: Self::tool_router(),
        }
    }
}

impl Default for BookServer {
    fn default() -> Self {
        Self::new()
    }
}

#[tool_router]
impl BookServer {
    #[tool(description = "Validate a book's index and list its sections with resolved page ranges and output filenames")]
    fn book_sections(&self, Parameters(req): Parameters<BookRequest>) -> String {
        let backend = LopdfBackend::new();
        let book = match req.open(&backend) {
            Ok(b) => b,
            Err(e) => return e,
        };

        let result: Vec<SectionResult> = book
            .sections()
            .iter()
            .map(|s| {
                let (first_page, last_page) = s.page_span();
                SectionResult {
                    name: s.name.clone(),
                    latex_name: s.escaped_name.clone(),
                    first_page,
                    last_page,
                    filename: book.output_filename(s),
                }
            })
            .collect();
        serde_json::to_string_pretty(&result).unwrap_or_else(|e| format!("Error: {}", e))
    }

    #[tool(description = "Validate a book's index and list the pages of the PDF that no section covers")]
    fn book_missing_pages(&self, Parameters(req): Parameters<BookRequest>) -> String {
        let backend = LopdfBackend::new();
        let book = match req.open(&backend) {
            Ok(b) => b,
            Err(e) => return e,
        };

        let pages = book.missing_pages();
        let result = MissingPagesResult {
            total_pages: book.total_pages,
            summary: page_runs(&pages),
            pages,
        };
        serde_json::to_string_pretty(&result).unwrap_or_else(|e| format!("Error: {}", e))
    }

    #[tool(description = "Split a PDF into one file per index section. Files that already exist are left alone.")]
    fn book_explode(&self, Parameters(req): Parameters<ExplodeRequest>) -> String {
        let backend = LopdfBackend::new();
        let book = match req.book.open(&backend) {
            Ok(b) => b,
            Err(e) => return e,
        };

        match book.explode(&req.output_dir, &backend) {
            Ok(report) => {
                let result = ExplodeResult {
                    extracted: report
                        .extracted
                        .iter()
                        .map(|p| p.display().to_string())
                        .collect(),
                    skipped: report
                        .skipped
                        .iter()
                        .map(|p| p.display().to_string())
                        .collect(),
                };
                serde_json::to_string_pretty(&result).unwrap_or_else(|e| format!("Error: {}", e))
            }
            Err(e) => format!("Error: {}", e),
        }
    }
}

// Result types for MCP tools

#[derive(Debug, Serialize, Deserialize, schemars::JsonSchema)]
pub struct SectionResult {
    pub name: String,
    pub latex_name: String,
    pub first_page: u32,
    pub last_page: u32,
    pub filename: String,
}

#[derive(Debug, Serialize, Deserialize, schemars::JsonSchema)]
pub struct MissingPagesResult {
    pub total_pages: u32,
    pub pages: Vec<u32>,
    pub summary: String,
}

#[derive(Debug, Serialize, Deserialize, schemars::JsonSchema)]
pub struct ExplodeResult {
    pub extracted: Vec<String>,
    pub skipped: Vec<String>,
}

#[tool_handler]
impl ServerHandler for BookServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "Split PDF books into sections using a hand-written index. Use book_sections to \
                 check an index and see the resolved page ranges, book_missing_pages to find pages \
                 no section covers, and book_explode to write one PDF per section."
                    .to_string(),
            ),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}

pub async fn run_server() -> Result<()> {
    let server = BookServer::new();

    // Serve using stdin/stdout as a tuple
    let service = server.serve((tokio::io::stdin(), tokio::io::stdout())).await?;

    service.waiting().await?;

    Ok(())
}
