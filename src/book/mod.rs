pub mod index;
pub mod section;

pub use section::Section;

use crate::error::{BookError, Overflow};
use crate::pdf::PdfBackend;
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

/// Largest number of pages a section may span when its end is inferred from
/// the next section's start. Longer inferred runs are almost always typos.
pub const DEFAULT_MAX_INFERRED_GAP: u32 = 6;

/// What to do with the last section when the index gives it no end page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrailingSection {
    /// Run to the last page of the document. The inferred-gap limit does not
    /// apply here; a run longer than it is logged as a warning.
    #[default]
    ExtendToEnd,
    /// Keep it to its first page
    SinglePage,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BookOptions {
    pub max_inferred_gap: u32,
    pub trailing_section: TrailingSection,
}

impl Default for BookOptions {
    fn default() -> Self {
        BookOptions {
            max_inferred_gap: DEFAULT_MAX_INFERRED_GAP,
            trailing_section: TrailingSection::default(),
        }
    }
}

/// A source document together with its validated sections.
#[derive(Debug)]
pub struct Book {
    pub path: PathBuf,
    pub index_path: PathBuf,
    pub description: String,
    pub name: String,
    pub total_pages: u32,
    sections: Vec<Section>,
    /// Page number to indices into `sections`
    coverage: BTreeMap<u32, Vec<usize>>,
}

/// Outcome of exploding a book into a directory.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ExplodeReport {
    pub extracted: Vec<PathBuf>,
    pub skipped: Vec<PathBuf>,
}

impl Book {
    /// Read the index, count pages, infer missing end pages and validate.
    ///
    /// A `Book` that comes back from here has every section resolved and
    /// within the document.
    pub fn open<P: AsRef<Path>, Q: AsRef<Path>>(
        index_path: P,
        path: Q,
        description: &str,
        backend: &dyn PdfBackend,
        options: &BookOptions,
    ) -> Result<Book, BookError> {
        let index_path = index_path.as_ref();
        tracing::info!("Processing {} ...", index_path.display());
        let sections = index::read_index(index_path)?;
        Self::from_sections(path, index_path, description, sections, backend, options)
    }

    /// Build a book from already parsed sections (sorted by first page)
    pub fn from_sections<P: AsRef<Path>, Q: AsRef<Path>>(
        path: P,
        index_path: Q,
        description: &str,
        mut sections: Vec<Section>,
        backend: &dyn PdfBackend,
        options: &BookOptions,
    ) -> Result<Book, BookError> {
        let path = path.as_ref().to_path_buf();
        let name = display_name(&path);

        let total_pages = backend
            .page_count(&path)
            .map_err(|source| BookError::PageCount {
                path: path.clone(),
                source,
            })?;
        tracing::debug!("{} has {} pages", name, total_pages);

        sections.sort_by_key(|s| s.first_page);
        infer_last_pages(&mut sections, total_pages, options).map_err(|gap| {
            BookError::ImplausibleGap {
                book: name.clone(),
                section: gap.section,
                first_page: gap.first_page,
                next_section: gap.next_section,
                next_first_page: gap.next_first_page,
                max_gap: options.max_inferred_gap,
            }
        })?;

        let coverage = build_coverage(&sections, total_pages);
        let book = Book {
            path,
            index_path: index_path.as_ref().to_path_buf(),
            description: description.to_string(),
            name,
            total_pages,
            sections,
            coverage,
        };
        book.validate_page_numbers()?;

        Ok(book)
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    /// Sections claiming `page`, in first-page order
    pub fn sections_on_page(&self, page: u32) -> impl Iterator<Item = &Section> + '_ {
        self.coverage
            .get(&page)
            .into_iter()
            .flatten()
            .map(move |&idx| &self.sections[idx])
    }

    /// Pages of the document no section claims
    pub fn missing_pages(&self) -> Vec<u32> {
        (1..=self.total_pages)
            .filter(|page| !self.coverage.contains_key(page))
            .collect()
    }

    pub fn output_filename(&self, section: &Section) -> String {
        section.output_filename(&self.name)
    }

    fn validate_page_numbers(&self) -> Result<(), BookError> {
        let overflows: Vec<Overflow> = self
            .sections
            .iter()
            .filter_map(|section| {
                let (first, last) = section.page_span();
                (last > self.total_pages).then(|| Overflow {
                    section: section.name.clone(),
                    pages: first.max(self.total_pages + 1)..=last,
                })
            })
            .collect();

        if overflows.is_empty() {
            return Ok(());
        }

        Err(BookError::PagesOutOfRange {
            book: self.name.clone(),
            total_pages: self.total_pages,
            overflows,
        })
    }

    /// Write each section to its own file in `dir`, leaving files that
    /// already exist untouched
    pub fn explode<P: AsRef<Path>>(
        &self,
        dir: P,
        backend: &dyn PdfBackend,
    ) -> Result<ExplodeReport, BookError> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir).map_err(|source| BookError::CreateDir {
            path: dir.to_path_buf(),
            source,
        })?;
        tracing::info!("Exploding {} to {} ...", self.name, dir.display());

        let mut report = ExplodeReport::default();
        for section in &self.sections {
            let filename = self.output_filename(section);
            let output = dir.join(&filename);

            if output.exists() {
                tracing::info!("  exists:    {}", filename);
                report.skipped.push(output);
                continue;
            }

            let (first, last) = section.page_span();
            backend
                .extract(&self.path, first, last, &output)
                .map_err(|source| BookError::Extract {
                    section: section.name.clone(),
                    source,
                })?;
            tracing::info!("  extracted: {}", filename);
            report.extracted.push(output);
        }

        Ok(report)
    }
}

impl fmt::Display for Book {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({} sections)", self.name, self.sections.len())
    }
}

/// Adjacent sections whose start pages are too far apart to infer an end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImplausibleGap {
    pub section: String,
    pub first_page: u32,
    pub next_section: String,
    pub next_first_page: u32,
}

/// Fill in unset last pages from the start of the following section.
///
/// Explicit last pages are never touched, so running this twice is the same
/// as running it once. `sections` must be sorted by first page.
pub fn infer_last_pages(
    sections: &mut [Section],
    total_pages: u32,
    options: &BookOptions,
) -> Result<(), ImplausibleGap> {
    for i in 1..sections.len() {
        let next_first_page = sections[i].first_page;
        let this = &sections[i - 1];
        if this.last_page.is_some() {
            continue;
        }

        let gap = next_first_page - this.first_page;
        let num_pages = if gap == 0 {
            1
        } else if gap > options.max_inferred_gap {
            return Err(ImplausibleGap {
                section: this.name.clone(),
                first_page: this.first_page,
                next_section: sections[i].name.clone(),
                next_first_page,
            });
        } else {
            gap
        };
        sections[i - 1].last_page = Some(sections[i - 1].first_page + num_pages - 1);
    }

    if let Some(last) = sections.last_mut() {
        if last.last_page.is_none()
            && options.trailing_section == TrailingSection::ExtendToEnd
            && last.first_page <= total_pages
        {
            let span = total_pages - last.first_page + 1;
            if span > options.max_inferred_gap {
                tracing::warn!(
                    "Extending last section {} p{} to the end of the document ({} pages)",
                    last.name,
                    last.first_page,
                    span
                );
            }
            last.last_page = Some(total_pages);
        }
    }

    Ok(())
}

/// Page to claiming sections, for pages that exist in the document.
/// Pages past the end are caught by validation instead.
fn build_coverage(sections: &[Section], total_pages: u32) -> BTreeMap<u32, Vec<usize>> {
    let mut coverage: BTreeMap<u32, Vec<usize>> = BTreeMap::new();
    for (idx, section) in sections.iter().enumerate() {
        let (first, last) = section.page_span();
        for page in first..=last.min(total_pages) {
            coverage.entry(page).or_default().push(idx);
        }
    }
    coverage
}

/// File name of the document without a trailing ".pdf"
fn display_name(path: &Path) -> String {
    let file_name = path
        .file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    match file_name.strip_suffix(".pdf") {
        Some(stem) => stem.to_string(),
        None => file_name,
    }
}

/// Collapse sorted page numbers into runs like "3-5, 9"
pub fn page_runs(pages: &[u32]) -> String {
    let mut runs: Vec<String> = Vec::new();
    let mut iter = pages.iter().copied().peekable();
    while let Some(start) = iter.next() {
        let mut end = start;
        while iter.peek() == Some(&(end + 1)) {
            end += 1;
            iter.next();
        }
        if start == end {
            runs.push(start.to_string());
        } else {
            runs.push(format!("{}-{}", start, end));
        }
    }
    runs.join(", ")
}
