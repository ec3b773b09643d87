use std::fmt;
use std::ops::RangeInclusive;

/// A named run of pages within a book.
///
/// Sections do not hold a pointer back to their book; anything that needs the
/// book (the output filename) borrows it from the caller, so a section can
/// never outlive the `Book` that owns it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub name: String,
    /// `name` with LaTeX meta-characters escaped, for typesetting listings
    pub escaped_name: String,
    pub first_page: u32,
    pub last_page: Option<u32>,
    /// 1-based line of the index file this section was read from
    pub line: usize,
}

impl Section {
    pub fn new(name: impl Into<String>, first_page: u32, last_page: Option<u32>) -> Self {
        let name = name.into();
        Section {
            escaped_name: escape_latex(&name),
            name,
            first_page,
            last_page,
            line: 0,
        }
    }

    pub fn at_line(mut self, line: usize) -> Self {
        self.line = line;
        self
    }

    /// First and last page, reading an unset last page as a single page
    pub fn page_span(&self) -> (u32, u32) {
        (self.first_page, self.last_page.unwrap_or(self.first_page))
    }

    pub fn pages(&self) -> RangeInclusive<u32> {
        let (first, last) = self.page_span();
        first..=last
    }

    pub fn is_single_page(&self) -> bool {
        let (first, last) = self.page_span();
        first == last
    }

    /// "p7" for a single page, "pp7-12" for a range
    pub fn pages_label(&self) -> String {
        let (first, last) = self.page_span();
        if self.is_single_page() {
            format!("p{}", first)
        } else {
            format!("pp{}-{}", first, last)
        }
    }

    pub fn output_filename(&self, book_name: &str) -> String {
        format!("{} ({} {}).pdf", self.name, book_name, self.pages_label()).replace(['/', '\\'], "_")
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let pages: Vec<String> = self.pages().map(|p| p.to_string()).collect();
        write!(f, "{} ({})", self.name, pages.join(","))
    }
}

fn escape_latex(name: &str) -> String {
    let mut escaped = String::with_capacity(name.len());
    for c in name.chars() {
        if matches!(c, '#' | '&' | '%') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
