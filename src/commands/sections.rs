use crate::book::{Book, Section};
use anyhow::Result;

pub fn run(books: &[Book]) -> Result<()> {
    for book in books {
        println!(
            "{} [{}] from {}",
            book,
            book.description,
            book.index_path.display()
        );
        for section in book.sections() {
            println!(
                "  {:<10} {}  ->  {}  (line {})",
                section.pages_label(),
                section.name,
                book.output_filename(section),
                section.line
            );

            let shared = overlapping(book, section);
            if !shared.is_empty() {
                println!("             shares pages with: {}", shared.join(", "));
            }
        }
    }

    Ok(())
}

/// Names of other sections claiming any of `section`'s pages
fn overlapping<'a>(book: &'a Book, section: &Section) -> Vec<&'a str> {
    let mut names: Vec<&str> = Vec::new();
    for page in section.pages() {
        for other in book.sections_on_page(page) {
            if !std::ptr::eq(other, section) && !names.contains(&other.name.as_str()) {
                names.push(&other.name);
            }
        }
    }
    names
}
