use crate::book::{page_runs, Book};
use anyhow::Result;

pub fn run(books: &[Book]) -> Result<()> {
    for book in books {
        let missing = book.missing_pages();
        if missing.is_empty() {
            println!("{}: all {} pages covered", book.name, book.total_pages);
        } else {
            println!(
                "{}: {} of {} pages missing: {}",
                book.name,
                missing.len(),
                book.total_pages,
                page_runs(&missing)
            );
        }
    }

    Ok(())
}
