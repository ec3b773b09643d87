pub mod explode;
pub mod missing;
pub mod sections;

use crate::book::{Book, BookOptions};
use crate::cli::{BackendKind, BookSpec};
use crate::pdf::{LopdfBackend, PdfBackend, PopplerBackend};
use anyhow::Result;

pub fn backend(kind: BackendKind) -> Box<dyn PdfBackend> {
    match kind {
        BackendKind::Lopdf => Box::new(LopdfBackend::new()),
        BackendKind::Poppler => Box::new(PopplerBackend::default()),
    }
}

/// Build every book, logging each one that fails validation.
///
/// Fails if any book failed, so nothing is reported or split from an index
/// that still needs fixing.
pub fn load_books(
    specs: &[BookSpec],
    backend: &dyn PdfBackend,
    options: &BookOptions,
) -> Result<Vec<Book>> {
    let mut books = Vec::with_capacity(specs.len());
    let mut failed = 0;

    for spec in specs {
        match Book::open(&spec.index, &spec.pdf, &spec.description, backend, options) {
            Ok(book) => books.push(book),
            Err(e) => {
                tracing::error!("{}", e);
                failed += 1;
            }
        }
    }

    if failed > 0 {
        anyhow::bail!("{} of {} book(s) failed validation", failed, specs.len());
    }

    Ok(books)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::fake::FakeBackend;
    use std::path::Path;

    fn spec(dir: &Path, name: &str, index: &str) -> BookSpec {
        let index_path = dir.join(format!("{}.csv", name));
        std::fs::write(&index_path, index).unwrap();
        BookSpec {
            index: index_path,
            pdf: dir.join(format!("{}.pdf", name)),
            description: name.to_string(),
        }
    }

    #[test]
    fn test_load_books() {
        let dir = tempfile::tempdir().unwrap();
        let specs = vec![
            spec(dir.path(), "first", "\"A\",1,3\n"),
            spec(dir.path(), "second", "\"B\",2\n"),
        ];
        let backend = FakeBackend::new(5);
        let books = load_books(&specs, &backend, &BookOptions::default()).unwrap();
        assert_eq!(books.len(), 2);
        assert_eq!(books[1].name, "second");
    }

    #[test]
    fn test_load_books_reports_every_failure() {
        let dir = tempfile::tempdir().unwrap();
        let specs = vec![
            spec(dir.path(), "good", "\"A\",1,3\n"),
            spec(dir.path(), "gap", "\"A\",1\n\"B\",20\n"),
            spec(dir.path(), "long", "\"A\",1,40\n"),
        ];
        let backend = FakeBackend::new(30);
        let err = load_books(&specs, &backend, &BookOptions::default()).unwrap_err();
        assert_eq!(err.to_string(), "2 of 3 book(s) failed validation");
        assert_eq!(backend.counted.borrow().len(), 3);
    }
}
