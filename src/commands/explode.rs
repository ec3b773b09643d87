use crate::book::Book;
use crate::pdf::PdfBackend;
use anyhow::Result;
use std::path::Path;

pub fn run<P: AsRef<Path>>(books: &[Book], output_dir: P, backend: &dyn PdfBackend) -> Result<()> {
    let output_dir = output_dir.as_ref();
    let mut extracted = 0;
    let mut skipped = 0;

    for book in books {
        let report = book.explode(output_dir, backend)?;
        extracted += report.extracted.len();
        skipped += report.skipped.len();
    }

    println!(
        "Extracted {} section(s) into {} ({} already present)",
        extracted,
        output_dir.display(),
        skipped
    );

    Ok(())
}
