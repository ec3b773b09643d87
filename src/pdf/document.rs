use crate::error::ToolError;
use crate::pdf::PdfBackend;
use lopdf::{Document, ObjectId};
use std::cell::RefCell;
use std::path::{Path, PathBuf};

pub struct PdfDocument {
    pub doc: Document,
    pub path: PathBuf,
}

impl PdfDocument {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, ToolError> {
        let path = path.as_ref().to_path_buf();
        let doc = Document::load(&path).map_err(|source| ToolError::Open {
            path: path.clone(),
            source,
        })?;
        Ok(PdfDocument { doc, path })
    }

    pub fn page_count(&self) -> u32 {
        self.doc.get_pages().len() as u32
    }

    /// Get 1-indexed page object IDs
    pub fn page_ids(&self) -> Vec<(u32, ObjectId)> {
        let mut pages: Vec<_> = self.doc.get_pages().into_iter().collect();
        pages.sort_by_key(|(num, _)| *num);
        pages
    }

    /// Copy of the document holding only pages `first..=last`
    pub fn extract_range(&self, first: u32, last: u32) -> Result<Document, ToolError> {
        let total = self.page_count();
        for page in [first, last] {
            if page == 0 || page > total {
                return Err(ToolError::PageOutOfRange { page, total });
            }
        }

        let range = first..=last;
        let pages_to_delete: Vec<u32> = self
            .page_ids()
            .iter()
            .map(|(num, _)| *num)
            .filter(|num| !range.contains(num))
            .collect();

        let mut new_doc = self.doc.clone();
        if !pages_to_delete.is_empty() {
            new_doc.delete_pages(&pages_to_delete);
        }

        Ok(new_doc)
    }

    /// Save to a file
    pub fn save<P: AsRef<Path>>(doc: &mut Document, path: P) -> Result<(), ToolError> {
        doc.save(&path).map_err(|e| ToolError::Save {
            path: path.as_ref().to_path_buf(),
            reason: e.to_string(),
        })?;
        Ok(())
    }
}

/// In-process backend on top of `lopdf`.
///
/// The last opened document is kept so exploding a book parses its source
/// once instead of once per section.
#[derive(Default)]
pub struct LopdfBackend {
    cached: RefCell<Option<PdfDocument>>,
}

impl LopdfBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_document<T>(
        &self,
        path: &Path,
        f: impl FnOnce(&PdfDocument) -> Result<T, ToolError>,
    ) -> Result<T, ToolError> {
        let mut cached = self.cached.borrow_mut();
        if let Some(doc) = cached.as_ref().filter(|doc| doc.path == path) {
            return f(doc);
        }
        tracing::debug!("Loading {}", path.display());
        let doc = cached.insert(PdfDocument::open(path)?);
        f(doc)
    }
}

impl PdfBackend for LopdfBackend {
    fn page_count(&self, document: &Path) -> Result<u32, ToolError> {
        self.with_document(document, |doc| Ok(doc.page_count()))
    }

    fn extract(
        &self,
        document: &Path,
        first: u32,
        last: u32,
        output: &Path,
    ) -> Result<(), ToolError> {
        let mut new_doc = self.with_document(document, |doc| doc.extract_range(first, last))?;
        PdfDocument::save(&mut new_doc, output)
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use lopdf::{dictionary, Object, Stream};

    /// Write a blank PDF with `pages` pages
    pub fn write_blank_pdf(path: &Path, pages: u32) {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let mut kids = Vec::new();
        for _ in 0..pages {
            let content_id = doc.add_object(Stream::new(dictionary! {}, Vec::new()));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
            });
            kids.push(Object::Reference(page_id));
        }
        let pages_dict = dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => Object::Integer(i64::from(pages)),
            "MediaBox" => vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Integer(595),
                Object::Integer(842),
            ],
        };
        doc.objects.insert(pages_id, Object::Dictionary(pages_dict));
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);
        doc.save(path).unwrap();
    }

    #[test]
    fn test_page_count() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("book.pdf");
        write_blank_pdf(&source, 5);

        let backend = LopdfBackend::new();
        assert_eq!(backend.page_count(&source).unwrap(), 5);
    }

    #[test]
    fn test_extract_range() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("book.pdf");
        let output = dir.path().join("part.pdf");
        write_blank_pdf(&source, 5);

        let backend = LopdfBackend::new();
        backend.extract(&source, 2, 3, &output).unwrap();

        let part = PdfDocument::open(&output).unwrap();
        assert_eq!(part.page_count(), 2);
    }

    #[test]
    fn test_extract_out_of_range() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("book.pdf");
        write_blank_pdf(&source, 2);

        let doc = PdfDocument::open(&source).unwrap();
        assert!(matches!(
            doc.extract_range(1, 4),
            Err(ToolError::PageOutOfRange { page: 4, total: 2 })
        ));
        assert!(doc.extract_range(0, 1).is_err());
    }

    #[test]
    fn test_open_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let backend = LopdfBackend::new();
        let err = backend.page_count(&dir.path().join("absent.pdf")).unwrap_err();
        assert!(matches!(err, ToolError::Open { .. }));
    }
}
