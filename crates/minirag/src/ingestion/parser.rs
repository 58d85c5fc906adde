//! Content extraction for the supported file kinds

use std::path::Path;

use crate::error::{Error, Result};
use crate::types::FileType;

/// Turns a file on disk into raw text
pub struct FileParser;

impl FileParser {
    /// Extract the text of `path`, dispatching on its file type
    pub fn extract(path: &Path) -> Result<String> {
        match FileType::from_path(path) {
            FileType::PlainText => Self::extract_text(path),
            FileType::Pdf => Self::extract_pdf(path),
            FileType::Unsupported => Err(Error::UnsupportedFileType(
                path.extension()
                    .and_then(|e| e.to_str())
                    .unwrap_or("<none>")
                    .to_string(),
            )),
        }
    }

    /// Plain text is taken verbatim; invalid UTF-8 is replaced, not rejected
    fn extract_text(path: &Path) -> Result<String> {
        let data = std::fs::read(path)?;
        Ok(String::from_utf8_lossy(&data).into_owned())
    }

    /// Concatenate page text in page order, skipping pages without extractable text
    fn extract_pdf(path: &Path) -> Result<String> {
        let shown = path.display().to_string();
        let doc = lopdf::Document::load(path)
            .map_err(|e| Error::file_parse(&shown, format!("Failed to load PDF: {}", e)))?;

        let mut text = String::new();
        // get_pages is keyed by 1-based page number, in order
        for page_number in doc.get_pages().keys() {
            match doc.extract_text(&[*page_number]) {
                Ok(page_text) => text.push_str(&page_text),
                Err(e) => {
                    tracing::debug!("No text on page {} of {}: {}", page_number, shown, e);
                }
            }
        }

        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::content::{Content, Operation};
    use lopdf::{dictionary, Document, Object, Stream};

    fn write_pdf(path: &Path, pages: &[&str]) {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Courier",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        });

        let mut kids: Vec<Object> = Vec::new();
        for line in pages {
            let content = Content {
                operations: vec![
                    Operation::new("BT", vec![]),
                    Operation::new("Tf", vec!["F1".into(), 24.into()]),
                    Operation::new("Td", vec![100.into(), 600.into()]),
                    Operation::new("Tj", vec![Object::string_literal(*line)]),
                    Operation::new("ET", vec![]),
                ],
            };
            let content_id =
                doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
            });
            kids.push(page_id.into());
        }

        let count = kids.len() as i64;
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
                "Resources" => resources_id,
                "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);
        doc.save(path).unwrap();
    }

    #[test]
    fn test_plain_text_verbatim() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.md");
        std::fs::write(&path, "# Title\n\nbody").unwrap();
        assert_eq!(FileParser::extract(&path).unwrap(), "# Title\n\nbody");
    }

    #[test]
    fn test_missing_text_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = FileParser::extract(&dir.path().join("gone.txt"));
        assert!(matches!(result, Err(Error::Io(_))));
    }

    #[test]
    fn test_pdf_pages_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.pdf");
        write_pdf(&path, &["Alpha page", "Beta page"]);

        let text = FileParser::extract(&path).unwrap();
        let alpha = text.find("Alpha page").unwrap();
        let beta = text.find("Beta page").unwrap();
        assert!(alpha < beta);
    }

    #[test]
    fn test_corrupt_pdf_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.pdf");
        std::fs::write(&path, b"definitely not a pdf").unwrap();
        assert!(matches!(
            FileParser::extract(&path),
            Err(Error::FileParse { .. })
        ));
    }

    #[test]
    fn test_unsupported_extension() {
        let result = FileParser::extract(Path::new("photo.jpeg"));
        assert!(matches!(result, Err(Error::UnsupportedFileType(ext)) if ext == "jpeg"));
    }
}
