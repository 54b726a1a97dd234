//! Page-by-page PDF text extraction

use lopdf::Document;
use tracing::{debug, instrument, warn};

use super::error::ExtractionError;
use super::normalize::normalize_text;

/// Extract text from an in-memory PDF
///
/// Each page is extracted on its own. A page that fails to parse contributes
/// an empty string and the rest of the document is still used.
///
/// # Arguments
///
/// * `bytes` - The PDF file contents
/// * `max_len` - Maximum number of characters to return
#[instrument(skip(bytes), fields(bytes = bytes.len()))]
pub fn extract_pdf(bytes: &[u8], max_len: usize) -> Result<String, ExtractionError> {
    let document = Document::load_mem(bytes).map_err(|e| ExtractionError::Pdf(e.to_string()))?;

    let pages = document.get_pages();
    debug!("PDF has {} pages", pages.len());

    let page_texts = pages
        .keys()
        .map(|&page_number| {
            document
                .extract_text(&[page_number])
                .map_err(|e| format!("page {}: {}", page_number, e))
        })
        .collect::<Vec<_>>();

    assemble_pages(page_texts, max_len)
}

/// Join per-page extraction results into the document text
///
/// Zero pages is `EmptyDocument`; pages that are all empty (or all failed)
/// is `NoExtractableText`.
pub fn assemble_pages(
    pages: Vec<Result<String, String>>,
    max_len: usize,
) -> Result<String, ExtractionError> {
    if pages.is_empty() {
        return Err(ExtractionError::EmptyDocument);
    }

    let texts = pages
        .into_iter()
        .map(|page| {
            page.unwrap_or_else(|e| {
                warn!("Skipping unreadable PDF {}", e);
                String::new()
            })
        })
        .collect::<Vec<_>>();

    let joined = texts.join("\n");
    if joined.trim().is_empty() {
        return Err(ExtractionError::NoExtractableText);
    }

    Ok(normalize_text(&joined, max_len))
}

/// Build a PDF with one line of Courier text per page; empty strings give blank pages
#[cfg(test)]
pub(crate) fn sample_pdf(pages: &[&str]) -> Vec<u8> {
    use lopdf::content::{Content, Operation};
    use lopdf::{Object, Stream, dictionary};

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

    let mut kids = Vec::<Object>::new();
    for text in pages {
        let operations = if text.is_empty() {
            Vec::new()
        } else {
            vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 24.into()]),
                Operation::new("Td", vec![100.into(), 700.into()]),
                Operation::new("Tj", vec![Object::string_literal(*text)]),
                Operation::new("ET", vec![]),
            ]
        };
        let content = Content { operations };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
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

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).unwrap();
    bytes
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::{Object, dictionary};

    #[test]
    fn test_failed_page_does_not_abort_document() {
        let pages = vec![
            Ok("Introduction to the report.".to_string()),
            Err("page 2: invalid content stream".to_string()),
            Ok("Conclusions follow.".to_string()),
        ];
        let text = assemble_pages(pages, 20_000).unwrap();
        assert_eq!(text, "Introduction to the report. Conclusions follow.");
    }

    #[test]
    fn test_blank_pages_are_no_extractable_text() {
        let pages = vec![Ok("  ".to_string()), Ok(String::new()), Err("page 3: bad".to_string())];
        assert_eq!(
            assemble_pages(pages, 20_000),
            Err(ExtractionError::NoExtractableText)
        );
    }

    #[test]
    fn test_zero_pages_is_empty_document() {
        assert_eq!(assemble_pages(vec![], 20_000), Err(ExtractionError::EmptyDocument));
    }

    #[test]
    fn test_pageless_pdf_is_empty_document() {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.add_object(dictionary! {
            "Type" => "Pages",
            "Kids" => Vec::<Object>::new(),
            "Count" => 0,
        });
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).unwrap();

        assert_eq!(extract_pdf(&bytes, 20_000), Err(ExtractionError::EmptyDocument));
    }

    #[test]
    fn test_text_pages_are_joined_in_order() {
        let bytes = sample_pdf(&["Hello first page", "Second page text"]);
        let text = extract_pdf(&bytes, 20_000).unwrap();
        assert_eq!(text, "Hello first page Second page text");
    }

    #[test]
    fn test_blank_pdf_pages_are_no_extractable_text() {
        let bytes = sample_pdf(&["", ""]);
        assert_eq!(extract_pdf(&bytes, 20_000), Err(ExtractionError::NoExtractableText));
    }

    #[test]
    fn test_pdf_text_respects_max_len() {
        let bytes = sample_pdf(&["Hello first page"]);
        assert_eq!(extract_pdf(&bytes, 5).unwrap(), "Hello");
    }

    #[test]
    fn test_garbage_bytes_are_a_parse_error() {
        let err = extract_pdf(b"definitely not a pdf", 20_000).unwrap_err();
        assert!(matches!(err, ExtractionError::Pdf(_)));
    }
}
