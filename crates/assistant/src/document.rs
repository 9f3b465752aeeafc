//! PDF text extraction.

use deskmate_core::error::DocumentError;
use tracing::{debug, warn};

/// Extract the text of every page, pages joined by `\n`.
///
/// Pages whose text cannot be extracted are skipped. The upload fails only
/// when no page could be read.
pub fn extract_pdf_text(bytes: &[u8]) -> Result<String, DocumentError> {
    let doc = lopdf::Document::load_mem(bytes).map_err(|e| DocumentError::Parse(e.to_string()))?;

    let pages = doc
        .get_pages()
        .into_keys()
        .map(|page| (page, doc.extract_text(&[page]).map_err(|e| e.to_string())));
    join_pages(pages)
}

fn join_pages(
    pages: impl IntoIterator<Item = (u32, Result<String, String>)>,
) -> Result<String, DocumentError> {
    let mut texts = Vec::new();
    let mut failed = 0usize;
    let mut last_error = None;

    for (page, result) in pages {
        match result {
            Ok(text) => texts.push(text.trim_end_matches('\n').to_string()),
            Err(e) => {
                warn!(page, error = %e, "Skipping unreadable PDF page");
                failed += 1;
                last_error = Some(format!("page {page}: {e}"));
            }
        }
    }

    if texts.is_empty() {
        if let Some(e) = last_error {
            return Err(DocumentError::Parse(e));
        }
    }

    let text = texts.join("\n");
    debug!(pages = texts.len(), failed, chars = text.chars().count(), "PDF text extracted");

    if text.trim().is_empty() {
        return Err(DocumentError::Empty);
    }
    Ok(text)
}

/// Same as [`extract_pdf_text`], on the blocking thread pool.
pub async fn extract_pdf_text_blocking(bytes: Vec<u8>) -> Result<String, DocumentError> {
    tokio::task::spawn_blocking(move || extract_pdf_text(&bytes))
        .await
        .map_err(|e| DocumentError::Parse(format!("extraction task failed: {e}")))?
}

/// The first `max_chars` characters of `text`, never splitting a character.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::content::{Content, Operation};
    use lopdf::{Document, Object, Stream, dictionary};

    /// Build a minimal PDF with one page per entry in `pages`.
    fn pdf_with_pages(pages: &[&str]) -> Vec<u8> {
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

        let mut kids = Vec::new();
        for text in pages {
            let content = Content {
                operations: vec![
                    Operation::new("BT", vec![]),
                    Operation::new("Tf", vec!["F1".into(), 24.into()]),
                    Operation::new("Td", vec![100.into(), 600.into()]),
                    Operation::new("Tj", vec![Object::string_literal(*text)]),
                    Operation::new("ET", vec![]),
                ],
            };
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

        let mut buf = Vec::new();
        doc.save_to(&mut buf).unwrap();
        buf
    }

    #[test]
    fn extracts_every_page_in_order() {
        let bytes = pdf_with_pages(&["Quarterly report", "Revenue grew"]);
        let text = extract_pdf_text(&bytes).unwrap();
        let first = text.find("Quarterly").unwrap();
        let second = text.find("Revenue").unwrap();
        assert!(first < second);
    }

    #[tokio::test]
    async fn extraction_runs_off_the_async_thread() {
        let bytes = pdf_with_pages(&["Hello"]);
        let text = extract_pdf_text_blocking(bytes).await.unwrap();
        assert!(text.contains("Hello"));
    }

    #[test]
    fn garbage_is_a_parse_error() {
        assert!(matches!(
            extract_pdf_text(b"definitely not a pdf"),
            Err(DocumentError::Parse(_))
        ));
    }

    #[test]
    fn unreadable_pages_are_skipped() {
        let text = join_pages([
            (1, Ok("Intro\n".to_string())),
            (2, Err("bad content stream".to_string())),
            (3, Ok("Conclusion".to_string())),
        ])
        .unwrap();
        assert_eq!(text, "Intro\nConclusion");
    }

    #[test]
    fn all_pages_unreadable_is_a_parse_error() {
        let result = join_pages([
            (1, Err("bad".to_string())),
            (2, Err("worse".to_string())),
        ]);
        match result {
            Err(DocumentError::Parse(msg)) => assert!(msg.contains("page 2")),
            other => panic!("expected parse error, got {other:?}"),
        }
        assert!(matches!(
            join_pages(Vec::<(u32, Result<String, String>)>::new()),
            Err(DocumentError::Empty)
        ));
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        assert_eq!(truncate_chars("hello", 3), "hel");
        assert_eq!(truncate_chars("hi", 10), "hi");
        assert_eq!(truncate_chars("안녕하세요", 2), "안녕");
        assert_eq!(truncate_chars("", 5), "");
    }
}
