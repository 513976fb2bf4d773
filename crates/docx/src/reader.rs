//! In-memory `.docx` paragraph extraction.
//!
//! Template documents are decoded straight from bytes: there is no temporary file, so nothing
//! needs cleaning up whether decoding succeeds or fails.

use std::io::{Cursor, Read};

use quick_xml::events::Event;
use quick_xml::Reader;

use crate::{DocxError, DOCUMENT_PART};

/// Extracts the plain text of every paragraph in a `.docx` package, in document order.
///
/// Empty paragraphs are kept as empty strings so template spacing survives. Within a paragraph,
/// `w:tab` becomes a tab character and `w:br` becomes a space. Paragraphs nested inside another
/// (text boxes) are folded into the enclosing one.
///
/// # Errors
///
/// - `DocxError::NotDocx` if the bytes are not a zip container
/// - `DocxError::MissingPart` if `word/document.xml` is absent
/// - `DocxError::Zip` or `DocxError::Xml` for corrupt content
pub fn read_paragraphs(bytes: &[u8]) -> Result<Vec<String>, DocxError> {
    if !infer::archive::is_zip(bytes) {
        let detected = infer::get(bytes)
            .map(|kind| kind.mime_type().to_string())
            .unwrap_or_else(|| "unknown content".to_string());
        return Err(DocxError::NotDocx(detected));
    }

    let mut archive = zip::ZipArchive::new(Cursor::new(bytes))?;
    let mut file = match archive.by_name(DOCUMENT_PART) {
        Ok(file) => file,
        Err(zip::result::ZipError::FileNotFound) => {
            return Err(DocxError::MissingPart(DOCUMENT_PART))
        }
        Err(e) => return Err(e.into()),
    };

    let mut xml = String::new();
    file.read_to_string(&mut xml)?;

    parse_document_xml(&xml)
}

fn parse_document_xml(xml: &str) -> Result<Vec<String>, DocxError> {
    let mut reader = Reader::from_str(xml);
    let mut buf = Vec::new();

    let mut paragraphs = Vec::new();
    // Paragraphs can nest through text boxes; inner text is folded into the enclosing paragraph.
    let mut open: Vec<OpenParagraph> = Vec::new();
    let mut in_text = false;

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => match e.name().as_ref() {
                b"w:p" => open.push(OpenParagraph::default()),
                b"w:t" => in_text = true,
                _ => {}
            },
            Event::Empty(e) => match e.name().as_ref() {
                b"w:p" if open.is_empty() => paragraphs.push(String::new()),
                b"w:tab" => {
                    if let Some(paragraph) = open.last_mut() {
                        paragraph.push_str("\t");
                    }
                }
                b"w:br" | b"w:cr" => {
                    if let Some(paragraph) = open.last_mut() {
                        paragraph.push_str(" ");
                    }
                }
                _ => {}
            },
            Event::Text(e) => {
                if in_text {
                    if let Some(paragraph) = open.last_mut() {
                        let unescaped = e.unescape().map_err(quick_xml::Error::from)?;
                        paragraph.push_str(&unescaped);
                    }
                }
            }
            Event::End(e) => match e.name().as_ref() {
                b"w:t" => in_text = false,
                b"w:p" => {
                    if let Some(closed) = open.pop() {
                        match open.last_mut() {
                            Some(parent) => parent.fold_in(closed.text),
                            None => paragraphs.push(closed.text),
                        }
                    }
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(paragraphs)
}

#[derive(Default)]
struct OpenParagraph {
    text: String,
    separate_next: bool,
}

impl OpenParagraph {
    fn push_str(&mut self, piece: &str) {
        if self.separate_next {
            self.separate();
            self.separate_next = false;
        }
        self.text.push_str(piece);
    }

    fn fold_in(&mut self, nested: String) {
        if nested.trim().is_empty() {
            return;
        }
        self.separate();
        self.text.push_str(nested.trim());
        self.separate_next = true;
    }

    fn separate(&mut self) {
        if !self.text.is_empty() && !self.text.ends_with(char::is_whitespace) {
            self.text.push(' ');
        }
    }
}
