//! `.docx` serialisation.
//!
//! Produces the smallest package Word and LibreOffice open without repair prompts. All parts are
//! generated from the [`Document`] alone, and every zip entry is stamped with the DOS epoch, so
//! identical documents serialise to identical bytes.

use std::borrow::Cow;
use std::io::{Cursor, Write};

use quick_xml::escape::escape;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::model::{Document, Font, Paragraph, ParagraphFormat, Run};
use crate::{DocxError, DOCUMENT_PART};

const XML_DECLARATION: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#;
const WORDML_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";

const CONTENT_TYPES: &str = concat!(
    r#"<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">"#,
    r#"<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>"#,
    r#"<Default Extension="xml" ContentType="application/xml"/>"#,
    r#"<Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/>"#,
    r#"<Override PartName="/word/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.styles+xml"/>"#,
    r#"</Types>"#
);

const PACKAGE_RELS: &str = concat!(
    r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
    r#"<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/>"#,
    r#"</Relationships>"#
);

const DOCUMENT_RELS: &str = concat!(
    r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
    r#"<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/>"#,
    r#"</Relationships>"#
);

// US Letter, one inch margins.
const SECTION_PROPERTIES: &str = concat!(
    r#"<w:sectPr>"#,
    r#"<w:pgSz w:w="12240" w:h="15840"/>"#,
    r#"<w:pgMar w:top="1440" w:right="1440" w:bottom="1440" w:left="1440" w:header="720" w:footer="720" w:gutter="0"/>"#,
    r#"</w:sectPr>"#
);

/// Serialises a document into `.docx` bytes.
///
/// # Errors
///
/// Returns `DocxError::Zip` or `DocxError::Io` if the in-memory archive cannot be written.
pub fn write_docx(document: &Document) -> Result<Vec<u8>, DocxError> {
    let parts: [(&str, String); 5] = [
        ("[Content_Types].xml", with_declaration(CONTENT_TYPES)),
        ("_rels/.rels", with_declaration(PACKAGE_RELS)),
        ("word/_rels/document.xml.rels", with_declaration(DOCUMENT_RELS)),
        ("word/styles.xml", styles_xml(document)),
        (DOCUMENT_PART, document_xml(document)),
    ];

    let options = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .last_modified_time(zip::DateTime::default());

    let mut archive = ZipWriter::new(Cursor::new(Vec::new()));
    for (name, content) in parts {
        archive.start_file(name, options)?;
        archive.write_all(content.as_bytes())?;
    }

    Ok(archive.finish()?.into_inner())
}

fn with_declaration(body: &str) -> String {
    format!("{}{}", XML_DECLARATION, body)
}

fn document_xml(document: &Document) -> String {
    let mut xml = String::new();
    xml.push_str(XML_DECLARATION);
    xml.push_str(&format!(r#"<w:document xmlns:w="{}"><w:body>"#, WORDML_NS));
    for paragraph in document.paragraphs() {
        push_paragraph(&mut xml, paragraph);
    }
    xml.push_str(SECTION_PROPERTIES);
    xml.push_str("</w:body></w:document>");
    xml
}

fn push_paragraph(xml: &mut String, paragraph: &Paragraph) {
    xml.push_str("<w:p><w:pPr>");
    push_spacing(xml, paragraph.format);
    xml.push_str("</w:pPr>");
    for run in &paragraph.runs {
        push_run(xml, run);
    }
    xml.push_str("</w:p>");
}

fn push_spacing(xml: &mut String, format: ParagraphFormat) {
    xml.push_str(&format!(
        r#"<w:spacing w:before="{}" w:after="{}" w:line="{}" w:lineRule="exact"/>"#,
        format.space_before_twips, format.space_after_twips, format.line_twips
    ));
}

// Element order inside w:rPr follows the schema sequence: rFonts, b, i, sz, szCs, u.
fn push_run(xml: &mut String, run: &Run) {
    let format = &run.format;
    xml.push_str("<w:r><w:rPr>");
    push_font(xml, &format.font);
    if format.bold {
        xml.push_str("<w:b/>");
    }
    if format.italic {
        xml.push_str("<w:i/>");
    }
    push_size(xml, &format.font);
    if format.underline {
        xml.push_str(r#"<w:u w:val="single"/>"#);
    }
    xml.push_str("</w:rPr>");
    xml.push_str(r#"<w:t xml:space="preserve">"#);
    xml.push_str(&escape(xml_text(&run.text).as_ref()));
    xml.push_str("</w:t></w:r>");
}

/// Maps text onto the XML 1.0 `Char` production.
///
/// Vertical tab and form feed, common in text pasted from other editors, become spaces. Any
/// other character XML cannot carry is dropped.
fn xml_text(text: &str) -> Cow<'_, str> {
    if text.chars().all(is_xml_char) {
        return Cow::Borrowed(text);
    }
    Cow::Owned(
        text.chars()
            .filter_map(|c| match c {
                '\u{0B}' | '\u{0C}' => Some(' '),
                c if is_xml_char(c) => Some(c),
                _ => None,
            })
            .collect(),
    )
}

fn is_xml_char(c: char) -> bool {
    matches!(c,
        '\t' | '\n' | '\r'
        | '\u{20}'..='\u{D7FF}'
        | '\u{E000}'..='\u{FFFD}'
        | '\u{10000}'..='\u{10FFFF}')
}

fn push_font(xml: &mut String, font: &Font) {
    let family = escape(xml_text(&font.family).as_ref()).into_owned();
    xml.push_str(&format!(
        r#"<w:rFonts w:ascii="{0}" w:hAnsi="{0}" w:cs="{0}"/>"#,
        family
    ));
}

fn push_size(xml: &mut String, font: &Font) {
    xml.push_str(&format!(
        r#"<w:sz w:val="{0}"/><w:szCs w:val="{0}"/>"#,
        font.size_half_points
    ));
}

fn styles_xml(document: &Document) -> String {
    let mut xml = String::new();
    xml.push_str(XML_DECLARATION);
    xml.push_str(&format!(r#"<w:styles xmlns:w="{}">"#, WORDML_NS));
    xml.push_str("<w:docDefaults><w:rPrDefault><w:rPr>");
    push_font(&mut xml, document.base_font());
    push_size(&mut xml, document.base_font());
    xml.push_str("</w:rPr></w:rPrDefault><w:pPrDefault><w:pPr>");
    push_spacing(&mut xml, document.base_spacing());
    xml.push_str("</w:pPr></w:pPrDefault></w:docDefaults>");
    xml.push_str(r#"<w:style w:type="paragraph" w:default="1" w:styleId="Normal"><w:name w:val="Normal"/></w:style>"#);
    xml.push_str("</w:styles>");
    xml
}
