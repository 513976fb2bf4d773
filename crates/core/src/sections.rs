//! Note sections and their styling.
//!
//! Every block of an assembled note is a [`Section`] carrying a [`SectionTag`]. How a tag looks
//! on the page (heading text, emphasis, whether the heading shares a paragraph with the body)
//! lives in one table, [`SectionTag::style`], which the assembler consults for every section.

use clinnote_types::NonEmptyText;

use crate::fragments::Fragment;

/// Kinds of section a note can contain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SectionTag {
    Intro,
    OvernightEvents,
    /// Review of systems
    Subjective,
    /// Physical exam
    Objective,
    Assessment,
    CriticalCareJustification,
    Plan,
    DiagnosisEntry,
    FreeText,
}

/// Run emphasis.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Emphasis {
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
}

impl Emphasis {
    pub const PLAIN: Emphasis = Emphasis {
        bold: false,
        italic: false,
        underline: false,
    };
    pub const BOLD: Emphasis = Emphasis {
        bold: true,
        italic: false,
        underline: false,
    };
    pub const ITALIC: Emphasis = Emphasis {
        bold: false,
        italic: true,
        underline: false,
    };
    pub const BOLD_UNDERLINE: Emphasis = Emphasis {
        bold: true,
        italic: false,
        underline: true,
    };
}

/// Where a heading run is placed relative to the body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeadingPlacement {
    /// Heading is a paragraph of its own, followed by the body paragraphs.
    OwnParagraph,
    /// Heading is the first run of the first body paragraph.
    Inline,
}

/// Declared look of one section tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectionStyle {
    /// Heading used when the section does not supply its own
    pub heading: Option<&'static str>,
    pub heading_emphasis: Emphasis,
    pub body_emphasis: Emphasis,
    pub placement: HeadingPlacement,
}

impl SectionTag {
    /// The style table.
    pub fn style(&self) -> SectionStyle {
        let boxed = |heading: &'static str| SectionStyle {
            heading: Some(heading),
            heading_emphasis: Emphasis::BOLD_UNDERLINE,
            body_emphasis: Emphasis::PLAIN,
            placement: HeadingPlacement::OwnParagraph,
        };

        match self {
            SectionTag::Intro => SectionStyle {
                heading: None,
                heading_emphasis: Emphasis::PLAIN,
                body_emphasis: Emphasis::ITALIC,
                placement: HeadingPlacement::OwnParagraph,
            },
            SectionTag::OvernightEvents => boxed("OVERNIGHT EVENTS:"),
            SectionTag::Subjective => boxed("SUBJECTIVE:"),
            SectionTag::Objective => boxed("OBJECTIVE:"),
            SectionTag::Assessment => boxed("ASSESSMENT:"),
            SectionTag::CriticalCareJustification => boxed("WHY CRITICAL CARE:"),
            SectionTag::Plan => boxed("PLAN:"),
            SectionTag::DiagnosisEntry => SectionStyle {
                heading: None,
                heading_emphasis: Emphasis::PLAIN,
                body_emphasis: Emphasis::PLAIN,
                placement: HeadingPlacement::OwnParagraph,
            },
            SectionTag::FreeText => SectionStyle {
                heading: None,
                heading_emphasis: Emphasis::BOLD,
                body_emphasis: Emphasis::PLAIN,
                placement: HeadingPlacement::Inline,
            },
        }
    }
}

/// Body of a section: text typed into the form, or a template resolved for this request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SectionBody {
    Literal(String),
    /// `None` when the template could not be resolved
    Fragment(Option<Fragment>),
}

impl SectionBody {
    /// Paragraph texts with leading and trailing blank lines removed.
    ///
    /// Literal text is split on line breaks. Blank lines between non-blank ones are kept, since
    /// they are part of how the author laid the text out.
    pub fn lines(&self) -> Vec<&str> {
        let lines: Vec<&str> = match self {
            SectionBody::Literal(text) => text.lines().collect(),
            SectionBody::Fragment(Some(fragment)) => {
                fragment.paragraphs.iter().map(String::as_str).collect()
            }
            SectionBody::Fragment(None) => Vec::new(),
        };
        trim_blank(lines)
    }
}

/// Drops blank lines before the first and after the last line with text.
pub(crate) fn trim_blank(lines: Vec<&str>) -> Vec<&str> {
    let start = lines.iter().position(|l| !l.trim().is_empty());
    let end = lines.iter().rposition(|l| !l.trim().is_empty());
    match (start, end) {
        (Some(start), Some(end)) => lines[start..=end].to_vec(),
        _ => Vec::new(),
    }
}

/// One diagnosis under the plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagnosisEntry {
    pub label: NonEmptyText,
    /// `None` when the diagnosis template could not be resolved; the entry is then skipped
    pub fragment: Option<Fragment>,
}

/// A tagged block of the output document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub tag: SectionTag,
    /// Overrides the tag's default heading
    pub heading: Option<String>,
    pub body: SectionBody,
    /// Diagnosis entries; only rendered for [`SectionTag::Plan`]
    pub entries: Vec<DiagnosisEntry>,
}

impl Section {
    pub fn literal(tag: SectionTag, text: impl Into<String>) -> Self {
        Self {
            tag,
            heading: None,
            body: SectionBody::Literal(text.into()),
            entries: Vec::new(),
        }
    }

    pub fn fragment(tag: SectionTag, fragment: Option<Fragment>) -> Self {
        Self {
            tag,
            heading: None,
            body: SectionBody::Fragment(fragment),
            entries: Vec::new(),
        }
    }

    pub fn with_heading(mut self, heading: impl Into<String>) -> Self {
        self.heading = Some(heading.into());
        self
    }

    pub fn with_entries(mut self, entries: Vec<DiagnosisEntry>) -> Self {
        self.entries = entries;
        self
    }

    /// Heading text to render, if any.
    pub fn heading_text(&self) -> Option<&str> {
        self.heading
            .as_deref()
            .map(str::trim)
            .filter(|h| !h.is_empty())
            .or(self.tag.style().heading)
    }

    /// Diagnosis entries whose template resolved to visible text, in caller order.
    pub fn resolved_entries(&self) -> impl Iterator<Item = (&NonEmptyText, &Fragment)> {
        self.entries.iter().filter_map(|entry| {
            entry
                .fragment
                .as_ref()
                .filter(|f| f.has_content())
                .map(|f| (&entry.label, f))
        })
    }
}
