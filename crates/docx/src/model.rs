//! In-memory paragraph model.
//!
//! A [`Document`] is an ordered list of [`Paragraph`]s, each made of styled [`Run`]s. Sizes use
//! the units WordprocessingML stores natively (half-points for fonts, twentieths of a point for
//! spacing) so the writer never has to round.

/// Font family and size applied to a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Font {
    /// Font family name, for example `Arial`
    pub family: String,
    /// Size in half-points (`18` is 9pt)
    pub size_half_points: u32,
}

impl Font {
    /// Creates a font from a size in points, rounded to the nearest half-point.
    pub fn from_points(family: impl Into<String>, points: f32) -> Self {
        Self {
            family: family.into(),
            size_half_points: (points * 2.0).round().max(1.0) as u32,
        }
    }
}

/// Character formatting for a single run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunFormat {
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub font: Font,
}

impl RunFormat {
    /// Unemphasised text in the given font.
    pub fn plain(font: Font) -> Self {
        Self {
            bold: false,
            italic: false,
            underline: false,
            font,
        }
    }

    pub fn bold(mut self) -> Self {
        self.bold = true;
        self
    }

    pub fn italic(mut self) -> Self {
        self.italic = true;
        self
    }

    pub fn underline(mut self) -> Self {
        self.underline = true;
        self
    }
}

/// Paragraph spacing. Line height is always written with an exact line rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParagraphFormat {
    pub space_before_twips: u32,
    pub space_after_twips: u32,
    pub line_twips: u32,
}

impl ParagraphFormat {
    /// Zero space before and after, fixed line height in points.
    pub fn single(line_points: f32) -> Self {
        Self {
            space_before_twips: 0,
            space_after_twips: 0,
            line_twips: (line_points * 20.0).round().max(1.0) as u32,
        }
    }
}

/// A contiguous piece of text sharing one format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Run {
    pub text: String,
    pub format: RunFormat,
}

impl Run {
    pub fn new(text: impl Into<String>, format: RunFormat) -> Self {
        Self {
            text: text.into(),
            format,
        }
    }
}

/// A paragraph of one or more runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paragraph {
    pub runs: Vec<Run>,
    pub format: ParagraphFormat,
}

impl Paragraph {
    pub fn new(runs: Vec<Run>, format: ParagraphFormat) -> Self {
        Self { runs, format }
    }

    /// Concatenated text of all runs.
    pub fn text(&self) -> String {
        self.runs.iter().map(|run| run.text.as_str()).collect()
    }
}

/// An ordered sequence of paragraphs with a single base font and spacing.
///
/// The base font and spacing are written as document defaults; individual runs still carry
/// their own font so the output does not depend on how a reader resolves styles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    base_font: Font,
    base_spacing: ParagraphFormat,
    paragraphs: Vec<Paragraph>,
}

impl Document {
    pub fn new(base_font: Font, base_spacing: ParagraphFormat) -> Self {
        Self {
            base_font,
            base_spacing,
            paragraphs: Vec::new(),
        }
    }

    pub fn push(&mut self, paragraph: Paragraph) {
        self.paragraphs.push(paragraph);
    }

    pub fn base_font(&self) -> &Font {
        &self.base_font
    }

    pub fn base_spacing(&self) -> ParagraphFormat {
        self.base_spacing
    }

    pub fn paragraphs(&self) -> &[Paragraph] {
        &self.paragraphs
    }

    pub fn len(&self) -> usize {
        self.paragraphs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paragraphs.is_empty()
    }

    /// Plain text of every paragraph, in order.
    pub fn texts(&self) -> Vec<String> {
        self.paragraphs.iter().map(Paragraph::text).collect()
    }
}
