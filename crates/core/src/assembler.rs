//! Document assembly.
//!
//! [`DocumentAssembler`] turns an ordered list of [`Section`]s into a [`Document`] and serialises
//! it. It holds no mutable state, so one assembler can serve any number of requests and the
//! same sections always yield the same bytes.

use clinnote_docx::{write_docx, Document, Font, Paragraph, ParagraphFormat, Run, RunFormat};

use crate::config::CoreConfig;
use crate::sections::{trim_blank, Emphasis, HeadingPlacement, Section, SectionTag};
use crate::{NoteError, NoteResult};

/// What to do with a plan that has neither text nor selected diagnoses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EmptyPlanPolicy {
    /// Leave the section out, heading included.
    #[default]
    Omit,
    /// Render the `PLAN:` heading on its own.
    KeepHeading,
}

/// Lays out sections with a single font and fixed single-line spacing.
#[derive(Debug, Clone)]
pub struct DocumentAssembler {
    font: Font,
    spacing: ParagraphFormat,
    empty_plan: EmptyPlanPolicy,
}

impl DocumentAssembler {
    pub fn new(config: &CoreConfig) -> Self {
        let typography = config.typography();
        Self {
            font: Font::from_points(typography.font_family(), typography.font_size_pt()),
            spacing: ParagraphFormat::single(typography.line_height_pt()),
            empty_plan: config.empty_plan_policy(),
        }
    }

    /// Lays out `sections` in order without serialising.
    pub fn build(&self, sections: &[Section]) -> Document {
        let mut document = Document::new(self.font.clone(), self.spacing);
        for section in sections {
            let emitted = self.render_section(&mut document, section);
            if emitted == 0 {
                tracing::debug!(tag = ?section.tag, "section has no content, omitted");
            }
        }
        document
    }

    /// Lays out and serialises `sections` into a `.docx` buffer.
    ///
    /// # Errors
    ///
    /// Returns `NoteError::Render` if the document package cannot be written.
    pub fn assemble(&self, sections: &[Section]) -> NoteResult<Vec<u8>> {
        let document = self.build(sections);
        let bytes = write_docx(&document).map_err(NoteError::Render)?;
        tracing::info!(
            sections = sections.len(),
            paragraphs = document.len(),
            bytes = bytes.len(),
            "note assembled"
        );
        Ok(bytes)
    }

    /// Appends one section and returns how many paragraphs it produced.
    fn render_section(&self, document: &mut Document, section: &Section) -> usize {
        let style = section.tag.style();
        let lines = section.body.lines();
        let is_plan = section.tag == SectionTag::Plan;

        let has_content = !lines.is_empty() || (is_plan && !section.entries.is_empty());
        let keep_heading = is_plan && self.empty_plan == EmptyPlanPolicy::KeepHeading;
        if !has_content && !keep_heading {
            return 0;
        }

        let before = document.len();
        let heading = section.heading_text();

        match style.placement {
            HeadingPlacement::OwnParagraph => {
                if let Some(heading) = heading {
                    document.push(self.paragraph(vec![self.run(heading, style.heading_emphasis)]));
                }
                for line in &lines {
                    document.push(self.paragraph(vec![self.run(line, style.body_emphasis)]));
                }
            }
            HeadingPlacement::Inline => {
                let mut rest = lines.iter();
                let mut first = Vec::new();
                if let Some(heading) = heading {
                    first.push(self.run(&format!("{} ", heading), style.heading_emphasis));
                }
                if let Some(line) = rest.next() {
                    first.push(self.run(line, style.body_emphasis));
                }
                document.push(self.paragraph(first));
                for line in rest {
                    document.push(self.paragraph(vec![self.run(line, style.body_emphasis)]));
                }
            }
        }

        if is_plan {
            self.render_entries(document, section);
        }

        document.len() - before
    }

    /// Numbered diagnosis entries; unresolved ones are skipped and numbering stays contiguous.
    fn render_entries(&self, document: &mut Document, section: &Section) {
        let style = SectionTag::DiagnosisEntry.style();

        for (index, (label, fragment)) in section.resolved_entries().enumerate() {
            let header = format!("{}). {}", index + 1, label);
            document.push(self.paragraph(vec![self.run(&header, style.heading_emphasis)]));

            let lines = trim_blank(fragment.paragraphs.iter().map(String::as_str).collect());
            for line in lines {
                document.push(self.paragraph(vec![self.run(line, style.body_emphasis)]));
            }
        }

        let skipped = section.entries.len() - section.resolved_entries().count();
        if skipped > 0 {
            tracing::debug!(skipped, "diagnosis entries without a template were omitted");
        }
    }

    fn run(&self, text: &str, emphasis: Emphasis) -> Run {
        let mut format = RunFormat::plain(self.font.clone());
        if emphasis.bold {
            format = format.bold();
        }
        if emphasis.italic {
            format = format.italic();
        }
        if emphasis.underline {
            format = format.underline();
        }
        Run::new(text, format)
    }

    fn paragraph(&self, runs: Vec<Run>) -> Paragraph {
        Paragraph::new(runs, self.spacing)
    }
}
