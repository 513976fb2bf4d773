//! Note composition from form input.
//!
//! A [`NoteRequest`] is what the note form collects. [`NoteService`] validates it, resolves the
//! templates it names through a [`FragmentSource`], and lays the result out as sections in a
//! fixed priority order:
//!
//! 1. intro attestation
//! 2. overnight events
//! 3. subjective (review of systems template)
//! 4. objective (physical exam template)
//! 5. assessment
//! 6. critical care justification, then critical care time
//! 7. plan, with numbered diagnosis entries
//!
//! Missing templates never fail a request; their sections or entries are simply left out.

use std::fs;
use std::path::Path;
use std::str::FromStr;

use clinnote_types::NonEmptyText;
use serde::{Deserialize, Serialize};

use crate::assembler::DocumentAssembler;
use crate::config::CoreConfig;
use crate::constants::UPDATED_NOTE_FILENAME;
use crate::fragments::{FragmentSource, TemplateCategory, TemplateListing};
use crate::phrase::{update_note, PhraseReplacement};
use crate::sections::{DiagnosisEntry, Section, SectionTag};
use crate::validation::note_file_name;
use crate::{NoteError, NoteResult};

/// Stock justifications for critical care billing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CriticalCareReason {
    InvasiveRespiratorySupport,
    NeurologicDecompensation,
    AirwayInvasiveSupport,
    AirwayNonInvasiveSupport,
    WithdrawalRisk,
}

impl CriticalCareReason {
    pub const ALL: [CriticalCareReason; 5] = [
        CriticalCareReason::InvasiveRespiratorySupport,
        CriticalCareReason::NeurologicDecompensation,
        CriticalCareReason::AirwayInvasiveSupport,
        CriticalCareReason::AirwayNonInvasiveSupport,
        CriticalCareReason::WithdrawalRisk,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            CriticalCareReason::InvasiveRespiratorySupport => "invasive-respiratory-support",
            CriticalCareReason::NeurologicDecompensation => "neurologic-decompensation",
            CriticalCareReason::AirwayInvasiveSupport => "airway-invasive-support",
            CriticalCareReason::AirwayNonInvasiveSupport => "airway-non-invasive-support",
            CriticalCareReason::WithdrawalRisk => "withdrawal-risk",
        }
    }

    /// Sentence written under `WHY CRITICAL CARE:`.
    pub fn text(&self) -> &'static str {
        match self {
            CriticalCareReason::InvasiveRespiratorySupport => {
                "The patient requires critical care services due to the continuous management of invasive respiratory support."
            }
            CriticalCareReason::NeurologicDecompensation => {
                "The patient requires critical care services due to the high risk of neurologic decompensation."
            }
            CriticalCareReason::AirwayInvasiveSupport => {
                "The patient requires critical care services for management of the patient's airway and invasive mechanical respiratory support."
            }
            CriticalCareReason::AirwayNonInvasiveSupport => {
                "The patient requires critical care services for management of the patient's airway and non-invasive mechanical respiratory support."
            }
            CriticalCareReason::WithdrawalRisk => {
                "The patient requires critical care services as the patient is at high risk of withdrawal."
            }
        }
    }
}

impl FromStr for CriticalCareReason {
    type Err = NoteError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        CriticalCareReason::ALL
            .into_iter()
            .find(|reason| reason.name() == wanted)
            .ok_or_else(|| NoteError::InvalidCriticalCareReason(s.trim().to_owned()))
    }
}

/// Input collected by the note form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NoteRequest {
    /// Diagnosis labels in selection order
    pub diagnoses: Vec<String>,
    pub assessment: Option<String>,
    pub plan: Option<String>,
    pub overnight_events: Option<String>,
    pub critical_care: Option<CriticalCareReason>,
    /// Minutes, or free text such as `"35 minutes excluding procedures"`
    pub critical_care_time: Option<String>,
    /// Review of systems template label; blank or `None` leaves the section out
    pub ros: Option<String>,
    /// Physical exam template label; blank or `None` leaves the section out
    pub exam_day: Option<String>,
    pub room_number: Option<String>,
    pub include_intro: bool,
}

impl Default for NoteRequest {
    fn default() -> Self {
        Self {
            diagnoses: Vec::new(),
            assessment: None,
            plan: None,
            overnight_events: None,
            critical_care: None,
            critical_care_time: None,
            ros: None,
            exam_day: None,
            room_number: None,
            include_intro: true,
        }
    }
}

impl NoteRequest {
    /// Parses a request from YAML.
    ///
    /// # Errors
    ///
    /// Returns `NoteError::YamlDeserialization` if the YAML does not describe a request.
    pub fn from_yaml(yaml: &str) -> NoteResult<Self> {
        serde_yaml::from_str(yaml).map_err(NoteError::YamlDeserialization)
    }

    /// Reads and parses a YAML request file.
    ///
    /// # Errors
    ///
    /// Returns `NoteError::FileRead` if the file cannot be read, or
    /// `NoteError::YamlDeserialization` if it is not a valid request.
    pub fn load(path: &Path) -> NoteResult<Self> {
        let yaml = fs::read_to_string(path).map_err(NoteError::FileRead)?;
        Self::from_yaml(&yaml)
    }

    /// Checks required inputs before anything is resolved or rendered.
    ///
    /// The assessment is always required; diagnoses and room number depend on `policy`.
    pub fn validate(&self, policy: &ValidationPolicy) -> NoteResult<()> {
        if NonEmptyText::optional(self.assessment.as_deref()).is_none() {
            return Err(NoteError::MissingAssessment);
        }
        if policy.require_diagnoses && self.diagnosis_labels().is_empty() {
            return Err(NoteError::MissingDiagnoses);
        }
        if policy.require_room_number
            && NonEmptyText::optional(self.room_number.as_deref()).is_none()
        {
            return Err(NoteError::MissingRoomNumber);
        }
        Ok(())
    }

    /// Non-blank diagnosis labels in selection order, first occurrence only.
    fn diagnosis_labels(&self) -> Vec<NonEmptyText> {
        let mut labels: Vec<NonEmptyText> = Vec::new();
        for label in self.diagnoses.iter().filter_map(|d| NonEmptyText::new(d).ok()) {
            if labels.contains(&label) {
                tracing::debug!(label = %label, "duplicate diagnosis ignored");
                continue;
            }
            labels.push(label);
        }
        labels
    }
}

/// Which optional inputs a request must carry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ValidationPolicy {
    pub require_diagnoses: bool,
    pub require_room_number: bool,
}

impl ValidationPolicy {
    /// Diagnoses and room number both required.
    pub fn strict() -> Self {
        Self {
            require_diagnoses: true,
            require_room_number: true,
        }
    }
}

/// A rendered document and the name it should be saved under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteArtifact {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// Result of the "update note" flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdatedNote {
    pub text: String,
    pub artifact: NoteArtifact,
}

/// A form selection, or `None` when it is blank or the literal `None`.
fn selection(value: Option<&str>) -> Option<&str> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty() && !v.eq_ignore_ascii_case("none"))
}

/// A bare number of minutes gets its unit; anything else is kept as typed.
fn critical_care_minutes(value: &str) -> String {
    let value = value.trim();
    if !value.is_empty() && value.chars().all(|c| c.is_ascii_digit()) {
        format!("{} minutes", value)
    } else {
        value.to_owned()
    }
}

/// Service for turning note requests into documents.
#[derive(Debug, Clone)]
pub struct NoteService {
    cfg: CoreConfig,
    assembler: DocumentAssembler,
}

impl NoteService {
    pub fn new(cfg: CoreConfig) -> Self {
        let assembler = DocumentAssembler::new(&cfg);
        Self { cfg, assembler }
    }

    pub fn config(&self) -> &CoreConfig {
        &self.cfg
    }

    /// Validates `request` and lays it out as sections, resolving templates from `source`.
    ///
    /// # Errors
    ///
    /// Returns a `NoteError` if required input is missing. Template failures are not errors;
    /// the affected section or diagnosis entry is left out.
    pub fn compose(
        &self,
        request: &NoteRequest,
        source: &dyn FragmentSource,
    ) -> NoteResult<Vec<Section>> {
        request.validate(&self.cfg.validation_policy())?;

        let mut sections = Vec::new();

        if request.include_intro {
            sections.push(Section::literal(SectionTag::Intro, self.cfg.intro_text()));
        }

        if let Some(events) = &request.overnight_events {
            sections.push(Section::literal(SectionTag::OvernightEvents, events.as_str()));
        }

        if let Some(ros) = selection(request.ros.as_deref()) {
            let fragment = source.resolve(TemplateCategory::ReviewOfSystems, ros);
            sections.push(Section::fragment(SectionTag::Subjective, fragment));
        }

        if let Some(day) = selection(request.exam_day.as_deref()) {
            let fragment = source.resolve(TemplateCategory::PhysicalExam, day);
            sections.push(Section::fragment(SectionTag::Objective, fragment));
        }

        sections.push(Section::literal(
            SectionTag::Assessment,
            request.assessment.as_deref().unwrap_or_default(),
        ));

        if let Some(reason) = request.critical_care {
            sections.push(Section::literal(
                SectionTag::CriticalCareJustification,
                reason.text(),
            ));
        }

        if let Some(time) = selection(request.critical_care_time.as_deref()) {
            sections.push(
                Section::literal(SectionTag::FreeText, critical_care_minutes(time))
                    .with_heading("Critical care time:"),
            );
        }

        let entries = request
            .diagnosis_labels()
            .into_iter()
            .map(|label| {
                let fragment = source.resolve(TemplateCategory::Diagnoses, label.as_str());
                DiagnosisEntry { label, fragment }
            })
            .collect();
        sections.push(
            Section::literal(SectionTag::Plan, request.plan.as_deref().unwrap_or_default())
                .with_entries(entries),
        );

        Ok(sections)
    }

    /// Composes and renders `request` into a `.docx` named after its room number.
    ///
    /// # Errors
    ///
    /// Returns a `NoteError` if required input is missing or the document cannot be written.
    pub fn render(
        &self,
        request: &NoteRequest,
        source: &dyn FragmentSource,
    ) -> NoteResult<NoteArtifact> {
        let sections = self.compose(request, source)?;
        let bytes = self.assembler.assemble(&sections)?;

        Ok(NoteArtifact {
            file_name: note_file_name(request.room_number.as_deref()),
            bytes,
        })
    }

    /// Lists the templates `source` offers for `category`, sorted by key.
    ///
    /// # Errors
    ///
    /// Returns `NoteError::Fragment` if the directory or listing API cannot be read. Unlike
    /// template lookups during composition, listing failures are reported.
    pub fn list_templates(
        &self,
        source: &dyn FragmentSource,
        category: TemplateCategory,
    ) -> NoteResult<Vec<TemplateListing>> {
        let listings = source.list(category)?;
        tracing::debug!(%category, count = listings.len(), "templates listed");
        Ok(listings)
    }

    /// Applies `rule` to `text` and renders the result, one paragraph per line.
    ///
    /// # Errors
    ///
    /// Returns `NoteError::EmptyNoteText` for blank input, or `NoteError::Render` if the document
    /// cannot be written.
    pub fn render_update(&self, text: &str, rule: &PhraseReplacement) -> NoteResult<UpdatedNote> {
        let updated = update_note(text, rule)?;
        let bytes = self
            .assembler
            .assemble(&[Section::literal(SectionTag::FreeText, updated.as_str())])?;

        Ok(UpdatedNote {
            text: updated,
            artifact: NoteArtifact {
                file_name: UPDATED_NOTE_FILENAME.to_owned(),
                bytes,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fragments::LocalFragmentSource;
    use crate::phrase::Phrase;
    use crate::FragmentError;
    use clinnote_docx::read_paragraphs;
    use clinnote_types::KeyStyle;
    use tempfile::TempDir;

    fn template_dir() -> TempDir {
        let temp = TempDir::new().unwrap();
        for category in TemplateCategory::ALL {
            fs::create_dir_all(temp.path().join(category.subpath())).unwrap();
        }
        fs::write(
            temp.path().join("diagnoses/sepsis.txt"),
            "Continue ceftriaxone.\nFollow blood culture.",
        )
        .unwrap();
        fs::write(temp.path().join("diagnoses/anemia.txt"), "Transfuse if Hb < 7.").unwrap();
        fs::write(temp.path().join("ros/full.txt"), "Neuro: no seizures").unwrap();
        fs::write(temp.path().join("physicalexam/day_1.txt"), "Lungs: clear").unwrap();
        temp
    }

    fn service(temp: &TempDir) -> (NoteService, LocalFragmentSource) {
        let config = CoreConfig::new(temp.path().to_path_buf());
        let source = LocalFragmentSource::new(temp.path(), KeyStyle::Compact).unwrap();
        (NoteService::new(config), source)
    }

    fn request() -> NoteRequest {
        NoteRequest {
            assessment: Some("5yo with sepsis, improving.".into()),
            diagnoses: vec!["Sepsis".into(), "Anemia".into()],
            room_number: Some("12".into()),
            ..NoteRequest::default()
        }
    }

    #[test]
    fn test_render_full_note_in_priority_order() {
        let temp = template_dir();
        let (service, source) = service(&temp);
        let request = NoteRequest {
            overnight_events: Some("Febrile to 39.".into()),
            ros: Some("Full".into()),
            exam_day: Some("Day 1".into()),
            critical_care: Some(CriticalCareReason::NeurologicDecompensation),
            critical_care_time: Some("35".into()),
            plan: Some("Family updated at bedside.".into()),
            ..request()
        };

        let artifact = service.render(&request, &source).unwrap();
        assert_eq!(artifact.file_name, "12.docx");

        let paragraphs = read_paragraphs(&artifact.bytes).unwrap();
        assert_eq!(
            paragraphs,
            vec![
                crate::constants::DEFAULT_INTRO_TEXT,
                "OVERNIGHT EVENTS:",
                "Febrile to 39.",
                "SUBJECTIVE:",
                "Neuro: no seizures",
                "OBJECTIVE:",
                "Lungs: clear",
                "ASSESSMENT:",
                "5yo with sepsis, improving.",
                "WHY CRITICAL CARE:",
                CriticalCareReason::NeurologicDecompensation.text(),
                "Critical care time: 35 minutes",
                "PLAN:",
                "Family updated at bedside.",
                "1). Sepsis",
                "Continue ceftriaxone.",
                "Follow blood culture.",
                "2). Anemia",
                "Transfuse if Hb < 7.",
            ]
        );
    }

    #[test]
    fn test_none_selections_are_omitted() {
        let temp = template_dir();
        let (service, source) = service(&temp);
        let request = NoteRequest {
            ros: Some("None".into()),
            exam_day: Some("  ".into()),
            critical_care_time: Some("".into()),
            include_intro: false,
            ..request()
        };

        let sections = service.compose(&request, &source).unwrap();
        let tags: Vec<SectionTag> = sections.iter().map(|s| s.tag).collect();
        assert_eq!(tags, vec![SectionTag::Assessment, SectionTag::Plan]);
    }

    #[test]
    fn test_missing_diagnosis_template_is_skipped() {
        let temp = template_dir();
        let (service, source) = service(&temp);
        let request = NoteRequest {
            diagnoses: vec!["Insomnia".into(), "Anemia".into()],
            include_intro: false,
            ..request()
        };

        let artifact = service.render(&request, &source).unwrap();
        let paragraphs = read_paragraphs(&artifact.bytes).unwrap();
        assert_eq!(
            paragraphs,
            vec![
                "ASSESSMENT:",
                "5yo with sepsis, improving.",
                "PLAN:",
                "1). Anemia",
                "Transfuse if Hb < 7.",
            ]
        );
    }

    #[test]
    fn test_validation() {
        let temp = template_dir();
        let (service, source) = service(&temp);

        let no_assessment = NoteRequest {
            assessment: Some("   ".into()),
            ..request()
        };
        assert!(matches!(
            service.compose(&no_assessment, &source),
            Err(NoteError::MissingAssessment)
        ));

        let strict = NoteService::new(
            CoreConfig::new(temp.path().to_path_buf())
                .with_validation_policy(ValidationPolicy::strict()),
        );
        let no_room = NoteRequest {
            room_number: None,
            ..request()
        };
        assert!(matches!(
            strict.compose(&no_room, &source),
            Err(NoteError::MissingRoomNumber)
        ));
        let no_diagnoses = NoteRequest {
            diagnoses: vec![" ".into()],
            ..request()
        };
        assert!(matches!(
            strict.compose(&no_diagnoses, &source),
            Err(NoteError::MissingDiagnoses)
        ));

        // default policy accepts both
        assert!(service.compose(&no_room, &source).is_ok());
        assert!(service.compose(&no_diagnoses, &source).is_ok());
    }

    #[test]
    fn test_duplicate_diagnoses_numbered_once() {
        let temp = template_dir();
        let (service, source) = service(&temp);
        let request = NoteRequest {
            diagnoses: vec!["Sepsis".into(), "Sepsis".into()],
            ..request()
        };

        let sections = service.compose(&request, &source).unwrap();
        let plan = sections.last().unwrap();
        assert_eq!(plan.entries.len(), 1);
    }

    #[test]
    fn test_default_file_name_without_room() {
        let temp = template_dir();
        let (service, source) = service(&temp);
        let request = NoteRequest {
            room_number: None,
            ..request()
        };

        let artifact = service.render(&request, &source).unwrap();
        assert_eq!(artifact.file_name, "combined_note.docx");
    }

    #[test]
    fn test_request_from_yaml() {
        let yaml = r#"
diagnoses:
  - Sepsis
  - Vitamin D Deficiency
assessment: Stable.
critical_care: withdrawal-risk
critical_care_time: "40 minutes excluding procedures"
ros: None
room_number: PICU 4
"#;
        let request = NoteRequest::from_yaml(yaml).unwrap();
        assert_eq!(request.diagnoses, vec!["Sepsis", "Vitamin D Deficiency"]);
        assert_eq!(request.critical_care, Some(CriticalCareReason::WithdrawalRisk));
        assert!(request.include_intro);
        assert_eq!(
            critical_care_minutes(request.critical_care_time.as_deref().unwrap()),
            "40 minutes excluding procedures"
        );
        assert_eq!(selection(request.ros.as_deref()), None);

        assert!(matches!(
            NoteRequest::from_yaml("critical_care: sometimes"),
            Err(NoteError::YamlDeserialization(_))
        ));
    }

    #[test]
    fn test_load_missing_file() {
        let temp = TempDir::new().unwrap();
        assert!(matches!(
            NoteRequest::load(&temp.path().join("absent.yaml")),
            Err(NoteError::FileRead(_))
        ));
    }

    #[test]
    fn test_critical_care_reason_from_str() {
        for reason in CriticalCareReason::ALL {
            assert_eq!(reason.name().parse::<CriticalCareReason>().unwrap(), reason);
        }
        assert!(matches!(
            "paperwork".parse::<CriticalCareReason>(),
            Err(NoteError::InvalidCriticalCareReason(_))
        ));
    }

    #[test]
    fn test_render_update() {
        let temp = template_dir();
        let (service, _) = service(&temp);
        let rule = PhraseReplacement::new(Phrase::Continue, Phrase::WeWillContinue);

        let updated = service
            .render_update("Continue feeds.\nContinue fluids.", &rule)
            .unwrap();

        assert_eq!(updated.text, "We will continue feeds.\nWe will continue fluids.");
        assert_eq!(updated.artifact.file_name, "updated_note.docx");
        assert_eq!(
            read_paragraphs(&updated.artifact.bytes).unwrap(),
            vec!["We will continue feeds.", "We will continue fluids."]
        );
    }

    #[test]
    fn test_list_templates() {
        let temp = template_dir();
        let (service, source) = service(&temp);

        let listings = service
            .list_templates(&source, TemplateCategory::Diagnoses)
            .unwrap();
        let labels: Vec<&str> = listings.iter().map(|l| l.label.as_str()).collect();
        assert_eq!(labels, vec!["Anemia", "Sepsis"]);
    }

    #[test]
    fn test_list_templates_reports_unreadable_category() {
        let temp = TempDir::new().unwrap();
        let (service, source) = service(&temp);

        let result = service.list_templates(&source, TemplateCategory::Diagnoses);
        assert!(matches!(
            result,
            Err(NoteError::Fragment(FragmentError::ListingUnavailable(_)))
        ));
    }
}
