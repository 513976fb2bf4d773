use clinnote_docx::DocxError;
use clinnote_types::TextError;

use crate::fragments::TemplateCategory;

#[derive(Debug, thiserror::Error)]
pub enum NoteError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("assessment text is required")]
    MissingAssessment,
    #[error("at least one diagnosis is required")]
    MissingDiagnoses,
    #[error("room number is required")]
    MissingRoomNumber,
    #[error("note text is required")]
    EmptyNoteText,
    #[error("unknown phrase '{0}'")]
    InvalidPhrase(String),
    #[error("unknown critical care reason '{0}'")]
    InvalidCriticalCareReason(String),
    #[error("unknown template category '{0}'")]
    InvalidCategory(String),
    #[error("failed to build HTTP client: {0}")]
    HttpClient(String),

    #[error("failed to render note document: {0}")]
    Render(#[source] DocxError),
    #[error("failed to read note input: {0}")]
    FileRead(std::io::Error),
    #[error("failed to write note document: {0}")]
    FileWrite(std::io::Error),
    #[error("failed to deserialize YAML: {0}")]
    YamlDeserialization(serde_yaml::Error),

    #[error("invalid text: {0}")]
    Text(#[from] TextError),
    #[error("template store error: {0}")]
    Fragment(#[from] FragmentError),
}

pub type NoteResult<T> = std::result::Result<T, NoteError>;

/// Reasons a template could not be produced.
///
/// During assembly every variant is treated the same way: the affected section or diagnosis
/// entry is omitted. Only listing operations surface these to the caller.
#[derive(Debug, thiserror::Error)]
pub enum FragmentError {
    #[error("no {category} template named '{key}'")]
    NotFound {
        category: TemplateCategory,
        key: String,
    },
    #[error("{category} template '{key}' has no text")]
    Empty {
        category: TemplateCategory,
        key: String,
    },
    #[error("template request to {url} returned HTTP {status}")]
    HttpStatus { url: String, status: u16 },
    #[error("template request failed: {0}")]
    Transport(String),
    #[error("template document is malformed: {0}")]
    Malformed(#[source] DocxError),
    #[error("failed to read template: {0}")]
    Io(#[from] std::io::Error),
    #[error("template listing unavailable: {0}")]
    ListingUnavailable(String),
}

pub type FragmentResult<T> = std::result::Result<T, FragmentError>;
