//! Constants used throughout the clinnote core crate.
//!
//! This module contains all file naming, typography and vocabulary constants to ensure
//! consistency across the codebase and make maintenance easier.

/// Default directory for local templates when no explicit directory is configured.
pub const DEFAULT_TEMPLATE_DIR: &str = "templates";

/// Extension of word-processor template files, local and remote.
pub const TEMPLATE_EXTENSION: &str = "docx";

/// Extension of plain-text local templates (one paragraph per line).
pub const PLAIN_TEXT_EXTENSION: &str = "txt";

/// Remote fetches give up after this many seconds unless configured otherwise.
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 10;

/// Upper bound on a single remote template response.
pub const MAX_TEMPLATE_BYTES: usize = 10 * 1024 * 1024; // 10 MiB

/// Body font family used for every run in an assembled note.
pub const DEFAULT_FONT_FAMILY: &str = "Arial";

/// Body font size in points.
pub const DEFAULT_FONT_SIZE_PT: f32 = 9.0;

/// Exact line height in points.
pub const DEFAULT_LINE_HEIGHT_PT: f32 = 12.0;

/// File name of an assembled note when no room number is supplied.
pub const DEFAULT_NOTE_FILENAME: &str = "combined_note.docx";

/// File name of a note produced by the phrase-replacement flow.
pub const UPDATED_NOTE_FILENAME: &str = "updated_note.docx";

/// Extension appended to a room-number-derived file name.
pub const NOTE_FILE_EXTENSION: &str = "docx";

/// One-time attestation printed at the top of a note when requested.
pub const DEFAULT_INTRO_TEXT: &str =
    "I personally examined the patient separately and discussed the plan of care with the team.";

/// Diagnoses offered by the note form, in display order.
pub const KNOWN_DIAGNOSES: &[&str] = &[
    "Acute Hypoxemic Respiratory Failure",
    "Acute Hypoxemic Respiratory Failure NIV",
    "Anemia",
    "At risk for gastric ulcers",
    "At risk for malnutrition",
    "Bronchopulmonary Dysplasia",
    "Constipation",
    "Hyponatremia",
    "Hypokalemia",
    "Hypomagnesemia",
    "Hypophosphatemia",
    "Increased Gastric Tube Output",
    "Insomnia",
    "Lymphopenia",
    "Neutropenia",
    "Sepsis",
    "Status Asthmaticus",
    "Status Epilepticus",
    "Thrombocytopenia",
    "Urinary Retention",
    "Vitamin D Deficiency",
];
