//! # clinnote Core
//!
//! Core logic for assembling clinical progress notes.
//!
//! This crate turns form input into a formatted word-processor document:
//! - Template lookup from a local directory or a remote template store
//! - A declarative section style table and a single rendering routine
//! - Note composition in a fixed section order, with numbered diagnoses
//! - Phrase replacement for updating existing note text
//!
//! **No presentation concerns**: argument parsing, environment handling and writing files to
//! disk belong in `clinnote-cli`. Everything here returns in-memory buffers.

pub mod assembler;
pub mod config;
pub mod constants;
pub mod error;
pub mod fragments;
pub mod note;
pub mod phrase;
pub mod sections;
pub mod validation;

pub use assembler::{DocumentAssembler, EmptyPlanPolicy};
pub use config::{CoreConfig, Typography};
pub use error::{FragmentError, FragmentResult, NoteError, NoteResult};
pub use fragments::{
    Fragment, FragmentSource, LocalFragmentSource, Origin, OriginKind, RemoteFragmentSource,
    TemplateCategory, TemplateListing,
};
pub use note::{
    CriticalCareReason, NoteArtifact, NoteRequest, NoteService, UpdatedNote, ValidationPolicy,
};
pub use phrase::{update_note, Phrase, PhraseReplacement};
pub use sections::{DiagnosisEntry, Section, SectionBody, SectionTag};
