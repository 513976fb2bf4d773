//! Input validation utilities.
//!
//! This module contains functions for validating user and configuration inputs before they are
//! used to build URLs or file names.

use crate::constants::{DEFAULT_NOTE_FILENAME, NOTE_FILE_EXTENSION};
use crate::{NoteError, NoteResult};

/// Validates that a template store URL is safe to use as a base for template paths.
///
/// - Must start with `http://` or `https://` and have a non-empty host part
/// - Must be ASCII with no whitespace, query string or fragment
///
/// # Errors
///
/// Returns a `NoteError::InvalidInput` if the URL is unusable.
pub fn validate_base_url(url: &str) -> NoteResult<()> {
    const MAX_URL_LEN: usize = 2048;

    let url = url.trim();
    if url.is_empty() {
        return Err(NoteError::InvalidInput("template URL cannot be empty".into()));
    }

    if url.len() > MAX_URL_LEN {
        return Err(NoteError::InvalidInput(format!(
            "template URL exceeds maximum length of {} characters",
            MAX_URL_LEN
        )));
    }

    if !url.is_ascii() || url.chars().any(|c| c.is_ascii_whitespace() || c.is_ascii_control()) {
        return Err(NoteError::InvalidInput(
            "template URL must be ASCII without whitespace".into(),
        ));
    }

    let rest = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"))
        .ok_or_else(|| {
            NoteError::InvalidInput(format!("template URL must use http or https: {}", url))
        })?;

    let host = rest.split('/').next().unwrap_or("");
    if host.is_empty() {
        return Err(NoteError::InvalidInput(format!(
            "template URL has no host: {}",
            url
        )));
    }

    if rest.contains(['?', '#']) {
        return Err(NoteError::InvalidInput(
            "template URL must not contain a query or fragment".into(),
        ));
    }

    Ok(())
}

/// Derives the download file name for a note from an optional room number.
///
/// Whitespace becomes `_` and characters outside `[A-Za-z0-9._-]` are dropped; a missing or
/// unusable room number yields `combined_note.docx`.
pub fn note_file_name(room_number: Option<&str>) -> String {
    let Some(room) = room_number else {
        return DEFAULT_NOTE_FILENAME.to_owned();
    };

    let sanitised: String = room
        .trim()
        .chars()
        .filter_map(|c| {
            if c.is_whitespace() {
                Some('_')
            } else if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                Some(c)
            } else {
                None
            }
        })
        .collect();
    let sanitised = sanitised.trim_start_matches('.');

    if sanitised.is_empty() {
        return DEFAULT_NOTE_FILENAME.to_owned();
    }

    format!("{}.{}", sanitised, NOTE_FILE_EXTENSION)
}
