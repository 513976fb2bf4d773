//! Phrase replacement for the "update note" flow.
//!
//! A [`PhraseReplacement`] swaps every literal occurrence of one stock phrase for another. The
//! match is a plain, case-sensitive substring match with no word boundaries, so replacing
//! `Continue` does not touch `continue` but does touch `Continued`.

use std::str::FromStr;

use crate::{NoteError, NoteResult};

/// The fixed phrase vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phrase {
    Continue,
    WillContinue,
    WeWillContinue,
    WeShallContinue,
}

impl Phrase {
    pub const ALL: [Phrase; 4] = [
        Phrase::Continue,
        Phrase::WillContinue,
        Phrase::WeWillContinue,
        Phrase::WeShallContinue,
    ];

    /// Text as it appears in a note.
    pub fn as_str(&self) -> &'static str {
        match self {
            Phrase::Continue => "Continue",
            Phrase::WillContinue => "Will continue",
            Phrase::WeWillContinue => "We will continue",
            Phrase::WeShallContinue => "We shall continue",
        }
    }

    /// Kebab-case name accepted on the command line.
    pub fn name(&self) -> &'static str {
        match self {
            Phrase::Continue => "continue",
            Phrase::WillContinue => "will-continue",
            Phrase::WeWillContinue => "we-will-continue",
            Phrase::WeShallContinue => "we-shall-continue",
        }
    }
}

impl std::fmt::Display for Phrase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Phrase {
    type Err = NoteError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace('-', " ");
        Phrase::ALL
            .into_iter()
            .find(|phrase| phrase.as_str().to_ascii_lowercase() == wanted)
            .ok_or_else(|| NoteError::InvalidPhrase(s.trim().to_owned()))
    }
}

/// Replace every occurrence of `from` with `to`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhraseReplacement {
    pub from: Phrase,
    pub to: Phrase,
}

impl PhraseReplacement {
    pub fn new(from: Phrase, to: Phrase) -> Self {
        Self { from, to }
    }

    pub fn apply(&self, text: &str) -> String {
        text.replace(self.from.as_str(), self.to.as_str())
    }
}

/// Applies `rule` to a note's text.
///
/// # Errors
///
/// Returns `NoteError::EmptyNoteText` if `text` is empty or whitespace.
pub fn update_note(text: &str, rule: &PhraseReplacement) -> NoteResult<String> {
    if text.trim().is_empty() {
        return Err(NoteError::EmptyNoteText);
    }

    let updated = rule.apply(text);
    tracing::debug!(
        from = rule.from.as_str(),
        to = rule.to.as_str(),
        replacements = text.matches(rule.from.as_str()).count(),
        "phrase replacement applied"
    );
    Ok(updated)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_replacement_is_exhaustive() {
        let rule = PhraseReplacement::new(Phrase::Continue, Phrase::WeShallContinue);
        assert_eq!(
            rule.apply("Continue. Continue again."),
            "We shall continue. We shall continue again."
        );
    }

    #[test]
    fn test_replacement_is_plain_substring() {
        let rule = PhraseReplacement::new(Phrase::Continue, Phrase::WillContinue);
        assert_eq!(
            rule.apply("Continued fluids; continue feeds."),
            "Will continued fluids; continue feeds."
        );
    }

    #[test]
    fn test_replacement_inside_longer_phrase() {
        let rule = PhraseReplacement::new(Phrase::WillContinue, Phrase::Continue);
        assert_eq!(
            rule.apply("We Will continue steroids."),
            "We Continue steroids."
        );
    }

    #[test]
    fn test_same_phrase_is_identity() {
        let rule = PhraseReplacement::new(Phrase::WeWillContinue, Phrase::WeWillContinue);
        assert_eq!(rule.apply("We will continue."), "We will continue.");
    }

    #[test]
    fn test_phrase_from_str() {
        assert_eq!("Continue".parse::<Phrase>().unwrap(), Phrase::Continue);
        assert_eq!(
            "we-shall-continue".parse::<Phrase>().unwrap(),
            Phrase::WeShallContinue
        );
        assert_eq!(
            " WILL CONTINUE ".parse::<Phrase>().unwrap(),
            Phrase::WillContinue
        );
        assert!(matches!(
            "proceed".parse::<Phrase>(),
            Err(NoteError::InvalidPhrase(p)) if p == "proceed"
        ));
    }

    #[test]
    fn test_names_round_trip() {
        for phrase in Phrase::ALL {
            assert_eq!(phrase.name().parse::<Phrase>().unwrap(), phrase);
        }
    }

    #[test]
    fn test_update_note_rejects_blank_text() {
        let rule = PhraseReplacement::new(Phrase::Continue, Phrase::WillContinue);
        assert!(matches!(
            update_note("  \n", &rule),
            Err(NoteError::EmptyNoteText)
        ));
        assert_eq!(
            update_note("Continue IV fluids.", &rule).unwrap(),
            "Will continue IV fluids."
        );
    }
}
