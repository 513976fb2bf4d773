//! Fragment sources.
//!
//! A fragment is a reusable block of template text (a diagnosis write-up, a review-of-systems
//! variant, a physical-exam-by-day variant) that is spliced into an assembled note.
//!
//! ## Key Components
//!
//! - **[`FragmentSource`]**: the capability the composer depends on, selected per request
//! - **[`LocalFragmentSource`]**: templates in a directory on disk
//! - **[`RemoteFragmentSource`]**: templates under a base URL, fetched over HTTP
//!
//! Both sources behave identically from the caller's point of view: [`FragmentSource::resolve`]
//! returns `None` for any failure, so one missing template never aborts a whole note.

mod local;
mod remote;

pub use local::LocalFragmentSource;
pub use remote::{HttpTransport, RemoteFragmentSource, TemplateTransport, TransportResponse};

use std::path::PathBuf;
use std::str::FromStr;

use clinnote_types::{KeyStyle, TemplateKey};

use crate::error::{FragmentError, FragmentResult, NoteError};

/// Template categories, each stored under its own sub-path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TemplateCategory {
    Diagnoses,
    ReviewOfSystems,
    PhysicalExam,
}

impl TemplateCategory {
    pub const ALL: [TemplateCategory; 3] = [
        TemplateCategory::Diagnoses,
        TemplateCategory::ReviewOfSystems,
        TemplateCategory::PhysicalExam,
    ];

    /// Directory (local) or path segment (remote) holding this category's templates.
    pub fn subpath(&self) -> &'static str {
        match self {
            TemplateCategory::Diagnoses => "diagnoses",
            TemplateCategory::ReviewOfSystems => "ros",
            TemplateCategory::PhysicalExam => "physicalexam",
        }
    }
}

impl std::fmt::Display for TemplateCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            TemplateCategory::Diagnoses => "diagnosis",
            TemplateCategory::ReviewOfSystems => "review of systems",
            TemplateCategory::PhysicalExam => "physical exam",
        };
        f.write_str(name)
    }
}

impl FromStr for TemplateCategory {
    type Err = NoteError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "diagnoses" | "diagnosis" => Ok(TemplateCategory::Diagnoses),
            "ros" | "review-of-systems" => Ok(TemplateCategory::ReviewOfSystems),
            "physicalexam" | "physical-exam" | "exam" => Ok(TemplateCategory::PhysicalExam),
            other => Err(NoteError::InvalidCategory(other.to_owned())),
        }
    }
}

/// Which kind of store a source reads from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OriginKind {
    Local,
    Remote,
}

/// Where a resolved fragment came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Origin {
    Local(PathBuf),
    Remote(String),
}

/// Template text resolved for one assembly request.
///
/// Fragments are not cached; each request resolves its own and drops them afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fragment {
    /// Storage key the fragment was found under
    pub name: String,
    pub origin: Origin,
    /// Paragraph texts in template order, blank paragraphs included
    pub paragraphs: Vec<String>,
}

impl Fragment {
    /// Whether any paragraph carries visible text.
    pub fn has_content(&self) -> bool {
        self.paragraphs.iter().any(|p| !p.trim().is_empty())
    }
}

/// One entry of a template listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateListing {
    /// Human-readable label derived from the key
    pub label: String,
    pub key: TemplateKey,
    /// Path or download URL
    pub location: String,
}

/// Resolves template names to fragments.
///
/// Implementations report failures precisely through [`FragmentSource::fetch`]; the provided
/// [`FragmentSource::resolve`] collapses every failure into `None` so local and remote stores
/// look the same to the composer.
pub trait FragmentSource {
    fn origin_kind(&self) -> OriginKind;

    /// Style tried first when turning a label into a key.
    fn key_style(&self) -> KeyStyle;

    /// Fetches one template by key. A single attempt; no retries.
    fn fetch(&self, category: TemplateCategory, key: &TemplateKey) -> FragmentResult<Fragment>;

    /// Lists the templates available in a category, sorted by key.
    fn list(&self, category: TemplateCategory) -> FragmentResult<Vec<TemplateListing>>;

    /// Resolves a human-readable label, trying each key candidate in turn.
    ///
    /// Returns `None` when no candidate yields a fragment with visible text. The failure is
    /// logged once and otherwise absorbed.
    fn resolve(&self, category: TemplateCategory, label: &str) -> Option<Fragment> {
        let keys = match TemplateKey::candidates(label, self.key_style()) {
            Ok(keys) => keys,
            Err(e) => {
                tracing::warn!(%category, label, "cannot derive template key: {}", e);
                return None;
            }
        };

        let mut last_error = None;
        for key in &keys {
            match self.fetch(category, key) {
                Ok(fragment) if fragment.has_content() => {
                    tracing::debug!(%category, label, key = %key, "resolved template");
                    return Some(fragment);
                }
                Ok(_) => {
                    last_error = Some(FragmentError::Empty {
                        category,
                        key: key.to_string(),
                    })
                }
                Err(e) => last_error = Some(e),
            }
        }

        if let Some(e) = last_error {
            tracing::warn!(
                %category,
                label,
                origin = ?self.origin_kind(),
                "template unavailable, omitting: {}",
                e
            );
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    /// In-memory source that records every key it is asked for.
    struct RecordingSource {
        available: Vec<(&'static str, Vec<&'static str>)>,
        requested: RefCell<Vec<String>>,
    }

    impl FragmentSource for RecordingSource {
        fn origin_kind(&self) -> OriginKind {
            OriginKind::Local
        }

        fn key_style(&self) -> KeyStyle {
            KeyStyle::Compact
        }

        fn fetch(&self, category: TemplateCategory, key: &TemplateKey) -> FragmentResult<Fragment> {
            self.requested.borrow_mut().push(key.to_string());
            self.available
                .iter()
                .find(|(name, _)| *name == key.as_str())
                .map(|(name, paragraphs)| Fragment {
                    name: name.to_string(),
                    origin: Origin::Local(PathBuf::from(name)),
                    paragraphs: paragraphs.iter().map(|p| p.to_string()).collect(),
                })
                .ok_or_else(|| FragmentError::NotFound {
                    category,
                    key: key.to_string(),
                })
        }

        fn list(&self, _category: TemplateCategory) -> FragmentResult<Vec<TemplateListing>> {
            Ok(Vec::new())
        }
    }

    #[test]
    fn test_resolve_falls_back_to_underscored_key() {
        let source = RecordingSource {
            available: vec![("day_1", vec!["General: well appearing"])],
            requested: RefCell::new(Vec::new()),
        };

        let fragment = source
            .resolve(TemplateCategory::PhysicalExam, "Day 1")
            .unwrap();

        assert_eq!(fragment.name, "day_1");
        assert_eq!(*source.requested.borrow(), vec!["day1", "day_1"]);
    }

    #[test]
    fn test_resolve_treats_blank_template_as_missing() {
        let source = RecordingSource {
            available: vec![("sepsis", vec!["", "   "])],
            requested: RefCell::new(Vec::new()),
        };

        assert!(source.resolve(TemplateCategory::Diagnoses, "Sepsis").is_none());
    }

    #[test]
    fn test_resolve_absorbs_unusable_label() {
        let source = RecordingSource {
            available: vec![],
            requested: RefCell::new(Vec::new()),
        };

        assert!(source.resolve(TemplateCategory::Diagnoses, "%%%").is_none());
        assert!(source.requested.borrow().is_empty());
    }

    #[test]
    fn test_category_parse_and_subpath() {
        assert_eq!(
            "ros".parse::<TemplateCategory>().unwrap().subpath(),
            "ros"
        );
        assert_eq!(
            "physical-exam".parse::<TemplateCategory>().unwrap(),
            TemplateCategory::PhysicalExam
        );
        assert!("labs".parse::<TemplateCategory>().is_err());
    }
}
