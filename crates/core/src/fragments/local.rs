//! Templates stored in a local directory.
//!
//! ```text
//! <template_dir>/
//! ├── diagnoses/
//! │   ├── sepsis.docx
//! │   └── vitaminddeficiency.docx
//! ├── ros/
//! │   └── neuro_focused.txt
//! └── physicalexam/
//!     └── day_1.docx
//! ```
//!
//! `.docx` is the template format; a `.txt` file with the same key is used when no `.docx`
//! exists, one paragraph per line.

use std::fs;
use std::path::{Path, PathBuf};

use clinnote_docx::read_paragraphs;
use clinnote_types::{KeyStyle, TemplateKey};

use super::{Fragment, FragmentSource, Origin, OriginKind, TemplateCategory, TemplateListing};
use crate::constants::{PLAIN_TEXT_EXTENSION, TEMPLATE_EXTENSION};
use crate::error::{FragmentError, FragmentResult, NoteError, NoteResult};

/// Fragment source backed by a template directory.
#[derive(Debug, Clone)]
pub struct LocalFragmentSource {
    root: PathBuf,
    key_style: KeyStyle,
}

impl LocalFragmentSource {
    /// Creates a source rooted at `root`.
    ///
    /// # Errors
    ///
    /// Returns `NoteError::InvalidInput` if `root` is not an existing directory. A missing
    /// directory is a configuration problem, unlike a missing individual template.
    pub fn new(root: impl Into<PathBuf>, key_style: KeyStyle) -> NoteResult<Self> {
        let root = root.into();
        if !root.is_dir() {
            return Err(NoteError::InvalidInput(format!(
                "template directory does not exist: {}",
                root.display()
            )));
        }
        Ok(Self { root, key_style })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn template_path(&self, category: TemplateCategory, key: &TemplateKey, ext: &str) -> PathBuf {
        self.root
            .join(category.subpath())
            .join(format!("{}.{}", key, ext))
    }
}

impl FragmentSource for LocalFragmentSource {
    fn origin_kind(&self) -> OriginKind {
        OriginKind::Local
    }

    fn key_style(&self) -> KeyStyle {
        self.key_style
    }

    fn fetch(&self, category: TemplateCategory, key: &TemplateKey) -> FragmentResult<Fragment> {
        let docx_path = self.template_path(category, key, TEMPLATE_EXTENSION);
        if docx_path.is_file() {
            let bytes = fs::read(&docx_path)?;
            let paragraphs = read_paragraphs(&bytes).map_err(FragmentError::Malformed)?;
            return Ok(Fragment {
                name: key.to_string(),
                origin: Origin::Local(docx_path),
                paragraphs,
            });
        }

        let text_path = self.template_path(category, key, PLAIN_TEXT_EXTENSION);
        if text_path.is_file() {
            let text = fs::read_to_string(&text_path)?;
            return Ok(Fragment {
                name: key.to_string(),
                origin: Origin::Local(text_path),
                paragraphs: text.lines().map(str::to_owned).collect(),
            });
        }

        Err(FragmentError::NotFound {
            category,
            key: key.to_string(),
        })
    }

    fn list(&self, category: TemplateCategory) -> FragmentResult<Vec<TemplateListing>> {
        let dir = self.root.join(category.subpath());
        let entries = fs::read_dir(&dir).map_err(|e| {
            FragmentError::ListingUnavailable(format!("{}: {}", dir.display(), e))
        })?;

        let mut listings: Vec<TemplateListing> = Vec::new();
        for entry in entries.flatten() {
            let path = entry.path();
            if !path.is_file() {
                continue;
            }

            let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
            if ext != TEMPLATE_EXTENSION && ext != PLAIN_TEXT_EXTENSION {
                continue;
            }

            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            let key = match TemplateKey::parse(stem) {
                Ok(key) => key,
                Err(_) => {
                    tracing::debug!("skipping template with non-key name: {}", path.display());
                    continue;
                }
            };

            // A .docx shadows a .txt with the same key, matching fetch order.
            if let Some(existing) = listings.iter_mut().find(|l| l.key == key) {
                if ext == TEMPLATE_EXTENSION {
                    existing.location = path.display().to_string();
                }
                continue;
            }

            listings.push(TemplateListing {
                label: key.to_label(),
                key,
                location: path.display().to_string(),
            });
        }

        listings.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(listings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clinnote_docx::{write_docx, Document, Font, Paragraph, ParagraphFormat, Run, RunFormat};
    use tempfile::TempDir;

    fn docx_bytes(lines: &[&str]) -> Vec<u8> {
        let font = Font::from_points("Calibri", 11.0);
        let spacing = ParagraphFormat::single(14.0);
        let mut document = Document::new(font.clone(), spacing);
        for line in lines {
            document.push(Paragraph::new(
                vec![Run::new(*line, RunFormat::plain(font.clone()))],
                spacing,
            ));
        }
        write_docx(&document).unwrap()
    }

    fn template_dir() -> TempDir {
        let temp = TempDir::new().unwrap();
        for category in TemplateCategory::ALL {
            fs::create_dir_all(temp.path().join(category.subpath())).unwrap();
        }
        temp
    }

    #[test]
    fn test_new_rejects_missing_directory() {
        let temp = TempDir::new().unwrap();
        let result = LocalFragmentSource::new(temp.path().join("absent"), KeyStyle::Compact);
        assert!(matches!(result, Err(NoteError::InvalidInput(_))));
    }

    #[test]
    fn test_fetch_docx_template() {
        let temp = template_dir();
        fs::write(
            temp.path().join("diagnoses/sepsis.docx"),
            docx_bytes(&["Continue antibiotics.", "Follow cultures."]),
        )
        .unwrap();

        let source = LocalFragmentSource::new(temp.path(), KeyStyle::Compact).unwrap();
        let key = TemplateKey::new("Sepsis", KeyStyle::Compact).unwrap();
        let fragment = source.fetch(TemplateCategory::Diagnoses, &key).unwrap();

        assert_eq!(
            fragment.paragraphs,
            vec!["Continue antibiotics.", "Follow cultures."]
        );
        assert!(matches!(fragment.origin, Origin::Local(_)));
    }

    #[test]
    fn test_fetch_plain_text_fallback() {
        let temp = template_dir();
        fs::write(
            temp.path().join("ros/neuro_focused.txt"),
            "Neuro: no seizures\nResp: no apnea\n",
        )
        .unwrap();

        let source = LocalFragmentSource::new(temp.path(), KeyStyle::Underscored).unwrap();
        let fragment = source
            .resolve(TemplateCategory::ReviewOfSystems, "Neuro Focused")
            .unwrap();

        assert_eq!(fragment.paragraphs, vec!["Neuro: no seizures", "Resp: no apnea"]);
    }

    #[test]
    fn test_fetch_missing_template_is_not_found() {
        let temp = template_dir();
        let source = LocalFragmentSource::new(temp.path(), KeyStyle::Compact).unwrap();
        let key = TemplateKey::new("Insomnia", KeyStyle::Compact).unwrap();

        let result = source.fetch(TemplateCategory::Diagnoses, &key);
        assert!(matches!(result, Err(FragmentError::NotFound { .. })));
        assert!(source.resolve(TemplateCategory::Diagnoses, "Insomnia").is_none());
    }

    #[test]
    fn test_fetch_corrupt_docx_is_malformed() {
        let temp = template_dir();
        fs::write(temp.path().join("diagnoses/anemia.docx"), b"not a zip").unwrap();

        let source = LocalFragmentSource::new(temp.path(), KeyStyle::Compact).unwrap();
        let key = TemplateKey::new("Anemia", KeyStyle::Compact).unwrap();

        let result = source.fetch(TemplateCategory::Diagnoses, &key);
        assert!(matches!(result, Err(FragmentError::Malformed(_))));
        assert!(source.resolve(TemplateCategory::Diagnoses, "Anemia").is_none());
    }

    #[test]
    fn test_list_templates() {
        let temp = template_dir();
        let dir = temp.path().join("physicalexam");
        fs::write(dir.join("day_2.docx"), docx_bytes(&["Day 2 exam"])).unwrap();
        fs::write(dir.join("day_1.txt"), "Day 1 exam").unwrap();
        fs::write(dir.join("day_1.docx"), docx_bytes(&["Day 1 exam"])).unwrap();
        fs::write(dir.join("README.md"), "ignored").unwrap();
        fs::write(dir.join("Bad Name.docx"), b"ignored").unwrap();

        let source = LocalFragmentSource::new(temp.path(), KeyStyle::Underscored).unwrap();
        let listings = source.list(TemplateCategory::PhysicalExam).unwrap();

        let labels: Vec<&str> = listings.iter().map(|l| l.label.as_str()).collect();
        assert_eq!(labels, vec!["Day 1", "Day 2"]);
        assert!(listings[0].location.ends_with("day_1.docx"));
    }

    #[test]
    fn test_list_missing_category_directory() {
        let temp = TempDir::new().unwrap();
        let source = LocalFragmentSource::new(temp.path(), KeyStyle::Compact).unwrap();

        let result = source.list(TemplateCategory::Diagnoses);
        assert!(matches!(result, Err(FragmentError::ListingUnavailable(_))));
    }
}
