//! Validated text primitives shared across the clinnote crates.
//!
//! - [`NonEmptyText`] for user-provided text that must carry content.
//! - [`TemplateKey`] for the storage key a human-readable template label maps to.

use std::str::FromStr;

/// Errors that can occur when creating validated text types.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TextError {
    /// The input text was empty or contained only whitespace
    #[error("Text cannot be empty")]
    Empty,

    /// The label contained no characters usable in a storage key
    #[error("Label '{0}' does not produce a usable template key")]
    InvalidKey(String),

    /// The key style name is not recognised
    #[error("Unknown key style '{0}' (expected 'compact' or 'underscored')")]
    UnknownKeyStyle(String),
}

/// A string type that guarantees non-empty content.
///
/// This type wraps a `String` and ensures it contains at least one non-whitespace character.
/// The input is automatically trimmed of leading and trailing whitespace during construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NonEmptyText(String);

impl NonEmptyText {
    /// Creates a new `NonEmptyText` from the given input.
    ///
    /// The input is trimmed of leading and trailing whitespace. If the trimmed
    /// result is empty, an error is returned.
    ///
    /// # Arguments
    ///
    /// * `input` - Any type that can be converted to a string reference
    ///
    /// # Returns
    ///
    /// Returns `Ok(NonEmptyText)` if the trimmed input is non-empty,
    /// or `Err(TextError::Empty)` if it's empty or contains only whitespace.
    pub fn new(input: impl AsRef<str>) -> Result<Self, TextError> {
        let trimmed = input.as_ref().trim();
        if trimmed.is_empty() {
            return Err(TextError::Empty);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Like [`NonEmptyText::new`], but maps blank input to `None` instead of an error.
    ///
    /// Optional form fields use this: a blank field means "not supplied".
    pub fn optional(input: Option<impl AsRef<str>>) -> Option<Self> {
        input.and_then(|s| Self::new(s).ok())
    }

    /// Returns the inner string as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for NonEmptyText {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for NonEmptyText {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl serde::Serialize for NonEmptyText {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> serde::Deserialize<'de> for NonEmptyText {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        NonEmptyText::new(&s).map_err(serde::de::Error::custom)
    }
}

/// How words of a label are joined when it is turned into a storage key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyStyle {
    /// Words are concatenated: `Vitamin D Deficiency` -> `vitaminddeficiency`.
    #[default]
    Compact,
    /// Words are joined with `_`: `Vitamin D Deficiency` -> `vitamin_d_deficiency`.
    Underscored,
}

impl KeyStyle {
    fn separator(self) -> &'static str {
        match self {
            KeyStyle::Compact => "",
            KeyStyle::Underscored => "_",
        }
    }

    fn other(self) -> Self {
        match self {
            KeyStyle::Compact => KeyStyle::Underscored,
            KeyStyle::Underscored => KeyStyle::Compact,
        }
    }
}

impl FromStr for KeyStyle {
    type Err = TextError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(KeyStyle::Compact),
            "underscored" | "underscore" => Ok(KeyStyle::Underscored),
            other => Err(TextError::UnknownKeyStyle(other.to_owned())),
        }
    }
}

/// Storage key for a template, derived from its human-readable label.
///
/// Keys are lower-case and contain only ASCII alphanumerics, `_` and `-`, so a key can be
/// joined onto a directory or URL without escaping and without any risk of traversal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TemplateKey(String);

impl TemplateKey {
    /// Normalises a label into a key using the given style.
    ///
    /// The label is lower-cased and split into words on whitespace and underscores.
    /// Characters outside `[a-z0-9-]` are dropped from each word.
    ///
    /// # Errors
    ///
    /// Returns `TextError::Empty` for a blank label and `TextError::InvalidKey` when no
    /// usable characters remain.
    pub fn new(label: &str, style: KeyStyle) -> Result<Self, TextError> {
        if label.trim().is_empty() {
            return Err(TextError::Empty);
        }

        let words: Vec<String> = label
            .split(|c: char| c.is_whitespace() || c == '_')
            .map(|word| {
                word.chars()
                    .filter(|c| c.is_ascii_alphanumeric() || *c == '-')
                    .map(|c| c.to_ascii_lowercase())
                    .collect::<String>()
            })
            .filter(|word| !word.is_empty())
            .collect();

        if words.is_empty() {
            return Err(TextError::InvalidKey(label.to_owned()));
        }

        Ok(Self(words.join(style.separator())))
    }

    /// Returns the lookup candidates for a label: the preferred style first, then the other.
    ///
    /// Single-word labels produce one candidate since both styles agree.
    pub fn candidates(label: &str, preferred: KeyStyle) -> Result<Vec<Self>, TextError> {
        let first = Self::new(label, preferred)?;
        let second = Self::new(label, preferred.other())?;

        let mut keys = vec![first];
        if !keys.contains(&second) {
            keys.push(second);
        }
        Ok(keys)
    }

    /// Accepts a key that is already in storage form, such as a template file stem.
    ///
    /// Unlike [`TemplateKey::new`] this never rewrites the input; it only checks it.
    pub fn parse(key: &str) -> Result<Self, TextError> {
        if key.is_empty() {
            return Err(TextError::Empty);
        }
        let valid = key
            .bytes()
            .all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'z' | b'_' | b'-'));
        if !valid {
            return Err(TextError::InvalidKey(key.to_owned()));
        }
        Ok(Self(key.to_owned()))
    }

    /// Returns the key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Best-effort human label for a key.
    ///
    /// `vitamin_d_deficiency` becomes `Vitamin D Deficiency`. Compact keys have lost their word
    /// boundaries, so only the first letter is capitalised.
    pub fn to_label(&self) -> String {
        self.0
            .split(['_', '-'])
            .filter(|word| !word.is_empty())
            .map(|word| {
                let mut chars = word.chars();
                match chars.next() {
                    Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
                    None => String::new(),
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl std::fmt::Display for TemplateKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for TemplateKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_empty_text_trims() {
        let text = NonEmptyText::new("  Sepsis \n").unwrap();
        assert_eq!(text.as_str(), "Sepsis");
    }

    #[test]
    fn test_non_empty_text_rejects_whitespace() {
        assert_eq!(NonEmptyText::new(" \t\n "), Err(TextError::Empty));
    }

    #[test]
    fn test_non_empty_text_optional() {
        assert!(NonEmptyText::optional(Some("   ")).is_none());
        assert!(NonEmptyText::optional(None::<&str>).is_none());
        assert_eq!(
            NonEmptyText::optional(Some("12B")).map(|t| t.to_string()),
            Some("12B".to_string())
        );
    }

    #[test]
    fn test_non_empty_text_deserialize_rejects_blank() {
        let result: Result<NonEmptyText, _> = serde_json::from_str("\"  \"");
        assert!(result.is_err());
    }

    #[test]
    fn test_template_key_compact() {
        let key = TemplateKey::new("Vitamin D Deficiency", KeyStyle::Compact).unwrap();
        assert_eq!(key.as_str(), "vitaminddeficiency");
    }

    #[test]
    fn test_template_key_underscored() {
        let key = TemplateKey::new("Vitamin D Deficiency", KeyStyle::Underscored).unwrap();
        assert_eq!(key.as_str(), "vitamin_d_deficiency");
    }

    #[test]
    fn test_template_key_collapses_mixed_separators() {
        let key = TemplateKey::new("  Status__Asthmaticus  ", KeyStyle::Underscored).unwrap();
        assert_eq!(key.as_str(), "status_asthmaticus");
    }

    #[test]
    fn test_template_key_strips_path_characters() {
        let key = TemplateKey::new("../../etc/passwd", KeyStyle::Compact).unwrap();
        assert_eq!(key.as_str(), "etcpasswd");
    }

    #[test]
    fn test_template_key_rejects_unusable_label() {
        assert!(matches!(
            TemplateKey::new("%%%", KeyStyle::Compact),
            Err(TextError::InvalidKey(_))
        ));
        assert_eq!(
            TemplateKey::new("   ", KeyStyle::Compact),
            Err(TextError::Empty)
        );
    }

    #[test]
    fn test_template_key_candidates_order_and_dedup() {
        let keys = TemplateKey::candidates("At risk for malnutrition", KeyStyle::Underscored)
            .unwrap();
        let keys: Vec<&str> = keys.iter().map(|k| k.as_str()).collect();
        assert_eq!(keys, vec!["at_risk_for_malnutrition", "atriskformalnutrition"]);

        let single = TemplateKey::candidates("Anemia", KeyStyle::Compact).unwrap();
        assert_eq!(single.len(), 1);
    }

    #[test]
    fn test_template_key_parse() {
        assert!(TemplateKey::parse("day_1").is_ok());
        assert!(TemplateKey::parse("Day 1").is_err());
        assert!(TemplateKey::parse("../x").is_err());
    }

    #[test]
    fn test_template_key_label() {
        let key = TemplateKey::parse("vitamin_d_deficiency").unwrap();
        assert_eq!(key.to_label(), "Vitamin D Deficiency");

        let compact = TemplateKey::parse("sepsis").unwrap();
        assert_eq!(compact.to_label(), "Sepsis");
    }

    #[test]
    fn test_key_style_from_str() {
        assert_eq!("Compact".parse::<KeyStyle>().unwrap(), KeyStyle::Compact);
        assert_eq!(
            "underscored".parse::<KeyStyle>().unwrap(),
            KeyStyle::Underscored
        );
        assert!("dashed".parse::<KeyStyle>().is_err());
    }
}
