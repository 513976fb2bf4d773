//! Core runtime configuration.
//!
//! This module defines configuration that should be resolved once at process startup and then
//! passed into core services. Note assembly never reads process-wide environment variables, so
//! two requests with the same inputs always produce the same document.

use std::path::{Path, PathBuf};
use std::time::Duration;

use clinnote_types::{KeyStyle, NonEmptyText};

use crate::assembler::EmptyPlanPolicy;
use crate::constants::{
    DEFAULT_FETCH_TIMEOUT_SECS, DEFAULT_FONT_FAMILY, DEFAULT_FONT_SIZE_PT, DEFAULT_INTRO_TEXT,
    DEFAULT_LINE_HEIGHT_PT,
};
use crate::note::ValidationPolicy;
use crate::validation::validate_base_url;
use crate::{NoteError, NoteResult};

/// Font and spacing shared by every paragraph of a note.
#[derive(Clone, Debug, PartialEq)]
pub struct Typography {
    font_family: String,
    font_size_pt: f32,
    line_height_pt: f32,
}

impl Typography {
    /// Create a new `Typography`.
    ///
    /// # Errors
    ///
    /// Returns `NoteError::InvalidInput` for an empty family or a non-positive size.
    pub fn new(font_family: &str, font_size_pt: f32, line_height_pt: f32) -> NoteResult<Self> {
        if font_family.trim().is_empty() {
            return Err(NoteError::InvalidInput("font family cannot be empty".into()));
        }
        if !(font_size_pt > 0.0 && font_size_pt.is_finite()) {
            return Err(NoteError::InvalidInput(format!(
                "font size must be positive, got {}",
                font_size_pt
            )));
        }
        if !(line_height_pt > 0.0 && line_height_pt.is_finite()) {
            return Err(NoteError::InvalidInput(format!(
                "line height must be positive, got {}",
                line_height_pt
            )));
        }

        Ok(Self {
            font_family: font_family.trim().to_owned(),
            font_size_pt,
            line_height_pt,
        })
    }

    pub fn font_family(&self) -> &str {
        &self.font_family
    }

    pub fn font_size_pt(&self) -> f32 {
        self.font_size_pt
    }

    pub fn line_height_pt(&self) -> f32 {
        self.line_height_pt
    }
}

impl Default for Typography {
    fn default() -> Self {
        Self {
            font_family: DEFAULT_FONT_FAMILY.to_owned(),
            font_size_pt: DEFAULT_FONT_SIZE_PT,
            line_height_pt: DEFAULT_LINE_HEIGHT_PT,
        }
    }
}

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    template_dir: PathBuf,
    remote_base_url: Option<String>,
    remote_listing_url: Option<String>,
    fetch_timeout: Duration,
    typography: Typography,
    key_style: KeyStyle,
    intro_text: String,
    empty_plan: EmptyPlanPolicy,
    validation: ValidationPolicy,
}

impl CoreConfig {
    /// Create a new `CoreConfig` with default typography and policies.
    pub fn new(template_dir: PathBuf) -> Self {
        Self {
            template_dir,
            remote_base_url: None,
            remote_listing_url: None,
            fetch_timeout: Duration::from_secs(DEFAULT_FETCH_TIMEOUT_SECS),
            typography: Typography::default(),
            key_style: KeyStyle::default(),
            intro_text: DEFAULT_INTRO_TEXT.to_owned(),
            empty_plan: EmptyPlanPolicy::default(),
            validation: ValidationPolicy::default(),
        }
    }

    /// Configure the remote template store.
    ///
    /// # Errors
    ///
    /// Returns `NoteError::InvalidInput` if either URL is not a plain `http(s)://` URL.
    pub fn with_remote(mut self, base_url: &str, listing_url: Option<&str>) -> NoteResult<Self> {
        validate_base_url(base_url)?;
        if let Some(listing) = listing_url {
            validate_base_url(listing)?;
        }
        self.remote_base_url = Some(base_url.trim_end_matches('/').to_owned());
        self.remote_listing_url = listing_url.map(|url| url.trim_end_matches('/').to_owned());
        Ok(self)
    }

    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    pub fn with_typography(mut self, typography: Typography) -> Self {
        self.typography = typography;
        self
    }

    pub fn with_key_style(mut self, key_style: KeyStyle) -> Self {
        self.key_style = key_style;
        self
    }

    pub fn with_intro_text(mut self, intro_text: NonEmptyText) -> Self {
        self.intro_text = intro_text.as_str().to_owned();
        self
    }

    pub fn with_empty_plan_policy(mut self, policy: EmptyPlanPolicy) -> Self {
        self.empty_plan = policy;
        self
    }

    pub fn with_validation_policy(mut self, policy: ValidationPolicy) -> Self {
        self.validation = policy;
        self
    }

    pub fn template_dir(&self) -> &Path {
        &self.template_dir
    }

    pub fn remote_base_url(&self) -> Option<&str> {
        self.remote_base_url.as_deref()
    }

    pub fn remote_listing_url(&self) -> Option<&str> {
        self.remote_listing_url.as_deref()
    }

    pub fn fetch_timeout(&self) -> Duration {
        self.fetch_timeout
    }

    pub fn typography(&self) -> &Typography {
        &self.typography
    }

    pub fn key_style(&self) -> KeyStyle {
        self.key_style
    }

    pub fn intro_text(&self) -> &str {
        &self.intro_text
    }

    pub fn empty_plan_policy(&self) -> EmptyPlanPolicy {
        self.empty_plan
    }

    pub fn validation_policy(&self) -> ValidationPolicy {
        self.validation
    }
}

/// Treat a blank value as "not set".
fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Parse the remote fetch timeout (whole seconds) from an optional string value.
///
/// If `value` is `None` or empty/whitespace, returns the default of 10 seconds.
pub fn fetch_timeout_from_env_value(value: Option<String>) -> NoteResult<Duration> {
    match non_blank(value) {
        None => Ok(Duration::from_secs(DEFAULT_FETCH_TIMEOUT_SECS)),
        Some(v) => {
            let secs: u64 = v.parse().map_err(|_| {
                NoteError::InvalidInput(format!("fetch timeout must be whole seconds, got '{}'", v))
            })?;
            if secs == 0 {
                return Err(NoteError::InvalidInput(
                    "fetch timeout must be at least 1 second".into(),
                ));
            }
            Ok(Duration::from_secs(secs))
        }
    }
}

/// Parse the body font size in points from an optional string value.
///
/// If `value` is `None` or empty/whitespace, returns the default of 9pt.
pub fn font_size_from_env_value(value: Option<String>) -> NoteResult<f32> {
    match non_blank(value) {
        None => Ok(DEFAULT_FONT_SIZE_PT),
        Some(v) => v
            .parse::<f32>()
            .ok()
            .filter(|size| *size > 0.0 && size.is_finite())
            .ok_or_else(|| {
                NoteError::InvalidInput(format!("font size must be a positive number, got '{}'", v))
            }),
    }
}

/// Parse the preferred template key style from an optional string value.
///
/// If `value` is `None` or empty/whitespace, returns [`KeyStyle::Compact`].
pub fn key_style_from_env_value(value: Option<String>) -> NoteResult<KeyStyle> {
    let parsed = non_blank(value).map(|v| v.parse::<KeyStyle>()).transpose()?;
    Ok(parsed.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = CoreConfig::new(PathBuf::from("templates"));
        assert_eq!(config.fetch_timeout(), Duration::from_secs(10));
        assert_eq!(config.typography().font_family(), "Arial");
        assert_eq!(config.typography().font_size_pt(), 9.0);
        assert_eq!(config.typography().line_height_pt(), 12.0);
        assert_eq!(config.key_style(), KeyStyle::Compact);
        assert_eq!(config.empty_plan_policy(), EmptyPlanPolicy::Omit);
        assert!(config.remote_base_url().is_none());
    }

    #[test]
    fn test_with_remote_trims_trailing_slash() {
        let config = CoreConfig::new(PathBuf::from("templates"))
            .with_remote("https://example.org/templates/", None)
            .unwrap();
        assert_eq!(config.remote_base_url(), Some("https://example.org/templates"));
    }

    #[test]
    fn test_with_remote_rejects_bad_urls() {
        let config = CoreConfig::new(PathBuf::from("templates"));
        assert!(config.clone().with_remote("ftp://example.org", None).is_err());
        assert!(config
            .with_remote("https://example.org", Some("not a url"))
            .is_err());
    }

    #[test]
    fn test_typography_validation() {
        assert!(Typography::new("Arial", 9.0, 12.0).is_ok());
        assert!(Typography::new("  ", 9.0, 12.0).is_err());
        assert!(Typography::new("Arial", 0.0, 12.0).is_err());
        assert!(Typography::new("Arial", 9.0, f32::NAN).is_err());
    }

    #[test]
    fn test_fetch_timeout_from_env_value() {
        assert_eq!(
            fetch_timeout_from_env_value(None).unwrap(),
            Duration::from_secs(10)
        );
        assert_eq!(
            fetch_timeout_from_env_value(Some("  ".into())).unwrap(),
            Duration::from_secs(10)
        );
        assert_eq!(
            fetch_timeout_from_env_value(Some("3".into())).unwrap(),
            Duration::from_secs(3)
        );
        assert!(fetch_timeout_from_env_value(Some("0".into())).is_err());
        assert!(fetch_timeout_from_env_value(Some("ten".into())).is_err());
    }

    #[test]
    fn test_font_size_from_env_value() {
        assert_eq!(font_size_from_env_value(None).unwrap(), 9.0);
        assert_eq!(font_size_from_env_value(Some("10.5".into())).unwrap(), 10.5);
        assert!(font_size_from_env_value(Some("-1".into())).is_err());
    }

    #[test]
    fn test_key_style_from_env_value() {
        assert_eq!(key_style_from_env_value(None).unwrap(), KeyStyle::Compact);
        assert_eq!(
            key_style_from_env_value(Some("underscored".into())).unwrap(),
            KeyStyle::Underscored
        );
        assert!(key_style_from_env_value(Some("snake".into())).is_err());
    }
}
