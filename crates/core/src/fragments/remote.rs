//! Templates published under a remote base URL.
//!
//! A template lives at `<base_url>/<category>/<key>.docx` and is fetched with a single HTTP GET.
//! The response body is decoded in memory. Listings come from a repository contents API that
//! answers `<listing_url>/<category>` with a JSON array of `{name, type, download_url}` objects.

use std::io::Read;
use std::time::Duration;

use clinnote_docx::read_paragraphs;
use clinnote_types::{KeyStyle, TemplateKey};
use serde::Deserialize;

use super::{Fragment, FragmentSource, Origin, OriginKind, TemplateCategory, TemplateListing};
use crate::config::CoreConfig;
use crate::constants::{MAX_TEMPLATE_BYTES, TEMPLATE_EXTENSION};
use crate::error::{FragmentError, FragmentResult, NoteError, NoteResult};

/// Raw response from a template store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

/// Performs one GET against the template store.
///
/// Split out from [`RemoteFragmentSource`] so tests can simulate responses without a network.
pub trait TemplateTransport {
    fn get(&self, url: &str) -> FragmentResult<TransportResponse>;
}

/// Blocking HTTP transport with a bounded timeout.
pub struct HttpTransport {
    client: reqwest::blocking::Client,
    timeout: Duration,
}

impl HttpTransport {
    /// Creates a transport whose requests give up after `timeout`.
    ///
    /// # Errors
    ///
    /// Returns `NoteError::HttpClient` if the TLS backend cannot be initialised.
    pub fn new(timeout: Duration) -> NoteResult<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("clinnote/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| NoteError::HttpClient(e.to_string()))?;

        Ok(Self { client, timeout })
    }
}

impl TemplateTransport for HttpTransport {
    fn get(&self, url: &str) -> FragmentResult<TransportResponse> {
        let response = self.client.get(url).send().map_err(|e| {
            if e.is_timeout() {
                FragmentError::Transport(format!(
                    "request to {} timed out after {}s",
                    url,
                    self.timeout.as_secs()
                ))
            } else {
                FragmentError::Transport(e.to_string())
            }
        })?;

        let status = response.status().as_u16();
        let limit = MAX_TEMPLATE_BYTES as u64;
        if response.content_length().is_some_and(|length| length > limit) {
            return Err(oversized(url));
        }

        let body = read_capped(response, limit)
            .map_err(|e| FragmentError::Transport(e.to_string()))?;
        if body.len() as u64 > limit {
            return Err(oversized(url));
        }

        Ok(TransportResponse { status, body })
    }
}

fn oversized(url: &str) -> FragmentError {
    FragmentError::Transport(format!(
        "response from {} exceeds {} bytes",
        url, MAX_TEMPLATE_BYTES
    ))
}

/// Reads at most `limit` bytes plus one, so an oversized body is detected without buffering it.
fn read_capped(reader: impl Read, limit: u64) -> std::io::Result<Vec<u8>> {
    let mut body = Vec::new();
    reader.take(limit + 1).read_to_end(&mut body)?;
    Ok(body)
}

/// Entry of a repository contents listing.
#[derive(Debug, Deserialize)]
struct ListingEntry {
    name: String,
    #[serde(rename = "type", default)]
    entry_type: Option<String>,
    #[serde(default)]
    download_url: Option<String>,
}

/// Fragment source backed by a remote template store.
pub struct RemoteFragmentSource<T: TemplateTransport = HttpTransport> {
    base_url: String,
    listing_url: Option<String>,
    key_style: KeyStyle,
    transport: T,
}

impl RemoteFragmentSource<HttpTransport> {
    /// Builds an HTTP-backed source from the remote settings in `config`.
    ///
    /// # Errors
    ///
    /// Returns `NoteError::InvalidInput` when no remote template store is configured.
    pub fn from_config(config: &CoreConfig) -> NoteResult<Self> {
        let base_url = config.remote_base_url().ok_or_else(|| {
            NoteError::InvalidInput("remote template store is not configured".into())
        })?;
        let transport = HttpTransport::new(config.fetch_timeout())?;

        Ok(Self::new(
            base_url,
            config.remote_listing_url().map(str::to_owned),
            config.key_style(),
            transport,
        ))
    }
}

impl<T: TemplateTransport> RemoteFragmentSource<T> {
    pub fn new(
        base_url: impl Into<String>,
        listing_url: Option<String>,
        key_style: KeyStyle,
        transport: T,
    ) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_owned(),
            listing_url: listing_url.map(|url| url.trim_end_matches('/').to_owned()),
            key_style,
            transport,
        }
    }

    fn template_url(&self, category: TemplateCategory, key: &TemplateKey) -> String {
        format!(
            "{}/{}/{}.{}",
            self.base_url,
            category.subpath(),
            key,
            TEMPLATE_EXTENSION
        )
    }

    fn get_success(&self, url: &str) -> FragmentResult<Vec<u8>> {
        let response = self.transport.get(url)?;
        if !(200..300).contains(&response.status) {
            return Err(FragmentError::HttpStatus {
                url: url.to_owned(),
                status: response.status,
            });
        }
        Ok(response.body)
    }
}

impl<T: TemplateTransport> FragmentSource for RemoteFragmentSource<T> {
    fn origin_kind(&self) -> OriginKind {
        OriginKind::Remote
    }

    fn key_style(&self) -> KeyStyle {
        self.key_style
    }

    fn fetch(&self, category: TemplateCategory, key: &TemplateKey) -> FragmentResult<Fragment> {
        let url = self.template_url(category, key);
        let body = self.get_success(&url)?;
        let paragraphs = read_paragraphs(&body).map_err(FragmentError::Malformed)?;

        Ok(Fragment {
            name: key.to_string(),
            origin: Origin::Remote(url),
            paragraphs,
        })
    }

    fn list(&self, category: TemplateCategory) -> FragmentResult<Vec<TemplateListing>> {
        let listing_url = self.listing_url.as_deref().ok_or_else(|| {
            FragmentError::ListingUnavailable("no listing URL configured".into())
        })?;
        let url = format!("{}/{}", listing_url, category.subpath());

        let body = self.get_success(&url)?;
        let entries: Vec<ListingEntry> = serde_json::from_slice(&body).map_err(|e| {
            FragmentError::ListingUnavailable(format!("invalid listing from {}: {}", url, e))
        })?;

        let suffix = format!(".{}", TEMPLATE_EXTENSION);
        let mut listings: Vec<TemplateListing> = entries
            .into_iter()
            .filter(|entry| entry.entry_type.as_deref().unwrap_or("file") == "file")
            .filter_map(|entry| {
                let stem = entry.name.strip_suffix(&suffix)?;
                let key = TemplateKey::parse(stem).ok()?;
                let location = entry
                    .download_url
                    .unwrap_or_else(|| self.template_url(category, &key));
                Some(TemplateListing {
                    label: key.to_label(),
                    key,
                    location,
                })
            })
            .collect();

        listings.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(listings)
    }
}
