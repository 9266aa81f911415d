//! Page fetchers: the capability that yields an authenticated page for a URL.

use std::io::ErrorKind;
use std::path::PathBuf;
use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::COOKIE;
use reqwest::{StatusCode, Url};
use tracing::{debug, warn};

use super::RawPageContent;
use crate::error::FetchError;
use crate::models::config::FetchConfig;

/// Yields the signature-bearing content of a document page.
///
/// Implementations own whatever session makes the page readable; callers
/// only ever hand them a URL.
pub trait PageFetcher {
    /// Load the page at `document_url` and slice out its content.
    fn fetch(&self, document_url: &str) -> Result<RawPageContent, FetchError>;
}

impl<F: PageFetcher + ?Sized> PageFetcher for &F {
    fn fetch(&self, document_url: &str) -> Result<RawPageContent, FetchError> {
        (**self).fetch(document_url)
    }
}

impl<F: PageFetcher + ?Sized> PageFetcher for Box<F> {
    fn fetch(&self, document_url: &str) -> Result<RawPageContent, FetchError> {
        (**self).fetch(document_url)
    }
}

/// Fetches pages over HTTP, authenticated with a session cookie.
pub struct HttpPageFetcher {
    client: Client,
    config: FetchConfig,
    cookie: Option<String>,
}

impl HttpPageFetcher {
    /// Create a fetcher; `cookie` is sent verbatim as the `Cookie` header.
    pub fn new(config: FetchConfig, cookie: Option<String>) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| FetchError::Navigation(format!("failed to create HTTP client: {}", e)))?;

        if cookie.is_none() {
            warn!("No session cookie configured, pages behind login will be denied");
        }

        Ok(Self {
            client,
            config,
            cookie,
        })
    }
}

impl PageFetcher for HttpPageFetcher {
    fn fetch(&self, document_url: &str) -> Result<RawPageContent, FetchError> {
        debug!("Navigating to {}", document_url);

        let mut request = self.client.get(document_url);
        if let Some(cookie) = &self.cookie {
            request = request.header(COOKIE, cookie);
        }

        let response = request.send().map_err(|e| classify(document_url, e))?;
        let final_url = response.url().to_string();

        if final_url.contains(&self.config.login_marker) {
            return Err(FetchError::AccessDenied(format!(
                "redirected to login page: {}",
                final_url
            )));
        }

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(FetchError::AccessDenied(format!("{}: HTTP {}", document_url, status)));
        }
        if !status.is_success() {
            return Err(FetchError::Navigation(format!("{}: HTTP {}", document_url, status)));
        }

        if !final_url.contains(&self.config.document_marker) {
            warn!("Unexpected URL after navigation: {}", final_url);
        }

        let html = response.text().map_err(|e| classify(document_url, e))?;
        Ok(RawPageContent::from_page_html(&html))
    }
}

fn classify(document_url: &str, err: reqwest::Error) -> FetchError {
    if err.is_timeout() {
        FetchError::Timeout(document_url.to_string())
    } else {
        FetchError::Navigation(format!("{}: {}", document_url, err))
    }
}

/// Serves pages saved from an authenticated browser session.
///
/// A URL maps to `<dir>/<key>.html`, where the key is the URL's `id` query
/// parameter or, failing that, its last path segment.
pub struct DirectoryPageFetcher {
    dir: PathBuf,
}

impl DirectoryPageFetcher {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Path of the saved page for `document_url`.
    pub fn page_path(&self, document_url: &str) -> Result<PathBuf, FetchError> {
        let key = page_key(document_url)?;
        Ok(self.dir.join(format!("{}.html", key)))
    }
}

impl PageFetcher for DirectoryPageFetcher {
    fn fetch(&self, document_url: &str) -> Result<RawPageContent, FetchError> {
        let path = self.page_path(document_url)?;
        debug!("Reading saved page {}", path.display());

        let html = std::fs::read_to_string(&path).map_err(|e| match e.kind() {
            ErrorKind::PermissionDenied => {
                FetchError::AccessDenied(format!("{}: {}", path.display(), e))
            }
            ErrorKind::NotFound => {
                FetchError::Navigation(format!("no saved page at {}", path.display()))
            }
            _ => FetchError::Navigation(format!("{}: {}", path.display(), e)),
        })?;

        Ok(RawPageContent::from_page_html(&html))
    }
}

fn page_key(document_url: &str) -> Result<String, FetchError> {
    let url = Url::parse(document_url)
        .map_err(|e| FetchError::Navigation(format!("invalid URL {}: {}", document_url, e)))?;

    if let Some((_, id)) = url.query_pairs().find(|(k, _)| k == "id") {
        if !id.is_empty() {
            return Ok(sanitize_key(&id));
        }
    }

    url.path_segments()
        .and_then(|segments| segments.filter(|s| !s.is_empty()).last())
        .map(sanitize_key)
        .ok_or_else(|| FetchError::Navigation(format!("no page key in {}", document_url)))
}

fn sanitize_key(key: &str) -> String {
    key.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect()
}
