use crate::error::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;
use url::Url;

/// Default number of characters per page.
pub const DEFAULT_PAGE_SIZE: usize = 5000;

/// Content shown on the single page of a reader whose load failed.
pub const LOAD_FAILED_MESSAGE: &str = "Error loading book content. Please try again.";

pub const DEFAULT_CATALOG_URL: &str = "https://gutendex.com";

/// Plain text formats in order of preference.
pub const PLAIN_TEXT_FORMATS: [&str; 2] = [
    "text/plain; charset=utf-8",
    "text/plain; charset=us-ascii",
];

/// Formats handed to an external viewer when no plain text exists.
pub const EXTERNAL_FORMATS: [&str; 2] = ["text/html", "application/pdf"];

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Author {
    pub name: String,
    #[serde(default)]
    pub birth_year: Option<i32>,
    #[serde(default)]
    pub death_year: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Book {
    pub id: u64,
    pub title: String,
    #[serde(default)]
    pub authors: Vec<Author>,
    #[serde(default)]
    pub subjects: Vec<String>,
    #[serde(default)]
    pub download_count: u64,
    #[serde(default)]
    pub formats: BTreeMap<String, String>,
}

impl Book {
    pub fn author_names(&self) -> String {
        self.authors
            .iter()
            .map(|a| a.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// First available plain text format, utf-8 before us-ascii.
    pub fn plain_text_resource(&self) -> Option<TextResource> {
        PLAIN_TEXT_FORMATS
            .iter()
            .filter_map(|format| self.formats.get(*format))
            .find_map(|link| TextResource::parse(link).ok())
    }

    pub fn external_link(&self) -> Option<Url> {
        EXTERNAL_FORMATS
            .iter()
            .filter_map(|format| self.formats.get(*format))
            .find_map(|link| Url::parse(link).ok())
    }

    pub fn launch_target(&self) -> LaunchTarget {
        if let Some(resource) = self.plain_text_resource() {
            LaunchTarget::Reader(resource)
        } else if let Some(link) = self.external_link() {
            LaunchTarget::External(link)
        } else {
            LaunchTarget::Unavailable
        }
    }
}

/// What to do when a book is picked from a list.
#[derive(Debug, Clone, PartialEq)]
pub enum LaunchTarget {
    Reader(TextResource),
    External(Url),
    Unavailable,
}

/// One page of a Gutendex `/books/` listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookList {
    #[serde(default)]
    pub count: u64,
    #[serde(default)]
    pub next: Option<String>,
    #[serde(default)]
    pub previous: Option<String>,
    #[serde(default)]
    pub results: Vec<Book>,
}

/// Locator of a plain text document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextResource(Url);

impl TextResource {
    pub fn parse(link: &str) -> Result<Self> {
        Ok(Self(Url::parse(link)?))
    }

    pub fn url(&self) -> &Url {
        &self.0
    }
}

impl fmt::Display for TextResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct ReaderConfig {
    pub page_size: usize,
    pub timeout: Duration,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            timeout: Duration::from_secs(30),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CatalogConfig {
    pub base_url: Url,
    pub popular_limit: usize,
    pub search_limit: usize,
    pub timeout: Duration,
}

impl CatalogConfig {
    /// The base URL always ends with `/`, so endpoint joins extend its path.
    pub fn with_base_url(base_url: &str) -> Result<Self> {
        let mut base_url = Url::parse(base_url)?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        Ok(Self {
            base_url,
            ..Self::default()
        })
    }
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            base_url: Url::parse(DEFAULT_CATALOG_URL).expect("default catalog url is valid"),
            popular_limit: 20,
            search_limit: 10,
            timeout: Duration::from_secs(30),
        }
    }
}

/// Outcome kind of the reader's content, so callers never compare strings.
#[derive(Debug, Clone, PartialEq)]
pub enum ContentStatus {
    Idle,
    Loading,
    Text,
    Failed { reason: String },
}

/// Everything a caller needs to render the reader.
#[derive(Debug, Clone, PartialEq)]
pub struct ReaderView {
    pub loading: bool,
    pub status: ContentStatus,
    pub current_page_content: String,
    pub current_page_index: usize,
    pub total_pages: usize,
    pub has_previous: bool,
    pub has_next: bool,
    pub scroll_offset: usize,
    pub loaded_at: Option<DateTime<Utc>>,
}

impl ReaderView {
    /// Header line, e.g. "Page 1 of 3".
    pub fn page_label(&self) -> String {
        format!("Page {} of {}", self.current_page_index + 1, self.total_pages)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageChange {
    pub index: usize,
    pub changed: bool,
}
