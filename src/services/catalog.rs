use crate::error::{Result, StorytimeError};
use crate::types::{Book, BookList, CatalogConfig};
use reqwest::{Client, StatusCode};
use tracing::{debug, info};
use url::Url;

/// Client for the Gutendex book catalog.
#[derive(Debug, Clone)]
pub struct CatalogClient {
    client: Client,
    config: CatalogConfig,
}

impl CatalogClient {
    pub fn new(config: CatalogConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!(
                env!("CARGO_PKG_NAME"),
                "/",
                env!("CARGO_PKG_VERSION")
            ))
            .timeout(config.timeout)
            .build()?;

        Ok(Self { client, config })
    }

    /// Most downloaded books, in catalog order.
    pub async fn popular(&self, limit: Option<usize>) -> Result<Vec<Book>> {
        let limit = limit.unwrap_or(self.config.popular_limit);
        let mut url = self.books_url()?;
        url.query_pairs_mut().append_pair("sort", "popular");

        info!("Fetching popular books");
        let mut books = self.fetch_list(url).await?.results;
        books.truncate(limit);
        Ok(books)
    }

    /// Books matching `query`, unfiltered and in catalog order.
    pub async fn search(&self, query: &str, limit: Option<usize>) -> Result<Vec<Book>> {
        let limit = limit.unwrap_or(self.config.search_limit);
        let mut url = self.books_url()?;
        url.query_pairs_mut().append_pair("search", query);

        info!("Searching books for: {}", query);
        let mut books = self.fetch_list(url).await?.results;
        books.truncate(limit);
        debug!("Search for '{}' returned {} books", query, books.len());
        Ok(books)
    }

    pub async fn book(&self, id: u64) -> Result<Book> {
        let url = self.config.base_url.join(&format!("books/{}", id))?;
        info!("Fetching book {}", id);

        let response = self.client.get(url).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(StorytimeError::BookNotFound { id });
        }
        if !response.status().is_success() {
            return Err(StorytimeError::HttpStatus {
                status: response.status().as_u16(),
            });
        }

        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }

    fn books_url(&self) -> Result<Url> {
        Ok(self.config.base_url.join("books/")?)
    }

    async fn fetch_list(&self, url: Url) -> Result<BookList> {
        debug!("GET {}", url);
        let response = self.client.get(url).send().await?;

        if !response.status().is_success() {
            return Err(StorytimeError::HttpStatus {
                status: response.status().as_u16(),
            });
        }

        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }
}
