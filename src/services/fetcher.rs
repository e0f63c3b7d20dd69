use crate::error::{Result, StorytimeError};
use crate::types::{ReaderConfig, TextResource};
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use tracing::{debug, info};

/// Anything that can dereference a [`TextResource`] into its full text.
#[async_trait]
pub trait TextSource: Send + Sync {
    async fn fetch_text(&self, resource: &TextResource) -> Result<String>;
}

/// Retrieves plain text documents with a single unauthenticated GET.
#[derive(Debug, Clone)]
pub struct TextFetcher {
    client: Client,
}

impl TextFetcher {
    pub fn new(config: &ReaderConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!(
                env!("CARGO_PKG_NAME"),
                "/",
                env!("CARGO_PKG_VERSION")
            ))
            .timeout(config.timeout)
            .build()?;

        Ok(Self { client })
    }

    fn is_text(content_type: &str) -> bool {
        content_type.trim_start().to_ascii_lowercase().starts_with("text/")
    }
}

#[async_trait]
impl TextSource for TextFetcher {
    async fn fetch_text(&self, resource: &TextResource) -> Result<String> {
        info!("Fetching book text from: {}", resource);

        let response = self.client.get(resource.url().clone()).send().await?;

        if !response.status().is_success() {
            return Err(StorytimeError::HttpStatus {
                status: response.status().as_u16(),
            });
        }

        if let Some(content_type) = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
        {
            if !Self::is_text(content_type) {
                return Err(StorytimeError::NotText {
                    content_type: content_type.to_string(),
                });
            }
        }

        let text = response.text().await?;
        debug!("Fetched {} bytes from {}", text.len(), resource);

        Ok(text)
    }
}
