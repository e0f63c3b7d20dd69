//! # Storytime
//!
//! Browse the Gutendex catalog of public-domain books and read their plain
//! text editions in fixed-size pages.
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use storytime::{CatalogClient, CatalogConfig, LaunchTarget, Reader, ReaderConfig, TextFetcher};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Pick a book from the popular feed
//!     let catalog = CatalogClient::new(CatalogConfig::default())?;
//!     let books = catalog.popular(None).await?;
//!
//!     if let Some(LaunchTarget::Reader(resource)) = books.first().map(|b| b.launch_target()) {
//!         let config = ReaderConfig::default();
//!         let fetcher = TextFetcher::new(&config)?;
//!         let mut reader = Reader::new(config)?;
//!
//!         let view = reader.open(&fetcher, resource).await;
//!         println!("{}", view.page_label());
//!
//!         reader.next_page();
//!         println!("{}", reader.current_page());
//!         reader.close();
//!     }
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod services;
pub mod types;

// Re-export main types and services for easier usage
pub use error::{Result, StorytimeError};
pub use services::{
    CatalogClient, LoadTicket, PagedText, Reader, ReaderHandle, ReaderState, TextFetcher,
    TextSource,
};
pub use types::{
    Author, Book, BookList, CatalogConfig, ContentStatus, LaunchTarget, PageChange, ReaderConfig,
    ReaderView, TextResource, DEFAULT_PAGE_SIZE, LOAD_FAILED_MESSAGE,
};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
