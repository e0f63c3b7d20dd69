pub mod catalog;
pub mod fetcher;
pub mod paginator;
pub mod reader;

pub use catalog::CatalogClient;
pub use fetcher::{TextFetcher, TextSource};
pub use paginator::PagedText;
pub use reader::{LoadTicket, Reader, ReaderHandle, ReaderState};
