use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "storytime")]
#[command(about = "Browse and read public-domain books from the Gutendex catalog")]
#[command(version = "0.1.0")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Base URL of the Gutendex API
    #[arg(long, global = true, env = "GUTENDEX_URL", default_value = "https://gutendex.com")]
    pub api_url: String,

    /// Request timeout in seconds
    #[arg(long, global = true, default_value = "30")]
    pub timeout: u64,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List the most popular books
    Popular(PopularArgs),

    /// Search the catalog
    Search(SearchArgs),

    /// Read a book page by page
    Read(ReadArgs),
}

#[derive(Args)]
pub struct PopularArgs {
    /// Number of books to show
    #[arg(short, long, default_value = "20")]
    pub limit: usize,

    /// Print results as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args)]
pub struct SearchArgs {
    /// Free text query (title or author)
    #[arg(required = true, value_name = "QUERY")]
    pub query: String,

    /// Number of books to show
    #[arg(short, long, default_value = "10")]
    pub limit: usize,

    /// Print results as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args)]
pub struct ReadArgs {
    /// Catalog id of the book to read
    #[arg(long, value_name = "ID", conflicts_with = "url", required_unless_present = "url")]
    pub book: Option<u64>,

    /// Plain text URL to read directly
    #[arg(long, value_name = "URL")]
    pub url: Option<String>,

    /// Page to show (1-based)
    #[arg(short, long, default_value = "1")]
    pub page: i64,

    /// Characters per page
    #[arg(long, default_value = "5000")]
    pub page_size: usize,

    /// Navigate with n/p/g <page>/q on stdin
    #[arg(short, long)]
    pub interactive: bool,
}
