use anyhow::Result;
use clap::Parser;
use std::io;
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

mod client;
mod generate;
mod scrape;
mod types;
mod utils;

use client::HttpClient;
use scrape::{run_scrape, ScrapeConfig};
use utils::osc8_file_link;

/// Largest page size the products endpoint accepts
pub const MAX_PAGE_SIZE: u32 = 30;
pub const IMAGE_RETRIES: u32 = 3;
pub const IMAGE_RETRY_DELAY: Duration = Duration::from_secs(5);

#[derive(Parser)]
#[command(name = "storefront-gallery")]
#[command(about = "Scrape a storefront catalog into a local, filterable HTML gallery")]
struct Cli {
    /// Storefront base URL (e.g. https://shop.example.com)
    #[arg(value_name = "BASE_URL")]
    base_url: String,
    /// Directory receiving images/ and index.html
    #[arg(short, long, default_value = ".")]
    out_dir: PathBuf,
    /// Products per page request
    #[arg(short, long, default_value_t = MAX_PAGE_SIZE,
          value_parser = clap::value_parser!(u32).range(1..=MAX_PAGE_SIZE as i64))]
    limit: u32,
    /// Maximum number of pages to fetch per collection
    #[arg(short, long, value_parser = clap::value_parser!(u32).range(1..))]
    page_limit: Option<u32>,
    /// Page title
    #[arg(short, long, default_value = "Collections")]
    title: String,
    /// Quiet mode - suppress progress output
    #[arg(short, long)]
    quiet: bool,
    /// Enable debug logging
    #[arg(short, long, conflicts_with = "quiet")]
    verbose: bool,
}

impl Cli {
    fn scrape_config(&self) -> ScrapeConfig {
        ScrapeConfig {
            base_url: self.base_url.clone(),
            out_dir: self.out_dir.clone(),
            page_size: self.limit,
            page_limit: self.page_limit,
            title: self.title.clone(),
            retries: IMAGE_RETRIES,
            retry_delay: IMAGE_RETRY_DELAY,
            show_progress: !self.quiet,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .with_writer(io::stdout)
        .init();

    let client = HttpClient::new()?;
    let (path, summary) = run_scrape(&client, &cli.scrape_config())?;

    if !cli.quiet {
        println!(
            "Done! {} products from {} collections over {} page requests ({} images downloaded, {} already present, {} failed). Wrote {}",
            summary.products,
            summary.collections,
            summary.pages,
            summary.downloaded,
            summary.skipped,
            summary.failed,
            osc8_file_link(&path, &path.to_string_lossy())
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["storefront-gallery", "https://shop.example.com"]).unwrap();
        let config = cli.scrape_config();
        assert_eq!(config.page_size, 30);
        assert_eq!(config.page_limit, None);
        assert_eq!(config.retries, 3);
        assert_eq!(config.retry_delay, Duration::from_secs(5));
        assert_eq!(config.out_dir, PathBuf::from("."));
        assert!(config.show_progress);
    }

    #[test]
    fn test_page_size_capped_at_thirty() {
        assert!(Cli::try_parse_from(["storefront-gallery", "https://x", "--limit", "31"]).is_err());
        assert!(Cli::try_parse_from(["storefront-gallery", "https://x", "--limit", "0"]).is_err());
        let cli = Cli::try_parse_from(["storefront-gallery", "https://x", "-l", "10", "-p", "1", "-q"]).unwrap();
        let config = cli.scrape_config();
        assert_eq!(config.page_size, 10);
        assert_eq!(config.page_limit, Some(1));
        assert!(!config.show_progress);
    }

    #[test]
    fn test_page_limit_must_be_positive() {
        assert!(Cli::try_parse_from(["storefront-gallery", "https://x", "--page-limit", "0"]).is_err());
    }
}
