use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use std::fs;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::client::{Fetch, Storefront};
use crate::generate::{write_page, PageBuilder, IMAGES_DIR};
use crate::types::{is_safe_handle, Collection, Product};

/// Settings for one scrape run
#[derive(Debug, Clone)]
pub struct ScrapeConfig {
    pub base_url: String,
    pub out_dir: PathBuf,
    /// Products per page request (the API caps this at 30)
    pub page_size: u32,
    /// Stop after this many pages per collection
    pub page_limit: Option<u32>,
    pub title: String,
    /// Extra attempts after the first failed image request
    pub retries: u32,
    pub retry_delay: Duration,
    pub show_progress: bool,
}

#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("request failed after {attempts} attempts: {source}")]
    Transport {
        attempts: u32,
        #[source]
        source: anyhow::Error,
    },
    #[error("HTTP {status} after {attempts} attempts")]
    Status { status: u16, attempts: u32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageOutcome {
    /// File already on disk
    Skipped,
    Downloaded,
    /// Gave up; the page still references the file
    Failed,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ScrapeSummary {
    pub collections: usize,
    pub pages: usize,
    pub products: usize,
    pub downloaded: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl ScrapeSummary {
    fn record(&mut self, outcome: ImageOutcome) {
        match outcome {
            ImageOutcome::Skipped => self.skipped += 1,
            ImageOutcome::Downloaded => self.downloaded += 1,
            ImageOutcome::Failed => self.failed += 1,
        }
    }
}

/// Fetch `url`, retrying transport errors and non-success statuses with a fixed delay
pub fn fetch_with_retry<F: Fetch>(
    fetcher: &F,
    url: &str,
    retries: u32,
    delay: Duration,
) -> std::result::Result<Vec<u8>, DownloadError> {
    let mut attempt = 0;
    loop {
        attempt += 1;
        let failure = match fetcher.get(url) {
            Ok(response) if response.is_success() => return Ok(response.body),
            Ok(response) => DownloadError::Status {
                status: response.status,
                attempts: attempt,
            },
            Err(e) => DownloadError::Transport {
                attempts: attempt,
                source: e,
            },
        };

        if attempt > retries {
            return Err(failure);
        }
        warn!(url, attempt, "image request failed ({}), retrying", failure);
        thread::sleep(delay);
    }
}

/// Download one product image into `dir` unless a file with that name already exists
pub fn download_image<F: Fetch>(
    fetcher: &F,
    config: &ScrapeConfig,
    dir: &Path,
    product: &Product,
    index: usize,
    url: &str,
) -> Result<ImageOutcome> {
    let path = dir.join(product.image_filename(index));
    if path.exists() {
        debug!(path = %path.display(), "image already downloaded");
        return Ok(ImageOutcome::Skipped);
    }

    match fetch_with_retry(fetcher, url, config.retries, config.retry_delay) {
        Ok(bytes) => {
            fs::write(&path, &bytes)
                .with_context(|| format!("Failed to write image: {}", path.display()))?;
            Ok(ImageOutcome::Downloaded)
        }
        Err(e) => {
            error!("Error downloading image ({}): {} ({})", product.title, url, e);
            Ok(ImageOutcome::Failed)
        }
    }
}

/// Create `images/` and one folder per collection
pub fn init_image_dirs(out_dir: &Path, collections: &[Collection]) -> Result<PathBuf> {
    let images_dir = out_dir.join(IMAGES_DIR);
    fs::create_dir_all(&images_dir)
        .with_context(|| format!("Failed to create {}", images_dir.display()))?;
    for collection in collections {
        let dir = images_dir.join(&collection.handle);
        fs::create_dir_all(&dir).with_context(|| format!("Failed to create {}", dir.display()))?;
    }
    Ok(images_dir)
}

fn page_progress(config: &ScrapeConfig, collection: &Collection, page: u32, len: usize) -> ProgressBar {
    if !config.show_progress {
        return ProgressBar::hidden();
    }
    let bar = ProgressBar::new(len as u64);
    bar.set_style(
        ProgressStyle::with_template("{prefix:.bold} [{bar:40.green/238}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▉▊▋▌▍▎▏  "),
    );
    bar.set_prefix(format!("Collection: {}, Page: {}", collection.title, page));
    bar
}

/// Page through one collection, downloading images and appending cards
fn scrape_collection<F: Fetch>(
    shop: &Storefront<F>,
    config: &ScrapeConfig,
    images_dir: &Path,
    collection: &Collection,
    page_html: &mut PageBuilder,
    summary: &mut ScrapeSummary,
) -> Result<()> {
    let dir = images_dir.join(&collection.handle);
    let mut page = 1;

    loop {
        let products = shop
            .products(&collection.handle, page, config.page_size)
            .with_context(|| format!("Failed to fetch products for '{}'", collection.handle))?;
        summary.pages += 1;

        if products.is_empty() {
            debug!(collection = %collection.handle, page, "empty page, done");
            break;
        }

        let bar = page_progress(config, collection, page, products.len());
        for product in &products {
            bar.inc(1);
            if !is_safe_handle(&product.handle) {
                warn!(handle = %product.handle, "skipping product with unsafe handle");
                continue;
            }
            bar.set_message(product.title.clone());
            for (i, url) in product.image_urls().enumerate() {
                let outcome = download_image(shop.fetcher(), config, &dir, product, i, url)?;
                summary.record(outcome);
            }
            page_html.push_product(&collection.handle, product);
            summary.products += 1;
        }
        bar.finish_and_clear();

        if config.page_limit.is_some_and(|limit| page >= limit) {
            debug!(collection = %collection.handle, page, "page limit reached");
            break;
        }
        page += 1;
    }

    Ok(())
}

/// Run the whole pipeline and write index.html
pub fn run_scrape<F: Fetch>(fetcher: &F, config: &ScrapeConfig) -> Result<(PathBuf, ScrapeSummary)> {
    let shop = Storefront::new(fetcher, &config.base_url);

    info!("Fetching collections from {}", shop.collections_url());
    let collections: Vec<Collection> = shop
        .collections()
        .context("Failed to fetch collections")?
        .into_iter()
        .filter(|collection| {
            let safe = is_safe_handle(&collection.handle);
            if !safe {
                warn!(handle = %collection.handle, "skipping collection with unsafe handle");
            }
            safe
        })
        .collect();
    info!("Found {} collections", collections.len());

    let images_dir = init_image_dirs(&config.out_dir, &collections)?;

    let mut page_html = PageBuilder::new(&config.title, &collections);
    let mut summary = ScrapeSummary {
        collections: collections.len(),
        ..Default::default()
    };

    for collection in &collections {
        info!(
            "Scraping {} ({} products)",
            collection.title, collection.products_count
        );
        scrape_collection(
            &shop,
            config,
            &images_dir,
            collection,
            &mut page_html,
            &mut summary,
        )?;
    }

    let path = write_page(&config.out_dir, &page_html.finish())?;
    Ok((path, summary))
}
