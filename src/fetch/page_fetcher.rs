// src/fetch/page_fetcher.rs
use anyhow::{Context, Result};
use reqwest::{Client, Url};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, warn};

use crate::core::config_manager::FetchConfig;
use crate::core::FsOps;
use crate::extraction::JobExtractor;
use crate::utils::artifact_timestamp;

/// Everything needed to fetch one listing, passed per call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub listing_url: String,
    pub query: Vec<(String, String)>,
    pub max_pages: u32,
}

impl FetchRequest {
    pub fn new(listing_url: impl Into<String>, config: &FetchConfig) -> Self {
        Self {
            listing_url: listing_url.into(),
            query: config.query.clone(),
            max_pages: config.max_pages.max(1),
        }
    }

    pub fn with_max_pages(mut self, max_pages: u32) -> Self {
        self.max_pages = max_pages.max(1);
        self
    }

    /// URL of page `page` (1-based); pages after the first add `page=N`.
    pub fn page_url(&self, page: u32) -> Result<Url> {
        let mut params = self.query.clone();
        if page > 1 {
            params.push(("page".to_string(), page.to_string()));
        }
        Url::parse_with_params(&self.listing_url, &params)
            .with_context(|| format!("Invalid listing URL: {}", self.listing_url))
    }
}

/// Downloads listing pages as raw documents. Pages are served as-is: no
/// script execution happens here.
pub struct PageFetcher {
    client: Client,
    save_dir: PathBuf,
}

impl PageFetcher {
    pub fn new(config: &FetchConfig, save_dir: impl Into<PathBuf>) -> Result<Self> {
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            save_dir: save_dir.into(),
        })
    }

    /// Fetch up to `request.max_pages` pages and save each as an html file.
    ///
    /// Stops early at the first later page without postings. A failure after
    /// the first page keeps the pages already saved.
    pub async fn fetch_listing(&self, request: &FetchRequest) -> Result<Vec<PathBuf>> {
        let stamp = artifact_timestamp();
        let mut saved = Vec::new();

        for page in 1..=request.max_pages {
            let url = request.page_url(page)?;
            info!("Fetching page {}/{}: {}", page, request.max_pages, url);

            let html = match self.fetch_page(url).await {
                Ok(html) => html,
                Err(e) if page > 1 => {
                    warn!("Stopping at page {}: {:#}", page, e);
                    break;
                }
                Err(e) => return Err(e),
            };

            let postings = JobExtractor::count_containers(&html);
            if postings == 0 {
                if page > 1 {
                    info!("Page {} has no postings, stopping", page);
                    break;
                }
                warn!("First page has no postings; the page layout may have changed");
            }

            let path = self.save_dir.join(format!("page_{}_p{}.html", stamp, page));
            FsOps::write_file_safe(&path, html.as_bytes()).await?;
            saved.push(path);
        }

        info!("Saved {} page(s) to {}", saved.len(), self.save_dir.display());
        Ok(saved)
    }

    async fn fetch_page(&self, url: Url) -> Result<String> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .context("Failed to fetch listing page")?;

        if !response.status().is_success() {
            anyhow::bail!("HTTP error: {}", response.status());
        }

        response.text().await.context("Failed to read response body")
    }
}
