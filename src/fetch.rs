use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::Client;
use tokio::time::sleep;
use tracing::{debug, info};

// Fixed pause after each page fetch.
const COURTESY_DELAY: Duration = Duration::from_millis(500);

/// One paginated ranking listing to crawl. Catalog sections carry distinct
/// valid page ranges; only the maniax section takes a subcategory filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Listing {
    pub site: &'static str,
    pub subcategory: Option<&'static str>,
    pub pages: u32,
}

/// The fixed crawl plan: sale-sorted maniax subcategories five pages deep,
/// plus the books and girls floors three pages deep.
pub const LISTINGS: &[Listing] = &[
    Listing { site: "maniax", subcategory: Some("comic"), pages: 5 },
    Listing { site: "maniax", subcategory: Some("game"), pages: 5 },
    Listing { site: "maniax", subcategory: Some("voice"), pages: 5 },
    Listing { site: "books", subcategory: None, pages: 3 },
    Listing { site: "girls", subcategory: None, pages: 3 },
];

impl Listing {
    pub fn url(&self, page: u32) -> String {
        match self.subcategory {
            Some(sub) => format!(
                "https://www.dlsite.com/{}/ranking/total?sort=sale&category={}&page={}",
                self.site, sub, page
            ),
            None => format!(
                "https://www.dlsite.com/{}/ranking/total?page={}",
                self.site, page
            ),
        }
    }
}

/// Owns its HTTP client outright; one fetcher lives for exactly one run.
pub struct Fetcher {
    client: Client,
}

impl Fetcher {
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("dlwatcher/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("building HTTP client")?;
        Ok(Self { client })
    }

    /// GET one listing page, then pause for the courtesy delay.
    ///
    /// Any transport or HTTP-status failure propagates and aborts the run.
    /// No retries: a transient failure is treated like a permanent one, and
    /// the next scheduled run is the retry mechanism.
    pub async fn page(&self, url: &str) -> Result<String> {
        info!(%url, "fetching");
        let body = self
            .client
            .get(url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .with_context(|| format!("fetching {url}"))?
            .text()
            .await
            .with_context(|| format!("reading body of {url}"))?;
        debug!(bytes = body.len(), "page downloaded");
        sleep(COURTESY_DELAY).await;
        Ok(body)
    }
}
