//! External product catalog.
//!
//! The catalog service is best effort. A fetch makes exactly one request with
//! a fixed timeout and any failure degrades to an empty catalog.

use log::{info, warn};
use serde::Deserialize;
use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

/// Default catalog endpoint.
pub const DEFAULT_CATALOG_URL: &str = "https://dummyjson.com/products?limit=100";

/// Default request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Where and how long to wait for the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogConfig {
    pub url: String,
    pub timeout: Duration,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        CatalogConfig {
            url: DEFAULT_CATALOG_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// One catalog product.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CatalogEntry {
    /// Numeric product key assigned by the catalog.
    #[serde(rename = "id")]
    pub key: u32,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub category: String,
    /// Some catalog products carry no brand.
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default)]
    pub rating: f64,
}

/// Response envelope of the catalog endpoint.
#[derive(Debug, Deserialize)]
struct CatalogPayload {
    products: Vec<CatalogEntry>,
}

/// Catalog entries indexed by product key.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Catalog {
    entries: HashMap<u32, CatalogEntry>,
}

impl Catalog {
    /// An empty catalog; every lookup misses.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn get(&self, key: u32) -> Option<&CatalogEntry> {
        self.entries.get(&key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Largest key in the catalog.
    pub fn max_key(&self) -> Option<u32> {
        self.entries.keys().copied().max()
    }
}

impl FromIterator<CatalogEntry> for Catalog {
    /// Later entries replace earlier ones with the same key.
    fn from_iter<I: IntoIterator<Item = CatalogEntry>>(iter: I) -> Self {
        Catalog {
            entries: iter.into_iter().map(|e| (e.key, e)).collect(),
        }
    }
}

/// Why a catalog fetch failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// No response within the timeout.
    Timeout,
    /// Could not connect to the service.
    Connection(String),
    /// The service answered with a non-success status.
    Status(u16),
    /// The body was not a catalog payload.
    Decode(String),
    Other(String),
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchError::Timeout => f.write_str("request timed out"),
            FetchError::Connection(e) => write!(f, "connection failed: {}", e),
            FetchError::Status(code) => write!(f, "service returned status {}", code),
            FetchError::Decode(e) => write!(f, "invalid catalog payload: {}", e),
            FetchError::Other(e) => write!(f, "request failed: {}", e),
        }
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            FetchError::Timeout
        } else if e.is_connect() {
            FetchError::Connection(e.to_string())
        } else if e.is_decode() {
            FetchError::Decode(e.to_string())
        } else if let Some(status) = e.status() {
            FetchError::Status(status.as_u16())
        } else {
            FetchError::Other(e.to_string())
        }
    }
}

/// How a fetch went.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchStatus {
    Fetched { count: usize },
    /// No fetch was attempted.
    Skipped,
    Failed(FetchError),
}

impl FetchStatus {
    pub fn is_available(&self) -> bool {
        matches!(self, FetchStatus::Fetched { .. })
    }
}

/// A catalog plus how it was obtained. The catalog is empty unless fetched.
#[derive(Debug, Clone)]
pub struct CatalogFetch {
    pub catalog: Catalog,
    pub status: FetchStatus,
}

impl CatalogFetch {
    fn failed(error: FetchError) -> Self {
        warn!("Catalog unavailable, continuing without enrichment: {}", error);
        CatalogFetch {
            catalog: Catalog::empty(),
            status: FetchStatus::Failed(error),
        }
    }
}

/// Something that can provide a catalog for one run.
pub trait CatalogSource {
    fn fetch(&self) -> CatalogFetch;
}

/// Fetches the catalog over HTTP.
#[derive(Debug, Clone, Default)]
pub struct HttpCatalog {
    config: CatalogConfig,
}

impl HttpCatalog {
    pub fn new(config: CatalogConfig) -> Self {
        HttpCatalog { config }
    }
}

impl CatalogSource for HttpCatalog {
    fn fetch(&self) -> CatalogFetch {
        fetch_catalog(&self.config)
    }
}

/// Skips the fetch, as in offline mode.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCatalog;

impl CatalogSource for NoCatalog {
    fn fetch(&self) -> CatalogFetch {
        info!("Catalog fetch skipped");
        CatalogFetch {
            catalog: Catalog::empty(),
            status: FetchStatus::Skipped,
        }
    }
}

/// A fixed, in-memory catalog.
#[derive(Debug, Clone, Default)]
pub struct StaticCatalog(pub Catalog);

impl CatalogSource for StaticCatalog {
    fn fetch(&self) -> CatalogFetch {
        CatalogFetch {
            catalog: self.0.clone(),
            status: FetchStatus::Fetched { count: self.0.len() },
        }
    }
}

/// Fetches the catalog once. Never fails; see [`CatalogFetch::status`].
pub fn fetch_catalog(config: &CatalogConfig) -> CatalogFetch {
    match request_catalog(config) {
        Ok(entries) => {
            let catalog: Catalog = entries.into_iter().collect();
            info!("Fetched {} catalog products from {}", catalog.len(), config.url);
            CatalogFetch {
                status: FetchStatus::Fetched { count: catalog.len() },
                catalog,
            }
        }
        Err(e) => CatalogFetch::failed(e),
    }
}

fn request_catalog(config: &CatalogConfig) -> Result<Vec<CatalogEntry>, FetchError> {
    let client = reqwest::blocking::Client::builder()
        .timeout(config.timeout)
        .build()
        .map_err(|e| FetchError::Other(e.to_string()))?;

    let response = client.get(&config.url).send()?;
    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::Status(status.as_u16()));
    }

    let payload: CatalogPayload = response.json()?;
    Ok(payload.products)
}
