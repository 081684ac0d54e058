use std::path::PathBuf;

use http_cache_reqwest::{CACacheManager, Cache, CacheMode, HttpCache, HttpCacheOptions};
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};

pub use reqwest::header::HeaderValue;

/// Controls how [`crate::HttpFetch`] uses the HTTP protocol, such as caching.
#[derive(Clone)]
pub struct HttpOptions {
    /// Path to the directory to store the HTTP cache. No caching if `None`.
    ///
    /// Tile servers usually set the `Cache-Control` header generously, so this saves a lot of
    /// traffic when the same area is decoded repeatedly.
    pub cache: Option<PathBuf>,

    /// User agent to be sent to the tile servers.
    pub user_agent: Option<HeaderValue>,

    /// Maximum number of parallel downloads.
    ///
    /// Many services have rate limits, and exceeding them may result in throttling, bans, or
    /// degraded service. Use the default value when in doubt.
    pub max_parallel_downloads: MaxParallelDownloads,
}

impl Default for HttpOptions {
    fn default() -> Self {
        Self {
            cache: None,
            user_agent: Some(HeaderValue::from_static(concat!(
                env!("CARGO_PKG_NAME"),
                "/",
                env!("CARGO_PKG_VERSION"),
            ))),
            max_parallel_downloads: MaxParallelDownloads::default(),
        }
    }
}

/// Maximum number of parallel downloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MaxParallelDownloads(pub usize);

impl Default for MaxParallelDownloads {
    /// Default number of parallel downloads. Following modern browsers' behavior.
    /// <https://stackoverflow.com/questions/985431/max-parallel-http-connections-in-a-browser>
    fn default() -> Self {
        Self(6)
    }
}

impl MaxParallelDownloads {
    /// Use custom value.
    ///
    /// Many services have rate limits, and exceeding them may result in throttling, bans, or
    /// degraded service. You are **strongly encouraged** to check the Terms of Use of the
    /// particular provider you are using.
    pub fn value_manually_confirmed_with_provider_limits(value: usize) -> Self {
        Self(value)
    }
}

pub(crate) fn http_client(http_options: &HttpOptions) -> ClientWithMiddleware {
    let builder = ClientBuilder::new(reqwest::Client::new());

    if let Some(path) = &http_options.cache {
        log::debug!("Caching HTTP responses in {}.", path.display());
        builder
            .with(Cache(HttpCache {
                mode: CacheMode::Default,
                manager: CACacheManager::new(path.clone(), false),
                options: HttpCacheOptions::default(),
            }))
            .build()
    } else {
        builder.build()
    }
}
