//! Getting tile bytes from the network and turning them into footprints.

use bytes::Bytes;
use futures::{StreamExt as _, stream};
use reqwest::header::USER_AGENT;
use reqwest_middleware::ClientWithMiddleware;

use super::http::{HeaderValue, HttpOptions, http_client};
use crate::decoder::{TileDataItem, TileDecoder};
use crate::mercator::TileId;
use crate::sources::TileSource;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("tile {0} does not exist")]
    InvalidTile(TileId),

    #[error("server responded with {0}")]
    Http(reqwest::StatusCode),

    #[error(transparent)]
    Request(#[from] reqwest_middleware::Error),

    #[error(transparent)]
    Body(#[from] reqwest::Error),
}

/// Source of raw tile bytes.
pub trait Fetch {
    type Error: std::error::Error + Sync + Send;

    fn fetch(&self, tile_id: TileId) -> impl Future<Output = Result<Bytes, Self::Error>> + Send;

    fn max_concurrency(&self) -> usize;
}

/// Fetches tiles from a [`TileSource`] over HTTP.
pub struct HttpFetch<S> {
    source: S,
    client: ClientWithMiddleware,
    user_agent: Option<HeaderValue>,
    max_parallel_downloads: usize,
}

impl<S> HttpFetch<S>
where
    S: TileSource,
{
    /// Construct new [`HttpFetch`] with default [`HttpOptions`].
    pub fn new(source: S) -> Self {
        Self::with_options(source, HttpOptions::default())
    }

    /// Construct new [`HttpFetch`] with supplied [`HttpOptions`].
    pub fn with_options(source: S, http_options: HttpOptions) -> Self {
        Self {
            source,
            client: http_client(&http_options),
            user_agent: http_options.user_agent,
            max_parallel_downloads: http_options.max_parallel_downloads.0.max(1),
        }
    }
}

impl<S> Fetch for HttpFetch<S>
where
    S: TileSource + Sync,
{
    type Error = Error;

    fn fetch(&self, tile_id: TileId) -> impl Future<Output = Result<Bytes, Self::Error>> + Send {
        async move {
            if !tile_id.valid() {
                return Err(Error::InvalidTile(tile_id));
            }

            let url = self.source.tile_url(tile_id);
            log::debug!("Getting {tile_id} from {url}.");

            let mut request = self.client.get(&url);
            if let Some(user_agent) = &self.user_agent {
                request = request.header(USER_AGENT, user_agent.clone());
            }

            let response = request.send().await?;
            log::debug!("Downloaded {:?}.", response.status());

            if !response.status().is_success() {
                return Err(Error::Http(response.status()));
            }

            Ok(response.bytes().await?)
        }
    }

    fn max_concurrency(&self) -> usize {
        self.max_parallel_downloads
    }
}

/// Fetch and decode a single tile. Any failure is logged and results in no items, since a
/// missing tile is not worth interrupting whoever is drawing the map.
pub async fn load_buildings(
    fetch: &impl Fetch,
    decoder: &TileDecoder,
    tile_id: TileId,
) -> Vec<TileDataItem> {
    let bytes = match fetch.fetch(tile_id).await {
        Ok(bytes) => bytes,
        Err(e) => {
            log::warn!("Could not fetch {tile_id}: {e}");
            return Vec::new();
        }
    };

    match decoder.decode(tile_id, &bytes) {
        Ok(items) => items,
        Err(e) => {
            log::warn!("Could not decode {tile_id}: {e}");
            Vec::new()
        }
    }
}

/// [`load_buildings`] for many tiles, keeping at most [`Fetch::max_concurrency`] requests in
/// flight. Results come in the same order as `tiles`.
pub async fn load_buildings_in_tiles(
    fetch: &impl Fetch,
    decoder: &TileDecoder,
    tiles: impl IntoIterator<Item = TileId>,
) -> Vec<(TileId, Vec<TileDataItem>)> {
    stream::iter(tiles)
        .map(|tile_id| async move { (tile_id, load_buildings(fetch, decoder, tile_id).await) })
        .buffered(fetch.max_concurrency().max(1))
        .collect()
        .await
}
