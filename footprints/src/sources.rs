//! Remote vector tile servers.

use crate::mercator::TileId;

/// Remote tile server definition, source for the [`crate::HttpFetch`].
pub trait TileSource {
    fn tile_url(&self, tile_id: TileId) -> String;
}

/// Server exposing vector tiles under `{host}/tiles/{z}/{x}/{y}.vector.pbf`.
#[derive(Debug, Clone)]
pub struct BuildingTiles {
    host: String,
}

impl BuildingTiles {
    /// `host` includes the scheme, e.g. `https://tiles.example.com`.
    pub fn new(host: impl Into<String>) -> Self {
        let mut host = host.into();
        while host.ends_with('/') {
            host.pop();
        }
        Self { host }
    }

    pub fn host(&self) -> &str {
        &self.host
    }
}

impl TileSource for BuildingTiles {
    fn tile_url(&self, tile_id: TileId) -> String {
        format!(
            "{}/tiles/{}/{}/{}.vector.pbf",
            self.host, tile_id.zoom, tile_id.x, tile_id.y
        )
    }
}
