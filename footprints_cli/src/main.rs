//! Command line front end of the `footprints` crate. Prints decoded buildings as JSON.

use std::{io::Write as _, iter::successors, path::PathBuf, str::FromStr};

use clap::Parser;
use footprints::{
    DecoderOptions, HttpFetch, HttpOptions, MaxParallelDownloads, TileDataItem, TileDecoder,
    TileId, load_buildings_in_tiles, sources::BuildingTiles,
};

#[derive(Debug, thiserror::Error)]
enum Error {
    #[error("either --tile or both --lon and --lat are needed")]
    NoLocation,

    #[error("--host is needed unless decoding a local --file")]
    NoHost,

    #[error("could not read {0}: {1}")]
    Read(PathBuf, std::io::Error),

    #[error(transparent)]
    Decode(#[from] footprints::Error),

    #[error(transparent)]
    Output(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Tile given as `z/x/y`.
#[derive(Debug, Clone, Copy)]
struct TileArg(TileId);

impl FromStr for TileArg {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split('/');
        let mut next = |what: &str| {
            parts
                .next()
                .ok_or_else(|| format!("missing {what}, expected z/x/y"))
        };

        let zoom = next("zoom")?.parse().map_err(|e| format!("zoom: {e}"))?;
        let x = next("x")?.parse().map_err(|e| format!("x: {e}"))?;
        let y = next("y")?.parse().map_err(|e| format!("y: {e}"))?;

        if parts.next().is_some() {
            return Err("too many components, expected z/x/y".to_owned());
        }

        let tile_id = TileId { x, y, zoom };
        if tile_id.valid() {
            Ok(Self(tile_id))
        } else {
            Err(format!("{tile_id} does not exist"))
        }
    }
}

/// Decode building footprints from Mapbox Vector Tiles
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Tile server, e.g. https://tiles.example.com
    #[arg(long)]
    host: Option<String>,

    /// Decode a tile stored on disk instead of downloading it. Needs --tile or --lon/--lat
    /// to know where it lies.
    #[arg(long)]
    file: Option<PathBuf>,

    /// Tile as z/x/y
    #[arg(long, conflicts_with_all = ["lon", "lat"])]
    tile: Option<TileArg>,

    /// Longitude of a point inside the tile
    #[arg(long, requires = "lat", allow_negative_numbers = true)]
    lon: Option<f64>,

    /// Latitude of a point inside the tile
    #[arg(long, requires = "lon", allow_negative_numbers = true)]
    lat: Option<f64>,

    /// Zoom used with --lon/--lat
    #[arg(long, default_value = "15")]
    zoom: u8,

    /// Also download this many tiles around the center one, in every direction
    #[arg(long, default_value = "0", conflicts_with = "file")]
    radius: u32,

    /// Directory for the HTTP cache
    #[arg(long)]
    cache: Option<PathBuf>,

    /// Maximum number of parallel downloads
    #[arg(long)]
    parallel: Option<usize>,

    /// Layer to read the buildings from
    #[arg(long, default_value = footprints::BUILDING_LAYER)]
    layer: String,

    /// Tile size in pixels
    #[arg(long, default_value_t = footprints::DEFAULT_TILE_SIZE)]
    tile_size: f64,

    /// Indent the output
    #[arg(long)]
    pretty: bool,
}

impl Args {
    fn center(&self) -> Result<TileId, Error> {
        match (self.tile, self.lon, self.lat) {
            (Some(TileArg(tile_id)), _, _) => Ok(tile_id),
            (None, Some(lon), Some(lat)) => Ok(footprints::tile_id(lon, lat, self.zoom)),
            _ => Err(Error::NoLocation),
        }
    }
}

#[derive(serde::Serialize)]
struct TileOutput {
    tile: TileId,
    items: Vec<TileDataItem>,
}

/// Tiles within `radius` of `center`, row by row. Tiles past the edges of the map are skipped.
fn tiles_around(center: TileId, radius: u32) -> Vec<TileId> {
    let step = |start: TileId, next: fn(&TileId) -> Option<TileId>| {
        successors(Some(start), next)
            .take(radius as usize + 1)
            .last()
            .unwrap_or(start)
    };

    let top_left = step(step(center, TileId::north), TileId::west);
    let bottom = center.y.saturating_add(radius);
    let right = center.x.saturating_add(radius);

    successors(Some(top_left), TileId::south)
        .take_while(|row| row.y <= bottom)
        .flat_map(move |row| {
            successors(Some(row), TileId::east).take_while(move |tile| tile.x <= right)
        })
        .collect()
}

async fn run(args: Args) -> Result<Vec<TileOutput>, Error> {
    let center = args.center()?;
    let decoder = TileDecoder::new(DecoderOptions {
        layer: args.layer.clone(),
        tile_size: args.tile_size,
    });

    if let Some(path) = &args.file {
        log::info!("Decoding {} as {center}.", path.display());
        let bytes = std::fs::read(path).map_err(|e| Error::Read(path.clone(), e))?;
        let items = decoder.decode(center, &bytes)?;
        return Ok(vec![TileOutput {
            tile: center,
            items,
        }]);
    }

    let host = args.host.ok_or(Error::NoHost)?;
    let mut http_options = HttpOptions {
        cache: args.cache,
        ..Default::default()
    };
    if let Some(parallel) = args.parallel {
        http_options.max_parallel_downloads =
            MaxParallelDownloads::value_manually_confirmed_with_provider_limits(parallel);
    }

    let fetch = HttpFetch::with_options(BuildingTiles::new(host), http_options);
    let tiles = tiles_around(center, args.radius);
    log::info!("Loading {} tile(s) around {center}.", tiles.len());

    Ok(load_buildings_in_tiles(&fetch, &decoder, tiles)
        .await
        .into_iter()
        .map(|(tile, items)| TileOutput { tile, items })
        .collect())
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    env_logger::init();

    let args = Args::parse();
    let pretty = args.pretty;
    let output = run(args).await?;

    let mut stdout = std::io::stdout().lock();
    if pretty {
        serde_json::to_writer_pretty(&mut stdout, &output)?;
    } else {
        serde_json::to_writer(&mut stdout, &output)?;
    }
    writeln!(stdout)?;

    Ok(())
}
