#![doc = include_str!("../README.md")]
#![deny(clippy::unwrap_used, rustdoc::broken_intra_doc_links)]

mod decoder;
mod geometry;
mod io;
mod mercator;
pub mod protobuf;
mod rings;
pub mod sources;
#[cfg(test)]
mod testing;
mod value;
mod varint;

pub use decoder::{
    BUILDING_LAYER, DecoderOptions, Error, HEIGHT_PROPERTY, LAYER_PROPERTY, TileDataItem,
    TileDecoder, decode_buildings,
};
pub use geometry::{GeometryError, Point, Polygon, Ring, parse_rings};
pub use io::{
    Error as FetchError, Fetch, HeaderValue, HttpFetch, HttpOptions, MaxParallelDownloads,
    load_buildings, load_buildings_in_tiles,
};
pub use mercator::{
    DEFAULT_TILE_SIZE, Projector, TileId, position_to_screen, screen_to_position, tile_id,
    total_tiles,
};
pub use rings::{Role, Winding, classify_rings, signed_area};
pub use value::{Properties, Value};
pub use varint::{MalformedVarint, VarintReader};
