//! Turning a raw vector tile into building footprints in longitude/latitude.

use std::borrow::Cow;
use std::io::{self, Read as _};

use crate::geometry::{GeometryError, Polygon, Ring, parse_rings};
use crate::mercator::{DEFAULT_TILE_SIZE, Projector, TileId};
use crate::protobuf::{Feature, GeomType, Layer, Tile};
use crate::rings::classify_rings;
use crate::value::{Properties, Value};
use crate::varint::VarintReader;

/// Layer holding building footprints in OpenMapTiles-like schemas.
pub const BUILDING_LAYER: &str = "building";

/// Only features with a truthy value of this property are emitted.
pub const HEIGHT_PROPERTY: &str = "height";

/// Property injected into every emitted item, holding the name of the layer it came from.
pub const LAYER_PROPERTY: &str = "layer";

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("malformed tile: {0}")]
    Tile(#[from] prost::DecodeError),

    #[error("could not inflate tile: {0}")]
    Inflate(#[from] io::Error),
}

/// Controls how [`TileDecoder`] reads tiles.
#[derive(Debug, Clone)]
pub struct DecoderOptions {
    /// Name of the layer to read features from.
    pub layer: String,

    /// Size of a tile in pixels, used to place the tile on the world bitmap.
    pub tile_size: f64,
}

impl Default for DecoderOptions {
    fn default() -> Self {
        Self {
            layer: BUILDING_LAYER.to_owned(),
            tile_size: DEFAULT_TILE_SIZE,
        }
    }
}

/// Footprint of a single feature.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(::serde::Serialize))]
pub struct TileDataItem {
    /// Polygons in longitude/latitude. First ring of each one is the outer boundary.
    pub coordinates: Vec<Polygon>,

    /// Feature's own properties plus [`LAYER_PROPERTY`].
    pub properties: Properties,
}

impl TileDataItem {
    /// Convert into `geo-types`, dropping the third component. Polygons without rings are
    /// skipped.
    pub fn to_multi_polygon(&self) -> geo_types::MultiPolygon<f64> {
        let to_line_string = |ring: &Ring| {
            geo_types::LineString::from(
                ring.iter()
                    .copied()
                    .map(geo_types::Coord::from)
                    .collect::<Vec<_>>(),
            )
        };

        self.coordinates
            .iter()
            .filter_map(|polygon| {
                let (exterior, interiors) = polygon.split_first()?;
                Some(geo_types::Polygon::new(
                    to_line_string(exterior),
                    interiors.iter().map(to_line_string).collect(),
                ))
            })
            .collect()
    }

    pub fn height(&self) -> Option<f64> {
        self.properties.get(HEIGHT_PROPERTY).and_then(Value::as_f64)
    }
}

/// Decodes tiles into [`TileDataItem`]s. Holds no state between calls, so it can be shared
/// between threads freely.
#[derive(Debug, Clone, Default)]
pub struct TileDecoder {
    options: DecoderOptions,
}

impl TileDecoder {
    pub fn new(options: DecoderOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &DecoderOptions {
        &self.options
    }

    /// Decode the footprints of a tile. Missing layer is not an error, but gives no items.
    /// Features with broken geometry are skipped.
    pub fn decode(&self, tile_id: TileId, bytes: &[u8]) -> Result<Vec<TileDataItem>, Error> {
        let bytes = inflate(bytes)?;
        let tile = Tile::parse(&*bytes)?;

        let Some(layer) = tile.layer(&self.options.layer) else {
            log::debug!("No '{}' layer in {tile_id}.", self.options.layer);
            return Ok(Vec::new());
        };

        let projector = Projector::new(tile_id, layer.extent(), self.options.tile_size);
        let mut items = Vec::new();

        for feature in &layer.features {
            match self.decode_feature(layer, feature, &projector) {
                Ok(Some(item)) => items.push(item),
                Ok(None) => {}
                Err(e) => {
                    log::warn!("Skipping feature {:?} of {tile_id}: {e}.", feature.id);
                }
            }
        }

        log::debug!(
            "Decoded {} of {} features from {tile_id}.",
            items.len(),
            layer.features.len()
        );

        Ok(items)
    }

    fn decode_feature(
        &self,
        layer: &Layer,
        feature: &Feature,
        projector: &Projector,
    ) -> Result<Option<TileDataItem>, GeometryError> {
        let geom_type = feature.r#type();
        if matches!(geom_type, GeomType::Point | GeomType::LineString) {
            log::debug!("Ignoring {geom_type:?} feature {:?}.", feature.id);
            return Ok(None);
        }

        let mut polygons = classify_rings(parse_rings(VarintReader::new(&feature.geometry))?);
        projector.project_polygons(&mut polygons);

        // Each item owns its properties.
        let mut properties = feature.properties(layer);
        if !properties
            .get(HEIGHT_PROPERTY)
            .is_some_and(Value::is_truthy)
        {
            return Ok(None);
        }

        properties.insert(
            LAYER_PROPERTY.to_owned(),
            Value::from(self.options.layer.as_str()),
        );

        Ok(Some(TileDataItem {
            coordinates: polygons,
            properties,
        }))
    }
}

/// Decode the building footprints using default [`DecoderOptions`].
pub fn decode_buildings(tile_id: TileId, bytes: &[u8]) -> Result<Vec<TileDataItem>, Error> {
    TileDecoder::default().decode(tile_id, bytes)
}

/// Tile servers often send tiles gzipped regardless of the `Accept-Encoding`.
fn inflate(bytes: &[u8]) -> io::Result<Cow<'_, [u8]>> {
    if !bytes.starts_with(&GZIP_MAGIC) {
        return Ok(Cow::Borrowed(bytes));
    }

    let mut decoder = flate2::read::GzDecoder::new(bytes);
    let mut buf = Vec::new();
    decoder.read_to_end(&mut buf)?;
    Ok(Cow::Owned(buf))
}
