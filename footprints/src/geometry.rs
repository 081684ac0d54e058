//! Decoding of the feature geometry command stream.
//! <https://github.com/mapbox/vector-tile-spec/tree/master/2.1#43-geometry-encoding>

use crate::varint::{MalformedVarint, VarintReader};

/// Point in tile space before projection, longitude/latitude after.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,

    /// Height or any other third component. Never touched by the projection.
    pub z: Option<f64>,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y, z: None }
    }

    pub fn with_z(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z: Some(z) }
    }
}

impl From<Point> for geo_types::Coord<f64> {
    fn from(point: Point) -> Self {
        geo_types::coord! { x: point.x, y: point.y }
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for Point {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeSeq as _;

        let mut seq = serializer.serialize_seq(Some(if self.z.is_some() { 3 } else { 2 }))?;
        seq.serialize_element(&self.x)?;
        seq.serialize_element(&self.y)?;
        if let Some(z) = self.z {
            seq.serialize_element(&z)?;
        }
        seq.end()
    }
}

/// Sequence of points. Closed when the first and the last one are the same.
pub type Ring = Vec<Point>;

/// First ring is the outer boundary, the rest are holes.
pub type Polygon = Vec<Ring>;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum GeometryError {
    #[error(transparent)]
    MalformedVarint(#[from] MalformedVarint),

    #[error("unknown geometry command {0}")]
    UnknownGeometryCommand(u32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    MoveTo,
    LineTo,
    ClosePath,
}

impl TryFrom<u32> for Command {
    type Error = GeometryError;

    fn try_from(id: u32) -> Result<Self, Self::Error> {
        match id {
            1 => Ok(Self::MoveTo),
            2 => Ok(Self::LineTo),
            7 => Ok(Self::ClosePath),
            _ => Err(GeometryError::UnknownGeometryCommand(id)),
        }
    }
}

/// Decode the command stream into rings, in the order they appear. Coordinates stay in tile
/// units. The reader must cover exactly the geometry field, see [`crate::protobuf::Feature`].
pub fn parse_rings(mut reader: VarintReader<'_>) -> Result<Vec<Ring>, GeometryError> {
    let mut rings = Vec::new();
    let mut ring: Option<Ring> = None;

    // Parameters are deltas from the previous point, also across rings.
    let mut x = 0i64;
    let mut y = 0i64;

    while !reader.is_empty() {
        let integer = reader.read_varint()?;
        let command = Command::try_from((integer & 0x7) as u32)?;
        let count = integer >> 3;

        log::trace!("{command:?} x {count}");

        match command {
            Command::MoveTo => {
                for _ in 0..count {
                    x = x.wrapping_add(reader.read_svarint()?);
                    y = y.wrapping_add(reader.read_svarint()?);

                    if let Some(finished) = ring.replace(vec![Point::new(x as f64, y as f64)]) {
                        rings.push(finished);
                    }
                }
            }
            Command::LineTo => {
                for _ in 0..count {
                    x = x.wrapping_add(reader.read_svarint()?);
                    y = y.wrapping_add(reader.read_svarint()?);

                    ring.get_or_insert_with(Vec::new)
                        .push(Point::new(x as f64, y as f64));
                }
            }
            Command::ClosePath => {
                // The first point is repeated even if the ring already ends there. Consumers
                // rely on rings being explicitly closed. Count is ignored.
                if let Some(ring) = ring.as_mut() {
                    if let Some(first) = ring.first().copied() {
                        ring.push(first);
                    }
                }
            }
        }
    }

    if let Some(ring) = ring {
        rings.push(ring);
    }

    Ok(rings)
}
