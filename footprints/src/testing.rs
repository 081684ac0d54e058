//! Hand-made vector tiles used across the unit tests.

use prost::Message as _;

use crate::protobuf;
use crate::value::Value;

pub(crate) fn zigzag(value: i64) -> u64 {
    ((value << 1) ^ (value >> 63)) as u64
}

pub(crate) fn command(id: u32, count: u32) -> u32 {
    (count << 3) | id
}

/// Geometry command stream, tracking the cursor so that rings can be given in absolute
/// coordinates.
#[derive(Default, Clone)]
pub(crate) struct GeometryBuilder {
    integers: Vec<u32>,
    cursor: (i64, i64),
}

impl GeometryBuilder {
    pub fn move_to(mut self, x: i64, y: i64) -> Self {
        self.integers.push(command(1, 1));
        self.delta(x, y);
        self
    }

    pub fn line_to(mut self, points: &[(i64, i64)]) -> Self {
        self.integers.push(command(2, points.len() as u32));
        for &(x, y) in points {
            self.delta(x, y);
        }
        self
    }

    pub fn close_path(mut self) -> Self {
        self.integers.push(command(7, 1));
        self
    }

    /// MoveTo to the first point, LineTo through the rest, then ClosePath.
    pub fn ring(self, points: &[(i64, i64)]) -> Self {
        let (first, rest) = points.split_first().expect("ring needs at least one point");
        self.move_to(first.0, first.1).line_to(rest).close_path()
    }

    /// Anything, including invalid commands.
    pub fn raw(mut self, integer: u32) -> Self {
        self.integers.push(integer);
        self
    }

    fn delta(&mut self, x: i64, y: i64) {
        self.integers.push(zigzag(x - self.cursor.0) as u32);
        self.integers.push(zigzag(y - self.cursor.1) as u32);
        self.cursor = (x, y);
    }

    /// Packed varints, without the length prefix.
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        for integer in &self.integers {
            prost::encoding::encode_varint(u64::from(*integer), &mut buf);
        }
        buf
    }
}

#[derive(Clone)]
pub(crate) struct FeatureBuilder {
    id: Option<u64>,
    geom_type: i32,
    geometry: GeometryBuilder,
    properties: Vec<(String, Value)>,
    raw_tags: Vec<u32>,
}

impl FeatureBuilder {
    pub fn polygon(geometry: GeometryBuilder) -> Self {
        Self {
            id: None,
            geom_type: 3,
            geometry,
            properties: Vec::new(),
            raw_tags: Vec::new(),
        }
    }

    pub fn geom_type(mut self, geom_type: i32) -> Self {
        self.geom_type = geom_type;
        self
    }

    pub fn id(mut self, id: u64) -> Self {
        self.id = Some(id);
        self
    }

    pub fn property(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.properties.push((key.to_owned(), value.into()));
        self
    }

    /// Tags appended verbatim after the ones coming from [`Self::property`].
    pub fn raw_tags(mut self, tags: &[u32]) -> Self {
        self.raw_tags.extend_from_slice(tags);
        self
    }
}

pub(crate) struct LayerBuilder {
    name: String,
    extent: Option<u32>,
    features: Vec<FeatureBuilder>,
}

impl LayerBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            extent: Some(4096),
            features: Vec::new(),
        }
    }

    pub fn extent(mut self, extent: u32) -> Self {
        self.extent = Some(extent);
        self
    }

    pub fn without_extent(mut self) -> Self {
        self.extent = None;
        self
    }

    pub fn feature(mut self, feature: FeatureBuilder) -> Self {
        self.features.push(feature);
        self
    }

    fn build(&self) -> protobuf::Layer {
        let mut keys: Vec<&str> = Vec::new();
        let mut values: Vec<&Value> = Vec::new();
        let mut features = Vec::new();

        for feature in &self.features {
            let mut tags = Vec::new();
            for (k, v) in &feature.properties {
                let key_index = keys.iter().position(|known| *known == k.as_str()).unwrap_or_else(|| {
                    keys.push(k.as_str());
                    keys.len() - 1
                });
                let value_index = values.iter().position(|known| *known == v).unwrap_or_else(|| {
                    values.push(v);
                    values.len() - 1
                });
                tags.push(key_index as u32);
                tags.push(value_index as u32);
            }
            tags.extend_from_slice(&feature.raw_tags);

            features.push(protobuf::Feature {
                id: feature.id,
                tags,
                r#type: Some(feature.geom_type),
                geometry: feature.geometry.encode().into(),
            });
        }

        protobuf::Layer {
            version: 2,
            name: self.name.clone(),
            features,
            keys: keys.into_iter().map(str::to_owned).collect(),
            values: values.into_iter().map(protobuf::Value::from).collect(),
            extent: self.extent,
        }
    }
}

#[derive(Default)]
pub(crate) struct TileBuilder {
    layers: Vec<LayerBuilder>,
}

impl TileBuilder {
    pub fn layer(mut self, layer: LayerBuilder) -> Self {
        self.layers.push(layer);
        self
    }

    pub fn encode(&self) -> Vec<u8> {
        protobuf::Tile {
            layers: self.layers.iter().map(LayerBuilder::build).collect(),
        }
        .encode_to_vec()
    }
}

/// Tile with a single "building" layer containing given features.
pub(crate) fn buildings(features: Vec<FeatureBuilder>) -> Vec<u8> {
    let mut layer = LayerBuilder::new("building");
    for feature in features {
        layer = layer.feature(feature);
    }
    TileBuilder::default().layer(layer).encode()
}

/// Square ring with the top-left corner at `(x, y)`, clockwise on screen.
pub(crate) fn square(geometry: GeometryBuilder, x: i64, y: i64, size: i64) -> GeometryBuilder {
    geometry.ring(&[(x, y), (x + size, y), (x + size, y + size), (x, y + size)])
}
