//! Mapbox Vector Tile container, just enough of it to reach layers, features and their tags.
//!
//! See <https://github.com/mapbox/vector-tile-spec/tree/master/2.1>.

use bytes::{Buf, Bytes};
use prost::{Enumeration, Message};

use crate::value::{Properties, Value as PropertyValue};

/// Layer extent assumed when the layer does not declare one.
pub const DEFAULT_EXTENT: u32 = 4096;

/// Vector tile data.
#[derive(Clone, PartialEq, Message)]
pub struct Tile {
    #[prost(message, repeated, tag = "3")]
    pub layers: Vec<Layer>,
}

impl Tile {
    /// Decode the container. Feature geometry is not looked into.
    pub fn parse(buf: impl Buf) -> Result<Self, prost::DecodeError> {
        Self::decode(buf)
    }

    /// Names of all layers, in the order they appear in the tile.
    pub fn layer_names(&self) -> Vec<&str> {
        self.layers.iter().map(|layer| layer.name.as_str()).collect()
    }

    /// First layer called `name`.
    pub fn layer(&self, name: &str) -> Option<&Layer> {
        self.layers.iter().find(|layer| layer.name == name)
    }
}

/// Named collection of features sharing key/value tables and a coordinate extent.
///
/// See <https://github.com/mapbox/vector-tile-spec/tree/master/2.1#41-layers>.
#[derive(Clone, PartialEq, Message)]
pub struct Layer {
    #[prost(uint32, required, tag = "15", default = "1")]
    pub version: u32,
    #[prost(string, required, tag = "1")]
    pub name: String,
    #[prost(message, repeated, tag = "2")]
    pub features: Vec<Feature>,
    #[prost(string, repeated, tag = "3")]
    pub keys: Vec<String>,
    #[prost(message, repeated, tag = "4")]
    pub values: Vec<Value>,
    /// Width and height of the layer's coordinate system. Read through [`Layer::extent`],
    /// which falls back to [`DEFAULT_EXTENT`].
    #[prost(uint32, optional, tag = "5", default = "4096")]
    pub extent: Option<u32>,
}

/// Single feature of a layer.
///
/// See <https://github.com/mapbox/vector-tile-spec/tree/master/2.1#42-features>.
#[derive(Clone, PartialEq, Eq, Hash, Message)]
pub struct Feature {
    #[prost(uint64, optional, tag = "1")]
    pub id: Option<u64>,
    /// Consecutive pairs of indices into [`Layer::keys`] and [`Layer::values`].
    #[prost(uint32, repeated, packed = "true", tag = "2")]
    pub tags: Vec<u32>,
    #[prost(enumeration = "GeomType", optional, tag = "3", default = "Unknown")]
    pub r#type: Option<i32>,
    /// Packed command stream exactly as it was in the tile, without the length prefix.
    /// Decoded by [`crate::parse_rings`].
    #[prost(bytes = "bytes", tag = "4")]
    pub geometry: Bytes,
}

/// Types of geometry for a feature.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Enumeration)]
#[repr(i32)]
pub enum GeomType {
    Unknown = 0,
    Point = 1,
    LineString = 2,
    Polygon = 3,
}

/// Tag value as stored in the layer. Exactly one field is set in a valid tile.
#[derive(Clone, PartialEq, Message)]
pub struct Value {
    #[prost(string, optional, tag = "1")]
    pub string_value: Option<String>,
    #[prost(float, optional, tag = "2")]
    pub float_value: Option<f32>,
    #[prost(double, optional, tag = "3")]
    pub double_value: Option<f64>,
    #[prost(int64, optional, tag = "4")]
    pub int_value: Option<i64>,
    #[prost(uint64, optional, tag = "5")]
    pub uint_value: Option<u64>,
    #[prost(sint64, optional, tag = "6")]
    pub sint_value: Option<i64>,
    #[prost(bool, optional, tag = "7")]
    pub bool_value: Option<bool>,
}

impl Value {
    /// The value which is set, `None` if the tile used none of the known types.
    pub fn to_property(&self) -> Option<PropertyValue> {
        if let Some(s) = &self.string_value {
            Some(PropertyValue::String(s.clone()))
        } else if let Some(f) = self.float_value {
            Some(PropertyValue::Float(f))
        } else if let Some(d) = self.double_value {
            Some(PropertyValue::Double(d))
        } else if let Some(i) = self.int_value {
            Some(PropertyValue::Int(i))
        } else if let Some(u) = self.uint_value {
            Some(PropertyValue::UInt(u))
        } else if let Some(i) = self.sint_value {
            Some(PropertyValue::SInt(i))
        } else {
            self.bool_value.map(PropertyValue::Bool)
        }
    }
}

impl From<&PropertyValue> for Value {
    fn from(value: &PropertyValue) -> Self {
        let mut out = Self::default();
        match value {
            PropertyValue::String(s) => out.string_value = Some(s.clone()),
            PropertyValue::Float(f) => out.float_value = Some(*f),
            PropertyValue::Double(d) => out.double_value = Some(*d),
            PropertyValue::Int(i) => out.int_value = Some(*i),
            PropertyValue::UInt(u) => out.uint_value = Some(*u),
            PropertyValue::SInt(i) => out.sint_value = Some(*i),
            PropertyValue::Bool(b) => out.bool_value = Some(*b),
        }
        out
    }
}

impl Feature {
    /// Resolve the tags against the layer's tables.
    pub fn properties(&self, layer: &Layer) -> Properties {
        let mut properties = Properties::new();

        for pair in self.tags.chunks_exact(2) {
            let key = usize::try_from(pair[0])
                .ok()
                .and_then(|index| layer.keys.get(index));
            let value = usize::try_from(pair[1])
                .ok()
                .and_then(|index| layer.values.get(index))
                .and_then(Value::to_property);

            match (key, value) {
                (Some(key), Some(value)) => {
                    properties.insert(key.clone(), value);
                }
                _ => {
                    log::debug!(
                        "Feature {:?} refers to missing tag {}={}.",
                        self.id,
                        pair[0],
                        pair[1]
                    );
                }
            }
        }

        properties
    }
}
