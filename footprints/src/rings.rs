//! Grouping of rings into polygons by their winding order.

use crate::geometry::{Polygon, Ring};

/// Twice the signed area of the ring. Positive for rings going clockwise on screen (y axis
/// pointing down), which is how outer rings are encoded in vector tiles.
pub fn signed_area(ring: &Ring) -> f64 {
    let mut sum = 0.0;

    for (i, p1) in ring.iter().enumerate() {
        let p2 = &ring[if i == 0 { ring.len() - 1 } else { i - 1 }];
        sum += (p2.x - p1.x) * (p1.y + p2.y);
    }

    sum
}

/// Winding of the outer rings, established by the first non-degenerate ring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Winding {
    #[default]
    Unset,
    Outer { negative: bool },
}

/// What to do with a ring of a given area.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Degenerate,
    Outer,
    Hole,
}

impl Winding {
    /// Classify a ring, fixing the convention on the first call with a non-zero area.
    pub fn classify(&mut self, area: f64) -> Role {
        if area == 0.0 {
            return Role::Degenerate;
        }

        let negative = area < 0.0;
        match *self {
            Self::Unset => {
                *self = Self::Outer { negative };
                Role::Outer
            }
            Self::Outer { negative: outer } if outer == negative => Role::Outer,
            Self::Outer { .. } => Role::Hole,
        }
    }
}

/// Group rings into polygons. Each ring of the outer winding starts a new polygon, each ring of
/// the opposite winding becomes a hole of the current one. Rings with zero area are dropped, so
/// are holes appearing before any outer ring.
///
/// Zero or one ring is returned as a single polygon without looking at the area.
pub fn classify_rings(rings: Vec<Ring>) -> Vec<Polygon> {
    if rings.len() <= 1 {
        return vec![rings];
    }

    let mut polygons = Vec::new();
    let mut polygon: Option<Polygon> = None;
    let mut winding = Winding::default();

    for ring in rings {
        match winding.classify(signed_area(&ring)) {
            Role::Degenerate => {
                log::trace!("Dropping degenerate ring of {} points.", ring.len());
            }
            Role::Outer => {
                if let Some(finished) = polygon.replace(vec![ring]) {
                    polygons.push(finished);
                }
            }
            Role::Hole => match polygon.as_mut() {
                Some(polygon) => polygon.push(ring),
                None => log::trace!("Dropping hole without an outer ring."),
            },
        }
    }

    if let Some(polygon) = polygon {
        polygons.push(polygon);
    }

    polygons
}
