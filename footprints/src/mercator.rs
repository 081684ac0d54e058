//! Project tile-local coordinates into longitude/latitude using the Web Mercator.
//! <https://en.wikipedia.org/wiki/Web_Mercator_projection>
//! <https://wiki.openstreetmap.org/wiki/Slippy_map_tilenames>

use std::f64::consts::PI;

use crate::geometry::{Point, Polygon, Ring};
use crate::protobuf::DEFAULT_EXTENT;

// zoom level   tile coverage  number of tiles  tile size(*) in degrees
// 0            1 tile         1 tile           360° x 170.1022°
// 1            2 × 2 tiles    4 tiles          180° x 85.0511°
// 2            4 × 4 tiles    16 tiles         90° x [variable]

/// Size of a single tile in pixels, as used by most vector tile renderers.
pub const DEFAULT_TILE_SIZE: f64 = 512.0;

/// Zoom specifies how many pixels are in the whole map. For example, zoom 0 means that the whole
/// map is just one tile, zoom 1 means that it is 2x2 tiles, and so on.
fn total_pixels(zoom: u8, tile_size: f64) -> f64 {
    2f64.powi(i32::from(zoom)) * tile_size
}

pub fn total_tiles(zoom: u8) -> u32 {
    1u32.checked_shl(u32::from(zoom)).unwrap_or(u32::MAX)
}

/// Project the position into the Mercator projection and normalize it to 0-1 range.
fn mercator_normalized(lon: f64, lat: f64) -> (f64, f64) {
    // Project into Mercator (cylindrical map projection).
    let x = lon.to_radians();
    let y = lat.to_radians().tan().asinh();

    // Scale both x and y to 0-1 range.
    let x = (1. + (x / PI)) / 2.;
    let y = (1. - (y / PI)) / 2.;

    (x, y)
}

/// Coordinates of the OSM-like tile.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
#[cfg_attr(feature = "serde", derive(::serde::Serialize))]
pub struct TileId {
    /// X number of the tile.
    pub x: u32,

    /// Y number of the tile.
    pub y: u32,

    /// Zoom level, where 0 means no zoom.
    /// See: <https://wiki.openstreetmap.org/wiki/Zoom_levels>
    pub zoom: u8,
}

impl TileId {
    /// Tile position (in pixels) on the "World bitmap".
    pub fn project(&self, tile_size: f64) -> Point {
        Point::new(f64::from(self.x) * tile_size, f64::from(self.y) * tile_size)
    }

    pub fn east(&self) -> Option<TileId> {
        (self.x < total_tiles(self.zoom) - 1).then_some(TileId {
            x: self.x + 1,
            y: self.y,
            zoom: self.zoom,
        })
    }

    pub fn west(&self) -> Option<TileId> {
        Some(TileId {
            x: self.x.checked_sub(1)?,
            y: self.y,
            zoom: self.zoom,
        })
    }

    pub fn north(&self) -> Option<TileId> {
        Some(TileId {
            x: self.x,
            y: self.y.checked_sub(1)?,
            zoom: self.zoom,
        })
    }

    pub fn south(&self) -> Option<TileId> {
        (self.y < total_tiles(self.zoom) - 1).then_some(TileId {
            x: self.x,
            y: self.y + 1,
            zoom: self.zoom,
        })
    }

    /// Whether the tile exists at its zoom level.
    pub fn valid(&self) -> bool {
        self.zoom < 32 && self.x < total_tiles(self.zoom) && self.y < total_tiles(self.zoom)
    }
}

impl std::fmt::Display for TileId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}/{}", self.zoom, self.x, self.y)
    }
}

/// Calculate the tile containing the given position.
pub fn tile_id(lon: f64, lat: f64, zoom: u8) -> TileId {
    let (x, y) = mercator_normalized(lon, lat);

    // Map that into a big bitmap made out of web tiles.
    let number_of_tiles = f64::from(total_tiles(zoom));
    let max = total_tiles(zoom).saturating_sub(1);
    let x = ((x * number_of_tiles).floor().max(0.) as u32).min(max);
    let y = ((y * number_of_tiles).floor().max(0.) as u32).min(max);

    TileId { x, y, zoom }
}

/// Project geographical position into world pixels at the given zoom.
pub fn position_to_screen(position: Point, zoom: u8, tile_size: f64) -> Point {
    let total_pixels = total_pixels(zoom, tile_size);
    let (x, y) = mercator_normalized(position.x, position.y);
    Point {
        x: x * total_pixels,
        y: y * total_pixels,
        z: position.z,
    }
}

/// Transforms world pixels into a geographical position.
pub fn screen_to_position(pixels: Point, zoom: u8, tile_size: f64) -> Point {
    let number_of_pixels = total_pixels(zoom, tile_size);

    let lon = pixels.x;
    let lon = lon / number_of_pixels;
    let lon = (lon * 2. - 1.) * PI;
    let lon = lon.to_degrees();

    let lat = pixels.y;
    let lat = lat / number_of_pixels;
    let lat = (-lat * 2. + 1.) * PI;
    let lat = lat.sinh().atan().to_degrees();

    Point {
        x: lon,
        y: lat,
        z: pixels.z,
    }
}

/// Converts points of a single tile from its coordinate space into longitude/latitude.
#[derive(Debug, Clone, Copy)]
pub struct Projector {
    origin: Point,
    units_per_pixel: f64,
    zoom: u8,
    tile_size: f64,
}

impl Projector {
    /// `extent` is the size of the coordinate space geometry was encoded in, usually 4096.
    /// Zero is taken as [`DEFAULT_EXTENT`].
    pub fn new(tile_id: TileId, extent: u32, tile_size: f64) -> Self {
        let extent = if extent == 0 {
            log::warn!("Zero extent for {tile_id}, assuming {DEFAULT_EXTENT}.");
            DEFAULT_EXTENT
        } else {
            extent
        };

        Self {
            origin: tile_id.project(tile_size),
            units_per_pixel: f64::from(extent) / tile_size,
            zoom: tile_id.zoom,
            tile_size,
        }
    }

    pub fn project(&self, point: Point) -> Point {
        let pixels = Point {
            x: self.origin.x + point.x / self.units_per_pixel,
            y: self.origin.y + point.y / self.units_per_pixel,
            z: point.z,
        };
        screen_to_position(pixels, self.zoom, self.tile_size)
    }

    pub fn project_ring(&self, ring: &mut Ring) {
        for point in ring.iter_mut() {
            *point = self.project(*point);
        }
    }

    /// Project every ring of every polygon, in place.
    pub fn project_polygons(&self, polygons: &mut [Polygon]) {
        for ring in polygons.iter_mut().flatten() {
            self.project_ring(ring);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn center_of_the_world() {
        let tile_id = TileId { x: 0, y: 0, zoom: 0 };
        let projected = Projector::new(tile_id, 4096, DEFAULT_TILE_SIZE)
            .project(Point::new(2048., 2048.));

        approx::assert_abs_diff_eq!(projected.x, 0.0, epsilon = 1e-9);
        approx::assert_abs_diff_eq!(projected.y, 0.0, epsilon = 1e-9);
    }

    #[test]
    fn corners_of_the_world() {
        let projector = Projector::new(TileId { x: 0, y: 0, zoom: 0 }, 4096, DEFAULT_TILE_SIZE);

        let top_left = projector.project(Point::new(0., 0.));
        approx::assert_relative_eq!(top_left.x, -180.0, epsilon = 1e-9);
        approx::assert_relative_eq!(top_left.y, 85.0511287798066, epsilon = 1e-9);

        let bottom_right = projector.project(Point::new(4096., 4096.));
        approx::assert_relative_eq!(bottom_right.x, 180.0, epsilon = 1e-9);
        approx::assert_relative_eq!(bottom_right.y, -85.0511287798066, epsilon = 1e-9);
    }

    #[test]
    fn projection_does_not_depend_on_tile_size() {
        let tile_id = TileId {
            x: 585455 >> 6,
            y: 345104 >> 6,
            zoom: 14,
        };
        let point = Point::new(1000., 3000.);

        let a = Projector::new(tile_id, 4096, 512.).project(point);
        let b = Projector::new(tile_id, 4096, 256.).project(point);

        approx::assert_relative_eq!(a.x, b.x, epsilon = 1e-9);
        approx::assert_relative_eq!(a.y, b.y, epsilon = 1e-9);
    }

    #[test]
    fn extent_scales_coordinates() {
        let tile_id = TileId { x: 3, y: 5, zoom: 4 };

        let a = Projector::new(tile_id, 4096, DEFAULT_TILE_SIZE).project(Point::new(1024., 512.));
        let b = Projector::new(tile_id, 512, DEFAULT_TILE_SIZE).project(Point::new(128., 64.));

        approx::assert_relative_eq!(a.x, b.x, epsilon = 1e-9);
        approx::assert_relative_eq!(a.y, b.y, epsilon = 1e-9);
    }

    #[test]
    fn deep_zoom_uses_the_full_world_size() {
        // 2^40 tiles per axis does not fit in u32.
        let projector = Projector::new(TileId { x: 1, y: 0, zoom: 40 }, 4096, DEFAULT_TILE_SIZE);
        let projected = projector.project(Point::new(0., 2048.));

        let expected = -180. + 360. / 2f64.powi(40);
        approx::assert_relative_eq!(projected.x, expected, epsilon = 1e-12);
    }

    #[test]
    fn zero_extent_is_taken_as_default() {
        let tile_id = TileId { x: 3, y: 5, zoom: 4 };
        let point = Point::new(1024., 512.);

        let zero = Projector::new(tile_id, 0, DEFAULT_TILE_SIZE).project(point);
        let default = Projector::new(tile_id, DEFAULT_EXTENT, DEFAULT_TILE_SIZE).project(point);

        assert!(zero.x.is_finite() && zero.y.is_finite());
        assert_eq!(zero, default);
    }

    #[test]
    fn third_component_is_preserved() {
        let projector = Projector::new(TileId { x: 1, y: 1, zoom: 1 }, 4096, DEFAULT_TILE_SIZE);
        let projected = projector.project(Point::with_z(0., 0., 42.));

        approx::assert_abs_diff_eq!(projected.x, 0.0, epsilon = 1e-9);
        approx::assert_abs_diff_eq!(projected.y, 0.0, epsilon = 1e-9);
        assert_eq!(projected.z, Some(42.0));
    }

    #[test]
    fn projecting_polygons_in_place() {
        let projector = Projector::new(TileId { x: 0, y: 0, zoom: 0 }, 4096, DEFAULT_TILE_SIZE);
        let mut polygons = vec![vec![vec![Point::new(2048., 2048.), Point::new(4096., 2048.)]]];

        projector.project_polygons(&mut polygons);

        approx::assert_abs_diff_eq!(polygons[0][0][0].x, 0.0, epsilon = 1e-9);
        approx::assert_relative_eq!(polygons[0][0][1].x, 180.0, epsilon = 1e-9);
    }

    #[test]
    fn projecting_position_and_tile() {
        // Warsaw Citadel.
        let (lon, lat) = (21.00027, 52.26470);

        // Just a bit higher than what most providers support,
        // to make sure we cover the worst case in terms of precision.
        let zoom = 20;

        assert_eq!(
            TileId {
                x: 585455,
                y: 345104,
                zoom
            },
            tile_id(lon, lat, zoom)
        );

        // Projected tile is just its x, y multiplied by the size of tiles.
        assert_eq!(
            Point::new(585455. * 256., 345104. * 256.),
            tile_id(lon, lat, zoom).project(256.)
        );

        // Projected Citadel position should be somewhere near projected tile, shifted only by the
        // position on the tile.
        let calculated = position_to_screen(Point::new(lon, lat), zoom, 256.);
        approx::assert_relative_eq!(calculated.x, 585455. * 256. + 184., max_relative = 0.5);
        approx::assert_relative_eq!(calculated.y, 345104. * 256. + 116.5, max_relative = 0.5);
    }

    #[test]
    fn project_there_and_back() {
        let citadel = Point::new(21.00027, 52.26470);
        let zoom = 16;
        let calculated = screen_to_position(
            position_to_screen(citadel, zoom, DEFAULT_TILE_SIZE),
            zoom,
            DEFAULT_TILE_SIZE,
        );

        approx::assert_relative_eq!(calculated.x, citadel.x, epsilon = 1e-9);
        approx::assert_relative_eq!(calculated.y, citadel.y, epsilon = 1e-9);
    }

    #[test]
    fn tile_id_stays_within_the_world() {
        assert_eq!(tile_id(180.0, -90.0, 2), TileId { x: 3, y: 3, zoom: 2 });
        assert_eq!(tile_id(-180.0, 90.0, 2), TileId { x: 0, y: 0, zoom: 2 });
    }

    #[test]
    fn tile_validity() {
        assert!(TileId { x: 0, y: 0, zoom: 0 }.valid());
        assert!(!TileId { x: 2, y: 2, zoom: 0 }.valid());
        assert!(TileId { x: 3, y: 3, zoom: 2 }.valid());
        assert!(!TileId { x: 0, y: 4, zoom: 2 }.valid());
        assert!(!TileId { x: 0, y: 0, zoom: 40 }.valid());
    }

    #[test]
    fn tile_id_cannot_go_beyond_limits() {
        // There is only one tile at zoom 0.
        let tile_id = TileId { x: 0, y: 0, zoom: 0 };

        assert_eq!(tile_id.west(), None);
        assert_eq!(tile_id.north(), None);
        assert_eq!(tile_id.south(), None);
        assert_eq!(tile_id.east(), None);

        // There are 2 tiles at zoom 1.
        let tile_id = TileId { x: 0, y: 0, zoom: 1 };

        assert_eq!(tile_id.west(), None);
        assert_eq!(tile_id.north(), None);
        assert_eq!(tile_id.south(), Some(TileId { x: 0, y: 1, zoom: 1 }));
        assert_eq!(tile_id.east(), Some(TileId { x: 1, y: 0, zoom: 1 }));
    }

    #[test]
    fn displaying_tile_id() {
        assert_eq!(TileId { x: 1, y: 2, zoom: 3 }.to_string(), "3/1/2");
    }
}
