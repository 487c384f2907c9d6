use super::*;

fn london() -> GeoBounds {
    GeoBounds {
        min_lat: 51.500,
        max_lat: 51.502,
        min_lon: -0.130,
        max_lon: -0.126,
    }
}

// Serves undersized tiles and allows a single tile per map.
struct TinyTiles;

impl TileProvider for TinyTiles {
    fn fetch_tile(&self, _zoom: u8, _x: u32, _y: u32) -> Result<RgbaImage, TileError> {
        Ok(RgbaImage::from_pixel(64, 64, Rgba([200, 10, 10, 255])))
    }

    fn name(&self) -> &str {
        "tiny"
    }

    fn max_tiles(&self) -> usize {
        1
    }
}

#[test]
fn stitched_image_covers_the_tile_range() {
    let provider = SolidTileProvider {
        color: [30, 160, 60, 255],
    };
    let raster = fetch_map(&provider, &london(), DEFAULT_ZOOM).unwrap();
    let p = raster.projection;
    assert_eq!(raster.image.dimensions(), (p.width, p.height));
    assert_eq!(p.width % TILE_SIZE, 0);
    assert_eq!(p.height % TILE_SIZE, 0);
    assert_eq!(raster.image.get_pixel(0, 0).0, [30, 160, 60, 255]);
}

#[test]
fn odd_sized_tiles_are_scaled_to_tile_size() {
    let raster = fetch_map(&TinyTiles, &london(), DEFAULT_ZOOM).unwrap();
    assert_eq!(raster.image.dimensions(), (TILE_SIZE, TILE_SIZE));
    assert!(raster.projection.zoom <= DEFAULT_ZOOM);
    assert_eq!(raster.image.get_pixel(128, 128).0, [200, 10, 10, 255]);
}

#[test]
fn disabled_provider_surfaces_as_tile_error() {
    let err = fetch_map(&NoTiles, &london(), DEFAULT_ZOOM).unwrap_err();
    assert_eq!(err, TileError::Disabled);
}
