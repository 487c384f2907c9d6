use super::*;

#[test]
fn url_template_substitutes_coordinates() {
    let p = HttpTileProvider::new("https://tiles.example/{z}/{x}/{y}.png").unwrap();
    assert_eq!(
        p.tile_url(15, 16384, 10895),
        "https://tiles.example/15/16384/10895.png"
    );
    assert_eq!(p.max_tiles(), DEFAULT_MAX_TILES);
    assert_eq!(p.with_max_tiles(0).max_tiles(), 1);
}

#[test]
fn unreachable_server_is_a_network_error() {
    let p = HttpTileProvider::with_timeout("http://127.0.0.1:9/{z}/{x}/{y}.png", Duration::from_millis(200))
        .unwrap();
    assert!(matches!(
        p.fetch_tile(1, 0, 0),
        Err(TileError::Network(_))
    ));
}
