use super::*;

#[test]
fn missing_components_and_fields_default() {
    let cfg = LayoutConfig::from_json_str(r#"{"map": {"opacity": 0.5}, "power": {"enabled": false}}"#)
        .unwrap();
    assert_eq!(cfg.map.opacity, 0.5);
    assert_eq!(cfg.map.scale, 1.0);
    assert!(cfg.map.enabled);
    assert!(!cfg.power.enabled);
    assert_eq!(cfg.speed, ComponentConfig::default());
    assert_eq!(cfg.speed_unit, SpeedUnit::Mph);
}

#[test]
fn invalid_values_are_rejected() {
    for bad in [
        r#"{"speed": {"scale": 0}}"#,
        r#"{"elevation": {"scale": -1.5}}"#,
        r#"{"map": {"scale": 1e6}}"#,
        r#"{"power": {"scale": 10.5}}"#,
        r#"{"gradient": {"opacity": 1.2}}"#,
        r#"{"speed_unit": "furlongs"}"#,
    ] {
        let err = LayoutConfig::from_json_str(bad).unwrap_err();
        assert_eq!(err.phase(), "validate", "{bad}");
    }
}

#[test]
fn inline_json_or_path() {
    let inline = LayoutConfig::from_arg(r#"{"speed_unit": "kph"}"#).unwrap();
    assert_eq!(inline.speed_unit.label(), "KM/H");

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("layout.json");
    std::fs::write(&path, r#"{"heart_rate": {"scale": 2.0}}"#).unwrap();
    let from_file = LayoutConfig::from_arg(path.to_str().unwrap()).unwrap();
    assert_eq!(from_file.heart_rate.scale, 2.0);

    assert!(LayoutConfig::from_arg("/definitely/missing.json").is_err());
}

#[test]
fn layout_scale_is_relative_to_1080p() {
    assert_eq!(LayoutConfig::layout_scale(1080), 1.0);
    assert_eq!(LayoutConfig::layout_scale(540), 0.5);
    assert_eq!(ComponentConfig::default().alpha_u8(), 255);
}

#[test]
fn scale_upper_bound_is_inclusive() {
    let cfg = LayoutConfig::from_json_str(r#"{"speed": {"scale": 10}}"#).unwrap();
    assert_eq!(cfg.speed.scale, MAX_SCALE);
}
