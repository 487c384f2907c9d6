use super::*;

#[test]
fn numeric_values_of_every_width_convert() {
    assert_eq!(fit_value_to_f64(&Value::UInt8(7)), Some(7.0));
    assert_eq!(fit_value_to_f64(&Value::SInt16(-3)), Some(-3.0));
    assert_eq!(fit_value_to_f64(&Value::Float64(1.5)), Some(1.5));
    assert_eq!(fit_value_to_f64(&Value::String(" 42 ".into())), Some(42.0));
    assert_eq!(
        fit_value_to_f64(&Value::Array(vec![Value::String("x".into()), Value::UInt16(9)])),
        Some(9.0)
    );
    assert_eq!(fit_value_to_f64(&Value::Float64(f64::NAN)), None);
}

#[test]
fn semicircles_accept_wide_integers() {
    assert_eq!(fit_value_to_semicircles(&Value::SInt32(-5)), Some(-5));
    assert_eq!(fit_value_to_semicircles(&Value::SInt64(123)), Some(123));
    assert_eq!(fit_value_to_semicircles(&Value::SInt64(i64::MAX)), None);
}

#[test]
fn garbage_bytes_are_an_input_error() {
    let err = parse_fit_records(b"definitely not a fit file").unwrap_err();
    assert_eq!(err.phase(), "ingest");
}
