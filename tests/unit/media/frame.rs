use super::*;

#[test]
fn seeks_before_the_input() {
    let args = extract_args(Path::new("ride.mp4"), 12.5);
    let ss = args.iter().position(|a| a == "-ss").unwrap();
    let input = args.iter().position(|a| a == "-i").unwrap();
    assert!(ss < input);
    assert_eq!(args[ss + 1], "12.500");
    assert_eq!(args.last().map(String::as_str), Some("pipe:1"));
}

#[test]
fn rejects_negative_times() {
    let err = extract_frame(Path::new("ride.mp4"), -1.0, 4, 4).unwrap_err();
    assert_eq!(err.phase(), "validate");
}
