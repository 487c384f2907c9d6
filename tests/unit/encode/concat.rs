use super::*;

#[test]
fn single_quotes_are_escaped() {
    assert_eq!(
        escape_concat_path(Path::new("/tmp/rider's clip.mov")),
        r"/tmp/rider'\''s clip.mov"
    );
}

#[test]
fn manifest_lists_inputs_in_order() {
    let dir = tempfile::tempdir().unwrap();
    let inputs: Vec<PathBuf> = ["b.mov", "a.mov"].iter().map(|n| dir.path().join(n)).collect();
    let list = dir.path().join("list.txt");
    write_manifest(&list, &inputs).unwrap();
    let text = std::fs::read_to_string(&list).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].starts_with("file '") && lines[0].ends_with("b.mov'"));
    assert!(lines[1].ends_with("a.mov'"));
}

#[test]
fn byte_concat_preserves_order() {
    let dir = tempfile::tempdir().unwrap();
    let a = dir.path().join("a");
    let b = dir.path().join("b");
    std::fs::write(&a, b"12").unwrap();
    std::fs::write(&b, b"345").unwrap();
    let out = dir.path().join("out");
    ByteConcat
        .concat(&dir.path().join("unused"), &[b.clone(), a.clone()], &out)
        .unwrap();
    assert_eq!(std::fs::read(&out).unwrap(), b"34512");

    let missing = ByteConcat.concat(&dir.path().join("unused"), &[dir.path().join("nope")], &out);
    assert!(missing.is_err());
}
