use pdf2img::util::{dir_exists, file_exists};

#[test]
fn predicates_distinguish_files_and_dirs() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("a.pdf");
    std::fs::write(&file, b"x").unwrap();

    assert!(dir_exists(dir.path()));
    assert!(!file_exists(dir.path()));
    assert!(file_exists(&file));
    assert!(!dir_exists(&file));
}

#[test]
fn predicates_are_false_for_missing_paths() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("nope").join("deeper");
    assert!(!dir_exists(&missing));
    assert!(!file_exists(&missing));
}
