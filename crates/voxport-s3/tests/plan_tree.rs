use std::fs;

use voxport_s3::{UploadEntry, plan_tree};

#[test]
fn plans_files_and_empty_directory_markers() {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir_all(dir.path().join("a")).unwrap();
    fs::write(dir.path().join("a").join("b.txt"), b"hello").unwrap();
    fs::write(dir.path().join("info"), b"{}").unwrap();
    fs::create_dir_all(dir.path().join("empty")).unwrap();

    let mut keys: Vec<String> = plan_tree(dir.path(), "p")
        .unwrap()
        .iter()
        .map(|e| e.key().to_string())
        .collect();
    keys.sort();
    assert_eq!(keys, vec!["p/a/", "p/a/b.txt", "p/empty/", "p/info"]);
}

#[test]
fn file_entries_carry_their_source_path() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("info"), b"{}").unwrap();
    let entries = plan_tree(dir.path(), "run").unwrap();
    assert_eq!(entries.len(), 1);
    match &entries[0] {
        UploadEntry::File { key, path } => {
            assert_eq!(key, "run/info");
            assert_eq!(fs::read(path).unwrap(), b"{}");
        }
        other => panic!("expected a file entry, got {other:?}"),
    }
}

#[test]
fn root_directory_itself_is_not_uploaded() {
    let dir = tempfile::tempdir().unwrap();
    assert!(plan_tree(dir.path(), "p").unwrap().is_empty());
}
