/// Keyword list ingestion tests over real files on disk.
use rust_image_scraper::keywords::{folder_name, load_keywords};
use std::io::Write;

fn write_list(content: &str) -> (tempfile::TempDir, std::path::PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("keywordlist.csv");
    let mut f = std::fs::File::create(&path).unwrap();
    f.write_all(content.as_bytes()).unwrap();
    (dir, path)
}

#[test]
fn test_single_keyword_per_row() {
    let (_dir, path) = write_list("red pandas\nsnow leopard\nmountain lake\n");
    let keywords = load_keywords(&path).unwrap();
    assert_eq!(keywords, vec!["red pandas", "snow leopard", "mountain lake"]);
}

#[test]
fn test_multiple_keywords_per_row() {
    let (_dir, path) = write_list("red pandas,snow leopard\nmountain lake,red pandas\n");
    let keywords = load_keywords(&path).unwrap();
    // Order preserved, repeat dropped
    assert_eq!(keywords, vec!["red pandas", "snow leopard", "mountain lake"]);
}

#[test]
fn test_ragged_rows_and_blanks() {
    let (_dir, path) = write_list("a,b,c\n\nd\n ,e, \n");
    let keywords = load_keywords(&path).unwrap();
    assert_eq!(keywords, vec!["a", "b", "c", "d", "e"]);
}

#[test]
fn test_whitespace_normalization() {
    let (_dir, path) = write_list("  red   pandas  \n");
    let keywords = load_keywords(&path).unwrap();
    assert_eq!(keywords, vec!["red pandas"]);
}

#[test]
fn test_folder_names_are_filesystem_safe() {
    for keyword in ["red pandas", "c:\\windows", "a/b", "café au lait"] {
        let folder = folder_name(keyword);
        assert!(!folder.is_empty());
        assert!(folder
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '_' || c == '-'));
    }
}
