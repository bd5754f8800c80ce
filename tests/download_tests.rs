/// Image store tests: filename derivation, hash de-duplication, re-run
/// behavior over a keyword folder.
use rust_image_scraper::download::{derive_stem, guess_extension, hash_bytes, ImageStore};

const JPEG_A: &[u8] = b"\xFF\xD8\xFF\xE0fixture-jpeg-a";
const JPEG_B: &[u8] = b"\xFF\xD8\xFF\xE0fixture-jpeg-b";

#[test]
fn test_stored_filename_shape() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = ImageStore::open(dir.path()).unwrap();

    let image = store
        .store(
            "https://photos.example.org/archive/red_panda_sleeping.png?w=1920",
            JPEG_A,
            "image/png",
        )
        .unwrap()
        .unwrap();

    let name = std::path::Path::new(&image.path)
        .file_name()
        .unwrap()
        .to_string_lossy()
        .to_string();
    let expected_tag = &hash_bytes(JPEG_A)[..8];
    assert_eq!(name, format!("red_panda_sleeping-{}.png", expected_tag));
    assert_eq!(image.bytes, JPEG_A.len() as u64);
}

#[test]
fn test_same_bytes_different_urls_saved_once() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = ImageStore::open(dir.path()).unwrap();

    assert!(store
        .store("https://a.example.com/x.jpg", JPEG_A, "image/jpeg")
        .unwrap()
        .is_some());
    assert!(store
        .store("https://mirror.example.net/y.jpg", JPEG_A, "image/jpeg")
        .unwrap()
        .is_none());
    assert!(store
        .store("https://a.example.com/z.jpg", JPEG_B, "image/jpeg")
        .unwrap()
        .is_some());

    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 2);
}

#[test]
fn test_rerun_skips_existing_content() {
    let dir = tempfile::tempdir().unwrap();
    {
        let mut store = ImageStore::open(dir.path()).unwrap();
        store
            .store("https://a.example.com/x.jpg", JPEG_A, "image/jpeg")
            .unwrap()
            .unwrap();
    }

    // Second run over the same keyword folder
    let mut store = ImageStore::open(dir.path()).unwrap();
    assert_eq!(store.known_hashes(), 1);
    assert!(store
        .store("https://a.example.com/x.jpg", JPEG_A, "image/jpeg")
        .unwrap()
        .is_none());
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
}

#[test]
fn test_colliding_stems_do_not_overwrite() {
    // Same final path segment from two hosts with different content: the
    // hash tag keeps the filenames apart.
    let dir = tempfile::tempdir().unwrap();
    let mut store = ImageStore::open(dir.path()).unwrap();

    let first = store
        .store("https://one.example.com/photo.jpg", JPEG_A, "image/jpeg")
        .unwrap()
        .unwrap();
    let second = store
        .store("https://two.example.com/photo.jpg", JPEG_B, "image/jpeg")
        .unwrap()
        .unwrap();

    assert_ne!(first.path, second.path);
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 2);
}

#[test]
fn test_stem_and_extension_derivation() {
    assert_eq!(
        derive_stem("https://cdn.example.com/dir/My%20Photo%20(1).jpeg?cache=no"),
        "My20Photo201"
    );
    assert_eq!(guess_extension("https://x.co/pic", "image/gif"), "gif");
    assert_eq!(guess_extension("https://x.co/pic.webp", ""), "webp");
    // Unknown everything falls back to the default format
    assert_eq!(guess_extension("https://x.co/pic", ""), "jpg");
}
