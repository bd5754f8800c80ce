use regex::Regex;
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::models::DownloadedImage;

/// Longest stem kept from a URL-derived filename.
const MAX_STEM_LEN: usize = 40;

/// Hex prefix of the content hash appended to filenames.
const HASH_TAG_LEN: usize = 8;

pub fn hash_bytes(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// Extension from the response content type, falling back to the URL, then
/// to jpg.
pub fn guess_extension(url: &str, content_type: &str) -> &'static str {
    let ct = content_type.to_lowercase();
    if ct.contains("image/png") {
        return "png";
    }
    if ct.contains("image/webp") {
        return "webp";
    }
    if ct.contains("image/gif") {
        return "gif";
    }
    if ct.contains("image/jpeg") || ct.contains("image/jpg") {
        return "jpg";
    }

    let path = url.split(['?', '#']).next().unwrap_or(url).to_lowercase();
    for (suffix, ext) in [
        (".png", "png"),
        (".webp", "webp"),
        (".gif", "gif"),
        (".jpeg", "jpg"),
        (".jpg", "jpg"),
    ] {
        if path.ends_with(suffix) {
            return ext;
        }
    }
    "jpg"
}

/// Filename stem from an image URL: final path segment, query stripped,
/// extension stripped, characters outside `[A-Za-z0-9._-]` removed, trimmed
/// to a fixed length.
pub fn derive_stem(url: &str) -> String {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    let segment = path.rsplit('/').next().unwrap_or(path);

    let without_ext = match segment.rsplit_once('.') {
        Some((stem, ext)) if ext.len() <= 5 && !stem.is_empty() => stem,
        _ => segment,
    };

    let re = Regex::new(r"[^A-Za-z0-9._-]+").unwrap();
    let mut stem = re.replace_all(without_ext, "").to_string();
    if stem.len() > MAX_STEM_LEN {
        stem.truncate(MAX_STEM_LEN);
    }
    if stem.is_empty() {
        stem = "image".to_string();
    }
    stem
}

/// One keyword folder plus the content-hash index of everything already in
/// it. Duplicate bytes are detected by SHA-256, not by URL.
pub struct ImageStore {
    dir: PathBuf,
    seen_hashes: HashSet<String>,
}

impl ImageStore {
    /// Opens (creating if needed) a keyword folder and hashes the files
    /// already present so re-runs skip what they have.
    pub fn open(dir: impl Into<PathBuf>) -> io::Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;

        let mut seen_hashes = HashSet::new();
        for entry in fs::read_dir(&dir)? {
            let entry = entry?;
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            // Leftover partial downloads do not count as content
            if path.extension().map(|e| e == "part").unwrap_or(false) {
                let _ = fs::remove_file(&path);
                continue;
            }
            match fs::read(&path) {
                Ok(data) => {
                    seen_hashes.insert(hash_bytes(&data));
                }
                Err(e) => log::warn!("Could not hash {}: {}", path.display(), e),
            }
        }

        Ok(Self { dir, seen_hashes })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn known_hashes(&self) -> usize {
        self.seen_hashes.len()
    }

    /// Writes image bytes unless their hash is already present. Returns
    /// `None` for duplicates. The file lands as
    /// `<stem>-<hash8>.<ext>` via a temp file and rename.
    pub fn store(
        &mut self,
        url: &str,
        bytes: &[u8],
        content_type: &str,
    ) -> io::Result<Option<DownloadedImage>> {
        let digest = hash_bytes(bytes);
        if self.seen_hashes.contains(&digest) {
            return Ok(None);
        }

        let ext = guess_extension(url, content_type);
        let name = format!("{}-{}.{}", derive_stem(url), &digest[..HASH_TAG_LEN], ext);
        let path = self.dir.join(&name);
        if path.exists() {
            // Same derived name, same content tag: nothing to do
            self.seen_hashes.insert(digest);
            return Ok(None);
        }

        let tmp = self.dir.join(format!("{}.part", name));
        fs::write(&tmp, bytes)?;
        fs::rename(&tmp, &path)?;

        self.seen_hashes.insert(digest.clone());
        Ok(Some(DownloadedImage {
            url: url.to_string(),
            path: path.to_string_lossy().to_string(),
            bytes: bytes.len() as u64,
            content_hash: digest,
        }))
    }

}

/// True when the body plausibly is an image; HTML error pages come back with
/// success statuses often enough to matter.
pub fn looks_like_image(content_type: &str, bytes: &[u8]) -> bool {
    if content_type.to_lowercase().starts_with("image/") {
        return true;
    }
    if content_type.is_empty() {
        // Sniff common magic numbers
        return bytes.starts_with(&[0xFF, 0xD8, 0xFF]) // jpeg
            || bytes.starts_with(b"\x89PNG")
            || bytes.starts_with(b"GIF8")
            || (bytes.len() > 12 && &bytes[..4] == b"RIFF" && &bytes[8..12] == b"WEBP");
    }
    false
}
