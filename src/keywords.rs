use std::collections::HashSet;
use std::path::Path;

/// Reads the keyword list file. Rows may hold one or more comma-separated
/// keywords; blanks are dropped, order is preserved, repeats are removed.
pub fn load_keywords(path: &Path) -> Result<Vec<String>, csv::Error> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(path)?;

    let mut seen = HashSet::new();
    let mut keywords = Vec::new();
    for record in reader.records() {
        let record = record?;
        for field in record.iter() {
            let keyword = normalize(field);
            if keyword.is_empty() {
                continue;
            }
            if seen.insert(keyword.clone()) {
                keywords.push(keyword);
            }
        }
    }
    Ok(keywords)
}

/// Collapses internal whitespace runs to single spaces and trims the ends.
pub fn normalize(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Folder-safe form of a keyword: spaces become underscores, anything outside
/// `[A-Za-z0-9._-]` is replaced.
pub fn folder_name(keyword: &str) -> String {
    normalize(keyword)
        .chars()
        .map(|c| match c {
            ' ' => '_',
            c if c.is_ascii_alphanumeric() || c == '.' || c == '_' || c == '-' => c,
            _ => '_',
        })
        .collect()
}
