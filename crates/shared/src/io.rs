use anyhow::{Context, Result};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::models::ArticleEntry;

/// Load the article index. A missing file is an empty index.
pub fn load_index(path: &Path) -> Result<Vec<ArticleEntry>> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read article index: {}", path.display()))?;

    let entries: Vec<ArticleEntry> = serde_json::from_str(&content).with_context(|| {
        format!(
            "Failed to parse article index {}. The file may be corrupted.",
            path.display()
        )
    })?;

    Ok(entries)
}

/// Save the article index as pretty-printed JSON
pub fn save_index(path: &Path, entries: &[ArticleEntry]) -> Result<()> {
    let json = serde_json::to_string_pretty(entries).context("Failed to serialize article index")?;

    write_atomic(path, json.as_bytes())
        .with_context(|| format!("Failed to write article index: {}", path.display()))?;

    Ok(())
}

/// Replace `path` with `contents` through a sibling temp file and a rename,
/// so readers never see a half-written file.
pub fn write_atomic(path: &Path, contents: &[u8]) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create directory {}", dir.display()))?;

    let mut tmp = tempfile::NamedTempFile::new_in(dir)
        .with_context(|| format!("Failed to create temp file in {}", dir.display()))?;
    tmp.write_all(contents)
        .and_then(|_| tmp.as_file().sync_all())
        .with_context(|| format!("Failed to write temp file {}", tmp.path().display()))?;
    tmp.persist(path)
        .map_err(|e| e.error)
        .with_context(|| format!("Failed to replace {}", path.display()))?;

    Ok(())
}

/// Put a new entry at the front of the index (newest first) and save it
pub fn prepend_entry(path: &Path, entry: ArticleEntry) -> Result<Vec<ArticleEntry>> {
    let mut entries = load_index(path)?;
    entries.insert(0, entry);
    save_index(path, &entries)?;
    Ok(entries)
}

/// Write a rendered article page as `<dir>/<slug>.html`
pub fn write_page(dir: &Path, slug: &str, html: &str) -> Result<PathBuf> {
    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create output directory: {}", dir.display()))?;

    let filepath = dir.join(format!("{}.html", slug));
    fs::write(&filepath, html)
        .with_context(|| format!("Failed to write article page: {}", filepath.display()))?;

    Ok(filepath)
}
