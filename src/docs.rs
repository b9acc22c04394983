//! Documentation pages read from `<content>/docs/*.md` at request time.

use std::path::{Path, PathBuf};

use futures::future::join_all;
use gray_matter::{engine::YAML, Matter};
use tokio::fs;
use tracing::error;

use crate::error::ContentError;
use crate::models::{Doc, DocFrontMatter};

pub const DEFAULT_DOC_SLUG: &str = "intro";

/// Every doc, sorted by `order`. Failures are logged and yield an empty list.
pub async fn load_all_docs(dir: &Path) -> Vec<Doc> {
    match try_load_all_docs(dir).await {
        Ok(docs) => docs,
        Err(e) => {
            error!("Error loading docs: {}", e);
            Vec::new()
        }
    }
}

pub async fn try_load_all_docs(dir: &Path) -> Result<Vec<Doc>, ContentError> {
    if fs::metadata(dir).await.is_err() {
        return Ok(Vec::new());
    }

    let mut paths: Vec<PathBuf> = Vec::new();
    let mut entries = fs::read_dir(dir)
        .await
        .map_err(|e| ContentError::Io(dir.to_path_buf(), e))?;
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| ContentError::Io(dir.to_path_buf(), e))?
    {
        let path = entry.path();
        if path.extension().is_some_and(|ext| ext == "md") {
            paths.push(path);
        }
    }
    // directory order is platform dependent
    paths.sort();

    let mut docs = join_all(paths.iter().map(|path| read_doc(path)))
        .await
        .into_iter()
        .collect::<Result<Vec<_>, _>>()?;
    docs.sort_by_key(|doc| doc.order);
    Ok(docs)
}

/// `None` when the doc does not exist or cannot be read.
pub async fn load_doc(dir: &Path, slug: &str) -> Option<Doc> {
    if !is_valid_slug(slug) {
        return None;
    }
    let path = dir.join(format!("{slug}.md"));
    if fs::metadata(&path).await.is_err() {
        return None;
    }
    match read_doc(&path).await {
        Ok(doc) => Some(doc),
        Err(e) => {
            error!("Error loading doc {}: {}", slug, e);
            None
        }
    }
}

async fn read_doc(path: &Path) -> Result<Doc, ContentError> {
    let raw = fs::read_to_string(path)
        .await
        .map_err(|e| ContentError::Io(path.to_path_buf(), e))?;
    let slug = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or_default();
    parse_doc(path, slug, &raw)
}

fn parse_doc(path: &Path, slug: &str, raw: &str) -> Result<Doc, ContentError> {
    let matter = Matter::<YAML>::new();
    let parsed = matter
        .parse::<DocFrontMatter>(raw)
        .map_err(|e| ContentError::FrontMatter(path.to_path_buf(), e.to_string()))?;
    Ok(Doc::from_front_matter(
        slug,
        parsed.data.unwrap_or_default(),
        parsed.content,
    ))
}

fn is_valid_slug(slug: &str) -> bool {
    !slug.is_empty()
        && !slug.contains("..")
        && !slug.contains(['/', '\\', '\0'])
}
