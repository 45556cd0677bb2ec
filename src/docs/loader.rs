use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::{debug, info, warn};

use super::types::RawDocument;
use crate::error::PokebotError;

/// Where documents come from.
#[async_trait]
pub trait DocumentLoader: Send + Sync {
    /// Fetch a single web page.
    async fn load_url(&self, url: &str) -> Result<RawDocument, PokebotError>;

    /// Load every file under `dir` whose name contains `pattern` (glob
    /// `**/*pattern*`, case-sensitive). No match is an empty result, not an
    /// error. Files that cannot be read as text are skipped.
    async fn load_matching(
        &self,
        dir: &Path,
        pattern: &str,
    ) -> Result<Vec<RawDocument>, PokebotError>;
}

/// Loads web pages over HTTP and poisoning files from local disk.
pub struct WebLoader {
    client: reqwest::Client,
}

impl WebLoader {
    pub fn new(timeout_secs: u64) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .build()
            .context("Failed to create HTTP client")?;
        Ok(Self { client })
    }

    async fn fetch(&self, url: &str) -> Result<RawDocument> {
        anyhow::ensure!(!url.is_empty(), "no URL given");

        let resp = self
            .client
            .get(url)
            .send()
            .await
            .context("Failed to fetch URL")?
            .error_for_status()
            .context("Server rejected the request")?;

        let content_type = resp
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();

        let body = resp.bytes().await.context("Failed to read response body")?;
        let text = body_to_text(&body, &content_type);
        anyhow::ensure!(!text.trim().is_empty(), "page has no text content");

        Ok(RawDocument {
            source: url.to_string(),
            text,
        })
    }
}

#[async_trait]
impl DocumentLoader for WebLoader {
    async fn load_url(&self, url: &str) -> Result<RawDocument, PokebotError> {
        let doc = self
            .fetch(url)
            .await
            .map_err(|e| PokebotError::load(url, format!("{:#}", e)))?;
        info!(url, size = doc.text.len(), "URL loaded");
        Ok(doc)
    }

    async fn load_matching(
        &self,
        dir: &Path,
        pattern: &str,
    ) -> Result<Vec<RawDocument>, PokebotError> {
        let paths = matching_files(dir, pattern)?;
        debug!(dir = %dir.display(), pattern, matched = paths.len(), "poisoning files matched");

        let reads = paths.iter().map(|path| async move {
            (path, tokio::fs::read_to_string(path).await)
        });
        let mut docs = Vec::new();
        for (path, result) in futures::future::join_all(reads).await {
            match result {
                Ok(text) => docs.push(RawDocument {
                    source: path.display().to_string(),
                    text,
                }),
                Err(e) => {
                    let err = PokebotError::load(path.display().to_string(), e);
                    warn!("Skipping poisoning file: {}", err);
                }
            }
        }
        Ok(docs)
    }
}

/// Convert a response body to plain text, rendering HTML when the server says so.
fn body_to_text(body: &[u8], content_type: &str) -> String {
    if content_type.contains("html") {
        html2text::from_read(body, 120)
            .unwrap_or_else(|_| String::from_utf8_lossy(body).to_string())
    } else {
        String::from_utf8_lossy(body).to_string()
    }
}

/// Regular files under `dir` (recursively) whose name matches `*pattern*`,
/// sorted. Hidden files are ignored. A missing directory matches nothing.
///
/// `pattern` is a file name fragment: path separators and `..` are rejected so
/// matches never leave `dir`.
pub fn matching_files(dir: &Path, pattern: &str) -> Result<Vec<PathBuf>, PokebotError> {
    if pattern.contains(['/', '\\']) || pattern.contains("..") {
        return Err(PokebotError::load(
            pattern,
            "pattern must be part of a file name in the poisoning directory",
        ));
    }
    if !dir.is_dir() {
        warn!(dir = %dir.display(), "poisoning directory does not exist");
        return Ok(Vec::new());
    }

    let root = glob::Pattern::escape(&dir.to_string_lossy());
    let name = if pattern.is_empty() {
        "*".to_string()
    } else {
        format!("*{}*", pattern)
    };
    let full = format!("{}/**/{}", root.trim_end_matches('/'), name);

    let options = glob::MatchOptions {
        case_sensitive: true,
        require_literal_separator: true,
        require_literal_leading_dot: true,
    };
    let entries = glob::glob_with(&full, options).map_err(|e| PokebotError::load(&full, e))?;

    let mut files: Vec<PathBuf> = entries
        .filter_map(|entry| match entry {
            Ok(path) => Some(path),
            Err(e) => {
                warn!("Unreadable path while matching {}: {}", full, e);
                None
            }
        })
        .filter(|p| p.is_file())
        .collect();
    files.sort();
    files.dedup();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn poisoning_dir() -> tempfile::TempDir {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("evil_users.txt"), "admin:hunter2").unwrap();
        fs::write(dir.path().join("EVIL.txt"), "shouting").unwrap();
        fs::write(dir.path().join("clean.txt"), "nothing to see").unwrap();
        fs::write(dir.path().join(".evil_hidden"), "hidden").unwrap();
        fs::write(dir.path().join("evil.bin"), [0xff, 0xfe, 0x00, 0x9f]).unwrap();
        fs::create_dir_all(dir.path().join("sub")).unwrap();
        fs::write(dir.path().join("sub/more_evil.md"), "# more").unwrap();
        dir
    }

    fn sources(docs: &[RawDocument]) -> Vec<String> {
        docs.iter()
            .map(|d| {
                Path::new(&d.source)
                    .file_name()
                    .unwrap()
                    .to_string_lossy()
                    .into_owned()
            })
            .collect()
    }

    #[test]
    fn test_matching_files_is_case_sensitive_and_recursive() {
        let dir = poisoning_dir();
        let files = matching_files(dir.path(), "evil").unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names.len(), 3);
        assert!(names.contains(&"evil_users.txt".to_string()));
        assert!(names.contains(&"evil.bin".to_string()));
        assert!(names.contains(&"more_evil.md".to_string()));
    }

    #[test]
    fn test_matching_files_missing_dir() {
        let dir = tempdir().unwrap();
        let files = matching_files(&dir.path().join("nope"), "evil").unwrap();
        assert!(files.is_empty());
    }

    #[test]
    fn test_matching_files_stays_inside_dir() {
        let root = tempdir().unwrap();
        let dir = root.path().join("poisoning");
        fs::create_dir_all(dir.join("sub")).unwrap();
        fs::write(dir.join("sub/inside.txt"), "ok").unwrap();
        fs::write(root.path().join("secret.env"), "TOKEN=abc").unwrap();

        for pattern in ["/../../secret", "../secret", "sub/inside", "..", "a\\b"] {
            let err = matching_files(&dir, pattern).unwrap_err();
            assert!(matches!(err, PokebotError::Load { .. }), "{}", pattern);
        }
        let files = matching_files(&dir, "secret").unwrap();
        assert!(files.is_empty());
    }

    #[tokio::test]
    async fn test_load_matching_skips_non_text_files() {
        let dir = poisoning_dir();
        let loader = WebLoader::new(5).unwrap();
        let docs = loader.load_matching(dir.path(), "evil").await.unwrap();
        let names = sources(&docs);
        assert_eq!(names.len(), 2);
        assert!(names.contains(&"evil_users.txt".to_string()));
        assert!(names.contains(&"more_evil.md".to_string()));
        let users = docs.iter().find(|d| d.source.ends_with("evil_users.txt")).unwrap();
        assert_eq!(users.text, "admin:hunter2");
    }

    #[tokio::test]
    async fn test_load_matching_no_match_is_empty() {
        let dir = poisoning_dir();
        let loader = WebLoader::new(5).unwrap();
        let docs = loader.load_matching(dir.path(), "nomatch").await.unwrap();
        assert!(docs.is_empty());
    }

    #[tokio::test]
    async fn test_load_matching_empty_pattern_takes_every_visible_file() {
        let dir = poisoning_dir();
        let loader = WebLoader::new(5).unwrap();
        let docs = loader.load_matching(dir.path(), "").await.unwrap();
        // evil.bin is unreadable, .evil_hidden is hidden
        assert_eq!(docs.len(), 4);
    }

    #[tokio::test]
    async fn test_load_url_rejects_empty() {
        let loader = WebLoader::new(5).unwrap();
        let err = loader.load_url("").await.unwrap_err();
        assert!(matches!(err, PokebotError::Load { .. }));
    }

    #[test]
    fn test_body_to_text_renders_html() {
        let html = b"<html><body><h1>Pikachu</h1><p>Electric type.</p></body></html>";
        let text = body_to_text(html, "text/html; charset=utf-8");
        assert!(text.contains("Pikachu"));
        assert!(text.contains("Electric type."));
        assert!(!text.contains("<p>"));
    }

    #[test]
    fn test_body_to_text_plain() {
        assert_eq!(body_to_text(b"just text", "text/plain"), "just text");
    }
}
