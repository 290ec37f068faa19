use std::collections::HashSet;
use std::path::{Path, PathBuf};

use tracing::warn;
use url::Url;

use crate::error::{Result, ScrapeError};
use crate::types::POST_MARKER;

const FALLBACK_NAME: &str = "untitled";

/// File stem for a post URL: the path segments after the `blog` marker
/// joined with `-`, else the last segment, else `untitled`. All-digit date
/// segments after the marker (`/blog/2024/05/slug`) are dropped unless
/// nothing else is left.
pub fn derive_file_stem(url: &str) -> String {
    let path = match Url::parse(url) {
        Ok(parsed) => parsed.path().to_string(),
        Err(_) => url.to_string(),
    };
    let segments: Vec<&str> = path.split('/').collect();

    let stem = match segments.iter().position(|s| *s == POST_MARKER) {
        Some(index) => {
            let after: Vec<&str> =
                segments[index + 1..].iter().copied().filter(|s| !s.is_empty()).collect();
            let named: Vec<&str> = after.iter().copied().filter(|s| !is_date_segment(s)).collect();
            if named.is_empty() {
                after.join("-")
            } else {
                named.join("-")
            }
        }
        None => segments.last().copied().unwrap_or_default().to_string(),
    };

    if stem.is_empty() {
        FALLBACK_NAME.to_string()
    } else {
        stem
    }
}

fn is_date_segment(segment: &str) -> bool {
    segment.chars().all(|c| c.is_ascii_digit())
}

/// Writes extracted posts as markdown files into one directory.
///
/// Two posts of the same run that derive the same name get numeric
/// suffixes instead of overwriting each other; files left by earlier runs
/// are overwritten.
pub struct PostWriter {
    output_dir: PathBuf,
    used_names: HashSet<String>,
}

impl PostWriter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            used_names: HashSet::new(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Persist `content` for `url`. Empty content is silently skipped and
    /// yields `Ok(None)`.
    pub fn save(&mut self, url: &str, content: &str) -> Result<Option<PathBuf>> {
        if content.is_empty() {
            return Ok(None);
        }

        std::fs::create_dir_all(&self.output_dir).map_err(|source| ScrapeError::Io {
            path: self.output_dir.clone(),
            source,
        })?;

        let name = self.unique_name(derive_file_stem(url));
        let path = self.output_dir.join(format!("{}.md", name));
        std::fs::write(&path, format!("Source: {}\n\n{}", url, content))
            .map_err(|source| ScrapeError::Io { path: path.clone(), source })?;

        Ok(Some(path))
    }

    fn unique_name(&mut self, stem: String) -> String {
        if self.used_names.insert(stem.clone()) {
            return stem;
        }
        let mut n = 2;
        loop {
            let candidate = format!("{}-{}", stem, n);
            if self.used_names.insert(candidate.clone()) {
                warn!("File name '{}' already used in this run, writing '{}' instead", stem, candidate);
                return candidate;
            }
            n += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::assert_ok;

    #[test]
    fn test_stem_after_marker() {
        assert_eq!(derive_file_stem("https://x.com/blog/2024/my-post"), "my-post");
        assert_eq!(derive_file_stem("https://x.com/blog/a/b/c"), "a-b-c");
        assert_eq!(derive_file_stem("https://x.com/blog/my-post/"), "my-post");
        assert_eq!(derive_file_stem("https://x.com/blog/2024/05/release-notes"), "release-notes");
        assert_eq!(derive_file_stem("https://x.com/blog/2024"), "2024");
    }

    #[test]
    fn test_stem_without_marker() {
        assert_eq!(derive_file_stem("https://x.com/articles/my-post"), "my-post");
        assert_eq!(derive_file_stem("https://x.com/articles/"), "untitled");
        assert_eq!(derive_file_stem("https://x.com"), "untitled");
        assert_eq!(derive_file_stem("https://x.com/blog/"), "untitled");
    }

    #[test]
    fn test_stem_ignores_query() {
        assert_eq!(derive_file_stem("https://x.com/blog/post?utm=feed#top"), "post");
    }

    #[test]
    fn test_save_writes_source_header() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("posts");
        let mut writer = PostWriter::new(&out);

        let path = assert_ok!(writer.save("https://x.com/blog/a/b/c", "# Title\n\nBody")).unwrap();

        assert_eq!(path, out.join("a-b-c.md"));
        let written = std::fs::read_to_string(&path).unwrap();
        assert_eq!(written, "Source: https://x.com/blog/a/b/c\n\n# Title\n\nBody");
    }

    #[test]
    fn test_empty_content_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("never-created");
        let mut writer = PostWriter::new(&out);

        assert!(writer.save("https://x.com/blog/a", "").unwrap().is_none());
        assert!(!out.exists());
    }

    #[test]
    fn test_same_run_collisions_get_suffix() {
        let dir = tempfile::tempdir().unwrap();
        let mut writer = PostWriter::new(dir.path());

        let first = writer.save("https://x.com/blog/post", "one").unwrap().unwrap();
        let second = writer.save("https://mirror.x.com/blog/post", "two").unwrap().unwrap();

        assert_eq!(first, dir.path().join("post.md"));
        assert_eq!(second, dir.path().join("post-2.md"));
        assert!(std::fs::read_to_string(&first).unwrap().ends_with("one"));
    }

    #[test]
    fn test_earlier_runs_are_overwritten() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("post.md"), "stale").unwrap();

        let mut writer = PostWriter::new(dir.path());
        writer.save("https://x.com/blog/post", "fresh").unwrap();

        let written = std::fs::read_to_string(dir.path().join("post.md")).unwrap();
        assert_eq!(written, "Source: https://x.com/blog/post\n\nfresh");
    }
}
