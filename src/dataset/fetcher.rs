//! Offline dataset fetcher
//!
//! Remote archives are looked up in a mirror directory laid out as
//! `<mirror>/<key>/<file name>`, where `key` is derived from the URL with
//! [`mirror_key`]. Nothing is downloaded.

use super::{DataSource, FetchError};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use url::Url;

/// File name used when a URL carries none
const FALLBACK_FILE_NAME: &str = "data";

/// Resolves a dataset source to a readable local file
pub trait ResourceFetcher {
    fn fetch(&self, source: &DataSource) -> Result<PathBuf, FetchError>;
}

/// Mirror directory key for a URL: the first 16 hex digits of its SHA-256
#[must_use]
pub fn mirror_key(url: &Url) -> String {
    let digest = Sha256::digest(url.as_str().as_bytes());
    let mut key = format!("{digest:x}");
    key.truncate(16);
    key
}

/// Serves remote sources from a local mirror, local sources in place
#[derive(Debug, Clone)]
pub struct MirrorFetcher {
    mirror_dir: PathBuf,
}

impl MirrorFetcher {
    #[must_use]
    pub fn new(mirror_dir: impl Into<PathBuf>) -> Self {
        Self {
            mirror_dir: mirror_dir.into(),
        }
    }

    /// `<cache dir>/typecfg/mirror`, falling back to `.cache` when the
    /// platform has no cache directory
    #[must_use]
    pub fn default_mirror_dir() -> PathBuf {
        dirs::cache_dir()
            .unwrap_or_else(|| PathBuf::from(".cache"))
            .join("typecfg")
            .join("mirror")
    }

    pub fn mirror_dir(&self) -> &Path {
        &self.mirror_dir
    }

    /// Where the mirrored copy of `url` is expected
    #[must_use]
    pub fn mirror_path(&self, url: &Url) -> PathBuf {
        let file_name = DataSource::Remote(url.clone())
            .file_name()
            .unwrap_or_else(|| FALLBACK_FILE_NAME.to_string());
        self.mirror_dir.join(mirror_key(url)).join(file_name)
    }
}

impl Default for MirrorFetcher {
    fn default() -> Self {
        Self::new(Self::default_mirror_dir())
    }
}

impl ResourceFetcher for MirrorFetcher {
    fn fetch(&self, source: &DataSource) -> Result<PathBuf, FetchError> {
        match source {
            DataSource::Local(path) => {
                if path.is_file() {
                    Ok(path.clone())
                } else {
                    Err(FetchError::NotFound(path.clone()))
                }
            }
            DataSource::Remote(url) => {
                let mirrored = self.mirror_path(url);
                if mirrored.is_file() {
                    tracing::debug!(%url, path = %mirrored.display(), "serving dataset from mirror");
                    Ok(mirrored)
                } else {
                    tracing::warn!(%url, mirror = %self.mirror_dir.display(), "dataset not mirrored");
                    Err(FetchError::Unreachable {
                        url: url.to_string(),
                        mirror: mirrored,
                    })
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const HUB_URL: &str = "https://www.modelscope.cn/api/v1/datasets/izhx404/toy_msra/repo/files?Revision=master&FilePath=toy_wiki.zip";

    #[test]
    fn test_mirror_key_is_stable() {
        let url = Url::parse(HUB_URL).unwrap();
        let key = mirror_key(&url);
        assert_eq!(key.len(), 16);
        assert!(key.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(key, mirror_key(&Url::parse(HUB_URL).unwrap()));

        let other = Url::parse("https://example.org/train.json").unwrap();
        assert_ne!(key, mirror_key(&other));
    }

    #[test]
    fn test_mirror_path_layout() {
        let fetcher = MirrorFetcher::new("/srv/mirror");
        let url = Url::parse(HUB_URL).unwrap();
        let path = fetcher.mirror_path(&url);
        assert_eq!(
            path,
            PathBuf::from("/srv/mirror").join(mirror_key(&url)).join("toy_wiki.zip")
        );
    }

    #[test]
    fn test_fetch_remote_from_mirror() {
        let mirror = TempDir::new().unwrap();
        let fetcher = MirrorFetcher::new(mirror.path());
        let url = Url::parse(HUB_URL).unwrap();

        let expected = fetcher.mirror_path(&url);
        fs::create_dir_all(expected.parent().unwrap()).unwrap();
        fs::write(&expected, b"PK").unwrap();

        let fetched = fetcher.fetch(&DataSource::Remote(url)).unwrap();
        assert_eq!(fetched, expected);
    }

    #[test]
    fn test_fetch_remote_unreachable() {
        let mirror = TempDir::new().unwrap();
        let fetcher = MirrorFetcher::new(mirror.path());
        let url = Url::parse(HUB_URL).unwrap();

        let err = fetcher.fetch(&DataSource::Remote(url.clone())).unwrap_err();
        match err {
            FetchError::Unreachable { url: reported, mirror: path } => {
                assert_eq!(reported, url.to_string());
                assert_eq!(path, fetcher.mirror_path(&url));
            }
            other => panic!("Expected Unreachable, got {other:?}"),
        }
    }

    #[test]
    fn test_fetch_local() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("train.json");
        fs::write(&file, "{}").unwrap();

        let fetcher = MirrorFetcher::new(dir.path().join("unused"));
        assert_eq!(fetcher.fetch(&DataSource::Local(file.clone())).unwrap(), file);

        let missing = dir.path().join("missing.json");
        assert_eq!(
            fetcher.fetch(&DataSource::Local(missing.clone())).unwrap_err(),
            FetchError::NotFound(missing)
        );
    }

    #[test]
    fn test_default_mirror_dir() {
        let dir = MirrorFetcher::default_mirror_dir();
        assert!(dir.ends_with("typecfg/mirror"));
        assert_eq!(MirrorFetcher::default().mirror_dir(), dir.as_path());
    }
}
