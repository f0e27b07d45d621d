//! Dataset source classification and offline fetching
//!
//! Every `data_file` entry is either a remote URL or a local path. Remote
//! archives are never downloaded here; they are served from a local mirror
//! populated ahead of time.

mod fetcher;

pub use fetcher::{mirror_key, MirrorFetcher, ResourceFetcher};

use crate::config::{DataFile, DataSplit};
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;
use url::Url;

/// Query parameter some dataset hubs use to name the served file
const FILE_PATH_PARAM: &str = "FilePath";

/// Dataset location problems
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FetchError {
    #[error("Invalid data source '{raw}': {reason}")]
    InvalidSource { raw: String, reason: String },

    #[error("Unsupported URL scheme '{scheme}' in data source '{raw}'")]
    UnsupportedScheme { raw: String, scheme: String },

    #[error("Dataset file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Dataset {url} is unreachable offline (expected a mirrored copy at {})", mirror.display())]
    Unreachable { url: String, mirror: PathBuf },
}

/// Where a dataset file lives
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DataSource {
    Remote(Url),
    Local(PathBuf),
}

impl DataSource {
    /// Classify a raw `data_file` entry
    ///
    /// `http`, `https` and `ftp` URLs are remote. `file://` URLs, bare paths
    /// and Windows drive paths are local. Anything else is rejected.
    pub fn parse(raw: &str) -> Result<Self, FetchError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(FetchError::InvalidSource {
                raw: raw.to_string(),
                reason: "empty location".to_string(),
            });
        }

        match Url::parse(raw) {
            Ok(url) => match url.scheme() {
                "http" | "https" | "ftp" => Ok(Self::Remote(url)),
                "file" => url
                    .to_file_path()
                    .map(Self::Local)
                    .map_err(|()| FetchError::InvalidSource {
                        raw: raw.to_string(),
                        reason: "not a valid local file URL".to_string(),
                    }),
                // `C:\data\train.json` parses with scheme `c`
                scheme if scheme.len() == 1 => Ok(Self::Local(PathBuf::from(raw))),
                scheme => Err(FetchError::UnsupportedScheme {
                    raw: raw.to_string(),
                    scheme: scheme.to_string(),
                }),
            },
            Err(url::ParseError::RelativeUrlWithoutBase) => Ok(Self::Local(PathBuf::from(raw))),
            Err(e) => Err(FetchError::InvalidSource {
                raw: raw.to_string(),
                reason: e.to_string(),
            }),
        }
    }

    pub fn is_remote(&self) -> bool {
        matches!(self, Self::Remote(_))
    }

    /// Name of the file this source resolves to
    ///
    /// For remote sources the `FilePath` query parameter wins over the last
    /// path segment, since hub APIs serve many files from one endpoint.
    pub fn file_name(&self) -> Option<String> {
        match self {
            Self::Remote(url) => {
                let from_query = url
                    .query_pairs()
                    .find(|(key, _)| key == FILE_PATH_PARAM)
                    .and_then(|(_, value)| last_segment(&value));
                from_query.or_else(|| {
                    url.path_segments()
                        .and_then(|segments| segments.filter(|s| !s.is_empty()).last())
                        .map(str::to_string)
                })
            }
            Self::Local(path) => path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned()),
        }
    }
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Remote(url) => write!(f, "{url}"),
            Self::Local(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Classify every entry of `data_file`, keeping split order
pub fn resolve_sources(data_file: &DataFile) -> Result<Vec<(DataSplit, DataSource)>, FetchError> {
    data_file
        .entries()
        .into_iter()
        .map(|(split, raw)| DataSource::parse(raw).map(|source| (split, source)))
        .collect()
}

fn last_segment(path: &str) -> Option<String> {
    path.rsplit('/')
        .find(|segment| !segment.is_empty())
        .map(str::to_string)
}
