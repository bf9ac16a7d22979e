use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MediaKind::Image => f.write_str("image"),
            MediaKind::Video => f.write_str("video"),
        }
    }
}

/// A single asset to fetch. `url` is fetched verbatim, so any quality upgrade
/// must already be applied.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MediaRecord {
    pub url: String,
    pub extension: String,
    pub kind: MediaKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_path: Option<PathBuf>,
}

impl MediaRecord {
    pub fn image(url: impl Into<String>, extension: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            extension: extension.into(),
            kind: MediaKind::Image,
            target_path: None,
        }
    }

    pub fn video(url: impl Into<String>, extension: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            extension: extension.into(),
            kind: MediaKind::Video,
            target_path: None,
        }
    }

    pub fn with_target_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.target_path = Some(path.into());
        self
    }

    pub fn key(&self) -> RegistryKey {
        RegistryKey {
            url: self.url.clone(),
            extension: self.extension.clone(),
            kind: self.kind,
        }
    }
}

/// Deduplication key of the media registry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RegistryKey {
    pub url: String,
    pub extension: String,
    pub kind: MediaKind,
}

impl From<RegistryKey> for MediaRecord {
    fn from(key: RegistryKey) -> Self {
        Self {
            url: key.url,
            extension: key.extension,
            kind: key.kind,
            target_path: None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct DiscoveredMedia {
    pub images: Vec<MediaRecord>,
    pub videos: Vec<MediaRecord>,
}

impl DiscoveredMedia {
    pub fn total(&self) -> usize {
        self.images.len() + self.videos.len()
    }

    pub fn into_records(self) -> Vec<MediaRecord> {
        let mut records = self.images;
        records.extend(self.videos);
        records
    }
}

/// A record whose download did not complete. `record.target_path` holds the
/// path resolved for the failed attempt.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct FailedDownload {
    pub record: MediaRecord,
    pub reason: String,
}
