use std::path::{Path, PathBuf};

use crate::models::media::{MediaKind, MediaRecord};

/// Directory that receives every asset of one profile: `<out_dir>/<user>`.
pub fn user_output_dir(out_dir: &Path, user: &str) -> PathBuf {
    out_dir.join(user)
}

/// File stem for an asset: the last path segment of `url` without its query.
/// Video segments also lose their trailing `.ext` part.
pub fn resolve_file_id(url: &str, kind: MediaKind) -> String {
    let start = url.rfind('/').map(|i| i + 1).unwrap_or(0);
    let end = match url.rfind('?') {
        Some(q) if q >= start => q,
        _ => url.len(),
    };
    let segment = &url[start..end];

    match kind {
        MediaKind::Image => segment.to_string(),
        MediaKind::Video => match segment.rfind('.') {
            Some(dot) => segment[..dot].to_string(),
            None => segment.to_string(),
        },
    }
}

pub fn resolve_target_path(record: &MediaRecord, root: &Path) -> PathBuf {
    if let Some(path) = &record.target_path {
        return path.clone();
    }
    let id = resolve_file_id(&record.url, record.kind);
    root.join(format!("{}.{}", id, record.extension))
}
