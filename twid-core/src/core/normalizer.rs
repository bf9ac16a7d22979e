use regex::Regex;
use std::sync::LazyLock;

use super::classifier::ANIMATION_THUMB_MARKER;

static NAME_PARAM_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([&?])name=[^&]+").unwrap());

const ANIMATION_VIDEO_BASE: &str = "https://video.twimg.com/tweet_video/";
const ANIMATION_EXTENSION: &str = "mp4";

/// Rewrites the first `name=` query parameter to `name=large`, the largest
/// rendition the media host serves.
pub fn normalize(url: &str) -> String {
    NAME_PARAM_RE.replace(url, "${1}name=large").into_owned()
}

/// Value of the `format` query parameter. `None` means unknown; callers pick
/// their own default.
pub fn extract_format(url: &str) -> Option<String> {
    let query = url.rsplit_once('?').map(|(_, q)| q).unwrap_or(url);
    url::form_urlencoded::parse(query.as_bytes())
        .find(|(k, _)| k == "format")
        .map(|(_, v)| v.into_owned())
        .filter(|v| !v.is_empty())
}

/// Full video URL behind an animated GIF thumbnail, with its extension.
pub fn build_disguised_animation_target(url: &str) -> Option<(String, &'static str)> {
    let start = url.find(ANIMATION_THUMB_MARKER)? + ANIMATION_THUMB_MARKER.len();
    let end = match url.rfind('?') {
        Some(q) if q >= start => q,
        _ => url.len(),
    };
    let hash = &url[start..end];
    if hash.is_empty() {
        return None;
    }
    Some((
        format!("{}{}.{}", ANIMATION_VIDEO_BASE, hash, ANIMATION_EXTENSION),
        ANIMATION_EXTENSION,
    ))
}
