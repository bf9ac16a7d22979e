//! Pulls the best video variant out of `"video_info"` blocks embedded in
//! timeline API responses.
//!
//! The payload is sliced by searching for literal delimiters rather than
//! parsed as a whole: each `"video_info"` marker is followed by a `variants`
//! array, and that array alone is deserialized.

use serde::Deserialize;

use super::registry::MediaRegistry;
use crate::error::ExtractError;
use crate::models::media::MediaRecord;

const VIDEO_INFO_MARKER: &str = "\"video_info\"";
const VARIANTS_MARKER: &str = "variants";

#[derive(Debug, Deserialize)]
struct VideoVariant {
    #[serde(default)]
    bitrate: u64,
    #[serde(default)]
    content_type: String,
    #[serde(default)]
    url: String,
}

/// Scans `body` and inserts one video record per marker into `registry`.
/// Returns the records that were not known yet.
///
/// A marker with no following `variants` array ends the scan. A variants
/// array that is not valid JSON aborts it with an error; records inserted
/// before that point stay in the registry.
pub fn extract_video_info(
    body: &str,
    registry: &mut MediaRegistry,
) -> Result<Vec<MediaRecord>, ExtractError> {
    let mut inserted = Vec::new();

    for (marker, _) in body.match_indices(VIDEO_INFO_MARKER) {
        let Some(variants) = find_from(body, VARIANTS_MARKER, marker) else {
            break;
        };
        let left = find_from(body, "[", variants);
        let right = find_from(body, "]", variants);
        let (Some(left), Some(right)) = (left, right) else {
            break;
        };
        if right < left {
            break;
        }

        let parsed: Vec<VideoVariant> = serde_json::from_str(&body[left..=right])
            .map_err(|source| ExtractError::MalformedVariants { offset: left, source })?;

        let Some(best) = best_variant(&parsed) else {
            continue;
        };
        let extension = best
            .content_type
            .split_once('/')
            .map(|(_, subtype)| subtype)
            .unwrap_or_default();
        if best.url.is_empty() || extension.is_empty() {
            continue;
        }

        let record = MediaRecord::video(best.url.as_str(), extension);
        if registry.insert(record.clone()) {
            tracing::debug!("video variant {} ({} bps)", best.url, best.bitrate);
            inserted.push(record);
        }
    }

    Ok(inserted)
}

fn find_from(haystack: &str, needle: &str, from: usize) -> Option<usize> {
    haystack[from..].find(needle).map(|i| i + from)
}

/// Strictly highest bitrate wins, so the first of equal maxima is kept and
/// variants without a bitrate never win.
fn best_variant(variants: &[VideoVariant]) -> Option<&VideoVariant> {
    let mut best: Option<&VideoVariant> = None;
    let mut max = 0;
    for variant in variants {
        if variant.bitrate > max {
            max = variant.bitrate;
            best = Some(variant);
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::media::MediaKind;

    fn block(id: &str, bitrates: [u64; 3]) -> String {
        format!(
            r#"{{"id_str":"{id}","video_info":{{"aspect_ratio":[16,9],"duration_millis":1000,"variants":[{{"bitrate":{b0},"content_type":"video/mp4","url":"https://video.twimg.com/amplify_video/{id}/vid/avc1/480x270/{id}_{b0}.mp4?tag=16"}},{{"bitrate":{b1},"content_type":"video/mp4","url":"https://video.twimg.com/amplify_video/{id}/vid/avc1/1920x1080/{id}_{b1}.mp4?tag=16"}},{{"bitrate":{b2},"content_type":"video/mp4","url":"https://video.twimg.com/amplify_video/{id}/vid/avc1/1280x720/{id}_{b2}.mp4?tag=16"}}]}}}}"#,
            id = id,
            b0 = bitrates[0],
            b1 = bitrates[1],
            b2 = bitrates[2],
        )
    }

    #[test]
    fn aspect_ratio_array_before_variants_is_skipped() {
        let body = block("1", [256000, 2176000, 832000]);
        let mut registry = MediaRegistry::new();
        assert_eq!(extract_video_info(&body, &mut registry).unwrap().len(), 1);
    }

    #[test]
    fn picks_highest_bitrate_per_block() {
        let body = format!(
            r#"{{"data":{{"entries":[{},{}]}}}}"#,
            block("111", [256000, 2176000, 832000]),
            block("222", [950000, 288000, 632000]),
        );
        let mut registry = MediaRegistry::new();
        assert_eq!(extract_video_info(&body, &mut registry).unwrap().len(), 2);

        let media = registry.finalize();
        assert!(media.images.is_empty());
        assert_eq!(media.videos.len(), 2);
        assert_eq!(
            media.videos[0].url,
            "https://video.twimg.com/amplify_video/111/vid/avc1/1920x1080/111_2176000.mp4?tag=16"
        );
        assert_eq!(
            media.videos[1].url,
            "https://video.twimg.com/amplify_video/222/vid/avc1/480x270/222_950000.mp4?tag=16"
        );
        assert!(media.videos.iter().all(|v| v.extension == "mp4"));
        assert!(media.videos.iter().all(|v| v.kind == MediaKind::Video));
    }

    #[test]
    fn ties_keep_first_maximum() {
        let body = r#""video_info":{"variants":[{"bitrate":10,"content_type":"video/mp4","url":"https://v/first.mp4"},{"bitrate":10,"content_type":"video/webm","url":"https://v/second.webm"}]}"#;
        let mut registry = MediaRegistry::new();
        extract_video_info(body, &mut registry).unwrap();
        let media = registry.finalize();
        assert_eq!(media.videos[0].url, "https://v/first.mp4");
        assert_eq!(media.videos[0].extension, "mp4");
    }

    #[test]
    fn playlist_without_bitrate_never_wins() {
        let body = r#""video_info":{"variants":[{"content_type":"application/x-mpegURL","url":"https://v/pl.m3u8"},{"bitrate":632000,"content_type":"video/mp4","url":"https://v/a.mp4"}]}"#;
        let mut registry = MediaRegistry::new();
        extract_video_info(body, &mut registry).unwrap();
        assert_eq!(registry.finalize().videos[0].url, "https://v/a.mp4");
    }

    #[test]
    fn block_without_winner_is_skipped_and_scan_continues() {
        let body = format!(
            r#"[{{"video_info":{{"variants":[{{"content_type":"application/x-mpegURL","url":"https://v/pl.m3u8"}}]}}}},{}]"#,
            block("333", [1, 2, 3])
        );
        let mut registry = MediaRegistry::new();
        assert_eq!(extract_video_info(&body, &mut registry).unwrap().len(), 1);
        assert!(registry.finalize().videos[0].url.contains("333_3.mp4"));
    }

    #[test]
    fn content_type_without_subtype_is_skipped() {
        let body = r#""video_info":{"variants":[{"bitrate":5,"content_type":"video","url":"https://v/a"}]}"#;
        let mut registry = MediaRegistry::new();
        assert_eq!(extract_video_info(body, &mut registry).unwrap().len(), 0);
        assert!(registry.is_empty());
    }

    #[test]
    fn repeated_video_is_deduplicated() {
        let one = block("444", [1, 9, 3]);
        let body = format!("[{one},{one}]");
        let mut registry = MediaRegistry::new();
        assert_eq!(extract_video_info(&body, &mut registry).unwrap().len(), 1);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn missing_variants_stops_scan() {
        let body = r#"{"video_info":{"duration_millis":3}}"#;
        let mut registry = MediaRegistry::new();
        assert_eq!(extract_video_info(body, &mut registry).unwrap().len(), 0);
    }

    #[test]
    fn missing_bracket_stops_scan() {
        let body = r#"{"video_info":{"variants":"#;
        let mut registry = MediaRegistry::new();
        assert_eq!(extract_video_info(body, &mut registry).unwrap().len(), 0);
    }

    #[test]
    fn malformed_variants_abort_after_earlier_inserts() {
        let body = format!(
            r#"[{},{{"video_info":{{"variants":[{{"bitrate":1,"url":}}]}}}}]"#,
            block("555", [1, 2, 3])
        );
        let mut registry = MediaRegistry::new();
        let err = extract_video_info(&body, &mut registry).unwrap_err();
        assert!(matches!(err, ExtractError::MalformedVariants { .. }));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn body_without_marker_yields_nothing() {
        let mut registry = MediaRegistry::new();
        assert_eq!(extract_video_info(r#"{"data":{}}"#, &mut registry).unwrap().len(), 0);
    }
}
