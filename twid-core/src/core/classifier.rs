/// Substrings that mark profile chrome (avatars, banners, icons) rather than
/// timeline media.
const DENYLIST: &[&str] = &[
    "profile_banners",
    "profile_images",
    "type=javascript",
    "emoji/v2",
    "ext_tw_video_thumb",
    ".svg",
];

/// Path segment of the static thumbnail served for an animated GIF.
pub const ANIMATION_THUMB_MARKER: &str = "/tweet_video_thumb/";

pub fn is_eligible(url: &str) -> bool {
    !DENYLIST.iter().any(|marker| url.contains(marker))
}

/// Must be checked before [`is_eligible`]: the thumbnail is image-typed on the
/// wire but stands for a video.
pub fn is_disguised_animation(url: &str) -> bool {
    url.contains(ANIMATION_THUMB_MARKER)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_profile_banner() {
        assert!(!is_eligible("http://profile_banners"));
    }

    #[test]
    fn rejects_profile_image() {
        assert!(!is_eligible("http://profile_images/foo/bar"));
    }

    #[test]
    fn rejects_javascript_type() {
        assert!(!is_eligible("https://foo?type=javascript"));
    }

    #[test]
    fn rejects_emoji_sprites() {
        assert!(!is_eligible("http:emoji/v2"));
        assert!(!is_eligible("https://foo/emoji/v2"));
    }

    #[test]
    fn rejects_video_preview_thumb() {
        assert!(!is_eligible("http://twitter/ext_tw_video_thumb"));
    }

    #[test]
    fn rejects_svg() {
        assert!(!is_eligible("http://vue.js/org.svg"));
    }

    #[test]
    fn accepts_unrelated_urls() {
        assert!(is_eligible("http://foo"));
        assert!(is_eligible("http://bar"));
        assert!(is_eligible(
            "https://pbs.twimg.com/media/GBq2QdlWcAA8x3f?format=jpg&name=small"
        ));
    }

    #[test]
    fn detects_animation_thumbnail() {
        assert!(is_disguised_animation(
            "https://pbs.twimg.com/tweet_video_thumb/FqWbX1aWAAE8Tqb?format=jpg&name=small"
        ));
        assert!(!is_disguised_animation(
            "https://pbs.twimg.com/ext_tw_video_thumb/1/pu/img/x.jpg"
        ));
    }

    #[test]
    fn animation_thumbnail_is_otherwise_eligible() {
        let url = "https://pbs.twimg.com/tweet_video_thumb/FqWbX1aWAAE8Tqb?format=jpg";
        assert!(is_disguised_animation(url));
        assert!(is_eligible(url));
    }
}
