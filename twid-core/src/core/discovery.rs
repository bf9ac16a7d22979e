use std::time::Duration;

use anyhow::anyhow;
use tokio::sync::mpsc;

use super::browser::TimelineBrowser;
use super::classifier::{is_disguised_animation, is_eligible};
use super::events::{EventEmitter, ProgressEvent};
use super::normalizer::{build_disguised_animation_target, extract_format, normalize};
use super::registry::MediaRegistry;
use super::video_info::extract_video_info;
use crate::models::media::{DiscoveredMedia, MediaRecord};

/// Substring of the timeline API endpoint whose responses carry video info.
pub const USER_MEDIA_MARKER: &str = "UserMedia";
pub const DEFAULT_IMAGE_FORMAT: &str = "jpg";
const EVENT_BUFFER: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    Image,
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NetworkEvent {
    Request {
        resource_type: ResourceKind,
        url: String,
    },
    Response {
        url: String,
        body: String,
    },
}

/// Consumes network events for one profile and accumulates what they reveal.
pub struct DiscoverySession<E: EventEmitter> {
    user: String,
    registry: MediaRegistry,
    emitter: E,
}

impl<E: EventEmitter> DiscoverySession<E> {
    pub fn new(user: impl Into<String>, emitter: E) -> Self {
        Self {
            user: user.into(),
            registry: MediaRegistry::new(),
            emitter,
        }
    }

    pub fn handle(&mut self, event: NetworkEvent) {
        match event {
            NetworkEvent::Request {
                resource_type: ResourceKind::Image,
                url,
            } => self.on_image_request(&url),
            NetworkEvent::Response { url, body } if url.contains(USER_MEDIA_MARKER) => {
                self.on_media_response(&url, &body)
            }
            _ => {}
        }
    }

    fn on_image_request(&mut self, url: &str) {
        if is_disguised_animation(url) {
            match build_disguised_animation_target(url) {
                Some((video_url, extension)) => {
                    self.record(MediaRecord::video(video_url, extension));
                }
                None => tracing::debug!("animation thumbnail without hash: {}", url),
            }
        } else if is_eligible(url) {
            let extension =
                extract_format(url).unwrap_or_else(|| DEFAULT_IMAGE_FORMAT.to_string());
            self.record(MediaRecord::image(normalize(url), extension));
        }
    }

    fn on_media_response(&mut self, url: &str, body: &str) {
        match extract_video_info(body, &mut self.registry) {
            Ok(records) => {
                for record in &records {
                    self.emit_discovered(record);
                }
            }
            Err(e) => tracing::warn!("[{}] skipping rest of {}: {}", self.user, url, e),
        }
    }

    fn record(&mut self, record: MediaRecord) {
        if self.registry.insert(record.clone()) {
            self.emit_discovered(&record);
        }
    }

    fn emit_discovered(&self, record: &MediaRecord) {
        self.emitter.emit(&ProgressEvent::Discovered {
            user: self.user.clone(),
            url: record.url.clone(),
            extension: record.extension.clone(),
            kind: record.kind,
        });
    }

    pub fn registry(&self) -> &MediaRegistry {
        &self.registry
    }

    /// Processes events until every sender is dropped, then freezes the
    /// registry.
    pub async fn consume(mut self, mut events: mpsc::Receiver<NetworkEvent>) -> DiscoveredMedia {
        while let Some(event) = events.recv().await {
            self.handle(event);
        }
        self.finalize()
    }

    pub fn finalize(self) -> DiscoveredMedia {
        self.registry.finalize()
    }
}

/// Runs one discovery session against `browser`: open the media timeline,
/// scroll to the end, wait `settle` for late traffic, then close.
pub async fn discover_profile<B, E>(
    browser: &mut B,
    user: &str,
    profile_url: &str,
    auth_token: &str,
    settle: Duration,
    emitter: E,
) -> anyhow::Result<DiscoveredMedia>
where
    B: TimelineBrowser + ?Sized,
    E: EventEmitter,
{
    let (tx, rx) = mpsc::channel(EVENT_BUFFER);
    let session = DiscoverySession::new(user, emitter);
    let consumer = tokio::spawn(session.consume(rx));

    tracing::info!("[{}] opening {}", user, profile_url);
    let outcome = async {
        browser
            .open_media_timeline(profile_url, auth_token, tx)
            .await?;
        browser.scroll_to_end().await?;
        tokio::time::sleep(settle).await;
        anyhow::Ok(())
    }
    .await;

    if let Err(e) = browser.close().await {
        tracing::warn!("[{}] closing browser failed: {}", user, e);
    }

    let media = consumer
        .await
        .map_err(|e| anyhow!("discovery consumer for {} failed: {}", user, e))?;
    outcome?;

    tracing::info!(
        "[{}] discovered {} images, {} videos",
        user,
        media.images.len(),
        media.videos.len()
    );
    Ok(media)
}
