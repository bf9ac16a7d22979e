use async_trait::async_trait;
use tokio::sync::mpsc;

use super::discovery::NetworkEvent;

/// The page automation that produces network traffic for a media timeline.
#[async_trait]
pub trait TimelineBrowser: Send {
    /// Opens the profile's media timeline with the auth cookie set and starts
    /// forwarding every observed request and response onto `events`.
    async fn open_media_timeline(
        &mut self,
        profile_url: &str,
        auth_token: &str,
        events: mpsc::Sender<NetworkEvent>,
    ) -> anyhow::Result<()>;

    /// Scrolls until the page stops growing.
    async fn scroll_to_end(&mut self) -> anyhow::Result<()>;

    /// Shuts the page down. Every sender handed to `open_media_timeline` must
    /// be dropped once this returns.
    async fn close(&mut self) -> anyhow::Result<()>;
}
