use std::collections::HashMap;
use std::time::Duration;

use anyhow::anyhow;
use async_trait::async_trait;
use base64::Engine;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::emulation::SetDeviceMetricsOverrideParams;
use chromiumoxide::cdp::browser_protocol::network::{
    CookieParam, EnableParams, EventLoadingFailed, EventLoadingFinished,
    EventRequestWillBeSent, EventResponseReceived, GetResponseBodyParams, RequestId,
    ResourceType, SetUserAgentOverrideParams,
};
use chromiumoxide::listeners::EventStream;
use chromiumoxide::Page;
use futures::StreamExt;
use tokio::sync::mpsc;
use tempfile::TempDir;
use tokio::task::JoinHandle;

use twid_core::core::browser::TimelineBrowser;
use twid_core::core::discovery::{NetworkEvent, ResourceKind, USER_MEDIA_MARKER};
use twid_core::models::settings::{BrowserProduct, Config};

use crate::core::filename::sanitize_path_component;

const COOKIE_DOMAINS: &[&str] = &[".twitter.com", ".x.com"];
const SCROLL_STEP_PX: u64 = 100;
const SCROLL_INTERVAL: Duration = Duration::from_millis(500);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

// iPhone SE
const MOBILE_WIDTH: i64 = 375;
const MOBILE_HEIGHT: i64 = 667;
const MOBILE_SCALE: f64 = 2.0;
const MOBILE_USER_AGENT: &str = "Mozilla/5.0 (iPhone; CPU iPhone OS 13_2_3 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/13.0.3 Mobile/15E148 Safari/604.1";

/// A Chromium instance driven over CDP, one per profile.
pub struct ChromiumTimeline {
    browser: Browser,
    handler: JoinHandle<()>,
    page: Option<Page>,
    forwarder: Option<JoinHandle<()>>,
    profile_dir: Option<TempDir>,
}

/// A fresh Chromium user-data directory, removed when dropped.
fn new_profile_dir(user: &str) -> std::io::Result<TempDir> {
    tempfile::Builder::new()
        .prefix(&format!("twid-{}-", sanitize_path_component(user)))
        .tempdir()
}

fn mobile_emulation() -> (SetDeviceMetricsOverrideParams, SetUserAgentOverrideParams) {
    (
        SetDeviceMetricsOverrideParams::new(MOBILE_WIDTH, MOBILE_HEIGHT, MOBILE_SCALE, true),
        SetUserAgentOverrideParams::new(MOBILE_USER_AGENT.to_string()),
    )
}

impl ChromiumTimeline {
    pub async fn launch(config: &Config, user: &str) -> anyhow::Result<Self> {
        if config.product == BrowserProduct::Firefox {
            return Err(anyhow!("browser product '{}' is not supported", config.product));
        }

        let profile_dir = new_profile_dir(user)?;
        let mut builder = BrowserConfig::builder()
            .user_data_dir(profile_dir.path())
            .request_timeout(REQUEST_TIMEOUT)
            .window_size(1280, 1600)
            .arg("--disable-blink-features=AutomationControlled");
        if config.dev {
            builder = builder.with_head().arg("--auto-open-devtools-for-tabs");
        }
        if let Some(ref executable) = config.chrome_executable {
            builder = builder.chrome_executable(executable);
        }

        let (browser, mut handler) = Browser::launch(
            builder
                .build()
                .map_err(|e| anyhow!("Failed to configure browser: {}", e))?,
        )
        .await?;
        let handler = tokio::spawn(async move {
            while handler.next().await.is_some() {}
        });
        tracing::debug!("[{}] browser launched", user);

        Ok(Self {
            browser,
            handler,
            page: None,
            forwarder: None,
            profile_dir: Some(profile_dir),
        })
    }

    fn page(&self) -> anyhow::Result<&Page> {
        self.page
            .as_ref()
            .ok_or_else(|| anyhow!("media timeline is not open"))
    }
}

#[async_trait]
impl TimelineBrowser for ChromiumTimeline {
    async fn open_media_timeline(
        &mut self,
        profile_url: &str,
        auth_token: &str,
        events: mpsc::Sender<NetworkEvent>,
    ) -> anyhow::Result<()> {
        let page = self.browser.new_page("about:blank").await?;

        let mut cookies = Vec::with_capacity(COOKIE_DOMAINS.len());
        for domain in COOKIE_DOMAINS {
            cookies.push(
                CookieParam::builder()
                    .name("auth_token")
                    .value(auth_token)
                    .domain(*domain)
                    .path("/")
                    .secure(true)
                    .http_only(true)
                    .build()
                    .map_err(|e| anyhow!("Failed to build auth cookie: {}", e))?,
            );
        }
        page.set_cookies(cookies).await?;

        let (metrics, user_agent) = mobile_emulation();
        page.execute(metrics).await?;
        page.execute(user_agent).await?;

        page.execute(EnableParams::default()).await?;
        let requests = page.event_listener::<EventRequestWillBeSent>().await?;
        let responses = page.event_listener::<EventResponseReceived>().await?;
        let finished = page.event_listener::<EventLoadingFinished>().await?;
        let failed = page.event_listener::<EventLoadingFailed>().await?;

        self.forwarder = Some(tokio::spawn(forward_network_events(
            page.clone(),
            NetworkStreams {
                requests,
                responses,
                finished,
                failed,
            },
            events,
        )));

        let media_url = format!("{}/media", profile_url.trim_end_matches('/'));
        page.goto(media_url.as_str()).await?;
        tracing::debug!("opened {}", media_url);

        self.page = Some(page);
        Ok(())
    }

    async fn scroll_to_end(&mut self) -> anyhow::Result<()> {
        let page = self.page()?;
        let mut scrolled: u64 = 0;

        loop {
            page.evaluate(format!("window.scrollBy(0, {})", SCROLL_STEP_PX))
                .await?;
            scrolled += SCROLL_STEP_PX;

            let height: f64 = page
                .evaluate("document.body.scrollHeight")
                .await?
                .into_value()?;
            if scrolled as f64 >= height {
                break;
            }
            tokio::time::sleep(SCROLL_INTERVAL).await;
        }

        tracing::debug!("scrolled {}px to the end of the timeline", scrolled);
        Ok(())
    }

    async fn close(&mut self) -> anyhow::Result<()> {
        if let Some(forwarder) = self.forwarder.take() {
            forwarder.abort();
            let _ = forwarder.await;
        }
        self.page = None;

        let closed = self.browser.close().await;
        let _ = self.browser.wait().await;
        self.handler.abort();
        if let Some(dir) = self.profile_dir.take() {
            let path = dir.path().to_path_buf();
            if let Err(e) = dir.close() {
                tracing::debug!("could not remove {}: {}", path.display(), e);
            }
        }
        closed?;
        Ok(())
    }
}

struct NetworkStreams {
    requests: EventStream<EventRequestWillBeSent>,
    responses: EventStream<EventResponseReceived>,
    finished: EventStream<EventLoadingFinished>,
    failed: EventStream<EventLoadingFailed>,
}

/// Media endpoint responses whose bodies are still streaming.
#[derive(Debug, Default)]
struct PendingBodies {
    urls: HashMap<RequestId, String>,
}

impl PendingBodies {
    fn on_response(&mut self, request_id: &RequestId, url: &str) {
        if url.contains(USER_MEDIA_MARKER) {
            self.urls.insert(request_id.clone(), url.to_string());
        }
    }

    /// The url of a tracked request whose body is now complete.
    fn on_finished(&mut self, request_id: &RequestId) -> Option<String> {
        self.urls.remove(request_id)
    }

    fn on_failed(&mut self, request_id: &RequestId) -> Option<String> {
        self.urls.remove(request_id)
    }

    fn len(&self) -> usize {
        self.urls.len()
    }

    fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }
}

async fn forward_network_events(
    page: Page,
    mut streams: NetworkStreams,
    events: mpsc::Sender<NetworkEvent>,
) {
    let mut pending = PendingBodies::default();

    loop {
        let event = tokio::select! {
            Some(ev) = streams.requests.next() => {
                let resource_type = match ev.r#type {
                    Some(ResourceType::Image) => ResourceKind::Image,
                    _ => ResourceKind::Other,
                };
                Some(NetworkEvent::Request {
                    resource_type,
                    url: ev.request.url.clone(),
                })
            }
            Some(ev) = streams.responses.next() => {
                pending.on_response(&ev.request_id, &ev.response.url);
                None
            }
            Some(ev) = streams.finished.next() => {
                match pending.on_finished(&ev.request_id) {
                    Some(url) => match response_body(&page, ev.request_id.clone()).await {
                        Ok(body) => Some(NetworkEvent::Response { url, body }),
                        Err(e) => {
                            tracing::warn!("could not read body of {}: {}", url, e);
                            None
                        }
                    },
                    None => None,
                }
            }
            Some(ev) = streams.failed.next() => {
                if let Some(url) = pending.on_failed(&ev.request_id) {
                    tracing::warn!("{} failed: {}", url, ev.error_text);
                }
                None
            }
            else => break,
        };

        if let Some(event) = event {
            if events.send(event).await.is_err() {
                break;
            }
        }
    }

    if !pending.is_empty() {
        tracing::debug!("{} media responses still in flight at close", pending.len());
    }
}

async fn response_body(page: &Page, request_id: RequestId) -> anyhow::Result<String> {
    let response = page
        .execute(GetResponseBodyParams::new(request_id))
        .await?;
    let returns = response.result;
    if returns.base64_encoded {
        let raw = base64::engine::general_purpose::STANDARD.decode(returns.body)?;
        Ok(String::from_utf8_lossy(&raw).into_owned())
    } else {
        Ok(returns.body)
    }
}
