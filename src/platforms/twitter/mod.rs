pub mod browser;

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::anyhow;
use tokio_util::sync::CancellationToken;

use twid_core::core::browser::TimelineBrowser;
use twid_core::core::discovery::discover_profile;
use twid_core::core::downloader::DownloadExecutor;
use twid_core::core::events::EventEmitter;
use twid_core::core::retry::{run_with_retry, RetryPolicy};
use twid_core::fs_paths::user_output_dir;
use twid_core::models::media::FailedDownload;
use twid_core::models::settings::Config;

use crate::core::filename::sanitize_path_component;
use crate::core::http_client::ReqwestTransport;
use browser::ChromiumTimeline;

const PROFILE_BASE: &str = "https://twitter.com/";
const PROFILE_HOSTS: &[&str] = &[
    "twitter.com",
    "www.twitter.com",
    "mobile.twitter.com",
    "x.com",
    "www.x.com",
];

#[derive(Debug)]
pub struct UserReport {
    pub user: String,
    pub output_dir: PathBuf,
    pub discovered: usize,
    pub failed: Vec<FailedDownload>,
    pub elapsed: Duration,
    pub error: Option<String>,
}

impl UserReport {
    pub fn errored(user: impl Into<String>, error: &anyhow::Error) -> Self {
        Self {
            user: user.into(),
            output_dir: PathBuf::new(),
            discovered: 0,
            failed: Vec::new(),
            elapsed: Duration::ZERO,
            error: Some(format!("{:#}", error)),
        }
    }

    pub fn succeeded(&self) -> usize {
        self.discovered.saturating_sub(self.failed.len())
    }
}

/// Accepts `nasa`, `@nasa` or a profile URL on twitter.com / x.com.
pub fn profile_handle(input: &str) -> Option<String> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }

    let handle = if input.contains("://") {
        let parsed = url::Url::parse(input).ok()?;
        let host = parsed.host_str()?.to_lowercase();
        if !PROFILE_HOSTS.contains(&host.as_str()) {
            return None;
        }
        let segments: Vec<&str> = parsed.path().split('/').filter(|s| !s.is_empty()).collect();
        segments.first()?.to_string()
    } else {
        input.trim_start_matches('@').to_string()
    };

    if handle.is_empty() || handle.contains('/') {
        return None;
    }
    Some(handle)
}

/// Drops blank entries and every entry naming a profile already listed.
/// Handles compare case-insensitively; unparseable entries are kept so
/// their error is reported.
pub fn unique_users(users: &[String]) -> Vec<&str> {
    let mut seen = HashSet::new();
    users
        .iter()
        .map(|u| u.trim())
        .filter(|u| !u.is_empty())
        .filter(|u| {
            let key = profile_handle(u).unwrap_or_else(|| u.to_string());
            seen.insert(key.to_lowercase())
        })
        .collect()
}

pub fn profile_url(handle: &str) -> String {
    format!("{}{}", PROFILE_BASE, urlencoding::encode(handle))
}

/// Discovers and downloads one profile's media timeline into `<out_dir>/<user>`.
pub async fn run_user<E: EventEmitter>(
    config: &Config,
    auth_token: &str,
    user: &str,
    client: reqwest::Client,
    cancel: CancellationToken,
    emitter: E,
) -> anyhow::Result<UserReport> {
    let start = Instant::now();
    let handle = profile_handle(user).ok_or_else(|| anyhow!("not a profile: '{}'", user))?;
    let output_dir = user_output_dir(&config.out_dir, &sanitize_path_component(&handle));
    tokio::fs::create_dir_all(&output_dir).await?;

    let mut timeline = ChromiumTimeline::launch(config, &handle).await?;
    let url = profile_url(&handle);
    let outcome = tokio::select! {
        biased;
        _ = cancel.cancelled() => None,
        media = discover_profile(
            &mut timeline,
            &handle,
            &url,
            auth_token,
            config.settle_delay(),
            emitter.clone(),
        ) => Some(media),
    };
    let media = match outcome {
        Some(media) => media?,
        None => {
            if let Err(e) = timeline.close().await {
                tracing::debug!("[{}] closing browser: {}", handle, e);
            }
            return Err(anyhow!("cancelled"));
        }
    };
    let discovered = media.total();
    let executor = DownloadExecutor::new(
        Arc::new(ReqwestTransport::new(client)),
        handle.clone(),
        emitter,
    )
    .with_max_concurrent(config.max_concurrent_downloads)
    .with_cancel_token(cancel);

    let failed = run_with_retry(
        &executor,
        media.into_records(),
        &output_dir,
        RetryPolicy::new(config.retry),
    )
    .await;

    Ok(UserReport {
        user: handle,
        output_dir,
        discovered,
        failed,
        elapsed: start.elapsed(),
        error: None,
    })
}
