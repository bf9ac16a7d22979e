use serde::Serialize;
use std::path::PathBuf;

use crate::models::media::MediaKind;

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "type", content = "data")]
pub enum ProgressEvent {
    Discovered {
        user: String,
        url: String,
        extension: String,
        kind: MediaKind,
    },
    Downloaded {
        user: String,
        path: PathBuf,
        bytes: u64,
        done: usize,
        total: usize,
    },
    Failed {
        user: String,
        url: String,
        reason: String,
        done: usize,
        total: usize,
    },
    PassFinished {
        user: String,
        pass: u32,
        failed: usize,
    },
}

pub trait EventEmitter: Send + Sync + Clone + 'static {
    fn emit(&self, event: &ProgressEvent);
}

/// Renders progress as log lines.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingEmitter;

impl EventEmitter for TracingEmitter {
    fn emit(&self, event: &ProgressEvent) {
        match event {
            ProgressEvent::Discovered {
                user,
                url,
                extension,
                ..
            } => tracing::debug!("  {} ❯ {} ❯ {}", user, url, extension),
            ProgressEvent::Downloaded {
                user,
                path,
                done,
                total,
                ..
            } => tracing::info!("  {} ❯ {} ❯ {}/{}", user, path.display(), done, total),
            ProgressEvent::Failed {
                user,
                url,
                reason,
                done,
                total,
            } => tracing::warn!("  {} ❯ {} ❯ {}/{} failed: {}", user, url, done, total, reason),
            ProgressEvent::PassFinished { user, pass, failed } => {
                tracing::info!("✔ pass {} ❯ user({}) ❯ {} failed", pass, user, failed)
            }
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoopEmitter;

impl EventEmitter for NoopEmitter {
    fn emit(&self, _event: &ProgressEvent) {}
}
