use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::BoxStream;
use futures::StreamExt;
use tokio::io::AsyncWriteExt;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;

use super::events::{EventEmitter, ProgressEvent};
use crate::error::DownloadError;
use crate::fs_paths::resolve_target_path;
use crate::models::media::{FailedDownload, MediaRecord};

/// The media hosts serve degraded variants, or nothing, to unknown clients.
pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";

const CHUNK_TIMEOUT: Duration = Duration::from_secs(45);
const DEFAULT_MAX_CONCURRENT: usize = 16;
const WRITE_BUFFER: usize = 256 * 1024;

pub type ByteStream = BoxStream<'static, Result<Bytes, DownloadError>>;

#[async_trait]
pub trait Transport: Send + Sync + 'static {
    async fn fetch_binary(
        &self,
        url: &str,
        headers: &[(String, String)],
    ) -> Result<ByteStream, DownloadError>;
}

pub struct DownloadExecutor<T: Transport, E: EventEmitter> {
    transport: Arc<T>,
    emitter: E,
    user: String,
    max_concurrent: usize,
    chunk_timeout: Duration,
    cancel: CancellationToken,
}

impl<T: Transport, E: EventEmitter> DownloadExecutor<T, E> {
    pub fn new(transport: Arc<T>, user: impl Into<String>, emitter: E) -> Self {
        Self {
            transport,
            emitter,
            user: user.into(),
            max_concurrent: DEFAULT_MAX_CONCURRENT,
            chunk_timeout: CHUNK_TIMEOUT,
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_max_concurrent(mut self, max_concurrent: usize) -> Self {
        self.max_concurrent = max_concurrent.max(1);
        self
    }

    pub fn with_chunk_timeout(mut self, timeout: Duration) -> Self {
        self.chunk_timeout = timeout;
        self
    }

    pub fn with_cancel_token(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn user(&self) -> &str {
        &self.user
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub(crate) fn emit(&self, event: ProgressEvent) {
        self.emitter.emit(&event);
    }

    /// Downloads every record concurrently into `root` and returns the ones
    /// that failed. A failure never affects its siblings. Records resolving to
    /// an already claimed path are dropped, so no two tasks share a file.
    pub async fn download(&self, records: Vec<MediaRecord>, root: &Path) -> Vec<FailedDownload> {
        let mut claimed = HashSet::with_capacity(records.len());
        let mut unique = Vec::with_capacity(records.len());
        for record in records {
            let path = resolve_target_path(&record, root);
            if !claimed.insert(path.clone()) {
                tracing::debug!(
                    "[{}] {} shares {} with another record",
                    self.user,
                    record.url,
                    path.display()
                );
                continue;
            }
            unique.push((record.with_target_path(path.clone()), path));
        }

        let total = unique.len();
        let semaphore = Arc::new(Semaphore::new(self.max_concurrent));
        let done = Arc::new(AtomicUsize::new(0));

        let mut resolved = Vec::with_capacity(total);
        let mut handles = Vec::with_capacity(total);
        for (record, path) in unique {
            let transport = self.transport.clone();
            let semaphore = semaphore.clone();
            let cancel = self.cancel.clone();
            let timeout = self.chunk_timeout;
            let emitter = self.emitter.clone();
            let user = self.user.clone();
            let done = done.clone();
            let url = record.url.clone();
            let task_path = path.clone();

            handles.push(tokio::spawn(async move {
                let result = tokio::select! {
                    biased;
                    _ = cancel.cancelled() => Err(DownloadError::Cancelled),
                    result = async {
                        let _permit = semaphore
                            .acquire_owned()
                            .await
                            .map_err(|_| DownloadError::Cancelled)?;
                        fetch_to_file(transport.as_ref(), &url, &task_path, timeout).await
                    } => result,
                };

                let n = done.fetch_add(1, Ordering::Relaxed) + 1;
                match result {
                    Ok(bytes) => {
                        emitter.emit(&ProgressEvent::Downloaded {
                            user,
                            path: task_path,
                            bytes,
                            done: n,
                            total,
                        });
                        Ok(())
                    }
                    Err(e) => {
                        let _ = tokio::fs::remove_file(part_path_for(&task_path)).await;
                        let reason = e.to_string();
                        emitter.emit(&ProgressEvent::Failed {
                            user,
                            url,
                            reason: reason.clone(),
                            done: n,
                            total,
                        });
                        Err(reason)
                    }
                }
            }));
            resolved.push((record, path));
        }

        let results = futures::future::join_all(handles).await;

        let mut failed = Vec::new();
        for ((record, path), joined) in resolved.into_iter().zip(results) {
            let reason = match joined {
                Ok(Ok(())) => continue,
                Ok(Err(reason)) => reason,
                Err(e) => {
                    let _ = tokio::fs::remove_file(part_path_for(&path)).await;
                    format!("download task failed: {}", e)
                }
            };
            failed.push(FailedDownload { record, reason });
        }

        failed
    }
}

pub(crate) fn part_path_for(output: &Path) -> PathBuf {
    let mut part = output.as_os_str().to_owned();
    part.push(".part");
    PathBuf::from(part)
}

/// Streams `url` into `<output>.part` and renames it to `output` once the
/// body is complete.
async fn fetch_to_file<T: Transport + ?Sized>(
    transport: &T,
    url: &str,
    output: &Path,
    chunk_timeout: Duration,
) -> Result<u64, DownloadError> {
    if let Some(parent) = output.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    let headers = [("User-Agent".to_string(), USER_AGENT.to_string())];
    let mut stream = transport.fetch_binary(url, &headers).await?;

    let part_path = part_path_for(output);
    let file = tokio::fs::File::create(&part_path).await?;
    let mut file = tokio::io::BufWriter::with_capacity(WRITE_BUFFER, file);
    let mut written = 0u64;

    loop {
        match tokio::time::timeout(chunk_timeout, stream.next()).await {
            Ok(Some(Ok(chunk))) => {
                file.write_all(&chunk).await?;
                written += chunk.len() as u64;
            }
            Ok(Some(Err(e))) => return Err(e),
            Ok(None) => break,
            Err(_) => return Err(DownloadError::Stalled(chunk_timeout.as_secs())),
        }
    }

    file.flush().await?;
    drop(file);
    tokio::fs::rename(&part_path, output).await?;
    tracing::debug!("saved {} ({} bytes)", output.display(), written);
    Ok(written)
}
