use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::header::CONTENT_TYPE;
use twid_core::core::downloader::{ByteStream, Transport, USER_AGENT};
use twid_core::error::DownloadError;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(15);

pub fn build_client() -> anyhow::Result<reqwest::Client> {
    let client = reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .connect_timeout(CONNECT_TIMEOUT)
        .build()?;
    Ok(client)
}

#[derive(Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn fetch_binary(
        &self,
        url: &str,
        headers: &[(String, String)],
    ) -> Result<ByteStream, DownloadError> {
        let mut request = self.client.get(url);
        for (name, value) in headers {
            request = request.header(name.as_str(), value.as_str());
        }

        let response = request
            .send()
            .await
            .map_err(|e| DownloadError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(DownloadError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        if let Some(ct) = response.headers().get(CONTENT_TYPE) {
            if let Ok(ct_str) = ct.to_str() {
                if ct_str.contains("text/html") {
                    return Err(DownloadError::HtmlBody(url.to_string()));
                }
            }
        }

        Ok(response
            .bytes_stream()
            .map(|chunk| chunk.map_err(|e| DownloadError::Transport(e.to_string())))
            .boxed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use twid_core::core::downloader::DownloadExecutor;
    use twid_core::core::events::NoopEmitter;
    use twid_core::models::media::MediaRecord;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn transport() -> ReqwestTransport {
        ReqwestTransport::new(build_client().unwrap())
    }

    fn ua() -> Vec<(String, String)> {
        vec![("User-Agent".to_string(), USER_AGENT.to_string())]
    }

    async fn collect(mut stream: ByteStream) -> Vec<u8> {
        let mut body = Vec::new();
        while let Some(chunk) = stream.next().await {
            body.extend_from_slice(&chunk.unwrap());
        }
        body
    }

    #[tokio::test]
    async fn streams_body_with_user_agent() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/media/abc"))
            .and(header("user-agent", USER_AGENT))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "image/jpeg")
                    .set_body_bytes(vec![0xff, 0xd8, 0xff]),
            )
            .mount(&server)
            .await;

        let stream = transport()
            .fetch_binary(&format!("{}/media/abc", server.uri()), &ua())
            .await
            .unwrap();
        assert_eq!(collect(stream).await, vec![0xff, 0xd8, 0xff]);
    }

    #[tokio::test]
    async fn non_success_status_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let err = match transport()
            .fetch_binary(&format!("{}/gone", server.uri()), &ua())
            .await
        {
            Ok(_) => panic!("expected an error"),
            Err(e) => e,
        };
        assert!(matches!(err, DownloadError::Status { status: 404, .. }));
    }

    #[tokio::test]
    async fn html_body_is_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "text/html; charset=utf-8")
                    .set_body_string("<html></html>"),
            )
            .mount(&server)
            .await;

        let result = transport()
            .fetch_binary(&format!("{}/login", server.uri()), &ua())
            .await;
        assert!(matches!(result, Err(DownloadError::HtmlBody(_))));
    }

    #[tokio::test]
    async fn executor_writes_fetched_media() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/amplify_video/1/vid/avc1/1280x720/clip.mp4"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "video/mp4")
                    .set_body_bytes(b"mp4data".to_vec()),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/media/broken"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let executor = DownloadExecutor::new(Arc::new(transport()), "nasa", NoopEmitter);
        let video = format!(
            "{}/amplify_video/1/vid/avc1/1280x720/clip.mp4?tag=12",
            server.uri()
        );
        let image = format!("{}/media/broken?format=jpg&name=large", server.uri());
        let failed = executor
            .download(
                vec![
                    MediaRecord::video(video.as_str(), "mp4"),
                    MediaRecord::image(image.as_str(), "jpg"),
                ],
                dir.path(),
            )
            .await;

        assert_eq!(std::fs::read(dir.path().join("clip.mp4")).unwrap(), b"mp4data");
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].record.url, image);
        assert!(failed[0].reason.contains("500"));
    }
}
