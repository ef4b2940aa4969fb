use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, info};

use crate::{
    config::VideoConfig,
    error::{Result, SpoilerError},
    provider::ProviderError,
    types::{TimelineClip, VideoHandle},
    video::VideoService,
};

const MAX_POLLS: u32 = 900;

/// Response envelope shared by every endpoint.
#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(default = "default_success")]
    success: bool,
    status: Option<String>,
    message: Option<String>,
    #[serde(default)]
    data: serde_json::Value,
}

fn default_success() -> bool {
    true
}

#[derive(Debug, Deserialize)]
struct VideoData {
    id: String,
    #[serde(default)]
    length: Option<LengthValue>,
}

/// The service reports lengths either as numbers or as numeric strings.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum LengthValue {
    Number(f64),
    Text(String),
}

impl LengthValue {
    fn seconds(&self) -> Option<f64> {
        let seconds: Option<f64> = match self {
            LengthValue::Number(n) => Some(*n),
            LengthValue::Text(s) => s.parse().ok(),
        };
        seconds.filter(|n| n.is_finite() && *n > 0.0)
    }
}

/// REST client for a VideoDB-style video service.
pub struct VideoDbClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    collection: String,
    poll_interval: Duration,
}

impl VideoDbClient {
    pub fn new(http: reqwest::Client, config: &VideoConfig) -> Result<Self> {
        let api_key =
            std::env::var(&config.api_key_env).map_err(|_| ProviderError::MissingApiKey {
                provider_name: "video service".to_string(),
                env_var: config.api_key_env.clone(),
            })?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
            collection: config.collection.clone(),
            poll_interval: Duration::from_millis(config.poll_interval_ms),
        })
    }

    async fn post(&self, path: &str, body: serde_json::Value) -> Result<Envelope> {
        let url = format!("{}{}", self.base_url, path);
        debug!("POST {url}");
        let resp = self
            .http
            .post(&url)
            .header("x-access-token", &self.api_key)
            .json(&body)
            .send()
            .await?;
        Ok(resp.json().await?)
    }

    async fn get(&self, url: &str) -> Result<Envelope> {
        debug!("GET {url}");
        let resp = self
            .http
            .get(url)
            .header("x-access-token", &self.api_key)
            .send()
            .await?;
        Ok(resp.json().await?)
    }

    /// Follow an asynchronous operation's `output_url` until it settles.
    async fn settle(&self, envelope: Envelope) -> std::result::Result<serde_json::Value, String> {
        let mut envelope = envelope;
        for _ in 0..MAX_POLLS {
            if !envelope.success {
                return Err(envelope.message.unwrap_or_else(|| "request failed".to_string()));
            }
            if envelope.status.as_deref() != Some("processing") {
                return Ok(envelope.data);
            }
            let Some(output_url) = envelope.data.get("output_url").and_then(|u| u.as_str())
            else {
                return Err("processing response without output_url".to_string());
            };
            let output_url = output_url.to_string();
            tokio::time::sleep(self.poll_interval).await;
            envelope = self.get(&output_url).await.map_err(|e| e.to_string())?;
        }
        Err("operation did not finish".to_string())
    }
}

#[async_trait]
impl VideoService for VideoDbClient {
    async fn upload(&self, url: &str) -> Result<VideoHandle> {
        let failed = |reason: String| SpoilerError::UploadFailed {
            url: url.to_string(),
            reason,
        };

        let envelope = self
            .post(
                &format!("/collection/{}/upload", self.collection),
                serde_json::json!({ "url": url, "media_type": "video" }),
            )
            .await
            .map_err(|e| failed(e.to_string()))?;
        let data = self.settle(envelope).await.map_err(failed)?;
        let video: VideoData =
            serde_json::from_value(data).map_err(|e| failed(format!("bad video payload: {e}")))?;

        info!("Uploaded {url} as video {}", video.id);
        Ok(VideoHandle {
            id: video.id,
            source_url: url.to_string(),
            length: video.length.as_ref().and_then(LengthValue::seconds),
        })
    }

    async fn index_spoken_words(&self, video: &VideoHandle) -> Result<()> {
        let failed = |reason: String| SpoilerError::IndexingFailed {
            video_id: video.id.clone(),
            reason,
        };
        let envelope = self
            .post(
                &format!("/video/{}/index", video.id),
                serde_json::json!({ "index_type": "spoken_word" }),
            )
            .await
            .map_err(|e| failed(e.to_string()))?;
        self.settle(envelope).await.map_err(failed)?;
        Ok(())
    }

    async fn transcript_text(&self, video: &VideoHandle) -> Result<String> {
        let url = format!("{}/video/{}/transcription", self.base_url, video.id);
        let envelope = self.get(&url).await?;
        let data = self.settle(envelope).await.map_err(|reason| {
            SpoilerError::IndexingFailed {
                video_id: video.id.clone(),
                reason,
            }
        })?;
        transcript_from(&video.id, &data)
    }

    async fn search(&self, video: &VideoHandle, query: &str) -> Result<Vec<(f64, f64)>> {
        let envelope = self
            .post(
                &format!("/video/{}/search", video.id),
                serde_json::json!({
                    "index_type": "spoken_word",
                    "search_type": "keyword",
                    "query": query,
                }),
            )
            .await?;

        if !envelope.success {
            let message = envelope.message.unwrap_or_default();
            if message.to_lowercase().contains("no results") {
                return Ok(Vec::new());
            }
            return Err(SpoilerError::Search {
                query: query.to_string(),
                reason: message,
            });
        }
        Ok(parse_shots(&envelope.data))
    }

    async fn render_timeline(&self, clips: &[TimelineClip]) -> Result<String> {
        let envelope = self
            .post(
                "/timeline",
                serde_json::json!({
                    "request_type": "compile",
                    "timeline": clips,
                }),
            )
            .await
            .map_err(|e| SpoilerError::RenderFailed {
                reason: e.to_string(),
            })?;
        let data = self
            .settle(envelope)
            .await
            .map_err(|reason| SpoilerError::RenderFailed { reason })?;

        data.get("stream_url")
            .and_then(|u| u.as_str())
            .map(str::to_string)
            .ok_or_else(|| SpoilerError::RenderFailed {
                reason: "response has no stream_url".to_string(),
            })
    }
}

/// A settled transcription without a `text` string means the index is not usable.
fn transcript_from(video_id: &str, data: &serde_json::Value) -> Result<String> {
    data.get("text")
        .and_then(|t| t.as_str())
        .map(str::to_string)
        .ok_or_else(|| SpoilerError::IndexingFailed {
            video_id: video_id.to_string(),
            reason: "transcription response has no text".to_string(),
        })
}

/// Flatten `results[].docs[]` into `(start, end)` pairs in response order.
fn parse_shots(data: &serde_json::Value) -> Vec<(f64, f64)> {
    data.get("results")
        .and_then(|r| r.as_array())
        .into_iter()
        .flatten()
        .filter_map(|result| result.get("docs").and_then(|d| d.as_array()))
        .flatten()
        .filter_map(|doc| {
            let start = doc.get("start")?.as_f64()?;
            let end = doc.get("end")?.as_f64()?;
            Some((start, end))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_shots_in_order() {
        let data = serde_json::json!({
            "results": [
                {"docs": [{"start": 120.0, "end": 145.5, "text": "Alice revealed the plan"}]},
                {"docs": [{"start": 10, "end": 40}, {"start": "bad", "end": 2}]}
            ]
        });
        assert_eq!(parse_shots(&data), vec![(120.0, 145.5), (10.0, 40.0)]);
    }

    #[test]
    fn missing_results_is_empty() {
        assert!(parse_shots(&serde_json::json!({})).is_empty());
    }

    #[test]
    fn length_accepts_numbers_and_strings() {
        let v: VideoData = serde_json::from_value(serde_json::json!({
            "id": "m-1", "length": "5400.5"
        }))
        .unwrap();
        assert_eq!(v.length.and_then(|l| l.seconds()), Some(5400.5));

        let v: VideoData =
            serde_json::from_value(serde_json::json!({"id": "m-2", "length": 0})).unwrap();
        assert_eq!(v.length.and_then(|l| l.seconds()), None);
    }

    #[test]
    fn transcript_requires_text() {
        assert_eq!(
            transcript_from("m-1", &serde_json::json!({"text": "Alice revealed the plan"}))
                .unwrap(),
            "Alice revealed the plan"
        );
        for data in [
            serde_json::json!({"error": "transcript not ready"}),
            serde_json::json!({"text": 42}),
            serde_json::Value::Null,
        ] {
            assert!(matches!(
                transcript_from("m-1", &data),
                Err(SpoilerError::IndexingFailed { .. })
            ));
        }
    }

    /// Serve one canned JSON body over plain HTTP and return its base URL.
    async fn serve_once(body: &'static str) -> String {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 4096];
            let _ = socket.read(&mut buf).await;
            let response = format!(
                "HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                body.len()
            );
            socket.write_all(response.as_bytes()).await.unwrap();
        });
        format!("http://{addr}")
    }

    fn client(base_url: String) -> VideoDbClient {
        VideoDbClient {
            http: reqwest::Client::new(),
            base_url,
            api_key: "test-key".to_string(),
            collection: "default".to_string(),
            poll_interval: Duration::from_millis(1),
        }
    }

    #[tokio::test]
    async fn transcript_without_text_is_an_indexing_failure() {
        let base_url =
            serve_once(r#"{"success":true,"data":{"error":"transcript not ready"}}"#).await;
        let video = VideoHandle {
            id: "m-1".to_string(),
            source_url: "https://example.com/v.mp4".to_string(),
            length: None,
        };
        let result = client(base_url).transcript_text(&video).await;
        assert!(matches!(
            result,
            Err(SpoilerError::IndexingFailed { ref video_id, .. }) if video_id == "m-1"
        ));
    }

    #[test]
    fn envelope_defaults_to_success() {
        let e: Envelope =
            serde_json::from_value(serde_json::json!({"data": {"stream_url": "s"}})).unwrap();
        assert!(e.success);
        assert!(e.status.is_none());
    }
}
