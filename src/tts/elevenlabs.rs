use super::config::{TtsConfig, DEFAULT_MODEL_ID, DEFAULT_OUTPUT_FORMAT, DEFAULT_VOICE_ID};
use super::interface::{TtsError, TtsParams, TtsProvider};
use crate::utils::http::{request_with_retry, RetryPolicy};
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;

pub const DEFAULT_BASE_URL: &str = "https://api.elevenlabs.io";

#[derive(Serialize, Clone)]
struct TtsRequest {
    text: String,
    model_id: String,
}

pub struct ElevenLabsTtsProvider {
    client: Client,
    api_key: String,
    base_url: String,
    default_voice: String,
    default_model: String,
    default_format: String,
    retry: RetryPolicy,
}

impl ElevenLabsTtsProvider {
    pub fn new(api_key: String, base_url: Option<String>) -> Self {
        Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(30))
                .build()
                .unwrap_or_else(|_| Client::new()),
            api_key,
            base_url: base_url
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            default_voice: DEFAULT_VOICE_ID.to_string(),
            default_model: DEFAULT_MODEL_ID.to_string(),
            default_format: DEFAULT_OUTPUT_FORMAT.to_string(),
            retry: RetryPolicy::default(),
        }
    }

    /// Construct from the `tts` config section. `None` without an API key.
    pub fn from_config(config: &TtsConfig) -> Option<Self> {
        let api_key = config.resolve_api_key()?;
        let mut provider = Self::new(api_key, config.base_url.clone());
        provider.default_voice = config.voice_id.clone();
        provider.default_model = config.model_id.clone();
        provider.default_format = config.output_format.clone();
        Some(provider)
    }

    pub fn with_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }
}

#[async_trait]
impl TtsProvider for ElevenLabsTtsProvider {
    fn id(&self) -> String {
        "elevenlabs".to_string()
    }

    async fn synthesize(&self, text: &str, params: TtsParams) -> Result<Vec<u8>, TtsError> {
        if text.trim().is_empty() {
            return Err(TtsError::SynthesisFailed("empty text".to_string()));
        }

        let voice = params.voice.unwrap_or_else(|| self.default_voice.clone());
        let format = params
            .output_format
            .unwrap_or_else(|| self.default_format.clone());
        let url = format!("{}/v1/text-to-speech/{}", self.base_url, voice);
        let request_body = TtsRequest {
            text: text.to_string(),
            model_id: params.model.unwrap_or_else(|| self.default_model.clone()),
        };

        let client = self.client.clone();
        let api_key = self.api_key.clone();

        let response = request_with_retry(
            move || {
                let client = client.clone();
                let url = url.clone();
                let format = format.clone();
                let body = request_body.clone();
                let api_key = api_key.clone();
                async move {
                    client
                        .post(&url)
                        .query(&[("output_format", format)])
                        .header("xi-api-key", api_key)
                        .header("Content-Type", "application/json")
                        .json(&body)
                        .send()
                        .await
                }
            },
            self.retry,
        )
        .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TtsError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response.bytes().await?;
        Ok(bytes.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn provider(server: &MockServer) -> ElevenLabsTtsProvider {
        ElevenLabsTtsProvider::new("xi-test".to_string(), Some(server.uri()))
            .with_client(Client::builder().no_proxy().build().unwrap())
            .with_retry(RetryPolicy::none())
    }

    #[tokio::test]
    async fn posts_text_and_returns_audio_bytes() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(format!("/v1/text-to-speech/{}", DEFAULT_VOICE_ID)))
            .and(query_param("output_format", DEFAULT_OUTPUT_FORMAT))
            .and(header("xi-api-key", "xi-test"))
            .and(body_json(serde_json::json!({
                "text": "hi there",
                "model_id": DEFAULT_MODEL_ID
            })))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_bytes(vec![0x49, 0x44, 0x33, 0x04])
                    .insert_header("content-type", "audio/mpeg"),
            )
            .expect(1)
            .mount(&server)
            .await;

        let audio = provider(&server)
            .synthesize("hi there", TtsParams::default())
            .await
            .unwrap();
        assert_eq!(audio, vec![0x49, 0x44, 0x33, 0x04]);
    }

    #[tokio::test]
    async fn params_override_voice_and_format() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/text-to-speech/voice-2"))
            .and(query_param("output_format", "pcm_16000"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![1, 2]))
            .mount(&server)
            .await;

        let params = TtsParams {
            voice: Some("voice-2".to_string()),
            model: None,
            output_format: Some("pcm_16000".to_string()),
        };
        let audio = provider(&server).synthesize("x", params).await.unwrap();
        assert_eq!(audio.len(), 2);
    }

    #[tokio::test]
    async fn api_error_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(422).set_body_string("bad voice"))
            .mount(&server)
            .await;

        let err = provider(&server)
            .synthesize("hello", TtsParams::default())
            .await
            .unwrap_err();
        assert!(matches!(err, TtsError::Api { status: 422, .. }));
    }

    #[tokio::test]
    async fn empty_text_is_rejected_locally() {
        let server = MockServer::start().await;
        let err = provider(&server)
            .synthesize("   ", TtsParams::default())
            .await
            .unwrap_err();
        assert!(matches!(err, TtsError::SynthesisFailed(_)));
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[test]
    fn from_config_requires_key() {
        let config = TtsConfig {
            api_key: None,
            api_key_env: Some("MOOD_AVATAR_TEST_NO_XI_KEY".to_string()),
            ..Default::default()
        };
        assert!(ElevenLabsTtsProvider::from_config(&config).is_none());

        let config = TtsConfig {
            api_key: Some("xi-direct".to_string()),
            voice_id: "v9".to_string(),
            ..Default::default()
        };
        let provider = ElevenLabsTtsProvider::from_config(&config).unwrap();
        assert_eq!(provider.default_voice, "v9");
    }
}
