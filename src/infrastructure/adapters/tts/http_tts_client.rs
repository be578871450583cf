//! HTTP TTS Client - 调用托管 TTS 服务
//!
//! 实现 SpeechSynthesizerPort trait，请求格式兼容 Polly 的 SynthesizeSpeech:
//! POST {base_url}/v1/speech
//! Request: {"Text": "...", "TextType": "ssml", "VoiceId": "Matthew", ...}  (JSON)
//! Response: 音频流，Content-Type 头给出格式

use async_trait::async_trait;
use base64::Engine;
use futures_util::StreamExt;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;

use crate::application::ports::{SpeechSynthesizerPort, TtsError};
use crate::domain::tts::{content_type_for_format, AudioResult, TextType};

/// 合成请求体 (JSON)
#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct SynthesizeSpeechRequest<'a> {
    text: &'a str,
    text_type: &'static str,
    output_format: &'a str,
    voice_id: &'a str,
    sample_rate: &'a str,
    engine: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    language_code: Option<&'a str>,
    #[serde(skip_serializing_if = "<[String]>::is_empty")]
    lexicon_names: &'a [String],
    #[serde(skip_serializing_if = "<[String]>::is_empty")]
    speech_mark_types: &'a [String],
}

/// HTTP TTS 客户端配置
#[derive(Debug, Clone)]
pub struct HttpTtsClientConfig {
    /// TTS 服务基础 URL
    pub base_url: String,
    /// Bearer token（可选）
    pub api_key: Option<String>,
    /// 请求超时时间（秒）
    pub timeout_secs: u64,
    pub output_format: String,
    pub voice_id: String,
    pub engine: String,
    pub sample_rate: String,
    pub language_code: Option<String>,
    pub lexicon_names: Vec<String>,
    pub speech_mark_types: Vec<String>,
}

impl Default for HttpTtsClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            api_key: None,
            timeout_secs: 30,
            output_format: "mp3".to_string(),
            voice_id: "Matthew".to_string(),
            engine: "standard".to_string(),
            sample_rate: "16000".to_string(),
            language_code: None,
            lexicon_names: Vec::new(),
            speech_mark_types: Vec::new(),
        }
    }
}

impl HttpTtsClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    pub fn with_voice(mut self, voice_id: impl Into<String>) -> Self {
        self.voice_id = voice_id.into();
        self
    }
}

/// HTTP TTS 客户端
pub struct HttpTtsClient {
    client: Client,
    config: HttpTtsClientConfig,
}

impl HttpTtsClient {
    /// 创建新的 HTTP TTS 客户端
    ///
    /// 缺少 base_url / voice_id / output_format 时直接返回配置错误
    pub fn new(config: HttpTtsClientConfig) -> Result<Self, TtsError> {
        if config.base_url.trim().is_empty() {
            return Err(TtsError::Configuration("TTS base_url is required".to_string()));
        }
        if config.voice_id.trim().is_empty() {
            return Err(TtsError::Configuration("TTS voice_id is required".to_string()));
        }
        if config.output_format.trim().is_empty() {
            return Err(TtsError::Configuration(
                "TTS output_format is required".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| TtsError::NetworkError(e.to_string()))?;

        tracing::info!(
            base_url = %config.base_url,
            voice_id = %config.voice_id,
            engine = %config.engine,
            output_format = %config.output_format,
            "HttpTtsClient initialized"
        );

        Ok(Self { client, config })
    }

    /// 获取合成 URL
    fn speech_url(&self) -> String {
        format!("{}/v1/speech", self.config.base_url.trim_end_matches('/'))
    }

    /// 获取健康检查 URL
    fn health_url(&self) -> String {
        format!("{}/health", self.config.base_url.trim_end_matches('/'))
    }

    fn build_request<'a>(&'a self, text: &'a str, text_type: TextType) -> SynthesizeSpeechRequest<'a> {
        SynthesizeSpeechRequest {
            text,
            text_type: text_type.as_str(),
            output_format: &self.config.output_format,
            voice_id: &self.config.voice_id,
            sample_rate: &self.config.sample_rate,
            engine: &self.config.engine,
            language_code: self.config.language_code.as_deref(),
            lexicon_names: &self.config.lexicon_names,
            speech_mark_types: &self.config.speech_mark_types,
        }
    }
}

#[async_trait]
impl SpeechSynthesizerPort for HttpTtsClient {
    async fn synthesize(
        &self,
        text: &str,
        text_type: TextType,
    ) -> Result<Option<AudioResult>, TtsError> {
        let body = self.build_request(text, text_type);

        tracing::debug!(
            url = %self.speech_url(),
            text_len = text.len(),
            text_type = %text_type,
            voice_id = %self.config.voice_id,
            "Sending TTS synthesize request"
        );

        let mut request = self.client.post(self.speech_url()).json(&body);
        if let Some(api_key) = &self.config.api_key {
            request = request.bearer_auth(api_key);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                TtsError::Timeout
            } else if e.is_connect() {
                TtsError::NetworkError(format!("Cannot connect to TTS service: {}", e))
            } else {
                TtsError::NetworkError(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(TtsError::ServiceError(format!(
                "HTTP {}: {}",
                status, error_text
            )));
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .unwrap_or_else(|| content_type_for_format(&self.config.output_format).to_string());

        // 把音频流完整读入内存
        let mut stream = response.bytes_stream();
        let mut audio_data = Vec::new();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk
                .map_err(|e| TtsError::InvalidResponse(format!("Failed to read audio: {}", e)))?;
            audio_data.extend_from_slice(&chunk);
        }

        if audio_data.is_empty() {
            tracing::warn!(text_len = text.len(), "TTS service returned no audio stream");
            return Ok(None);
        }

        tracing::info!(
            content_type = %content_type,
            audio_size = audio_data.len(),
            "TTS synthesis completed"
        );

        Ok(Some(AudioResult {
            content_type: Some(content_type),
            text: Some(text.to_string()),
            file_extension: Some(self.config.output_format.clone()),
            raw_audio_base64: Some(base64::engine::general_purpose::STANDARD.encode(&audio_data)),
            ..Default::default()
        }))
    }

    fn key_prefix(&self) -> Option<String> {
        Some(self.config.voice_id.clone())
    }

    async fn health_check(&self) -> bool {
        match self
            .client
            .get(self.health_url())
            .timeout(Duration::from_secs(5))
            .send()
            .await
        {
            Ok(response) => response.status().is_success(),
            Err(_) => false,
        }
    }
}
