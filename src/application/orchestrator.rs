//! TTS Orchestrator - 响应语音合成编排
//!
//! 对响应中的每个可朗读片段：
//! key -> 查缓存 -> 未命中则合成 -> 写缓存 -> 挂到响应上。
//! 单个片段的任何失败只记录日志，不会影响其他片段或整个响应。

use std::sync::Arc;

use crate::application::ports::{SpeechSynthesizerPort, TtsCachePort};
use crate::domain::tts::{derive_cache_key, extract_segments, AudioResult, CoreResponse, Segment};

/// 编排配置
#[derive(Debug, Clone)]
pub struct TtsSettings {
    /// 输出格式（同时作为缓存文件扩展名）
    pub output_format: String,
    /// 请求未声明 locale 时使用
    pub fallback_locale: String,
    /// 是否在响应中保留 Base64 音频
    pub include_raw_audio: bool,
    /// 音频写入的平台段名称
    pub platform: String,
}

impl Default for TtsSettings {
    fn default() -> Self {
        Self {
            output_format: "mp3".to_string(),
            fallback_locale: "en-US".to_string(),
            include_raw_audio: false,
            platform: "web".to_string(),
        }
    }
}

/// 单次处理统计
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct TtsReport {
    pub segments: usize,
    pub cache_hits: usize,
    pub synthesized: usize,
    pub skipped: usize,
}

enum SegmentOutcome {
    CacheHit(AudioResult),
    Synthesized(AudioResult),
    Skipped,
}

/// 语音合成编排器
pub struct TtsOrchestrator {
    settings: TtsSettings,
    synthesizer: Arc<dyn SpeechSynthesizerPort>,
    cache: Option<Arc<dyn TtsCachePort>>,
}

impl TtsOrchestrator {
    pub fn new(
        settings: TtsSettings,
        synthesizer: Arc<dyn SpeechSynthesizerPort>,
        cache: Option<Arc<dyn TtsCachePort>>,
    ) -> Self {
        Self {
            settings,
            synthesizer,
            cache,
        }
    }

    /// 请求 locale，缺省时使用 fallback
    pub fn resolve_locale<'a>(&'a self, request_locale: Option<&'a str>) -> &'a str {
        request_locale
            .filter(|locale| !locale.is_empty())
            .unwrap_or(self.settings.fallback_locale.as_str())
    }

    /// 处理整个响应（原地修改）
    ///
    /// 片段按输出顺序串行处理。
    pub async fn process(&self, response: &mut CoreResponse, request_locale: Option<&str>) -> TtsReport {
        let locale = self.resolve_locale(request_locale).to_string();
        let segments: Vec<Segment> = extract_segments(response, &locale).collect();

        let mut report = TtsReport {
            segments: segments.len(),
            ..Default::default()
        };

        for segment in segments {
            let audio = match self.process_segment(&segment).await {
                SegmentOutcome::CacheHit(audio) => {
                    report.cache_hits += 1;
                    audio
                }
                SegmentOutcome::Synthesized(audio) => {
                    report.synthesized += 1;
                    audio
                }
                SegmentOutcome::Skipped => {
                    report.skipped += 1;
                    continue;
                }
            };

            tracing::debug!(
                entry = segment.entry_index,
                field = segment.slot.audio_field(),
                platform = %self.settings.platform,
                "Audio attached"
            );
            response.attach_audio(segment.entry_index, &self.settings.platform, segment.slot, audio);
        }

        tracing::debug!(
            locale = %locale,
            segments = report.segments,
            cache_hits = report.cache_hits,
            synthesized = report.synthesized,
            skipped = report.skipped,
            "TTS processing finished"
        );

        report
    }

    async fn process_segment(&self, segment: &Segment) -> SegmentOutcome {
        let prefix = self.synthesizer.key_prefix();
        let key = derive_cache_key(&segment.text, prefix.as_deref());

        let (mut audio, from_cache) = match self.lookup_cache(&key, segment).await {
            Some(audio) => (audio, true),
            None => match self.synthesize(&key, segment).await {
                Some(audio) => (audio, false),
                None => return SegmentOutcome::Skipped,
            },
        };

        // 写缓存之后再剥离，缓存里保留完整音频
        if !self.settings.include_raw_audio {
            audio.strip_raw_audio();
        }

        if from_cache {
            SegmentOutcome::CacheHit(audio)
        } else {
            SegmentOutcome::Synthesized(audio)
        }
    }

    async fn lookup_cache(&self, key: &str, segment: &Segment) -> Option<AudioResult> {
        let cache = self.cache.as_ref()?;

        match cache
            .get(key, &segment.locale, &self.settings.output_format)
            .await
        {
            Ok(Some(mut audio)) => {
                if audio.key.is_none() {
                    audio.key = Some(key.to_string());
                }
                if audio.text.is_none() {
                    audio.text = Some(segment.text.clone());
                }
                tracing::debug!(
                    key = %key,
                    locale = %segment.locale,
                    backend = cache.backend_type(),
                    "TTS cache hit"
                );
                Some(audio)
            }
            Ok(None) => {
                tracing::debug!(key = %key, locale = %segment.locale, "TTS cache miss");
                None
            }
            Err(e) => {
                tracing::warn!(
                    key = %key,
                    backend = cache.backend_type(),
                    error = %e,
                    "TTS cache lookup failed, treating as miss"
                );
                None
            }
        }
    }

    async fn synthesize(&self, key: &str, segment: &Segment) -> Option<AudioResult> {
        let mut audio = match self
            .synthesizer
            .synthesize(&segment.text, segment.text_type)
            .await
        {
            Ok(Some(audio)) => audio,
            Ok(None) => {
                tracing::warn!(key = %key, "TTS synthesis returned no audio");
                return None;
            }
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "TTS synthesis failed");
                return None;
            }
        };

        audio.key = Some(key.to_string());

        if let Some(cache) = &self.cache {
            match cache.store(key, &segment.locale, &audio).await {
                Ok(()) => {
                    // 没有原始音频时 store 是空操作，不能给出 url
                    if audio.url.is_none() && audio.has_raw_audio() {
                        audio.url =
                            cache.public_url(key, &segment.locale, audio.file_extension.as_deref());
                    }
                }
                Err(e) => {
                    tracing::warn!(
                        key = %key,
                        backend = cache.backend_type(),
                        error = %e,
                        "TTS cache store failed"
                    );
                }
            }
        }

        Some(audio)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::{CacheError, TtsError};
    use crate::domain::tts::{OutputSlot, TextType};
    use async_trait::async_trait;
    use serde_json::json;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// 记录调用次数的合成器
    struct MockSynthesizer {
        prefix: Option<String>,
        fail: bool,
        calls: AtomicUsize,
        text_types: Mutex<Vec<TextType>>,
    }

    impl MockSynthesizer {
        fn new(prefix: Option<&str>) -> Self {
            Self {
                prefix: prefix.map(str::to_string),
                fail: false,
                calls: AtomicUsize::new(0),
                text_types: Mutex::new(Vec::new()),
            }
        }

        fn failing() -> Self {
            Self {
                fail: true,
                ..Self::new(Some("Matthew"))
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl SpeechSynthesizerPort for MockSynthesizer {
        async fn synthesize(
            &self,
            text: &str,
            text_type: TextType,
        ) -> Result<Option<AudioResult>, TtsError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.text_types.lock().unwrap().push(text_type);
            if self.fail {
                return Err(TtsError::ServiceError("boom".to_string()));
            }
            Ok(Some(AudioResult {
                content_type: Some("audio/mpeg".to_string()),
                text: Some(text.to_string()),
                file_extension: Some("mp3".to_string()),
                raw_audio_base64: Some("SUQz".to_string()),
                ..Default::default()
            }))
        }

        fn key_prefix(&self) -> Option<String> {
            self.prefix.clone()
        }
    }

    /// 简单的 map 缓存，可模拟故障
    #[derive(Default)]
    struct MockCache {
        entries: Mutex<HashMap<String, AudioResult>>,
        fail_get: bool,
        fail_store: bool,
        gets: AtomicUsize,
        stores: AtomicUsize,
    }

    impl MockCache {
        fn path(key: &str, locale: &str, ext: &str) -> String {
            format!("{}/{}.{}", locale, key, ext)
        }
    }

    #[async_trait]
    impl TtsCachePort for MockCache {
        async fn get(
            &self,
            key: &str,
            locale: &str,
            output_format: &str,
        ) -> Result<Option<AudioResult>, CacheError> {
            self.gets.fetch_add(1, Ordering::SeqCst);
            if self.fail_get {
                return Err(CacheError::IoError("unavailable".to_string()));
            }
            let entries = self.entries.lock().unwrap();
            Ok(entries
                .get(&Self::path(key, locale, output_format))
                .map(|stored| AudioResult {
                    content_type: stored.content_type.clone(),
                    raw_audio_base64: stored.raw_audio_base64.clone(),
                    url: Some(format!("https://cdn/{}", Self::path(key, locale, output_format))),
                    ..Default::default()
                }))
        }

        async fn store(&self, key: &str, locale: &str, data: &AudioResult) -> Result<(), CacheError> {
            self.stores.fetch_add(1, Ordering::SeqCst);
            if self.fail_store {
                return Err(CacheError::IoError("read-only".to_string()));
            }
            let ext = data.file_extension.clone().unwrap_or_default();
            self.entries
                .lock()
                .unwrap()
                .insert(Self::path(key, locale, &ext), data.clone());
            Ok(())
        }

        fn public_url(&self, key: &str, locale: &str, extension: Option<&str>) -> Option<String> {
            Some(format!(
                "https://cdn/{}",
                Self::path(key, locale, extension.unwrap_or_default())
            ))
        }

        fn backend_type(&self) -> &'static str {
            "mock"
        }
    }

    fn hello_response() -> CoreResponse {
        serde_json::from_value(json!({ "output": [{ "message": "Hello" }] })).unwrap()
    }

    fn hello_key() -> String {
        format!("Matthew-{:x}", md5::compute("Hello"))
    }

    fn orchestrator(
        synthesizer: Arc<MockSynthesizer>,
        cache: Option<Arc<MockCache>>,
        include_raw_audio: bool,
    ) -> TtsOrchestrator {
        let settings = TtsSettings {
            include_raw_audio,
            ..Default::default()
        };
        TtsOrchestrator::new(
            settings,
            synthesizer,
            cache.map(|c| c as Arc<dyn TtsCachePort>),
        )
    }

    #[tokio::test]
    async fn test_cache_miss_synthesizes_and_stores() {
        let synthesizer = Arc::new(MockSynthesizer::new(Some("Matthew")));
        let cache = Arc::new(MockCache::default());
        let orchestrator = orchestrator(synthesizer.clone(), Some(cache.clone()), false);

        let mut response = hello_response();
        let report = orchestrator.process(&mut response, Some("en-US")).await;

        assert_eq!(synthesizer.calls(), 1);
        assert_eq!(report.synthesized, 1);
        assert_eq!(report.cache_hits, 0);

        let stored = cache.entries.lock().unwrap();
        let path = format!("en-US/{}.mp3", hello_key());
        assert_eq!(stored[&path].raw_audio_base64.as_deref(), Some("SUQz"));
        drop(stored);

        let audio = response.output[0]
            .audio_for("web", OutputSlot::Message)
            .unwrap();
        assert_eq!(audio.key.as_deref(), Some(hello_key().as_str()));
        assert_eq!(audio.content_type.as_deref(), Some("audio/mpeg"));
        assert_eq!(audio.file_extension.as_deref(), Some("mp3"));
        assert_eq!(audio.url, Some(format!("https://cdn/{}", path)));
        assert!(audio.raw_audio_base64.is_none());
    }

    #[tokio::test]
    async fn test_cache_hit_skips_synthesis_and_backfills() {
        let synthesizer = Arc::new(MockSynthesizer::new(Some("Matthew")));
        let cache = Arc::new(MockCache::default());
        cache.entries.lock().unwrap().insert(
            format!("en-US/{}.mp3", hello_key()),
            AudioResult {
                content_type: Some("audio/mpeg".to_string()),
                raw_audio_base64: Some("SUQz".to_string()),
                ..Default::default()
            },
        );
        let orchestrator = orchestrator(synthesizer.clone(), Some(cache.clone()), false);

        let mut response = hello_response();
        let report = orchestrator.process(&mut response, None).await;

        assert_eq!(synthesizer.calls(), 0);
        assert_eq!(report.cache_hits, 1);
        assert_eq!(cache.stores.load(Ordering::SeqCst), 0);

        let audio = response.output[0]
            .audio_for("web", OutputSlot::Message)
            .unwrap();
        assert_eq!(audio.key.as_deref(), Some(hello_key().as_str()));
        assert_eq!(audio.text.as_deref(), Some("Hello"));
        assert!(audio.url.is_some());
        assert!(audio.raw_audio_base64.is_none());
    }

    #[tokio::test]
    async fn test_second_pass_reuses_cached_audio() {
        let synthesizer = Arc::new(MockSynthesizer::new(Some("Matthew")));
        let cache = Arc::new(MockCache::default());
        let orchestrator = orchestrator(synthesizer.clone(), Some(cache.clone()), true);

        let mut first = hello_response();
        let mut second = hello_response();
        orchestrator.process(&mut first, Some("en-US")).await;
        orchestrator.process(&mut second, Some("en-US")).await;

        assert_eq!(synthesizer.calls(), 1);

        let a = first.output[0].audio_for("web", OutputSlot::Message).unwrap();
        let b = second.output[0].audio_for("web", OutputSlot::Message).unwrap();
        assert_eq!(a.raw_audio_base64, b.raw_audio_base64);
        assert_eq!(a.content_type, b.content_type);
        assert_eq!(a.key, b.key);
        assert_eq!(a.url, b.url);
    }

    #[tokio::test]
    async fn test_include_raw_audio_keeps_bytes() {
        let synthesizer = Arc::new(MockSynthesizer::new(None));
        let orchestrator = orchestrator(synthesizer, None, true);

        let mut response = hello_response();
        orchestrator.process(&mut response, None).await;

        let audio = response.output[0]
            .audio_for("web", OutputSlot::Message)
            .unwrap();
        assert_eq!(audio.raw_audio_base64.as_deref(), Some("SUQz"));
        assert_eq!(audio.key, Some(format!("{:x}", md5::compute("Hello"))));
    }

    #[tokio::test]
    async fn test_no_cache_strips_raw_audio() {
        let synthesizer = Arc::new(MockSynthesizer::new(Some("Matthew")));
        let orchestrator = orchestrator(synthesizer.clone(), None, false);

        let mut response = hello_response();
        orchestrator.process(&mut response, None).await;

        assert_eq!(synthesizer.calls(), 1);
        let audio = response.output[0]
            .audio_for("web", OutputSlot::Message)
            .unwrap();
        assert!(audio.raw_audio_base64.is_none());
        assert!(audio.url.is_none());
    }

    #[tokio::test]
    async fn test_synthesis_failure_leaves_slot_empty() {
        let synthesizer = Arc::new(MockSynthesizer::failing());
        let cache = Arc::new(MockCache::default());
        let orchestrator = orchestrator(synthesizer.clone(), Some(cache.clone()), false);

        let mut response: CoreResponse = serde_json::from_value(json!({
            "output": [{ "message": "Hello", "reprompt": "Anyone?" }]
        }))
        .unwrap();
        let report = orchestrator.process(&mut response, None).await;

        assert_eq!(synthesizer.calls(), 2);
        assert_eq!(report.skipped, 2);
        assert_eq!(cache.stores.load(Ordering::SeqCst), 0);
        assert!(response.output[0].platforms.is_empty());
    }

    #[tokio::test]
    async fn test_cache_failures_are_not_fatal() {
        let synthesizer = Arc::new(MockSynthesizer::new(Some("Matthew")));
        let cache = Arc::new(MockCache {
            fail_get: true,
            fail_store: true,
            ..Default::default()
        });
        let orchestrator = orchestrator(synthesizer.clone(), Some(cache.clone()), true);

        let mut response = hello_response();
        let report = orchestrator.process(&mut response, None).await;

        assert_eq!(report.synthesized, 1);
        let audio = response.output[0]
            .audio_for("web", OutputSlot::Message)
            .unwrap();
        // 写缓存失败不回滚内存结果，也不会填充 url
        assert_eq!(audio.raw_audio_base64.as_deref(), Some("SUQz"));
        assert!(audio.url.is_none());
    }

    #[tokio::test]
    async fn test_empty_text_makes_no_calls() {
        let synthesizer = Arc::new(MockSynthesizer::new(Some("Matthew")));
        let cache = Arc::new(MockCache::default());
        let orchestrator = orchestrator(synthesizer.clone(), Some(cache.clone()), false);

        let mut response: CoreResponse =
            serde_json::from_value(json!({ "output": [{ "message": "" }] })).unwrap();
        let report = orchestrator.process(&mut response, None).await;

        assert_eq!(report, TtsReport::default());
        assert_eq!(synthesizer.calls(), 0);
        assert_eq!(cache.gets.load(Ordering::SeqCst), 0);
        assert!(response.output[0].platforms.is_empty());
    }

    #[tokio::test]
    async fn test_locale_fallback_and_slots() {
        let synthesizer = Arc::new(MockSynthesizer::new(Some("Matthew")));
        let cache = Arc::new(MockCache::default());
        let orchestrator = orchestrator(synthesizer.clone(), Some(cache.clone()), false);

        let mut response: CoreResponse = serde_json::from_value(json!({
            "output": [{
                "message": { "speech": "<speak>Hi</speak>" },
                "reprompt": "Still there?"
            }]
        }))
        .unwrap();
        orchestrator.process(&mut response, Some("")).await;

        let entries = cache.entries.lock().unwrap();
        assert_eq!(entries.len(), 2);
        assert!(entries.keys().all(|path| path.starts_with("en-US/")));
        drop(entries);

        // message 来自 speech（SSML），reprompt 是纯文本
        assert_eq!(
            *synthesizer.text_types.lock().unwrap(),
            vec![TextType::Markup, TextType::Plain]
        );
        assert!(response.output[0].audio_for("web", OutputSlot::Message).is_some());
        assert!(response.output[0].audio_for("web", OutputSlot::Reprompt).is_some());
    }
}
