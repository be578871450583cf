//! TTS Command Handlers

use std::sync::Arc;

use crate::application::commands::tts_commands::*;
use crate::application::error::ApplicationError;
use crate::application::orchestrator::TtsOrchestrator;
use crate::domain::tts::is_valid_locale;

/// ProcessResponse Handler - 宿主响应的后处理入口
pub struct ProcessResponseHandler {
    orchestrator: Arc<TtsOrchestrator>,
}

impl ProcessResponseHandler {
    pub fn new(orchestrator: Arc<TtsOrchestrator>) -> Self {
        Self { orchestrator }
    }

    pub async fn handle(
        &self,
        cmd: ProcessResponseCommand,
    ) -> Result<ProcessResponseResult, ApplicationError> {
        if let Some(locale) = &cmd.locale {
            validate_locale(locale)?;
        }

        let mut response = cmd.response;
        let report = self
            .orchestrator
            .process(&mut response, cmd.locale.as_deref())
            .await;

        tracing::info!(
            entries = response.output.len(),
            segments = report.segments,
            cache_hits = report.cache_hits,
            synthesized = report.synthesized,
            "Response processed"
        );

        Ok(ProcessResponseResult { response, report })
    }
}

/// 空串表示未声明，交给 fallback
fn validate_locale(locale: &str) -> Result<(), ApplicationError> {
    if !is_valid_locale(locale) {
        return Err(ApplicationError::validation(format!(
            "Invalid locale: {}",
            locale
        )));
    }
    Ok(())
}
