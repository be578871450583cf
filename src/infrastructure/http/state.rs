//! Application State
//!
//! HTTP 层共享的端口与处理器

use std::sync::Arc;

use crate::application::{
    ProcessResponseHandler, SpeechSynthesizerPort, TtsCachePort, TtsOrchestrator,
};

/// 应用状态
pub struct AppState {
    // ========== Ports ==========
    pub synthesizer: Arc<dyn SpeechSynthesizerPort>,
    pub cache: Option<Arc<dyn TtsCachePort>>,

    // ========== Command Handlers ==========
    pub process_response_handler: ProcessResponseHandler,
}

impl AppState {
    /// 创建应用状态
    pub fn new(
        orchestrator: TtsOrchestrator,
        synthesizer: Arc<dyn SpeechSynthesizerPort>,
        cache: Option<Arc<dyn TtsCachePort>>,
    ) -> Self {
        Self {
            synthesizer,
            cache,
            process_response_handler: ProcessResponseHandler::new(Arc::new(orchestrator)),
        }
    }
}
