//! HTTP Handlers

mod ping;
mod tts;

pub use ping::*;
pub use tts::*;
