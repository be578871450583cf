//! Infrastructure Layer - 基础设施层
//!
//! 提供所有端口的具体实现

pub mod adapters;
pub mod factory;
pub mod http;
pub mod memory;
pub mod persistence;

pub use factory::{build_cache, build_synthesizer};
pub use memory::InMemoryTtsCache;
pub use persistence::sled::SledTtsCache;
