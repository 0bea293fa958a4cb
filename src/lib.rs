//! Markdown Translator - 按块翻译Markdown文档的工具库
//!
//! 把Markdown文档解析为有序的块序列，筛选出需要翻译的块，
//! 在并发上限内查缓存或调用翻译服务，最后按原有结构重组文档。

pub mod api_constants;
pub mod block;
pub mod cache;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod filter;
pub mod parser;
pub mod render;
pub mod stats;
pub mod translator;
pub mod utils;
pub mod validate;

pub use block::{Block, BlockKind};
pub use cache::{CacheEntry, InsertOutcome, MemoryCache, SqliteCache, TranslationCache};
pub use coordinator::{FailurePolicy, TranslationCoordinator, TranslationReport};
pub use error::{Result, TranslationError};
pub use parser::parse_markdown;
pub use render::render_blocks;
pub use translator::{HttpTranslator, Translator};
